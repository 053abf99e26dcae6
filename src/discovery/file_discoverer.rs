use crate::config::DiscoveryConfig;
use crate::discovery::classifier::{EntryClass, EntryClassifier};
use crate::error::{DrtPrepError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One conversion candidate: the canonically named staged copy the rest of
/// the pipeline operates on, plus the folder label that names its output.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub source_path: PathBuf,
    pub staged_path: PathBuf,
    pub label: String,
}

impl DiscoveredFile {
    /// Canonical filename the pipeline reports outcomes under.
    pub fn staged_name(&self) -> String {
        self.staged_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string()
    }
}

/// Result of a discovery pass: the candidate list, the narrative events for
/// the run log, and per-class statistics.
#[derive(Debug, Default)]
pub struct Discovery {
    pub records: Vec<DiscoveredFile>,
    pub events: Vec<String>,
    pub stats: DiscoveryStatistics,
}

#[derive(Debug, Default)]
pub struct DiscoveryStatistics {
    pub candidates: usize,
    pub excluded_raw: usize,
    pub excluded_wrong_prefix: usize,
    pub excluded_extension: usize,
    pub excluded_output_dir: usize,
    pub excluded_pattern: usize,
    pub candidates_by_label: BTreeMap<String, usize>,
}

impl DiscoveryStatistics {
    fn count(&mut self, class: EntryClass) {
        match class {
            EntryClass::Candidate => self.candidates += 1,
            EntryClass::ExcludedRaw => self.excluded_raw += 1,
            EntryClass::ExcludedWrongPrefix => self.excluded_wrong_prefix += 1,
            EntryClass::ExcludedExtension => self.excluded_extension += 1,
            EntryClass::ExcludedOutputDir => self.excluded_output_dir += 1,
            EntryClass::ExcludedPattern => self.excluded_pattern += 1,
        }
    }

    pub fn display_summary(&self) -> String {
        let mut summary = format!(
            "Discovery results:\n  Candidates: {}\n  Excluded (raw dumps): {}\n  Excluded (wrong prefix): {}\n  Excluded (other extension): {}\n  Excluded (output directory): {}\n  Excluded (pattern): {}\n",
            self.candidates,
            self.excluded_raw,
            self.excluded_wrong_prefix,
            self.excluded_extension,
            self.excluded_output_dir,
            self.excluded_pattern,
        );

        if !self.candidates_by_label.is_empty() {
            summary.push_str("  Candidates by folder label:\n");
            for (label, count) in &self.candidates_by_label {
                summary.push_str(&format!("    {}: {}\n", label, count));
            }
        }

        summary
    }
}

/// Walks an input tree, classifies every file, and stages each candidate
/// under its canonical name in the output directory before conversion.
///
/// Staging decouples "where the instrument wrote it" from "what the pipeline
/// sees": hashing and parsing always operate on the staged copy. Two source
/// folders reducing to the same label overwrite each other's staged copy; the
/// copy events in the run log make such collisions visible.
pub struct FileDiscoverer {
    classifier: EntryClassifier,
    prefix: String,
    extension: String,
    output_dir: PathBuf,
    buffer_size: usize,
}

impl FileDiscoverer {
    pub fn new(config: &DiscoveryConfig, output_dir: &Path) -> Self {
        Self {
            classifier: EntryClassifier::new(config, output_dir),
            prefix: config.prefix.clone(),
            extension: config.extension.clone(),
            output_dir: output_dir.to_path_buf(),
            buffer_size: 64 * 1024,
        }
    }

    /// Walk `input_root` and stage every candidate. Walk errors and copy
    /// failures are recorded as events, not fatal: discovery always yields
    /// whatever candidates it could reach.
    pub fn discover(&self, input_root: &Path) -> Result<Discovery> {
        self.walk(input_root, true)
    }

    /// Classify-only pass for dry runs: same walk and classification as
    /// [`discover`](Self::discover), but nothing is created or copied.
    pub fn preview(&self, input_root: &Path) -> Result<Discovery> {
        self.walk(input_root, false)
    }

    fn walk(&self, input_root: &Path, stage: bool) -> Result<Discovery> {
        if !input_root.is_dir() {
            return Err(DrtPrepError::InvalidPath {
                path: format!("{} is not a directory", input_root.display()),
            });
        }

        if stage {
            fs::create_dir_all(&self.output_dir)?;
        }

        let mut discovery = Discovery::default();

        let walker = WalkDir::new(input_root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.path() != self.output_dir);

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    discovery.events.push(format!("scan error: {}", err));
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let class = self.classifier.classify(entry.path());
            discovery.stats.count(class);
            if !class.is_candidate() {
                continue;
            }

            let label = folder_label(entry.path(), input_root);
            let staged_path = self.staged_path(&label);

            if !stage {
                discovery.events.push(format!(
                    "would stage: {} -> {}",
                    entry.path().display(),
                    staged_path.display()
                ));
                *discovery
                    .stats
                    .candidates_by_label
                    .entry(label.clone())
                    .or_insert(0) += 1;
                discovery.records.push(DiscoveredFile {
                    source_path: entry.path().to_path_buf(),
                    staged_path,
                    label,
                });
                continue;
            }

            match self.stage_copy(entry.path(), &staged_path) {
                Ok(()) => {
                    discovery.events.push(format!(
                        "staged: {} -> {}",
                        entry.path().display(),
                        staged_path.display()
                    ));
                    *discovery
                        .stats
                        .candidates_by_label
                        .entry(label.clone())
                        .or_insert(0) += 1;
                    discovery.records.push(DiscoveredFile {
                        source_path: entry.path().to_path_buf(),
                        staged_path,
                        label,
                    });
                }
                Err(err) => {
                    discovery.events.push(format!(
                        "copy failed: {}: {}",
                        entry.path().display(),
                        err
                    ));
                }
            }
        }

        Ok(discovery)
    }

    fn staged_path(&self, label: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}.{}", self.prefix, label, self.extension))
    }

    /// Copy a candidate to `<output>/<prefix>_<label>.<ext>`, overwriting any
    /// stale copy from a previous run and preserving the source mtime.
    fn stage_copy(&self, source: &Path, dest: &Path) -> Result<()> {
        let source_file = fs::File::open(source)?;
        let dest_file = fs::File::create(dest)?;

        let mut reader = BufReader::with_capacity(self.buffer_size, source_file);
        let mut writer = BufWriter::with_capacity(self.buffer_size, dest_file);

        let mut buffer = vec![0u8; 8192];
        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            writer.write_all(&buffer[..bytes_read])?;
        }
        writer.flush()?;

        if let Ok(metadata) = fs::metadata(source) {
            if let Ok(modified) = metadata.modified() {
                let _ = filetime::set_file_mtime(dest, filetime::FileTime::from_system_time(modified));
            }
        }

        Ok(())
    }
}

/// Label for a candidate: the immediate containing folder's name, made safe
/// for use inside a filename.
fn folder_label(path: &Path, input_root: &Path) -> String {
    let folder = path
        .parent()
        .and_then(|parent| parent.file_name())
        .and_then(|name| name.to_str())
        .unwrap_or("");

    let label = if folder.is_empty() {
        input_root
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("root")
    } else {
        folder
    };

    label.replace(['/', '\\'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn discoverer(output_dir: &Path) -> FileDiscoverer {
        FileDiscoverer::new(&DiscoveryConfig::default(), output_dir)
    }

    #[test]
    fn test_discovers_and_stages_candidates() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let output = root.join("DRT_PWRGEIS_500mA");

        write_file(&root.join("anolyte_1M/PWRGEIS_500mA_A.dta"), "ZCURVE\n");
        write_file(&root.join("anolyte_2M/PWRGEIS_500mA_A.dta"), "ZCURVE\n");

        let discovery = discoverer(&output).discover(root).unwrap();

        assert_eq!(discovery.records.len(), 2);
        assert_eq!(discovery.stats.candidates, 2);

        let mut labels: Vec<_> = discovery.records.iter().map(|r| r.label.clone()).collect();
        labels.sort();
        assert_eq!(labels, vec!["anolyte_1M", "anolyte_2M"]);

        assert!(output.join("PWRGEIS_500mA_anolyte_1M.dta").exists());
        assert!(output.join("PWRGEIS_500mA_anolyte_2M.dta").exists());
        assert_eq!(
            fs::read_to_string(output.join("PWRGEIS_500mA_anolyte_1M.dta")).unwrap(),
            "ZCURVE\n"
        );
    }

    #[test]
    fn test_raw_and_wrong_prefix_are_excluded() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let output = root.join("DRT_PWRGEIS_500mA");

        write_file(&root.join("run/PWRGEIS_500mA_A.dta"), "ZCURVE\n");
        write_file(&root.join("run/PWRGEIS_500mA_A_Raw.dta"), "raw dump\n");
        write_file(&root.join("run/OCPCURVE_A.dta"), "other\n");

        let discovery = discoverer(&output).discover(root).unwrap();

        assert_eq!(discovery.records.len(), 1);
        assert_eq!(discovery.stats.excluded_raw, 1);
        assert_eq!(discovery.stats.excluded_wrong_prefix, 1);
    }

    #[test]
    fn test_output_directory_is_not_reingested() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let output = root.join("DRT_PWRGEIS_500mA");

        write_file(&root.join("run/PWRGEIS_500mA_A.dta"), "ZCURVE\n");
        // A staged leftover from a previous run, inside the output directory.
        write_file(&output.join("PWRGEIS_500mA_stale.dta"), "ZCURVE\n");

        let discovery = discoverer(&output).discover(root).unwrap();

        assert_eq!(discovery.records.len(), 1);
        assert_eq!(discovery.records[0].label, "run");
    }

    #[test]
    fn test_stale_staged_copy_is_overwritten() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let output = root.join("DRT_PWRGEIS_500mA");

        write_file(&root.join("run/PWRGEIS_500mA_A.dta"), "old content\n");
        discoverer(&output).discover(root).unwrap();

        write_file(&root.join("run/PWRGEIS_500mA_A.dta"), "new content\n");
        let discovery = discoverer(&output).discover(root).unwrap();

        assert_eq!(discovery.records.len(), 1);
        assert_eq!(
            fs::read_to_string(output.join("PWRGEIS_500mA_run.dta")).unwrap(),
            "new content\n"
        );
    }

    #[test]
    fn test_staging_events_are_recorded() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let output = root.join("DRT_PWRGEIS_500mA");

        write_file(&root.join("run/PWRGEIS_500mA_A.dta"), "ZCURVE\n");

        let discovery = discoverer(&output).discover(root).unwrap();

        assert_eq!(discovery.events.len(), 1);
        assert!(discovery.events[0].starts_with("staged: "));
        assert!(discovery.events[0].contains("PWRGEIS_500mA_run.dta"));
    }

    #[test]
    fn test_preview_copies_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let output = root.join("DRT_PWRGEIS_500mA");

        write_file(&root.join("run/PWRGEIS_500mA_A.dta"), "ZCURVE\n");

        let discovery = discoverer(&output).preview(root).unwrap();

        assert_eq!(discovery.records.len(), 1);
        assert!(discovery.events[0].starts_with("would stage: "));
        assert!(!output.exists());
    }

    #[test]
    fn test_missing_input_root_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("absent");
        let output = temp_dir.path().join("out");

        let err = discoverer(&output).discover(&missing).unwrap_err();
        assert!(matches!(err, DrtPrepError::InvalidPath { .. }));
    }

    #[test]
    fn test_statistics_summary_lists_labels() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let output = root.join("DRT_PWRGEIS_500mA");

        write_file(&root.join("a/PWRGEIS_500mA_1.dta"), "x\n");
        write_file(&root.join("a/PWRGEIS_500mA_2.dta"), "y\n");

        let discovery = discoverer(&output).discover(root).unwrap();
        let summary = discovery.stats.display_summary();

        assert!(summary.contains("Candidates: 2"));
        assert!(summary.contains("a: 2"));
    }
}
