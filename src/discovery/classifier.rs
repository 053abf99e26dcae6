use crate::config::DiscoveryConfig;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Why a filesystem entry is or is not a conversion candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryClass {
    Candidate,
    /// Lives under the output directory; re-runs must not self-ingest.
    ExcludedOutputDir,
    /// Extension is not the instrument format.
    ExcludedExtension,
    /// Stem carries the unprocessed-dump suffix.
    ExcludedRaw,
    /// Filename does not start with the configured prefix.
    ExcludedWrongPrefix,
    /// Filename matches a configured exclude pattern.
    ExcludedPattern,
}

impl EntryClass {
    pub fn is_candidate(&self) -> bool {
        matches!(self, EntryClass::Candidate)
    }
}

/// Pure filename/path classifier; all discovery filtering decisions live
/// here so they can be tested without touching the filesystem.
pub struct EntryClassifier {
    prefix: String,
    extension: String,
    raw_ending: String,
    exclude_patterns: Vec<Regex>,
    output_dir: PathBuf,
}

impl EntryClassifier {
    pub fn new(config: &DiscoveryConfig, output_dir: &Path) -> Self {
        let exclude_patterns = config
            .exclude_patterns
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect();

        Self {
            prefix: config.prefix.clone(),
            extension: config.extension.to_lowercase(),
            raw_ending: format!(
                "{}.{}",
                config.raw_suffix.to_lowercase(),
                config.extension.to_lowercase()
            ),
            exclude_patterns,
            output_dir: output_dir.to_path_buf(),
        }
    }

    pub fn classify(&self, path: &Path) -> EntryClass {
        if path.starts_with(&self.output_dir) {
            return EntryClass::ExcludedOutputDir;
        }

        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return EntryClass::ExcludedExtension,
        };
        let filename_lower = filename.to_lowercase();

        if !filename_lower.ends_with(&format!(".{}", self.extension)) {
            return EntryClass::ExcludedExtension;
        }

        if filename_lower.ends_with(&self.raw_ending) {
            return EntryClass::ExcludedRaw;
        }

        if !filename.starts_with(&self.prefix) {
            return EntryClass::ExcludedWrongPrefix;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.is_match(filename))
        {
            return EntryClass::ExcludedPattern;
        }

        EntryClass::Candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> EntryClassifier {
        EntryClassifier::new(&DiscoveryConfig::default(), Path::new("/data/DRT_out"))
    }

    #[test]
    fn test_candidate() {
        let c = classifier();
        assert_eq!(
            c.classify(Path::new("/data/anolyte_1M/PWRGEIS_500mA_A.dta")),
            EntryClass::Candidate
        );
    }

    #[test]
    fn test_output_dir_is_excluded() {
        let c = classifier();
        assert_eq!(
            c.classify(Path::new("/data/DRT_out/PWRGEIS_500mA_A.dta")),
            EntryClass::ExcludedOutputDir
        );
    }

    #[test]
    fn test_wrong_extension_is_excluded() {
        let c = classifier();
        assert_eq!(
            c.classify(Path::new("/data/run/PWRGEIS_500mA_A.csv")),
            EntryClass::ExcludedExtension
        );
        assert_eq!(
            c.classify(Path::new("/data/run/notes.txt")),
            EntryClass::ExcludedExtension
        );
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let c = classifier();
        assert_eq!(
            c.classify(Path::new("/data/run/PWRGEIS_500mA_A.DTA")),
            EntryClass::Candidate
        );
    }

    #[test]
    fn test_raw_suffix_is_excluded() {
        let c = classifier();
        assert_eq!(
            c.classify(Path::new("/data/run/PWRGEIS_500mA_A_Raw.dta")),
            EntryClass::ExcludedRaw
        );
        assert_eq!(
            c.classify(Path::new("/data/run/PWRGEIS_500mA_A_RAW.DTA")),
            EntryClass::ExcludedRaw
        );
    }

    #[test]
    fn test_wrong_prefix_is_excluded() {
        let c = classifier();
        assert_eq!(
            c.classify(Path::new("/data/run/OCPCURVE_A.dta")),
            EntryClass::ExcludedWrongPrefix
        );
        // Prefix match is case-sensitive, matching the instrument's naming.
        assert_eq!(
            c.classify(Path::new("/data/run/pwrgeis_500mA_A.dta")),
            EntryClass::ExcludedWrongPrefix
        );
    }

    #[test]
    fn test_exclude_pattern() {
        let config = DiscoveryConfig {
            exclude_patterns: vec![r"_abort".to_string()],
            ..DiscoveryConfig::default()
        };
        let c = EntryClassifier::new(&config, Path::new("/data/DRT_out"));
        assert_eq!(
            c.classify(Path::new("/data/run/PWRGEIS_500mA_abort.dta")),
            EntryClass::ExcludedPattern
        );
        assert_eq!(
            c.classify(Path::new("/data/run/PWRGEIS_500mA_ok.dta")),
            EntryClass::Candidate
        );
    }

    #[test]
    fn test_invalid_pattern_is_ignored() {
        let config = DiscoveryConfig {
            exclude_patterns: vec!["[unclosed".to_string()],
            ..DiscoveryConfig::default()
        };
        let c = EntryClassifier::new(&config, Path::new("/data/DRT_out"));
        assert_eq!(
            c.classify(Path::new("/data/run/PWRGEIS_500mA_A.dta")),
            EntryClass::Candidate
        );
    }
}
