use crate::error::Result;
use crate::pipeline::ConversionOutcome;
use crate::registry::DedupRegistry;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Counts of per-file outcomes for the end-of-run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub converted: usize,
    pub skipped_duplicates: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.converted + self.skipped_duplicates + self.failed
    }
}

/// Aggregates discovery events and conversion outcomes into the run log, and
/// persists the registry snapshot at the end of a run.
///
/// The log file is overwritten each run; it always gets written for whatever
/// work did finish, regardless of individual failures.
pub struct RunReport {
    started_at: chrono::DateTime<chrono::Local>,
    events: Vec<String>,
    outcomes: Vec<ConversionOutcome>,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            started_at: chrono::Local::now(),
            events: Vec::new(),
            outcomes: Vec::new(),
        }
    }

    pub fn record_event<S: Into<String>>(&mut self, event: S) {
        self.events.push(event.into());
    }

    pub fn record_events<I: IntoIterator<Item = String>>(&mut self, events: I) {
        self.events.extend(events);
    }

    pub fn record_outcomes(&mut self, outcomes: Vec<ConversionOutcome>) {
        self.outcomes.extend(outcomes);
    }

    pub fn outcomes(&self) -> &[ConversionOutcome] {
        &self.outcomes
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for outcome in &self.outcomes {
            match outcome {
                ConversionOutcome::Converted { .. } => summary.converted += 1,
                ConversionOutcome::SkippedDuplicate { .. } => summary.skipped_duplicates += 1,
                ConversionOutcome::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }

    /// Write the plain-text run log, overwriting the previous run's file.
    pub fn write_log(&self, path: &Path, registry_entries: usize) -> Result<()> {
        let mut file = fs::File::create(path)?;
        let summary = self.summary();

        writeln!(
            file,
            "DRT conversion run: {}",
            self.started_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(file)?;

        writeln!(file, "========= DISCOVERY =========")?;
        for event in &self.events {
            writeln!(file, "{}", event)?;
        }
        writeln!(file)?;

        writeln!(file, "========= CONVERSION =========")?;
        for outcome in &self.outcomes {
            writeln!(file, "{}", outcome.log_line())?;
        }
        writeln!(file)?;

        writeln!(file, "========= SUMMARY =========")?;
        writeln!(file, "converted: {}", summary.converted)?;
        writeln!(file, "skipped duplicates: {}", summary.skipped_duplicates)?;
        writeln!(file, "failed: {}", summary.failed)?;
        writeln!(file, "registry entries: {}", registry_entries)?;

        Ok(())
    }

    /// Write the log and persist the registry snapshot. The log is written
    /// first so a registry save failure still leaves a complete account of
    /// the run on disk.
    pub fn persist(
        &self,
        log_path: &Path,
        registry: &DedupRegistry,
        registry_path: &Path,
    ) -> Result<()> {
        self.write_log(log_path, registry.len())?;
        registry.save(registry_path)?;
        Ok(())
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}
