pub mod converter;
pub mod run_report;

pub use converter::{ConversionOutcome, ConversionPipeline};
pub use run_report::{RunReport, RunSummary};
