pub mod classifier;
pub mod file_discoverer;

pub use classifier::{EntryClass, EntryClassifier};
pub use file_discoverer::{DiscoveredFile, Discovery, DiscoveryStatistics, FileDiscoverer};
