pub mod dedup_registry;
pub mod hasher;

pub use dedup_registry::{Claim, DedupRegistry};
pub use hasher::{ContentDigest, ContentHasher};
