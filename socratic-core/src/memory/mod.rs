//! Tiered dialog memory.
//!
//! Exchanges are persisted one file per record under a memory root split
//! into partitions:
//!
//! - **short_term**: exchanges younger than the promotion threshold
//! - **long_term**: exchanges at or past the threshold
//! - **episodic**: a copy of every promoted exchange, whatever its tier
//! - **truth**: conclusions that passed the validation gate
//!
//! ## Example
//!
//! ```rust,ignore
//! use socratic_core::memory::{DialogEntry, TieredMemory, Tier};
//! use socratic_core::PartitionNames;
//!
//! let memory = TieredMemory::open("./memory", PartitionNames::default())?;
//! let promotion = memory.promote(&DialogEntry::new("What follows?", "Q"))?;
//! assert_eq!(promotion.tier, Tier::ShortTerm);
//!
//! let episodes = memory.load_partition(Tier::Episodic)?;
//! ```

mod store;
mod types;

pub use store::{classify, MemoryStats, Promotion, TieredMemory};
pub use types::{DialogEntry, MemoryPayload, MemoryRecord, Tier, ValidTruth};
