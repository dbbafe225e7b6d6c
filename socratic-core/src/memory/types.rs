//! Types for tiered dialog memory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One instruction/response exchange. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogEntry {
    pub instruction: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

impl DialogEntry {
    /// An exchange that happened now.
    pub fn new(instruction: impl Into<String>, response: impl Into<String>) -> Self {
        Self::at(instruction, response, Utc::now())
    }

    /// An exchange that happened at `timestamp`.
    pub fn at(
        instruction: impl Into<String>,
        response: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            instruction: instruction.into(),
            response: response.into(),
            timestamp,
        }
    }
}

/// A conclusion that passed the validation gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidTruth {
    pub statement: String,
    /// Premises the statement was drawn from
    #[serde(default)]
    pub premises: Vec<String>,
}

impl ValidTruth {
    pub fn new(statement: impl Into<String>, premises: Vec<String>) -> Self {
        Self {
            statement: statement.into(),
            premises,
        }
    }
}

/// Memory partition a record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    ShortTerm,
    LongTerm,
    Episodic,
    Truth,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::ShortTerm, Tier::LongTerm, Tier::Episodic, Tier::Truth];
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ShortTerm => write!(f, "short_term"),
            Self::LongTerm => write!(f, "long_term"),
            Self::Episodic => write!(f, "episodic"),
            Self::Truth => write!(f, "truth"),
        }
    }
}

/// Tagged payload of a memory record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tier", content = "data", rename_all = "snake_case")]
pub enum MemoryPayload {
    ShortTerm(DialogEntry),
    LongTerm(DialogEntry),
    Episodic(DialogEntry),
    Truth(ValidTruth),
}

impl MemoryPayload {
    pub fn tier(&self) -> Tier {
        match self {
            Self::ShortTerm(_) => Tier::ShortTerm,
            Self::LongTerm(_) => Tier::LongTerm,
            Self::Episodic(_) => Tier::Episodic,
            Self::Truth(_) => Tier::Truth,
        }
    }

    /// Wrap a dialog entry for a dialog tier. `None` for [`Tier::Truth`].
    pub fn dialog(tier: Tier, entry: DialogEntry) -> Option<Self> {
        match tier {
            Tier::ShortTerm => Some(Self::ShortTerm(entry)),
            Tier::LongTerm => Some(Self::LongTerm(entry)),
            Tier::Episodic => Some(Self::Episodic(entry)),
            Tier::Truth => None,
        }
    }

    pub fn dialog_entry(&self) -> Option<&DialogEntry> {
        match self {
            Self::ShortTerm(e) | Self::LongTerm(e) | Self::Episodic(e) => Some(e),
            Self::Truth(_) => None,
        }
    }
}

/// A persisted record. Written once, never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: Uuid,
    /// When the record was written
    pub timestamp: DateTime<Utc>,
    pub payload: MemoryPayload,
}

impl MemoryRecord {
    pub fn new(payload: MemoryPayload, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            payload,
        }
    }

    pub fn tier(&self) -> Tier {
        self.payload.tier()
    }

    /// File name derived from the write time, made unique by the id.
    pub fn file_name(&self) -> String {
        let id = self.id.simple().to_string();
        format!(
            "{}-{}.json",
            self.timestamp.format("%Y%m%dT%H%M%S%.6fZ"),
            &id[..8]
        )
    }
}
