//! Data models for paper metadata and chat streaming.
//!
//! All entities are request-scoped value objects: constructed once, never
//! mutated. Serde renames follow the wire shapes the frontend consumes.

mod chat;
mod metadata;

pub use chat::{ChatTurn, DeltaEvent, ModelEntry, Provider};
pub use metadata::{ExtractedIdentifiers, PaperMetadata, UNTITLED};
