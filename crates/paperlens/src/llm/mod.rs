//! Completion routing, model catalog, and stream transcoding.

pub mod catalog;
pub mod proxy;
pub mod transcode;

pub use catalog::ModelCatalog;
pub use proxy::{ChatRequest, CompletionProxy, SYSTEM_PROMPT};
pub use transcode::{DeltaDecoder, transcode};
