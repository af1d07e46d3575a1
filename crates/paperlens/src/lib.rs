//! paperlens
//!
//! Backend for a paper-reading assistant: attach a PDF, get its
//! bibliographic metadata resolved from public catalogs, and chat with a
//! language model about the document over a streamed completion.
//!
//! # Architecture
//!
//! - **Extraction**: DOI / arXiv id / first-page text pulled from the PDF
//!   ([`extract`]).
//! - **Resolution**: CrossRef, Semantic Scholar, and the arXiv feed tried
//!   in a strict fallback order, normalized to one canonical record
//!   ([`catalog`]).
//! - **Completion**: requests proxied to OpenRouter or a local Ollama
//!   endpoint, the SSE response transcoded to line-delimited JSON events
//!   with mid-stream cancellation ([`llm`]).
//!
//! # Example
//!
//! ```no_run
//! use paperlens::catalog::{LookupRequest, MetadataResolver};
//! use paperlens::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let resolver = MetadataResolver::new(&Config::from_env())?;
//!     let request = LookupRequest {
//!         doi: Some("10.1145/1327452.1327492".to_string()),
//!         ..LookupRequest::default()
//!     };
//!
//!     if let Some(paper) = resolver.resolve(&request).await {
//!         println!("{}", paper.title);
//!     }
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod models;
pub mod server;

pub use catalog::MetadataResolver;
pub use config::Config;
pub use error::{ApiError, SourceError};
