// ABOUTME: Main library entry point for the webcontent extractor.
// ABOUTME: Re-exports the public API: Client, ExtractionSelector, FetchRequest, ExtractionResult, engines and errors.

//! webcontent-extractor - fetch web pages and turn them into clean markdown.
//!
//! An [`ExtractionSelector`] runs a fixed ladder of extraction engines over a
//! fetched document and keeps the first body that clears a quality bar. The
//! [`Client`] wraps fetching and selection, alone or for ordered batches.
//!
//! # Example
//!
//! ```no_run
//! use webcontent_extractor::{Client, ExtractError, FetchRequest, Strategy};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ExtractError> {
//!     let client = Client::builder().build();
//!     let request = FetchRequest::new("https://example.com/article")?
//!         .with_strategy(Strategy::Auto);
//!     let result = client.fetch_url(&request).await?;
//!     println!("{}", result.render_markdown(true));
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod dom;
pub mod engines;
pub mod error;
pub mod formats;
pub mod metadata;
pub mod options;
pub mod request;
pub mod resource;
pub mod result;
pub mod selector;

pub use crate::client::{parse_url_list, Client};
pub use crate::engines::{Engine, EngineError, EngineOutput, EngineSet};
pub use crate::error::{ErrorCode, ExtractError};
pub use crate::options::{ClientBuilder, Options};
pub use crate::request::{FetchRequest, Strategy};
pub use crate::result::{render_batch, Citation, EngineKind, ExtractionResult, Link};
pub use crate::selector::{ContentClass, ExtractionSelector};
