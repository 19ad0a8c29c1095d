// ABOUTME: The Engine trait every extraction backend implements, and the EngineSet the selector draws from.
// ABOUTME: Built-in engines: article (trafilatura slot), readability scoring and the basic tag stripper.

//! Extraction engines.
//!
//! An engine turns a full HTML document into a candidate body fragment plus
//! whatever metadata it can see. Engines are stateless and shared across
//! tasks, so they must be `Send + Sync`.

pub mod article;
pub mod basic;
pub mod readability;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use url::Url;

use crate::result::{EngineKind, Link};

pub use article::ArticleEngine;
pub use basic::BasicEngine;
pub use readability::ReadabilityEngine;

/// What an engine hands back for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOutput {
    pub title: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    /// Extracted body as an HTML fragment, not yet normalized.
    pub body_html: String,
    /// Links seen in the body, resolved against the base URL.
    pub links: Vec<Link>,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no content found")]
    NoContent,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// An extraction backend.
pub trait Engine: Send + Sync {
    fn run(&self, html: &str, base: &Url) -> Result<EngineOutput, EngineError>;
}

/// One engine per [`EngineKind`].
#[derive(Clone)]
pub struct EngineSet {
    trafilatura: Arc<dyn Engine>,
    readability: Arc<dyn Engine>,
    basic: Arc<dyn Engine>,
}

impl EngineSet {
    /// The built-in engines.
    pub fn builtin() -> Self {
        Self {
            trafilatura: Arc::new(ArticleEngine),
            readability: Arc::new(ReadabilityEngine),
            basic: Arc::new(BasicEngine),
        }
    }

    /// Replace the engine in one slot.
    pub fn with_engine(mut self, kind: EngineKind, engine: Arc<dyn Engine>) -> Self {
        match kind {
            EngineKind::Trafilatura => self.trafilatura = engine,
            EngineKind::Readability => self.readability = engine,
            EngineKind::Basic => self.basic = engine,
        }
        self
    }

    pub fn get(&self, kind: EngineKind) -> &dyn Engine {
        match kind {
            EngineKind::Trafilatura => self.trafilatura.as_ref(),
            EngineKind::Readability => self.readability.as_ref(),
            EngineKind::Basic => self.basic.as_ref(),
        }
    }
}

impl Default for EngineSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for EngineSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineSet").finish_non_exhaustive()
    }
}
