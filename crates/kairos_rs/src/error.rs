//! Error type for engine construction and engine calls.

use kairos_batch::BatchError;
use kairos_cache::CacheError;
use kairos_config::ConfigError;
use kairos_search::SearchError;
use kairos_validate::ValidateError;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("cache setup failed: {0}")]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error(transparent)]
    Validate(#[from] ValidateError),
    #[error("result encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
    /// `validate` was called on an engine built without a catalogue.
    #[error("no reference catalogue loaded")]
    NoCatalogue,
    #[error("logging setup failed: {0}")]
    Logging(String),
}
