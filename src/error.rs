use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum TaxonError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("Entrez request failed: {0}")]
    EntrezHttp(String),

    #[error("Entrez returned status {status}: {message}")]
    EntrezStatus { status: u16, message: String },

    #[error("no taxon matches {0:?}")]
    #[diagnostic(help("check the spelling of the organism name"))]
    NoMatch(String),

    #[error("{name:?} matches {candidates} taxa")]
    #[diagnostic(help("use a more specific organism name"))]
    Ambiguous { name: String, candidates: usize },

    #[error("malformed Entrez response: {0}")]
    MalformedResponse(String),
}

impl TaxonError {
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            TaxonError::EntrezHttp(_) | TaxonError::EntrezStatus { .. }
        )
    }
}
