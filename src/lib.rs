pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod eutils;
pub mod http;
pub mod lineage;
pub mod output;
pub mod preprocess;

pub use client::{Resolution, TaxonomyClient};
pub use config::{ClientConfig, ConfigLoader};
pub use domain::{LineageEntry, TaxonId, TaxonRecord};
pub use error::TaxonError;
pub use preprocess::{DefaultPreprocessor, NamePreprocessor};
