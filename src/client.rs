use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::domain::{TaxonId, TaxonRecord};
use crate::error::TaxonError;
use crate::eutils::{EutilsClient, IdMatch};
use crate::http::{HttpTransport, ReqwestTransport, RetryPolicy};
use crate::preprocess::{DefaultPreprocessor, NamePreprocessor};

/// Outcome of matching one organism name against the taxonomy database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    Resolved(TaxonRecord),
    NoMatch,
    Ambiguous { candidates: usize },
}

impl Resolution {
    pub fn into_result(self, name: &str) -> Result<TaxonRecord, TaxonError> {
        match self {
            Resolution::Resolved(record) => Ok(record),
            Resolution::NoMatch => Err(TaxonError::NoMatch(name.to_string())),
            Resolution::Ambiguous { candidates } => Err(TaxonError::Ambiguous {
                name: name.to_string(),
                candidates,
            }),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

/// Resolves organism names to taxon records, remembering every outcome by
/// the raw name it was asked for.
///
/// Transport failures and malformed responses are not remembered, so a later
/// call retries them. The cache needs `&mut self`; share a client across
/// threads behind a `Mutex`.
pub struct TaxonomyClient<T: HttpTransport = ReqwestTransport> {
    eutils: EutilsClient<T>,
    preprocessor: Box<dyn NamePreprocessor>,
    accepted_ranks: Option<BTreeSet<String>>,
    known: HashMap<String, Resolution>,
}

impl TaxonomyClient<ReqwestTransport> {
    pub fn new(config: ClientConfig) -> Result<Self, TaxonError> {
        let transport = ReqwestTransport::new(config.timeout())?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: HttpTransport> TaxonomyClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let policy = RetryPolicy::new(config.max_attempts());
        Self::with_policy(config, transport, policy)
    }

    pub fn with_policy(config: ClientConfig, transport: T, policy: RetryPolicy) -> Self {
        Self {
            eutils: EutilsClient::with_policy(&config, transport, policy),
            preprocessor: Box::new(DefaultPreprocessor),
            accepted_ranks: config.accepted_ranks().cloned(),
            known: HashMap::new(),
        }
    }

    pub fn with_preprocessor(mut self, preprocessor: Box<dyn NamePreprocessor>) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    pub fn resolve(&mut self, name: &str) -> Result<TaxonRecord, TaxonError> {
        self.match_name(name)?.into_result(name)
    }

    pub fn match_name(&mut self, name: &str) -> Result<Resolution, TaxonError> {
        if let Some(known) = self.known.get(name) {
            debug!(name, "taxonomy cache hit");
            return Ok(known.clone());
        }

        let term = self.preprocessor.preprocess(name);
        let resolution = match self.eutils.match_id(&term)? {
            IdMatch::Unique(id) => Resolution::Resolved(self.fetch_record(id)?),
            IdMatch::NoMatch => Resolution::NoMatch,
            IdMatch::Ambiguous(candidates) => Resolution::Ambiguous { candidates },
        };
        if let Resolution::Resolved(record) = &resolution {
            info!(
                name,
                term = %term,
                taxon_id = %record.taxon_id(),
                scientific_name = record.scientific_name(),
                "resolved organism"
            );
        }
        self.known.insert(name.to_string(), resolution.clone());
        Ok(resolution)
    }

    pub fn lineage_for_id(&self, id: TaxonId) -> Result<TaxonRecord, TaxonError> {
        self.fetch_record(id)
    }

    pub fn search_ids(&self, term: &str) -> Result<Vec<String>, TaxonError> {
        self.eutils.search_ids(term)
    }

    pub fn unresolved(&self) -> Vec<(&str, &Resolution)> {
        let mut names = self
            .known
            .iter()
            .filter(|(_, resolution)| !resolution.is_resolved())
            .map(|(name, resolution)| (name.as_str(), resolution))
            .collect::<Vec<_>>();
        names.sort_by_key(|(name, _)| *name);
        names
    }

    pub fn cached_len(&self) -> usize {
        self.known.len()
    }

    fn fetch_record(&self, id: TaxonId) -> Result<TaxonRecord, TaxonError> {
        let record = self.eutils.fetch_lineage(id)?;
        Ok(match &self.accepted_ranks {
            Some(ranks) => record.restricted_to(ranks),
            None => record,
        })
    }
}
