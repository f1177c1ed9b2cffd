use serde::Deserialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::domain::{TaxonId, TaxonRecord};
use crate::error::TaxonError;
use crate::http::{HttpTransport, Requester, RetryPolicy};
use crate::lineage::parse_taxon_xml;

const TAXONOMY_DB: &str = "taxonomy";

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    esearchresult: SearchResult,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    idlist: Vec<String>,
}

pub fn parse_search_ids(body: &str) -> Result<Vec<String>, TaxonError> {
    let envelope: SearchEnvelope = serde_json::from_str(body)
        .map_err(|err| TaxonError::MalformedResponse(format!("esearch payload: {err}")))?;
    Ok(envelope.esearchresult.idlist)
}

/// What a taxonomy search yielded for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdMatch {
    Unique(TaxonId),
    NoMatch,
    Ambiguous(usize),
}

impl IdMatch {
    pub fn into_result(self, name: &str) -> Result<TaxonId, TaxonError> {
        match self {
            IdMatch::Unique(id) => Ok(id),
            IdMatch::NoMatch => Err(TaxonError::NoMatch(name.to_string())),
            IdMatch::Ambiguous(candidates) => Err(TaxonError::Ambiguous {
                name: name.to_string(),
                candidates,
            }),
        }
    }
}

pub fn select_single_id(ids: &[String]) -> Result<IdMatch, TaxonError> {
    match ids {
        [] => Ok(IdMatch::NoMatch),
        [only] => Ok(IdMatch::Unique(only.parse::<TaxonId>()?)),
        many => Ok(IdMatch::Ambiguous(many.len())),
    }
}

/// Thin wrapper over the `esearch` and `efetch` endpoints of the taxonomy
/// database.
pub struct EutilsClient<T: HttpTransport> {
    requester: Requester<T>,
    base_url: String,
    email: String,
    tool: String,
    api_key: Option<String>,
}

impl<T: HttpTransport> EutilsClient<T> {
    pub fn with_policy(config: &ClientConfig, transport: T, policy: RetryPolicy) -> Self {
        Self {
            requester: Requester::new(transport, policy),
            base_url: config.base_url().to_string(),
            email: config.contact_email().to_string(),
            tool: config.tool_name().to_string(),
            api_key: config.api_key().map(str::to_string),
        }
    }

    pub fn search_url(&self) -> String {
        format!("{}esearch.fcgi", self.base_url)
    }

    pub fn fetch_url(&self) -> String {
        format!("{}efetch.fcgi", self.base_url)
    }

    fn common_params(&self) -> Vec<(&str, &str)> {
        let mut params = vec![
            ("email", self.email.as_str()),
            ("tool", self.tool.as_str()),
            ("db", TAXONOMY_DB),
        ];
        if let Some(api_key) = &self.api_key {
            params.push(("api_key", api_key.as_str()));
        }
        params
    }

    pub fn search_ids(&self, term: &str) -> Result<Vec<String>, TaxonError> {
        let mut params = self.common_params();
        params.extend([("term", term), ("rettype", "uilist"), ("retmode", "json")]);
        let body = self.requester.get(&self.search_url(), &params)?;
        let ids = parse_search_ids(&body)?;
        debug!(term, candidates = ids.len(), "esearch finished");
        Ok(ids)
    }

    pub fn match_id(&self, term: &str) -> Result<IdMatch, TaxonError> {
        let ids = self.search_ids(term)?;
        select_single_id(&ids)
    }

    pub fn resolve_id(&self, term: &str) -> Result<TaxonId, TaxonError> {
        self.match_id(term)?.into_result(term)
    }

    pub fn fetch_lineage(&self, id: TaxonId) -> Result<TaxonRecord, TaxonError> {
        let id = id.to_string();
        let mut params = self.common_params();
        params.push(("id", id.as_str()));
        let body = self.requester.get(&self.fetch_url(), &params)?;
        parse_taxon_xml(&body)
    }
}
