use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TaxonError;

/// NCBI taxonomy identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxonId(u64);

impl TaxonId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaxonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaxonId {
    type Err = TaxonError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let is_valid = !trimmed.is_empty() && trimmed.chars().all(|ch| ch.is_ascii_digit());
        if !is_valid {
            return Err(TaxonError::MalformedResponse(format!(
                "expected a taxon id made of decimal digits, got {value:?}"
            )));
        }
        trimmed
            .parse::<u64>()
            .map(Self)
            .map_err(|err| TaxonError::MalformedResponse(format!("taxon id {value:?}: {err}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageEntry {
    pub scientific_name: String,
    pub taxon_id: TaxonId,
}

/// A taxon together with its ancestors, grouped by rank.
///
/// Ranks such as `clade` occur several times in one lineage, so each rank maps
/// to the entries carrying it, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonRecord {
    rank: String,
    scientific_name: String,
    taxon_id: TaxonId,
    lineage: BTreeMap<String, Vec<LineageEntry>>,
}

impl TaxonRecord {
    pub fn new(
        rank: String,
        scientific_name: String,
        taxon_id: TaxonId,
        lineage: BTreeMap<String, Vec<LineageEntry>>,
    ) -> Self {
        Self {
            rank,
            scientific_name,
            taxon_id,
            lineage,
        }
    }

    pub fn rank(&self) -> &str {
        &self.rank
    }

    pub fn scientific_name(&self) -> &str {
        &self.scientific_name
    }

    pub fn taxon_id(&self) -> TaxonId {
        self.taxon_id
    }

    pub fn lineage(&self) -> &BTreeMap<String, Vec<LineageEntry>> {
        &self.lineage
    }

    pub fn lineage_ranks(&self) -> impl Iterator<Item = &str> {
        self.lineage.keys().map(String::as_str)
    }

    pub fn ancestors(&self, rank: &str) -> &[LineageEntry] {
        self.lineage
            .get(rank)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn restricted_to(&self, ranks: &BTreeSet<String>) -> Self {
        let lineage = self
            .lineage
            .iter()
            .filter(|(rank, _)| ranks.contains(rank.as_str()))
            .map(|(rank, entries)| (rank.clone(), entries.clone()))
            .collect();
        Self {
            rank: self.rank.clone(),
            scientific_name: self.scientific_name.clone(),
            taxon_id: self.taxon_id,
            lineage,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn entry(name: &str, id: u64) -> LineageEntry {
        LineageEntry {
            scientific_name: name.to_string(),
            taxon_id: TaxonId::new(id),
        }
    }

    #[test]
    fn parse_taxon_id_valid() {
        let id: TaxonId = " 9606 ".parse().unwrap();
        assert_eq!(id.as_u64(), 9606);
    }

    #[test]
    fn parse_taxon_id_invalid() {
        assert_matches!(
            "12a".parse::<TaxonId>(),
            Err(TaxonError::MalformedResponse(_))
        );
        assert_matches!("".parse::<TaxonId>(), Err(TaxonError::MalformedResponse(_)));
        assert_matches!(
            "-5".parse::<TaxonId>(),
            Err(TaxonError::MalformedResponse(_))
        );
    }

    #[test]
    fn restricted_lineage_keeps_accepted_ranks() {
        let mut lineage = BTreeMap::new();
        lineage.insert("genus".to_string(), vec![entry("Foo", 7)]);
        lineage.insert("clade".to_string(), vec![entry("A", 1), entry("B", 2)]);
        let record = TaxonRecord::new(
            "species".to_string(),
            "Foo bar".to_string(),
            TaxonId::new(42),
            lineage,
        );

        let ranks = BTreeSet::from(["genus".to_string()]);
        let restricted = record.restricted_to(&ranks);
        assert_eq!(restricted.lineage_ranks().collect::<Vec<_>>(), vec!["genus"]);
        assert!(restricted.ancestors("clade").is_empty());
        assert_eq!(restricted.taxon_id(), record.taxon_id());
    }
}
