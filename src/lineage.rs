//! Parser for the `efetch` taxonomy XML document.
//!
//! quick-xml never resolves external entities and only expands the five
//! predefined ones. Documents that declare entities in their DOCTYPE are
//! refused outright before deserialization.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Deserialize;

use crate::domain::{LineageEntry, TaxonId, TaxonRecord};
use crate::error::TaxonError;

#[derive(Debug, Deserialize)]
struct TaxaSet {
    #[serde(rename = "Taxon", default)]
    taxa: Vec<TaxonElement>,
}

#[derive(Debug, Deserialize)]
struct TaxonElement {
    #[serde(rename = "TaxId", default)]
    tax_id: Option<String>,
    #[serde(rename = "ScientificName", default)]
    scientific_name: Option<String>,
    #[serde(rename = "Rank", default)]
    rank: Option<String>,
    #[serde(rename = "LineageEx", default)]
    lineage: Option<LineageEx>,
}

#[derive(Debug, Deserialize)]
struct LineageEx {
    #[serde(rename = "Taxon", default)]
    taxa: Vec<TaxonElement>,
}

struct TaxonFields {
    rank: String,
    scientific_name: String,
    taxon_id: TaxonId,
}

impl TaxonElement {
    fn fields(&self) -> Result<TaxonFields, TaxonError> {
        let rank = required(&self.rank, "Rank")?;
        let scientific_name = required(&self.scientific_name, "ScientificName")?;
        let taxon_id = required(&self.tax_id, "TaxId")?.parse::<TaxonId>()?;
        Ok(TaxonFields {
            rank: rank.to_string(),
            scientific_name: scientific_name.to_string(),
            taxon_id,
        })
    }
}

fn required<'a>(value: &'a Option<String>, element: &str) -> Result<&'a str, TaxonError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| TaxonError::MalformedResponse(format!("missing <{element}> element")))
}

pub fn parse_taxon_xml(xml: &str) -> Result<TaxonRecord, TaxonError> {
    reject_entity_declarations(xml)?;

    let set: TaxaSet = quick_xml::de::from_str(xml)
        .map_err(|err| TaxonError::MalformedResponse(format!("invalid taxonomy XML: {err}")))?;
    let root = set
        .taxa
        .first()
        .ok_or_else(|| TaxonError::MalformedResponse("missing <Taxon> element".to_string()))?;
    let fields = root.fields()?;

    let ancestors = root
        .lineage
        .as_ref()
        .ok_or_else(|| TaxonError::MalformedResponse("missing <LineageEx> element".to_string()))?;
    let mut lineage: BTreeMap<String, Vec<LineageEntry>> = BTreeMap::new();
    for taxon in &ancestors.taxa {
        let ancestor = taxon.fields()?;
        lineage.entry(ancestor.rank).or_default().push(LineageEntry {
            scientific_name: ancestor.scientific_name,
            taxon_id: ancestor.taxon_id,
        });
    }

    Ok(TaxonRecord::new(
        fields.rank,
        fields.scientific_name,
        fields.taxon_id,
        lineage,
    ))
}

fn reject_entity_declarations(xml: &str) -> Result<(), TaxonError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::DocType(doctype)) => {
                let text = String::from_utf8_lossy(&doctype);
                if text.contains("<!ENTITY") {
                    return Err(TaxonError::MalformedResponse(
                        "entity declarations are not accepted".to_string(),
                    ));
                }
            }
            Ok(Event::Start(_)) | Ok(Event::Empty(_)) | Ok(Event::Eof) => return Ok(()),
            Ok(_) => {}
            Err(err) => {
                return Err(TaxonError::MalformedResponse(format!(
                    "invalid taxonomy XML: {err}"
                )));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const FIXTURE: &str = r#"<?xml version="1.0" ?>
<!DOCTYPE TaxaSet PUBLIC "-//NLM//DTD Taxon, 14th January 2002//EN" "https://www.ncbi.nlm.nih.gov/entrez/query/DTD/taxon.dtd">
<TaxaSet>
  <Taxon>
    <TaxId>42</TaxId>
    <ScientificName>Foo bar</ScientificName>
    <ParentTaxId>7</ParentTaxId>
    <Rank>species</Rank>
    <GeneticCode>
      <GCId>1</GCId>
      <GCName>Standard</GCName>
    </GeneticCode>
    <LineageEx>
      <Taxon>
        <TaxId>1</TaxId>
        <ScientificName>First clade</ScientificName>
        <Rank>clade</Rank>
      </Taxon>
      <Taxon>
        <TaxId>2</TaxId>
        <ScientificName>Second clade</ScientificName>
        <Rank>clade</Rank>
      </Taxon>
      <Taxon>
        <TaxId>7</TaxId>
        <ScientificName>Foo</ScientificName>
        <Rank>genus</Rank>
      </Taxon>
    </LineageEx>
  </Taxon>
</TaxaSet>
"#;

    #[test]
    fn parses_root_and_grouped_lineage() {
        let record = parse_taxon_xml(FIXTURE).unwrap();
        assert_eq!(record.rank(), "species");
        assert_eq!(record.scientific_name(), "Foo bar");
        assert_eq!(record.taxon_id(), TaxonId::new(42));

        let clades = record.ancestors("clade");
        assert_eq!(clades.len(), 2);
        assert_eq!(clades[0].scientific_name, "First clade");
        assert_eq!(clades[0].taxon_id, TaxonId::new(1));
        assert_eq!(clades[1].scientific_name, "Second clade");
        assert_eq!(record.ancestors("genus")[0].taxon_id, TaxonId::new(7));
    }

    #[test]
    fn missing_rank_names_the_element() {
        let xml = "<TaxaSet><Taxon><TaxId>1</TaxId><ScientificName>X</ScientificName>\
                   <LineageEx/></Taxon></TaxaSet>";
        let err = parse_taxon_xml(xml).unwrap_err();
        assert_matches!(err, TaxonError::MalformedResponse(ref msg) if msg.contains("Rank"));
    }

    #[test]
    fn empty_lineage_is_accepted() {
        let xml = "<TaxaSet><Taxon><TaxId>1</TaxId><ScientificName>root</ScientificName>\
                   <Rank>no rank</Rank><LineageEx/></Taxon></TaxaSet>";
        let record = parse_taxon_xml(xml).unwrap();
        assert_eq!(record.taxon_id(), TaxonId::new(1));
        assert!(record.lineage().is_empty());
    }

    #[test]
    fn blank_elements_count_as_missing() {
        let xml = "<TaxaSet><Taxon><TaxId>1</TaxId><ScientificName>X</ScientificName>\
                   <Rank/><LineageEx/></Taxon></TaxaSet>";
        let err = parse_taxon_xml(xml).unwrap_err();
        assert_matches!(err, TaxonError::MalformedResponse(ref msg) if msg.contains("Rank"));

        let xml = "<TaxaSet><Taxon><TaxId>1</TaxId><ScientificName>  </ScientificName>\
                   <Rank>species</Rank><LineageEx/></Taxon></TaxaSet>";
        let err = parse_taxon_xml(xml).unwrap_err();
        assert_matches!(
            err,
            TaxonError::MalformedResponse(ref msg) if msg.contains("ScientificName")
        );
    }

    #[test]
    fn empty_taxa_set_is_malformed() {
        let err = parse_taxon_xml("<TaxaSet></TaxaSet>").unwrap_err();
        assert_matches!(err, TaxonError::MalformedResponse(ref msg) if msg.contains("Taxon"));
    }

    #[test]
    fn missing_lineage_is_malformed() {
        let xml = "<TaxaSet><Taxon><TaxId>1</TaxId><ScientificName>X</ScientificName>\
                   <Rank>no rank</Rank></Taxon></TaxaSet>";
        let err = parse_taxon_xml(xml).unwrap_err();
        assert_matches!(err, TaxonError::MalformedResponse(ref msg) if msg.contains("LineageEx"));
    }

    #[test]
    fn non_numeric_tax_id_is_malformed() {
        let xml = "<TaxaSet><Taxon><TaxId>x1</TaxId><ScientificName>X</ScientificName>\
                   <Rank>species</Rank><LineageEx/></Taxon></TaxaSet>";
        assert_matches!(parse_taxon_xml(xml), Err(TaxonError::MalformedResponse(_)));
    }

    #[test]
    fn refuses_entity_declarations() {
        let xml = r#"<?xml version="1.0"?>
<!DOCTYPE TaxaSet [ <!ENTITY lol "lol"> <!ENTITY lol2 "&lol;&lol;&lol;"> ]>
<TaxaSet><Taxon><TaxId>1</TaxId><ScientificName>&lol2;</ScientificName>
<Rank>species</Rank><LineageEx/></Taxon></TaxaSet>"#;
        let err = parse_taxon_xml(xml).unwrap_err();
        assert_matches!(err, TaxonError::MalformedResponse(ref msg) if msg.contains("entity"));
    }
}
