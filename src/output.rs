use std::io::{self, Write};

use serde::Serialize;

use crate::client::Resolution;
use crate::domain::TaxonRecord;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize)]
pub struct NamedResolution<'a> {
    pub name: &'a str,
    #[serde(flatten)]
    pub resolution: &'a Resolution,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_record(record: &TaxonRecord) -> io::Result<()> {
        Self::print_json(record)
    }

    pub fn print_resolution(name: &str, resolution: &Resolution) -> io::Result<()> {
        Self::print_json(&NamedResolution { name, resolution })
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub fn render_record(record: &TaxonRecord) -> String {
    let mut out = format!(
        "{} ({}) taxid={}\n",
        record.scientific_name(),
        record.rank(),
        record.taxon_id()
    );
    for (rank, entries) in record.lineage() {
        let names = entries
            .iter()
            .map(|entry| format!("{} [{}]", entry.scientific_name, entry.taxon_id))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!("  {rank}: {names}\n"));
    }
    out
}

pub fn render_resolution(name: &str, resolution: &Resolution) -> String {
    match resolution {
        Resolution::Resolved(record) => format!("{name}: {}", render_record(record)),
        Resolution::NoMatch => format!("{name}: no match\n"),
        Resolution::Ambiguous { candidates } => {
            format!("{name}: ambiguous ({candidates} candidates)\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::domain::{LineageEntry, TaxonId};

    #[test]
    fn renders_lineage_by_rank() {
        let mut lineage = BTreeMap::new();
        lineage.insert(
            "genus".to_string(),
            vec![LineageEntry {
                scientific_name: "Asellus".to_string(),
                taxon_id: TaxonId::new(92526),
            }],
        );
        let record = TaxonRecord::new(
            "species".to_string(),
            "Asellus aquaticus".to_string(),
            TaxonId::new(92525),
            lineage,
        );
        let text = render_record(&record);
        assert!(text.starts_with("Asellus aquaticus (species) taxid=92525"));
        assert!(text.contains("genus: Asellus [92526]"));
    }

    #[test]
    fn serializes_tagged_outcomes() {
        let resolution = Resolution::Ambiguous { candidates: 3 };
        let value = serde_json::to_value(NamedResolution {
            name: "Foo",
            resolution: &resolution,
        })
        .unwrap();
        assert_eq!(value["name"], "Foo");
        assert_eq!(value["outcome"], "ambiguous");
        assert_eq!(value["candidates"], 3);
    }
}
