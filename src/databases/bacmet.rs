//! BacMet adapter: experimentally confirmed metal/biocide resistance. The
//! mapping table is keyed by lowercased gene name (header token), gene
//! names exploded on `/`; compound cells carry a free-text name with an
//! optional embedded `[class ...]` group, each resolved separately.

use std::collections::{BTreeSet, HashMap};

use camino::Utf8Path;
use regex::Regex;

use super::{Table, field};
use crate::domain::SourceDb;
use crate::error::PanResError;
use crate::model::KnowledgeBase;
use crate::report::{AdapterReport, gene_label};
use crate::resolve::gene_target;

#[derive(Default)]
struct Row {
    compounds: BTreeSet<String>,
    accessions: BTreeSet<String>,
}

pub fn annotate(kb: &mut KnowledgeBase, file: &Utf8Path) -> Result<AdapterReport, PanResError> {
    const DB: SourceDb = SourceDb::BacMet;
    let table = Table::open(file, 0)?;
    let name_col = table.column("Gene_name")?;
    let compound_col = table.column("Compound")?;
    let accession_col = table.column("Accession")?;

    let mut rows: HashMap<String, Row> = HashMap::new();
    for record in table.records() {
        for name in field(record, name_col).to_lowercase().split('/') {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let row = rows.entry(name.to_string()).or_default();
            for compound in field(record, compound_col).split(',') {
                if !compound.trim().is_empty() {
                    row.compounds.insert(compound.trim().to_string());
                }
            }
            for accession in field(record, accession_col).split(',') {
                if !accession.trim().is_empty() {
                    row.accessions.insert(accession.trim().to_string());
                }
            }
        }
    }

    let compound_pattern = Regex::new(r"^(\w+(?:\s\w+)?)\s").unwrap();
    let class_pattern = Regex::new(r"^(\w+(?:\s\w+)?)\s\[class\W+(\w+(?:\s\w+)?)\]").unwrap();

    let mut report = AdapterReport::new(DB);
    for (gene, original) in kb.genes.genes_from_database(DB) {
        let header = kb
            .genes
            .original(original)
            .fasta_headers
            .first()
            .cloned()
            .unwrap_or_default();
        // The gene name is the token just before the trailing database tag.
        let Some(name) = header.split('|').rev().nth(1).map(str::to_lowercase) else {
            report.record_extraction_failure("header", gene_label(&kb.genes, gene, original));
            continue;
        };
        let Some(row) = rows.get(&name) else {
            report.record_missing_row(gene_label(&kb.genes, gene, original));
            continue;
        };

        for compound in &row.compounds {
            let (target, class) = if compound.contains("class") {
                match class_pattern.captures(compound) {
                    Some(caps) => (
                        caps.get(1).map(|m| m.as_str().to_string()),
                        caps.get(2).map(|m| m.as_str().to_string()),
                    ),
                    None => (None, None),
                }
            } else {
                (
                    compound_pattern
                        .captures(compound)
                        .and_then(|caps| caps.get(1))
                        .map(|m| m.as_str().to_string()),
                    None,
                )
            };
            let Some(target) = target else {
                report.record_extraction_failure(compound, gene_label(&kb.genes, gene, original));
                continue;
            };
            if gene_target(&mut kb.taxonomy, &mut kb.genes, gene, original, &target, Some(DB))
                .is_err()
            {
                report.record_resolution_failure(&target, gene_label(&kb.genes, gene, original));
            }
            if let Some(class) = class {
                if gene_target(&mut kb.taxonomy, &mut kb.genes, gene, original, &class, Some(DB))
                    .is_err()
                {
                    report.record_resolution_failure(&class, gene_label(&kb.genes, gene, original));
                }
            }
        }

        for accession in &row.accessions {
            kb.genes.gene_mut(gene).accessions.insert(accession.clone());
            kb.genes.original_mut(original).accessions.insert(accession.clone());
        }
    }

    report.log_summary();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_regexes() {
        let compound = Regex::new(r"^(\w+(?:\s\w+)?)\s").unwrap();
        let caps = compound.captures("Copper (Cu)").unwrap();
        assert_eq!(caps.get(1).unwrap().as_str(), "Copper");
        let caps = compound.captures("Hydrogen peroxide (H2O2)").unwrap();
        assert_eq!(caps.get(1).unwrap().as_str(), "Hydrogen peroxide");

        let with_class = Regex::new(r"^(\w+(?:\s\w+)?)\s\[class\W+(\w+(?:\s\w+)?)\]").unwrap();
        let caps = with_class
            .captures("Triclosan [class: phenolic compound]")
            .unwrap();
        assert_eq!(caps.get(1).unwrap().as_str(), "Triclosan");
        assert_eq!(caps.get(2).unwrap().as_str(), "phenolic compound");
    }
}
