//! CARD adapter: the ARO accession is pulled out of the fasta header by
//! regex and keys into the `aro_index.tsv` side table.

use std::collections::{BTreeSet, HashMap};

use camino::Utf8Path;
use regex::Regex;

use super::{Table, field};
use crate::domain::SourceDb;
use crate::error::PanResError;
use crate::model::KnowledgeBase;
use crate::normalize::{correct_synonym, strip_card_decorations, title_case};
use crate::report::{AdapterReport, gene_label};
use crate::resolve::gene_target;

#[derive(Default)]
struct Row {
    phenotypes: BTreeSet<String>,
    accessions: BTreeSet<String>,
    cvterm: Option<String>,
}

pub fn annotate(kb: &mut KnowledgeBase, file: &Utf8Path) -> Result<AdapterReport, PanResError> {
    const DB: SourceDb = SourceDb::Card;
    let table = Table::open(file, 0)?;
    let aro_col = table.column("ARO Accession")?;
    let class_col = table.column("Drug Class")?;
    let dna_col = table.column("DNA Accession")?;
    let cvterm_col = table.column("CVTERM ID")?;

    let mut rows: HashMap<String, Row> = HashMap::new();
    for record in table.records() {
        let aro = field(record, aro_col).to_string();
        if aro.is_empty() {
            continue;
        }
        let row = rows.entry(aro).or_default();
        for part in field(record, class_col).split(';') {
            let phenotype =
                correct_synonym(&title_case(strip_card_decorations(part).trim())).to_string();
            if !phenotype.is_empty() {
                row.phenotypes.insert(phenotype);
            }
        }
        for accession in field(record, dna_col).split(';') {
            if !accession.trim().is_empty() {
                row.accessions.insert(accession.trim().to_string());
            }
        }
        let cvterm = field(record, cvterm_col);
        if row.cvterm.is_none() && !cvterm.is_empty() {
            row.cvterm = Some(cvterm.to_string());
        }
    }

    let aro_pattern = Regex::new(r"ARO:\d+").unwrap();

    let mut report = AdapterReport::new(DB);
    for (gene, original) in kb.genes.genes_from_database(DB) {
        let header = kb
            .genes
            .original(original)
            .fasta_headers
            .first()
            .cloned()
            .unwrap_or_default();
        let Some(aro) = aro_pattern.find(&header).map(|m| m.as_str()) else {
            report.record_extraction_failure("ARO", gene_label(&kb.genes, gene, original));
            continue;
        };
        let Some(row) = rows.get(aro) else {
            report.record_missing_row(format!(
                "{} ({aro})",
                gene_label(&kb.genes, gene, original)
            ));
            continue;
        };

        for phenotype in &row.phenotypes {
            if gene_target(
                &mut kb.taxonomy,
                &mut kb.genes,
                gene,
                original,
                phenotype,
                Some(DB),
            )
            .is_err()
            {
                report.record_resolution_failure(phenotype, gene_label(&kb.genes, gene, original));
            }
        }

        for accession in &row.accessions {
            kb.genes.gene_mut(gene).accessions.insert(accession.clone());
            kb.genes.original_mut(original).accessions.insert(accession.clone());
        }
        if let Some(cvterm) = &row.cvterm {
            kb.genes
                .gene_mut(gene)
                .card_links
                .insert(format!("https://card.mcmaster.ca/ontology/{cvterm}"));
        }
    }

    report.log_summary();
    Ok(report)
}
