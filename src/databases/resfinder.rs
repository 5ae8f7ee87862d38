//! ResFinder adapter: annotations come from the side table
//! `phenotypes.txt`, keyed by the gene-accession name the original gene
//! carries verbatim.

use std::collections::{BTreeSet, HashMap};

use camino::Utf8Path;

use super::{Table, field};
use crate::domain::SourceDb;
use crate::error::PanResError;
use crate::model::KnowledgeBase;
use crate::normalize::{correct_synonym, strip_plural, title_case};
use crate::report::{AdapterReport, gene_label};
use crate::resolve::gene_target;

#[derive(Default)]
struct Row {
    classes: BTreeSet<String>,
    phenotypes: BTreeSet<String>,
    mechanisms: BTreeSet<String>,
}

pub fn annotate(kb: &mut KnowledgeBase, file: &Utf8Path) -> Result<AdapterReport, PanResError> {
    const DB: SourceDb = SourceDb::ResFinder;
    let table = Table::open(file, 0)?;
    let key_col = table.column("Gene_accession no.")?;
    let class_col = table.column("Class")?;
    let phenotype_col = table.column("Phenotype")?;
    let mechanism_col = table.column("Mechanism of resistance")?;

    let mut rows: HashMap<String, Row> = HashMap::new();
    for record in table.records() {
        let key = field(record, key_col).replace('\'', "");
        if key.is_empty() {
            continue;
        }
        let row = rows.entry(key).or_default();
        for part in field(record, class_col).split(',') {
            let class = clean_class(part);
            if !class.is_empty() {
                row.classes.insert(class);
            }
        }
        for part in field(record, phenotype_col).split(',') {
            let phenotype = clean_phenotype(part);
            if !phenotype.is_empty() {
                row.phenotypes.insert(phenotype);
            }
        }
        let mechanism = field(record, mechanism_col);
        if !mechanism.is_empty() && mechanism != "Unknown" {
            row.mechanisms.insert(mechanism.to_string());
        }
    }

    let mut report = AdapterReport::new(DB);
    for (gene, original) in kb.genes.genes_from_database(DB) {
        let Some(row) = rows.get(&kb.genes.original(original).name) else {
            report.record_missing_row(gene_label(&kb.genes, gene, original));
            continue;
        };

        for class in &row.classes {
            if gene_target(&mut kb.taxonomy, &mut kb.genes, gene, original, class, Some(DB))
                .is_err()
            {
                report.record_resolution_failure(class, gene_label(&kb.genes, gene, original));
            }
        }
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
        for mechanism in &row.mechanisms {
            kb.genes.gene_mut(gene).mechanisms.insert(mechanism.clone());
        }

        // The DNA accession is the trailing underscore token of the
        // database-native name.
        let og_name = kb.genes.original(original).name.clone();
        let accession = og_name.rsplit('_').next().unwrap_or(&og_name).to_string();
        if !accession.is_empty() {
            kb.genes.gene_mut(gene).accessions.insert(accession.clone());
            kb.genes.original_mut(original).accessions.insert(accession);
        }
    }

    report.log_summary();
    Ok(report)
}

fn clean_class(raw: &str) -> String {
    let cleaned = raw.replace(" Unknown", "").replace(" unknown", "");
    correct_synonym(&title_case(cleaned.trim())).to_string()
}

fn clean_phenotype(raw: &str) -> String {
    let cleaned = raw.replace("Unknown", "");
    let titled = title_case(cleaned.trim());
    correct_synonym(strip_plural(&titled)).to_string()
}
