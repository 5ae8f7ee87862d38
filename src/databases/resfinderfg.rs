//! ResFinderFG adapter: the last pipe token of the fasta header is an
//! antibiotic acronym, expanded through a built-in dictionary that can be
//! extended from an optional `ACR: Name` annotation file.

use std::collections::HashMap;

use camino::Utf8Path;

use crate::domain::SourceDb;
use crate::error::PanResError;
use crate::model::KnowledgeBase;
use crate::normalize::title_case;
use crate::report::{AdapterReport, gene_label};
use crate::resolve::gene_target;

/// Acronyms recovered by hand from the functional-metagenomics clone names;
/// the annotation file can add to or override these.
fn builtin_acronyms() -> HashMap<String, String> {
    [
        ("SMZ", "Sulfamethazine"),
        ("AMP", "Ampicillin"),
        ("AZM", "Azithromycin"),
        ("CHL", "Chloramphenicol"),
        ("AMC", "Amoxicillin+Clavulanic acid"),
        ("KAN", "Kanamycin"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

pub fn annotate(
    kb: &mut KnowledgeBase,
    acronym_file: Option<&Utf8Path>,
) -> Result<AdapterReport, PanResError> {
    const DB: SourceDb = SourceDb::ResFinderFg;
    let mut acronyms = builtin_acronyms();
    if let Some(path) = acronym_file {
        if !path.as_std_path().exists() {
            return Err(PanResError::InputNotFound(path.to_path_buf().into_std_path_buf()));
        }
        let content = std::fs::read_to_string(path.as_std_path())
            .map_err(|err| PanResError::Filesystem(format!("read {path}: {err}")))?;
        for line in content.lines() {
            if let Some((acronym, name)) = line.split_once(':') {
                acronyms.insert(acronym.trim().to_string(), name.trim().to_string());
            }
        }
    }

    let mut report = AdapterReport::new(DB);
    for (gene, original) in kb.genes.genes_from_database(DB) {
        let header = kb
            .genes
            .original(original)
            .fasta_headers
            .first()
            .cloned()
            .unwrap_or_default()
            .replace("|ResFinderFG", "");
        let Some(acronym) = header.split('|').next_back().filter(|t| !t.is_empty()) else {
            report.record_extraction_failure("header", gene_label(&kb.genes, gene, original));
            continue;
        };
        let expanded = acronyms
            .get(acronym)
            .map(String::as_str)
            .unwrap_or(acronym);
        let label = title_case(expanded);

        if let Some(accession) = header.split('|').nth(1).filter(|t| !t.is_empty()) {
            kb.genes.gene_mut(gene).accessions.insert(accession.to_string());
            kb.genes
                .original_mut(original)
                .accessions
                .insert(accession.to_string());
        }

        if gene_target(&mut kb.taxonomy, &mut kb.genes, gene, original, &label, Some(DB))
            .is_err()
        {
            // Grouped under the raw acronym: the usual fix is a missing
            // dictionary entry, not a missing taxonomy node.
            report.record_extraction_failure(acronym, gene_label(&kb.genes, gene, original));
        }
    }

    report.log_summary();
    Ok(report)
}
