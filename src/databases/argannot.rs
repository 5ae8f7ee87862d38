//! ARG-ANNOT adapter: the class acronym sits in the fasta header as
//! `|(Acr)`, expanded through a fixed acronym table. An unmapped acronym is
//! an extraction failure, distinct from a label that fails to resolve.

use regex::Regex;

use crate::domain::SourceDb;
use crate::error::PanResError;
use crate::model::KnowledgeBase;
use crate::normalize::title_case;
use crate::report::{AdapterReport, gene_label};
use crate::resolve::gene_target;

fn acronym_to_class(acronym: &str) -> Option<&'static str> {
    match acronym {
        "AGly" => Some("Aminoglycoside"),
        "Bla" => Some("Beta-Lactam"),
        "Fos" => Some("Fosfomycin"),
        "Flq" => Some("Fluoroquinolone"),
        "Gly" => Some("Glycopeptide"),
        "MLS" => Some("Macrolide/Lincosamide/Streptogramin B"),
        "Phe" => Some("Phenicol"),
        "Rif" => Some("Rifampin"),
        "Sul" => Some("Sulfonamide"),
        "Tet" => Some("Tetracycline"),
        "Tmt" => Some("Trimethoprim"),
        "Col" => Some("Colistin"),
        _ => None,
    }
}

pub fn annotate(kb: &mut KnowledgeBase) -> Result<AdapterReport, PanResError> {
    const DB: SourceDb = SourceDb::ArgAnnot;
    let acronym_pattern = Regex::new(r"\|\((\w{3,4})\)").unwrap();
    let mut report = AdapterReport::new(DB);

    for (gene, original) in kb.genes.genes_from_database(DB) {
        let header = kb
            .genes
            .original(original)
            .fasta_headers
            .iter()
            .find(|h| h.contains(DB.name()))
            .cloned()
            .unwrap_or_default();
        let acronym = acronym_pattern
            .captures(&header)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str());
        let Some(expanded) = acronym.and_then(acronym_to_class) else {
            let token = acronym.unwrap_or("header");
            report.record_extraction_failure(token, gene_label(&kb.genes, gene, original));
            continue;
        };

        for antibiotic in title_case(expanded).split('/') {
            if gene_target(
                &mut kb.taxonomy,
                &mut kb.genes,
                gene,
                original,
                antibiotic,
                Some(DB),
            )
            .is_err()
            {
                report.record_resolution_failure(antibiotic, gene_label(&kb.genes, gene, original));
            }
        }
    }

    report.log_summary();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acronym_expansion() {
        assert_eq!(acronym_to_class("Bla"), Some("Beta-Lactam"));
        assert_eq!(
            acronym_to_class("MLS"),
            Some("Macrolide/Lincosamide/Streptogramin B")
        );
        assert_eq!(acronym_to_class("Xyz"), None);
    }

    #[test]
    fn acronym_regex_matches_header_group() {
        let pattern = Regex::new(r"\|\((\w{3,4})\)").unwrap();
        let caps = pattern.captures("argannot|(Bla)blaTEM-1|JF910132").unwrap();
        assert_eq!(caps.get(1).unwrap().as_str(), "Bla");
        assert!(pattern.captures("megares|MEG_1|Drugs").is_none());
    }
}
