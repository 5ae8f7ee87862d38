//! MetalRes adapter. Header-only: each FASTA header names its metals
//! inline as `<metal> resistance`, so no side table is read and
//! resolution runs without a found_in stamp.

use regex::Regex;

use crate::domain::SourceDb;
use crate::error::PanResError;
use crate::model::KnowledgeBase;
use crate::normalize::{correct_synonym, title_case};
use crate::report::{AdapterReport, gene_label};
use crate::resolve::gene_target;

pub fn annotate(kb: &mut KnowledgeBase) -> Result<AdapterReport, PanResError> {
    const DB: SourceDb = SourceDb::MetalRes;
    let metal_pattern = Regex::new(r"\s(\S+)\sresistance").unwrap();

    let mut report = AdapterReport::new(DB);
    for (gene, original) in kb.genes.genes_from_database(DB) {
        let header = kb
            .genes
            .original(original)
            .fasta_headers
            .first()
            .cloned()
            .unwrap_or_default();
        let Some(caps) = metal_pattern.captures(&header) else {
            report.record_extraction_failure("resistance", gene_label(&kb.genes, gene, original));
            continue;
        };
        for metal in caps[1].split('/') {
            let titled = title_case(metal);
            let metal = correct_synonym(&titled);
            if gene_target(&mut kb.taxonomy, &mut kb.genes, gene, original, metal, None).is_err() {
                report.record_resolution_failure(metal, gene_label(&kb.genes, gene, original));
            }
        }

        // Protein accession rides in the original gene name itself.
        if let Some(accession) = kb.genes.original(original).name.rsplit('_').next() {
            let accession = accession.to_string();
            kb.genes.gene_mut(gene).accessions.insert(accession.clone());
            kb.genes.original_mut(original).accessions.insert(accession);
        }
    }

    report.log_summary();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metal_names_are_pulled_from_headers() {
        let pattern = Regex::new(r"\s(\S+)\sresistance").unwrap();
        let caps = pattern
            .captures("sp|P37617|ZNTA_ECOLI Zinc/cadmium/lead resistance protein|MetalRes")
            .unwrap();
        assert_eq!(&caps[1], "Zinc/cadmium/lead");
        assert!(pattern.captures("sp|Q9X2V2 copper chaperone|MetalRes").is_none());
    }
}
