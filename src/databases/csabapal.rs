//! CsabaPal adapter for the Daruka et al. (2025) ESKAPE evolution screen.
//! The side table is a CSV keyed by unique ORF name; antibiotics appear as
//! study acronyms that must be translated before resolution.

use std::collections::{BTreeSet, HashMap};

use camino::Utf8Path;

use super::{Table, field};
use crate::domain::SourceDb;
use crate::error::PanResError;
use crate::model::KnowledgeBase;
use crate::report::{AdapterReport, gene_label};
use crate::resolve::gene_target;

/// Antibiotic acronyms used in the study, including the compounds still in
/// development that only exist under a vendor code.
fn acronym_to_antibiotic(acronym: &str) -> Option<&'static str> {
    Some(match acronym {
        "APS" => "Apramycin",
        "CEF" => "Ceftobiprole",
        "CPR" => "Ciprofloxacin",
        "DEL" => "Delafloxacin",
        "DOX" => "Doxycycline",
        "ERA" => "Eravacycline",
        "FEP" => "Cefepime",
        "FID" => "Cefiderocol",
        "GEN" | "GPC" => "Gentamicin",
        "MER" => "Meropenem",
        "MOX" | "MOXa" => "Moxifloxacin",
        "OMA" => "Omadacycline",
        "POL" => "POL-7306",
        "PXB" => "Polymyxin-B",
        "SCH" => "SCH79797",
        "SPR" => "SPR-206",
        "SUL" => "Sulopenem",
        "TCS" => "Triclosan",
        "ZOL" => "Zoliflodacin",
        _ => return None,
    })
}

pub fn annotate(kb: &mut KnowledgeBase, file: &Utf8Path) -> Result<AdapterReport, PanResError> {
    const DB: SourceDb = SourceDb::CsabaPal;
    let table = Table::open(file, 0)?;
    let orf_col = table.column("orf_unique")?;
    let antibiotic_col = table.column("antibiotic")?;

    let mut rows: HashMap<String, BTreeSet<String>> = HashMap::new();
    for record in table.records() {
        let orf = field(record, orf_col);
        if orf.is_empty() {
            continue;
        }
        let acronyms = rows.entry(orf.to_string()).or_default();
        for acronym in field(record, antibiotic_col).split('/') {
            if !acronym.trim().is_empty() {
                acronyms.insert(acronym.trim().to_string());
            }
        }
    }

    let mut report = AdapterReport::new(DB);
    for (gene, original) in kb.genes.genes_from_database(DB) {
        let Some(acronyms) = rows.get(&kb.genes.original(original).name).cloned() else {
            report.record_missing_row(gene_label(&kb.genes, gene, original));
            continue;
        };
        for acronym in &acronyms {
            let Some(antibiotic) = acronym_to_antibiotic(acronym) else {
                report.record_extraction_failure(acronym, gene_label(&kb.genes, gene, original));
                continue;
            };
            if gene_target(&mut kb.taxonomy, &mut kb.genes, gene, original, antibiotic, Some(DB))
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
    fn acronym_translation() {
        assert_eq!(acronym_to_antibiotic("CPR"), Some("Ciprofloxacin"));
        assert_eq!(acronym_to_antibiotic("GPC"), Some("Gentamicin"));
        assert_eq!(acronym_to_antibiotic("MOXa"), Some("Moxifloxacin"));
        assert_eq!(acronym_to_antibiotic("POL"), Some("POL-7306"));
        assert_eq!(acronym_to_antibiotic("XYZ"), None);
    }
}
