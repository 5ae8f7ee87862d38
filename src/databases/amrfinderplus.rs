//! AMRFinderPlus adapter: the RefSeq protein accession (pipe token 1 of the
//! fasta header) keys into the `ReferenceGeneCatalog.txt` side table.

use std::collections::{BTreeSet, HashMap};

use camino::Utf8Path;

use super::{Table, field};
use crate::domain::SourceDb;
use crate::error::PanResError;
use crate::model::KnowledgeBase;
use crate::normalize::{correct_synonym, title_case};
use crate::report::{AdapterReport, gene_label};
use crate::resolve::gene_target;

pub fn annotate(kb: &mut KnowledgeBase, file: &Utf8Path) -> Result<AdapterReport, PanResError> {
    const DB: SourceDb = SourceDb::AmrFinderPlus;
    let table = Table::open(file, 0)?;
    let key_col = table.column("refseq_protein_accession")?;
    let class_col = table.column("class")?;

    let mut rows: HashMap<String, BTreeSet<String>> = HashMap::new();
    for record in table.records() {
        let key = field(record, key_col).to_string();
        if key.is_empty() {
            continue;
        }
        let classes = rows.entry(key).or_default();
        for part in field(record, class_col).split('/') {
            let class = correct_synonym(&title_case(part.trim())).to_string();
            if !class.is_empty() {
                classes.insert(class);
            }
        }
    }

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
        let Some(accession) = header.split('|').nth(1).filter(|t| !t.is_empty()) else {
            report.record_extraction_failure("accession", gene_label(&kb.genes, gene, original));
            continue;
        };
        let Some(classes) = rows.get(accession) else {
            report.record_missing_row(gene_label(&kb.genes, gene, original));
            continue;
        };
        for class in classes {
            if gene_target(&mut kb.taxonomy, &mut kb.genes, gene, original, class, Some(DB))
                .is_err()
            {
                report.record_resolution_failure(class, gene_label(&kb.genes, gene, original));
            }
        }
    }

    report.log_summary();
    Ok(report)
}
