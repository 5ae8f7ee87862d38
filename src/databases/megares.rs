//! MegaRes adapter: everything lives in the fasta header. Pipe token 1 is
//! the declared resistance type (Drugs/Metals/Biocides), token 2 the class
//! string, which is stripped of `_resistance` decorations before
//! resolution. The declared type must agree with the resolved node's kind;
//! a disagreement goes into its own failure category and attaches nothing.

use crate::domain::{NodeKind, SourceDb};
use crate::error::PanResError;
use crate::model::KnowledgeBase;
use crate::normalize::{correct_synonym, strip_plural, title_case};
use crate::report::{AdapterReport, gene_label};
use crate::resolve::gene_target;

/// Umbrella labels MegaRes uses for multi-compound resistance; they name no
/// single target and are skipped outright.
const TO_SKIP: [&str; 7] = [
    "Multi-Drug",
    "Drug And Biocide",
    "Multi-Metal",
    "Drug And Biocide And Metal",
    "Multi-Biocide",
    "Biocide And Metal",
    "Drug And Metal",
];

pub fn annotate(kb: &mut KnowledgeBase) -> Result<AdapterReport, PanResError> {
    const DB: SourceDb = SourceDb::MegaRes;
    let mut report = AdapterReport::new(DB);

    for (gene, original) in kb.genes.genes_from_database(DB) {
        let header = kb
            .genes
            .original(original)
            .fasta_headers
            .first()
            .cloned()
            .unwrap_or_default()
            .replace("|MegaRes", "");
        let mut tokens = header.split('|');
        let _gene_token = tokens.next();
        let (Some(resistance_type), Some(raw_classes)) = (tokens.next(), tokens.next()) else {
            report.record_extraction_failure("header", gene_label(&kb.genes, gene, original));
            continue;
        };
        let resistance_type = resistance_type.to_string();

        let classes = clean_class_token(raw_classes);
        for class in classes.split('/') {
            let class = class.trim();
            if class.is_empty() || TO_SKIP.contains(&class) {
                continue;
            }
            let Some(node) = kb.taxonomy.get(class) else {
                report.record_resolution_failure(class, gene_label(&kb.genes, gene, original));
                continue;
            };
            let kind = kb.taxonomy.node(node).kind;
            if !type_agrees(&resistance_type, kind) {
                report.record_kind_mismatch(class, gene_label(&kb.genes, gene, original));
                continue;
            }
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

fn clean_class_token(raw: &str) -> String {
    let mut value = raw.to_lowercase();
    value = value.replace("_resistance", "").replace(" resistance", "");
    value = value.replace('_', " ");
    let titled = title_case(value.trim());
    // Synonyms are checked before the plural strip so acronyms like `Mls`
    // reach the table intact.
    let corrected = correct_synonym(&titled);
    if corrected != titled {
        return corrected.to_string();
    }
    correct_synonym(strip_plural(&titled)).to_string()
}

fn type_agrees(resistance_type: &str, kind: NodeKind) -> bool {
    match resistance_type {
        "Drugs" => matches!(
            kind,
            NodeKind::AntibioticResistancePhenotype | NodeKind::AntibioticResistanceClass
        ),
        "Metals" => kind == NodeKind::Metal,
        "Biocides" => kind == NodeKind::Biocide,
        _ => false,
    }
}
