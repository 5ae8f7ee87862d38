//! Grouped failure reporting for adapter runs.
//!
//! Recoverable failures never interrupt a run; each adapter accumulates them
//! here and emits one grouped summary at completion. The categories are
//! kept apart because they need different remediation: a gene with no
//! annotation row at all, a header whose label could not be extracted or
//! translated, a label that was extracted but found no taxonomy match, and
//! a label whose match contradicts the header's declared resistance type.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::SourceDb;
use crate::model::{GeneId, GeneStore, OriginalGeneId};

#[derive(Debug, Clone, Serialize)]
pub struct AdapterReport {
    pub database: SourceDb,
    /// Genes present in the knowledge base but absent from the source file.
    pub missing_rows: Vec<String>,
    /// Acronym/regex extraction failures, grouped by the offending token.
    pub failed_extractions: BTreeMap<String, Vec<String>>,
    /// Labels that were extracted but did not resolve, grouped by label.
    pub failed_resolutions: BTreeMap<String, Vec<String>>,
    /// Labels that resolved to a node whose kind contradicts the header's
    /// declared resistance type, grouped by label.
    pub kind_mismatches: BTreeMap<String, Vec<String>>,
}

impl AdapterReport {
    pub fn new(database: SourceDb) -> Self {
        Self {
            database,
            missing_rows: Vec::new(),
            failed_extractions: BTreeMap::new(),
            failed_resolutions: BTreeMap::new(),
            kind_mismatches: BTreeMap::new(),
        }
    }

    pub fn record_missing_row(&mut self, gene: String) {
        self.missing_rows.push(gene);
    }

    pub fn record_extraction_failure(&mut self, token: &str, gene: String) {
        self.failed_extractions
            .entry(token.to_string())
            .or_default()
            .push(gene);
    }

    pub fn record_resolution_failure(&mut self, label: &str, gene: String) {
        self.failed_resolutions
            .entry(label.to_string())
            .or_default()
            .push(gene);
    }

    pub fn record_kind_mismatch(&mut self, label: &str, gene: String) {
        self.kind_mismatches
            .entry(label.to_string())
            .or_default()
            .push(gene);
    }

    pub fn failure_count(&self) -> usize {
        self.missing_rows.len()
            + self.failed_extractions.values().map(Vec::len).sum::<usize>()
            + self.failed_resolutions.values().map(Vec::len).sum::<usize>()
            + self.kind_mismatches.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_clean(&self) -> bool {
        self.failure_count() == 0
    }

    /// Emits the grouped summary for this adapter run.
    pub fn log_summary(&self) {
        let db = self.database;
        if !self.missing_rows.is_empty() {
            warn!(
                "{db}: no annotation row found for: {}",
                self.missing_rows.join(", ")
            );
        }
        if !self.failed_extractions.is_empty() {
            warn!(
                "{db}: failed to extract labels for:\n{}",
                format_grouped(&self.failed_extractions)
            );
        }
        if !self.failed_resolutions.is_empty() {
            warn!(
                "{db}: failed to find target annotations for:\n{}",
                format_grouped(&self.failed_resolutions)
            );
        }
        if !self.kind_mismatches.is_empty() {
            warn!(
                "{db}: resolved to an unexpected resistance type for:\n{}",
                format_grouped(&self.kind_mismatches)
            );
        }
        info!("Added {db} annotations to the PanRes knowledge base.");
    }
}

fn format_grouped(groups: &BTreeMap<String, Vec<String>>) -> String {
    groups
        .iter()
        .map(|(key, genes)| format!("{key}: {}", genes.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders `pan_x (original_name)`, the form every failure entry uses.
pub fn gene_label(genes: &GeneStore, gene: GeneId, original: OriginalGeneId) -> String {
    format!(
        "{} ({})",
        genes.gene(gene).name,
        genes.original(original).name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_are_grouped_by_label() {
        let mut report = AdapterReport::new(SourceDb::MegaRes);
        report.record_resolution_failure("Multi_Drug", "pan_1 (gene_a)".to_string());
        report.record_resolution_failure("Multi_Drug", "pan_2 (gene_b)".to_string());
        report.record_extraction_failure("Xyz", "pan_3 (gene_c)".to_string());
        report.record_missing_row("pan_4 (gene_d)".to_string());

        assert_eq!(report.failure_count(), 4);
        assert_eq!(report.failed_resolutions["Multi_Drug"].len(), 2);
        assert!(!report.is_clean());

        let grouped = format_grouped(&report.failed_resolutions);
        assert_eq!(grouped, "Multi_Drug: pan_1 (gene_a), pan_2 (gene_b)");
    }
}
