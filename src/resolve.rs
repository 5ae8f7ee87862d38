//! The cross-database resolution engine.
//!
//! One contract for all nine adapters: take a gene, its original-source
//! variant, one normalized label and (optionally) the asserting database,
//! resolve the label against the taxonomy store and attach the right
//! relation on both records. Simple labels are looked up, never created:
//! the canonical vocabulary is pre-seeded by the target loader, so a missed
//! lookup means the label needs curation, not a new node. Only drug
//! combinations (labels joined by `+`), which are derived rather than
//! canonical, are created lazily.

use std::fmt;

use crate::domain::{NodeKind, SourceDb};
use crate::model::{GeneId, GeneStore, OriginalGeneId};
use crate::normalize::normalize_name;
use crate::taxonomy::{NodeId, TaxonomyStore};

/// Which relation a resolved target was attached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    PredictedPhenotype(NodeId),
    ResistanceClass(NodeId),
    MetalResistance(NodeId),
    BiocideResistance(NodeId),
}

impl Resolution {
    pub fn node(&self) -> NodeId {
        match self {
            Resolution::PredictedPhenotype(id)
            | Resolution::ResistanceClass(id)
            | Resolution::MetalResistance(id)
            | Resolution::BiocideResistance(id) => *id,
        }
    }
}

/// Why a label did not resolve. The taxonomy store only ever holds the
/// recognized node kinds, so "found but unclassifiable" cannot occur here;
/// absence is the one failure mode and it is reported with the normalized
/// label for the curation logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveFailure {
    NotFound { label: String },
}

impl fmt::Display for ResolveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveFailure::NotFound { label } => write!(f, "no taxonomy node named {label}"),
        }
    }
}

/// Resolves one extracted label for one (gene, original-gene) pair.
///
/// Mutates the taxonomy store (combination creation, provenance) and the
/// annotation sets of both records. Strictly sequential callers only; the
/// lookup-then-create sequence is not atomic.
pub fn gene_target(
    taxonomy: &mut TaxonomyStore,
    genes: &mut GeneStore,
    gene: GeneId,
    original: OriginalGeneId,
    label: &str,
    database: Option<SourceDb>,
) -> Result<Resolution, ResolveFailure> {
    let target = normalize_name(label);

    let node = if target.contains('+') {
        let combination =
            taxonomy.create_or_get(NodeKind::AntibioticResistancePhenotype, &target);
        taxonomy.mark_drug_combination(combination);
        for constituent in target.split('+') {
            // Constituents are looked up, never created; a missing one is
            // tolerated and the combination simply has fewer parents.
            if let Some(existing) = taxonomy.get(constituent) {
                taxonomy.add_subclass_edge(combination, existing);
            }
        }
        combination
    } else {
        taxonomy
            .get(&target)
            .ok_or(ResolveFailure::NotFound { label: target.clone() })?
    };

    let resolution = match taxonomy.node(node).kind {
        NodeKind::AntibioticResistancePhenotype | NodeKind::UnclassifiedResistance => {
            genes.gene_mut(gene).annotations.predicted_phenotypes.insert(node);
            genes
                .original_mut(original)
                .annotations
                .predicted_phenotypes
                .insert(node);
            Resolution::PredictedPhenotype(node)
        }
        NodeKind::Metal => {
            genes.gene_mut(gene).annotations.metal_resistances.insert(node);
            genes
                .original_mut(original)
                .annotations
                .metal_resistances
                .insert(node);
            Resolution::MetalResistance(node)
        }
        NodeKind::Biocide => {
            genes.gene_mut(gene).annotations.biocide_resistances.insert(node);
            genes
                .original_mut(original)
                .annotations
                .biocide_resistances
                .insert(node);
            Resolution::BiocideResistance(node)
        }
        NodeKind::AntibioticResistanceClass
        | NodeKind::BiocideClass
        | NodeKind::UnclassifiedResistanceClass => {
            genes.gene_mut(gene).annotations.resistance_classes.insert(node);
            genes
                .original_mut(original)
                .annotations
                .resistance_classes
                .insert(node);
            Resolution::ResistanceClass(node)
        }
    };

    if let Some(database) = database {
        taxonomy.record_found_in(node, database);
    }

    Ok(resolution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PanGeneId;
    use crate::model::KnowledgeBase;

    fn seeded_kb() -> (KnowledgeBase, GeneId, OriginalGeneId) {
        let mut kb = KnowledgeBase::new();
        let class = kb
            .taxonomy
            .create_or_get(NodeKind::AntibioticResistanceClass, "Beta-Lactam");
        let pheno = kb
            .taxonomy
            .create_or_get(NodeKind::AntibioticResistancePhenotype, "Ampicillin");
        kb.taxonomy.add_subclass_edge(pheno, class);
        kb.taxonomy
            .create_or_get(NodeKind::AntibioticResistancePhenotype, "Amoxicillin");
        kb.taxonomy
            .create_or_get(NodeKind::AntibioticResistancePhenotype, "Clavulanic Acid");
        kb.taxonomy.create_or_get(NodeKind::Metal, "Copper");

        let name: PanGeneId = "pan_1".parse().unwrap();
        let gene = kb.genes.create_or_get_gene(&name);
        let original = kb.genes.create_or_get_original("blaTEM-1", SourceDb::Card);
        kb.genes.link_same_as(gene, original);
        (kb, gene, original)
    }

    #[test]
    fn phenotype_attaches_to_both_records() {
        let (mut kb, gene, og) = seeded_kb();
        let resolution = gene_target(
            &mut kb.taxonomy,
            &mut kb.genes,
            gene,
            og,
            "Ampicillin",
            Some(SourceDb::Card),
        )
        .unwrap();
        let node = resolution.node();
        assert!(matches!(resolution, Resolution::PredictedPhenotype(_)));
        assert!(kb.genes.gene(gene).annotations.predicted_phenotypes.contains(&node));
        assert!(kb.genes.original(og).annotations.predicted_phenotypes.contains(&node));
        assert!(kb.taxonomy.node(node).found_in.contains(&SourceDb::Card));
    }

    #[test]
    fn class_never_lands_in_phenotype_set() {
        let (mut kb, gene, og) = seeded_kb();
        let resolution =
            gene_target(&mut kb.taxonomy, &mut kb.genes, gene, og, "Beta-Lactam", None).unwrap();
        assert!(matches!(resolution, Resolution::ResistanceClass(_)));
        let annotations = &kb.genes.gene(gene).annotations;
        assert!(annotations.predicted_phenotypes.is_empty());
        assert_eq!(annotations.resistance_classes.len(), 1);
    }

    #[test]
    fn unknown_simple_label_creates_nothing() {
        let (mut kb, gene, og) = seeded_kb();
        let before = kb.taxonomy.len();
        let err = gene_target(&mut kb.taxonomy, &mut kb.genes, gene, og, "Xyzzyotic", None)
            .unwrap_err();
        assert_eq!(err, ResolveFailure::NotFound { label: "Xyzzyotic".to_string() });
        assert_eq!(kb.taxonomy.len(), before);
        assert!(kb.genes.gene(gene).annotations.is_empty());
    }

    #[test]
    fn combination_is_created_and_linked_to_constituents() {
        let (mut kb, gene, og) = seeded_kb();
        let resolution = gene_target(
            &mut kb.taxonomy,
            &mut kb.genes,
            gene,
            og,
            "Amoxicillin+Clavulanic Acid",
            Some(SourceDb::ResFinder),
        )
        .unwrap();
        let combo = resolution.node();
        let node = kb.taxonomy.node(combo);
        assert_eq!(node.name, "Amoxicillin+Clavulanic_Acid");
        assert!(node.is_drug_combination);
        let amox = kb.taxonomy.get("Amoxicillin").unwrap();
        let clav = kb.taxonomy.get("Clavulanic_Acid").unwrap();
        assert!(kb.taxonomy.is_subclass_of(combo, amox));
        assert!(kb.taxonomy.is_subclass_of(combo, clav));

        // Second resolution reuses the node.
        let before = kb.taxonomy.len();
        let again = gene_target(
            &mut kb.taxonomy,
            &mut kb.genes,
            gene,
            og,
            "Amoxicillin+Clavulanic_Acid",
            Some(SourceDb::Card),
        )
        .unwrap();
        assert_eq!(again.node(), combo);
        assert_eq!(kb.taxonomy.len(), before);
    }

    #[test]
    fn combination_tolerates_missing_constituents() {
        let (mut kb, gene, og) = seeded_kb();
        let resolution = gene_target(
            &mut kb.taxonomy,
            &mut kb.genes,
            gene,
            og,
            "Ampicillin+Sulbactam",
            None,
        )
        .unwrap();
        let combo = resolution.node();
        // Only the pre-seeded constituent became a parent.
        assert_eq!(kb.taxonomy.node(combo).parents.len(), 1);
    }

    #[test]
    fn metal_attaches_to_metal_set() {
        let (mut kb, gene, og) = seeded_kb();
        let resolution =
            gene_target(&mut kb.taxonomy, &mut kb.genes, gene, og, "Copper", None).unwrap();
        assert!(matches!(resolution, Resolution::MetalResistance(_)));
        assert_eq!(kb.genes.gene(gene).annotations.metal_resistances.len(), 1);
    }
}
