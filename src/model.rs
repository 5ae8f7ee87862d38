//! Genes, their per-source name variants, and the knowledge base that ties
//! them to the taxonomy store.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::{PanGeneId, SourceDb};
use crate::taxonomy::{NodeId, TaxonomyStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GeneId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OriginalGeneId(usize);

/// The four relation sets a resolved target can land in. Both the canonical
/// gene and each original gene carry their own copy, so per-source
/// provenance survives the merge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotationSets {
    pub resistance_classes: BTreeSet<NodeId>,
    pub predicted_phenotypes: BTreeSet<NodeId>,
    pub metal_resistances: BTreeSet<NodeId>,
    pub biocide_resistances: BTreeSet<NodeId>,
}

impl AnnotationSets {
    pub fn is_empty(&self) -> bool {
        self.resistance_classes.is_empty()
            && self.predicted_phenotypes.is_empty()
            && self.metal_resistances.is_empty()
            && self.biocide_resistances.is_empty()
    }

    pub fn referenced_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.resistance_classes
            .iter()
            .chain(&self.predicted_phenotypes)
            .chain(&self.metal_resistances)
            .chain(&self.biocide_resistances)
            .copied()
    }

    fn remap(&mut self, remap: &HashMap<NodeId, NodeId>) {
        let rewrite = |set: &BTreeSet<NodeId>| -> BTreeSet<NodeId> {
            set.iter().filter_map(|id| remap.get(id).copied()).collect()
        };
        self.resistance_classes = rewrite(&self.resistance_classes);
        self.predicted_phenotypes = rewrite(&self.predicted_phenotypes);
        self.metal_resistances = rewrite(&self.metal_resistances);
        self.biocide_resistances = rewrite(&self.biocide_resistances);
    }
}

/// Canonical pan-gene. Created once per unique identifier during base
/// ingestion and mutated by every adapter that matches it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gene {
    pub name: PanGeneId,
    pub length: Option<u32>,
    pub cluster: Option<String>,
    pub databases: BTreeSet<SourceDb>,
    pub accessions: BTreeSet<String>,
    pub card_links: BTreeSet<String>,
    pub mechanisms: BTreeSet<String>,
    pub annotations: AnnotationSets,
    pub same_as: Vec<OriginalGeneId>,
}

/// A database-specific name variant of one pan-gene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginalGene {
    pub name: String,
    pub database: SourceDb,
    pub fasta_headers: Vec<String>,
    pub accessions: BTreeSet<String>,
    pub annotations: AnnotationSets,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneStore {
    genes: Vec<Gene>,
    originals: Vec<OriginalGene>,
    // Lookup indexes are derived from the arenas; rebuilt after
    // deserialization rather than serialized.
    #[serde(skip)]
    by_name: HashMap<String, GeneId>,
    #[serde(skip)]
    original_index: HashMap<(String, SourceDb), OriginalGeneId>,
}

impl GeneStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn create_or_get_gene(&mut self, name: &PanGeneId) -> GeneId {
        if let Some(id) = self.by_name.get(name.as_str()) {
            return *id;
        }
        let id = GeneId(self.genes.len());
        self.genes.push(Gene {
            name: name.clone(),
            length: None,
            cluster: None,
            databases: BTreeSet::new(),
            accessions: BTreeSet::new(),
            card_links: BTreeSet::new(),
            mechanisms: BTreeSet::new(),
            annotations: AnnotationSets::default(),
            same_as: Vec::new(),
        });
        self.by_name.insert(name.as_str().to_string(), id);
        id
    }

    pub fn gene(&self, id: GeneId) -> &Gene {
        &self.genes[id.0]
    }

    pub fn gene_mut(&mut self, id: GeneId) -> &mut Gene {
        &mut self.genes[id.0]
    }

    pub fn gene_by_name(&self, name: &str) -> Option<GeneId> {
        self.by_name.get(name).copied()
    }

    pub fn create_or_get_original(&mut self, name: &str, database: SourceDb) -> OriginalGeneId {
        let key = (name.to_string(), database);
        if let Some(id) = self.original_index.get(&key) {
            return *id;
        }
        let id = OriginalGeneId(self.originals.len());
        self.originals.push(OriginalGene {
            name: name.to_string(),
            database,
            fasta_headers: Vec::new(),
            accessions: BTreeSet::new(),
            annotations: AnnotationSets::default(),
        });
        self.original_index.insert(key, id);
        id
    }

    pub fn original(&self, id: OriginalGeneId) -> &OriginalGene {
        &self.originals[id.0]
    }

    pub fn original_mut(&mut self, id: OriginalGeneId) -> &mut OriginalGene {
        &mut self.originals[id.0]
    }

    /// Attaches an original gene to its canonical gene, once.
    pub fn link_same_as(&mut self, gene: GeneId, original: OriginalGeneId) {
        let entry = &mut self.genes[gene.0];
        if !entry.same_as.contains(&original) {
            entry.same_as.push(original);
        }
    }

    /// Every (gene, original-gene) pair originating from one source
    /// database; the per-database variant is found through `same_as`.
    pub fn genes_from_database(&self, database: SourceDb) -> Vec<(GeneId, OriginalGeneId)> {
        let mut pairs = Vec::new();
        for (index, gene) in self.genes.iter().enumerate() {
            if !gene.databases.contains(&database) {
                continue;
            }
            let original = gene
                .same_as
                .iter()
                .find(|og| self.originals[og.0].database == database);
            if let Some(original) = original {
                pairs.push((GeneId(index), *original));
            }
        }
        pairs
    }

    pub fn iter_genes(&self) -> impl Iterator<Item = (GeneId, &Gene)> {
        self.genes.iter().enumerate().map(|(i, g)| (GeneId(i), g))
    }

    pub(crate) fn rebuild_indexes(&mut self) {
        self.by_name = self
            .genes
            .iter()
            .enumerate()
            .map(|(i, gene)| (gene.name.as_str().to_string(), GeneId(i)))
            .collect();
        self.original_index = self
            .originals
            .iter()
            .enumerate()
            .map(|(i, og)| ((og.name.clone(), og.database), OriginalGeneId(i)))
            .collect();
    }

    fn remap_annotations(&mut self, remap: &HashMap<NodeId, NodeId>) {
        for gene in &mut self.genes {
            gene.annotations.remap(remap);
        }
        for original in &mut self.originals {
            original.annotations.remap(remap);
        }
    }
}

/// The whole mutable build state: taxonomy plus genes. Passed explicitly to
/// the loader, the resolution engine and every adapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub taxonomy: TaxonomyStore,
    pub genes: GeneStore,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn rebuild_indexes(&mut self) {
        self.taxonomy.rebuild_index();
        self.genes.rebuild_indexes();
    }

    /// Optional cleanup pass: drops taxonomy nodes never referenced by any
    /// gene or original-gene annotation. Parents of referenced nodes are
    /// kept so the subclass hierarchy stays intact. Returns the number of
    /// nodes removed.
    pub fn prune_unreferenced(&mut self) -> usize {
        let mut keep: BTreeSet<NodeId> = BTreeSet::new();
        for gene in &self.genes.genes {
            keep.extend(gene.annotations.referenced_nodes());
        }
        for original in &self.genes.originals {
            keep.extend(original.annotations.referenced_nodes());
        }
        // Walk up the subclass edges so kept phenotypes keep their classes.
        let mut frontier: Vec<NodeId> = keep.iter().copied().collect();
        while let Some(id) = frontier.pop() {
            for parent in &self.taxonomy.node(id).parents {
                if keep.insert(*parent) {
                    frontier.push(*parent);
                }
            }
        }

        let before = self.taxonomy.len();
        let remap = self.taxonomy.retain(&keep);
        self.genes.remap_annotations(&remap);
        before - self.taxonomy.len()
    }
}
