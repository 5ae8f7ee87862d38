//! Snapshot persistence and the two export surfaces: a flattened per-gene
//! CSV with caller-selected columns, and a Turtle rendering of the full
//! knowledge base.

use std::fs;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::domain::ExportColumn;
use crate::error::PanResError;
use crate::model::{Gene, KnowledgeBase};

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// JSON build artifact. The export command reloads this instead of
/// re-running ingestion.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema_version: u32,
    pub built_at: String,
    pub knowledge_base: KnowledgeBase,
}

impl Snapshot {
    pub fn new(knowledge_base: KnowledgeBase, built_at: String) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            built_at,
            knowledge_base,
        }
    }

    pub fn save(&self, path: &Utf8Path) -> Result<(), PanResError> {
        let content = serde_json::to_vec_pretty(self)
            .map_err(|err| PanResError::Filesystem(err.to_string()))?;
        write_bytes_atomic(path, &content)
    }

    pub fn load(path: &Utf8Path) -> Result<Self, PanResError> {
        if !path.as_std_path().exists() {
            return Err(PanResError::SnapshotNotFound(path.as_std_path().to_path_buf()));
        }
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|err| PanResError::Filesystem(err.to_string()))?;
        let mut snapshot: Snapshot = serde_json::from_str(&content)
            .map_err(|err| PanResError::SnapshotParse(err.to_string()))?;
        if snapshot.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(PanResError::SnapshotParse(format!(
                "unsupported schema version {}",
                snapshot.schema_version
            )));
        }
        snapshot.knowledge_base.rebuild_indexes();
        Ok(snapshot)
    }
}

fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), PanResError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| PanResError::Filesystem(err.to_string()))?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(tmp_path.as_std_path(), content)
        .map_err(|err| PanResError::Filesystem(err.to_string()))?;
    fs::rename(tmp_path.as_std_path(), path.as_std_path())
        .map_err(|err| PanResError::Filesystem(err.to_string()))?;
    Ok(())
}

/// Writes the flattened per-gene table. Multi-valued cells are joined with
/// `;`; rows whose every non-name cell is empty are dropped.
pub fn write_csv(
    kb: &KnowledgeBase,
    columns: &[ExportColumn],
    output: &Utf8Path,
) -> Result<usize, PanResError> {
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| PanResError::Filesystem(err.to_string()))?;
    }
    let mut writer = csv::Writer::from_path(output.as_std_path())
        .map_err(|err| PanResError::Filesystem(err.to_string()))?;
    writer
        .write_record(columns.iter().map(|col| col.header()))
        .map_err(|err| PanResError::Filesystem(err.to_string()))?;

    let mut written = 0;
    for (_, gene) in kb.genes.iter_genes() {
        let row: Vec<String> = columns
            .iter()
            .map(|col| column_value(kb, gene, *col))
            .collect();
        let all_empty = columns
            .iter()
            .zip(&row)
            .filter(|(col, _)| **col != ExportColumn::Name)
            .all(|(_, value)| value.is_empty());
        if all_empty {
            continue;
        }
        writer
            .write_record(&row)
            .map_err(|err| PanResError::Filesystem(err.to_string()))?;
        written += 1;
    }
    writer
        .flush()
        .map_err(|err| PanResError::Filesystem(err.to_string()))?;
    Ok(written)
}

fn column_value(kb: &KnowledgeBase, gene: &Gene, column: ExportColumn) -> String {
    let node_names = |nodes: &std::collections::BTreeSet<crate::taxonomy::NodeId>| -> String {
        nodes
            .iter()
            .map(|id| kb.taxonomy.node(*id).name.as_str())
            .collect::<Vec<_>>()
            .join(";")
    };
    let joined = |values: &std::collections::BTreeSet<String>| values
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(";");

    match column {
        ExportColumn::Name => gene.name.to_string(),
        ExportColumn::Accession => joined(&gene.accessions),
        ExportColumn::Length => gene.length.map(|len| len.to_string()).unwrap_or_default(),
        ExportColumn::Cluster => gene.cluster.clone().unwrap_or_default(),
        ExportColumn::CardLink => joined(&gene.card_links),
        ExportColumn::PredictedPhenotype => node_names(&gene.annotations.predicted_phenotypes),
        ExportColumn::ResistanceClass => node_names(&gene.annotations.resistance_classes),
        ExportColumn::MetalResistance => node_names(&gene.annotations.metal_resistances),
        ExportColumn::BiocideResistance => node_names(&gene.annotations.biocide_resistances),
        ExportColumn::Database => gene
            .databases
            .iter()
            .map(|db| db.name())
            .collect::<Vec<_>>()
            .join(";"),
        ExportColumn::SameAs => gene
            .same_as
            .iter()
            .map(|id| kb.genes.original(*id).name.as_str())
            .collect::<Vec<_>>()
            .join(";"),
        ExportColumn::FastaHeader => gene
            .same_as
            .iter()
            .flat_map(|id| kb.genes.original(*id).fasta_headers.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(";"),
        ExportColumn::Mechanism => joined(&gene.mechanisms),
    }
}

const ONTOLOGY_IRI: &str = "https://panres.example.org/ontology#";

/// Writes the knowledge base as Turtle: taxonomy nodes become classes with
/// subclass edges, genes become individuals carrying the export relations.
pub fn write_turtle(kb: &KnowledgeBase, output: &Utf8Path) -> Result<(), PanResError> {
    let mut out = String::new();
    out.push_str(&format!("@prefix panres: <{ONTOLOGY_IRI}> .\n"));
    out.push_str("@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .\n");
    out.push_str("@prefix owl: <http://www.w3.org/2002/07/owl#> .\n");
    out.push_str("@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .\n\n");

    for (id, node) in kb.taxonomy.iter() {
        out.push_str(&format!(
            "panres:{} a owl:Class, panres:{} ;\n",
            iri_fragment(&node.name),
            node.kind.label()
        ));
        out.push_str(&format!("    rdfs:label {} ", turtle_literal(&node.name)));
        if node.is_drug_combination {
            out.push_str(";\n    panres:is_drug_combination true ");
        }
        if let Some(symbol) = &node.symbol {
            out.push_str(&format!(";\n    panres:has_symbol {} ", turtle_literal(symbol)));
        }
        if let Some(comment) = &node.comment {
            out.push_str(&format!(";\n    rdfs:comment {} ", turtle_literal(comment)));
        }
        for db in &node.found_in {
            out.push_str(&format!(
                ";\n    panres:found_in {} ",
                turtle_literal(db.name())
            ));
        }
        for parent in &node.parents {
            if *parent == id {
                continue;
            }
            out.push_str(&format!(
                ";\n    rdfs:subClassOf panres:{} ",
                iri_fragment(&kb.taxonomy.node(*parent).name)
            ));
        }
        out.push_str(".\n\n");
    }

    for (_, gene) in kb.genes.iter_genes() {
        out.push_str(&format!("panres:{} a panres:PanGene ", gene.name));
        if let Some(length) = gene.length {
            out.push_str(&format!(
                ";\n    panres:has_length \"{length}\"^^xsd:integer "
            ));
        }
        if let Some(cluster) = &gene.cluster {
            out.push_str(&format!(";\n    panres:member_of {} ", turtle_literal(cluster)));
        }
        for db in &gene.databases {
            out.push_str(&format!(
                ";\n    panres:is_from_database {} ",
                turtle_literal(db.name())
            ));
        }
        for accession in &gene.accessions {
            out.push_str(&format!(
                ";\n    panres:accession {} ",
                turtle_literal(accession)
            ));
        }
        for link in &gene.card_links {
            out.push_str(&format!(";\n    panres:card_link <{link}> "));
        }
        for mechanism in &gene.mechanisms {
            out.push_str(&format!(
                ";\n    panres:has_mechanism_of_resistance {} ",
                turtle_literal(mechanism)
            ));
        }
        for (relation, nodes) in [
            ("has_predicted_phenotype", &gene.annotations.predicted_phenotypes),
            ("has_resistance_class", &gene.annotations.resistance_classes),
            ("has_predicted_metal_resistance", &gene.annotations.metal_resistances),
            ("has_predicted_biocide_resistance", &gene.annotations.biocide_resistances),
        ] {
            for node in nodes {
                out.push_str(&format!(
                    ";\n    panres:{relation} panres:{} ",
                    iri_fragment(&kb.taxonomy.node(*node).name)
                ));
            }
        }
        for original in &gene.same_as {
            out.push_str(&format!(
                ";\n    panres:same_as {} ",
                turtle_literal(&kb.genes.original(*original).name)
            ));
        }
        out.push_str(".\n\n");
    }

    write_bytes_atomic(output, out.as_bytes())
}

/// Node names are already underscore-normalized; anything left outside the
/// safe local-name alphabet is folded to underscore.
fn iri_fragment(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

fn turtle_literal(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::*;
    use crate::domain::NodeKind;

    fn sample_kb() -> KnowledgeBase {
        let mut kb = KnowledgeBase::new();
        let pheno = kb
            .taxonomy
            .create_or_get(NodeKind::AntibioticResistancePhenotype, "Ampicillin");
        let class = kb
            .taxonomy
            .create_or_get(NodeKind::AntibioticResistanceClass, "Beta-Lactam");
        kb.taxonomy.add_subclass_edge(pheno, class);

        let gene = kb.genes.create_or_get_gene(&"pan_1".parse().unwrap());
        kb.genes.gene_mut(gene).length = Some(861);
        kb.genes.gene_mut(gene).databases.insert(crate::domain::SourceDb::ResFinder);
        kb.genes
            .gene_mut(gene)
            .annotations
            .predicted_phenotypes
            .insert(pheno);
        let og = kb
            .genes
            .create_or_get_original("blaTEM-1_AB123", crate::domain::SourceDb::ResFinder);
        kb.genes.link_same_as(gene, og);
        // An unannotated gene, dropped by the all-empty rule.
        kb.genes.create_or_get_gene(&"pan_2".parse().unwrap());
        kb
    }

    #[test]
    fn snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("kb.json")).unwrap();

        let snapshot = Snapshot::new(sample_kb(), "2025-01-01T00:00:00Z".to_string());
        snapshot.save(&path).unwrap();

        let loaded = Snapshot::load(&path).unwrap();
        assert_eq!(loaded.schema_version, SNAPSHOT_SCHEMA_VERSION);
        assert_eq!(loaded.knowledge_base.genes.len(), 2);
        assert!(loaded.knowledge_base.taxonomy.get("Ampicillin").is_some());
    }

    #[test]
    fn load_missing_snapshot_fails() {
        let err = Snapshot::load(Utf8Path::new("/nonexistent/kb.json")).unwrap_err();
        assert!(matches!(err, PanResError::SnapshotNotFound(_)));
    }

    #[test]
    fn csv_export_drops_all_empty_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("out.csv")).unwrap();
        let kb = sample_kb();

        let columns = [
            ExportColumn::Name,
            ExportColumn::PredictedPhenotype,
            ExportColumn::Database,
        ];
        let written = write_csv(&kb, &columns, &path).unwrap();
        assert_eq!(written, 1);

        let content = fs::read_to_string(path.as_std_path()).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "name,has_predicted_phenotype,is_from_database"
        );
        assert_eq!(lines.next().unwrap(), "pan_1,Ampicillin,ResFinder");
        assert!(lines.next().is_none());
    }

    #[test]
    fn turtle_export_contains_classes_and_genes() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("kb.ttl")).unwrap();
        write_turtle(&sample_kb(), &path).unwrap();

        let content = fs::read_to_string(path.as_std_path()).unwrap();
        assert!(content.contains("panres:Ampicillin a owl:Class, panres:AntibioticResistancePhenotype"));
        assert!(content.contains("rdfs:subClassOf panres:Beta_Lactam"));
        assert!(content.contains("panres:pan_1 a panres:PanGene"));
        assert!(content.contains("panres:same_as \"blaTEM-1_AB123\""));
    }
}
