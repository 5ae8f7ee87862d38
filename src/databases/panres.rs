//! Base gene-table ingestion: creates every canonical pan-gene, its
//! per-source original-gene variants and the gene/database memberships that
//! the annotation adapters later key on.

use camino::Utf8Path;
use serde::Serialize;
use tracing::{info, warn};

use super::{Table, field};
use crate::domain::{PanGeneId, SourceDb};
use crate::error::PanResError;
use crate::model::KnowledgeBase;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct IngestStats {
    pub genes: usize,
    pub original_genes: usize,
    pub skipped_rows: usize,
}

pub fn ingest(kb: &mut KnowledgeBase, file: &Utf8Path) -> Result<IngestStats, PanResError> {
    // One line of front matter precedes the header row.
    let table = Table::open(file, 1)?;
    let gene_col = table.column("userGeneName")?;
    let seq_col = table.column("chosenSeq")?;
    let db_col = table.column("database")?;
    let header_col = table.column("fa_header")?;
    let len_col = table.column("gene_len")?;

    let mut stats = IngestStats::default();
    for record in table.records() {
        let gene_name = field(record, gene_col).replace("_v1.0.0", "");
        let Ok(gene_name) = gene_name.parse::<PanGeneId>() else {
            warn!("PanRes: skipping row with malformed gene name: {gene_name}");
            stats.skipped_rows += 1;
            continue;
        };
        let db_tag = field(record, db_col).replace("_genes", "");
        let Ok(database) = db_tag.parse::<SourceDb>() else {
            warn!("PanRes: skipping {gene_name}: unknown source database tag {db_tag}");
            stats.skipped_rows += 1;
            continue;
        };

        let gene = kb.genes.create_or_get_gene(&gene_name);

        if let Ok(length) = field(record, len_col).parse::<u32>() {
            match kb.genes.gene(gene).length {
                Some(existing) if existing != length => {
                    warn!("PanRes: {gene_name} has multiple gene lengths associated.");
                }
                Some(_) => {}
                None => kb.genes.gene_mut(gene).length = Some(length),
            }
        }

        let cluster = field(record, seq_col)
            .replace("_v1.0.0", "")
            .replacen("pan", "panc", 1);
        if !cluster.is_empty() {
            kb.genes.gene_mut(gene).cluster = Some(cluster);
        }

        kb.genes.gene_mut(gene).databases.insert(database);

        let fasta_header = field(record, header_col).replace("~~~", "|").replace('\'', "");
        let original_name = clean_gene_name(&fasta_header, database);
        let original = kb.genes.create_or_get_original(original_name.trim(), database);
        let tagged_header = format!("{}|{}", fasta_header.trim(), database.name());
        let og = kb.genes.original_mut(original);
        if !og.fasta_headers.contains(&tagged_header) {
            og.fasta_headers.push(tagged_header);
        }
        kb.genes.link_same_as(gene, original);
        stats.original_genes += 1;
    }

    stats.genes = kb.genes.len();
    info!("Added PanRes genes (n={}) to the knowledge base.", stats.genes);
    Ok(stats)
}

/// Extracts the database-native gene name from a raw fasta header. Each
/// source encodes the name at a different position of its pipe-delimited
/// header.
pub fn clean_gene_name(header: &str, database: SourceDb) -> String {
    let header = header.replace(&format!("{}|", database.short_tag()), "");
    let token = |n: usize| header.split('|').nth(n).unwrap_or(&header).to_string();
    match database {
        SourceDb::AmrFinderPlus => token(5),
        SourceDb::Card => token(5).split(" [").next().unwrap_or_default().to_string(),
        SourceDb::MegaRes => token(0),
        SourceDb::ArgAnnot => {
            // The leading `(acr)` acronym group is dropped; the rest of the
            // first token may itself contain `)`.
            let first = token(0);
            match first.split_once(')') {
                Some((_, rest)) => rest.to_string(),
                None => first,
            }
        }
        SourceDb::ResFinderFg => token(1),
        SourceDb::MetalRes => header.split(' ').next().unwrap_or(&header).to_string(),
        SourceDb::BacMet | SourceDb::CsabaPal | SourceDb::ResFinder => header,
    }
}
