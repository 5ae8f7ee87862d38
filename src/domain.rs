use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::PanResError;

/// The source databases merged into the PanRes collection. One singleton
/// value per source; referenced, never duplicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SourceDb {
    AmrFinderPlus,
    ArgAnnot,
    BacMet,
    Card,
    CsabaPal,
    MegaRes,
    MetalRes,
    ResFinder,
    ResFinderFg,
}

impl SourceDb {
    pub const ALL: [SourceDb; 9] = [
        SourceDb::AmrFinderPlus,
        SourceDb::ArgAnnot,
        SourceDb::BacMet,
        SourceDb::Card,
        SourceDb::CsabaPal,
        SourceDb::MegaRes,
        SourceDb::MetalRes,
        SourceDb::ResFinder,
        SourceDb::ResFinderFg,
    ];

    /// Canonical display name, as it appears in fasta-header provenance tags.
    pub fn name(&self) -> &'static str {
        match self {
            SourceDb::AmrFinderPlus => "AMRFinderPlus",
            SourceDb::ArgAnnot => "ARGANNOT",
            SourceDb::BacMet => "BacMet",
            SourceDb::Card => "CARD",
            SourceDb::CsabaPal => "CsabaPal",
            SourceDb::MegaRes => "MegaRes",
            SourceDb::MetalRes => "MetalRes",
            SourceDb::ResFinder => "ResFinder",
            SourceDb::ResFinderFg => "ResFinderFG",
        }
    }

    /// Short tag used in the `database` column of the base gene table.
    pub fn short_tag(&self) -> &'static str {
        match self {
            SourceDb::AmrFinderPlus => "amrfinderplus",
            SourceDb::ArgAnnot => "argannot",
            SourceDb::BacMet => "bacmet",
            SourceDb::Card => "card_amr",
            SourceDb::CsabaPal => "csabapal",
            SourceDb::MegaRes => "megares",
            SourceDb::MetalRes => "metalres",
            SourceDb::ResFinder => "resfinder",
            SourceDb::ResFinderFg => "functional_amr",
        }
    }
}

impl fmt::Display for SourceDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SourceDb {
    type Err = PanResError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let tag = value.trim().to_lowercase();
        SourceDb::ALL
            .into_iter()
            .find(|db| tag == db.short_tag() || tag == db.name().to_lowercase())
            .ok_or_else(|| PanResError::UnknownDatabase(value.to_string()))
    }
}

/// Semantic kind of a taxonomy node. Stored as a tagged field rather than a
/// type hierarchy; the resolution engine classifies on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    AntibioticResistanceClass,
    AntibioticResistancePhenotype,
    Metal,
    Biocide,
    BiocideClass,
    UnclassifiedResistance,
    UnclassifiedResistanceClass,
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::AntibioticResistanceClass => "AntibioticResistanceClass",
            NodeKind::AntibioticResistancePhenotype => "AntibioticResistancePhenotype",
            NodeKind::Metal => "Metal",
            NodeKind::Biocide => "Biocide",
            NodeKind::BiocideClass => "BiocideClass",
            NodeKind::UnclassifiedResistance => "UnclassifiedResistance",
            NodeKind::UnclassifiedResistanceClass => "UnclassifiedResistanceClass",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical pan-gene identifier following the `pan_<number>` naming scheme.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PanGeneId(String);

impl PanGeneId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PanGeneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PanGeneId {
    type Err = PanResError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_string();
        let digits = normalized.strip_prefix("pan_");
        let is_valid = digits
            .map(|rest| !rest.is_empty() && rest.chars().all(|ch| ch.is_ascii_digit()))
            .unwrap_or(false);
        if !is_valid {
            return Err(PanResError::InvalidPanGeneId(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

/// Columns selectable for the flattened per-gene CSV export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ExportColumn {
    Name,
    Accession,
    Length,
    Cluster,
    CardLink,
    PredictedPhenotype,
    ResistanceClass,
    MetalResistance,
    BiocideResistance,
    Database,
    SameAs,
    FastaHeader,
    Mechanism,
}

impl ExportColumn {
    pub fn header(&self) -> &'static str {
        match self {
            ExportColumn::Name => "name",
            ExportColumn::Accession => "accession",
            ExportColumn::Length => "has_length",
            ExportColumn::Cluster => "member_of",
            ExportColumn::CardLink => "card_link",
            ExportColumn::PredictedPhenotype => "has_predicted_phenotype",
            ExportColumn::ResistanceClass => "has_resistance_class",
            ExportColumn::MetalResistance => "has_predicted_metal_resistance",
            ExportColumn::BiocideResistance => "has_predicted_biocide_resistance",
            ExportColumn::Database => "is_from_database",
            ExportColumn::SameAs => "same_as",
            ExportColumn::FastaHeader => "original_fasta_header",
            ExportColumn::Mechanism => "has_mechanism_of_resistance",
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_pan_gene_id_valid() {
        let id: PanGeneId = "pan_1204".parse().unwrap();
        assert_eq!(id.as_str(), "pan_1204");
    }

    #[test]
    fn parse_pan_gene_id_invalid() {
        let err = "blaTEM-1".parse::<PanGeneId>().unwrap_err();
        assert_matches!(err, PanResError::InvalidPanGeneId(_));
        assert!("pan_".parse::<PanGeneId>().is_err());
    }

    #[test]
    fn parse_source_db_short_tags() {
        let db: SourceDb = "card_amr".parse().unwrap();
        assert_eq!(db, SourceDb::Card);
        let db: SourceDb = "functional_amr".parse().unwrap();
        assert_eq!(db, SourceDb::ResFinderFg);
        let db: SourceDb = "MegaRes".parse().unwrap();
        assert_eq!(db, SourceDb::MegaRes);
    }

    #[test]
    fn parse_source_db_unknown() {
        let err = "deeparg".parse::<SourceDb>().unwrap_err();
        assert_matches!(err, PanResError::UnknownDatabase(_));
    }
}
