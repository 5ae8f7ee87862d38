use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::PanResError;

/// On-disk shape of a build configuration file. Only the target workbook
/// and the combined PanRes table are mandatory; each annotation source is
/// opt-in and skipped with a log line when absent.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    pub targets: String,
    pub panres: String,
    #[serde(default)]
    pub resfinder: Option<String>,
    #[serde(default)]
    pub card: Option<String>,
    #[serde(default)]
    pub amrfinderplus: Option<String>,
    #[serde(default)]
    pub resfinderfg_acronyms: Option<String>,
    #[serde(default)]
    pub bacmet: Option<String>,
    #[serde(default)]
    pub csabapal: Option<String>,
    #[serde(default)]
    pub prune: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub targets: Utf8PathBuf,
    pub panres: Utf8PathBuf,
    pub resfinder: Option<Utf8PathBuf>,
    pub card: Option<Utf8PathBuf>,
    pub amrfinderplus: Option<Utf8PathBuf>,
    pub resfinderfg_acronyms: Option<Utf8PathBuf>,
    pub bacmet: Option<Utf8PathBuf>,
    pub csabapal: Option<Utf8PathBuf>,
    pub prune: bool,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, PanResError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("panres-kb.json"),
        };

        if path.is_none() && !config_path.exists() {
            return Err(PanResError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| PanResError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| PanResError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, PanResError> {
        let schema_version = config.schema_version.unwrap_or(1);

        Ok(ResolvedConfig {
            schema_version,
            targets: Utf8PathBuf::from(config.targets),
            panres: Utf8PathBuf::from(config.panres),
            resfinder: config.resfinder.map(Utf8PathBuf::from),
            card: config.card.map(Utf8PathBuf::from),
            amrfinderplus: config.amrfinderplus.map(Utf8PathBuf::from),
            resfinderfg_acronyms: config.resfinderfg_acronyms.map(Utf8PathBuf::from),
            bacmet: config.bacmet.map(Utf8PathBuf::from),
            csabapal: config.csabapal.map(Utf8PathBuf::from),
            prune: config.prune.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let config: Config = serde_json::from_str(
            r#"{"targets": "targets/", "panres": "panres.tsv"}"#,
        )
        .unwrap();

        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(resolved.targets, Utf8PathBuf::from("targets/"));
        assert!(resolved.resfinder.is_none());
        assert!(!resolved.prune);
    }

    #[test]
    fn parse_full_config() {
        let config: Config = serde_json::from_str(
            r#"{
                "schema_version": 1,
                "targets": "targets/",
                "panres": "panres.tsv",
                "resfinder": "phenotypes.txt",
                "card": "aro_index.tsv",
                "amrfinderplus": "refgene.tsv",
                "resfinderfg_acronyms": "acronyms.txt",
                "bacmet": "bacmet_mapping.txt",
                "csabapal": "daruka2025.csv",
                "prune": true
            }"#,
        )
        .unwrap();

        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.card, Some(Utf8PathBuf::from("aro_index.tsv")));
        assert!(resolved.prune);
    }
}
