//! Target Taxonomy Loader: seeds the taxonomy store with the canonical
//! vocabulary from the reference workbook.
//!
//! The workbook is a directory holding four delimited sheets with fixed
//! names and columns: `antibiotic` (drug, group, class), `metals` (Metal,
//! symbol, note), `biocides` (Biocide, Class) and `unclassified` (Compound,
//! Class), each as `<name>.csv` or `<name>.tsv`. A missing sheet or missing
//! required column aborts the build; loading is idempotent because node
//! creation is keyed by normalized name.

use camino::{Utf8Path, Utf8PathBuf};
use csv::StringRecord;
use tracing::info;

use crate::domain::NodeKind;
use crate::error::PanResError;
use crate::normalize::{strip_plural, title_case};
use crate::taxonomy::TaxonomyStore;

pub fn load_targets(taxonomy: &mut TaxonomyStore, workbook: &Utf8Path) -> Result<(), PanResError> {
    load_antibiotics(taxonomy, workbook)?;
    load_metals(taxonomy, workbook)?;
    load_biocides(taxonomy, workbook)?;
    load_unclassified(taxonomy, workbook)?;
    info!("Loaded drug, biocide and metal targets into the taxonomy store.");
    Ok(())
}

fn load_antibiotics(taxonomy: &mut TaxonomyStore, workbook: &Utf8Path) -> Result<(), PanResError> {
    let sheet = Sheet::open(workbook, "antibiotic")?;
    let drug = sheet.column("drug")?;
    let class = sheet.column("class")?;
    let group = sheet.column("group")?;
    for record in sheet.records()? {
        let drug = title_case(field(&record, drug));
        let class = title_case(field(&record, class));
        // The group column is part of the fixed sheet layout and is
        // validated, but seeds no nodes: resolution is lookup-only against
        // drugs and classes (see DESIGN.md).
        let _group = strip_plural(field(&record, group));
        if drug.is_empty() || class.is_empty() {
            continue;
        }
        let class_node = taxonomy.create_or_get(NodeKind::AntibioticResistanceClass, &class);
        let phenotype_node =
            taxonomy.create_or_get(NodeKind::AntibioticResistancePhenotype, &drug);
        taxonomy.add_subclass_edge(phenotype_node, class_node);
    }
    Ok(())
}

fn load_metals(taxonomy: &mut TaxonomyStore, workbook: &Utf8Path) -> Result<(), PanResError> {
    let sheet = Sheet::open(workbook, "metals")?;
    let metal = sheet.column("Metal")?;
    let symbol = sheet.optional_column("symbol");
    let note = sheet.optional_column("note");
    for record in sheet.records()? {
        let name = title_case(&field(&record, metal).to_lowercase());
        if name.is_empty() {
            continue;
        }
        let node = taxonomy.create_or_get(NodeKind::Metal, &name);
        if let Some(symbol) = symbol.map(|i| field(&record, i)).filter(|s| !s.is_empty()) {
            taxonomy.set_symbol(node, symbol);
        }
        if let Some(note) = note.map(|i| field(&record, i)).filter(|s| !s.is_empty()) {
            taxonomy.set_comment(node, &format!("{} {note}", field(&record, metal)));
        }
    }
    Ok(())
}

fn load_biocides(taxonomy: &mut TaxonomyStore, workbook: &Utf8Path) -> Result<(), PanResError> {
    let sheet = Sheet::open(workbook, "biocides")?;
    let biocide = sheet.column("Biocide")?;
    let class = sheet.column("Class")?;
    for record in sheet.records()? {
        let name = title_case(&field(&record, biocide).to_lowercase());
        let class_name = title_case(&field(&record, class).to_lowercase());
        if name.is_empty() {
            continue;
        }
        let biocide_node = taxonomy.create_or_get(NodeKind::Biocide, &name);
        if !class_name.is_empty() {
            let class_node = taxonomy.create_or_get(NodeKind::BiocideClass, &class_name);
            taxonomy.add_subclass_edge(biocide_node, class_node);
        }
    }
    Ok(())
}

fn load_unclassified(taxonomy: &mut TaxonomyStore, workbook: &Utf8Path) -> Result<(), PanResError> {
    let sheet = Sheet::open(workbook, "unclassified")?;
    let compound = sheet.column("Compound")?;
    let class = sheet.optional_column("Class");
    for record in sheet.records()? {
        let name = title_case(&field(&record, compound).to_lowercase());
        if name.is_empty() {
            continue;
        }
        let node = taxonomy.create_or_get(NodeKind::UnclassifiedResistance, &name);
        // A missing or empty class cell is tolerated here, not an error.
        let class_name = class
            .map(|i| title_case(&field(&record, i).to_lowercase()))
            .unwrap_or_default();
        if !class_name.is_empty() {
            let class_node =
                taxonomy.create_or_get(NodeKind::UnclassifiedResistanceClass, &class_name);
            taxonomy.add_subclass_edge(node, class_node);
        }
    }
    Ok(())
}

fn field<'a>(record: &'a StringRecord, index: usize) -> &'a str {
    record.get(index).unwrap_or("").trim()
}

/// One workbook sheet: resolved path, parsed header row, indexed columns.
struct Sheet {
    name: String,
    path: Utf8PathBuf,
    delimiter: u8,
    headers: StringRecord,
}

impl Sheet {
    fn open(workbook: &Utf8Path, name: &str) -> Result<Self, PanResError> {
        let (path, delimiter) = resolve_sheet(workbook, name)
            .ok_or_else(|| PanResError::MissingSheet(format!("{name} in {workbook}")))?;
        let mut reader = Self::reader(&path, delimiter)?;
        let headers = reader
            .headers()
            .map_err(|err| PanResError::MalformedTable {
                path: path.clone().into_std_path_buf(),
                message: err.to_string(),
            })?
            .clone();
        Ok(Self {
            name: name.to_string(),
            path,
            delimiter,
            headers,
        })
    }

    fn reader(path: &Utf8Path, delimiter: u8) -> Result<csv::Reader<std::fs::File>, PanResError> {
        csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_path(path.as_std_path())
            .map_err(|err| PanResError::MalformedTable {
                path: path.to_path_buf().into_std_path_buf(),
                message: err.to_string(),
            })
    }

    fn column(&self, name: &str) -> Result<usize, PanResError> {
        self.optional_column(name)
            .ok_or_else(|| PanResError::MissingColumn {
                sheet: self.name.clone(),
                column: name.to_string(),
            })
    }

    fn optional_column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header.trim() == name)
    }

    fn records(&self) -> Result<Vec<StringRecord>, PanResError> {
        let mut reader = Self::reader(&self.path, self.delimiter)?;
        reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| PanResError::MalformedTable {
                path: self.path.clone().into_std_path_buf(),
                message: err.to_string(),
            })
    }
}

fn resolve_sheet(workbook: &Utf8Path, name: &str) -> Option<(Utf8PathBuf, u8)> {
    for (ext, delimiter) in [("csv", b','), ("tsv", b'\t')] {
        let candidate = workbook.join(format!("{name}.{ext}"));
        if candidate.as_std_path().exists() {
            return Some((candidate, delimiter));
        }
    }
    None
}
