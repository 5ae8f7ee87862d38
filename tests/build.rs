use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use panres_kb::app;
use panres_kb::config::ResolvedConfig;
use panres_kb::domain::{ExportColumn, SourceDb};
use panres_kb::error::PanResError;
use panres_kb::export::Snapshot;

struct Fixture {
    _dir: tempfile::TempDir,
    root: Utf8PathBuf,
    config: ResolvedConfig,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

    let targets = root.join("targets");
    std::fs::create_dir(targets.as_std_path()).unwrap();
    std::fs::write(
        targets.join("antibiotic.csv"),
        "drug,group,class\n\
         Ampicillin,Penicillins,Beta-Lactam\n\
         Amoxicillin,Penicillins,Beta-Lactam\n\
         Clavulanic acid,Beta-Lactamase Inhibitors,Beta-Lactam\n\
         Gentamicin,Aminoglycosides,Aminoglycoside\n",
    )
    .unwrap();
    std::fs::write(targets.join("metals.csv"), "Metal,symbol,note\nCopper,Cu,\n").unwrap();
    std::fs::write(
        targets.join("biocides.csv"),
        "Biocide,Class\nTriclosan,Phenolic Compound\n",
    )
    .unwrap();
    std::fs::write(targets.join("unclassified.csv"), "Compound,Class\nParaquat,\n").unwrap();

    let panres = root.join("panres.tsv");
    std::fs::write(
        panres.as_std_path(),
        "PanRes combined catalogue\n\
         userGeneName\tchosenSeq\tdatabase\tfa_header\tgene_len\n\
         pan_1_v1.0.0\tpan_1_v1.0.0\tresfinder_genes\tblaTEM-1_1_AB123456\t861\n\
         pan_2_v1.0.0\tpan_2_v1.0.0\tmegares_genes\tMEG_1~~~Drugs~~~betalactams\t1014\n\
         pan_3_v1.0.0\tpan_3_v1.0.0\targannot_genes\targannot~~~(Bla)blaTEM-1~~~JF910132~~~42-903~~~903\t861\n\
         pan_4_v1.0.0\tpan_4_v1.0.0\tcsabapal_genes\torf_00042\t500\n",
    )
    .unwrap();

    let resfinder = root.join("phenotypes.txt");
    std::fs::write(
        resfinder.as_std_path(),
        "Gene_accession no.\tClass\tPhenotype\tMechanism of resistance\n\
         blaTEM-1_1_AB123456\tBeta-lactam\tAmpicillin, Amoxicillin+Clavulanic acid\tEnzymatic inactivation\n",
    )
    .unwrap();

    let csabapal = root.join("csabapal.csv");
    std::fs::write(
        csabapal.as_std_path(),
        "orf_unique,antibiotic\norf_00042,GEN/CPR\n",
    )
    .unwrap();

    let config = ResolvedConfig {
        schema_version: 1,
        targets,
        panres,
        resfinder: Some(resfinder),
        card: None,
        amrfinderplus: None,
        resfinderfg_acronyms: None,
        bacmet: None,
        csabapal: Some(csabapal),
        prune: false,
    };

    Fixture {
        _dir: dir,
        root,
        config,
    }
}

#[test]
fn build_merges_annotations_onto_pan_genes() {
    let fixture = fixture();
    let snapshot_path = fixture.root.join("kb.json");

    let summary = app::build(&fixture.config, &snapshot_path, None).unwrap();
    assert_eq!(summary.ingest.genes, 4);
    assert_eq!(summary.ingest.original_genes, 4);
    assert_eq!(summary.ingest.skipped_rows, 0);
    assert_eq!(summary.pruned_nodes, 0);

    let snapshot = Snapshot::load(&snapshot_path).unwrap();
    let kb = &snapshot.knowledge_base;

    // ResFinder: class, simple phenotype and a lazily created combination.
    let gene = kb.genes.gene_by_name("pan_1").unwrap();
    let gene = kb.genes.gene(gene);
    let beta_lactam = kb.taxonomy.get("Beta-Lactam").unwrap();
    let ampicillin = kb.taxonomy.get("Ampicillin").unwrap();
    let combo = kb.taxonomy.get("Amoxicillin+Clavulanic Acid").unwrap();
    assert!(gene.annotations.resistance_classes.contains(&beta_lactam));
    assert!(gene.annotations.predicted_phenotypes.contains(&ampicillin));
    assert!(gene.annotations.predicted_phenotypes.contains(&combo));
    assert!(gene.mechanisms.contains("Enzymatic inactivation"));
    assert!(gene.accessions.contains("AB123456"));

    let combo_node = kb.taxonomy.node(combo);
    assert!(combo_node.is_drug_combination);
    let amoxicillin = kb.taxonomy.get("Amoxicillin").unwrap();
    let clavulanic = kb.taxonomy.get("Clavulanic Acid").unwrap();
    assert!(kb.taxonomy.is_subclass_of(combo, amoxicillin));
    assert!(kb.taxonomy.is_subclass_of(combo, clavulanic));
    assert!(combo_node.found_in.contains(&SourceDb::ResFinder));
    assert!(kb.taxonomy.node(ampicillin).found_in.contains(&SourceDb::ResFinder));

    // MegaRes: header class token, declared type Drugs.
    let gene = kb.genes.gene(kb.genes.gene_by_name("pan_2").unwrap());
    assert!(gene.annotations.resistance_classes.contains(&beta_lactam));

    // ARG-ANNOT: acronym expansion from the header.
    let gene = kb.genes.gene(kb.genes.gene_by_name("pan_3").unwrap());
    assert!(gene.annotations.resistance_classes.contains(&beta_lactam));

    // CsabaPal: one acronym resolves, the other antibiotic is not a target.
    let gene = kb.genes.gene(kb.genes.gene_by_name("pan_4").unwrap());
    let gentamicin = kb.taxonomy.get("Gentamicin").unwrap();
    assert!(gene.annotations.predicted_phenotypes.contains(&gentamicin));
    let csabapal_report = summary
        .reports
        .iter()
        .find(|report| report.database == SourceDb::CsabaPal)
        .unwrap();
    assert!(csabapal_report.failed_resolutions.contains_key("Ciprofloxacin"));
}

#[test]
fn export_writes_selected_columns() {
    let fixture = fixture();
    let snapshot_path = fixture.root.join("kb.json");
    app::build(&fixture.config, &snapshot_path, None).unwrap();

    let output = fixture.root.join("export/genes.csv");
    let written = app::export_csv(
        &snapshot_path,
        &output,
        &[
            ExportColumn::Name,
            ExportColumn::PredictedPhenotype,
            ExportColumn::ResistanceClass,
            ExportColumn::Database,
        ],
    )
    .unwrap();
    assert_eq!(written, 4);

    let content = std::fs::read_to_string(output.as_std_path()).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next().unwrap(),
        "name,has_predicted_phenotype,has_resistance_class,is_from_database"
    );
    let pan_1 = lines.find(|line| line.starts_with("pan_1")).unwrap();
    assert!(pan_1.contains("Ampicillin"));
    assert!(pan_1.contains("Amoxicillin+Clavulanic_Acid"));
    assert!(pan_1.contains("Beta_Lactam"));
    assert!(pan_1.contains("ResFinder"));
}

#[test]
fn export_turtle_renders_hierarchy() {
    let fixture = fixture();
    let snapshot_path = fixture.root.join("kb.json");
    app::build(&fixture.config, &snapshot_path, None).unwrap();

    let output = fixture.root.join("kb.ttl");
    app::export_turtle(&snapshot_path, &output).unwrap();

    let content = std::fs::read_to_string(output.as_std_path()).unwrap();
    assert!(content.contains("panres:Ampicillin a owl:Class, panres:AntibioticResistancePhenotype"));
    assert!(content.contains("rdfs:subClassOf panres:Beta_Lactam"));
    assert!(content.contains("panres:pan_1 a panres:PanGene"));
    assert!(content.contains("panres:is_drug_combination true"));
}

#[test]
fn prune_drops_unreferenced_targets() {
    let mut fixture = fixture();
    fixture.config.prune = true;
    let snapshot_path = fixture.root.join("kb.json");

    let summary = app::build(&fixture.config, &snapshot_path, None).unwrap();
    assert!(summary.pruned_nodes > 0);

    let snapshot = Snapshot::load(&snapshot_path).unwrap();
    let kb = &snapshot.knowledge_base;
    // Never annotated onto a gene, so pruned away.
    assert!(kb.taxonomy.get("Copper").is_none());
    assert!(kb.taxonomy.get("Triclosan").is_none());
    // Referenced phenotypes keep their class parents.
    let ampicillin = kb.taxonomy.get("Ampicillin").unwrap();
    let beta_lactam = kb.taxonomy.get("Beta-Lactam").unwrap();
    assert!(kb.taxonomy.is_subclass_of(ampicillin, beta_lactam));
}

#[test]
fn missing_gene_table_is_fatal() {
    let mut fixture = fixture();
    fixture.config.panres = fixture.root.join("does-not-exist.tsv");
    let snapshot_path = fixture.root.join("kb.json");

    let err = app::build(&fixture.config, &snapshot_path, None).unwrap_err();
    assert_matches!(err, PanResError::InputNotFound(_));
    assert!(!snapshot_path.as_std_path().exists());
}
