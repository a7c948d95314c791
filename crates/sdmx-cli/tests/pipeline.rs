//! End-to-end runs of the pipeline over a temporary workspace.

use std::fs;
use std::path::Path;

use sdmx_cli::{RunConfig, RunSummary, run_pipeline};
use sdmx_model::CodelistError;

const REGISTRY: &str = "\
owning_organization;list_id;display_name;endpoint
ESTAT;CL_FREQ;Frequency;https://example.org/estat/cl_freq
NSO;CL_REGION;Regions;https://example.org/nso/cl_region
ESTAT;CL_FREQ;Frequency again;https://example.org/estat/cl_freq
IMF;CL_BROKEN;Broken;https://example.org/imf/cl_broken
IMF;CL_ABSENT;Absent;https://example.org/imf/cl_absent
";

fn codelist(agency: &str, id: &str, name: &str, codes: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<mes:Structure xmlns:mes="http://www.sdmx.org/resources/sdmxml/schemas/v2_1/message"
               xmlns:str="http://www.sdmx.org/resources/sdmxml/schemas/v2_1/structure"
               xmlns:com="http://www.sdmx.org/resources/sdmxml/schemas/v2_1/common">
  <mes:Structures>
    <str:Codelists>
      <str:Codelist id="{id}" agencyID="{agency}" version="1.0"
                    urn="urn:sdmx:org.sdmx.infomodel.codelist.Codelist={agency}:{id}(1.0)">
        <com:Name xml:lang="en">{name}</com:Name>
        {codes}
      </str:Codelist>
    </str:Codelists>
  </mes:Structures>
</mes:Structure>"#
    )
}

fn workspace(config_toml: &str) -> (tempfile::TempDir, RunConfig) {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    fs::create_dir_all(root.join("in")).expect("mkdir in");
    fs::create_dir_all(root.join("sdmx_codelists")).expect("mkdir sources");
    fs::write(root.join("in/codelists.csv"), REGISTRY).expect("registry");
    fs::write(
        root.join("sdmx_codelists/estat_cl_freq.xml"),
        codelist(
            "ESTAT",
            "CL_FREQ",
            "Frequency",
            r#"<str:Code id="A"><com:Name xml:lang="en">Annual</com:Name></str:Code>
               <str:Code id="M"><com:Name xml:lang="en">Monthly</com:Name></str:Code>"#,
        ),
    )
    .expect("freq");
    fs::write(
        root.join("sdmx_codelists/nso_cl_region.xml"),
        codelist(
            "NSO",
            "CL_REGION",
            "Regions",
            r#"<str:Code id="R1"><com:Name xml:lang="en">North</com:Name>
                 <str:Code id="R11"><com:Name xml:lang="en">North coast</com:Name></str:Code>
               </str:Code>"#,
        ),
    )
    .expect("region");
    fs::write(
        root.join("sdmx_codelists/imf_cl_broken.xml"),
        codelist(
            "IMF",
            "CL_BROKEN",
            "Broken",
            r#"<str:Code><com:Name xml:lang="en">No id</com:Name></str:Code>"#,
        ),
    )
    .expect("broken");
    let config_path = root.join("run.toml");
    fs::write(&config_path, config_toml).expect("config");
    let config = RunConfig::load(&config_path).expect("load config");
    (dir, config)
}

fn run(config: &RunConfig) -> (RunSummary, anyhow::Result<()>) {
    let mut summary = RunSummary::default();
    let result = run_pipeline(config, &mut summary);
    (summary, result)
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

#[test]
fn full_run_generates_checked_documents() {
    let (dir, config) = workspace("");
    let (summary, result) = run(&config);
    result.expect("run");

    assert_eq!(summary.total_sources, 5);
    assert_eq!(summary.duplicate_sources, 1);
    assert_eq!(summary.flattened, 2);
    assert_eq!(summary.malformed_documents, 1);
    assert_eq!(summary.missing_documents, 1);
    assert_eq!(summary.filtered_lists, 2);
    assert_eq!(summary.filtered_codes, 4);
    assert_eq!(summary.generated_documents, 2);
    assert_eq!(summary.warnings.len(), 3);

    let out = dir.path().join("cl_out");
    assert!(out.join("estat_cl_freq.ttl").exists());
    assert!(out.join("nso_cl_region.ttl").exists());
    assert!(out.join("codelists.ttl").exists());
    assert!(out.join("quality.json").exists());
    assert!(dir.path().join("analysis/filtered_codelists.csv").exists());

    assert_eq!(summary.reports.len(), 3);
    assert!(summary.reports.iter().all(|r| r.rating == 1.0), "{:?}", summary.reports);
    assert_eq!(summary.mean_rating(), Some(1.0));

    let region = read(&out.join("nso_cl_region.ttl"));
    assert!(region.contains(
        "skos:broader <https://w3id.org/sdmx-codelists/code/nso/cl_region/r1>"
    ));
    let freq = read(&out.join("estat_cl_freq.ttl"));
    assert!(freq.contains("<http://purl.org/linked-data/sdmx/2009/code#freq-M>"));
    assert!(freq.contains("dct:publisher \"Eurostat\""));
    assert!(freq.contains("dct:title \"Frequency\""));

    assert_eq!(summary.audit_rows, 1);
    let audit = read(&dir.path().join("analysis/missing_organization_labels.csv"));
    assert!(audit.contains("NSO;CL_REGION;Regions"));
}

#[test]
fn disabled_analysis_reuses_stored_tables() {
    let (dir, mut config) = workspace("");
    run(&config).1.expect("first run");
    let out = dir.path().join("cl_out");
    let first = read(&out.join("codelists.ttl"));

    // Without sources the stored tables are the only input.
    fs::remove_dir_all(dir.path().join("sdmx_codelists")).expect("remove sources");
    config.stages.analysis = false;
    let (summary, result) = run(&config);
    result.expect("second run");
    assert_eq!(summary.total_sources, 0);
    assert_eq!(summary.generated_documents, 2);
    assert_eq!(read(&out.join("codelists.ttl")), first);
}

#[test]
fn disabled_analysis_without_tables_is_missing_input() {
    let (dir, config) = workspace("[stages]\nanalysis = false\n");
    let (summary, result) = run(&config);
    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CodelistError>(),
        Some(CodelistError::MissingInput { .. })
    ));
    assert_eq!(summary.generated_documents, 0);
    assert!(!dir.path().join("cl_out").exists());
}

#[test]
fn prefix_conflict_stops_after_scheme_documents() {
    let (dir, config) = workspace(
        "[organizations.NSO]\nlabel = \"National Statistics Office\"\nbase_uri = \"https://data.nso.example/cl\"\n",
    );
    let (summary, result) = run(&config);
    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CodelistError>(),
        Some(CodelistError::PrefixConflicts { conflicts }) if conflicts.len() == 1
    ));
    assert_eq!(summary.prefix_conflicts.len(), 1);
    assert_eq!(summary.generated_documents, 2);

    let out = dir.path().join("cl_out");
    assert!(out.join("estat_cl_freq.ttl").exists());
    assert!(
        read(&out.join("nso_cl_region.ttl"))
            .contains("<https://data.nso.example/cl/nso/cl_region>")
    );
    assert!(!out.join("codelists.ttl").exists());
    assert!(!out.join("quality.json").exists());
    assert!(summary.reports.is_empty());
}

#[test]
fn missing_registry_column_is_fatal() {
    let (dir, config) = workspace("");
    fs::write(
        dir.path().join("in/codelists.csv"),
        "owning_organization;list_id;endpoint\nESTAT;CL_FREQ;https://x\n",
    )
    .expect("registry");
    let err = run(&config).1.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CodelistError>(),
        Some(CodelistError::Schema { .. })
    ));
    assert!(!dir.path().join("analysis").exists());
}
