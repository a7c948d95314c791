use std::fs;

use sdmx_ingest::{flatten_document, flatten_file, load_registry, source_document_path};
use sdmx_model::{CodelistError, SourceRow};

const SDMX_21: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mes:Structure xmlns:mes="http://www.sdmx.org/resources/sdmxml/schemas/v2_1/message"
               xmlns:str="http://www.sdmx.org/resources/sdmxml/schemas/v2_1/structure"
               xmlns:com="http://www.sdmx.org/resources/sdmxml/schemas/v2_1/common">
  <mes:Header><mes:ID>IREF</mes:ID></mes:Header>
  <mes:Structures>
    <str:Codelists>
      <str:Codelist id="CL_AREA" agencyID="ESTAT" version="1.0"
                    urn="urn:sdmx:org.sdmx.infomodel.codelist.Codelist=ESTAT:CL_AREA(1.0)">
        <com:Name xml:lang="en">Area</com:Name>
        <com:Name xml:lang="FR">Zone</com:Name>
        <com:Description xml:lang="en">Geographical areas</com:Description>
        <str:Code id="EU">
          <com:Name xml:lang="en">European Union</com:Name>
          <com:Name xml:lang="de">Europäische Union</com:Name>
        </str:Code>
        <str:Code id="BE">
          <com:Name xml:lang="en">Belgium</com:Name>
          <com:Name xml:lang="en">Duplicate label ignored</com:Name>
          <str:Parent><Ref id="EU"/></str:Parent>
        </str:Code>
        <str:Code id="X" parentID="EU"><com:Name>Unspecified</com:Name></str:Code>
      </str:Codelist>
    </str:Codelists>
  </mes:Structures>
</mes:Structure>"#;

fn area_source() -> SourceRow {
    SourceRow::new("ESTAT", "CL_AREA", "Area", "https://example.org/cl_area")
}

#[test]
fn flattens_sdmx_21_document() {
    let flat = flatten_document(SDMX_21, &area_source()).expect("flatten");
    let ids: Vec<&str> = flat.codes.iter().map(|c| c.code_id.as_str()).collect();
    assert_eq!(ids, vec!["EU", "BE", "X"]);
    assert_eq!(flat.codes[0].parent_code_id, None);
    assert_eq!(flat.codes[1].parent_code_id.as_deref(), Some("EU"));
    assert_eq!(flat.codes[2].parent_code_id.as_deref(), Some("EU"));
    assert_eq!(flat.codes[1].labels["en"], "Belgium");
    assert_eq!(flat.codes[2].labels[""], "Unspecified");
    assert_eq!(flat.codes[0].labels.len(), 2);

    let list = &flat.list;
    assert_eq!(list.code_count, 3);
    assert_eq!(list.version.as_deref(), Some("1.0"));
    assert_eq!(list.labels["fr"], "Zone");
    assert_eq!(list.descriptions["en"], "Geographical areas");
    assert_eq!(
        list.source_url.as_deref(),
        Some("https://registry.sdmx.org/sdmx/v2/structure/codelist/ESTAT/CL_AREA/1.0")
    );
    let tags: Vec<&str> = list.language_tags.iter().map(String::as_str).collect();
    assert_eq!(tags, vec!["de", "en", "fr"]);
}

#[test]
fn nested_and_sdmx_30_parents_normalize_to_same_field() {
    let nested = r#"<Codelist id="CL_AREA">
        <Code id="EU"><Name xml:lang="en">EU</Name>
          <Code id="BE"><Name xml:lang="en">Belgium</Name></Code>
        </Code>
    </Codelist>"#;
    let v30 = r#"<Codelist id="CL_AREA">
        <Code id="EU"><Name xml:lang="en">EU</Name></Code>
        <Code id="BE"><Name xml:lang="en">Belgium</Name><Parent>EU</Parent></Code>
    </Codelist>"#;
    let a = flatten_document(nested, &area_source()).expect("nested");
    let b = flatten_document(v30, &area_source()).expect("sdmx 3.0");
    assert_eq!(a.codes, b.codes);
}

#[test]
fn flattening_is_idempotent() {
    let first = flatten_document(SDMX_21, &area_source()).expect("first");
    let second = flatten_document(SDMX_21, &area_source()).expect("second");
    assert_eq!(first, second);
}

#[test]
fn code_without_identifier_is_malformed() {
    let xml = r#"<Codelist id="CL_AREA"><Code id="A"/><Code><Name>?</Name></Code></Codelist>"#;
    let err = flatten_document(xml, &area_source()).unwrap_err();
    assert!(matches!(err, CodelistError::MalformedSource { .. }));
    assert!(err.is_recoverable());
}

#[test]
fn malformed_document_does_not_affect_others() {
    let dir = tempfile::tempdir().expect("tempdir");
    let good = SourceRow::new("ESTAT", "CL_AREA", "Area", "");
    let bad = SourceRow::new("IMF", "CL_BROKEN", "Broken", "");
    fs::write(source_document_path(dir.path(), &good), SDMX_21).expect("write good");
    fs::write(
        source_document_path(dir.path(), &bad),
        r#"<Codelist id="CL_BROKEN"><Code/></Codelist>"#,
    )
    .expect("write bad");

    let results: Vec<_> = [&bad, &good]
        .into_iter()
        .map(|row| flatten_file(&source_document_path(dir.path(), row), row))
        .collect();
    assert!(matches!(results[0], Err(CodelistError::MalformedSource { .. })));
    let flat = results[1].as_ref().expect("good document");
    assert_eq!(flat.codes.len(), 3);
    assert_eq!(flat.list.source_sha256.as_ref().map(String::len), Some(64));
}

#[test]
fn missing_document_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let row = area_source();
    let err = flatten_file(&source_document_path(dir.path(), &row), &row).unwrap_err();
    assert!(matches!(err, CodelistError::MissingSource { .. }));
}

#[test]
fn duplicate_registry_rows_keep_first() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("registry.csv");
    fs::write(
        &path,
        "owning_organization;list_id;display_name;endpoint\n\
         ESTAT;CL_FREQ;Frequency;https://first\n\
         IMF;CL_AREA;Area;https://imf\n\
         ESTAT;CL_FREQ;Frequency again;https://second\n",
    )
    .expect("write registry");
    let load = load_registry(&path).expect("load");
    assert_eq!(load.rows.len(), 2);
    assert_eq!(load.rows[0].endpoint, "https://first");
    assert_eq!(load.duplicates.len(), 1);
    match &load.duplicates[0] {
        CodelistError::DuplicateKey { row, .. } => assert_eq!(*row, 4),
        other => panic!("unexpected error: {other}"),
    }
}
