use proptest::prelude::*;

use sdmx_model::{CodeListRecord, CodeRecord, CodelistError};
use sdmx_rdf::{
    COMBINED_DOCUMENT, Generator, GeneratorConfig, Namespace, Organization, Vocabulary,
    render_turtle,
};

fn frequency() -> (CodeListRecord, Vec<CodeRecord>) {
    let codes = vec![
        CodeRecord::new("ESTAT", "CL_FREQ", "A")
            .with_label("en", "Annual")
            .with_label("fr", "Annuel"),
        CodeRecord::new("ESTAT", "CL_FREQ", "S")
            .with_label("en", "Half-yearly")
            .with_parent("A"),
        CodeRecord::new("ESTAT", "CL_FREQ", "M").with_label("en", "Monthly"),
    ];
    let mut list = CodeListRecord::new("ESTAT", "CL_FREQ", "Observation frequency");
    list.labels.insert("en".to_string(), "Frequency".to_string());
    list.version = Some("2.1".to_string());
    list.recompute(&codes);
    (list, codes)
}

fn area(org: &str) -> (CodeListRecord, Vec<CodeRecord>) {
    let codes = vec![
        CodeRecord::new(org, "CL_AREA", "US").with_label("en", "United States"),
        CodeRecord::new(org, "CL_AREA", "CA").with_label("en", "Canada"),
    ];
    let mut list = CodeListRecord::new(org, "CL_AREA", "Area");
    list.recompute(&codes);
    (list, codes)
}

#[test]
fn renders_scheme_document() {
    let (list, codes) = frequency();
    let generator = Generator::new(GeneratorConfig::default());
    let document = generator.build_document(&list, &codes).expect("build");
    insta::assert_snapshot!(render_turtle(&document), @r##"
    @prefix dct: <http://purl.org/dc/terms/> .
    @prefix owl: <http://www.w3.org/2002/07/owl#> .
    @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
    @prefix sdmx-code: <http://purl.org/linked-data/sdmx/2009/code#> .
    @prefix sip-sdmx: <https://w3id.org/sdmx-codelists/> .
    @prefix skos: <http://www.w3.org/2004/02/skos/core#> .

    <https://w3id.org/sdmx-codelists/estat/cl_freq> a skos:ConceptScheme ;
        skos:notation "CL_FREQ" ;
        skos:prefLabel "Frequency"@en ;
        dct:title "Observation frequency" ;
        dct:publisher "Eurostat" ;
        owl:versionInfo "2.1" ;
        skos:hasTopConcept <https://w3id.org/sdmx-codelists/code/estat/cl_freq/a>, <https://w3id.org/sdmx-codelists/code/estat/cl_freq/m> .

    <https://w3id.org/sdmx-codelists/code/estat/cl_freq/a> a skos:Concept ;
        skos:inScheme <https://w3id.org/sdmx-codelists/estat/cl_freq> ;
        skos:topConceptOf <https://w3id.org/sdmx-codelists/estat/cl_freq> ;
        skos:notation "A" ;
        skos:prefLabel "Annual"@en, "Annuel"@fr ;
        skos:narrower <https://w3id.org/sdmx-codelists/code/estat/cl_freq/s> ;
        skos:exactMatch <http://purl.org/linked-data/sdmx/2009/code#freq-A> .

    <https://w3id.org/sdmx-codelists/code/estat/cl_freq/s> a skos:Concept ;
        skos:inScheme <https://w3id.org/sdmx-codelists/estat/cl_freq> ;
        skos:notation "S" ;
        skos:prefLabel "Half-yearly"@en ;
        skos:broader <https://w3id.org/sdmx-codelists/code/estat/cl_freq/a> ;
        skos:exactMatch <http://purl.org/linked-data/sdmx/2009/code#freq-S> .

    <https://w3id.org/sdmx-codelists/code/estat/cl_freq/m> a skos:Concept ;
        skos:inScheme <https://w3id.org/sdmx-codelists/estat/cl_freq> ;
        skos:topConceptOf <https://w3id.org/sdmx-codelists/estat/cl_freq> ;
        skos:notation "M" ;
        skos:prefLabel "Monthly"@en ;
        skos:exactMatch <http://purl.org/linked-data/sdmx/2009/code#freq-M> .
    "##);
}

#[test]
fn regeneration_is_byte_identical() {
    let (list, codes) = frequency();
    let generator = Generator::new(GeneratorConfig::default());
    let first = tempfile::tempdir().expect("tempdir");
    let second = tempfile::tempdir().expect("tempdir");
    let a = generator.generate_schemes(std::slice::from_ref(&list), &codes, first.path());
    let b = generator.generate_schemes(std::slice::from_ref(&list), &codes, second.path());
    assert!(a.failures.is_empty() && b.failures.is_empty());
    let bytes_a = std::fs::read(&a.documents[0].path).expect("read a");
    let bytes_b = std::fs::read(&b.documents[0].path).expect("read b");
    assert_eq!(bytes_a, bytes_b);
    assert_eq!(
        a.documents[0].path.file_name().and_then(|n| n.to_str()),
        Some("estat_cl_freq.ttl")
    );
}

#[test]
fn exact_match_is_case_insensitive() {
    let (list, codes) = area("IMF");
    let mut config = GeneratorConfig::default();
    let mut iso = Vocabulary::new("iso3166", "http://example.org/iso3166/");
    iso.insert("us", "us");
    config.vocabularies.push(iso);
    let document = Generator::new(config)
        .build_document(&list, &codes)
        .expect("build");
    let links: Vec<_> = document.exact_matches.iter().collect();
    assert_eq!(links.len(), 1);
    assert_eq!(
        links[0].0,
        "https://w3id.org/sdmx-codelists/code/imf/cl_area/us"
    );
    assert_eq!(links[0].1, "http://example.org/iso3166/us");
    assert_eq!(
        document.prefixes.get("iso3166").map(String::as_str),
        Some("http://example.org/iso3166/")
    );
}

#[test]
fn prefix_conflict_fails_only_the_combined_document() {
    let (estat, estat_codes) = area("ESTAT");
    let (imf, imf_codes) = area("IMF");
    let (ecb, ecb_codes) = area("ECB");
    let mut config = GeneratorConfig::default();
    for (org, base) in [
        ("IMF", "https://data.imf.example/codelists"),
        ("ECB", "https://data.ecb.example/codelists"),
    ] {
        config.organizations.set(
            org,
            Organization {
                base_uri: Some(base.to_string()),
                ..Organization::default()
            },
        );
    }
    let generator = Generator::new(config);
    let dir = tempfile::tempdir().expect("tempdir");
    let codes: Vec<CodeRecord> = estat_codes
        .into_iter()
        .chain(imf_codes)
        .chain(ecb_codes)
        .collect();
    let outcome = generator.generate_schemes(&[estat, imf, ecb], &codes, dir.path());
    assert_eq!(outcome.documents.len(), 3);
    assert!(outcome.failures.is_empty());
    assert!(outcome.documents.iter().all(|d| d.path.exists()));

    let err = generator
        .write_combined(&outcome.documents, dir.path())
        .unwrap_err();
    let CodelistError::PrefixConflicts { conflicts } = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(conflicts.len(), 2);
    assert!(conflicts.iter().all(|conflict| matches!(
        conflict,
        CodelistError::PrefixConflict { prefix, .. } if prefix == "sip-sdmx"
    )));
    assert!(conflicts[1].to_string().contains("data.ecb.example"));
    assert!(!dir.path().join(COMBINED_DOCUMENT).exists());
}

#[test]
fn combined_document_holds_every_scheme() {
    let (freq, freq_codes) = frequency();
    let (area, area_codes) = area("IMF");
    let generator = Generator::new(GeneratorConfig::default());
    let dir = tempfile::tempdir().expect("tempdir");
    let codes: Vec<CodeRecord> = freq_codes.into_iter().chain(area_codes).collect();
    let outcome = generator.generate_schemes(&[freq, area], &codes, dir.path());
    let path = generator
        .write_combined(&outcome.documents, dir.path())
        .expect("combined");
    let text = std::fs::read_to_string(path).expect("read combined");
    assert_eq!(text.matches("a skos:ConceptScheme").count(), 2);
    assert_eq!(text.matches("a skos:Concept ;").count(), 5);
}

#[test]
fn unlabelled_organization_has_no_publisher() {
    let (list, codes) = area("ACME");
    let document = Generator::new(GeneratorConfig::default())
        .build_document(&list, &codes)
        .expect("build");
    assert_eq!(document.schemes[0].publisher, None);
    assert_eq!(document.schemes[0].labels.get(""), Some(&"Area".to_string()));
}

proptest! {
    #[test]
    fn minting_is_deterministic_and_normalized(
        org in "[A-Za-z][A-Za-z0-9 _/-]{0,10}",
        list_id in "[A-Za-z][A-Za-z0-9 _/-]{0,10}",
        code in "[A-Za-z0-9][A-Za-z0-9 _/.-]{0,10}",
    ) {
        let ns = Namespace::new("sip-sdmx", "https://w3id.org/sdmx-codelists");
        let uri = ns.concept_uri(&org, &list_id, &code);
        prop_assert_eq!(&uri, &ns.concept_uri(&org, &list_id, &code));
        prop_assert_eq!(
            &uri,
            &ns.concept_uri(
                &format!(" {} ", org.to_lowercase()),
                &list_id.to_uppercase(),
                &code.to_lowercase()
            )
        );
        prop_assert!(!uri.chars().any(char::is_whitespace));
        let path = uri.trim_start_matches("https://w3id.org/sdmx-codelists/");
        prop_assert_eq!(path.split('/').count(), 4);
        prop_assert!(uri.starts_with(&ns.iri()));
    }
}
