//! Canonical external vocabularies used for `skos:exactMatch` links.

use std::collections::BTreeMap;

use sdmx_model::{match_key, normalize_component};

pub const SDMX_CODE_PREFIX: &str = "sdmx-code";
pub const SDMX_CODE_NAMESPACE: &str = "http://purl.org/linked-data/sdmx/2009/code#";

/// SDMX 2009 code schemes: bound list id, scheme name, codes.
const SDMX_2009_SCHEMES: &[(&str, &str, &[&str])] = &[
    ("CL_FREQ", "freq", &["A", "B", "D", "M", "N", "Q", "S", "W"]),
    ("CL_SEX", "sex", &["F", "M", "N", "T", "U"]),
    (
        "CL_OBS_STATUS",
        "obsStatus",
        &["A", "B", "E", "F", "I", "M", "P", "S"],
    ),
    ("CL_CONF_STATUS", "confStatus", &["C", "D", "F", "N", "S"]),
    (
        "CL_DECIMALS",
        "decimals",
        &["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"],
    ),
    (
        "CL_UNIT_MULT",
        "unitMult",
        &["0", "1", "2", "3", "4", "6", "9", "12", "15"],
    ),
    (
        "CL_TIME_FORMAT",
        "timeFormat",
        &[
            "102", "203", "602", "604", "608", "610", "616", "702", "704", "708", "710", "711",
            "716", "719", "P1D", "P1M", "P1Y", "P3M", "P6M", "P7D", "PT1M",
        ],
    ),
];

/// A lookup from case-normalized code ids to IRIs in one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    pub prefix: String,
    pub namespace: String,
    /// Normalized list ids this vocabulary applies to; empty means all lists.
    list_ids: Vec<String>,
    entries: BTreeMap<String, String>,
}

impl Vocabulary {
    pub fn new(prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            namespace: namespace.into(),
            list_ids: Vec::new(),
            entries: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn for_lists<I, S>(mut self, list_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.list_ids = list_ids
            .into_iter()
            .map(|id| normalize_component(id.as_ref()))
            .collect();
        self
    }

    /// Register `code` under `local_name` inside the namespace.
    pub fn insert(&mut self, code: &str, local_name: impl Into<String>) {
        self.entries.insert(match_key(code), local_name.into());
    }

    pub fn applies_to(&self, list_id: &str) -> bool {
        self.list_ids.is_empty() || self.list_ids.contains(&normalize_component(list_id))
    }

    /// Full IRI for `code_id`, matched case-insensitively.
    pub fn lookup(&self, code_id: &str) -> Option<String> {
        self.entries
            .get(&match_key(code_id))
            .map(|local| format!("{}{}", self.namespace, local))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The SDMX 2009 code vocabulary, one entry per bound code list.
pub fn sdmx_2009() -> Vec<Vocabulary> {
    SDMX_2009_SCHEMES
        .iter()
        .map(|(list_id, scheme, codes)| {
            let mut vocabulary =
                Vocabulary::new(SDMX_CODE_PREFIX, SDMX_CODE_NAMESPACE).for_lists([*list_id]);
            for code in *codes {
                vocabulary.insert(code, format!("{scheme}-{code}"));
            }
            vocabulary
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sdmx_frequency_codes_resolve() {
        let vocabularies = sdmx_2009();
        let freq = vocabularies
            .iter()
            .find(|v| v.applies_to("cl_freq"))
            .unwrap();
        assert_eq!(
            freq.lookup("a").as_deref(),
            Some("http://purl.org/linked-data/sdmx/2009/code#freq-A")
        );
        assert_eq!(freq.lookup("X"), None);
        assert!(!freq.applies_to("CL_AREA"));
    }

    #[test]
    fn unbound_vocabulary_applies_everywhere() {
        let mut iso = Vocabulary::new("iso3166", "http://example.org/iso3166/");
        iso.insert("us", "us");
        assert!(iso.applies_to("CL_AREA"));
        assert_eq!(
            iso.lookup("US").as_deref(),
            Some("http://example.org/iso3166/us")
        );
    }
}
