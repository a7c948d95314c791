use std::fmt::{self, Write};

/// Registry key of a code list: `(owning_organization, list_id)`.
///
/// Both parts are stored normalized so that keys compare equal whenever the
/// minted identifiers would.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct SourceKey {
    organization: String,
    list_id: String,
}

impl SourceKey {
    pub fn new(organization: &str, list_id: &str) -> Self {
        Self {
            organization: normalize_component(organization),
            list_id: normalize_component(list_id),
        }
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn list_id(&self) -> &str {
        &self.list_id
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.organization, self.list_id)
    }
}

/// Normalize one identifier component for insertion into a URI path.
///
/// Leading and trailing whitespace is dropped, inner whitespace runs become a
/// single `_`, letters are lowercased and anything outside the RFC 3986
/// unreserved set is percent-encoded.
pub fn normalize_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (idx, word) in value.split_whitespace().enumerate() {
        if idx > 0 {
            out.push('_');
        }
        for ch in word.chars().flat_map(char::to_lowercase) {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '.' | '_' | '~') {
                out.push(ch);
            } else {
                let mut buf = [0u8; 4];
                for byte in ch.encode_utf8(&mut buf).bytes() {
                    let _ = write!(out, "%{byte:02X}");
                }
            }
        }
    }
    out
}

/// Key used to look a code up in an external vocabulary.
pub fn match_key(code_id: &str) -> String {
    code_id.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_component("  CL_FREQ "), "cl_freq");
        assert_eq!(normalize_component("IAEG-SDGs"), "iaeg-sdgs");
        assert_eq!(normalize_component("Unit \t of  measure"), "unit_of_measure");
    }

    #[test]
    fn percent_encodes_reserved_characters() {
        assert_eq!(normalize_component("A/B"), "a%2Fb");
        assert_eq!(normalize_component("T#1"), "t%231");
        assert_eq!(normalize_component("É"), "%C3%A9");
    }

    #[test]
    fn match_key_ignores_case() {
        assert_eq!(match_key("US"), match_key(" us"));
    }
}
