//! Owning organization registry: labels and namespace overrides.

use std::collections::BTreeMap;

use sdmx_model::normalize_component;

const BUILTIN_LABELS: &[(&str, &str)] = &[
    ("SDMX", "SDMX Global Registry"),
    ("ESTAT", "Eurostat"),
    ("IMF", "International Monetary Fund"),
    ("UNSD", "United Nations Statistics Division"),
    (
        "IAEG-SDGs",
        "Inter-agency and Expert Group on SDG Indicators",
    ),
    ("UIS", "UNESCO Institute for Statistics"),
    (
        "OECD",
        "Organisation for Economic Co-operation and Development",
    ),
    ("ECB", "European Central Bank"),
    ("BIS", "Bank for International Settlements"),
    ("WB", "World Bank"),
    ("ILO", "International Labour Organization"),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Organization {
    pub label: Option<String>,
    /// Overrides the default minting prefix for this organization's lists.
    pub prefix: Option<String>,
    /// Overrides the default minting base URI for this organization's lists.
    pub base_uri: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationRegistry {
    entries: BTreeMap<String, Organization>,
}

impl OrganizationRegistry {
    /// Registry preloaded with the well-known SDMX agencies.
    pub fn with_builtin() -> Self {
        let mut registry = Self::default();
        for (id, label) in BUILTIN_LABELS {
            registry.entry(id).label = Some((*label).to_string());
        }
        registry
    }

    /// Merge an override; fields left `None` keep their current value.
    pub fn set(&mut self, id: &str, organization: Organization) {
        let entry = self.entry(id);
        if organization.label.is_some() {
            entry.label = organization.label;
        }
        if organization.prefix.is_some() {
            entry.prefix = organization.prefix;
        }
        if organization.base_uri.is_some() {
            entry.base_uri = organization.base_uri;
        }
    }

    pub fn get(&self, id: &str) -> Option<&Organization> {
        self.entries.get(&normalize_component(id))
    }

    /// Non-empty label of `id`, if one is known.
    pub fn label(&self, id: &str) -> Option<&str> {
        self.get(id)
            .and_then(|org| org.label.as_deref())
            .map(str::trim)
            .filter(|label| !label.is_empty())
    }

    /// Entries keyed by normalized organization id, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Organization)> {
        self.entries.iter().map(|(id, org)| (id.as_str(), org))
    }

    fn entry(&mut self, id: &str) -> &mut Organization {
        self.entries.entry(normalize_component(id)).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_labels_are_case_insensitive() {
        let registry = OrganizationRegistry::with_builtin();
        assert_eq!(registry.label("estat"), Some("Eurostat"));
        assert!(registry.label("iaeg-sdgs").is_some());
        assert_eq!(registry.label("ACME"), None);
    }

    #[test]
    fn overrides_merge_fields() {
        let mut registry = OrganizationRegistry::with_builtin();
        registry.set(
            "ESTAT",
            Organization {
                prefix: Some("estat".to_string()),
                ..Organization::default()
            },
        );
        registry.set(
            "ACME",
            Organization {
                label: Some("  ".to_string()),
                ..Organization::default()
            },
        );
        assert_eq!(registry.label("ESTAT"), Some("Eurostat"));
        assert_eq!(
            registry.get("ESTAT").and_then(|o| o.prefix.as_deref()),
            Some("estat")
        );
        assert_eq!(registry.label("ACME"), None);
    }
}
