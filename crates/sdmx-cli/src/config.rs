//! Run configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) gives a
//! runnable configuration. Relative paths are resolved against the directory
//! of the configuration file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use sdmx_analysis::CollisionPolicy;
use sdmx_ingest::RetrievalOptions;
use sdmx_model::CodelistError;
use sdmx_rdf::{
    DEFAULT_BASE_URI, DEFAULT_PREFIX, GeneratorConfig, Organization, OrganizationRegistry,
    Vocabulary, sdmx_2009,
};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub stages: StageToggles,
    pub paths: PathsConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
    /// Keyed by owning organization id.
    pub organizations: BTreeMap<String, OrganizationConfig>,
    pub vocabularies: Vec<VocabularyConfig>,
}

/// Which optional stages run. Generation and checking always run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StageToggles {
    pub retrieval: bool,
    /// When off, generation reads the filtered tables of an earlier run.
    pub analysis: bool,
}

impl Default for StageToggles {
    fn default() -> Self {
        Self {
            retrieval: false,
            analysis: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub registry: PathBuf,
    pub sources_dir: PathBuf,
    pub analysis_dir: PathBuf,
    pub output_dir: PathBuf,
    pub audit_table: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            registry: PathBuf::from("in/codelists.csv"),
            sources_dir: PathBuf::from("sdmx_codelists"),
            analysis_dir: PathBuf::from("analysis"),
            output_dir: PathBuf::from("cl_out"),
            audit_table: PathBuf::from("analysis/missing_organization_labels.csv"),
        }
    }
}

impl PathsConfig {
    fn resolve_against(&mut self, base: &Path) {
        for path in [
            &mut self.registry,
            &mut self.sources_dir,
            &mut self.analysis_dir,
            &mut self.output_dir,
            &mut self.audit_table,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrievalConfig {
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_attempts: 3,
            backoff_ms: 500,
        }
    }
}

impl RetrievalConfig {
    pub fn options(&self) -> RetrievalOptions {
        RetrievalOptions {
            timeout: Duration::from_secs(self.timeout_secs),
            max_attempts: self.max_attempts.max(1),
            backoff: Duration::from_millis(self.backoff_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    pub base_uri: String,
    pub prefix: String,
    pub collision_policy: CollisionPolicy,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_uri: DEFAULT_BASE_URI.to_string(),
            prefix: DEFAULT_PREFIX.to_string(),
            collision_policy: CollisionPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrganizationConfig {
    pub label: Option<String>,
    pub prefix: Option<String>,
    pub base_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VocabularyConfig {
    pub prefix: String,
    pub namespace: String,
    #[serde(default)]
    pub list_ids: Vec<String>,
    /// Code id to local name inside `namespace`.
    #[serde(default)]
    pub codes: BTreeMap<String, String>,
}

impl RunConfig {
    /// Load `path`, resolving relative paths against its directory.
    pub fn load(path: &Path) -> Result<Self, CodelistError> {
        let text = std::fs::read_to_string(path).map_err(|e| CodelistError::io(path, e))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&text, base).map_err(|message| CodelistError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parse TOML text, resolving relative paths against `base`.
    pub fn parse(text: &str, base: &Path) -> Result<Self, String> {
        let mut config: Self = toml::from_str(text).map_err(|e| e.to_string())?;
        config.paths.resolve_against(base);
        Ok(config)
    }

    pub fn generator_config(&self) -> GeneratorConfig {
        let mut organizations = OrganizationRegistry::with_builtin();
        for (id, org) in &self.organizations {
            organizations.set(
                id,
                Organization {
                    label: org.label.clone(),
                    prefix: org.prefix.clone(),
                    base_uri: org.base_uri.clone(),
                },
            );
        }
        let mut vocabularies = sdmx_2009();
        for entry in &self.vocabularies {
            let mut vocabulary = Vocabulary::new(&entry.prefix, &entry.namespace)
                .for_lists(&entry.list_ids);
            for (code, local) in &entry.codes {
                vocabulary.insert(code, local);
            }
            vocabularies.push(vocabulary);
        }
        GeneratorConfig {
            base_uri: self.generation.base_uri.clone(),
            prefix: self.generation.prefix.clone(),
            organizations,
            vocabularies,
        }
    }
}
