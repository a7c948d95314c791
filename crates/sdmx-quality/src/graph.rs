//! Turtle documents read back into a flat triple list.
//!
//! Parsing goes through `sophia_turtle`. Before parsing, a prefix scan finds
//! prefixed names whose prefix is never declared; those prefixes are bound to
//! a placeholder namespace so the rest of the document still loads, and the
//! names come back unresolved (`prefix:local`) for the coverage check.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use sophia_api::source::TripleSource;
use sophia_api::term::{Term as _, TermKind};
use sophia_api::triple::Triple as _;
use sophia_turtle::parser::turtle;
use thiserror::Error;

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
const UNDECLARED: &str = "urn:x-undeclared:";

/// Literals, IRIs and comments, blanked out before looking for prefixed names.
static OPAQUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*@?(?i:prefix|base)\b[^\n]*|(?s:""".*?"""|'''.*?''')|"(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*'|<[^<>\s]*>|#[^\n]*"#,
    )
    .expect("Invalid opaque-span regex")
});

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*@?(?i:prefix)[ \t]+([A-Za-z][\w.-]*)?:[ \t]*<([^<>\s]*)>")
        .expect("Invalid prefix declaration regex")
});

static PREFIXED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s;,(\[^])([A-Za-z][\w.-]*)?:([\w%][\w.:%-]*)?")
        .expect("Invalid prefixed name regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    Iri(String),
    Blank(String),
    Literal {
        value: String,
        lang: Option<String>,
        /// Set only for explicitly typed literals.
        datatype: Option<String>,
    },
}

impl Term {
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Self::Iri(iri) => Some(iri),
            _ => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(iri) => write!(f, "<{iri}>"),
            Self::Blank(id) => write!(f, "_:{id}"),
            Self::Literal {
                value,
                lang: Some(lang),
                ..
            } => write!(f, "{value:?}@{lang}"),
            Self::Literal {
                value,
                datatype: Some(datatype),
                ..
            } => write!(f, "{value:?}^^<{datatype}>"),
            Self::Literal { value, .. } => write!(f, "{value:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    /// IRI, or `_:id` for a blank node.
    pub subject: String,
    pub predicate: String,
    pub object: Term,
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub prefixes: BTreeMap<String, String>,
    pub triples: Vec<Triple>,
    /// Prefixed names whose prefix is never declared, as `prefix:local`.
    pub undeclared: BTreeSet<String>,
}

impl Graph {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let prefixes: BTreeMap<String, String> = DECLARATION
            .captures_iter(text)
            .map(|caps| {
                let prefix = caps.get(1).map_or("", |m| m.as_str());
                (prefix.to_string(), caps[2].to_string())
            })
            .collect();

        let undeclared: BTreeSet<String> = prefixed_names(text)
            .into_iter()
            .filter(|(prefix, _)| !prefixes.contains_key(prefix))
            .map(|(prefix, local)| format!("{prefix}:{local}"))
            .collect();
        let placeholders: BTreeSet<&str> = undeclared
            .iter()
            .filter_map(|name| name.split_once(':').map(|(prefix, _)| prefix))
            .collect();

        // Placeholder directives share line 1 so parser positions stay put.
        let mut source = String::with_capacity(text.len());
        for prefix in &placeholders {
            source.push_str(&format!("@prefix {prefix}: <{UNDECLARED}{prefix}:> . "));
        }
        source.push_str(text);

        let mut triples = Vec::new();
        turtle::parse_str(&source)
            .for_each_triple(|t| {
                let subject = match convert(t.s()) {
                    Some(Term::Iri(iri)) => iri,
                    Some(Term::Blank(id)) => format!("_:{id}"),
                    _ => return,
                };
                let (Some(Term::Iri(predicate)), Some(object)) = (convert(t.p()), convert(t.o()))
                else {
                    return;
                };
                triples.push(Triple {
                    subject,
                    predicate,
                    object,
                });
            })
            .map_err(|e| ParseError {
                message: e.to_string(),
            })?;

        Ok(Self {
            prefixes,
            triples,
            undeclared,
        })
    }

    /// Subjects typed as `class`.
    pub fn instances_of(&self, class: &str) -> BTreeSet<&str> {
        self.triples
            .iter()
            .filter(|t| t.predicate == RDF_TYPE && t.object.as_iri() == Some(class))
            .map(|t| t.subject.as_str())
            .collect()
    }

    pub fn objects<'a>(
        &'a self,
        subject: &'a str,
        predicate: &'a str,
    ) -> impl Iterator<Item = &'a Term> + 'a {
        self.triples
            .iter()
            .filter(move |t| t.subject == subject && t.predicate == predicate)
            .map(|t| &t.object)
    }

    pub fn with_predicate<'a>(
        &'a self,
        predicate: &'a str,
    ) -> impl Iterator<Item = &'a Triple> + 'a {
        self.triples.iter().filter(move |t| t.predicate == predicate)
    }

    /// Every resolved IRI in subject, predicate or object position.
    ///
    /// `rdf:type` is left out since Turtle spells it `a`.
    pub fn iris(&self) -> BTreeSet<&str> {
        let mut iris = BTreeSet::new();
        for triple in &self.triples {
            if !triple.subject.starts_with("_:") {
                iris.insert(triple.subject.as_str());
            }
            if triple.predicate != RDF_TYPE {
                iris.insert(triple.predicate.as_str());
            }
            if let Some(iri) = triple.object.as_iri() {
                iris.insert(iri);
            }
        }
        iris.retain(|iri| !self.undeclared.contains(*iri));
        iris
    }
}

/// `(prefix, local)` of every prefixed name outside literals, IRIs and comments.
fn prefixed_names(text: &str) -> BTreeSet<(String, String)> {
    let stripped = OPAQUE.replace_all(text, " ");
    PREFIXED_NAME
        .captures_iter(&stripped)
        .map(|caps| {
            let prefix = caps.get(1).map_or("", |m| m.as_str());
            let local = caps.get(2).map_or("", |m| m.as_str());
            (prefix.to_string(), local.trim_end_matches('.').to_string())
        })
        .collect()
}

fn convert<T: sophia_api::term::Term>(term: T) -> Option<Term> {
    match term.kind() {
        TermKind::Iri => {
            let iri = term.iri()?.as_str().to_string();
            Some(Term::Iri(match iri.strip_prefix(UNDECLARED) {
                Some(name) => name.to_string(),
                None => iri,
            }))
        }
        TermKind::BlankNode => Some(Term::Blank(term.bnode_id()?.as_str().to_string())),
        TermKind::Literal => {
            let value = term.lexical_form()?.to_string();
            let lang = term.language_tag().map(|tag| tag.as_str().to_string());
            let datatype = term
                .datatype()
                .map(|iri| iri.as_str().to_string())
                .filter(|iri| iri != XSD_STRING && iri != RDF_LANG_STRING);
            Some(Term::Literal {
                value,
                lang,
                datatype,
            })
        }
        _ => None,
    }
}
