//! Turtle serialization of a [`SemanticDocument`].
//!
//! Output is fully determined by the document: prefixes sorted by name,
//! schemes then concepts in document order, labels sorted by language tag.

use std::io::{self, Write};

use sdmx_model::Labels;

use crate::document::{ConceptNode, SchemeNode, SemanticDocument};

pub fn write_turtle<W: Write>(document: &SemanticDocument, out: &mut W) -> io::Result<()> {
    for (prefix, namespace) in &document.prefixes {
        writeln!(out, "@prefix {prefix}: <{namespace}> .")?;
    }
    for scheme in &document.schemes {
        writeln!(out)?;
        write_scheme(scheme, out)?;
    }
    for concept in &document.concepts {
        writeln!(out)?;
        write_concept(document, concept, out)?;
    }
    out.flush()
}

pub fn render_turtle(document: &SemanticDocument) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_turtle(document, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

fn write_scheme<W: Write>(scheme: &SchemeNode, out: &mut W) -> io::Result<()> {
    let mut block = Block::new(&scheme.uri, "skos:ConceptScheme");
    block.literal("skos:notation", &scheme.notation);
    block.labels("skos:prefLabel", &scheme.labels);
    if let Some(title) = &scheme.title {
        block.literal("dct:title", title);
    }
    block.labels("dct:description", &scheme.descriptions);
    if let Some(publisher) = &scheme.publisher {
        block.literal("dct:publisher", publisher);
    }
    if let Some(version) = &scheme.version {
        block.literal("owl:versionInfo", version);
    }
    if let Some(see_also) = &scheme.see_also {
        block.iris("rdfs:seeAlso", [see_also.as_str()]);
    }
    block.iris("skos:hasTopConcept", scheme.top_concepts.iter().map(String::as_str));
    block.write(out)
}

fn write_concept<W: Write>(
    document: &SemanticDocument,
    concept: &ConceptNode,
    out: &mut W,
) -> io::Result<()> {
    let mut block = Block::new(&concept.uri, "skos:Concept");
    block.iris("skos:inScheme", [concept.scheme.as_str()]);
    if concept.is_top_concept() {
        block.iris("skos:topConceptOf", [concept.scheme.as_str()]);
    }
    block.literal("skos:notation", &concept.notation);
    block.labels("skos:prefLabel", &concept.labels);
    if let Some(broader) = &concept.broader {
        block.iris("skos:broader", [broader.as_str()]);
    }
    block.iris("skos:narrower", concept.narrower.iter().map(String::as_str));
    block.iris("skos:exactMatch", document.exact_matches_of(&concept.uri));
    block.write(out)
}

/// One subject with its predicate-object lists.
struct Block {
    subject: String,
    lines: Vec<String>,
}

impl Block {
    fn new(subject: &str, class: &str) -> Self {
        Self {
            subject: format!("<{subject}>"),
            lines: vec![format!("a {class}")],
        }
    }

    fn literal(&mut self, predicate: &str, value: &str) {
        self.lines
            .push(format!("{predicate} \"{}\"", escape_literal(value)));
    }

    fn labels(&mut self, predicate: &str, labels: &Labels) {
        let objects: Vec<String> = labels
            .iter()
            .map(|(lang, text)| language_literal(text, lang))
            .collect();
        self.objects(predicate, objects);
    }

    fn iris<'a, I>(&mut self, predicate: &str, iris: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let objects = iris.into_iter().map(|iri| format!("<{iri}>")).collect();
        self.objects(predicate, objects);
    }

    fn objects(&mut self, predicate: &str, objects: Vec<String>) {
        if !objects.is_empty() {
            self.lines
                .push(format!("{predicate} {}", objects.join(", ")));
        }
    }

    fn write<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "{} ", self.subject)?;
        let last = self.lines.len().saturating_sub(1);
        for (idx, line) in self.lines.iter().enumerate() {
            if idx > 0 {
                write!(out, "    ")?;
            }
            let end = if idx == last { " ." } else { " ;" };
            writeln!(out, "{line}{end}")?;
        }
        Ok(())
    }
}

fn language_literal(text: &str, lang: &str) -> String {
    let text = escape_literal(text);
    if is_language_tag(lang) {
        format!("\"{text}\"@{lang}")
    } else {
        format!("\"{text}\"")
    }
}

/// `[a-zA-Z]+ ('-' [a-zA-Z0-9]+)*`
pub fn is_language_tag(tag: &str) -> bool {
    let mut parts = tag.split('-');
    let primary_ok = parts
        .next()
        .is_some_and(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphabetic()));
    primary_ok && parts.all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphanumeric()))
}

pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_quotes_and_newlines() {
        assert_eq!(escape_literal("a \"b\"\nc\\"), "a \\\"b\\\"\\nc\\\\");
    }

    #[test]
    fn language_tags() {
        assert!(is_language_tag("en"));
        assert!(is_language_tag("sr-latn"));
        assert!(!is_language_tag(""));
        assert!(!is_language_tag("en_us"));
        assert!(!is_language_tag("1en"));
    }
}
