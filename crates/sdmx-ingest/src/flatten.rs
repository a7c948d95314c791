//! SDMX code-list flattening.
//!
//! Turns one SDMX-ML structure document into a [`CodeListRecord`] and the
//! codes it declares, in document order. Parent references are accepted in
//! every encoding seen in the wild:
//!
//! - SDMX 2.1 `<Parent><Ref id="X"/></Parent>`
//! - SDMX 3.0 `<Parent>X</Parent>`
//! - `parentID` / `parentCode` attributes on `<Code>`
//! - `<Code>` elements nested inside another `<Code>`
//!
//! All encodings end up in [`CodeRecord::parent_code_id`]. Validation of the
//! references happens later, in the aggregator.

use std::borrow::Cow;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::escape;
use quick_xml::events::{BytesRef, BytesStart, Event};
use sha2::{Digest, Sha256};

use sdmx_model::{CodeListRecord, CodeRecord, CodelistError, Result, SourceRow};

const REST_BASE: &str = "https://registry.sdmx.org/sdmx/v2/structure/codelist";
const URN_MARKER: &str = "Codelist=";

/// One flattened source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedList {
    pub list: CodeListRecord,
    pub codes: Vec<CodeRecord>,
}

/// Read and flatten the document stored at `path`.
///
/// A missing file is reported as [`CodelistError::MissingSource`].
pub fn flatten_file(path: &Path, source: &SourceRow) -> Result<FlattenedList> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(CodelistError::MissingSource {
                organization: source.owning_organization.clone(),
                list_id: source.list_id.clone(),
                path: path.to_path_buf(),
            });
        }
        Err(err) => return Err(CodelistError::io(path, err)),
    };
    flatten_bytes(&bytes, source)
}

/// Flatten raw document bytes, recording their SHA-256.
pub fn flatten_bytes(bytes: &[u8], source: &SourceRow) -> Result<FlattenedList> {
    let text = std::str::from_utf8(bytes).map_err(|err| {
        CodelistError::malformed(
            &source.owning_organization,
            &source.list_id,
            format!("document is not valid UTF-8: {err}"),
        )
    })?;
    let mut flattened = flatten_document(text, source)?;
    flattened.list.source_sha256 = Some(hex::encode(Sha256::digest(bytes)));
    Ok(flattened)
}

/// Flatten one document. The registry row is authoritative for the owning
/// organization and list id; mismatching ids in the document are logged.
pub fn flatten_document(xml: &str, source: &SourceRow) -> Result<FlattenedList> {
    let mut state = FlattenState::new(source);
    let mut reader = Reader::from_str(xml.trim_start_matches('\u{feff}'));
    loop {
        let event = reader.read_event().map_err(|err| {
            state.malformed(format!(
                "XML error at byte {}: {err}",
                reader.error_position()
            ))
        })?;
        match event {
            Event::Start(element) => state.open(&element)?,
            Event::Empty(element) => {
                state.open(&element)?;
                state.close();
            }
            Event::End(_) => state.close(),
            Event::Text(text) => {
                let text = std::str::from_utf8(&text)
                    .map_err(|err| state.malformed(format!("invalid text: {err}")))?;
                state.push_text(text);
            }
            Event::CData(data) => {
                let data = data.into_inner();
                let text = std::str::from_utf8(&data)
                    .map_err(|err| state.malformed(format!("invalid CDATA: {err}")))?;
                state.push_text(text);
            }
            Event::GeneralRef(reference) => {
                let resolved = resolve_reference(&reference)
                    .ok_or_else(|| state.malformed("unresolvable entity reference"))?;
                state.push_text(&resolved);
            }
            Event::Eof => break,
            _ => {}
        }
        if state.finished {
            break;
        }
    }
    state.finish()
}

/// Convert an SDMX codelist URN into the matching REST structure URL.
///
/// `urn:sdmx:org.sdmx.infomodel.codelist.Codelist=ESTAT:CL_FREQ(2.1)` becomes
/// `https://registry.sdmx.org/sdmx/v2/structure/codelist/ESTAT/CL_FREQ/2.1`.
pub fn rest_url_from_urn(urn: &str) -> Option<String> {
    let (_, reference) = urn.trim().split_once(URN_MARKER)?;
    let (agency, rest) = reference.split_once(':')?;
    let (id, version) = match rest.split_once('(') {
        Some((id, version)) => (id, version.strip_suffix(')')?),
        None => (rest, "latest"),
    };
    if agency.is_empty() || id.is_empty() || version.is_empty() {
        return None;
    }
    Some(format!("{REST_BASE}/{agency}/{id}/{version}"))
}

#[derive(Debug)]
enum Frame {
    Codelist,
    Code(usize),
    Name(String),
    Description(String),
    Parent,
    Other,
}

struct FlattenState<'a> {
    source: &'a SourceRow,
    list: CodeListRecord,
    codes: Vec<CodeRecord>,
    stack: Vec<Frame>,
    text: String,
    seen_codelist: bool,
    finished: bool,
    agency: Option<String>,
}

impl<'a> FlattenState<'a> {
    fn new(source: &'a SourceRow) -> Self {
        Self {
            source,
            list: CodeListRecord::new(
                &source.owning_organization,
                &source.list_id,
                &source.display_name,
            ),
            codes: Vec::new(),
            stack: Vec::new(),
            text: String::new(),
            seen_codelist: false,
            finished: false,
            agency: None,
        }
    }

    fn malformed(&self, reason: impl Into<String>) -> CodelistError {
        CodelistError::malformed(
            &self.source.owning_organization,
            &self.source.list_id,
            reason,
        )
    }

    fn inside_codelist(&self) -> bool {
        self.stack
            .iter()
            .any(|frame| matches!(frame, Frame::Codelist))
    }

    fn enclosing_code(&self) -> Option<usize> {
        self.stack.iter().rev().find_map(|frame| match frame {
            Frame::Code(idx) => Some(*idx),
            _ => None,
        })
    }

    fn open(&mut self, element: &BytesStart<'_>) -> Result<()> {
        let local = element.local_name();
        let frame = match local.as_ref() {
            b"Codelist" if !self.seen_codelist => {
                self.seen_codelist = true;
                self.read_codelist_attributes(element)?;
                Frame::Codelist
            }
            _ if !self.inside_codelist() => Frame::Other,
            b"Code" => self.open_code(element)?,
            b"Name" => {
                self.text.clear();
                Frame::Name(self.lang(element)?)
            }
            b"Description" => {
                self.text.clear();
                Frame::Description(self.lang(element)?)
            }
            b"Parent" => {
                self.text.clear();
                Frame::Parent
            }
            b"Ref" if matches!(self.stack.last(), Some(Frame::Parent)) => {
                if let (Some(id), Some(idx)) =
                    (self.attribute(element, b"id")?, self.enclosing_code())
                {
                    self.codes[idx].parent_code_id = Some(id);
                }
                Frame::Other
            }
            _ => Frame::Other,
        };
        self.stack.push(frame);
        Ok(())
    }

    fn open_code(&mut self, element: &BytesStart<'_>) -> Result<Frame> {
        let Some(code_id) = self.attribute(element, b"id")? else {
            return Err(self.malformed(format!(
                "code #{} has no identifier",
                self.codes.len() + 1
            )));
        };
        let explicit_parent = match self.attribute(element, b"parentID")? {
            Some(parent) => Some(parent),
            None => self.attribute(element, b"parentCode")?,
        };
        let mut code = CodeRecord::new(
            &self.source.owning_organization,
            &self.source.list_id,
            code_id,
        );
        code.parent_code_id = explicit_parent.or_else(|| {
            self.enclosing_code()
                .map(|idx| self.codes[idx].code_id.clone())
        });
        self.codes.push(code);
        Ok(Frame::Code(self.codes.len() - 1))
    }

    fn read_codelist_attributes(&mut self, element: &BytesStart<'_>) -> Result<()> {
        if let Some(id) = self.attribute(element, b"id")?
            && !id.eq_ignore_ascii_case(self.source.list_id.trim())
        {
            tracing::warn!(
                organization = %self.source.owning_organization,
                list_id = %self.source.list_id,
                document_id = %id,
                "document codelist id differs from registry"
            );
        }
        self.agency = self.attribute(element, b"agencyID")?;
        if let Some(agency) = &self.agency
            && !agency.eq_ignore_ascii_case(self.source.owning_organization.trim())
        {
            tracing::debug!(
                organization = %self.source.owning_organization,
                list_id = %self.source.list_id,
                agency = %agency,
                "document agency differs from registry organization"
            );
        }
        self.list.version = self.attribute(element, b"version")?;
        self.list.urn = self.attribute(element, b"urn")?;
        Ok(())
    }

    fn push_text(&mut self, text: &str) {
        if matches!(
            self.stack.last(),
            Some(Frame::Name(_) | Frame::Description(_) | Frame::Parent)
        ) {
            self.text.push_str(text);
        }
    }

    fn close(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let text = self.text.trim().to_string();
        match frame {
            Frame::Codelist => self.finished = true,
            Frame::Name(lang) if !text.is_empty() => match self.stack.last() {
                Some(Frame::Code(idx)) => {
                    self.codes[*idx].labels.entry(lang).or_insert(text);
                }
                Some(Frame::Codelist) => {
                    self.list.labels.entry(lang).or_insert(text);
                }
                _ => {}
            },
            Frame::Description(lang) if !text.is_empty() => {
                if matches!(self.stack.last(), Some(Frame::Codelist)) {
                    self.list.descriptions.entry(lang).or_insert(text);
                }
            }
            Frame::Parent if !text.is_empty() => {
                if let Some(Frame::Code(idx)) = self.stack.last() {
                    self.codes[*idx].parent_code_id = Some(text);
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Result<FlattenedList> {
        if !self.seen_codelist {
            return Err(self.malformed("no Codelist element"));
        }
        if !self.finished {
            return Err(self.malformed("document ends inside the Codelist element"));
        }
        self.list.source_url = match &self.list.urn {
            Some(urn) => rest_url_from_urn(urn),
            None => None,
        };
        self.list.recompute(&self.codes);
        tracing::debug!(
            organization = %self.source.owning_organization,
            list_id = %self.source.list_id,
            codes = self.codes.len(),
            "flattened code list"
        );
        Ok(FlattenedList {
            list: self.list,
            codes: self.codes,
        })
    }

    fn lang(&self, element: &BytesStart<'_>) -> Result<String> {
        for attribute in element.attributes() {
            let attribute = attribute
                .map_err(|err| self.malformed(format!("invalid attribute: {err}")))?;
            if attribute.key.as_ref() == b"xml:lang" {
                return Ok(self.decode_value(&attribute.value)?.trim().to_lowercase());
            }
        }
        Ok(String::new())
    }

    fn attribute(&self, element: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
        for attribute in element.attributes() {
            let attribute = attribute
                .map_err(|err| self.malformed(format!("invalid attribute: {err}")))?;
            if attribute.key.local_name().as_ref() == name {
                let value = self.decode_value(&attribute.value)?.trim().to_string();
                return Ok((!value.is_empty()).then_some(value));
            }
        }
        Ok(None)
    }

    fn decode_value<'v>(&self, raw: &'v [u8]) -> Result<Cow<'v, str>> {
        let text = std::str::from_utf8(raw)
            .map_err(|err| self.malformed(format!("invalid attribute value: {err}")))?;
        escape::unescape(text)
            .map_err(|err| self.malformed(format!("invalid attribute value: {err}")))
    }
}

fn resolve_reference(reference: &BytesRef<'_>) -> Option<String> {
    let name = std::str::from_utf8(reference).ok()?;
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    escape::resolve_predefined_entity(name).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> SourceRow {
        SourceRow::new("ESTAT", "CL_FREQ", "Frequency", "https://example.org/cl_freq")
    }

    #[test]
    fn urn_becomes_rest_url() {
        assert_eq!(
            rest_url_from_urn("urn:sdmx:org.sdmx.infomodel.codelist.Codelist=ESTAT:CL_FREQ(2.1)")
                .as_deref(),
            Some("https://registry.sdmx.org/sdmx/v2/structure/codelist/ESTAT/CL_FREQ/2.1")
        );
        assert_eq!(rest_url_from_urn("not a urn"), None);
    }

    #[test]
    fn entities_in_labels_are_resolved() {
        let xml = r#"<Codelist id="CL_FREQ"><Code id="A"><Name xml:lang="en">Goods &amp; services &#233;</Name></Code></Codelist>"#;
        let flat = flatten_document(xml, &source()).unwrap();
        assert_eq!(flat.codes[0].labels["en"], "Goods & services é");
    }

    #[test]
    fn missing_codelist_is_malformed() {
        let err = flatten_document("<Structure/>", &source()).unwrap_err();
        assert!(matches!(err, CodelistError::MalformedSource { .. }));
    }

    #[test]
    fn unclosed_document_is_malformed() {
        let err = flatten_document("<Codelist id=\"X\"><Code id=\"A\">", &source());
        assert!(err.is_err());
    }
}
