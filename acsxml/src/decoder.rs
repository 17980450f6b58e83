//! Lecture d'un flux XML élément par élément
//!
//! [`XmlDecoder`] enveloppe un `quick_xml::Reader` et expose les quelques
//! primitives dont les codecs SOAP/CWMP ont besoin : trouver la racine,
//! itérer sur les enfants d'un élément, lire un texte, sauter un sous-arbre
//! ou le capturer tel quel dans un [`xmltree::Element`].

use crate::error::DecodeError;
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::errors::IllFormedError;
use quick_xml::{Error as XmlError, Reader};
use std::io::BufRead;
use std::str::FromStr;
use xmltree::{Element, XMLNode};

/// Nom local (sans préfixe) d'une balise ouvrante
pub fn local_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).to_string()
}

/// Décodeur XML en flux
pub struct XmlDecoder<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
}

impl<R: BufRead> XmlDecoder<R> {
    pub fn new(inner: R) -> Self {
        let mut reader = Reader::from_reader(inner);
        // <Foo/> est vu comme <Foo></Foo> : un seul chemin de lecture
        reader.config_mut().expand_empty_elements = true;

        Self {
            reader,
            buf: Vec::new(),
        }
    }

    fn next_event(&mut self) -> Result<Event<'static>, DecodeError> {
        self.buf.clear();
        match self.reader.read_event_into(&mut self.buf) {
            Ok(event) => Ok(event.into_owned()),
            Err(XmlError::IllFormed(
                IllFormedError::MismatchedEndTag { found, .. }
                | IllFormedError::UnmatchedEndTag(found),
            )) => Err(DecodeError::Protocol(format!("unmatched end tag </{}>", found))),
            Err(e) => Err(e.into()),
        }
    }

    /// Lit jusqu'à la première balise ouvrante du document
    pub fn root(&mut self) -> Result<BytesStart<'static>, DecodeError> {
        loop {
            match self.next_event()? {
                Event::Start(start) => return Ok(start),
                Event::End(end) => {
                    return Err(DecodeError::Protocol(format!(
                        "unexpected end tag </{}>",
                        String::from_utf8_lossy(end.name().as_ref())
                    )));
                }
                Event::Eof => return Err(DecodeError::Malformed("empty document".to_string())),
                _ => {}
            }
        }
    }

    /// Prochain enfant de l'élément courant.
    ///
    /// Retourne `None` quand la balise fermante de l'élément courant est
    /// atteinte (elle est alors consommée). Le texte entre les enfants est
    /// ignoré.
    pub fn next_child(&mut self) -> Result<Option<BytesStart<'static>>, DecodeError> {
        loop {
            match self.next_event()? {
                Event::Start(start) => return Ok(Some(start)),
                Event::End(_) => return Ok(None),
                Event::Eof => return Err(DecodeError::unexpected_eof()),
                _ => {}
            }
        }
    }

    /// Saute le reste de l'élément courant, balise fermante comprise
    pub fn skip(&mut self) -> Result<(), DecodeError> {
        let mut depth = 1usize;
        loop {
            match self.next_event()? {
                Event::Start(_) => depth += 1,
                Event::End(_) => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Event::Eof => return Err(DecodeError::unexpected_eof()),
                _ => {}
            }
        }
    }

    /// Lit le texte de l'élément courant jusqu'à sa balise fermante.
    ///
    /// Le texte est rendu tel quel (pas de trim). Les éléments imbriqués
    /// sont ignorés.
    pub fn read_text(&mut self) -> Result<String, DecodeError> {
        let mut text = String::new();
        loop {
            match self.next_event()? {
                Event::Text(e) => text.push_str(&e.decode().map_err(XmlError::Encoding)?),
                Event::CData(e) => text.push_str(&e.decode().map_err(XmlError::Encoding)?),
                Event::GeneralRef(r) => text.push_str(&resolve_reference(&r)?),
                Event::Start(_) => self.skip()?,
                Event::End(_) => return Ok(text),
                Event::Eof => return Err(DecodeError::unexpected_eof()),
                _ => {}
            }
        }
    }

    /// Lit le texte de l'élément `start` et le convertit avec `FromStr`
    pub fn read_value<T: FromStr>(&mut self, start: &BytesStart<'_>) -> Result<T, DecodeError> {
        let text = self.read_text()?;
        text.trim().parse().map_err(|_| DecodeError::InvalidValue {
            element: local_name(start),
            value: text,
        })
    }

    /// Booléen xsd : `1`/`0`/`true`/`false`
    pub fn read_bool(&mut self, start: &BytesStart<'_>) -> Result<bool, DecodeError> {
        let text = self.read_text()?;
        match text.trim() {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            _ => Err(DecodeError::InvalidValue {
                element: local_name(start),
                value: text,
            }),
        }
    }

    /// Capture l'élément `start` et tout son contenu dans un arbre `xmltree`.
    ///
    /// Les noms gardent leur forme brute (`prefix:local`). Les textes
    /// composés uniquement de blancs sont ignorés.
    pub fn capture(&mut self, start: &BytesStart<'_>) -> Result<Element, DecodeError> {
        let mut stack = vec![element_from(start)?];
        loop {
            match self.next_event()? {
                Event::Start(s) => stack.push(element_from(&s)?),
                Event::End(_) => {
                    let Some(done) = stack.pop() else {
                        return Err(DecodeError::Malformed("unbalanced capture".to_string()));
                    };
                    let done = drop_blank_text(done);
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(XMLNode::Element(done)),
                        None => return Ok(done),
                    }
                }
                Event::Text(e) => {
                    let text = e.decode().map_err(XmlError::Encoding)?;
                    push_text(&mut stack, &text);
                }
                Event::GeneralRef(r) => {
                    let text = resolve_reference(&r)?;
                    push_text(&mut stack, &text);
                }
                Event::CData(e) => {
                    let text = e.decode().map_err(XmlError::Encoding)?.into_owned();
                    if let Some(current) = stack.last_mut() {
                        current.children.push(XMLNode::CData(text));
                    }
                }
                Event::Comment(e) => {
                    let text = e.decode().map_err(XmlError::Encoding)?.into_owned();
                    if let Some(current) = stack.last_mut() {
                        current.children.push(XMLNode::Comment(text));
                    }
                }
                Event::Eof => return Err(DecodeError::unexpected_eof()),
                _ => {}
            }
        }
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<Element, DecodeError> {
    let qname = start.name();
    let name = std::str::from_utf8(qname.as_ref())?;
    let mut element = Element::new(name);
    for attr in start.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let raw = std::str::from_utf8(&attr.value)?;
        let value = unescape(raw)?.into_owned();
        element.attributes.insert(key, value);
    }
    Ok(element)
}

fn push_text(stack: &mut [Element], text: &str) {
    let Some(current) = stack.last_mut() else {
        return;
    };
    // Les références d'entités arrivent en événements séparés : on recolle
    if let Some(XMLNode::Text(previous)) = current.children.last_mut() {
        previous.push_str(text);
        return;
    }
    current.children.push(XMLNode::Text(text.to_string()));
}

/// Retire les textes faits uniquement de blancs, une fois l'élément fermé
fn drop_blank_text(mut element: Element) -> Element {
    element
        .children
        .retain(|child| !matches!(child, XMLNode::Text(t) if t.trim().is_empty()));
    element
}

/// Résout `&amp;`, `&#233;`, `&#x41;`...
fn resolve_reference(r: &BytesRef<'_>) -> Result<String, DecodeError> {
    if let Some(ch) = r.resolve_char_ref()? {
        return Ok(ch.to_string());
    }
    let name = r.decode().map_err(XmlError::Encoding)?;
    match resolve_predefined_entity(&name) {
        Some(value) => Ok(value.to_string()),
        None => Err(DecodeError::Malformed(format!("unknown entity &{};", name))),
    }
}
