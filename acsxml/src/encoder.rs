//! Écriture d'un flux XML

use crate::error::EncodeError;
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use std::io::Write;
use xmltree::{Element, XMLNode};

/// Balise ouvrante déclarant `ns` comme namespace par défaut
/// (`<name xmlns="ns">`).
pub fn qualified(name: &str, ns: &str) -> BytesStart<'static> {
    BytesStart::new(name.to_string()).with_attributes([("xmlns", ns)])
}

/// Encodeur XML en flux
///
/// Les balises sont écrites au fil de l'eau vers `W` ; rien n'est retenu en
/// mémoire hormis le tampon de `quick_xml::Writer`.
pub struct XmlEncoder<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> XmlEncoder<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: Writer::new(inner),
        }
    }

    pub fn start(&mut self, tag: BytesStart<'_>) -> Result<(), EncodeError> {
        self.writer.write_event(Event::Start(tag))?;
        Ok(())
    }

    pub fn end(&mut self, name: &str) -> Result<(), EncodeError> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// Texte échappé
    pub fn text(&mut self, text: &str) -> Result<(), EncodeError> {
        if !text.is_empty() {
            self.writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        Ok(())
    }

    /// `<name>text</name>`, toujours sous forme ouverte/fermée même vide
    pub fn text_element(&mut self, name: &str, text: &str) -> Result<(), EncodeError> {
        self.start(BytesStart::new(name))?;
        self.text(text)?;
        self.end(name)
    }

    /// `<name>value</name>` pour toute valeur affichable
    pub fn value_element<T: std::fmt::Display>(
        &mut self,
        name: &str,
        value: T,
    ) -> Result<(), EncodeError> {
        self.text_element(name, &value.to_string())
    }

    /// Réécrit un arbre capturé par [`crate::XmlDecoder::capture`].
    ///
    /// Les attributs sont triés par nom pour une sortie stable.
    pub fn tree(&mut self, element: &Element) -> Result<(), EncodeError> {
        let mut tag = BytesStart::new(element.name.as_str());
        let mut keys: Vec<&String> = element.attributes.keys().collect();
        keys.sort();
        for key in keys {
            if let Some(value) = element.attributes.get(key) {
                tag.push_attribute((key.as_str(), value.as_str()));
            }
        }

        self.start(tag)?;
        for child in &element.children {
            match child {
                XMLNode::Element(e) => self.tree(e)?,
                XMLNode::Text(t) => self.text(t)?,
                XMLNode::CData(t) => {
                    self.writer.write_event(Event::CData(BytesCData::new(t.as_str())))?;
                }
                XMLNode::Comment(t) => {
                    self.writer.write_event(Event::Comment(BytesText::from_escaped(t.as_str())))?;
                }
                _ => {}
            }
        }
        self.end(&element.name)
    }

    /// Vide le tampon vers la sortie
    pub fn flush(&mut self) -> Result<(), EncodeError> {
        self.writer.get_mut().flush()?;
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        self.writer.get_ref()
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::XmlDecoder;

    fn output(f: impl FnOnce(&mut XmlEncoder<Vec<u8>>) -> Result<(), EncodeError>) -> String {
        let mut e = XmlEncoder::new(Vec::new());
        f(&mut e).unwrap();
        String::from_utf8(e.into_inner()).unwrap()
    }

    #[test]
    fn test_qualified_start() {
        let xml = output(|e| {
            e.start(qualified("Envelope", "http://schemas.xmlsoap.org/soap/envelope/"))?;
            e.end("Envelope")
        });
        assert_eq!(
            xml,
            r#"<Envelope xmlns="http://schemas.xmlsoap.org/soap/envelope/"></Envelope>"#
        );
    }

    #[test]
    fn test_text_element_escapes() {
        let xml = output(|e| {
            e.text_element("Value", "a<b & c")?;
            e.text_element("Empty", "")?;
            e.value_element("Count", 42u32)
        });
        assert_eq!(
            xml,
            "<Value>a&lt;b &amp; c</Value><Empty></Empty><Count>42</Count>"
        );
    }

    #[test]
    fn test_tree_written_back() {
        let input = r#"<Vendor z="2" a="1"><Code>7</Code></Vendor>"#;
        let mut d = XmlDecoder::new(input.as_bytes());
        let root = d.root().unwrap();
        let tree = d.capture(&root).unwrap();

        let xml = output(|e| e.tree(&tree));
        assert_eq!(xml, r#"<Vendor a="1" z="2"><Code>7</Code></Vendor>"#);
    }
}
