//! SOAP Faults

use crate::XMLNS_ENVELOPE;
use acsxml::{
    BytesStart, DecodeError, EncodeError, XmlDecoder, XmlElement, XmlEncoder, local_name,
    qualified,
};
use std::io::{BufRead, Write};
use xmltree::Element;

/// Contenu de l'élément `<detail>`
#[derive(Debug, Clone, PartialEq)]
pub enum FaultDetail<D> {
    /// `<detail></detail>` : présent mais sans enfant
    Empty,

    /// Premier enfant reconnu par `D`
    Typed(D),

    /// Enfants non reconnus, capturés tels quels
    Opaque(Vec<Element>),
}

/// Erreur SOAP (Fault)
///
/// `factor` vaut la chaîne vide quand `faultfactor` est absent ; il est
/// toujours écrit. `detail` vaut `None` si l'élément `<detail>` est absent.
#[derive(Debug, Clone, PartialEq)]
pub struct SoapFault<D> {
    /// Code du fault (ex: "Client", "Server")
    pub code: String,

    /// Description de l'erreur
    pub string: String,

    pub factor: String,

    pub detail: Option<FaultDetail<D>>,
}

impl<D> SoapFault<D> {
    /// Crée un fault SOAP simple
    pub fn new(code: impl Into<String>, string: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            string: string.into(),
            factor: String::new(),
            detail: None,
        }
    }

    /// Crée un fault SOAP avec un détail typé
    pub fn with_detail(code: impl Into<String>, string: impl Into<String>, detail: D) -> Self {
        Self {
            detail: Some(FaultDetail::Typed(detail)),
            ..Self::new(code, string)
        }
    }

    /// Détail typé, s'il a été reconnu
    pub fn typed_detail(&self) -> Option<&D> {
        match &self.detail {
            Some(FaultDetail::Typed(detail)) => Some(detail),
            _ => None,
        }
    }
}

impl<D: XmlElement> SoapFault<D> {
    fn decode_detail<R: BufRead>(d: &mut XmlDecoder<R>) -> Result<FaultDetail<D>, DecodeError> {
        let mut typed = None;
        let mut opaque = Vec::new();

        while let Some(child) = d.next_child()? {
            if typed.is_some() {
                d.skip()?;
                continue;
            }
            match D::decode_element(d, &child)? {
                Some(detail) => typed = Some(detail),
                None => opaque.push(d.capture(&child)?),
            }
        }

        Ok(match typed {
            Some(detail) => FaultDetail::Typed(detail),
            None if opaque.is_empty() => FaultDetail::Empty,
            None => FaultDetail::Opaque(opaque),
        })
    }
}

impl<D: XmlElement> XmlElement for SoapFault<D> {
    fn decode_element<R: BufRead>(
        d: &mut XmlDecoder<R>,
        start: &BytesStart<'_>,
    ) -> Result<Option<Self>, DecodeError> {
        if local_name(start) != "Fault" {
            return Ok(None);
        }

        let mut fault = SoapFault::new(String::new(), String::new());
        while let Some(child) = d.next_child()? {
            match local_name(&child).as_str() {
                "faultcode" => fault.code = d.read_text()?,
                "faultstring" => fault.string = d.read_text()?,
                "faultfactor" => fault.factor = d.read_text()?,
                "detail" => fault.detail = Some(Self::decode_detail(d)?),
                _ => d.skip()?,
            }
        }
        Ok(Some(fault))
    }

    fn encode_element<W: Write>(&self, e: &mut XmlEncoder<W>) -> Result<(), EncodeError> {
        e.start(qualified("Fault", XMLNS_ENVELOPE))?;
        e.text_element("faultcode", &self.code)?;
        e.text_element("faultstring", &self.string)?;
        e.text_element("faultfactor", &self.factor)?;

        e.start(BytesStart::new("detail"))?;
        match &self.detail {
            Some(FaultDetail::Typed(detail)) => detail.encode_element(e)?,
            Some(FaultDetail::Opaque(elements)) => {
                for element in elements {
                    e.tree(element)?;
                }
            }
            Some(FaultDetail::Empty) | None => {}
        }
        e.end("detail")?;

        e.end("Fault")?;
        e.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acsxml::Skip;

    fn decode(xml: &str) -> SoapFault<Skip> {
        let mut d = XmlDecoder::new(xml.as_bytes());
        let start = d.root().unwrap();
        SoapFault::decode_element(&mut d, &start).unwrap().unwrap()
    }

    #[test]
    fn test_decode_fault_empty_detail() {
        let fault = decode(
            "<soapenv:Fault><faultcode>faultcodehere</faultcode><faultstring>faultstringhere</faultstring><faultfactor>faultfactorhere</faultfactor><detail></detail></soapenv:Fault>",
        );
        assert_eq!(fault.code, "faultcodehere");
        assert_eq!(fault.string, "faultstringhere");
        assert_eq!(fault.factor, "faultfactorhere");
        assert_eq!(fault.detail, Some(FaultDetail::Empty));
    }

    #[test]
    fn test_decode_fault_any_order() {
        let fault = decode(
            "<Fault><unknown>x</unknown><faultstring>s</faultstring><faultcode>c</faultcode></Fault>",
        );
        assert_eq!(fault.code, "c");
        assert_eq!(fault.string, "s");
        assert_eq!(fault.factor, "");
        assert_eq!(fault.detail, None);
    }

    #[test]
    fn test_not_a_fault() {
        let mut d = XmlDecoder::new("<Inform/>".as_bytes());
        let start = d.root().unwrap();
        assert!(
            SoapFault::<Skip>::decode_element(&mut d, &start)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_encode_fault_without_detail() {
        let fault: SoapFault<Skip> = SoapFault::new("Server", "boom");
        let mut e = XmlEncoder::new(Vec::new());
        fault.encode_element(&mut e).unwrap();

        assert_eq!(
            String::from_utf8(e.into_inner()).unwrap(),
            r#"<Fault xmlns="http://schemas.xmlsoap.org/soap/envelope/"><faultcode>Server</faultcode><faultstring>boom</faultstring><faultfactor></faultfactor><detail></detail></Fault>"#
        );
    }
}
