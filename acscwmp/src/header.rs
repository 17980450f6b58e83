//! En-tête CWMP

use crate::XMLNS_CWMP;
use acssoap::{SoapHeader, XMLNS_ENVELOPE};
use acsxml::{BytesStart, DecodeError, EncodeError, XmlDecoder, XmlEncoder, local_name, qualified};
use std::fmt;
use std::io::{BufRead, Write};

/// Liste de versions CWMP, transmise sous la forme `"1.0,1.1,1.4"`.
///
/// Les jetons sont gardés tels quels, blancs compris.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CwmpVersions(pub Vec<String>);

impl CwmpVersions {
    pub fn parse(text: &str) -> Self {
        CwmpVersions(text.split(',').map(str::to_string).collect())
    }
}

impl fmt::Display for CwmpVersions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

impl<S: Into<String>> FromIterator<S> for CwmpVersions {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        CwmpVersions(iter.into_iter().map(Into::into).collect())
    }
}

/// Entrées d'en-tête CWMP.
///
/// Chaque champ est présent ou absent indépendamment : `hold_requests`
/// absent et `Some(false)` sont deux états distincts sur le fil.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    /// Identifiant de la transaction, recopié dans la réponse
    pub id: Option<String>,
    pub hold_requests: Option<bool>,
    pub session_timeout: Option<u32>,
    pub supported_cwmp_versions: Option<CwmpVersions>,
    pub use_cwmp_version: Option<String>,
}

impl Header {
    /// En-tête ne portant que l'identifiant `id`
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }
}

/// `<name xmlns=cwmp soapenv:mustUnderstand="1">`
fn must_understand(name: &str) -> BytesStart<'static> {
    qualified(name, XMLNS_CWMP).with_attributes([
        ("xmlns:soapenv", XMLNS_ENVELOPE),
        ("soapenv:mustUnderstand", "1"),
    ])
}

impl SoapHeader for Header {
    fn decode_entry<R: BufRead>(
        &mut self,
        d: &mut XmlDecoder<R>,
        start: &BytesStart<'_>,
    ) -> Result<(), DecodeError> {
        match local_name(start).as_str() {
            "ID" => self.id = Some(d.read_text()?),
            "HoldRequests" => self.hold_requests = Some(d.read_bool(start)?),
            "SessionTimeout" => self.session_timeout = Some(d.read_value(start)?),
            "SupportedCWMPVersions" => {
                self.supported_cwmp_versions = Some(CwmpVersions::parse(&d.read_text()?))
            }
            "UseCWMPVersion" => self.use_cwmp_version = Some(d.read_text()?),
            _ => d.skip()?,
        }
        Ok(())
    }

    fn encode_entries<W: Write>(&self, e: &mut XmlEncoder<W>) -> Result<(), EncodeError> {
        if let Some(id) = &self.id {
            e.start(must_understand("ID"))?;
            e.text(id)?;
            e.end("ID")?;
        }
        if let Some(hold) = self.hold_requests {
            e.start(must_understand("HoldRequests"))?;
            e.text(if hold { "1" } else { "0" })?;
            e.end("HoldRequests")?;
        }
        if let Some(timeout) = self.session_timeout {
            e.start(qualified("SessionTimeout", XMLNS_CWMP))?;
            e.text(&timeout.to_string())?;
            e.end("SessionTimeout")?;
        }
        if let Some(versions) = &self.supported_cwmp_versions {
            e.start(qualified("SupportedCWMPVersions", XMLNS_CWMP))?;
            e.text(&versions.to_string())?;
            e.end("SupportedCWMPVersions")?;
        }
        if let Some(version) = &self.use_cwmp_version {
            e.start(must_understand("UseCWMPVersion"))?;
            e.text(version)?;
            e.end("UseCWMPVersion")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_keep_tokens_verbatim() {
        let v = CwmpVersions::parse("1.0, 1.1 ,1.4");
        assert_eq!(v.0, vec!["1.0", " 1.1 ", "1.4"]);
        assert_eq!(v.to_string(), "1.0, 1.1 ,1.4");
    }

    #[test]
    fn test_encode_entries() {
        let header = Header {
            hold_requests: Some(false),
            session_timeout: Some(30),
            ..Header::with_id("42")
        };
        let mut e = XmlEncoder::new(Vec::new());
        header.encode_entries(&mut e).unwrap();

        assert_eq!(
            String::from_utf8(e.into_inner()).unwrap(),
            concat!(
                r#"<ID xmlns="urn:dslforum-org:cwmp-1-0" xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" soapenv:mustUnderstand="1">42</ID>"#,
                r#"<HoldRequests xmlns="urn:dslforum-org:cwmp-1-0" xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" soapenv:mustUnderstand="1">0</HoldRequests>"#,
                r#"<SessionTimeout xmlns="urn:dslforum-org:cwmp-1-0">30</SessionTimeout>"#
            )
        );
    }
}
