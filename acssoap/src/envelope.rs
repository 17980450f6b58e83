//! Structures de l'enveloppe SOAP

use crate::XMLNS_ENVELOPE;
use acsxml::{
    BytesStart, DecodeError, EncodeError, XmlDecoder, XmlElement, XmlEncoder, local_name,
    qualified,
};
use std::io::{BufRead, Write};

/// En-tête SOAP décodé entrée par entrée.
///
/// Un en-tête présent mais vide donne `H::default()`.
pub trait SoapHeader: Default {
    /// Décode l'entrée `start`. Une entrée inconnue doit être sautée
    /// (`d.skip()`) et non refusée.
    fn decode_entry<R: BufRead>(
        &mut self,
        d: &mut XmlDecoder<R>,
        start: &BytesStart<'_>,
    ) -> Result<(), DecodeError>;

    fn encode_entries<W: Write>(&self, e: &mut XmlEncoder<W>) -> Result<(), EncodeError>;
}

/// Aucun en-tête attendu : toutes les entrées sont ignorées
impl SoapHeader for () {
    fn decode_entry<R: BufRead>(
        &mut self,
        d: &mut XmlDecoder<R>,
        _start: &BytesStart<'_>,
    ) -> Result<(), DecodeError> {
        d.skip()
    }

    fn encode_entries<W: Write>(&self, _e: &mut XmlEncoder<W>) -> Result<(), EncodeError> {
        Ok(())
    }
}

/// Corps SOAP
#[derive(Debug, Clone, PartialEq)]
pub enum SoapBody<B> {
    /// `<Body/>` sans enfant
    Empty,

    /// Charge utile reconnue
    Content(B),

    /// Premier enfant dont le nom n'est pas reconnu par `B`
    Unrecognized(String),
}

/// Enveloppe SOAP complète
#[derive(Debug, Clone, PartialEq)]
pub struct SoapEnvelope<H, B> {
    /// En-tête SOAP optionnel
    pub header: Option<H>,

    /// Corps SOAP contenant la charge utile
    pub body: SoapBody<B>,
}

impl<H, B> SoapEnvelope<H, B> {
    /// Crée une nouvelle enveloppe SOAP sans en-tête
    pub fn new(body: B) -> Self {
        Self {
            header: None,
            body: SoapBody::Content(body),
        }
    }

    /// Crée une nouvelle enveloppe avec header
    pub fn with_header(header: H, body: B) -> Self {
        Self {
            header: Some(header),
            body: SoapBody::Content(body),
        }
    }

    pub fn content(&self) -> Option<&B> {
        match &self.body {
            SoapBody::Content(body) => Some(body),
            _ => None,
        }
    }

    /// Extrait la charge utile.
    ///
    /// Un corps inconnu donne [`DecodeError::UnrecognizedMessage`], que
    /// l'appelant peut traiter ; un corps vide est une erreur de protocole.
    pub fn into_content(self) -> Result<B, DecodeError> {
        match self.body {
            SoapBody::Content(body) => Ok(body),
            SoapBody::Unrecognized(name) => Err(DecodeError::UnrecognizedMessage(name)),
            SoapBody::Empty => Err(DecodeError::Protocol("empty Body".to_string())),
        }
    }
}

impl<H: SoapHeader, B: XmlElement> SoapEnvelope<H, B> {
    /// Décode une enveloppe depuis le début du document.
    ///
    /// Seuls les noms locaux sont comparés. Un corps inconnu n'est pas une
    /// erreur ici : il est sauté et signalé par [`SoapBody::Unrecognized`].
    pub fn decode<R: BufRead>(d: &mut XmlDecoder<R>) -> Result<Self, DecodeError> {
        let root = d.root()?;
        if local_name(&root) != "Envelope" {
            return Err(DecodeError::Protocol("expected Envelope".to_string()));
        }

        let mut child = expect_child(d)?;
        let mut header = None;

        if local_name(&child) == "Header" {
            let mut h = H::default();
            while let Some(entry) = d.next_child()? {
                h.decode_entry(d, &entry)?;
            }
            header = Some(h);
            child = expect_child(d)?;
        }

        if local_name(&child) != "Body" {
            return Err(DecodeError::Protocol("expected Body".to_string()));
        }
        let body = decode_body(d)?;

        // Tout ce qui suit le Body est ignoré
        while d.next_child()?.is_some() {
            d.skip()?;
        }

        Ok(Self { header, body })
    }

    /// Encode l'enveloppe dans le namespace SOAP.
    ///
    /// La sortie est vidée après l'en-tête, après le corps et à la fin :
    /// ce qui précède une erreur reste visible côté transport.
    pub fn encode<W: Write>(&self, e: &mut XmlEncoder<W>) -> Result<(), EncodeError> {
        e.start(qualified("Envelope", XMLNS_ENVELOPE))?;

        if let Some(header) = &self.header {
            e.start(qualified("Header", XMLNS_ENVELOPE))?;
            header.encode_entries(e)?;
            e.end("Header")?;
            e.flush()?;
        }

        e.start(qualified("Body", XMLNS_ENVELOPE))?;
        match &self.body {
            SoapBody::Empty => {}
            SoapBody::Content(body) => body.encode_element(e)?,
            SoapBody::Unrecognized(name) => {
                return Err(EncodeError::Unencodable(format!("unrecognized body <{}>", name)));
            }
        }
        e.end("Body")?;
        e.flush()?;

        e.end("Envelope")?;
        e.flush()
    }
}

fn expect_child<R: BufRead>(d: &mut XmlDecoder<R>) -> Result<BytesStart<'static>, DecodeError> {
    d.next_child()?
        .ok_or_else(|| DecodeError::Protocol("expected Body".to_string()))
}

/// Le premier enfant fixe le corps ; les suivants sont sautés.
fn decode_body<B: XmlElement, R: BufRead>(
    d: &mut XmlDecoder<R>,
) -> Result<SoapBody<B>, DecodeError> {
    let mut body = SoapBody::Empty;
    while let Some(start) = d.next_child()? {
        if !matches!(body, SoapBody::Empty) {
            d.skip()?;
            continue;
        }
        body = match B::decode_element(d, &start)? {
            Some(content) => SoapBody::Content(content),
            None => {
                d.skip()?;
                SoapBody::Unrecognized(local_name(&start))
            }
        };
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use acsxml::Skip;

    fn decode(xml: &str) -> Result<SoapEnvelope<(), Skip>, DecodeError> {
        SoapEnvelope::decode(&mut XmlDecoder::new(xml.as_bytes()))
    }

    #[test]
    fn test_expected_envelope() {
        match decode("<Message><Body/></Message>") {
            Err(DecodeError::Protocol(msg)) => assert_eq!(msg, "expected Envelope"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_expected_body() {
        for xml in [
            "<Envelope><Header/><Payload/></Envelope>",
            "<Envelope><Payload/></Envelope>",
            "<Envelope></Envelope>",
        ] {
            match decode(xml) {
                Err(DecodeError::Protocol(msg)) => assert_eq!(msg, "expected Body"),
                other => panic!("unexpected result for {}: {:?}", xml, other),
            }
        }
    }

    #[test]
    fn test_empty_header_and_body() {
        let env = decode("<Envelope><Header/><Body/></Envelope>").unwrap();
        assert_eq!(env.header, Some(()));
        assert_eq!(env.body, SoapBody::Empty);
        assert!(matches!(env.into_content(), Err(DecodeError::Protocol(_))));
    }

    #[test]
    fn test_trailing_content_ignored() {
        let env = decode("<Envelope><Body><A/></Body><Trailer><x/></Trailer></Envelope>").unwrap();
        assert_eq!(env.header, None);
        assert_eq!(env.body, SoapBody::Content(Skip));
    }

    #[test]
    fn test_unrecognized_body_not_encodable() {
        let env: SoapEnvelope<(), Skip> = SoapEnvelope {
            header: None,
            body: SoapBody::Unrecognized("Foo".to_string()),
        };
        let mut e = XmlEncoder::new(Vec::new());
        assert!(matches!(env.encode(&mut e), Err(EncodeError::Unencodable(_))));
    }
}
