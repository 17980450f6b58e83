//! # acsxml - Primitives XML des codecs ACS
//!
//! Briques communes aux codecs SOAP et CWMP :
//!
//! - [`XmlDecoder`] : lecture en flux, élément par élément
//! - [`XmlEncoder`] : écriture en flux
//! - [`XmlElement`] : contrat d'un type (dé)sérialisable sous forme d'élément
//! - [`Prefixer`] : réécriture des namespaces par défaut en préfixes
//!
//! ## Example
//!
//! ```
//! use acsxml::Prefixer;
//! use std::io::Write;
//!
//! let mut p = Prefixer::new(Vec::new(), [("urn:example", "ex")]);
//! p.write_all(br#"<Root xmlns="urn:example"><Item>1</Item></Root>"#).unwrap();
//! let out = p.finish().unwrap();
//! assert_eq!(
//!     String::from_utf8(out).unwrap(),
//!     r#"<ex:Root xmlns:ex="urn:example"><Item>1</Item></ex:Root>"#
//! );
//! ```

mod decoder;
mod encoder;
mod error;
mod prefixer;

pub use decoder::{XmlDecoder, local_name};
pub use encoder::{XmlEncoder, qualified};
pub use error::{DecodeError, EncodeError, PrefixError};
pub use prefixer::Prefixer;

pub use quick_xml::events::BytesStart;

use std::io::{BufRead, Write};

/// Type représenté par un élément XML.
///
/// Le décodeur lit la balise ouvrante puis délègue : l'implémentation
/// reconnaît (ou non) le nom local et consomme alors tout l'élément,
/// balise fermante comprise.
pub trait XmlElement: Sized {
    /// Décode l'élément `start`.
    ///
    /// Retourne `Ok(None)` sans rien consommer si le nom n'est pas reconnu.
    fn decode_element<R: BufRead>(
        d: &mut XmlDecoder<R>,
        start: &BytesStart<'_>,
    ) -> Result<Option<Self>, DecodeError>;

    fn encode_element<W: Write>(&self, e: &mut XmlEncoder<W>) -> Result<(), EncodeError>;
}

/// Accepte n'importe quel élément et l'ignore ; n'écrit rien.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Skip;

impl XmlElement for Skip {
    fn decode_element<R: BufRead>(
        d: &mut XmlDecoder<R>,
        _start: &BytesStart<'_>,
    ) -> Result<Option<Self>, DecodeError> {
        d.skip()?;
        Ok(Some(Skip))
    }

    fn encode_element<W: Write>(&self, _e: &mut XmlEncoder<W>) -> Result<(), EncodeError> {
        Ok(())
    }
}
