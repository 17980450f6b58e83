//! Erreurs du codec XML

use quick_xml::escape::EscapeError;
use quick_xml::events::attributes::AttrError;
use std::str::Utf8Error;
use thiserror::Error;

/// Erreur de décodage d'un message
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Violation de la grammaire de l'enveloppe (mauvaise racine, Body absent...)
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Élément de corps absent du catalogue
    #[error("unrecognized message <{0}>")]
    UnrecognizedMessage(String),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed XML: {0}")]
    Malformed(String),

    /// Texte d'un élément impossible à convertir vers le type attendu
    #[error("invalid value for <{element}>: {value:?}")]
    InvalidValue { element: String, value: String },
}

impl DecodeError {
    /// Seul un message inconnu peut être traité par l'application
    /// (réponse par un Fault CWMP "method not supported").
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DecodeError::UnrecognizedMessage(_))
    }

    pub(crate) fn unexpected_eof() -> Self {
        DecodeError::Malformed("unexpected end of document".to_string())
    }
}

impl From<Utf8Error> for DecodeError {
    fn from(e: Utf8Error) -> Self {
        DecodeError::Malformed(format!("invalid UTF-8: {}", e))
    }
}

impl From<EscapeError> for DecodeError {
    fn from(e: EscapeError) -> Self {
        DecodeError::Malformed(format!("invalid escape sequence: {}", e))
    }
}

impl From<AttrError> for DecodeError {
    fn from(e: AttrError) -> Self {
        DecodeError::Malformed(format!("invalid attribute: {}", e))
    }
}

/// Erreur d'encodage d'un message
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    #[error("XML writing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("prefixing error: {0}")]
    Prefix(#[from] PrefixError),

    /// Valeur dans un état qui ne peut pas être sérialisé
    #[error("cannot encode {0}")]
    Unencodable(String),
}

// Le préfixeur est un `io::Write` : ses erreurs remontent enveloppées dans
// un `io::Error` qu'on déballe ici.
impl From<std::io::Error> for EncodeError {
    fn from(e: std::io::Error) -> Self {
        if !e.get_ref().is_some_and(|inner| inner.is::<PrefixError>()) {
            return EncodeError::Io(e);
        }
        match e.into_inner().map(|inner| inner.downcast::<PrefixError>()) {
            Some(Ok(prefix)) => EncodeError::Prefix(*prefix),
            _ => EncodeError::Unencodable("prefixed stream".to_string()),
        }
    }
}

/// Erreur du préfixeur de namespaces
#[derive(Debug, Error)]
pub enum PrefixError {
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed XML: {0}")]
    Malformed(String),

    #[error("unmatched end tag </{0}>")]
    UnmatchedEnd(String),

    /// Fin de flux signalée avec un élément ou un jeton inachevé
    #[error("unterminated XML stream")]
    Unterminated,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Le flux a déjà échoué, les écritures suivantes sont refusées
    #[error("stream already failed: {0}")]
    Failed(String),
}

impl From<Utf8Error> for PrefixError {
    fn from(e: Utf8Error) -> Self {
        PrefixError::Malformed(format!("invalid UTF-8: {}", e))
    }
}

impl From<EscapeError> for PrefixError {
    fn from(e: EscapeError) -> Self {
        PrefixError::Malformed(format!("invalid escape sequence: {}", e))
    }
}

impl From<AttrError> for PrefixError {
    fn from(e: AttrError) -> Self {
        PrefixError::Malformed(format!("invalid attribute: {}", e))
    }
}

impl From<PrefixError> for std::io::Error {
    fn from(e: PrefixError) -> Self {
        match e {
            PrefixError::Io(io) => io,
            other => std::io::Error::new(std::io::ErrorKind::InvalidData, other),
        }
    }
}
