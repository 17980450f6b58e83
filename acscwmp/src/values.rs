//! Valeurs scalaires et structures CWMP
//!
//! Chaque champ d'une structure CWMP est un élément enfant non qualifié,
//! lu dans n'importe quel ordre et écrit dans l'ordre de déclaration.
//! Les structures sont déclarées avec [`cwmp_struct!`], qui génère le
//! décodage champ par champ et l'encodage ordonné.

use acsxml::{BytesStart, DecodeError, EncodeError, XmlDecoder, XmlEncoder, local_name, qualified};
use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat};
use std::io::{BufRead, Write};

use crate::XMLNS_CWMP;

/// Horodatage CWMP ; `None` pour le temps inconnu
pub type Time = Option<DateTime<FixedOffset>>;

/// Valeur `dateTime` signifiant "inconnu"
pub const UNKNOWN_TIME: &str = "0001-01-01T00:00:00Z";

/// Valeur portée par un élément `<name>...</name>`
pub(crate) trait Value: Sized {
    fn decode_value<R: BufRead>(
        d: &mut XmlDecoder<R>,
        start: &BytesStart<'_>,
    ) -> Result<Self, DecodeError>;

    fn encode_value<W: Write>(&self, e: &mut XmlEncoder<W>, name: &str)
    -> Result<(), EncodeError>;
}

/// Nom des éléments d'une liste (`<ParameterList><ParameterValueStruct>...`)
pub(crate) trait ListItem {
    const ITEM: &'static str;
}

/// Structure dont les champs sont des éléments enfants
pub(crate) trait Fields: Default {
    /// Décode le champ `start` ; `false` si le nom est inconnu, sans rien
    /// consommer.
    fn decode_field<R: BufRead>(
        &mut self,
        d: &mut XmlDecoder<R>,
        start: &BytesStart<'_>,
    ) -> Result<bool, DecodeError>;

    fn encode_fields<W: Write>(&self, e: &mut XmlEncoder<W>) -> Result<(), EncodeError>;
}

/// Lit les enfants de l'élément courant ; les champs inconnus sont sautés
pub(crate) fn decode_struct<T: Fields, R: BufRead>(
    d: &mut XmlDecoder<R>,
) -> Result<T, DecodeError> {
    let mut value = T::default();
    while let Some(child) = d.next_child()? {
        if !value.decode_field(d, &child)? {
            d.skip()?;
        }
    }
    Ok(value)
}

pub(crate) fn encode_struct<T: Fields, W: Write>(
    e: &mut XmlEncoder<W>,
    name: &str,
    value: &T,
) -> Result<(), EncodeError> {
    e.start(BytesStart::new(name))?;
    value.encode_fields(e)?;
    e.end(name)
}

/// Message de corps : `<name xmlns="urn:dslforum-org:cwmp-1-0">`
pub(crate) fn encode_message<T: Fields, W: Write>(
    e: &mut XmlEncoder<W>,
    name: &str,
    value: &T,
) -> Result<(), EncodeError> {
    e.start(qualified(name, XMLNS_CWMP))?;
    value.encode_fields(e)?;
    e.end(name)
}

impl Value for String {
    fn decode_value<R: BufRead>(
        d: &mut XmlDecoder<R>,
        _start: &BytesStart<'_>,
    ) -> Result<Self, DecodeError> {
        d.read_text()
    }

    fn encode_value<W: Write>(&self, e: &mut XmlEncoder<W>, name: &str) -> Result<(), EncodeError> {
        e.text_element(name, self)
    }
}

impl ListItem for String {
    const ITEM: &'static str = "string";
}

impl Value for u32 {
    fn decode_value<R: BufRead>(
        d: &mut XmlDecoder<R>,
        start: &BytesStart<'_>,
    ) -> Result<Self, DecodeError> {
        d.read_value(start)
    }

    fn encode_value<W: Write>(&self, e: &mut XmlEncoder<W>, name: &str) -> Result<(), EncodeError> {
        e.value_element(name, self)
    }
}

impl Value for bool {
    fn decode_value<R: BufRead>(
        d: &mut XmlDecoder<R>,
        start: &BytesStart<'_>,
    ) -> Result<Self, DecodeError> {
        d.read_bool(start)
    }

    fn encode_value<W: Write>(&self, e: &mut XmlEncoder<W>, name: &str) -> Result<(), EncodeError> {
        e.value_element(name, self)
    }
}

impl Value for Time {
    fn decode_value<R: BufRead>(
        d: &mut XmlDecoder<R>,
        start: &BytesStart<'_>,
    ) -> Result<Self, DecodeError> {
        let text = d.read_text()?;
        parse_time(&text).ok_or_else(|| DecodeError::InvalidValue {
            element: local_name(start),
            value: text,
        })
    }

    fn encode_value<W: Write>(&self, e: &mut XmlEncoder<W>, name: &str) -> Result<(), EncodeError> {
        e.text_element(name, &format_time(self))
    }
}

impl<T: Value + ListItem> Value for Vec<T> {
    fn decode_value<R: BufRead>(
        d: &mut XmlDecoder<R>,
        _start: &BytesStart<'_>,
    ) -> Result<Self, DecodeError> {
        let mut items = Vec::new();
        while let Some(child) = d.next_child()? {
            if local_name(&child) == T::ITEM {
                items.push(T::decode_value(d, &child)?);
            } else {
                d.skip()?;
            }
        }
        Ok(items)
    }

    fn encode_value<W: Write>(&self, e: &mut XmlEncoder<W>, name: &str) -> Result<(), EncodeError> {
        e.start(BytesStart::new(name))?;
        for item in self {
            item.encode_value(e, T::ITEM)?;
        }
        e.end(name)
    }
}

/// Analyse un `dateTime` xsd.
///
/// Retourne `Some(None)` pour le temps inconnu ou un texte vide, `None` si
/// le texte est invalide. Sans fuseau, l'heure est prise en UTC.
pub fn parse_time(text: &str) -> Option<Time> {
    let text = text.trim();
    if text.is_empty() || text.starts_with("0001-01-01T00:00:00") {
        return Some(None);
    }
    if let Ok(time) = DateTime::parse_from_rfc3339(text) {
        return Some(Some(time));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Some(naive.and_utc().fixed_offset()))
}

pub fn format_time(time: &Time) -> String {
    match time {
        Some(time) => time.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        None => UNKNOWN_TIME.to_string(),
    }
}

/// Déclare une structure CWMP.
///
/// `pub champ: Type => "Element"` : l'ordre des champs est l'ordre
/// d'écriture.
macro_rules! cwmp_struct {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                pub $field:ident : $ty:ty => $tag:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            $(
                $(#[$fmeta])*
                pub $field: $ty,
            )*
        }

        impl $crate::values::Fields for $name {
            #[allow(unused_variables)]
            fn decode_field<R: std::io::BufRead>(
                &mut self,
                d: &mut ::acsxml::XmlDecoder<R>,
                start: &::acsxml::BytesStart<'_>,
            ) -> Result<bool, ::acsxml::DecodeError> {
                Ok(match ::acsxml::local_name(start).as_str() {
                    $(
                        $tag => {
                            self.$field =
                                <$ty as $crate::values::Value>::decode_value(d, start)?;
                            true
                        }
                    )*
                    _ => false,
                })
            }

            #[allow(unused_variables)]
            fn encode_fields<W: std::io::Write>(
                &self,
                e: &mut ::acsxml::XmlEncoder<W>,
            ) -> Result<(), ::acsxml::EncodeError> {
                $(
                    $crate::values::Value::encode_value(&self.$field, e, $tag)?;
                )*
                Ok(())
            }
        }

        impl $crate::values::Value for $name {
            fn decode_value<R: std::io::BufRead>(
                d: &mut ::acsxml::XmlDecoder<R>,
                _start: &::acsxml::BytesStart<'_>,
            ) -> Result<Self, ::acsxml::DecodeError> {
                $crate::values::decode_struct(d)
            }

            fn encode_value<W: std::io::Write>(
                &self,
                e: &mut ::acsxml::XmlEncoder<W>,
                name: &str,
            ) -> Result<(), ::acsxml::EncodeError> {
                $crate::values::encode_struct(e, name, self)
            }
        }
    };
}

pub(crate) use cwmp_struct;

cwmp_struct! {
    /// Paire nom/valeur d'un paramètre du modèle de données
    pub struct ParameterValueStruct {
        pub name: String => "Name",
        pub value: String => "Value",
    }
}

impl ListItem for ParameterValueStruct {
    const ITEM: &'static str = "ParameterValueStruct";
}

impl ParameterValueStruct {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
