//! Inform et InformResponse

use crate::values::{Fields, ListItem, ParameterValueStruct, Time, cwmp_struct};
use acsxml::{BytesStart, DecodeError, EncodeError, XmlDecoder, XmlEncoder, local_name};
use std::io::{BufRead, Write};

cwmp_struct! {
    /// Identité de l'équipement
    pub struct DeviceIdStruct {
        pub manufacturer: String => "Manufacturer",
        pub oui: String => "OUI",
        pub product_class: String => "ProductClass",
        pub serial_number: String => "SerialNumber",
    }
}

cwmp_struct! {
    /// Événement à l'origine de la session (`"0 BOOTSTRAP"`, `"2 PERIODIC"`...)
    pub struct EventStruct {
        pub event_code: String => "EventCode",
        pub command_key: String => "CommandKey",
    }
}

impl ListItem for EventStruct {
    const ITEM: &'static str = "EventStruct";
}

cwmp_struct! {
    /// Ouverture de session par le CPE.
    ///
    /// `event` et `parameter_list` gardent l'ordre du message reçu.
    pub struct Inform {
        pub device_id: DeviceIdStruct => "DeviceId",
        pub event: Vec<EventStruct> => "Event",
        pub max_envelopes: u32 => "MaxEnvelopes",
        pub current_time: Time => "CurrentTime",
        pub retry_count: u32 => "RetryCount",
        pub parameter_list: Vec<ParameterValueStruct> => "ParameterList",
    }
}

impl Inform {
    /// Valeur d'un paramètre remonté par l'Inform
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameter_list
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// Vrai si l'Inform porte l'événement `code`
    pub fn has_event(&self, code: &str) -> bool {
        self.event.iter().any(|e| e.event_code == code)
    }
}

/// Réponse de l'ACS à un Inform.
///
/// `MaxEnvelopes` est toujours écrit à `1`, quelle que soit la valeur
/// stockée.
#[derive(Debug, Clone, PartialEq)]
pub struct InformResponse {
    pub max_envelopes: u32,
}

impl Default for InformResponse {
    fn default() -> Self {
        Self { max_envelopes: 1 }
    }
}

impl Fields for InformResponse {
    fn decode_field<R: BufRead>(
        &mut self,
        d: &mut XmlDecoder<R>,
        start: &BytesStart<'_>,
    ) -> Result<bool, DecodeError> {
        if local_name(start) != "MaxEnvelopes" {
            return Ok(false);
        }
        self.max_envelopes = d.read_value(start)?;
        Ok(true)
    }

    fn encode_fields<W: Write>(&self, e: &mut XmlEncoder<W>) -> Result<(), EncodeError> {
        e.value_element("MaxEnvelopes", 1)
    }
}
