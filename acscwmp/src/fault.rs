//! Détail CWMP d'un SOAP Fault

use crate::XMLNS_CWMP;
use crate::values::{Value, cwmp_struct};
use acsxml::{
    BytesStart, DecodeError, EncodeError, XmlDecoder, XmlElement, XmlEncoder, local_name,
    qualified,
};
use std::io::{BufRead, Write};

cwmp_struct! {
    /// Échec d'un paramètre dans un SetParameterValues
    pub struct SetParameterValuesFault {
        pub parameter_name: String => "ParameterName",
        pub fault_code: u32 => "FaultCode",
        pub fault_string: String => "FaultString",
    }
}

/// Contenu de `<detail>` : `<cwmp:Fault>`.
///
/// `set_parameter_values_faults` n'est rempli que pour un échec de
/// SetParameterValues, dans l'ordre du message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CwmpFault {
    pub code: u32,
    pub string: String,
    pub set_parameter_values_faults: Vec<SetParameterValuesFault>,
}

impl CwmpFault {
    pub fn new(code: u32, string: impl Into<String>) -> Self {
        Self {
            code,
            string: string.into(),
            set_parameter_values_faults: Vec::new(),
        }
    }
}

impl XmlElement for CwmpFault {
    fn decode_element<R: BufRead>(
        d: &mut XmlDecoder<R>,
        start: &BytesStart<'_>,
    ) -> Result<Option<Self>, DecodeError> {
        if local_name(start) != "Fault" {
            return Ok(None);
        }

        let mut fault = CwmpFault::default();
        while let Some(child) = d.next_child()? {
            match local_name(&child).as_str() {
                "FaultCode" => fault.code = d.read_value(&child)?,
                "FaultString" => fault.string = d.read_text()?,
                "SetParameterValuesFault" => fault
                    .set_parameter_values_faults
                    .push(SetParameterValuesFault::decode_value(d, &child)?),
                _ => d.skip()?,
            }
        }
        Ok(Some(fault))
    }

    fn encode_element<W: Write>(&self, e: &mut XmlEncoder<W>) -> Result<(), EncodeError> {
        e.start(qualified("Fault", XMLNS_CWMP))?;
        e.value_element("FaultCode", self.code)?;
        e.text_element("FaultString", &self.string)?;
        for fault in &self.set_parameter_values_faults {
            fault.encode_value(e, "SetParameterValuesFault")?;
        }
        e.end("Fault")
    }
}
