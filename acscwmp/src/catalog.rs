//! Catalogue des messages CWMP
//!
//! [`MessageKind`] énumère les éléments de corps connus et [`Body`] porte
//! la valeur décodée correspondante. Ajouter une méthode CWMP revient à
//! ajouter une variante aux deux enums : chaque `match` est exhaustif.

use crate::fault::CwmpFault;
use crate::fault_codes;
use crate::inform::{Inform, InformResponse};
use crate::rpc::*;
use crate::transfer::*;
use crate::values::{decode_struct, encode_message};
use acssoap::SoapFault;
use acsxml::{BytesStart, DecodeError, EncodeError, XmlDecoder, XmlElement, XmlEncoder, local_name};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::io::{BufRead, Write};

/// Nom local → type de message, construit une seule fois
static CATALOG: Lazy<HashMap<&'static str, MessageKind>> = Lazy::new(|| {
    MessageKind::ALL
        .iter()
        .map(|kind| (kind.local_name(), *kind))
        .collect()
});

/// Type d'un message de corps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Fault,
    Inform,
    InformResponse,
    GetRPCMethods,
    GetRPCMethodsResponse,
    Reboot,
    RebootResponse,
    TransferComplete,
    TransferCompleteResponse,
    AutonomousTransferComplete,
    AutonomousTransferCompleteResponse,
    Download,
    DownloadResponse,
    GetParameterNames,
    GetParameterNamesResponse,
    GetParameterValues,
    GetParameterValuesResponse,
    SetParameterValues,
    SetParameterValuesResponse,
}

impl MessageKind {
    pub const ALL: [MessageKind; 19] = [
        MessageKind::Fault,
        MessageKind::Inform,
        MessageKind::InformResponse,
        MessageKind::GetRPCMethods,
        MessageKind::GetRPCMethodsResponse,
        MessageKind::Reboot,
        MessageKind::RebootResponse,
        MessageKind::TransferComplete,
        MessageKind::TransferCompleteResponse,
        MessageKind::AutonomousTransferComplete,
        MessageKind::AutonomousTransferCompleteResponse,
        MessageKind::Download,
        MessageKind::DownloadResponse,
        MessageKind::GetParameterNames,
        MessageKind::GetParameterNamesResponse,
        MessageKind::GetParameterValues,
        MessageKind::GetParameterValuesResponse,
        MessageKind::SetParameterValues,
        MessageKind::SetParameterValuesResponse,
    ];

    /// Résout un nom local ; `None` si le message est inconnu
    pub fn from_local_name(name: &str) -> Option<Self> {
        CATALOG.get(name).copied()
    }

    pub fn local_name(self) -> &'static str {
        match self {
            MessageKind::Fault => "Fault",
            MessageKind::Inform => "Inform",
            MessageKind::InformResponse => "InformResponse",
            MessageKind::GetRPCMethods => "GetRPCMethods",
            MessageKind::GetRPCMethodsResponse => "GetRPCMethodsResponse",
            MessageKind::Reboot => "Reboot",
            MessageKind::RebootResponse => "RebootResponse",
            MessageKind::TransferComplete => "TransferComplete",
            MessageKind::TransferCompleteResponse => "TransferCompleteResponse",
            MessageKind::AutonomousTransferComplete => "AutonomousTransferComplete",
            MessageKind::AutonomousTransferCompleteResponse => {
                "AutonomousTransferCompleteResponse"
            }
            MessageKind::Download => "Download",
            MessageKind::DownloadResponse => "DownloadResponse",
            MessageKind::GetParameterNames => "GetParameterNames",
            MessageKind::GetParameterNamesResponse => "GetParameterNamesResponse",
            MessageKind::GetParameterValues => "GetParameterValues",
            MessageKind::GetParameterValuesResponse => "GetParameterValuesResponse",
            MessageKind::SetParameterValues => "SetParameterValues",
            MessageKind::SetParameterValuesResponse => "SetParameterValuesResponse",
        }
    }

    /// Décode le contenu de l'élément `start`, déjà identifié comme `self`
    pub fn decode<R: BufRead>(
        self,
        d: &mut XmlDecoder<R>,
        start: &BytesStart<'_>,
    ) -> Result<Body, DecodeError> {
        Ok(match self {
            MessageKind::Fault => match SoapFault::decode_element(d, start)? {
                Some(fault) => Body::Fault(fault),
                None => return Err(DecodeError::Protocol("expected Fault".to_string())),
            },
            MessageKind::Inform => Body::Inform(decode_struct(d)?),
            MessageKind::InformResponse => Body::InformResponse(decode_struct(d)?),
            MessageKind::GetRPCMethods => Body::GetRPCMethods(decode_struct(d)?),
            MessageKind::GetRPCMethodsResponse => Body::GetRPCMethodsResponse(decode_struct(d)?),
            MessageKind::Reboot => Body::Reboot(decode_struct(d)?),
            MessageKind::RebootResponse => Body::RebootResponse(decode_struct(d)?),
            MessageKind::TransferComplete => Body::TransferComplete(decode_struct(d)?),
            MessageKind::TransferCompleteResponse => {
                Body::TransferCompleteResponse(decode_struct(d)?)
            }
            MessageKind::AutonomousTransferComplete => {
                Body::AutonomousTransferComplete(decode_struct(d)?)
            }
            MessageKind::AutonomousTransferCompleteResponse => {
                Body::AutonomousTransferCompleteResponse(decode_struct(d)?)
            }
            MessageKind::Download => Body::Download(decode_struct(d)?),
            MessageKind::DownloadResponse => Body::DownloadResponse(decode_struct(d)?),
            MessageKind::GetParameterNames => Body::GetParameterNames(decode_struct(d)?),
            MessageKind::GetParameterNamesResponse => {
                Body::GetParameterNamesResponse(decode_struct(d)?)
            }
            MessageKind::GetParameterValues => Body::GetParameterValues(decode_struct(d)?),
            MessageKind::GetParameterValuesResponse => {
                Body::GetParameterValuesResponse(decode_struct(d)?)
            }
            MessageKind::SetParameterValues => Body::SetParameterValues(decode_struct(d)?),
            MessageKind::SetParameterValuesResponse => {
                Body::SetParameterValuesResponse(decode_struct(d)?)
            }
        })
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.local_name())
    }
}

/// Message porté par le corps d'une enveloppe CWMP
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Fault(SoapFault<CwmpFault>),
    Inform(Inform),
    InformResponse(InformResponse),
    GetRPCMethods(GetRPCMethods),
    GetRPCMethodsResponse(GetRPCMethodsResponse),
    Reboot(Reboot),
    RebootResponse(RebootResponse),
    TransferComplete(TransferComplete),
    TransferCompleteResponse(TransferCompleteResponse),
    AutonomousTransferComplete(AutonomousTransferComplete),
    AutonomousTransferCompleteResponse(AutonomousTransferCompleteResponse),
    Download(Download),
    DownloadResponse(DownloadResponse),
    GetParameterNames(GetParameterNames),
    GetParameterNamesResponse(GetParameterNamesResponse),
    GetParameterValues(GetParameterValues),
    GetParameterValuesResponse(GetParameterValuesResponse),
    SetParameterValues(SetParameterValues),
    SetParameterValuesResponse(SetParameterValuesResponse),
}

impl Body {
    pub fn kind(&self) -> MessageKind {
        match self {
            Body::Fault(_) => MessageKind::Fault,
            Body::Inform(_) => MessageKind::Inform,
            Body::InformResponse(_) => MessageKind::InformResponse,
            Body::GetRPCMethods(_) => MessageKind::GetRPCMethods,
            Body::GetRPCMethodsResponse(_) => MessageKind::GetRPCMethodsResponse,
            Body::Reboot(_) => MessageKind::Reboot,
            Body::RebootResponse(_) => MessageKind::RebootResponse,
            Body::TransferComplete(_) => MessageKind::TransferComplete,
            Body::TransferCompleteResponse(_) => MessageKind::TransferCompleteResponse,
            Body::AutonomousTransferComplete(_) => MessageKind::AutonomousTransferComplete,
            Body::AutonomousTransferCompleteResponse(_) => {
                MessageKind::AutonomousTransferCompleteResponse
            }
            Body::Download(_) => MessageKind::Download,
            Body::DownloadResponse(_) => MessageKind::DownloadResponse,
            Body::GetParameterNames(_) => MessageKind::GetParameterNames,
            Body::GetParameterNamesResponse(_) => MessageKind::GetParameterNamesResponse,
            Body::GetParameterValues(_) => MessageKind::GetParameterValues,
            Body::GetParameterValuesResponse(_) => MessageKind::GetParameterValuesResponse,
            Body::SetParameterValues(_) => MessageKind::SetParameterValues,
            Body::SetParameterValuesResponse(_) => MessageKind::SetParameterValuesResponse,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().local_name()
    }

    /// Fault SOAP dont le détail est un Fault CWMP.
    ///
    /// `faultcode` vaut `Client` quand la requête est en cause (8000, 8001,
    /// 8003, 8006), `Server` sinon.
    pub fn fault(code: u32, message: impl Into<String>) -> Body {
        let faultcode = match code {
            fault_codes::METHOD_NOT_SUPPORTED
            | fault_codes::REQUEST_DENIED
            | fault_codes::INVALID_ARGUMENTS
            | fault_codes::INCOMPATIBLE => acssoap::fault_codes::CLIENT,
            _ => acssoap::fault_codes::SERVER,
        };
        Body::Fault(SoapFault::with_detail(
            faultcode,
            "CWMP fault",
            CwmpFault::new(code, message),
        ))
    }

    /// Réponse à un message absent du catalogue
    pub fn method_not_supported(name: &str) -> Body {
        Body::fault(
            fault_codes::METHOD_NOT_SUPPORTED,
            format!("Method {} not supported", name),
        )
    }
}

impl XmlElement for Body {
    fn decode_element<R: BufRead>(
        d: &mut XmlDecoder<R>,
        start: &BytesStart<'_>,
    ) -> Result<Option<Self>, DecodeError> {
        match MessageKind::from_local_name(&local_name(start)) {
            Some(kind) => kind.decode(d, start).map(Some),
            None => Ok(None),
        }
    }

    fn encode_element<W: Write>(&self, e: &mut XmlEncoder<W>) -> Result<(), EncodeError> {
        let name = self.name();
        match self {
            Body::Fault(fault) => fault.encode_element(e),
            Body::Inform(m) => encode_message(e, name, m),
            Body::InformResponse(m) => encode_message(e, name, m),
            Body::GetRPCMethods(m) => encode_message(e, name, m),
            Body::GetRPCMethodsResponse(m) => encode_message(e, name, m),
            Body::Reboot(m) => encode_message(e, name, m),
            Body::RebootResponse(m) => encode_message(e, name, m),
            Body::TransferComplete(m) => encode_message(e, name, m),
            Body::TransferCompleteResponse(m) => encode_message(e, name, m),
            Body::AutonomousTransferComplete(m) => encode_message(e, name, m),
            Body::AutonomousTransferCompleteResponse(m) => encode_message(e, name, m),
            Body::Download(m) => encode_message(e, name, m),
            Body::DownloadResponse(m) => encode_message(e, name, m),
            Body::GetParameterNames(m) => encode_message(e, name, m),
            Body::GetParameterNamesResponse(m) => encode_message(e, name, m),
            Body::GetParameterValues(m) => encode_message(e, name, m),
            Body::GetParameterValuesResponse(m) => encode_message(e, name, m),
            Body::SetParameterValues(m) => encode_message(e, name, m),
            Body::SetParameterValuesResponse(m) => encode_message(e, name, m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_covers_every_kind() {
        for kind in MessageKind::ALL {
            assert_eq!(MessageKind::from_local_name(kind.local_name()), Some(kind));
        }
        assert_eq!(MessageKind::from_local_name("FooBar"), None);
        // Noms sensibles à la casse
        assert_eq!(MessageKind::from_local_name("inform"), None);
    }

    #[test]
    fn test_fault_code_class() {
        let Body::Fault(client) = Body::method_not_supported("FooBar") else {
            panic!("expected a fault");
        };
        assert_eq!(client.code, "Client");
        assert_eq!(client.string, "CWMP fault");
        let detail = client.typed_detail().unwrap();
        assert_eq!(detail.code, 8000);
        assert_eq!(detail.string, "Method FooBar not supported");

        let Body::Fault(server) = Body::fault(fault_codes::INTERNAL_ERROR, "oops") else {
            panic!("expected a fault");
        };
        assert_eq!(server.code, "Server");
    }
}
