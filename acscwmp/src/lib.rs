//! # acscwmp - Messages CWMP (TR-069)
//!
//! Ce crate décrit les messages échangés entre un ACS et un CPE et les
//! relie à l'enveloppe SOAP :
//!
//! - [`MessageKind`] / [`Body`] : catalogue fermé des messages de corps
//! - [`Header`] : entrées d'en-tête CWMP (ID, HoldRequests...)
//! - [`CwmpFault`] : détail CWMP d'un SOAP Fault
//! - [`decode`] / [`encode`] : enveloppe complète, préfixée en sortie
//!
//! ## Example
//!
//! ```
//! use acscwmp::{Body, Envelope, Header, InformResponse};
//!
//! let env = Envelope::with_header(
//!     Header::with_id("1234"),
//!     Body::InformResponse(InformResponse::default()),
//! );
//! let out = acscwmp::encode(Vec::new(), &env, acscwmp::default_prefixes()).unwrap();
//! let xml = String::from_utf8(out).unwrap();
//! assert!(xml.starts_with("<soapenv:Envelope"));
//! assert!(xml.contains("<cwmp:InformResponse><MaxEnvelopes>1</MaxEnvelopes></cwmp:InformResponse>"));
//! ```

mod catalog;
mod fault;
mod header;
mod inform;
mod rpc;
mod transfer;
mod values;

pub use catalog::{Body, MessageKind};
pub use fault::{CwmpFault, SetParameterValuesFault};
pub use header::{CwmpVersions, Header};
pub use inform::{DeviceIdStruct, EventStruct, Inform, InformResponse};
pub use rpc::{
    GetParameterNames, GetParameterNamesResponse, GetParameterValues, GetParameterValuesResponse,
    GetRPCMethods, GetRPCMethodsResponse, ParameterInfoStruct, Reboot, RebootResponse,
    SetParameterValues, SetParameterValuesResponse,
};
pub use transfer::{
    AutonomousTransferComplete, AutonomousTransferCompleteResponse, Download, DownloadResponse,
    FaultStruct, TransferComplete, TransferCompleteResponse,
};
pub use values::{ParameterValueStruct, Time, UNKNOWN_TIME, format_time, parse_time};

use acssoap::{SoapEnvelope, XMLNS_ENVELOPE};
use acsxml::{DecodeError, EncodeError, Prefixer, XmlDecoder, XmlEncoder};
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

/// Namespace des messages CWMP
pub const XMLNS_CWMP: &str = "urn:dslforum-org:cwmp-1-0";

/// Enveloppe CWMP
pub type Envelope = SoapEnvelope<Header, Body>;

/// Codes de fault CWMP
pub mod fault_codes {
    /// Méthode non supportée (ACS)
    pub const METHOD_NOT_SUPPORTED: u32 = 8000;
    pub const REQUEST_DENIED: u32 = 8001;
    pub const INTERNAL_ERROR: u32 = 8002;
    pub const INVALID_ARGUMENTS: u32 = 8003;
    pub const RESOURCES_EXCEEDED: u32 = 8004;
    pub const RETRY_REQUEST: u32 = 8005;
    /// Version CWMP incompatible
    pub const INCOMPATIBLE: u32 = 8006;

    // Codes remontés par le CPE
    pub const CPE_METHOD_NOT_SUPPORTED: u32 = 9000;
    pub const CPE_REQUEST_DENIED: u32 = 9001;
    pub const CPE_INTERNAL_ERROR: u32 = 9002;
    pub const CPE_INVALID_ARGUMENTS: u32 = 9003;
    pub const CPE_RESOURCES_EXCEEDED: u32 = 9004;
    pub const CPE_INVALID_PARAMETER_NAME: u32 = 9005;
    pub const CPE_INVALID_PARAMETER_TYPE: u32 = 9006;
    pub const CPE_INVALID_PARAMETER_VALUE: u32 = 9007;
    pub const CPE_PARAMETER_NOT_WRITABLE: u32 = 9008;
    pub const CPE_NOTIFICATION_REQUEST_REJECTED: u32 = 9009;
    pub const CPE_FILE_TRANSFER_FAILURE: u32 = 9010;
    pub const CPE_UPLOAD_FAILURE: u32 = 9011;
    pub const CPE_INVALID_UUID: u32 = 9022;
}

/// Préfixes standards : `soapenv` pour l'enveloppe, `cwmp` pour les
/// messages
pub fn default_prefixes() -> BTreeMap<String, String> {
    BTreeMap::from([
        (XMLNS_ENVELOPE.to_string(), "soapenv".to_string()),
        (XMLNS_CWMP.to_string(), "cwmp".to_string()),
    ])
}

/// Décode une enveloppe CWMP.
///
/// Un corps inconnu n'est pas une erreur : voir
/// [`acssoap::SoapBody::Unrecognized`] et [`Envelope::into_content`].
pub fn decode<R: BufRead>(reader: R) -> Result<Envelope, DecodeError> {
    Envelope::decode(&mut XmlDecoder::new(reader))
}

/// Décode le corps d'une requête HTTP ; `None` si elle est vide.
pub fn decode_payload(payload: &[u8]) -> Result<Option<Envelope>, DecodeError> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    decode(payload).map(Some)
}

/// Encode `env` vers `writer` en passant par un [`Prefixer`] construit
/// avec `prefixes` (`uri -> préfixe`).
pub fn encode<W, I, K, V>(writer: W, env: &Envelope, prefixes: I) -> Result<W, EncodeError>
where
    W: Write,
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut e = XmlEncoder::new(Prefixer::new(writer, prefixes));
    env.encode(&mut e)?;
    Ok(e.into_inner().finish()?)
}
