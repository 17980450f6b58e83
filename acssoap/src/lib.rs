//! # acssoap - Enveloppe et Fault SOAP 1.1
//!
//! Ce crate implémente la couche SOAP utilisée par CWMP : l'enveloppe qui
//! transporte un en-tête optionnel et une unique charge utile, et le Fault
//! SOAP avec son détail polymorphe.
//!
//! ## Architecture
//!
//! - [`SoapEnvelope`] : enveloppe générique sur l'en-tête `H` et le corps `B`
//! - [`SoapHeader`] : contrat d'un en-tête décodé entrée par entrée
//! - [`SoapBody`] : contenu du `Body` (vide, reconnu, ou inconnu)
//! - [`SoapFault`] : Fault SOAP, détail typé `D` ou capturé tel quel
//!
//! Le choix du type de corps revient à l'appelant : `B` implémente
//! [`acsxml::XmlElement`] et refuse les noms qu'il ne connaît pas.
//!
//! ## Example
//!
//! ```
//! use acssoap::{SoapEnvelope, SoapFault};
//! use acsxml::{Skip, XmlDecoder};
//!
//! let xml = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
//!   <soapenv:Body>
//!     <soapenv:Fault>
//!       <faultcode>Client</faultcode>
//!       <faultstring>CWMP fault</faultstring>
//!     </soapenv:Fault>
//!   </soapenv:Body>
//! </soapenv:Envelope>"#;
//!
//! let mut d = XmlDecoder::new(xml.as_bytes());
//! let env = SoapEnvelope::<(), SoapFault<Skip>>::decode(&mut d).unwrap();
//! let fault = env.into_content().unwrap();
//! assert_eq!(fault.code, "Client");
//! ```

mod envelope;
mod fault;

pub use envelope::{SoapBody, SoapEnvelope, SoapHeader};
pub use fault::{FaultDetail, SoapFault};

/// Namespace de l'enveloppe SOAP 1.1
pub const XMLNS_ENVELOPE: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Namespace de l'encodage SOAP 1.1
pub const XMLNS_ENCODING: &str = "http://schemas.xmlsoap.org/soap/encoding/";

/// Codes `faultcode` SOAP 1.1
pub mod fault_codes {
    /// Le message est en cause
    pub const CLIENT: &str = "Client";

    /// Le traitement a échoué côté récepteur
    pub const SERVER: &str = "Server";

    /// Namespace d'enveloppe inattendu
    pub const VERSION_MISMATCH: &str = "VersionMismatch";

    /// Entrée d'en-tête `mustUnderstand` non comprise
    pub const MUST_UNDERSTAND: &str = "MustUnderstand";
}
