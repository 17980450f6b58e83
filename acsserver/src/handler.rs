//! Endpoint CWMP
//!
//! Une requête POST porte un message du CPE ; la réponse porte le message
//! suivant de l'ACS, ou `204 No Content` quand l'ACS n'a plus rien à dire.

use crate::Server;
use acscwmp::{
    AutonomousTransferCompleteResponse, Body, Envelope, GetRPCMethodsResponse, Header,
    InformResponse, MessageKind, TransferCompleteResponse,
};
use acssoap::{FaultDetail, SoapBody};
use acsxml::DecodeError;
use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Méthodes annoncées en réponse à GetRPCMethods
pub const ACS_METHODS: [MessageKind; 4] = [
    MessageKind::Inform,
    MessageKind::GetRPCMethods,
    MessageKind::TransferComplete,
    MessageKind::AutonomousTransferComplete,
];

/// État partagé de l'endpoint
#[derive(Clone)]
pub struct AcsState {
    prefixes: Arc<BTreeMap<String, String>>,
}

impl AcsState {
    /// `prefixes` : `uri -> préfixe` utilisés en sortie
    pub fn new(prefixes: BTreeMap<String, String>) -> Self {
        Self {
            prefixes: Arc::new(prefixes),
        }
    }
}

/// Router CWMP monté sur `/`
pub fn cwmp_router(state: AcsState, max_body_size: usize) -> Router {
    Router::new()
        .route("/", post(cwmp_handler))
        .layer(DefaultBodyLimit::max(max_body_size))
        .with_state(state)
}

/// Handler `POST /`
pub async fn cwmp_handler(State(state): State<AcsState>, payload: Bytes) -> Response {
    let env = match acscwmp::decode_payload(&payload) {
        Ok(Some(env)) => env,
        Ok(None) => {
            debug!("Empty request, closing session");
            return StatusCode::NO_CONTENT.into_response();
        }
        Err(err) => {
            warn!(error = %err, "Cannot decode CWMP request");
            return (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response();
        }
    };

    let id = env.header.as_ref().and_then(|h| h.id.clone());
    let (status, reply) = match env.into_content() {
        Ok(body) => match respond(body) {
            Some(reply) => (StatusCode::OK, reply),
            None => return StatusCode::NO_CONTENT.into_response(),
        },
        Err(DecodeError::UnrecognizedMessage(name)) => {
            warn!(method = %name, "Unsupported CWMP method");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Body::method_not_supported(&name),
            )
        }
        Err(err) => {
            warn!(error = %err, "Invalid CWMP request");
            return (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response();
        }
    };

    debug!(method = reply.name(), id = ?id, "Sending CWMP response");
    let response = Envelope {
        header: id.map(Header::with_id),
        body: SoapBody::Content(reply),
    };

    match acscwmp::encode(Vec::new(), &response, state.prefixes.iter()) {
        Ok(xml) => (
            status,
            [(header::CONTENT_TYPE, "text/xml"), (SOAP_ACTION, "")],
            xml,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "Cannot encode CWMP response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

const SOAP_ACTION: header::HeaderName = header::HeaderName::from_static("soapaction");

/// Réponse de l'ACS à un message du CPE ; `None` : rien à répondre
fn respond(body: Body) -> Option<Body> {
    match body {
        Body::Inform(inform) => {
            info!(
                manufacturer = %inform.device_id.manufacturer,
                serial_number = %inform.device_id.serial_number,
                events = ?inform.event.iter().map(|e| e.event_code.as_str()).collect::<Vec<_>>(),
                "Inform received"
            );
            Some(Body::InformResponse(InformResponse::default()))
        }
        Body::TransferComplete(transfer) => {
            info!(
                command_key = %transfer.command_key,
                fault_code = transfer.fault_struct.fault_code,
                "TransferComplete received"
            );
            Some(Body::TransferCompleteResponse(TransferCompleteResponse {}))
        }
        Body::AutonomousTransferComplete(transfer) => {
            info!(
                transfer_url = %transfer.transfer_url,
                fault_code = transfer.fault_struct.fault_code,
                "AutonomousTransferComplete received"
            );
            Some(Body::AutonomousTransferCompleteResponse(
                AutonomousTransferCompleteResponse {},
            ))
        }
        Body::GetRPCMethods(_) => Some(Body::GetRPCMethodsResponse(GetRPCMethodsResponse {
            method_list: ACS_METHODS
                .iter()
                .map(|kind| kind.local_name().to_string())
                .collect(),
        })),
        Body::Fault(fault) => {
            match &fault.detail {
                Some(FaultDetail::Typed(detail)) => info!(
                    faultcode = %fault.code,
                    cwmp_code = detail.code,
                    cwmp_string = %detail.string,
                    "CPE fault"
                ),
                _ => info!(faultcode = %fault.code, faultstring = %fault.string, "CPE fault"),
            }
            None
        }
        other => {
            debug!(method = other.name(), "No reply for CWMP message");
            None
        }
    }
}

/// Extension du [`Server`] pour l'endpoint CWMP
pub trait CwmpServerExt {
    /// Monte l'endpoint CWMP sur `/`
    async fn init_cwmp(&mut self, state: AcsState, max_body_size: usize);
}

impl CwmpServerExt for Server {
    async fn init_cwmp(&mut self, state: AcsState, max_body_size: usize) {
        self.add_router("/", cwmp_router(state, max_body_size)).await;
    }
}
