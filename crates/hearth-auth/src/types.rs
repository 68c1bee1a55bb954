use thiserror::Error;

/// Rejection kinds for one inbound request.
///
/// Returned as values, never raised across the boundary. Mapping each kind
/// to an HTTP status is a transport concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("Missing or malformed signature")]
    IllegalSignature,

    #[error("Missing or malformed timestamp")]
    IllegalTimestamp,

    #[error("Missing or malformed bridge id")]
    IllegalBridgeId,

    #[error("Missing or malformed nonce")]
    IllegalNonce,

    #[error("Unknown bridge id")]
    UnauthorizedBridge,

    #[error("Timestamp outside the freshness window")]
    StaleAuth,

    #[error("Timestamp/nonce pair already consumed")]
    AlreadyConsumed,

    #[error("Signature mismatch")]
    InvalidAuthorization,
}

impl AuthFailure {
    /// Short code string for structured logs and rejection payloads.
    pub fn code(&self) -> &'static str {
        match self {
            AuthFailure::IllegalSignature => "ILLEGAL_SIGNATURE",
            AuthFailure::IllegalTimestamp => "ILLEGAL_TIMESTAMP",
            AuthFailure::IllegalBridgeId => "ILLEGAL_BRIDGE_ID",
            AuthFailure::IllegalNonce => "ILLEGAL_NONCE",
            AuthFailure::UnauthorizedBridge => "UNAUTHORIZED_BRIDGE",
            AuthFailure::StaleAuth => "STALE_AUTH",
            AuthFailure::AlreadyConsumed => "ALREADY_CONSUMED",
            AuthFailure::InvalidAuthorization => "INVALID_AUTHORIZATION",
        }
    }
}

pub type AuthResult = Result<(), AuthFailure>;

/// Raw request fields as extracted by the transport layer.
///
/// Illustrative header names: `X-Signature`, `X-Timestamp` (epoch ms),
/// `X-Bridge-Id`, `X-Nonce`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngressRequest<'a> {
    pub signature: Option<&'a str>,
    pub timestamp: Option<&'a str>,
    pub bridge_id: Option<&'a str>,
    pub nonce: Option<&'a str>,
    /// Raw request body; treated as empty when absent.
    pub body: Option<&'a str>,
}

/// `{bridge id, pre-shared key}`, resolved externally per request.
#[derive(Debug, Clone)]
pub struct BridgeCredential {
    pub bridge_id: String,
    pub psk: String,
}

/// External bridge-credential lookup collaborator.
pub trait CredentialStore: Send + Sync {
    fn find_bridge_credential(&self, bridge_id: &str) -> Option<BridgeCredential>;
}
