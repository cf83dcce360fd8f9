use crate::{FullId, Kind};

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Kind not recognized: {0:?}")]
    UnknownKind(String),

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Malformed payload for kind {kind:?}: {message}")]
    MalformedPayload { kind: String, message: String },

    #[error("Expected a {expected} but got a {got}")]
    UnexpectedKind { expected: Kind, got: Kind },

    #[error("Target {0} is not part of the comment tree")]
    NoSuchTarget(FullId),

    #[error("Server responded with status {status}: {message}")]
    Api { status: u16, message: String },
}

impl Error {
    pub fn malformed_payload(kind: &str, err: impl std::fmt::Display) -> Error {
        Error::MalformedPayload {
            kind: kind.to_string(),
            message: err.to_string(),
        }
    }

    /// Status code to report, for errors that came from the server
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Rate limiting and server-side failures are worth retrying on the next poll
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Api { status, .. } if *status == 429 || *status >= 500)
    }

    /// Builds the error matching a non-successful response body.
    ///
    /// The platform answers either `{"message": .., "error": ..}` or
    /// `{"json": {"errors": [[code, message, field], ..]}}`; anything else is
    /// reported verbatim.
    pub fn parse(status: u16, body: &[u8]) -> Error {
        let message = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|data| {
                if let Some(msg) = data.get("message").and_then(|m| m.as_str()) {
                    return Some(msg.to_string());
                }
                let errors = data
                    .get("json")
                    .and_then(|j| j.get("errors"))
                    .and_then(|e| e.as_array())?;
                let msgs = errors
                    .iter()
                    .filter_map(|e| e.as_array())
                    .map(|e| {
                        e.iter()
                            .filter_map(|part| part.as_str())
                            .collect::<Vec<_>>()
                            .join(": ")
                    })
                    .collect::<Vec<_>>();
                (!msgs.is_empty()).then(|| msgs.join(", "))
            })
            .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());
        Error::Api { status, message }
    }
}
