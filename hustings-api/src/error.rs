use anyhow::{anyhow, Context};
use serde_json::json;

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Unknown(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Content cannot be empty")]
    EmptyContent,

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl Error {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::PermissionDenied => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::EmptyContent => StatusCode::BAD_REQUEST,
            Error::NullByteInString(_) => StatusCode::BAD_REQUEST,
            Error::Network(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        let message = self.to_string();
        serde_json::to_vec(&match self {
            Error::Unknown(_) => json!({
                "error": message,
                "type": "unknown",
            }),
            Error::PermissionDenied => json!({
                "error": message,
                "type": "permission-denied",
            }),
            Error::NotFound(what) => json!({
                "error": message,
                "type": "not-found",
                "what": what,
            }),
            Error::EmptyContent => json!({
                "error": message,
                "type": "empty-content",
            }),
            Error::NullByteInString(s) => json!({
                "error": message,
                "type": "null-byte",
                "string": s,
            }),
            Error::Network(cause) => json!({
                "error": message,
                "type": "network",
                "cause": cause,
            }),
        })
        .expect("serializing error contents")
    }

    /// Parses an error response body.
    ///
    /// Route handlers that only answer `{ "error": "..." }` parse to `Error::Unknown`.
    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        let message = data.get("error").and_then(|m| m.as_str());
        let field = |name: &str| {
            data.get(name)
                .and_then(|v| v.as_str())
                .map(String::from)
                .ok_or_else(|| anyhow!("error response is missing its {name:?} field"))
        };
        Ok(match data.get("type").and_then(|t| t.as_str()) {
            None | Some("unknown") => Error::Unknown(String::from(
                message.ok_or_else(|| anyhow!("error response has no message"))?,
            )),
            Some("permission-denied") => Error::PermissionDenied,
            Some("not-found") => Error::NotFound(field("what")?),
            Some("empty-content") => Error::EmptyContent,
            Some("null-byte") => Error::NullByteInString(field("string")?),
            Some("network") => Error::Network(field("cause")?),
            Some(t) => return Err(anyhow!("error contents has unknown type {t:?}")),
        })
    }
}
