use thiserror::Error;

/// Errors talking to a remote data source.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_status() {
        let err = ApiError::Status {
            url: "https://blockstream.info/api/address/x".into(),
            status: 400,
            body: "Invalid Bitcoin address".into(),
        };
        assert_eq!(
            err.to_string(),
            "https://blockstream.info/api/address/x returned HTTP 400: Invalid Bitcoin address"
        );
    }

    #[test]
    fn display_decode_names_url() {
        let source = serde_json::from_str::<u64>("nope").unwrap_err();
        let err = ApiError::Decode {
            url: "https://example.test/fee-estimates".into(),
            source,
        };
        assert!(err.to_string().starts_with("failed to decode response from https://example.test/fee-estimates"));
    }

    #[test]
    fn display_invalid_response() {
        let err = ApiError::InvalidResponse("no EUR rate".into());
        assert_eq!(err.to_string(), "unexpected response: no EUR rate");
    }
}
