use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::ApiError;

const USER_AGENT: &str = concat!("bitcoin-lab/", env!("CARGO_PKG_VERSION"));

/// Longest error body kept in [`ApiError::Status`].
const MAX_ERROR_BODY: usize = 200;

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, ApiError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(ApiError::Client)
}

/// Strip trailing slashes so paths can be appended with `/`.
pub(crate) fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// GET `url` and decode the JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T, ApiError> {
    tracing::debug!(%url, "GET");

    let response = client.get(url).send().await.map_err(|source| ApiError::Http {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|source| ApiError::Http {
        url: url.to_string(),
        source,
    })?;

    if !status.is_success() {
        tracing::warn!(%url, status = status.as_u16(), "request rejected");
        return Err(ApiError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body: truncate(body.trim(), MAX_ERROR_BODY),
        });
    }

    serde_json::from_str(&body).map_err(|source| ApiError::Decode {
        url: url.to_string(),
        source,
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
