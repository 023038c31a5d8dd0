use std::collections::HashMap;
use std::time::Duration;

use crate::error::ApiError;
use crate::http::{build_client, get_json, normalize_base_url};
use crate::types::{
    AddressBalance, AddressStatsResponse, AddressUtxo, EsploraTx, EsploraUtxo, FeeEstimates,
    TxSummary,
};

/// Client for an Esplora REST server.
#[derive(Debug, Clone)]
pub struct EsploraClient {
    http: reqwest::Client,
    base_url: String,
}

impl EsploraClient {
    /// Create a client for `base_url`, e.g. `https://blockstream.info/api`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            http: build_client(timeout)?,
            base_url: normalize_base_url(base_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL for an address-scoped endpoint; `suffix` is appended verbatim.
    pub fn address_url(&self, address: &str, suffix: &str) -> Result<String, ApiError> {
        let address = address.trim();
        if address.is_empty() || !address.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ApiError::InvalidRequest(format!(
                "'{address}' is not a well-formed address"
            )));
        }
        Ok(format!("{}/address/{address}{suffix}", self.base_url))
    }

    /// `GET /address/:address`
    pub async fn address_balance(&self, address: &str) -> Result<AddressBalance, ApiError> {
        let url = self.address_url(address, "")?;
        let stats: AddressStatsResponse = get_json(&self.http, &url).await?;
        let balance = AddressBalance::from_stats(stats);
        tracing::debug!(
            address = %balance.address,
            confirmed_sat = balance.confirmed_sat,
            pending_sat = balance.pending_sat,
            "fetched balance"
        );
        Ok(balance)
    }

    /// `GET /address/:address/txs`
    ///
    /// Esplora returns unconfirmed transactions first, then up to 25
    /// confirmed ones, newest first.
    pub async fn address_history(&self, address: &str) -> Result<Vec<TxSummary>, ApiError> {
        let url = self.address_url(address, "/txs")?;
        let txs: Vec<EsploraTx> = get_json(&self.http, &url).await?;
        let address = address.trim();
        let history: Vec<TxSummary> = txs
            .into_iter()
            .map(|tx| TxSummary::from_esplora(tx, address))
            .collect();
        tracing::debug!(%address, count = history.len(), "fetched history");
        Ok(history)
    }

    /// `GET /address/:address/utxo`, confirmed and unconfirmed.
    pub async fn address_utxos(&self, address: &str) -> Result<Vec<AddressUtxo>, ApiError> {
        let url = self.address_url(address, "/utxo")?;
        let utxos: Vec<EsploraUtxo> = get_json(&self.http, &url).await?;
        tracing::debug!(address = %address.trim(), count = utxos.len(), "fetched utxos");
        Ok(utxos.into_iter().map(AddressUtxo::from).collect())
    }

    /// `GET /fee-estimates`
    pub async fn fee_estimates(&self) -> Result<FeeEstimates, ApiError> {
        let url = format!("{}/fee-estimates", self.base_url);
        let raw: HashMap<String, f64> = get_json(&self.http, &url).await?;
        let estimates = FeeEstimates::from_raw(raw);
        if estimates.is_empty() {
            return Err(ApiError::InvalidResponse(format!(
                "{url} returned no usable fee estimates"
            )));
        }
        Ok(estimates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn client(base: &str) -> EsploraClient {
        EsploraClient::new(base, Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn base_url_is_normalized() {
        assert_eq!(
            client("https://blockstream.info/api/").base_url(),
            "https://blockstream.info/api"
        );
    }

    #[test]
    fn address_urls() {
        let c = client("https://mempool.space/signet/api");
        assert_eq!(
            c.address_url(" tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx ", "/utxo").unwrap(),
            "https://mempool.space/signet/api/address/tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx/utxo"
        );
    }

    #[test]
    fn address_url_rejects_path_injection() {
        let c = client("https://blockstream.info/api");
        assert!(c.address_url("../blocks/tip", "").is_err());
        assert!(c.address_url("", "/txs").is_err());
    }

    const ADDRESS: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";

    /// Answer one request on a local port with a canned response. The task
    /// yields the request line it received.
    async fn serve_once(status_line: &'static str, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;

            String::from_utf8_lossy(&request)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string()
        });

        (format!("http://{addr}/api"), handle)
    }

    #[tokio::test]
    async fn balance_from_served_stats() {
        let body = format!(
            r#"{{"address":"{ADDRESS}",
                "chain_stats":{{"funded_txo_count":2,"funded_txo_sum":300000,"spent_txo_count":1,"spent_txo_sum":100000,"tx_count":3}},
                "mempool_stats":{{"funded_txo_count":0,"funded_txo_sum":0,"spent_txo_count":1,"spent_txo_sum":20000,"tx_count":1}}}}"#
        );
        let (base, server) = serve_once("200 OK", body).await;

        let balance = client(&base).address_balance(ADDRESS).await.unwrap();
        assert_eq!(balance.address, ADDRESS);
        assert_eq!(balance.confirmed_sat, 200_000);
        assert_eq!(balance.pending_sat, -20_000);
        assert_eq!(balance.tx_count, 4);

        let request_line = server.await.unwrap();
        assert_eq!(request_line, format!("GET /api/address/{ADDRESS} HTTP/1.1"));
    }

    #[tokio::test]
    async fn rejected_request_is_status_error() {
        let (base, server) = serve_once("400 Bad Request", "Invalid Bitcoin address".into()).await;

        match client(&base).address_balance(ADDRESS).await {
            Err(ApiError::Status { url, status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body, "Invalid Bitcoin address");
                assert_eq!(url, format!("{base}/address/{ADDRESS}"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn long_error_body_is_truncated() {
        let (base, server) = serve_once("503 Service Unavailable", "x".repeat(500)).await;

        match client(&base).fee_estimates().await {
            Err(ApiError::Status { status, body, .. }) => {
                assert_eq!(status, 503);
                assert_eq!(body, format!("{}...", "x".repeat(200)));
            }
            other => panic!("expected status error, got {other:?}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn malformed_json_is_decode_error() {
        let (base, server) = serve_once("200 OK", "<html>maintenance</html>".into()).await;

        match client(&base).fee_estimates().await {
            Err(ApiError::Decode { url, .. }) => assert_eq!(url, format!("{base}/fee-estimates")),
            other => panic!("expected decode error, got {other:?}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_server_is_http_error() {
        // Nothing listens on the discard port in test environments.
        let c = client("http://127.0.0.1:9");
        let err = c.fee_estimates().await.unwrap_err();
        assert!(matches!(err, ApiError::Http { .. }), "got {err:?}");
    }
}
