use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::fmt::{self, Debug};
use tracing::debug;

use crate::{
    error::{ApiResult, RequestFailed},
    model::{
        PredictRequest, PredictResponse, RegionEntry, RegionsRequest, ServiceErrorBody,
        SuitabilityRequest, SuitabilityResponse, WeatherQuery, WeatherResponse,
    },
};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Predict,
    Suitability,
    Regions,
    Weather,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Predict => "/predict",
            Endpoint::Suitability => "/suitability",
            Endpoint::Regions => "/regions",
            Endpoint::Weather => "/weather",
        }
    }

    #[cfg(test)]
    const fn all() -> &'static [Endpoint] {
        &[Endpoint::Predict, Endpoint::Suitability, Endpoint::Regions, Endpoint::Weather]
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// The prediction service, one method per endpoint.
#[async_trait]
pub trait PredictionApi: Send + Sync + Debug {
    async fn predict(&self, request: &PredictRequest) -> ApiResult<PredictResponse>;

    async fn suitability(&self, request: &SuitabilityRequest) -> ApiResult<SuitabilityResponse>;

    async fn regions(&self, request: &RegionsRequest) -> ApiResult<Vec<RegionEntry>>;

    async fn weather(&self, query: &WeatherQuery) -> ApiResult<WeatherResponse>;
}

#[derive(Debug, Clone)]
pub struct HttpPredictionApi {
    base_url: String,
    http: Client,
}

impl HttpPredictionApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    async fn post_json<B, T>(&self, endpoint: Endpoint, body: &B) -> ApiResult<T>
    where
        B: serde::Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url_for(endpoint);
        debug!(%url, "POST");

        let res = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {url}"))
            .map_err(|e| RequestFailed::new(endpoint, e))?;

        read_json(endpoint, res).await
    }

    async fn get_json<T>(&self, endpoint: Endpoint, query: &[(&str, String)]) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let url = self.url_for(endpoint);
        debug!(%url, ?query, "GET");

        let res = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {url}"))
            .map_err(|e| RequestFailed::new(endpoint, e))?;

        read_json(endpoint, res).await
    }
}

async fn read_json<T: DeserializeOwned>(
    endpoint: Endpoint,
    res: reqwest::Response,
) -> ApiResult<T> {
    let status = res.status();
    let body = res
        .text()
        .await
        .with_context(|| format!("Failed to read {endpoint} response body"))
        .map_err(|e| RequestFailed::new(endpoint, e))?;

    if !status.is_success() {
        return Err(RequestFailed::new(
            endpoint,
            anyhow!("{endpoint} failed with status {status}: {}", describe_error_body(&body)),
        ));
    }

    serde_json::from_str(&body)
        .with_context(|| format!("Failed to parse {endpoint} JSON"))
        .map_err(|e| RequestFailed::new(endpoint, e))
}

/// Prefer the service's `{"error": ...}` text, else a truncated raw body.
fn describe_error_body(body: &str) -> String {
    match serde_json::from_str::<ServiceErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => truncate_body(body),
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[async_trait]
impl PredictionApi for HttpPredictionApi {
    async fn predict(&self, request: &PredictRequest) -> ApiResult<PredictResponse> {
        self.post_json(Endpoint::Predict, request).await
    }

    async fn suitability(&self, request: &SuitabilityRequest) -> ApiResult<SuitabilityResponse> {
        self.post_json(Endpoint::Suitability, request).await
    }

    async fn regions(&self, request: &RegionsRequest) -> ApiResult<Vec<RegionEntry>> {
        self.post_json(Endpoint::Regions, request).await
    }

    async fn weather(&self, query: &WeatherQuery) -> ApiResult<WeatherResponse> {
        self.get_json(Endpoint::Weather, &query.to_query_pairs()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
    };

    #[test]
    fn urls_join_base_and_path() {
        let api = HttpPredictionApi::new("http://localhost:5000/");
        assert_eq!(api.base_url(), "http://localhost:5000");

        for endpoint in Endpoint::all() {
            let url = api.url_for(*endpoint);
            assert_eq!(url, format!("http://localhost:5000{}", endpoint.path()));
        }
    }

    #[test]
    fn error_body_uses_service_message() {
        let msg = describe_error_body(r#"{"error": "No data available for crop: barley"}"#);
        assert_eq!(msg, "No data available for crop: barley");
    }

    #[test]
    fn error_body_falls_back_to_truncated_text() {
        let long = "x".repeat(500);
        let msg = describe_error_body(&long);
        assert_eq!(msg.len(), 203);
        assert!(msg.ends_with("..."));

        assert_eq!(describe_error_body("<html>oops</html>"), "<html>oops</html>");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let body = "é".repeat(150);
        let msg = truncate_body(&body);
        assert!(msg.ends_with("..."));
        assert!(msg.len() <= 203);
    }

    /// Accept one connection on an ephemeral port, read the request and
    /// answer with `status` and `body`. Returns the base URL to call.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{addr}")
    }

    // Bypasses any proxy configured in the test environment.
    fn local_api(base: String) -> HttpPredictionApi {
        let http = Client::builder().no_proxy().build().unwrap();
        HttpPredictionApi::with_client(base, http)
    }

    // Headers, then as many body bytes as Content-Length announces.
    async fn read_request(socket: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);

            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let content_length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);

            if buf.len() >= end + 4 + content_length {
                return;
            }
        }
    }

    #[tokio::test]
    async fn error_status_carries_service_message() {
        let base = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;
        let api = local_api(base);

        let err = api.weather(&WeatherQuery::City("Pune".into())).await.unwrap_err();

        assert_eq!(err.endpoint, Endpoint::Weather);
        let detail = format!("{:#}", err.detail);
        assert!(detail.contains("500"), "{detail}");
        assert!(detail.contains("boom"), "{detail}");
    }

    #[tokio::test]
    async fn undecodable_success_body_is_request_failed() {
        let base = serve_once("200 OK", "not json").await;
        let api = local_api(base);

        let err = api.weather(&WeatherQuery::City("Pune".into())).await.unwrap_err();

        assert_eq!(err.endpoint, Endpoint::Weather);
        assert!(format!("{:#}", err.detail).contains("Failed to parse /weather JSON"));
    }

    #[tokio::test]
    async fn success_body_is_decoded() {
        let base = serve_once("200 OK", r#"{"predicted_yield": 3150.25}"#).await;
        let api = local_api(base);
        let request =
            PredictRequest { rainfall: 450.0, temperature: 21.5, soil_ph: 6.5, fertilizer: 120.0 };

        let res = api.predict(&request).await.expect("decodable response");

        assert_eq!(res, PredictResponse { predicted_yield: 3150.25 });
    }

    #[tokio::test]
    async fn unreachable_service_is_request_failed() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let api = local_api(format!("http://127.0.0.1:{port}"));

        let err = api
            .weather(&WeatherQuery::City("Nowhere".into()))
            .await
            .unwrap_err();

        assert_eq!(err.endpoint, Endpoint::Weather);
        assert_eq!(err.to_string(), "request to /weather failed");
    }
}
