//! HTTP client for the LogCollector REST API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::types::{
    Addendum, AddendumCreate, AiAnalysis, CollectLogRequest, Incident, IncidentDetailsUpdate,
    IncidentQuery, IncidentRank, IncidentStatus, KbArticle, KbArticleWrite, KbDetailQuery,
    KbQuery, KbStatus, ListPayload, LogEntry, LogQuery, LogStatus, Page, RankQuery,
};

use super::endpoint::Endpoint;
use super::ConsoleApi;

/// Longest raw error body echoed back to the operator.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// reqwest-backed [`ConsoleApi`].
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client from configuration
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.normalized_base_url(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, endpoint: &Endpoint) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, endpoint.path);
        let builder = self.http_client.request(endpoint.method.clone(), url);
        if endpoint.params.is_empty() {
            builder
        } else {
            builder.query(&endpoint.params)
        }
    }

    /// Send and map transport failures and non-2xx statuses to errors.
    async fn execute(
        &self,
        endpoint: &Endpoint,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response> {
        tracing::debug!(method = %endpoint.method, path = %endpoint.path, "API request");

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = api_error(status, &body);
        tracing::warn!(
            method = %endpoint.method,
            path = %endpoint.path,
            status = status.as_u16(),
            error = %err,
            "API request failed"
        );
        Err(err)
    }

    async fn send_json<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<T> {
        let response = self.execute(&endpoint, self.request(&endpoint)).await?;
        decode(response).await
    }

    async fn send_body_json<B, T>(&self, endpoint: Endpoint, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .execute(&endpoint, self.request(&endpoint).json(body))
            .await?;
        decode(response).await
    }

    /// For endpoints whose response body is empty or irrelevant.
    async fn send_unit(&self, endpoint: Endpoint) -> Result<()> {
        self.execute(&endpoint, self.request(&endpoint)).await?;
        Ok(())
    }

    async fn send_body_unit<B: Serialize + Sync>(&self, endpoint: Endpoint, body: &B) -> Result<()> {
        self.execute(&endpoint, self.request(&endpoint).json(body))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ConsoleApi for ApiClient {
    async fn search_logs(&self, query: &LogQuery) -> Result<Page<LogEntry>> {
        let payload: ListPayload<LogEntry> = self.send_json(Endpoint::search_logs(query)).await?;
        Ok(payload.into_page())
    }

    async fn update_log_status(&self, log_id: i64, status: &LogStatus) -> Result<()> {
        self.send_unit(Endpoint::update_log_status(log_id, status))
            .await
    }

    async fn analyze(&self, log_hash: &str, force: bool) -> Result<AiAnalysis> {
        if log_hash.trim().is_empty() {
            return Err(Error::Validation(
                "log hash is missing; cannot analyze".to_string(),
            ));
        }
        self.send_json(Endpoint::analyze(log_hash, force)).await
    }

    async fn collect_log(&self, request: &CollectLogRequest) -> Result<()> {
        self.send_body_unit(Endpoint::collect_log(), request).await
    }

    async fn search_incidents(&self, query: &IncidentQuery) -> Result<Page<Incident>> {
        let payload: ListPayload<Incident> =
            self.send_json(Endpoint::search_incidents(query)).await?;
        Ok(payload.into_page())
    }

    async fn get_incident(&self, log_hash: &str) -> Result<Incident> {
        self.send_json(Endpoint::get_incident(log_hash)).await
    }

    async fn update_incident_status(&self, log_hash: &str, status: &IncidentStatus) -> Result<()> {
        self.send_unit(Endpoint::update_incident_status(log_hash, status))
            .await
    }

    async fn update_incident_details(
        &self,
        log_hash: &str,
        update: &IncidentDetailsUpdate,
    ) -> Result<()> {
        if update.is_empty() {
            return Err(Error::Validation("nothing to update".to_string()));
        }
        self.send_unit(Endpoint::update_incident_details(log_hash, update))
            .await
    }

    async fn incident_top(&self, query: &RankQuery) -> Result<Vec<IncidentRank>> {
        let payload: ListPayload<IncidentRank> =
            self.send_json(Endpoint::incident_top(query)).await?;
        Ok(payload.into_page().content)
    }

    async fn create_draft(&self, incident_id: i64) -> Result<i64> {
        let value: serde_json::Value = self.send_json(Endpoint::create_draft(incident_id)).await?;
        created_id(&value)
            .ok_or_else(|| Error::Decode(format!("draft response carried no article id: {}", value)))
    }

    async fn list_kb(&self, query: &KbQuery) -> Result<Page<KbArticle>> {
        let payload: ListPayload<KbArticle> = self.send_json(Endpoint::list_kb(query)).await?;
        Ok(payload.into_page())
    }

    async fn get_kb(&self, id: i64, query: &KbDetailQuery) -> Result<KbArticle> {
        self.send_json(Endpoint::get_kb(id, query)).await
    }

    async fn post_kb_article(&self, id: i64, article: &KbArticleWrite) -> Result<()> {
        self.send_body_unit(Endpoint::post_kb_article(id), article)
            .await
    }

    async fn update_draft(&self, id: i64, article: &KbArticleWrite) -> Result<()> {
        self.send_body_unit(Endpoint::update_draft(id), article)
            .await
    }

    async fn update_kb_status(&self, id: i64, status: &KbStatus) -> Result<()> {
        self.send_unit(Endpoint::update_kb_status(id, status)).await
    }

    async fn list_addendums(&self, id: i64) -> Result<Vec<Addendum>> {
        let payload: ListPayload<Addendum> = self.send_json(Endpoint::list_addendums(id)).await?;
        Ok(payload.into_page().content)
    }

    async fn create_addendum(&self, id: i64, addendum: &AddendumCreate) -> Result<Addendum> {
        if addendum.content.trim().is_empty() {
            return Err(Error::Validation("addendum content is empty".to_string()));
        }
        self.send_body_json(Endpoint::create_addendum(id), addendum)
            .await
    }

    async fn run_scheduler(&self) -> Result<String> {
        let endpoint = Endpoint::run_scheduler();
        let response = self.execute(&endpoint, self.request(&endpoint)).await?;
        response
            .text()
            .await
            .map_err(|e| Error::Http(format!("failed to read response: {}", e)))
    }

    async fn health_check(&self) -> Result<bool> {
        let endpoint = Endpoint::health_check();
        match self.request(&endpoint).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::Http(format!("failed to read response: {}", e)))?;
    serde_json::from_slice(&bytes).map_err(|e| Error::Decode(e.to_string()))
}

/// Build an error from a non-2xx response.
///
/// Prefers the backend's `message` field, then the raw body, then the
/// status reason phrase.
pub fn api_error(status: reqwest::StatusCode, body: &str) -> Error {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .and_then(|m| m.as_str())
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
        });

    let message = from_json.unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect()
        }
    });

    Error::Api {
        status: status.as_u16(),
        message,
    }
}

/// The new article id from a draft response: a bare number or `{ "id": n }`.
fn created_id(value: &serde_json::Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .or_else(|| value.get("id").and_then(|id| id.as_i64()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;

    #[test]
    fn test_client_requires_valid_config() {
        let config = ApiConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(ApiClient::new(&config).is_err());
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let config = ApiConfig {
            base_url: "http://collector.local:8080/api/".to_string(),
            ..Default::default()
        };
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://collector.local:8080/api");
    }

    #[test]
    fn test_request_carries_query_string() {
        let client = ApiClient::new(&ApiConfig::default()).unwrap();
        let endpoint = Endpoint::update_log_status(7, &LogStatus::Resolved);
        let request = client.request(&endpoint).build().unwrap();

        assert_eq!(request.method(), reqwest::Method::PATCH);
        assert_eq!(
            request.url().as_str(),
            "http://localhost:8080/api/logs/7/status?newStatus=RESOLVED"
        );
    }

    #[test]
    fn test_api_error_prefers_message_field() {
        let err = api_error(
            StatusCode::BAD_REQUEST,
            r#"{"code":"L001","message":"서비스명은 필수입니다."}"#,
        );
        assert_eq!(err.user_message(), "서비스명은 필수입니다.");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_api_error_falls_back_to_body_then_reason() {
        let err = api_error(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert_eq!(err.user_message(), "boom");

        let err = api_error(StatusCode::NOT_FOUND, "");
        assert_eq!(err.user_message(), "Not Found");
        assert!(err.is_not_found());

        let err = api_error(StatusCode::BAD_GATEWAY, &"x".repeat(1000));
        assert_eq!(err.user_message().len(), MAX_ERROR_BODY_CHARS);
    }

    #[test]
    fn test_created_id_shapes() {
        assert_eq!(created_id(&json!(12)), Some(12));
        assert_eq!(created_id(&json!("12")), Some(12));
        assert_eq!(created_id(&json!({ "id": 12 })), Some(12));
        assert_eq!(created_id(&json!({})), None);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_http_error() {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:9/api".to_string(),
            timeout_secs: 2,
        };
        let client = ApiClient::new(&config).unwrap();

        let err = client.search_logs(&LogQuery::default()).await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
        assert!(!client.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_client_side_validation() {
        let client = ApiClient::new(&ApiConfig::default()).unwrap();
        let err = client.analyze("  ", false).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = client
            .update_incident_details("h1", &IncidentDetailsUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
