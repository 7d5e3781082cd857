// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Main REST API client implementation

use conf_rest_api_contract::*;
use reqwest::{Client as HttpClient, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::auth::AuthConfig;
use crate::error::{RestClientError, RestClientResult};

/// REST API client for the conference attendance service
#[derive(Debug, Clone)]
pub struct RestClient {
    http_client: HttpClient,
    base_url: Url,
    auth: AuthConfig,
}

impl RestClient {
    /// Create a new REST client.
    ///
    /// A path on `base_url` is kept as a prefix for every endpoint.
    pub fn new(mut base_url: Url, auth: AuthConfig) -> RestClientResult<Self> {
        if !base_url.path().ends_with('/') {
            let prefix = format!("{}/", base_url.path());
            base_url.set_path(&prefix);
        }

        let http_client = HttpClient::builder()
            .user_agent(concat!("confctl/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            base_url,
            auth,
        })
    }

    /// Create a client from a base URL string
    pub fn from_url(base_url: &str, auth: AuthConfig) -> RestClientResult<Self> {
        let base_url = Url::parse(base_url)?;
        Self::new(base_url, auth)
    }

    /// Same server, different credentials
    pub fn with_auth(&self, auth: AuthConfig) -> Self {
        Self {
            http_client: self.http_client.clone(),
            base_url: self.base_url.clone(),
            auth,
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the authentication config
    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }

    pub async fn health(&self) -> RestClientResult<HealthResponse> {
        self.get("/healthz").await
    }

    pub async fn version(&self) -> RestClientResult<VersionResponse> {
        self.get("/version").await
    }

    // Accounts

    pub async fn register_user(&self, request: &UserRegisterRequest) -> RestClientResult<UserResponse> {
        self.post("/auth/api/users/register", request).await
    }

    pub async fn register_admin(
        &self,
        request: &AdminRegisterRequest,
    ) -> RestClientResult<AdminResponse> {
        self.post("/auth/register", request).await
    }

    pub async fn signin(&self, request: &LoginRequest) -> RestClientResult<LoginResponse> {
        self.post("/auth/signin", request).await
    }

    // Event management

    pub async fn create_event(&self, request: &EventRequest) -> RestClientResult<EventResponse> {
        self.post("/event/create", request).await
    }

    pub async fn list_events(&self) -> RestClientResult<Vec<EventResponse>> {
        self.get("/event/showevents").await
    }

    pub async fn get_event(&self, id: i64) -> RestClientResult<EventResponse> {
        self.get(&format!("/event/getevent/{id}")).await
    }

    pub async fn update_event(
        &self,
        id: i64,
        request: &EventRequest,
    ) -> RestClientResult<EventResponse> {
        self.put(&format!("/event/updateevent/{id}"), request).await
    }

    pub async fn delete_event(&self, id: i64) -> RestClientResult<()> {
        self.delete(&format!("/event/deleteevent/{id}")).await
    }

    pub async fn event_attendees(&self, event_id: i64) -> RestClientResult<Vec<EventAttendeeResponse>> {
        self.get(&format!("/event/{event_id}/attendees")).await
    }

    pub async fn checkout_all(&self, event_id: i64) -> RestClientResult<BulkCheckoutResponse> {
        self.post_empty(&format!("/event/{event_id}/checkoutall")).await
    }

    pub async fn export_attendees(&self, event_id: i64) -> RestClientResult<AttendeeExportResponse> {
        self.get(&format!("/event/{event_id}/export/attendees")).await
    }

    pub async fn admin_dashboard_stats(&self) -> RestClientResult<DashboardStatsResponse> {
        self.get("/admin/dashboard/stats").await
    }

    pub async fn scan(&self, request: &ScanRequest) -> RestClientResult<ScanResponse> {
        self.post("/scan", request).await
    }

    // Attendee

    pub async fn attendee_events(&self) -> RestClientResult<Vec<EventResponse>> {
        self.get("/attendee/events").await
    }

    pub async fn register_for_event(&self, event_id: i64) -> RestClientResult<RegistrationResponse> {
        self.post_empty(&format!("/attendee/events/{event_id}/register")).await
    }

    pub async fn my_registrations(&self) -> RestClientResult<Vec<RegistrationResponse>> {
        self.get("/attendee/registrations").await
    }

    /// PNG bytes of one of the caller's registration QR codes
    pub async fn registration_qr(&self, registration_id: i64) -> RestClientResult<Vec<u8>> {
        let path = format!("/attendee/registrations/{registration_id}/qr");
        let response = self.send(Method::GET, &path, None::<&()>).await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn attendee_dashboard_stats(&self) -> RestClientResult<AttendeeDashboardStatsResponse> {
        self.get("/attendee/dashboard/stats").await
    }

    // Private helper methods

    async fn get<T: DeserializeOwned>(&self, path: &str) -> RestClientResult<T> {
        self.request(Method::GET, path, None::<&()>).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> RestClientResult<T> {
        self.request(Method::POST, path, Some(body)).await
    }

    async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> RestClientResult<T> {
        self.request(Method::PUT, path, Some(body)).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> RestClientResult<T> {
        self.request(Method::POST, path, None::<&()>).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> RestClientResult<T> {
        self.request(Method::DELETE, path, None::<&()>).await
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> RestClientResult<Response> {
        let url = self.endpoint(path)?;
        tracing::debug!(%method, %url, "Sending request");

        let mut request = self.http_client.request(method, url).headers(self.auth.headers()?);
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    fn endpoint(&self, path: &str) -> RestClientResult<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> RestClientResult<T> {
        let response = self.send(method, path, body).await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> RestClientResult<T> {
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let text = response.text().await?;
        // 204 and other empty bodies decode as unit
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(text).map_err(RestClientError::from)
    }

    async fn error_from(response: Response) -> RestClientError {
        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(err) => return RestClientError::Http(err),
        };

        match serde_json::from_str::<ProblemDetails>(&text) {
            Ok(problem) if status == StatusCode::UNAUTHORIZED => {
                RestClientError::Unauthorized(problem.display_message().to_string())
            }
            Ok(problem) => RestClientError::Server {
                status,
                details: problem,
            },
            Err(_) if status == StatusCode::UNAUTHORIZED => RestClientError::Unauthorized(text),
            Err(_) => RestClientError::UnexpectedResponse(format!("{status}: {text}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = RestClient::from_url("http://127.0.0.1:8080", AuthConfig::default()).unwrap();
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:8080/");
        assert!(client.auth().bearer_token.is_none());

        let authed = client.with_auth(AuthConfig::bearer("t"));
        assert_eq!(authed.auth().bearer_token.as_deref(), Some("t"));
        assert_eq!(authed.base_url(), client.base_url());
    }

    #[test]
    fn test_base_path_is_kept() {
        let client = RestClient::from_url("http://127.0.0.1:8080/conf", AuthConfig::default()).unwrap();
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:8080/conf/");
        assert_eq!(
            client.endpoint("/healthz").unwrap().as_str(),
            "http://127.0.0.1:8080/conf/healthz"
        );
        assert_eq!(
            client.endpoint("/event/getevent/7").unwrap().as_str(),
            "http://127.0.0.1:8080/conf/event/getevent/7"
        );

        let bare = RestClient::from_url("http://127.0.0.1:8080", AuthConfig::default()).unwrap();
        assert_eq!(bare.endpoint("/healthz").unwrap().as_str(), "http://127.0.0.1:8080/healthz");
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            RestClient::from_url("not a url", AuthConfig::default()),
            Err(RestClientError::Url(_))
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_http_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = RestClient::from_url(&format!("http://{addr}"), AuthConfig::default()).unwrap();
        assert!(matches!(client.health().await, Err(RestClientError::Http(_))));
    }
}
