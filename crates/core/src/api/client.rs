use crate::{
    config::{ApiSettings, Credentials},
    errors::ServiceError,
};
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client, Response,
};
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

/// Header carrying the access key on authenticated requests
pub const ACCESS_KEY_HEADER: &str = "x-access-key";

/// Which of the three pre-configured clients this is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    Anonymous,
    Authenticated,
    Rpc,
}

/// Thin JSON client bound to one base URL
#[derive(Debug, Clone)]
pub struct ApiClient {
    kind: ClientKind,
    base_url: Url,
    http_client: Client,
}

impl ApiClient {
    /// REST client without credentials
    pub fn anonymous(settings: &ApiSettings) -> Result<Self, ServiceError> {
        Self::build(
            ClientKind::Anonymous,
            settings.base_url.clone(),
            settings,
            None,
        )
    }

    /// REST client sending the access key
    pub fn authenticated(
        settings: &ApiSettings,
        credentials: &Credentials,
    ) -> Result<Self, ServiceError> {
        Self::build(
            ClientKind::Authenticated,
            settings.base_url.clone(),
            settings,
            credentials.access_key(),
        )
    }

    /// Client for the fork-scoped RPC endpoints, sending the access key
    pub fn rpc(settings: &ApiSettings, credentials: &Credentials) -> Result<Self, ServiceError> {
        Self::build(
            ClientKind::Rpc,
            settings.rpc_url.clone(),
            settings,
            credentials.access_key(),
        )
    }

    /// Authenticated client when credentials are present, anonymous otherwise
    pub fn for_credentials(
        settings: &ApiSettings,
        credentials: &Credentials,
    ) -> Result<Self, ServiceError> {
        if credentials.is_authenticated() {
            Self::authenticated(settings, credentials)
        } else {
            Self::anonymous(settings)
        }
    }

    fn build(
        kind: ClientKind,
        base_url: Url,
        settings: &ApiSettings,
        access_key: Option<&str>,
    ) -> Result<Self, ServiceError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = access_key {
            let mut value = HeaderValue::from_str(key)?;
            value.set_sensitive(true);
            headers.insert(ACCESS_KEY_HEADER, value);
        }

        let http_client = Client::builder()
            .timeout(settings.timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            kind,
            base_url,
            http_client,
        })
    }

    pub fn kind(&self) -> ClientKind {
        self.kind
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends path segments to the base URL, keeping any base path prefix.
    ///
    /// Each segment is percent-encoded, so `/`, `?` and `#` stay inside it.
    pub fn url(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::InvalidBaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET a JSON document. `Ok(None)` means the body was empty or `null`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> Result<Option<T>, ServiceError> {
        let url = self.url(segments)?;
        tracing::trace!(%url, kind = ?self.kind, "GET");

        let response = self.http_client.get(url).send().await?;
        Self::process_response(response).await
    }

    /// POST a JSON body and read a JSON document back
    pub async fn post<B, T>(&self, segments: &[&str], body: &B) -> Result<Option<T>, ServiceError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(segments)?;
        tracing::trace!(%url, kind = ?self.kind, "POST");

        let response = self.http_client.post(url).json(body).send().await?;
        Self::process_response(response).await
    }

    async fn process_response<T: DeserializeOwned>(
        response: Response,
    ) -> Result<Option<T>, ServiceError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ServiceError::Status { status, body });
        }

        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(trimmed)?))
    }
}
