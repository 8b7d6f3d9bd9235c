use futures::{future, Future as StdFuture, FutureExt, TryFutureExt};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Method, RequestBuilder, StatusCode, Url,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{pin::Pin, time::Duration};
use tokio_retry2::{strategy::jitter, Retry};

/// A type alias for `Future` that may return `crate::error::Error`
pub type Future<T> = Pin<Box<dyn StdFuture<Output = Result<T>> + Send>>;

mod error;

pub mod databases;
pub mod pages;
pub mod properties;

pub use error::{ApiError, Error, Result};

/// The default timeout for API requests
pub const DEFAULT_TIMEOUT: u64 = 20;
/// The default number of retries for transient request failures
pub const DEFAULT_RETRIES: usize = 3;
/// The API version sent with every request
pub const NOTION_VERSION: &str = "2022-06-28";
/// The public Notion API host
pub const NOTION_ENDPOINT: &str = "https://api.notion.com";
/// Maximum page size accepted by query endpoints
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone)]
pub struct BearerAuth {
    auth_header: HeaderValue,
    endpoint: Url,
}

#[derive(Debug, Clone)]
pub enum AuthMode {
    Bearer(BearerAuth),
}

impl AuthMode {
    pub fn new_bearer(token: &str) -> Result<Self> {
        Self::new_bearer_with_endpoint(token, NOTION_ENDPOINT)
    }

    pub fn new_bearer_with_endpoint(token: &str, endpoint: &str) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::MalformedToken);
        }
        let mut auth_header = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| Error::MalformedToken)?;
        auth_header.set_sensitive(true);
        let endpoint = Url::parse(endpoint)?;

        Ok(Self::Bearer(BearerAuth {
            auth_header,
            endpoint,
        }))
    }

    pub fn to_endpoint_url(&self) -> Url {
        match self {
            Self::Bearer(auth) => auth.endpoint.clone(),
        }
    }

    pub fn to_request_url(&self, path: &str) -> Result<Url> {
        let mut uri = path.to_string();

        // Make sure we have the leading "/".
        if !uri.starts_with('/') {
            uri = format!("/{uri}");
        }

        self.to_endpoint_url().join(&uri).map_err(Error::from)
    }

    pub fn to_authorization_header(&self) -> HeaderValue {
        match self {
            Self::Bearer(auth) => auth.auth_header.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Client {
    auth: AuthMode,
    client: reqwest::Client,
    retries: RetryPolicy,
}

impl Client {
    /// Create a new client with the default timeout and retry policy.
    pub fn new(auth: AuthMode) -> Result<Self> {
        Self::new_with_timeout(auth, DEFAULT_TIMEOUT)
    }

    /// Create a new client with the given request timeout in seconds.
    pub fn new_with_timeout(auth: AuthMode, timeout: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .gzip(true)
            .timeout(Duration::from_secs(timeout))
            .build()?;
        Ok(Self {
            auth,
            client,
            retries: RetryPolicy::with_retries(DEFAULT_RETRIES),
        })
    }

    pub fn with_retries(mut self, retries: RetryPolicy) -> Self {
        self.retries = retries;
        self
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.auth.to_request_url(path)?;

        let mut headers = HeaderMap::new();
        headers.append(AUTHORIZATION, self.auth.to_authorization_header());
        headers.append(
            HeaderName::from_static("notion-version"),
            HeaderValue::from_static(NOTION_VERSION),
        );
        headers.append(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(self.client.request(method, url).headers(headers))
    }

    /// Issue a single request without retries and decode the response.
    fn send<R>(&self, method: Method, path: &str, body: Option<&serde_json::Value>) -> Future<R>
    where
        R: 'static + DeserializeOwned + Send,
    {
        match self.request(method, path) {
            Ok(builder) => {
                let builder = match body {
                    Some(body) => builder.json(body),
                    None => builder,
                };
                builder
                    .send()
                    .map_err(Error::from)
                    .and_then(|response| {
                        let status = response.status();
                        if status.is_client_error() || status.is_server_error() {
                            return response
                                .bytes()
                                .map_err(Error::from)
                                .and_then(move |bytes| async move {
                                    Err(Error::notion(decode_api_error(status, &bytes)))
                                })
                                .boxed();
                        }
                        response
                            .bytes()
                            .map_err(Error::from)
                            .and_then(|bytes| async move {
                                serde_json::from_slice(&bytes).map_err(Error::from)
                            })
                            .boxed()
                    })
                    .boxed()
            }
            Err(e) => future::err(e).boxed(),
        }
    }

    /// Issue a request, retrying transient failures per the client's
    /// retry policy.
    fn send_with_retry<R>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Future<R>
    where
        R: 'static + DeserializeOwned + Send,
    {
        let client = self.clone();
        let path = path.to_string();
        let log_path = path.clone();
        async move {
            Retry::spawn_notify(
                client.retries,
                || {
                    client
                        .send::<R>(method.clone(), &path, body.as_ref())
                        .map_err(Error::into_retry)
                },
                move |err: &Error, sleep: Duration| {
                    tracing::warn!(%err, sleep = sleep.as_secs(), path = %log_path, "notion request")
                },
            )
            .await
        }
        .boxed()
    }

    pub fn fetch<R>(&self, path: &str) -> Future<R>
    where
        R: 'static + DeserializeOwned + Send,
    {
        self.send_with_retry(Method::GET, path, None)
    }

    pub fn submit<T, R>(&self, method: Method, path: &str, json: &T) -> Future<R>
    where
        T: Serialize + ?Sized,
        R: 'static + DeserializeOwned + Send,
    {
        match serde_json::to_value(json) {
            Ok(body) => self.send_with_retry(method, path, Some(body)),
            Err(e) => future::err(Error::from(e)).boxed(),
        }
    }

    pub fn post<T, R>(&self, path: &str, json: &T) -> Future<R>
    where
        T: Serialize + ?Sized,
        R: 'static + DeserializeOwned + Send,
    {
        self.submit(Method::POST, path, json)
    }

    pub fn patch<T, R>(&self, path: &str, json: &T) -> Future<R>
    where
        T: Serialize + ?Sized,
        R: 'static + DeserializeOwned + Send,
    {
        self.submit(Method::PATCH, path, json)
    }
}

/// Decode a Notion error body, falling back to the HTTP status when the
/// body is not a Notion error object (e.g. a gateway error page).
fn decode_api_error(status: StatusCode, bytes: &[u8]) -> ApiError {
    serde_json::from_slice::<ApiError>(bytes).unwrap_or_else(|_| ApiError {
        status: status.as_u16(),
        code: status
            .canonical_reason()
            .unwrap_or("unknown")
            .to_lowercase()
            .replace(' ', "_"),
        message: String::from_utf8_lossy(bytes).trim().to_string(),
    })
}

#[derive(Clone, Copy, Debug, Default)]
pub enum RetryPolicy {
    #[default]
    None,
    Retries(usize),
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self::None
    }

    pub fn with_retries(retries: usize) -> Self {
        Self::Retries(retries)
    }
}

impl IntoIterator for RetryPolicy {
    type Item = Duration;
    type IntoIter = std::vec::IntoIter<Duration>;

    fn into_iter(self) -> Self::IntoIter {
        use tokio_retry2::strategy::ExponentialFactorBackoff;
        let retries = match self {
            Self::None => vec![],
            Self::Retries(retries) => ExponentialFactorBackoff::from_factor(2.)
                .max_delay_millis(5000)
                .map(jitter)
                .take(retries)
                .collect(),
        };
        retries.into_iter()
    }
}
