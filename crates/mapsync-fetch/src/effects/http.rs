use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Status line, the headers the pipeline looks at, and the streaming body.
pub struct Response<E> {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub content_length: Option<u64>,
    pub body: BoxStream<'static, Result<Bytes, E>>,
}

impl<E> Response<E> {
    /// Drain the body into memory.
    pub async fn bytes(mut self) -> Result<Vec<u8>, E> {
        let mut out = Vec::new();
        while let Some(chunk) = self.body.next().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }

    /// Up to `limit` bytes of the body as lossy text, for error messages.
    pub async fn snippet(mut self, limit: usize) -> String {
        let mut out = Vec::new();
        while out.len() < limit {
            match self.body.next().await {
                Some(Ok(chunk)) => out.extend_from_slice(&chunk),
                _ => break,
            }
        }
        out.truncate(limit);
        String::from_utf8_lossy(&out).trim().to_string()
    }
}

/// Asynchronous HTTP client abstraction.
///
/// Implementations follow redirects, apply their own timeouts, and report a
/// non-2xx status through [`Response::status`] rather than as an error.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - Mock implementations for testing
pub trait HttpClient: Send + Sync {
    /// Error type for transport failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send a GET request and return once the response headers are in.
    fn get(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Response<Self::Error>, Self::Error>> + Send;
}

impl<C: HttpClient> HttpClient for Arc<C> {
    type Error = C::Error;

    fn get(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Response<Self::Error>, Self::Error>> + Send {
        (**self).get(url)
    }
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use std::time::Duration;

    use reqwest::header::{self, HeaderMap, HeaderValue};
    use reqwest::{Client, Proxy, Url};

    use super::*;

    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";
    pub const TIMEOUT: Duration = Duration::from_secs(120);

    /// Client construction knobs.
    #[derive(Debug, Clone, Default)]
    pub struct ClientSetting {
        pub proxies: Option<Vec<Url>>,
        pub timeout: Option<Duration>,
    }

    impl ClientSetting {
        pub fn proxy(mut self, proxy: Url) -> Self {
            self.proxies.get_or_insert_with(Vec::new).push(proxy);
            self
        }

        pub fn build(self) -> reqwest::Result<Client> {
            let mut headers = HeaderMap::new();
            headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));

            let mut cb = Client::builder()
                .user_agent(USER_AGENT)
                .default_headers(headers)
                .timeout(self.timeout.unwrap_or(TIMEOUT));

            if let Some(proxies) = self.proxies {
                for u in proxies {
                    cb = cb.proxy(Proxy::all(u)?);
                }
            }

            cb.build()
        }
    }

    /// Production HTTP client implementation using reqwest.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: Client,
    }

    impl ReqwestClient {
        pub fn new(setting: ClientSetting) -> reqwest::Result<Self> {
            Ok(Self {
                client: setting.build()?,
            })
        }
    }

    fn header_str(map: &HeaderMap, name: header::HeaderName) -> Option<String> {
        map.get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn get(&self, url: &str) -> Result<Response<Self::Error>, Self::Error> {
            let response = self.client.get(url).send().await?;
            let map = response.headers();
            Ok(Response {
                status: response.status().as_u16(),
                content_type: header_str(map, header::CONTENT_TYPE),
                content_disposition: header_str(map, header::CONTENT_DISPOSITION),
                content_length: response.content_length(),
                body: Box::pin(response.bytes_stream()),
            })
        }
    }

}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::{ClientSetting, ReqwestClient, TIMEOUT, USER_AGENT};
