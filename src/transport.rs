use std::future::Future;

use crate::error::Error;
use crate::request::{ApiRequest, ApiResponse};

/// The network boundary.
///
/// Implementations return `Ok` for every HTTP status, including 4xx/5xx.
/// Only failures to complete the exchange (connection refused, timeout)
/// are [`Error::Transport`].
///
/// # Example
///
/// ```rust,ignore
/// impl Transport for Recorder {
///     async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, Error> {
///         self.seen.lock().push(request);
///         Ok(ApiResponse::new(StatusCode::OK, "[]"))
///     }
/// }
/// ```
pub trait Transport: Send + Sync + 'static {
    fn execute(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, Error>> + Send;
}

#[cfg(feature = "http")]
pub use self::http_transport::HttpTransport;

#[cfg(feature = "http")]
mod http_transport {
    use reqwest::multipart;
    use url::Url;

    use super::Transport;
    use crate::config::ClientConfig;
    use crate::error::Error;
    use crate::request::{ApiRequest, ApiResponse, Body, Form, Part};

    /// [`Transport`] over `reqwest`, resolving request paths against a base URL.
    #[derive(Debug, Clone)]
    pub struct HttpTransport {
        base_url: Url,
        http: reqwest::Client,
    }

    impl HttpTransport {
        /// Build a transport from client configuration (base URL and timeout).
        ///
        /// # Errors
        ///
        /// Returns [`Error::Transport`] if the HTTP client cannot be built.
        pub fn from_config(config: &ClientConfig) -> Result<Self, Error> {
            let http = reqwest::Client::builder()
                .timeout(config.timeout())
                .build()?;
            Ok(Self {
                base_url: config.base_url().clone(),
                http,
            })
        }

        /// Use a custom HTTP client (for connection pool reuse or testing).
        #[must_use]
        pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
            self.http = client;
            self
        }

        #[must_use]
        pub fn base_url(&self) -> &Url {
            &self.base_url
        }

        /// Resolve a request path beneath the base URL.
        ///
        /// # Errors
        ///
        /// Returns [`Error::Config`] if the path does not form a valid URL.
        pub fn resolve(&self, path: &str) -> Result<Url, Error> {
            self.base_url
                .join(path.trim_start_matches('/'))
                .map_err(|e| Error::Config(format!("invalid request path {path:?}: {e}")))
        }
    }

    impl Transport for HttpTransport {
        async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, Error> {
            let url = self.resolve(request.path())?;
            let mut builder = self.http.request(request.method().clone(), url);

            if !request.query().is_empty() {
                builder = builder.query(request.query());
            }
            if let Some(token) = request.bearer() {
                builder = builder.bearer_auth(token);
            }
            builder = match request.body() {
                Body::Empty => builder,
                Body::Json(value) => builder.json(value),
                Body::Multipart(form) => builder.multipart(to_multipart(form)?),
            };

            let response = builder.send().await?;
            let status = response.status();
            let body = response.bytes().await?;

            tracing::trace!(
                method = %request.method(),
                path = %request.path(),
                status = status.as_u16(),
                "API exchange complete"
            );
            Ok(ApiResponse::new(status, body.to_vec()))
        }
    }

    fn to_multipart(form: &Form) -> Result<multipart::Form, Error> {
        let mut out = multipart::Form::new();
        for (name, part) in form.parts() {
            out = match part {
                Part::Text(value) => out.text(name.clone(), value.clone()),
                Part::File {
                    file_name,
                    mime,
                    bytes,
                } => {
                    let file = multipart::Part::bytes(bytes.clone())
                        .file_name(file_name.clone())
                        .mime_str(mime)?;
                    out.part(name.clone(), file)
                }
            };
        }
        Ok(out)
    }

}
