//! HTTP transports used to deliver SOAP envelopes.
//!
//! The plain [`HttpTransport`] sends no credentials. [`HttpAuthenticated`]
//! answers a `401` challenge with basic credentials, [`AlwaysSendTransport`]
//! sends them with every request, and `WindowsHttpAuthenticated` (behind the
//! `ntlm` feature) runs the NTLM handshake.

use bytes::Bytes;
use indexmap::IndexMap;
use reqwest::{
    blocking::{Client as Reqwest, RequestBuilder, Response},
    header::{HeaderMap, HeaderName, HeaderValue},
    Proxy, StatusCode,
};
use std::{fmt, time::Duration};
use thiserror::Error;

#[cfg(feature = "ntlm")]
mod ntlm;

#[cfg(feature = "ntlm")]
pub use ntlm::WindowsHttpAuthenticated;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    #[error("Server replied with HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Invalid HTTP header '{0}'")]
    InvalidHeader(String),

    #[error("Unsupported proxy protocol '{0}'")]
    UnsupportedProxy(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),
}

#[derive(Debug, Clone)]
pub struct Request {
    pub url: String,
    pub message: Vec<u8>,
    pub headers: IndexMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct Reply {
    pub code: u16,
    pub message: Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    /// Protocol (`http`, `https` or `all`) to proxy URL.
    pub proxy: IndexMap<String, String>,
    pub timeout: Option<Duration>,
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

pub trait Transport: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn send(&self, request: &Request, options: &TransportOptions) -> Result<Reply, TransportError>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpTransport;

/// Sends credentials only after the server asks for them.
#[derive(Debug, Clone)]
pub struct HttpAuthenticated {
    credentials: Credentials,
}

/// Sends an `Authorization` header with every request.
#[derive(Debug, Clone)]
pub struct AlwaysSendTransport {
    credentials: Credentials,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

pub(crate) fn http_client(options: &TransportOptions) -> Result<Reqwest, TransportError> {
    let mut builder = Reqwest::builder();

    if let Some(timeout) = options.timeout {
        builder = builder.timeout(timeout);
    }

    for (protocol, url) in &options.proxy {
        let url = if url.contains("://") {
            url.clone()
        } else {
            format!("http://{}", url)
        };

        let proxy = match protocol.as_str() {
            "http" => Proxy::http(url)?,
            "https" => Proxy::https(url)?,
            "all" => Proxy::all(url)?,
            other => return Err(TransportError::UnsupportedProxy(other.to_owned())),
        };

        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

fn header_map(headers: &IndexMap<String, String>) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::new();

    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| TransportError::InvalidHeader(name.clone()))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| TransportError::InvalidHeader(name.clone()))?;
        map.insert(header_name, header_value);
    }

    Ok(map)
}

pub(crate) fn post(client: &Reqwest, request: &Request) -> Result<RequestBuilder, TransportError> {
    Ok(client
        .post(&request.url)
        .headers(header_map(&request.headers)?)
        .body(request.message.clone()))
}

/// Successful replies and SOAP faults (HTTP 500) carry an envelope; anything
/// else is a transport failure.
pub(crate) fn into_reply(response: Response) -> Result<Reply, TransportError> {
    let status = response.status();
    let message = response.bytes()?;

    tracing::debug!(code = status.as_u16(), length = message.len(), "Received reply");

    if status.is_success() || status == StatusCode::INTERNAL_SERVER_ERROR {
        Ok(Reply {
            code: status.as_u16(),
            message,
        })
    } else {
        Err(TransportError::Status {
            code: status.as_u16(),
            body: String::from_utf8_lossy(&message).into_owned(),
        })
    }
}

impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    fn send(&self, request: &Request, options: &TransportOptions) -> Result<Reply, TransportError> {
        tracing::debug!(url = %request.url, "Sending request");

        let client = http_client(options)?;
        into_reply(post(&client, request)?.send()?)
    }
}

impl HttpAuthenticated {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

impl Transport for HttpAuthenticated {
    fn name(&self) -> &'static str {
        "standard"
    }

    fn send(&self, request: &Request, options: &TransportOptions) -> Result<Reply, TransportError> {
        tracing::debug!(url = %request.url, "Sending request");

        let client = http_client(options)?;
        let response = post(&client, request)?.send()?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return into_reply(response);
        }

        tracing::debug!(url = %request.url, "Challenged, resending with credentials");

        into_reply(
            post(&client, request)?
                .basic_auth(&self.credentials.username, Some(&self.credentials.password))
                .send()?,
        )
    }
}

impl AlwaysSendTransport {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

impl Transport for AlwaysSendTransport {
    fn name(&self) -> &'static str {
        "always_send"
    }

    fn send(&self, request: &Request, options: &TransportOptions) -> Result<Reply, TransportError> {
        tracing::debug!(url = %request.url, "Sending request with credentials");

        let client = http_client(options)?;
        into_reply(
            post(&client, request)?
                .basic_auth(&self.credentials.username, Some(&self.credentials.password))
                .send()?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn request(url: String) -> Request {
        let mut headers = IndexMap::new();
        headers.insert("Content-Type".to_owned(), "text/xml; charset=utf-8".to_owned());

        Request {
            url,
            message: b"<envelope/>".to_vec(),
            headers,
        }
    }

    #[test]
    fn plain_transport_posts_message() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/service")
            .match_header("content-type", "text/xml; charset=utf-8")
            .match_header("authorization", Matcher::Missing)
            .match_body("<envelope/>")
            .with_status(200)
            .with_body("<reply/>")
            .create();

        let reply = HttpTransport
            .send(&request(format!("{}/service", server.url())), &Default::default())
            .unwrap();

        mock.assert();
        assert_eq!(reply.code, 200);
        assert_eq!(&reply.message[..], b"<reply/>");
    }

    #[test]
    fn standard_resends_with_credentials_after_challenge() {
        let mut server = mockito::Server::new();
        let challenge = server
            .mock("POST", "/secure")
            .match_header("authorization", Matcher::Missing)
            .with_status(401)
            .create();
        let authorized = server
            .mock("POST", "/secure")
            .match_header("authorization", "Basic YW5uOnNlY3JldA==")
            .with_status(200)
            .with_body("<ok/>")
            .create();

        let transport = HttpAuthenticated::new(Credentials::new("ann", "secret"));
        let reply = transport
            .send(&request(format!("{}/secure", server.url())), &Default::default())
            .unwrap();

        challenge.assert();
        authorized.assert();
        assert_eq!(&reply.message[..], b"<ok/>");
    }

    #[test]
    fn always_send_includes_credentials_up_front() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/secure")
            .match_header("authorization", "Basic YW5uOnNlY3JldA==")
            .with_status(200)
            .create();

        AlwaysSendTransport::new(Credentials::new("ann", "secret"))
            .send(&request(format!("{}/secure", server.url())), &Default::default())
            .unwrap();

        mock.assert();
    }

    #[test]
    fn server_error_status_is_returned_as_reply() {
        let mut server = mockito::Server::new();
        server.mock("POST", "/fault").with_status(500).with_body("<fault/>").create();

        let reply = HttpTransport
            .send(&request(format!("{}/fault", server.url())), &Default::default())
            .unwrap();

        assert_eq!(reply.code, 500);
    }

    #[test]
    fn other_error_status_fails() {
        let mut server = mockito::Server::new();
        server.mock("POST", "/missing").with_status(404).with_body("nope").create();

        let error = HttpTransport
            .send(&request(format!("{}/missing", server.url())), &Default::default())
            .unwrap_err();

        assert!(matches!(error, TransportError::Status { code: 404, ref body } if body == "nope"));
    }

    #[test]
    fn unknown_proxy_protocol_is_rejected() {
        let mut proxy = IndexMap::new();
        proxy.insert("gopher".to_owned(), "localhost:70".to_owned());

        let error = http_client(&TransportOptions {
            proxy,
            timeout: None,
        })
        .unwrap_err();

        assert!(matches!(error, TransportError::UnsupportedProxy(ref protocol) if protocol == "gopher"));
    }

    #[test]
    fn invalid_header_name_is_rejected() {
        let mut headers = IndexMap::new();
        headers.insert("Bad Header".to_owned(), "x".to_owned());

        assert!(matches!(
            header_map(&headers),
            Err(TransportError::InvalidHeader(_))
        ));
    }
}
