//! Digest-authenticated HTTP request issuance
//!
//! The evaluation endpoint secures itself with RFC 2617 Digest
//! challenge/response. This module issues one request; on a 401 Digest
//! challenge with credentials available, it computes the digest proof and
//! reissues the identical request exactly once. A second 401 is returned to
//! the caller as-is. Credentials and computed Authorization headers are
//! never logged.

use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::headers::ResponseHeaders;
use reqwest::header::AUTHORIZATION;
use std::time::Duration;
use tracing::debug;

/// Fixed nonce count: this client performs a single digest attempt per request
const NONCE_COUNT: &str = "00000001";

/// Default per-request timeout when the caller does not override it
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// One HTTP request, immutable once built
///
/// Every recognized option is an explicit field with a default; there is no
/// open-ended option bag.
#[derive(Clone, Debug)]
pub struct RequestSpec {
    /// HTTP method
    pub method: reqwest::Method,

    /// Absolute request URL
    pub url: String,

    /// Additional request headers, applied in order
    pub headers: Vec<(String, String)>,

    /// Request body, if any
    pub body: Option<String>,

    /// Credentials for the digest handshake (None = unauthenticated)
    pub credentials: Option<Credentials>,

    /// Per-request timeout
    pub timeout: Duration,
}

impl RequestSpec {
    /// Create a spec with the given method and URL and default options
    pub fn new(method: reqwest::Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            credentials: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// A fully-read HTTP response
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,

    /// Response headers, case-insensitive
    pub headers: ResponseHeaders,

    /// Response body text
    pub body: String,
}

impl HttpResponse {
    /// True for 2xx statuses
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A parsed WWW-Authenticate Digest challenge; exists only during the handshake
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct DigestChallenge {
    pub(crate) realm: String,
    pub(crate) nonce: String,
    pub(crate) qop: String,
    pub(crate) opaque: Option<String>,
}

impl DigestChallenge {
    /// Tolerant key/value parse of a challenge header
    ///
    /// Accepts both quoted and unquoted values; pairs that fail to split on
    /// `=` are skipped rather than failing the handshake.
    pub(crate) fn parse(header: &str) -> Self {
        let mut challenge = Self::default();
        let params = header.trim().trim_start_matches("Digest").trim();

        for part in params.split(',') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"');
            match key.trim().to_ascii_lowercase().as_str() {
                "realm" => challenge.realm = value.to_string(),
                "nonce" => challenge.nonce = value.to_string(),
                "qop" => challenge.qop = value.to_string(),
                "opaque" => challenge.opaque = Some(value.to_string()),
                _ => {}
            }
        }

        challenge
    }
}

/// HTTP client with single-retry digest authentication
///
/// Holds one `reqwest::Client`; per-request behavior comes entirely from the
/// [`RequestSpec`], so one `DigestClient` serves both the buffered and the
/// streamed request paths.
#[derive(Clone, Debug)]
pub struct DigestClient {
    http: reqwest::Client,
}

impl DigestClient {
    /// Create a client
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the underlying HTTP client cannot be
    /// constructed.
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http })
    }

    /// Issue a request, answering a Digest challenge at most once
    ///
    /// The first request is sent exactly as specified. On a 401 with
    /// credentials present, the `WWW-Authenticate` challenge is parsed, a
    /// digest `Authorization` header is computed with a fresh cnonce, and
    /// the identical request is reissued once. A 401 without credentials, or
    /// a second 401, is returned unchanged.
    ///
    /// # Errors
    ///
    /// [`Error::Network`] on connection or timeout failure;
    /// [`Error::AuthUnsupported`] when the challenge scheme is not Digest.
    pub async fn send(&self, spec: &RequestSpec) -> Result<HttpResponse> {
        let first = self.issue(spec, None).await?;
        if first.status != 401 {
            return Ok(first);
        }
        let Some(credentials) = &spec.credentials else {
            return Ok(first);
        };

        let challenge_header = first.headers.www_authenticate().unwrap_or("");
        if !challenge_header.trim_start().starts_with("Digest") {
            let scheme = challenge_header
                .split_whitespace()
                .next()
                .unwrap_or("(none)")
                .to_string();
            return Err(Error::AuthUnsupported { scheme });
        }

        let challenge = DigestChallenge::parse(challenge_header);
        debug!(realm = %challenge.realm, qop = %challenge.qop, "answering digest challenge");

        let uri = request_uri(&spec.url);
        let cnonce = generate_cnonce();
        let authorization = digest_authorization(
            credentials,
            spec.method.as_str(),
            &uri,
            &challenge,
            &cnonce,
            NONCE_COUNT,
        );

        // Strictly sequential: the challenge response above has been fully
        // read before the second attempt goes out. No loop; whatever the
        // server says now is final.
        self.issue(spec, Some(authorization)).await
    }

    /// Send one request and read the whole response body
    async fn issue(&self, spec: &RequestSpec, authorization: Option<String>) -> Result<HttpResponse> {
        let mut builder = self
            .http
            .request(spec.method.clone(), &spec.url)
            .timeout(spec.timeout);

        for (name, value) in &spec.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &spec.body {
            builder = builder.body(body.clone());
        }
        if let Some(authorization) = authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = ResponseHeaders::from(response.headers());
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// The request-URI for HA2: path plus query of the request URL
///
/// Falls back to the raw URL string if it does not parse; by the time the
/// digest retry runs, the first request already succeeded in reaching the
/// server, so this is unreachable in practice.
fn request_uri(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        },
        Err(_) => url.to_string(),
    }
}

/// 16 random bytes, hex-encoded; fresh per digest attempt
fn generate_cnonce() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}

/// Compute the Authorization header for a Digest challenge
///
/// Pure and deterministic: fixing `cnonce` and `nc` fixes the output, which
/// is what makes the handshake unit-testable. With qop:
/// `response = md5(HA1:nonce:nc:cnonce:qop:HA2)`; without qop, the older
/// RFC 2069 form `md5(HA1:nonce:HA2)`.
pub(crate) fn digest_authorization(
    credentials: &Credentials,
    method: &str,
    uri: &str,
    challenge: &DigestChallenge,
    cnonce: &str,
    nc: &str,
) -> String {
    let ha1 = md5_hex(&format!(
        "{}:{}:{}",
        credentials.username, challenge.realm, credentials.password
    ));
    let ha2 = md5_hex(&format!("{}:{}", method, uri));

    let response = if challenge.qop.is_empty() {
        md5_hex(&format!("{}:{}:{}", ha1, challenge.nonce, ha2))
    } else {
        md5_hex(&format!(
            "{}:{}:{}:{}:{}:{}",
            ha1, challenge.nonce, nc, cnonce, challenge.qop, ha2
        ))
    };

    let mut header = format!(
        r#"Digest username="{}", realm="{}", nonce="{}", uri="{}", response="{}""#,
        credentials.username, challenge.realm, challenge.nonce, uri, response
    );
    if !challenge.qop.is_empty() {
        header.push_str(&format!(
            r#", qop={}, nc={}, cnonce="{}""#,
            challenge.qop, nc, cnonce
        ));
    }
    if let Some(opaque) = &challenge.opaque {
        header.push_str(&format!(r#", opaque="{}""#, opaque));
    }

    header
}

fn md5_hex(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}
