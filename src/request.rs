//! Request description and signing logic for the Aidge API.

use std::fmt;

use serde::Serialize;

use crate::config::ClientConfig;
use crate::credential::Credential;
use crate::error::{AidgeError, Result};
use crate::sign::{percent_encode, sign};

/// Query parameters owned by the signing scheme.
const RESERVED_PARAMS: [&str; 6] = [
    "partner_id",
    "sign_method",
    "sign_ver",
    "app_key",
    "timestamp",
    "sign",
];

/// HTTP method of an API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Read-style call; parameters travel in the query string.
    Get,
    /// Default for every operation; parameters travel as a JSON body.
    Post,
}

impl Method {
    /// Upper-case method name.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }

    pub(crate) fn to_http(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One call against an Aidge operation, before signing.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    operation_path: String,
    method: Method,
    body: Option<Vec<u8>>,
    query: Vec<(String, String)>,
}

impl ApiRequest {
    /// A POST whose body is `payload` encoded as JSON.
    pub fn post<P: Serialize + ?Sized>(operation_path: impl Into<String>, payload: &P) -> Result<Self> {
        let body = serde_json::to_vec(payload)?;
        Ok(Self {
            operation_path: operation_path.into(),
            method: Method::Post,
            body: Some(body),
            query: Vec::new(),
        })
    }

    /// A POST carrying an already encoded JSON document.
    pub fn post_raw(operation_path: impl Into<String>, json: impl Into<String>) -> Self {
        Self {
            operation_path: operation_path.into(),
            method: Method::Post,
            body: Some(json.into().into_bytes()),
            query: Vec::new(),
        }
    }

    /// A GET without a body. Add parameters with [`ApiRequest::with_query`].
    pub fn get(operation_path: impl Into<String>) -> Self {
        Self {
            operation_path: operation_path.into(),
            method: Method::Get,
            body: None,
            query: Vec::new(),
        }
    }

    /// Appends a query parameter after the signing parameters.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Path after `/rest`, e.g. `/ai/image/cut/out`.
    pub fn operation_path(&self) -> &str {
        &self.operation_path
    }

    /// HTTP method of the call.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Encoded JSON body; `None` for GET.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Extra query parameters, in the order they were added.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    fn validate(&self) -> Result<()> {
        let path = &self.operation_path;
        if path.is_empty() {
            return Err(AidgeError::Validation("operation path is empty".into()));
        }
        if !path.starts_with('/') {
            return Err(AidgeError::Validation(format!(
                "operation path '{}' must start with '/'",
                path
            )));
        }
        if path.contains(['?', '#']) || path.contains(char::is_whitespace) {
            return Err(AidgeError::Validation(format!(
                "operation path '{}' contains a query, fragment or whitespace",
                path
            )));
        }
        for (key, _) in &self.query {
            if RESERVED_PARAMS.contains(&key.as_str()) {
                return Err(AidgeError::Validation(format!(
                    "query parameter '{}' is reserved for request signing",
                    key
                )));
            }
        }
        Ok(())
    }
}

/// A fully signed call. Built for exactly one HTTP exchange.
#[derive(Debug)]
pub(crate) struct SignedRequest {
    pub operation_path: String,
    pub method: Method,
    pub timestamp: String,
    pub url: String,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: Option<Vec<u8>>,
}

/// Milliseconds since the Unix epoch, as used for the `timestamp` parameter.
pub(crate) fn current_timestamp_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Builds a signed request for the Aidge API.
///
/// This function:
/// 1. Validates the operation path and extra query parameters
/// 2. Signs `secret + timestamp` with HMAC-SHA256
/// 3. Assembles `{endpoint}/rest{path}?partner_id=...&sign=...`
/// 4. Attaches the JSON content type and, in trial mode, `x-iop-trial`
pub(crate) fn build_signed_request(
    request: &ApiRequest,
    credential: &Credential,
    config: &ClientConfig,
    timestamp_millis: i64,
) -> Result<SignedRequest> {
    request.validate()?;

    let timestamp = timestamp_millis.to_string();
    let signature = sign(&credential.access_key_secret, &timestamp)?;

    let mut url = format!(
        "{}/rest{}?partner_id={}&sign_method={}&sign_ver={}&app_key={}&timestamp={}&sign={}",
        config.endpoint,
        request.operation_path,
        config.partner_id,
        config.sign_method,
        config.sign_ver,
        percent_encode(&credential.access_key_id),
        timestamp,
        signature
    );
    for (key, value) in &request.query {
        url.push('&');
        url.push_str(&percent_encode(key));
        url.push('=');
        url.push_str(&percent_encode(value));
    }

    let mut headers = vec![("Content-Type", "application/json")];
    if config.use_trial_resource {
        headers.push(("x-iop-trial", "true"));
    }

    Ok(SignedRequest {
        operation_path: request.operation_path.clone(),
        method: request.method,
        timestamp,
        url,
        headers,
        body: request.body.clone(),
    })
}
