//! Blocking HTTP transport used by the tree importers

use std::collections::HashMap;
use std::time::Duration;

use crate::error::{ProjiError, Result};

/// A response reduced to what the importers need
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    /// Header names are stored lower-case
    headers: HashMap<String, String>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_lowercase(), value.into());
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fail with a network error unless the status is 2xx
    pub fn error_for_status(self, url: &str) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ProjiError::network(format!(
                "GET {url} returned status {}",
                self.status
            )))
        }
    }
}

/// Issues GET requests on behalf of an importer
pub trait Transport {
    fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// `ureq`-backed transport
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("proji/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        tracing::debug!(url, "GET");

        let response = match self.agent.get(url).set("Accept", "application/json").call() {
            Ok(response) => response,
            // Non-2xx responses are handed back so the importer can report them
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(err)) => {
                return Err(ProjiError::network(format!("GET {url} failed: {err}")))
            }
        };

        let status = response.status();
        let mut headers = HashMap::new();
        for name in response.headers_names() {
            if let Some(value) = response.header(&name) {
                headers.insert(name.to_lowercase(), value.to_string());
            }
        }

        let body = response
            .into_string()
            .map_err(|e| ProjiError::network(format!("reading {url} failed: {e}")))?;

        Ok(HttpResponse {
            status,
            body,
            headers,
        })
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn get(&self, url: &str) -> Result<HttpResponse> {
        (**self).get(url)
    }
}
