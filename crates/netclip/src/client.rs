use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::{debug, error, info};
use ureq::{Agent, http};

use crate::config::Config;
use crate::credentials::ApiKey;

const USER_AGENT: &str = concat!("netclip/", env!("CARGO_PKG_VERSION"));

/// Status string the service embeds in a successful envelope.
pub const SUCCESS_STATUS: &str = "200";

/// Characters that must be percent-encoded in a URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS.add(b' ').add(b'#').add(b'%').add(b'/').add(b'?');

fn encode_path(s: &str) -> String {
    utf8_percent_encode(s, PATH_SEGMENT).to_string()
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{endpoint} request failed")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: ureq::Error,
    },
    #[error("failed to read {endpoint} response")]
    Body {
        endpoint: &'static str,
        #[source]
        source: ureq::Error,
    },
    #[error("malformed {endpoint} response")]
    Decode {
        endpoint: &'static str,
        body: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The `{status, message}` envelope every endpoint answers with.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ServerResponse {
    #[serde(default, alias = "ResponseCode", deserialize_with = "status_string")]
    pub status: String,
    #[serde(default, alias = "Message")]
    pub message: String,
}

impl ServerResponse {
    pub fn is_success(&self) -> bool {
        self.status == SUCCESS_STATUS
    }
}

/// Accept `"200"` as well as a bare `200`.
fn status_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Status {
        Text(String),
        Code(u64),
    }

    Ok(match Status::deserialize(deserializer)? {
        Status::Text(s) => s,
        Status::Code(n) => n.to_string(),
    })
}

pub struct ClipClient {
    agent: Agent,
    base_url: String,
}

impl std::fmt::Debug for ClipClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ClipClient {
    pub fn new(config: &Config) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(config.timeout)
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn get(&self, endpoint: &'static str, path: &str) -> Result<ServerResponse, ServiceError> {
        let url = self.url(path);
        debug!(endpoint, "GET");
        let resp = self
            .agent
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|source| ServiceError::Transport { endpoint, source })?;
        handle_response(endpoint, resp)
    }

    fn post_form(
        &self,
        endpoint: &'static str,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<ServerResponse, ServiceError> {
        let url = self.url(path);
        debug!(endpoint, "POST");
        let resp = self
            .agent
            .post(&url)
            .header("User-Agent", USER_AGENT)
            .send_form(form.iter().copied())
            .map_err(|source| ServiceError::Transport { endpoint, source })?;
        handle_response(endpoint, resp)
    }

    /// Ask the service for a new API key; on success `message` holds it.
    pub fn register(&self) -> Result<ServerResponse, ServiceError> {
        self.post_form("register", "register", &[("action", "register")])
    }

    /// Fetch the most recently saved clip for `key`.
    pub fn fetch_clip(&self, key: &ApiKey) -> Result<ServerResponse, ServiceError> {
        self.get(
            "clip/get",
            &format!("clip/get/{}", encode_path(key.as_str())),
        )
    }

    pub fn save_clip(&self, key: &ApiKey, clip: &str) -> Result<ServerResponse, ServiceError> {
        self.post_form(
            "clip/save",
            &format!("clip/save/{}", encode_path(key.as_str())),
            &[("action", "clip"), ("clip", clip)],
        )
    }
}

fn handle_response(
    endpoint: &'static str,
    mut resp: http::Response<ureq::Body>,
) -> Result<ServerResponse, ServiceError> {
    let http_status = resp.status().as_u16();
    // Clips have no size cap, so lift ureq's default body limit.
    let text = resp
        .body_mut()
        .with_config()
        .limit(u64::MAX)
        .read_to_string()
        .map_err(|source| ServiceError::Body { endpoint, source })?;
    debug!(endpoint, http_status, bytes = text.len(), "response received");
    parse_response(endpoint, text)
}

/// Decode the envelope. The embedded status, not the HTTP one, decides success,
/// and a failure status is logged but still returned.
fn parse_response(endpoint: &'static str, text: String) -> Result<ServerResponse, ServiceError> {
    let response: ServerResponse = match serde_json::from_str(&text) {
        Ok(response) => response,
        Err(source) => {
            return Err(ServiceError::Decode {
                endpoint,
                body: text,
                source,
            });
        }
    };

    if response.is_success() {
        info!(endpoint, "200 OK");
    } else {
        error!(
            endpoint,
            status = %response.status,
            message = %response.message,
            "service returned an error"
        );
    }
    Ok(response)
}
