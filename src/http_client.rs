use crate::configuration::HttpSettings;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use thiserror::Error;

pub type Session = ClientWithMiddleware;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("user agent `{0}` is not a valid header value")]
    InvalidAgent(String, #[source] reqwest::header::InvalidHeaderValue),
    #[error("unable to build http client")]
    Client(#[from] reqwest::Error),
}

/// Builds the HTTP session used for every request of one comic.
///
/// Sessions are never shared between comics so each one carries its own
/// user agent. Only connecting is time limited here; each request sets its
/// own overall limit.
pub fn session(agent: Option<&str>, http: &HttpSettings) -> Result<Session, SessionError> {
    let mut headers = HeaderMap::new();
    if let Some(agent) = agent {
        let value = HeaderValue::from_str(agent)
            .map_err(|e| SessionError::InvalidAgent(agent.to_string(), e))?;
        headers.insert(USER_AGENT, value);
    }

    let client = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(http.timeout())
        .build()?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(http.retries);
    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}
