//! A blocking client for the LMS REST API.
//!
//! Every request carries the bearer token and tenant of the current [`Session`].
//! Two process-wide policies live here rather than at call sites:
//! a `401` on anything but the login/register endpoints clears the stored token,
//! and `GET /courses/:id/modules` is retried exactly once on a `500`.
mod auth;
pub mod course;
mod de;
pub mod modules;
pub mod quiz;
pub mod tenant;

use std::{
    sync::{Arc, RwLock},
    time::Duration,
};

pub use auth::{Credentials, Password, Role, Session};
use log::{debug, warn};
use reqwest::{
    blocking::{RequestBuilder, Response},
    Method, StatusCode, Url,
};
use serde::{de::DeserializeOwned, Deserialize};
pub use tenant::{Tenant, Terminology, DEFAULT_TENANT};
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the tenant id on every request
pub const TENANT_HEADER: &str = "x-tenant-id";

/// A client for the LMS API
pub struct Client {
    base: Url,
    http: reqwest::blocking::Client,
    session: Arc<RwLock<Session>>,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("not logged in, or the session has expired")]
    Unauthorized,

    #[error("server returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("request timed out")]
    Timeout,

    #[error("server reported failure: {}", .0)]
    Unsuccessful(String),

    #[error("http error: {}", .0)]
    HTTPError(#[from] reqwest::Error),

    #[error("io error: {}", .0)]
    IOError(#[from] std::io::Error),

    #[error("serde error: {}", .0)]
    SerdeError(#[from] serde_json::Error),

    #[error("invalid API base url: {}", .0)]
    BadBaseUrl(String),
}

impl Error {
    /// The HTTP status this error came from, if any
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            Error::Status { status, .. } => Some(*status),
            Error::HTTPError(e) => e.status(),
            _ => None,
        }
    }

    /// The message to show to the user for this error
    pub fn user_message(&self) -> &'static str {
        if matches!(self, Error::Timeout) {
            return "The request timed out. Please try again.";
        }

        match self.status() {
            Some(StatusCode::UNAUTHORIZED) => "Your session has expired. Please log in again.",
            Some(StatusCode::FORBIDDEN) => "You don't have permission to do that.",
            Some(StatusCode::NOT_FOUND) => "The requested resource was not found.",
            Some(StatusCode::REQUEST_TIMEOUT) | Some(StatusCode::GATEWAY_TIMEOUT) => {
                "The request timed out. Please try again."
            }
            Some(StatusCode::SERVICE_UNAVAILABLE) => "The service is temporarily unavailable.",
            _ => "Something went wrong. Please try again.",
        }
    }

    fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

/// The response envelope every endpoint wraps its payload in
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default = "de::yes")]
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub pagination: Option<course::Pagination>,
}

impl<T> Envelope<T> {
    /// Unwrap the payload, treating `success: false` or a missing payload as failure
    pub(crate) fn into_data(self) -> Result<T> {
        match (self.success, self.data) {
            (true, Some(d)) => Ok(d),
            _ => Err(Error::Unsuccessful(
                self.message.unwrap_or_else(|| "no data returned".to_string()),
            )),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration, session: Session) -> Result<Self> {
        let mut base =
            Url::parse(base_url).map_err(|e| Error::BadBaseUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(Error::BadBaseUrl(base_url.to_string()));
        }
        // so that path segments get appended rather than replacing the last one
        if let Ok(mut segs) = base.path_segments_mut() {
            segs.pop_if_empty();
        }

        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Client {
            base,
            http,
            session: Arc::new(RwLock::new(session)),
        })
    }

    /// A copy of the current session
    pub fn session(&self) -> Session {
        self.session
            .read()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn tenant(&self) -> Tenant {
        Tenant::new(&self.session().tenant_id)
    }

    pub(crate) fn set_session(&self, session: Session) {
        if let Ok(mut s) = self.session.write() {
            *s = session;
        }
    }

    /// Forget the current token. Tenant and role are kept so the login prompt can reuse them.
    pub fn clear_token(&self) {
        if let Ok(mut s) = self.session.write() {
            s.token = None;
        }
    }

    /// Build a URL from unescaped path segments
    pub(crate) fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segs) = url.path_segments_mut() {
            segs.extend(segments);
        }
        url
    }

    /// Start a request, with the session's auth & tenant headers attached
    pub(crate) fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let session = self.session();
        let mut req = self
            .http
            .request(method, self.url(segments))
            .header(TENANT_HEADER, session.tenant_id.as_str());
        if let Some(token) = &session.token {
            req = req.bearer_auth(token);
        }
        req
    }

    /// Send a request built by [`Self::request`], applying the retry and 401 policies.
    pub(crate) fn execute(&self, segments: &[&str], req: RequestBuilder) -> Result<Response> {
        let path = segments.join("/");

        // multipart bodies can't be cloned, so they're never retried
        let retry = if retries_on_server_error(segments) {
            req.try_clone()
        } else {
            None
        };

        let mut resp = req.send().map_err(transport_error)?;
        if resp.status() == StatusCode::INTERNAL_SERVER_ERROR {
            if let Some(again) = retry {
                warn!("{path} returned 500, retrying once");
                resp = again.send().map_err(transport_error)?;
            }
        }

        let status = resp.status();
        debug!("{path} -> {status}");
        if status == StatusCode::UNAUTHORIZED && !is_auth_endpoint(segments) {
            warn!("{path} returned 401, clearing session token");
            self.clear_token();
            return Err(Error::Unauthorized);
        }

        if !status.is_success() {
            let message = resp
                .text()
                .ok()
                .and_then(|t| serde_json::from_str::<ErrorBody>(&t).ok())
                .and_then(|b| b.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());
            return Err(Error::Status { status, message });
        }

        Ok(resp)
    }

    /// Perform a GET and decode the response envelope
    pub(crate) fn get_envelope<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<Envelope<T>> {
        let req = self.request(Method::GET, segments).query(query);
        let resp = self.execute(segments, req)?;
        decode(resp)
    }

    pub(crate) fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T> {
        self.get_envelope(segments, query)?.into_data()
    }

    /// Like [`Self::get`], but a 404 or an empty envelope is `Ok(None)`
    pub(crate) fn get_optional<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<Option<T>> {
        match self.get_envelope::<T>(segments, query) {
            Ok(env) if env.success => Ok(env.data),
            Ok(_) => Ok(None),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

pub(crate) fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    if log::log_enabled!(log::Level::Debug) {
        let s = resp.text()?;
        debug!("response: {}", s);
        Ok(serde_json::from_str(&s)?)
    } else {
        Ok(resp.json()?)
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout
    } else {
        Error::HTTPError(e)
    }
}

/// Login and registration answer 401 for bad credentials, which must not log the user out.
fn is_auth_endpoint(segments: &[&str]) -> bool {
    matches!(segments, ["auth", "login"] | ["auth", "register"])
}

/// The only endpoint retried on a 500: `GET /courses/:id/modules`
fn retries_on_server_error(segments: &[&str]) -> bool {
    matches!(segments, ["courses", _, "modules"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_module_listing_is_retried() {
        assert!(retries_on_server_error(&["courses", "abc", "modules"]));
        assert!(!retries_on_server_error(&["courses", "abc"]));
        assert!(!retries_on_server_error(&["courses"]));
        assert!(!retries_on_server_error(&["courses", "abc", "modules", "x"]));
        assert!(!retries_on_server_error(&["vq", "title", "abc"]));
    }

    #[test]
    fn auth_endpoints_are_exempt_from_logout() {
        assert!(is_auth_endpoint(&["auth", "login"]));
        assert!(is_auth_endpoint(&["auth", "register"]));
        assert!(!is_auth_endpoint(&["auth", "me"]));
        assert!(!is_auth_endpoint(&["courses"]));
    }

    #[test]
    fn status_messages() {
        let status = |code: u16| Error::Status {
            status: StatusCode::from_u16(code).unwrap(),
            message: String::new(),
        };

        assert_eq!(
            status(403).user_message(),
            "You don't have permission to do that."
        );
        assert_eq!(
            status(404).user_message(),
            "The requested resource was not found."
        );
        assert_eq!(
            status(408).user_message(),
            "The request timed out. Please try again."
        );
        assert_eq!(status(504).user_message(), status(408).user_message());
        assert_eq!(Error::Timeout.user_message(), status(408).user_message());
        assert_eq!(
            status(503).user_message(),
            "The service is temporarily unavailable."
        );
        assert_eq!(
            status(500).user_message(),
            "Something went wrong. Please try again."
        );
        assert_eq!(
            Error::Unsuccessful("nope".into()).user_message(),
            "Something went wrong. Please try again."
        );
    }

    #[test]
    fn urls_escape_segments() {
        let client = Client::new(
            "http://localhost:5000/api/",
            DEFAULT_TIMEOUT,
            Session::default(),
        )
        .unwrap();
        assert_eq!(
            client
                .url(&["vq", "module", "Algebra Basics", "course", "Maths/1"])
                .as_str(),
            "http://localhost:5000/api/vq/module/Algebra%20Basics/course/Maths%2F1"
        );
    }
}
