//! Logging in, and the session state attached to every request
use log::info;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::{tenant::DEFAULT_TENANT, Client, Result};

/// Information used to login
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: Password,
}

/// What the signed-in user is allowed to do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    #[serde(alias = "student", alias = "user")]
    Learner,
    #[serde(alias = "teacher")]
    Instructor,
    Admin,
}

impl Role {
    /// Whether this role sees the "Create Quiz" affordance
    pub fn can_author_quizzes(self) -> bool {
        matches!(self, Role::Instructor | Role::Admin)
    }
}

/// Who we are talking to the API as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: Option<String>,
    pub tenant_id: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub user_name: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            token: None,
            tenant_id: DEFAULT_TENANT.to_string(),
            role: Role::default(),
            user_name: None,
        }
    }
}

impl Session {
    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }
}

#[derive(Serialize)]
struct LoginReq<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResp {
    token: String,
    user: LoginUser,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginUser {
    #[serde(default)]
    role: Role,
    tenant_id: Option<String>,
    #[serde(alias = "username")]
    name: Option<String>,
}

/// Some deployments wrap the login response in the usual envelope, some don't.
#[derive(Deserialize)]
#[serde(untagged)]
enum LoginBody {
    Wrapped { data: LoginResp },
    Bare(LoginResp),
}

impl Client {
    /// Log in, replacing the current session on success
    pub fn login(&self, creds: &Credentials) -> Result<Session> {
        let segments = ["auth", "login"];
        let req = self.request(Method::POST, &segments).json(&LoginReq {
            email: &creds.email,
            password: creds.password.as_ref(),
        });
        let resp = match crate::decode::<LoginBody>(self.execute(&segments, req)?)? {
            LoginBody::Wrapped { data } => data,
            LoginBody::Bare(r) => r,
        };

        let session = Session {
            token: Some(resp.token),
            tenant_id: resp
                .user
                .tenant_id
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TENANT.to_string()),
            role: resp.user.role,
            user_name: resp.user.name,
        };
        info!(
            "logged in as {:?} ({:?}, tenant {})",
            session.user_name, session.role, session.tenant_id
        );
        self.set_session(session.clone());

        Ok(session)
    }
}

/// A password, wrapped so we don't print it by accident
#[derive(Clone, Default)]
pub struct Password(String);
impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Password (******)")
    }
}

impl From<String> for Password {
    fn from(value: String) -> Self {
        Password(value)
    }
}

impl AsRef<str> for Password {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}
