// Authenticator Port
// Answers HTTP authentication challenges when no password is configured

use crate::port::ServerEntity;

/// User name and password pair
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

pub trait Authenticator: Send + Sync {
    /// Credentials for a challenge from `server`, `None` declines
    fn credentials(&self, server: &dyn ServerEntity) -> Option<Credentials>;
}

/// Authenticator returning fixed credentials
pub struct StaticAuthenticator {
    credentials: Credentials,
}

impl StaticAuthenticator {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credentials: Credentials {
                user: user.into(),
                password: password.into(),
            },
        }
    }
}

impl Authenticator for StaticAuthenticator {
    fn credentials(&self, _server: &dyn ServerEntity) -> Option<Credentials> {
        Some(self.credentials.clone())
    }
}
