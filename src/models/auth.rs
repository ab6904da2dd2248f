use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// The only role tag with behavioural meaning on the client
pub const ADMIN_ROLE: &str = "ROLE_ADMIN";

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(rename = "type", default = "default_token_type")]
    pub token_type: String,
    pub username: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Authenticated identity held by the session store
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub roles: BTreeSet<String>,
    pub token: String,
}

impl Identity {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}

// Token stays out of logs.
impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("username", &self.username)
            .field("roles", &self.roles)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl From<LoginResponse> for Identity {
    fn from(response: LoginResponse) -> Self {
        Self {
            username: response.username,
            roles: response.roles,
            token: response.token,
        }
    }
}

/// User record persisted next to the raw token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUser {
    pub username: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl StoredUser {
    pub fn from_identity(identity: &Identity) -> Self {
        Self {
            username: identity.username.clone(),
            roles: identity.roles.clone(),
        }
    }

    pub fn into_identity(self, token: String) -> Identity {
        Identity {
            username: self.username,
            roles: self.roles,
            token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_parses_backend_shape() {
        let json = r#"{"token":"abc.def","type":"Bearer","username":"admin","roles":["ROLE_ADMIN","ROLE_USER"]}"#;
        let response: LoginResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.token_type, "Bearer");
        let identity = Identity::from(response);
        assert!(identity.is_admin());
        assert!(identity.has_role("ROLE_USER"));
    }

    #[test]
    fn test_regular_user_is_not_admin() {
        let identity = Identity {
            username: "user".to_string(),
            roles: BTreeSet::from(["ROLE_USER".to_string()]),
            token: "t".to_string(),
        };

        assert!(!identity.is_admin());
    }

    #[test]
    fn test_identity_debug_redacts_token() {
        let identity = Identity {
            username: "admin".to_string(),
            roles: BTreeSet::new(),
            token: "super-secret".to_string(),
        };

        let debug = format!("{identity:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("admin"));
    }

    #[test]
    fn test_stored_user_excludes_token() {
        let identity = Identity {
            username: "user".to_string(),
            roles: BTreeSet::from(["ROLE_USER".to_string()]),
            token: "tok".to_string(),
        };

        let json = serde_json::to_string(&StoredUser::from_identity(&identity)).unwrap();
        assert!(!json.contains("tok\""));

        let back: StoredUser = serde_json::from_str(&json).unwrap();
        assert_eq!(back.into_identity("tok".to_string()), identity);
    }
}
