use serde::{Deserialize, Serialize};

/// A stored account. `password` holds a credential digest, never plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password: String,
}

impl User {
    pub fn new(username: impl Into<String>, password_digest: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password_digest.into(),
        }
    }
}
