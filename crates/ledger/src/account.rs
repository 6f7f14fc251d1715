//! User accounts.
//!
//! Authentication is a plaintext comparison against a locally stored
//! account list. This is deliberate: the account model mirrors the
//! consumed contract and is not a security boundary.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::SessionToken;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: String,
    pub username: String,
    pub password: String,
    pub role: Role,
    /// Token of the browser/process context that last logged in.
    ///
    /// At most one value is "valid" per account at a time, enforced only
    /// by last-writer-wins overwrite (see [`crate::session`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_session_id: Option<SessionToken>,
}

impl UserAccount {
    /// The account every fresh installation starts with.
    pub fn default_admin(username: &str, password: &str) -> Self {
        Self {
            id: "admin-0".to_string(),
            username: username.to_string(),
            password: password.to_string(),
            role: Role::Admin,
            active_session_id: None,
        }
    }

    pub fn new(username: &str, password: &str, role: Role) -> Self {
        Self {
            id: format!("user-{}", Uuid::new_v4().simple()),
            username: username.to_string(),
            password: password.to_string(),
            role,
            active_session_id: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Plaintext credential check. Returns the index of the matching account.
///
/// No lockout, no throttling, no hashing: wrong credentials are surfaced
/// inline and nothing else changes.
pub fn find_by_credentials(
    accounts: &[UserAccount],
    username: &str,
    password: &str,
) -> Option<usize> {
    accounts
        .iter()
        .position(|account| account.username == username && account.password == password)
}

pub fn find_by_id<'a>(accounts: &'a [UserAccount], id: &str) -> Option<&'a UserAccount> {
    accounts.iter().find(|account| account.id == id)
}
