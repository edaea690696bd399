//! Authentication collaborator
//!
//! Resolves a bearer session token to the signed-in user. The identity
//! provider itself lives outside this service; sessions are seeded from
//! configuration.

pub mod memory;

pub use memory::MemorySessionStore;

use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn current_user(&self, token: &str) -> Result<Option<User>>;
    async fn update_name(&self, user_id: &str, name: &str) -> Result<User>;
}

/// Parse `token=userId:name:email` entries separated by commas.
///
/// `name` and `email` may be empty.
pub fn parse_session_tokens(raw: &str) -> Result<Vec<(String, User)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (token, identity) = entry
                .split_once('=')
                .ok_or_else(|| Error::Config(format!("Invalid session entry '{}'", entry)))?;

            let mut fields = identity.splitn(3, ':').map(str::trim);
            let id = fields
                .next()
                .filter(|id| !id.is_empty())
                .ok_or_else(|| Error::Config(format!("Missing user id in '{}'", entry)))?;
            let optional = |value: Option<&str>| {
                value.filter(|v| !v.is_empty()).map(str::to_string)
            };
            let name = optional(fields.next());
            let email = optional(fields.next());

            Ok((
                token.trim().to_string(),
                User {
                    id: id.to_string(),
                    name,
                    email,
                    image: None,
                },
            ))
        })
        .collect()
}
