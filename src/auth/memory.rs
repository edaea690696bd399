use super::{SessionStore, User};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Session tokens and users held in process memory.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<Mutex<HashMap<String, String>>>,
    users: Arc<Mutex<HashMap<String, User>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(self, token: &str, user: User) -> Self {
        self.sessions
            .lock()
            .unwrap()
            .insert(token.to_string(), user.id.clone());
        self.users.lock().unwrap().insert(user.id.clone(), user);
        self
    }

    pub fn from_sessions(sessions: Vec<(String, User)>) -> Self {
        sessions
            .into_iter()
            .fold(Self::new(), |store, (token, user)| {
                store.with_session(&token, user)
            })
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn current_user(&self, token: &str) -> Result<Option<User>> {
        let user_id = match self.sessions.lock().unwrap().get(token) {
            Some(id) => id.clone(),
            None => return Ok(None),
        };
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }

    async fn update_name(&self, user_id: &str, name: &str) -> Result<User> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| Error::NotFound(format!("User {} not found", user_id)))?;
        user.name = Some(name.to_string());
        Ok(user.clone())
    }
}
