use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::config::schema::{Role, TokenEntry};

/// The in-memory bearer-token table (§4.8, §5: "the in-memory token store
/// is guarded by a reader-writer lock"). Handlers take a read lock; admin
/// mutations take a write lock.
#[derive(Debug, Default)]
pub struct TokenStore {
    tokens: HashMap<String, Role>,
}

impl TokenStore {
    pub fn from_entries(entries: &[TokenEntry]) -> Self {
        let tokens = entries
            .iter()
            .map(|entry| (entry.token.clone(), entry.role))
            .collect();
        Self { tokens }
    }

    pub fn role_for(&self, token: &str) -> Option<Role> {
        self.tokens.get(token).copied()
    }

    pub fn insert(&mut self, token: String, role: Role) {
        self.tokens.insert(token, role);
    }

    pub fn revoke(&mut self, token: &str) -> bool {
        self.tokens.remove(token).is_some()
    }
}

pub type SharedTokenStore = Arc<RwLock<TokenStore>>;

pub fn shared(entries: &[TokenEntry]) -> SharedTokenStore {
    Arc::new(RwLock::new(TokenStore::from_entries(entries)))
}
