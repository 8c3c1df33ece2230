// Ephemeral session table: opaque token -> user id. Tokens live for the
// process lifetime; a user may hold any number of concurrent tokens.

use rand::{distr::Alphanumeric, Rng};
use std::collections::HashMap;

const TOKEN_LEN: usize = 32;

#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: HashMap<String, String>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token bound to `user_id`. Existing tokens for the same
    /// user stay valid.
    pub fn issue(&mut self, user_id: &str) -> String {
        let token: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        self.sessions.insert(token.clone(), user_id.to_string());
        token
    }

    /// Drop exactly this token. No-op when the token is unknown.
    pub fn revoke(&mut self, token: &str) {
        self.sessions.remove(token);
    }

    /// Resolve a token to the bound user id.
    pub fn resolve(&self, token: &str) -> Option<&str> {
        self.sessions.get(token).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_resolve() {
        let mut sessions = SessionManager::new();
        let token = sessions.issue("user-1");
        assert_eq!(token.len(), TOKEN_LEN);
        assert_eq!(sessions.resolve(&token), Some("user-1"));
        assert_eq!(sessions.resolve("unknown"), None);
    }

    #[test]
    fn test_concurrent_tokens_per_user() {
        let mut sessions = SessionManager::new();
        let a = sessions.issue("user-1");
        let b = sessions.issue("user-1");
        assert_ne!(a, b);
        assert_eq!(sessions.resolve(&a), Some("user-1"));
        assert_eq!(sessions.resolve(&b), Some("user-1"));
    }

    #[test]
    fn test_revoke_is_scoped_and_idempotent() {
        let mut sessions = SessionManager::new();
        let a = sessions.issue("user-1");
        let b = sessions.issue("user-2");
        sessions.revoke(&a);
        sessions.revoke(&a); // absent token is a no-op
        assert_eq!(sessions.resolve(&a), None);
        assert_eq!(sessions.resolve(&b), Some("user-2"));
    }
}
