// Request identity: bearer-token extraction plus the authentication and
// role gates used by the mutation surface.

use axum::http::{header, HeaderMap};

use crate::app_state::AppInner;
use crate::error::{AppError, AppResult};
use crate::models::User;

/// Identity attached to a single request. `user` is absent when the token
/// is missing, unknown, or bound to a deleted-from-under-us account.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub token: Option<String>,
    pub user: Option<User>,
}

impl RequestContext {
    pub fn from_headers(headers: &HeaderMap, inner: &AppInner) -> Self {
        let token = bearer_token(headers);
        let user = token
            .as_deref()
            .and_then(|t| inner.sessions.resolve(t))
            .and_then(|user_id| inner.store.user_by_id(user_id))
            .cloned();
        RequestContext { token, user }
    }
}

/// Pull the token out of `Authorization: Bearer <token>`. Scheme matching is
/// case-insensitive and surrounding whitespace is ignored.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

pub fn require_authenticated(ctx: &RequestContext) -> AppResult<&User> {
    ctx.user
        .as_ref()
        .ok_or_else(|| AppError::Unauthenticated("not authenticated".to_string()))
}

pub fn require_editor(ctx: &RequestContext) -> AppResult<&User> {
    let user = require_authenticated(ctx)?;
    if user.role.can_edit() {
        Ok(user)
    } else {
        Err(AppError::Forbidden("editor role required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::Utc;

    fn header_map(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    fn user(role: Role) -> User {
        let now = Utc::now();
        User {
            id: "u1".to_string(),
            username: "someone".to_string(),
            password: "pw".to_string(),
            role,
            email: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(
            bearer_token(&header_map("Bearer abc123")),
            Some("abc123".to_string())
        );
        assert_eq!(
            bearer_token(&header_map("bearer abc123")),
            Some("abc123".to_string())
        );
        assert_eq!(
            bearer_token(&header_map("  Bearer   abc123  ")),
            Some("abc123".to_string())
        );
        assert_eq!(bearer_token(&header_map("Basic abc123")), None);
        assert_eq!(bearer_token(&header_map("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_require_authenticated() {
        let anonymous = RequestContext {
            token: None,
            user: None,
        };
        assert!(matches!(
            require_authenticated(&anonymous),
            Err(AppError::Unauthenticated(_))
        ));

        let authed = RequestContext {
            token: Some("t".to_string()),
            user: Some(user(Role::Editor)),
        };
        assert_eq!(require_authenticated(&authed).unwrap().id, "u1");
    }

    #[test]
    fn test_require_editor_accepts_both_roles() {
        for role in [Role::Editor, Role::Admin] {
            let ctx = RequestContext {
                token: Some("t".to_string()),
                user: Some(user(role)),
            };
            assert!(require_editor(&ctx).is_ok());
        }
    }
}
