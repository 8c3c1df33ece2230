// Domain models and wire views for the page-forest store.
// Persisted shapes use camelCase keys so the backing document matches the
// API field names exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Roles authorized to mutate the page forest. Admin differs from Editor
/// only in being the seeded bootstrap account's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Editor,
    Admin,
}

impl Role {
    pub fn can_edit(&self) -> bool {
        matches!(self, Role::Editor | Role::Admin)
    }
}

/// Page kinds understood by the frontend. `Doc` is the internal default for
/// untyped creations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    Page,
    Api,
    Sql,
    Corezoid,
    Bitrix,
    #[serde(rename = "DOC")]
    Doc,
}

impl Default for PageType {
    fn default() -> Self {
        PageType::Doc
    }
}

/// A stored account. Accounts are never deleted; the plaintext password is
/// demo-grade by design and is stripped from every wire view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub password: String,
    pub role: Role,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A node in the document forest. `parent_id = None` marks a root page.
/// `updated_by` stores the writer's user id; the API resolves it to a
/// `UserView` on the way out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub parent_id: Option<String>,
    pub title: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub page_type: PageType,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

/// Password-free projection of a `User` for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub email: Option<String>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        UserView {
            id: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            email: user.email.clone(),
        }
    }
}

/// A `Page` as returned by the API, with `updated_by` resolved to the
/// writing user (or null if that account is unknown).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub id: String,
    pub parent_id: Option<String>,
    pub title: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub page_type: PageType,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<UserView>,
}

/// Successful login payload: an opaque session token plus the account.
#[derive(Debug, Clone, Serialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: UserView,
}
