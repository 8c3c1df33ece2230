// API layer: one endpoint carrying the named query/mutation contract.
// Requests are `{"operation": <name>, "variables": {...}}` envelopes;
// successful responses wrap the result under `data.<operation>` and
// failures surface through `AppError`.

use axum::{
    extract::State,
    http::HeaderMap,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::auth::{self, RequestContext};
use crate::error::{AppError, AppResult};
use crate::models::{AuthPayload, Page, PageView, Role, User, UserView};
use crate::pages::{self, PageCreateInput, PageUpdateInput};
use crate::store::Store;

#[derive(Debug, Deserialize)]
#[serde(
    tag = "operation",
    content = "variables",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum Operation {
    // Queries
    Me,
    Pages {
        #[serde(default)]
        parent_id: Option<String>,
    },
    Page {
        id: String,
    },
    SearchPages {
        q: String,
    },
    // Mutations
    Login {
        username: String,
        password: String,
    },
    Logout,
    CreatePage {
        input: PageCreateInput,
    },
    UpdatePage {
        id: String,
        input: PageUpdateInput,
    },
    DeletePage {
        id: String,
    },
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/graphql", post(dispatch))
        .route("/api/health", get(health))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "pageforest",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

async fn dispatch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(operation): Json<Operation>,
) -> AppResult<Json<Value>> {
    match operation {
        Operation::Me => {
            let inner = state.read().await;
            let ctx = RequestContext::from_headers(&headers, &inner);
            Ok(data("me", json!(ctx.user.as_ref().map(UserView::from))))
        }

        Operation::Pages { parent_id } => {
            let inner = state.read().await;
            let views: Vec<PageView> = inner
                .store
                .children_of(parent_id.as_deref())
                .into_iter()
                .map(|p| page_view(&inner.store, p))
                .collect();
            Ok(data("pages", json!(views)))
        }

        Operation::Page { id } => {
            let inner = state.read().await;
            let view = inner.store.page(&id).map(|p| page_view(&inner.store, p));
            Ok(data("page", json!(view)))
        }

        Operation::SearchPages { q } => {
            let inner = state.read().await;
            let views: Vec<PageView> = pages::search(&inner.store, &q)
                .into_iter()
                .map(|p| page_view(&inner.store, p))
                .collect();
            Ok(data("searchPages", json!(views)))
        }

        Operation::Login { username, password } => {
            let payload = login(&state, &username, &password).await?;
            Ok(data("login", json!(payload)))
        }

        Operation::Logout => {
            let mut inner = state.write().await;
            if let Some(token) = auth::bearer_token(&headers) {
                inner.sessions.revoke(&token);
            }
            Ok(data("logout", json!(true)))
        }

        Operation::CreatePage { input } => {
            let mut inner = state.write().await;
            let ctx = RequestContext::from_headers(&headers, &inner);
            let actor = auth::require_editor(&ctx)?.clone();
            let page = inner
                .store
                .mutate(|db| Ok(pages::create_page(db, input, &actor)))?;
            tracing::info!("created page {} ({})", page.slug, page.id);
            let view = page_view(&inner.store, &page);
            Ok(data("createPage", json!(view)))
        }

        Operation::UpdatePage { id, input } => {
            let mut inner = state.write().await;
            let ctx = RequestContext::from_headers(&headers, &inner);
            let actor = auth::require_editor(&ctx)?.clone();
            let page = inner
                .store
                .mutate(|db| pages::update_page(db, &id, input, &actor))?;
            tracing::info!("updated page {} ({})", page.slug, page.id);
            let view = page_view(&inner.store, &page);
            Ok(data("updatePage", json!(view)))
        }

        Operation::DeletePage { id } => {
            let mut inner = state.write().await;
            let ctx = RequestContext::from_headers(&headers, &inner);
            auth::require_editor(&ctx)?;
            // An unknown id is reported as false without touching the file.
            let deleted = if inner.store.page(&id).is_some() {
                inner.store.mutate(|db| Ok(pages::delete_page(db, &id)))?
            } else {
                false
            };
            if deleted {
                tracing::info!("deleted page subtree rooted at {}", id);
            }
            Ok(data("deletePage", json!(deleted)))
        }
    }
}

async fn login(state: &AppState, username: &str, password: &str) -> AppResult<AuthPayload> {
    let username = username.trim();
    let password = password.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AppError::InvalidInput(
            "username/password required".to_string(),
        ));
    }

    let mut inner = state.write().await;
    let user = match inner.store.user_by_username(username).cloned() {
        Some(user) => {
            if user.password != password {
                return Err(AppError::InvalidCredentials(
                    "invalid credentials".to_string(),
                ));
            }
            user
        }
        None => {
            // Demo behavior: the first login under an unknown username
            // provisions an editor account with those credentials.
            let (name, pass) = (username.to_string(), password.to_string());
            let user = inner.store.mutate(move |db| {
                let now = Utc::now();
                let user = User {
                    id: Uuid::new_v4().to_string(),
                    username: name,
                    password: pass,
                    role: Role::Editor,
                    email: None,
                    created_at: now,
                    updated_at: now,
                };
                db.users.push(user.clone());
                Ok(user)
            })?;
            tracing::info!("auto-provisioned editor account {}", user.username);
            user
        }
    };

    let token = inner.sessions.issue(&user.id);
    tracing::info!("login for {}", user.username);
    Ok(AuthPayload {
        token,
        user: UserView::from(&user),
    })
}

fn page_view(store: &Store, page: &Page) -> PageView {
    PageView {
        id: page.id.clone(),
        parent_id: page.parent_id.clone(),
        title: page.title.clone(),
        slug: page.slug.clone(),
        page_type: page.page_type,
        content: page.content.clone(),
        created_at: page.created_at,
        updated_at: page.updated_at,
        updated_by: store.user_by_id(&page.updated_by).map(UserView::from),
    }
}

fn data(operation: &str, value: Value) -> Json<Value> {
    let mut payload = serde_json::Map::new();
    payload.insert(operation.to_string(), value);
    Json(json!({ "data": payload }))
}
