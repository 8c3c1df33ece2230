// Page tree service: CRUD, recursive delete, and substring search over the
// page forest. Role gating happens at the API layer; these functions only
// assume the actor has already been authorized.

use chrono::Utc;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Page, PageType, User};
use crate::slug::{random_slug, slugify};
use crate::store::{DbData, Store};

/// Tri-state patch field: distinguishes a field that was absent from the
/// input (leave untouched) from an explicit null (clear) and an explicit
/// value. A plain `Option` cannot carry that distinction.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    Missing,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Missing
    }
}

// `#[serde(default)]` supplies `Missing` for absent fields; a present field
// deserializes through `Option` into `Null` or `Value`.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(|opt| match opt {
            Some(value) => Patch::Value(value),
            None => Patch::Null,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCreateInput {
    #[serde(default)]
    pub parent_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, rename = "type")]
    pub page_type: Option<PageType>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageUpdateInput {
    #[serde(default)]
    pub parent_id: Patch<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, rename = "type")]
    pub page_type: Option<PageType>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Create a page. Slug resolution order: explicit slug (normalized), then
/// normalized title, then a random identifier when both normalize to empty.
pub fn create_page(data: &mut DbData, input: PageCreateInput, actor: &User) -> Page {
    let now = Utc::now();
    let slug = input
        .slug
        .as_deref()
        .map(slugify)
        .filter(|s| !s.is_empty())
        .or_else(|| Some(slugify(&input.title)).filter(|s| !s.is_empty()))
        .unwrap_or_else(random_slug);

    let page = Page {
        id: Uuid::new_v4().to_string(),
        parent_id: input.parent_id,
        title: input.title,
        slug,
        page_type: input.page_type.unwrap_or_default(),
        content: input.content.unwrap_or_default(),
        created_at: now,
        updated_at: now,
        updated_by: actor.id.clone(),
    };
    data.pages.insert(page.id.clone(), page.clone());
    page
}

/// Field-level patch. Absent fields stay untouched; an explicit null
/// `parentId` moves the page to the root; a provided slug whose
/// normalization is empty keeps the previous slug (silent ignore).
/// `updated_at`/`updated_by` are refreshed on every call, changed fields or
/// not.
pub fn update_page(
    data: &mut DbData,
    id: &str,
    input: PageUpdateInput,
    actor: &User,
) -> AppResult<Page> {
    let page = data
        .pages
        .get_mut(id)
        .ok_or_else(|| AppError::NotFound(format!("page {} not found", id)))?;

    match input.parent_id {
        Patch::Missing => {}
        Patch::Null => page.parent_id = None,
        Patch::Value(parent_id) => page.parent_id = Some(parent_id),
    }
    if let Some(title) = input.title {
        page.title = title;
    }
    if let Some(slug) = input.slug {
        let normalized = slugify(&slug);
        if !normalized.is_empty() {
            page.slug = normalized;
        }
    }
    if let Some(page_type) = input.page_type {
        page.page_type = page_type;
    }
    if let Some(content) = input.content {
        page.content = content;
    }

    page.updated_at = Utc::now();
    page.updated_by = actor.id.clone();
    Ok(page.clone())
}

/// Remove a page and its full descendant subtree. Returns `false` (not an
/// error) when the id does not resolve. A one-shot parent index keeps the
/// subtree walk from scanning the collection per node.
pub fn delete_page(data: &mut DbData, id: &str) -> bool {
    if !data.pages.contains_key(id) {
        return false;
    }

    let mut by_parent: HashMap<&str, Vec<&str>> = HashMap::new();
    for page in data.pages.values() {
        if let Some(parent_id) = page.parent_id.as_deref() {
            by_parent.entry(parent_id).or_default().push(page.id.as_str());
        }
    }

    let mut doomed: Vec<String> = Vec::new();
    let mut stack = vec![id];
    while let Some(current) = stack.pop() {
        if let Some(kids) = by_parent.get(current) {
            stack.extend(kids.iter().copied());
        }
        doomed.push(current.to_string());
    }

    for page_id in &doomed {
        data.pages.remove(page_id);
    }
    true
}

/// Case-insensitive substring search over title, slug, and content. A
/// blank query matches nothing, not everything.
pub fn search<'a>(store: &'a Store, query: &str) -> Vec<&'a Page> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    store
        .pages()
        .filter(|p| {
            p.title.to_lowercase().contains(&needle)
                || p.slug.to_lowercase().contains(&needle)
                || p.content.to_lowercase().contains(&needle)
        })
        .collect()
}
