// Durable store: one JSON document holding the user and page collections,
// mirrored in memory and rewritten in full after every mutation.
//
// Mutations run against a clone of the mirror and the clone is flushed
// before it is swapped in, so a failed flush leaves the mirror at the last
// durable state instead of reporting success for data that never landed.

use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Page, Role, User};

/// In-memory mirror of the backing document. Pages are keyed by id for O(1)
/// resolution; the persisted shape stays a flat array.
#[derive(Debug, Clone, Default)]
pub struct DbData {
    pub users: Vec<User>,
    pub pages: HashMap<String, Page>,
}

/// On-disk shape of the backing document: two named, order-irrelevant
/// collections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedDb {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    pages: Vec<Page>,
}

impl From<PersistedDb> for DbData {
    fn from(persisted: PersistedDb) -> Self {
        DbData {
            users: persisted.users,
            pages: persisted
                .pages
                .into_iter()
                .map(|p| (p.id.clone(), p))
                .collect(),
        }
    }
}

impl From<&DbData> for PersistedDb {
    fn from(data: &DbData) -> Self {
        let mut pages: Vec<Page> = data.pages.values().cloned().collect();
        // Stable output so rewrites of unchanged state are byte-identical.
        pages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        PersistedDb {
            users: data.users.clone(),
            pages,
        }
    }
}

pub struct Store {
    path: PathBuf,
    data: DbData,
    /// parent_id -> child ids, `None` bucket holding the roots. Rebuilt after
    /// every mutation; never persisted.
    children: HashMap<Option<String>, Vec<String>>,
}

impl Store {
    /// Load the backing document, creating the parent directory and an empty
    /// document as needed, and seed the bootstrap admin account when the
    /// user collection is empty. Any failure here is fatal to startup.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("creating data directory {}", dir.display()))?;
            }
        }

        let mut data = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading database file {}", path.display()))?;
            if raw.trim().is_empty() {
                DbData::default()
            } else {
                let persisted: PersistedDb = serde_json::from_str(&raw)
                    .with_context(|| format!("parsing database file {}", path.display()))?;
                DbData::from(persisted)
            }
        } else {
            DbData::default()
        };

        if data.users.is_empty() {
            let now = Utc::now();
            data.users.push(User {
                id: Uuid::new_v4().to_string(),
                username: "admin".to_string(),
                password: "admin".to_string(), // demo only
                role: Role::Admin,
                email: Some("admin@example.com".to_string()),
                created_at: now,
                updated_at: now,
            });
            tracing::info!("seeded default admin account");
        }

        let mut store = Store {
            path,
            data,
            children: HashMap::new(),
        };
        // Rewrite at startup so a missing or freshly-seeded document exists
        // on disk before the first request.
        store
            .flush(&store.data)
            .context("writing initial database file")?;
        store.rebuild_children();
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn users(&self) -> &[User] {
        &self.data.users
    }

    pub fn user_by_id(&self, id: &str) -> Option<&User> {
        self.data.users.iter().find(|u| u.id == id)
    }

    pub fn user_by_username(&self, username: &str) -> Option<&User> {
        self.data.users.iter().find(|u| u.username == username)
    }

    pub fn page(&self, id: &str) -> Option<&Page> {
        self.data.pages.get(id)
    }

    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.data.pages.values()
    }

    /// Direct children of `parent_id`, roots when `None`, in creation order.
    pub fn children_of(&self, parent_id: Option<&str>) -> Vec<&Page> {
        let key = parent_id.map(str::to_string);
        self.children
            .get(&key)
            .map(|ids| ids.iter().filter_map(|id| self.data.pages.get(id)).collect())
            .unwrap_or_default()
    }

    /// Apply a mutation and make it durable as one unit: clone the mirror,
    /// run `f` on the clone, flush the clone, then swap it in and rebuild
    /// the children index. Returns without touching the mirror when either
    /// `f` or the flush fails.
    pub fn mutate<T>(&mut self, f: impl FnOnce(&mut DbData) -> AppResult<T>) -> AppResult<T> {
        let mut next = self.data.clone();
        let out = f(&mut next)?;
        self.flush(&next)
            .map_err(|err| AppError::Storage(format!("{:#}", err)))?;
        self.data = next;
        self.rebuild_children();
        Ok(out)
    }

    fn flush(&self, data: &DbData) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&PersistedDb::from(data))
            .context("serializing database document")?;
        // Write-then-rename so the document can never be left half-written.
        let mut tmp_name = self.path.as_os_str().to_os_string();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);
        fs::write(&tmp, json)
            .with_context(|| format!("writing database file {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing database file {}", self.path.display()))?;
        Ok(())
    }

    fn rebuild_children(&mut self) {
        let mut ordered: Vec<&Page> = self.data.pages.values().collect();
        ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        let mut index: HashMap<Option<String>, Vec<String>> = HashMap::new();
        for page in ordered {
            index
                .entry(page.parent_id.clone())
                .or_default()
                .push(page.id.clone());
        }
        self.children = index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageType;
    use tempfile::tempdir;

    fn sample_page(id: &str, parent_id: Option<&str>) -> Page {
        let now = Utc::now();
        Page {
            id: id.to_string(),
            parent_id: parent_id.map(str::to_string),
            title: format!("Page {}", id),
            slug: format!("page-{}", id),
            page_type: PageType::Doc,
            content: String::new(),
            created_at: now,
            updated_at: now,
            updated_by: "tester".to_string(),
        }
    }

    #[test]
    fn test_open_creates_document_and_seeds_admin() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("db.json");

        let store = Store::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.users().len(), 1);

        let admin = store.user_by_username("admin").unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.password, "admin");

        // The seeded document must already be on disk.
        let raw = fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["users"].as_array().unwrap().len(), 1);
        assert_eq!(parsed["pages"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_mutation_survives_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");

        let mut store = Store::open(&path).unwrap();
        store
            .mutate(|data| {
                let page = sample_page("p1", None);
                data.pages.insert(page.id.clone(), page);
                Ok(())
            })
            .unwrap();
        drop(store);

        let reloaded = Store::open(&path).unwrap();
        assert!(reloaded.page("p1").is_some());
        // Admin is seeded only once.
        assert_eq!(reloaded.users().len(), 1);
    }

    #[test]
    fn test_failed_closure_leaves_mirror_untouched() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path().join("db.json")).unwrap();

        let result: AppResult<()> = store.mutate(|data| {
            let page = sample_page("p1", None);
            data.pages.insert(page.id.clone(), page);
            Err(AppError::InvalidInput("rejected".to_string()))
        });
        assert!(result.is_err());
        assert!(store.page("p1").is_none());
    }

    #[test]
    fn test_failed_flush_rolls_back() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let mut store = Store::open(data_dir.join("db.json")).unwrap();

        // Removing the directory makes the flush fail while the mirror
        // mutation itself would succeed.
        fs::remove_dir_all(&data_dir).unwrap();
        let result = store.mutate(|data| {
            let page = sample_page("p1", None);
            data.pages.insert(page.id.clone(), page);
            Ok(())
        });

        assert!(matches!(result, Err(AppError::Storage(_))));
        assert!(store.page("p1").is_none());
    }

    #[test]
    fn test_children_index_tracks_mutations() {
        let dir = tempdir().unwrap();
        let mut store = Store::open(dir.path().join("db.json")).unwrap();

        store
            .mutate(|data| {
                for page in [
                    sample_page("root", None),
                    sample_page("a", Some("root")),
                    sample_page("b", Some("root")),
                ] {
                    data.pages.insert(page.id.clone(), page);
                }
                Ok(())
            })
            .unwrap();

        let roots = store.children_of(None);
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].id, "root");

        let kids: Vec<&str> = store
            .children_of(Some("root"))
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(kids.len(), 2);
        assert!(kids.contains(&"a") && kids.contains(&"b"));

        store
            .mutate(|data| {
                data.pages.remove("b");
                Ok(())
            })
            .unwrap();
        assert_eq!(store.children_of(Some("root")).len(), 1);
    }

    #[test]
    fn test_no_tmp_file_left_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        let mut store = Store::open(&path).unwrap();
        store
            .mutate(|data| {
                let page = sample_page("p1", None);
                data.pages.insert(page.id.clone(), page);
                Ok(())
            })
            .unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("db.json")]);
    }
}
