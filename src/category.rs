//! Category tags.
//!
//! Four defaults are always present after load; custom categories are appended
//! behind them. Tasks refer to categories by id only, so deleting a category
//! goes through `delete_category_cascading` to sweep the dangling references.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::db::TaskStore;
use crate::error::{Error, Result};
use crate::storage::{KeyValueStore, CATEGORIES_KEY};

pub const FALLBACK_COLOR: &str = "#6b7280";

pub const CUSTOM_PALETTE: [&str; 10] = [
    "#dc2626", "#0ea5e9", "#16a34a", "#f97316", "#6366f1",
    "#0891b2", "#84cc16", "#f59e0b", "#f472b6", "#facc15",
];

const DEFAULTS: [(&str, &str); 4] = [
    ("work", "#2563eb"),
    ("personal", "#059669"),
    ("errands", "#d97706"),
    ("learning", "#9333ea"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub label: String,
    pub color: String,
    pub is_default: bool,
    pub is_custom: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl Category {
    /// The built-in categories, in display order.
    pub fn default_set() -> Vec<Category> {
        DEFAULTS
            .iter()
            .map(|(label, color)| Category {
                id: format!("category-{label}"),
                label: label.to_string(),
                color: color.to_string(),
                is_default: true,
                is_custom: false,
                created_at: None,
            })
            .collect()
    }

    /// Coerce one stored entry. Entries without a usable label are dropped.
    fn normalize(value: &Value) -> Option<Category> {
        let obj = value.as_object()?;
        let label = normalize_label(obj.get("label")?.as_str()?)?;
        let id = obj
            .get("id")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("category-{label}"));
        let color = obj
            .get("color")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(FALLBACK_COLOR)
            .to_string();
        let flag = |key: &str| obj.get(key).and_then(Value::as_bool).unwrap_or(false);
        let created_at = obj
            .get("createdAt")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Some(Category {
            id,
            label,
            color,
            is_default: flag("isDefault"),
            is_custom: flag("isCustom"),
            created_at,
        })
    }
}

/// Trimmed, lowercased label, or `None` if nothing is left.
pub fn normalize_label(raw: &str) -> Option<String> {
    let label = raw.trim().to_lowercase();
    if label.is_empty() {
        None
    } else {
        Some(label)
    }
}

pub struct CategoryStore<S: KeyValueStore> {
    categories: Vec<Category>,
    store: S,
}

impl<S: KeyValueStore> CategoryStore<S> {
    /// Defaults first, then every stored entry whose id and label are both new.
    pub fn load(store: S) -> Self {
        let mut categories = Category::default_set();
        let stored: Vec<Value> = match store.get(CATEGORIES_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(Value::Array(items)) => items,
                Ok(_) => {
                    tracing::warn!("categories record is not an array, using defaults");
                    Vec::new()
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to parse categories, using defaults");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read categories, using defaults");
                Vec::new()
            }
        };

        let mut seen_ids: HashSet<String> = categories.iter().map(|c| c.id.clone()).collect();
        let mut seen_labels: HashSet<String> = categories.iter().map(|c| c.label.clone()).collect();
        for item in &stored {
            let Some(category) = Category::normalize(item) else {
                continue;
            };
            if seen_ids.contains(&category.id) || seen_labels.contains(&category.label) {
                continue;
            }
            seen_ids.insert(category.id.clone());
            seen_labels.insert(category.label.clone());
            categories.push(category);
        }
        tracing::debug!(count = categories.len(), "categories loaded");
        CategoryStore { categories, store }
    }

    pub fn all(&self) -> &[Category] {
        &self.categories
    }

    pub fn get(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Find by id, then by label.
    pub fn resolve(&self, query: &str) -> Result<&Category> {
        let query = query.trim();
        if let Some(category) = self.get(query) {
            return Ok(category);
        }
        let label = normalize_label(query).unwrap_or_default();
        self.categories
            .iter()
            .find(|c| c.label == label)
            .ok_or_else(|| Error::CategoryNotFound(query.to_string()))
    }

    fn persist(&mut self) {
        let data = match serde_json::to_string(&self.categories) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize categories");
                return;
            }
        };
        if let Err(e) = self.store.set(CATEGORIES_KEY, &data) {
            tracing::warn!(error = %e, "failed to persist categories");
        }
    }

    /// Add a custom category, or return the existing one with the same label.
    pub fn add(&mut self, raw_label: &str) -> Option<Category> {
        let label = normalize_label(raw_label)?;
        if let Some(existing) = self.categories.iter().find(|c| c.label == label) {
            return Some(existing.clone());
        }
        let custom_count = self.categories.iter().filter(|c| !c.is_default).count();
        let category = Category {
            id: Uuid::new_v4().to_string(),
            label,
            color: CUSTOM_PALETTE[custom_count % CUSTOM_PALETTE.len()].to_string(),
            is_default: false,
            is_custom: true,
            created_at: Some(Utc::now()),
        };
        tracing::info!(id = %category.id, label = %category.label, "category added");
        self.categories.push(category.clone());
        self.persist();
        Some(category)
    }

    /// Remove a category from the list. Task references are not touched.
    pub fn remove(&mut self, id: &str) -> Option<Category> {
        let idx = self.categories.iter().position(|c| c.id == id)?;
        let removed = self.categories.remove(idx);
        tracing::info!(id, label = %removed.label, "category removed");
        self.persist();
        Some(removed)
    }
}

/// Delete a category and strip it from every task, active and archived.
/// Returns the removed category and how many tasks referenced it.
pub fn delete_category_cascading<C, T>(
    categories: &mut CategoryStore<C>,
    tasks: &mut TaskStore<T>,
    id: &str,
) -> Option<(Category, usize)>
where
    C: KeyValueStore,
    T: KeyValueStore,
{
    let removed = categories.remove(id)?;
    let touched = tasks.unassign_category(&removed.id);
    Some((removed, touched))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::task::TaskDraft;

    fn labels<S: KeyValueStore>(store: &CategoryStore<S>) -> Vec<&str> {
        store.all().iter().map(|c| c.label.as_str()).collect()
    }

    #[test]
    fn test_defaults_seeded() {
        let store = CategoryStore::load(MemoryStore::new());
        assert_eq!(labels(&store), vec!["work", "personal", "errands", "learning"]);
        assert!(store.all().iter().all(|c| c.is_default && !c.is_custom));
        assert_eq!(store.get("category-errands").unwrap().color, "#d97706");
    }

    #[test]
    fn test_load_normalizes_and_dedupes() {
        let raw = r##"[
            {"id": "category-work", "label": "Work", "color": "#000000"},
            {"label": "  Reading  ", "color": ""},
            {"id": "x1", "label": "reading"},
            {"id": "category-reading", "label": "other"},
            {"id": "x2", "label": "   "},
            {"id": "x3", "label": "Gym", "color": "#123456", "isCustom": true,
             "createdAt": "2025-01-02T03:04:05Z"},
            "garbage"
        ]"##;
        let store = CategoryStore::load(MemoryStore::new().with_record(CATEGORIES_KEY, raw));
        assert_eq!(labels(&store), vec!["work", "personal", "errands", "learning", "reading", "gym"]);

        let reading = store.resolve("reading").unwrap();
        assert_eq!(reading.id, "category-reading");
        assert_eq!(reading.color, FALLBACK_COLOR);

        let gym = store.get("x3").unwrap();
        assert!(gym.is_custom);
        assert!(gym.created_at.is_some());
        assert_eq!(store.get("category-work").unwrap().color, "#2563eb");
    }

    #[test]
    fn test_malformed_record_falls_back_to_defaults() {
        let store = CategoryStore::load(MemoryStore::new().with_record(CATEGORIES_KEY, "{oops"));
        assert_eq!(store.all().len(), 4);
        let store = CategoryStore::load(MemoryStore::new().with_record(CATEGORIES_KEY, "{}"));
        assert_eq!(store.all().len(), 4);
    }

    #[test]
    fn test_add_assigns_palette_colors() {
        let mut store = CategoryStore::load(MemoryStore::new());
        let first = store.add("  Garden ").unwrap();
        assert_eq!(first.label, "garden");
        assert_eq!(first.color, CUSTOM_PALETTE[0]);
        assert!(first.is_custom && !first.is_default);
        assert!(first.created_at.is_some());

        let second = store.add("music").unwrap();
        assert_eq!(second.color, CUSTOM_PALETTE[1]);

        let again = store.add("GARDEN").unwrap();
        assert_eq!(again.id, first.id);
        assert_eq!(store.all().len(), 6);
        assert!(store.add("   ").is_none());
    }

    #[test]
    fn test_added_categories_persist() {
        let mut store = CategoryStore::load(MemoryStore::new());
        let added = store.add("garden").unwrap();
        let raw = store.store.get(CATEGORIES_KEY).unwrap().expect("written");

        let reloaded = CategoryStore::load(MemoryStore::new().with_record(CATEGORIES_KEY, &raw));
        assert_eq!(reloaded.get(&added.id), Some(&added));
        assert_eq!(reloaded.all().len(), 5);
    }

    #[test]
    fn test_resolve() {
        let store = CategoryStore::load(MemoryStore::new());
        assert_eq!(store.resolve("category-work").unwrap().label, "work");
        assert_eq!(store.resolve("Personal").unwrap().id, "category-personal");
        assert!(matches!(store.resolve("nope"), Err(Error::CategoryNotFound(_))));
    }

    #[test]
    fn test_delete_category_cascading() {
        let mut categories = CategoryStore::load(MemoryStore::new());
        let mut tasks = TaskStore::load(MemoryStore::new());
        let garden = categories.add("garden").unwrap();
        let work = categories.get("category-work").cloned().unwrap();

        let a = tasks.create(TaskDraft { title: "a".into(), ..Default::default() }).unwrap();
        let b = tasks.create(TaskDraft { title: "b".into(), ..Default::default() }).unwrap();
        tasks.assign_category(&a, &garden);
        tasks.assign_category(&a, &work);
        tasks.assign_category(&b, &garden);

        let (removed, touched) = delete_category_cascading(&mut categories, &mut tasks, &garden.id).unwrap();
        assert_eq!(removed.id, garden.id);
        assert_eq!(touched, 2);
        assert!(categories.get(&garden.id).is_none());
        assert_eq!(tasks.get(&a).unwrap().categories, vec![work.id.clone()]);
        assert!(tasks.get(&b).unwrap().categories.is_empty());

        assert!(delete_category_cascading(&mut categories, &mut tasks, &garden.id).is_none());
    }
}
