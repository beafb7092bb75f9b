//! Client-side filtering of loaded content.
//!
//! Static assets and built-in defaults ignore query filters, so pages narrow
//! them locally with the same criteria the backend would have applied.

use std::collections::BTreeMap;

use crate::models::{Content, ContentItem, ContentQuery};
use crate::utils::contains_ci;

/// Criteria applied to a loaded collection. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentFilter {
    pub category: Option<String>,
    pub search: Option<String>,
    pub career: Option<String>,
    pub difficulty: Option<String>,
    pub platform: Option<String>,
    pub limit: Option<usize>,
}

impl ContentFilter {
    /// Build from a filter map. Blank values and `"all"` leave a criterion unset.
    pub fn from_filters(filters: &BTreeMap<String, String>) -> Self {
        let get = |key: &str| {
            filters
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
                .map(str::to_string)
        };

        Self {
            category: get("category"),
            search: get("search"),
            career: get("career"),
            difficulty: get("difficulty"),
            platform: get("platform"),
            limit: get("limit").and_then(|v| v.parse().ok()),
        }
    }

    pub fn from_query(query: &ContentQuery) -> Self {
        Self::from_filters(&query.filters)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether a single item satisfies every set criterion.
    pub fn matches<T: Content>(&self, item: &T) -> bool {
        if let Some(category) = &self.category {
            if !item.category().eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(difficulty) = &self.difficulty {
            if !item.difficulty().eq_ignore_ascii_case(difficulty) {
                return false;
            }
        }
        if let Some(platform) = &self.platform {
            if !item.platform().eq_ignore_ascii_case(platform) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let hit = contains_ci(item.display_name(), search)
                || contains_ci(item.description(), search)
                || contains_ci(item.category(), search)
                || item.keywords().iter().any(|k| contains_ci(k, search));
            if !hit {
                return false;
            }
        }
        if let Some(career) = &self.career {
            let hit = match item.careers() {
                // Problems without career tags apply to every career.
                Some(careers) => {
                    careers.is_empty() || careers.iter().any(|c| c.eq_ignore_ascii_case(career))
                }
                None => {
                    contains_ci(item.display_name(), career)
                        || contains_ci(item.description(), career)
                        || contains_ci(item.category(), career)
                }
            };
            if !hit {
                return false;
            }
        }
        true
    }

    pub fn matches_item(&self, item: &ContentItem) -> bool {
        match item {
            ContentItem::Career(c) => self.matches(c),
            ContentItem::Resource(r) => self.matches(r),
            ContentItem::PracticeProblem(p) => self.matches(p),
            ContentItem::InterviewQuestion(q) => self.matches(q),
        }
    }

    /// Keep matching items in their original order, up to `limit`.
    pub fn apply<T: Content>(&self, items: Vec<T>) -> Vec<T> {
        self.take(items.into_iter().filter(|item| self.matches(item)))
    }

    pub fn apply_items(&self, items: Vec<ContentItem>) -> Vec<ContentItem> {
        self.take(items.into_iter().filter(|item| self.matches_item(item)))
    }

    fn take<T>(&self, matching: impl Iterator<Item = T>) -> Vec<T> {
        match self.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }
}
