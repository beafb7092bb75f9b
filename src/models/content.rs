//! Content kinds, queries and the typed records the loader produces.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;
use crate::models::builtin;

/// Default per-source timeout observed in the web client.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// The four content domains the loader can fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentKind {
    Careers,
    Resources,
    PracticeProblems,
    InterviewPrep,
}

impl ContentKind {
    pub const ALL: [ContentKind; 4] = [
        ContentKind::Careers,
        ContentKind::Resources,
        ContentKind::PracticeProblems,
        ContentKind::InterviewPrep,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Careers => "careers",
            ContentKind::Resources => "resources",
            ContentKind::PracticeProblems => "practiceProblems",
            ContentKind::InterviewPrep => "interviewPrep",
        }
    }

    /// Backend route, relative to the API base.
    pub fn remote_path(&self) -> &'static str {
        match self {
            ContentKind::Careers => "/api/careers",
            ContentKind::Resources => "/api/resources",
            ContentKind::PracticeProblems => "/api/practice/problems",
            ContentKind::InterviewPrep => "/api/interview-prep",
        }
    }

    /// Flat fallback dataset, relative to the static base.
    pub fn static_path(&self) -> &'static str {
        match self {
            ContentKind::Careers => "/careers_stem.json",
            ContentKind::Resources => "/resources.json",
            ContentKind::PracticeProblems => "/practice_problems.json",
            ContentKind::InterviewPrep => "/interview_prep.json",
        }
    }

    /// Object keys a payload for this kind may be wrapped in, most specific first.
    pub fn envelope_keys(&self) -> &'static [&'static str] {
        match self {
            ContentKind::Careers => &["careers", "data", "items"],
            ContentKind::Resources => &["resources", "data", "items"],
            ContentKind::PracticeProblems => &["problems", "categories", "data", "items"],
            ContentKind::InterviewPrep => &[
                "interviewPrep",
                "challenging_problems",
                "problems",
                "questions",
                "data",
                "items",
            ],
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "careers" | "career" => Ok(ContentKind::Careers),
            "resources" | "resource" => Ok(ContentKind::Resources),
            "practiceproblems" | "practice" | "problems" => Ok(ContentKind::PracticeProblems),
            "interviewprep" | "interview" => Ok(ContentKind::InterviewPrep),
            _ => Err(AppError::validation(format!("Unknown content kind '{s}'"))),
        }
    }
}

/// A single content request. Built per user interaction and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentQuery {
    pub kind: ContentKind,
    /// Encoded as query parameters on the remote request only
    pub filters: BTreeMap<String, String>,
    pub timeout: Duration,
}

impl ContentQuery {
    pub fn new(kind: ContentKind) -> Self {
        Self {
            kind,
            filters: BTreeMap::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Add a filter; blank values are dropped.
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.trim().is_empty() {
            self.filters.insert(key.into(), value);
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters.get(key).map(String::as_str)
    }
}

/// Which tier of the fallback chain produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Source {
    Remote,
    StaticAsset,
    BuiltInDefault,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Source::Remote => "remote",
            Source::StaticAsset => "staticAsset",
            Source::BuiltInDefault => "builtInDefault",
        })
    }
}

/// Uniform loader output, whichever source satisfied the request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadResult<T> {
    pub items: Vec<T>,
    pub source: Source,
    /// True when the items are the built-in default set
    pub partial: bool,
}

impl<T> LoadResult<T> {
    pub fn from_source(items: Vec<T>, source: Source) -> Self {
        Self {
            items,
            partial: source == Source::BuiltInDefault,
            source,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.source != Source::Remote
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> LoadResult<U> {
        LoadResult {
            items: self.items.into_iter().map(f).collect(),
            source: self.source,
            partial: self.partial,
        }
    }
}

/// A strongly-typed content record.
pub trait Content: DeserializeOwned + Serialize + Clone + Send + Sync + 'static {
    const KIND: ContentKind;

    /// Field that receives the key of a map-shaped payload.
    const DISPLAY_FIELD: &'static str;

    /// Field that receives the key of an enclosing group.
    const GROUP_FIELD: &'static str = "category";

    /// Nested array holding the real items when an element is a group.
    const NESTED_FIELD: Option<&'static str> = None;

    /// Record fields that hold plain string lists.
    const LIST_FIELDS: &'static [&'static str] = &[];

    fn id(&self) -> &str;
    fn display_name(&self) -> &str;
    fn category(&self) -> &str;
    fn description(&self) -> &str;

    /// Careers an item is tagged for; `None` when the kind has no such list.
    fn careers(&self) -> Option<&[String]> {
        None
    }

    /// Skills or topics searched alongside the display text.
    fn keywords(&self) -> &[String] {
        &[]
    }

    fn difficulty(&self) -> &str {
        ""
    }

    fn platform(&self) -> &str {
        ""
    }

    /// Small fixed dataset returned when every other source fails.
    fn builtin_defaults() -> Vec<Self>;

    fn into_item(self) -> ContentItem;
}

/// A career profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Career {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub detailed_description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default, alias = "avg_salary", deserialize_with = "string_or_number")]
    pub salary: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub growth_rate: String,
    #[serde(default)]
    pub education: String,
}

impl Content for Career {
    const KIND: ContentKind = ContentKind::Careers;
    const DISPLAY_FIELD: &'static str = "name";
    const LIST_FIELDS: &'static [&'static str] = &["skills"];

    fn id(&self) -> &str {
        &self.id
    }
    fn display_name(&self) -> &str {
        &self.name
    }
    fn category(&self) -> &str {
        &self.category
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn keywords(&self) -> &[String] {
        &self.skills
    }
    fn builtin_defaults() -> Vec<Self> {
        builtin::careers()
    }
    fn into_item(self) -> ContentItem {
        ContentItem::Career(self)
    }
}

/// A learning resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub rating: String,
}

impl Content for Resource {
    const KIND: ContentKind = ContentKind::Resources;
    const DISPLAY_FIELD: &'static str = "title";

    fn id(&self) -> &str {
        &self.id
    }
    fn display_name(&self) -> &str {
        &self.title
    }
    fn category(&self) -> &str {
        &self.category
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn difficulty(&self) -> &str {
        &self.difficulty
    }
    fn platform(&self) -> &str {
        &self.platform
    }
    fn builtin_defaults() -> Vec<Self> {
        builtin::resources()
    }
    fn into_item(self) -> ContentItem {
        ContentItem::Resource(self)
    }
}

/// A timed coding or math exercise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PracticeProblem {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub category: String,
    /// Minutes
    #[serde(default, alias = "timeLimit")]
    pub time_limit: u32,
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub careers: Vec<String>,
}

impl Content for PracticeProblem {
    const KIND: ContentKind = ContentKind::PracticeProblems;
    const DISPLAY_FIELD: &'static str = "title";
    const NESTED_FIELD: Option<&'static str> = Some("problems");
    const LIST_FIELDS: &'static [&'static str] = &["careers"];

    fn id(&self) -> &str {
        &self.id
    }
    fn display_name(&self) -> &str {
        &self.title
    }
    fn category(&self) -> &str {
        &self.category
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn careers(&self) -> Option<&[String]> {
        Some(&self.careers)
    }
    fn difficulty(&self) -> &str {
        &self.difficulty
    }
    fn builtin_defaults() -> Vec<Self> {
        builtin::practice_problems()
    }
    fn into_item(self) -> ContentItem {
        ContentItem::PracticeProblem(self)
    }
}

/// An interview-prep problem with hints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterviewQuestion {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(alias = "question")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub example: String,
    #[serde(default)]
    pub hint: String,
    #[serde(default)]
    pub solution_approach: String,
    #[serde(default)]
    pub related_topics: Vec<String>,
}

impl Content for InterviewQuestion {
    const KIND: ContentKind = ContentKind::InterviewPrep;
    const DISPLAY_FIELD: &'static str = "title";
    const LIST_FIELDS: &'static [&'static str] = &["related_topics"];

    fn id(&self) -> &str {
        &self.id
    }
    fn display_name(&self) -> &str {
        &self.title
    }
    fn category(&self) -> &str {
        &self.category
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn difficulty(&self) -> &str {
        &self.difficulty
    }
    fn keywords(&self) -> &[String] {
        &self.related_topics
    }
    fn builtin_defaults() -> Vec<Self> {
        builtin::interview_questions()
    }
    fn into_item(self) -> ContentItem {
        ContentItem::InterviewQuestion(self)
    }
}

/// Any content record, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ContentItem {
    Career(Career),
    Resource(Resource),
    PracticeProblem(PracticeProblem),
    InterviewQuestion(InterviewQuestion),
}

impl ContentItem {
    pub fn kind(&self) -> ContentKind {
        match self {
            ContentItem::Career(_) => ContentKind::Careers,
            ContentItem::Resource(_) => ContentKind::Resources,
            ContentItem::PracticeProblem(_) => ContentKind::PracticeProblems,
            ContentItem::InterviewQuestion(_) => ContentKind::InterviewPrep,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ContentItem::Career(c) => c.id(),
            ContentItem::Resource(r) => r.id(),
            ContentItem::PracticeProblem(p) => p.id(),
            ContentItem::InterviewQuestion(q) => q.id(),
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            ContentItem::Career(c) => c.display_name(),
            ContentItem::Resource(r) => r.display_name(),
            ContentItem::PracticeProblem(p) => p.display_name(),
            ContentItem::InterviewQuestion(q) => q.display_name(),
        }
    }

    pub fn category(&self) -> &str {
        match self {
            ContentItem::Career(c) => c.category(),
            ContentItem::Resource(r) => r.category(),
            ContentItem::PracticeProblem(p) => p.category(),
            ContentItem::InterviewQuestion(q) => q.category(),
        }
    }
}

/// Stable identifier derived from a display name or map key.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Accept `"3"` and `3` alike; backends disagree on id and salary types.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "expected string or number, found {other}"
        ))),
    }
}
