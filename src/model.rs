//! Search state and wire types.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Maximum number of simultaneous search terms.
pub const MAX_TERMS: usize = 3;

/// Result categories offered by the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    ClinicalStudy,
    ScientificPaper,
    /// Catch-all tab; mapped to a concrete category on the suggest path.
    All,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ClinicalStudy => "clinical_study",
            Category::ScientificPaper => "scientific_paper",
            Category::All => "all",
        }
    }

    /// Backend result-shape selector derived from the category.
    pub fn schema_type(&self) -> &'static str {
        match self {
            Category::ClinicalStudy => "clinical_study_custom",
            _ => "default",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clinical_study" => Ok(Category::ClinicalStudy),
            "scientific_paper" => Ok(Category::ScientificPaper),
            "all" => Ok(Category::All),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::ClinicalStudy
    }
}

/// A single filter constraint. Absent keys mean "no constraint".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Many(Vec<String>),
    Range {
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<String>,
    },
    Text(String),
}

impl FilterValue {
    /// True when the value carries no constraint and should be dropped
    /// from a request payload.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Text(s) => s.is_empty(),
            FilterValue::Many(v) => v.iter().all(|s| s.is_empty()),
            FilterValue::Range { min, max } => {
                let blank = |o: &Option<String>| o.as_deref().is_none_or(str::is_empty);
                blank(min) && blank(max)
            }
        }
    }
}

/// Outcome of a term-add attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddTerm {
    Added,
    /// Empty after trimming, or already present.
    Ignored,
    /// Three terms already active.
    LimitReached,
}

/// Mutable search inputs: terms, category, page, filters.
///
/// `page` only resets on user-facing "new search" actions (term add or
/// remove, category switch, filter change), never on pagination itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchState {
    terms: Vec<String>,
    category: Category,
    page: u32,
    filters: BTreeMap<String, FilterValue>,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            terms: Vec::new(),
            category: Category::default(),
            page: 1,
            filters: BTreeMap::new(),
        }
    }
}

impl SearchState {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            ..Self::default()
        }
    }

    /// Reconstruct state from the page URL: a `q=` query parameter seeds
    /// the first term, and the papers route flips the category.
    pub fn from_url(path: &str, query_string: &str) -> Self {
        let mut state = Self::default();
        if path.contains("scientific-papers") {
            state.category = Category::ScientificPaper;
        }
        for pair in query_string.trim_start_matches('?').split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            if key == "q"
                && let Ok(decoded) = urlencoding::decode(value)
            {
                state.add_term(&decoded);
            }
        }
        state
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn filters(&self) -> &BTreeMap<String, FilterValue> {
        &self.filters
    }

    /// Terms joined with logical OR; empty string when no terms are active.
    pub fn query_text(&self) -> String {
        self.terms.join(" OR ")
    }

    /// Add a term. Trims whitespace; rejects empties, duplicates, and a
    /// fourth term. Resets the page on success.
    pub fn add_term(&mut self, term: &str) -> AddTerm {
        let trimmed = term.trim();
        if trimmed.is_empty() || self.terms.iter().any(|t| t == trimmed) {
            return AddTerm::Ignored;
        }
        if self.terms.len() >= MAX_TERMS {
            return AddTerm::LimitReached;
        }
        self.terms.push(trimmed.to_string());
        self.page = 1;
        AddTerm::Added
    }

    /// Remove a term. Returns false when it was not present. Resets the
    /// page on success.
    pub fn remove_term(&mut self, term: &str) -> bool {
        let before = self.terms.len();
        self.terms.retain(|t| t != term);
        if self.terms.len() != before {
            self.page = 1;
            true
        } else {
            false
        }
    }

    pub fn clear_terms(&mut self) {
        self.terms.clear();
        self.page = 1;
    }

    /// Switch category. Resets the page.
    pub fn set_category(&mut self, category: Category) {
        self.category = category;
        self.page = 1;
    }

    /// Apply or replace one filter. Resets the page.
    pub fn set_filter(&mut self, key: &str, value: FilterValue) {
        self.filters.insert(key.to_string(), value);
        self.page = 1;
    }

    pub fn clear_filter(&mut self, key: &str) {
        self.filters.remove(key);
        self.page = 1;
    }

    /// Clear every filter control unconditionally and return to page 1.
    pub fn reset_filters(&mut self) {
        self.filters.clear();
        self.page = 1;
    }

    /// Pagination only: never touches terms, category, or filters.
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }
}

/// A query suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub struct SuggestResponse {
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

/// A user-curated saved set of result items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Attached downloadable artifact on a result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataProduct {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub access_level: Option<String>,
}

/// Optional domain fields attached to a result. Every field may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudyDetails {
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub drug: Option<String>,
    #[serde(default)]
    pub indication_category: Option<String>,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub participant_count: Option<u64>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub procedure_category: Option<String>,
}

/// One search hit. The details bag and data-product list may be entirely
/// absent; older payloads carry the details under `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultItem {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, alias = "data")]
    pub study_details: Option<StudyDetails>,
    #[serde(default)]
    pub data_products: Vec<DataProduct>,
}

/// Parsed search response, normalized across both wire shapes.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub results: Vec<ResultItem>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Deserialize)]
struct WirePagination {
    total: Option<u64>,
    page: Option<u32>,
    per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct WireSearchResponse {
    #[serde(default)]
    results: Vec<ResultItem>,
    total: Option<u64>,
    page: Option<u32>,
    per_page: Option<u32>,
    pagination: Option<WirePagination>,
}

impl SearchOutcome {
    /// Accepts both `{results, total, page, per_page}` and
    /// `{results, pagination: {total, page, per_page}}`.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        let wire: WireSearchResponse = serde_json::from_str(body)?;
        let (total, page, per_page) = match wire.pagination {
            Some(p) => (p.total, p.page, p.per_page),
            None => (wire.total, wire.page, wire.per_page),
        };
        Ok(Self {
            total: total.unwrap_or(wire.results.len() as u64),
            page: page.unwrap_or(1),
            per_page: per_page.unwrap_or(10),
            results: wire.results,
        })
    }
}
