use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One configured comic: where to fetch it and how to find the image.
///
/// Only `title`, `url`, `base` and `agent` reach templates. The patterns stay
/// out so `alt` can't be mistaken for the caption.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ComicRule {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing)]
    pub pattern: String,
    #[serde(skip_serializing)]
    pub url_change: Option<String>,
    pub base: Option<String>,
    #[serde(skip_serializing)]
    pub alt: Option<String>,
    pub agent: Option<String>,
}

impl ComicRule {
    /// Lowercased title with spaces removed.
    pub fn id(&self) -> String {
        comic_id(&self.title)
    }
}

pub fn comic_id(title: &str) -> String {
    title.to_lowercase().replace(' ', "")
}

/// What a successful fetch produced.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub image_url: String,
    /// File name relative to the output directory.
    pub image: String,
    pub caption: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub error_detail: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Outcome {
    Fetched(FetchResult),
    Failed(FailureRecord),
}

/// A rendered row of the digest: the rule it came from plus what happened.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ComicEntry {
    pub id: String,
    #[serde(flatten)]
    pub rule: ComicRule,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl ComicEntry {
    pub fn fetched(&self) -> Option<&FetchResult> {
        match &self.outcome {
            Outcome::Fetched(f) => Some(f),
            Outcome::Failed(_) => None,
        }
    }

    pub fn error_detail(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Fetched(_) => None,
            Outcome::Failed(f) => Some(&f.error_detail),
        }
    }
}

/// Every configured comic, in configuration order, for a single run date.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub date: NaiveDate,
    pub comics: Vec<ComicEntry>,
}
