//! Job classification.
//!
//! Each [`JobReport`] is mapped to a [`Category`] through a [`StatusCodeMap`].
//! Codes missing from the map fall into [`Category::Other`]; categorization
//! never fails.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ScanError;

/// One job's reported state for the current cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReport {
    pub name: String,
    pub raw_code: String,
}

impl JobReport {
    pub fn new(name: impl Into<String>, raw_code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_code: raw_code.into(),
        }
    }
}

/// Classification of a raw status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Failing,
    Success,
    Building,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Failing => "failing",
            Category::Success => "success",
            Category::Building => "building",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "failing" | "failure" => Ok(Category::Failing),
            "success" => Ok(Category::Success),
            "building" => Ok(Category::Building),
            "other" => Ok(Category::Other),
            other => Err(ScanError::Configuration(format!(
                "unknown job category '{}'",
                other
            ))),
        }
    }
}

/// Configured mapping from raw status code to [`Category`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusCodeMap {
    codes: BTreeMap<String, Category>,
}

impl StatusCodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jenkins ball colours. `*_anime` is a build in progress.
    pub fn jenkins_defaults() -> Self {
        Self::new()
            .with("blue", Category::Success)
            .with("red", Category::Failing)
            .with("yellow", Category::Failing)
            .with("blue_anime", Category::Building)
            .with("red_anime", Category::Building)
            .with("yellow_anime", Category::Building)
            .with("grey_anime", Category::Building)
            .with("aborted_anime", Category::Building)
            .with("notbuilt_anime", Category::Building)
            .with("disabled_anime", Category::Building)
            .with("grey", Category::Other)
            .with("aborted", Category::Other)
            .with("notbuilt", Category::Other)
            .with("disabled", Category::Other)
    }

    /// Build a map from code → category-name pairs, as read from configuration.
    pub fn from_names<I, K, V>(entries: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut map = Self::new();
        for (code, name) in entries {
            let code = code.into();
            let category = name.as_ref().parse::<Category>().map_err(|_| {
                ScanError::Configuration(format!(
                    "status code '{}' maps to unknown category '{}'",
                    code,
                    name.as_ref()
                ))
            })?;
            map.insert(code, category);
        }
        Ok(map)
    }

    pub fn with(mut self, code: impl Into<String>, category: Category) -> Self {
        self.insert(code, category);
        self
    }

    pub fn insert(&mut self, code: impl Into<String>, category: Category) {
        self.codes.insert(code.into(), category);
    }

    /// Look up a code; `None` if it is not mapped.
    pub fn get(&self, code: &str) -> Option<Category> {
        self.codes.get(code).copied()
    }

    /// Strict lookup: an unknown code is [`ScanError::UnmappedCode`].
    pub fn lookup(&self, code: &str) -> crate::Result<Category> {
        self.get(code).ok_or_else(|| ScanError::UnmappedCode {
            code: code.to_string(),
        })
    }

    /// Look up a code, bucketing unknown codes into [`Category::Other`].
    pub fn classify(&self, code: &str) -> Category {
        match self.lookup(code) {
            Ok(category) => category,
            Err(e) => {
                debug!(error = %e, "treating as other");
                Category::Other
            }
        }
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Partition of one cycle's jobs into the four categories.
///
/// Every job name from the input appears in exactly one set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedSet {
    pub failing: BTreeSet<String>,
    pub success: BTreeSet<String>,
    pub building: BTreeSet<String>,
    pub other: BTreeSet<String>,
}

impl CategorizedSet {
    pub fn set(&self, category: Category) -> &BTreeSet<String> {
        match category {
            Category::Failing => &self.failing,
            Category::Success => &self.success,
            Category::Building => &self.building,
            Category::Other => &self.other,
        }
    }

    fn set_mut(&mut self, category: Category) -> &mut BTreeSet<String> {
        match category {
            Category::Failing => &mut self.failing,
            Category::Success => &mut self.success,
            Category::Building => &mut self.building,
            Category::Other => &mut self.other,
        }
    }

    /// Category of `name` in this cycle, if it was reported.
    pub fn category_of(&self, name: &str) -> Option<Category> {
        [
            Category::Failing,
            Category::Success,
            Category::Building,
            Category::Other,
        ]
        .into_iter()
        .find(|c| self.set(*c).contains(name))
    }

    pub fn total(&self) -> usize {
        self.failing.len() + self.success.len() + self.building.len() + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Partition `reports` by category.
///
/// If a job name is reported more than once, its last report wins so the
/// partition stays disjoint.
pub fn categorize(reports: &[JobReport], code_map: &StatusCodeMap) -> CategorizedSet {
    let latest: BTreeMap<&str, Category> = reports
        .iter()
        .map(|r| (r.name.as_str(), code_map.classify(&r.raw_code)))
        .collect();

    let mut set = CategorizedSet::default();
    for (name, category) in latest {
        set.set_mut(category).insert(name.to_string());
    }
    set
}
