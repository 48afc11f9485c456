//! Structured search intent produced by the classifier.

use serde::{Deserialize, Deserializer, Serialize};

/// Closed set of lookup strategies.
///
/// Any `searchType` the classifier invents deserializes to `Proximity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentKind {
    Specific,
    Area,
    #[default]
    #[serde(other)]
    Proximity,
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntentKind::Specific => write!(f, "specific"),
            IntentKind::Area => write!(f, "area"),
            IntentKind::Proximity => write!(f, "proximity"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IntentLocation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Meters; 0 when the classifier did not infer one.
    #[serde(default, deserialize_with = "null_as_default")]
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchTerms {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchIntent {
    #[serde(rename = "searchType", default, deserialize_with = "null_as_default")]
    pub kind: IntentKind,
    #[serde(default, deserialize_with = "null_as_default")]
    pub normalized_query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<IntentLocation>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub terms: SearchTerms,
}

/// Reads an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl SearchIntent {
    /// Shop name for a specific lookup: the extracted term, then the
    /// normalized query, then whatever the user typed.
    #[must_use]
    pub fn shop_name<'a>(&'a self, raw_query: &'a str) -> &'a str {
        self.terms
            .shop
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or_else(|| Some(self.normalized_query.trim()).filter(|s| !s.is_empty()))
            .unwrap_or_else(|| raw_query.trim())
    }

    /// Non-empty location name extracted by the classifier.
    #[must_use]
    pub fn location_name(&self) -> Option<&str> {
        self.location
            .as_ref()
            .map(|l| l.name.trim())
            .filter(|n| !n.is_empty())
    }
}

/// Lower-cases and collapses runs of whitespace.
#[must_use]
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
