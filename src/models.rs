//! Core data models.
//!
//! [`Document`] and [`SearchResult`] flow through the search path; the
//! remaining types are the serde schema of the two bundled JSON catalogs.
//! Deserializing into these types *is* the schema validation: a missing
//! field, a wrong type or an unknown `api` value rejects the whole file.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A searchable unit of the bundled corpus. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub title: String,
    pub content: String,
}

/// A ranked hit returned by [`crate::search::SearchEngine::search`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub source: String,
    pub title: String,
    pub snippet: String,
    pub relevance: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKind {
    Inference,
    Management,
}

impl ApiKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKind::Inference => "inference",
            ApiKind::Management => "management",
        }
    }
}

impl std::fmt::Display for ApiKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Endpoint {
    pub method: String,
    pub path: String,
    pub description: String,
    pub category: String,
    pub api: ApiKind,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiBaseUrls {
    pub inference: String,
    pub management: String,
}

/// Contents of `endpoints.json`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointsData {
    pub endpoints: Vec<Endpoint>,
    pub api_base_urls: ApiBaseUrls,
    pub categories: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Token window; `null` for models where it does not apply.
    pub context_length: Option<i64>,
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub knowledge_cutoff: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AliasFormat {
    pub pattern: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelAliases {
    pub description: String,
    pub formats: Vec<AliasFormat>,
}

/// A recommended model entry: one id or several.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ModelValue {
    One(String),
    Many(Vec<String>),
}

/// `recommendedModels`: use case to model id(s), in file order.
///
/// A repeated key keeps its first position and takes the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecommendedModels(Vec<(String, ModelValue)>);

impl RecommendedModels {
    pub fn iter(&self) -> std::slice::Iter<'_, (String, ModelValue)> {
        self.0.iter()
    }

    pub fn get(&self, use_case: &str) -> Option<&ModelValue> {
        self.0.iter().find(|(k, _)| k == use_case).map(|(_, v)| v)
    }

    pub fn insert(&mut self, use_case: String, value: ModelValue) {
        match self.0.iter_mut().find(|(k, _)| *k == use_case) {
            Some(entry) => entry.1 = value,
            None => self.0.push((use_case, value)),
        }
    }
}

impl<'a> IntoIterator for &'a RecommendedModels {
    type Item = &'a (String, ModelValue);
    type IntoIter = std::slice::Iter<'a, (String, ModelValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'de> Deserialize<'de> for RecommendedModels {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RecommendedModels;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of use case to a model id or list of ids")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = RecommendedModels::default();
                while let Some((use_case, value)) = map.next_entry::<String, ModelValue>()? {
                    entries.insert(use_case, value);
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

impl Serialize for RecommendedModels {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (use_case, value) in &self.0 {
            map.serialize_entry(use_case, value)?;
        }
        map.end()
    }
}

/// Contents of `models.json`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelsData {
    pub models: Vec<Model>,
    #[serde(default)]
    pub aliases: Option<ModelAliases>,
    #[serde(default)]
    pub recommended_models: Option<RecommendedModels>,
}
