//! Typed view of the JSON:API documents returned for catalog items.
//!
//! Only the members the flattener reads are modelled. Every member is optional and
//! defaults to `None`/empty when absent, `null`, or of the wrong shape; unknown members are
//! ignored.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Type-name prefix shared by all taxonomy term resources (`taxonomy_term--<vocabulary>`).
pub const TAXONOMY_TYPE_PREFIX: &str = "taxonomy_term--";

/// A single-resource JSON:API document: primary `data` plus `included` resources.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Document {
    #[serde(default, deserialize_with = "lenient_resource")]
    pub data: Option<ItemResource>,
    #[serde(default, deserialize_with = "lenient_resources")]
    pub included: Vec<IncludedResource>,
}

/// The primary catalog item resource.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemResource {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "object_or_default")]
    pub attributes: ItemAttributes,
    #[serde(default, deserialize_with = "object_or_default")]
    pub relationships: ItemRelationships,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemAttributes {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub field_categoria: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub field_materiale: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub field_valuta: Option<String>,
    /// Raw price value; coerced by [`crate::flatten::to_number_maybe`].
    #[serde(default)]
    pub field_prezzo: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemRelationships {
    #[serde(default, deserialize_with = "lenient_resource")]
    pub field_taglie: Option<Relationship>,
}

/// A relationship object (`{ "data": ... }`).
///
/// Linkage may be to-many (array) or to-one (single identifier). Entries that are not
/// identifier objects are dropped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Relationship {
    #[serde(default, deserialize_with = "lenient_resources")]
    pub data: Vec<ResourceIdentifier>,
}

impl Relationship {
    /// Referenced ids in linkage order, skipping entries with a missing or empty id.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.data
            .iter()
            .filter_map(ResourceIdentifier::non_empty_id)
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceIdentifier {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    pub kind: Option<String>,
}

impl ResourceIdentifier {
    fn non_empty_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

/// A secondary resource from `included`. Only taxonomy terms are read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncludedResource {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "object_or_default")]
    pub attributes: TermAttributes,
}

impl IncludedResource {
    #[must_use]
    pub fn is_taxonomy_term(&self) -> bool {
        self.kind
            .as_deref()
            .is_some_and(|k| k.starts_with(TAXONOMY_TYPE_PREFIX))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TermAttributes {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
}

/// Strings pass through; `null`, absent and non-string values become `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// An object decodes as `T`; anything else (`null`, `false`, `0`, `""`) becomes `None`.
fn lenient_resource<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(v @ Value::Object(_)) => serde_json::from_value(v).ok(),
        _ => None,
    })
}

/// Arrays keep the entries that decode as `T`; a single object is a one-entry list.
fn lenient_resources<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect(),
        Some(v @ Value::Object(_)) => serde_json::from_value(v).ok().into_iter().collect(),
        _ => Vec::new(),
    })
}

/// Objects decode as `T`; `null` and non-object values become `T::default()`.
fn object_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    Ok(lenient_resource(deserializer)?.unwrap_or_default())
}
