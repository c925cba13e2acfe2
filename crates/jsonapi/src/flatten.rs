//! Flatten a catalog item document into a denormalized product record.

use crate::document::Document;
use crate::error::{JsonApiError, Result};
use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::HashMap;

/// A product as returned to tool callers.
///
/// Scalar fields are `null` when the upstream attribute is absent; they are never defaulted
/// to empty strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlattenedProduct {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: Option<String>,
    pub categoria: Option<String>,
    pub materiale: Option<String>,
    pub prezzo: Option<Number>,
    pub valuta: Option<String>,
    /// Resolved size term names, in relationship order. Unresolved ids are omitted.
    pub taglie: Vec<String>,
    /// Raw size term ids, in relationship order.
    pub taglie_ids: Vec<String>,
}

/// Build a [`FlattenedProduct`] from a decoded document.
///
/// # Errors
///
/// Returns [`JsonApiError::Validation`] if the primary resource has no `id` or no `type`.
pub fn flatten(document: &Document) -> Result<FlattenedProduct> {
    let Some(data) = document.data.as_ref() else {
        return Err(JsonApiError::Validation(
            "document has no primary data (missing data.id and data.type)".to_string(),
        ));
    };
    let id = required(data.id.as_deref(), "data.id")?;
    let kind = required(data.kind.as_deref(), "data.type")?;

    let attrs = &data.attributes;

    let taglie_ids: Vec<String> = data
        .relationships
        .field_taglie
        .as_ref()
        .map(|rel| rel.ids().into_iter().map(str::to_string).collect())
        .unwrap_or_default();

    let names = term_names(document);
    let taglie: Vec<String> = taglie_ids
        .iter()
        .filter_map(|id| names.get(id.as_str()).map(|name| (*name).to_string()))
        .collect();

    if taglie.len() < taglie_ids.len() {
        tracing::debug!(
            product = %id,
            referenced = taglie_ids.len(),
            resolved = taglie.len(),
            "size term ids without an included taxonomy term were dropped"
        );
    }

    Ok(FlattenedProduct {
        id: id.to_string(),
        kind: kind.to_string(),
        title: attrs.title.clone(),
        categoria: attrs.field_categoria.clone(),
        materiale: attrs.field_materiale.clone(),
        prezzo: to_number_maybe(attrs.field_prezzo.as_ref()),
        valuta: attrs.field_valuta.clone(),
        taglie,
        taglie_ids,
    })
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| JsonApiError::Validation(format!("document is missing {field}")))
}

/// Included taxonomy terms: `id -> name`.
fn term_names(document: &Document) -> HashMap<&str, &str> {
    document
        .included
        .iter()
        .filter(|r| r.is_taxonomy_term())
        .filter_map(|r| Some((r.id.as_deref()?, r.attributes.name.as_deref()?)))
        .collect()
}

/// Coerce a loosely-typed price into a number.
///
/// Numbers pass through unchanged. Strings accept either decimal separator (`"129.00"`,
/// `"129,00"`): the first comma becomes a period, surrounding whitespace is trimmed, and
/// anything that does not parse to a finite number yields `None`. Whole values parsed from
/// strings are kept integral so `"129,00"` serializes as `129`. Every other JSON type yields
/// `None`.
#[must_use]
pub fn to_number_maybe(value: Option<&Value>) -> Option<Number> {
    match value? {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => {
            let parsed = s.replacen(',', ".", 1).trim().parse::<f64>().ok()?;
            number_from_f64(parsed)
        }
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Largest magnitude at which every whole `f64` is an exact integer.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

#[allow(clippy::cast_possible_truncation)]
fn number_from_f64(n: f64) -> Option<Number> {
    if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INTEGER {
        Some(Number::from(n as i64))
    } else {
        Number::from_f64(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> Document {
        serde_json::from_value(v).expect("document decodes")
    }

    #[test]
    fn missing_identity_is_a_validation_error() {
        for v in [
            json!({}),
            json!({ "data": null }),
            json!({ "data": { "type": "node--item" } }),
            json!({ "data": { "id": "abc" } }),
            json!({ "data": { "id": "", "type": "node--item" } }),
            json!({ "data": { "id": "abc", "type": "" } }),
        ] {
            let err = flatten(&doc(v.clone())).expect_err("must fail");
            assert!(
                matches!(err, JsonApiError::Validation(_)),
                "unexpected error for {v}: {err}"
            );
        }
    }

    #[test]
    fn both_decimal_separators_coerce_to_the_same_number() {
        let coerce = |v: Value| to_number_maybe(Some(&v)).map(Value::Number);
        assert_eq!(coerce(json!("129.00")), Some(json!(129)));
        assert_eq!(coerce(json!("129,00")), Some(json!(129)));
        assert_eq!(coerce(json!("  49,90 ")), Some(json!(49.9)));
        assert_eq!(coerce(json!("-0,5")), Some(json!(-0.5)));
        assert_eq!(coerce(json!(12)), Some(json!(12)));
        assert_eq!(coerce(json!(12.5)), Some(json!(12.5)));

        // Upstream numbers keep their wire form.
        assert_eq!(serde_json::to_string(&coerce(json!(129))).expect("ser"), "129");
        assert_eq!(serde_json::to_string(&coerce(json!("129,00"))).expect("ser"), "129");
    }

    #[test]
    fn non_numeric_inputs_coerce_to_none() {
        for v in [
            json!(null),
            json!(true),
            json!(false),
            json!({ "amount": 10 }),
            json!([1, 2]),
            json!("abc"),
            json!(""),
            json!("1,2,3"),
            json!("NaN"),
            json!("inf"),
        ] {
            assert_eq!(to_number_maybe(Some(&v)), None, "input {v}");
        }
        assert_eq!(to_number_maybe(None), None);
    }

    #[test]
    fn scalar_attributes_without_relationships() {
        let product = flatten(&doc(json!({
            "data": {
                "id": "abc",
                "type": "node--item",
                "attributes": { "title": "Shoe", "field_prezzo": "49,90" }
            }
        })))
        .expect("flatten");

        assert_eq!(
            product,
            FlattenedProduct {
                id: "abc".into(),
                kind: "node--item".into(),
                title: Some("Shoe".into()),
                categoria: None,
                materiale: None,
                prezzo: Number::from_f64(49.9),
                valuta: None,
                taglie: vec![],
                taglie_ids: vec![],
            }
        );

        let v = serde_json::to_value(&product).expect("serialize");
        assert_eq!(v["type"], "node--item");
        assert_eq!(v["prezzo"], json!(49.9));
        assert!(v["categoria"].is_null());
        assert_eq!(v["taglie"], json!([]));
    }

    #[test]
    fn unmatched_term_ids_are_dropped_from_names_only() {
        let product = flatten(&doc(json!({
            "data": {
                "id": "abc",
                "type": "node--item",
                "attributes": {
                    "title": "Shoe",
                    "field_categoria": "Calzature",
                    "field_materiale": "Pelle",
                    "field_valuta": "EUR",
                    "field_prezzo": 129
                },
                "relationships": {
                    "field_taglie": {
                        "data": [
                            { "id": "t1", "type": "taxonomy_term--taglie" },
                            { "id": "t2", "type": "taxonomy_term--taglie" }
                        ]
                    }
                }
            },
            "included": [
                { "id": "t1", "type": "taxonomy_term--taglie", "attributes": { "name": "Large" } }
            ]
        })))
        .expect("flatten");

        assert_eq!(product.taglie, vec!["Large"]);
        assert_eq!(product.taglie_ids, vec!["t1", "t2"]);
        assert_eq!(product.categoria.as_deref(), Some("Calzature"));
        assert_eq!(product.materiale.as_deref(), Some("Pelle"));
        assert_eq!(product.valuta.as_deref(), Some("EUR"));
        assert_eq!(product.prezzo, Some(Number::from(129)));
        assert_eq!(serde_json::to_value(&product).expect("serialize")["prezzo"], json!(129));
    }

    #[test]
    fn malformed_linkage_and_included_entries_are_skipped() {
        let product = flatten(&doc(json!({
            "data": {
                "id": "abc",
                "type": "node--item",
                "relationships": {
                    "field_taglie": {
                        "data": [{ "id": "t1", "type": "taxonomy_term--taglie" }, false, 0, ""]
                    }
                }
            },
            "included": [
                null,
                { "id": "t1", "type": "taxonomy_term--taglie", "attributes": { "name": "Large" } }
            ]
        })))
        .expect("flatten");

        assert_eq!(product.taglie, vec!["Large"]);
        assert_eq!(product.taglie_ids, vec!["t1"]);
    }

    #[test]
    fn names_follow_reference_order_and_keep_duplicates() {
        let document = doc(json!({
            "data": {
                "id": "abc",
                "type": "node--item",
                "relationships": {
                    "field_taglie": {
                        "data": [
                            { "id": "t2", "type": "taxonomy_term--taglie" },
                            { "id": "t1", "type": "taxonomy_term--taglie" },
                            { "id": "t2", "type": "taxonomy_term--taglie" },
                            { "id": "f1", "type": "file--file" }
                        ]
                    }
                }
            },
            "included": [
                { "id": "t1", "type": "taxonomy_term--taglie", "attributes": { "name": "S" } },
                { "id": "t2", "type": "taxonomy_term--taglie", "attributes": { "name": "M" } },
                { "id": "f1", "type": "file--file", "attributes": { "name": "photo.jpg" } },
                { "id": "t3", "type": "taxonomy_term--taglie", "attributes": {} }
            ]
        }));

        let product = flatten(&document).expect("flatten");
        assert_eq!(product.taglie, vec!["M", "S", "M"]);
        assert_eq!(product.taglie_ids, vec!["t2", "t1", "t2", "f1"]);
        assert!(product.taglie_ids.len() >= product.taglie.len());

        // Pure: a second pass yields the same record.
        assert_eq!(flatten(&document).expect("flatten again"), product);
    }
}
