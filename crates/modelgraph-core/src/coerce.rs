//! # Document Coercer
//!
//! Total defaulting of a schema-valid but incomplete document into a
//! fully-populated [`Model`].
//!
//! The coercer assumes the input already passed [`crate::validate::validate`].
//! It never rejects: missing or unusable optional fields are replaced by
//! their documented defaults, exactly once, so downstream code never
//! re-defaults ad hoc. `curvePoints` is the one pass-through field: an
//! absent value stays absent.

use serde_json::Value;

use crate::primitives::SCHEMA_VERSION;
use crate::types::{
    ArrowType, Attribute, Entity, HandleLocation, Model, Point, Relationship,
};

fn string_field(entry: &Value, field: &str) -> String {
    entry
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn curve_points(entry: &Value) -> Option<Vec<Point>> {
    let points = entry.get("curvePoints")?.as_array()?;
    Some(
        points
            .iter()
            .map(|p| Point {
                x: p.get("x").and_then(Value::as_f64).unwrap_or_default(),
                y: p.get("y").and_then(Value::as_f64).unwrap_or_default(),
            })
            .collect(),
    )
}

/// Coerce a validated document into a normalized in-memory model.
///
/// Defaults applied: `name`/`description`/`label`/`formula` → `""`,
/// `attributes` → empty, `schemaVersion` → 1, `fromHandle` → right,
/// `toHandle` → left, `arrowType` → single.
#[must_use]
pub fn coerce(data: &Value) -> Model {
    let schema_version = data
        .get("schemaVersion")
        .and_then(Value::as_u64)
        .map_or(SCHEMA_VERSION, |v| v as u32);

    let entities = data
        .get("objects")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(coerce_entity).collect())
        .unwrap_or_default();

    let relationships = data
        .get("relationships")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(coerce_relationship).collect())
        .unwrap_or_default();

    Model {
        schema_version,
        entities,
        relationships,
    }
}

fn coerce_entity(entry: &Value) -> Entity {
    let attributes = entry
        .get("attributes")
        .and_then(Value::as_array)
        .map(|attrs| {
            attrs
                .iter()
                .map(|attr| Attribute {
                    name: string_field(attr, "name"),
                    description: string_field(attr, "description"),
                    formula: string_field(attr, "formula"),
                })
                .collect()
        })
        .unwrap_or_default();

    Entity {
        id: string_field(entry, "id"),
        name: string_field(entry, "name"),
        description: string_field(entry, "description"),
        attributes,
    }
}

fn coerce_relationship(entry: &Value) -> Relationship {
    let handle = |field: &str, fallback: HandleLocation| {
        entry
            .get(field)
            .and_then(Value::as_str)
            .and_then(HandleLocation::parse)
            .unwrap_or(fallback)
    };

    Relationship {
        id: string_field(entry, "id"),
        name: string_field(entry, "name"),
        description: string_field(entry, "description"),
        from_id: string_field(entry, "fromId"),
        to_id: string_field(entry, "toId"),
        from_handle: handle("fromHandle", HandleLocation::default_from()),
        to_handle: handle("toHandle", HandleLocation::default_to()),
        arrow_type: entry
            .get("arrowType")
            .and_then(Value::as_str)
            .and_then(ArrowType::parse)
            .unwrap_or_default(),
        label: string_field(entry, "label"),
        curve_points: curve_points(entry),
    }
}

// =============================================================================
// TESTS
// =============================================================================
