//! # Document Wire Format
//!
//! Reading and writing the persisted JSON document: a `schemaVersion`
//! marker, the `objects` and `relationships` arrays, and an optional
//! `positions` map keyed by entity id. Parsing is deliberately split
//! from validation and coercion so the validator can report every
//! problem in untrusted input before any typed struct exists.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::primitives::SCHEMA_VERSION;
use crate::types::{Entity, ImportError, Model, Point, PositionMap, Relationship, ValidationReport};

/// Errors from [`render`]ing a model back to JSON.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The export gate found issues; nothing was written.
    #[error("document failed export validation with {} issue(s)", .0.issues.len())]
    Invalid(ValidationReport),
    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Borrowed view of a model plus its canvas positions, in the exact
/// field order the on-disk format uses.
#[derive(Serialize)]
struct Document<'a> {
    #[serde(rename = "schemaVersion")]
    schema_version: u32,
    objects: &'a [Entity],
    relationships: &'a [Relationship],
    positions: &'a PositionMap,
}

/// Parse raw document text into an untyped JSON tree. Syntax errors
/// surface as [`ImportError::Parse`] with the serde_json message.
pub fn parse(text: &str) -> Result<Value, ImportError> {
    serde_json::from_str(text).map_err(|e| ImportError::Parse(e.to_string()))
}

/// Pull the `positions` map out of a validated document, keeping only
/// entries whose key names an entity in `model` and whose x/y are
/// finite numbers. Everything else is dropped silently; the validator
/// already reported malformed entries.
#[must_use]
pub fn read_positions(data: &Value, model: &Model) -> PositionMap {
    let mut positions = BTreeMap::new();
    let Some(map) = data.get("positions").and_then(Value::as_object) else {
        return positions;
    };
    for (id, value) in map {
        if !model.contains_entity(id) {
            continue;
        }
        let (Some(x), Some(y)) = (
            value.get("x").and_then(Value::as_f64),
            value.get("y").and_then(Value::as_f64),
        ) else {
            continue;
        };
        if x.is_finite() && y.is_finite() {
            positions.insert(id.clone(), Point::new(x, y));
        }
    }
    positions
}

/// Serialize a model and its positions as pretty-printed JSON with the
/// current schema version stamped in.
pub fn render(model: &Model, positions: &PositionMap) -> Result<String, ExportError> {
    let document = Document {
        schema_version: SCHEMA_VERSION,
        objects: &model.entities,
        relationships: &model.relationships,
        positions,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Serialize a model and its positions to an untyped JSON tree, for
/// feeding back through the validator before export.
pub fn to_value(model: &Model, positions: &PositionMap) -> Result<Value, ExportError> {
    let document = Document {
        schema_version: SCHEMA_VERSION,
        objects: &model.entities,
        relationships: &model.relationships,
        positions,
    };
    Ok(serde_json::to_value(&document)?)
}

// =============================================================================
// TESTS
// =============================================================================
