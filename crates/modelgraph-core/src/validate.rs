//! # Document Validator
//!
//! Structural validation of untrusted imported JSON.
//!
//! - Never fails: the result is always a [`ValidationReport`]
//! - Exhaustive: issues are collected in one pass, not short-circuited,
//!   so the user sees every problem at once
//! - Duplicate ids are aggregated into one issue listing every value
//!
//! Validation walks a raw `serde_json::Value` by hand instead of
//! deserializing into typed structs; serde would stop at the first
//! mismatch and lose the remaining diagnostics.

use serde_json::Value;
use std::collections::BTreeSet;

use crate::primitives::MAX_CURVE_POINTS;
use crate::types::{ArrowType, HandleLocation, ValidationIssue, ValidationReport};

/// Ids collected while scanning the `objects` array, used afterwards to
/// resolve relationship endpoint references and position map keys.
struct EntityIndex {
    ids: BTreeSet<String>,
    duplicates: BTreeSet<String>,
}

fn finite_number(value: &Value) -> bool {
    value.as_f64().is_some_and(f64::is_finite)
}

fn non_empty_string(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn require_string(
    issues: &mut Vec<ValidationIssue>,
    entry: &serde_json::Map<String, Value>,
    field: &str,
    base_path: &str,
    message: &str,
    owner: Option<&str>,
) {
    if entry.get(field).and_then(Value::as_str).is_none() {
        let mut issue = ValidationIssue::new(message).at(format!("{base_path}.{field}"));
        if let Some(owner) = owner {
            issue = issue.on(owner);
        }
        issues.push(issue);
    }
}

/// Validate an arbitrary parsed JSON value as a numerical model document.
///
/// Rules are checked exhaustively so multiple issues can be reported in
/// one pass. The only early return is a non-object root, where nothing
/// else can meaningfully be inspected.
#[must_use]
pub fn validate(data: &Value) -> ValidationReport {
    let mut issues = Vec::new();

    let Some(root) = data.as_object() else {
        issues.push(ValidationIssue::new("document root must be a JSON object"));
        return ValidationReport::from_issues(issues);
    };

    let objects = root.get("objects");
    let relationships = root.get("relationships");

    if !matches!(objects, Some(Value::Array(_))) {
        issues.push(ValidationIssue::new("objects must be an array").at("objects"));
    }
    if !matches!(relationships, Some(Value::Array(_))) {
        issues.push(ValidationIssue::new("relationships must be an array").at("relationships"));
    }

    let index = match objects {
        Some(Value::Array(entries)) => scan_objects(&mut issues, entries),
        _ => EntityIndex {
            ids: BTreeSet::new(),
            duplicates: BTreeSet::new(),
        },
    };

    if !index.duplicates.is_empty() {
        let list = index.duplicates.iter().cloned().collect::<Vec<_>>().join(", ");
        issues.push(
            ValidationIssue::new(format!("duplicate Object.id values: {list}"))
                .at("objects")
                .hint("make every object id unique"),
        );
    }

    if let Some(positions) = root.get("positions") {
        scan_positions(&mut issues, positions, &index.ids);
    }

    if let Some(Value::Array(entries)) = relationships {
        scan_relationships(&mut issues, entries, &index.ids);
    }

    ValidationReport::from_issues(issues)
}

/// Export-tier validation: everything [`validate`] checks, plus every
/// entity must carry a non-empty (trimmed) name. A base failure is
/// returned unchanged.
#[must_use]
pub fn validate_for_export(data: &Value) -> ValidationReport {
    let base = validate(data);
    if !base.ok {
        return base;
    }

    let mut issues = base.issues;
    if let Some(Value::Array(entries)) = data.get("objects") {
        for (index, entry) in entries.iter().enumerate() {
            let Some(entry) = entry.as_object() else {
                continue;
            };
            let name = entry.get("name").and_then(Value::as_str).unwrap_or_default();
            if name.trim().is_empty() {
                let mut issue =
                    ValidationIssue::new("Object.name must not be empty (export check)")
                        .at(format!("objects[{index}].name"))
                        .hint("name the object before exporting");
                if let Some(id) = entry.get("id").and_then(Value::as_str) {
                    issue = issue.on(id);
                }
                issues.push(issue);
            }
        }
    }

    ValidationReport::from_issues(issues)
}

fn scan_objects(issues: &mut Vec<ValidationIssue>, entries: &[Value]) -> EntityIndex {
    let mut ids = BTreeSet::new();
    let mut duplicates = BTreeSet::new();

    for (index, raw) in entries.iter().enumerate() {
        let base_path = format!("objects[{index}]");
        let Some(entry) = raw.as_object() else {
            issues.push(ValidationIssue::new("Object must be a JSON object").at(base_path));
            continue;
        };

        let id = non_empty_string(entry.get("id"));
        match id {
            Some(id) => {
                if !ids.insert(id.to_string()) {
                    duplicates.insert(id.to_string());
                }
            }
            None => {
                issues.push(
                    ValidationIssue::new("Object.id must be a non-empty string")
                        .at(format!("{base_path}.id")),
                );
            }
        }

        require_string(issues, entry, "name", &base_path, "Object.name must be a string", id);
        require_string(
            issues,
            entry,
            "description",
            &base_path,
            "Object.description must be a string",
            id,
        );

        match entry.get("attributes") {
            Some(Value::Array(attributes)) => {
                for (attr_index, attr_raw) in attributes.iter().enumerate() {
                    let attr_path = format!("{base_path}.attributes[{attr_index}]");
                    let Some(attr) = attr_raw.as_object() else {
                        let mut issue =
                            ValidationIssue::new("Attribute must be a JSON object").at(attr_path);
                        if let Some(id) = id {
                            issue = issue.on(id);
                        }
                        issues.push(issue);
                        continue;
                    };
                    require_string(
                        issues,
                        attr,
                        "name",
                        &attr_path,
                        "Attribute.name must be a string",
                        id,
                    );
                    require_string(
                        issues,
                        attr,
                        "description",
                        &attr_path,
                        "Attribute.description must be a string",
                        id,
                    );
                    require_string(
                        issues,
                        attr,
                        "formula",
                        &attr_path,
                        "Attribute.formula must be a string",
                        id,
                    );
                }
            }
            _ => {
                let mut issue = ValidationIssue::new("Object.attributes must be an array")
                    .at(format!("{base_path}.attributes"));
                if let Some(id) = id {
                    issue = issue.on(id);
                }
                issues.push(issue);
            }
        }
    }

    EntityIndex { ids, duplicates }
}

fn scan_positions(issues: &mut Vec<ValidationIssue>, positions: &Value, ids: &BTreeSet<String>) {
    let Some(map) = positions.as_object() else {
        issues.push(
            ValidationIssue::new("positions must be an object map ({ [objectId]: {x, y} })")
                .at("positions")
                .hint("remove the field or provide a position map"),
        );
        return;
    };

    for (entity_id, raw) in map {
        // Unknown ids are ignored: forward-compatible partial layouts.
        if !ids.contains(entity_id) {
            continue;
        }

        let base_path = format!("positions.{entity_id}");
        let Some(pos) = raw.as_object() else {
            issues.push(
                ValidationIssue::new("positions[objectId] must be an object ({x, y})")
                    .at(base_path)
                    .on(entity_id.clone())
                    .hint("provide { x: number, y: number } for this object"),
            );
            continue;
        };

        if !pos.get("x").is_some_and(finite_number) {
            issues.push(
                ValidationIssue::new("positions.x must be a finite number")
                    .at(format!("{base_path}.x"))
                    .on(entity_id.clone()),
            );
        }
        if !pos.get("y").is_some_and(finite_number) {
            issues.push(
                ValidationIssue::new("positions.y must be a finite number")
                    .at(format!("{base_path}.y"))
                    .on(entity_id.clone()),
            );
        }
    }
}

fn scan_relationships(
    issues: &mut Vec<ValidationIssue>,
    entries: &[Value],
    entity_ids: &BTreeSet<String>,
) {
    let mut ids: BTreeSet<String> = BTreeSet::new();
    let mut duplicates: BTreeSet<String> = BTreeSet::new();

    for (index, raw) in entries.iter().enumerate() {
        let base_path = format!("relationships[{index}]");
        let Some(entry) = raw.as_object() else {
            issues.push(ValidationIssue::new("Relationship must be a JSON object").at(base_path));
            continue;
        };

        let id = non_empty_string(entry.get("id"));
        match id {
            Some(id) => {
                if !ids.insert(id.to_string()) {
                    duplicates.insert(id.to_string());
                }
            }
            None => {
                issues.push(
                    ValidationIssue::new("Relationship.id must be a non-empty string")
                        .at(format!("{base_path}.id")),
                );
            }
        }

        require_string(
            issues,
            entry,
            "name",
            &base_path,
            "Relationship.name must be a string",
            id,
        );
        require_string(
            issues,
            entry,
            "description",
            &base_path,
            "Relationship.description must be a string",
            id,
        );

        for endpoint in ["fromId", "toId"] {
            match non_empty_string(entry.get(endpoint)) {
                None => {
                    let mut issue = ValidationIssue::new(format!(
                        "Relationship.{endpoint} must be a non-empty string"
                    ))
                    .at(format!("{base_path}.{endpoint}"));
                    if let Some(id) = id {
                        issue = issue.on(id);
                    }
                    issues.push(issue);
                }
                Some(target) if !entity_ids.contains(target) => {
                    let mut issue = ValidationIssue::new(format!(
                        "{endpoint} references unknown object id \"{target}\""
                    ))
                    .at(format!("{base_path}.{endpoint}"))
                    .hint(format!("fix {endpoint} or add the missing object"));
                    if let Some(id) = id {
                        issue = issue.on(id);
                    }
                    issues.push(issue);
                }
                Some(_) => {}
            }
        }

        let arrow_ok = entry
            .get("arrowType")
            .and_then(Value::as_str)
            .and_then(ArrowType::parse)
            .is_some();
        if !arrow_ok {
            let mut issue = ValidationIssue::new("arrowType must be one of single / double / none")
                .at(format!("{base_path}.arrowType"));
            if let Some(id) = id {
                issue = issue.on(id);
            }
            issues.push(issue);
        }

        for handle in ["fromHandle", "toHandle"] {
            if let Some(raw_handle) = entry.get(handle) {
                let handle_ok = raw_handle
                    .as_str()
                    .and_then(HandleLocation::parse)
                    .is_some();
                if !handle_ok {
                    let mut issue = ValidationIssue::new(format!(
                        "{handle} must be one of left / right / top / bottom"
                    ))
                    .at(format!("{base_path}.{handle}"));
                    if let Some(id) = id {
                        issue = issue.on(id);
                    }
                    issues.push(issue);
                }
            }
        }

        require_string(
            issues,
            entry,
            "label",
            &base_path,
            "Relationship.label must be a string",
            id,
        );

        if let Some(curve_points) = entry.get("curvePoints") {
            scan_curve_points(issues, curve_points, &base_path, id);
        }
    }

    if !duplicates.is_empty() {
        let list = duplicates.iter().cloned().collect::<Vec<_>>().join(", ");
        issues.push(
            ValidationIssue::new(format!("duplicate Relationship.id values: {list}"))
                .at("relationships")
                .hint("make every relationship id unique"),
        );
    }
}

fn scan_curve_points(
    issues: &mut Vec<ValidationIssue>,
    curve_points: &Value,
    base_path: &str,
    owner: Option<&str>,
) {
    let attach = |mut issue: ValidationIssue| {
        if let Some(owner) = owner {
            issue = issue.on(owner);
        }
        issue
    };

    let Some(points) = curve_points.as_array() else {
        issues.push(attach(
            ValidationIssue::new("Relationship.curvePoints must be an array")
                .at(format!("{base_path}.curvePoints"))
                .hint(format!(
                    "remove the field or provide at most {MAX_CURVE_POINTS} control points"
                )),
        ));
        return;
    };

    if points.len() > MAX_CURVE_POINTS {
        issues.push(attach(
            ValidationIssue::new(format!(
                "Relationship.curvePoints must not exceed {MAX_CURVE_POINTS} points"
            ))
            .at(format!("{base_path}.curvePoints"))
            .hint(format!("remove extra control points (maximum {MAX_CURVE_POINTS})")),
        ));
    }

    for (point_index, raw) in points.iter().enumerate() {
        let point_path = format!("{base_path}.curvePoints[{point_index}]");
        let Some(point) = raw.as_object() else {
            issues.push(attach(
                ValidationIssue::new("curvePoint must be a JSON object").at(point_path),
            ));
            continue;
        };
        if !point.get("x").is_some_and(finite_number) {
            issues.push(attach(
                ValidationIssue::new("curvePoint.x must be a finite number")
                    .at(format!("{point_path}.x")),
            ));
        }
        if !point.get("y").is_some_and(finite_number) {
            issues.push(attach(
                ValidationIssue::new("curvePoint.y must be a finite number")
                    .at(format!("{point_path}.y")),
            ));
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
