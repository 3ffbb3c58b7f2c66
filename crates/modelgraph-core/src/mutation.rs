//! # Mutation Engine
//!
//! Guarded graph operations over a [`Model`].
//!
//! Every operation either fully applies or fully fails with a
//! [`ModelError`], leaving the model untouched. Guards enforced here:
//! - No self-relationships (`fromId != toId`)
//! - At most one relationship per unordered entity pair, regardless of
//!   direction or arrow type
//! - An entity with attached relationships cannot be deleted
//! - At most [`MAX_CURVE_POINTS`] curve points per relationship
//!
//! The engine is stateless; the [`crate::session::Session`] layers
//! selection, positions and dirty tracking on top of these calls.

use crate::primitives::MAX_CURVE_POINTS;
use crate::types::{
    ArrowType, Attribute, Entity, HandleLocation, Model, ModelError, Point, Relationship,
};

/// Partial update for an entity; `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct EntityPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Partial update for a relationship's editable fields.
#[derive(Debug, Clone, Default)]
pub struct RelationshipPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub label: Option<String>,
    pub arrow_type: Option<ArrowType>,
}

/// Partial update for one attribute of an entity.
#[derive(Debug, Clone, Default)]
pub struct AttributePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub formula: Option<String>,
}

/// Endpoint/handle changes for [`MutationEngine::reconnect_relationship`];
/// `None` fields keep the relationship's current value.
#[derive(Debug, Clone, Default)]
pub struct Reconnect {
    pub from_id: Option<String>,
    pub to_id: Option<String>,
    pub from_handle: Option<HandleLocation>,
    pub to_handle: Option<HandleLocation>,
}

/// Display name given to freshly created relationships.
pub const DEFAULT_RELATIONSHIP_NAME: &str = "Untitled relationship";

/// The MutationEngine consolidates all guarded model mutations.
pub struct MutationEngine;

impl MutationEngine {
    /// Allocate a fresh id with the given prefix (`obj` or `rel`),
    /// skipping any id already present in the model. Sequential rather
    /// than random so repeated sessions stay deterministic and exported
    /// documents stay diffable.
    #[must_use]
    pub fn fresh_id(model: &Model, prefix: &str) -> String {
        let taken = |candidate: &str| {
            model.contains_entity(candidate) || model.relationship(candidate).is_some()
        };
        let mut n = model.entities.len() + model.relationships.len() + 1;
        loop {
            let candidate = format!("{prefix}_{n}");
            if !taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Append a new entity with the given display name and no attributes.
    /// Returns the freshly allocated id.
    pub fn create_entity(model: &mut Model, name: impl Into<String>) -> String {
        let id = Self::fresh_id(model, "obj");
        model.entities.push(Entity {
            id: id.clone(),
            name: name.into(),
            description: String::new(),
            attributes: Vec::new(),
        });
        id
    }

    /// Apply a partial field update to an entity.
    pub fn update_entity(
        model: &mut Model,
        id: &str,
        patch: EntityPatch,
    ) -> Result<(), ModelError> {
        let entity = model.entity_mut(id).ok_or_else(|| ModelError::UnknownEntity {
            id: id.to_string(),
        })?;
        if let Some(name) = patch.name {
            entity.name = name;
        }
        if let Some(description) = patch.description {
            entity.description = description;
        }
        Ok(())
    }

    /// Append an empty attribute row to an entity.
    pub fn add_attribute(model: &mut Model, entity_id: &str) -> Result<(), ModelError> {
        let entity = model
            .entity_mut(entity_id)
            .ok_or_else(|| ModelError::UnknownEntity {
                id: entity_id.to_string(),
            })?;
        entity.attributes.push(Attribute::empty());
        Ok(())
    }

    /// Apply a partial update to the attribute at `index`. An
    /// out-of-bounds index is a silent no-op, matching field edits
    /// racing a concurrent row deletion in the panel.
    pub fn update_attribute(
        model: &mut Model,
        entity_id: &str,
        index: usize,
        patch: AttributePatch,
    ) -> Result<(), ModelError> {
        let entity = model
            .entity_mut(entity_id)
            .ok_or_else(|| ModelError::UnknownEntity {
                id: entity_id.to_string(),
            })?;
        let Some(attribute) = entity.attributes.get_mut(index) else {
            return Ok(());
        };
        if let Some(name) = patch.name {
            attribute.name = name;
        }
        if let Some(description) = patch.description {
            attribute.description = description;
        }
        if let Some(formula) = patch.formula {
            attribute.formula = formula;
        }
        Ok(())
    }

    /// Create a relationship between two existing entities.
    ///
    /// Fails without mutating when the endpoints are equal, either
    /// endpoint is unknown, or the unordered pair is already connected.
    /// The new relationship gets the default display name, default
    /// arrow semantics (`single`), an empty label and no curve points.
    /// Returns the fresh id.
    pub fn create_relationship(
        model: &mut Model,
        from_id: &str,
        to_id: &str,
        from_handle: Option<HandleLocation>,
        to_handle: Option<HandleLocation>,
    ) -> Result<String, ModelError> {
        if from_id == to_id {
            return Err(ModelError::SelfRelationship);
        }
        for endpoint in [from_id, to_id] {
            if !model.contains_entity(endpoint) {
                return Err(ModelError::UnknownEntity {
                    id: endpoint.to_string(),
                });
            }
        }
        if model.pair_exists(from_id, to_id, None) {
            return Err(ModelError::DuplicatePair {
                a: from_id.to_string(),
                b: to_id.to_string(),
            });
        }

        let id = Self::fresh_id(model, "rel");
        model.relationships.push(Relationship {
            id: id.clone(),
            name: DEFAULT_RELATIONSHIP_NAME.to_string(),
            description: String::new(),
            from_id: from_id.to_string(),
            to_id: to_id.to_string(),
            from_handle: from_handle.unwrap_or(HandleLocation::default_from()),
            to_handle: to_handle.unwrap_or(HandleLocation::default_to()),
            arrow_type: ArrowType::Single,
            label: String::new(),
            curve_points: None,
        });
        Ok(id)
    }

    /// Apply a partial field update to a relationship.
    pub fn update_relationship(
        model: &mut Model,
        id: &str,
        patch: RelationshipPatch,
    ) -> Result<(), ModelError> {
        let rel = model
            .relationship_mut(id)
            .ok_or_else(|| ModelError::UnknownRelationship { id: id.to_string() })?;
        if let Some(name) = patch.name {
            rel.name = name;
        }
        if let Some(description) = patch.description {
            rel.description = description;
        }
        if let Some(label) = patch.label {
            rel.label = label;
        }
        if let Some(arrow_type) = patch.arrow_type {
            rel.arrow_type = arrow_type;
        }
        Ok(())
    }

    /// Move a relationship's endpoints and/or handles.
    ///
    /// Omitted fields keep their current value. Returns `Ok(false)`
    /// without touching anything when the resulting tuple equals the
    /// current one. Endpoint changes re-check the self and duplicate
    /// guards against all *other* relationships; a handle-only change
    /// can never trip the duplicate guard.
    pub fn reconnect_relationship(
        model: &mut Model,
        id: &str,
        request: Reconnect,
    ) -> Result<bool, ModelError> {
        let current = model
            .relationship(id)
            .ok_or_else(|| ModelError::UnknownRelationship { id: id.to_string() })?;

        let next_from = request.from_id.unwrap_or_else(|| current.from_id.clone());
        let next_to = request.to_id.unwrap_or_else(|| current.to_id.clone());
        let next_from_handle = request.from_handle.unwrap_or(current.from_handle);
        let next_to_handle = request.to_handle.unwrap_or(current.to_handle);

        let unchanged = next_from == current.from_id
            && next_to == current.to_id
            && next_from_handle == current.from_handle
            && next_to_handle == current.to_handle;
        if unchanged {
            return Ok(false);
        }

        if next_from == next_to {
            return Err(ModelError::SelfRelationship);
        }
        for endpoint in [next_from.as_str(), next_to.as_str()] {
            if !model.contains_entity(endpoint) {
                return Err(ModelError::UnknownEntity {
                    id: endpoint.to_string(),
                });
            }
        }
        if model.pair_exists(&next_from, &next_to, Some(id)) {
            return Err(ModelError::DuplicatePair {
                a: next_from,
                b: next_to,
            });
        }

        // Guards passed; commit in one step.
        if let Some(rel) = model.relationship_mut(id) {
            rel.from_id = next_from;
            rel.to_id = next_to;
            rel.from_handle = next_from_handle;
            rel.to_handle = next_to_handle;
        }
        Ok(true)
    }

    /// Delete an entity. Fails with [`ModelError::EntityInUse`] while
    /// any relationship still references it at either endpoint.
    pub fn delete_entity(model: &mut Model, id: &str) -> Result<(), ModelError> {
        if !model.contains_entity(id) {
            return Err(ModelError::UnknownEntity { id: id.to_string() });
        }
        let references = model.reference_count(id);
        if references > 0 {
            return Err(ModelError::EntityInUse {
                id: id.to_string(),
                references,
            });
        }
        model.entities.retain(|e| e.id != id);
        Ok(())
    }

    /// Delete a relationship unconditionally. Returns whether anything
    /// was removed.
    pub fn delete_relationship(model: &mut Model, id: &str) -> bool {
        let before = model.relationships.len();
        model.relationships.retain(|r| r.id != id);
        model.relationships.len() != before
    }

    /// Insert a curve control point at `insert_index` (clamped into the
    /// current point range). Fails with a capacity error once the
    /// relationship holds [`MAX_CURVE_POINTS`] points.
    pub fn insert_curve_point(
        model: &mut Model,
        relationship_id: &str,
        point: Point,
        insert_index: usize,
    ) -> Result<(), ModelError> {
        let rel = model
            .relationship_mut(relationship_id)
            .ok_or_else(|| ModelError::UnknownRelationship {
                id: relationship_id.to_string(),
            })?;

        let points = rel.curve_points.get_or_insert_with(Vec::new);
        if points.len() >= MAX_CURVE_POINTS {
            return Err(ModelError::CurvePointLimit {
                id: relationship_id.to_string(),
                max: MAX_CURVE_POINTS,
            });
        }
        let index = insert_index.min(points.len());
        points.insert(index, point);
        Ok(())
    }

    /// Remove the curve point at `index`. Out-of-bounds is a no-op;
    /// returns whether a point was removed.
    pub fn delete_curve_point(
        model: &mut Model,
        relationship_id: &str,
        index: usize,
    ) -> Result<bool, ModelError> {
        let rel = model
            .relationship_mut(relationship_id)
            .ok_or_else(|| ModelError::UnknownRelationship {
                id: relationship_id.to_string(),
            })?;
        let Some(points) = rel.curve_points.as_mut() else {
            return Ok(false);
        };
        if index >= points.len() {
            return Ok(false);
        }
        points.remove(index);
        Ok(true)
    }

    /// Replace the curve point at `index`. Out-of-bounds is a no-op;
    /// returns whether a point was moved.
    pub fn move_curve_point(
        model: &mut Model,
        relationship_id: &str,
        index: usize,
        point: Point,
    ) -> Result<bool, ModelError> {
        let rel = model
            .relationship_mut(relationship_id)
            .ok_or_else(|| ModelError::UnknownRelationship {
                id: relationship_id.to_string(),
            })?;
        let Some(target) = rel.curve_points.as_mut().and_then(|p| p.get_mut(index)) else {
            return Ok(false);
        };
        *target = point;
        Ok(true)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn model_with_entities(ids: &[&str]) -> Model {
        let mut model = Model::new();
        for id in ids {
            model.entities.push(Entity {
                id: id.to_string(),
                name: id.to_string(),
                description: String::new(),
                attributes: Vec::new(),
            });
        }
        model
    }

    fn connect(model: &mut Model, a: &str, b: &str) -> String {
        MutationEngine::create_relationship(model, a, b, None, None).expect("create")
    }

    #[test]
    fn fresh_ids_skip_existing_ones() {
        let mut model = model_with_entities(&["obj_1", "obj_2"]);
        let id = MutationEngine::create_entity(&mut model, "C");
        assert_eq!(id, "obj_3");
        assert!(model.contains_entity("obj_3"));
    }

    #[test]
    fn self_relationship_is_rejected_without_mutation() {
        let mut model = model_with_entities(&["a", "b"]);
        let err = MutationEngine::create_relationship(&mut model, "a", "a", None, None)
            .expect_err("self edge");
        assert_eq!(err, ModelError::SelfRelationship);
        assert!(model.relationships.is_empty());
    }

    #[test]
    fn duplicate_pair_is_rejected_in_both_directions() {
        let mut model = model_with_entities(&["a", "b"]);
        connect(&mut model, "a", "b");

        for (from, to) in [("a", "b"), ("b", "a")] {
            let err = MutationEngine::create_relationship(&mut model, from, to, None, None)
                .expect_err("duplicate");
            assert!(matches!(err, ModelError::DuplicatePair { .. }));
            assert_eq!(model.relationships.len(), 1);
        }
    }

    #[test]
    fn created_relationship_gets_defaults() {
        let mut model = model_with_entities(&["a", "b"]);
        let id = connect(&mut model, "a", "b");
        let rel = model.relationship(&id).expect("exists");
        assert_eq!(rel.name, DEFAULT_RELATIONSHIP_NAME);
        assert_eq!(rel.arrow_type, ArrowType::Single);
        assert_eq!(rel.from_handle, HandleLocation::Right);
        assert_eq!(rel.to_handle, HandleLocation::Left);
        assert_eq!(rel.label, "");
        assert!(rel.curve_points.is_none());
    }

    #[test]
    fn unknown_endpoint_is_rejected() {
        let mut model = model_with_entities(&["a"]);
        let err = MutationEngine::create_relationship(&mut model, "a", "ghost", None, None)
            .expect_err("unknown");
        assert_eq!(
            err,
            ModelError::UnknownEntity {
                id: "ghost".to_string()
            }
        );
    }

    #[test]
    fn reconnect_unchanged_tuple_is_a_noop() {
        let mut model = model_with_entities(&["a", "b"]);
        let id = connect(&mut model, "a", "b");
        let changed = MutationEngine::reconnect_relationship(
            &mut model,
            &id,
            Reconnect {
                from_id: Some("a".to_string()),
                ..Reconnect::default()
            },
        )
        .expect("noop");
        assert!(!changed);
    }

    #[test]
    fn handle_only_reconnect_never_hits_the_duplicate_guard() {
        let mut model = model_with_entities(&["a", "b", "c"]);
        let id = connect(&mut model, "a", "b");
        connect(&mut model, "b", "c");

        let changed = MutationEngine::reconnect_relationship(
            &mut model,
            &id,
            Reconnect {
                from_handle: Some(HandleLocation::Top),
                to_handle: Some(HandleLocation::Bottom),
                ..Reconnect::default()
            },
        )
        .expect("handles only");
        assert!(changed);
        let rel = model.relationship(&id).expect("exists");
        assert_eq!(rel.from_handle, HandleLocation::Top);
        assert_eq!(rel.to_handle, HandleLocation::Bottom);
    }

    #[test]
    fn reconnect_into_duplicate_pair_leaves_everything_untouched() {
        let mut model = model_with_entities(&["a", "b", "c"]);
        let ab = connect(&mut model, "a", "b");
        let bc = connect(&mut model, "b", "c");
        let snapshot = model.clone();

        // Moving a->b onto c->b collides with the existing b->c pair.
        let err = MutationEngine::reconnect_relationship(
            &mut model,
            &ab,
            Reconnect {
                from_id: Some("c".to_string()),
                ..Reconnect::default()
            },
        )
        .expect_err("duplicate pair");
        assert!(matches!(err, ModelError::DuplicatePair { .. }));
        assert_eq!(model, snapshot);
        assert_eq!(model.relationship(&bc), snapshot.relationship(&bc));
    }

    #[test]
    fn reconnect_to_self_is_rejected() {
        let mut model = model_with_entities(&["a", "b"]);
        let id = connect(&mut model, "a", "b");
        let err = MutationEngine::reconnect_relationship(
            &mut model,
            &id,
            Reconnect {
                to_id: Some("a".to_string()),
                ..Reconnect::default()
            },
        )
        .expect_err("self");
        assert_eq!(err, ModelError::SelfRelationship);
    }

    #[test]
    fn delete_entity_blocked_while_referenced() {
        let mut model = model_with_entities(&["a", "b"]);
        let rel = connect(&mut model, "a", "b");

        let err = MutationEngine::delete_entity(&mut model, "a").expect_err("in use");
        assert_eq!(
            err,
            ModelError::EntityInUse {
                id: "a".to_string(),
                references: 1
            }
        );
        assert!(model.contains_entity("a"));

        assert!(MutationEngine::delete_relationship(&mut model, &rel));
        MutationEngine::delete_entity(&mut model, "a").expect("now deletable");
        assert!(!model.contains_entity("a"));
    }

    #[test]
    fn delete_relationship_is_unconditional() {
        let mut model = model_with_entities(&["a", "b"]);
        let id = connect(&mut model, "a", "b");
        assert!(MutationEngine::delete_relationship(&mut model, &id));
        assert!(!MutationEngine::delete_relationship(&mut model, &id));
    }

    #[test]
    fn curve_points_capped_at_five() {
        let mut model = model_with_entities(&["a", "b"]);
        let id = connect(&mut model, "a", "b");

        for i in 0..5 {
            MutationEngine::insert_curve_point(
                &mut model,
                &id,
                Point::new(i as f64, 0.0),
                i,
            )
            .expect("within cap");
        }
        let err =
            MutationEngine::insert_curve_point(&mut model, &id, Point::new(9.0, 9.0), 0)
                .expect_err("cap");
        assert!(matches!(err, ModelError::CurvePointLimit { .. }));
        assert_eq!(model.relationship(&id).expect("rel").curve_point_count(), 5);
    }

    #[test]
    fn insert_index_is_clamped() {
        let mut model = model_with_entities(&["a", "b"]);
        let id = connect(&mut model, "a", "b");
        MutationEngine::insert_curve_point(&mut model, &id, Point::new(1.0, 0.0), 99)
            .expect("clamped to end");
        MutationEngine::insert_curve_point(&mut model, &id, Point::new(0.0, 0.0), 0)
            .expect("front");
        let points = model
            .relationship(&id)
            .expect("rel")
            .curve_points
            .clone()
            .expect("points");
        assert_eq!(points, vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
    }

    #[test]
    fn curve_point_delete_and_move_ignore_out_of_bounds() {
        let mut model = model_with_entities(&["a", "b"]);
        let id = connect(&mut model, "a", "b");

        assert!(!MutationEngine::delete_curve_point(&mut model, &id, 0).expect("no points"));
        assert!(
            !MutationEngine::move_curve_point(&mut model, &id, 0, Point::new(1.0, 1.0))
                .expect("no points")
        );

        MutationEngine::insert_curve_point(&mut model, &id, Point::new(5.0, 5.0), 0)
            .expect("insert");
        assert!(
            MutationEngine::move_curve_point(&mut model, &id, 0, Point::new(7.0, 7.0))
                .expect("move")
        );
        assert!(!MutationEngine::delete_curve_point(&mut model, &id, 3).expect("oob"));
        assert!(MutationEngine::delete_curve_point(&mut model, &id, 0).expect("delete"));
        assert_eq!(model.relationship(&id).expect("rel").curve_point_count(), 0);
    }

    #[test]
    fn attribute_edits_land_on_the_right_row() {
        let mut model = model_with_entities(&["a"]);
        MutationEngine::add_attribute(&mut model, "a").expect("add");
        MutationEngine::add_attribute(&mut model, "a").expect("add");
        MutationEngine::update_attribute(
            &mut model,
            "a",
            1,
            AttributePatch {
                formula: Some("x * 2".to_string()),
                ..AttributePatch::default()
            },
        )
        .expect("update");
        // Out of bounds: silent no-op.
        MutationEngine::update_attribute(
            &mut model,
            "a",
            9,
            AttributePatch {
                name: Some("ghost".to_string()),
                ..AttributePatch::default()
            },
        )
        .expect("noop");

        let entity = model.entity("a").expect("entity");
        assert_eq!(entity.attributes[0].formula, "");
        assert_eq!(entity.attributes[1].formula, "x * 2");
    }
}
