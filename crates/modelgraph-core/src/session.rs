//! # Editor Session
//!
//! One open document: the typed [`Model`], the canvas positions, the
//! current selection, the dirty flag and the two-click relationship
//! workflow. The session owns all cross-cutting consistency that the
//! stateless [`MutationEngine`] cannot see, e.g. dropping the selection
//! and the stored position together when an entity is deleted.
//!
//! Imports are generation-counted: [`Session::begin_import`] hands out
//! a ticket, and a ticket older than the latest one is refused when it
//! finishes. This gives overlapping file loads last-write-wins
//! semantics without ever applying a stale document over a newer one.

use crate::document::{self, ExportError};
use crate::geometry::nearest_segment;
use crate::layout::{auto_layout, next_grid_position};
use crate::mutation::{AttributePatch, EntityPatch, MutationEngine, Reconnect, RelationshipPatch};
use crate::types::{
    HandleLocation, ImportError, Model, ModelError, Point, PositionMap, Selection,
};
use crate::validate::{validate, validate_for_export};

/// Display name given to entities created from the toolbar.
pub const DEFAULT_ENTITY_NAME: &str = "Untitled object";

/// State of the two-click relationship workflow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PendingRelationship {
    /// No relationship being drawn; endpoint picks are ignored.
    #[default]
    Idle,
    /// Armed from the toolbar; the next pick chooses the source.
    AwaitingFirstEndpoint,
    /// Source chosen; the next pick attempts to connect.
    AwaitingSecondEndpoint { from_id: String },
}

/// Opaque handle for one in-flight import. Only the most recently
/// issued ticket may commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportTicket(u64);

/// What happened to a finished import.
#[derive(Debug, PartialEq, Eq)]
pub enum ImportOutcome {
    /// The document replaced the session state.
    Applied,
    /// A newer import started before this one finished; nothing changed.
    Superseded,
}

/// A single editing session over one document.
#[derive(Debug, Default)]
pub struct Session {
    model: Model,
    positions: PositionMap,
    selection: Option<Selection>,
    pending: PendingRelationship,
    dirty: bool,
    import_generation: u64,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // READ ACCESS
    // =========================================================================

    #[must_use]
    pub fn model(&self) -> &Model {
        &self.model
    }

    #[must_use]
    pub fn positions(&self) -> &PositionMap {
        &self.positions
    }

    #[must_use]
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    #[must_use]
    pub fn pending(&self) -> &PendingRelationship {
        &self.pending
    }

    /// Whether the document has unexported edits.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    pub fn select_entity(&mut self, id: &str) {
        if self.model.contains_entity(id) {
            self.selection = Some(Selection::Entity(id.to_string()));
        }
    }

    pub fn select_relationship(&mut self, id: &str) {
        if self.model.relationship(id).is_some() {
            self.selection = Some(Selection::Relationship(id.to_string()));
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    // =========================================================================
    // ENTITY OPERATIONS
    // =========================================================================

    /// Create an entity on the short new-entity grid, selecting it.
    /// Returns the new id.
    pub fn create_entity(&mut self) -> String {
        let slot = next_grid_position(self.model.entities.len());
        self.create_entity_at(slot)
    }

    /// Create an entity at an explicit canvas position, selecting it.
    pub fn create_entity_at(&mut self, position: Point) -> String {
        let id = MutationEngine::create_entity(&mut self.model, DEFAULT_ENTITY_NAME);
        self.positions.insert(id.clone(), position);
        self.selection = Some(Selection::Entity(id.clone()));
        self.dirty = true;
        id
    }

    pub fn update_entity(&mut self, id: &str, patch: EntityPatch) -> Result<(), ModelError> {
        MutationEngine::update_entity(&mut self.model, id, patch)?;
        self.dirty = true;
        Ok(())
    }

    pub fn add_attribute(&mut self, entity_id: &str) -> Result<(), ModelError> {
        MutationEngine::add_attribute(&mut self.model, entity_id)?;
        self.dirty = true;
        Ok(())
    }

    pub fn update_attribute(
        &mut self,
        entity_id: &str,
        index: usize,
        patch: AttributePatch,
    ) -> Result<(), ModelError> {
        MutationEngine::update_attribute(&mut self.model, entity_id, index, patch)?;
        self.dirty = true;
        Ok(())
    }

    /// Record a drag: move an entity's canvas position.
    pub fn move_entity(&mut self, id: &str, position: Point) -> Result<(), ModelError> {
        if !self.model.contains_entity(id) {
            return Err(ModelError::UnknownEntity { id: id.to_string() });
        }
        self.positions.insert(id.to_string(), position);
        self.dirty = true;
        Ok(())
    }

    /// Delete an entity. Refused while relationships still reference
    /// it; on success the stored position and any selection of it go
    /// away in the same step.
    pub fn delete_entity(&mut self, id: &str) -> Result<(), ModelError> {
        MutationEngine::delete_entity(&mut self.model, id)?;
        self.positions.remove(id);
        if self.selection == Some(Selection::Entity(id.to_string())) {
            self.selection = None;
        }
        self.dirty = true;
        Ok(())
    }

    // =========================================================================
    // RELATIONSHIP OPERATIONS
    // =========================================================================

    /// Arm the two-click workflow from the toolbar.
    pub fn start_relationship(&mut self) {
        self.pending = PendingRelationship::AwaitingFirstEndpoint;
    }

    /// Arm the workflow with the source already chosen, as when a drag
    /// starts from an entity's connection handle.
    pub fn start_relationship_from(&mut self, from_id: &str) {
        if self.model.contains_entity(from_id) {
            self.pending = PendingRelationship::AwaitingSecondEndpoint {
                from_id: from_id.to_string(),
            };
        }
    }

    pub fn cancel_relationship(&mut self) {
        self.pending = PendingRelationship::Idle;
    }

    /// Feed an entity click into the pending workflow.
    ///
    /// While idle this is a silent no-op. The first pick stores the
    /// source; the second attempts to connect, and whatever the result,
    /// the workflow returns to idle. A successful connection selects
    /// the new relationship and returns its id.
    pub fn pick_endpoint(&mut self, entity_id: &str) -> Result<Option<String>, ModelError> {
        match std::mem::take(&mut self.pending) {
            PendingRelationship::Idle => Ok(None),
            PendingRelationship::AwaitingFirstEndpoint => {
                if self.model.contains_entity(entity_id) {
                    self.pending = PendingRelationship::AwaitingSecondEndpoint {
                        from_id: entity_id.to_string(),
                    };
                } else {
                    self.pending = PendingRelationship::AwaitingFirstEndpoint;
                }
                Ok(None)
            }
            PendingRelationship::AwaitingSecondEndpoint { from_id } => {
                let id = MutationEngine::create_relationship(
                    &mut self.model,
                    &from_id,
                    entity_id,
                    None,
                    None,
                )?;
                self.selection = Some(Selection::Relationship(id.clone()));
                self.dirty = true;
                Ok(Some(id))
            }
        }
    }

    /// Create a relationship directly, bypassing the workflow. Used by
    /// handle-to-handle drags which know both endpoints at once. The new
    /// relationship becomes the selection.
    pub fn connect(
        &mut self,
        from_id: &str,
        to_id: &str,
        from_handle: Option<HandleLocation>,
        to_handle: Option<HandleLocation>,
    ) -> Result<String, ModelError> {
        let id = MutationEngine::create_relationship(
            &mut self.model,
            from_id,
            to_id,
            from_handle,
            to_handle,
        )?;
        self.selection = Some(Selection::Relationship(id.clone()));
        self.dirty = true;
        Ok(id)
    }

    pub fn update_relationship(
        &mut self,
        id: &str,
        patch: RelationshipPatch,
    ) -> Result<(), ModelError> {
        MutationEngine::update_relationship(&mut self.model, id, patch)?;
        self.dirty = true;
        Ok(())
    }

    pub fn reconnect_relationship(
        &mut self,
        id: &str,
        request: Reconnect,
    ) -> Result<bool, ModelError> {
        let changed = MutationEngine::reconnect_relationship(&mut self.model, id, request)?;
        if changed {
            self.dirty = true;
        }
        Ok(changed)
    }

    pub fn delete_relationship(&mut self, id: &str) -> bool {
        let removed = MutationEngine::delete_relationship(&mut self.model, id);
        if removed {
            if self.selection == Some(Selection::Relationship(id.to_string())) {
                self.selection = None;
            }
            self.dirty = true;
        }
        removed
    }

    // =========================================================================
    // CURVE POINTS
    // =========================================================================

    /// Insert a curve point where a double-click landed on the path.
    ///
    /// The click is projected onto the polyline running source position,
    /// existing curve points, target position; the point is inserted at
    /// the index of the nearest segment. Without positions for both
    /// endpoints the point is appended at the end instead.
    pub fn insert_curve_point_at(
        &mut self,
        relationship_id: &str,
        click: Point,
    ) -> Result<(), ModelError> {
        let insert_index = self
            .relationship_polyline(relationship_id)
            .and_then(|polyline| nearest_segment(&polyline, click))
            .map_or(usize::MAX, |hit| hit.insert_index);
        MutationEngine::insert_curve_point(&mut self.model, relationship_id, click, insert_index)?;
        self.dirty = true;
        Ok(())
    }

    pub fn move_curve_point(
        &mut self,
        relationship_id: &str,
        index: usize,
        point: Point,
    ) -> Result<bool, ModelError> {
        let moved = MutationEngine::move_curve_point(&mut self.model, relationship_id, index, point)?;
        if moved {
            self.dirty = true;
        }
        Ok(moved)
    }

    pub fn delete_curve_point(
        &mut self,
        relationship_id: &str,
        index: usize,
    ) -> Result<bool, ModelError> {
        let removed = MutationEngine::delete_curve_point(&mut self.model, relationship_id, index)?;
        if removed {
            self.dirty = true;
        }
        Ok(removed)
    }

    fn relationship_polyline(&self, relationship_id: &str) -> Option<Vec<Point>> {
        let rel = self.model.relationship(relationship_id)?;
        let from = *self.positions.get(&rel.from_id)?;
        let to = *self.positions.get(&rel.to_id)?;
        let mut polyline = Vec::with_capacity(rel.curve_point_count() + 2);
        polyline.push(from);
        if let Some(points) = &rel.curve_points {
            polyline.extend_from_slice(points);
        }
        polyline.push(to);
        Some(polyline)
    }

    // =========================================================================
    // IMPORT / EXPORT
    // =========================================================================

    /// Start an import and claim the latest generation. Any ticket
    /// issued earlier becomes stale from this point on.
    pub fn begin_import(&mut self) -> ImportTicket {
        self.import_generation += 1;
        ImportTicket(self.import_generation)
    }

    /// Finish an import with the loaded text.
    ///
    /// A stale ticket returns [`ImportOutcome::Superseded`] without
    /// reading the text. Otherwise the document is parsed and validated;
    /// any issue at all refuses the whole import, leaving the session
    /// untouched. On success the session is replaced wholesale: the
    /// coerced model, a deterministic grid layout overlaid with the
    /// document's own stored positions, no selection, idle workflow,
    /// clean dirty flag.
    pub fn finish_import(
        &mut self,
        ticket: ImportTicket,
        text: &str,
    ) -> Result<ImportOutcome, ImportError> {
        if ticket.0 != self.import_generation {
            return Ok(ImportOutcome::Superseded);
        }

        let data = document::parse(text)?;
        let report = validate(&data);
        if !report.ok {
            return Err(ImportError::Invalid(report));
        }

        let model = crate::coerce::coerce(&data);
        let mut positions = auto_layout(&model.entities);
        positions.extend(document::read_positions(&data, &model));

        self.model = model;
        self.positions = positions;
        self.selection = None;
        self.pending = PendingRelationship::Idle;
        self.dirty = false;
        Ok(ImportOutcome::Applied)
    }

    /// Load a document in one step.
    pub fn import_document(&mut self, text: &str) -> Result<(), ImportError> {
        let ticket = self.begin_import();
        self.finish_import(ticket, text).map(|_| ())
    }

    /// Serialize the session to pretty JSON, refusing when the export
    /// gate finds issues (currently: every entity must have a name). A
    /// successful export clears the dirty flag.
    pub fn export_document(&mut self) -> Result<String, ExportError> {
        let data = document::to_value(&self.model, &self.positions)?;
        let report = validate_for_export(&data);
        if !report.ok {
            return Err(ExportError::Invalid(report));
        }
        let text = document::render(&self.model, &self.positions)?;
        self.dirty = false;
        Ok(text)
    }
}

// =============================================================================
// TESTS
// =============================================================================
