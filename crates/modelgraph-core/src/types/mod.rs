//! # Core Type Definitions
//!
//! All core types for the modelgraph editing engine:
//! - The numerical model itself (`Model`, `Entity`, `Relationship`, `Attribute`)
//! - Closed wire enums (`ArrowType`, `HandleLocation`)
//! - Geometry (`Point`)
//! - Structured diagnostics (`ValidationIssue`, `ValidationReport`)
//! - Error types (`ModelError`, `ImportError`)
//!
//! ## Determinism Guarantees
//!
//! Collections owned by these types preserve insertion order (`Vec`) or
//! iterate in key order (`BTreeMap`), so serializing the same model twice
//! yields byte-identical documents.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::primitives::SCHEMA_VERSION;

// =============================================================================
// WIRE ENUMS
// =============================================================================

/// Arrow semantics of a relationship.
///
/// - `Single`: the `from` entity influences the `to` entity.
/// - `Double`: mutual influence.
/// - `None`: undirected association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowType {
    #[default]
    Single,
    Double,
    None,
}

impl ArrowType {
    /// Parse a wire string. Returns `None` for anything outside the closed set.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "single" => Some(Self::Single),
            "double" => Some(Self::Double),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    /// The wire string for this variant.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Double => "double",
            Self::None => "none",
        }
    }
}

/// The side of an entity's visual box an edge endpoint attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleLocation {
    Left,
    Right,
    Top,
    Bottom,
}

impl HandleLocation {
    /// Parse a wire string. Returns `None` for anything outside the closed set.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "top" => Some(Self::Top),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }

    /// The wire string for this variant.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }

    /// Default attachment side for the `from` endpoint.
    #[must_use]
    pub const fn default_from() -> Self {
        Self::Right
    }

    /// Default attachment side for the `to` endpoint.
    #[must_use]
    pub const fn default_to() -> Self {
        Self::Left
    }
}

// =============================================================================
// GEOMETRY
// =============================================================================

/// A 2-D point in canvas coordinates.
///
/// Used both for persisted entity positions and for user-placed curve
/// control points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// =============================================================================
// MODEL
// =============================================================================

/// A named, described and formula-bearing attribute of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub description: String,
    pub formula: String,
}

impl Attribute {
    /// A fully empty attribute, as created by the "add attribute" action.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// A modeled object: a node of the numerical model.
///
/// `id` is unique within the model, non-empty, and stable for the
/// entity's lifetime. `name` may be empty while editing but must be
/// non-empty at export time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub description: String,
    pub attributes: Vec<Attribute>,
}

/// A directed-or-undirected edge between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "fromId")]
    pub from_id: String,
    #[serde(rename = "toId")]
    pub to_id: String,
    #[serde(rename = "fromHandle")]
    pub from_handle: HandleLocation,
    #[serde(rename = "toHandle")]
    pub to_handle: HandleLocation,
    #[serde(rename = "arrowType")]
    pub arrow_type: ArrowType,
    pub label: String,
    /// User-placed curve control points (0..=5). The implicit endpoints
    /// are derived from the endpoint entity positions; an absent value
    /// round-trips as absent.
    #[serde(rename = "curvePoints", skip_serializing_if = "Option::is_none")]
    pub curve_points: Option<Vec<Point>>,
}

impl Relationship {
    /// Whether this relationship connects the unordered pair `{a, b}`.
    #[must_use]
    pub fn connects_pair(&self, a: &str, b: &str) -> bool {
        (self.from_id == a && self.to_id == b) || (self.from_id == b && self.to_id == a)
    }

    /// Whether this relationship references the given entity id at
    /// either endpoint.
    #[must_use]
    pub fn references(&self, entity_id: &str) -> bool {
        self.from_id == entity_id || self.to_id == entity_id
    }

    /// Number of user-placed curve control points.
    #[must_use]
    pub fn curve_point_count(&self) -> usize {
        self.curve_points.as_ref().map_or(0, Vec::len)
    }
}

/// The in-memory numerical model: ordered entities and relationships.
///
/// A `Model` obtained via [`crate::coerce::coerce`] or built through
/// [`crate::mutation::MutationEngine`] upholds the referential and
/// uniqueness invariants; arbitrary construction does not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,
    #[serde(rename = "objects")]
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            entities: Vec::new(),
            relationships: Vec::new(),
        }
    }
}

impl Model {
    /// Create a new empty model at the current schema version.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entity by id.
    #[must_use]
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Look up an entity by id, mutably.
    pub fn entity_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    /// Look up a relationship by id.
    #[must_use]
    pub fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.id == id)
    }

    /// Look up a relationship by id, mutably.
    pub fn relationship_mut(&mut self, id: &str) -> Option<&mut Relationship> {
        self.relationships.iter_mut().find(|r| r.id == id)
    }

    /// Whether an entity with this id exists.
    #[must_use]
    pub fn contains_entity(&self, id: &str) -> bool {
        self.entity(id).is_some()
    }

    /// Count relationships referencing the entity at either endpoint.
    #[must_use]
    pub fn reference_count(&self, entity_id: &str) -> usize {
        self.relationships
            .iter()
            .filter(|r| r.references(entity_id))
            .count()
    }

    /// Whether any relationship (other than `exclude`, if given) connects
    /// the unordered pair `{a, b}`.
    #[must_use]
    pub fn pair_exists(&self, a: &str, b: &str, exclude: Option<&str>) -> bool {
        self.relationships
            .iter()
            .filter(|r| exclude != Some(r.id.as_str()))
            .any(|r| r.connects_pair(a, b))
    }
}

/// Entity positions keyed by entity id, external to the model's
/// referential invariants but persisted alongside it on export.
pub type PositionMap = BTreeMap<String, Point>;

// =============================================================================
// SELECTION
// =============================================================================

/// The editor's current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Entity(String),
    Relationship(String),
}

// =============================================================================
// DIAGNOSTICS
// =============================================================================

/// A single user-facing validation finding.
///
/// Carries a human-readable message plus optional context: a dotted
/// field path into the document, the id of the owning entity or
/// relationship, and a remediation suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub message: String,
    #[serde(rename = "fieldPath", skip_serializing_if = "Option::is_none")]
    pub field_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Create an issue carrying only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field_path: None,
            id: None,
            suggestion: None,
        }
    }

    /// Attach the dotted/indexed document path this issue points at.
    #[must_use]
    pub fn at(mut self, field_path: impl Into<String>) -> Self {
        self.field_path = Some(field_path.into());
        self
    }

    /// Attach the id of the entity or relationship that owns the issue.
    #[must_use]
    pub fn on(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attach a remediation suggestion.
    #[must_use]
    pub fn hint(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// The outcome of a validation pass. Never an `Err`: failures are data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub ok: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Build a report; `ok` is true exactly when there are no issues.
    #[must_use]
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        Self {
            ok: issues.is_empty(),
            issues,
        }
    }

    /// A passing report.
    #[must_use]
    pub fn passing() -> Self {
        Self::from_issues(Vec::new())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Operation-guard errors from the mutation engine.
///
/// Each variant corresponds to an invariant the attempted operation
/// would have violated. The operation makes no change when one of these
/// is returned; the model is always left as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Relationship endpoints must be two different entities.
    #[error("relationship endpoints must be two different objects")]
    SelfRelationship,

    /// At most one relationship may exist between any unordered pair of
    /// entities, regardless of direction or arrow type.
    #[error("a relationship between \"{a}\" and \"{b}\" already exists")]
    DuplicatePair { a: String, b: String },

    /// The entity still has attached relationships and cannot be deleted.
    #[error("object \"{id}\" is still referenced by {references} relationship(s)")]
    EntityInUse { id: String, references: usize },

    /// The relationship already holds the maximum number of curve points.
    #[error("relationship \"{id}\" already has the maximum of {max} curve points")]
    CurvePointLimit { id: String, max: usize },

    /// No entity with the given id exists in the model.
    #[error("unknown object id \"{id}\"")]
    UnknownEntity { id: String },

    /// No relationship with the given id exists in the model.
    #[error("unknown relationship id \"{id}\"")]
    UnknownRelationship { id: String },
}

impl ModelError {
    /// Render this error as a single structured issue for UI surfacing.
    #[must_use]
    pub fn to_issue(&self) -> ValidationIssue {
        match self {
            Self::SelfRelationship => ValidationIssue::new(self.to_string())
                .hint("pick two different objects"),
            Self::DuplicatePair { .. } => ValidationIssue::new(self.to_string())
                .hint("edit the existing relationship or pick other objects"),
            Self::EntityInUse { id, .. } => ValidationIssue::new(self.to_string())
                .on(id.clone())
                .hint("delete the attached relationships first, then delete the object"),
            Self::CurvePointLimit { id, .. } => ValidationIssue::new(self.to_string())
                .at("relationships[].curvePoints")
                .on(id.clone())
                .hint("delete a curve point before adding another"),
            Self::UnknownEntity { id } | Self::UnknownRelationship { id } => {
                ValidationIssue::new(self.to_string()).on(id.clone())
            }
        }
    }
}

/// Import-stage errors. Parse failures and schema failures are distinct
/// so the UI can title them differently.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportError {
    /// The file content is not legal JSON at all.
    #[error("JSON parse error: {0}")]
    Parse(String),

    /// The document is legal JSON but failed structural validation.
    #[error("document failed validation with {} issue(s)", .0.issues.len())]
    Invalid(ValidationReport),
}

// =============================================================================
// TESTS
// =============================================================================
