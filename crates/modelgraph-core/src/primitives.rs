//! # Innate Primitives
//!
//! Hardcoded runtime constants for the modelgraph CORE.
//!
//! These values are compiled into the binary and immutable at runtime.
//! They define the document format version, the editing limits enforced
//! by the validator and the mutation engine, and the deterministic grid
//! used by the layout assigner.

/// Current schema version of the persisted JSON document.
///
/// Export always re-stamps the document with this value; import accepts
/// any document that passes structural validation regardless of the
/// declared version.
pub const SCHEMA_VERSION: u32 = 1;

/// Maximum number of user-placed curve control points per relationship.
///
/// Enforced in two places:
/// - The validator rejects imported documents exceeding the cap.
/// - `MutationEngine::insert_curve_point` refuses a sixth point.
pub const MAX_CURVE_POINTS: usize = 5;

/// Default tension for the Catmull-Rom path builder.
///
/// 1.0 is the standard Catmull-Rom parameterization. The builder clamps
/// caller-supplied values into `[0, MAX_TENSION]` and substitutes this
/// default for non-finite input.
pub const DEFAULT_TENSION: f64 = 1.0;

/// Upper clamp for the path builder tension parameter.
pub const MAX_TENSION: f64 = 2.0;

// =============================================================================
// LAYOUT GRID
// =============================================================================

/// Horizontal spacing between grid columns, in canvas units.
pub const COLUMN_WIDTH: f64 = 280.0;

/// Vertical spacing between grid rows, in canvas units.
pub const ROW_HEIGHT: f64 = 180.0;

/// Left margin of the layout grid.
pub const PADDING_X: f64 = 80.0;

/// Top margin of the layout grid.
pub const PADDING_Y: f64 = 80.0;

/// Column count used when placing incrementally created entities.
///
/// Full-document auto layout uses a square-ish grid instead; this fixed
/// width only applies to `next_grid_position`.
pub const NEW_ENTITY_COLUMNS: usize = 3;
