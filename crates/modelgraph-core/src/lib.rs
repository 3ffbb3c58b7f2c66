//! # modelgraph-core
//!
//! The deterministic model-integrity engine for Modelgraph - THE LOGIC.
//!
//! This crate owns everything a canvas front end must never get wrong:
//! validating untrusted document JSON, coercing it into the typed
//! model, enforcing graph invariants on every edit, building the SVG
//! curve paths, and laying entities out on the deterministic grid.
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Is the ONLY place where the model may be mutated
//! - Rejects invalid edits atomically; a failed operation changes nothing
//! - Is deterministic: identical inputs give byte-identical outputs
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod coerce;
pub mod document;
pub mod geometry;
pub mod layout;
pub mod mutation;
pub mod primitives;
pub mod session;
pub mod types;
pub mod validate;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    ArrowType, Attribute, Entity, HandleLocation, ImportError, Model, ModelError, Point,
    PositionMap, Relationship, Selection, ValidationIssue, ValidationReport,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use coerce::coerce;
pub use document::ExportError;
pub use geometry::{SegmentHit, build_curve_path, build_curve_path_with_tension, nearest_segment};
pub use layout::{auto_layout, next_grid_position};
pub use mutation::{AttributePatch, EntityPatch, MutationEngine, Reconnect, RelationshipPatch};
pub use session::{ImportOutcome, ImportTicket, PendingRelationship, Session};
pub use validate::{validate, validate_for_export};
