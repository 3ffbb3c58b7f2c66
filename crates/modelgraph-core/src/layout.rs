//! # Layout Assigner
//!
//! Deterministic initial 2-D placement for entities lacking persisted
//! coordinates. Imported documents get a square-ish grid; entities
//! created one at a time fall into a fixed three-column grid.

use crate::primitives::{COLUMN_WIDTH, NEW_ENTITY_COLUMNS, PADDING_X, PADDING_Y, ROW_HEIGHT};
use crate::types::{Entity, Point, PositionMap};

/// Assign a grid position to every entity, in declaration order.
///
/// The grid is square-ish: `columns = max(1, ceil(sqrt(n)))`. The same
/// entity list always produces the same placement.
#[must_use]
pub fn auto_layout(entities: &[Entity]) -> PositionMap {
    let count = entities.len();
    let mut positions = PositionMap::new();
    if count == 0 {
        return positions;
    }

    let columns = ((count as f64).sqrt().ceil() as usize).max(1);

    for (index, entity) in entities.iter().enumerate() {
        let row = index / columns;
        let column = index % columns;
        positions.insert(
            entity.id.clone(),
            Point {
                x: PADDING_X + column as f64 * COLUMN_WIDTH,
                y: PADDING_Y + row as f64 * ROW_HEIGHT,
            },
        );
    }

    positions
}

/// Grid slot for the `index`-th incrementally created entity.
#[must_use]
pub fn next_grid_position(index: usize) -> Point {
    let row = index / NEW_ENTITY_COLUMNS;
    let column = index % NEW_ENTITY_COLUMNS;
    Point {
        x: PADDING_X + column as f64 * COLUMN_WIDTH,
        y: PADDING_Y + row as f64 * ROW_HEIGHT,
    }
}

// =============================================================================
// TESTS
// =============================================================================
