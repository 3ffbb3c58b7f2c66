//! # Property-Based Tests
//!
//! These tests ensure determinism and the structural invariants the
//! engine guarantees: coercion is idempotent, the unordered-pair guard
//! holds under arbitrary edit sequences, curve paths are pure functions
//! of their inputs, and exported documents always validate.

use modelgraph_core::{
    Entity, Model, MutationEngine, Point, auto_layout, build_curve_path,
    build_curve_path_with_tension, coerce, document, nearest_segment, validate,
};
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn model_with_entities(count: usize) -> Model {
    let mut model = Model::new();
    for n in 0..count {
        model.entities.push(Entity {
            id: format!("obj_{n}"),
            name: format!("Object {n}"),
            description: String::new(),
            attributes: Vec::new(),
        });
    }
    model
}

fn finite_point() -> impl Strategy<Value = Point> {
    (-10_000.0f64..10_000.0, -10_000.0f64..10_000.0).prop_map(|(x, y)| Point::new(x, y))
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Coercing a coerced document changes nothing.
    #[test]
    fn coercion_is_idempotent(count in 0usize..20) {
        let model = model_with_entities(count);
        let positions = auto_layout(&model.entities);

        let data = document::to_value(&model, &positions).expect("serialize");
        let once = coerce(&data);
        let again_data =
            document::to_value(&once, &positions).expect("serialize");
        let twice = coerce(&again_data);

        prop_assert_eq!(once, twice);
    }

    /// Arbitrary connect attempts never produce two relationships over
    /// the same unordered entity pair; the count equals the number of
    /// distinct pairs attempted.
    #[test]
    fn unordered_pair_guard_holds_under_random_edits(
        attempts in vec((0usize..8, 0usize..8), 1..60)
    ) {
        let mut model = model_with_entities(8);
        let mut expected: BTreeSet<(usize, usize)> = BTreeSet::new();

        for (a, b) in attempts {
            let from = format!("obj_{a}");
            let to = format!("obj_{b}");
            let result =
                MutationEngine::create_relationship(&mut model, &from, &to, None, None);
            let key = (a.min(b), a.max(b));
            if a != b && !expected.contains(&key) {
                prop_assert!(result.is_ok());
                expected.insert(key);
            } else {
                prop_assert!(result.is_err());
            }
            prop_assert_eq!(model.relationships.len(), expected.len());
        }
    }

    /// The curve path is a pure function of its control points.
    #[test]
    fn curve_path_is_deterministic(points in vec(finite_point(), 0..8)) {
        prop_assert_eq!(build_curve_path(&points), build_curve_path(&points));
    }

    /// Any tension, including garbage, yields a well-formed path for
    /// two or more points.
    #[test]
    fn curve_path_survives_arbitrary_tension(
        points in vec(finite_point(), 2..8),
        tension in prop::num::f64::ANY
    ) {
        let d = build_curve_path_with_tension(&points, tension);
        prop_assert!(d.starts_with("M "));
        prop_assert_eq!(d.matches(" C ").count(), points.len() - 1);
    }

    /// The nearest segment's insert index always lands inside the
    /// curve-point range of the polyline.
    #[test]
    fn nearest_segment_index_is_in_bounds(
        points in vec(finite_point(), 2..8),
        probe in finite_point()
    ) {
        let hit = nearest_segment(&points, probe).expect("two or more points");
        prop_assert!(hit.segment <= points.len() - 2);
        prop_assert!(hit.insert_index <= points.len() - 2);
    }

    /// Grid layout assigns every entity a distinct position and is
    /// stable across calls.
    #[test]
    fn auto_layout_is_injective_and_stable(count in 0usize..40) {
        let model = model_with_entities(count);
        let first = auto_layout(&model.entities);
        let second = auto_layout(&model.entities);

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), count);
        let distinct: BTreeSet<(String, String)> = first
            .values()
            .map(|p| (format!("{}", p.x), format!("{}", p.y)))
            .collect();
        prop_assert_eq!(distinct.len(), count);
    }

    /// Whatever the engine builds, the exported document validates.
    #[test]
    fn engine_output_always_validates(
        attempts in vec((0usize..6, 0usize..6), 0..30)
    ) {
        let mut model = model_with_entities(6);
        for (a, b) in attempts {
            let from = format!("obj_{a}");
            let to = format!("obj_{b}");
            // Guard failures are expected; the model must stay valid.
            let _ = MutationEngine::create_relationship(&mut model, &from, &to, None, None);
        }
        let positions = auto_layout(&model.entities);
        let data = document::to_value(&model, &positions).expect("serialize");
        let report = validate(&data);
        prop_assert!(report.ok, "issues: {:?}", report.issues);
    }
}
