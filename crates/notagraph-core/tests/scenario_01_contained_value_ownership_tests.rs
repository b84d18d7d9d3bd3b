/// Scenario 1: Contained Value Ownership
///
/// A contained value has at most one owner at any instant. Re-assigning it
/// detaches it from the previous owner first, in causal record order.
mod common;

use common::{add_shape, assert_ownership_consistent, model_with_shape, position_value};
use notagraph_core::model::{keys, ChangeKind, FeatureValue};
use notagraph_core::NotationError;

#[test]
fn test_scenario_01_happy_same_contained_value_twice_is_touch() {
    // GIVEN a shape that owns a point
    let (mut model, shape) = model_with_shape();
    let point = position_value(&model, &shape);
    let value = Some(FeatureValue::Contained(point.clone()));

    // WHEN the same point is set as position twice
    let first = model
        .set_feature(&shape, keys::POSITION, value.clone())
        .expect("First set should succeed");
    let second = model
        .set_feature(&shape, keys::POSITION, value)
        .expect("Second set should succeed");

    // THEN each call yields exactly one touch record
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert!(first[0].is_touch());
    assert!(second[0].is_touch());

    // AND the point still has exactly one owner
    assert_eq!(model.owner_count(&point), 1);
    assert_ownership_consistent(&model);
}

#[test]
fn test_scenario_01_happy_move_value_between_owners_detaches_first() {
    // GIVEN two shapes A and B, and the position point of A
    let (mut model, shape_a) = model_with_shape();
    let shape_b = add_shape(&mut model, 50.0, 50.0);
    let point = position_value(&model, &shape_a);
    let b_old_point = position_value(&model, &shape_b);

    // WHEN A's point is assigned to B
    let records = model
        .set_feature(
            &shape_b,
            keys::POSITION,
            Some(FeatureValue::Contained(point.clone())),
        )
        .expect("Move should succeed");

    // THEN exactly two records are emitted, the detach from A first
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].element, shape_a);
    assert_eq!(records[0].kind, ChangeKind::Set);
    assert_eq!(
        records[0].old_value,
        Some(FeatureValue::Contained(point.clone()))
    );
    assert_eq!(records[0].new_value, None);
    assert_eq!(records[1].element, shape_b);
    assert_eq!(
        records[1].old_value,
        Some(FeatureValue::Contained(b_old_point.clone()))
    );

    // AND A no longer has a position while B owns the point
    assert!(model.get_feature(&shape_a, keys::POSITION).is_none());
    assert_eq!(model.container_of(&point).map(|c| &c.owner), Some(&shape_b));
    assert!(model.container_of(&b_old_point).is_none());
    assert_eq!(model.owner_count(&point), 1);
    assert_ownership_consistent(&model);
}

#[test]
fn test_scenario_01_happy_reparent_child_emits_remove_then_add() {
    // GIVEN two top-level shapes
    let (mut model, shape_a) = model_with_shape();
    let shape_b = add_shape(&mut model, 20.0, 0.0);
    let root = model.root().clone();

    // WHEN B is moved into A's children
    let records = model
        .add_child(&shape_a, keys::CHILDREN, &shape_b, None)
        .expect("Reparent should succeed");

    // THEN the root loses B before A gains it
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].kind, ChangeKind::Remove);
    assert_eq!(records[0].element, root);
    assert_eq!(records[0].index, Some(1));
    assert_eq!(records[1].kind, ChangeKind::Add);
    assert_eq!(records[1].element, shape_a);
    assert_eq!(model.children(&root, keys::CHILDREN), &[shape_a.clone()]);
    assert_ownership_consistent(&model);
}

#[test]
fn test_scenario_01_error_cycle_leaves_model_unchanged() {
    // GIVEN a shape nested inside another
    let (mut model, outer) = model_with_shape();
    let root = model.root().clone();
    let (inner, _) = model
        .create_shape(&outer, (1.0, 1.0), (1.0, 1.0))
        .expect("Nested shape");
    let before = model.snapshot();

    // WHEN the outer shape is attached below the inner one
    let result = model.add_child(&inner, keys::CHILDREN, &outer, Some(0));

    // THEN it fails as an invariant violation and nothing changed
    let err = result.expect_err("Cycle must be rejected");
    assert!(matches!(err, NotationError::OwnershipCycle { .. }));
    assert_eq!(
        err.kind(),
        notagraph_core::ExErrorKind::InvariantViolation
    );
    assert_eq!(model.snapshot(), before);
    assert_eq!(model.container_of(&outer).map(|c| &c.owner), Some(&root));
}

#[test]
fn test_scenario_01_happy_unset_releases_value() {
    // GIVEN a shape with a position
    let (mut model, shape) = model_with_shape();
    let point = position_value(&model, &shape);

    // WHEN the position is unset
    let records = model
        .set_feature(&shape, keys::POSITION, None)
        .expect("Unset should succeed");

    // THEN one record is emitted and the point is free
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].new_value, None);
    assert!(model.container_of(&point).is_none());
    assert!(!model.is_attached(&point));
    assert!(model.position_of(&shape).is_none());
}

#[test]
fn test_scenario_01_happy_reference_does_not_own() {
    // GIVEN two shapes
    let (mut model, shape_a) = model_with_shape();
    let shape_b = add_shape(&mut model, 30.0, 0.0);

    // WHEN A references B
    model
        .set_feature(
            &shape_a,
            keys::TARGET,
            Some(FeatureValue::Reference(shape_b.clone())),
        )
        .expect("Reference should succeed");

    // THEN B keeps its owner
    assert_eq!(
        model.container_of(&shape_b).map(|c| &c.owner),
        Some(model.root())
    );
    assert_ownership_consistent(&model);
}
