use notagraph_core::model::{keys, ElementId, FeatureValue, NotationModel};

/// Create a model with a single shape at (0,0) sized (10,10)
#[allow(dead_code)]
pub fn model_with_shape() -> (NotationModel, ElementId) {
    let mut model = NotationModel::new();
    let root = model.root().clone();
    let (shape, _) = model
        .create_shape(&root, (0.0, 0.0), (10.0, 10.0))
        .expect("Should create shape");
    (model, shape)
}

/// Add another shape under the root
#[allow(dead_code)]
pub fn add_shape(model: &mut NotationModel, x: f64, y: f64) -> ElementId {
    let root = model.root().clone();
    model
        .create_shape(&root, (x, y), (10.0, 10.0))
        .expect("Should create shape")
        .0
}

/// Id of the `Point` currently owned by the shape
#[allow(dead_code)]
pub fn position_value(model: &NotationModel, shape: &ElementId) -> ElementId {
    model
        .get_feature(shape, keys::POSITION)
        .and_then(FeatureValue::as_contained)
        .cloned()
        .expect("Shape should own a position")
}

/// Check that every owner slot agrees with the child's back-reference
/// and that nothing is owned twice
#[allow(dead_code)]
pub fn assert_ownership_consistent(model: &NotationModel) {
    let mut ids = vec![model.root().clone()];
    ids.extend(model.descendants(model.root()));

    for id in &ids {
        assert!(
            model.owner_count(id) <= 1,
            "Element {} has more than one owner",
            id
        );
        let element = model.element(id).expect("Reachable element should exist");
        for child in element.contained_ids() {
            let containment = model
                .container_of(&child)
                .unwrap_or_else(|| panic!("Contained element {} lacks back-reference", child));
            assert_eq!(&containment.owner, id, "Back-reference of {} is stale", child);
        }
    }
    assert!(model.container_of(model.root()).is_none());
}
