use notagraph_core::model::{ElementId, NotationModel, Point};
use notagraph_engine::{
    Action, ActionDispatcher, ActionSender, DispatcherConfig, ModelStateManager, ResponseReceiver,
    Session,
};
use notagraph_store::MemoryStore;
use std::sync::Arc;

/// Manager over a root holding one shape at (0,0) sized (10,10)
#[allow(dead_code)]
pub fn shape_state() -> (ModelStateManager, Arc<MemoryStore>, ElementId) {
    let mut model = NotationModel::new();
    let root = model.root().clone();
    let (shape, _) = model
        .create_shape(&root, (0.0, 0.0), (10.0, 10.0))
        .expect("Should create shape");
    let store = Arc::new(MemoryStore::new());
    let state = ModelStateManager::new(model, store.clone());
    (state, store, shape)
}

#[allow(dead_code)]
pub fn move_to(shape: &ElementId, x: f64, y: f64) -> Action {
    Action::ChangeBounds {
        element: shape.clone(),
        position: Some(Point::new(x, y)),
        size: None,
    }
}

/// Session over `state` with the stock handlers
#[allow(dead_code)]
pub fn start_session(state: ModelStateManager) -> (Session, ActionSender, ResponseReceiver) {
    let dispatcher = ActionDispatcher::with_default_handlers(DispatcherConfig::default())
        .expect("Stock handlers should register");
    Session::new(state, dispatcher, 8)
}

/// Drain every response produced until the session stopped
#[allow(dead_code)]
pub async fn collect_responses(mut responses: ResponseReceiver) -> Vec<Action> {
    let mut collected = Vec::new();
    while let Some(action) = responses.recv().await {
        collected.push(action);
    }
    collected
}
