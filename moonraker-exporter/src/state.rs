use parking_lot::RwLock;
use std::sync::Arc;

/// Immutable value behind a swappable pointer: readers clone the inner `Arc`
/// and keep a consistent view while a writer installs a new value.
pub type Shared<T> = Arc<RwLock<Arc<T>>>;

pub fn new_state<T>(value: T) -> Shared<T> {
    Arc::new(RwLock::new(Arc::new(value)))
}

pub fn snapshot<T>(state: &Shared<T>) -> Arc<T> {
    state.read().clone()
}

pub fn swap<T>(state: &Shared<T>, value: T) {
    *state.write() = Arc::new(value);
}
