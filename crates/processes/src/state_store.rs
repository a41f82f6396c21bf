use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ecommerce_events::{ChoreographyError, ProcessState};

/// Per-correlation-id process state, each instance behind its own lock.
///
/// The outer map lock is held only to find or create an instance, so updates
/// for different correlation ids never contend.
///
/// Instances are never evicted, completed ones included: a completed instance
/// is what makes a late or redelivered milestone a no-op, so the map grows
/// with the number of correlation ids seen.
pub struct ProcessStateStore<M: Ord> {
    instances: Mutex<HashMap<String, Arc<Mutex<ProcessState<M>>>>>,
}

impl<M: Ord> Default for ProcessStateStore<M> {
    fn default() -> Self {
        Self {
            instances: Mutex::new(HashMap::new()),
        }
    }
}

impl<M: Ord + Copy> ProcessStateStore<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The instance for `correlation_id`, created empty on first use.
    pub fn instance(&self, correlation_id: &str) -> Result<Arc<Mutex<ProcessState<M>>>, ChoreographyError> {
        let mut instances = self
            .instances
            .lock()
            .map_err(|_| ChoreographyError::LockPoisoned("process instances"))?;
        Ok(instances
            .entry(correlation_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ProcessState::new())))
            .clone())
    }

    /// Copy of the current state, if the instance exists.
    pub fn snapshot(&self, correlation_id: &str) -> Option<ProcessState<M>> {
        let instances = self.instances.lock().ok()?;
        let instance = instances.get(correlation_id)?.clone();
        drop(instances);
        let state = instance.lock().ok()?;
        Some(state.clone())
    }

    pub fn len(&self) -> usize {
        self.instances.lock().map(|i| i.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
