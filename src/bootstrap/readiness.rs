use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;

/// Mirror of the backend's live connection state. Starts `false`.
#[derive(Clone, Debug, Default)]
pub struct ReadinessFlag {
    connected: Arc<AtomicBool>,
}

impl ReadinessFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub(crate) fn set(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Sets the flag from a delivered `.info/connected` value.
    pub(crate) fn set_from_value(&self, value: &Value) -> bool {
        let connected = is_truthy(value);
        self.set(connected);
        connected
    }
}

/// JavaScript truthiness of a JSON value.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
