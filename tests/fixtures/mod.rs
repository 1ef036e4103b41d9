//! Shared fixtures for the integration tests
//!
//! - `case_1/`: a config directory with `default`, `development` and
//!   `production` layers
//! - helpers to read generated modules back into JSON

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;

/// Path to the case_1 config directory
pub fn case_1_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/case_1")
}

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Serialize tests that read or change process environment variables.
pub fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Read a generated module and parse its object literal back into JSON.
pub fn read_module(path: &Path) -> Value {
    let text = fs::read_to_string(path).unwrap();
    let start = text.find('{').expect("object literal start");
    let end = text.rfind('}').expect("object literal end");
    serde_json::from_str(&text[start..=end]).unwrap()
}

/// Keys of an object value, in order.
pub fn keys(value: &Value) -> Vec<String> {
    value
        .as_object()
        .expect("object")
        .keys()
        .cloned()
        .collect()
}
