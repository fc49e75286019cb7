//! Scoped environment overrides for tests that read configuration.
//!
//! Environment variables are process-global, so every override runs under one
//! lock and is rolled back when the closure returns or panics.

use std::sync::{Mutex, OnceLock, PoisonError};

/// Every variable the server reads at startup.
pub const CONFIG_VARS: &[&str] = &[
    "PORT",
    "BIND",
    "MAX_PASTE_SIZE",
    "ALLOW_PUBLIC_ACCESS",
    "PUBLIC_BASE_URL",
    "STORE_BACKEND",
    "UPSTASH_REDIS_REST_URL",
    "UPSTASH_REDIS_REST_TOKEN",
];

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

#[allow(unused_unsafe)]
fn assign(key: &str, value: Option<&str>) {
    // SAFETY: only called while holding `env_lock`.
    unsafe {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
}

/// Previous values, put back on drop.
struct Rollback(Vec<(String, Option<String>)>);

impl Drop for Rollback {
    fn drop(&mut self) {
        for (key, previous) in self.0.iter().rev() {
            assign(key, previous.as_deref());
        }
    }
}

/// Run `f` with each `(key, value)` applied: `Some` sets, `None` removes.
///
/// Calls are serialized process-wide and must not nest.
pub fn with_env<R>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> R) -> R {
    let _lock = env_lock().lock().unwrap_or_else(PoisonError::into_inner);
    let mut rollback = Rollback(Vec::with_capacity(vars.len()));
    for (key, value) in vars {
        rollback.0.push((key.to_string(), std::env::var(key).ok()));
        assign(key, *value);
    }
    f()
}

/// Run `f` with every [`CONFIG_VARS`] entry cleared except the given ones.
pub fn with_config_env<R>(vars: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
    let scoped: Vec<(&str, Option<&str>)> = CONFIG_VARS
        .iter()
        .map(|key| {
            let value = vars
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| *value);
            (*key, value)
        })
        .collect();
    with_env(&scoped, f)
}
