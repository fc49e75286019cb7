//! Utilities for generating paste identifiers.

use crate::constants::{MAX_PASTE_ID_LENGTH, PASTE_ID_LENGTH};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::future::Future;

/// Number of default-length attempts before falling back to a longer id.
const MAX_SHORT_ATTEMPTS: usize = 5;

/// Generate a random alphanumeric token of `len` characters.
///
/// # Returns
/// A token drawn from `[A-Za-z0-9]` using the thread-local CSPRNG.
pub fn generate_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generate a paste id of the default length.
pub fn generate_paste_id() -> String {
    generate_token(PASTE_ID_LENGTH)
}

/// Generate an id that `exists_check` reports as unused.
///
/// Tries default-length ids first, then switches to double-length ids, whose
/// space is large enough that the loop ends on the first draw in practice.
///
/// # Errors
/// Propagates the first error returned by `exists_check`.
pub async fn generate_unique_id<F, Fut, E>(exists_check: F) -> Result<String, E>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    for _ in 0..MAX_SHORT_ATTEMPTS {
        let id = generate_paste_id();
        if !exists_check(id.clone()).await? {
            return Ok(id);
        }
        tracing::debug!("paste id collision on {}, retrying", id);
    }

    loop {
        let id = generate_token(PASTE_ID_LENGTH * 2);
        if !exists_check(id.clone()).await? {
            return Ok(id);
        }
    }
}

/// Whether `id` is acceptable as a paste identifier from a request path.
///
/// Allows 1..=64 characters of `[A-Za-z0-9_-]`.
pub fn is_valid_paste_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_PASTE_ID_LENGTH
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn generated_ids_are_alphanumeric_and_fixed_length() {
        for _ in 0..50 {
            let id = generate_paste_id();
            assert_eq!(id.len(), PASTE_ID_LENGTH);
            assert!(id.bytes().all(|b| b.is_ascii_alphanumeric()), "id {}", id);
            assert!(is_valid_paste_id(&id));
        }
    }

    #[test]
    fn generated_ids_do_not_repeat_in_small_samples() {
        let ids: HashSet<String> = (0..1_000).map(|_| generate_paste_id()).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn path_id_validation_matrix() {
        let long = "a".repeat(MAX_PASTE_ID_LENGTH + 1);
        let cases = [
            ("AbC123xyz0", true),
            ("with-dash_and_underscore", true),
            ("", false),
            ("has space", false),
            ("../etc", false),
            ("paste:nested", false),
            (long.as_str(), false),
        ];
        for (id, expected) in cases {
            assert_eq!(is_valid_paste_id(id), expected, "id {:?}", id);
        }
    }

    #[tokio::test]
    async fn unique_id_retries_until_free() {
        let calls = AtomicUsize::new(0);
        let id = generate_unique_id(|_candidate| {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, ()>(attempt < 2) }
        })
        .await
        .expect("id");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(id.len(), PASTE_ID_LENGTH);
    }

    #[tokio::test]
    async fn unique_id_falls_back_to_longer_tokens() {
        let calls = AtomicUsize::new(0);
        let id = generate_unique_id(|_candidate| {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, ()>(attempt < MAX_SHORT_ATTEMPTS) }
        })
        .await
        .expect("id");
        assert_eq!(id.len(), PASTE_ID_LENGTH * 2);
    }

    #[tokio::test]
    async fn unique_id_propagates_check_errors() {
        let result = generate_unique_id(|_candidate| async { Err::<bool, &str>("store down") }).await;
        assert_eq!(result, Err("store down"));
    }
}
