//! Redis access over the Upstash REST protocol.
//!
//! Each command is a `POST` of a JSON array (`["SET", "key", "value"]`) to the
//! database URL with a bearer token. Replies are `{"result": ...}` on success
//! and `{"error": "..."}` on failure.

use super::{KvStore, StoreError, StoredValue, SwapOutcome, TtlStatus};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Conditional write run server-side so the compare and the `SET` are one
/// command. `KEEPTTL` leaves the key's remaining expiry untouched.
const COMPARE_AND_SWAP_SCRIPT: &str = r#"
local current = redis.call('GET', KEYS[1])
if not current then
  return -1
end
if current ~= ARGV[1] then
  return 0
end
redis.call('SET', KEYS[1], ARGV[2], 'KEEPTTL')
return 1
"#;

/// REST-backed Redis client.
pub struct UpstashStore {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl std::fmt::Debug for UpstashStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstashStore")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl UpstashStore {
    /// Build a client for the database at `url`.
    ///
    /// # Errors
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn new(url: &str, token: &str) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    async fn command(&self, args: &[&str]) -> Result<Value, StoreError> {
        tracing::trace!("upstash command {}", args.first().copied().unwrap_or_default());
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(args)
            .send()
            .await?;
        let status = response.status();
        let body: Value = response.json().await?;
        parse_reply(status, body)
    }
}

fn parse_reply(status: reqwest::StatusCode, body: Value) -> Result<Value, StoreError> {
    if let Some(message) = body.get("error").and_then(Value::as_str) {
        return Err(StoreError::Backend(message.to_string()));
    }
    if !status.is_success() {
        return Err(StoreError::Backend(format!("HTTP {}", status)));
    }
    match body {
        Value::Object(mut map) => map
            .remove("result")
            .ok_or_else(|| StoreError::UnexpectedReply("reply has no result".to_string())),
        other => Err(StoreError::UnexpectedReply(other.to_string())),
    }
}

fn expect_ok(reply: Value) -> Result<(), StoreError> {
    match reply.as_str() {
        Some("OK") => Ok(()),
        _ => Err(StoreError::UnexpectedReply(reply.to_string())),
    }
}

fn swap_outcome(reply: &Value) -> Result<SwapOutcome, StoreError> {
    match expect_integer(reply)? {
        1 => Ok(SwapOutcome::Swapped),
        0 => Ok(SwapOutcome::Changed),
        -1 => Ok(SwapOutcome::Missing),
        _ => Err(StoreError::UnexpectedReply(reply.to_string())),
    }
}

/// Raw text a stored value was read as, for comparison on the server.
fn raw_text(value: &StoredValue) -> String {
    match value {
        StoredValue::Text(text) => text.clone(),
        StoredValue::Structured(json) => json.to_string(),
    }
}

fn expect_integer(reply: &Value) -> Result<i64, StoreError> {
    reply
        .as_i64()
        .ok_or_else(|| StoreError::UnexpectedReply(reply.to_string()))
}

#[async_trait]
impl KvStore for UpstashStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        expect_ok(self.command(&["SET", key, value]).await?)
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let millis = ttl.as_millis().to_string();
        expect_ok(self.command(&["SET", key, value, "PX", millis.as_str()]).await?)
    }

    async fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        Ok(match self.command(&["GET", key]).await? {
            Value::Null => None,
            other => Some(StoredValue::from(other)),
        })
    }

    async fn ttl_remaining(&self, key: &str) -> Result<TtlStatus, StoreError> {
        let reply = self.command(&["PTTL", key]).await?;
        expect_integer(&reply).map(TtlStatus::from_millis_reply)
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &StoredValue,
        value: &str,
    ) -> Result<SwapOutcome, StoreError> {
        let expected = raw_text(expected);
        let reply = self
            .command(&[
                "EVAL",
                COMPARE_AND_SWAP_SCRIPT,
                "1",
                key,
                expected.as_str(),
                value,
            ])
            .await?;
        swap_outcome(&reply)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let reply = self.command(&["DEL", key]).await?;
        expect_integer(&reply).map(|removed| removed > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        match self.command(&["PING"]).await? {
            Value::String(pong) if pong.eq_ignore_ascii_case("pong") => Ok(()),
            other => Err(StoreError::UnexpectedReply(other.to_string())),
        }
    }
}
