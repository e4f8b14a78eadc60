use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::context::CallContext;
use crate::error::{ApiError, Result};

/// Performs one HTTP exchange against the API and hands back the raw response body.
///
/// Implementations apply authentication, map non-2xx statuses to transport errors
/// and honour the caller's [`CallContext`]. Decoding is left to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        ctx: &CallContext,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Vec<u8>>;
}

pub fn encode_json<B: Serialize + ?Sized>(body: &B) -> Result<Value> {
    serde_json::to_value(body).map_err(ApiError::Encode)
}

pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| {
        error!("Failed to parse JSON response: {}", e);
        ApiError::Decode(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Wrapper {
        value: i64,
    }

    #[test]
    fn test_decode_json_ok() {
        let wrapper: Wrapper = decode_json(br#"{"value": 3}"#).unwrap();
        assert_eq!(wrapper.value, 3);
    }

    #[test]
    fn test_decode_json_malformed() {
        let err = decode_json::<Wrapper>(b"<html>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_decode_json_empty_body() {
        let err = decode_json::<Wrapper>(b"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_encode_json() {
        let value = encode_json(&serde_json::json!({"a": 1})).unwrap();
        assert_eq!(value["a"], 1);
    }
}
