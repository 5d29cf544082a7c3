//! Chat endpoint wire types and the success envelope.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// JSON success envelope: `{"status":"success","data":...,"timestamp":...}`.
///
/// The counterpart of [`crate::error::ErrorEnvelope`]; every successful
/// handler response is wrapped in one of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse<T> {
    pub status: String,
    pub data: T,
    pub timestamp: String,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Acknowledgement payload returned by the chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub message_id: String,
    pub user_id: String,
    pub reply: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let reply = ChatReply {
            message_id: "m-1".to_string(),
            user_id: "u1".to_string(),
            reply: "hola".to_string(),
        };
        let value = serde_json::to_value(SuccessResponse::new(reply)).unwrap();

        assert_eq!(value["status"], "success");
        assert_eq!(value["data"]["user_id"], "u1");
        assert!(value["timestamp"].as_str().is_some_and(|t| !t.is_empty()));
    }

    #[test]
    fn test_success_envelope_round_trip() {
        let envelope = SuccessResponse::new(vec![1, 2, 3]);
        let json = serde_json::to_string(&envelope).unwrap();
        let parsed: SuccessResponse<Vec<i32>> = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.status, "success");
        assert_eq!(parsed.data, vec![1, 2, 3]);
        assert_eq!(parsed.timestamp, envelope.timestamp);
    }
}
