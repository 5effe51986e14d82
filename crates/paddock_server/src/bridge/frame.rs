//! Wire frames exchanged with the bridge, one JSON object per line.

use paddock_event_system::{RemoteCallback, RemoteError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outgoing method call.
#[derive(Debug, Serialize)]
pub struct RequestFrame<'a> {
    pub id: u64,
    pub method: &'a str,
    pub params: &'a [Value],
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FaultFrame {
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// Any frame the bridge sends us.
///
/// Frames with an `id` answer a call; frames without one carry a callback.
#[derive(Debug, Deserialize)]
pub struct IncomingFrame {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Vec<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub fault: Option<FaultFrame>,
}

/// A decoded incoming frame.
#[derive(Debug, PartialEq)]
pub enum Incoming {
    Reply {
        id: u64,
        result: Result<Value, (i32, String)>,
    },
    Callback(RemoteCallback),
}

impl IncomingFrame {
    /// Classifies the frame, or returns `None` when it is neither a reply nor a callback.
    pub fn classify(self) -> Option<Incoming> {
        match (self.id, self.method) {
            (Some(id), _) => {
                let result = match self.fault {
                    Some(fault) => Err((fault.code, fault.message)),
                    None => Ok(self.result.unwrap_or(Value::Null)),
                };
                Some(Incoming::Reply { id, result })
            }
            (None, Some(method)) => Some(Incoming::Callback(RemoteCallback::new(method, self.params))),
            (None, None) => None,
        }
    }
}

/// Encodes a request as a single newline-terminated line.
pub fn encode_request(id: u64, method: &str, params: &[Value]) -> Result<Vec<u8>, RemoteError> {
    let mut line = serde_json::to_vec(&RequestFrame { id, method, params })?;
    line.push(b'\n');
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(line: &str) -> Option<Incoming> {
        serde_json::from_str::<IncomingFrame>(line)
            .expect("valid frame")
            .classify()
    }

    #[test]
    fn test_request_is_one_line() {
        let line = encode_request(7, "GetVersion", &[json!(1)]).expect("encodes");
        let text = String::from_utf8(line).expect("utf8");
        assert!(text.ends_with('\n'));
        assert_eq!(text.matches('\n').count(), 1);

        let value: Value = serde_json::from_str(text.trim_end()).expect("json");
        assert_eq!(value, json!({"id": 7, "method": "GetVersion", "params": [1]}));
    }

    #[test]
    fn test_classifies_replies_faults_and_callbacks() {
        assert_eq!(
            parse(r#"{"id": 1, "result": true}"#),
            Some(Incoming::Reply { id: 1, result: Ok(json!(true)) })
        );
        assert_eq!(
            parse(r#"{"id": 2}"#),
            Some(Incoming::Reply { id: 2, result: Ok(Value::Null) })
        );
        assert_eq!(
            parse(r#"{"id": 3, "fault": {"code": -1000, "message": "Login unknown."}}"#),
            Some(Incoming::Reply {
                id: 3,
                result: Err((-1000, "Login unknown.".to_string()))
            })
        );
        assert_eq!(
            parse(r#"{"method": "ManiaPlanet.PlayerConnect", "params": ["alice", false]}"#),
            Some(Incoming::Callback(RemoteCallback::new(
                "ManiaPlanet.PlayerConnect",
                vec![json!("alice"), json!(false)]
            )))
        );
        assert_eq!(parse(r#"{"params": []}"#), None);
    }
}
