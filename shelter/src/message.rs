//! Control messages sent by the hosting page.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tokio::sync::oneshot;

/// A command posted from the page to the worker.
///
/// Messages arrive as JSON objects tagged by `type`:
///
/// ```
/// use shelter::ControlMessage;
///
/// let message = ControlMessage::from_json(r#"{"type":"CLEAR_CACHE"}"#).unwrap();
/// assert_eq!(message, ControlMessage::ClearCache);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Activate the waiting worker now.
    SkipWaiting,
    /// Delete every cache generation.
    ClearCache,
    /// Reply with the current static generation name.
    GetVersion,
}

impl ControlMessage {
    /// Parses a message posted by the page.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

/// A control message with its optional reply channel.
#[derive(Debug)]
pub struct MessageEvent {
    /// The command.
    pub message: ControlMessage,
    /// Where `GET_VERSION` answers go.
    pub reply: Option<oneshot::Sender<SmolStr>>,
}

impl MessageEvent {
    /// A message that expects no reply.
    pub fn new(message: ControlMessage) -> Self {
        Self {
            message,
            reply: None,
        }
    }

    /// A message whose answer is sent back over `reply`.
    pub fn with_reply(message: ControlMessage, reply: oneshot::Sender<SmolStr>) -> Self {
        Self {
            message,
            reply: Some(reply),
        }
    }
}

/// What a control message did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// The host was asked to activate this worker.
    SkippedWaiting,
    /// These generations were deleted.
    Cleared(Vec<SmolStr>),
    /// The current static generation name.
    Version(SmolStr),
}
