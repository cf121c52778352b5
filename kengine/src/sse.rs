//! SSE framing: serializes the engine's event sequence to the wire format
//! consumed by browser-side readers.
//!
//! ```rust
//! use kengine::{StreamEvent, sse};
//!
//! let frame = sse::frame(&StreamEvent::Chunk("Hel".to_string()));
//! assert_eq!(frame.as_deref(), Some("data: {\"type\":\"chunk\",\"data\":\"Hel\"}\n\n"));
//! ```

use futures_util::StreamExt;
use serde::Serialize;

use crate::{EngineError, EngineEventStream, StreamEvent, StreamOutcome};

// Serialized as a struct so `type` always precedes `data`, matching the
// tagged shape of every other frame.
#[derive(Serialize)]
struct ErrorFrame<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    data: &'a str,
}

/// Frames one event as an SSE record. `Completed` is in-process only and
/// never goes on the wire, so it frames to `None`.
pub fn frame(event: &StreamEvent) -> Option<String> {
    if matches!(event, StreamEvent::Completed(_)) {
        return None;
    }

    let payload = serde_json::to_string(event).unwrap_or_default();
    Some(format!("data: {payload}\n\n"))
}

/// Terminal frame written before closing the wire on a fatal error.
pub fn error_frame(error: &EngineError) -> String {
    let message = error.to_string();
    let payload = serde_json::to_string(&ErrorFrame {
        kind: "error",
        data: &message,
    })
    .unwrap_or_default();
    format!("data: {payload}\n\n")
}

/// Drives an event stream to completion, writing each frame as it arrives.
/// Returns the aggregated outcome from the terminal event. On a fatal error
/// an explicit error frame is written before the error is returned.
pub async fn pump<F>(
    mut stream: EngineEventStream<'_>,
    mut write: F,
) -> Result<StreamOutcome, EngineError>
where
    F: FnMut(&str),
{
    while let Some(item) = stream.next().await {
        match item {
            Ok(StreamEvent::Completed(outcome)) => return Ok(outcome),
            Ok(event) => {
                if let Some(frame) = frame(&event) {
                    write(&frame);
                }
            }
            Err(error) => {
                write(&error_frame(&error));
                return Err(error);
            }
        }
    }

    let error = EngineError::provider("event stream ended without completing");
    write(&error_frame(&error));
    Err(error)
}
