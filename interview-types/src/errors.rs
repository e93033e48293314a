use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Wire shape of every non-2xx response body (and of the few endpoints that
/// reply with a human-readable confirmation).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorMessage {
    pub message: String,
}

impl ErrorMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
