use serde::{Deserialize, Serialize};

/// Placeholder recorded when the transport cannot determine a client attribute.
pub const UNKNOWN_CLIENT_VALUE: &str = "unknown";

/// Requesting client, as seen by the transport adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub ip_address: String,
    pub user_agent: String,
}

impl ClientInfo {
    /// Empty values are replaced by `"unknown"`.
    pub fn new(ip_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        let or_unknown = |value: String| {
            if value.trim().is_empty() {
                UNKNOWN_CLIENT_VALUE.to_string()
            } else {
                value
            }
        };
        Self {
            ip_address: or_unknown(ip_address.into()),
            user_agent: or_unknown(user_agent.into()),
        }
    }
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            ip_address: UNKNOWN_CLIENT_VALUE.to_string(),
            user_agent: UNKNOWN_CLIENT_VALUE.to_string(),
        }
    }
}
