//! Debug target descriptors for Chrome DevTools protocol clients

use serde::Serialize;
use uuid::Uuid;

/// Title and description shown for every target
pub const TARGET_TITLE: &str = "NS Debug Target";

/// A debuggable target as listed by a `/json/list` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub devtools_frontend_url: String,
    pub web_socket_debugger_url: String,
}

/// Builds target descriptors for a resolved `address:port`
///
/// There is only ever one target per endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetDiscovery;

impl TargetDiscovery {
    pub fn new() -> Self {
        Self
    }

    pub fn get_target(&self, address: &str, port: u16) -> Target {
        let endpoint = format!("{}:{}", address, port);
        Target {
            id: Uuid::new_v4().to_string(),
            title: TARGET_TITLE.to_string(),
            description: TARGET_TITLE.to_string(),
            kind: "node".to_string(),
            url: String::new(),
            devtools_frontend_url: format!(
                "chrome-devtools://devtools/bundled/inspector.html?experiments=true&ws={}",
                endpoint
            ),
            web_socket_debugger_url: format!("ws://{}", endpoint),
        }
    }

    pub fn get_all_targets(&self, address: &str, port: u16) -> Vec<Target> {
        vec![self.get_target(address, port)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_target() {
        let target = TargetDiscovery::new().get_target("localhost", 41000);
        assert_eq!(target.web_socket_debugger_url, "ws://localhost:41000");
        assert!(target.devtools_frontend_url.ends_with("ws=localhost:41000"));
        assert!(!target.id.is_empty());
        assert_eq!(target.title, TARGET_TITLE);
    }

    #[test]
    fn test_ids_are_unique() {
        let discovery = TargetDiscovery::new();
        let a = discovery.get_target("localhost", 41000);
        let b = discovery.get_target("localhost", 41000);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_get_all_targets_wraps_one() {
        let targets = TargetDiscovery::new().get_all_targets("127.0.0.1", 40001);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].web_socket_debugger_url, "ws://127.0.0.1:40001");
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(TargetDiscovery::new().get_target("localhost", 41000)).unwrap();
        assert_eq!(json["type"], "node");
        assert_eq!(json["webSocketDebuggerUrl"], "ws://localhost:41000");
        assert!(json.get("devtoolsFrontendUrl").is_some());
    }
}
