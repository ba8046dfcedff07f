//! Persisted identity records
//!
//! Each node role stores one small record. Fields missing from the file
//! decode to their zero value and unknown fields are ignored, so older or
//! newer shapes of `meta.json` still load.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A record that can live in a [`LocalCache`](crate::LocalCache)
pub trait MetaRecord: Serialize + DeserializeOwned + Default + Clone + PartialEq + Debug {
    /// Node role this record belongs to, used in log output
    const ROLE: &'static str;

    /// The node's assigned name
    fn node_name(&self) -> &str;

    /// Replace the node's assigned name
    fn set_node_name(&mut self, name: String);
}

/// Identity of a server node
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerMeta {
    pub server_name: String,
}

impl MetaRecord for ServerMeta {
    const ROLE: &'static str = "server";

    fn node_name(&self) -> &str {
        &self.server_name
    }

    fn set_node_name(&mut self, name: String) {
        self.server_name = name;
    }
}

/// Identity of a worker node
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerMeta {
    pub worker_name: String,
}

impl MetaRecord for WorkerMeta {
    const ROLE: &'static str = "worker";

    fn node_name(&self) -> &str {
        &self.worker_name
    }

    fn set_node_name(&mut self, name: String) {
        self.worker_name = name;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_uses_role_field_name() {
        let worker = WorkerMeta {
            worker_name: "Worker".into(),
        };
        assert_eq!(
            serde_json::to_string(&worker).unwrap(),
            r#"{"worker_name":"Worker"}"#
        );

        let server = ServerMeta {
            server_name: "node-1".into(),
        };
        assert_eq!(
            serde_json::to_string(&server).unwrap(),
            r#"{"server_name":"node-1"}"#
        );
    }

    #[test]
    fn test_missing_and_unknown_fields() {
        let meta: WorkerMeta = serde_json::from_str("{}").unwrap();
        assert_eq!(meta, WorkerMeta::default());

        let meta: WorkerMeta =
            serde_json::from_str(r#"{"worker_name":"w1","server_name":"s1","epoch":3}"#).unwrap();
        assert_eq!(meta.worker_name, "w1");

        // A server file read with the worker shape yields an empty name
        let meta: WorkerMeta = serde_json::from_str(r#"{"server_name":"s1"}"#).unwrap();
        assert!(meta.node_name().is_empty());
    }

    #[test]
    fn test_set_node_name() {
        let mut meta = ServerMeta::default();
        meta.set_node_name("node-7".into());
        assert_eq!(meta.node_name(), "node-7");
        assert_eq!(ServerMeta::ROLE, "server");
        assert_eq!(WorkerMeta::ROLE, "worker");
    }
}
