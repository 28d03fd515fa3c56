//! Inbound payload shapes
//!
//! Network payload: `{ "nodes": [{ "layer": n }, ...], "edges": [{ "source": n, "target": n }, ...] }`.
//! Think payload: `{ "propagation": [[{ "id": n, "value": x }, ...], ...] }`.
//!
//! Records are deserialized one by one so a bad record fails the whole payload
//! with its position and the reason. Extra fields (ids, weights) are ignored.
//!
//! Node references must be numbers. A number that cannot be a node index
//! (negative, fractional, too large) is kept as `None`: the builder drops such
//! edges as unresolved and the engine skips such activations.

use crate::core::error::BuildError;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One node record; its index in the list becomes its id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Grouping tag
    pub layer: i64,
}

/// One edge record, by node index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Source node index, `None` if the number names no node
    #[serde(deserialize_with = "deserialize_node_ref")]
    pub source: Option<u32>,
    /// Target node index, `None` if the number names no node
    #[serde(deserialize_with = "deserialize_node_ref")]
    pub target: Option<u32>,
}

/// Initial graph payload
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetworkPayload {
    /// Node records
    pub nodes: Vec<NodeRecord>,
    /// Edge records
    pub edges: Vec<EdgeRecord>,
}

/// One activation inside a wave
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Activation {
    /// Node index, `None` if the number names no node
    #[serde(deserialize_with = "deserialize_node_ref")]
    pub id: Option<u32>,
    /// Activation strength
    pub value: f64,
}

/// One timestep's batch of activations
pub type Wave = Vec<Activation>;

/// Think-cycle payload
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThinkPayload {
    /// Waves in order
    pub propagation: Vec<Wave>,
}

#[derive(Deserialize)]
struct RawNetwork {
    nodes: Vec<Value>,
    edges: Vec<Value>,
}

#[derive(Deserialize)]
struct RawThink {
    #[serde(default)]
    propagation: Vec<Vec<Value>>,
}

impl EdgeRecord {
    /// Edge between two node indices
    pub fn new(source: u32, target: u32) -> Self {
        Self {
            source: Some(source),
            target: Some(target),
        }
    }
}

impl Activation {
    /// Activation of a node index
    pub fn new(id: u32, value: f64) -> Self {
        Self { id: Some(id), value }
    }
}

impl NetworkPayload {
    /// Parse and validate JSON text
    pub fn from_json(text: &str) -> Result<Self, BuildError> {
        let raw: RawNetwork = serde_json::from_str(text).map_err(malformed)?;

        let nodes = raw
            .nodes
            .iter()
            .enumerate()
            .map(|(index, record)| NodeRecord::deserialize(record).map_err(|e| BuildError::node(index, e.to_string())))
            .collect::<Result<Vec<_>, BuildError>>()?;

        let edges = raw
            .edges
            .iter()
            .enumerate()
            .map(|(index, record)| EdgeRecord::deserialize(record).map_err(|e| BuildError::edge(index, e.to_string())))
            .collect::<Result<Vec<_>, BuildError>>()?;

        Ok(Self { nodes, edges })
    }
}

impl ThinkPayload {
    /// Parse and validate JSON text. A missing `propagation` field means no waves.
    pub fn from_json(text: &str) -> Result<Self, BuildError> {
        let raw: RawThink = serde_json::from_str(text).map_err(malformed)?;

        let mut propagation = Vec::with_capacity(raw.propagation.len());
        for (w, wave) in raw.propagation.iter().enumerate() {
            let activations = wave
                .iter()
                .enumerate()
                .map(|(a, record)| {
                    Activation::deserialize(record).map_err(|e| {
                        BuildError::MalformedPayload(format!("wave {}, activation {}: {}", w, a, e))
                    })
                })
                .collect::<Result<Wave, BuildError>>()?;
            propagation.push(activations);
        }

        Ok(Self { propagation })
    }

    /// Number of waves
    pub fn len(&self) -> usize {
        self.propagation.len()
    }

    /// Whether there are no waves
    pub fn is_empty(&self) -> bool {
        self.propagation.is_empty()
    }
}

fn malformed(err: serde_json::Error) -> BuildError {
    BuildError::MalformedPayload(err.to_string())
}

/// Any JSON number is a node reference; anything else is malformed
fn deserialize_node_ref<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    struct NodeRefVisitor;

    impl<'de> Visitor<'de> for NodeRefVisitor {
        type Value = Option<u32>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a numeric node index")
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(u32::try_from(value).ok())
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(u32::try_from(value).ok())
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            if value.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&value) {
                Ok(Some(value as u32))
            } else {
                Ok(None)
            }
        }
    }

    deserializer.deserialize_any(NodeRefVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_network_payload_ignores_extra_fields() {
        let payload = NetworkPayload::from_json(
            r#"{
                "nodes": [{"id": 0, "layer": 0}, {"id": 1, "layer": 1}, {"id": 2, "layer": 2}],
                "edges": [{"source": 0, "target": 1, "weight": 0.4}, {"source": 1, "target": 2}]
            }"#,
        )
        .unwrap();

        assert_eq!(payload.nodes.len(), 3);
        assert_eq!(payload.nodes[2], NodeRecord { layer: 2 });
        assert_eq!(payload.edges[1], EdgeRecord::new(1, 2));
    }

    #[test]
    fn test_missing_layer_fails() {
        let err = NetworkPayload::from_json(r#"{"nodes": [{"layer": 0}, {}], "edges": []}"#).unwrap_err();
        match err {
            BuildError::MalformedNode { index, reason } => {
                assert_eq!(index, 1);
                assert!(reason.contains("layer"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_numeric_edge_id_fails() {
        for edge in [
            r#"{"source": "central", "target": 0}"#,
            r#"{"source": 0, "target": null}"#,
            r#"{"source": true, "target": 0}"#,
            r#"{"source": 0}"#,
        ] {
            let text = format!(r#"{{"nodes": [{{"layer": 0}}], "edges": [{{"source": 0, "target": 0}}, {}]}}"#, edge);
            let err = NetworkPayload::from_json(&text).unwrap_err();
            assert!(matches!(err, BuildError::MalformedEdge { index: 1, .. }), "{edge}: {err}");
        }
    }

    #[test]
    fn test_numbers_outside_index_range_are_unresolved() {
        let payload = NetworkPayload::from_json(
            r#"{"nodes": [{"layer": 0}], "edges": [
                {"source": -1, "target": 0},
                {"source": 0, "target": 4294967296},
                {"source": 1.5, "target": 0},
                {"source": 1.0, "target": 0}
            ]}"#,
        )
        .unwrap();

        assert_eq!(payload.edges[0], EdgeRecord { source: None, target: Some(0) });
        assert_eq!(payload.edges[1], EdgeRecord { source: Some(0), target: None });
        assert_eq!(payload.edges[2].source, None);
        assert_eq!(payload.edges[3], EdgeRecord::new(1, 0));
    }

    #[test]
    fn test_missing_sections_fail() {
        assert!(matches!(
            NetworkPayload::from_json(r#"{"nodes": []}"#),
            Err(BuildError::MalformedPayload(_))
        ));
        assert!(matches!(
            NetworkPayload::from_json("[1, 2, 3]"),
            Err(BuildError::MalformedPayload(_))
        ));
        assert!(matches!(
            NetworkPayload::from_json("not json"),
            Err(BuildError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_parse_think_payload() {
        let payload = ThinkPayload::from_json(
            r#"{"propagation": [[{"id": 0, "value": 0.5}, {"id": 3, "value": 1}], []]}"#,
        )
        .unwrap();
        assert_eq!(payload.len(), 2);
        assert_eq!(payload.propagation[0][1], Activation::new(3, 1.0));
        assert!(payload.propagation[1].is_empty());

        assert!(ThinkPayload::from_json("{}").unwrap().is_empty());

        let unknown = ThinkPayload::from_json(r#"{"propagation": [[{"id": -1, "value": 0.1}]]}"#).unwrap();
        assert_eq!(unknown.propagation[0][0].id, None);
        assert!(ThinkPayload::from_json(r#"{"propagation": [[{"id": "a", "value": 0.1}]]}"#).is_err());
    }
}
