//! Network session
//!
//! A session holds the payload a network was built from, the engine running
//! over it, and the RNG used for every build. Restarting (the "big bang")
//! throws the graph away and builds a fresh one from the same payload.

use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::core::types::NodeId;
use crate::graph::builder::GraphBuilder;
use crate::graph::payload::{NetworkPayload, ThinkPayload};
use crate::graph::store::{GraphStats, GraphStore};
use crate::propagation::engine::PropagationEngine;
use crate::propagation::events::RenderEvent;
use rand::rngs::StdRng;
use std::time::Duration;
use tracing::{error, info};

/// Whether the session has a usable network
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// Nothing loaded yet
    Empty,
    /// A network is built and ready
    Ready,
    /// The last load failed; no network is available
    Failed(String),
}

/// Load, drive and restart a network
#[derive(Debug)]
pub struct NetworkSession {
    config: Config,
    builder: GraphBuilder,
    rng: StdRng,
    payload: Option<NetworkPayload>,
    engine: Option<PropagationEngine>,
    status: SessionStatus,
    events: Vec<RenderEvent>,
}

impl NetworkSession {
    /// Create an empty session
    pub fn new(config: Config) -> Self {
        let builder = GraphBuilder::from_config(&config);
        let rng = builder.rng();
        Self {
            config,
            builder,
            rng,
            payload: None,
            engine: None,
            status: SessionStatus::Empty,
            events: Vec::new(),
        }
    }

    /// Current status
    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    /// Session configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The engine, when a network is loaded
    pub fn engine(&self) -> Option<&PropagationEngine> {
        self.engine.as_ref()
    }

    /// The graph, when a network is loaded
    pub fn store(&self) -> Option<&GraphStore> {
        self.engine.as_ref().map(PropagationEngine::store)
    }

    /// Parse a network payload and build it.
    ///
    /// On failure the session is left without a graph in the `Failed` state.
    pub fn load_json(&mut self, text: &str) -> Result<GraphStats> {
        match NetworkPayload::from_json(text) {
            Ok(payload) => self.load(payload),
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Build a network from a parsed payload, replacing any current one
    pub fn load(&mut self, payload: NetworkPayload) -> Result<GraphStats> {
        let store = match self.builder.build_with_rng(&payload.nodes, &payload.edges, &mut self.rng) {
            Ok(store) => store,
            Err(e) => return Err(self.fail(e.into())),
        };
        let stats = store.stats();
        self.install(store);
        self.payload = Some(payload);
        self.status = SessionStatus::Ready;
        Ok(stats)
    }

    /// Start a think cycle
    pub fn think(&mut self, payload: ThinkPayload) -> Result<()> {
        self.engine_mut()?.think(payload.propagation)?;
        Ok(())
    }

    /// Parse a think payload and start a cycle
    pub fn think_json(&mut self, text: &str) -> Result<()> {
        let payload = ThinkPayload::from_json(text)?;
        self.think(payload)
    }

    /// Infect everything reachable from the central node
    pub fn infect_all(&mut self) -> Result<Vec<NodeId>> {
        Ok(self.engine_mut()?.infect_all()?)
    }

    /// Cancel any run and restore base tokens
    pub fn reset(&mut self) -> Result<()> {
        self.engine_mut()?.reset();
        Ok(())
    }

    /// Tear the network down and rebuild it from the retained payload
    pub fn restart(&mut self) -> Result<GraphStats> {
        let Some(engine) = self.engine.as_mut() else {
            return Err(Error::NotLoaded);
        };
        let Some(payload) = self.payload.as_ref() else {
            return Err(Error::NotLoaded);
        };

        self.events.append(&mut engine.drain_events());
        self.events.push(RenderEvent::BigBang);

        let store = match self.builder.build_with_rng(&payload.nodes, &payload.edges, &mut self.rng) {
            Ok(store) => store,
            Err(e) => return Err(self.fail(e.into())),
        };
        let stats = store.stats();
        engine.replace_store(store);
        self.events.push(RenderEvent::NetworkRebuilt {
            nodes: stats.nodes,
            edges: stats.edges,
        });
        info!(nodes = stats.nodes, edges = stats.edges, "Network rebuilt");
        Ok(stats)
    }

    /// Advance the engine clock
    pub fn tick(&mut self, now: Duration) {
        if let Some(engine) = self.engine.as_mut() {
            engine.tick(now);
        }
    }

    /// Take every event emitted since the last drain, in order
    pub fn drain_events(&mut self) -> Vec<RenderEvent> {
        if let Some(engine) = self.engine.as_mut() {
            self.events.append(&mut engine.drain_events());
        }
        std::mem::take(&mut self.events)
    }

    fn engine_mut(&mut self) -> Result<&mut PropagationEngine> {
        self.engine.as_mut().ok_or(Error::NotLoaded)
    }

    fn install(&mut self, store: GraphStore) {
        match self.engine.as_mut() {
            Some(engine) => {
                self.events.append(&mut engine.drain_events());
                engine.replace_store(store);
            }
            None => self.engine = Some(PropagationEngine::new(store, &self.config)),
        }
    }

    fn fail(&mut self, err: Error) -> Error {
        error!("Network load failed: {}", err);
        if let Some(mut engine) = self.engine.take() {
            self.events.append(&mut engine.drain_events());
        }
        self.payload = None;
        self.status = SessionStatus::Failed(err.to_string());
        err
    }
}
