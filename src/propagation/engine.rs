//! Traversal and staged propagation over a [`GraphStore`]
//!
//! Two modes share the store:
//!
//! - `infect_all` is an immediate breadth-first infection from the central
//!   node, guarded so a second call without a reset does nothing.
//! - `think` starts a timed run. An orb sweeps toward the centre while waves of
//!   activations are replayed step by step. Activations only take effect once
//!   the orb has infected the central node. The run ends when both the orb and
//!   the waves are done, or as soon as the orb arrives without having reached
//!   the central node.
//!
//! All timed work goes through a virtual-time [`Scheduler`] advanced by
//! [`PropagationEngine::tick`]. Reset and terminal failure cancel every
//! pending timer, so nothing from a torn-down run can touch the store later.

use crate::core::config::{Config, PropagationConfig};
use crate::core::error::PropagationError;
use crate::core::types::{NodeId, Position, StateToken};
use crate::graph::payload::{Activation, Wave};
use crate::graph::store::GraphStore;
use crate::propagation::events::RenderEvent;
use crate::propagation::orb::{self, OrbSweep};
use crate::propagation::scheduler::Scheduler;
use crate::system::metrics;
use ahash::AHashSet;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Lifecycle of a think run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThinkPhase {
    /// No run has started since the last reset
    Idle,
    /// Orb is moving, central node not reached yet
    OrbTraveling,
    /// Central node infected, wave activations take effect
    PropagatingWaves,
    /// Orb arrived without reaching the central node
    OrbDidNotReach,
    /// Run finished after reaching the central node
    Complete,
}

impl ThinkPhase {
    /// Whether a run is in flight in this phase
    pub fn is_active(&self) -> bool {
        matches!(self, ThinkPhase::OrbTraveling | ThinkPhase::PropagatingWaves)
    }

    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            ThinkPhase::Idle => "idle",
            ThinkPhase::OrbTraveling => "orb_traveling",
            ThinkPhase::PropagatingWaves => "propagating_waves",
            ThinkPhase::OrbDidNotReach => "orb_did_not_reach",
            ThinkPhase::Complete => "complete",
        }
    }
}

/// Summary of a finished think run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Terminal phase
    pub outcome: ThinkPhase,
    /// Waves in the input
    pub waves: usize,
    /// Steps taken before the run ended
    pub steps: u32,
    /// Nodes the orb infected
    pub orb_infected: usize,
    /// Activations applied after the central node was reached
    pub activations_applied: usize,
    /// Activations dropped because the central node was not reached yet
    pub activations_gated: usize,
}

#[derive(Debug, Clone)]
enum Task {
    Step,
    Activate { id: Option<NodeId>, value: f64, progress: f64 },
    OrbArrived,
}

/// Per-run state, dropped when the run ends or is cancelled
#[derive(Debug)]
struct ThinkRun {
    waves: Vec<Wave>,
    total_steps: u32,
    step: u32,
    stepping_done: bool,
    pending_activations: usize,
    orb: OrbSweep,
    orb_done: bool,
    last_sample: Option<Duration>,
    orb_seen: AHashSet<NodeId>,
    orb_infected: Vec<NodeId>,
    central_reached: bool,
    activations_applied: usize,
    activations_gated: usize,
}

impl ThinkRun {
    fn is_finished(&self) -> bool {
        self.orb_done && self.central_reached && self.stepping_done && self.pending_activations == 0
    }
}

/// Propagation engine owning the graph it mutates
#[derive(Debug)]
pub struct PropagationEngine {
    store: GraphStore,
    config: PropagationConfig,
    orb_start: Position,
    orb_target: Position,
    scheduler: Scheduler<Task>,
    run: Option<ThinkRun>,
    phase: ThinkPhase,
    fully_infected: bool,
    events: Vec<RenderEvent>,
    last_run: Option<RunReport>,
}

impl PropagationEngine {
    /// Create an engine over `store`
    pub fn new(store: GraphStore, config: &Config) -> Self {
        let propagation = config.propagation.clone();
        let [x, y, z] = propagation.orb_target;
        Self {
            store,
            orb_start: orb::start_position(config.layout.network_radius, propagation.orb_start_factor),
            orb_target: Position::new(x, y, z),
            config: propagation,
            scheduler: Scheduler::new(),
            run: None,
            phase: ThinkPhase::Idle,
            fully_infected: false,
            events: Vec::new(),
            last_run: None,
        }
    }

    /// The graph
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Swap in a new graph, cancelling any run and pending timers. The clock keeps going.
    pub fn replace_store(&mut self, store: GraphStore) -> GraphStore {
        let cancelled = self.scheduler.cancel_all();
        self.run = None;
        self.phase = ThinkPhase::Idle;
        self.fully_infected = false;
        self.publish_pending();
        debug!(cancelled_timers = cancelled, "Graph replaced");
        std::mem::replace(&mut self.store, store)
    }

    /// Current phase of the think state machine
    pub fn phase(&self) -> ThinkPhase {
        self.phase
    }

    /// Whether a think run is in flight
    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Whether `infect_all` has run since the last reset
    pub fn is_fully_infected(&self) -> bool {
        self.fully_infected
    }

    /// Report of the last finished run
    pub fn last_run(&self) -> Option<&RunReport> {
        self.last_run.as_ref()
    }

    /// Virtual time of the last tick
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Number of timers waiting to fire
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<RenderEvent> {
        std::mem::take(&mut self.events)
    }

    /// Breadth-first infection of everything reachable from the central node.
    ///
    /// Returns nodes in visit order. Does nothing and returns an empty list if
    /// it already ran since the last reset.
    pub fn infect_all(&mut self) -> Result<Vec<NodeId>, PropagationError> {
        if self.fully_infected {
            debug!("Network already infected, skipping traversal");
            return Ok(Vec::new());
        }
        if self.store.central().is_none() {
            return Err(PropagationError::MissingCentralNode);
        }

        let mut frontier = VecDeque::from([NodeId::Central]);
        let mut visited = AHashSet::with_capacity(self.store.node_count());
        let mut order = Vec::new();
        let mut newly_infected = 0;

        while let Some(id) = frontier.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            if self.corrupt(id, 1.0) {
                newly_infected += 1;
            }
            order.push(id);
            frontier.extend(
                self.store
                    .neighbors_of(id)
                    .map(|node| node.id)
                    .filter(|next| !visited.contains(next)),
            );
        }

        self.fully_infected = true;
        self.events.push(RenderEvent::TraversalComplete { success: true });
        metrics::record_infections("bfs", newly_infected);
        info!(
            visited = order.len(),
            unreachable = self.store.node_count() - order.len(),
            "Full network infection complete"
        );
        Ok(order)
    }

    /// Start a think run over `waves`. Rejected while another run is in flight.
    pub fn think(&mut self, waves: Vec<Wave>) -> Result<(), PropagationError> {
        if self.run.is_some() {
            warn!("Think requested while a run is in flight");
            return Err(PropagationError::AlreadyRunning);
        }
        if self.store.central().is_none() {
            return Err(PropagationError::MissingCentralNode);
        }

        let total_steps = u32::try_from(waves.len())
            .unwrap_or(u32::MAX)
            .saturating_mul(self.config.steps_per_wave);
        let orb = OrbSweep::new(
            self.orb_start,
            self.orb_target,
            self.scheduler.now(),
            self.config.orb_duration,
            self.config.orb_infection_radius,
        );

        info!(waves = waves.len(), total_steps, "Think cycle started");
        self.run = Some(ThinkRun {
            waves,
            total_steps,
            step: 0,
            stepping_done: false,
            pending_activations: 0,
            orb,
            orb_done: false,
            last_sample: None,
            orb_seen: AHashSet::new(),
            orb_infected: Vec::new(),
            central_reached: false,
            activations_applied: 0,
            activations_gated: 0,
        });
        self.phase = ThinkPhase::OrbTraveling;
        self.scheduler.schedule(self.config.step_interval, Task::Step);
        self.scheduler.schedule(self.config.orb_duration, Task::OrbArrived);
        self.publish_pending();
        Ok(())
    }

    /// Advance virtual time to `now`, firing due timers in order.
    ///
    /// The orb is sampled at each timer's due time before the timer runs, and
    /// once more at `now`.
    pub fn tick(&mut self, now: Duration) {
        while let Some((at, task)) = self.scheduler.pop_due(now) {
            self.sample_orb(at);
            self.run_task(task);
        }
        self.scheduler.advance_to(now);
        self.sample_orb(now);
        self.publish_pending();
    }

    /// Cancel any run, put every token back to base and clear the infection guard
    pub fn reset(&mut self) {
        let cancelled = self.scheduler.cancel_all();
        if self.run.take().is_some() {
            debug!("Think cycle cancelled by reset");
        }
        self.phase = ThinkPhase::Idle;
        self.restore_all();
        self.events.push(RenderEvent::ResetComplete);
        metrics::record_reset();
        self.publish_pending();
        info!(cancelled_timers = cancelled, "Network reset");
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::Step => self.step(),
            Task::Activate { id, value, progress } => self.activate(id, value, progress),
            Task::OrbArrived => self.orb_arrived(),
        }
    }

    fn step(&mut self) {
        let Some(run) = self.run.as_mut() else { return };
        if run.step >= run.total_steps {
            run.stepping_done = true;
            debug!(steps = run.step, "Wave stepping finished");
            self.try_complete();
            return;
        }

        let step = run.step;
        let progress = f64::from(step) / f64::from(run.total_steps);
        let wave = (step / self.config.steps_per_wave) as usize;
        let activations: Vec<Activation> = run
            .waves
            .get(wave)
            .map(|w| w.iter().take(self.config.max_activations_per_wave).copied().collect())
            .unwrap_or_default();
        run.pending_activations += activations.len();
        run.step += 1;

        trace!(step, wave, activations = activations.len(), "Wave step");
        for (index, activation) in activations.into_iter().enumerate() {
            self.scheduler.schedule(
                self.config.activation_stagger * index as u32,
                Task::Activate {
                    id: activation.id.map(NodeId::Index),
                    value: activation.value,
                    progress,
                },
            );
        }
        self.events.push(RenderEvent::CentralPulse { progress });
        self.scheduler.schedule(self.config.step_interval, Task::Step);
    }

    fn activate(&mut self, id: Option<NodeId>, value: f64, progress: f64) {
        let Some(run) = self.run.as_mut() else { return };
        run.pending_activations = run.pending_activations.saturating_sub(1);

        if !run.central_reached {
            run.activations_gated += 1;
            trace!(?id, "Activation held back, central node not reached");
        } else if let Some(id) = id.filter(|id| self.store.find_node(*id).is_some()) {
            run.activations_applied += 1;
            if self.corrupt(id, value) {
                metrics::record_infections("wave", 1);
            }
            self.events.push(RenderEvent::CorruptionWave { id, progress });
        } else {
            debug!(?id, "Activation for unknown node");
        }
        self.try_complete();
    }

    fn orb_arrived(&mut self) {
        let Some(run) = self.run.as_mut() else { return };
        run.orb_done = true;
        if run.central_reached {
            debug!("Orb arrived at its target");
            self.try_complete();
            return;
        }

        let cancelled = self.scheduler.cancel_all();
        warn!(cancelled_timers = cancelled, "Central node was not infected, orb did not reach the center");
        self.finish(ThinkPhase::OrbDidNotReach);
        self.events.push(RenderEvent::TraversalComplete { success: false });
    }

    fn sample_orb(&mut self, at: Duration) {
        let Some(run) = self.run.as_mut() else { return };
        if run.orb_done || run.last_sample == Some(at) {
            return;
        }
        run.last_sample = Some(at);

        let position = run.orb.position_at(at);
        self.events.push(RenderEvent::orb_moved(position));

        let hits: Vec<NodeId> = run
            .orb
            .hits(&self.store, position)
            .into_iter()
            .filter(|id| run.orb_seen.insert(*id))
            .collect();
        if hits.is_empty() {
            return;
        }
        run.orb_infected.extend_from_slice(&hits);
        let reached = !run.central_reached && hits.contains(&NodeId::Central);
        if reached {
            run.central_reached = true;
        }

        let mut newly_infected = 0;
        for &id in &hits {
            if self.corrupt(id, 1.0) {
                newly_infected += 1;
            }
            self.events.push(RenderEvent::CorruptionWave { id, progress: 1.0 });
        }
        metrics::record_infections("orb", newly_infected);

        if reached {
            self.phase = ThinkPhase::PropagatingWaves;
            info!(at_ms = at.as_millis() as u64, "Orb reached the central node");
        }
    }

    fn try_complete(&mut self) {
        let Some(run) = self.run.as_ref() else { return };
        if !run.is_finished() {
            return;
        }

        let orb_infected = run.orb_infected.clone();
        for id in orb_infected {
            self.corrupt(id, 1.0);
        }
        self.finish(ThinkPhase::Complete);
        self.restore_all();
        self.events.push(RenderEvent::CorruptionDetected);
        self.events.push(RenderEvent::TraversalComplete { success: true });
        self.events.push(RenderEvent::ResetComplete);
        info!("Corruption detected, network restored");
    }

    fn finish(&mut self, outcome: ThinkPhase) {
        if let Some(run) = self.run.take() {
            self.last_run = Some(RunReport {
                outcome,
                waves: run.waves.len(),
                steps: run.step,
                orb_infected: run.orb_infected.len(),
                activations_applied: run.activations_applied,
                activations_gated: run.activations_gated,
            });
        }
        self.phase = outcome;
        metrics::record_think_outcome(outcome.as_str());
    }

    /// Infect a node and its incident edges. Returns whether the node was clean.
    fn corrupt(&mut self, id: NodeId, intensity: f64) -> bool {
        let newly = match self.store.infect_node(id) {
            Ok(newly) => newly,
            Err(e) => {
                debug!("Skipping corruption: {}", e);
                return false;
            }
        };
        self.events.push(RenderEvent::NodeStateChanged {
            id,
            token: StateToken::Corrupted,
            intensity,
        });

        let edges = self.store.incident_edges(id).to_vec();
        for edge in edges {
            if let Ok(true) = self.store.infect_edge(edge) {
                self.events.push(RenderEvent::EdgeStateChanged {
                    id: edge,
                    token: StateToken::Corrupted,
                });
            }
        }
        newly
    }

    fn restore_all(&mut self) {
        let restored = self.store.restore_all();
        for id in restored.nodes {
            if let Some(node) = self.store.find_node(id) {
                self.events.push(RenderEvent::NodeStateChanged {
                    id,
                    token: node.base_state(),
                    intensity: 0.0,
                });
            }
        }
        for id in restored.edges {
            if let Some(edge) = self.store.find_edge(id) {
                self.events.push(RenderEvent::EdgeStateChanged {
                    id,
                    token: edge.base_state(),
                });
            }
        }
        self.fully_infected = false;
    }

    fn publish_pending(&self) {
        metrics::set_pending_timers(self.scheduler.pending());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::EdgeKind;
    use crate::graph::grid::SpatialGrid;
    use cgmath::EuclideanSpace;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Central node plus one node per position, each joined by a spoke
    fn star(positions: &[Position]) -> GraphStore {
        let mut store = GraphStore::new();
        let mut grid = SpatialGrid::new(300.0);
        let origin = Position::origin();
        store.add_node(NodeId::Central, 0, origin, StateToken::Central).unwrap();
        grid.insert(NodeId::Central, &origin);
        for (i, pos) in positions.iter().enumerate() {
            let id = NodeId::Index(i as u32);
            store.add_node(id, 0, *pos, StateToken::Palette(i as u8 % 6)).unwrap();
            grid.insert(id, pos);
            store.add_edge(NodeId::Central, id, EdgeKind::CentralSpoke);
        }
        store.set_grid(grid);
        store
    }

    fn far_nodes(count: usize) -> Vec<Position> {
        (0..count).map(|i| Position::new(1000.0 + i as f64 * 10.0, 0.0, 0.0)).collect()
    }

    fn waves(count: usize, ids: &[u32], value: f64) -> Vec<Wave> {
        (0..count)
            .map(|_| ids.iter().map(|&id| Activation::new(id, value)).collect())
            .collect()
    }

    fn run_frames(engine: &mut PropagationEngine, from: u64, to: u64, frame: u64) {
        let mut t = from;
        while t <= to {
            engine.tick(ms(t));
            t += frame;
        }
    }

    fn missed_config() -> Config {
        let mut config = Config::default();
        config.propagation.orb_target = [5000.0, 5000.0, 0.0];
        config
    }

    #[test]
    fn test_infect_all_visits_reachable_nodes_once() {
        let mut store = star(&far_nodes(5));
        store.add_edge(NodeId::Index(0), NodeId::Index(1), EdgeKind::Data);
        store.add_edge(NodeId::Index(1), NodeId::Index(2), EdgeKind::Data);
        store.add_edge(NodeId::Index(2), NodeId::Index(0), EdgeKind::Data);
        store
            .add_node(NodeId::Index(9), 0, Position::new(-900.0, 0.0, 0.0), StateToken::Palette(0))
            .unwrap();

        let mut engine = PropagationEngine::new(store, &Config::default());
        let order = engine.infect_all().unwrap();

        assert_eq!(order.len(), 6);
        assert_eq!(order[0], NodeId::Central);
        let unique: AHashSet<NodeId> = order.iter().copied().collect();
        assert_eq!(unique.len(), order.len());
        assert!(!unique.contains(&NodeId::Index(9)));
        assert!(!engine.store().find_node(NodeId::Index(9)).unwrap().infected);
        assert!(engine.store().edges().iter().all(|e| e.infected));
        assert_eq!(engine.store().infected_count(), 6);
    }

    #[test]
    fn test_infect_all_is_noop_until_reset() {
        let mut engine = PropagationEngine::new(star(&far_nodes(4)), &Config::default());
        let first = engine.infect_all().unwrap();
        engine.drain_events();

        assert!(engine.infect_all().unwrap().is_empty());
        assert!(engine.drain_events().is_empty());

        engine.reset();
        assert_eq!(engine.store().infected_count(), 0);
        let second = engine.infect_all().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_spokes_alone_reach_every_node() {
        let mut engine = PropagationEngine::new(star(&far_nodes(10)), &Config::default());
        engine.infect_all().unwrap();
        assert!(engine.store().nodes().all(|n| n.infected));
    }

    #[test]
    fn test_missing_central_node() {
        let mut engine = PropagationEngine::new(GraphStore::new(), &Config::default());
        assert_eq!(engine.infect_all(), Err(PropagationError::MissingCentralNode));
        assert_eq!(engine.think(Vec::new()), Err(PropagationError::MissingCentralNode));
        assert!(!engine.is_running());
    }

    #[test]
    fn test_concurrent_think_is_rejected() {
        let mut engine = PropagationEngine::new(star(&far_nodes(3)), &Config::default());
        engine.think(waves(2, &[0, 1], 0.5)).unwrap();
        assert_eq!(engine.think(waves(1, &[2], 0.5)), Err(PropagationError::AlreadyRunning));
        assert_eq!(engine.phase(), ThinkPhase::OrbTraveling);
    }

    #[test]
    fn test_waves_wait_for_central_node() {
        let mut engine = PropagationEngine::new(star(&far_nodes(3)), &Config::default());
        // Ten waves keep stepping until the orb arrives
        engine.think(waves(10, &[0, 1], 0.5)).unwrap();
        run_frames(&mut engine, 0, 9000, 16);

        let events = engine.drain_events();
        let central_hit = events
            .iter()
            .position(|e| matches!(e, RenderEvent::NodeStateChanged { id: NodeId::Central, .. }))
            .expect("orb should reach the central node");
        let first_wave_hit = events
            .iter()
            .position(|e| {
                matches!(
                    e,
                    RenderEvent::NodeStateChanged { id: NodeId::Index(_), token: StateToken::Corrupted, .. }
                )
            })
            .expect("late activations should apply");
        assert!(central_hit < first_wave_hit);

        let report = engine.last_run().unwrap();
        assert_eq!(report.outcome, ThinkPhase::Complete);
        assert_eq!(report.steps, 80);
        assert!(report.activations_gated > 0);
        assert!(report.activations_applied > 0);
        assert_eq!(report.activations_gated + report.activations_applied, 160);
    }

    #[test]
    fn test_successful_run_ends_restored() {
        let mut engine = PropagationEngine::new(star(&far_nodes(3)), &Config::default());
        engine.think(waves(10, &[0, 1, 2], 0.8)).unwrap();
        run_frames(&mut engine, 0, 9000, 100);

        assert_eq!(engine.phase(), ThinkPhase::Complete);
        assert!(!engine.is_running());
        assert_eq!(engine.pending_timers(), 0);
        assert_eq!(engine.store().infected_count(), 0);
        assert!(engine.store().edges().iter().all(|e| !e.is_dirty()));

        let events = engine.drain_events();
        let tail: Vec<&RenderEvent> = events.iter().rev().take(3).collect();
        assert_eq!(tail[2], &RenderEvent::CorruptionDetected);
        assert_eq!(tail[1], &RenderEvent::TraversalComplete { success: true });
        assert_eq!(tail[0], &RenderEvent::ResetComplete);

        let pulses: Vec<f64> = events
            .iter()
            .filter_map(|e| match e {
                RenderEvent::CentralPulse { progress } => Some(*progress),
                _ => None,
            })
            .collect();
        assert_eq!(pulses.len(), 80);
        assert_eq!(pulses[0], 0.0);
        assert!(pulses.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_orb_missing_center_fails_without_infection() {
        let mut engine = PropagationEngine::new(star(&far_nodes(3)), &missed_config());
        engine.think(waves(3, &[0, 1, 2], 1.0)).unwrap();
        run_frames(&mut engine, 0, 12_000, 50);

        assert_eq!(engine.phase(), ThinkPhase::OrbDidNotReach);
        assert!(!engine.is_running());
        assert_eq!(engine.pending_timers(), 0);
        assert_eq!(engine.store().infected_count(), 0);

        let events = engine.drain_events();
        assert_eq!(events.last(), Some(&RenderEvent::TraversalComplete { success: false }));
        assert!(!events.iter().any(|e| matches!(e, RenderEvent::NodeStateChanged { .. })));

        let report = engine.last_run().unwrap();
        assert_eq!(report.activations_applied, 0);
        assert_eq!(report.orb_infected, 0);

        // A fresh run is accepted after a failure
        assert!(engine.think(waves(1, &[0], 1.0)).is_ok());
    }

    #[test]
    fn test_unknown_activation_ids_are_skipped() {
        let mut engine = PropagationEngine::new(star(&far_nodes(3)), &Config::default());
        let wave: Wave = vec![Activation { id: None, value: 1.0 }, Activation::new(99, 1.0)];
        engine.think(vec![wave; 10]).unwrap();
        run_frames(&mut engine, 0, 9000, 100);

        let report = engine.last_run().unwrap();
        assert_eq!(report.outcome, ThinkPhase::Complete);
        assert_eq!(report.activations_applied, 0);
        assert!(report.activations_gated > 0);
        assert!(!engine
            .drain_events()
            .iter()
            .any(|e| matches!(e, RenderEvent::CorruptionWave { id: NodeId::Index(_), .. })));
    }

    #[test]
    fn test_activations_capped_per_wave() {
        let mut config = missed_config();
        config.propagation.steps_per_wave = 1;
        let mut engine = PropagationEngine::new(star(&far_nodes(3)), &config);

        let big_wave: Wave = (0..150).map(|i| Activation::new(i % 3, 0.1)).collect();
        engine.think(vec![big_wave]).unwrap();
        run_frames(&mut engine, 0, 10_000, 100);

        let report = engine.last_run().unwrap();
        assert_eq!(report.activations_gated + report.activations_applied, 100);
    }

    #[test]
    fn test_reset_cancels_pending_timers() {
        let mut engine = PropagationEngine::new(star(&far_nodes(3)), &Config::default());
        engine.think(waves(10, &[0, 1, 2], 0.5)).unwrap();
        run_frames(&mut engine, 0, 7000, 100);
        assert!(engine.store().infected_count() > 0);
        assert!(engine.pending_timers() > 0);

        engine.reset();
        assert_eq!(engine.phase(), ThinkPhase::Idle);
        assert_eq!(engine.pending_timers(), 0);
        assert_eq!(engine.store().infected_count(), 0);
        assert_eq!(engine.drain_events().last(), Some(&RenderEvent::ResetComplete));

        run_frames(&mut engine, 7100, 20_000, 100);
        assert!(engine.drain_events().is_empty());
        assert_eq!(engine.store().infected_count(), 0);
        assert!(engine.last_run().is_none());
    }

    #[test]
    fn test_replace_store_drops_run() {
        let mut engine = PropagationEngine::new(star(&far_nodes(3)), &Config::default());
        engine.think(waves(2, &[0], 0.5)).unwrap();
        engine.tick(ms(500));

        let old = engine.replace_store(star(&far_nodes(5)));
        assert_eq!(old.node_count(), 4);
        assert_eq!(engine.store().node_count(), 6);
        assert!(!engine.is_running());
        assert_eq!(engine.pending_timers(), 0);
        assert_eq!(engine.now(), ms(500));
    }
}
