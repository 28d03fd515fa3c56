//! Neural Blackwall driver
//!
//! Builds a network from a JSON payload and runs the infection sequences in
//! real time. A tokio interval stands in for the animation frame; events are
//! logged instead of drawn.

use clap::{Arg, ArgAction, ArgMatches, Command};
use neural_blackwall::core::config::{parse_cluster_policy, Config};
use neural_blackwall::graph::ThinkPayload;
use neural_blackwall::system::metrics;
use neural_blackwall::{Error, NetworkSession, RenderEvent, Result};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{debug, info, trace, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let network_arg = || {
        Arg::new("network")
            .short('n')
            .long("network")
            .value_name("FILE")
            .required(true)
            .help("Network payload (JSON)")
    };
    let waves_arg = || {
        Arg::new("waves")
            .short('w')
            .long("waves")
            .value_name("FILE")
            .help("Think payload with propagation waves (JSON)")
    };
    let frame_arg = || {
        Arg::new("frame-ms")
            .long("frame-ms")
            .value_name("MS")
            .default_value("16")
            .help("Frame interval driving the engine clock")
    };

    let matches = Command::new("neural-blackwall")
        .version(neural_blackwall::VERSION)
        .about("Graph construction and infection propagation for the blackwall network.")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("N")
                .global(true)
                .help("RNG seed for reproducible layouts"),
        )
        .arg(
            Arg::new("synthetic-probability")
                .long("synthetic-probability")
                .value_name("P")
                .global(true)
                .help("Chance of a synthetic edge between grid neighbors"),
        )
        .arg(
            Arg::new("cluster-policy")
                .long("cluster-policy")
                .value_name("POLICY")
                .global(true)
                .help("Cluster assignment (by_layer, random)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .global(true)
                .help("Log level (trace, debug, info, warn, error)"),
        )
        .arg(
            Arg::new("metrics")
                .long("metrics")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Print Prometheus metrics on exit"),
        )
        .subcommand(
            Command::new("build")
                .about("Build the network and print its stats")
                .arg(network_arg()),
        )
        .subcommand(
            Command::new("infect")
                .about("Infect everything reachable from the central node")
                .arg(network_arg()),
        )
        .subcommand(
            Command::new("think")
                .about("Run one think cycle in real time")
                .arg(network_arg())
                .arg(waves_arg())
                .arg(frame_arg()),
        )
        .subcommand(
            Command::new("interactive")
                .about("Read think / infect / reset / restart / stats / quit from stdin")
                .arg(network_arg())
                .arg(waves_arg())
                .arg(frame_arg()),
        )
        .get_matches();

    // Load configuration
    let mut config = if let Some(config_path) = matches.get_one::<String>("config") {
        Config::from_file(config_path)?
    } else {
        Config::load()?
    };

    // Apply CLI overrides
    apply_cli_overrides(&mut config, &matches)?;
    config.validate()?;

    neural_blackwall::init(&config.logging)?;

    let mut session = NetworkSession::new(config);
    let outcome = match matches.subcommand() {
        Some(("build", args)) => run_build(&mut session, args),
        Some(("infect", args)) => run_infect(&mut session, args),
        Some(("think", args)) => run_think(&mut session, args).await,
        Some(("interactive", args)) => run_interactive(&mut session, args).await,
        _ => Err(Error::config("Unknown command")),
    };

    if matches.get_flag("metrics") {
        print!("{}", metrics::collect_metrics());
    }
    outcome
}

/// Apply command line argument overrides to configuration
fn apply_cli_overrides(config: &mut Config, matches: &ArgMatches) -> Result<()> {
    if let Some(seed) = matches.get_one::<String>("seed") {
        config.build.seed = Some(seed.parse()
            .map_err(|e| Error::config(format!("Invalid seed: {}", e)))?);
    }

    if let Some(p) = matches.get_one::<String>("synthetic-probability") {
        config.build.synthetic_edge_probability = p.parse()
            .map_err(|e| Error::config(format!("Invalid synthetic edge probability: {}", e)))?;
    }

    if let Some(policy) = matches.get_one::<String>("cluster-policy") {
        config.layout.cluster_policy = parse_cluster_policy(policy)?;
    }

    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.clone();
    }

    Ok(())
}

fn load_network(session: &mut NetworkSession, args: &ArgMatches) -> Result<()> {
    let path = args
        .get_one::<String>("network")
        .ok_or_else(|| Error::config("Missing network payload path"))?;
    let text = std::fs::read_to_string(path)?;
    let stats = session.load_json(&text)?;
    info!(
        path = %path,
        nodes = stats.nodes,
        edges = stats.edges,
        synthetic = stats.synthetic_edges,
        "Network loaded"
    );
    Ok(())
}

fn load_waves(args: &ArgMatches) -> Result<ThinkPayload> {
    match args.get_one::<String>("waves") {
        Some(path) => Ok(ThinkPayload::from_json(&std::fs::read_to_string(Path::new(path))?)?),
        None => {
            debug!("No waves given, the orb runs alone");
            Ok(ThinkPayload::default())
        }
    }
}

fn frame_interval(args: &ArgMatches) -> Result<Duration> {
    let ms: u64 = args
        .get_one::<String>("frame-ms")
        .map(|v| v.parse::<u64>())
        .transpose()
        .map_err(|e| Error::config(format!("Invalid frame interval: {}", e)))?
        .unwrap_or(16);
    Ok(Duration::from_millis(ms.max(1)))
}

fn run_build(session: &mut NetworkSession, args: &ArgMatches) -> Result<()> {
    load_network(session, args)?;
    if let Some(store) = session.store() {
        println!("{}", serde_json::to_string_pretty(&store.stats())?);
    }
    Ok(())
}

fn run_infect(session: &mut NetworkSession, args: &ArgMatches) -> Result<()> {
    load_network(session, args)?;
    let order = session.infect_all()?;
    log_events(session.drain_events());

    let total = session.store().map(|s| s.node_count()).unwrap_or(0);
    println!(
        "{}",
        serde_json::json!({ "visited": order.len(), "unreachable": total - order.len() })
    );
    Ok(())
}

async fn run_think(session: &mut NetworkSession, args: &ArgMatches) -> Result<()> {
    load_network(session, args)?;
    let waves = load_waves(args)?;
    let frame = frame_interval(args)?;

    let epoch = Instant::now();
    session.think(waves)?;

    let mut interval = tokio::time::interval(frame);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                session.tick(epoch.elapsed());
                let events = session.drain_events();
                let finished = events.iter().any(RenderEvent::is_terminal);
                log_events(events);
                if finished {
                    break;
                }
            }
            _ = &mut shutdown => {
                warn!("Interrupted, abandoning think cycle");
                session.reset()?;
                break;
            }
        }
    }

    if let Some(report) = session.engine().and_then(|e| e.last_run()) {
        println!("{}", serde_json::to_string_pretty(report)?);
    }
    Ok(())
}

async fn run_interactive(session: &mut NetworkSession, args: &ArgMatches) -> Result<()> {
    load_network(session, args)?;
    let waves = load_waves(args)?;
    let frame = frame_interval(args)?;

    let epoch = Instant::now();
    let mut interval = tokio::time::interval(frame);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    info!("Ready: think, infect, reset, restart, stats, quit");
    loop {
        tokio::select! {
            _ = interval.tick() => {
                session.tick(epoch.elapsed());
                log_events(session.drain_events());
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "" => {}
                    "think" => match session.think(waves.clone()) {
                        Ok(()) => info!("Think cycle started"),
                        Err(e) if e.is_retryable() => warn!("{}, try again when it finishes", e),
                        Err(e) => return Err(e),
                    },
                    "infect" => {
                        let visited = session.infect_all()?;
                        info!(visited = visited.len(), "Infect all finished");
                    }
                    "reset" => session.reset()?,
                    "restart" => {
                        session.restart()?;
                    }
                    "stats" => {
                        if let Some(store) = session.store() {
                            println!("{}", serde_json::to_string(&store.stats())?);
                        }
                    }
                    "quit" | "exit" => break,
                    other => warn!("Unknown command: {}", other),
                }
                log_events(session.drain_events());
            }
            _ = &mut shutdown => break,
        }
    }

    info!("Shutdown complete");
    Ok(())
}

fn log_events(events: Vec<RenderEvent>) {
    for event in events {
        match event {
            RenderEvent::TraversalComplete { success: false } => warn!("{}", event),
            RenderEvent::TraversalComplete { .. }
            | RenderEvent::CorruptionDetected
            | RenderEvent::ResetComplete
            | RenderEvent::BigBang
            | RenderEvent::NetworkRebuilt { .. } => info!("{}", event),
            RenderEvent::NodeStateChanged { .. } | RenderEvent::CorruptionWave { .. } => debug!("{}", event),
            _ => trace!("{}", event),
        }
    }
}

/// Resolve on Ctrl+C or, on unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
