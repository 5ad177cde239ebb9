#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs headless Wire Tracer simulations.
//!
//! The binary loads a level file (or builds a small built-in circuit through
//! the construction commands), spawns the player on the start node, and then
//! pumps the clock: steering the player from an optional direction script,
//! letting the collision and foe systems react to each tick's events, and
//! applying the command batches they produce.

use std::collections::VecDeque;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use wire_tracer_core::{Command, Direction, Event, FoeKind, NodeId, NodeKind, Vec2i};
use wire_tracer_level as level;
use wire_tracer_system_collision::Collision;
use wire_tracer_system_foes::{Config as FoesConfig, Foes};
use wire_tracer_world::{apply, query, World};

/// Command-line arguments accepted by the simulation runner.
#[derive(Debug, Parser)]
#[command(name = "wire-tracer", about = "Headless Wire Tracer simulation runner")]
struct Args {
    /// Level file to load; a built-in demo circuit is used when omitted.
    #[arg(long)]
    level: Option<PathBuf>,
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u64,
    /// Seed for foe decision randomness.
    #[arg(long, default_value_t = 7)]
    seed: u64,
    /// Steering script consumed whenever the player is idle, e.g. "RRDL".
    #[arg(long, default_value = "")]
    script: String,
}

/// How a simulation run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    /// Every edge of the level was marked.
    Cleared,
    /// A foe caught the player.
    Caught,
    /// The tick budget ran out first.
    TimedOut,
}

impl Outcome {
    fn describe(self) -> &'static str {
        match self {
            Self::Cleared => "all edges marked",
            Self::Caught => "player caught",
            Self::TimedOut => "time limit reached",
        }
    }
}

/// Entry point for the Wire Tracer command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut script = parse_script(&args.script)?;

    let (title, mut world) = match &args.level {
        Some(path) => {
            let (spec, world) = level::load_file(path)
                .with_context(|| format!("loading level {}", path.display()))?;
            (spec.title, world)
        }
        None => (Some("Demo Circuit".to_owned()), demo_world()),
    };

    println!("{}", query::welcome_banner(&world));
    if let Some(title) = title {
        println!("{title}");
    }

    let start = query::start_node(&world).context("level has no start node")?;
    let mut events = Vec::new();
    apply(&mut world, Command::SpawnPlayer { node: start }, &mut events);

    let mut foes = Foes::new(FoesConfig::new(args.seed));
    let collision = Collision::default();
    let total_edges = query::edge_view(&world).into_vec().len();
    let mut outcome = Outcome::TimedOut;

    for _ in 0..args.ticks {
        steer_from_script(&mut world, &mut script);

        events.clear();
        apply(&mut world, Command::Tick, &mut events);

        let mut commands = Vec::new();
        collision.handle(&events, &world, &mut commands);
        foes.handle(&events, &world, &mut commands);

        let mut follow_up = Vec::new();
        for command in commands {
            apply(&mut world, command, &mut follow_up);
        }
        // Rejections only adjust cached foe routes; no commands come back.
        let mut spill = Vec::new();
        foes.handle(&follow_up, &world, &mut spill);
        events.extend(follow_up);

        if events
            .iter()
            .any(|event| matches!(event, Event::AllEdgesMarked { .. }))
        {
            outcome = Outcome::Cleared;
            break;
        }
        if events
            .iter()
            .any(|event| matches!(event, Event::PlayerCaught { .. }))
        {
            outcome = Outcome::Caught;
            break;
        }
    }

    println!("ticks simulated: {}", query::tick(&world));
    println!(
        "edges marked: {}/{total_edges}",
        query::marked_edge_count(&world)
    );
    println!("outcome: {}", outcome.describe());
    Ok(())
}

/// Steers the idle player along the next scripted direction, if any.
///
/// Entries are consumed even when the direction is blocked, mirroring how a
/// scripted demo drives the title screen.
fn steer_from_script(world: &mut World, script: &mut VecDeque<Direction>) {
    let Some(player) = query::player(world) else {
        return;
    };
    if player.moving || player.dead {
        return;
    }
    let Some(direction) = script.pop_front() else {
        return;
    };
    let mut events = Vec::new();
    apply(world, Command::SteerPlayer { direction }, &mut events);
}

fn parse_script(text: &str) -> Result<VecDeque<Direction>> {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c.to_ascii_uppercase() {
            'U' => Ok(Direction::Up),
            'D' => Ok(Direction::Down),
            'L' => Ok(Direction::Left),
            'R' => Ok(Direction::Right),
            other => bail!("unknown steering direction '{other}'"),
        })
        .collect()
}

/// Builds a small circuit with a ring, a joint-linked detour, and two foes.
fn demo_world() -> World {
    let mut world = World::new();
    let mut events = Vec::new();

    let a = demo_node(&mut world, 0, 0);
    let b = demo_node(&mut world, 200, 0);
    let c = demo_node(&mut world, 200, 200);
    let d = demo_node(&mut world, 0, 200);
    let reach = demo_node(&mut world, 300, 100);

    for (from, to) in [(a, b), (b, c), (c, d), (d, a), (b, reach), (reach, c)] {
        apply(
            &mut world,
            Command::ConnectNodes {
                from,
                to,
                reverse_corner: false,
                one_way: false,
            },
            &mut events,
        );
    }
    apply(&mut world, Command::SetStartNode { node: a }, &mut events);
    apply(
        &mut world,
        Command::SpawnFoe {
            kind: FoeKind::Simple,
            node: c,
        },
        &mut events,
    );
    apply(
        &mut world,
        Command::SpawnFoe {
            kind: FoeKind::Tracking,
            node: d,
        },
        &mut events,
    );
    world
}

fn demo_node(world: &mut World, x: i32, y: i32) -> NodeId {
    let mut events = Vec::new();
    apply(
        world,
        Command::AddNode {
            pos: Vec2i::new(x, y),
            kind: NodeKind::Square,
        },
        &mut events,
    );
    match events.last() {
        Some(Event::NodeAdded { node, .. }) => *node,
        _ => unreachable!("node creation always reports an id"),
    }
}
