#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for the Sprout engine.
//!
//! Worlds live in a map directory as CSV tables next to `WorldsList.txt`.

mod config;
mod glyphs;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sprout_core::{CellCoord, Event};
use sprout_system_pathfinding::{Connectivity, Heuristic, PathFinder};
use sprout_system_session::{FrameInput, Session, SessionConfig};
use sprout_world::{query, DirectoryStore, GridWorld};

/// Headless tools for Sprout worlds.
#[derive(Parser)]
#[command(name = "sprout", version, about, long_about = None)]
struct Cli {
    /// Directory holding the world tables.
    #[arg(long, value_name = "DIR", default_value = "assets/maps", global = true)]
    maps: PathBuf,

    /// Optional session configuration in TOML.
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Simulate a session with a scripted walk and print its events
    Run {
        /// Frames to simulate.
        #[arg(long, default_value_t = 600)]
        frames: u32,
        /// Seconds per frame.
        #[arg(long, default_value_t = 1.0 / 60.0)]
        dt: f32,
        /// World to enter instead of the configured one.
        #[arg(long)]
        world: Option<String>,
    },
    /// Create or extend a world with procedural terrain
    Generate {
        /// World to open or create.
        name: String,
        /// Columns appended to the right edge.
        #[arg(long, default_value_t = 0)]
        extend: u32,
    },
    /// Print a world as text
    Show {
        /// World to print.
        name: String,
    },
    /// Find a path between two cells, given as `column,row`
    Path {
        /// World to search.
        name: String,
        /// Start cell.
        #[arg(value_parser = parse_cell)]
        from: CellCoord,
        /// Goal cell.
        #[arg(value_parser = parse_cell)]
        to: CellCoord,
        /// Search diagonal neighbours too.
        #[arg(long)]
        diagonal: bool,
        /// Heuristic weight.
        #[arg(long, default_value_t = 10)]
        weight: u32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Run { frames, dt, world } => run(cli.maps, config, frames, dt, world),
        Command::Generate { name, extend } => {
            let mut world = open_world(&cli.maps, &config)?;
            let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
            let origin = world
                .open_or_create(&name, &mut rng)
                .with_context(|| format!("failed to open world `{name}`"))?;
            world
                .generate_procedural(extend, &mut rng)
                .with_context(|| format!("failed to extend world `{name}`"))?;
            println!(
                "{name}: {origin:?}, {} columns",
                query::dimensions(&world).columns()
            );
            Ok(())
        }
        Command::Show { name } => {
            let mut world = open_world(&cli.maps, &config)?;
            world
                .load_world(&name)
                .with_context(|| format!("failed to load world `{name}`"))?;
            print!("{}", glyphs::render(&world));
            Ok(())
        }
        Command::Path {
            name,
            from,
            to,
            diagonal,
            weight,
        } => {
            let mut world = open_world(&cli.maps, &config)?;
            world
                .load_world(&name)
                .with_context(|| format!("failed to load world `{name}`"))?;
            let connectivity = if diagonal {
                Connectivity::Eight
            } else {
                Connectivity::Four
            };
            let path = PathFinder::new(connectivity).find_path(
                &world,
                from,
                to,
                Heuristic::Euclidean,
                weight,
            );
            if path.is_empty() {
                bail!("no path from {from} to {to} in `{name}`");
            }
            let steps: Vec<String> = path.iter().map(ToString::to_string).collect();
            println!("{}", steps.join(" "));
            Ok(())
        }
    }
}

fn open_world(maps: &Path, config: &SessionConfig) -> Result<GridWorld> {
    let store = DirectoryStore::new(maps)
        .with_context(|| format!("failed to open map directory {}", maps.display()))?;
    let mut world = GridWorld::init(
        config.levels,
        config.rows,
        config.columns,
        Box::new(store),
        &config.world.generation.template,
    )
    .context("failed to load the template world")?;
    world.set_tuning(config.world.clone());
    Ok(world)
}

fn run(
    maps: PathBuf,
    mut config: SessionConfig,
    frames: u32,
    dt: f32,
    world: Option<String>,
) -> Result<()> {
    if let Some(name) = world {
        config.start_world = name;
    }
    let store = DirectoryStore::new(&maps)
        .with_context(|| format!("failed to open map directory {}", maps.display()))?;
    let mut session = Session::new(config, Box::new(store)).context("failed to start session")?;

    for frame in 0..frames {
        let input = FrameInput {
            right: frame % 240 < 180,
            left: frame % 240 >= 200,
            jump: frame % 50 == 0,
            attack: frame % 20 == 0,
            ..FrameInput::default()
        };
        let report = session.update(dt, &input);
        if let Some(error) = report.persistence_error {
            tracing::warn!(frame, %error, "frame left unsaved changes");
        }
        if let Some(error) = report.inventory_error {
            tracing::warn!(frame, %error, "interaction skipped");
        }
        for event in &report.events {
            println!("{frame:>6} {}", describe(event));
        }
        if session.player().is_defeated() {
            break;
        }
    }

    session
        .world_mut()
        .flush()
        .context("failed to write pending world changes")?;
    let player = session.player();
    println!(
        "world {} after {} frames: player at {} with {:.1} health, {} of {} enemies active",
        query::active_world(session.world()),
        session.frame(),
        player.cell(),
        player.health(),
        session.enemies().iter().filter(|enemy| enemy.is_active()).count(),
        session.enemies().len(),
    );
    for (name, stack) in session.inventory().iter() {
        println!("  {name:<12} {:>3}/{}", stack.count(), stack.max());
    }
    Ok(())
}

fn describe(event: &Event) -> String {
    match event {
        Event::SeedMatured { cell, value } => format!("seed at {cell} grew into {value}"),
        Event::ChestOpened { cell, drop } => format!("chest at {cell} dropped {drop}"),
        Event::CellDestroyed { cell, previous } => format!("{previous} at {cell} destroyed"),
        Event::BlockPlaced { cell, value } => format!("placed {value} at {cell}"),
        Event::BlockHarvested { cell, previous } => format!("harvested {previous} at {cell}"),
        Event::ItemCollected { item, quantity } => format!("collected {quantity} {item}"),
        Event::PlayerHit { enemy, damage } => {
            format!("enemy {} hit the player for {damage}", enemy.get())
        }
        Event::PlayerDefeated => "player defeated".to_owned(),
        Event::EnemyDefeated { enemy } => format!("enemy {} defeated", enemy.get()),
    }
}

fn parse_cell(value: &str) -> Result<CellCoord, String> {
    let (column, row) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `column,row`, got `{value}`"))?;
    let column = column
        .trim()
        .parse()
        .map_err(|_| format!("invalid column `{column}`"))?;
    let row = row
        .trim()
        .parse()
        .map_err(|_| format!("invalid row `{row}`"))?;
    Ok(CellCoord::new(column, row))
}
