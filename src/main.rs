//! Command-line demo: a scripted wall run beside a long wall.

use std::f32::consts::FRAC_PI_2;
use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use glam::Vec3;
use log::info;
use wallrun::{
    init_logging, Block, BlockWorld, BodyId, CharacterBody, MoveInput, MovementConfig,
    MovementEvent, StandardMovement, WallRunMovement, DEFAULT_SIMULATION_STEP,
};

/// Runs a scripted wall run beside a long wall and prints the trajectory
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON movement configuration; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of moves to simulate
    #[arg(long, default_value_t = 240)]
    steps: u32,

    /// Seconds per move
    #[arg(long, default_value_t = DEFAULT_SIMULATION_STEP)]
    dt: f32,

    /// Move on which to jump off the wall
    #[arg(long)]
    jump_at: Option<u32>,
}

/// Floor with its top at z = 0 and a wall whose face is the plane x = 100.
fn scenario_world() -> BlockWorld {
    BlockWorld::new()
        .with_block(Block::new(
            Vec3::new(-10_000.0, -10_000.0, -100.0),
            Vec3::new(10_000.0, 10_000.0, 0.0),
        ))
        .with_block(Block::new(
            Vec3::new(100.0, -10_000.0, 0.0),
            Vec3::new(120.0, 10_000.0, 2000.0),
        ))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    ensure!(
        args.dt.is_finite() && args.dt > 0.0,
        "--dt must be positive, got {}",
        args.dt
    );

    let config = match &args.config {
        Some(path) => MovementConfig::from_path(path)
            .with_context(|| format!("loading movement config from {}", path.display()))?,
        None => MovementConfig::default(),
    };

    let id = BodyId(1);
    let world = scenario_world();
    let mut body = CharacterBody::new(id, Vec3::new(30.0, 0.0, 600.0)).facing_yaw(-FRAC_PI_2);
    body.velocity = Vec3::new(300.0, -500.0, -100.0);
    let mut movement = WallRunMovement::new(id, StandardMovement::default(), config);
    movement.register_mode_observer(None, false);
    let run_along_wall = Vec3::new(0.0, -1500.0, 0.0);

    for step in 0..args.steps {
        let input = MoveInput {
            acceleration: run_along_wall,
            jump: args.jump_at == Some(step),
        };
        movement.perform_move(&mut body, &world, &input, args.dt);
        for event in movement.drain_events() {
            match event {
                MovementEvent::Stamina(stamina) => info!(
                    "step {step}: stamina {:.1} ({:+.1}/s for {:.2}s, finished: {})",
                    stamina.current_value,
                    stamina.add_value_per_second,
                    stamina.duration,
                    stamina.finished
                ),
                MovementEvent::ModeChanged(changed) => {
                    info!("step {step}: {:?} -> {:?}", changed.previous, changed.current);
                }
                MovementEvent::EnableChanged(changed) => {
                    info!("step {step}: wall run enabled: {}", changed.enabled);
                }
            }
        }
        info!(
            "step {step}: {:?} at ({:.1}, {:.1}, {:.1}) moving ({:.1}, {:.1}, {:.1})",
            movement.mode(),
            body.location.x,
            body.location.y,
            body.location.z,
            body.velocity.x,
            body.velocity.y,
            body.velocity.z
        );
    }
    Ok(())
}
