#![deny(warnings)]

//! Minimal Bevy HUD with headless frame simulation.
//!
//! Each frame ticks the engine, applies queued player commands, moves fresh
//! notifications into toasts and expires old ones.

use bevy_ecs::prelude::*;
use sim_core::ProducerId;
use sim_runtime::EconomyEngine;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Seconds a toast stays on screen.
const TOAST_SECS: f64 = 3.0;

#[derive(Resource, Default)]
struct Engine(EconomyEngine);

#[derive(Resource, Default)]
struct FrameTime {
    dt: f64,
}

#[derive(Clone, Debug, PartialEq)]
enum PlayerCommand {
    Create,
    Hire(ProducerId),
    UpgradeProducer(ProducerId),
    Upgrade,
    Evolve,
}

#[derive(Resource, Default)]
struct PlayerInput {
    queue: Vec<PlayerCommand>,
}

#[derive(Clone, Debug, PartialEq)]
struct Toast {
    message: String,
    shown_at: f64,
}

#[derive(Resource, Default)]
struct HudState {
    clock: f64,
    toasts: Vec<Toast>,
    last_event: String,
}

fn tick_engine(mut engine: ResMut<Engine>, frame: Res<FrameTime>, mut hud: ResMut<HudState>) {
    engine.0.tick(frame.dt);
    hud.clock = engine.0.elapsed_secs();
}

fn apply_input(
    mut engine: ResMut<Engine>,
    mut input: ResMut<PlayerInput>,
    mut hud: ResMut<HudState>,
) {
    let engine = &mut engine.0;
    for cmd in input.queue.drain(..) {
        let outcome = match &cmd {
            PlayerCommand::Create => {
                engine.perform_manual_action();
                Ok(format!("+{:.0}", engine.player().manual_action_value()))
            }
            PlayerCommand::Hire(id) => engine
                .purchase_producer(id)
                .map(|()| format!("hired {id}"))
                .map_err(|e| e.to_string()),
            PlayerCommand::UpgradeProducer(id) => engine
                .upgrade_producer(id)
                .map(|()| format!("upgraded {id}"))
                .map_err(|e| e.to_string()),
            PlayerCommand::Upgrade => engine
                .purchase_upgrade()
                .map(|()| "upgrade bought".to_string())
                .map_err(|e| e.to_string()),
            PlayerCommand::Evolve => engine
                .evolve()
                .map(|level| format!("evolved to level {level}"))
                .map_err(|e| e.to_string()),
        };
        match outcome {
            Ok(event) => {
                debug!(?cmd, %event, "command applied");
                hud.last_event = event;
            }
            Err(reason) => {
                debug!(?cmd, %reason, "command rejected");
                hud.last_event = reason;
            }
        }
    }
}

fn collect_toasts(mut engine: ResMut<Engine>, mut hud: ResMut<HudState>) {
    let clock = hud.clock;
    let fresh: Vec<Toast> = engine
        .0
        .take_pending_notifications()
        .iter()
        .map(|n| Toast {
            message: n.message.clone(),
            shown_at: clock,
        })
        .collect();
    hud.toasts.extend(fresh);
}

fn expire_toasts(mut hud: ResMut<HudState>) {
    let clock = hud.clock;
    hud.toasts.retain(|t| clock - t.shown_at < TOAST_SECS);
}

fn build_world(engine: EconomyEngine) -> (World, Schedule) {
    let mut world = World::new();
    world.insert_resource(Engine(engine));
    world.insert_resource(FrameTime::default());
    world.insert_resource(PlayerInput::default());
    world.insert_resource(HudState::default());
    let mut schedule = Schedule::default();
    schedule.add_systems((tick_engine, apply_input, collect_toasts, expire_toasts).chain());
    (world, schedule)
}

fn run_frame(world: &mut World, schedule: &mut Schedule, dt: f64, cmds: Vec<PlayerCommand>) {
    world.resource_mut::<FrameTime>().dt = dt;
    world.resource_mut::<PlayerInput>().queue.extend(cmds);
    schedule.run(world);
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let (mut world, mut schedule) = build_world(EconomyEngine::default());
    let worker = ProducerId::new("worker");
    // Scripted session at 10 frames per second
    for frame in 0..600u32 {
        let mut cmds = vec![PlayerCommand::Create];
        match frame % 50 {
            0 => cmds.push(PlayerCommand::Hire(worker.clone())),
            10 => cmds.push(PlayerCommand::Upgrade),
            20 => cmds.push(PlayerCommand::UpgradeProducer(worker.clone())),
            30 => cmds.push(PlayerCommand::Evolve),
            _ => {}
        }
        run_frame(&mut world, &mut schedule, 0.1, cmds);
        let hud = world.resource::<HudState>();
        for toast in hud.toasts.iter().filter(|t| t.shown_at == hud.clock) {
            info!(at = toast.shown_at, "{}", toast.message);
        }
        if frame % 100 == 0 {
            println!(
                "t={:>5.1}s | {} | toasts: {}",
                hud.clock,
                hud.last_event,
                hud.toasts.len()
            );
        }
    }
    let engine = &world.resource::<Engine>().0;
    println!(
        "game-frontend: HUD ready | score={:.0} rate={:.1}/s unlocked={}",
        engine.player().score(),
        engine.player().rate_per_second(),
        engine.notifications().len()
    );
}
