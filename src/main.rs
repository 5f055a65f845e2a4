//! Frame Sync entry point
//!
//! Headless lockstep demo: two peers start from the same snapshot bytes,
//! receive the same input every frame and compare checksums after each
//! step. Midway the host rolls back and replays, and later the guest drops
//! one frame of input, is caught by the desync check and resyncs from the
//! host.

use std::process::ExitCode;
use std::sync::Arc;

use thiserror::Error;

use frame_sync::sim::snapshot;
use frame_sync::sim::{
    Agent, ChecksumLog, Command, DesyncDetector, Engine, EntityRegistry, Game, InputLog,
    LogObserver, Mover, Orbiter, PeerId, SpawnRequest, TickInput,
};
use frame_sync::{ConfigError, DesyncDetected, Fixed, FixedVec2, Settings, StateBuffer, SyncError};

/// Frames the host rewinds at the midpoint
const ROLLBACK_DEPTH: u64 = 30;

#[derive(Debug, Error)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Desync(#[from] DesyncDetected),
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Frame Sync (native) starting...");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), DemoError> {
    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    log::info!(
        "seed {:#x}, {} Hz, {} frames",
        settings.seed,
        settings.tick_rate,
        settings.demo_frames
    );

    let registry = Arc::new(EntityRegistry::with_builtin());
    let mut game = Game::new(registry.clone(), settings.seed, settings.tick_duration());
    let pilot = game.spawn(Box::new(Mover::new(FixedVec2::ZERO, FixedVec2::ZERO)))?;
    let satellite = game.spawn(Box::new(Orbiter::new(
        FixedVec2::ZERO,
        Fixed::from_int(25),
        Fixed::ONE,
    )))?;
    let seed_bytes = snapshot::encode(0, &game)?.into_bytes();

    let checksums = ChecksumLog::new(settings.desync_window);
    let mut host = peer(PeerId(1), "host", &registry, &seed_bytes, &settings)?
        .with_observer(Box::new(LogObserver::new(settings.summary_every)))
        .with_observer(Box::new(DesyncDetector::new(checksums.clone())));
    host.agent_mut().control(pilot);
    let mut guest = peer(PeerId(2), "guest", &registry, &seed_bytes, &settings)?;
    guest.agent_mut().control(satellite);

    let frames = settings.demo_frames;
    let spawn_frame = frames / 4;
    let rollback_frame = frames / 2;
    let glitch_frame = frames * 3 / 4;
    let mut inputs = InputLog::new(0);
    let mut resyncs = 0;

    for frame in 0..frames {
        let mut input = TickInput::new();
        host.agent().submit(&mut input, pilot_command(frame));
        guest.agent().submit(&mut input, satellite_command(frame));
        if frame == spawn_frame && frame > 0 {
            let drone = Mover::new(FixedVec2::from_int(-10, 0), FixedVec2::Y);
            input.spawns.push(SpawnRequest::of(&drone));
        }

        host.step(&input);
        if frame == glitch_frame && frame > 0 {
            log::warn!("guest dropped input for frame {frame}");
            guest.step(&TickInput::new());
        } else {
            guest.step(&input);
        }
        inputs.push(input);

        if frame == rollback_frame
            && host.frame() > ROLLBACK_DEPTH
            && settings.history_capacity as u64 > ROLLBACK_DEPTH
        {
            host.rollback_to(host.frame() - ROLLBACK_DEPTH)?;
            let replayed = host.replay(&inputs)?;
            log::info!("host replayed {replayed} frames after rollback");
        }

        if let Err(desync) = checksums.verify(host.frame(), guest.checksum()?) {
            log::warn!("{desync}; resyncing guest from host");
            guest.import(&mut host.export()?)?;
            resyncs += 1;
        }
    }

    // Both peers must end on the same state
    checksums.verify(host.frame(), guest.checksum()?)?;
    log::info!(
        "{} frames in lockstep, {} resync(s), final checksum {}",
        host.frame(),
        resyncs,
        host.checksum()?
    );
    match serde_json::to_string_pretty(&host.describe_json()) {
        Ok(json) => log::info!("host state:\n{json}"),
        Err(err) => log::warn!("could not render state description: {err}"),
    }
    Ok(())
}

fn peer(
    id: PeerId,
    name: &str,
    registry: &Arc<EntityRegistry>,
    bytes: &[u8],
    settings: &Settings,
) -> Result<Engine, SyncError> {
    let mut buffer = StateBuffer::from_bytes(bytes.to_vec());
    Engine::from_snapshot(Agent::new(id, name), registry, &mut buffer, settings)
}

/// Host steers its mover around a slow circle
fn pilot_command(frame: u64) -> Command {
    let heading = Fixed::from_ratio((frame % 126) as i64, 20);
    Command::new(FixedVec2::from_angle(heading), 0)
}

/// Guest boosts its orbiter every 90 frames and nudges the radius
fn satellite_command(frame: u64) -> Command {
    let buttons = if frame % 90 == 45 { Command::BOOST } else { 0 };
    let radial = if frame % 200 < 100 {
        Fixed::HALF
    } else {
        -Fixed::HALF
    };
    Command::new(FixedVec2::new(Fixed::ZERO, radial), buttons)
}
