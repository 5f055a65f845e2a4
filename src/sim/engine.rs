//! Step driver
//!
//! The engine owns one [`Agent`]/[`Game`] pair and the frame counter:
//! - `step` is the only way simulated time moves forward
//! - `import` and `rollback_to` are the only ways it moves anywhere else,
//!   and both replace the state wholesale
//! - observers see the engine through [`EngineView`], which hands out shared
//!   references only

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::agent::Agent;
use super::entity::EntityRegistry;
use super::input::{InputLog, TickInput};
use super::observer::Observer;
use super::snapshot::{self, SnapshotHistory, StateChecksum};
use super::state::Game;
use crate::error::SyncError;
use crate::fixed;
use crate::settings::Settings;
use crate::sync::{Description, StateBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    /// Between steps; export/import allowed
    Ready,
    /// Inside `step`, observers are being notified
    Stepping,
}

impl fmt::Display for EnginePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnginePhase::Ready => write!(f, "ready"),
            EnginePhase::Stepping => write!(f, "stepping"),
        }
    }
}

/// Read-only window onto an engine, handed to observers
#[derive(Debug, Clone, Copy)]
pub struct EngineView<'a> {
    pub agent: &'a Agent,
    pub game: &'a Game,
    pub frame: u64,
    pub phase: EnginePhase,
}

impl EngineView<'_> {
    pub fn export(&self) -> Result<StateBuffer, SyncError> {
        snapshot::encode(self.frame, self.game)
    }

    pub fn checksum(&self) -> Result<StateChecksum, SyncError> {
        Ok(StateChecksum::of(self.export()?.as_bytes()))
    }
}

/// Outcome of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    /// Frame counter after the step
    pub frame: u64,
    /// Fixed-point domain faults raised by entity logic during the step
    pub domain_faults: u64,
}

pub struct Engine {
    agent: Agent,
    game: Game,
    frame: u64,
    phase: EnginePhase,
    observers: Vec<Box<dyn Observer>>,
    history: SnapshotHistory,
}

impl Engine {
    pub fn new(agent: Agent, game: Game, settings: &Settings) -> Self {
        Self::at_frame(agent, game, 0, settings)
    }

    /// Build an engine from snapshot bytes, resuming at the snapshot's frame
    pub fn from_snapshot(
        agent: Agent,
        registry: &Arc<EntityRegistry>,
        buffer: &mut StateBuffer,
        settings: &Settings,
    ) -> Result<Self, SyncError> {
        let (frame, game) = snapshot::decode(registry, buffer)?;
        Ok(Self::at_frame(agent, game, frame, settings))
    }

    fn at_frame(agent: Agent, game: Game, frame: u64, settings: &Settings) -> Self {
        let mut engine = Self {
            agent,
            game,
            frame,
            phase: EnginePhase::Ready,
            observers: Vec::new(),
            history: SnapshotHistory::new(settings.history_capacity),
        };
        log::info!(
            "engine for {} initialized at frame {} ({} entities, tick {})",
            engine.agent.peer(),
            engine.frame,
            engine.game.len(),
            engine.game.tick()
        );
        engine.record_history();
        engine
    }

    /// Attach an observer; it is notified of initialization right away
    pub fn add_observer(&mut self, mut observer: Box<dyn Observer>) {
        observer.on_initialized(&self.view());
        self.observers.push(observer);
    }

    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.add_observer(observer);
        self
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// The agent is not simulated state, so it may change between steps
    pub fn agent_mut(&mut self) -> &mut Agent {
        &mut self.agent
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn history(&self) -> &SnapshotHistory {
        &self.history
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn view(&self) -> EngineView<'_> {
        EngineView {
            agent: &self.agent,
            game: &self.game,
            frame: self.frame,
            phase: self.phase,
        }
    }

    /// Advance by exactly one tick
    pub fn step(&mut self, input: &TickInput) -> StepReport {
        self.phase = EnginePhase::Stepping;
        {
            let view = EngineView {
                agent: &self.agent,
                game: &self.game,
                frame: self.frame,
                phase: self.phase,
            };
            for observer in &mut self.observers {
                observer.before_step(&view, input);
            }
        }

        let faults_before = fixed::domain_faults();
        self.game.advance(input, self.frame);
        let domain_faults = fixed::domain_faults().wrapping_sub(faults_before);
        // Decoding refuses u64::MAX, so only 2^64 - 1 local steps could saturate this
        self.frame = self.frame.saturating_add(1);

        {
            let view = EngineView {
                agent: &self.agent,
                game: &self.game,
                frame: self.frame,
                phase: self.phase,
            };
            for observer in &mut self.observers {
                observer.after_step(&view);
            }
        }
        self.phase = EnginePhase::Ready;

        if domain_faults > 0 {
            log::warn!(
                "frame {}: {domain_faults} fixed-point domain faults",
                self.frame
            );
        }
        self.record_history();

        StepReport {
            frame: self.frame,
            domain_faults,
        }
    }

    /// Step through every input in `inputs` from the current frame onward
    pub fn replay(&mut self, inputs: &InputLog) -> Result<u64, SyncError> {
        if inputs.start_frame() > self.frame {
            return Err(SyncError::MissingSnapshot(inputs.start_frame()));
        }
        let mut stepped = 0;
        for input in inputs.since(self.frame) {
            self.step(input);
            stepped += 1;
        }
        Ok(stepped)
    }

    pub fn export(&self) -> Result<StateBuffer, SyncError> {
        snapshot::encode(self.frame, &self.game)
    }

    /// Replace the whole state and frame counter from a snapshot. On error
    /// the engine is left exactly as it was.
    pub fn import(&mut self, buffer: &mut StateBuffer) -> Result<(), SyncError> {
        let (frame, game) = snapshot::decode(self.game.registry(), buffer)?;
        log::info!(
            "{}: imported snapshot, frame {} -> {}",
            self.agent.peer(),
            self.frame,
            frame
        );
        self.game = game;
        self.frame = frame;
        self.history.clear();
        self.record_history();
        self.notify_restored();
        Ok(())
    }

    /// Restore the snapshot recorded at `frame` and forget newer ones
    pub fn rollback_to(&mut self, frame: u64) -> Result<(), SyncError> {
        let bytes = self
            .history
            .get(frame)
            .ok_or(SyncError::MissingSnapshot(frame))?
            .to_vec();
        let mut buffer = StateBuffer::from_bytes(bytes);
        let (restored, game) = snapshot::decode(self.game.registry(), &mut buffer)?;
        log::info!(
            "{}: rolled back from frame {} to {}",
            self.agent.peer(),
            self.frame,
            restored
        );
        self.game = game;
        self.frame = restored;
        self.history.truncate_after(restored);
        self.notify_restored();
        Ok(())
    }

    pub fn checksum(&self) -> Result<StateChecksum, SyncError> {
        self.view().checksum()
    }

    pub fn describe(&self) -> Description {
        let mut out = Description::new();
        out.insert("engine.frame".into(), self.frame.to_string());
        out.insert("engine.phase".into(), self.phase.to_string());
        out.insert("engine.observers".into(), self.observers.len().to_string());
        out.insert("engine.history".into(), self.history.len().to_string());
        out.extend(self.agent.describe());
        out.extend(self.game.describe());
        out
    }

    pub fn describe_json(&self) -> Value {
        Value::Object(
            self.describe()
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect(),
        )
    }

    fn notify_restored(&mut self) {
        let view = EngineView {
            agent: &self.agent,
            game: &self.game,
            frame: self.frame,
            phase: self.phase,
        };
        for observer in &mut self.observers {
            observer.on_restored(&view);
        }
    }

    fn record_history(&mut self) {
        if self.history.capacity() == 0 {
            return;
        }
        match snapshot::encode(self.frame, &self.game) {
            Ok(buffer) => self.history.push(self.frame, buffer.into_bytes()),
            Err(err) => log::warn!("frame {}: snapshot not recorded: {err}", self.frame),
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("agent", &self.agent)
            .field("frame", &self.frame)
            .field("phase", &self.phase)
            .field("entities", &self.game.len())
            .field("observers", &self.observers.len())
            .field("history", &self.history.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::sync::Mutex;

    use super::*;
    use crate::fixed::{Fixed, FixedVec2};
    use crate::sim::agent::PeerId;
    use crate::sim::body::{MOVER_TAG, Mover, Orbiter};
    use crate::sim::entity::{Entity, StepContext};
    use crate::sim::input::{Command, SpawnRequest};
    use crate::sim::observer::{ChecksumLog, DesyncDetector, LogObserver};
    use crate::sync::{EntityId, SimContext, SyncData, TypeTag};

    fn registry() -> Arc<EntityRegistry> {
        Arc::new(EntityRegistry::with_builtin())
    }

    fn settings() -> Settings {
        Settings {
            history_capacity: 64,
            ..Settings::default()
        }
    }

    /// Engine with one mover and two orbiters, agent controlling the mover
    fn sample_engine() -> Engine {
        let settings = settings();
        let mut game = Game::new(registry(), settings.seed, settings.tick_duration());
        let mover = game
            .spawn(Box::new(Mover::new(FixedVec2::ZERO, FixedVec2::X)))
            .unwrap();
        game.spawn(Box::new(Orbiter::default())).unwrap();
        game.spawn(Box::new(Orbiter::new(
            FixedVec2::from_int(-20, 5),
            Fixed::from_int(3),
            Fixed::from_ratio(-5, 2),
        )))
        .unwrap();
        let mut agent = Agent::new(PeerId(1), "host");
        agent.control(mover);
        Engine::new(agent, game, &settings)
    }

    /// Engine rebuilt from `source`'s exported bytes
    fn clone_engine(source: &Engine, peer: u32) -> Engine {
        let mut buffer = source.export().unwrap();
        Engine::from_snapshot(
            Agent::new(PeerId(peer), format!("peer {peer}")),
            source.game().registry(),
            &mut buffer,
            &settings(),
        )
        .unwrap()
    }

    /// Deterministic scripted input exercising commands, boosts, spawns
    /// and despawns
    fn scripted_input(frame: u64) -> TickInput {
        let mut input = TickInput::new();
        let axis = FixedVec2::from_angle(Fixed::from_ratio(frame as i64 % 628, 100));
        let buttons = if frame % 45 == 0 { Command::BOOST } else { 0 };
        input.commands.insert(EntityId(1), Command::new(axis, 0));
        input.commands.insert(EntityId(2), Command::new(FixedVec2::ZERO, buttons));
        if frame % 500 == 250 {
            let orbiter = Orbiter::new(FixedVec2::from_int(1, 1), Fixed::TWO, Fixed::HALF);
            input.spawns.push(SpawnRequest::of(&orbiter));
        }
        if frame % 500 == 499 {
            input.despawns.push(EntityId(4 + (frame / 500) as u32));
        }
        input
    }

    #[test]
    fn test_scenario_step_then_corrupt_type_tag() {
        let settings = settings();
        let mut game = Game::new(registry(), 1, settings.tick_duration());
        let id = game
            .spawn(Box::new(Mover::new(FixedVec2::ZERO, FixedVec2::X)))
            .unwrap();
        let mut engine = Engine::new(Agent::new(PeerId(1), "solo"), game, &settings);

        let report = engine.step(&TickInput::new());
        assert_eq!(report.frame, 1);
        let mover = engine.game().get_as::<Mover>(id).unwrap();
        assert_eq!(mover.position, FixedVec2::from_int(1, 0));

        let mut bytes = engine.export().unwrap().into_bytes();
        // header 14, tick 8, rng 24, next_id 4, count 4, id 4
        let tag_offset = 14 + 8 + 24 + 4 + 4 + 4;
        assert_eq!(bytes[tag_offset..tag_offset + 2], MOVER_TAG.0.to_le_bytes());
        bytes[tag_offset] ^= 0xFF;

        let mut fresh = Engine::new(
            Agent::new(PeerId(2), "fresh"),
            Game::new(registry(), 1, settings.tick_duration()),
            &settings,
        );
        let before = fresh.export().unwrap();
        let result = fresh.import(&mut StateBuffer::from_bytes(bytes));
        assert_eq!(
            result,
            Err(SyncError::UnknownTypeTag(TypeTag(MOVER_TAG.0 ^ 0xFF)))
        );
        assert_eq!(fresh.export().unwrap(), before);
        assert_eq!(fresh.frame(), 0);
    }

    #[test]
    fn test_corrupting_any_byte_never_panics() {
        let mut engine = sample_engine();
        for frame in 0..10 {
            engine.step(&scripted_input(frame));
        }
        let bytes = engine.export().unwrap().into_bytes();
        let spawn = TickInput::new().with_spawn(SpawnRequest::of(&Mover::default()));
        let mut target = sample_engine();
        for position in 0..bytes.len() {
            let mut corrupted = bytes.clone();
            corrupted[position] ^= 0xFF;
            if target.import(&mut StateBuffer::from_bytes(corrupted)).is_ok() {
                target.step(&scripted_input(position as u64));
                target.step(&spawn);
            }
        }
    }

    #[test]
    fn test_counters_at_their_limits_keep_stepping() {
        let mut game = Game::new(registry(), 3, Fixed::ONE);
        let id = game.spawn(Box::new(Orbiter::default())).unwrap();
        let engine = Engine::new(Agent::new(PeerId(1), "edge"), game, &settings());
        let mut bytes = engine.export().unwrap().into_bytes();
        // header 14 (frame at 6), tick 8, rng seed 8 + stream 8 + draws 8, next_id 4
        bytes[6..14].copy_from_slice(&(u64::MAX - 1).to_le_bytes());
        bytes[38..46].copy_from_slice(&u64::MAX.to_le_bytes());
        bytes[46..50].copy_from_slice(&u32::MAX.to_le_bytes());

        let mut edge = sample_engine();
        edge.import(&mut StateBuffer::from_bytes(bytes)).unwrap();
        let boost = TickInput::new()
            .with_command(id, Command::new(FixedVec2::ZERO, Command::BOOST))
            .with_spawn(SpawnRequest::of(&Mover::default()));
        for _ in 0..3 {
            edge.step(&boost);
        }
        assert_eq!(edge.frame(), u64::MAX);
        assert_eq!(edge.game().len(), 1);
        assert_eq!(edge.game().next_id(), EntityId(u32::MAX));
        assert_eq!(edge.game().rng().draws(), 2);
    }

    #[test]
    fn test_restore_drops_stale_checksums() {
        let log = ChecksumLog::new(64);
        let mut engine = sample_engine().with_observer(Box::new(DesyncDetector::new(log.clone())));
        for frame in 0..20 {
            engine.step(&scripted_input(frame));
        }
        let stale = log.get(15).unwrap();

        engine.rollback_to(10).unwrap();
        assert_eq!(log.latest(), Some((10, engine.checksum().unwrap())));
        assert_eq!(log.verify(15, stale), Ok(false));

        let mut other = sample_engine();
        for frame in 0..5 {
            other.step(&TickInput::new().with_despawn(EntityId(3)).with_command(
                EntityId(2),
                Command::new(FixedVec2::ZERO, if frame == 0 { Command::BOOST } else { 0 }),
            ));
        }
        engine.import(&mut other.export().unwrap()).unwrap();
        assert_eq!(log.latest(), Some((5, other.checksum().unwrap())));
        assert_eq!(log.verify(5, other.checksum().unwrap()), Ok(true));
        assert_eq!(log.len(), 6);
    }

    #[test]
    fn test_import_restores_frame_counter() {
        let mut engine = sample_engine();
        for frame in 0..25 {
            engine.step(&scripted_input(frame));
        }
        let mut buffer = engine.export().unwrap();
        let mut other = sample_engine();
        other.import(&mut buffer).unwrap();
        assert_eq!(other.frame(), 25);
        assert_eq!(other.checksum().unwrap(), engine.checksum().unwrap());
    }

    #[test]
    fn test_determinism_over_ten_thousand_steps() {
        let origin = sample_engine();
        let mut a = clone_engine(&origin, 1);
        let mut b = clone_engine(&origin, 2);

        for frame in 0..10_000 {
            let input = scripted_input(frame);
            a.step(&input);
            b.step(&input);
            assert_eq!(
                a.export().unwrap().as_bytes(),
                b.export().unwrap().as_bytes(),
                "diverged at frame {}",
                frame + 1
            );
        }
        assert_eq!(a.frame(), 10_000);
        assert!(a.game().rng().draws() > 0);
    }

    #[test]
    fn test_engines_on_separate_threads_agree() {
        let origin = sample_engine();
        let bytes = origin.export().unwrap().into_bytes();

        let handles: Vec<_> = (0..2u32)
            .map(|peer| {
                let bytes = bytes.clone();
                std::thread::spawn(move || {
                    let mut engine = Engine::from_snapshot(
                        Agent::new(PeerId(peer), "worker"),
                        &registry(),
                        &mut StateBuffer::from_bytes(bytes),
                        &settings(),
                    )
                    .unwrap();
                    for frame in 0..2_000 {
                        engine.step(&scripted_input(frame));
                    }
                    engine.checksum().unwrap()
                })
            })
            .collect();

        let sums: Vec<StateChecksum> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();
        assert_eq!(sums[0], sums[1]);
    }

    /// Records notification order into a shared list
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl Observer for Recorder {
        fn on_initialized(&mut self, view: &EngineView<'_>) {
            self.0.lock().unwrap().push(format!("init@{}", view.frame));
        }

        fn before_step(&mut self, view: &EngineView<'_>, input: &TickInput) {
            self.0
                .lock()
                .unwrap()
                .push(format!("before@{}:{}:{}", view.frame, view.phase, input.commands.len()));
        }

        fn after_step(&mut self, view: &EngineView<'_>) {
            self.0.lock().unwrap().push(format!("after@{}", view.frame));
        }

        fn on_restored(&mut self, view: &EngineView<'_>) {
            self.0.lock().unwrap().push(format!("restored@{}", view.frame));
        }
    }

    #[test]
    fn test_observer_notification_order() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut engine = sample_engine();
        engine.step(&TickInput::new());
        engine.add_observer(Box::new(Recorder(events.clone())));
        engine.step(&scripted_input(1));
        engine.step(&TickInput::new());
        engine.rollback_to(2).unwrap();
        assert_eq!(engine.phase(), EnginePhase::Ready);
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                "init@1",
                "before@1:stepping:2",
                "after@2",
                "before@2:stepping:0",
                "after@3",
                "restored@2",
            ]
        );
    }

    #[test]
    fn test_observers_do_not_change_outcome() {
        let origin = sample_engine();
        let mut plain = clone_engine(&origin, 1);
        let log = ChecksumLog::new(32);
        let mut observed = clone_engine(&origin, 2)
            .with_observer(Box::new(LogObserver::new(10)))
            .with_observer(Box::new(DesyncDetector::new(log.clone())))
            .with_observer(Box::new(Recorder(Arc::new(Mutex::new(Vec::new())))));
        assert_eq!(observed.observer_count(), 3);

        for frame in 0..300 {
            let input = scripted_input(frame);
            plain.step(&input);
            observed.step(&input);
        }
        assert_eq!(plain.export().unwrap(), observed.export().unwrap());
        assert_eq!(log.latest(), Some((300, plain.checksum().unwrap())));
    }

    #[test]
    fn test_desync_is_reported_not_corrected() {
        let origin = sample_engine();
        let log = ChecksumLog::new(16);
        let mut local = clone_engine(&origin, 1).with_observer(Box::new(DesyncDetector::new(log.clone())));
        let mut remote = clone_engine(&origin, 2);

        local.step(&scripted_input(0));
        remote.step(&scripted_input(0));
        assert_eq!(log.verify(1, remote.checksum().unwrap()), Ok(true));

        local.step(&scripted_input(1));
        remote.step(&TickInput::new());
        let err = log.verify(2, remote.checksum().unwrap()).unwrap_err();
        assert_eq!(err.frame, 2);
        assert_eq!(err.local, local.checksum().unwrap());

        // Resync is the host's call
        local.import(&mut remote.export().unwrap()).unwrap();
        assert_eq!(local.checksum().unwrap(), remote.checksum().unwrap());
    }

    #[test]
    fn test_rollback_and_replay() {
        let mut engine = sample_engine();
        let mut inputs = InputLog::new(0);
        let mut sums = Vec::new();
        for frame in 0..20 {
            let input = scripted_input(frame);
            engine.step(&input);
            inputs.push(input);
            sums.push(engine.checksum().unwrap());
        }

        engine.rollback_to(10).unwrap();
        assert_eq!(engine.frame(), 10);
        assert_eq!(engine.checksum().unwrap(), sums[9]);
        assert_eq!(engine.history().newest(), Some(10));

        assert_eq!(engine.replay(&inputs), Ok(10));
        assert_eq!(engine.frame(), 20);
        assert_eq!(engine.checksum().unwrap(), sums[19]);
    }

    #[test]
    fn test_rollback_outside_history() {
        let mut engine = sample_engine();
        assert_eq!(engine.rollback_to(5), Err(SyncError::MissingSnapshot(5)));

        let mut short = Engine::new(
            Agent::new(PeerId(1), "short"),
            Game::new(registry(), 0, Fixed::ONE),
            &Settings {
                history_capacity: 0,
                ..Settings::default()
            },
        );
        short.step(&TickInput::new());
        assert_eq!(short.rollback_to(0), Err(SyncError::MissingSnapshot(0)));
        assert!(short.history().is_empty());
    }

    #[test]
    fn test_replay_requires_covering_log() {
        let mut engine = sample_engine();
        let inputs = InputLog::new(5);
        assert_eq!(engine.replay(&inputs), Err(SyncError::MissingSnapshot(5)));
    }

    const FAULTY_TAG: TypeTag = TypeTag(0x0F01);

    /// Divides by zero every step
    #[derive(Debug, Default)]
    struct Faulty {
        value: Fixed,
    }

    impl SyncData for Faulty {
        fn initialize(&mut self, _context: &SimContext) {}

        fn export(&self, buffer: &mut StateBuffer) {
            buffer.write_fixed(self.value);
        }

        fn import(&mut self, buffer: &mut StateBuffer) -> Result<(), SyncError> {
            self.value = buffer.read_fixed()?;
            Ok(())
        }
    }

    impl Entity for Faulty {
        fn type_tag(&self) -> TypeTag {
            FAULTY_TAG
        }

        fn step(&mut self, _cx: &mut StepContext<'_>) {
            self.value = Fixed::ONE / Fixed::ZERO;
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_domain_faults_are_reported() {
        let mut registry = EntityRegistry::with_builtin();
        registry
            .register(FAULTY_TAG, "faulty", || -> Box<dyn Entity> {
                Box::new(Faulty::default())
            })
            .unwrap();
        let mut game = Game::new(Arc::new(registry), 0, Fixed::ONE);
        game.spawn(Box::new(Faulty::default())).unwrap();
        game.spawn(Box::new(Mover::default())).unwrap();
        let mut engine = Engine::new(Agent::new(PeerId(1), "f"), game, &settings());

        let report = engine.step(&TickInput::new());
        assert_eq!(report.domain_faults, 1);
        assert_eq!(
            engine.game().get_as::<Faulty>(EntityId(1)).map(|f| f.value),
            Some(Fixed::MAX)
        );
    }

    #[test]
    fn test_describe() {
        let mut engine = sample_engine();
        engine.step(&TickInput::new());
        let description = engine.describe();
        assert_eq!(description["engine.frame"], "1");
        assert_eq!(description["agent.controlled"], "#1");
        assert_eq!(description["entity.1.type"], "mover");

        let json = engine.describe_json();
        assert_eq!(json["engine.frame"], "1");
        assert_eq!(json["entity.2.type"], "orbiter");
    }
}
