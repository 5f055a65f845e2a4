//! Step observers
//!
//! Observers are notified synchronously on the stepping thread:
//! - once when they are attached to an engine
//! - before every step, with the input about to be applied
//! - after every step
//! - after an import or rollback replaces the state
//!
//! They only ever receive shared references, so they cannot perturb the
//! simulation.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::engine::EngineView;
use super::input::TickInput;
use super::snapshot::StateChecksum;
use crate::error::DesyncDetected;

pub trait Observer: Send {
    fn on_initialized(&mut self, _view: &EngineView<'_>) {}

    fn before_step(&mut self, _view: &EngineView<'_>, _input: &TickInput) {}

    fn after_step(&mut self, _view: &EngineView<'_>) {}

    /// The timeline was replaced; `view.frame` is the restored frame
    fn on_restored(&mut self, _view: &EngineView<'_>) {}
}

/// Logs engine lifecycle through the `log` facade
#[derive(Debug, Clone, Default)]
pub struct LogObserver {
    /// Log at info level every this many frames (0 = never)
    summary_every: u64,
}

impl LogObserver {
    pub fn new(summary_every: u64) -> Self {
        Self { summary_every }
    }
}

impl Observer for LogObserver {
    fn on_initialized(&mut self, view: &EngineView<'_>) {
        log::info!(
            "{} ({}) ready at frame {} with {} entities",
            view.agent.name(),
            view.agent.peer(),
            view.frame,
            view.game.len()
        );
    }

    fn before_step(&mut self, view: &EngineView<'_>, input: &TickInput) {
        if !input.is_empty() {
            log::trace!(
                "frame {}: {} commands, {} spawns, {} despawns",
                view.frame,
                input.commands.len(),
                input.spawns.len(),
                input.despawns.len()
            );
        }
    }

    fn after_step(&mut self, view: &EngineView<'_>) {
        log::debug!("stepped to frame {} ({} entities)", view.frame, view.game.len());
        if self.summary_every > 0 && view.frame % self.summary_every == 0 {
            log::info!(
                "{}: frame {}, {} entities, {} rng draws",
                view.agent.peer(),
                view.frame,
                view.game.len(),
                view.game.rng().draws()
            );
        }
    }

    fn on_restored(&mut self, view: &EngineView<'_>) {
        log::info!(
            "{} restored to frame {} with {} entities",
            view.agent.peer(),
            view.frame,
            view.game.len()
        );
    }
}

/// Shared, bounded map of frame to local checksum.
///
/// The detector owns one clone inside the engine; the host keeps another to
/// compare against checksums received from peers.
#[derive(Debug, Clone)]
pub struct ChecksumLog {
    window: usize,
    frames: Arc<Mutex<BTreeMap<u64, StateChecksum>>>,
}

impl ChecksumLog {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            frames: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    fn with_frames<R>(&self, f: impl FnOnce(&mut BTreeMap<u64, StateChecksum>) -> R) -> R {
        let mut frames = self.frames.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *frames)
    }

    pub fn record(&self, frame: u64, checksum: StateChecksum) {
        let window = self.window;
        self.with_frames(|frames| {
            // A rollback re-records frames; later ones belong to the old timeline
            frames.retain(|recorded, _| *recorded < frame);
            frames.insert(frame, checksum);
            while frames.len() > window {
                frames.pop_first();
            }
        });
    }

    pub fn get(&self, frame: u64) -> Option<StateChecksum> {
        self.with_frames(|frames| frames.get(&frame).copied())
    }

    pub fn latest(&self) -> Option<(u64, StateChecksum)> {
        self.with_frames(|frames| frames.last_key_value().map(|(frame, sum)| (*frame, *sum)))
    }

    pub fn len(&self) -> usize {
        self.with_frames(|frames| frames.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compare a peer's checksum for `frame` with ours.
    ///
    /// `Ok(true)` on a match, `Ok(false)` when the frame is outside the
    /// window (nothing to compare against).
    pub fn verify(&self, frame: u64, remote: StateChecksum) -> Result<bool, DesyncDetected> {
        match self.get(frame) {
            None => Ok(false),
            Some(local) if local == remote => Ok(true),
            Some(local) => Err(DesyncDetected {
                frame,
                local,
                remote,
            }),
        }
    }
}

/// Records the checksum of every state the engine reaches
#[derive(Debug, Clone)]
pub struct DesyncDetector {
    log: ChecksumLog,
}

impl DesyncDetector {
    pub fn new(log: ChecksumLog) -> Self {
        Self { log }
    }

    pub fn log(&self) -> &ChecksumLog {
        &self.log
    }

    fn record(&self, view: &EngineView<'_>) {
        match view.checksum() {
            Ok(checksum) => self.log.record(view.frame, checksum),
            Err(err) => log::warn!("frame {}: checksum skipped: {err}", view.frame),
        }
    }
}

impl Observer for DesyncDetector {
    fn on_initialized(&mut self, view: &EngineView<'_>) {
        self.record(view);
    }

    fn after_step(&mut self, view: &EngineView<'_>) {
        self.record(view);
    }

    /// Re-recording the restored frame drops every later checksum
    fn on_restored(&mut self, view: &EngineView<'_>) {
        self.record(view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum(tag: u8) -> StateChecksum {
        StateChecksum([tag; 32])
    }

    #[test]
    fn test_window_is_bounded() {
        let log = ChecksumLog::new(4);
        for frame in 0..10 {
            log.record(frame, sum(frame as u8));
        }
        assert_eq!(log.len(), 4);
        assert_eq!(log.get(5), None);
        assert_eq!(log.latest(), Some((9, sum(9))));
    }

    #[test]
    fn test_verify() {
        let log = ChecksumLog::new(8);
        log.record(3, sum(1));
        assert_eq!(log.verify(3, sum(1)), Ok(true));
        assert_eq!(log.verify(4, sum(1)), Ok(false));
        assert_eq!(
            log.verify(3, sum(2)),
            Err(DesyncDetected {
                frame: 3,
                local: sum(1),
                remote: sum(2),
            })
        );
    }

    #[test]
    fn test_rerecording_discards_newer_frames() {
        let log = ChecksumLog::new(8);
        for frame in 0..5 {
            log.record(frame, sum(0));
        }
        log.record(2, sum(7));
        assert_eq!(log.latest(), Some((2, sum(7))));
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_clones_share_frames() {
        let log = ChecksumLog::new(8);
        let detector = DesyncDetector::new(log.clone());
        detector.log().record(1, sum(1));
        assert_eq!(log.get(1), Some(sum(1)));
        assert!(!log.is_empty());
    }
}
