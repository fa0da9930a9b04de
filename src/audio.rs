//! Best-effort audio cues for clock expiry and the manual buzzer.

use std::io::Write;

use tracing::debug;

/// Why a cue is being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// Game clock ran out while running.
    PeriodHorn,
    /// Shot clock ran out while running.
    ShotHorn,
    /// Operator pressed the buzzer.
    Manual,
}

/// Tone generator for session-local sound cues.
///
/// Everything here is best-effort: a missing or blocked audio path is
/// swallowed and never surfaces as an error anywhere else in the system. The
/// headless implementation rings the terminal bell, which degrades to a
/// no-op when there is no terminal to ring.
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioCue;

impl AudioCue {
    /// Attempt to play `cue`. Does nothing when `enabled` is false; failures
    /// to emit are ignored.
    pub fn play(&self, cue: Cue, enabled: bool) {
        if !enabled {
            return;
        }
        debug!(?cue, "audio cue");
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(b"\x07");
        let _ = out.flush();
    }
}
