//! The per-view scoreboard session: local state ownership, operator actions,
//! clock ticking, and convergence with the shared channel.
//!
//! One session exists per connected view instance. The synchronous core in
//! this module is transport-free — it consumes inbound [`ServerFrame`]s and
//! operator [`ControlAction`]s and hands back the envelopes to publish — so
//! every behavior is testable without a socket. [`runner`] wires the core to
//! a live WebSocket and the two one-second tickers.

pub mod runner;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::audio::{AudioCue, Cue};
use crate::dto::ws::{ActionEnvelope, ClientCommand, EnvelopeAction, ServerFrame};
use crate::render::{self, BoardView, PossessionPattern};
use crate::state::board::{
    DEFAULT_OVERTIME_SECONDS, DEFAULT_PERIOD_SECONDS, DEFAULT_SHOT_SECONDS, ScoreDelta,
    ScoreboardState, Side, Team, TickOutcome,
};

/// Shot clock reload after an offensive rebound, in seconds.
pub const SHOT_CLOCK_SHORT_SECONDS: u32 = 14;

/// The three client personas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Operator input surface; the only role that mutates and ticks.
    Control,
    /// Public read-only big-screen view.
    Display,
    /// Compact read-only preview.
    Preview,
}

impl Role {
    /// Whether this role authors state.
    pub fn is_control(self) -> bool {
        matches!(self, Role::Control)
    }
}

/// Foul-count adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoulOp {
    /// Increment by one.
    Add,
    /// Decrement by one, floored at zero.
    Remove,
    /// Reset to zero.
    Clear,
}

/// Discrete operator actions a control session applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlAction {
    /// Start/stop the game clock; the shot clock follows the new value.
    ToggleClock,
    /// Stop the game clock and reload it with the session default.
    ResetClock,
    /// Nudge the game clock by a signed number of seconds (±60 in the UI).
    NudgeClock {
        /// Signed adjustment in seconds.
        seconds: i32,
    },
    /// Start/stop the shot clock alone.
    ToggleShotClock,
    /// Reload the shot clock with the full value (24 by convention).
    ResetShotClockFull,
    /// Reload the shot clock with the short value (14 by convention).
    ResetShotClockShort,
    /// Next quarter; past the fourth this enters overtime.
    AdvanceQuarter,
    /// Previous quarter, floored at 1.
    RetreatQuarter,
    /// Rotate to the next pairing.
    AdvanceMatchup,
    /// Rotate to the previous pairing, floored at 0.
    RetreatMatchup,
    /// Apply a fixed score delta to one side of the current pairing.
    Score {
        /// Which slot of the pairing.
        side: Side,
        /// Fixed delta.
        delta: ScoreDelta,
    },
    /// Adjust a side's foul count.
    Foul {
        /// Which slot of the pairing.
        side: Side,
        /// Adjustment to apply.
        op: FoulOp,
    },
    /// Flip the session-local sound flag. Never published.
    ToggleSound,
    /// Manual buzzer. Never published.
    Buzzer,
    /// Replace everything with a fresh default, preserving the roster.
    NewGame,
}

/// Collaborator inputs a session starts from.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Key of the match topic this session subscribes to.
    pub match_key: String,
    /// Teams competing in the match, in rotation order.
    pub roster: Vec<Team>,
    /// Game clock for synthesized states, in seconds.
    pub period_seconds: u32,
    /// Shot clock for synthesized states and full resets, in seconds.
    pub shot_seconds: u32,
    /// Shot clock for short resets, in seconds.
    pub shot_seconds_short: u32,
    /// Game clock granted when entering overtime, in seconds.
    pub overtime_seconds: u32,
    /// Initial value of the session-local sound flag.
    pub sound_enabled: bool,
    /// Possession-switch pattern for the possession indicator.
    pub possession: PossessionPattern,
}

impl SessionSettings {
    /// Settings for a persisted match, with the conventional clock values.
    pub fn for_match(match_key: impl Into<String>, roster: Vec<Team>) -> Self {
        Self {
            match_key: match_key.into(),
            roster,
            period_seconds: DEFAULT_PERIOD_SECONDS,
            shot_seconds: DEFAULT_SHOT_SECONDS,
            shot_seconds_short: SHOT_CLOCK_SHORT_SECONDS,
            overtime_seconds: DEFAULT_OVERTIME_SECONDS,
            sound_enabled: true,
            possession: PossessionPattern::default(),
        }
    }

    /// Settings for an ephemeral board not tied to a persisted match; mints
    /// a key in the standalone namespace.
    pub fn standalone(roster: Vec<Team>) -> Self {
        let key = format!("standalone:{}", Uuid::new_v4().simple());
        Self::for_match(key, roster)
    }
}

/// One connected view instance.
///
/// Owns the authoritative in-memory state for its tab, applies local control
/// actions, and replaces its state wholesale whenever a frame arrives — the
/// last full state received always wins entirely, including fields this
/// session did not intend to change.
pub struct ScoreboardSession {
    role: Role,
    settings: SessionSettings,
    state: Option<ScoreboardState>,
    sound_enabled: bool,
    cue: AudioCue,
    view: Option<BoardView>,
}

impl ScoreboardSession {
    /// Build a session from its collaborator inputs.
    pub fn new(settings: SessionSettings, role: Role) -> Self {
        Self {
            role,
            sound_enabled: settings.sound_enabled,
            settings,
            state: None,
            cue: AudioCue,
            view: None,
        }
    }

    /// This session's role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The match key this session synchronizes on.
    pub fn match_key(&self) -> &str {
        &self.settings.match_key
    }

    /// Current local state, if a snapshot has arrived or been synthesized.
    pub fn state(&self) -> Option<&ScoreboardState> {
        self.state.as_ref()
    }

    /// Most recent render output.
    pub fn view(&self) -> Option<&BoardView> {
        self.view.as_ref()
    }

    /// Current value of the session-local sound flag.
    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    /// The subscribe command to send on (re)connection.
    pub fn subscribe_command(&self) -> ClientCommand {
        ClientCommand::Subscribe {
            topic: self.settings.match_key.clone(),
        }
    }

    /// Whether the game-clock ticker should be armed right now.
    pub fn wants_period_tick(&self) -> bool {
        self.role.is_control() && self.state.as_ref().is_some_and(|state| state.running)
    }

    /// Whether the shot-clock ticker should be armed right now.
    pub fn wants_shot_tick(&self) -> bool {
        self.role.is_control() && self.state.as_ref().is_some_and(|state| state.shot_running)
    }

    /// Consume an inbound frame, returning an envelope to publish when the
    /// frame obligates this session to author state.
    ///
    /// A `state` frame replaces local state wholesale and re-renders; ticker
    /// run flags follow the arrived state implicitly because the tickers are
    /// derived from it, so the most recent toggle anywhere wins everywhere. A
    /// snapshot without a roster means "no real state yet": the session
    /// synthesizes its own default, and a control session immediately
    /// publishes it so already-connected displays converge without waiting.
    pub fn handle_frame(&mut self, frame: ServerFrame) -> Option<ActionEnvelope> {
        match frame {
            ServerFrame::Welcome | ServerFrame::Ping { .. } | ServerFrame::Unknown => None,
            ServerFrame::ConfirmSubscription { topic } => {
                debug!(%topic, "subscription confirmed");
                None
            }
            ServerFrame::State { topic, payload } => {
                if topic != self.settings.match_key {
                    warn!(%topic, "dropping frame for a topic this session did not subscribe");
                    return None;
                }
                if payload.has_roster() {
                    self.state = Some(payload);
                    self.rerender();
                    None
                } else {
                    self.state = Some(self.default_state());
                    self.rerender();
                    if self.role.is_control() {
                        self.envelope(EnvelopeAction::Update)
                    } else {
                        None
                    }
                }
            }
        }
    }

    /// Apply an operator action: mutate local state, re-render, and return
    /// the envelope to publish. Non-control roles never mutate anything.
    pub fn apply(&mut self, action: ControlAction) -> Option<ActionEnvelope> {
        if !self.role.is_control() {
            warn!(role = ?self.role, "ignoring control action from a non-control session");
            return None;
        }

        match action {
            ControlAction::ToggleSound => {
                self.sound_enabled = !self.sound_enabled;
                return None;
            }
            ControlAction::Buzzer => {
                self.cue.play(Cue::Manual, self.sound_enabled);
                return None;
            }
            _ => {}
        }

        let Some(state) = self.state.as_mut() else {
            warn!("ignoring control action before the first snapshot");
            return None;
        };

        let mut flavor = EnvelopeAction::Update;
        match action {
            ControlAction::ToggleClock => {
                state.toggle_clock();
                state.shot_running = state.running;
            }
            ControlAction::ResetClock => state.reset_clock(self.settings.period_seconds),
            ControlAction::NudgeClock { seconds } => state.nudge_clock(seconds),
            ControlAction::ToggleShotClock => state.toggle_shot_clock(),
            ControlAction::ResetShotClockFull => {
                state.reset_shot_clock(self.settings.shot_seconds)
            }
            ControlAction::ResetShotClockShort => {
                state.reset_shot_clock(self.settings.shot_seconds_short)
            }
            ControlAction::AdvanceQuarter => {
                state.advance_quarter(self.settings.overtime_seconds)
            }
            ControlAction::RetreatQuarter => state.retreat_quarter(),
            ControlAction::AdvanceMatchup => state.advance_matchup(),
            ControlAction::RetreatMatchup => state.retreat_matchup(),
            ControlAction::Score { side, delta } => state.apply_score(side, delta),
            ControlAction::Foul { side, op } => match op {
                FoulOp::Add => state.add_foul(side),
                FoulOp::Remove => state.remove_foul(side),
                FoulOp::Clear => state.clear_fouls(side),
            },
            ControlAction::NewGame => {
                state.new_game(self.settings.period_seconds, self.settings.shot_seconds);
                flavor = EnvelopeAction::Reset;
            }
            ControlAction::ToggleSound | ControlAction::Buzzer => unreachable!(),
        }

        self.rerender();
        self.envelope(flavor)
    }

    /// Advance the game clock by one tick. Fires the horn when the clock
    /// expires; publishes after every effective tick.
    pub fn tick_period(&mut self) -> Option<ActionEnvelope> {
        if !self.role.is_control() {
            return None;
        }
        let outcome = self.state.as_mut()?.tick_period();
        match outcome {
            TickOutcome::Idle => None,
            TickOutcome::Ticked => {
                self.rerender();
                self.envelope(EnvelopeAction::Update)
            }
            TickOutcome::Expired => {
                self.cue.play(Cue::PeriodHorn, self.sound_enabled);
                self.rerender();
                self.envelope(EnvelopeAction::Update)
            }
        }
    }

    /// Advance the shot clock by one tick, independently of the game clock.
    pub fn tick_shot(&mut self) -> Option<ActionEnvelope> {
        if !self.role.is_control() {
            return None;
        }
        let outcome = self.state.as_mut()?.tick_shot();
        match outcome {
            TickOutcome::Idle => None,
            TickOutcome::Ticked => {
                self.rerender();
                self.envelope(EnvelopeAction::Update)
            }
            TickOutcome::Expired => {
                self.cue.play(Cue::ShotHorn, self.sound_enabled);
                self.rerender();
                self.envelope(EnvelopeAction::Update)
            }
        }
    }

    /// React to transport loss: suspend both tickers locally and keep the
    /// last known values on screen until re-subscription delivers a fresh
    /// snapshot.
    pub fn on_disconnect(&mut self) {
        if let Some(state) = self.state.as_mut() {
            state.running = false;
            state.shot_running = false;
        }
        self.rerender();
    }

    fn default_state(&self) -> ScoreboardState {
        ScoreboardState::synthesized(
            self.settings.roster.clone(),
            self.settings.period_seconds,
            self.settings.shot_seconds,
        )
    }

    fn rerender(&mut self) {
        self.view = self
            .state
            .as_ref()
            .map(|state| render::render(state, self.role, self.settings.possession));
    }

    fn envelope(&self, action: EnvelopeAction) -> Option<ActionEnvelope> {
        self.state.clone().map(|payload| ActionEnvelope {
            action,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<Team> {
        vec![
            Team::new(1, "Lions", "#d32f2f"),
            Team::new(2, "Hawks", "#1976d2"),
            Team::new(3, "Bears", "#388e3c"),
        ]
    }

    fn empty_snapshot_frame(key: &str) -> ServerFrame {
        ServerFrame::State {
            topic: key.to_string(),
            payload: ScoreboardState::default(),
        }
    }

    fn control_session() -> ScoreboardSession {
        let mut session = ScoreboardSession::new(
            SessionSettings::for_match("match:1", roster()),
            Role::Control,
        );
        // First snapshot carries no roster; the session synthesizes and
        // offers its default for publication.
        let published = session.handle_frame(empty_snapshot_frame("match:1"));
        assert!(published.is_some());
        session
    }

    #[test]
    fn empty_snapshot_triggers_default_synthesis() {
        let session = control_session();
        let state = session.state().unwrap();
        assert_eq!(state.teams.len(), 3);
        assert_eq!(state.period_seconds, 600);
        assert!(session.view().is_some());
    }

    #[test]
    fn display_synthesizes_but_never_publishes() {
        let mut session = ScoreboardSession::new(
            SessionSettings::for_match("match:1", roster()),
            Role::Display,
        );
        assert!(session.handle_frame(empty_snapshot_frame("match:1")).is_none());
        assert!(session.state().is_some());
        assert!(session.apply(ControlAction::ToggleClock).is_none());
        assert!(session.tick_period().is_none());
    }

    #[test]
    fn frames_for_other_topics_are_dropped() {
        let mut session = control_session();
        let before = session.state().cloned();
        assert!(session.handle_frame(empty_snapshot_frame("match:2")).is_none());
        assert_eq!(session.state().cloned(), before);
    }

    #[test]
    fn control_frames_are_ignored_without_state_changes() {
        let mut session = control_session();
        let before = session.state().cloned();
        assert!(session.handle_frame(ServerFrame::Welcome).is_none());
        assert!(session.handle_frame(ServerFrame::Ping { message: 0 }).is_none());
        assert!(
            session
                .handle_frame(ServerFrame::ConfirmSubscription {
                    topic: "match:1".into()
                })
                .is_none()
        );
        assert_eq!(session.state().cloned(), before);
    }

    // The §8-style end-to-end flow: toggle the clock on, tick five times,
    // and a display joining mid-way renders 9:55 / 19 immediately.
    #[test]
    fn five_ticks_after_toggle_reach_expected_clocks() {
        let mut control = control_session();
        let toggled = control.apply(ControlAction::ToggleClock).unwrap();
        assert!(toggled.payload.running);
        assert!(toggled.payload.shot_running);

        let mut last = None;
        for _ in 0..5 {
            assert!(control.tick_period().is_some());
            last = control.tick_shot();
        }
        let snapshot = last.unwrap().payload;
        assert_eq!(snapshot.period_seconds, 595);
        assert_eq!(snapshot.shot_seconds, 19);

        let mut display = ScoreboardSession::new(
            SessionSettings::for_match("match:1", roster()),
            Role::Display,
        );
        assert!(
            display
                .handle_frame(ServerFrame::State {
                    topic: "match:1".into(),
                    payload: snapshot,
                })
                .is_none()
        );
        let view = display.view().unwrap();
        assert_eq!(view.clock, "9:55");
        assert_eq!(view.shot, "19");
    }

    #[test]
    fn away_score_rebinds_after_matchup_rotation() {
        let mut control = control_session();
        control.apply(ControlAction::Score {
            side: Side::Away,
            delta: ScoreDelta::PlusTwo,
        });
        assert_eq!(control.state().unwrap().teams[1].score, 2);

        control.apply(ControlAction::AdvanceMatchup);
        let published = control
            .apply(ControlAction::Score {
                side: Side::Away,
                delta: ScoreDelta::PlusTwo,
            })
            .unwrap();
        assert_eq!(published.payload.teams[2].score, 2);
        assert_eq!(published.payload.teams[1].score, 2);
    }

    #[test]
    fn sound_toggle_is_local_and_silent() {
        let mut control = control_session();
        assert!(control.sound_enabled());
        assert!(control.apply(ControlAction::ToggleSound).is_none());
        assert!(!control.sound_enabled());
        assert!(control.apply(ControlAction::Buzzer).is_none());
    }

    #[test]
    fn new_game_publishes_a_reset_envelope() {
        let mut control = control_session();
        control.apply(ControlAction::Score {
            side: Side::Home,
            delta: ScoreDelta::PlusThree,
        });
        let reset = control.apply(ControlAction::NewGame).unwrap();
        assert_eq!(reset.action, EnvelopeAction::Reset);
        assert!(reset.payload.teams.iter().all(|team| team.score == 0));
        assert_eq!(reset.payload.teams.len(), 3);
    }

    #[test]
    fn shot_clock_resets_use_both_presets() {
        let mut control = control_session();
        let short = control.apply(ControlAction::ResetShotClockShort).unwrap();
        assert_eq!(short.payload.shot_seconds, 14);
        let full = control.apply(ControlAction::ResetShotClockFull).unwrap();
        assert_eq!(full.payload.shot_seconds, 24);
    }

    #[test]
    fn disconnect_suspends_tickers_and_reconnect_adopts_broadcast() {
        let mut control = control_session();
        control.apply(ControlAction::ToggleClock);
        assert!(control.wants_period_tick());

        control.on_disconnect();
        assert!(!control.wants_period_tick());
        assert!(!control.state().unwrap().running);

        // Reconnect: the snapshot authored elsewhere says the clock runs, and
        // the local session adopts that value exactly.
        let mut remote = ScoreboardState::synthesized(roster(), 600, 24);
        remote.running = true;
        remote.shot_running = true;
        remote.period_seconds = 480;
        assert!(
            control
                .handle_frame(ServerFrame::State {
                    topic: "match:1".into(),
                    payload: remote.clone(),
                })
                .is_none()
        );
        assert_eq!(control.state().unwrap(), &remote);
        assert!(control.wants_period_tick());
        assert!(control.wants_shot_tick());
    }

    #[test]
    fn replaying_an_identical_snapshot_renders_identically() {
        let mut session = ScoreboardSession::new(
            SessionSettings::for_match("match:1", roster()),
            Role::Display,
        );
        let mut payload = ScoreboardState::synthesized(roster(), 600, 24);
        payload.teams[0].score = 7;

        session.handle_frame(ServerFrame::State {
            topic: "match:1".into(),
            payload: payload.clone(),
        });
        let first = session.view().cloned().unwrap();

        session.handle_frame(ServerFrame::State {
            topic: "match:1".into(),
            payload,
        });
        assert_eq!(session.view().unwrap(), &first);
    }

    #[test]
    fn standalone_sessions_get_namespaced_keys() {
        let settings = SessionSettings::standalone(roster());
        assert!(settings.match_key.starts_with("standalone:"));
        let other = SessionSettings::standalone(roster());
        assert_ne!(settings.match_key, other.match_key);
    }

    // Pins the preserved quirk at the session level: toggling onto a zero
    // clock publishes running=true once, then the next tick re-stops it.
    #[test]
    fn zero_clock_toggle_runs_for_exactly_one_tick() {
        let mut control = control_session();
        control.apply(ControlAction::NudgeClock { seconds: -600 });
        assert_eq!(control.state().unwrap().period_seconds, 0);

        let toggled = control.apply(ControlAction::ToggleClock).unwrap();
        assert!(toggled.payload.running);
        assert!(control.wants_period_tick());

        let expired = control.tick_period().unwrap();
        assert!(!expired.payload.running);
        assert_eq!(expired.payload.period_seconds, 0);
        assert!(!control.wants_period_tick());
    }
}
