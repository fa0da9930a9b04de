//! The shared scoreboard entity and the operations a control session applies
//! to it.
//!
//! `ScoreboardState` is the single mutable unit transmitted over the channel
//! and persisted in the snapshot store. Receivers replace it wholesale; no
//! field-level merging happens anywhere, so every mutation here produces the
//! next full truth for the match.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Number of regular quarters before overtime.
pub const REGULAR_QUARTERS: u32 = 4;
/// Quarter number used to represent overtime.
pub const OVERTIME_QUARTER: u32 = 5;
/// Fresh game clock for a default state, in seconds.
pub const DEFAULT_PERIOD_SECONDS: u32 = 600;
/// Fresh shot clock for a default state, in seconds.
pub const DEFAULT_SHOT_SECONDS: u32 = 24;
/// Game clock granted when entering overtime, in seconds.
pub const DEFAULT_OVERTIME_SECONDS: u32 = 300;

/// Pairing rotation for a three-team match. `matchup_index` wraps over this
/// table at read time; the stored index itself is never wrapped.
const THREE_TEAM_PAIRINGS: [(usize, usize); 3] = [(0, 1), (1, 2), (2, 0)];

/// One competing team. Position in [`ScoreboardState::teams`] is the team's
/// identity for matchup selection; `id` is only carried through for the
/// surrounding application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Team {
    /// Identifier assigned by the surrounding application.
    pub id: i64,
    /// Display name.
    pub label: String,
    /// Display color (any CSS-compatible string, passed through untouched).
    pub color: String,
    /// Current score.
    pub score: u32,
}

impl Team {
    /// A roster entry with a zeroed score.
    pub fn new(id: i64, label: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            color: color.into(),
            score: 0,
        }
    }
}

/// Which slot of the current pairing an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// First element of the active pairing.
    Home,
    /// Second element of the active pairing.
    Away,
}

/// Fixed score adjustments available to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreDelta {
    /// Free throw.
    PlusOne,
    /// Field goal.
    PlusTwo,
    /// Three-pointer.
    PlusThree,
    /// Correction; floors at zero.
    MinusOne,
}

/// Result of advancing a clock by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The clock was not running; nothing changed.
    Idle,
    /// The clock decremented and is still above zero.
    Ticked,
    /// The clock reached zero on this tick and its running flag was forced
    /// off. This is the only path that triggers the horn.
    Expired,
}

/// The full shared state of one match's scoreboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScoreboardState {
    /// Current period, 1-based. [`OVERTIME_QUARTER`] denotes overtime.
    pub quarter: u32,
    /// Game clock remaining, counts down to zero.
    pub period_seconds: u32,
    /// Shot clock remaining, independent of the game clock.
    pub shot_seconds: u32,
    /// Whether the game clock is decrementing.
    pub running: bool,
    /// Whether the shot clock is decrementing.
    pub shot_running: bool,
    /// Selects the active pairing; stored unwrapped, wrapped modulo the
    /// pairing count when read.
    pub matchup_index: u32,
    /// Team fouls for the current pairing's home slot.
    pub home_fouls: u32,
    /// Team fouls for the current pairing's away slot.
    pub away_fouls: u32,
    /// Fixed roster for the match lifetime; never reordered.
    pub teams: Vec<Team>,
}

impl Default for ScoreboardState {
    fn default() -> Self {
        Self::synthesized(Vec::new(), DEFAULT_PERIOD_SECONDS, DEFAULT_SHOT_SECONDS)
    }
}

impl ScoreboardState {
    /// Build the default state for a roster: quarter 1, full clocks, both
    /// stopped, no fouls, first matchup, all scores zero.
    pub fn synthesized(teams: Vec<Team>, period_seconds: u32, shot_seconds: u32) -> Self {
        Self {
            quarter: 1,
            period_seconds,
            shot_seconds,
            running: false,
            shot_running: false,
            matchup_index: 0,
            home_fouls: 0,
            away_fouls: 0,
            teams: teams
                .into_iter()
                .map(|team| Team { score: 0, ..team })
                .collect(),
        }
    }

    /// Whether this snapshot carries a real roster. A snapshot without teams
    /// is "no real state yet" and receivers synthesize their own default.
    pub fn has_roster(&self) -> bool {
        !self.teams.is_empty()
    }

    /// Number of distinct pairings in the rotation.
    pub fn pairing_count(&self) -> u32 {
        if self.teams.len() >= 3 { 3 } else { 1 }
    }

    /// The team indices occupying the home/away slots for the current
    /// `matchup_index`. Two-team matches always play (0, 1); three-team
    /// matches rotate (0,1), (1,2), (2,0).
    pub fn current_pairing(&self) -> (usize, usize) {
        if self.teams.len() >= 3 {
            THREE_TEAM_PAIRINGS[(self.matchup_index % 3) as usize]
        } else {
            (0, 1)
        }
    }

    /// Team index currently occupying `side`.
    pub fn side_index(&self, side: Side) -> usize {
        let (home, away) = self.current_pairing();
        match side {
            Side::Home => home,
            Side::Away => away,
        }
    }

    /// The team currently occupying `side`, if the roster is large enough.
    pub fn team_on(&self, side: Side) -> Option<&Team> {
        self.teams.get(self.side_index(side))
    }

    /// Toggle the game clock. Toggling a zero-value clock still flips the
    /// flag on; the next tick immediately re-stops it.
    pub fn toggle_clock(&mut self) {
        self.running = !self.running;
    }

    /// Stop the game clock and reload it with `seconds`.
    pub fn reset_clock(&mut self, seconds: u32) {
        self.period_seconds = seconds;
        self.running = false;
    }

    /// Nudge the game clock by `seconds` (operator correction), floored at
    /// zero. The running flag is left alone; a clock nudged to zero stops on
    /// its next tick.
    pub fn nudge_clock(&mut self, seconds: i32) {
        self.period_seconds = if seconds.is_negative() {
            self.period_seconds.saturating_sub(seconds.unsigned_abs())
        } else {
            self.period_seconds.saturating_add(seconds as u32)
        };
    }

    /// Toggle the shot clock, with the same zero-value behavior as
    /// [`Self::toggle_clock`].
    pub fn toggle_shot_clock(&mut self) {
        self.shot_running = !self.shot_running;
    }

    /// Reload the shot clock with `seconds` (24 full / 14 short by
    /// convention) without touching its running flag, so a reset mid-play
    /// keeps counting from the new value.
    pub fn reset_shot_clock(&mut self, seconds: u32) {
        self.shot_seconds = seconds;
    }

    /// Advance the quarter. Advancing past the last regular quarter enters
    /// overtime with a fresh, stopped clock; overtime is the ceiling.
    pub fn advance_quarter(&mut self, overtime_seconds: u32) {
        if self.quarter >= OVERTIME_QUARTER {
            return;
        }
        self.quarter += 1;
        if self.quarter == OVERTIME_QUARTER {
            self.period_seconds = overtime_seconds;
            self.running = false;
        }
    }

    /// Retreat the quarter, floored at 1. The clock is left untouched.
    pub fn retreat_quarter(&mut self) {
        if self.quarter > 1 {
            self.quarter -= 1;
        }
    }

    /// Rotate to the next pairing. The stored index grows without bound and
    /// wraps only at read time.
    pub fn advance_matchup(&mut self) {
        self.matchup_index += 1;
    }

    /// Rotate back to the previous pairing, floored at 0.
    pub fn retreat_matchup(&mut self) {
        self.matchup_index = self.matchup_index.saturating_sub(1);
    }

    /// Apply a fixed score delta to the team currently on `side`. Other
    /// teams are untouched; corrections floor at zero.
    pub fn apply_score(&mut self, side: Side, delta: ScoreDelta) {
        let index = self.side_index(side);
        if let Some(team) = self.teams.get_mut(index) {
            team.score = match delta {
                ScoreDelta::PlusOne => team.score.saturating_add(1),
                ScoreDelta::PlusTwo => team.score.saturating_add(2),
                ScoreDelta::PlusThree => team.score.saturating_add(3),
                ScoreDelta::MinusOne => team.score.saturating_sub(1),
            };
        }
    }

    /// Increment the foul count for `side`.
    pub fn add_foul(&mut self, side: Side) {
        match side {
            Side::Home => self.home_fouls += 1,
            Side::Away => self.away_fouls += 1,
        }
    }

    /// Decrement the foul count for `side`, floored at zero.
    pub fn remove_foul(&mut self, side: Side) {
        match side {
            Side::Home => self.home_fouls = self.home_fouls.saturating_sub(1),
            Side::Away => self.away_fouls = self.away_fouls.saturating_sub(1),
        }
    }

    /// Clear the foul count for `side`.
    pub fn clear_fouls(&mut self, side: Side) {
        match side {
            Side::Home => self.home_fouls = 0,
            Side::Away => self.away_fouls = 0,
        }
    }

    /// Replace everything with a fresh default, preserving the roster
    /// (labels, colors, ids) but zeroing every score.
    pub fn new_game(&mut self, period_seconds: u32, shot_seconds: u32) {
        let roster = std::mem::take(&mut self.teams);
        *self = Self::synthesized(roster, period_seconds, shot_seconds);
    }

    /// Advance the game clock by one second if it is running.
    pub fn tick_period(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }
        self.period_seconds = self.period_seconds.saturating_sub(1);
        if self.period_seconds == 0 {
            self.running = false;
            TickOutcome::Expired
        } else {
            TickOutcome::Ticked
        }
    }

    /// Advance the shot clock by one second if it is running.
    pub fn tick_shot(&mut self) -> TickOutcome {
        if !self.shot_running {
            return TickOutcome::Idle;
        }
        self.shot_seconds = self.shot_seconds.saturating_sub(1);
        if self.shot_seconds == 0 {
            self.shot_running = false;
            TickOutcome::Expired
        } else {
            TickOutcome::Ticked
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_team_state() -> ScoreboardState {
        ScoreboardState::synthesized(
            vec![
                Team::new(10, "Lions", "#d32f2f"),
                Team::new(11, "Hawks", "#1976d2"),
                Team::new(12, "Bears", "#388e3c"),
            ],
            DEFAULT_PERIOD_SECONDS,
            DEFAULT_SHOT_SECONDS,
        )
    }

    #[test]
    fn synthesized_state_matches_defaults() {
        let state = ScoreboardState::default();
        assert_eq!(state.quarter, 1);
        assert_eq!(state.period_seconds, 600);
        assert_eq!(state.shot_seconds, 24);
        assert!(!state.running);
        assert!(!state.shot_running);
        assert_eq!(state.matchup_index, 0);
        assert_eq!(state.home_fouls, 0);
        assert_eq!(state.away_fouls, 0);
        assert!(state.teams.is_empty());
        assert!(!state.has_roster());
    }

    #[test]
    fn synthesized_zeroes_roster_scores() {
        let mut roster = vec![Team::new(1, "A", "red"), Team::new(2, "B", "blue")];
        roster[0].score = 55;
        let state = ScoreboardState::synthesized(roster, 600, 24);
        assert!(state.teams.iter().all(|team| team.score == 0));
    }

    #[test]
    fn matchup_index_wraps_every_three_pairings() {
        let mut state = three_team_state();
        let expected = [(0, 1), (1, 2), (2, 0), (0, 1)];
        for pairing in expected {
            assert_eq!(state.current_pairing(), pairing);
            state.advance_matchup();
        }
        assert_eq!(state.matchup_index, 4);
    }

    #[test]
    fn two_team_match_has_single_pairing() {
        let mut state = ScoreboardState::synthesized(
            vec![Team::new(1, "A", "red"), Team::new(2, "B", "blue")],
            600,
            24,
        );
        assert_eq!(state.current_pairing(), (0, 1));
        state.advance_matchup();
        state.advance_matchup();
        assert_eq!(state.current_pairing(), (0, 1));
    }

    #[test]
    fn matchup_retreat_floors_at_zero() {
        let mut state = three_team_state();
        state.retreat_matchup();
        assert_eq!(state.matchup_index, 0);
        state.advance_matchup();
        state.retreat_matchup();
        assert_eq!(state.matchup_index, 0);
    }

    #[test]
    fn score_delta_targets_only_current_side() {
        let mut state = three_team_state();
        state.apply_score(Side::Home, ScoreDelta::PlusThree);
        assert_eq!(state.teams[0].score, 3);
        assert_eq!(state.teams[1].score, 0);
        assert_eq!(state.teams[2].score, 0);
    }

    #[test]
    fn score_correction_floors_at_zero() {
        let mut state = three_team_state();
        state.apply_score(Side::Away, ScoreDelta::MinusOne);
        assert_eq!(state.teams[1].score, 0);
    }

    #[test]
    fn away_side_rebinds_when_matchup_rotates() {
        let mut state = three_team_state();
        state.apply_score(Side::Away, ScoreDelta::PlusTwo);
        assert_eq!(state.teams[1].score, 2);

        state.advance_matchup();
        state.apply_score(Side::Away, ScoreDelta::PlusTwo);
        assert_eq!(state.teams[2].score, 2);
        assert_eq!(state.teams[1].score, 2);
    }

    #[test]
    fn tick_stops_and_flags_false_at_zero() {
        let mut state = ScoreboardState::default();
        state.period_seconds = 2;
        state.running = true;

        assert_eq!(state.tick_period(), TickOutcome::Ticked);
        assert_eq!(state.period_seconds, 1);
        assert_eq!(state.tick_period(), TickOutcome::Expired);
        assert_eq!(state.period_seconds, 0);
        assert!(!state.running);
        assert_eq!(state.tick_period(), TickOutcome::Idle);
        assert_eq!(state.period_seconds, 0);
    }

    #[test]
    fn shot_tick_is_independent_of_game_clock() {
        let mut state = ScoreboardState::default();
        state.shot_running = true;
        assert_eq!(state.tick_shot(), TickOutcome::Ticked);
        assert_eq!(state.shot_seconds, 23);
        assert_eq!(state.period_seconds, 600);
        assert!(!state.running);
    }

    // Pins the preserved quirk: toggling a zero-value clock flips the flag
    // on, and the first tick re-stops it without going negative.
    #[test]
    fn toggling_zero_clock_runs_for_one_tick() {
        let mut state = ScoreboardState::default();
        state.period_seconds = 0;
        state.toggle_clock();
        assert!(state.running);

        assert_eq!(state.tick_period(), TickOutcome::Expired);
        assert_eq!(state.period_seconds, 0);
        assert!(!state.running);
    }

    #[test]
    fn advance_quarter_enters_overtime_with_fresh_clock() {
        let mut state = ScoreboardState::default();
        state.quarter = REGULAR_QUARTERS;
        state.period_seconds = 0;
        state.running = true;

        state.advance_quarter(DEFAULT_OVERTIME_SECONDS);
        assert_eq!(state.quarter, OVERTIME_QUARTER);
        assert_eq!(state.period_seconds, 300);
        assert!(!state.running);

        state.advance_quarter(DEFAULT_OVERTIME_SECONDS);
        assert_eq!(state.quarter, OVERTIME_QUARTER);
    }

    #[test]
    fn retreat_quarter_floors_at_one() {
        let mut state = ScoreboardState::default();
        state.retreat_quarter();
        assert_eq!(state.quarter, 1);
        state.advance_quarter(300);
        state.retreat_quarter();
        assert_eq!(state.quarter, 1);
        assert_eq!(state.period_seconds, 600);
    }

    #[test]
    fn nudge_clock_floors_at_zero() {
        let mut state = ScoreboardState::default();
        state.nudge_clock(60);
        assert_eq!(state.period_seconds, 660);
        state.nudge_clock(-60);
        state.nudge_clock(-601);
        assert_eq!(state.period_seconds, 0);
    }

    #[test]
    fn foul_counts_floor_at_zero() {
        let mut state = three_team_state();
        state.remove_foul(Side::Home);
        assert_eq!(state.home_fouls, 0);
        state.add_foul(Side::Home);
        state.add_foul(Side::Away);
        state.add_foul(Side::Away);
        assert_eq!((state.home_fouls, state.away_fouls), (1, 2));
        state.clear_fouls(Side::Away);
        assert_eq!(state.away_fouls, 0);
    }

    #[test]
    fn new_game_keeps_roster_and_zeroes_everything_else() {
        let mut state = three_team_state();
        state.apply_score(Side::Home, ScoreDelta::PlusTwo);
        state.advance_matchup();
        state.add_foul(Side::Away);
        state.quarter = 3;
        state.running = true;
        state.period_seconds = 17;

        state.new_game(600, 24);
        assert_eq!(state.quarter, 1);
        assert_eq!(state.period_seconds, 600);
        assert_eq!(state.matchup_index, 0);
        assert!(!state.running);
        assert_eq!(state.home_fouls, 0);
        assert_eq!(state.away_fouls, 0);
        assert_eq!(state.teams.len(), 3);
        assert_eq!(state.teams[0].label, "Lions");
        assert!(state.teams.iter().all(|team| team.score == 0));
    }
}
