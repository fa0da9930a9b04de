//! Pure mapping from scoreboard state to the text and style flags a view
//! shows.
//!
//! Rendering is side-effect free and total: the same state always produces
//! the same [`BoardView`], and a snapshot with a short roster renders
//! placeholders rather than failing.

use crate::session::Role;
use crate::state::board::{ScoreboardState, Side, Team};

/// Foul count at or above which the penalty badge lights up. Display rule
/// only; no bonus logic hangs off it.
pub const FOUL_BADGE_THRESHOLD: u32 = 5;

/// Label used when the roster is shorter than the pairing expects.
const PLACEHOLDER_LABEL: &str = "-";

/// Which way the possession indicator points on odd quarters; it alternates
/// every quarter from there. Purely presentational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PossessionPattern {
    /// Home side holds the arrow in the first quarter.
    #[default]
    HomeFirst,
    /// Away side holds the arrow in the first quarter.
    AwayFirst,
}

/// Rendered line for one team slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamLine {
    /// Display name.
    pub label: String,
    /// Display color, passed through untouched.
    pub color: String,
    /// Current score.
    pub score: u32,
}

impl From<&Team> for TeamLine {
    fn from(team: &Team) -> Self {
        Self {
            label: team.label.clone(),
            color: team.color.clone(),
            score: team.score,
        }
    }
}

/// Everything a view needs to paint one frame of the scoreboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    /// Quarter label: `Q1`..`Q4`, or `OT`.
    pub quarter: String,
    /// Game clock as zero-padded `minutes:seconds`.
    pub clock: String,
    /// Shot clock in plain seconds.
    pub shot: String,
    /// Current pairing's home slot.
    pub home: TeamLine,
    /// Current pairing's away slot.
    pub away: TeamLine,
    /// Whether the home penalty badge is lit.
    pub home_foul_badge: bool,
    /// Whether the away penalty badge is lit.
    pub away_foul_badge: bool,
    /// Exact foul counts, shown on the control surface only.
    pub foul_counts: Option<(u32, u32)>,
    /// Whether the possession indicator points at the home side.
    pub possession_home: bool,
    /// Teams sitting out the current pairing; control surface only.
    pub bench: Vec<TeamLine>,
    /// Compact one-line summary used by the preview surface.
    pub headline: String,
}

/// Render `state` for a view `role`.
pub fn render(state: &ScoreboardState, role: Role, pattern: PossessionPattern) -> BoardView {
    let (home_index, away_index) = state.current_pairing();
    let home = team_line(state, home_index);
    let away = team_line(state, away_index);
    let quarter = quarter_label(state.quarter);
    let clock = format_clock(state.period_seconds);
    let shot = state.shot_seconds.to_string();

    let control = matches!(role, Role::Control);
    let bench = if control {
        state
            .teams
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != home_index && *index != away_index)
            .map(|(_, team)| TeamLine::from(team))
            .collect()
    } else {
        Vec::new()
    };

    let headline = format!(
        "{} {} - {} {} | {} {}",
        home.label, home.score, away.score, away.label, quarter, clock
    );

    BoardView {
        quarter,
        clock,
        shot,
        home_foul_badge: state.home_fouls >= FOUL_BADGE_THRESHOLD,
        away_foul_badge: state.away_fouls >= FOUL_BADGE_THRESHOLD,
        foul_counts: control.then_some((state.home_fouls, state.away_fouls)),
        possession_home: possession_side(state.quarter, pattern) == Side::Home,
        home,
        away,
        bench,
        headline,
    }
}

/// Format a second count as zero-padded `minutes:seconds`.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn quarter_label(quarter: u32) -> String {
    if quarter >= crate::state::board::OVERTIME_QUARTER {
        "OT".to_string()
    } else {
        format!("Q{quarter}")
    }
}

fn possession_side(quarter: u32, pattern: PossessionPattern) -> Side {
    let first = match pattern {
        PossessionPattern::HomeFirst => Side::Home,
        PossessionPattern::AwayFirst => Side::Away,
    };
    let other = match first {
        Side::Home => Side::Away,
        Side::Away => Side::Home,
    };
    if quarter % 2 == 1 { first } else { other }
}

fn team_line(state: &ScoreboardState, index: usize) -> TeamLine {
    state
        .teams
        .get(index)
        .map(TeamLine::from)
        .unwrap_or(TeamLine {
            label: PLACEHOLDER_LABEL.to_string(),
            color: String::new(),
            score: 0,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::board::{ScoreDelta, Team};

    fn sample_state() -> ScoreboardState {
        ScoreboardState::synthesized(
            vec![
                Team::new(1, "Lions", "#d32f2f"),
                Team::new(2, "Hawks", "#1976d2"),
                Team::new(3, "Bears", "#388e3c"),
            ],
            600,
            24,
        )
    }

    #[test]
    fn clock_text_is_zero_padded() {
        assert_eq!(format_clock(600), "10:00");
        assert_eq!(format_clock(595), "9:55");
        assert_eq!(format_clock(59), "0:59");
        assert_eq!(format_clock(0), "0:00");
    }

    #[test]
    fn render_is_a_pure_function_of_state() {
        let state = sample_state();
        let first = render(&state, Role::Display, PossessionPattern::HomeFirst);
        let second = render(&state, Role::Display, PossessionPattern::HomeFirst);
        assert_eq!(first, second);
    }

    #[test]
    fn five_ticks_in_renders_nine_fifty_five() {
        let mut state = sample_state();
        state.period_seconds = 595;
        state.shot_seconds = 19;
        let view = render(&state, Role::Display, PossessionPattern::HomeFirst);
        assert_eq!(view.clock, "9:55");
        assert_eq!(view.shot, "19");
    }

    #[test]
    fn foul_badge_lights_at_threshold() {
        let mut state = sample_state();
        state.home_fouls = 4;
        state.away_fouls = 5;
        let view = render(&state, Role::Display, PossessionPattern::HomeFirst);
        assert!(!view.home_foul_badge);
        assert!(view.away_foul_badge);
    }

    #[test]
    fn control_sees_counts_and_bench() {
        let state = sample_state();
        let control = render(&state, Role::Control, PossessionPattern::HomeFirst);
        assert_eq!(control.foul_counts, Some((0, 0)));
        assert_eq!(control.bench.len(), 1);
        assert_eq!(control.bench[0].label, "Bears");

        let display = render(&state, Role::Display, PossessionPattern::HomeFirst);
        assert_eq!(display.foul_counts, None);
        assert!(display.bench.is_empty());
    }

    #[test]
    fn rotated_matchup_renders_the_new_pairing() {
        let mut state = sample_state();
        state.advance_matchup();
        state.apply_score(crate::state::board::Side::Home, ScoreDelta::PlusTwo);
        let view = render(&state, Role::Preview, PossessionPattern::HomeFirst);
        assert_eq!(view.home.label, "Hawks");
        assert_eq!(view.away.label, "Bears");
        assert_eq!(view.headline, "Hawks 2 - 0 Bears | Q1 10:00");
    }

    #[test]
    fn possession_alternates_each_quarter() {
        let mut state = sample_state();
        let q1 = render(&state, Role::Display, PossessionPattern::HomeFirst);
        assert!(q1.possession_home);
        state.quarter = 2;
        let q2 = render(&state, Role::Display, PossessionPattern::HomeFirst);
        assert!(!q2.possession_home);
        let flipped = render(&state, Role::Display, PossessionPattern::AwayFirst);
        assert!(flipped.possession_home);
    }

    #[test]
    fn overtime_quarter_renders_ot() {
        let mut state = sample_state();
        state.quarter = 5;
        let view = render(&state, Role::Display, PossessionPattern::HomeFirst);
        assert_eq!(view.quarter, "OT");
    }

    #[test]
    fn short_roster_renders_placeholders() {
        let state = ScoreboardState::default();
        let view = render(&state, Role::Display, PossessionPattern::HomeFirst);
        assert_eq!(view.home.label, "-");
        assert_eq!(view.away.score, 0);
    }
}
