//! Derived match metrics: win probability, leverage and fatigue.
//!
//! Pure functions, recomputed on every tick.

use crate::domain::{ScoreState, Side};
use crate::simulation::scoring::PointImportance;

pub const MIN_WIN_PROBABILITY: f64 = 0.01;
pub const MAX_WIN_PROBABILITY: f64 = 0.99;

const SET_WEIGHT: f64 = 0.15;
const GAME_WEIGHT: f64 = 0.05;
const POINT_WEIGHT: f64 = 0.02;
const SERVE_EDGE: f64 = 0.05;

const BASE_LEVERAGE: f64 = 0.1;
const BREAK_POINT_LEVERAGE: f64 = 0.2;
const SET_POINT_LEVERAGE: f64 = 0.3;
const MATCH_POINT_LEVERAGE: f64 = 0.4;

pub const MAX_FATIGUE: f64 = 100.0;
const FATIGUE_RECOVERY: f64 = 0.5;
const FATIGUE_PER_SHOT: f64 = 0.8;

/// Player 1's chance of winning the match, clamped to [0.01, 0.99]
pub fn win_probability(score: &ScoreState) -> f64 {
    let mut prob = 0.5;
    prob += (score.sets_p1 as f64 - score.sets_p2 as f64) * SET_WEIGHT;
    prob += (score.games_p1 as f64 - score.games_p2 as f64) * GAME_WEIGHT;
    prob += (score.points_p1.index() as f64 - score.points_p2.index() as f64) * POINT_WEIGHT;
    prob += match score.serving {
        Side::One => SERVE_EDGE,
        Side::Two => -SERVE_EDGE,
    };
    prob.clamp(MIN_WIN_PROBABILITY, MAX_WIN_PROBABILITY)
}

/// How much the next point swings the match.
///
/// Each importance flag adds independently; the sum is scaled by
/// `0.5 + 0.5 * uncertainty` where uncertainty is 1 at 50/50 and 0 at a blowout.
pub fn leverage_index(win_probability: f64, importance: PointImportance) -> f64 {
    let mut leverage = BASE_LEVERAGE;
    if importance.break_point {
        leverage += BREAK_POINT_LEVERAGE;
    }
    if importance.set_point {
        leverage += SET_POINT_LEVERAGE;
    }
    if importance.match_point {
        leverage += MATCH_POINT_LEVERAGE;
    }

    let uncertainty = (1.0 - 2.0 * (win_probability - 0.5).abs()).max(0.0);
    leverage * (0.5 + 0.5 * uncertainty)
}

/// Next fatigue value after one tick with a rally of `rally_length` shots
pub fn fatigue(current: f64, rally_length: u32) -> f64 {
    let recovered = (current - FATIGUE_RECOVERY).max(0.0);
    (recovered + rally_length as f64 * FATIGUE_PER_SHOT).min(MAX_FATIGUE)
}
