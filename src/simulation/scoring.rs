//! Point-by-point scoring state machine
//!
//! Points advance through "0", "15", "30", "40", "AD". A game goes to the side
//! that wins a point from "40" against a score below "40", or from "AD". A point
//! won against "AD" restores deuce. Sets go to the first side with six games and
//! a two-game lead; there is no tiebreak at 6-6.

use crate::domain::{Match, PointValue, ScoreState, SetScore, Side};

/// Games needed to take a set (with a two-game lead)
pub const GAMES_PER_SET: u8 = 6;

/// What a single point changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointOutcome {
    /// Point score moved, game still in progress
    Point,
    /// Opponent's advantage cancelled, back to deuce
    DeuceRestored,
    /// Winner took the game
    Game,
    /// Winner took the game and the set; carries the final games of the set
    Set { games_p1: u8, games_p2: u8 },
}

/// Advance `score` by one point won by `winner`
pub fn award_point(score: &mut ScoreState, winner: Side) -> PointOutcome {
    let own = score.points(winner);
    let other = score.points(winner.opposite());

    match (own, other) {
        (PointValue::Forty, o) if o < PointValue::Forty => win_game(score, winner),
        (PointValue::Forty, PointValue::Forty) => {
            *score.points_mut(winner) = PointValue::Advantage;
            PointOutcome::Point
        }
        (PointValue::Advantage, _) => win_game(score, winner),
        (_, PointValue::Advantage) => {
            *score.points_mut(winner.opposite()) = PointValue::Forty;
            PointOutcome::DeuceRestored
        }
        _ => {
            *score.points_mut(winner) = own.next();
            PointOutcome::Point
        }
    }
}

fn win_game(score: &mut ScoreState, winner: Side) -> PointOutcome {
    score.points_p1 = PointValue::Love;
    score.points_p2 = PointValue::Love;
    score.serving = score.serving.opposite();
    *score.games_mut(winner) += 1;

    let own = score.games(winner);
    let other = score.games(winner.opposite());
    if own >= GAMES_PER_SET && own >= other + 2 {
        let (games_p1, games_p2) = (score.games_p1, score.games_p2);
        *score.sets_mut(winner) += 1;
        score.games_p1 = 0;
        score.games_p2 = 0;
        PointOutcome::Set { games_p1, games_p2 }
    } else {
        PointOutcome::Game
    }
}

/// Would `side` win the current game by winning the next point?
pub fn is_game_point(score: &ScoreState, side: Side) -> bool {
    match (score.points(side), score.points(side.opposite())) {
        (PointValue::Advantage, _) => true,
        (PointValue::Forty, o) => o < PointValue::Forty,
        _ => false,
    }
}

/// Would `side` close the current set by winning the next point?
pub fn is_set_point(score: &ScoreState, side: Side) -> bool {
    if !is_game_point(score, side) {
        return false;
    }
    let own = score.games(side) + 1;
    let other = score.games(side.opposite());
    own >= GAMES_PER_SET && own >= other + 2
}

/// Would `side` win the match by winning the next point?
pub fn is_match_point(score: &ScoreState, side: Side, sets_to_win: u8) -> bool {
    is_set_point(score, side) && score.sets(side) + 1 >= sets_to_win
}

/// Which importance flags apply to the next point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointImportance {
    pub break_point: bool,
    pub set_point: bool,
    pub match_point: bool,
}

impl PointImportance {
    pub fn from_score(score: &ScoreState, sets_to_win: u8) -> Self {
        let either = |f: &dyn Fn(Side) -> bool| f(Side::One) || f(Side::Two);
        Self {
            break_point: is_game_point(score, score.receiver()),
            set_point: either(&|s| is_set_point(score, s)),
            match_point: either(&|s| is_match_point(score, s, sets_to_win)),
        }
    }
}

/// Apply a point to a live match, recording set history and closing the match
/// once a side reaches `sets_to_win`. Finished matches are left untouched.
pub fn play_point(m: &mut Match, winner: Side, sets_to_win: u8) -> PointOutcome {
    if m.is_finished() {
        return PointOutcome::Point;
    }

    let was_break_point = is_game_point(&m.score, m.score.receiver());
    let receiver = m.score.receiver();
    let outcome = award_point(&mut m.score, winner);

    if was_break_point && winner == receiver {
        m.stats.record_break_point(receiver);
    }

    if let PointOutcome::Set { games_p1, games_p2 } = outcome {
        let set_number = m.score.sets_p1 + m.score.sets_p2;
        m.sets.push(SetScore {
            set_number,
            games_p1,
            games_p2,
        });
        if m.score.sets(winner) >= sets_to_win {
            m.finish(winner);
        }
    }

    outcome
}
