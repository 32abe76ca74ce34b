use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::score::{ScoreState, SetScore, Side};

/// Lifecycle of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    Scheduled,
    Live,
    Finished,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "Scheduled",
            MatchStatus::Live => "Live",
            MatchStatus::Finished => "Finished",
        }
    }
}

impl TryFrom<&str> for MatchStatus {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        [MatchStatus::Scheduled, MatchStatus::Live, MatchStatus::Finished]
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| format!("unknown match status: {}", value))
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A tennis tournament
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: String,
    pub name: String,
    /// Hard, Clay, Grass
    pub surface: String,
    pub city: String,
}

impl Tournament {
    /// Placeholder record for a tournament only known by id
    pub fn placeholder(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            surface: "Hard".to_string(),
            city: "Unknown".to_string(),
        }
    }
}

/// A tennis player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub country_code: String,
    pub rank: i32,
    /// Ranking points; 0 when unknown
    #[serde(default)]
    pub points: i32,
}

/// Aggregate in-match statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchStats {
    pub aces_p1: u32,
    pub aces_p2: u32,
    #[serde(rename = "df_p1")]
    pub double_faults_p1: u32,
    #[serde(rename = "df_p2")]
    pub double_faults_p2: u32,
    pub break_points_p1: u32,
    pub break_points_p2: u32,
    pub winners_p1: u32,
    pub winners_p2: u32,
    pub unforced_errors_p1: u32,
    pub unforced_errors_p2: u32,
    pub first_serve_pct_p1: f64,
    pub first_serve_pct_p2: f64,
    /// Length of the most recent rally
    pub rally_count: u32,
}

impl MatchStats {
    pub fn record_ace(&mut self, side: Side) {
        match side {
            Side::One => self.aces_p1 += 1,
            Side::Two => self.aces_p2 += 1,
        }
    }

    pub fn record_break_point(&mut self, receiver: Side) {
        match receiver {
            Side::One => self.break_points_p1 += 1,
            Side::Two => self.break_points_p2 += 1,
        }
    }
}

/// A single match and its live state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    pub tournament_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament: Option<Tournament>,
    pub player1_id: String,
    pub player2_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player1: Option<Player>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player2: Option<Player>,
    pub status: MatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<String>,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<String>,
    /// True for simulator matches, false for real ones
    pub is_simulated: bool,

    pub score: ScoreState,
    pub stats: MatchStats,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sets: Vec<SetScore>,

    /// Player 1 match win probability, within [0.01, 0.99]
    #[serde(rename = "win_prob_p1")]
    pub win_probability_p1: f64,
    pub leverage_index: f64,
    /// Per-side fatigue, within [0, 100]
    pub fatigue_p1: f64,
    pub fatigue_p2: f64,
}

impl Match {
    /// A freshly observed live match at 0-0
    pub fn new_live(
        id: impl Into<String>,
        tournament_id: impl Into<String>,
        player1_id: impl Into<String>,
        player2_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            tournament_id: tournament_id.into(),
            tournament: None,
            player1_id: player1_id.into(),
            player2_id: player2_id.into(),
            player1: None,
            player2: None,
            status: MatchStatus::Live,
            round: None,
            start_time: Utc::now(),
            end_time: None,
            winner_id: None,
            is_simulated: false,
            score: ScoreState::default(),
            stats: MatchStats::default(),
            sets: Vec::new(),
            win_probability_p1: 0.5,
            leverage_index: 0.0,
            fatigue_p1: 0.0,
            fatigue_p2: 0.0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status == MatchStatus::Finished
    }

    pub fn player_id(&self, side: Side) -> &str {
        match side {
            Side::One => &self.player1_id,
            Side::Two => &self.player2_id,
        }
    }

    /// Mark the match finished with `side` as winner
    pub fn finish(&mut self, side: Side) {
        self.status = MatchStatus::Finished;
        self.winner_id = Some(self.player_id(side).to_string());
        self.end_time = Some(Utc::now());
    }
}
