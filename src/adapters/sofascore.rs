//! Sofascore live events provider
//!
//! Fetches today's tennis events and translates the in-progress ones into
//! `Match` values. Also serves the ATP ranking and the tournament calendar.
//! Everything about the provider's wire shape stays in here.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, instrument};

use super::reference::ReferenceSource;
use crate::aggregator::sources::{MatchSource, SourceKind};
use crate::config::ProviderConfig;
use crate::domain::{Match, MatchStatus, Player, ScoreState, Tournament};
use crate::error::{HardcourtError, Result};

/// Provider status code for an event in progress
const STATUS_IN_PROGRESS: i64 = 6;

/// Provider ranking type for ATP singles
const ATP_SINGLES_RANKING: u32 = 5;

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Event {
    id: i64,
    tournament: EventTournament,
    home_team: EventPlayer,
    away_team: EventPlayer,
    status: EventStatus,
    #[serde(default)]
    home_score: EventScore,
    #[serde(default)]
    away_score: EventScore,
    #[serde(default)]
    start_timestamp: i64,
}

#[derive(Debug, Deserialize)]
struct EventTournament {
    name: String,
    #[serde(default, rename = "groundType")]
    ground_type: Option<String>,
    #[serde(default)]
    city: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventPlayer {
    id: i64,
    name: String,
    #[serde(default)]
    country_code: Option<String>,
    #[serde(default)]
    ranking: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct EventStatus {
    code: i64,
}

#[derive(Debug, Deserialize)]
struct RankingsResponse {
    #[serde(default)]
    rankings: Vec<RankingRow>,
}

#[derive(Debug, Deserialize)]
struct RankingRow {
    team: RankedPlayer,
    ranking: i32,
    #[serde(default)]
    points: f64,
}

#[derive(Debug, Deserialize)]
struct RankedPlayer {
    id: i64,
    name: String,
    #[serde(default)]
    country: Option<Country>,
}

#[derive(Debug, Deserialize)]
struct Country {
    #[serde(default)]
    alpha2: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct EventScore {
    /// Sets won
    #[serde(default)]
    current: u8,
    /// Games in the current set
    #[serde(default)]
    display: u8,
}

/// HTTP client for the live events API
pub struct SofascoreClient {
    http: Client,
    base_url: String,
    user_agent: String,
}

impl SofascoreClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
        })
    }

    /// Today's in-progress events
    #[instrument(skip(self))]
    pub async fn live_matches(&self) -> Result<Vec<Match>> {
        let body = self.todays_events().await?;
        let matches = parse_live_events(&body)?;
        debug!(count = matches.len(), "translated live events");
        Ok(matches)
    }

    /// Current ATP singles ranking
    #[instrument(skip(self))]
    pub async fn rankings(&self) -> Result<Vec<Player>> {
        let url = format!("{}/rankings/type/{}", self.base_url, ATP_SINGLES_RANKING);
        let body = self.get_text(&url).await?;
        let players = parse_rankings(&body)?;
        debug!(count = players.len(), "translated ranking rows");
        Ok(players)
    }

    /// Tournaments with at least one event today
    #[instrument(skip(self))]
    pub async fn tournaments(&self) -> Result<Vec<Tournament>> {
        let body = self.todays_events().await?;
        parse_tournaments(&body)
    }

    async fn todays_events(&self) -> Result<String> {
        let url = format!(
            "{}/sport/tennis/scheduled-events/{}",
            self.base_url,
            Utc::now().format("%Y-%m-%d")
        );
        self.get_text(&url).await
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let resp = self
            .http
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| HardcourtError::source_unavailable("sofascore", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(HardcourtError::source_unavailable(
                "sofascore",
                format!("API returned {}: {}", status, body),
            ));
        }

        resp.text()
            .await
            .map_err(|e| HardcourtError::source_unavailable("sofascore", e))
    }
}

/// Translate a raw events payload, keeping only events in progress
pub fn parse_live_events(body: &str) -> Result<Vec<Match>> {
    let parsed: EventsResponse = serde_json::from_str(body)
        .map_err(|e| HardcourtError::source_unavailable("sofascore", e))?;

    Ok(parsed
        .events
        .into_iter()
        .filter(|e| e.status.code == STATUS_IN_PROGRESS)
        .map(translate_event)
        .collect())
}

/// Translate a ranking payload into players carrying rank and points
pub fn parse_rankings(body: &str) -> Result<Vec<Player>> {
    let parsed: RankingsResponse = serde_json::from_str(body)
        .map_err(|e| HardcourtError::source_unavailable("sofascore", e))?;

    Ok(parsed
        .rankings
        .into_iter()
        .map(|row| Player {
            id: format!("p_{}", row.team.id),
            name: row.team.name,
            country_code: row
                .team
                .country
                .and_then(|c| c.alpha2)
                .unwrap_or_default(),
            rank: row.ranking,
            points: row.points.round() as i32,
        })
        .collect())
}

/// Distinct tournaments referenced by an events payload, in first-seen order
pub fn parse_tournaments(body: &str) -> Result<Vec<Tournament>> {
    let parsed: EventsResponse = serde_json::from_str(body)
        .map_err(|e| HardcourtError::source_unavailable("sofascore", e))?;

    let mut seen = HashSet::new();
    Ok(parsed
        .events
        .into_iter()
        .map(|e| translate_tournament(e.tournament))
        .filter(|t| seen.insert(t.id.clone()))
        .collect())
}

fn translate_tournament(t: EventTournament) -> Tournament {
    Tournament {
        id: format!("t_{}", t.name),
        name: t.name,
        surface: t.ground_type.unwrap_or_else(|| "Hard".to_string()),
        city: t.city.unwrap_or_else(|| "Unknown".to_string()),
    }
}

fn translate_player(p: EventPlayer) -> Player {
    Player {
        id: format!("p_{}", p.id),
        name: p.name,
        country_code: p.country_code.unwrap_or_default(),
        rank: p.ranking.unwrap_or_default(),
        points: 0,
    }
}

fn translate_event(event: Event) -> Match {
    let tournament = translate_tournament(event.tournament);
    let player1 = translate_player(event.home_team);
    let player2 = translate_player(event.away_team);

    let mut m = Match::new_live(
        format!("sofa_{}", event.id),
        tournament.id.clone(),
        player1.id.clone(),
        player2.id.clone(),
    );
    m.status = MatchStatus::Live;
    if let Some(start) = Utc.timestamp_opt(event.start_timestamp, 0).single() {
        m.start_time = start;
    }
    m.tournament = Some(tournament);
    m.player1 = Some(player1);
    m.player2 = Some(player2);
    // Point-level detail is not provided; points start at "0" with player 1 serving
    m.score = ScoreState {
        sets_p1: event.home_score.current,
        sets_p2: event.away_score.current,
        games_p1: event.home_score.display,
        games_p2: event.away_score.display,
        ..ScoreState::default()
    };
    m
}

#[async_trait]
impl MatchSource for SofascoreClient {
    fn name(&self) -> &str {
        "sofascore"
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Remote
    }

    async fn fetch_live(&self) -> Result<Vec<Match>> {
        self.live_matches().await
    }
}

#[async_trait]
impl ReferenceSource for SofascoreClient {
    fn name(&self) -> &str {
        "sofascore"
    }

    async fn fetch_rankings(&self) -> Result<Vec<Player>> {
        self.rankings().await
    }

    async fn fetch_tournaments(&self) -> Result<Vec<Tournament>> {
        self.tournaments().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "events": [
            {
                "id": 101,
                "tournament": {"name": "Australian Open", "groundType": "Hardcourt outdoor"},
                "homeTeam": {"id": 1, "name": "J. Sinner", "countryCode": "IT", "ranking": 1},
                "awayTeam": {"id": 2, "name": "C. Alcaraz", "countryCode": "ES", "ranking": 2},
                "status": {"code": 6, "description": "1st set", "type": "inprogress"},
                "homeScore": {"current": 1, "display": 3},
                "awayScore": {"current": 0, "display": 2},
                "startTimestamp": 1700000000
            },
            {
                "id": 102,
                "tournament": {"name": "Australian Open"},
                "homeTeam": {"id": 3, "name": "N. Djokovic"},
                "awayTeam": {"id": 4, "name": "D. Medvedev"},
                "status": {"code": 100, "description": "Ended", "type": "finished"},
                "startTimestamp": 1700000000
            }
        ]
    }"#;

    #[test]
    fn test_only_in_progress_events_are_kept() {
        let matches = parse_live_events(PAYLOAD).unwrap();
        assert_eq!(matches.len(), 1);

        let m = &matches[0];
        assert_eq!(m.id, "sofa_101");
        assert_eq!(m.tournament_id, "t_Australian Open");
        assert_eq!(m.player1_id, "p_1");
        assert_eq!(m.player2.as_ref().unwrap().name, "C. Alcaraz");
        assert_eq!(m.status, MatchStatus::Live);
        assert_eq!((m.score.sets_p1, m.score.games_p1, m.score.games_p2), (1, 3, 2));
        assert!(!m.is_simulated);
        assert_eq!(m.start_time.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_malformed_payload_is_source_unavailable() {
        let err = parse_live_events("<html>blocked</html>").unwrap_err();
        assert!(matches!(err, HardcourtError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_ranking_rows_carry_rank_and_points() {
        let body = r#"{
            "rankings": [
                {"team": {"id": 1, "name": "J. Sinner", "country": {"alpha2": "IT"}}, "ranking": 1, "points": 11830},
                {"team": {"id": 2, "name": "A. Zverev"}, "ranking": 2, "points": 7915.0}
            ]
        }"#;

        let players = parse_rankings(body).unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].id, "p_1");
        assert_eq!(players[0].country_code, "IT");
        assert_eq!((players[0].rank, players[0].points), (1, 11830));
        assert_eq!(players[1].country_code, "");
        assert_eq!(players[1].points, 7915);
    }

    #[test]
    fn test_tournaments_are_deduplicated_across_events() {
        let tournaments = parse_tournaments(PAYLOAD).unwrap();
        assert_eq!(tournaments.len(), 1);
        assert_eq!(tournaments[0].id, "t_Australian Open");
        assert_eq!(tournaments[0].surface, "Hardcourt outdoor");
    }

    #[test]
    fn test_empty_payload_yields_no_matches() {
        assert!(parse_live_events("{}").unwrap().is_empty());
    }
}
