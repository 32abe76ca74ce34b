use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::analytics::{fatigue, leverage_index, win_probability};
use super::scoring::{play_point, PointImportance, PointOutcome};
use crate::adapters::MatchPublisher;
use crate::config::SimulationConfig;
use crate::coordination::ShutdownToken;
use crate::domain::{Match, Player, Side, Tournament};
use crate::persistence::{persist_match_logged, MatchStore};

const SIMULATED_MATCHES: usize = 5;

fn seed_tournaments() -> Vec<Tournament> {
    vec![
        Tournament {
            id: "t1".into(),
            name: "Australian Open".into(),
            surface: "Hard".into(),
            city: "Melbourne".into(),
        },
        Tournament {
            id: "t2".into(),
            name: "Roland Garros".into(),
            surface: "Clay".into(),
            city: "Paris".into(),
        },
    ]
}

fn seed_players() -> Vec<Player> {
    [
        ("J. Sinner", "IT"),
        ("C. Alcaraz", "ES"),
        ("N. Djokovic", "RS"),
        ("D. Medvedev", "RU"),
        ("A. Zverev", "DE"),
        ("A. Rublev", "RU"),
        ("H. Rune", "DK"),
        ("H. Hurkacz", "PL"),
        ("T. Fritz", "US"),
        ("S. Tsitsipas", "GR"),
    ]
    .iter()
    .enumerate()
    .map(|(i, (name, country))| Player {
        id: format!("p{}", i + 1),
        name: name.to_string(),
        country_code: country.to_string(),
        rank: i as i32 + 1,
        points: 0,
    })
    .collect()
}

/// Synthesizes live matches when no real data is available.
///
/// Owns its matches outright; every tick advances each unfinished match by
/// one point and emits the result to the store, the bus and the update queue.
pub struct SimulationEngine {
    matches: BTreeMap<String, Match>,
    rng: StdRng,
    config: SimulationConfig,
    store: Arc<dyn MatchStore>,
    publisher: Arc<dyn MatchPublisher>,
    out: mpsc::Sender<Match>,
}

impl SimulationEngine {
    pub fn new(
        config: SimulationConfig,
        store: Arc<dyn MatchStore>,
        publisher: Arc<dyn MatchPublisher>,
        out: mpsc::Sender<Match>,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            matches: BTreeMap::new(),
            rng,
            config,
            store,
            publisher,
            out,
        }
    }

    /// Build the fixed roster of matches and persist it
    pub async fn initialize(&mut self) {
        let tournaments = seed_tournaments();
        let players = seed_players();

        for i in 0..SIMULATED_MATCHES {
            let tournament = &tournaments[i % tournaments.len()];
            let p1 = &players[2 * i];
            let p2 = &players[2 * i + 1];

            let mut m = Match::new_live(
                format!("match_{}", i),
                tournament.id.clone(),
                p1.id.clone(),
                p2.id.clone(),
            );
            m.is_simulated = true;
            m.tournament = Some(tournament.clone());
            m.player1 = Some(p1.clone());
            m.player2 = Some(p2.clone());

            persist_match_logged(self.store.as_ref(), &m).await;
            self.matches.insert(m.id.clone(), m);
        }

        info!(matches = self.matches.len(), "Simulation initialized");
    }

    pub fn matches(&self) -> impl Iterator<Item = &Match> {
        self.matches.values()
    }

    pub fn get(&self, id: &str) -> Option<&Match> {
        self.matches.get(id)
    }

    /// Advance every unfinished match by one point and emit the updates.
    /// Returns how many matches moved.
    pub async fn tick(&mut self) -> usize {
        let updated = self.advance();
        for m in &updated {
            self.emit(m).await;
        }
        updated.len()
    }

    fn advance(&mut self) -> Vec<Match> {
        let sets_to_win = self.config.sets_to_win;
        let max_rally = self.config.max_rally.max(1);
        let mut updated = Vec::new();

        for m in self.matches.values_mut().filter(|m| !m.is_finished()) {
            let winner = if self.rng.gen_bool(0.5) {
                Side::One
            } else {
                Side::Two
            };

            let outcome = play_point(m, winner, sets_to_win);
            if self.rng.gen_bool(self.config.ace_probability) {
                m.stats.record_ace(winner);
            }
            m.stats.rally_count = self.rng.gen_range(1..=max_rally);

            let wp = win_probability(&m.score);
            let importance = PointImportance::from_score(&m.score, sets_to_win);
            m.win_probability_p1 = wp;
            m.leverage_index = leverage_index(wp, importance);
            m.fatigue_p1 = fatigue(m.fatigue_p1, m.stats.rally_count);
            m.fatigue_p2 = fatigue(m.fatigue_p2, m.stats.rally_count);

            if let PointOutcome::Set { games_p1, games_p2 } = outcome {
                debug!(match_id = %m.id, games_p1, games_p2, "set closed");
            }
            if m.is_finished() {
                info!(match_id = %m.id, winner = ?m.winner_id, "simulated match finished");
            }

            updated.push(m.clone());
        }

        updated
    }

    /// Persist, publish and enqueue. Every failure here is absorbed.
    async fn emit(&self, m: &Match) {
        persist_match_logged(self.store.as_ref(), m).await;

        match serde_json::to_string(m) {
            Ok(payload) => {
                if let Err(e) = self
                    .publisher
                    .publish(&self.config.topic, Arc::from(payload))
                    .await
                {
                    warn!(match_id = %m.id, error = %e, "publish failed");
                }
            }
            Err(e) => warn!(match_id = %m.id, error = %e, "failed to serialize match"),
        }

        match self.out.try_send(m.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                debug!(match_id = %m.id, "update queue full, dropping tick")
            }
            Err(TrySendError::Closed(_)) => debug!(match_id = %m.id, "update queue closed"),
        }
    }

    /// Tick on the configured period until `token` fires
    pub async fn run(mut self, token: ShutdownToken) {
        let period = self.config.tick_interval();
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(tick_ms = period.as_millis() as u64, "Simulation running");

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        info!("Simulation stopped");
    }
}
