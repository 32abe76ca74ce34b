use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::domain::{Match, MatchStatus, Player, Tournament};
use crate::error::{HardcourtError, Result};
use crate::persistence::MatchStore;

/// In-process store used when no database is configured, and in tests.
#[derive(Default)]
pub struct MemoryStore {
    tournaments: RwLock<HashMap<String, Tournament>>,
    players: RwLock<HashMap<String, Player>>,
    matches: RwLock<HashMap<String, Match>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every call fails until switched back on
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(HardcourtError::Persistence("store offline".into()))
        } else {
            Ok(())
        }
    }

    /// Attach the stored player/tournament records, like a join would
    async fn hydrate(&self, mut m: Match) -> Match {
        let players = self.players.read().await;
        m.player1 = players.get(&m.player1_id).cloned().or(m.player1);
        m.player2 = players.get(&m.player2_id).cloned().or(m.player2);
        drop(players);

        let tournaments = self.tournaments.read().await;
        m.tournament = tournaments.get(&m.tournament_id).cloned().or(m.tournament);
        m
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn upsert_tournament(&self, tournament: &Tournament) -> Result<()> {
        self.check_online()?;
        self.tournaments
            .write()
            .await
            .insert(tournament.id.clone(), tournament.clone());
        Ok(())
    }

    async fn upsert_player(&self, player: &Player) -> Result<()> {
        self.check_online()?;
        let mut players = self.players.write().await;
        let mut next = player.clone();
        if next.points == 0 {
            if let Some(existing) = players.get(&player.id) {
                next.points = existing.points;
            }
        }
        players.insert(next.id.clone(), next);
        Ok(())
    }

    async fn upsert_match(&self, m: &Match) -> Result<()> {
        self.check_online()?;
        self.matches.write().await.insert(m.id.clone(), m.clone());
        Ok(())
    }

    async fn get_match(&self, id: &str) -> Result<Option<Match>> {
        self.check_online()?;
        let found = self.matches.read().await.get(id).cloned();
        match found {
            Some(m) => Ok(Some(self.hydrate(m).await)),
            None => Ok(None),
        }
    }

    async fn list_matches(&self, status: Option<MatchStatus>) -> Result<Vec<Match>> {
        self.check_online()?;
        let mut selected: Vec<Match> = self
            .matches
            .read()
            .await
            .values()
            .filter(|m| status.map_or(true, |s| m.status == s))
            .cloned()
            .collect();
        selected.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(a.id.cmp(&b.id)));

        let mut hydrated = Vec::with_capacity(selected.len());
        for m in selected {
            hydrated.push(self.hydrate(m).await);
        }
        Ok(hydrated)
    }

    async fn get_player(&self, id: &str) -> Result<Option<Player>> {
        self.check_online()?;
        Ok(self.players.read().await.get(id).cloned())
    }

    async fn get_tournament(&self, id: &str) -> Result<Option<Tournament>> {
        self.check_online()?;
        Ok(self.tournaments.read().await.get(id).cloned())
    }

    async fn delete_simulated(&self) -> Result<u64> {
        self.check_online()?;
        let mut matches = self.matches.write().await;
        let before = matches.len();
        matches.retain(|_, m| !m.is_simulated);
        Ok((before - matches.len()) as u64)
    }

    async fn ping(&self) -> Result<()> {
        self.check_online()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::persist_match_graph;

    fn sample(id: &str, status: MatchStatus) -> Match {
        let mut m = Match::new_live(id, "t1", "p1", "p2");
        m.status = status;
        m.player1 = Some(Player {
            id: "p1".into(),
            name: "J. Sinner".into(),
            country_code: "IT".into(),
            rank: 1,
            points: 0,
        });
        m
    }

    #[tokio::test]
    async fn test_upsert_is_last_write_wins() {
        let store = MemoryStore::new();
        let mut m = sample("m1", MatchStatus::Live);
        store.upsert_match(&m).await.unwrap();

        m.score.games_p1 = 3;
        store.upsert_match(&m).await.unwrap();

        let stored = store.get_match("m1").await.unwrap().unwrap();
        assert_eq!(stored.score.games_p1, 3);
        assert_eq!(store.list_matches(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_filters_by_status_and_hydrates() {
        let store = MemoryStore::new();
        persist_match_graph(&store, &sample("live", MatchStatus::Live))
            .await
            .unwrap();
        persist_match_graph(&store, &sample("done", MatchStatus::Finished))
            .await
            .unwrap();

        let live = store.list_matches(Some(MatchStatus::Live)).await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, "live");
        assert_eq!(live[0].player1.as_ref().unwrap().name, "J. Sinner");
        assert_eq!(live[0].tournament.as_ref().unwrap().city, "Unknown");
    }

    #[tokio::test]
    async fn test_delete_simulated_keeps_real_matches() {
        let store = MemoryStore::new();
        let mut simulated = sample("sim", MatchStatus::Live);
        simulated.is_simulated = true;
        store.upsert_match(&simulated).await.unwrap();
        store.upsert_match(&sample("real", MatchStatus::Live)).await.unwrap();

        assert_eq!(store.delete_simulated().await.unwrap(), 1);
        assert!(store.get_match("sim").await.unwrap().is_none());
        assert!(store.get_match("real").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unknown_points_keep_stored_points() {
        let store = MemoryStore::new();
        let mut player = sample("m", MatchStatus::Live).player1.unwrap();
        player.points = 9000;
        store.upsert_player(&player).await.unwrap();

        player.points = 0;
        player.rank = 2;
        store.upsert_player(&player).await.unwrap();

        let stored = store.get_player("p1").await.unwrap().unwrap();
        assert_eq!((stored.rank, stored.points), (2, 9000));
    }

    #[tokio::test]
    async fn test_offline_store_fails() {
        let store = MemoryStore::new();
        store.set_offline(true);
        assert!(store.list_matches(None).await.is_err());
        assert!(store.ping().await.is_err());
    }
}
