use hardcourt::adapters::LocalBus;
use hardcourt::config::SimulationConfig;
use hardcourt::domain::{Match, MatchStatus, PointValue, ScoreState, Side};
use hardcourt::persistence::{MatchStore, MemoryStore};
use hardcourt::simulation::analytics::{MAX_FATIGUE, MAX_WIN_PROBABILITY, MIN_WIN_PROBABILITY};
use hardcourt::simulation::{award_point, SimulationEngine};
use std::sync::Arc;
use tokio::sync::mpsc;

fn engine(seed: u64, bus: Arc<LocalBus>) -> (SimulationEngine, mpsc::Receiver<Match>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let (tx, rx) = mpsc::channel(16);
    let config = SimulationConfig {
        seed: Some(seed),
        ..SimulationConfig::default()
    };
    (SimulationEngine::new(config, store.clone(), bus, tx), rx, store)
}

#[tokio::test]
async fn metrics_stay_in_range_over_long_runs() {
    for seed in [1u64, 2, 3] {
        let (mut engine, mut rx, _store) = engine(seed, Arc::new(LocalBus::default()));
        engine.initialize().await;

        for _ in 0..2_000 {
            engine.tick().await;
            while rx.try_recv().is_ok() {}

            for m in engine.matches() {
                assert!((MIN_WIN_PROBABILITY..=MAX_WIN_PROBABILITY).contains(&m.win_probability_p1));
                assert!((0.0..=MAX_FATIGUE).contains(&m.fatigue_p1));
                assert!((0.0..=MAX_FATIGUE).contains(&m.fatigue_p2));
                assert!(m.leverage_index >= 0.0);
                assert!(!(m.score.points_p1 == PointValue::Advantage
                    && m.score.points_p2 == PointValue::Advantage));
                assert!(m.stats.rally_count >= 1);
            }
        }
    }
}

#[tokio::test]
async fn matches_finish_at_two_sets_and_then_freeze() {
    let (mut engine, mut rx, store) = engine(11, Arc::new(LocalBus::default()));
    engine.initialize().await;

    // Plenty of points for every best-of-three to finish
    for _ in 0..5_000 {
        engine.tick().await;
        while rx.try_recv().is_ok() {}
    }

    for m in engine.matches() {
        assert_eq!(m.status, MatchStatus::Finished, "{} still live", m.id);
        let sets = (m.score.sets_p1, m.score.sets_p2);
        assert!(sets.0 == 2 || sets.1 == 2);
        assert!(sets.0 + sets.1 <= 3);
        assert_eq!(m.sets.len() as u8, sets.0 + sets.1);

        let winner = if sets.0 == 2 { &m.player1_id } else { &m.player2_id };
        assert_eq!(m.winner_id.as_ref(), Some(winner));
        assert!(m.end_time.is_some());
    }

    assert_eq!(engine.tick().await, 0);
    let stored = store.list_matches(Some(MatchStatus::Finished)).await.unwrap();
    assert_eq!(stored.len(), 5);
}

#[tokio::test]
async fn ticks_are_published_to_the_bus_topic() {
    let bus = Arc::new(LocalBus::default());
    let mut scores = bus.subscribe("live_scores").await;
    let (mut engine, _rx, _store) = engine(5, bus);
    engine.initialize().await;

    engine.tick().await;
    let payload = scores.recv().await.unwrap();
    let m: Match = serde_json::from_str(&payload).unwrap();
    assert!(m.id.starts_with("match_"));
    assert!(m.is_simulated);
}

#[tokio::test]
async fn full_update_queue_does_not_stall_ticks() {
    let store = Arc::new(MemoryStore::new());
    let (tx, _rx) = mpsc::channel(1);
    let mut engine = SimulationEngine::new(
        SimulationConfig {
            seed: Some(9),
            ..SimulationConfig::default()
        },
        store,
        Arc::new(LocalBus::default()),
        tx,
    );
    engine.initialize().await;

    for _ in 0..10 {
        assert_eq!(engine.tick().await, 5);
    }
}

#[test]
fn documented_transitions() {
    // 40-15, server's point wins the game
    let mut s = ScoreState {
        points_p1: PointValue::Forty,
        points_p2: PointValue::Fifteen,
        ..ScoreState::default()
    };
    award_point(&mut s, Side::One);
    assert_eq!((s.points_p1, s.points_p2), (PointValue::Love, PointValue::Love));
    assert_eq!(s.games_p1, 1);
    assert_eq!(s.serving, Side::Two);

    // Deuce, advantage, deuce again
    let mut s = ScoreState {
        points_p1: PointValue::Forty,
        points_p2: PointValue::Forty,
        ..ScoreState::default()
    };
    award_point(&mut s, Side::One);
    assert_eq!((s.points_p1, s.points_p2), (PointValue::Advantage, PointValue::Forty));
    award_point(&mut s, Side::Two);
    assert_eq!((s.points_p1, s.points_p2), (PointValue::Forty, PointValue::Forty));

    // 6-4 style close: 5-4 game point becomes a set
    let mut s = ScoreState {
        games_p1: 5,
        games_p2: 4,
        points_p1: PointValue::Forty,
        ..ScoreState::default()
    };
    award_point(&mut s, Side::One);
    assert_eq!((s.sets_p1, s.games_p1, s.games_p2), (1, 0, 0));

    // 6-5 is not enough
    let mut s = ScoreState {
        games_p1: 5,
        games_p2: 5,
        points_p1: PointValue::Forty,
        ..ScoreState::default()
    };
    award_point(&mut s, Side::One);
    assert_eq!((s.sets_p1, s.games_p1, s.games_p2), (0, 6, 5));
}
