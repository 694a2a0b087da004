//! End-to-end tests across the rating, difficulty, selection and session layers.

use trivia_engine::baseline::{calculate_baseline_results, generate_baseline_test};
use trivia_engine::config::{EngineConfig, LengthNormalizationConfig, RandomizationConfig};
use trivia_engine::difficulty::{AdjustmentReason, DifficultyController};
use trivia_engine::random::RandomSource;
use trivia_engine::rating::{rank_display, GameResult, RatingEngine, RatingProfile};
use trivia_engine::selection::{QuestionRandomizer, ANALYTICS_KEY};
use trivia_engine::store::{JsonFileStore, KeyValueStore, MemoryStore};
use trivia_engine::{Difficulty, PlayerSession, Question};

const FIXED_TIMESTAMP: i64 = 1700000000000;

fn make_question(id: &str, category: &str, difficulty: Difficulty, correct: usize) -> Question {
    Question {
        id: id.to_string(),
        category: category.to_string(),
        difficulty,
        buzzword: "Deliverable".to_string(),
        definition: "A tangible outcome of work".to_string(),
        options: vec![
            "A tangible outcome".to_string(),
            "A quarterly budget".to_string(),
            "A shipping method".to_string(),
            "A meeting agenda".to_string(),
        ],
        correct_answer: correct,
    }
}

fn bank() -> Vec<Question> {
    let mut questions = Vec::new();
    for category in ["tech", "finance"] {
        for (d, difficulty) in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
            .into_iter()
            .enumerate()
        {
            for i in 0..5 {
                questions.push(make_question(
                    &format!("{}-{}-{}", category, d, i),
                    category,
                    difficulty,
                    i % 4,
                ));
            }
        }
    }
    questions
}

#[test]
fn test_rank_display_for_new_player_gain() {
    let display = rank_display(1200.0, 50.0);
    assert_eq!(display.current_rank.name(), "Iron II");
    assert_eq!(display.lp_gain, 50);
    assert_eq!(display.lp_gain_label(), "+50 LP");
    assert_eq!(display.next_rank.map(|r| r.name()), Some("Iron I".to_string()));
}

#[test]
fn test_unseeded_randomization_validates() {
    let mut randomizer = QuestionRandomizer::new(
        RandomizationConfig::default(),
        LengthNormalizationConfig::default(),
    );
    let question = make_question("fair", "tech", Difficulty::Medium, 0);
    for _ in 0..10_000 {
        let randomized = randomizer.randomize_answer_positions(&question).unwrap();
        assert_eq!(randomized.question.correct_option(), "A tangible outcome");
    }
    assert_eq!(randomizer.analytics().total, 10_000);
    assert!(randomizer.validate_randomization());
}

#[test]
fn test_strong_streak_raises_challenge() {
    let mut controller = DifficultyController::default();
    let mut increased = false;
    for i in 0..10 {
        let adjustment = controller.update_performance_at(0.95, FIXED_TIMESTAMP + i).unwrap();
        assert_ne!(adjustment.reason, AdjustmentReason::Decrease);
        increased |= adjustment.reason == AdjustmentReason::Increase;
    }
    assert!(increased);
    assert_eq!(controller.recommended_difficulty(), Difficulty::Hard);
}

#[test]
fn test_baseline_then_game_rating_flow() {
    let questions: Vec<Question> = (0..10)
        .map(|i| make_question(&format!("b{}", i), "tech", Difficulty::Medium, i % 4))
        .collect();
    let answers: Vec<Option<usize>> = questions
        .iter()
        .enumerate()
        .map(|(i, q)| Some(if i < 7 { q.correct_answer } else { (q.correct_answer + 1) % 4 }))
        .collect();
    let baseline = calculate_baseline_results(&questions, &answers, FIXED_TIMESTAMP).unwrap();
    assert_eq!(baseline.overall_accuracy, 70.0);
    assert_eq!(baseline.recommended_difficulty, Difficulty::Medium);
    assert_eq!(baseline.recommended_ratings["tech"], 1400.0);

    let engine = RatingEngine::default();
    let mut profile = RatingProfile::default();
    let seeded = engine.apply_baseline(&mut profile, &baseline, FIXED_TIMESTAMP);
    assert_eq!(seeded.new_rating, 1400.0);

    // 1400 vs a 1200 opponent expects ~0.76; a perfect game still gains
    let change = engine
        .record_game(
            &mut profile,
            &GameResult {
                category: "tech".to_string(),
                difficulty: Difficulty::Medium,
                correct: 10,
                total: 10,
            },
            FIXED_TIMESTAMP + 1,
        )
        .unwrap();
    assert!(change.change > 0.0);
    assert_eq!(profile.rating_history.len(), 2);
    assert_eq!(profile.category_rating("tech"), 1400.0 + change.change);
}

#[test]
fn test_generated_baseline_is_medium_only() {
    let mut rng = RandomSource::seeded(5);
    let interests = vec!["tech".to_string(), "finance".to_string()];
    let test = generate_baseline_test(&bank(), &interests, 3, &mut rng).unwrap();
    assert_eq!(test.len(), 6);
    assert!(test.iter().all(|q| q.difficulty == Difficulty::Medium));
}

#[test]
fn test_session_state_survives_file_store_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trivia.json");
    let config = EngineConfig {
        randomization: RandomizationConfig {
            seed: Some(99),
            ..Default::default()
        },
        ..Default::default()
    };

    let (rating, history_len) = {
        let store = JsonFileStore::open(&path).unwrap();
        let mut session = PlayerSession::open("alice", config.clone(), bank(), store).unwrap();
        session.skip_baseline(&["tech".to_string()]);
        for _ in 0..4 {
            let question = session.next_question().unwrap();
            session.submit_answer(question.correct_answer()).unwrap();
        }
        let change = session.complete_game().unwrap();
        (change.new_rating, session.profile().rating_history.len())
    };

    let store = JsonFileStore::open(&path).unwrap();
    assert!(store.get(ANALYTICS_KEY).unwrap().is_some());
    let session = PlayerSession::open("alice", config, bank(), store).unwrap();
    assert_eq!(session.profile().current_rating, rating);
    assert_eq!(session.profile().rating_history.len(), history_len);
    assert!(session.profile().baseline.as_ref().is_some_and(|b| b.skipped));
    assert_eq!(session.questions_remaining(), 26);
    assert_eq!(session.analytics().total, 4);
}

#[test]
fn test_players_do_not_share_state() {
    let mut alice = PlayerSession::open("alice", EngineConfig::default(), bank(), MemoryStore::new())
        .unwrap();
    let question = alice.next_question().unwrap();
    alice.submit_answer(question.correct_answer()).unwrap();
    alice.complete_game().unwrap();

    let bob = PlayerSession::open("bob", EngineConfig::default(), bank(), alice.into_store()).unwrap();
    assert_eq!(bob.profile().games_played, 0);
    assert_eq!(bob.questions_remaining(), 30);
    // position analytics are global across players
    assert_eq!(bob.analytics().total, 1);
}
