//! One local player's engine state, wired to a key/value store.
//!
//! Every component underneath is a pure computation over owned state; this is
//! the only place that reads or writes the store. A failed write is logged and
//! the in-memory state stays authoritative.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::baseline::{self, BaselineResult};
use crate::config::EngineConfig;
use crate::difficulty::{DifficultyAdjustment, DifficultyController, DifficultyProfile, FlowState};
use crate::error::{EngineError, EngineResult};
use crate::rating::{GameResult, RankDisplay, RatingChange, RatingEngine, RatingProfile};
use crate::selection::{
    self, PoolState, PositionAnalytics, QuestionPool, QuestionRandomizer, ANALYTICS_KEY,
};
use crate::store::{difficulty_key, pool_key, rating_key, KeyValueStore};
use crate::types::{Difficulty, Question, RandomizedQuestion};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub question_id: String,
    pub correct: bool,
    /// Correct slot in the displayed option order.
    pub correct_answer: usize,
    pub adjustment: DifficultyAdjustment,
}

#[derive(Debug, Default)]
struct GameTally {
    difficulty: Option<Difficulty>,
    categories: BTreeMap<String, u32>,
    correct: u32,
    total: u32,
}

impl GameTally {
    fn record(&mut self, question: &Question, correct: bool) {
        self.difficulty.get_or_insert(question.difficulty);
        *self.categories.entry(question.category.clone()).or_insert(0) += 1;
        self.total += 1;
        if correct {
            self.correct += 1;
        }
    }

    /// Most-answered category; ties go to the alphabetically first.
    fn category(&self) -> String {
        let mut best: Option<(&String, u32)> = None;
        for (category, count) in &self.categories {
            if best.map_or(true, |(_, c)| *count > c) {
                best = Some((category, *count));
            }
        }
        best.map(|(c, _)| c.clone()).unwrap_or_else(|| "general".to_string())
    }
}

pub struct PlayerSession<S: KeyValueStore> {
    player_id: String,
    store: S,
    config: EngineConfig,
    engine: RatingEngine,
    profile: RatingProfile,
    controller: DifficultyController,
    randomizer: QuestionRandomizer,
    pool: QuestionPool,
    current: Option<RandomizedQuestion>,
    game: GameTally,
}

fn load<S: KeyValueStore, T: DeserializeOwned>(store: &S, key: &str) -> Option<T> {
    match store.get_as(key) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, key, "stored state unreadable, using defaults");
            None
        }
    }
}

fn save<S: KeyValueStore, T: Serialize>(store: &mut S, key: &str, value: &T) {
    if let Err(e) = store.set_as(key, value) {
        tracing::warn!(error = %e, key, "failed to persist state");
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl<S: KeyValueStore> PlayerSession<S> {
    /// Restores whatever the store holds for `player_id`; missing or corrupt
    /// entries start from defaults.
    pub fn open(
        player_id: impl Into<String>,
        config: EngineConfig,
        bank: Vec<Question>,
        store: S,
    ) -> EngineResult<Self> {
        let player_id = player_id.into();
        if player_id.trim().is_empty() {
            return Err(EngineError::InvalidInput("player id must not be empty".to_string()));
        }

        let mut pool = QuestionPool::new(bank)?;
        if let Some(state) = load::<S, PoolState>(&store, &pool_key(&player_id)) {
            pool.restore_state(&state);
        }

        let profile: RatingProfile = load(&store, &rating_key(&player_id)).unwrap_or_default();

        let controller = match load::<S, DifficultyProfile>(&store, &difficulty_key(&player_id)) {
            Some(saved) => DifficultyController::from_profile(config.difficulty.clone(), saved),
            None => DifficultyController::new(config.difficulty.clone()),
        };

        let mut randomizer =
            QuestionRandomizer::new(config.randomization.clone(), config.normalization.clone());
        if config.randomization.track_analytics {
            if let Some(analytics) = load::<S, PositionAnalytics>(&store, ANALYTICS_KEY) {
                randomizer = randomizer.with_analytics(analytics);
            }
        }

        tracing::info!(
            player_id = %player_id,
            rating = profile.current_rating,
            games = profile.games_played,
            bank_size = pool.len(),
            "player session opened"
        );

        Ok(Self {
            player_id,
            store,
            engine: RatingEngine::new(config.rating.clone()),
            config,
            profile,
            controller,
            randomizer,
            pool,
            current: None,
            game: GameTally::default(),
        })
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn profile(&self) -> &RatingProfile {
        &self.profile
    }

    pub fn difficulty_profile(&self) -> &DifficultyProfile {
        self.controller.profile()
    }

    pub fn analytics(&self) -> &PositionAnalytics {
        self.randomizer.analytics()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn current_question(&self) -> Option<&RandomizedQuestion> {
        self.current.as_ref()
    }

    pub fn questions_remaining(&self) -> usize {
        self.pool.remaining()
    }

    pub fn recommended_difficulty(&self) -> Difficulty {
        self.controller.recommended_difficulty()
    }

    pub fn flow_state(&self) -> FlowState {
        self.controller.flow_state()
    }

    pub fn rank_display(&self) -> RankDisplay {
        self.profile.rank_display()
    }

    pub fn validate_randomization(&self) -> bool {
        self.randomizer.validate_randomization()
    }

    /// Draws an unused question at the controller's current tier, randomized
    /// for display. Replaces any unanswered current question.
    pub fn next_question(&mut self) -> EngineResult<RandomizedQuestion> {
        let difficulty = self.controller.recommended_difficulty();
        let question =
            selection::next_question(&mut self.pool, &mut self.randomizer, Some(difficulty))?;
        tracing::debug!(
            question_id = %question.question.id,
            difficulty = difficulty.as_str(),
            length_adjusted = question.length_adjusted,
            "question served"
        );
        self.current = Some(question.clone());
        self.persist_selection();
        Ok(question)
    }

    /// Grades `answer` (a slot in the displayed order) against the current question.
    pub fn submit_answer(&mut self, answer: usize) -> EngineResult<AnswerOutcome> {
        let Some(current) = self.current.take() else {
            return Err(EngineError::InvalidInput("no question awaiting an answer".to_string()));
        };
        let view = &current.question;
        if answer >= view.options.len() {
            let id = view.id.clone();
            self.current = Some(current);
            return Err(EngineError::InvalidInput(format!(
                "answer {} out of range for question {}",
                answer, id
            )));
        }

        let correct = view.is_correct(answer);
        let adjustment = self
            .controller
            .update_performance(if correct { 1.0 } else { 0.0 })?;
        self.game.record(view, correct);
        save(
            &mut self.store,
            &difficulty_key(&self.player_id),
            self.controller.profile(),
        );

        Ok(AnswerOutcome {
            question_id: view.id.clone(),
            correct,
            correct_answer: view.correct_answer,
            adjustment,
        })
    }

    pub fn game_progress(&self) -> (u32, u32) {
        (self.game.correct, self.game.total)
    }

    /// Grades the answers submitted since the last completed game.
    pub fn complete_game(&mut self) -> EngineResult<RatingChange> {
        if self.game.total == 0 {
            return Err(EngineError::InvalidInput("no answers recorded for this game".to_string()));
        }
        let result = GameResult {
            category: self.game.category(),
            difficulty: self.game.difficulty.unwrap_or_default(),
            correct: self.game.correct,
            total: self.game.total,
        };
        let change = self.record_game(&result)?;
        self.game = GameTally::default();
        self.current = None;
        Ok(change)
    }

    /// Applies an externally graded game.
    pub fn record_game(&mut self, result: &GameResult) -> EngineResult<RatingChange> {
        let change = self.engine.record_game(&mut self.profile, result, now_ms())?;
        tracing::info!(
            player_id = %self.player_id,
            category = %result.category,
            previous = change.previous_rating,
            rating = change.new_rating,
            change = change.change,
            rank = %change.display.current_rank.name(),
            "game graded"
        );
        self.persist_rating();
        Ok(change)
    }

    /// Medium-tier assessment across `interests`, randomized for display.
    pub fn baseline_test(
        &mut self,
        interests: &[String],
        per_category: usize,
    ) -> EngineResult<Vec<RandomizedQuestion>> {
        let questions = baseline::generate_baseline_test(
            self.pool.bank(),
            interests,
            per_category,
            self.randomizer.rng_mut(),
        )?;
        let prepared = questions
            .iter()
            .map(|q| self.randomizer.prepare(q))
            .collect::<EngineResult<Vec<_>>>()?;
        self.persist_selection();
        Ok(prepared)
    }

    /// Grades a baseline taken on the views returned by [`Self::baseline_test`].
    pub fn complete_baseline(
        &mut self,
        questions: &[RandomizedQuestion],
        answers: &[Option<usize>],
    ) -> EngineResult<BaselineResult> {
        let views: Vec<Question> = questions.iter().map(|q| q.question.clone()).collect();
        let result = baseline::calculate_baseline_results(&views, answers, now_ms())?;
        self.apply_baseline(&result);
        Ok(result)
    }

    pub fn skip_baseline(&mut self, interests: &[String]) -> BaselineResult {
        let result = baseline::skipped_baseline(interests, now_ms());
        self.apply_baseline(&result);
        result
    }

    fn apply_baseline(&mut self, result: &BaselineResult) {
        let change = self.engine.apply_baseline(&mut self.profile, result, result.completed_at);
        self.controller.seed_from_baseline(result);
        tracing::info!(
            player_id = %self.player_id,
            skipped = result.skipped,
            accuracy = result.overall_accuracy,
            rating = change.new_rating,
            difficulty = result.recommended_difficulty.as_str(),
            "baseline applied"
        );
        self.persist_rating();
        save(
            &mut self.store,
            &difficulty_key(&self.player_id),
            self.controller.profile(),
        );
    }

    pub fn reset_difficulty(&mut self, skill: Option<f64>) {
        self.controller.reset(skill);
        save(
            &mut self.store,
            &difficulty_key(&self.player_id),
            self.controller.profile(),
        );
    }

    pub fn reset_pool(&mut self) {
        self.pool.reset();
        save(&mut self.store, &pool_key(&self.player_id), &self.pool.export_state());
    }

    pub fn reset_analytics(&mut self) {
        self.randomizer.reset_analytics();
        if self.config.randomization.track_analytics {
            save(&mut self.store, ANALYTICS_KEY, self.randomizer.analytics());
        }
    }

    fn persist_rating(&mut self) {
        save(&mut self.store, &rating_key(&self.player_id), &self.profile);
    }

    fn persist_selection(&mut self) {
        save(&mut self.store, &pool_key(&self.player_id), &self.pool.export_state());
        if self.config.randomization.track_analytics {
            save(&mut self.store, ANALYTICS_KEY, self.randomizer.analytics());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RandomizationConfig;
    use crate::store::{MemoryStore, StoreError, StoreResult};
    use serde_json::{json, Value};

    fn bank() -> Vec<Question> {
        let mut questions = Vec::new();
        for (i, difficulty) in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
            .into_iter()
            .cycle()
            .take(12)
            .enumerate()
        {
            questions.push(Question {
                id: format!("q{}", i),
                category: if i % 2 == 0 { "tech" } else { "finance" }.to_string(),
                difficulty,
                buzzword: format!("Term {}", i),
                definition: format!("Meaning {}", i),
                options: vec!["north".into(), "south".into(), "east".into(), "west".into()],
                correct_answer: i % 4,
            });
        }
        questions
    }

    fn config() -> EngineConfig {
        EngineConfig {
            randomization: RandomizationConfig {
                seed: Some(42),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn open(store: MemoryStore) -> PlayerSession<MemoryStore> {
        PlayerSession::open("p1", config(), bank(), store).unwrap()
    }

    #[test]
    fn test_answer_requires_question() {
        let mut session = open(MemoryStore::new());
        assert!(session.submit_answer(0).is_err());
        assert!(session.complete_game().is_err());
    }

    #[test]
    fn test_game_flow_updates_rating_and_persists() {
        let mut session = open(MemoryStore::new());
        for _ in 0..5 {
            let q = session.next_question().unwrap();
            let outcome = session.submit_answer(q.correct_answer()).unwrap();
            assert!(outcome.correct);
        }
        assert_eq!(session.game_progress(), (5, 5));

        let change = session.complete_game().unwrap();
        assert!(change.change > 0.0);
        assert_eq!(session.profile().games_played, 1);
        assert_eq!(session.profile().wins, 1);
        assert_eq!(session.game_progress(), (0, 0));

        let store = session.into_store();
        assert!(store.get("player:p1:rating").unwrap().is_some());
        assert!(store.get("player:p1:difficulty").unwrap().is_some());
        assert!(store.get("player:p1:pool").unwrap().is_some());
        assert!(store.get(ANALYTICS_KEY).unwrap().is_some());

        let reopened = open(store);
        assert_eq!(reopened.profile().games_played, 1);
        assert_eq!(reopened.difficulty_profile().performance_history.len(), 5);
        assert_eq!(reopened.analytics().total, 5);
        assert_eq!(reopened.questions_remaining(), 7);
    }

    #[test]
    fn test_out_of_range_answer_keeps_question() {
        let mut session = open(MemoryStore::new());
        session.next_question().unwrap();
        assert!(session.submit_answer(4).is_err());
        assert!(session.current_question().is_some());
        assert!(session.submit_answer(0).is_ok());
    }

    #[test]
    fn test_corrupt_state_falls_back_to_defaults() {
        let mut store = MemoryStore::new();
        store.set("player:p1:rating", json!("garbage")).unwrap();
        store
            .set("player:p1:difficulty", json!({"currentChallenge": "high"}))
            .unwrap();
        let session = open(store);
        assert_eq!(session.profile().current_rating, 1200.0);
        assert_eq!(session.difficulty_profile().current_challenge, 0.5);
    }

    #[test]
    fn test_baseline_seeds_rating_and_difficulty() {
        let mut session = open(MemoryStore::new());
        let interests = vec!["tech".to_string(), "finance".to_string()];
        let test = session.baseline_test(&interests, 2).unwrap();
        assert_eq!(test.len(), 4);
        let answers: Vec<Option<usize>> = test.iter().map(|q| Some(q.correct_answer())).collect();

        let result = session.complete_baseline(&test, &answers).unwrap();
        assert_eq!(result.overall_accuracy, 100.0);
        assert_eq!(result.recommended_difficulty, Difficulty::Hard);
        assert_eq!(session.profile().current_rating, 1600.0);
        assert_eq!(session.profile().category_rating("tech"), 1600.0);
        assert_eq!(session.recommended_difficulty(), Difficulty::Hard);
        assert!(session.profile().baseline.is_some());
    }

    #[test]
    fn test_skip_baseline_is_flat() {
        let mut session = open(MemoryStore::new());
        let result = session.skip_baseline(&["tech".to_string()]);
        assert!(result.skipped);
        assert_eq!(session.profile().current_rating, 1200.0);
        assert_eq!(session.recommended_difficulty(), Difficulty::Medium);
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> StoreResult<Option<Value>> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: Value) -> StoreResult<()> {
            Err(StoreError::Io(std::io::Error::other("disk full")))
        }

        fn remove(&mut self, _key: &str) -> StoreResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failures_do_not_interrupt_play() {
        let mut session = PlayerSession::open("p1", config(), bank(), FailingStore).unwrap();
        let q = session.next_question().unwrap();
        session.submit_answer(q.correct_answer()).unwrap();
        let change = session.complete_game().unwrap();
        assert_eq!(session.profile().current_rating, change.new_rating);
    }

    #[test]
    fn test_reset_difficulty() {
        let mut session = open(MemoryStore::new());
        let q = session.next_question().unwrap();
        session.submit_answer(q.correct_answer()).unwrap();
        session.reset_difficulty(Some(0.2));
        assert_eq!(session.difficulty_profile().current_challenge, 0.2);
        assert!(session.difficulty_profile().performance_history.is_empty());
    }

    #[test]
    fn test_empty_player_id_rejected() {
        assert!(PlayerSession::open(" ", config(), bank(), MemoryStore::new()).is_err());
    }

    #[test]
    fn test_stored_difficulty_with_bad_window_is_repaired() {
        let mut store = MemoryStore::new();
        store
            .set(
                "player:p1:difficulty",
                json!({
                    "userSkillLevel": 0.5,
                    "currentChallenge": 7.5,
                    "performanceHistory": { "capacity": 1u64 << 60, "items": [1.0] },
                    "optimalFlowZone": { "min": 0.0, "max": 1.0 },
                    "confidence": 0.5,
                    "adjustmentCount": 0,
                    "lastAdjustment": 0
                }),
            )
            .unwrap();
        let mut session = open(store);
        let profile = session.difficulty_profile();
        assert_eq!(profile.current_challenge, 1.0);
        assert_eq!(profile.performance_history.capacity(), 10);
        assert_eq!(profile.optimal_flow_zone.max, 0.8);

        let q = session.next_question().unwrap();
        let outcome = session.submit_answer(q.correct_answer()).unwrap();
        assert!(outcome.adjustment.confidence < 1.0);
        assert!(!session.flow_state().is_in_flow);
    }

    #[test]
    fn test_single_slot_window_is_widened() {
        let mut store = MemoryStore::new();
        store
            .set(
                "player:p1:difficulty",
                json!({
                    "userSkillLevel": 0.5,
                    "currentChallenge": 0.5,
                    "performanceHistory": { "capacity": 1, "items": [] },
                    "confidence": 0.0,
                    "adjustmentCount": 0,
                    "lastAdjustment": 0
                }),
            )
            .unwrap();
        let mut session = open(store);
        let q = session.next_question().unwrap();
        let outcome = session.submit_answer(q.correct_answer()).unwrap();
        assert!((outcome.adjustment.confidence - 0.73).abs() < 1e-9);
    }

    #[test]
    fn test_reset_pool_after_exhaustion() {
        let mut session = open(MemoryStore::new());
        for _ in 0..12 {
            session.next_question().unwrap();
        }
        assert_eq!(session.questions_remaining(), 0);

        session.reset_pool();
        assert_eq!(session.questions_remaining(), 12);
        let stored: PoolState = session.store().get_as("player:p1:pool").unwrap().unwrap();
        assert!(stored.used_question_ids.is_empty());
    }

    #[test]
    fn test_reset_analytics_persists_empty_tallies() {
        let mut session = open(MemoryStore::new());
        for _ in 0..3 {
            session.next_question().unwrap();
        }
        assert_eq!(session.analytics().total, 3);

        session.reset_analytics();
        assert_eq!(session.analytics().total, 0);
        let stored: PositionAnalytics = session.store().get_as(ANALYTICS_KEY).unwrap().unwrap();
        assert_eq!(stored.total, 0);
    }
}
