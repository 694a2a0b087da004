use tracing_subscriber::EnvFilter;

use trivia_engine::random::RandomSource;
use trivia_engine::store::{JsonFileStore, KeyValueStore, MemoryStore};
use trivia_engine::{Difficulty, EngineConfig, EngineResult, PlayerSession, Question};

const CATEGORIES: [&str; 3] = ["technology", "finance", "marketing"];
const QUESTIONS_PER_GAME: usize = 8;

struct SimSettings {
    player_id: String,
    games: usize,
    skill: f64,
    store_path: Option<String>,
}

impl SimSettings {
    fn from_env() -> Self {
        Self {
            player_id: std::env::var("TRIVIA_SIM_PLAYER")
                .unwrap_or_else(|_| "sim-player".to_string()),
            games: std::env::var("TRIVIA_SIM_GAMES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            skill: std::env::var("TRIVIA_SIM_SKILL")
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|s| (0.0..=1.0).contains(s))
                .unwrap_or(0.7),
            store_path: std::env::var("TRIVIA_STORE_PATH").ok(),
        }
    }
}

fn synthetic_bank() -> Vec<Question> {
    let terms = [
        ("Synergy", "Combined effort exceeding the sum of parts"),
        ("Runway", "Months of cash left at the current burn"),
        ("Pivot", "A fundamental change of business direction"),
        ("Churn", "Rate at which customers stop paying"),
        ("Moat", "Durable competitive advantage"),
        ("Bandwidth", "Capacity to take on more work"),
    ];
    let difficulties = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    let mut bank = Vec::new();
    for category in CATEGORIES {
        for difficulty in difficulties {
            for (i, (buzzword, definition)) in terms.iter().enumerate() {
                let mut options: Vec<String> = terms
                    .iter()
                    .cycle()
                    .skip(i + 1)
                    .take(3)
                    .map(|(_, d)| d.to_string())
                    .collect();
                let correct_answer = i % 4;
                options.insert(correct_answer, definition.to_string());
                bank.push(Question {
                    id: format!("{}-{}-{}", category, difficulty.as_str(), i),
                    category: category.to_string(),
                    difficulty,
                    buzzword: buzzword.to_string(),
                    definition: definition.to_string(),
                    options,
                    correct_answer,
                });
            }
        }
    }
    bank
}

fn answer_for(
    question: &trivia_engine::RandomizedQuestion,
    skill: f64,
    rng: &mut RandomSource,
) -> usize {
    let chance = match question.question.difficulty {
        Difficulty::Easy => skill + 0.15,
        Difficulty::Medium => skill,
        Difficulty::Hard => skill - 0.15,
    };
    if rng.next_f64() < chance {
        question.correct_answer()
    } else {
        (question.correct_answer() + 1 + rng.below(3)) % question.question.options.len()
    }
}

fn run<S: KeyValueStore>(
    settings: &SimSettings,
    config: EngineConfig,
    store: S,
) -> EngineResult<()> {
    let mut rng = RandomSource::from_seed(config.randomization.seed);
    let mut session =
        PlayerSession::open(settings.player_id.clone(), config, synthetic_bank(), store)?;
    let interests: Vec<String> = CATEGORIES.iter().map(|c| c.to_string()).collect();

    if session.profile().baseline.is_none() {
        let test = session.baseline_test(&interests, 3)?;
        let answers: Vec<Option<usize>> = test
            .iter()
            .map(|q| Some(answer_for(q, settings.skill, &mut rng)))
            .collect();
        let baseline = session.complete_baseline(&test, &answers)?;
        tracing::info!(
            accuracy = baseline.overall_accuracy,
            difficulty = baseline.recommended_difficulty.as_str(),
            rating = session.profile().current_rating,
            "baseline complete"
        );
    }

    for game in 1..=settings.games {
        for _ in 0..QUESTIONS_PER_GAME {
            let question = session.next_question()?;
            let answer = answer_for(&question, settings.skill, &mut rng);
            session.submit_answer(answer)?;
        }
        let change = session.complete_game()?;
        let flow = session.flow_state();
        tracing::info!(
            game,
            rating = change.new_rating,
            lp = %change.display.lp_gain_label(),
            rank = %change.display.current_rank.name(),
            difficulty = session.recommended_difficulty().as_str(),
            flow_score = flow.flow_score,
            in_flow = flow.is_in_flow,
            "game finished"
        );
    }

    let rank_view = session.rank_display();
    tracing::info!(
        player_id = %session.player_id(),
        rating = session.profile().current_rating,
        peak = session.profile().peak_rating,
        win_rate = session.profile().win_rate(),
        rank = %rank_view.current_rank.name(),
        lp = rank_view.current_lp,
        positions_balanced = session.validate_randomization(),
        "simulation finished"
    );
    Ok(())
}

fn main() {
    let _ = dotenvy::dotenv();
    let config = EngineConfig::from_env();
    let settings = SimSettings::from_env();

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let result = match &settings.store_path {
        Some(path) => match JsonFileStore::open(path) {
            Ok(store) => run(&settings, config, store),
            Err(e) => Err(e.into()),
        },
        None => run(&settings, config, MemoryStore::new()),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "simulation failed");
        std::process::exit(1);
    }
}
