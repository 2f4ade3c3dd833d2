mod playback;

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::Arc,
};

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use trivia_quiz_core::{
    AppConfig, AudioService, Category, FileStore, HttpAssetFetcher, HttpTriviaClient,
    KeyValueStore, MuteStore, QuizRoute, QuizSession, QuizStore, SoundEffect, SoundState,
    TriviaError, ANSWER_DISPLAY_DURATION,
};

use crate::playback::RodioBackend;

type Audio = AudioService<Arc<HttpAssetFetcher>, RodioBackend>;

#[tokio::main]
async fn main() -> trivia_quiz_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Play(args) => run_play(&config, args).await,
        Commands::Categories => run_categories(),
        Commands::Mute => run_mute(&config),
        Commands::Preload => run_preload(&config).await,
    }
}

fn load_config(cli: &Cli) -> trivia_quiz_core::Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(url) = &cli.assets_url {
        config.assets.base_url = url.clone();
    }
    if let Some(path) = &cli.storage {
        config.storage.path = path.clone();
    }
    Ok(config)
}

fn mute_store(config: &AppConfig) -> MuteStore {
    let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&config.storage.path));
    MuteStore::load(storage)
}

fn audio_service(config: &AppConfig, assets: Arc<HttpAssetFetcher>) -> Audio {
    AudioService::new(
        assets,
        RodioBackend,
        mute_store(config),
        config.assets.sounds_prefix.clone(),
    )
}

async fn run_play(config: &AppConfig, args: PlayArgs) -> trivia_quiz_core::Result<()> {
    let assets = Arc::new(HttpAssetFetcher::new(&config.assets));
    let audio = audio_service(config, assets.clone());
    audio.preload_sounds().await;

    let session = QuizSession::new(QuizStore::new(), HttpTriviaClient::new(&config.api), assets);
    let launch = match &args.route {
        Some(route) => session.launch(QuizRoute::parse(route)?),
        None => session.start_quiz(
            args.category.as_deref(),
            args.difficulty.as_deref(),
            args.questions,
        )?,
    };
    tracing::info!(path = %launch.path, "loading quiz");
    let category = launch.route.category;

    if let Err(err) = launch.load().await {
        if session.store().with(|state| state.questions.is_empty()) {
            return Err(err);
        }
        tracing::warn!(%err, "continuing without background image");
    }

    if session.store().current_question().is_none() {
        return Err(TriviaError::msg(
            "the trivia API returned no questions for this selection",
        ));
    }

    println!(
        "{} quiz - background {}",
        category,
        session.get_quiz_background_image(Some(category.key()))
    );

    let mut rng = rand::thread_rng();
    let stdin = io::stdin();
    loop {
        let Some(question) = session.store().current_question() else {
            break;
        };
        let number = session.store().with(|state| state.current_question_index) + 1;
        let total = session.store().with(|state| state.questions.len());

        println!();
        let text = question.question.as_deref().unwrap_or_default();
        println!("[{number}/{total}] {}", decode(text));
        let answers = question.shuffled_answers(&mut rng);
        for (index, answer) in answers.iter().enumerate() {
            println!("  {}) {}", index + 1, decode(answer));
        }

        let choice = read_choice(&mut stdin.lock(), answers.len())?;
        if session.handle_answer(&answers[choice]) {
            println!("Correct!");
            audio.play_sound_effect(SoundEffect::Correct).await;
        } else {
            println!("Wrong - the answer was {}", decode(&question.correct_answer));
            audio.play_sound_effect(SoundEffect::Incorrect).await;
        }
        tokio::time::sleep(ANSWER_DISPLAY_DURATION).await;

        if session.store().is_quiz_complete() || !session.advance() {
            break;
        }
    }

    audio.play_sound_effect(SoundEffect::QuizEndScreen).await;
    let state = session.store().get();
    println!();
    println!(
        "Final score: {}/{} ({:.0}%)",
        state.score,
        state.questions.len(),
        session.store().score_percentage()
    );
    tokio::time::sleep(ANSWER_DISPLAY_DURATION).await;
    session.reset_quiz();
    Ok(())
}

fn run_categories() -> trivia_quiz_core::Result<()> {
    for category in Category::ALL {
        println!(
            "{:<10} id {:>2}  {}",
            category.label(),
            category.id(),
            category.background_image()
        );
    }
    Ok(())
}

fn run_mute(config: &AppConfig) -> trivia_quiz_core::Result<()> {
    let muted = mute_store(config).toggle_mute()?;
    println!("sound {}", if muted { "muted" } else { "unmuted" });
    Ok(())
}

async fn run_preload(config: &AppConfig) -> trivia_quiz_core::Result<()> {
    let audio = audio_service(config, Arc::new(HttpAssetFetcher::new(&config.assets)));
    audio.preload_sounds().await;

    for effect in SoundEffect::ALL {
        let state = audio.sound_state(&audio.sound_url(effect));
        let label = match state {
            SoundState::Loaded => "ok",
            SoundState::LoadFailed => "failed",
            SoundState::Loading | SoundState::NotLoaded => "not loaded",
        };
        println!("{:<14} {label}", effect.name());
    }
    Ok(())
}

/// Reads a 1-based choice until the user enters a valid one.
fn read_choice(input: &mut impl BufRead, options: usize) -> trivia_quiz_core::Result<usize> {
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Err(TriviaError::msg("input closed before the quiz finished"));
        }
        match line.trim().parse::<usize>() {
            Ok(choice) if (1..=options).contains(&choice) => return Ok(choice - 1),
            _ => println!("enter a number between 1 and {options}"),
        }
    }
}

fn decode(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal trivia quiz", long_about = None)]
struct Cli {
    /// JSON configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Base URL of the server hosting images and sounds.
    #[arg(long, global = true)]
    assets_url: Option<String>,
    /// File holding persisted settings such as the mute flag.
    #[arg(long, global = true)]
    storage: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a quiz in the terminal.
    Play(PlayArgs),
    /// List the available categories.
    Categories,
    /// Toggle sound effects on or off.
    Mute,
    /// Load every sound effect and report which ones are available.
    Preload,
}

#[derive(Args, Debug)]
struct PlayArgs {
    /// Category name, e.g. film or geography.
    #[arg(long)]
    category: Option<String>,
    /// easy, medium or hard.
    #[arg(long)]
    difficulty: Option<String>,
    /// Number of questions: 5, 10 or 15.
    #[arg(long)]
    questions: Option<u32>,
    /// Quiz route such as `/quiz?category=11&difficulty=easy&questions=5`.
    #[arg(long, conflicts_with_all = ["category", "difficulty", "questions"])]
    route: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_choice_skips_invalid_lines() {
        let mut input = io::Cursor::new("x\n9\n2\n");
        assert_eq!(read_choice(&mut input, 4).unwrap(), 1);
    }

    #[test]
    fn read_choice_fails_on_eof() {
        let mut input = io::Cursor::new("");
        assert!(read_choice(&mut input, 4).is_err());
    }

    #[test]
    fn decodes_api_entities() {
        assert_eq!(decode("Who&#039;s &quot;Bond&quot;?"), "Who's \"Bond\"?");
    }

    #[test]
    fn cli_overrides_config() {
        let cli = Cli::parse_from([
            "trivia",
            "--assets-url",
            "http://assets.test",
            "play",
            "--category",
            "film",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.assets.base_url, "http://assets.test");
        assert!(matches!(cli.command, Commands::Play(_)));
    }
}
