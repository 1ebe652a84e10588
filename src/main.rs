use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use eartrain::{
    AudioEngine, Difficulty, EarError, EngineConfig, GameMode, GameStats, NoteOctave, QuizEngine, QuizSession,
    Scheduled, SessionStep, SoundSource, plan, plan_length, play_arpeggio_for, play_audio_for,
};

#[derive(Parser)]
#[command(name = "eartrain")]
#[command(about = "Ear-training quiz in the terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print generated questions as JSON, one per line
    Question {
        #[arg(short, long, default_value = "intervals")]
        mode: GameMode,

        #[arg(short, long, default_value = "easy")]
        difficulty: Difficulty,

        /// Number of questions
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,

        /// Seed for reproducible output
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Play a quiz session, answering on stdin
    Quiz {
        #[arg(short, long, default_value = "intervals")]
        mode: GameMode,

        #[arg(short, long, default_value = "easy")]
        difficulty: Difficulty,

        /// Questions in the session
        #[arg(short = 'n', long, default_value_t = 10)]
        questions: u32,

        #[arg(short, long)]
        seed: Option<u64>,

        /// Engine config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Sound override, a waveform or an instrument name
        #[arg(long)]
        sound: Option<SoundSource>,

        /// Lifetime stats file, created if missing
        #[arg(long)]
        stats: Option<PathBuf>,

        /// Do not open an audio device
        #[arg(long)]
        silent: bool,
    },

    /// Show a note's frequency and piano key
    Note {
        /// Note name such as A4, C#3 or Bb2
        note: NoteOctave,

        /// Play it for this many seconds
        #[arg(short, long)]
        play: Option<f64>,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Question { mode, difficulty, count, seed } => print_questions(mode, difficulty, count, seed),
        Commands::Quiz { mode, difficulty, questions, seed, config, sound, stats, silent } => {
            match load_config(config.as_deref()) {
                Ok(mut config) => {
                    if let Some(sound) = sound {
                        config.sound = sound;
                    }
                    run_quiz(QuizOptions { mode, difficulty, questions, seed, config, stats, silent }).await
                }
                Err(e) => Err(e),
            }
        }
        Commands::Note { note, play, config } => match load_config(config.as_deref()) {
            Ok(config) => show_note(note, play, config).await,
            Err(e) => Err(e),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn quiz_engine(seed: Option<u64>) -> QuizEngine {
    match seed {
        Some(seed) => QuizEngine::with_seed(seed),
        None => QuizEngine::new(fastrand::Rng::new()),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, EarError> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let config = EngineConfig::load(path)?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

fn print_questions(mode: GameMode, difficulty: Difficulty, count: u32, seed: Option<u64>) -> Result<(), EarError> {
    let mut quiz = quiz_engine(seed);
    for _ in 0..count {
        let question = quiz.generate_question(mode, difficulty)?;
        let json = serde_json::to_string(&question).map_err(|e| EarError::ParseError(e.to_string()))?;
        println!("{}", json);
    }
    Ok(())
}

async fn show_note(note: NoteOctave, play: Option<f64>, config: EngineConfig) -> Result<(), EarError> {
    println!("{}: {:.2} Hz, piano key {}", note, note.frequency(), note.piano_key());

    let Some(seconds) = play else {
        return Ok(());
    };
    let mut engine = AudioEngine::new(config);
    engine.initialize().await?;
    let scheduled = engine.play_note(note.frequency(), seconds, 0.0)?;
    wait_for(&engine, &scheduled);
    engine.close();
    Ok(())
}

fn wait_for(engine: &AudioEngine, scheduled: &Scheduled) {
    while !engine.is_finished(scheduled) {
        std::thread::sleep(Duration::from_millis(50));
    }
}

struct QuizOptions {
    mode: GameMode,
    difficulty: Difficulty,
    questions: u32,
    seed: Option<u64>,
    config: EngineConfig,
    stats: Option<PathBuf>,
    silent: bool,
}

enum Input {
    Answer(String),
    Replay,
    Arpeggio,
    Skip,
    Quit,
}

fn read_input(options: &[String]) -> Result<Input, EarError> {
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush().map_err(|e| EarError::FileError(e.to_string()))?;

        let mut line = String::new();
        let read = stdin.lock().read_line(&mut line).map_err(|e| EarError::FileError(e.to_string()))?;
        if read == 0 {
            return Ok(Input::Quit);
        }

        let line = line.trim();
        match line {
            "r" => return Ok(Input::Replay),
            "a" => return Ok(Input::Arpeggio),
            "s" => return Ok(Input::Skip),
            "q" => return Ok(Input::Quit),
            _ => {}
        }
        if let Ok(n) = line.parse::<usize>() {
            if let Some(option) = n.checked_sub(1).and_then(|i| options.get(i)) {
                return Ok(Input::Answer(option.clone()));
            }
        }
        if let Some(option) = options.iter().find(|o| o.eq_ignore_ascii_case(line)) {
            return Ok(Input::Answer(option.clone()));
        }
        println!("Pick 1-{}, or r to replay, a to arpeggiate, s to skip, q to quit", options.len());
    }
}

fn wait_for_enter() -> Result<(), EarError> {
    print!("Press Enter for the next question");
    io::stdout().flush().map_err(|e| EarError::FileError(e.to_string()))?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).map_err(|e| EarError::FileError(e.to_string()))?;
    Ok(())
}

async fn run_quiz(opts: QuizOptions) -> Result<(), EarError> {
    let mut stats = match &opts.stats {
        Some(path) => GameStats::load_or_default(path),
        None => GameStats::default(),
    };

    let mut engine = if opts.silent {
        None
    } else {
        let mut engine = AudioEngine::new(opts.config);
        engine.initialize().await?;
        Some(engine)
    };

    let mut session = QuizSession::start(quiz_engine(opts.seed), opts.mode, opts.difficulty, opts.questions)?;
    println!("{} {} quiz, {} questions", opts.difficulty, opts.mode, opts.questions);

    let summary = loop {
        let question = session.current_question().clone();
        println!();
        let length = plan_length(&plan(&question.audio_data)?);
        println!("Question {} ({:.1}s)", session.question_index() + 1, length);
        for (i, option) in question.options.iter().enumerate() {
            println!("  {}. {}", i + 1, option);
        }
        if let Some(engine) = engine.as_mut() {
            play_audio_for(engine, &question.audio_data)?;
        }

        let answered = loop {
            match read_input(&question.options)? {
                Input::Answer(answer) => {
                    let outcome = session.submit_answer(&answer)?;
                    stats.apply(&outcome.stat_update);
                    if outcome.correct {
                        println!("Correct! Score {}, streak {}", outcome.score, session.current_streak());
                    } else {
                        println!("Wrong, it was {}. Score {}", outcome.correct_answer, outcome.score);
                    }
                    match outcome.auto_advance {
                        Some(delay) => std::thread::sleep(delay),
                        None => wait_for_enter()?,
                    }
                    break true;
                }
                input @ (Input::Replay | Input::Arpeggio) => {
                    let Some(engine) = engine.as_mut() else {
                        warn!("Running silent, nothing to replay");
                        continue;
                    };
                    engine.stop_all_playback()?;
                    if let Input::Arpeggio = input {
                        play_arpeggio_for(engine, &question.audio_data)?;
                    } else {
                        play_audio_for(engine, &question.audio_data)?;
                    }
                }
                Input::Skip => break true,
                Input::Quit => break false,
            }
        };

        if let Some(engine) = engine.as_mut() {
            engine.stop_all_playback()?;
        }
        if !answered {
            break session.summary();
        }
        match session.next_question()? {
            SessionStep::Question(_) => {}
            SessionStep::Complete(summary) => {
                stats.record_game_played();
                break summary;
            }
        }
    };

    println!();
    println!(
        "Final score {}: {}/{} correct ({}%), best streak {}",
        summary.score, summary.correct_answers, summary.total_questions, summary.accuracy, summary.best_streak
    );

    if let Some(path) = &opts.stats {
        stats.save(path)?;
        info!("Saved stats to {}", path.display());
    }
    if let Some(mut engine) = engine {
        engine.close();
    }
    Ok(())
}
