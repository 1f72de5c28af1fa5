use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use quizdeck::app::App;
use quizdeck::config::Config;
use quizdeck::engine::selection::SelectionMode;
use quizdeck::engine::stats::Stats;
use quizdeck::model::{Question, Response};
use quizdeck::session::outcome::AnswerOutcome;
use quizdeck::store::schema::{ExportData, QuestionImport};

#[derive(Parser)]
#[command(name = "quizdeck", version, about = "Adaptive exam-question drilling")]
struct Cli {
    #[arg(short, long, help = "Data directory (overrides config)")]
    data_dir: Option<PathBuf>,

    #[arg(long, help = "Seed for question selection")]
    seed: Option<u64>,

    #[arg(short, long, help = "Draw only from the mistake deck")]
    mistakes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pick the next question to study
    Next,
    /// Show one question by id
    Show { id: String },
    /// Answer a question: letters for choice, true/false for judge, right/wrong for essays
    Answer { id: String, response: String },
    /// Pin or unpin a question in the mistake deck
    Pin { id: String },
    /// List the mistake deck
    Mistakes,
    /// Show progress statistics
    Stats {
        #[arg(long, help = "How many of the hardest questions to list")]
        top: Option<usize>,
        #[arg(long, help = "Print as JSON")]
        json: bool,
    },
    /// Add questions from a JSON file (a list or a bank file)
    Add { file: PathBuf },
    /// Remove a question from the bank; its history is kept
    Remove { id: String },
    /// Discard all progress
    Reset {
        #[arg(long, help = "Confirm that history should be discarded")]
        yes: bool,
    },
    /// Write questions, progress and config to one file
    Export { file: PathBuf },
    /// Replace questions and progress from an export file
    Import { file: PathBuf },
    /// Write a default config file if there is none and print its path
    InitConfig,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|e| {
        log::warn!("Using default config: {e:#}");
        Config::default()
    });
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir.to_string_lossy().to_string();
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if let Command::Stats { top: Some(top), .. } = cli.command {
        config.hardest_limit = top;
        config.validate();
    }

    if let Command::InitConfig = cli.command {
        let path = Config::config_path();
        if !path.exists() {
            config.save()?;
        }
        println!("{}", path.display());
        return Ok(());
    }

    let mut app = App::new(config);
    if cli.mistakes {
        app.set_mode(SelectionMode::MistakesOnly);
    }

    let mode = app.mode;
    match cli.command {
        Command::Next => match app.next_question() {
            Some(question) => print_question(question),
            None if mode == SelectionMode::MistakesOnly => println!("Mistake deck is empty."),
            None => println!("No questions yet. Add some with `quizdeck add <file>`."),
        },
        Command::Show { id } => print_question(app.review(&id)?),
        Command::Answer { id, response } => {
            let question = app
                .question(&id)
                .with_context(|| format!("no question with id {id}"))?;
            let response = Response::parse(question.question_type(), &response)?;
            let outcome = app.answer(&id, &response)?;
            print_outcome(&outcome);
        }
        Command::Pin { id } => {
            if app.toggle_pin(&id) {
                println!("Pinned {id} to the mistake deck.");
            } else {
                println!("Unpinned {id}.");
            }
        }
        Command::Mistakes => {
            let mistakes = app.mistakes();
            if mistakes.is_empty() {
                println!("Mistake deck is empty.");
            }
            for question in mistakes {
                let pin = if app.progress.is_pinned(&question.id) { " [pinned]" } else { "" };
                println!("{}{pin}  {}", question.id, question.content);
            }
        }
        Command::Stats { json, .. } => {
            let stats = app.stats();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_stats(&stats);
            }
        }
        Command::Add { file } => {
            let content = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let incoming: QuestionImport = serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", file.display()))?;
            let added = app.add_questions(incoming.into_questions())?;
            println!("Added {added} questions ({} total).", app.questions.len());
        }
        Command::Remove { id } => {
            let removed = app.delete_question(&id)?;
            println!("Removed {}.", removed.id);
        }
        Command::Reset { yes } => {
            if !yes {
                bail!("Reset discards all history; run again with --yes to confirm");
            }
            app.reset_progress();
            println!("Progress reset.");
        }
        Command::Export { file } => {
            let store = app.store.as_ref().context("no data directory available")?;
            let export = store.export_all(&app.config);
            fs::write(&file, serde_json::to_string_pretty(&export)?)
                .with_context(|| format!("writing {}", file.display()))?;
            println!("Exported to {}.", file.display());
        }
        Command::Import { file } => {
            let store = app.store.as_ref().context("no data directory available")?;
            let content = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let export: ExportData = serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", file.display()))?;
            store.import_all(&export)?;
            println!(
                "Imported {} questions from {}.",
                export.questions.questions.len(),
                file.display()
            );
        }
        Command::InitConfig => {}
    }

    Ok(())
}

fn print_question(question: &Question) {
    println!("[{}] {} ({})", question.id, question.content, question.question_type());
    for (letter, option) in question.lettered_options() {
        println!("  {letter}. {option}");
    }
}

fn print_outcome(outcome: &AnswerOutcome) {
    if outcome.correct {
        println!("Correct! Streak: {}", outcome.streak);
    } else {
        println!("Wrong. Expected: {}", outcome.expected);
    }
    if outcome.still_in_mistakes {
        println!("{} stays in the mistake deck.", outcome.question_id);
    }
}

fn print_stats(stats: &Stats) {
    println!("Questions:        {}", stats.total_questions);
    println!("Mastery:          {}%", stats.mastery_percent);
    println!("Coverage:         {}%", stats.coverage_percent);
    println!("First-try:        {}%", stats.first_try_percent);
    println!(
        "Answered:         {} ({} correct, {}%)",
        stats.total_answered, stats.correct_count, stats.overall_accuracy
    );
    println!("Streak:           {} (best {})", stats.streak, stats.best_streak);
    println!("Mistake deck:     {}", stats.mistake_count);
    for t in &stats.type_accuracy {
        if t.total > 0 {
            println!("  {:<8} {}% of {} attempts", t.question_type.as_str(), t.percent, t.total);
        }
    }
    if !stats.hardest.is_empty() {
        println!("Hardest:");
        for h in &stats.hardest {
            println!("  {} ({} misses)  {}", h.id, h.failure_count, h.content);
        }
    }
}
