use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use microsteps::inference::config;
use microsteps::steps::{QuickDeck, StepSequence, TextLength, Tone};
use microsteps::storage::preferences::load_preferences;
use microsteps::storage::KeyValueStore;
use microsteps::{Companion, SqliteStore};

#[derive(Parser, Debug)]
#[command(
    name = "microsteps",
    version,
    about = "Turn a task you can't start into a few physical micro-steps"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Break a task into micro-steps
    Steps {
        /// What you are stuck on, e.g. "clean my desk"
        text: String,

        /// Override the stored tone preference
        #[arg(long, value_enum)]
        tone: Option<ToneArg>,

        /// Ask for shorter explanations
        #[arg(long)]
        short: bool,
    },
    /// Pick between two options
    Decide { option_a: String, option_b: String },
    /// Remove every cached step sequence
    ClearCache,
    /// Check and store an API key
    SetKey { key: String },
    /// Deal from the shuffled quick-action deck
    Deck {
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ToneArg {
    Quiet,
    Gentle,
}

impl From<ToneArg> for Tone {
    fn from(arg: ToneArg) -> Self {
        match arg {
            ToneArg::Quiet => Tone::Quiet,
            ToneArg::Gentle => Tone::Gentle,
        }
    }
}

fn print_steps(steps: &StepSequence) {
    for (i, step) in steps.into_iter().enumerate() {
        println!("{}. {} [{}]", i + 1, step.action, step.load);
        println!("   {}", step.why);
    }
}

/// Load config, open the store, and wire up the companion.
fn open_companion() -> Result<(Companion, Arc<dyn KeyValueStore>)> {
    let cwd = std::env::current_dir().context("cannot read current directory")?;
    let config = config::load_or_default(&cwd)?;

    let db_path = microsteps::resolve_db_path(config.store_path.as_deref());
    let store: Arc<dyn KeyValueStore> = Arc::new(
        SqliteStore::open(&db_path).with_context(|| format!("cannot open store at {db_path}"))?,
    );
    let companion = Companion::from_config(&config, store.clone())?;
    Ok((companion, store))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    microsteps::init_tracing();

    match cli.command {
        Command::Steps { text, tone, short } => {
            let (companion, store) = open_companion()?;
            let mut prefs = load_preferences(store.as_ref());
            if let Some(tone) = tone {
                prefs = prefs.with_tone(tone.into());
            }
            if short {
                prefs.text_length = TextLength::Short;
            }
            let outcome = companion.resolve_micro_steps(&text, &prefs).await;
            tracing::debug!(source = outcome.source.as_str(), "steps printed");
            print_steps(&outcome.steps);
        }
        Command::Decide { option_a, option_b } => {
            let (companion, _) = open_companion()?;
            let decision = companion.get_decision(&option_a, &option_b).await;
            println!("Do this: {}", decision.answer);
            println!("Why: {}", decision.reason);
            print_steps(&decision.steps);
        }
        Command::ClearCache => {
            let (companion, _) = open_companion()?;
            let count = companion.clear_cache();
            println!("Cleared {count} cached item(s).");
        }
        Command::SetKey { key } => {
            let (companion, _) = open_companion()?;
            companion
                .save_credential(&key)
                .context("API key was not saved")?;
            println!("API key saved.");
        }
        Command::Deck { count } => {
            // Purely local; no config or store needed.
            let mut deck = QuickDeck::shuffled(&mut rand::thread_rng());
            println!("{}", deck.current());
            for _ in 1..count.min(deck.len()) {
                println!("{}", deck.skip());
            }
        }
    }

    Ok(())
}
