//! Command line front end for the Bayesian classifier
//!
//! # Usage
//!
//! ```bash
//! # Train on a few messages
//! bayes-rs learn --spam spam/*.eml
//! bayes-rs learn --ham inbox/*.eml
//!
//! # Score a message
//! bayes-rs scan new.eml --format long
//!
//! # Undo a training mistake
//! bayes-rs forget inbox/0042.eml
//!
//! # Corpus totals
//! bayes-rs stats --db /var/lib/bayes/db.json
//! ```

use anyhow::Context;
use bayes_rs::config::Config;
use bayes_rs::message::{parse_rfc822, MessageView};
use bayes_rs::spam::{bayes_rules, render_token_list, BayesClassifier, ListFormat, ScanOutcome};
use bayes_rs::store::{MemoryStore, TokenStore};
use clap::{ArgGroup, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Snapshot used when neither the command line nor the config names one
const DEFAULT_DB: &str = "bayes.json";

#[derive(Parser)]
#[command(name = "bayes-rs")]
#[command(about = "Bayesian spam classifier", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Token store snapshot, overrides the configured path
    #[arg(short, long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Learn messages as spam or ham
    #[command(group(ArgGroup::new("class").required(true).args(["spam", "ham"])))]
    Learn {
        #[arg(long)]
        spam: bool,
        #[arg(long)]
        ham: bool,
        /// Message files (RFC 5322)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Forget previously learned messages
    Forget {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Score messages
    Scan {
        /// Token list layout: short, compact, medium or long
        #[arg(long, default_value = "compact")]
        format: ListFormat,
        /// Tokens shown per list
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Show corpus totals
    Stats,
    /// Show the tokens of a message
    Tokens { file: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::default(),
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let db = cli
        .db
        .clone()
        .or_else(|| config.store.path.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB));
    info!("Using token store {}", db.display());

    let store = MemoryStore::open(&db)
        .with_context(|| format!("opening token store {}", db.display()))?;
    let mut classifier = BayesClassifier::new(config.bayes.clone(), store)?;

    match cli.command {
        Commands::Learn { spam, files, .. } => {
            for file in &files {
                let message = read_message(file)?;
                let outcome = classifier.learn(&message, spam)?;
                println!("{}: {:?}", file.display(), outcome);
            }
        }
        Commands::Forget { files } => {
            for file in &files {
                let message = read_message(file)?;
                let outcome = classifier.forget(&message)?;
                println!("{}: {:?}", file.display(), outcome);
            }
        }
        Commands::Scan {
            format,
            limit,
            files,
        } => {
            for file in &files {
                let message = read_message(file)?;
                match classifier.scan(&message)? {
                    ScanOutcome::Scored(result) => {
                        let now = chrono::Utc::now().timestamp();
                        println!(
                            "{}: score {:.4} [{}]",
                            file.display(),
                            result.score,
                            bayes_rules(result.score).join(" ")
                        );
                        for (tag, value) in result.tags() {
                            println!("  {}={}", tag, value);
                        }
                        let model = classifier.model();
                        println!(
                            "  hammy: {}",
                            render_token_list(&result.hammy, limit, format, model, result.corpus, now)
                        );
                        println!(
                            "  spammy: {}",
                            render_token_list(&result.spammy, limit, format, model, result.corpus, now)
                        );
                    }
                    ScanOutcome::Skipped(reason) => {
                        println!("{}: skipped ({:?})", file.display(), reason);
                    }
                }
            }
        }
        Commands::Stats => {
            let store = classifier.store();
            let corpus = store.corpus_counts()?;
            println!("spam messages: {}", corpus.spam_count);
            println!("ham messages:  {}", corpus.ham_count);
            println!("tokens:        {}", store.token_count());
        }
        Commands::Tokens { file } => {
            let message = read_message(&file)?;
            for (token, text) in classifier.tokenizer().tokenize(&message) {
                println!("{} {}", token, text);
            }
        }
    }

    Ok(())
}

fn read_message(path: &Path) -> anyhow::Result<MessageView> {
    let raw = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    match parse_rfc822(&raw) {
        Ok(message) => Ok(message),
        Err(e) => {
            warn!("Failed to parse {}: {}", path.display(), e);
            Err(e.into())
        }
    }
}
