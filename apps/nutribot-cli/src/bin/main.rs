use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nutribot_chat::{answer, Answer, FaqService};
use nutribot_core::config::Config;
use nutribot_core::loader::load_recipes;
use nutribot_core::RecipeSummary;
use nutribot_recommend::{recommend, PreferenceQuery};
use nutribot_text::LexicalIndex;

/// Recipe recommendations and nutrition Q&A
#[derive(Parser, Debug)]
#[command(name = "nutribot", version, about = "Recipe recommendations and nutrition Q&A")]
struct Cli {
    /// Directory holding config.toml; relative data paths resolve against it
    #[arg(long, value_name = "DIR", default_value = ".")]
    config_dir: PathBuf,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info", value_name = "LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recommend recipes matching nutrition preferences
    Recommend {
        /// Calorie band label, e.g. "Low (<400)" or "low"
        #[arg(long, default_value = "Any")]
        calories: String,
        /// Protein band label, e.g. "High (>30g)" or "high"
        #[arg(long, default_value = "Any")]
        protein: String,
        /// Dietary tag column (repeatable), e.g. --tag vegan --tag glutenFree
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
        /// Free-text keywords matched against recipe titles
        #[arg(long, default_value = "")]
        keywords: String,
        /// Maximum number of recipes (defaults to recommend.max_results)
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Answer a single nutrition question
    Ask {
        question: String,
        #[arg(long)]
        json: bool,
    },
    /// Interactive question loop; `quit` or `exit` leaves
    Chat,
}

fn setup_logging(log_level: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);
    let config = Config::load_from(&cli.config_dir)?;
    let settings = config.settings()?;

    match cli.command {
        Command::Recommend { calories, protein, tags, keywords, limit, json } => {
            let collection = load_recipes(&config.resolve(&settings.data.recipes_csv))?;
            let index = match LexicalIndex::build(&collection) {
                Ok(index) => Some(index),
                Err(e) => {
                    warn!(error = %e, "Lexical index unavailable");
                    None
                }
            };
            let query = PreferenceQuery::builder()
                .calorie_label(&calories)
                .protein_label(&protein)
                .tag_names(&tags)
                .keywords(keywords)
                .build();
            let results = recommend(&query, &collection, index.as_ref(), limit.unwrap_or(settings.recommend.max_results));
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print_recipes(&results);
            }
        }
        Command::Ask { question, json } => {
            let service = FaqService::from_config(&config)?;
            let reply = answer(&question, &service);
            if json {
                println!("{}", serde_json::to_string_pretty(&reply)?);
            } else {
                print_answer(&reply);
            }
        }
        Command::Chat => {
            let service = FaqService::from_config(&config)?;
            let stdin = io::stdin();
            let mut out = io::stdout();
            write!(out, "> ")?;
            out.flush()?;
            for line in stdin.lock().lines() {
                let line = line?;
                if matches!(line.trim(), "quit" | "exit") {
                    break;
                }
                print_answer(&answer(&line, &service));
                write!(out, "> ")?;
                out.flush()?;
            }
            service.teardown();
        }
    }
    Ok(())
}

fn print_recipes(results: &[RecipeSummary]) {
    if results.is_empty() {
        println!("No recipes match those preferences.");
        return;
    }
    println!("{:<48} {:>6} {:>9} {:>8} {:>6} {:>8}", "title", "rating", "calories", "protein", "fat", "sodium");
    for r in results {
        let rating = r.rating.map(|v| format!("{v:.2}")).unwrap_or_default();
        println!(
            "{:<48} {:>6} {:>9.0} {:>8.1} {:>6.1} {:>8.0}",
            truncate(&r.title, 48),
            rating,
            r.calories,
            r.protein,
            r.fat,
            r.sodium
        );
    }
}

fn print_answer(reply: &Answer) {
    match reply {
        Answer::Matched { question, score, .. } => println!("{}\n  (matched \"{}\", score {:.3})", reply.text(), question, score),
        _ => println!("{}", reply.text()),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(max - 1).collect();
        t.push('…');
        t
    }
}
