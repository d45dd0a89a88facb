use std::fmt;

use chrono::{DateTime, Duration, Utc};
use storage::repository::{Storage, StorageError};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt as log_fmt, prelude::*};
use vocab_core::model::{UserId, UserSettings, ValidatedWord, WordDraft};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    user_id: UserId,
    daily_limit: Option<u32>,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUserId { raw: String },
    InvalidDbUrl { raw: String },
    InvalidDailyLimit { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user-id value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidDailyLimit { raw } => {
                write!(f, "invalid --daily-limit value: {raw}")
            }
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("VOCAB_DB_URL").unwrap_or_else(|_| "sqlite:vocab.sqlite3".into());
        let mut user_id = std::env::var("VOCAB_USER_ID")
            .ok()
            .and_then(|value| value.parse::<UserId>().ok())
            .unwrap_or_else(|| UserId::new(1));
        let mut daily_limit = None;
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--user-id" => {
                    let value = require_value(&mut args, "--user-id")?;
                    user_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidUserId { raw: value.clone() })?;
                }
                "--daily-limit" => {
                    let value = require_value(&mut args, "--daily-limit")?;
                    let parsed = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidDailyLimit { raw: value.clone() })?;
                    daily_limit = Some(parsed);
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user_id,
            daily_limit,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:vocab.sqlite3)");
    eprintln!("  --user-id <id>            User to create settings for (default: 1)");
    eprintln!("  --daily-limit <n>         Daily word limit for that user (default: 10)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  VOCAB_DB_URL, VOCAB_USER_ID");
}

const SAMPLES: [(&str, &str, &str, &str); 5] = [
    ("ephemeral", "lasting a very short time", "Fame is ephemeral.", "efimero"),
    ("ubiquitous", "present everywhere", "Phones are ubiquitous.", "ubicuo"),
    ("serendipity", "a happy accident", "We met by serendipity.", "serendipia"),
    ("meticulous", "very careful about detail", "She keeps meticulous notes.", "meticuloso"),
    ("resilient", "able to recover quickly", "Kids are resilient.", "resiliente"),
];

fn sample_words(now: DateTime<Utc>) -> Result<Vec<ValidatedWord>, vocab_core::Error> {
    SAMPLES
        .iter()
        .enumerate()
        .map(|(i, (text, definition, example, translation))| {
            // Distinct timestamps keep catalog order stable.
            let offset = Duration::seconds(i64::try_from(i).unwrap_or_default());
            WordDraft::new(*text, *definition)
                .with_example(*example)
                .with_translation(*translation)
                .validate(now + offset)
                .map_err(vocab_core::Error::from)
        })
        .collect()
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let mut inserted = 0_u32;
    for word in sample_words(now)? {
        match storage.words.add_word(&word, Some(args.user_id)).await {
            Ok(stored) => {
                info!(word_id = %stored.id, text = %stored.text, "seeded word");
                inserted += 1;
            }
            Err(StorageError::Conflict) => {
                warn!(text = %word.text, "word already present, skipping");
            }
            Err(err) => return Err(err.into()),
        }
    }

    let settings = match args.daily_limit {
        Some(limit) => UserSettings::default()
            .with_daily_word_limit(limit)
            .map_err(vocab_core::Error::from)?,
        None => UserSettings::default(),
    };
    storage.settings.save_settings(args.user_id, &settings).await?;

    println!(
        "Seeded {inserted} words and settings for user {} into {}",
        args.user_id, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(log_fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
