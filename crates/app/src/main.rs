use std::fmt;
use std::sync::Arc;

use finedu_core::model::GoalId;
use services::{Clock, DEFAULT_NAMESPACE, GoalsService};
use storage::SqliteKvStore;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => {
                write!(f, "invalid {flag} value: {raw}")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- stats    [--db <sqlite_url>] [--namespace <ns>]");
    eprintln!("  cargo run -p app -- new-goal --name <name> --target <amount>");
    eprintln!("                               [--description <text>] [--period <label>]");
    eprintln!("  cargo run -p app -- progress --goal <id> --amount <value>");
    eprintln!("  cargo run -p app -- reward   --points <n> [--goal <id>] [--amount <value>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:finedu.sqlite3");
    eprintln!("  --namespace {DEFAULT_NAMESPACE}");
    eprintln!("  --period Mês");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  FINEDU_DB_URL, FINEDU_NAMESPACE");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Stats,
    NewGoal,
    Progress,
    Reward,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "stats" => Some(Self::Stats),
            "new-goal" => Some(Self::NewGoal),
            "progress" => Some(Self::Progress),
            "reward" => Some(Self::Reward),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    namespace: String,
    name: Option<String>,
    description: String,
    period: String,
    goal: Option<GoalId>,
    target: Option<f64>,
    amount: f64,
    points: u32,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: std::env::var("FINEDU_DB_URL")
                .ok()
                .map_or_else(|| "sqlite://finedu.sqlite3".into(), normalize_sqlite_url),
            namespace: std::env::var("FINEDU_NAMESPACE")
                .unwrap_or_else(|_| DEFAULT_NAMESPACE.to_owned()),
            name: None,
            description: String::new(),
            period: "Mês".to_owned(),
            goal: None,
            target: None,
            amount: 0.0,
            points: 0,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--namespace" => parsed.namespace = require_value(args, "--namespace")?,
                "--name" => parsed.name = Some(require_value(args, "--name")?),
                "--description" => parsed.description = require_value(args, "--description")?,
                "--period" => parsed.period = require_value(args, "--period")?,
                "--goal" => {
                    let value = require_value(args, "--goal")?;
                    let id = value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--goal",
                        raw: value.clone(),
                    })?;
                    parsed.goal = Some(id);
                }
                "--target" => {
                    let value = require_value(args, "--target")?;
                    let target = value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--target",
                        raw: value.clone(),
                    })?;
                    parsed.target = Some(target);
                }
                "--amount" => {
                    let value = require_value(args, "--amount")?;
                    parsed.amount = value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--amount",
                        raw: value.clone(),
                    })?;
                }
                "--points" => {
                    let value = require_value(args, "--points")?;
                    parsed.points = value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--points",
                        raw: value.clone(),
                    })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" || db_url.contains("mode=memory") {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn print_snapshot(snapshot: &services::GoalsSnapshot) {
    println!(
        "achieved {}/{}  points {}  balance {:.2}",
        snapshot.achieved_count,
        snapshot.goals.len(),
        snapshot.total_points,
        snapshot.user_balance
    );
    for goal in &snapshot.goals {
        let marker = if goal.is_achieved() { "✓" } else { " " };
        println!(
            "{marker} [{}] {}  {:.2}/{:.2} ({})",
            goal.id(),
            goal.name(),
            goal.current_amount(),
            goal.target_amount(),
            goal.period()
        );
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Stats,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Stats,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let args = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite in the binary glue so core/services stay pure.
    prepare_sqlite_file(&args.db_url)?;
    let store = SqliteKvStore::open(&args.db_url).await?;

    let service = GoalsService::new(Clock::System, Arc::new(store.clone()));
    service.initialize(&args.namespace).await?;

    match cmd {
        Command::Stats => {}
        Command::NewGoal => {
            let name = args.name.ok_or(ArgsError::MissingFlag { flag: "--name" })?;
            let target = args
                .target
                .ok_or(ArgsError::MissingFlag { flag: "--target" })?;
            let goal = service
                .create_goal(&name, &args.description, target, &args.period)
                .await?;
            println!("created goal {}", goal.id());
        }
        Command::Progress => {
            let goal_id = args.goal.ok_or(ArgsError::MissingFlag { flag: "--goal" })?;
            match service.add_progress(goal_id, args.amount).await? {
                Some(goal) => println!(
                    "goal {} now at {:.2}/{:.2}",
                    goal.id(),
                    goal.current_amount(),
                    goal.target_amount()
                ),
                None => println!("no goal with id {goal_id}"),
            }
        }
        Command::Reward => {
            service
                .record_quiz_reward(args.goal, args.points, args.amount)
                .await?;
            println!("recorded reward of {} points", args.points);
        }
    }

    print_snapshot(&service.snapshot().await);
    store.close().await;
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
