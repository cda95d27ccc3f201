mod runner;
mod telemetry;

use std::fmt;

use backend::ApiConfig;
use quiz_core::model::{ArticleId, UserId};
use services::{AppServices, Clock};
use tracing::warn;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidArticleId { raw: String },
    MissingArticle,
    MissingCredentials,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidArticleId { raw } => write!(f, "invalid --article value: {raw}"),
            ArgsError::MissingArticle => write!(f, "--article is required for this command"),
            ArgsError::MissingCredentials => {
                write!(f, "--email and --password (or WELLNESS_EMAIL/WELLNESS_PASSWORD) are required")
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- take        --article <id> [--email <e>] [--password <p>] [--api <url>]");
    eprintln!("  cargo run -p app -- status      --article <id> [...]");
    eprintln!("  cargo run -p app -- progress    [...]");
    eprintln!("  cargo run -p app -- completions [...]");
    eprintln!("  cargo run -p app -- quizzes     [...]");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  WELLNESS_API_URL (default http://localhost:8080), WELLNESS_API_TIMEOUT_SECS");
    eprintln!("  WELLNESS_EMAIL, WELLNESS_PASSWORD");
    eprintln!("  WELLNESS_LOG (tracing filter), WELLNESS_LOG_FORMAT=json");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Take,
    Status,
    Progress,
    Completions,
    Quizzes,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "take" => Some(Self::Take),
            "status" => Some(Self::Status),
            "progress" => Some(Self::Progress),
            "completions" => Some(Self::Completions),
            "quizzes" => Some(Self::Quizzes),
            _ => None,
        }
    }

    fn needs_article(self) -> bool {
        matches!(self, Self::Take | Self::Status)
    }
}

struct Args {
    api: Option<String>,
    email: String,
    password: String,
    article: Option<ArticleId>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut api = None;
        let mut email = std::env::var("WELLNESS_EMAIL").ok();
        let mut password = std::env::var("WELLNESS_PASSWORD").ok();
        let mut article = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => api = Some(require_value(args, "--api")?),
                "--email" => email = Some(require_value(args, "--email")?),
                "--password" => password = Some(require_value(args, "--password")?),
                "--article" => {
                    let value = require_value(args, "--article")?;
                    let parsed = value
                        .parse::<ArticleId>()
                        .map_err(|_| ArgsError::InvalidArticleId { raw: value.clone() })?;
                    article = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let (Some(email), Some(password)) = (email, password) else {
            return Err(ArgsError::MissingCredentials);
        };
        Ok(Self {
            api,
            email,
            password,
            article,
        })
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    let (cmd, rest) = match argv.split_first() {
        None => {
            print_usage();
            return Ok(());
        }
        Some((first, _)) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        // Flags without a subcommand mean "take".
        Some((first, _)) if first.starts_with("--") => (Command::Take, argv.as_slice()),
        Some((first, rest)) => {
            let cmd = Command::from_arg(first).ok_or_else(|| {
                eprintln!("unknown subcommand: {first}");
                print_usage();
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
            })?;
            (cmd, rest)
        }
    };

    let args = Args::parse(&mut rest.iter().cloned())
        .and_then(|args| {
            if cmd.needs_article() && args.article.is_none() {
                Err(ArgsError::MissingArticle)
            } else {
                Ok(args)
            }
        })
        .map_err(|e| {
            eprintln!("{e}");
            print_usage();
            e
        })?;

    // Config is resolved here so backend/services never read the environment.
    let config = match &args.api {
        Some(url) => ApiConfig::new(url)?,
        None => ApiConfig::from_env()?,
    };
    let app = AppServices::http(&config, Clock::system())?;

    let user = app.auth().login(&args.email, &args.password).await?;
    let outcome = run_command(&app, cmd, user.user_id(), args.article).await;

    if let Err(e) = app.auth().logout().await {
        warn!(error = %e, "logout failed");
    }
    outcome
}

async fn run_command(
    app: &AppServices,
    cmd: Command,
    user_id: UserId,
    article: Option<ArticleId>,
) -> Result<(), Box<dyn std::error::Error>> {
    match (cmd, article) {
        (Command::Take, Some(article_id)) => runner::take_quiz(app, article_id).await,
        (Command::Status, Some(article_id)) => {
            let status = app.completions().check_completion(user_id, article_id).await;
            match status.completion {
                Some(done) => println!(
                    "completed on {} with {}",
                    done.completed_at.format("%Y-%m-%d %H:%M"),
                    done.score
                ),
                None => println!("not completed"),
            }
            Ok(())
        }
        (Command::Take | Command::Status, None) => Err(ArgsError::MissingArticle.into()),
        (Command::Progress, _) => {
            let summary = app.progress().summary(user_id).await?;
            println!("total points:      {}", summary.total_points);
            println!("  articles:        {}", summary.article_points);
            println!("  meditation:      {}", summary.meditation_points);
            println!("  feed:            {}", summary.feed_points);
            println!("streak:            {} day(s)", summary.streak_days);
            let done = |met: bool| if met { "done" } else { "open" };
            println!("today's article:   {}", done(summary.objectives.read_article));
            println!("today's meditation:{}", done(summary.objectives.meditated));
            println!("today's post:      {}", done(summary.objectives.posted_on_feed));
            Ok(())
        }
        (Command::Completions, _) => {
            let history = app.completions().user_completions(user_id).await?;
            if history.is_empty() {
                println!("no completed quizzes yet");
            }
            for done in history {
                println!(
                    "{}  article {:>5}  quiz {:>5}  {:>4}",
                    done.completed_at.format("%Y-%m-%d %H:%M"),
                    done.article_id,
                    done.quiz_id,
                    done.score
                );
            }
            Ok(())
        }
        (Command::Quizzes, _) => {
            for quiz in app.catalog().list_quizzes().await? {
                println!(
                    "{:>5}  article {:>5}  {} ({} questions)",
                    quiz.id(),
                    quiz.article_id(),
                    quiz.title(),
                    quiz.question_count()
                );
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    telemetry::init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
