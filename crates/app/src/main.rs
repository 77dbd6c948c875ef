use std::fmt;
use std::io::{BufRead, Write as _};
use std::str::FromStr;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use exam_core::Clock;
use exam_core::model::{ExamPhase, ExamVariant, Question};
use services::exam::Verdict;
use services::{
    ExamAttempt, ExamLoopService, HttpBank, KvResultRecorder, ResultRecorder, SampleSpec,
    Sampler, SubmitConfirm, SubmitOutcome, UsageHistoryStore,
};
use storage::repository::{KvStore, QuestionBank};
use storage::{FsBank, SqliteKv};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidVariant { raw: String },
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidVariant { raw } => write!(f, "invalid --variant value: {raw}"),
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
    eprintln!("  cargo run -p app -- exam    [options]   # take an exam interactively");
    eprintln!("  cargo run -p app -- history [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Options for exam:");
    eprintln!("  --variant <preliminary|heat>   (default: preliminary)");
    eprintln!("  --name <participant>           (default: anonymous)");
    eprintln!("  --bank <dir or http(s) url>    (default: database)");
    eprintln!("  --db <sqlite_url>              (default: sqlite://exam.sqlite3)");
    eprintln!("  --per-category <n>             override questions per category");
    eprintln!("  --deterministic                natural id order, no shuffling");
    eprintln!("  --seed <n>                     seed the sampler rng");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_DB_URL, EXAM_BANK");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Exam,
    History,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "exam" => Some(Self::Exam),
            "history" => Some(Self::History),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    bank: String,
    variant: ExamVariant,
    name: String,
    per_category: Option<usize>,
    deterministic: bool,
    seed: Option<u64>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("EXAM_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://exam.sqlite3".into(), normalize_sqlite_url);
        let mut bank = std::env::var("EXAM_BANK").unwrap_or_else(|_| "database".into());
        let mut variant = ExamVariant::Preliminary;
        let mut name = String::from("anonymous");
        let mut per_category = None;
        let mut deterministic = false;
        let mut seed = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--bank" => bank = require_value(args, "--bank")?,
                "--variant" => {
                    let value = require_value(args, "--variant")?;
                    variant = ExamVariant::from_str(&value)
                        .map_err(|_| ArgsError::InvalidVariant { raw: value })?;
                }
                "--name" => name = require_value(args, "--name")?,
                "--per-category" => {
                    let value = require_value(args, "--per-category")?;
                    per_category = Some(value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--per-category",
                        raw: value.clone(),
                    })?);
                }
                "--deterministic" => deterministic = true,
                "--seed" => {
                    let value = require_value(args, "--seed")?;
                    seed = Some(value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--seed",
                        raw: value.clone(),
                    })?);
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
            bank,
            variant,
            name,
            per_category,
            deterministic,
            seed,
        })
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
    if db_url == "sqlite::memory:" {
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

fn open_bank(location: &str) -> Result<Arc<dyn QuestionBank>, Box<dyn std::error::Error>> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Arc::new(HttpBank::new(location)?))
    } else {
        Ok(Arc::new(FsBank::new(location)))
    }
}

/// Confirmation prompt on the terminal, mirroring the blocking
/// unanswered-questions dialog.
struct StdinConfirm;

impl SubmitConfirm for StdinConfirm {
    fn confirm_submit_with_unanswered(&self, unanswered: usize) -> bool {
        eprint!("{unanswered} question(s) unanswered. Submit anyway? [y/N] ");
        let _ = std::io::stderr().flush();
        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim(), "y" | "Y" | "yes")
    }
}

fn render_question(question: &Question, index: usize, total: usize) {
    println!();
    println!("[{}/{}] ({}) {}", index + 1, total, question.category, question.stem.en);
    if let Some(vi) = &question.stem.vi {
        println!("        {vi}");
    }
    for choice in &question.choices {
        println!("  {}. {}", choice.id, choice.en);
    }
    if question.is_free_text() {
        println!("  (type your answer)");
    }
    if !question.user_answer.is_empty() {
        println!("  current answer: {}", question.user_answer);
    }
}

fn print_result(result: &exam_core::model::ExamResult) {
    println!();
    println!("-- result -----------------------------");
    println!("  participant : {}", result.name());
    println!(
        "  correct     : {}/{}",
        result.correct_count(),
        result.total_count()
    );
    println!("  score       : {}", result.score());
    println!("  elapsed     : {}", result.elapsed_display());
    println!("---------------------------------------");
}

fn print_review(attempt: &ExamAttempt) -> Result<(), Box<dyn std::error::Error>> {
    let items = attempt.with_engine(|engine| {
        engine.enter_review();
        engine.review()
    })?;

    println!();
    println!("-- review -----------------------------");
    for (i, item) in items.iter().enumerate() {
        let mark = match item.verdict {
            Verdict::Correct => "ok",
            Verdict::Incorrect => "WRONG",
            Verdict::Unanswered => "blank",
            Verdict::Ungraded => "ungraded",
        };
        let expected = item.correct_key.as_deref().unwrap_or("-");
        println!(
            "  {:>2}. {:<10} [{mark}] answered '{}' expected '{expected}'",
            i + 1,
            item.question_id,
            item.chosen,
        );
    }
    println!("---------------------------------------");
    attempt.with_engine(|engine| engine.exit_review())?;
    Ok(())
}

async fn run_exam(
    service: &ExamLoopService,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut spec = SampleSpec::for_variant(args.variant);
    if let Some(per) = args.per_category {
        spec = spec.with_per_category(per);
    }
    if args.deterministic {
        spec = spec.deterministic();
    }

    println!("loading {} exam for {}...", args.variant, args.name);
    let mut attempt = match args.seed {
        Some(seed) => {
            let mut rng = StdRng::seed_from_u64(seed);
            service.start_with(&args.name, &spec, &mut rng).await?
        }
        None => service.start_with(&args.name, &spec, &mut rand::rng()).await?,
    };

    let (total, budget) =
        attempt.with_engine(|engine| (engine.questions().len(), engine.seconds_remaining()))?;
    println!(
        "{total} questions, {}:{:02} on the clock. Commands: a <answer>, n, p, t, s, q",
        budget / 60,
        budget % 60
    );
    service.start_countdown(&mut attempt);

    let stdin = std::io::stdin();
    loop {
        let done = attempt.with_engine(|engine| !engine.phase().is_answering())?;
        if done {
            break;
        }

        let left = attempt.with_engine(|engine| {
            render_question(engine.current_question(), engine.current_index(), total);
            engine.seconds_remaining()
        })?;
        print!("[{}:{:02}] > ", left / 60, left % 60);
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // stdin closed, abandon the attempt
        }
        // the countdown keeps running while we block on stdin; the
        // attempt may have auto-submitted before this input arrived
        if attempt.with_engine(|engine| !engine.phase().is_answering())? {
            println!("time expired, attempt was submitted automatically");
            break;
        }
        let line = line.trim();

        match line {
            "" => {}
            "n" => attempt.with_engine(|engine| engine.next())?,
            "p" => attempt.with_engine(|engine| engine.previous())?,
            "t" => {
                let left = attempt.with_engine(|engine| engine.seconds_remaining())?;
                println!("time remaining: {}:{:02}", left / 60, left % 60);
            }
            "s" => match service.submit(&mut attempt, &StdinConfirm).await? {
                SubmitOutcome::Submitted(result) => {
                    print_result(&result);
                    break;
                }
                SubmitOutcome::Declined => println!("submission cancelled"),
                SubmitOutcome::AlreadyFinished => break,
            },
            "q" => {
                println!("abandoning attempt, nothing recorded");
                service.dispose(&mut attempt);
                return Ok(());
            }
            other => {
                let answer = other.strip_prefix("a ").unwrap_or(other).to_string();
                attempt.with_engine(|engine| {
                    engine.set_answer(answer);
                    engine.next();
                })?;
            }
        }
    }

    // the countdown may have auto-submitted while we waited on stdin
    let phase = attempt.with_engine(|engine| engine.phase())?;
    if phase == ExamPhase::Finished {
        if let Some(result) = attempt.with_engine(|engine| engine.result().cloned())? {
            print_result(&result);
        }
        print_review(&attempt)?;
    }

    service.dispose(&mut attempt);
    Ok(())
}

async fn print_history(recorder: &dyn ResultRecorder) -> Result<(), Box<dyn std::error::Error>> {
    let results = recorder.list().await?;
    if results.is_empty() {
        println!("no recorded results");
        return Ok(());
    }

    println!("-- recent results (most recent first) --");
    for result in &results {
        println!(
            "  {}  {:<16} {:>3} pts  {}/{} correct  in {}",
            result.completed_at().format("%Y-%m-%d %H:%M"),
            result.name(),
            result.score(),
            result.correct_count(),
            result.total_count(),
            result.elapsed_display(),
        );
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Exam,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Exam,
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

    prepare_sqlite_file(&args.db_url)?;
    let kv: Arc<dyn KvStore> = Arc::new(SqliteKv::connect(&args.db_url).await?);
    let recorder: Arc<dyn ResultRecorder> = Arc::new(KvResultRecorder::new(Arc::clone(&kv)));

    match cmd {
        Command::Exam => {
            let bank = open_bank(&args.bank)?;
            let sampler = Sampler::new(bank, UsageHistoryStore::new(kv));
            let service = ExamLoopService::new(sampler, Arc::clone(&recorder))
                .with_clock(Clock::default());
            run_exam(&service, &args).await
        }
        Command::History => print_history(recorder.as_ref()).await,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "fatal");
        std::process::exit(1);
    }
}
