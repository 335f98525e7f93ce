//! CLI entry point for `stmtscan`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};

use stmtscan::classify::aggregate::aggregate;
use stmtscan::classify::category::categorize;
use stmtscan::config::{self, Config};
use stmtscan::model::statement::{StatementKey, StatementRecord};
use stmtscan::model::transaction::Transaction;
use stmtscan::parser::decode::{PdfTextExtractor, TextExtractor};
use stmtscan::parser::transaction::extract_transactions;
use stmtscan::source::local::LocalSource;
use stmtscan::source::MessageSource;
use stmtscan::statement::pipeline::{ParseOutcome, StatementParser};
use stmtscan::store::{JsonFileStore, StatementStore};

#[derive(Parser)]
#[command(
    name = "stmtscan",
    version,
    about = "Extract and categorize credit card transactions from statement emails"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Owning user id (overrides config)
    #[arg(short, long, global = true, env = "STMTSCAN_USER")]
    user: Option<String>,

    /// Statement store file (defaults to <data_dir>/statements.json)
    #[arg(long, global = true, value_name = "FILE")]
    store: Option<PathBuf>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse statement emails and store the results
    Parse {
        /// Message ids to parse. Without ids, the newest matches of the query are parsed.
        ids: Vec<String>,
        /// Message directory
        #[arg(short, long, value_name = "DIR")]
        source: Option<PathBuf>,
        /// Subject search used when no ids are given
        #[arg(short, long)]
        query: Option<String>,
        /// Maximum number of messages to parse when searching (default: newest only)
        #[arg(short = 'n', long)]
        max_results: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// List statement emails in a message directory
    List {
        #[arg(short, long, value_name = "DIR")]
        source: Option<PathBuf>,
        #[arg(short, long)]
        query: Option<String>,
        #[arg(short = 'n', long)]
        max_results: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Extract transactions from a text or PDF file without storing anything
    Extract {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Show stored statements
    Show {
        /// Only this email id
        email_id: Option<String>,
        #[arg(short, long, value_enum, default_value_t = ShowFormat::Text)]
        format: ShowFormat,
        /// Write to a file (csv) or directory (text) instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ShowFormat {
    Text,
    Csv,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    let user_id = cli
        .user
        .clone()
        .unwrap_or_else(|| config.general.user_id.clone());
    let store_path = cli
        .store
        .clone()
        .unwrap_or_else(|| config::data_dir(&config).join(stmtscan::store::json::STORE_FILE_NAME));

    match cli.command {
        Commands::Parse {
            ids,
            source,
            query,
            max_results,
            json,
        } => {
            let source = open_source(source, &config)?;
            let ids = if ids.is_empty() {
                let query = query.unwrap_or_else(|| config.source.query.clone());
                let max = max_results.unwrap_or(config.source.parse_max_results);
                source.list_messages(&query, max)?
            } else {
                ids
            };
            let mut store = JsonFileStore::new(store_path);
            cmd_parse(&source, &mut store, &ids, &user_id, &config, json)
        }
        Commands::List {
            source,
            query,
            max_results,
            json,
        } => {
            let source = open_source(source, &config)?;
            let query = query.unwrap_or_else(|| config.source.query.clone());
            let max = max_results.unwrap_or(config.source.max_results);
            cmd_list(&source, &query, max, json)
        }
        Commands::Extract { path, json } => cmd_extract(&path, json),
        Commands::Show {
            email_id,
            format,
            output,
        } => {
            let store = JsonFileStore::new(store_path);
            cmd_show(&store, &user_id, email_id.as_deref(), format, output.as_deref())
        }
        Commands::Init { force } => cmd_init(force),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    // Try to set up file logging
    let log_dir = config::data_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "stmtscan.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

fn open_source(dir: Option<PathBuf>, config: &Config) -> anyhow::Result<LocalSource> {
    let dir = dir.or_else(|| config.source.dir.clone()).ok_or_else(|| {
        anyhow::anyhow!("No message directory given (use --source or set source.dir in the config)")
    })?;
    Ok(LocalSource::open(&dir)?)
}

/// Write the built-in defaults to the config file location.
fn cmd_init(force: bool) -> anyhow::Result<()> {
    if let Some(path) = config::config_file_path() {
        if path.exists() && !force {
            anyhow::bail!(
                "Config file already exists: {} (use --force to overwrite)",
                path.display()
            );
        }
    }
    let path = config::save_config(&Config::default())?;
    println!("  Wrote {}", path.display());
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "stmtscan", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

/// Parse each message, store successes and print one line per message.
fn cmd_parse(
    source: &dyn MessageSource,
    store: &mut dyn StatementStore,
    ids: &[String],
    user_id: &str,
    config: &Config,
    json: bool,
) -> anyhow::Result<()> {
    let parser = StatementParser::new().with_strategies(config.extraction.strategies.clone());
    let start = Instant::now();

    let mut results = Vec::with_capacity(ids.len());
    let mut failures = 0usize;
    for id in ids {
        let outcome = parser.parse_and_store(source, store, id, user_id);
        if !matches!(outcome, ParseOutcome::Parsed(_)) {
            failures += 1;
        }
        results.push((id.as_str(), outcome));
    }
    let elapsed = start.elapsed();

    if json {
        let items: Vec<serde_json::Value> = results
            .iter()
            .map(|(id, outcome)| match outcome {
                ParseOutcome::Parsed(record) => serde_json::json!({
                    "email_id": id,
                    "status": "parsed",
                    "summary": record.summary(),
                }),
                ParseOutcome::Unavailable { reason, .. } => serde_json::json!({
                    "email_id": id,
                    "status": "unavailable",
                    "error": reason,
                }),
                ParseOutcome::Failed(e) => serde_json::json!({
                    "email_id": id,
                    "status": "failed",
                    "error": e.to_string(),
                }),
            })
            .collect();
        let output = serde_json::json!({
            "parsed": results.len() - failures,
            "failed": failures,
            "results": items,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!();
        for (id, outcome) in &results {
            match outcome {
                ParseOutcome::Parsed(record) => {
                    let subject: String = record.subject.chars().take(40).collect();
                    println!(
                        "  {:<20} {:<40} {:>4} txn  {:>10}",
                        id,
                        subject,
                        record.transactions.len(),
                        record.category_totals.total().to_string()
                    );
                }
                ParseOutcome::Unavailable { reason, .. } => {
                    println!("  {id:<20} unavailable: {reason}");
                }
                ParseOutcome::Failed(e) => {
                    println!("  {id:<20} failed: {e}");
                }
            }
        }
        println!();
        println!(
            "  Parsed {} of {} message(s) in {:.2?}",
            results.len() - failures,
            results.len(),
            elapsed
        );
        println!();
    }

    if failures > 0 && failures == results.len() {
        anyhow::bail!("No statements could be parsed");
    }
    Ok(())
}

/// List matching messages with their subject and date.
fn cmd_list(source: &dyn MessageSource, query: &str, max: usize, json: bool) -> anyhow::Result<()> {
    let ids = source.list_messages(query, max)?;

    let mut rows = Vec::with_capacity(ids.len());
    for id in &ids {
        let message = source.get_message(id)?;
        let subject = message.payload.header("subject").unwrap_or_default().to_string();
        let date = message.payload.header("date").unwrap_or_default().to_string();
        rows.push((id.as_str(), date, subject));
    }

    if json {
        let items: Vec<serde_json::Value> = rows
            .iter()
            .map(|(id, date, subject)| {
                serde_json::json!({
                    "id": id,
                    "date": date,
                    "subject": subject,
                })
            })
            .collect();
        let output = serde_json::json!({
            "query": query,
            "result_count": items.len(),
            "results": items,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!("  {} result(s)", rows.len());
    println!();
    if rows.is_empty() {
        return Ok(());
    }
    println!("  {:<20} {:<32} {:<40}", "ID", "Date", "Subject");
    println!("  {}", "-".repeat(94));
    for (id, date, subject) in &rows {
        let date: String = date.chars().take(31).collect();
        let subject: String = subject.chars().take(39).collect();
        println!("  {id:<20} {date:<32} {subject:<40}");
    }
    println!();
    Ok(())
}

/// Run extraction and categorization on a local text or PDF file.
fn cmd_extract(path: &Path, json: bool) -> anyhow::Result<()> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }

    let bytes = std::fs::read(path)?;
    let is_pdf = bytes.starts_with(b"%PDF")
        || path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

    let text = if is_pdf {
        PdfTextExtractor.extract_text(&bytes)?
    } else {
        String::from_utf8_lossy(&bytes).into_owned()
    };

    let transactions = categorize(extract_transactions(&text));
    let totals = aggregate(&transactions);

    if json {
        let output = serde_json::json!({
            "file": path.to_string_lossy(),
            "transactions": transactions,
            "category_totals": totals,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    use humansize::{format_size, BINARY};
    println!();
    println!("  {:<20} {}", "File", path.display());
    println!("  {:<20} {}", "File size", format_size(bytes.len() as u64, BINARY));
    println!("  {:<20} {}", "Text source", if is_pdf { "PDF" } else { "text" });
    print_transactions(&transactions);
    if !totals.is_empty() {
        println!();
        for (category, total) in totals.iter() {
            println!("  {:<20} {:>10}", category.as_str(), total.to_string());
        }
        println!("  {:<20} {:>10}", "Total", totals.total().to_string());
    }
    println!();
    Ok(())
}

fn print_transactions(transactions: &[Transaction]) {
    println!();
    println!("  {} transaction(s)", transactions.len());
    if transactions.is_empty() {
        return;
    }
    println!();
    println!(
        "  {:<5} {:<5} {:<40} {:<13} {:>10}",
        "Post", "Txn", "Description", "Category", "Amount"
    );
    println!("  {}", "-".repeat(77));
    for txn in transactions {
        let description: String = txn.description.chars().take(40).collect();
        let category = txn.category.map(|c| c.as_str()).unwrap_or("-");
        println!(
            "  {:<5} {:<5} {:<40} {:<13} {:>10}",
            txn.post_date,
            txn.transaction_date,
            description,
            category,
            txn.amount.to_string()
        );
    }
}

/// Print or export stored statements for a user.
fn cmd_show(
    store: &JsonFileStore,
    user_id: &str,
    email_id: Option<&str>,
    format: ShowFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let records: Vec<StatementRecord> = match email_id {
        Some(id) => {
            let key = StatementKey {
                email_id: id.to_string(),
                user_id: user_id.to_string(),
            };
            match store.get(&key)? {
                Some(record) => vec![record],
                None => anyhow::bail!("No stored statement '{id}' for user '{user_id}'"),
            }
        }
        None => store.list(user_id)?,
    };

    match format {
        ShowFormat::Json => {
            let json = serde_json::to_string_pretty(&records)?;
            match output {
                Some(path) => std::fs::write(path, json)?,
                None => println!("{json}"),
            }
        }
        ShowFormat::Csv => match output {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let rows = stmtscan::export::csv::export_csv(&records, path)?;
                println!("  Exported {} transaction(s) to {}", rows, path.display());
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stmtscan::export::csv::write_csv(&records, &mut stdout)?;
            }
        },
        ShowFormat::Text => match output {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                for record in &records {
                    stmtscan::export::text::export_text(record, dir)?;
                }
                println!("  Exported {} report(s) to {}", records.len(), dir.display());
            }
            None => {
                if records.is_empty() {
                    println!("  No stored statements for user '{user_id}'");
                }
                for record in &records {
                    println!("{}", stmtscan::export::text::render_report(record));
                }
                if let Ok(meta) = std::fs::metadata(store.path()) {
                    use humansize::{format_size, BINARY};
                    println!(
                        "  {:<20} {} ({})",
                        "Store",
                        store.path().display(),
                        format_size(meta.len(), BINARY)
                    );
                }
            }
        },
    }

    Ok(())
}
