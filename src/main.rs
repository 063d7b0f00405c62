use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ignore::WalkBuilder;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use termcolor::ColorChoice;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use pathrank::api::{MatchOptions, ctrlp_match, try_match};
use pathrank::highlight::HighlightMode;
use pathrank::query::MatchMode;
use pathrank::utils::{AppConfig, get_config_path};
use pathrank::{output, server};

/// Environment variable holding the log filter
const LOG_ENV: &str = "PATHRANK_LOG";

#[derive(Parser)]
#[command(name = "pathrank", version)]
#[command(about = "Parallel fuzzy path matcher for editor file pickers")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    args: MatchArgs,

    /// Log at debug level unless PATHRANK_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer length-prefixed JSON match requests on stdin until EOF
    Serve,
    /// Show the config file location and effective defaults
    Config {
        /// Write the current defaults to the config file
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args, Debug)]
struct MatchArgs {
    /// Query to rank candidates against (empty keeps input order)
    query: Option<String>,

    /// Maximum number of results, 0 for all
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Part of each line to match
    #[arg(short, long, default_value_t = MatchMode::FullLine)]
    mode: MatchMode,

    /// Match plain strings instead of paths
    #[arg(long)]
    plain: bool,

    /// File open in the editor: excluded unless --match-current, ranked below equal matches
    #[arg(long, value_name = "PATH")]
    current: Option<String>,

    /// Keep the current file in results
    #[arg(long)]
    match_current: bool,

    /// Worker thread cap, 0 for all cores
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Character separating excluded substrings in the query
    #[arg(short = 'x', long, value_name = "CHAR")]
    invert: Option<String>,

    /// Compare characters with Unicode case folding
    #[arg(long)]
    unicode: bool,

    /// Ignore case even when the query has uppercase letters
    #[arg(short, long)]
    ignore_case: bool,

    /// Read candidates from files under DIR (honoring ignore files) instead of stdin
    #[arg(short, long, value_name = "DIR")]
    walk: Option<PathBuf>,

    /// Print the JSON response with highlight patterns
    #[arg(long)]
    json: bool,

    /// Highlight pattern style for --json
    #[arg(long)]
    highlight: Option<HighlightMode>,

    /// Line prefix inserted into highlight patterns
    #[arg(long, default_value = "")]
    line_prefix: String,

    /// Print score and matched offsets under each result
    #[arg(long)]
    debug: bool,

    /// When to color output
    #[arg(long, value_enum, default_value_t = ColorWhen::Auto)]
    color: ColorWhen,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ColorWhen {
    Auto,
    Always,
    Never,
}

impl From<ColorWhen> for ColorChoice {
    fn from(when: ColorWhen) -> Self {
        match when {
            ColorWhen::Auto => ColorChoice::Auto,
            ColorWhen::Always => ColorChoice::Always,
            ColorWhen::Never => ColorChoice::Never,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Serve) => server::serve_stdio()
            .map(|served| debug!(served, "server exited"))
            .context("Match server failed"),
        Some(Commands::Config { init }) => show_config(init),
        None => run_match(cli.args),
    };

    // Piping into `head` closes stdout early
    match result {
        Err(err) if is_broken_pipe(&err) => Ok(()),
        other => other,
    }
}

/// Install the stderr subscriber. PATHRANK_LOG takes an EnvFilter directive.
fn init_logging(verbose: bool) {
    let fallback = if verbose { "pathrank=debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}

fn run_match(args: MatchArgs) -> Result<()> {
    let config = AppConfig::load().unwrap_or_else(|err| {
        warn!(error = %format!("{err:#}"), "ignoring config file");
        AppConfig::default()
    });
    let options = build_options(&config, &args);

    let items = match &args.walk {
        Some(root) => walk_candidates(root)?,
        None => read_stdin_candidates()?,
    };
    let query = args.query.as_deref().unwrap_or("");

    if args.json {
        let response = ctrlp_match(&items, query, &options);
        writeln!(io::stdout().lock(), "{}", serde_json::to_string(&response)?)?;
        return Ok(());
    }

    let start = Instant::now();
    let ranked = try_match(&items, query, &options)?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    output::print_matches(&items, &ranked, args.color.into(), args.debug)?;
    if args.debug {
        output::print_summary(ranked.len(), items.len(), elapsed_ms)?;
    }
    Ok(())
}

/// Config defaults overridden by command-line flags
fn build_options(config: &AppConfig, args: &MatchArgs) -> MatchOptions {
    let mut options = config.match_options();
    options.mmode = args.mode;
    options.ispath = !args.plain;
    options.crfile = args.current.clone().unwrap_or_default();
    options.match_crfile = args.match_current;
    options.regex_line_prefix = args.line_prefix.clone();
    options.unicode |= args.unicode;
    options.smart_case &= !args.ignore_case;

    if let Some(limit) = args.limit {
        options.limit = limit;
    }
    if let Some(threads) = args.threads {
        options.max_threads = threads;
    }
    if let Some(invert) = &args.invert {
        options.query_inverting_delimiter = invert.clone();
    }
    if let Some(mode) = args.highlight {
        options.highlight_mode = mode;
    }
    options
}

fn read_stdin_candidates() -> Result<Vec<String>> {
    let stdin = io::stdin();
    let mut items = Vec::new();
    for line in stdin.lock().lines() {
        items.push(line.context("Failed to read candidates from stdin")?);
    }
    Ok(items)
}

/// Relative paths of all files under `root`, in a stable order
fn walk_candidates(root: &Path) -> Result<Vec<String>> {
    if !root.is_dir() {
        anyhow::bail!("Not a directory: {}", root.display());
    }

    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut items = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        items.push(rel.to_string_lossy().into_owned());
    }
    debug!(root = %root.display(), files = items.len(), "walked candidates");
    Ok(items)
}

fn show_config(init: bool) -> Result<()> {
    let path = get_config_path()?;
    let config = AppConfig::load()?;

    if init {
        let written = config.save()?;
        println!("Wrote {}", written.display());
    } else {
        println!("Config file: {}", path.display());
        if !path.exists() {
            println!("(not present, showing defaults)");
        }
    }
    println!("{}", serde_json::to_string_pretty(&config)?);
    println!("Effective worker threads: {}", config.effective_max_threads());
    Ok(())
}

fn is_broken_pipe(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<io::Error>())
        .any(|io_err| io_err.kind() == io::ErrorKind::BrokenPipe)
}
