#[cfg(all(feature = "mimalloc", not(target_family = "wasm")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;
use medsearch_api::search::DEFAULT_CURRENCY;
use medsearch_api::{ClientConfig, SearchArgs, SuggestArgs, SuggestionSchedule, TuiOptions};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "medsearch")]
#[command(about = "Search medicines by name with live suggestions", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true, hide = true)]
    debug: bool,

    /// Backend base URL (defaults to $MEDSEARCH_API_URL, then http://127.0.0.1:5000)
    #[arg(long = "api-url", global = true, value_name = "URL")]
    api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,

    /// Quiet period after a keystroke before suggestions are fetched (0 fetches on every keystroke)
    #[arg(long = "debounce-ms", default_value_t = 150)]
    debounce_ms: u64,

    /// Currency symbol used for prices in the interactive view
    #[arg(long, default_value = DEFAULT_CURRENCY)]
    currency: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search medicines and print the results
    #[command(alias = "s")]
    Search(SearchArgs),

    /// Print autocomplete suggestions for a prefix
    Suggest(SuggestArgs),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Default level depends on --debug (overridden by RUST_LOG)
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("error")
    };
    env_logger::Builder::from_env(env).init();

    let base_url = medsearch_api::get_api_base_url(cli.api_url.as_deref());
    log::debug!("Using backend at {}", base_url);
    let config = ClientConfig::new(base_url).with_timeout(Duration::from_secs(cli.timeout));

    match cli.command {
        Some(Commands::Search(args)) => medsearch_api::execute_search(args, &config),
        Some(Commands::Suggest(args)) => medsearch_api::execute_suggest(args, &config),
        None => medsearch_api::run_tui(TuiOptions {
            config,
            schedule: SuggestionSchedule::from_millis(cli.debounce_ms),
            currency: cli.currency,
        }),
    }
}
