//! Incremental medicine search: session state, workers, presentation, TUI,
//! and the one-shot CLI commands

pub mod display;
pub mod session;
pub mod tui;
pub mod worker;

pub use display::{MedicineCardDisplay, ResultView, DEFAULT_CURRENCY, SEARCH_ERROR_MESSAGE};
pub use session::{Focus, InteractionState, ResultSet, SearchSession, SearchStatus};
pub use tui::{run as run_tui, TuiOptions};
pub use worker::{SuggestionSchedule, spawn_search_worker, spawn_suggestion_worker};

use crate::client::{
    get_suggestions, search_medicines, ClientConfig, MedicineApi, MedicineClient,
    MedicineResponse,
};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use indicatif::ProgressBar;

#[derive(Args, Debug)]
#[command(about = "Search medicines by name")]
pub struct SearchArgs {
    /// Medicine name to search for
    pub query: String,

    /// Print the backend response as JSON
    #[arg(long)]
    pub json: bool,

    /// Currency symbol used when printing prices
    #[arg(long, default_value = DEFAULT_CURRENCY)]
    pub currency: String,
}

#[derive(Args, Debug)]
#[command(about = "List autocomplete suggestions for a prefix")]
pub struct SuggestArgs {
    /// Partial medicine name
    pub prefix: String,
}

pub fn search_json(api: &dyn MedicineApi, query: &str) -> Result<String> {
    let resp = search_medicines(api, query).context(SEARCH_ERROR_MESSAGE)?;
    Ok(serde_json::to_string_pretty(&resp)?)
}

fn print_results(resp: &MedicineResponse, currency: &str) {
    if resp.medicines.is_empty() {
        println!(
            "{} No medicines found for '{}'",
            "!".yellow().bold(),
            resp.query.cyan()
        );
        if !resp.suggestions.is_empty() {
            println!("  Did you mean: {}", resp.suggestions.join(", ").cyan());
        }
        return;
    }

    println!(
        "{} of {} for '{}'",
        resp.medicines.len().to_string().bold(),
        resp.total,
        resp.query.cyan()
    );
    for medicine in &resp.medicines {
        println!();
        for line in MedicineCardDisplay::from_medicine(medicine, currency).to_cli_lines() {
            println!("{line}");
        }
    }
}

pub fn execute_search(args: SearchArgs, config: &ClientConfig) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        anyhow::bail!("Search query must not be empty");
    }

    let client = MedicineClient::new(config)?;

    if args.json {
        println!("{}", search_json(&client, query)?);
        return Ok(());
    }

    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner.set_message(format!("Searching for {}...", query));
    let result = search_medicines(&client, query);
    spinner.finish_and_clear();

    let resp = result.context(SEARCH_ERROR_MESSAGE)?;
    print_results(&resp, &args.currency);
    Ok(())
}

pub fn execute_suggest(args: SuggestArgs, config: &ClientConfig) -> Result<()> {
    let client = MedicineClient::new(config)?;

    let suggestions = get_suggestions(&client, &args.prefix).unwrap_or_else(|e| {
        log::warn!("Suggestions for {:?} failed: {}", args.prefix, e);
        Vec::new()
    });

    if suggestions.is_empty() {
        eprintln!("{}", "No suggestions".dimmed());
    }
    for suggestion in suggestions {
        println!("{suggestion}");
    }
    Ok(())
}
