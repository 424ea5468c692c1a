//! Background suggestion and search worker threads

use crate::client::{get_suggestions, search_medicines, MedicineApi, MedicineResponse};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Prefix sent to the suggestion worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionQuery {
    pub id: u64,
    pub prefix: String,
}

/// Suggestions for one prefix. Failures arrive here as an empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionResults {
    pub query_id: u64,
    pub prefix: String,
    pub suggestions: Vec<String>,
}

/// Query sent to the search worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub id: u64,
    pub text: String,
}

/// Outcome of one search
#[derive(Debug, Clone)]
pub struct SearchResults {
    pub query_id: u64,
    pub query: String,
    pub outcome: Result<MedicineResponse, String>,
    pub duration: Duration,
}

/// When a pending suggestion request is handed to the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionSchedule {
    /// On every text change
    Immediate,
    /// Once the input has been quiet for the given time
    Debounced(Duration),
}

impl SuggestionSchedule {
    pub fn from_millis(ms: u64) -> Self {
        if ms == 0 {
            SuggestionSchedule::Immediate
        } else {
            SuggestionSchedule::Debounced(Duration::from_millis(ms))
        }
    }

    pub fn is_due(&self, last_input: Instant, now: Instant) -> bool {
        match self {
            SuggestionSchedule::Immediate => true,
            SuggestionSchedule::Debounced(quiet) => now.saturating_duration_since(last_input) >= *quiet,
        }
    }
}

impl Default for SuggestionSchedule {
    fn default() -> Self {
        SuggestionSchedule::Debounced(Duration::from_millis(150))
    }
}

/// Spawn the suggestion worker thread
///
/// Exits once either channel is closed.
pub fn spawn_suggestion_worker(
    api: Arc<dyn MedicineApi>,
    query_rx: Receiver<SuggestionQuery>,
    result_tx: Sender<SuggestionResults>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(mut query) = query_rx.recv() {
            // Coalesce rapid typing - keep only the latest prefix
            while let Ok(next) = query_rx.try_recv() {
                query = next;
            }

            let suggestions = match get_suggestions(api.as_ref(), &query.prefix) {
                Ok(s) => s,
                Err(e) => {
                    log::warn!("Suggestions for {:?} failed: {}", query.prefix, e);
                    Vec::new()
                }
            };

            let sent = result_tx.send(SuggestionResults {
                query_id: query.id,
                prefix: query.prefix,
                suggestions,
            });
            if sent.is_err() {
                break;
            }
        }
    })
}

/// Spawn the search dispatcher thread
///
/// Every query runs on its own thread, so a newer search is sent while an
/// older one is still in flight. Responses arrive in completion order; the
/// session drops the superseded ones. The dispatcher exits once the query
/// channel is closed.
pub fn spawn_search_worker(
    api: Arc<dyn MedicineApi>,
    query_rx: Receiver<SearchQuery>,
    result_tx: Sender<SearchResults>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(query) = query_rx.recv() {
            let api = api.clone();
            let result_tx = result_tx.clone();
            thread::spawn(move || run_search(api.as_ref(), query, &result_tx));
        }
    })
}

fn run_search(api: &dyn MedicineApi, query: SearchQuery, result_tx: &Sender<SearchResults>) {
    log::debug!("Search #{} started for {:?}", query.id, query.text);
    let start = Instant::now();
    let outcome = search_medicines(api, &query.text).map_err(|e| e.to_string());
    let duration = start.elapsed();

    let sent = result_tx.send(SearchResults {
        query_id: query.id,
        query: query.text,
        outcome,
        duration,
    });
    if sent.is_err() {
        log::debug!("Search result dropped, receiver is gone");
    }
}
