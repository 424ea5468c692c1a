//! Interaction state for the incremental search pipeline
//!
//! `SearchSession` owns everything the front-end shows: the query text, the
//! suggestion popover, the status of the latest search and the current result
//! set. It performs no I/O. Mutations that need the network hand back a
//! request value tagged with a generation id; responses come back through
//! [`SearchSession::apply_suggestions`] and [`SearchSession::apply_search`],
//! which drop anything that has been superseded in the meantime.

use super::worker::{SearchQuery, SearchResults, SuggestionQuery, SuggestionResults};
use crate::client::{Medicine, MedicineResponse, MIN_PREFIX_LEN};

/// Status of the most recently triggered search
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchStatus {
    #[default]
    Idle,
    Pending,
    Succeeded,
    /// Carries the error detail for logs and the status line
    Failed(String),
}

/// Dominant UI mode, derived from the session fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    SuggestionsOpen,
    SearchPending,
    SearchSucceeded,
    SearchFailed,
}

/// Which part of the screen receives navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    Suggestions,
    Results,
}

/// Records from the last successful search
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    pub medicines: Vec<Medicine>,
    pub query: String,
    pub total: u64,
    /// Backend spelling alternatives for a search that matched nothing
    pub did_you_mean: Vec<String>,
}

impl From<MedicineResponse> for ResultSet {
    fn from(resp: MedicineResponse) -> Self {
        Self {
            medicines: resp.medicines,
            query: resp.query,
            total: resp.total,
            did_you_mean: resp.suggestions,
        }
    }
}

#[derive(Debug, Default)]
pub struct SearchSession {
    query: String,
    suggestions: Vec<String>,
    popover_open: bool,
    highlighted: Option<usize>,
    focus: Focus,
    status: SearchStatus,
    results: ResultSet,
    /// Text the last suggestion request was issued for
    last_suggestion_prefix: Option<String>,
    suggestion_counter: u64,
    search_counter: u64,
    /// Generation of the search whose response we are waiting for
    pending_search: Option<u64>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    pub fn status(&self) -> &SearchStatus {
        &self.status
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn is_pending(&self) -> bool {
        self.status == SearchStatus::Pending
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, SearchStatus::Failed(_))
    }

    /// Submitting a blank query is inert
    pub fn can_submit(&self) -> bool {
        !self.query.trim().is_empty()
    }

    /// The popover shows only while it is open AND there is something to show
    pub fn popover_visible(&self) -> bool {
        self.popover_open && !self.suggestions.is_empty()
    }

    pub fn mode(&self) -> InteractionState {
        match self.status {
            SearchStatus::Pending => InteractionState::SearchPending,
            _ if self.popover_visible() => InteractionState::SuggestionsOpen,
            SearchStatus::Failed(_) => InteractionState::SearchFailed,
            SearchStatus::Succeeded => InteractionState::SearchSucceeded,
            SearchStatus::Idle => InteractionState::Idle,
        }
    }

    /// The input text changed
    pub fn keystroke(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.query {
            // Suggestions are keyed by text; never show another prefix's list
            self.suggestions.clear();
            self.highlighted = None;
        }
        self.query = text;
        self.popover_open = true;
        if self.focus == Focus::Suggestions {
            self.focus = Focus::Input;
        }
    }

    /// Suggestion request for the current text, if one has not been issued yet.
    ///
    /// Returns `None` for text shorter than [`MIN_PREFIX_LEN`] characters.
    pub fn next_suggestion_query(&mut self) -> Option<SuggestionQuery> {
        if self.last_suggestion_prefix.as_deref() == Some(self.query.as_str()) {
            return None;
        }
        self.last_suggestion_prefix = Some(self.query.clone());

        if self.query.chars().count() < MIN_PREFIX_LEN {
            return None;
        }

        self.suggestion_counter += 1;
        Some(SuggestionQuery {
            id: self.suggestion_counter,
            prefix: self.query.clone(),
        })
    }

    /// Apply a suggestion response. Returns false if it was stale.
    pub fn apply_suggestions(&mut self, results: SuggestionResults) -> bool {
        if results.prefix != self.query {
            log::debug!(
                "dropping suggestions #{} for {:?}, query is now {:?}",
                results.query_id,
                results.prefix,
                self.query
            );
            return false;
        }
        self.suggestions = results.suggestions;
        self.highlighted = None;
        if self.focus == Focus::Suggestions {
            self.focus = Focus::Input;
        }
        true
    }

    /// A suggestion was picked: it becomes the query and is searched immediately
    pub fn select_suggestion(&mut self, suggestion: impl Into<String>) -> SearchQuery {
        let suggestion = suggestion.into();
        if suggestion != self.query {
            self.suggestions.clear();
        }
        self.query = suggestion.clone();
        self.close_popover();
        self.start_search(suggestion)
    }

    /// Select whatever is highlighted in the popover
    pub fn select_highlighted(&mut self) -> Option<SearchQuery> {
        if !self.popover_visible() {
            return None;
        }
        let suggestion = self.suggestions.get(self.highlighted?)?.clone();
        Some(self.select_suggestion(suggestion))
    }

    /// Explicit form submission. Blank text is a no-op.
    pub fn submit(&mut self) -> Option<SearchQuery> {
        let trimmed = self.query.trim();
        if trimmed.is_empty() {
            return None;
        }
        let text = trimmed.to_string();
        Some(self.start_search(text))
    }

    fn start_search(&mut self, text: String) -> SearchQuery {
        self.search_counter += 1;
        if let Some(previous) = self.pending_search {
            log::debug!("search #{} supersedes #{}", self.search_counter, previous);
        }
        self.pending_search = Some(self.search_counter);
        self.status = SearchStatus::Pending;
        SearchQuery {
            id: self.search_counter,
            text,
        }
    }

    /// Apply a search response. Only the latest issued search is applied;
    /// returns false for anything older.
    pub fn apply_search(&mut self, results: SearchResults) -> bool {
        if self.pending_search != Some(results.query_id) {
            log::debug!(
                "dropping stale search #{} for {:?}",
                results.query_id,
                results.query
            );
            return false;
        }
        self.pending_search = None;

        match results.outcome {
            Ok(resp) => {
                log::debug!(
                    "search #{} for {:?}: {} of {} records in {:?}",
                    results.query_id,
                    results.query,
                    resp.medicines.len(),
                    resp.total,
                    results.duration
                );
                self.results = ResultSet::from(resp);
                self.status = SearchStatus::Succeeded;
                self.close_popover();
                self.focus = Focus::Input;
            }
            Err(e) => {
                log::warn!("search #{} for {:?} failed: {}", results.query_id, results.query, e);
                // Previous results stay on screen
                self.status = SearchStatus::Failed(e);
            }
        }
        true
    }

    pub fn close_popover(&mut self) {
        self.popover_open = false;
        self.highlighted = None;
        if self.focus == Focus::Suggestions {
            self.focus = Focus::Input;
        }
    }

    /// Move the popover highlight down, entering the popover from the input
    pub fn highlight_next(&mut self) {
        if !self.popover_visible() {
            return;
        }
        let last = self.suggestions.len() - 1;
        self.highlighted = Some(match self.highlighted {
            None => 0,
            Some(i) => (i + 1).min(last),
        });
        self.focus = Focus::Suggestions;
    }

    /// Move the popover highlight up; past the first entry focus returns to the input
    pub fn highlight_prev(&mut self) {
        match self.highlighted {
            Some(0) | None => {
                self.highlighted = None;
                if self.focus == Focus::Suggestions {
                    self.focus = Focus::Input;
                }
            }
            Some(i) => self.highlighted = Some(i - 1),
        }
    }

    pub fn highlighted_suggestion(&self) -> Option<&str> {
        self.suggestions
            .get(self.highlighted?)
            .map(String::as_str)
    }

    /// Move focus to the result grid (closes the popover) or back to the input
    pub fn set_focus(&mut self, focus: Focus) {
        match focus {
            Focus::Results => {
                self.close_popover();
                self.focus = Focus::Results;
            }
            Focus::Suggestions => self.highlight_next(),
            Focus::Input => {
                self.highlighted = None;
                self.focus = Focus::Input;
            }
        }
    }
}
