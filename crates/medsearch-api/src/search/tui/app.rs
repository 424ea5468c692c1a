//! Main application state and event loop

use super::input::QueryInput;
use super::ui;
use super::TuiOptions;
use crate::client::{MedicineApi, MedicineClient};
use crate::search::display::ResultView;
use crate::search::session::{Focus, SearchSession};
use crate::search::worker::{
    spawn_search_worker, spawn_suggestion_worker, SearchQuery, SearchResults, SuggestionQuery,
    SuggestionResults, SuggestionSchedule,
};
use anyhow::{Context, Result};
use crossterm::{
    cursor::SetCursorStyle,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Application state
pub struct App {
    /// Query editor
    pub input: QueryInput,
    /// Interaction state shared with the presentation layer
    pub session: SearchSession,
    /// Index of the highlighted card in the result grid
    pub selected_card: usize,
    /// Cards per grid row, as laid out by the last render
    pub grid_columns: usize,
    pub should_quit: bool,
    /// When the pending search was issued (drives the spinner)
    pub search_started: Option<Instant>,
    pub currency: String,
    pub api_url: String,
    schedule: SuggestionSchedule,
    last_input_time: Instant,
    suggestion_tx: Sender<SuggestionQuery>,
    suggestion_rx: Receiver<SuggestionResults>,
    search_tx: Sender<SearchQuery>,
    search_rx: Receiver<SearchResults>,
}

impl App {
    pub fn new(api: Arc<dyn MedicineApi>, api_url: String, options: &TuiOptions) -> Self {
        let (suggestion_tx, suggestion_query_rx) = mpsc::channel::<SuggestionQuery>();
        let (suggestion_result_tx, suggestion_rx) = mpsc::channel::<SuggestionResults>();
        let (search_tx, search_query_rx) = mpsc::channel::<SearchQuery>();
        let (search_result_tx, search_rx) = mpsc::channel::<SearchResults>();

        spawn_suggestion_worker(api.clone(), suggestion_query_rx, suggestion_result_tx);
        spawn_search_worker(api, search_query_rx, search_result_tx);

        Self {
            input: QueryInput::new(),
            session: SearchSession::new(),
            selected_card: 0,
            grid_columns: 1,
            should_quit: false,
            search_started: None,
            currency: options.currency.clone(),
            api_url,
            schedule: options.schedule,
            last_input_time: Instant::now(),
            suggestion_tx,
            suggestion_rx,
            search_tx,
            search_rx,
        }
    }

    pub fn view(&self) -> ResultView {
        ResultView::from_session(&self.session, &self.currency)
    }

    fn on_text_changed(&mut self) {
        self.session.keystroke(self.input.text.clone());
        self.last_input_time = Instant::now();
    }

    fn dispatch_search(&mut self, query: SearchQuery) {
        log::debug!("search #{}: {:?}", query.id, query.text);
        self.search_started = Some(Instant::now());
        if self.search_tx.send(query).is_err() {
            log::error!("search worker is gone");
        }
    }

    /// Hand the current prefix to the suggestion worker once the schedule allows
    fn maybe_send_suggestion_query(&mut self, now: Instant) {
        if !self.schedule.is_due(self.last_input_time, now) {
            return;
        }
        if let Some(query) = self.session.next_suggestion_query() {
            if self.suggestion_tx.send(query).is_err() {
                log::error!("suggestion worker is gone");
            }
        }
    }

    /// Poll for suggestion responses (non-blocking)
    fn poll_suggestions(&mut self) {
        while let Ok(results) = self.suggestion_rx.try_recv() {
            self.session.apply_suggestions(results);
        }
    }

    /// Poll for search responses (non-blocking)
    fn poll_search(&mut self) {
        while let Ok(results) = self.search_rx.try_recv() {
            let succeeded = results.outcome.is_ok();
            if !self.session.apply_search(results) {
                continue;
            }
            self.search_started = None;
            if succeeded {
                self.selected_card = 0;
            }
        }
    }

    /// Everything the loop does between input handling and drawing
    pub fn tick(&mut self, now: Instant) {
        self.maybe_send_suggestion_query(now);
        self.poll_suggestions();
        self.poll_search();
    }

    fn submit(&mut self) {
        let query = if self.session.focus() == Focus::Suggestions {
            self.session.select_highlighted()
        } else {
            self.session.submit()
        };

        if let Some(query) = query {
            // Selecting a suggestion rewrites the query text
            if self.input.text != self.session.query() {
                self.input.set_text(self.session.query());
            }
            self.dispatch_search(query);
        }
    }

    fn escape(&mut self) {
        if self.session.popover_visible() {
            self.session.close_popover();
        } else if self.session.focus() == Focus::Results {
            self.session.set_focus(Focus::Input);
        } else {
            self.should_quit = true;
        }
    }

    fn card_count(&self) -> usize {
        self.session.results().medicines.len()
    }

    fn move_down(&mut self) {
        match self.session.focus() {
            Focus::Results => {
                let next = self.selected_card + self.grid_columns.max(1);
                if next < self.card_count() {
                    self.selected_card = next;
                }
            }
            Focus::Input if !self.session.popover_visible() => {
                if self.card_count() > 0 {
                    self.session.set_focus(Focus::Results);
                }
            }
            Focus::Input | Focus::Suggestions => self.session.highlight_next(),
        }
    }

    fn move_up(&mut self) {
        match self.session.focus() {
            Focus::Results => {
                let columns = self.grid_columns.max(1);
                if self.selected_card < columns {
                    self.session.set_focus(Focus::Input);
                } else {
                    self.selected_card -= columns;
                }
            }
            Focus::Suggestions => self.session.highlight_prev(),
            Focus::Input => {}
        }
    }

    fn move_card(&mut self, delta: isize) {
        let last = self.card_count().saturating_sub(1);
        self.selected_card = self.selected_card.saturating_add_signed(delta).min(last);
    }

    fn toggle_results_focus(&mut self) {
        if self.session.focus() == Focus::Results {
            self.session.set_focus(Focus::Input);
        } else if self.card_count() > 0 {
            self.session.set_focus(Focus::Results);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let in_results = self.session.focus() == Focus::Results;

        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => self.should_quit = true,
            (KeyCode::Esc, _) => self.escape(),
            (KeyCode::Enter, _) => self.submit(),
            (KeyCode::Tab, _) | (KeyCode::BackTab, _) => self.toggle_results_focus(),
            (KeyCode::Down, _) | (KeyCode::Char('j'), KeyModifiers::CONTROL) => self.move_down(),
            (KeyCode::Up, _) | (KeyCode::Char('k'), KeyModifiers::CONTROL) => self.move_up(),
            (KeyCode::Left, KeyModifiers::NONE) if in_results => self.move_card(-1),
            (KeyCode::Right, KeyModifiers::NONE) if in_results => self.move_card(1),
            (KeyCode::PageDown, _) if in_results => {
                self.move_card(4 * self.grid_columns.max(1) as isize)
            }
            (KeyCode::PageUp, _) if in_results => {
                self.move_card(-4 * self.grid_columns.max(1) as isize)
            }
            _ => {
                let before = self.input.text.clone();
                if !self.input.handle_key(key.code, key.modifiers) {
                    return;
                }
                if in_results {
                    self.session.set_focus(Focus::Input);
                }
                if self.input.text != before {
                    self.on_text_changed();
                }
            }
        }
    }

    /// Handle a terminal event
    pub fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            if key.kind == KeyEventKind::Press {
                self.handle_key(key);
            }
        }
    }
}

/// Run the TUI application
pub fn run(options: TuiOptions) -> Result<()> {
    let client = MedicineClient::new(&options.config)
        .with_context(|| format!("Failed to set up client for {}", options.config.base_url))?;
    let api_url = client.base_url().to_string();
    let mut app = App::new(Arc::new(client), api_url, &options);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, SetCursorStyle::BlinkingBar)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        SetCursorStyle::DefaultUserShape
    )?;
    terminal.show_cursor()?;

    result
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    // ~60Hz is plenty for a form
    const FRAME_TIME: Duration = Duration::from_micros(16_666);

    loop {
        let frame_start = Instant::now();

        // Drain all pending events first (lowest latency for input)
        let mut events_processed = 0usize;
        while event::poll(Duration::from_millis(0))? && events_processed < 100 {
            app.handle_event(event::read()?);
            events_processed += 1;
            if app.should_quit {
                break;
            }
        }

        if app.should_quit {
            break;
        }

        app.tick(Instant::now());

        terminal.draw(|f| ui::render(f, app))?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_TIME {
            std::thread::sleep(FRAME_TIME - elapsed);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Medicine, MedicineResponse, NetworkError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeApi {
        searches: AtomicUsize,
    }

    impl MedicineApi for FakeApi {
        fn fetch_suggestions(&self, _prefix: &str) -> Result<Vec<String>, NetworkError> {
            Ok(vec!["Paracetamol 500mg".into(), "Paradil DS".into()])
        }

        fn fetch_medicine(&self, query: &str) -> Result<MedicineResponse, NetworkError> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            Ok(MedicineResponse {
                medicines: vec![Medicine {
                    id: 1,
                    name: query.to_string(),
                    manufacturer_name: "Acme Pharma".into(),
                    short_composition1: "Paracetamol (650mg)".into(),
                    short_composition2: None,
                    pack_size_label: "strip of 15 tablets".into(),
                    price: 30.0,
                    score: 2.0,
                    kind: "allopathy".into(),
                    is_discontinued: false,
                }],
                query: query.to_string(),
                total: 1,
                suggestions: Vec::new(),
            })
        }
    }

    fn app_with(api: Arc<FakeApi>) -> App {
        let options = TuiOptions {
            schedule: SuggestionSchedule::Immediate,
            ..TuiOptions::default()
        };
        App::new(api, "http://test".into(), &options)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_event(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn settle(app: &mut App, done: impl Fn(&App) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done(app) {
            assert!(Instant::now() < deadline, "timed out waiting for workers");
            app.tick(Instant::now());
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_pick_suggestion_from_popover() {
        let api = Arc::new(FakeApi::default());
        let mut app = app_with(api.clone());

        type_text(&mut app, "par");
        settle(&mut app, |a| a.session.popover_visible());
        assert_eq!(app.session.suggestions(), ["Paracetamol 500mg", "Paradil DS"]);

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input.text, "Paradil DS");
        assert!(!app.session.popover_visible());
        assert!(app.search_started.is_some());

        settle(&mut app, |a| !a.session.is_pending());
        assert_eq!(app.session.results().medicines[0].name, "Paradil DS");
        assert_eq!(app.session.focus(), Focus::Input);
        assert!(app.search_started.is_none());
        assert_eq!(api.searches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_blank_enter_does_not_search() {
        let api = Arc::new(FakeApi::default());
        let mut app = app_with(api.clone());

        type_text(&mut app, "  ");
        press(&mut app, KeyCode::Enter);
        app.tick(Instant::now());

        assert!(!app.session.is_pending());
        assert!(app.search_started.is_none());
        assert_eq!(api.searches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_escape_closes_popover_before_quitting() {
        let mut app = app_with(Arc::new(FakeApi::default()));
        type_text(&mut app, "par");
        settle(&mut app, |a| a.session.popover_visible());

        press(&mut app, KeyCode::Esc);
        assert!(!app.session.popover_visible());
        assert!(!app.should_quit);

        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);
    }

    #[test]
    fn test_cursor_motion_is_not_a_keystroke() {
        let mut app = app_with(Arc::new(FakeApi::default()));
        type_text(&mut app, "par");
        settle(&mut app, |a| a.session.popover_visible());
        press(&mut app, KeyCode::Esc);

        press(&mut app, KeyCode::Left);
        assert_eq!(app.input.cursor, 2);
        // Text unchanged, so the popover stays closed
        assert!(!app.session.popover_visible());
    }
}
