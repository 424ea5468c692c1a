//! Formatting of medicine records and of the overall result view
//!
//! Everything here is a pure function of the data it is given; shared
//! between the TUI and the one-shot CLI output.

use super::session::SearchSession;
use crate::client::Medicine;
use colored::Colorize;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Currency symbol used for prices unless overridden
pub const DEFAULT_CURRENCY: &str = "₹";

/// Banner shown while the latest search has failed
pub const SEARCH_ERROR_MESSAGE: &str = "Error fetching data. Please try again.";

/// Availability badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Discontinued,
}

impl Availability {
    pub fn from_discontinued(is_discontinued: bool) -> Self {
        if is_discontinued {
            Availability::Discontinued
        } else {
            Availability::Available
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Availability::Available => "Available",
            Availability::Discontinued => "Discontinued",
        }
    }

    pub fn to_ratatui(&self) -> Color {
        match self {
            Availability::Available => Color::Green,
            Availability::Discontinued => Color::Red,
        }
    }
}

pub fn format_price(price: f64, currency: &str) -> String {
    format!("{currency}{price:.2}")
}

/// Formatted display of a single medicine record (shared between TUI and CLI)
#[derive(Debug, Clone, PartialEq)]
pub struct MedicineCardDisplay {
    pub name: String,
    pub manufacturer: String,
    /// One or two lines; the second is dropped when blank
    pub compositions: Vec<String>,
    pub pack_size: String,
    pub price: String,
    pub kind: String,
    pub availability: Availability,
}

impl MedicineCardDisplay {
    pub fn from_medicine(medicine: &Medicine, currency: &str) -> Self {
        let mut compositions = vec![medicine.short_composition1.clone()];
        if let Some(second) = medicine.second_composition() {
            compositions.push(second.to_string());
        }

        Self {
            name: medicine.name.clone(),
            manufacturer: medicine.manufacturer_name.clone(),
            compositions,
            pack_size: medicine.pack_size_label.clone(),
            price: format_price(medicine.price, currency),
            kind: medicine.kind.clone(),
            availability: Availability::from_discontinued(medicine.is_discontinued),
        }
    }

    /// Uncolored lines, one card per block
    pub fn to_plain_lines(&self) -> Vec<String> {
        let mut lines = vec![self.name.clone(), format!("  {}", self.manufacturer)];
        for composition in &self.compositions {
            lines.push(format!("  {composition}"));
        }
        lines.push(format!(
            "  Pack Size: {} · Price: {}",
            self.pack_size, self.price
        ));
        lines.push(format!(
            "  Type: {} · Status: {}",
            self.kind,
            self.availability.label()
        ));
        lines
    }

    /// Render to CLI output using colored crate
    pub fn to_cli_lines(&self) -> Vec<String> {
        let badge = match self.availability {
            Availability::Available => self.availability.label().green().to_string(),
            Availability::Discontinued => self.availability.label().red().bold().to_string(),
        };

        let mut lines = vec![
            self.name.bold().to_string(),
            format!("  {}", self.manufacturer.dimmed()),
        ];
        for composition in &self.compositions {
            lines.push(format!("  {composition}"));
        }
        lines.push(format!(
            "  {} {} {} {} {}",
            "Pack Size:".dimmed(),
            self.pack_size,
            "·".dimmed(),
            "Price:".dimmed(),
            self.price.yellow()
        ));
        lines.push(format!(
            "  {} {} {} {} {}",
            "Type:".dimmed(),
            self.kind,
            "·".dimmed(),
            "Status:".dimmed(),
            badge
        ));
        lines
    }

    /// Render to ratatui Lines for the card body (the border is drawn by the caller)
    pub fn to_tui_lines(&self) -> Vec<Line<'static>> {
        let label = Style::default().fg(Color::DarkGray);
        let value = Style::default().fg(Color::Gray);

        let mut lines = vec![Line::from(Span::styled(
            self.manufacturer.clone(),
            Style::default().fg(Color::DarkGray),
        ))];

        for composition in &self.compositions {
            lines.push(Line::from(Span::styled(composition.clone(), value)));
        }

        lines.push(Line::from(vec![
            Span::styled("Pack: ", label),
            Span::styled(self.pack_size.clone(), value),
            Span::styled("  Price: ", label),
            Span::styled(self.price.clone(), Style::default().fg(Color::Yellow)),
        ]));

        lines.push(Line::from(vec![
            Span::styled("Type: ", label),
            Span::styled(self.kind.clone(), value),
            Span::styled("  ", label),
            Span::styled(
                format!(" {} ", self.availability.label()),
                Style::default()
                    .fg(self.availability.to_ratatui())
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED),
            ),
        ]));

        lines
    }
}

/// Everything the result area shows, derived from the session
#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub show_spinner: bool,
    pub error_banner: Option<&'static str>,
    /// Always populated from the current result set, even while pending or failed
    pub cards: Vec<MedicineCardDisplay>,
    pub summary: Option<String>,
    pub did_you_mean: Vec<String>,
}

impl ResultView {
    pub fn from_session(session: &SearchSession, currency: &str) -> Self {
        let results = session.results();
        let cards = results
            .medicines
            .iter()
            .map(|m| MedicineCardDisplay::from_medicine(m, currency))
            .collect::<Vec<_>>();

        let summary = if results.query.is_empty() && cards.is_empty() {
            None
        } else if cards.is_empty() {
            Some(format!("No medicines found for \"{}\"", results.query))
        } else {
            Some(format!(
                "Showing {} of {} for \"{}\"",
                cards.len(),
                results.total,
                results.query
            ))
        };

        let did_you_mean = if cards.is_empty() {
            results.did_you_mean.clone()
        } else {
            Vec::new()
        };

        Self {
            show_spinner: session.is_pending(),
            error_banner: session.is_failed().then_some(SEARCH_ERROR_MESSAGE),
            cards,
            summary,
            did_you_mean,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MedicineResponse;
    use crate::search::worker::SearchResults;
    use std::time::Duration;

    fn paracetamol() -> Medicine {
        Medicine {
            id: 7,
            name: "Paracetamol 500mg Tablet".into(),
            manufacturer_name: "Acme Pharma".into(),
            short_composition1: "Paracetamol (500mg)".into(),
            short_composition2: Some("Caffeine (30mg)".into()),
            pack_size_label: "strip of 10 tablets".into(),
            price: 12.5,
            score: 8.0,
            kind: "allopathy".into(),
            is_discontinued: false,
        }
    }

    fn session_with(medicines: Vec<Medicine>) -> SearchSession {
        let mut session = SearchSession::new();
        session.keystroke("para");
        let q = session.submit().unwrap();
        let total = medicines.len() as u64 + 30;
        session.apply_search(SearchResults {
            query_id: q.id,
            query: q.text.clone(),
            outcome: Ok(MedicineResponse {
                medicines,
                query: q.text,
                total,
                suggestions: Vec::new(),
            }),
            duration: Duration::ZERO,
        });
        session
    }

    #[test]
    fn test_card_plain_lines() {
        let card = MedicineCardDisplay::from_medicine(&paracetamol(), DEFAULT_CURRENCY);
        insta::assert_snapshot!(card.to_plain_lines().join("\n"), @r"
        Paracetamol 500mg Tablet
          Acme Pharma
          Paracetamol (500mg)
          Caffeine (30mg)
          Pack Size: strip of 10 tablets · Price: ₹12.50
          Type: allopathy · Status: Available
        ");
    }

    #[test]
    fn test_empty_second_composition_is_omitted() {
        let mut medicine = paracetamol();
        medicine.short_composition2 = Some(String::new());
        let card = MedicineCardDisplay::from_medicine(&medicine, DEFAULT_CURRENCY);
        assert_eq!(card.compositions, vec!["Paracetamol (500mg)"]);

        medicine.short_composition2 = None;
        let card = MedicineCardDisplay::from_medicine(&medicine, DEFAULT_CURRENCY);
        assert_eq!(card.compositions.len(), 1);
    }

    #[test]
    fn test_price_has_two_decimals() {
        assert_eq!(format_price(40.0, "₹"), "₹40.00");
        assert_eq!(format_price(19.999, "$"), "$20.00");
        assert_eq!(format_price(0.5, "₹"), "₹0.50");
    }

    #[test]
    fn test_availability_badge() {
        let mut medicine = paracetamol();
        assert_eq!(
            MedicineCardDisplay::from_medicine(&medicine, "₹").availability,
            Availability::Available
        );
        medicine.is_discontinued = true;
        let card = MedicineCardDisplay::from_medicine(&medicine, "₹");
        assert_eq!(card.availability.label(), "Discontinued");
        assert!(card.to_plain_lines().last().unwrap().ends_with("Status: Discontinued"));
    }

    #[test]
    fn test_idle_view_is_empty() {
        let view = ResultView::from_session(&SearchSession::new(), DEFAULT_CURRENCY);
        assert!(!view.show_spinner);
        assert!(view.error_banner.is_none());
        assert!(view.cards.is_empty());
        assert!(view.summary.is_none());
    }

    #[test]
    fn test_pending_view_keeps_grid() {
        let mut session = session_with(vec![paracetamol()]);
        session.keystroke("aspirin");
        session.submit().unwrap();

        let view = ResultView::from_session(&session, DEFAULT_CURRENCY);
        assert!(view.show_spinner);
        assert!(view.error_banner.is_none());
        assert_eq!(view.cards.len(), 1);
    }

    #[test]
    fn test_failed_view_shows_banner_and_previous_cards() {
        let mut session = session_with(vec![paracetamol()]);
        session.keystroke("aspirin");
        let q = session.submit().unwrap();
        session.apply_search(SearchResults {
            query_id: q.id,
            query: q.text,
            outcome: Err("500".into()),
            duration: Duration::ZERO,
        });

        let view = ResultView::from_session(&session, DEFAULT_CURRENCY);
        assert!(!view.show_spinner);
        assert_eq!(view.error_banner, Some(SEARCH_ERROR_MESSAGE));
        assert_eq!(view.cards[0].name, "Paracetamol 500mg Tablet");
    }

    #[test]
    fn test_summary_reports_total() {
        let view = ResultView::from_session(&session_with(vec![paracetamol()]), DEFAULT_CURRENCY);
        assert_eq!(view.summary.as_deref(), Some("Showing 1 of 31 for \"para\""));
        assert!(view.did_you_mean.is_empty());
    }
}
