//! Interactive terminal front-end for the search pipeline

mod app;
mod input;
mod ui;

pub use app::{run, App};
pub use input::QueryInput;

use super::display::DEFAULT_CURRENCY;
use super::worker::SuggestionSchedule;
use crate::client::ClientConfig;

/// Settings for [`run`]
#[derive(Debug, Clone)]
pub struct TuiOptions {
    pub config: ClientConfig,
    pub schedule: SuggestionSchedule,
    pub currency: String,
}

impl Default for TuiOptions {
    fn default() -> Self {
        Self {
            config: ClientConfig::default(),
            schedule: SuggestionSchedule::default(),
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}
