pub mod client;
pub mod search;

pub use client::{
    get_suggestions, search_medicines, ClientConfig, Medicine, MedicineApi, MedicineClient,
    MedicineResponse, NetworkError, SuggestionsResponse, MIN_PREFIX_LEN,
};
pub use search::{
    execute_search, execute_suggest, run_tui, search_json, SearchArgs, SuggestArgs,
    SuggestionSchedule, TuiOptions,
};

/// Default backend address when neither a flag nor `MEDSEARCH_API_URL` is set
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";

/// Resolve the backend base URL: explicit override, then environment, then default
pub fn get_api_base_url(explicit: Option<&str>) -> String {
    resolve_api_base_url(explicit, std::env::var("MEDSEARCH_API_URL").ok().as_deref())
}

fn resolve_api_base_url(explicit: Option<&str>, env: Option<&str>) -> String {
    explicit
        .into_iter()
        .chain(env)
        .find(|url| !url.trim().is_empty())
        .map(|url| url.trim().trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}
