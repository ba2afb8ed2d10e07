//! The public listing: the one page every visitor sees. Storage failures
//! degrade to an empty list with a notice; the page always renders.

use askama::Template;
use axum::extract::{OriginalUri, State};
use axum::response::Response;
use axum_extra::extract::Query;
use serde::Deserialize;
use tracing::error;

use crate::db::{self, filter::EventFilter};
use crate::models::{EventRow, EventType};
use crate::session::AuthSession;
use crate::state::AppState;
use crate::utils::datetime::now_civil;
use crate::utils::render::render_html;

#[derive(Debug, Deserialize, Default)]
pub struct ListingParams {
    #[serde(default, rename = "startDate")]
    start_date: String,
    #[serde(default, rename = "endDate")]
    end_date: String,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    format: String,
    #[serde(default)]
    search: String,
    #[serde(default)]
    sort: String,
}

/// The filter state echoed back into the form so selections survive a
/// round trip.
pub struct FilterEcho {
    pub start_date: String,
    pub end_date: String,
    pub categories: Vec<i32>,
    pub format: String,
    pub search: String,
    pub sort: &'static str,
}

impl FilterEcho {
    fn new(params: &ListingParams, filter: &EventFilter) -> Self {
        Self {
            start_date: params.start_date.clone(),
            end_date: params.end_date.clone(),
            categories: filter.categories.clone(),
            format: if params.format == "list" {
                "list".to_string()
            } else {
                "grid".to_string()
            },
            search: filter.search.clone().unwrap_or_default(),
            sort: filter.sort.as_param(),
        }
    }

    pub fn is_category_selected(&self, id: i32) -> bool {
        self.categories.contains(&id)
    }
}

#[derive(Template)]
#[template(path = "events.html")]
struct EventsTemplate {
    events: Vec<EventRow>,
    event_types: Vec<EventType>,
    filters: FilterEcho,
    error_message: String,
    user_role: &'static str,
    current_url: String,
}

pub async fn listing(
    State(state): State<AppState>,
    auth: AuthSession,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<ListingParams>,
) -> Response {
    let filter = EventFilter::new(
        &params.start_date,
        &params.end_date,
        &params.categories,
        &params.search,
        &params.sort,
    );

    let mut error_message = String::new();

    let event_types = match db::list_event_types(&state.pool).await {
        Ok(types) => types,
        Err(e) => {
            error!(error = ?e, "failed to load event types");
            error_message = "Failed to load events.".to_string();
            Vec::new()
        }
    };

    let events = match db::list_public_events(&state.pool, &filter, now_civil()).await {
        Ok(events) => events,
        Err(e) => {
            error!(error = ?e, "failed to load events");
            error_message = "Failed to load events.".to_string();
            Vec::new()
        }
    };

    render_html(EventsTemplate {
        events,
        event_types,
        filters: FilterEcho::new(&params, &filter),
        error_message,
        user_role: auth.role_label(),
        current_url: uri.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_echo_preserves_selections() {
        let params = ListingParams {
            start_date: "2026-06-10".to_string(),
            categories: vec!["2".to_string(), "5".to_string()],
            search: " jazz ".to_string(),
            sort: "desc".to_string(),
            ..ListingParams::default()
        };
        let filter = EventFilter::new(
            &params.start_date,
            &params.end_date,
            &params.categories,
            &params.search,
            &params.sort,
        );
        let echo = FilterEcho::new(&params, &filter);
        assert!(echo.is_category_selected(2));
        assert!(echo.is_category_selected(5));
        assert!(!echo.is_category_selected(3));
        assert_eq!(echo.search, "jazz");
        assert_eq!(echo.sort, "desc");
    }

    #[test]
    fn unknown_format_falls_back_to_grid() {
        let params = ListingParams {
            format: "carousel".to_string(),
            ..ListingParams::default()
        };
        let filter = EventFilter::default();
        assert_eq!(FilterEcho::new(&params, &filter).format, "grid");

        let params = ListingParams {
            format: "list".to_string(),
            ..ListingParams::default()
        };
        assert_eq!(FilterEcho::new(&params, &filter).format, "list");
    }
}
