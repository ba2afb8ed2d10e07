//! Listing-query construction. The filter is a plain value and the builder
//! is a pure function over it, so every clause combination can be checked
//! without a live database.

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{Postgres, QueryBuilder};

use crate::utils::datetime::{day_end, day_start, parse_date};

/// Category ids that fail to parse are coerced to a value no row can
/// carry, so bad input filters everything instead of erroring.
const IMPOSSIBLE_TYPE_ID: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Anything other than a literal `desc` sorts ascending.
    pub fn from_param(raw: &str) -> Self {
        if raw == "desc" {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn as_param(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// The public listing's optional filters, already normalized from the
/// query string.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub categories: Vec<i32>,
    pub search: Option<String>,
    pub sort: SortDirection,
}

impl EventFilter {
    pub fn new(
        start_date: &str,
        end_date: &str,
        categories: &[String],
        search: &str,
        sort: &str,
    ) -> Self {
        let search = search.trim();
        Self {
            start_date: parse_date(start_date),
            end_date: parse_date(end_date),
            categories: categories
                .iter()
                .map(|raw| raw.trim().parse().unwrap_or(IMPOSSIBLE_TYPE_ID))
                .collect(),
            search: (!search.is_empty()).then(|| search.to_string()),
            sort: SortDirection::from_param(sort),
        }
    }
}

const LISTING_COLUMNS: &str = "SELECT e.id, e.name, e.description, e.start_time, e.end_time, \
     e.location, e.host, e.url, e.link_text, e.image_path, e.event_type_id, \
     t.name AS type_name \
     FROM events e \
     LEFT JOIN event_types t ON e.event_type_id = t.id";

/// Build the public listing query. Past events are always hidden; the date
/// range keeps events whose `[start, end]` interval overlaps the filter
/// window, not only those contained in it.
pub fn build_events_query(
    filter: &EventFilter,
    now: NaiveDateTime,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(LISTING_COLUMNS);

    qb.push(" WHERE e.end_time > ");
    qb.push_bind(now);

    match (filter.start_date, filter.end_date) {
        (Some(start), Some(end)) => {
            qb.push(" AND e.start_time <= ");
            qb.push_bind(day_end(end));
            qb.push(" AND e.end_time >= ");
            qb.push_bind(day_start(start));
        }
        (Some(start), None) => {
            qb.push(" AND e.end_time >= ");
            qb.push_bind(day_start(start));
        }
        (None, Some(end)) => {
            qb.push(" AND e.start_time <= ");
            qb.push_bind(day_end(end));
        }
        (None, None) => {}
    }

    if !filter.categories.is_empty() {
        qb.push(" AND e.event_type_id = ANY(");
        qb.push_bind(filter.categories.clone());
        qb.push(")");
    }

    if let Some(term) = &filter.search {
        let pattern = format!("%{}%", term);
        qb.push(" AND (e.name ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR e.description ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }

    qb.push(" ORDER BY e.start_time ");
    qb.push(filter.sort.as_sql());

    qb
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn bare_filter_only_hides_past_events() {
        let mut qb = build_events_query(&EventFilter::default(), now());
        let sql = qb.sql();
        assert!(sql.contains("WHERE e.end_time > "));
        assert!(!sql.contains("e.start_time <= "));
        assert!(!sql.contains("ANY("));
        assert!(!sql.contains("ILIKE"));
        assert!(sql.ends_with("ORDER BY e.start_time ASC"));
    }

    #[test]
    fn both_bounds_filter_by_interval_overlap() {
        let filter = EventFilter {
            start_date: Some(date(2026, 6, 10)),
            end_date: Some(date(2026, 6, 20)),
            ..EventFilter::default()
        };
        let mut qb = build_events_query(&filter, now());
        let sql = qb.sql();
        // Overlap, not containment: start against the range end, end
        // against the range start.
        assert!(sql.contains("e.start_time <= "));
        assert!(sql.contains("e.end_time >= "));
    }

    #[test]
    fn start_only_relaxes_the_upper_side() {
        let filter = EventFilter {
            start_date: Some(date(2026, 6, 10)),
            ..EventFilter::default()
        };
        let mut qb = build_events_query(&filter, now());
        let sql = qb.sql();
        assert!(sql.contains("e.end_time >= "));
        assert!(!sql.contains("e.start_time <= "));
    }

    #[test]
    fn end_only_relaxes_the_lower_side() {
        let filter = EventFilter {
            end_date: Some(date(2026, 6, 20)),
            ..EventFilter::default()
        };
        let mut qb = build_events_query(&filter, now());
        let sql = qb.sql();
        assert!(sql.contains("e.start_time <= "));
        // The always-on past-events guard also compares end_time, with >
        // rather than >=.
        assert!(!sql.contains("e.end_time >= "));
    }

    #[test]
    fn categories_add_a_set_membership_clause() {
        let filter = EventFilter {
            categories: vec![2, 5],
            ..EventFilter::default()
        };
        let mut qb = build_events_query(&filter, now());
        assert!(qb.sql().contains("e.event_type_id = ANY("));
    }

    #[test]
    fn search_matches_name_or_description() {
        let filter = EventFilter {
            search: Some("abc".to_string()),
            ..EventFilter::default()
        };
        let mut qb = build_events_query(&filter, now());
        let sql = qb.sql();
        assert!(sql.contains("e.name ILIKE "));
        assert!(sql.contains("OR e.description ILIKE "));
    }

    #[test]
    fn descending_sort_is_honored() {
        let filter = EventFilter {
            sort: SortDirection::Desc,
            ..EventFilter::default()
        };
        let mut qb = build_events_query(&filter, now());
        assert!(qb.sql().ends_with("ORDER BY e.start_time DESC"));
    }

    #[test]
    fn filter_normalization_from_raw_params() {
        let categories = vec!["3".to_string(), "x".to_string(), " 7 ".to_string()];
        let filter = EventFilter::new("2026-06-10", "not-a-date", &categories, "  jazz  ", "desc");
        assert_eq!(filter.start_date, Some(date(2026, 6, 10)));
        assert_eq!(filter.end_date, None);
        // Non-numeric ids become an impossible match instead of an error.
        assert_eq!(filter.categories, vec![3, IMPOSSIBLE_TYPE_ID, 7]);
        assert_eq!(filter.search.as_deref(), Some("jazz"));
        assert_eq!(filter.sort, SortDirection::Desc);
    }

    #[test]
    fn blank_search_is_no_search() {
        let filter = EventFilter::new("", "", &[], "   ", "asc");
        assert!(filter.search.is_none());
        assert_eq!(filter.sort, SortDirection::Asc);
    }

    #[test]
    fn sort_defaults_to_ascending_for_unknown_values() {
        assert_eq!(SortDirection::from_param(""), SortDirection::Asc);
        assert_eq!(SortDirection::from_param("DESC"), SortDirection::Asc);
        assert_eq!(SortDirection::from_param("desc"), SortDirection::Desc);
    }
}
