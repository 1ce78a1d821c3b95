//! Search, filtering, ordering and summary counts over applications.

use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::models::{
    Application, ApplicationListing, ApplicationQuery, Progress, SchemaRegistry, SortBy, Stats,
    StatusCount,
};

/// Deadlines this close or closer are flagged urgent.
pub const URGENT_WITHIN_DAYS: i64 = 14;

/// Filter value matching every status.
pub const ALL_STATUSES: &str = "all";

/// Parse a deadline entered as `YYYY-MM-DD`. Anything else counts as no deadline.
pub fn parse_deadline(deadline: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(deadline.trim(), "%Y-%m-%d").ok()
}

/// Whole days from `today` until the deadline; negative once it has passed.
pub fn days_until_deadline(deadline: &str, today: NaiveDate) -> Option<i64> {
    parse_deadline(deadline).map(|date| (date - today).num_days())
}

fn matches_search(app: &Application, needle: &str) -> bool {
    needle.is_empty()
        || app.school.to_lowercase().contains(needle)
        || app.position.to_lowercase().contains(needle)
        || app.location.to_lowercase().contains(needle)
}

fn compare(a: &Application, b: &Application, sort: SortBy) -> Ordering {
    match sort {
        SortBy::Deadline => match (parse_deadline(&a.deadline), parse_deadline(&b.deadline)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortBy::School => a.school.to_lowercase().cmp(&b.school.to_lowercase()),
        SortBy::None => Ordering::Equal,
    }
}

pub fn progress(registry: &SchemaRegistry, app: &Application) -> Progress {
    let complete_among = |keys: &[String], values: &crate::models::ProgressMap| {
        keys.iter()
            .filter(|k| values.get(*k).is_some_and(|v| v.is_complete()))
            .count()
    };

    Progress {
        refs_completed: complete_among(&registry.reference_writers, &app.refs),
        refs_total: registry.reference_writers.len(),
        refs_required: app.num_refs,
        materials_ready: complete_among(&registry.materials, &app.materials),
        materials_total: registry.materials.len(),
    }
}

/// Applications matching `query`, ordered as requested, with derived fields.
pub fn list_applications(
    registry: &SchemaRegistry,
    applications: &[Application],
    query: &ApplicationQuery,
    today: NaiveDate,
) -> Vec<ApplicationListing> {
    let needle = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_default();
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty() && *s != ALL_STATUSES);
    let sort = query
        .sort
        .as_deref()
        .map(SortBy::from_query)
        .unwrap_or_default();

    let mut selected: Vec<&Application> = applications
        .iter()
        .filter(|app| matches_search(app, &needle))
        .filter(|app| status.map_or(true, |s| app.status == s))
        .collect();
    selected.sort_by(|a, b| compare(a, b, sort));

    selected
        .into_iter()
        .map(|app| {
            let days_left = days_until_deadline(&app.deadline, today);
            ApplicationListing {
                application: app.clone(),
                days_left,
                urgent: days_left.is_some_and(|d| d <= URGENT_WITHIN_DAYS),
                progress: progress(registry, app),
            }
        })
        .collect()
}

/// Total plus a count for every configured status, in registry order.
pub fn stats(registry: &SchemaRegistry, applications: &[Application]) -> Stats {
    Stats {
        total: applications.len(),
        by_status: registry
            .status_options
            .iter()
            .map(|status| StatusCount {
                status: status.clone(),
                count: applications.iter().filter(|a| &a.status == status).count(),
            })
            .collect(),
    }
}
