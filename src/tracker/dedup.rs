//! Content-based duplicate detection for imported applications.

use crate::models::{Application, DuplicateDetail};

/// Candidates that survived deduplication and what was skipped.
#[derive(Debug, Default)]
pub struct DuplicateFilter {
    pub unique: Vec<Application>,
    pub found: usize,
    pub details: Vec<DuplicateDetail>,
}

/// Two applications describe the same posting when every descriptive field
/// matches. Identifiers and checklist progress are not compared.
pub fn is_duplicate(existing: &Application, candidate: &Application) -> bool {
    existing.school == candidate.school
        && existing.position == candidate.position
        && existing.title == candidate.title
        && existing.location == candidate.location
        && existing.deadline == candidate.deadline
        && existing.status == candidate.status
        && existing.contact == candidate.contact
        && existing.connections == candidate.connections
        && existing.link == candidate.link
        && existing.comments == candidate.comments
}

/// Split `candidates` into those with no duplicate in `existing` and a
/// report of the rest, both in input order.
///
/// Candidates are not compared with each other.
pub fn filter_duplicates(candidates: Vec<Application>, existing: &[Application]) -> DuplicateFilter {
    let mut result = DuplicateFilter::default();

    for candidate in candidates {
        if existing.iter().any(|e| is_duplicate(e, &candidate)) {
            result.found += 1;
            result.details.push(DuplicateDetail {
                school: candidate.school.clone(),
                position: candidate.position.clone(),
            });
        } else {
            result.unique.push(candidate);
        }
    }

    result
}
