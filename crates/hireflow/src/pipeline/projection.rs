use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{Candidate, TeamMemberId};
use super::stages::StageId;

/// Declarative board filter. Replaced wholesale on every change; unset fields impose no
/// constraint and every set field must hold (AND semantics).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub status: BTreeSet<StageId>,
    pub assignee: Option<TeamMemberId>,
    pub tags: BTreeSet<String>,
    pub min_fit_index: Option<u8>,
    pub max_fit_index: Option<u8>,
    pub applied_after: Option<NaiveDate>,
    pub applied_before: Option<NaiveDate>,
    pub unassigned: bool,
    pub search: Option<String>,
}

impl FilterCriteria {
    pub fn matches(&self, candidate: &Candidate) -> bool {
        self.matches_status(candidate)
            && self.matches_assignee(candidate)
            && self.matches_tags(candidate)
            && self.matches_fit(candidate)
            && self.matches_applied(candidate)
            && self.matches_search(candidate)
    }

    /// Number of active constraints, for "n filters applied" chips.
    pub fn active_count(&self) -> usize {
        [
            !self.status.is_empty(),
            self.assignee.is_some(),
            !self.tags.is_empty(),
            self.min_fit_index.is_some(),
            self.max_fit_index.is_some(),
            self.applied_after.is_some(),
            self.applied_before.is_some(),
            self.unassigned,
            self.search_needle().is_some(),
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    fn matches_status(&self, candidate: &Candidate) -> bool {
        self.status.is_empty() || self.status.contains(candidate.stage())
    }

    fn matches_assignee(&self, candidate: &Candidate) -> bool {
        let wanted = match &self.assignee {
            Some(assignee) => candidate.assignee.as_ref() == Some(assignee),
            None => true,
        };
        wanted && (!self.unassigned || candidate.assignee.is_none())
    }

    fn matches_tags(&self, candidate: &Candidate) -> bool {
        self.tags.is_subset(&candidate.tags)
    }

    fn matches_fit(&self, candidate: &Candidate) -> bool {
        if self.min_fit_index.is_none() && self.max_fit_index.is_none() {
            return true;
        }
        let Some(fit) = candidate.fit_index else {
            return false;
        };
        self.min_fit_index.map_or(true, |min| fit >= min)
            && self.max_fit_index.map_or(true, |max| fit <= max)
    }

    fn matches_applied(&self, candidate: &Candidate) -> bool {
        let applied_on = candidate.applied_at.date_naive();
        self.applied_after.map_or(true, |after| applied_on >= after)
            && self.applied_before.map_or(true, |before| applied_on <= before)
    }

    fn matches_search(&self, candidate: &Candidate) -> bool {
        let Some(needle) = self.search_needle() else {
            return true;
        };
        candidate.candidate_name.to_lowercase().contains(&needle)
            || candidate
                .email
                .as_deref()
                .is_some_and(|email| email.to_lowercase().contains(&needle))
    }

    fn search_needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_lowercase)
    }
}

/// Board ordering options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    FitDesc,
    FitAsc,
    DateDesc,
    DateAsc,
}

impl SortKey {
    pub const fn label(self) -> &'static str {
        match self {
            Self::FitDesc => "Best fit first",
            Self::FitAsc => "Lowest fit first",
            Self::DateDesc => "Newest applications",
            Self::DateAsc => "Oldest applications",
        }
    }

    fn compare(self, a: &Candidate, b: &Candidate) -> Ordering {
        match self {
            Self::FitDesc => b.fit_index.cmp(&a.fit_index),
            Self::FitAsc => a.fit_index.cmp(&b.fit_index),
            Self::DateDesc => b.applied_at.cmp(&a.applied_at),
            Self::DateAsc => a.applied_at.cmp(&b.applied_at),
        }
    }
}

/// Filter and order `records` for rendering.
///
/// The sort is stable, so equal keys keep the order of `records`. Missing fit indexes
/// compare below every score.
pub fn project<'a>(
    records: &'a [Candidate],
    criteria: &FilterCriteria,
    sort: SortKey,
) -> Vec<&'a Candidate> {
    let mut projected: Vec<&Candidate> = records
        .iter()
        .filter(|candidate| criteria.matches(candidate))
        .collect();
    projected.sort_by(|a, b| sort.compare(a, b));
    projected
}
