//! Import plans
//!
//! A plan says where a full import gets its list from and whether each entry
//! is stored as listed or replaced by a single-entity fetch.

use crate::adapters::cristin::ListQuery;
use crate::config::ImportConfig;
use crate::domain::EntityKind;

/// Where the complete external list comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSource {
    /// One request returns everything
    SinglePage { page_size: usize },
    /// Pages are fetched until a short page or the page cap
    Paginated { page_size: usize, max_pages: usize },
}

/// Everything a full import of one kind needs to know
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportPlan {
    pub kind: EntityKind,
    pub source: ListSource,
    pub query: ListQuery,
    /// Store the single-entity payload instead of the list entry
    pub detail_fetch: bool,
}

impl ImportPlan {
    /// Paginated plan with `fields=all`, sized by the import settings
    pub fn for_kind(kind: EntityKind, config: &ImportConfig) -> Self {
        let plan = Self {
            kind,
            source: ListSource::Paginated {
                page_size: config.page_size,
                max_pages: config.max_pages,
            },
            query: ListQuery::all_fields(),
            detail_fetch: false,
        };

        match kind {
            // Contributors are listed through results and fetched one by one
            EntityKind::ResultContributors => plan.with_detail_fetch(),
            EntityKind::Persons
            | EntityKind::Results
            | EntityKind::Projects
            | EntityKind::Units
            | EntityKind::Institutions
            | EntityKind::Fundings => plan,
        }
    }

    pub fn with_detail_fetch(mut self) -> Self {
        self.detail_fetch = true;
        self
    }

    pub fn with_source(mut self, source: ListSource) -> Self {
        self.source = source;
        self
    }

    /// Restricts the list to one institution
    pub fn with_institution(mut self, institution: impl Into<String>) -> Self {
        self.query = self.query.with("institution", institution);
        self
    }

    /// True when the plan lists results, which must be filtered by institution
    ///
    /// Contributors are discovered through the result listing, so they need
    /// the same filter.
    pub fn requires_institution(&self) -> bool {
        self.kind.list_path() == EntityKind::Results.list_path()
    }

    pub fn has_institution(&self) -> bool {
        self.query.params().iter().any(|(k, _)| k == "institution")
    }
}
