//! Entity kinds and their static collection mapping
//!
//! Every kind maps to exactly one collection, one node type and one remote
//! resource. The mapping is written as exhaustive matches so adding a kind
//! without completing the tables is a compile error.

use super::errors::SyncError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix shared by every mirrored collection
pub const COLLECTION_PREFIX: &str = "no.item.cristin";

/// Placeholder ids that live in every collection but are not entities
///
/// The root node of each repository carries this id and must be skipped
/// when enumerating records.
pub const PLACEHOLDER_IDS: &[&str] = &["000-000-000-000"];

/// The fixed set of entity categories mirrored from the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Persons,
    Results,
    Projects,
    Units,
    Institutions,
    ResultContributors,
    Fundings,
}

impl EntityKind {
    /// All kinds, in the order the nightly jobs run them
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Persons,
        EntityKind::Institutions,
        EntityKind::Projects,
        EntityKind::Units,
        EntityKind::Results,
        EntityKind::ResultContributors,
        EntityKind::Fundings,
    ];

    /// Short name used in configuration and on the command line
    pub fn short_name(&self) -> &'static str {
        match self {
            EntityKind::Persons => "persons",
            EntityKind::Results => "results",
            EntityKind::Projects => "projects",
            EntityKind::Units => "units",
            EntityKind::Institutions => "institutions",
            EntityKind::ResultContributors => "result-contributors",
            EntityKind::Fundings => "fundings",
        }
    }

    /// Name of the collection that stores records of this kind
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Persons => "no.item.cristin.persons",
            EntityKind::Results => "no.item.cristin.results",
            EntityKind::Projects => "no.item.cristin.projects",
            EntityKind::Units => "no.item.cristin.units",
            EntityKind::Institutions => "no.item.cristin.institutions",
            EntityKind::ResultContributors => "no.item.cristin.resultcontributors",
            EntityKind::Fundings => "no.item.cristin.fundings",
        }
    }

    /// Node type stamped on every stored record of this kind
    pub fn node_type(&self) -> &'static str {
        match self {
            EntityKind::Persons => "no.item.cristin:person",
            EntityKind::Results => "no.item.cristin:result",
            EntityKind::Projects => "no.item.cristin:project",
            EntityKind::Units => "no.item.cristin:unit",
            EntityKind::Institutions => "no.item.cristin:institution",
            EntityKind::ResultContributors => "no.item.cristin:result-contributor",
            EntityKind::Fundings => "no.item.cristin:funding",
        }
    }

    /// Singular, capitalized name used in progress messages
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Persons => "Person",
            EntityKind::Results => "Result",
            EntityKind::Projects => "Project",
            EntityKind::Units => "Unit",
            EntityKind::Institutions => "Institution",
            EntityKind::ResultContributors => "Result contributor",
            EntityKind::Fundings => "Funding",
        }
    }

    /// Field of a list entry that carries the entity's external id
    ///
    /// Result contributors are addressed by the result they belong to.
    pub fn id_field(&self) -> &'static str {
        match self {
            EntityKind::Persons => "cristin_person_id",
            EntityKind::Results => "cristin_result_id",
            EntityKind::Projects => "cristin_project_id",
            EntityKind::Units => "cristin_unit_id",
            EntityKind::Institutions => "cristin_institution_id",
            EntityKind::ResultContributors => "cristin_result_id",
            EntityKind::Fundings => "cristin_funding_id",
        }
    }

    /// Path of the single-entity resource, relative to the API base URL
    pub fn entity_path(&self, external_id: &str) -> String {
        match self {
            EntityKind::Persons => format!("persons/{external_id}"),
            EntityKind::Results => format!("results/{external_id}"),
            EntityKind::Projects => format!("projects/{external_id}"),
            EntityKind::Units => format!("units/{external_id}"),
            EntityKind::Institutions => format!("institutions/{external_id}"),
            EntityKind::ResultContributors => format!("results/{external_id}/contributors"),
            EntityKind::Fundings => format!("fundings/{external_id}"),
        }
    }

    /// Path of the paginated list resource used to discover entities
    ///
    /// Result contributors have no list of their own; they are discovered
    /// through the results listing.
    pub fn list_path(&self) -> &'static str {
        match self {
            EntityKind::Persons => "persons",
            EntityKind::Results | EntityKind::ResultContributors => "results",
            EntityKind::Projects => "projects",
            EntityKind::Units => "units",
            EntityKind::Institutions => "institutions",
            EntityKind::Fundings => "fundings",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for EntityKind {
    type Err = SyncError;

    /// Parses a short name (`persons`) or a collection name
    /// (`no.item.cristin.persons`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.short_name() == needle || kind.collection() == needle)
            .ok_or_else(|| SyncError::UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use test_case::test_case;

    #[test_case("persons", EntityKind::Persons)]
    #[test_case("result-contributors", EntityKind::ResultContributors)]
    #[test_case("no.item.cristin.resultcontributors", EntityKind::ResultContributors)]
    #[test_case("no.item.cristin.institutions", EntityKind::Institutions)]
    #[test_case(" Fundings ", EntityKind::Fundings)]
    fn test_parse_kind(input: &str, expected: EntityKind) {
        assert_eq!(input.parse::<EntityKind>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_kind_fails_loudly() {
        let err = "no.item.cristin.foo".parse::<EntityKind>().unwrap_err();
        assert!(matches!(err, SyncError::UnknownKind(ref name) if name == "no.item.cristin.foo"));
    }

    #[test]
    fn test_collection_mapping_is_one_to_one() {
        let collections: HashSet<_> = EntityKind::ALL.iter().map(|k| k.collection()).collect();
        assert_eq!(collections.len(), EntityKind::ALL.len());

        for kind in EntityKind::ALL {
            assert!(kind.collection().starts_with(COLLECTION_PREFIX));
            assert_eq!(kind.collection().parse::<EntityKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_entity_paths() {
        assert_eq!(EntityKind::Persons.entity_path("7"), "persons/7");
        assert_eq!(
            EntityKind::ResultContributors.entity_path("99"),
            "results/99/contributors"
        );
        assert_eq!(EntityKind::ResultContributors.list_path(), "results");
    }

    #[test]
    fn test_serde_uses_short_names() {
        let json = serde_json::to_string(&EntityKind::ResultContributors).unwrap();
        assert_eq!(json, "\"result-contributors\"");
    }
}
