//! Filter predicate compiler.
//!
//! Four independent configuration sets become two fragments:
//!
//! - the *exclusion* fragment ANDs the node-type clause and the
//!   excluded-location clause; a node failing any of them is never delivered.
//! - the *inclusion* fragment ORs the volume clause and the
//!   included-location clause; when present a node must satisfy one of them.
//!
//! Candidates must pass exclusion AND (inclusion is absent OR inclusion).

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::ConfigurationError;
use crate::predicate::{AncestorSet, Column, Descendants, Fragment, Predicate, Restriction};
use crate::validation::Validator;

/// Node subtypes excluded when the administrator leaves the setting unset.
pub const DEFAULT_EXCLUDED_NODE_TYPES: &[i64] = &[
    137, 142, 143, 148, 150, 154, 161, 162, 201, 203, 209, 210, 211,
];

/// Session-scoped filter settings, sorted and deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterConfig {
    pub excluded_node_types: BTreeSet<i64>,
    pub excluded_volume_types: BTreeSet<i64>,
    pub excluded_location_nodes: BTreeSet<i64>,
    pub included_location_nodes: BTreeSet<i64>,
}

/// Raw settings as the administrator wrote them. `None` means unset.
#[derive(Debug, Clone, Default)]
pub struct FilterSettings {
    pub excluded_node_types: Option<String>,
    pub excluded_volume_types: Option<String>,
    pub excluded_location_nodes: Option<String>,
    pub included_location_nodes: Option<String>,
}

impl FilterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate raw settings. An unset node-type list falls back to
    /// [`DEFAULT_EXCLUDED_NODE_TYPES`]; an explicitly empty one excludes nothing.
    pub fn from_settings(settings: &FilterSettings) -> Result<Self, ConfigurationError> {
        let excluded_node_types = match &settings.excluded_node_types {
            Some(value) => Validator::sanitize_subtype_list("excluded_node_types", value)?,
            None => DEFAULT_EXCLUDED_NODE_TYPES.to_vec(),
        };
        let excluded_volume_types = Validator::sanitize_subtype_list(
            "excluded_volume_types",
            settings.excluded_volume_types.as_deref().unwrap_or(""),
        )?;
        let excluded_location_nodes = Validator::sanitize_integer_list(
            "excluded_location_nodes",
            settings.excluded_location_nodes.as_deref().unwrap_or(""),
        )?;
        let included_location_nodes = Validator::sanitize_integer_list(
            "included_location_nodes",
            settings.included_location_nodes.as_deref().unwrap_or(""),
        )?;

        Ok(Self {
            excluded_node_types: excluded_node_types.into_iter().collect(),
            excluded_volume_types: excluded_volume_types.into_iter().collect(),
            excluded_location_nodes: excluded_location_nodes.into_iter().collect(),
            included_location_nodes: included_location_nodes.into_iter().collect(),
        })
    }

    pub fn with_excluded_node_types(mut self, types: impl IntoIterator<Item = i64>) -> Self {
        self.excluded_node_types = types.into_iter().collect();
        self
    }

    pub fn with_excluded_volume_types(mut self, types: impl IntoIterator<Item = i64>) -> Self {
        self.excluded_volume_types = types.into_iter().collect();
        self
    }

    pub fn with_excluded_location_nodes(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.excluded_location_nodes = ids.into_iter().collect();
        self
    }

    pub fn with_included_location_nodes(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.included_location_nodes = ids.into_iter().collect();
        self
    }
}

/// The two fragments a traversal session filters candidates with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledFilters {
    pub exclusion: Fragment,
    pub inclusion: Fragment,
}

impl CompiledFilters {
    /// Exclusion and inclusion applied together as hard filters.
    pub fn candidate_filter(&self) -> Fragment {
        self.exclusion.clone().and(self.inclusion.clone())
    }
}

pub struct FilterCompiler;

impl FilterCompiler {
    pub fn compile(config: &FilterConfig) -> CompiledFilters {
        CompiledFilters {
            exclusion: Self::exclusion(config),
            inclusion: Self::inclusion(config),
        }
    }

    pub fn exclusion(config: &FilterConfig) -> Fragment {
        Self::type_clause(config).and(Self::excluded_location_clause(config))
    }

    pub fn inclusion(config: &FilterConfig) -> Fragment {
        Self::volume_clause(config).or(Self::included_location_clause(config))
    }

    fn type_clause(config: &FilterConfig) -> Fragment {
        if config.excluded_node_types.is_empty() {
            return Fragment::absent();
        }
        Predicate::not_in_list(Column::SubType, config.excluded_node_types.iter().copied()).into()
    }

    fn excluded_location_clause(config: &FilterConfig) -> Fragment {
        if config.excluded_location_nodes.is_empty() {
            return Fragment::absent();
        }
        Predicate::not_in_descendants(Descendants {
            restriction: Some(Restriction::Unpopulated),
            ancestors: AncestorSet::Ids(config.excluded_location_nodes.iter().copied().collect()),
        })
        .into()
    }

    fn volume_clause(config: &FilterConfig) -> Fragment {
        if config.excluded_volume_types.is_empty() {
            return Fragment::absent();
        }
        let volumes: Vec<i64> = config.excluded_volume_types.iter().copied().collect();

        Fragment::of(Predicate::not_in_list(Column::SubType, volumes.iter().copied())).and(
            Predicate::not_in_descendants(Descendants {
                restriction: None,
                ancestors: AncestorSet::ContainersOfSubtype(volumes),
            })
            .into(),
        )
    }

    fn included_location_clause(config: &FilterConfig) -> Fragment {
        if config.included_location_nodes.is_empty() {
            return Fragment::absent();
        }
        let ids = &config.included_location_nodes;

        // Ancestry rows of volumes use the negated id.
        let ancestors = ids.iter().copied().chain(ids.iter().map(|id| -id)).collect();

        Fragment::of(Predicate::in_list(Column::DataId, ids.iter().copied())).or(
            Predicate::in_descendants(Descendants {
                restriction: Some(Restriction::Unpopulated),
                ancestors: AncestorSet::Ids(ancestors),
            })
            .into(),
        )
    }
}
