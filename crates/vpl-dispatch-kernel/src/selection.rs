//! Filtering and ranking of discovered implementations.

use crate::descriptor::ImplDescription;
use crate::filter::FilterConfig;
use crate::matcher;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Search-location tier an implementation was found in. Lower is preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum LibPriority {
    /// Directories named explicitly by the caller or environment.
    UserDefined = 1,
    /// The package install directory.
    Package = 2,
    /// Legacy system library directories.
    Legacy = 3,
}

/// Anything that can be filtered and ranked.
pub trait Rankable {
    fn description(&self) -> &ImplDescription;
    fn priority(&self) -> LibPriority;
    /// Position in discovery order.
    fn discovery_index(&self) -> usize;
}

/// Ordering of matched implementations.
///
/// Ascending API version, then hardware before software, then search tier,
/// then discovery order.
pub fn compare_rank<C: Rankable>(a: &C, b: &C) -> Ordering {
    let (da, db) = (a.description(), b.description());
    da.api_version
        .cmp(&db.api_version)
        .then_with(|| db.is_hardware().cmp(&da.is_hardware()))
        .then_with(|| a.priority().cmp(&b.priority()))
        .then_with(|| a.discovery_index().cmp(&b.discovery_index()))
}

/// Keep the candidates accepted by every config and rank them.
pub fn select<'a, C: Rankable>(candidates: &'a [C], configs: &[FilterConfig]) -> Vec<&'a C> {
    let mut matched: Vec<&C> = candidates
        .iter()
        .filter(|c| matcher::matches_all(configs, c.description()))
        .collect();
    matched.sort_by(|a, b| compare_rank(*a, *b));
    matched
}
