//! Consolidation and filtering of flattened code lists.
//!
//! Filtering rules, applied per code list in this order:
//!
//! 1. a repeated `code_id` is dropped, the first occurrence is kept
//! 2. a code whose normalized id equals an earlier one is dropped, since both
//!    would mint the same concept URI
//! 3. self-parents, parents missing from the list, and parent cycles are
//!    dropped
//! 4. codes whose parent was dropped are dropped too, until nothing changes
//! 5. a list left without codes is excluded
//!
//! Afterwards lists sharing a `list_id` across organizations are resolved by
//! the configured [`CollisionPolicy`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use sdmx_ingest::FlattenedList;
use sdmx_model::{AgencyGroup, CodeListRecord, CodeRecord, SourceRow, normalize_component};

use crate::groups::agency_groups;
use crate::statistics::{annotate_statistics, log_frequent_codes};

/// What happens when two organizations publish the same `list_id`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// Keep the list of the earliest registry row, exclude the others.
    #[default]
    FirstSeen,
    /// Keep every list. URIs stay distinct because they include the organization.
    KeepAll,
    /// Exclude every list involved in the collision.
    ExcludeAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    DuplicateCode,
    IdentifierCollision,
    SelfParent,
    MissingParent,
    ParentCycle,
    ParentExcluded,
    EmptyList,
    ListIdCollision,
}

impl ExclusionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DuplicateCode => "duplicate code",
            Self::IdentifierCollision => "identifier collision",
            Self::SelfParent => "self parent",
            Self::MissingParent => "missing parent",
            Self::ParentCycle => "parent cycle",
            Self::ParentExcluded => "parent excluded",
            Self::EmptyList => "empty list",
            Self::ListIdCollision => "list id collision",
        }
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A code or a whole code list left out of the filtered tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    pub owning_organization: String,
    pub list_id: String,
    /// `None` when the whole list was excluded.
    pub code_id: Option<String>,
    pub reason: ExclusionReason,
}

/// The four analysis tables plus the reporting views derived from them.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub codes: Vec<CodeRecord>,
    pub lists: Vec<CodeListRecord>,
    pub filtered_codes: Vec<CodeRecord>,
    pub filtered_lists: Vec<CodeListRecord>,
    pub exclusions: Vec<Exclusion>,
    pub groups: Vec<AgencyGroup>,
}

impl Aggregation {
    pub fn exclusion_counts(&self) -> BTreeMap<ExclusionReason, usize> {
        let mut counts = BTreeMap::new();
        for exclusion in &self.exclusions {
            *counts.entry(exclusion.reason).or_insert(0) += 1;
        }
        counts
    }

    /// Number of code lists missing from the filtered tables.
    pub fn excluded_lists(&self) -> usize {
        self.exclusions
            .iter()
            .filter(|exclusion| exclusion.code_id.is_none())
            .count()
    }
}

/// Build all tables from the flattened documents, in registry order.
///
/// `sources` orders the agency groups; it may include rows whose document
/// never flattened.
pub fn aggregate(
    flattened: Vec<FlattenedList>,
    sources: &[SourceRow],
    policy: CollisionPolicy,
) -> Aggregation {
    let mut aggregation = Aggregation::default();
    for FlattenedList { list, codes } in flattened {
        let kept = filter_codes(&codes, &mut aggregation.exclusions);
        let mut filtered = list.clone();
        filtered.recompute(&kept);
        aggregation.codes.extend(codes);
        aggregation.lists.push(list);
        if filtered.code_count == 0 {
            tracing::warn!(
                organization = %filtered.owning_organization,
                list_id = %filtered.list_id,
                "code list has no codes after filtering"
            );
            aggregation
                .exclusions
                .push(list_exclusion(&filtered, ExclusionReason::EmptyList));
            continue;
        }
        aggregation.filtered_codes.extend(kept);
        aggregation.filtered_lists.push(filtered);
    }

    resolve_list_collisions(&mut aggregation, policy);
    annotate_statistics(&mut aggregation.lists, &aggregation.codes);
    annotate_statistics(&mut aggregation.filtered_lists, &aggregation.filtered_codes);
    log_frequent_codes(&aggregation.filtered_codes, 10);
    let source_order = sources
        .iter()
        .map(|row| row.owning_organization.as_str())
        .chain(aggregation.lists.iter().map(|list| list.owning_organization.as_str()));
    let groups = agency_groups(source_order, &aggregation.filtered_lists);
    aggregation.groups = groups;

    tracing::info!(
        lists = aggregation.lists.len(),
        codes = aggregation.codes.len(),
        filtered_lists = aggregation.filtered_lists.len(),
        filtered_codes = aggregation.filtered_codes.len(),
        groups = aggregation.groups.len(),
        "aggregated code lists"
    );
    aggregation
}

/// Apply the per-code rules to the codes of one list.
fn filter_codes(codes: &[CodeRecord], exclusions: &mut Vec<Exclusion>) -> Vec<CodeRecord> {
    let mut alive = vec![true; codes.len()];
    let mut reasons: Vec<Option<ExclusionReason>> = vec![None; codes.len()];

    let mut seen = HashSet::new();
    let mut seen_normalized = HashSet::new();
    for (idx, code) in codes.iter().enumerate() {
        if !seen.insert(code.code_id.as_str()) {
            reasons[idx] = Some(ExclusionReason::DuplicateCode);
        } else if !seen_normalized.insert(normalize_component(&code.code_id)) {
            reasons[idx] = Some(ExclusionReason::IdentifierCollision);
        }
        alive[idx] = reasons[idx].is_none();
    }

    let index: HashMap<&str, usize> = codes
        .iter()
        .enumerate()
        .filter(|(idx, _)| alive[*idx])
        .map(|(idx, code)| (code.code_id.as_str(), idx))
        .collect();

    let mut broken = Vec::new();
    for (idx, code) in codes.iter().enumerate().filter(|(idx, _)| alive[*idx]) {
        match code.parent_code_id.as_deref() {
            Some(parent) if parent == code.code_id => {
                broken.push((idx, ExclusionReason::SelfParent));
            }
            Some(parent) if !index.contains_key(parent) => {
                broken.push((idx, ExclusionReason::MissingParent));
            }
            _ => {}
        }
    }
    for (idx, reason) in broken {
        alive[idx] = false;
        reasons[idx] = Some(reason);
    }

    let cyclic: Vec<usize> = (0..codes.len())
        .filter(|idx| alive[*idx] && on_parent_cycle(*idx, codes, &index, &alive))
        .collect();
    for idx in cyclic {
        alive[idx] = false;
        reasons[idx] = Some(ExclusionReason::ParentCycle);
    }

    loop {
        let orphaned: Vec<usize> = (0..codes.len())
            .filter(|idx| alive[*idx])
            .filter(|idx| {
                codes[*idx]
                    .parent_code_id
                    .as_deref()
                    .and_then(|parent| index.get(parent))
                    .is_some_and(|parent_idx| !alive[*parent_idx])
            })
            .collect();
        if orphaned.is_empty() {
            break;
        }
        for idx in orphaned {
            alive[idx] = false;
            reasons[idx] = Some(ExclusionReason::ParentExcluded);
        }
    }

    let mut kept = Vec::with_capacity(codes.len());
    for (idx, code) in codes.iter().enumerate() {
        match reasons[idx] {
            None => kept.push(code.clone()),
            Some(reason) => {
                tracing::warn!(
                    organization = %code.owning_organization,
                    list_id = %code.list_id,
                    code_id = %code.code_id,
                    parent = code.parent_code_id.as_deref().unwrap_or(""),
                    %reason,
                    "code excluded"
                );
                exclusions.push(Exclusion {
                    owning_organization: code.owning_organization.clone(),
                    list_id: code.list_id.clone(),
                    code_id: Some(code.code_id.clone()),
                    reason,
                });
            }
        }
    }
    kept
}

/// Follow parent links from `start`, visiting each code at most once.
/// Returns true when the walk comes back to `start`.
fn on_parent_cycle(
    start: usize,
    codes: &[CodeRecord],
    index: &HashMap<&str, usize>,
    alive: &[bool],
) -> bool {
    let mut visited = HashSet::new();
    let mut current = start;
    loop {
        let Some(next) = codes[current]
            .parent_code_id
            .as_deref()
            .and_then(|parent| index.get(parent).copied())
        else {
            return false;
        };
        if !alive[next] {
            return false;
        }
        if next == start {
            return true;
        }
        if !visited.insert(next) {
            return false;
        }
        current = next;
    }
}

fn resolve_list_collisions(aggregation: &mut Aggregation, policy: CollisionPolicy) {
    let mut by_list_id: Vec<(String, Vec<usize>)> = Vec::new();
    for (idx, list) in aggregation.filtered_lists.iter().enumerate() {
        let list_id = normalize_component(&list.list_id);
        match by_list_id.iter_mut().find(|(id, _)| *id == list_id) {
            Some((_, members)) => members.push(idx),
            None => by_list_id.push((list_id, vec![idx])),
        }
    }

    let mut dropped = HashSet::new();
    for (list_id, members) in by_list_id.iter().filter(|(_, members)| members.len() > 1) {
        let organizations: Vec<&str> = members
            .iter()
            .map(|idx| aggregation.filtered_lists[*idx].owning_organization.as_str())
            .collect();
        tracing::warn!(
            list_id = %list_id,
            organizations = %organizations.join(", "),
            ?policy,
            "list id published by several organizations"
        );
        match policy {
            CollisionPolicy::FirstSeen => dropped.extend(members.iter().skip(1).copied()),
            CollisionPolicy::KeepAll => {}
            CollisionPolicy::ExcludeAll => dropped.extend(members.iter().copied()),
        }
    }
    if dropped.is_empty() {
        return;
    }

    let mut dropped_keys = HashSet::new();
    let lists = std::mem::take(&mut aggregation.filtered_lists);
    for (idx, list) in lists.into_iter().enumerate() {
        if dropped.contains(&idx) {
            aggregation
                .exclusions
                .push(list_exclusion(&list, ExclusionReason::ListIdCollision));
            dropped_keys.insert(list.key());
        } else {
            aggregation.filtered_lists.push(list);
        }
    }
    aggregation
        .filtered_codes
        .retain(|code| !dropped_keys.contains(&code.list_key()));
}

fn list_exclusion(list: &CodeListRecord, reason: ExclusionReason) -> Exclusion {
    Exclusion {
        owning_organization: list.owning_organization.clone(),
        list_id: list.list_id.clone(),
        code_id: None,
        reason,
    }
}
