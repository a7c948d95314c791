//! Code reuse statistics and similar-list detection.

use std::collections::{HashMap, HashSet};

use sdmx_model::{CodeListRecord, CodeRecord, CodeStatistics, SourceKey};

/// Placeholder codes reused by nearly every list: `_Z`, `_T`, `1`..`10`.
pub fn is_common_code(code_id: &str) -> bool {
    let id = code_id.trim();
    let mut chars = id.chars();
    let placeholder = chars.next() == Some('_')
        && chars.next().is_some_and(char::is_alphanumeric)
        && chars.next().is_none();
    let numeral = id
        .parse::<u8>()
        .is_ok_and(|n| (1..=10).contains(&n) && n.to_string() == id);
    placeholder || numeral
}

/// Base name used to spot variants of one list: `CL_FREQ2` and `SCL_FREQ` both
/// reduce to `FREQ`.
pub fn list_base_name(list_id: &str) -> String {
    let upper = list_id.trim().to_uppercase();
    let stripped = upper
        .strip_prefix("SCL_")
        .or_else(|| upper.strip_prefix("CL_"))
        .unwrap_or(&upper);
    let base = stripped
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .trim_end_matches('_');
    if base.is_empty() {
        upper.clone()
    } else {
        base.to_string()
    }
}

/// Fill `statistics` and `similar_lists` of every list from `codes`.
pub fn annotate_statistics(lists: &mut [CodeListRecord], codes: &[CodeRecord]) {
    let mut owners: HashMap<&str, HashSet<SourceKey>> = HashMap::new();
    let mut by_list: HashMap<SourceKey, Vec<&CodeRecord>> = HashMap::new();
    for code in codes {
        let key = code.list_key();
        owners
            .entry(code.code_id.as_str())
            .or_default()
            .insert(key.clone());
        by_list.entry(key).or_default().push(code);
    }

    for list in lists.iter_mut() {
        let mut stats = CodeStatistics::default();
        for code in by_list.get(&list.key()).into_iter().flatten() {
            stats.total += 1;
            if is_common_code(&code.code_id) {
                stats.common += 1;
            } else if owners
                .get(code.code_id.as_str())
                .is_some_and(|lists| lists.len() == 1)
            {
                stats.unique += 1;
            }
        }
        stats.shared = stats.total - stats.unique - stats.common;
        list.statistics = stats;
    }

    let mut by_base: Vec<(String, Vec<usize>)> = Vec::new();
    for (idx, list) in lists.iter().enumerate() {
        let base = list_base_name(&list.list_id);
        match by_base.iter_mut().find(|(name, _)| *name == base) {
            Some((_, members)) => members.push(idx),
            None => by_base.push((base, vec![idx])),
        }
    }
    let labels: Vec<String> = lists
        .iter()
        .map(|list| format!("{}:{}", list.owning_organization, list.list_id))
        .collect();
    for list in lists.iter_mut() {
        list.similar_lists.clear();
    }
    for (base, members) in by_base.iter().filter(|(_, members)| members.len() > 1) {
        tracing::debug!(
            base = %base,
            lists = %members.iter().map(|idx| labels[*idx].as_str()).collect::<Vec<_>>().join(", "),
            "similar code lists"
        );
        for idx in members {
            lists[*idx].similar_lists = members
                .iter()
                .filter(|other| *other != idx)
                .map(|other| labels[*other].clone())
                .collect();
        }
    }
}

/// Log the code ids used by the most code lists.
pub fn log_frequent_codes(codes: &[CodeRecord], limit: usize) {
    let mut usage: HashMap<&str, HashSet<SourceKey>> = HashMap::new();
    for code in codes {
        usage
            .entry(code.code_id.as_str())
            .or_default()
            .insert(code.list_key());
    }
    let mut ranked: Vec<(&str, usize)> = usage
        .into_iter()
        .map(|(code, lists)| (code, lists.len()))
        .filter(|(_, lists)| *lists > 1)
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    for (code_id, lists) in ranked.into_iter().take(limit) {
        tracing::debug!(code_id, lists, "frequent code");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_codes() {
        assert!(is_common_code("_Z"));
        assert!(is_common_code("_T"));
        assert!(is_common_code("10"));
        assert!(!is_common_code("11"));
        assert!(!is_common_code("01"));
        assert!(!is_common_code("_ZZ"));
        assert!(!is_common_code("A"));
    }

    #[test]
    fn base_names() {
        assert_eq!(list_base_name("CL_FREQ"), "FREQ");
        assert_eq!(list_base_name("scl_freq2"), "FREQ");
        assert_eq!(list_base_name("CL_AREA_2"), "AREA");
        assert_eq!(list_base_name("CL_123"), "CL_123");
    }

    #[test]
    fn statistics_split_unique_common_shared() {
        let codes = vec![
            CodeRecord::new("ESTAT", "CL_A", "X"),
            CodeRecord::new("ESTAT", "CL_A", "Y"),
            CodeRecord::new("ESTAT", "CL_A", "_Z"),
            CodeRecord::new("IMF", "CL_B", "Y"),
        ];
        let mut lists = vec![
            CodeListRecord::new("ESTAT", "CL_A", "A"),
            CodeListRecord::new("IMF", "CL_B", "B"),
        ];
        annotate_statistics(&mut lists, &codes);
        assert_eq!(
            lists[0].statistics,
            CodeStatistics {
                total: 3,
                unique: 1,
                common: 1,
                shared: 1
            }
        );
        assert_eq!(lists[1].statistics.shared, 1);
    }

    #[test]
    fn similar_lists_reference_each_other() {
        let mut lists = vec![
            CodeListRecord::new("ESTAT", "CL_FREQ", "Frequency"),
            CodeListRecord::new("ECB", "CL_AREA", "Area"),
            CodeListRecord::new("IMF", "SCL_FREQ2", "Frequency"),
        ];
        annotate_statistics(&mut lists, &[]);
        assert_eq!(lists[0].similar_lists, vec!["IMF:SCL_FREQ2"]);
        assert_eq!(lists[2].similar_lists, vec!["ESTAT:CL_FREQ"]);
        assert!(lists[1].similar_lists.is_empty());
    }
}
