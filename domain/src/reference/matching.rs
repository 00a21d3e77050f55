//! Tiered best-match selection.
//!
//! Storage lookups return up to [`CANDIDATE_LIMIT`] rows containing the
//! needle somewhere. [`select_best_match`] then ranks them on a normalized
//! key:
//!
//! | Tier | Rule |
//! |------|------|
//! | `Exact` | normalized key == normalized needle |
//! | `Prefix` | normalized key starts with the needle |
//! | `Substring` | normalized key contains the needle |
//!
//! The best non-empty tier wins. Several winners in that tier are reported
//! as ambiguous; the selector never picks one arbitrarily.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Rows fetched per entity kind before tiered matching.
pub const CANDIDATE_LIMIT: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    Substring,
    Prefix,
    Exact,
}

impl MatchTier {
    /// Base score used to rank candidates across tiers.
    pub fn base_score(&self) -> f64 {
        match self {
            MatchTier::Exact => 1.0,
            MatchTier::Prefix => 0.75,
            MatchTier::Substring => 0.5,
        }
    }
}

/// Normalize a key for comparison: lowercase, runs of non-alphanumerics
/// collapsed to a single `-`, leading/trailing `-` trimmed.
///
/// `"Key Takeaways"`, `"key-takeaways"` and `"KEY_TAKEAWAYS!"` all normalize
/// to `"key-takeaways"`.
pub fn normalize_key(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

/// Classify one key against an already-normalized needle.
pub fn classify(normalized_needle: &str, key: &str) -> Option<MatchTier> {
    if normalized_needle.is_empty() {
        return None;
    }
    let key = normalize_key(key);
    if key == normalized_needle {
        Some(MatchTier::Exact)
    } else if key.starts_with(normalized_needle) {
        Some(MatchTier::Prefix)
    } else if key.contains(normalized_needle) {
        Some(MatchTier::Substring)
    } else {
        None
    }
}

/// Score within a tier: the closer the key length is to the needle, the
/// higher. Stays strictly below the next tier's base score.
pub fn score(tier: MatchTier, normalized_needle: &str, key: &str) -> f64 {
    let key_len = normalize_key(key).chars().count().max(1) as f64;
    let needle_len = normalized_needle.chars().count() as f64;
    tier.base_score() + 0.2 * (needle_len / key_len).min(1.0)
}

/// Result of tiered matching over a candidate set.
#[derive(Debug, Clone, PartialEq)]
pub enum BestMatch<T> {
    None,
    Single { tier: MatchTier, item: T },
    Ambiguous { tier: MatchTier, items: Vec<T> },
}

impl<T> BestMatch<T> {
    pub fn tier(&self) -> Option<MatchTier> {
        match self {
            BestMatch::None => None,
            BestMatch::Single { tier, .. } | BestMatch::Ambiguous { tier, .. } => Some(*tier),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, BestMatch::None)
    }
}

/// Pick the best match among `candidates`.
///
/// `keys` returns every string an item may be matched on (a source matches
/// on both its external id and its title); the best tier across its keys
/// counts. `order_key` gives ambiguous results a stable order so the outcome
/// does not depend on the order rows came back from storage.
pub fn select_best_match<T, K, O>(
    candidates: Vec<T>,
    needle: &str,
    keys: K,
    order_key: O,
) -> BestMatch<T>
where
    K: Fn(&T) -> Vec<String>,
    O: Fn(&T) -> String,
{
    let needle = normalize_key(needle);
    let mut best: Option<MatchTier> = None;
    let mut winners: Vec<(f64, String, T)> = Vec::new();

    for item in candidates {
        let classified = keys(&item)
            .iter()
            .filter_map(|k| classify(&needle, k).map(|tier| (tier, score(tier, &needle, k))))
            .max_by(|a, b| a.0.cmp(&b.0).then(a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal)));

        let Some((tier, item_score)) = classified else {
            continue;
        };

        match best {
            Some(current) if tier < current => continue,
            Some(current) if tier > current => {
                winners.clear();
                best = Some(tier);
            }
            None => best = Some(tier),
            _ => {}
        }
        let order = order_key(&item);
        winners.push((item_score, order, item));
    }

    let Some(tier) = best else {
        return BestMatch::None;
    };

    if winners.len() == 1 {
        let (_, _, item) = winners.remove(0);
        return BestMatch::Single { tier, item };
    }

    winners.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.1.cmp(&b.1))
    });
    BestMatch::Ambiguous {
        tier,
        items: winners.into_iter().map(|(_, _, item)| item).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn best(candidates: Vec<String>, needle: &str) -> BestMatch<String> {
        select_best_match(candidates, needle, |s| vec![s.clone()], |s| s.clone())
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Key Takeaways"), "key-takeaways");
        assert_eq!(normalize_key("  KEY_TAKEAWAYS! "), "key-takeaways");
        assert_eq!(normalize_key("report.pdf"), "report-pdf");
        assert_eq!(normalize_key("--"), "");
    }

    #[test]
    fn test_exact_beats_prefix() {
        let result = best(names(&["report-final.pdf", "report"]), "report");
        assert_eq!(
            result,
            BestMatch::Single {
                tier: MatchTier::Exact,
                item: "report".to_string()
            }
        );
    }

    #[test]
    fn test_prefix_tie_is_ambiguous() {
        let result = best(names(&["report.pdf", "report-final.pdf"]), "report");
        match result {
            BestMatch::Ambiguous { tier, items } => {
                assert_eq!(tier, MatchTier::Prefix);
                assert_eq!(items.len(), 2);
                // shorter key ranks first
                assert_eq!(items[0], "report.pdf");
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_prefix_beats_substring() {
        let result = best(names(&["annual-report", "report-q3"]), "report");
        assert_eq!(result.tier(), Some(MatchTier::Prefix));
        assert!(matches!(result, BestMatch::Single { item, .. } if item == "report-q3"));
    }

    #[test]
    fn test_no_match() {
        assert!(best(names(&["alpha", "beta"]), "gamma").is_none());
        assert!(best(names(&["alpha"]), "!!").is_none());
    }

    #[test]
    fn test_multiple_keys_use_best_tier() {
        let items = vec![("yt-123".to_string(), "Launch interview".to_string())];
        let result = select_best_match(
            items,
            "yt-123",
            |(ext, title)| vec![ext.clone(), title.clone()],
            |(ext, _)| ext.clone(),
        );
        assert_eq!(result.tier(), Some(MatchTier::Exact));
    }

    #[test]
    fn test_classification_independent_of_order() {
        let sets = [
            names(&["report.pdf", "report-final.pdf", "old-report"]),
            names(&["old-report", "report-final.pdf", "report.pdf"]),
            names(&["report-final.pdf", "old-report", "report.pdf"]),
        ];
        let results: Vec<BestMatch<String>> =
            sets.iter().map(|s| best(s.clone(), "report")).collect();
        for r in &results {
            assert_eq!(r, &results[0]);
        }
    }
}
