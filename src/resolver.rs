//! Fuzzy catalog resolution: free-text query → canonical item key.

use crate::matcher::distance;
use crate::types::{Catalog, CatalogEntry};

/// The outcome of resolving a query against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Canonical key used for all price lookups.
    pub key: String,
    /// What to show the user: the localized display name when the query
    /// matched into it, otherwise the canonical key.
    pub display_name: String,
}

/// Resolve `query` to the best-matching catalog entry.
///
/// Two passes:
/// 1. Entries whose key or display name contains the lowercased query as a
///    literal substring; the one with the smallest edit distance wins.
/// 2. If no entry contains the query, fall back to a scan of the whole
///    catalog, again picking the global minimum distance.
///
/// A candidate's score is the smaller of its key distance and its
/// display-name distance. Ties keep the first entry encountered in catalog
/// iteration order — deliberately positional, not alphabetical, so a
/// refreshed catalog resolves the same way its document orders items.
///
/// Returns None only for an empty catalog; the fallback pass otherwise
/// always produces some candidate.
pub fn resolve(query: &str, catalog: &Catalog) -> Option<Resolution> {
    let query = query.to_lowercase();

    let containing: Vec<&CatalogEntry> = catalog
        .entries()
        .iter()
        .filter(|e| {
            e.key.to_lowercase().contains(&query)
                || e.display_name
                    .as_deref()
                    .is_some_and(|n| n.to_lowercase().contains(&query))
        })
        .collect();

    let best = if containing.is_empty() {
        closest(&query, catalog.entries().iter())
    } else {
        closest(&query, containing.iter().copied())
    }?;

    Some(to_resolution(&query, best))
}

/// Minimum-distance scan. Strict `<` keeps the first entry on ties.
fn closest<'a>(
    query: &str,
    entries: impl Iterator<Item = &'a CatalogEntry>,
) -> Option<&'a CatalogEntry> {
    let mut best: Option<&CatalogEntry> = None;
    let mut lowest = usize::MAX;

    for entry in entries {
        let d = score(query, entry);
        if d < lowest {
            lowest = d;
            best = Some(entry);
        }
    }

    best
}

/// Distance of a query to an entry: the smaller of the key distance and the
/// display-name distance, both computed case-insensitively.
fn score(query: &str, entry: &CatalogEntry) -> usize {
    let key_d = distance(query, &entry.key.to_lowercase());
    match entry.display_name.as_deref() {
        Some(name) => key_d.min(distance(query, &name.to_lowercase())),
        None => key_d,
    }
}

fn to_resolution(query: &str, entry: &CatalogEntry) -> Resolution {
    let display_name = match entry.display_name.as_deref() {
        Some(name) if name.to_lowercase().contains(query) => name.to_string(),
        _ => entry.key.clone(),
    };
    Resolution { key: entry.key.clone(), display_name }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Catalog;

    fn sword_catalog() -> Catalog {
        Catalog::from_value(&serde_json::json!({
            "diamond_sword": "Diamantschwert",
            "iron_sword": "Eisenschwert",
        }))
        .unwrap()
    }

    #[test]
    fn substring_matches_pick_smallest_distance() {
        // Both keys contain "sword"; iron_sword (distance 5) beats
        // diamond_sword (distance 8).
        let r = resolve("sword", &sword_catalog()).unwrap();
        assert_eq!(r.key, "iron_sword");
    }

    #[test]
    fn fallback_scans_whole_catalog() {
        // "swrd" is a substring of nothing — global minimum distance wins.
        let r = resolve("swrd", &sword_catalog()).unwrap();
        assert_eq!(r.key, "iron_sword");
    }

    #[test]
    fn display_name_can_win_the_substring_pass() {
        // "schwert" is only a substring of the German display names.
        // Eisenschwert (distance 5) beats Diamantschwert (distance 7), and
        // the localized name is the one shown.
        let r = resolve("schwert", &sword_catalog()).unwrap();
        assert_eq!(r.key, "iron_sword");
        assert_eq!(r.display_name, "Eisenschwert");
    }

    #[test]
    fn shown_name_is_key_when_query_matched_the_key() {
        let r = resolve("iron", &sword_catalog()).unwrap();
        assert_eq!(r.key, "iron_sword");
        assert_eq!(r.display_name, "iron_sword");
    }

    #[test]
    fn exact_key_resolves_to_itself() {
        let catalog = Catalog::from_keys(vec![
            "stone".into(),
            "stone_bricks".into(),
            "redstone".into(),
        ]);
        let r = resolve("stone", &catalog).unwrap();
        assert_eq!(r.key, "stone");
    }

    #[test]
    fn ties_keep_first_catalog_order() {
        // Both entries are distance 1 from "swore"; neither contains it.
        let catalog = Catalog::from_keys(vec!["sword".into(), "snore".into()]);
        let r = resolve("swore", &catalog).unwrap();
        assert_eq!(r.key, "sword");

        // Same entries, reversed order — the other one wins now.
        let catalog = Catalog::from_keys(vec!["snore".into(), "sword".into()]);
        let r = resolve("swore", &catalog).unwrap();
        assert_eq!(r.key, "snore");
    }

    #[test]
    fn query_case_is_ignored() {
        let r = resolve("SWORD", &sword_catalog()).unwrap();
        assert_eq!(r.key, "iron_sword");
    }

    #[test]
    fn empty_catalog_resolves_to_none() {
        assert!(resolve("anything", &Catalog::default()).is_none());
    }
}
