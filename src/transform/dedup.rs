//! Key-based deduplication
//!
//! Both strategies return rows in the order their key first appeared, so the
//! output is deterministic for a given input order.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

/// Which duplicate survives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retain {
    /// The first row seen for a key wins; later rows are discarded
    FirstSeen,
    /// The last row seen for a key supplies the values, kept at the position
    /// of the key's first appearance
    LastSeen,
}

/// Deduplicate `rows` by `key`
pub fn dedup_by_key<T, K, I, F>(rows: I, retain: Retain, key: F) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut out: Vec<T> = Vec::new();

    for row in rows {
        match positions.entry(key(&row)) {
            Entry::Vacant(slot) => {
                slot.insert(out.len());
                out.push(row);
            }
            Entry::Occupied(slot) => {
                if retain == Retain::LastSeen {
                    out[*slot.get()] = row;
                }
            }
        }
    }

    out
}
