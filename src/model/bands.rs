use serde::{Deserialize, Serialize};

/// One row of a threshold table: applies to every key at or above `from`
/// up to the next row's `from`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Band<K, V> {
    pub from: K,
    pub value: V
}

/// Ordered threshold lookup. Rows may be given in any order; the row with
/// the greatest `from` not above the key wins.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct BandTable<K, V>(pub Vec<Band<K, V>>);

impl<K: Ord + Copy, V: Copy> BandTable<K, V> {
    pub fn new(bands: &[(K, V)]) -> BandTable<K, V> {
        BandTable(bands.iter().map(|&(from, value)| Band { from, value }).collect())
    }

    pub fn lookup(&self, key: K) -> Option<V> {
        let sorted = self.sorted();
        sorted.iter().rev().find(|b| b.from <= key).map(|b| b.value)
    }

    /// Index of the matching row in ascending `from` order.
    pub fn band_index(&self, key: K) -> Option<usize> {
        let sorted = self.sorted();
        sorted.iter().rposition(|b| b.from <= key)
    }

    /// Rows in ascending `from` order.
    pub fn sorted(&self) -> Vec<Band<K, V>> {
        let mut bands = self.0.clone();
        bands.sort_by(|a, b| a.from.cmp(&b.from));

        bands
    }

    /// True when every key at or above `min` maps to a row.
    pub fn covers(&self, min: K) -> bool {
        self.0.iter().any(|b| b.from <= min)
    }

    pub fn has_duplicate_bounds(&self) -> bool {
        let sorted = self.sorted();
        sorted.windows(2).any(|w| w[0].from == w[1].from)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// How many entries a count band selects.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Take {
    All,
    Top(usize)
}

impl Take {
    /// Never selects more than `available`.
    pub fn resolve(&self, available: usize) -> usize {
        match self {
            Take::All => available,
            Take::Top(n) => (*n).min(available)
        }
    }
}
