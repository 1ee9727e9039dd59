use fxhash::FxHashMap as HashMap;

///
/// Per-feature counts keyed by feature id.
///
/// Ids keep the order they were first seen in, so a map seeded with the loaded features
/// renders them in load order. Merging sums counts key by key and is both associative and
/// commutative in the counts; only the id order depends on which side comes first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureCounts {
    order: Vec<String>,
    counts: HashMap<String, u64>,
}

impl FeatureCounts {
    pub fn new() -> Self {
        FeatureCounts::default()
    }

    ///
    /// Seed the map with every id at zero. Duplicate ids are kept once, at their first
    /// position.
    pub fn with_ids<'a, I>(ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counts = FeatureCounts::new();
        for id in ids {
            counts.add(id, 0);
        }
        counts
    }

    pub fn increment(&mut self, id: &str) {
        self.add(id, 1);
    }

    pub fn add(&mut self, id: &str, count: u64) {
        match self.counts.get_mut(id) {
            Some(current) => *current += count,
            None => {
                self.order.push(id.to_string());
                self.counts.insert(id.to_string(), count);
            }
        }
    }

    pub fn merge(&mut self, other: FeatureCounts) {
        let FeatureCounts { order, mut counts } = other;
        for id in order {
            if let Some(count) = counts.remove(&id) {
                self.add(&id, count);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<u64> {
        self.counts.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Sum over all ids.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// `(id, count)` pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.order
            .iter()
            .map(|id| (id.as_str(), self.counts.get(id).copied().unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_seeded_ids_keep_load_order() {
        let mut counts = FeatureCounts::with_ids(["b", "a", "b", "c"]);
        counts.increment("c");

        let rows: Vec<(&str, u64)> = counts.iter().collect();
        assert_eq!(rows, vec![("b", 0), ("a", 0), ("c", 1)]);
    }

    #[rstest]
    fn test_merge_sums_per_id() {
        let mut left = FeatureCounts::new();
        left.increment("a");
        left.increment("b");

        let mut right = FeatureCounts::new();
        right.increment("b");
        right.increment("x");

        let mut one = left.clone();
        one.merge(right.clone());
        let mut other = right;
        other.merge(left);

        for id in ["a", "b", "x"] {
            assert_eq!(one.get(id), other.get(id));
        }
        assert_eq!(one.get("b"), Some(2));
        assert_eq!(one.total(), 4);
        assert_eq!(one.get("missing"), None);
    }
}
