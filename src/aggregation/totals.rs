use std::collections::HashMap;

use chrono::Duration;

/// Durations grouped by key. Iteration follows the order in which keys were first seen;
/// presentation code re-sorts with [Totals::sorted_desc].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Totals {
    entries: Vec<(String, Duration)>,
    index: HashMap<String, usize>,
}

impl Totals {
    pub fn add(&mut self, key: &str, duration: Duration) {
        match self.index.get(key) {
            Some(&position) => self.entries[position].1 += duration,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), duration));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<Duration> {
        self.index.get(key).map(|&position| self.entries[position].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Duration)> {
        self.entries.iter().map(|(key, duration)| (key.as_str(), *duration))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sum(&self) -> Duration {
        self.entries
            .iter()
            .fold(Duration::zero(), |acc, (_, duration)| acc + *duration)
    }

    /// Largest first. Equal durations keep their first-seen order.
    pub fn sorted_desc(&self) -> Vec<(String, Duration)> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::Totals;

    #[test]
    fn ties_keep_insertion_order() {
        let mut totals = Totals::default();
        totals.add("b", Duration::minutes(5));
        totals.add("a", Duration::minutes(5));
        totals.add("c", Duration::minutes(9));

        let sorted = totals
            .sorted_desc()
            .into_iter()
            .map(|(k, _)| k)
            .collect::<Vec<_>>();

        assert_eq!(sorted, vec!["c", "b", "a"]);
        assert_eq!(totals.len(), 3);
        assert_eq!(totals.sum(), Duration::minutes(19));
    }
}
