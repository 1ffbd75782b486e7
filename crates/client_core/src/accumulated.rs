use std::collections::HashSet;

use shared::domain::Record;

/// Insertion-ordered collection of every item fetched so far, unique by id.
///
/// Items are only ever appended; nothing is evicted for the lifetime of the
/// owning controller.
#[derive(Debug, Clone)]
pub struct AccumulatedSet<T: Record> {
    items: Vec<T>,
    ids: HashSet<T::Id>,
}

impl<T: Record> Default for AccumulatedSet<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            ids: HashSet::new(),
        }
    }
}

impl<T: Record> AccumulatedSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.ids.contains(id)
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Appends the items whose id has not been seen yet, in fetch order.
    /// Returns how many were appended; colliding items are dropped as-is.
    pub fn merge_append<I>(&mut self, page: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let before = self.items.len();
        for item in page {
            if self.ids.insert(item.id()) {
                self.items.push(item);
            }
        }
        self.items.len() - before
    }
}

/// Items fetched during one navigation that are not yet part of the
/// accumulated set. Committed in one step so a failed navigation leaves no
/// partial merge behind.
#[derive(Debug)]
pub(crate) struct StagedMerge<T: Record> {
    items: Vec<T>,
    ids: HashSet<T::Id>,
}

impl<T: Record> StagedMerge<T> {
    pub(crate) fn new() -> Self {
        Self {
            items: Vec::new(),
            ids: HashSet::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    /// Stages items unknown to both `committed` and this batch.
    pub(crate) fn stage<I>(&mut self, committed: &AccumulatedSet<T>, page: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let before = self.items.len();
        for item in page {
            let id = item.id();
            if committed.contains(&id) || self.ids.contains(&id) {
                continue;
            }
            self.ids.insert(id);
            self.items.push(item);
        }
        self.items.len() - before
    }

    pub(crate) fn commit_into(self, committed: &mut AccumulatedSet<T>) -> usize {
        committed.merge_append(self.items)
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::FieldValue;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Row {
        id: char,
        label: &'static str,
    }

    impl Record for Row {
        type Id = char;

        fn id(&self) -> char {
            self.id
        }

        fn field(&self, key: &str) -> Option<FieldValue<'_>> {
            (key == "label").then_some(FieldValue::Text(self.label))
        }
    }

    fn rows(ids: &str) -> Vec<Row> {
        ids.chars().map(|id| Row { id, label: "" }).collect()
    }

    fn ids(set: &AccumulatedSet<Row>) -> String {
        set.items().iter().map(|row| row.id).collect()
    }

    #[test]
    fn first_seen_order_wins() {
        let mut set = AccumulatedSet::new();
        assert_eq!(set.merge_append(rows("abc")), 3);
        assert_eq!(set.merge_append(rows("cda")), 1);
        assert_eq!(ids(&set), "abcd");
    }

    #[test]
    fn merging_known_ids_is_a_no_op() {
        let mut set = AccumulatedSet::new();
        set.merge_append(rows("abcd"));
        assert_eq!(set.merge_append(rows("db")), 0);
        assert_eq!(set.merge_append(Vec::new()), 0);
        assert_eq!(ids(&set), "abcd");
    }

    #[test]
    fn colliding_item_is_dropped_not_updated() {
        let mut set = AccumulatedSet::new();
        set.merge_append(vec![Row { id: 'a', label: "old" }]);
        set.merge_append(vec![Row { id: 'a', label: "new" }]);
        assert_eq!(set.items()[0].label, "old");
    }

    #[test]
    fn duplicates_inside_one_page_are_dropped() {
        let mut set = AccumulatedSet::new();
        assert_eq!(set.merge_append(rows("abab")), 2);
        assert_eq!(ids(&set), "ab");
    }

    #[test]
    fn staged_merge_only_lands_on_commit() {
        let mut set = AccumulatedSet::new();
        set.merge_append(rows("ab"));

        let mut staged = StagedMerge::new();
        assert_eq!(staged.stage(&set, rows("bcd")), 2);
        assert_eq!(staged.stage(&set, rows("de")), 1);
        assert_eq!(staged.len(), 3);
        assert_eq!(ids(&set), "ab");

        assert_eq!(staged.commit_into(&mut set), 3);
        assert_eq!(ids(&set), "abcde");
    }
}
