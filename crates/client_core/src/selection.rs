/// Selected ids in the order the user picked them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSet<Id> {
    ids: Vec<Id>,
}

impl<Id> Default for SelectionSet<Id> {
    fn default() -> Self {
        Self { ids: Vec::new() }
    }
}

impl<Id: Clone + PartialEq> SelectionSet<Id> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> &[Id] {
        &self.ids
    }

    /// Adds `id` at the end, or removes it keeping the others in pick order.
    /// Returns whether `id` is selected afterwards.
    pub fn toggle(&mut self, id: Id) -> bool {
        match self.ids.iter().position(|selected| *selected == id) {
            Some(index) => {
                self.ids.remove(index);
                false
            }
            None => {
                self.ids.push(id);
                true
            }
        }
    }

    /// Replaces the whole selection; repeated ids keep their first position.
    pub fn replace<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = Id>,
    {
        self.ids.clear();
        for id in ids {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
