use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use shared::domain::Record;

pub const DEFAULT_SORT_KEY: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: String,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: DEFAULT_SORT_KEY.to_string(),
            direction: SortDirection::Ascending,
        }
    }
}

impl SortState {
    /// Same key flips the direction; a new key starts ascending.
    pub fn request(&mut self, key: &str) {
        if self.key == key {
            self.direction = self.direction.flipped();
        } else {
            self.key = key.to_string();
            self.direction = SortDirection::Ascending;
        }
    }

    pub fn compare<T: Record>(&self, left: &T, right: &T) -> Ordering {
        let ordering = left.field(&self.key).cmp(&right.field(&self.key));
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    /// Stable ordering of `items`; ties keep their accumulation order in
    /// both directions.
    pub fn ordered<'a, T: Record>(&self, items: &'a [T]) -> Vec<&'a T> {
        let mut ordered: Vec<&T> = items.iter().collect();
        ordered.sort_by(|left, right| self.compare(*left, *right));
        ordered
    }
}
