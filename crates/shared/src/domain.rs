use std::{fmt, hash::Hash};

use serde::{Deserialize, Deserializer, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        // GraphQL `ID` scalars arrive either as numbers or as numeric strings.
        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                #[derive(Deserialize)]
                #[serde(untagged)]
                enum RawId {
                    Int(i64),
                    Text(String),
                }

                match RawId::deserialize(deserializer)? {
                    RawId::Int(value) => Ok(Self(value)),
                    RawId::Text(value) => value.trim().parse::<i64>().map(Self).map_err(|_| {
                        serde::de::Error::custom(format!(
                            "invalid {} '{value}'",
                            stringify!($name)
                        ))
                    }),
                }
            }
        }
    };
}

id_newtype!(VolunteerId);

/// Value of a sortable field, borrowed from the record that owns it.
///
/// Variants order before one another in declaration order, so a column that
/// mixes numbers and text still sorts deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FieldValue<'a> {
    Int(i64),
    Text(&'a str),
}

/// An entity of a remote collection that can be accumulated, deduplicated,
/// selected and sorted by a pagination controller.
pub trait Record: Clone + Send + Sync + 'static {
    type Id: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// Stable identifier, used as the deduplication key across fetches.
    fn id(&self) -> Self::Id;

    /// Sortable field by name. Unknown fields return `None` and sort first.
    fn field(&self, key: &str) -> Option<FieldValue<'_>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volunteer {
    pub id: VolunteerId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Volunteer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Record for Volunteer {
    type Id = VolunteerId;

    fn id(&self) -> VolunteerId {
        self.id
    }

    fn field(&self, key: &str) -> Option<FieldValue<'_>> {
        match key {
            "id" => Some(FieldValue::Int(self.id.0)),
            "first_name" | "firstName" => Some(FieldValue::Text(&self.first_name)),
            "last_name" | "lastName" => Some(FieldValue::Text(&self.last_name)),
            "email" => self.email.as_deref().map(FieldValue::Text),
            _ => None,
        }
    }
}
