//! Code for handling IDs
use anyhow::{Result, ensure};
use indexmap::IndexMap;

macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(
            Clone,
            std::hash::Hash,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            serde::Deserialize,
            Debug,
            serde::Serialize,
        )]
        /// An ID type (e.g. `CellID`, `ScenarioID`, etc.)
        pub struct $name(pub std::sync::Arc<str>);

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(std::sync::Arc::from(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(std::sync::Arc::from(s))
            }
        }

        impl $name {
            /// Create a new ID from a string slice
            pub fn new(id: &str) -> Self {
                $name(std::sync::Arc::from(id))
            }
        }
    };
}
pub(crate) use define_id_type;

#[cfg(test)]
define_id_type!(GenericID);

/// Indicates that the struct has an ID field
pub trait HasID<ID> {
    /// Get the struct's ID
    fn get_id(&self) -> &ID;
}

/// Collect items into a map keyed by their IDs, checking that no ID is used twice.
///
/// # Arguments
///
/// * `iter` - The items to collect
/// * `what` - A description of the items, used in error messages
///
/// # Returns
///
/// An [`IndexMap`] preserving the order of `iter`, or an error if an ID is duplicated.
pub fn into_id_map<ID, T, I>(iter: I, what: &str) -> Result<IndexMap<ID, T>>
where
    ID: Clone + Eq + std::hash::Hash + std::fmt::Display,
    T: HasID<ID>,
    I: IntoIterator<Item = T>,
{
    let mut map = IndexMap::new();
    for item in iter {
        let id = item.get_id().clone();
        ensure!(!map.contains_key(&id), "Duplicate {what} ID found: {id}");
        map.insert(id, item);
    }

    Ok(map)
}
