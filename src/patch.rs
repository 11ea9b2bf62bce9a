//! A field of a partial update that is either left alone or replaced.

use serde::{Deserialize, Deserializer};

/// One field of a partial update.
///
/// When deserializing a struct, mark `Patch` fields with `#[serde(default)]`:
/// a missing field becomes [Patch::Unchanged] and a present field, including
/// an explicit `null` for `Patch<Option<T>>`, becomes [Patch::Set].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    /// Keep the stored value.
    Unchanged,
    /// Replace the stored value.
    Set(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Unchanged
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Patch::Set)
    }
}
