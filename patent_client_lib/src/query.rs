//! Copy-on-modify query state: filters, sort keys and value projections.

use indexmap::IndexMap;
use serde_json::Value;

/// How projected items are shaped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Projection {
    /// An ordered mapping of field name to value per item.
    Mapping,
    /// A tuple per item; with `flat` and exactly one field, the bare value.
    Tuple { flat: bool },
}

/// A `values` / `values_list` request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValuesSpec {
    /// Accessor paths; `__` separates nested steps (`links__1__href`).
    pub fields: Vec<String>,
    pub mode: Projection,
}

impl ValuesSpec {
    /// True when items should be returned as bare scalars.
    pub fn is_flat(&self) -> bool {
        matches!(self.mode, Projection::Tuple { flat: true }) && self.fields.len() == 1
    }
}

/// The filters, sort keys and projection that scope a collection.
///
/// Every `with_*` method returns a new state and leaves the receiver untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryState {
    filters: IndexMap<String, Value>,
    sort: Vec<String>,
    values: Option<ValuesSpec>,
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filters(&self) -> &IndexMap<String, Value> {
        &self.filters
    }

    pub fn sort(&self) -> &[String] {
        &self.sort
    }

    pub fn values(&self) -> Option<&ValuesSpec> {
        self.values.as_ref()
    }

    /// Merges `filters` over the current ones; on key collision the new value wins.
    pub fn with_filters<I, K, V>(&self, filters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut next = self.clone();
        for (key, value) in filters {
            next.filters.insert(key.into(), value.into());
        }
        next
    }

    /// Appends sort keys. No deduplication and no check that the keys exist.
    pub fn with_sort<I, S>(&self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut next = self.clone();
        next.sort.extend(keys.into_iter().map(Into::into));
        next
    }

    /// Replaces the projection.
    pub fn with_values(&self, spec: ValuesSpec) -> Self {
        let mut next = self.clone();
        next.values = Some(spec);
        next
    }
}
