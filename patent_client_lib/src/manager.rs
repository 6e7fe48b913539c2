//! Lazy, pagination-transparent managers over remote collections.

use std::fmt;
use std::ops::{Bound, RangeBounds};
use std::sync::Arc;

use patent_client_api::{RawRecord, RequestParams};
use serde_json::Value;

use crate::error::PatentClientError;
use crate::model::ModelDescriptor;
use crate::query::{Projection, QueryState, ValuesSpec};
use crate::record::{FieldMap, Item, Record};
use crate::registry::ModelRegistry;
use crate::value::FieldValue;

/// The page a manager needs for an index access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based page number.
    pub number: usize,
    /// Index of the first item of the page (`number * size`).
    pub offset: usize,
    pub size: usize,
}

impl PageRequest {
    pub fn for_index(index: usize, size: usize) -> Self {
        let size = size.max(1);
        let number = index / size;
        Self {
            number,
            offset: number * size,
            size,
        }
    }
}

/// The fetch hook a collection is served by.
///
/// `params` are the manager's filters and sort keys, already renamed to the
/// remote service's parameter names. Caching, if any, happens behind this
/// trait.
pub trait Fetcher: Send + Sync {
    /// Returns the raw payloads of one page. A page past the end is empty.
    fn fetch_page(
        &self,
        params: &RequestParams,
        page: PageRequest,
    ) -> Result<Vec<RawRecord>, PatentClientError>;

    /// Returns the total number of matching items.
    fn fetch_count(&self, _params: &RequestParams) -> Result<usize, PatentClientError> {
        Err(PatentClientError::NotImplemented(
            "has no length method".to_string(),
        ))
    }
}

/// A filterable, sliceable view of a remote collection.
///
/// Deriving methods (`filter`, `order_by`, `values`, ...) return a new
/// manager and never touch the receiver. Nothing is fetched until an item
/// or the count is requested, and fetched pages are not retained between
/// calls.
#[derive(Clone)]
pub struct QueryManager {
    registry: Arc<ModelRegistry>,
    model: Arc<ModelDescriptor>,
    state: QueryState,
}

impl QueryManager {
    pub fn new(registry: Arc<ModelRegistry>, model: Arc<ModelDescriptor>) -> Self {
        Self {
            registry,
            model,
            state: QueryState::new(),
        }
    }

    fn derive(&self, state: QueryState) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            model: Arc::clone(&self.model),
            state,
        }
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn model(&self) -> &ModelDescriptor {
        &self.model
    }

    pub fn filter<I, K, V>(&self, filters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.derive(self.state.with_filters(filters))
    }

    pub fn filter_by(&self, key: &str, value: impl Into<Value>) -> Self {
        self.filter([(key, value.into())])
    }

    /// Filters on the collection's primary key.
    pub fn filter_pk(&self, value: impl Into<Value>) -> Result<Self, PatentClientError> {
        let key = self.model.config.primary_key.as_deref().ok_or_else(|| {
            PatentClientError::NotImplemented(format!(
                "{} declares no primary key",
                self.model.name()
            ))
        })?;
        Ok(self.filter_by(key, value))
    }

    pub fn order_by<I, S>(&self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.derive(self.state.with_sort(keys))
    }

    /// Items become ordered mappings of the given accessor paths.
    ///
    /// Mapping keys are the paths exactly as given, so `links__1__href`
    /// stays `links__1__href`.
    pub fn values<I, S>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.derive(self.state.with_values(ValuesSpec {
            fields: fields.into_iter().map(Into::into).collect(),
            mode: Projection::Mapping,
        }))
    }

    /// Items become tuples of the given accessor paths, or bare values when
    /// `flat` is set and exactly one path is given.
    pub fn values_list<I, S>(&self, fields: I, flat: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.derive(self.state.with_values(ValuesSpec {
            fields: fields.into_iter().map(Into::into).collect(),
            mode: Projection::Tuple { flat },
        }))
    }

    /// Always fails: the remote services offer no negative filters.
    pub fn exclude<I, K, V>(&self, _filters: I) -> Result<Self, PatentClientError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Err(PatentClientError::NotImplemented(format!(
            "{} has no exclude method",
            self.model.name()
        )))
    }

    /// Request parameters for the current state, in the remote's naming.
    pub fn params(&self) -> Result<RequestParams, PatentClientError> {
        let mut params = RequestParams::new();
        for (key, value) in self.state.filters() {
            params.insert(self.model.config.remote_key(key)?, value.clone());
        }
        if !self.state.sort().is_empty() {
            params.insert(
                "sort",
                Value::Array(
                    self.state
                        .sort()
                        .iter()
                        .map(|s| Value::String(s.clone()))
                        .collect(),
                ),
            );
        }
        Ok(params)
    }

    /// Total number of matching items in the remote collection.
    pub fn count(&self) -> Result<usize, PatentClientError> {
        let params = self.params()?;
        self.model.fetcher.fetch_count(&params).map_err(|e| match e {
            PatentClientError::NotImplemented(reason) => {
                PatentClientError::NotImplemented(format!("{}: {}", self.model.name(), reason))
            }
            other => other,
        })
    }

    pub fn len(&self) -> Result<usize, PatentClientError> {
        self.count()
    }

    pub fn is_empty(&self) -> Result<bool, PatentClientError> {
        Ok(self.count()? == 0)
    }

    /// The record at `index`, ignoring any projection.
    pub fn record_at(&self, index: usize) -> Result<Record, PatentClientError> {
        let page = PageRequest::for_index(index, self.model.config.page_size);
        let position = index - page.offset;
        let params = self.params()?;
        tracing::debug!(
            "{}[{}] -> page {} (offset {})",
            self.model.name(),
            index,
            page.number,
            page.offset
        );
        let mut rows = self.model.fetcher.fetch_page(&params, page)?;
        if position >= rows.len() {
            // an empty page past the first says nothing about the real length
            let count = if rows.is_empty() && page.offset > 0 {
                match self.count() {
                    Ok(count) => count,
                    Err(PatentClientError::NotImplemented(_)) => page.offset,
                    Err(e) => return Err(e),
                }
            } else {
                page.offset + rows.len()
            };
            return Err(PatentClientError::OutOfRange { index, count });
        }
        let raw = rows.swap_remove(position);
        Ok(Record::new(
            Arc::clone(&self.model),
            Arc::clone(&self.registry),
            raw,
        ))
    }

    /// The item at `index`: the record, or its projection.
    pub fn at(&self, index: usize) -> Result<Item, PatentClientError> {
        let record = self.record_at(index)?;
        self.project(record)
    }

    fn project(&self, record: Record) -> Result<Item, PatentClientError> {
        let spec = match self.state.values() {
            Some(spec) => spec,
            None => return Ok(Item::Record(record)),
        };
        match spec.mode {
            Projection::Mapping => {
                let mut data = FieldMap::new();
                for path in &spec.fields {
                    data.insert(path.clone(), record.accessor(path)?);
                }
                Ok(Item::Values(data))
            }
            Projection::Tuple { .. } => {
                let mut values = spec
                    .fields
                    .iter()
                    .map(|path| record.accessor(path))
                    .collect::<Result<Vec<_>, _>>()?;
                if spec.is_flat() {
                    Ok(Item::Scalar(values.pop().unwrap_or(FieldValue::Null)))
                } else {
                    Ok(Item::Tuple(values))
                }
            }
        }
    }

    /// Items in `range`, clipped to the collection length.
    pub fn slice<R>(&self, range: R) -> Result<Vec<Item>, PatentClientError>
    where
        R: RangeBounds<usize>,
    {
        self.slice_step(range, 1)
    }

    /// Every `step`-th item in `range`, clipped to the collection length.
    /// Each index is fetched separately, in order.
    pub fn slice_step<R: RangeBounds<usize>>(
        &self,
        range: R,
        step: usize,
    ) -> Result<Vec<Item>, PatentClientError> {
        if step == 0 {
            return Err(PatentClientError::InvalidInput(
                "slice step cannot be zero".to_string(),
            ));
        }
        let len = self.count()?;
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        }
        .min(len);
        let end = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => len,
        }
        .min(len);
        (start..end).step_by(step).map(|i| self.at(i)).collect()
    }

    pub fn first(&self) -> Result<Record, PatentClientError> {
        self.record_at(0)
    }

    /// The single record matching `filters`.
    ///
    /// More than one match is a `MultipleResults` error listing all of them;
    /// no match is an `OutOfRange` error for index 0.
    pub fn get<I, K, V>(&self, filters: I) -> Result<Record, PatentClientError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.filter(filters).single()
    }

    /// The single record with the given primary key.
    pub fn get_pk(&self, value: impl Into<Value>) -> Result<Record, PatentClientError> {
        self.filter_pk(value)?.single()
    }

    fn single(&self) -> Result<Record, PatentClientError> {
        let count = self.count()?;
        if count > 1 {
            let matches = self
                .all()
                .map(|record| record.map(|r| r.to_string()))
                .collect::<Result<Vec<_>, _>>()?;
            return Err(PatentClientError::MultipleResults {
                model: self.model.name().to_string(),
                matches,
            });
        }
        self.first()
    }

    /// Lazily iterates every matching record.
    pub fn all(&self) -> Iter<Record> {
        Iter::new(self.clone(), QueryManager::record_at)
    }

    /// Lazily iterates every matching item, honoring any projection.
    pub fn items(&self) -> Iter<Item> {
        Iter::new(self.clone(), QueryManager::at)
    }
}

impl fmt::Debug for QueryManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryManager")
            .field("model", &self.model.name())
            .field("state", &self.state)
            .finish()
    }
}

impl IntoIterator for QueryManager {
    type Item = Result<Item, PatentClientError>;
    type IntoIter = Iter<Item>;

    fn into_iter(self) -> Self::IntoIter {
        Iter::new(self, QueryManager::at)
    }
}

/// Iterator over a manager, bounded by its count.
///
/// The count is requested on the first call to `next`. Iteration stops after
/// the first error.
pub struct Iter<T> {
    manager: QueryManager,
    fetch: fn(&QueryManager, usize) -> Result<T, PatentClientError>,
    next: usize,
    len: Option<usize>,
    done: bool,
}

impl<T> Iter<T> {
    fn new(
        manager: QueryManager,
        fetch: fn(&QueryManager, usize) -> Result<T, PatentClientError>,
    ) -> Self {
        Self {
            manager,
            fetch,
            next: 0,
            len: None,
            done: false,
        }
    }
}

impl<T> Iterator for Iter<T> {
    type Item = Result<T, PatentClientError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let len = match self.len {
            Some(len) => len,
            None => match self.manager.count() {
                Ok(len) => {
                    self.len = Some(len);
                    len
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            },
        };
        if self.next >= len {
            self.done = true;
            return None;
        }
        let result = (self.fetch)(&self.manager, self.next);
        self.next += 1;
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::PageRequest;

    #[test]
    fn page_math() {
        assert_eq!(
            PageRequest::for_index(0, 25),
            PageRequest { number: 0, offset: 0, size: 25 }
        );
        assert_eq!(
            PageRequest::for_index(24, 25),
            PageRequest { number: 0, offset: 0, size: 25 }
        );
        assert_eq!(
            PageRequest::for_index(57, 25),
            PageRequest { number: 2, offset: 50, size: 25 }
        );
    }
}
