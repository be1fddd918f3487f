//! Ordered, queryable views over mocked records.

#[cfg(test)]
mod tests;

use crate::{
    db::{MockClass, MockInstance, StoreError},
    error::{ErrorOrigin, InternalError},
    stub::{CallLevel, CallSite, DispatchError},
    value::{RecordId, Value, order_cmp},
};
use derive_more::Display;
use std::{cmp::Ordering, slice};

///
/// Direction
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
pub enum Direction {
    #[default]
    #[display("asc")]
    Asc,
    #[display("desc")]
    Desc,
}

///
/// Relation
///
/// Ordered sequence of values: usually records, but raw values may be
/// appended and are carried through iteration and counting. Queries look
/// at record entries only. A relation never owns the records it lists;
/// removing an entry from it leaves the store untouched.
///
/// When bound to a class, the class's scopes are reachable through
/// [`Relation::scope`].
///

#[derive(Clone, Debug, Default)]
pub struct Relation {
    items: Vec<Value>,
    class: Option<MockClass>,
}

impl Relation {
    #[must_use]
    pub const fn new(items: Vec<Value>) -> Self {
        Self { items, class: None }
    }

    #[must_use]
    pub fn with_class(items: Vec<Value>, class: &MockClass) -> Self {
        Self {
            items,
            class: Some(class.clone()),
        }
    }

    /// Empty relation that keeps the class binding.
    #[must_use]
    pub fn none(class: &MockClass) -> Self {
        Self::with_class(Vec::new(), class)
    }

    pub(crate) fn from_records(records: Vec<MockInstance>, class: &MockClass) -> Self {
        Self::with_class(records.into_iter().map(Value::Record).collect(), class)
    }

    #[must_use]
    pub const fn class(&self) -> Option<&MockClass> {
        self.class.as_ref()
    }

    // ------------------------------------------------------------------
    // Sequence
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub const fn count(&self) -> usize {
        self.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Value> {
        self.items.iter()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    /// Append a value. Nothing is written to it.
    pub fn push(&mut self, value: impl Into<Value>) {
        self.items.push(value.into());
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.items.clone()
    }

    /// Record entries in sequence order.
    pub fn records(&self) -> impl Iterator<Item = &MockInstance> {
        self.items.iter().filter_map(Value::as_record)
    }

    #[must_use]
    pub fn first(&self) -> Option<MockInstance> {
        self.records().next().cloned()
    }

    #[must_use]
    pub fn last(&self) -> Option<MockInstance> {
        self.records().last().cloned()
    }

    pub(crate) fn contains_record(&self, record: &MockInstance) -> bool {
        self.records().any(|r| r.ptr_eq(record))
    }

    pub(crate) fn retain(&mut self, keep: impl FnMut(&Value) -> bool) {
        self.items.retain(keep);
    }

    fn derive(&self, records: impl IntoIterator<Item = MockInstance>) -> Self {
        Self {
            items: records.into_iter().map(Value::Record).collect(),
            class: self.class.clone(),
        }
    }

    fn class_label(&self) -> String {
        self.class
            .as_ref()
            .map(|c| c.name().to_string())
            .or_else(|| self.first().map(|r| r.class().name().to_string()))
            .unwrap_or_else(|| "Record".to_string())
    }

    // ------------------------------------------------------------------
    // Finders
    // ------------------------------------------------------------------

    pub fn find(&self, id: RecordId) -> Result<MockInstance, InternalError> {
        self.records()
            .find(|r| r.id() == Some(id))
            .cloned()
            .ok_or_else(|| {
                StoreError::NotFound {
                    class: self.class_label(),
                    id,
                }
                .into()
            })
    }

    /// First record equal on every predicate entry.
    pub fn find_by(
        &self,
        predicate: &[(String, Value)],
    ) -> Result<Option<MockInstance>, InternalError> {
        for record in self.records() {
            if record.matches(predicate)? {
                return Ok(Some(record.clone()));
            }
        }

        Ok(None)
    }

    pub fn find_by_strict(
        &self,
        predicate: &[(String, Value)],
    ) -> Result<MockInstance, InternalError> {
        self.find_by(predicate)?.ok_or_else(|| {
            StoreError::NotFoundBy {
                class: self.class_label(),
            }
            .into()
        })
    }

    /// Whether any record matches; an empty predicate asks whether any
    /// record is present at all.
    pub fn exists(&self, predicate: &[(String, Value)]) -> Result<bool, InternalError> {
        Ok(self.find_by(predicate)?.is_some())
    }

    // ------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------

    /// Records matching every entry. A list value means membership.
    pub fn where_eq(&self, predicate: &[(String, Value)]) -> Result<Self, InternalError> {
        self.filter(predicate, true)
    }

    /// Records that do not match the predicate as a whole.
    pub fn where_not(&self, predicate: &[(String, Value)]) -> Result<Self, InternalError> {
        self.filter(predicate, false)
    }

    fn filter(&self, predicate: &[(String, Value)], keep: bool) -> Result<Self, InternalError> {
        let mut kept = Vec::new();
        for record in self.records() {
            if record.matches(predicate)? == keep {
                kept.push(record.clone());
            }
        }

        Ok(self.derive(kept))
    }

    #[must_use]
    pub fn limit(&self, limit: usize) -> Self {
        self.derive(self.records().take(limit).cloned())
    }

    /// Stable sort by one attribute. Nulls sort first ascending.
    pub fn order_by(&self, attr: &str, direction: Direction) -> Result<Self, InternalError> {
        let mut keyed = Vec::new();
        for record in self.records() {
            keyed.push((record.get(attr)?, record.clone()));
        }

        // Every non-null key must be comparable with every other one.
        if let Some((anchor, _)) = keyed.iter().find(|(key, _)| !key.is_null())
            && let Some((bad, _)) = keyed
                .iter()
                .find(|(key, _)| order_cmp(anchor, key).is_none())
        {
            return Err(InternalError::argument(
                ErrorOrigin::Relation,
                format!(
                    "cannot order {} by '{attr}': {} and {} values do not compare",
                    self.class_label(),
                    anchor.type_name(),
                    bad.type_name(),
                ),
            ));
        }

        keyed.sort_by(|(a, _), (b, _)| {
            let ord = order_cmp(a, b).unwrap_or(Ordering::Equal);
            match direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        });

        Ok(self.derive(keyed.into_iter().map(|(_, record)| record)))
    }

    #[must_use]
    pub fn reverse_order(&self) -> Self {
        let mut records: Vec<_> = self.records().cloned().collect();
        records.reverse();

        self.derive(records)
    }

    // ------------------------------------------------------------------
    // Projections
    // ------------------------------------------------------------------

    pub fn pluck(&self, attr: &str) -> Result<Vec<Value>, InternalError> {
        self.records().map(|r| r.get(attr)).collect()
    }

    /// Identities of the persisted records.
    #[must_use]
    pub fn ids(&self) -> Vec<RecordId> {
        self.records().filter_map(MockInstance::id).collect()
    }

    // ------------------------------------------------------------------
    // Aggregates
    // ------------------------------------------------------------------

    fn numeric(&self, attr: &str, op: &str) -> Result<Vec<Value>, InternalError> {
        let mut out = Vec::new();
        for value in self.pluck(attr)? {
            match value {
                Value::Null => {}
                Value::Int(_) | Value::Float(_) => out.push(value),
                other => {
                    return Err(InternalError::argument(
                        ErrorOrigin::Relation,
                        format!(
                            "cannot {op} non-numeric {} value in '{attr}'",
                            other.type_name()
                        ),
                    ));
                }
            }
        }

        Ok(out)
    }

    /// Integer sum when every value is an integer, float sum otherwise.
    /// Nulls are skipped; an empty column sums to `0`.
    pub fn sum(&self, attr: &str) -> Result<Value, InternalError> {
        let values = self.numeric(attr, "sum")?;

        if values.iter().all(|v| matches!(v, Value::Int(_))) {
            let total = values
                .iter()
                .filter_map(Value::as_int)
                .fold(0i64, i64::saturating_add);
            return Ok(Value::Int(total));
        }

        Ok(Value::Float(values.iter().filter_map(Value::as_float).sum()))
    }

    #[expect(clippy::cast_precision_loss)]
    pub fn average(&self, attr: &str) -> Result<Option<f64>, InternalError> {
        let values = self.numeric(attr, "average")?;
        if values.is_empty() {
            return Ok(None);
        }

        let total: f64 = values.iter().filter_map(Value::as_float).sum();

        Ok(Some(total / values.len() as f64))
    }

    pub fn minimum(&self, attr: &str) -> Result<Option<Value>, InternalError> {
        self.extreme(attr, Ordering::Less)
    }

    pub fn maximum(&self, attr: &str) -> Result<Option<Value>, InternalError> {
        self.extreme(attr, Ordering::Greater)
    }

    fn extreme(&self, attr: &str, wanted: Ordering) -> Result<Option<Value>, InternalError> {
        let mut best: Option<Value> = None;

        for value in self.pluck(attr)? {
            if value.is_null() {
                continue;
            }
            let Some(current) = &best else {
                best = Some(value);
                continue;
            };
            match order_cmp(&value, current) {
                Some(ord) if ord == wanted => best = Some(value),
                Some(_) => {}
                None => {
                    return Err(InternalError::argument(
                        ErrorOrigin::Relation,
                        format!(
                            "cannot compare {} with {} in '{attr}'",
                            value.type_name(),
                            current.type_name()
                        ),
                    ));
                }
            }
        }

        Ok(best)
    }

    // ------------------------------------------------------------------
    // Bulk mutation
    // ------------------------------------------------------------------

    /// Assign `attrs` to every record in place, returning how many were
    /// touched. Keys are checked against every record before any write.
    pub fn update_all(&self, attrs: &[(String, Value)]) -> Result<usize, InternalError> {
        for record in self.records() {
            record.check_keys(attrs)?;
        }

        let mut touched = 0;
        for record in self.records() {
            record.assign_attributes(attrs.to_vec())?;
            touched += 1;
        }

        Ok(touched)
    }

    /// Remove every listed record from its store and drop it from this
    /// relation. Raw values stay.
    pub fn delete_all(&mut self) -> usize {
        let mut removed = 0;
        for record in self.records() {
            if record.delete() {
                removed += 1;
            }
        }
        self.items.retain(|v| v.as_record().is_none());

        removed
    }

    // ------------------------------------------------------------------
    // Scopes
    // ------------------------------------------------------------------

    /// Apply a named scope of the bound class to this relation.
    #[track_caller]
    pub fn scope(&self, name: &str, args: &[Value]) -> Result<Self, InternalError> {
        let site = CallSite::here();

        let Some(class) = &self.class else {
            let err: InternalError =
                DispatchError::no_method(CallLevel::Class, name, "Relation").into();
            return Err(err.at(site.location()));
        };

        class.apply_scope(self, name, args, site)
    }
}

impl IntoIterator for Relation {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Relation {
    type Item = &'a Value;
    type IntoIter = slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
