//! Row-to-tree materialization
//!
//! Turns the flat rows of a one-to-many join into parent aggregates that own
//! deduplicated children.
//!
//! ## Algorithm
//!
//! Parents are accumulated in an identity-keyed index for the whole pass, so
//! rows for one parent may arrive in any order and interleaved with other
//! parents. Children are keyed by their declared identity, never by value:
//! a repeated `(parent, child)` pair is skipped even when its non-key columns
//! differ (fan-out from further joins).
//!
//! - First row for a parent identity builds the parent; later rows reuse it
//!   and their parent columns are ignored (first seen wins).
//! - Null child identity contributes no child.
//! - Null parent identity is a mapping error.
//! - Output keeps parents in first-seen order; children iterate in identity
//!   order.
//!
//! ## Logging
//!
//! `materialize` and `map_rows` own their boundary logging (`log_op_start!` /
//! `log_op_end!` / `log_op_error!`). `GroupingMaterializer::push` logs nothing.

use std::collections::{BTreeMap, HashMap};

use crate::errors::{RelmatError, Result};
use crate::identity::{Identity, IdentityKey};
use crate::row::FlatRow;
use crate::{log_op_end, log_op_error, log_op_start};

/// A parent aggregate: identity, the parent's own record, and its children
#[derive(Debug, Clone, PartialEq)]
pub struct ParentRecord<P, C> {
    pub id: Identity,
    pub record: P,
    children: BTreeMap<Identity, C>,
}

impl<P, C> ParentRecord<P, C> {
    pub fn new(id: Identity, record: P) -> Self {
        Self {
            id,
            record,
            children: BTreeMap::new(),
        }
    }

    /// Children in identity order
    pub fn children(&self) -> impl Iterator<Item = &C> {
        self.children.values()
    }

    /// Child identities in identity order
    pub fn child_ids(&self) -> impl Iterator<Item = &Identity> {
        self.children.keys()
    }

    pub fn child(&self, id: &Identity) -> Option<&C> {
        self.children.get(id)
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn has_child(&self, id: &Identity) -> bool {
        self.children.contains_key(id)
    }

    /// Split into the parent record and its children (identity order)
    pub fn into_parts(self) -> (P, Vec<C>) {
        (self.record, self.children.into_values().collect())
    }
}

/// Incremental grouping state for one materialization call
///
/// Exclusively owned by the call that drives it; `finish` hands the result
/// off by value.
pub struct GroupingMaterializer<P, C, FP, FC> {
    parent_key: IdentityKey,
    child_key: IdentityKey,
    build_parent: FP,
    build_child: FC,
    index: HashMap<Identity, usize>,
    parents: Vec<ParentRecord<P, C>>,
    rows_seen: u64,
}

impl<P, C, FP, FC> GroupingMaterializer<P, C, FP, FC>
where
    FP: FnMut(&FlatRow) -> Result<P>,
    FC: FnMut(&FlatRow) -> Result<C>,
{
    pub fn new(
        parent_key: IdentityKey,
        child_key: IdentityKey,
        build_parent: FP,
        build_child: FC,
    ) -> Self {
        Self {
            parent_key,
            child_key,
            build_parent,
            build_child,
            index: HashMap::new(),
            parents: Vec::new(),
            rows_seen: 0,
        }
    }

    /// Fold one row into the result
    ///
    /// # Errors
    ///
    /// - `NullParentIdentity` when the parent key column is null
    /// - `MissingColumn` / `ColumnType` / `UnsupportedIdentity` from key
    ///   extraction or the builders
    pub fn push(&mut self, row: &FlatRow) -> Result<()> {
        self.rows_seen += 1;

        let parent_id =
            self.parent_key
                .extract(row)?
                .ok_or_else(|| RelmatError::NullParentIdentity {
                    column: self.parent_key.column().to_string(),
                })?;

        let slot = match self.index.get(&parent_id) {
            Some(&slot) => slot,
            None => {
                let record = (self.build_parent)(row)?;
                let slot = self.parents.len();
                self.parents
                    .push(ParentRecord::new(parent_id.clone(), record));
                self.index.insert(parent_id, slot);
                slot
            }
        };

        let Some(child_id) = self.child_key.extract(row)? else {
            return Ok(());
        };

        let parent = &mut self.parents[slot];
        if !parent.children.contains_key(&child_id) {
            let child = (self.build_child)(row)?;
            parent.children.insert(child_id, child);
        }

        Ok(())
    }

    pub fn rows_seen(&self) -> u64 {
        self.rows_seen
    }

    pub fn parent_count(&self) -> usize {
        self.parents.len()
    }

    /// Parents in first-seen order
    pub fn finish(self) -> Vec<ParentRecord<P, C>> {
        self.parents
    }
}

/// Materialize a full row sequence into parent aggregates
///
/// Consumes `rows` once, forward-only. Any failing row (source error,
/// mapping error, builder error) aborts the call; no partial collection is
/// returned.
///
/// # Errors
///
/// The first error produced by the row source, key extraction, or a builder.
pub fn materialize<I, P, C, FP, FC>(
    rows: I,
    parent_key: IdentityKey,
    child_key: IdentityKey,
    build_parent: FP,
    build_child: FC,
) -> Result<Vec<ParentRecord<P, C>>>
where
    I: IntoIterator<Item = Result<FlatRow>>,
    FP: FnMut(&FlatRow) -> Result<P>,
    FC: FnMut(&FlatRow) -> Result<C>,
{
    log_op_start!(
        "materialize",
        parent_key = parent_key.column(),
        child_key = child_key.column()
    );
    let start = std::time::Instant::now();

    let mut grouping = GroupingMaterializer::new(parent_key, child_key, build_parent, build_child);
    let outcome = rows
        .into_iter()
        .try_for_each(|row| grouping.push(&row?));

    if let Err(e) = outcome {
        log_op_error!(
            "materialize",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            rows = grouping.rows_seen()
        );
        return Err(e);
    }

    let rows_seen = grouping.rows_seen();
    let parents = grouping.finish();
    let children: usize = parents.iter().map(ParentRecord::child_count).sum();

    log_op_end!(
        "materialize",
        duration_ms = start.elapsed().as_millis() as u64,
        rows = rows_seen,
        parents = parents.len() as u64,
        children = children as u64
    );

    Ok(parents)
}

/// Map one row to one record, for queries without a nested side
///
/// # Errors
///
/// The first error produced by the row source or the mapper.
pub fn map_rows<I, T, F>(rows: I, mut mapper: F) -> Result<Vec<T>>
where
    I: IntoIterator<Item = Result<FlatRow>>,
    F: FnMut(&FlatRow) -> Result<T>,
{
    log_op_start!("map_rows");
    let start = std::time::Instant::now();

    let mapped = rows
        .into_iter()
        .map(|row| row.and_then(|r| mapper(&r)))
        .collect::<Result<Vec<T>>>();

    match mapped {
        Ok(records) => {
            log_op_end!(
                "map_rows",
                duration_ms = start.elapsed().as_millis() as u64,
                rows = records.len() as u64
            );
            Ok(records)
        }
        Err(e) => {
            log_op_error!(
                "map_rows",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            Err(e)
        }
    }
}
