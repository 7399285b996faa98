//! Array columns
//!
//! An array column owns an inner column holding every element of every
//! row back to back, plus a u64 offsets column in prefix-sum form:
//! `offsets[i]` counts all inner elements through row i inclusive. The
//! server emits per-block offsets starting from zero, so a streaming
//! load into a non-empty column rebases the new batch by the last prior
//! offset to keep the sums global.

use std::io::{Read, Write};

use crate::types::Type;
use crate::{BlockError, Result};

use super::numeric::ColumnVector;
use super::{Column, DataView};

/// Column of Array(T).
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnArray {
    inner: Box<Column>,
    offsets: ColumnVector<u64>,
}

impl ColumnArray {
    /// An empty array column over an empty inner column.
    pub fn new(inner: Column) -> Self {
        debug_assert!(inner.size() == 0, "inner column must start empty");
        Self {
            inner: Box::new(inner),
            offsets: ColumnVector::new(),
        }
    }

    pub fn column_type(&self) -> Type {
        Type::array(self.inner.column_type())
    }

    pub fn size(&self) -> usize {
        self.offsets.size()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Index of the first inner element of row n.
    pub fn offset_of(&self, n: usize) -> usize {
        if n == 0 {
            0
        } else {
            self.offsets[n - 1] as usize
        }
    }

    /// Number of inner elements in row n.
    pub fn size_of(&self, n: usize) -> Result<usize> {
        let end = self.offsets.at(n)? as usize;
        Ok(end - self.offset_of(n))
    }

    pub fn inner(&self) -> &Column {
        &self.inner
    }

    pub fn offsets(&self) -> &ColumnVector<u64> {
        &self.offsets
    }

    /// Appends one row holding all rows of `row` as its elements. The
    /// element type must match the inner type.
    pub fn append_as_column(&mut self, row: &Column) -> Result<()> {
        if row.column_type() != self.inner.column_type() {
            return Err(BlockError::TypeMismatch {
                from: row.column_type().name(),
                to: self.inner.column_type().name(),
            });
        }
        let last = self.offsets.last().unwrap_or(0);
        self.offsets.append(last + row.size() as u64);
        self.inner.append(row);
        Ok(())
    }

    /// Appends one empty row.
    pub(crate) fn append_empty_row(&mut self) {
        let last = self.offsets.last().unwrap_or(0);
        self.offsets.append(last);
    }

    /// Row n as an independent column of the element type.
    pub fn get_as_column(&self, n: usize) -> Result<Column> {
        let len = self.size_of(n)?;
        Ok(self.inner.slice(self.offset_of(n), len))
    }

    /// Zero-copy view of row n over the inner column's contiguous
    /// storage, when the element type has one.
    pub fn row_view(&self, n: usize) -> Result<Option<DataView<'_>>> {
        let len = self.size_of(n)?;
        Ok(self
            .inner
            .data_view()
            .map(|view| view.slice(self.offset_of(n), len)))
    }

    /// Appends every row of another array column; an element-type
    /// mismatch is a silent no-op.
    pub fn append_column(&mut self, other: &Self) {
        if self.inner.column_type() != other.inner.column_type() {
            log::warn!(
                "dropping append of {} into {}",
                other.column_type().name(),
                self.column_type().name()
            );
            return;
        }
        for n in 0..other.size() {
            // Types match, so the per-row append cannot fail.
            if let Ok(row) = other.get_as_column(n) {
                let _ = self.append_as_column(&row);
            }
        }
    }

    /// Reads `rows` offsets then the elements they describe. New offsets
    /// arrive zero-based per batch and are rebased onto any rows already
    /// present. On failure the offsets are rolled back to the prior
    /// rows; the inner column may keep a partial tail until `clear`.
    pub fn load<R: Read>(&mut self, input: &mut R, rows: usize) -> Result<()> {
        if rows == 0 {
            return Ok(());
        }

        let old_rows = self.offsets.size();
        if let Err(e) = self.offsets.load(input, rows) {
            self.offsets.truncate(old_rows);
            return Err(e);
        }
        let new_rows = self.offsets.size();

        // Count of elements in this batch: the last zero-based offset.
        let batch_elements = self.offsets[new_rows - 1] as usize;
        if let Err(e) = self.inner.load(input, batch_elements) {
            self.offsets.truncate(old_rows);
            return Err(e);
        }

        if old_rows > 0 {
            let adjust = self.offsets[old_rows - 1];
            for offset in &mut self.offsets.as_mut_slice()[old_rows..] {
                *offset += adjust;
            }
        }
        Ok(())
    }

    pub fn save<W: Write>(&self, output: &mut W) -> Result<()> {
        self.offsets.save(output)?;
        self.inner.save(output)
    }

    /// Re-appends the selected rows into a fresh column.
    pub fn slice(&self, begin: usize, len: usize) -> Self {
        let mut result = Self::new(self.inner.clone_empty());
        let end = begin.saturating_add(len).min(self.size());
        for n in begin..end {
            if let Ok(row) = self.get_as_column(n) {
                let _ = result.append_as_column(&row);
            }
        }
        result
    }

    pub fn clear(&mut self) {
        self.offsets.clear();
        self.inner.clear();
    }

    pub fn reserve(&mut self, rows: usize) {
        // Capacity guess of two elements per row.
        self.offsets.reserve(rows);
        self.inner.reserve(rows * 2);
    }
}
