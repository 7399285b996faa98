//! Nullable columns
//!
//! A nullable column pairs a nested column with a per-row u8 flag column
//! (1 = null). The two are always the same size. On the wire the flags
//! travel first, then the nested payload.

use std::io::{Read, Write};

use crate::types::Type;
use crate::{BlockError, Result};

use super::numeric::ColumnVector;
use super::Column;

/// Column of Nullable(T).
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnNullable {
    nested: Box<Column>,
    nulls: ColumnVector<u8>,
}

impl ColumnNullable {
    /// An empty nullable column over an empty nested column.
    pub fn new(nested: Column) -> Self {
        debug_assert!(nested.size() == 0, "nested column must start empty");
        Self {
            nested: Box::new(nested),
            nulls: ColumnVector::new(),
        }
    }

    /// Pairs an already-populated nested column with its flags. The two
    /// sizes must match.
    pub fn with_parts(nested: Column, nulls: ColumnVector<u8>) -> Result<Self> {
        if nested.size() != nulls.size() {
            return Err(BlockError::InvariantViolation(format!(
                "nested column has {} rows but nulls column has {}",
                nested.size(),
                nulls.size()
            )));
        }
        Ok(Self {
            nested: Box::new(nested),
            nulls,
        })
    }

    pub fn column_type(&self) -> Type {
        Type::nullable(self.nested.column_type())
    }

    pub fn size(&self) -> usize {
        self.nulls.size()
    }

    pub fn is_empty(&self) -> bool {
        self.nulls.is_empty()
    }

    pub fn is_null(&self, n: usize) -> Result<bool> {
        Ok(self.nulls.at(n)? != 0)
    }

    /// Appends a null row: flag 1 plus a default element in the nested
    /// column, keeping both sides the same size.
    pub fn append_null(&mut self) {
        self.nulls.append(1);
        self.nested.append_default();
    }

    pub fn nested(&self) -> &Column {
        &self.nested
    }

    pub fn nulls(&self) -> &ColumnVector<u8> {
        &self.nulls
    }

    /// Appends all rows of another nullable column; a nested-type
    /// mismatch is a silent no-op.
    pub fn append_column(&mut self, other: &Self) {
        if self.nested.column_type() != other.nested.column_type() {
            log::warn!(
                "dropping append of {} into {}",
                other.column_type().name(),
                self.column_type().name()
            );
            return;
        }
        self.nulls.append_column(&other.nulls);
        self.nested.append(&other.nested);
    }

    /// Reads `rows` flags, then `rows` nested rows. On failure the two
    /// sides are brought back to the same size.
    pub fn load<R: Read>(&mut self, input: &mut R, rows: usize) -> Result<()> {
        let old_rows = self.nulls.size();
        if let Err(e) = self.nulls.load(input, rows) {
            self.nulls.truncate(old_rows);
            return Err(e);
        }
        if let Err(e) = self.nested.load(input, rows) {
            self.nulls.truncate(self.nested.size());
            return Err(e);
        }
        Ok(())
    }

    pub fn save<W: Write>(&self, output: &mut W) -> Result<()> {
        self.nulls.save(output)?;
        self.nested.save(output)
    }

    pub fn slice(&self, begin: usize, len: usize) -> Self {
        Self {
            nested: Box::new(self.nested.slice(begin, len)),
            nulls: self.nulls.slice(begin, len),
        }
    }

    pub fn clear(&mut self) {
        self.nulls.clear();
        self.nested.clear();
    }

    pub fn reserve(&mut self, rows: usize) {
        self.nulls.reserve(rows);
        self.nested.reserve(rows);
    }
}
