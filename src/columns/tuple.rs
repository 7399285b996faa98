//! Tuple columns
//!
//! A tuple column owns one member column per member type; row n is the
//! n-th row of every member read together. Members serialize in
//! declaration order, each as its own full payload.

use std::io::{Read, Write};

use crate::types::Type;
use crate::{BlockError, Result};

use super::Column;

/// Column of Tuple(T1, ..., Tn).
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnTuple {
    members: Vec<Column>,
}

impl ColumnTuple {
    /// Members must be non-empty and all the same size.
    pub fn new(members: Vec<Column>) -> Result<Self> {
        if members.is_empty() {
            return Err(BlockError::InvalidType(
                "Tuple must have at least one member".into(),
            ));
        }
        let rows = members[0].size();
        if members.iter().any(|m| m.size() != rows) {
            return Err(BlockError::InvariantViolation(
                "tuple members must have the same row count".into(),
            ));
        }
        Ok(Self { members })
    }

    pub fn column_type(&self) -> Type {
        Type::Tuple(self.members.iter().map(Column::column_type).collect())
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn member(&self, i: usize) -> Result<&Column> {
        self.members.get(i).ok_or(BlockError::OutOfRange {
            index: i,
            size: self.members.len(),
        })
    }

    pub fn size(&self) -> usize {
        self.members[0].size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Appends all rows of another tuple column; a member-type mismatch
    /// is a silent no-op.
    pub fn append_column(&mut self, other: &Self) {
        if self.column_type() != other.column_type() {
            log::warn!(
                "dropping append of {} into {}",
                other.column_type().name(),
                self.column_type().name()
            );
            return;
        }
        for (member, source) in self.members.iter_mut().zip(&other.members) {
            member.append(source);
        }
    }

    pub(crate) fn append_default_row(&mut self) {
        for member in &mut self.members {
            member.append_default();
        }
    }

    /// Loads `rows` rows into every member in declaration order. A
    /// member failure aborts; members loaded before it keep the new
    /// rows until `clear`.
    pub fn load<R: Read>(&mut self, input: &mut R, rows: usize) -> Result<()> {
        for member in &mut self.members {
            member.load(input, rows)?;
        }
        Ok(())
    }

    pub fn save<W: Write>(&self, output: &mut W) -> Result<()> {
        for member in &self.members {
            member.save(output)?;
        }
        Ok(())
    }

    pub fn slice(&self, begin: usize, len: usize) -> Self {
        Self {
            members: self.members.iter().map(|m| m.slice(begin, len)).collect(),
        }
    }

    pub fn clear(&mut self) {
        for member in &mut self.members {
            member.clear();
        }
    }

    pub fn reserve(&mut self, rows: usize) {
        for member in &mut self.members {
            member.reserve(rows);
        }
    }
}
