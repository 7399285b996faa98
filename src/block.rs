//! Blocks
//!
//! A block is the unit of data exchange with the server: an ordered list
//! of named columns, all with the same row count, plus a small info
//! header carried on the wire.

use crate::columns::Column;
use crate::{BlockError, Result};

/// Wire-level block annotations. Defaults match what the server sends
/// for ordinary data blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    pub is_overflows: u8,
    pub bucket_num: i32,
}

impl Default for BlockInfo {
    fn default() -> Self {
        Self {
            is_overflows: 0,
            bucket_num: -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ColumnItem {
    name: String,
    column: Column,
}

/// An ordered collection of named, equally sized columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    info: BlockInfo,
    columns: Vec<ColumnItem>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(columns: usize) -> Self {
        Self {
            info: BlockInfo::default(),
            columns: Vec::with_capacity(columns),
        }
    }

    pub fn info(&self) -> &BlockInfo {
        &self.info
    }

    pub fn set_info(&mut self, info: BlockInfo) {
        self.info = info;
    }

    /// Appends a named column. Every column after the first must match
    /// the block's row count.
    pub fn append_column(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        if !self.columns.is_empty() && column.size() != self.row_count() {
            return Err(BlockError::InvariantViolation(format!(
                "column has {} rows, block has {}",
                column.size(),
                self.row_count()
            )));
        }
        self.columns.push(ColumnItem {
            name: name.into(),
            column,
        });
        Ok(())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Rows in the block; zero when it has no columns.
    pub fn row_count(&self) -> usize {
        self.columns.first().map(|item| item.column.size()).unwrap_or(0)
    }

    pub fn name_of(&self, i: usize) -> Result<&str> {
        self.columns
            .get(i)
            .map(|item| item.name.as_str())
            .ok_or(BlockError::OutOfRange {
                index: i,
                size: self.columns.len(),
            })
    }

    pub fn column(&self, i: usize) -> Result<&Column> {
        self.columns
            .get(i)
            .map(|item| &item.column)
            .ok_or(BlockError::OutOfRange {
                index: i,
                size: self.columns.len(),
            })
    }

    pub(crate) fn column_mut(&mut self, i: usize) -> Result<&mut Column> {
        let size = self.columns.len();
        self.columns
            .get_mut(i)
            .map(|item| &mut item.column)
            .ok_or(BlockError::OutOfRange { index: i, size })
    }

    pub(crate) fn set_column_name(&mut self, i: usize, name: &str) -> Result<()> {
        let size = self.columns.len();
        match self.columns.get_mut(i) {
            Some(item) => {
                item.name.clear();
                item.name.push_str(name);
                Ok(())
            }
            None => Err(BlockError::OutOfRange { index: i, size }),
        }
    }

    /// Iterates columns in index order as (name, column) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns
            .iter()
            .map(|item| (item.name.as_str(), &item.column))
    }

    /// Drops all rows and resets the info header; the columns themselves
    /// stay, with their names blanked, ready for the next load.
    pub fn clear(&mut self) {
        self.info = BlockInfo::default();
        for item in &mut self.columns {
            item.name.clear();
            item.column.clear();
        }
    }

    /// Capacity hint forwarded to every column.
    pub fn reserve(&mut self, rows: usize) {
        for item in &mut self.columns {
            item.column.reserve(rows);
        }
    }
}
