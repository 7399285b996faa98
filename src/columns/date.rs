//! Date and DateTime columns
//!
//! Both delegate storage to a scalar vector: Date keeps days since epoch
//! in a u16, DateTime keeps epoch seconds in a u32. The public unit is
//! epoch seconds in both cases; Date values come back at day granularity.
//! Zero-copy consumers see the underlying integer storage, not seconds.

use std::io::{Read, Write};

use crate::types::Type;
use crate::Result;

use super::numeric::ColumnVector;

const SECONDS_PER_DAY: i64 = 86_400;

/// Column of dates, stored as days since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnDate {
    data: ColumnVector<u16>,
}

impl ColumnDate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seconds(values: &[i64]) -> Self {
        let mut col = Self::new();
        for &v in values {
            col.append(v);
        }
        col
    }

    pub fn column_type(&self) -> Type {
        Type::Date
    }

    pub fn size(&self) -> usize {
        self.data.size()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Appends epoch seconds, truncated to day granularity.
    pub fn append(&mut self, seconds: i64) {
        self.data.append((seconds / SECONDS_PER_DAY) as u16);
    }

    /// Epoch seconds of row n at day granularity.
    pub fn at(&self, n: usize) -> Result<i64> {
        Ok(i64::from(self.data.at(n)?) * SECONDS_PER_DAY)
    }

    pub fn append_column(&mut self, other: &Self) {
        self.data.append_column(&other.data);
    }

    /// The raw day-count storage.
    pub fn as_slice(&self) -> &[u16] {
        self.data.as_slice()
    }

    pub fn load<R: Read>(&mut self, input: &mut R, rows: usize) -> Result<()> {
        self.data.load(input, rows)
    }

    pub fn save<W: Write>(&self, output: &mut W) -> Result<()> {
        self.data.save(output)
    }

    pub fn slice(&self, begin: usize, len: usize) -> Self {
        Self {
            data: self.data.slice(begin, len),
        }
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn reserve(&mut self, rows: usize) {
        self.data.reserve(rows);
    }
}

/// Column of timestamps, stored as epoch seconds in a u32.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnDateTime {
    data: ColumnVector<u32>,
}

impl ColumnDateTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seconds(values: &[i64]) -> Self {
        let mut col = Self::new();
        for &v in values {
            col.append(v);
        }
        col
    }

    pub fn column_type(&self) -> Type {
        Type::DateTime
    }

    pub fn size(&self) -> usize {
        self.data.size()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn append(&mut self, seconds: i64) {
        self.data.append(seconds as u32);
    }

    pub fn at(&self, n: usize) -> Result<i64> {
        Ok(i64::from(self.data.at(n)?))
    }

    pub fn append_column(&mut self, other: &Self) {
        self.data.append_column(&other.data);
    }

    /// The raw epoch-second storage.
    pub fn as_slice(&self) -> &[u32] {
        self.data.as_slice()
    }

    pub fn load<R: Read>(&mut self, input: &mut R, rows: usize) -> Result<()> {
        self.data.load(input, rows)
    }

    pub fn save<W: Write>(&self, output: &mut W) -> Result<()> {
        self.data.save(output)
    }

    pub fn slice(&self, begin: usize, len: usize) -> Self {
        Self {
            data: self.data.slice(begin, len),
        }
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn reserve(&mut self, rows: usize) {
        self.data.reserve(rows);
    }
}
