//! The column family
//!
//! [`Column`] is a tagged sum over every concrete column variant. The
//! shared contract (append, load, save, size, slice, clear, reserve) is
//! dispatched by `match`; code that needs a concrete variant pattern
//! matches on the enum, which is this crate's rendering of a downcast.

pub mod array;
pub mod date;
pub mod enums;
pub mod nullable;
pub mod numeric;
pub mod string;
pub mod tuple;

pub use array::ColumnArray;
pub use date::{ColumnDate, ColumnDateTime};
pub use enums::{ColumnEnum, ColumnEnum16, ColumnEnum8};
pub use nullable::ColumnNullable;
pub use numeric::{ColumnVector, Primitive};
pub use string::{ColumnFixedString, ColumnString};
pub use tuple::ColumnTuple;

use std::io::{Read, Write};

use crate::types::Type;
use crate::{BlockError, Result};

/// A column of one of the supported shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Int8(ColumnVector<i8>),
    Int16(ColumnVector<i16>),
    Int32(ColumnVector<i32>),
    Int64(ColumnVector<i64>),
    UInt8(ColumnVector<u8>),
    UInt16(ColumnVector<u16>),
    UInt32(ColumnVector<u32>),
    UInt64(ColumnVector<u64>),
    Float32(ColumnVector<f32>),
    Float64(ColumnVector<f64>),
    String(ColumnString),
    FixedString(ColumnFixedString),
    Date(ColumnDate),
    DateTime(ColumnDateTime),
    Enum8(ColumnEnum8),
    Enum16(ColumnEnum16),
    Nullable(ColumnNullable),
    Array(ColumnArray),
    Tuple(ColumnTuple),
}

/// Dispatches a uniform operation to the concrete column.
macro_rules! dispatch {
    ($self:expr, $col:ident => $body:expr) => {
        match $self {
            Column::Int8($col) => $body,
            Column::Int16($col) => $body,
            Column::Int32($col) => $body,
            Column::Int64($col) => $body,
            Column::UInt8($col) => $body,
            Column::UInt16($col) => $body,
            Column::UInt32($col) => $body,
            Column::UInt64($col) => $body,
            Column::Float32($col) => $body,
            Column::Float64($col) => $body,
            Column::String($col) => $body,
            Column::FixedString($col) => $body,
            Column::Date($col) => $body,
            Column::DateTime($col) => $body,
            Column::Enum8($col) => $body,
            Column::Enum16($col) => $body,
            Column::Nullable($col) => $body,
            Column::Array($col) => $body,
            Column::Tuple($col) => $body,
        }
    };
}

/// Like `dispatch!`, but wraps the result back into the same variant.
macro_rules! dispatch_wrap {
    ($self:expr, $col:ident => $body:expr) => {
        match $self {
            Column::Int8($col) => Column::Int8($body),
            Column::Int16($col) => Column::Int16($body),
            Column::Int32($col) => Column::Int32($body),
            Column::Int64($col) => Column::Int64($body),
            Column::UInt8($col) => Column::UInt8($body),
            Column::UInt16($col) => Column::UInt16($body),
            Column::UInt32($col) => Column::UInt32($body),
            Column::UInt64($col) => Column::UInt64($body),
            Column::Float32($col) => Column::Float32($body),
            Column::Float64($col) => Column::Float64($body),
            Column::String($col) => Column::String($body),
            Column::FixedString($col) => Column::FixedString($body),
            Column::Date($col) => Column::Date($body),
            Column::DateTime($col) => Column::DateTime($body),
            Column::Enum8($col) => Column::Enum8($body),
            Column::Enum16($col) => Column::Enum16($body),
            Column::Nullable($col) => Column::Nullable($body),
            Column::Array($col) => Column::Array($body),
            Column::Tuple($col) => Column::Tuple($body),
        }
    };
}

impl Column {
    /// Builds an empty column of the given type. Fails only on a
    /// degenerate descriptor (zero-width FixedString, empty Tuple).
    pub fn from_type(ty: &Type) -> Result<Column> {
        Ok(match ty {
            Type::Int8 => Column::Int8(ColumnVector::new()),
            Type::Int16 => Column::Int16(ColumnVector::new()),
            Type::Int32 => Column::Int32(ColumnVector::new()),
            Type::Int64 => Column::Int64(ColumnVector::new()),
            Type::UInt8 => Column::UInt8(ColumnVector::new()),
            Type::UInt16 => Column::UInt16(ColumnVector::new()),
            Type::UInt32 => Column::UInt32(ColumnVector::new()),
            Type::UInt64 => Column::UInt64(ColumnVector::new()),
            Type::Float32 => Column::Float32(ColumnVector::new()),
            Type::Float64 => Column::Float64(ColumnVector::new()),
            Type::String => Column::String(ColumnString::new()),
            Type::FixedString(n) => {
                if *n == 0 {
                    return Err(BlockError::InvalidType(
                        "FixedString width must be at least 1".into(),
                    ));
                }
                Column::FixedString(ColumnFixedString::new(*n))
            }
            Type::Date => Column::Date(ColumnDate::new()),
            Type::DateTime => Column::DateTime(ColumnDateTime::new()),
            Type::Array(item) => Column::Array(ColumnArray::new(Column::from_type(item)?)),
            Type::Nullable(item) => {
                Column::Nullable(ColumnNullable::new(Column::from_type(item)?))
            }
            Type::Enum8(items) => Column::Enum8(ColumnEnum::from_items(items.clone())),
            Type::Enum16(items) => Column::Enum16(ColumnEnum::from_items(items.clone())),
            Type::Tuple(items) => {
                let members = items
                    .iter()
                    .map(Column::from_type)
                    .collect::<Result<Vec<_>>>()?;
                Column::Tuple(ColumnTuple::new(members)?)
            }
        })
    }

    /// The column's immutable type descriptor.
    pub fn column_type(&self) -> Type {
        dispatch!(self, col => col.column_type())
    }

    /// Row count.
    pub fn size(&self) -> usize {
        dispatch!(self, col => col.size())
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Appends all rows of `other`. A shape mismatch is a silent no-op,
    /// by wire-protocol convention; only Array element appends fail
    /// loudly (see [`ColumnArray::append_as_column`]).
    pub fn append(&mut self, other: &Column) {
        match (self, other) {
            (Column::Int8(a), Column::Int8(b)) => a.append_column(b),
            (Column::Int16(a), Column::Int16(b)) => a.append_column(b),
            (Column::Int32(a), Column::Int32(b)) => a.append_column(b),
            (Column::Int64(a), Column::Int64(b)) => a.append_column(b),
            (Column::UInt8(a), Column::UInt8(b)) => a.append_column(b),
            (Column::UInt16(a), Column::UInt16(b)) => a.append_column(b),
            (Column::UInt32(a), Column::UInt32(b)) => a.append_column(b),
            (Column::UInt64(a), Column::UInt64(b)) => a.append_column(b),
            (Column::Float32(a), Column::Float32(b)) => a.append_column(b),
            (Column::Float64(a), Column::Float64(b)) => a.append_column(b),
            (Column::String(a), Column::String(b)) => a.append_column(b),
            (Column::FixedString(a), Column::FixedString(b)) => a.append_column(b),
            (Column::Date(a), Column::Date(b)) => a.append_column(b),
            (Column::DateTime(a), Column::DateTime(b)) => a.append_column(b),
            (Column::Enum8(a), Column::Enum8(b)) => a.append_column(b),
            (Column::Enum16(a), Column::Enum16(b)) => a.append_column(b),
            (Column::Nullable(a), Column::Nullable(b)) => a.append_column(b),
            (Column::Array(a), Column::Array(b)) => a.append_column(b),
            (Column::Tuple(a), Column::Tuple(b)) => a.append_column(b),
            (a, b) => log::warn!(
                "dropping append of {} into {}",
                b.column_type().name(),
                a.column_type().name()
            ),
        }
    }

    /// Appends one zero/empty element; used to keep composite columns
    /// in step when a null row is added.
    pub(crate) fn append_default(&mut self) {
        match self {
            Column::Int8(col) => col.append(0),
            Column::Int16(col) => col.append(0),
            Column::Int32(col) => col.append(0),
            Column::Int64(col) => col.append(0),
            Column::UInt8(col) => col.append(0),
            Column::UInt16(col) => col.append(0),
            Column::UInt32(col) => col.append(0),
            Column::UInt64(col) => col.append(0),
            Column::Float32(col) => col.append(0.0),
            Column::Float64(col) => col.append(0.0),
            Column::String(col) => col.append(b""),
            Column::FixedString(col) => col.append(&[]),
            Column::Date(col) => col.append(0),
            Column::DateTime(col) => col.append(0),
            Column::Enum8(col) => col.append_default(),
            Column::Enum16(col) => col.append_default(),
            Column::Nullable(col) => col.append_null(),
            Column::Array(col) => col.append_empty_row(),
            Column::Tuple(col) => col.append_default_row(),
        }
    }

    /// Reads exactly `rows` rows, appending to existing content.
    pub fn load<R: Read>(&mut self, input: &mut R, rows: usize) -> Result<()> {
        dispatch!(self, col => col.load(input, rows))
    }

    /// Writes all current rows.
    pub fn save<W: Write>(&self, output: &mut W) -> Result<()> {
        dispatch!(self, col => col.save(output))
    }

    /// An independent column of the same type covering rows
    /// `[begin, begin + len)`, clamped to the column size.
    pub fn slice(&self, begin: usize, len: usize) -> Column {
        dispatch_wrap!(self, col => col.slice(begin, len))
    }

    /// An empty column of the same type.
    pub fn clone_empty(&self) -> Column {
        self.slice(0, 0)
    }

    /// Drops all rows; capacity is retained where the variant allows.
    pub fn clear(&mut self) {
        dispatch!(self, col => col.clear())
    }

    /// Capacity hint only.
    pub fn reserve(&mut self, rows: usize) {
        dispatch!(self, col => col.reserve(rows))
    }

    /// Borrowed view of the contiguous primitive storage, tagged with
    /// the reinterpretation primitive, for zero-copy consumers. Date,
    /// DateTime and enums expose their raw integer storage; Nullable
    /// forwards to its nested column. String, Array and Tuple have no
    /// single contiguous layout and return `None`.
    pub fn data_view(&self) -> Option<DataView<'_>> {
        match self {
            Column::Int8(col) => Some(DataView::Int8(col.as_slice())),
            Column::Int16(col) => Some(DataView::Int16(col.as_slice())),
            Column::Int32(col) => Some(DataView::Int32(col.as_slice())),
            Column::Int64(col) => Some(DataView::Int64(col.as_slice())),
            Column::UInt8(col) => Some(DataView::UInt8(col.as_slice())),
            Column::UInt16(col) => Some(DataView::UInt16(col.as_slice())),
            Column::UInt32(col) => Some(DataView::UInt32(col.as_slice())),
            Column::UInt64(col) => Some(DataView::UInt64(col.as_slice())),
            Column::Float32(col) => Some(DataView::Float32(col.as_slice())),
            Column::Float64(col) => Some(DataView::Float64(col.as_slice())),
            Column::String(_) => None,
            Column::FixedString(col) => Some(DataView::Bytes {
                data: col.as_bytes(),
                width: col.width(),
            }),
            Column::Date(col) => Some(DataView::UInt16(col.as_slice())),
            Column::DateTime(col) => Some(DataView::UInt32(col.as_slice())),
            Column::Enum8(col) => Some(DataView::Int8(col.as_slice())),
            Column::Enum16(col) => Some(DataView::Int16(col.as_slice())),
            Column::Nullable(col) => col.nested().data_view(),
            Column::Array(_) => None,
            Column::Tuple(_) => None,
        }
    }
}

/// A borrowed, primitive-tagged view over a column's contiguous storage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DataView<'a> {
    Int8(&'a [i8]),
    Int16(&'a [i16]),
    Int32(&'a [i32]),
    Int64(&'a [i64]),
    UInt8(&'a [u8]),
    UInt16(&'a [u16]),
    UInt32(&'a [u32]),
    UInt64(&'a [u64]),
    Float32(&'a [f32]),
    Float64(&'a [f64]),
    /// FixedString storage: `width` bytes per row.
    Bytes { data: &'a [u8], width: usize },
}

impl<'a> DataView<'a> {
    /// Number of rows covered by the view.
    pub fn len(&self) -> usize {
        match self {
            DataView::Int8(s) => s.len(),
            DataView::Int16(s) => s.len(),
            DataView::Int32(s) => s.len(),
            DataView::Int64(s) => s.len(),
            DataView::UInt8(s) => s.len(),
            DataView::UInt16(s) => s.len(),
            DataView::UInt32(s) => s.len(),
            DataView::UInt64(s) => s.len(),
            DataView::Float32(s) => s.len(),
            DataView::Float64(s) => s.len(),
            DataView::Bytes { data, width } => data.len() / width,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sub-view over rows `[begin, begin + len)`, clamped.
    pub fn slice(self, begin: usize, len: usize) -> DataView<'a> {
        fn clamp<T>(s: &[T], begin: usize, len: usize) -> &[T] {
            let begin = begin.min(s.len());
            let end = begin.saturating_add(len).min(s.len());
            &s[begin..end]
        }
        match self {
            DataView::Int8(s) => DataView::Int8(clamp(s, begin, len)),
            DataView::Int16(s) => DataView::Int16(clamp(s, begin, len)),
            DataView::Int32(s) => DataView::Int32(clamp(s, begin, len)),
            DataView::Int64(s) => DataView::Int64(clamp(s, begin, len)),
            DataView::UInt8(s) => DataView::UInt8(clamp(s, begin, len)),
            DataView::UInt16(s) => DataView::UInt16(clamp(s, begin, len)),
            DataView::UInt32(s) => DataView::UInt32(clamp(s, begin, len)),
            DataView::UInt64(s) => DataView::UInt64(clamp(s, begin, len)),
            DataView::Float32(s) => DataView::Float32(clamp(s, begin, len)),
            DataView::Float64(s) => DataView::Float64(clamp(s, begin, len)),
            DataView::Bytes { data, width } => DataView::Bytes {
                data: clamp(data, begin.saturating_mul(width), len.saturating_mul(width)),
                width,
            },
        }
    }
}
