//! Enum columns
//!
//! Storage is a plain signed-integer vector; the name table travels in
//! the column's [`Type`] and is never serialized with the payload. Both
//! directions of the (name, value) mapping are kept in hash maps built
//! once at construction.

use ahash::AHashMap;
use std::io::{Read, Write};

use crate::types::{EnumItem, Type, TypeCode};
use crate::{BlockError, Result};

use super::numeric::{ColumnVector, Primitive};

/// The signed integers an enum column can store.
pub trait EnumStorage: Primitive {
    const ENUM_CODE: TypeCode;

    fn enum_type(items: Vec<EnumItem>) -> Type;

    fn from_wide(value: i16) -> Self;

    fn to_wide(self) -> i16;
}

impl EnumStorage for i8 {
    const ENUM_CODE: TypeCode = TypeCode::Enum8;

    fn enum_type(items: Vec<EnumItem>) -> Type {
        Type::Enum8(items)
    }

    fn from_wide(value: i16) -> Self {
        value as i8
    }

    fn to_wide(self) -> i16 {
        i16::from(self)
    }
}

impl EnumStorage for i16 {
    const ENUM_CODE: TypeCode = TypeCode::Enum16;

    fn enum_type(items: Vec<EnumItem>) -> Type {
        Type::Enum16(items)
    }

    fn from_wide(value: i16) -> Self {
        value
    }

    fn to_wide(self) -> i16 {
        self
    }
}

/// Column of enum keys with name lookup through the type's item table.
#[derive(Debug, Clone)]
pub struct ColumnEnum<T: EnumStorage> {
    ty: Type,
    data: ColumnVector<T>,
    by_name: AHashMap<String, i16>,
    by_value: AHashMap<i16, String>,
}

pub type ColumnEnum8 = ColumnEnum<i8>;
pub type ColumnEnum16 = ColumnEnum<i16>;

impl<T: EnumStorage> ColumnEnum<T> {
    /// Builds an empty column from an enum type of the matching width.
    pub fn new(ty: Type) -> Result<Self> {
        if ty.code() != T::ENUM_CODE {
            return Err(BlockError::InvalidType(format!(
                "{} is not an {:?} type",
                ty.name(),
                T::ENUM_CODE
            )));
        }
        let items = ty.enum_items().unwrap_or_default().to_vec();
        Ok(Self::from_items(items))
    }

    /// Builds an empty column from already-validated items.
    pub(crate) fn from_items(items: Vec<EnumItem>) -> Self {
        let mut by_name = AHashMap::with_capacity(items.len());
        let mut by_value = AHashMap::with_capacity(items.len());
        for item in &items {
            by_name.insert(item.name.clone(), item.value);
            by_value.insert(item.value, item.name.clone());
        }
        Self {
            ty: T::enum_type(items),
            data: ColumnVector::new(),
            by_name,
            by_value,
        }
    }

    pub fn column_type(&self) -> Type {
        self.ty.clone()
    }

    pub fn size(&self) -> usize {
        self.data.size()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Appends a raw key. With `check` set, the key must be declared.
    pub fn append_value(&mut self, value: T, check: bool) -> Result<()> {
        if check && !self.by_value.contains_key(&value.to_wide()) {
            return Err(BlockError::UnknownEnumValue(i64::from(value.to_wide())));
        }
        self.data.append(value);
        Ok(())
    }

    /// Appends by declared name.
    pub fn append_name(&mut self, name: &str) -> Result<()> {
        let value = *self
            .by_name
            .get(name)
            .ok_or_else(|| BlockError::UnknownEnumName(name.to_string()))?;
        self.data.append(T::from_wide(value));
        Ok(())
    }

    /// The raw key at row n.
    pub fn at(&self, n: usize) -> Result<T> {
        self.data.at(n)
    }

    /// The declared name of the key at row n.
    pub fn name_at(&self, n: usize) -> Result<&str> {
        let value = self.data.at(n)?.to_wide();
        self.by_value
            .get(&value)
            .map(String::as_str)
            .ok_or(BlockError::UnknownEnumValue(i64::from(value)))
    }

    /// Overwrites the key at row n. With `check` set, the key must be
    /// declared.
    pub fn set_at(&mut self, n: usize, value: T, check: bool) -> Result<()> {
        if check && !self.by_value.contains_key(&value.to_wide()) {
            return Err(BlockError::UnknownEnumValue(i64::from(value.to_wide())));
        }
        self.data.set(n, value)
    }

    /// Overwrites row n with the key declared for `name`.
    pub fn set_name_at(&mut self, n: usize, name: &str) -> Result<()> {
        let value = *self
            .by_name
            .get(name)
            .ok_or_else(|| BlockError::UnknownEnumName(name.to_string()))?;
        self.data.set(n, T::from_wide(value))
    }

    /// Appends the first declared key, as the neutral element for
    /// null-row padding.
    pub(crate) fn append_default(&mut self) {
        let value = self
            .ty
            .enum_items()
            .and_then(|items| items.first())
            .map(|item| item.value)
            .unwrap_or(0);
        self.data.append(T::from_wide(value));
    }

    /// Appends all rows of another enum column; a table mismatch is a
    /// silent no-op.
    pub fn append_column(&mut self, other: &Self) {
        if self.ty != other.ty {
            log::warn!(
                "dropping append of {} into {}",
                other.ty.name(),
                self.ty.name()
            );
            return;
        }
        self.data.append_column(&other.data);
    }

    /// Contiguous key storage, for zero-copy consumers.
    pub fn as_slice(&self) -> &[T] {
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
            ty: self.ty.clone(),
            data: self.data.slice(begin, len),
            by_name: self.by_name.clone(),
            by_value: self.by_value.clone(),
        }
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn reserve(&mut self, rows: usize) {
        self.data.reserve(rows);
    }
}

impl<T: EnumStorage> PartialEq for ColumnEnum<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && self.data == other.data
    }
}
