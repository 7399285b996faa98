//! Blockwire Columnar Core
//!
//! The column-oriented data model and binary codec at the heart of a
//! native-protocol client for an analytical database server. Data moves
//! between client and server as typed blocks: named columns of
//! homogeneously typed values, including composite shapes (arrays,
//! nullables, enumerations, fixed-width strings, dates).
//!
//! This crate covers the in-memory model and its wire contract only:
//!
//! - [`types::Type`]: immutable descriptors of column shapes, with a
//!   canonical server-syntax name and a round-tripping parser.
//! - [`columns::Column`]: the polymorphic column family (scalar vectors,
//!   strings, dates, enums, nullable, array, tuple) sharing one
//!   append/load/save/slice contract.
//! - [`block::Block`]: an ordered set of named columns with equal row
//!   counts.
//! - [`codec`]: encodes and decodes whole blocks against a framed byte
//!   stream, including streaming decode that appends into a reused block.
//!
//! The TCP connection, handshake, compression and query protocol live in
//! the layer above; it hands this crate `std::io` readers and writers and
//! receives opaque [`block::Block`] values back.

pub mod block;
pub mod codec;
pub mod columns;
pub mod types;
pub mod wire;

// Re-export main types
pub use block::{Block, BlockInfo};
pub use columns::{Column, DataView};
pub use types::{EnumItem, Type, TypeCode};

/// Crate-wide error type
#[derive(Debug, thiserror::Error)]
pub enum BlockError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot append column of type {from} to column of type {to}")]
    TypeMismatch { from: String, to: String },

    #[error("row index {index} out of range (size {size})")]
    OutOfRange { index: usize, size: usize },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("unknown enum name: {0}")]
    UnknownEnumName(String),

    #[error("unknown enum value: {0}")]
    UnknownEnumValue(i64),

    #[error("type parse error at byte {offset}: {message}")]
    Parse { offset: usize, message: String },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("invalid type: {0}")]
    InvalidType(String),
}

pub type Result<T> = std::result::Result<T, BlockError>;
