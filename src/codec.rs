//! Block codec
//!
//! Encodes and decodes whole blocks against a framed byte stream. The
//! frame is: block info fields (tagged, 0-terminated), column count and
//! row count as varints, then per column its name, its canonical type
//! name, and its payload.
//!
//! Decoding into a block that already holds columns appends to them in
//! place; this is the streaming-select path, and the reason array
//! columns rebase their offsets on load.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::block::{Block, BlockInfo};
use crate::columns::Column;
use crate::types::parse_type_name;
use crate::wire;
use crate::{BlockError, Result};

// Block info field tags.
const INFO_FIELD_END: u64 = 0;
const INFO_FIELD_OVERFLOWS: u64 = 1;
const INFO_FIELD_BUCKET_NUM: u64 = 2;

/// Writes one block frame.
pub fn write_block<W: Write>(output: &mut W, block: &Block) -> Result<()> {
    log::debug!(
        "writing block: {} columns, {} rows",
        block.column_count(),
        block.row_count()
    );

    wire::write_varint(output, INFO_FIELD_OVERFLOWS)?;
    output.write_u8(block.info().is_overflows)?;
    wire::write_varint(output, INFO_FIELD_BUCKET_NUM)?;
    output.write_i32::<LittleEndian>(block.info().bucket_num)?;
    wire::write_varint(output, INFO_FIELD_END)?;

    wire::write_varint(output, block.column_count() as u64)?;
    wire::write_varint(output, block.row_count() as u64)?;

    for (name, column) in block.iter() {
        wire::write_string(output, name.as_bytes())?;
        wire::write_string(output, column.column_type().name().as_bytes())?;
        column.save(output)?;
    }
    Ok(())
}

/// Reads one block frame into `block`.
///
/// An empty block gets fresh columns built from the wire types. A block
/// that already holds columns must match the frame's column count and
/// per-index types; the frame's rows are appended and the names
/// refreshed. On error the block may hold a partially loaded frame and
/// should be cleared before reuse.
pub fn read_block<R: Read>(input: &mut R, block: &mut Block) -> Result<()> {
    block.set_info(read_block_info(input)?);

    let num_columns = wire::read_varint(input)? as usize;
    let num_rows = wire::read_varint(input)? as usize;
    log::debug!("reading block: {} columns, {} rows", num_columns, num_rows);

    let appending = block.column_count() > 0;
    if appending && block.column_count() != num_columns {
        return Err(BlockError::Protocol(format!(
            "block declares {} columns, expected {}",
            num_columns,
            block.column_count()
        )));
    }

    for i in 0..num_columns {
        let name = read_utf8(input, "column name")?;
        let type_name = read_utf8(input, "column type")?;
        let ty = parse_type_name(&type_name)?;

        if appending {
            let column = block.column_mut(i)?;
            if column.column_type() != ty {
                return Err(BlockError::Protocol(format!(
                    "column {} arrived as {}, expected {}",
                    i,
                    type_name,
                    column.column_type().name()
                )));
            }
            if let Err(e) = column.load(input, num_rows) {
                log::warn!("block load failed mid-column; clear before reuse");
                return Err(e);
            }
            block.set_column_name(i, &name)?;
        } else {
            let mut column = Column::from_type(&ty)?;
            column.load(input, num_rows)?;
            if column.size() != num_rows {
                return Err(BlockError::Protocol(format!(
                    "column '{}' loaded {} rows, header declares {}",
                    name,
                    column.size(),
                    num_rows
                )));
            }
            block.append_column(name, column)?;
        }
    }

    if appending {
        let expected = block.row_count();
        for i in 0..block.column_count() {
            let actual = block.column(i)?.size();
            if actual != expected {
                return Err(BlockError::Protocol(format!(
                    "column {} has {} rows after load, expected {}",
                    i, actual, expected
                )));
            }
        }
    }
    Ok(())
}

fn read_block_info<R: Read>(input: &mut R) -> Result<BlockInfo> {
    let mut info = BlockInfo::default();
    loop {
        match wire::read_varint(input)? {
            INFO_FIELD_END => return Ok(info),
            INFO_FIELD_OVERFLOWS => info.is_overflows = input.read_u8()?,
            INFO_FIELD_BUCKET_NUM => info.bucket_num = input.read_i32::<LittleEndian>()?,
            other => {
                return Err(BlockError::Protocol(format!(
                    "unknown block info field {}",
                    other
                )))
            }
        }
    }
}

fn read_utf8<R: Read>(input: &mut R, what: &str) -> Result<String> {
    let bytes = wire::read_string(input)?;
    String::from_utf8(bytes)
        .map_err(|_| BlockError::Protocol(format!("{} is not valid UTF-8", what)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{
        ColumnArray, ColumnEnum8, ColumnFixedString, ColumnNullable, ColumnString, ColumnTuple,
        ColumnVector,
    };
    use crate::types::{EnumItem, Type};
    use std::io::Cursor;

    fn uint64(values: &[u64]) -> Column {
        Column::UInt64(ColumnVector::from(values.to_vec()))
    }

    fn roundtrip(block: &Block) -> Block {
        let mut buf = Vec::new();
        write_block(&mut buf, block).unwrap();
        let mut back = Block::new();
        read_block(&mut Cursor::new(&buf), &mut back).unwrap();
        back
    }

    #[test]
    fn test_empty_block_roundtrip() {
        let block = Block::new();
        let back = roundtrip(&block);
        assert_eq!(back.column_count(), 0);
        assert_eq!(back.row_count(), 0);
        assert_eq!(back, block);
    }

    #[test]
    fn test_block_info_roundtrip() {
        let mut block = Block::new();
        block.set_info(BlockInfo {
            is_overflows: 1,
            bucket_num: 42,
        });
        let back = roundtrip(&block);
        assert_eq!(back.info().is_overflows, 1);
        assert_eq!(back.info().bucket_num, 42);
    }

    #[test]
    fn test_uint64_roundtrip_large() {
        // 100k sequential values survive a full encode/decode untouched.
        let values: Vec<u64> = (0..100_000).collect();
        let mut block = Block::new();
        block.append_column("id", uint64(&values)).unwrap();

        let back = roundtrip(&block);
        assert_eq!(back.row_count(), 100_000);
        assert_eq!(back.name_of(0).unwrap(), "id");
        match back.column(0).unwrap() {
            Column::UInt64(col) => assert_eq!(col.as_slice(), &values[..]),
            other => panic!("unexpected column {:?}", other),
        }
    }

    #[test]
    fn test_fixed_string_roundtrip() {
        let mut col = ColumnFixedString::new(4);
        for s in ["id", "foo", "bar", "name", "name___"] {
            col.append_str(s);
        }
        let mut block = Block::new();
        block
            .append_column("tag", Column::FixedString(col))
            .unwrap();

        let back = roundtrip(&block);
        match back.column(0).unwrap() {
            Column::FixedString(col) => {
                assert_eq!(col.at(0).unwrap(), b"id\0\0");
                assert_eq!(col.at(3).unwrap(), b"name");
                assert_eq!(col.at(4).unwrap(), b"name");
            }
            other => panic!("unexpected column {:?}", other),
        }
    }

    #[test]
    fn test_nullable_roundtrip() {
        let nested = uint64(&[1, 2, 3, 4]);
        let nulls = ColumnVector::from(vec![0u8, 0, 1, 1]);
        let col = ColumnNullable::with_parts(nested, nulls).unwrap();
        let mut block = Block::new();
        block.append_column("value", Column::Nullable(col)).unwrap();

        let back = roundtrip(&block);
        match back.column(0).unwrap() {
            Column::Nullable(col) => {
                let flags: Vec<bool> = (0..4).map(|n| col.is_null(n).unwrap()).collect();
                assert_eq!(flags, [false, false, true, true]);
                match col.nested() {
                    Column::UInt64(inner) => {
                        assert_eq!(inner.at(0).unwrap(), 1);
                        assert_eq!(inner.at(1).unwrap(), 2);
                    }
                    other => panic!("unexpected nested column {:?}", other),
                }
            }
            other => panic!("unexpected column {:?}", other),
        }
    }

    #[test]
    fn test_array_roundtrip() {
        // Rows [[1], [1,3], [1,3,7], [1,3,7,9]], as a growing prefix.
        let mut arr = ColumnArray::new(uint64(&[]));
        let mut row = ColumnVector::<u64>::new();
        for &v in &[1u64, 3, 7, 9] {
            row.append(v);
            arr.append_as_column(&Column::UInt64(row.clone())).unwrap();
        }
        let mut block = Block::new();
        block.append_column("arr", Column::Array(arr)).unwrap();

        let back = roundtrip(&block);
        match back.column(0).unwrap() {
            Column::Array(arr) => {
                assert_eq!(arr.offsets().as_slice(), &[1, 3, 6, 10]);
                for n in 0..4 {
                    match arr.get_as_column(n).unwrap() {
                        Column::UInt64(row) => {
                            assert_eq!(row.as_slice(), &[1, 3, 7, 9][..n + 1])
                        }
                        other => panic!("unexpected element column {:?}", other),
                    }
                }
            }
            other => panic!("unexpected column {:?}", other),
        }
    }

    #[test]
    fn test_streaming_array_rebase_across_blocks() {
        // Five single-row server blocks of widely varying array sizes,
        // decoded into one reused client block.
        const ROW_SIZES: [usize; 5] = [10_000, 50_000, 100, 10_000, 10];

        let mut frames = Vec::new();
        let mut next = 0u64;
        for &size in &ROW_SIZES {
            let values: Vec<u64> = (next..next + size as u64).collect();
            next += size as u64;

            let mut arr = ColumnArray::new(uint64(&[]));
            arr.append_as_column(&uint64(&values)).unwrap();
            let mut server_block = Block::new();
            server_block
                .append_column("arr", Column::Array(arr))
                .unwrap();

            let mut buf = Vec::new();
            write_block(&mut buf, &server_block).unwrap();
            frames.push(buf);
        }

        let mut block = Block::new();
        for frame in &frames {
            read_block(&mut Cursor::new(frame), &mut block).unwrap();
        }

        assert_eq!(block.row_count(), ROW_SIZES.len());
        match block.column(0).unwrap() {
            Column::Array(arr) => {
                let offsets = arr.offsets().as_slice();
                assert!(offsets.windows(2).all(|w| w[0] < w[1]));
                let total: usize = ROW_SIZES.iter().sum();
                assert_eq!(*offsets.last().unwrap() as usize, total);

                let mut expected = 0u64;
                for n in 0..ROW_SIZES.len() {
                    assert_eq!(arr.size_of(n).unwrap(), ROW_SIZES[n]);
                    match arr.get_as_column(n).unwrap() {
                        Column::UInt64(row) => {
                            for &v in row.as_slice() {
                                assert_eq!(v, expected);
                                expected += 1;
                            }
                        }
                        other => panic!("unexpected element column {:?}", other),
                    }
                }
            }
            other => panic!("unexpected column {:?}", other),
        }
    }

    #[test]
    fn test_enum_roundtrip_by_name_and_value() {
        let ty = Type::enum8(vec![EnumItem::new("One", 1), EnumItem::new("Two", 2)]).unwrap();
        let mut col = ColumnEnum8::new(ty).unwrap();
        col.append_value(1, true).unwrap();
        col.append_name("Two").unwrap();
        col.append_value(2, true).unwrap();
        col.append_name("One").unwrap();

        let mut block = Block::new();
        block.append_column("state", Column::Enum8(col)).unwrap();

        let back = roundtrip(&block);
        match back.column(0).unwrap() {
            Column::Enum8(col) => {
                let names: Vec<&str> = (0..4).map(|n| col.name_at(n).unwrap()).collect();
                assert_eq!(names, ["One", "Two", "Two", "One"]);
                assert_eq!(col.as_slice(), &[1, 2, 2, 1]);
            }
            other => panic!("unexpected column {:?}", other),
        }
    }

    #[test]
    fn test_tuple_roundtrip() {
        let ids = uint64(&[1, 2, 3]);
        let mut names = ColumnString::new();
        for s in ["one", "two", "three"] {
            names.append_str(s);
        }
        let col = ColumnTuple::new(vec![ids, Column::String(names)]).unwrap();
        let mut block = Block::new();
        block.append_column("pair", Column::Tuple(col)).unwrap();

        let back = roundtrip(&block);
        assert_eq!(back, block);
    }

    #[test]
    fn test_mixed_block_roundtrip_through_file() {
        // One block with every family through a real file handle.
        let mut block = Block::new();
        block.append_column("id", uint64(&[1, 2, 3])).unwrap();

        let mut names = ColumnString::new();
        for s in ["a", "b", "c"] {
            names.append_str(s);
        }
        block.append_column("name", Column::String(names)).unwrap();

        let nested = Column::Float64(ColumnVector::from(vec![1.5f64, -2.5, 0.0]));
        let nulls = ColumnVector::from(vec![0u8, 1, 0]);
        block
            .append_column(
                "score",
                Column::Nullable(ColumnNullable::with_parts(nested, nulls).unwrap()),
            )
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.bin");
        {
            let mut file = std::fs::File::create(&path).unwrap();
            write_block(&mut file, &block).unwrap();
        }
        let mut file = std::fs::File::open(&path).unwrap();
        let mut back = Block::new();
        read_block(&mut file, &mut back).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn test_streaming_reuse_appends_scalars() {
        let mut first = Block::new();
        first.append_column("id", uint64(&[1, 2])).unwrap();
        let mut second = Block::new();
        second.append_column("id", uint64(&[3])).unwrap();

        let mut buf1 = Vec::new();
        write_block(&mut buf1, &first).unwrap();
        let mut buf2 = Vec::new();
        write_block(&mut buf2, &second).unwrap();

        let mut block = Block::new();
        read_block(&mut Cursor::new(&buf1), &mut block).unwrap();
        read_block(&mut Cursor::new(&buf2), &mut block).unwrap();

        assert_eq!(block.row_count(), 3);
        match block.column(0).unwrap() {
            Column::UInt64(col) => assert_eq!(col.as_slice(), &[1, 2, 3]),
            other => panic!("unexpected column {:?}", other),
        }
    }

    #[test]
    fn test_streaming_reuse_rejects_type_change() {
        let mut first = Block::new();
        first.append_column("id", uint64(&[1])).unwrap();
        let mut second = Block::new();
        second
            .append_column("id", Column::Int64(ColumnVector::from(vec![2i64])))
            .unwrap();

        let mut buf1 = Vec::new();
        write_block(&mut buf1, &first).unwrap();
        let mut buf2 = Vec::new();
        write_block(&mut buf2, &second).unwrap();

        let mut block = Block::new();
        read_block(&mut Cursor::new(&buf1), &mut block).unwrap();
        let err = read_block(&mut Cursor::new(&buf2), &mut block);
        assert!(matches!(err, Err(BlockError::Protocol(_))));
    }

    #[test]
    fn test_truncated_frame_fails() {
        let mut block = Block::new();
        block.append_column("id", uint64(&[1, 2, 3, 4])).unwrap();
        let mut buf = Vec::new();
        write_block(&mut buf, &block).unwrap();
        buf.truncate(buf.len() - 5);

        let mut back = Block::new();
        assert!(read_block(&mut Cursor::new(&buf), &mut back).is_err());
    }

    #[test]
    fn test_unknown_info_field_rejected() {
        let mut buf = Vec::new();
        wire::write_varint(&mut buf, 9).unwrap(); // no such field
        let mut back = Block::new();
        let err = read_block(&mut Cursor::new(&buf), &mut back);
        assert!(matches!(err, Err(BlockError::Protocol(_))));
    }

    #[test]
    fn test_bad_type_name_rejected() {
        let mut buf = Vec::new();
        wire::write_varint(&mut buf, INFO_FIELD_END).unwrap();
        wire::write_varint(&mut buf, 1).unwrap(); // one column
        wire::write_varint(&mut buf, 0).unwrap(); // zero rows
        wire::write_string(&mut buf, b"col").unwrap();
        wire::write_string(&mut buf, b"NotAType").unwrap();

        let mut back = Block::new();
        let err = read_block(&mut Cursor::new(&buf), &mut back);
        assert!(matches!(err, Err(BlockError::Parse { .. })));
    }

    #[test]
    fn test_wire_layout_of_small_frame() {
        // Bit-exact check of the frame for one UInt8 column of one row.
        let mut block = Block::new();
        block
            .append_column("b", Column::UInt8(ColumnVector::from(vec![7u8])))
            .unwrap();
        let mut buf = Vec::new();
        write_block(&mut buf, &block).unwrap();

        let expected = [
            1, 0, // is_overflows field
            2, 0xff, 0xff, 0xff, 0xff, // bucket_num field, -1 as i32 LE
            0, // info terminator
            1, // one column
            1, // one row
            1, b'b', // name
            5, b'U', b'I', b'n', b't', b'8', // type name
            7, // payload
        ];
        assert_eq!(buf, expected);
    }
}
