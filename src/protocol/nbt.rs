//! Just enough network NBT to step over a text component.

use std::io::{Cursor, Read};

use super::io::{ReadExt, SkipExt};
use super::{ProtocolError, Result};

const TAG_END: u8 = 0;
const TAG_BYTE: u8 = 1;
const TAG_SHORT: u8 = 2;
const TAG_INT: u8 = 3;
const TAG_LONG: u8 = 4;
const TAG_FLOAT: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_BYTE_ARRAY: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_LIST: u8 = 9;
const TAG_COMPOUND: u8 = 10;
const TAG_INT_ARRAY: u8 = 11;
const TAG_LONG_ARRAY: u8 = 12;

const MAX_DEPTH: usize = 512;

/// Skips a nameless root tag, the form used on the wire since 1.20.2.
pub fn skip_network_tag(cursor: &mut Cursor<&[u8]>) -> Result<()> {
    let tag = cursor.read_ubyte()?;
    if tag == TAG_END {
        return Ok(());
    }
    skip_payload(cursor, tag, 0)
}

fn read_i32(cursor: &mut Cursor<&[u8]>) -> Result<i32> {
    let mut buf = [0; 4];
    cursor.read_exact(&mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

fn read_u16(cursor: &mut Cursor<&[u8]>) -> Result<u16> {
    let mut buf = [0; 2];
    cursor.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

fn read_len(cursor: &mut Cursor<&[u8]>) -> Result<usize> {
    let len = read_i32(cursor)?;
    if len < 0 {
        return Err(ProtocolError::InvalidLength(len as i64));
    }
    Ok(len as usize)
}

fn skip_array(cursor: &mut Cursor<&[u8]>, width: usize) -> Result<()> {
    let len = read_len(cursor)?;
    let bytes = len
        .checked_mul(width)
        .ok_or(ProtocolError::InvalidLength(len as i64))?;
    cursor.skip(bytes)
}

fn skip_payload(cursor: &mut Cursor<&[u8]>, tag: u8, depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(ProtocolError::NbtTooDeep(MAX_DEPTH));
    }
    match tag {
        TAG_BYTE => cursor.skip(1),
        TAG_SHORT => cursor.skip(2),
        TAG_INT | TAG_FLOAT => cursor.skip(4),
        TAG_LONG | TAG_DOUBLE => cursor.skip(8),
        TAG_BYTE_ARRAY => skip_array(cursor, 1),
        TAG_INT_ARRAY => skip_array(cursor, 4),
        TAG_LONG_ARRAY => skip_array(cursor, 8),
        TAG_STRING => {
            let len = read_u16(cursor)?;
            cursor.skip(len as usize)
        }
        TAG_LIST => {
            let element = cursor.read_ubyte()?;
            let len = read_len(cursor)?;
            if element == TAG_END && len > 0 {
                return Err(ProtocolError::UnknownNbtTag(element));
            }
            for _ in 0..len {
                skip_payload(cursor, element, depth + 1)?;
            }
            Ok(())
        }
        TAG_COMPOUND => loop {
            let child = cursor.read_ubyte()?;
            if child == TAG_END {
                return Ok(());
            }
            let name_len = read_u16(cursor)?;
            cursor.skip(name_len as usize)?;
            skip_payload(cursor, child, depth + 1)?;
        },
        other => Err(ProtocolError::UnknownNbtTag(other)),
    }
}
