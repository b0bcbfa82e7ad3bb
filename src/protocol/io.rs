use mc_varint::{VarInt, VarIntRead, VarIntWrite};
use std::io::{Cursor, Read, Write};
use uuid::Uuid;

use super::{ProtocolError, Result};

pub trait WriteExt {
    fn write_varint(&mut self, value: i32) -> std::io::Result<()>;
    fn write_uuid(&mut self, value: Uuid) -> std::io::Result<()>;
}

impl<W: Write> WriteExt for W {
    fn write_varint(&mut self, value: i32) -> std::io::Result<()> {
        self.write_var_int(VarInt::from(value))?;
        Ok(())
    }

    fn write_uuid(&mut self, value: Uuid) -> std::io::Result<()> {
        self.write_all(&value.as_u128().to_be_bytes())
    }
}

pub trait ReadExt {
    fn read_varint(&mut self) -> Result<i32>;
    fn read_ubyte(&mut self) -> Result<u8>;
    fn read_bool(&mut self) -> Result<bool>;
    fn read_uuid(&mut self) -> Result<Uuid>;
}

impl<R: Read> ReadExt for R {
    fn read_varint(&mut self) -> Result<i32> {
        Ok(i32::from(self.read_var_int()?))
    }

    fn read_ubyte(&mut self) -> Result<u8> {
        let mut buf = [0; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_ubyte()? != 0x00)
    }

    fn read_uuid(&mut self) -> Result<Uuid> {
        let mut buf = [0; 16];
        self.read_exact(&mut buf)?;
        Ok(Uuid::from_u128(u128::from_be_bytes(buf)))
    }
}

/// Walks over fields that never need to be materialized.
pub trait SkipExt {
    fn skip(&mut self, len: usize) -> Result<()>;
    fn skip_string(&mut self) -> Result<()>;
    fn skip_byte_array(&mut self) -> Result<()>;
    fn skip_properties(&mut self) -> Result<()>;
    fn rest(&self) -> Vec<u8>;
}

impl SkipExt for Cursor<&[u8]> {
    fn skip(&mut self, len: usize) -> Result<()> {
        let pos = self.position() as usize;
        let end = pos
            .checked_add(len)
            .filter(|end| *end <= self.get_ref().len())
            .ok_or(ProtocolError::InvalidLength(len as i64))?;
        self.set_position(end as u64);
        Ok(())
    }

    fn skip_string(&mut self) -> Result<()> {
        self.skip_byte_array()
    }

    fn skip_byte_array(&mut self) -> Result<()> {
        let len = self.read_varint()?;
        if len < 0 {
            return Err(ProtocolError::InvalidLength(len as i64));
        }
        self.skip(len as usize)
    }

    // game profile properties: name, value, optional signature
    fn skip_properties(&mut self) -> Result<()> {
        let count = self.read_varint()?;
        if count < 0 {
            return Err(ProtocolError::InvalidLength(count as i64));
        }
        for _ in 0..count {
            self.skip_string()?;
            self.skip_string()?;
            if self.read_bool()? {
                self.skip_string()?;
            }
        }
        Ok(())
    }

    fn rest(&self) -> Vec<u8> {
        self.get_ref()[self.position() as usize..].to_vec()
    }
}
