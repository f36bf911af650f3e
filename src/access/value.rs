use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// Fixed payload width of string fields, in bytes. Longer strings are
/// truncated on insert; shorter ones are zero-padded on disk.
pub const STRING_LEN: usize = 128;

/// Column types supported by the storage core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int,
    Str,
}

impl DataType {
    /// On-disk width of a field of this type.
    pub fn byte_size(&self) -> usize {
        match self {
            DataType::Int => 4,
            // 4-byte length prefix followed by a fixed-width payload.
            DataType::Str => 4 + STRING_LEN,
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::Int => write!(f, "INT"),
            DataType::Str => write!(f, "STRING"),
        }
    }
}

/// One typed scalar value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    Int(i32),
    Str(String),
}

impl Field {
    pub fn data_type(&self) -> DataType {
        match self {
            Field::Int(_) => DataType::Int,
            Field::Str(_) => DataType::Str,
        }
    }

    /// Serializes this field in big-endian, fixed-width form.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            Field::Int(v) => writer.write_i32::<BigEndian>(*v),
            Field::Str(s) => {
                let bytes = s.as_bytes();
                let len = bytes.len().min(STRING_LEN);
                writer.write_u32::<BigEndian>(len as u32)?;
                writer.write_all(&bytes[..len])?;
                writer.write_all(&vec![0u8; STRING_LEN - len])
            }
        }
    }

    /// Deserializes a field of the given type. The inverse of `write_to`.
    pub fn read_from<R: Read>(ty: DataType, reader: &mut R) -> std::io::Result<Self> {
        match ty {
            DataType::Int => Ok(Field::Int(reader.read_i32::<BigEndian>()?)),
            DataType::Str => {
                let len = reader.read_u32::<BigEndian>()? as usize;
                let mut buf = [0u8; STRING_LEN];
                reader.read_exact(&mut buf)?;
                let len = len.min(STRING_LEN);
                let s = String::from_utf8(buf[..len].to_vec()).map_err(|e| {
                    std::io::Error::new(std::io::ErrorKind::InvalidData, e)
                })?;
                Ok(Field::Str(s))
            }
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{}", v),
            Field::Str(s) => write!(f, "{}", s),
        }
    }
}
