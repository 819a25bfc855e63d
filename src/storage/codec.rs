//! Binary row codec
//!
//! A row on disk is a frame: a 4-byte little-endian payload length followed
//! by one `(column_id, value_size, value_bytes)` entry per column. Entries
//! are written in column-declaration order but decoded by ID, so the payload
//! order is not load-bearing.
//!
//! Value encodings: bool is one byte (0x01/0x00), int is a signed 32-bit
//! little-endian word, string is raw UTF-8 with its length carried by the
//! entry header.

use std::collections::HashMap;
use std::io::Read;

use crate::catalog::{Column, DataType};
use crate::error::{Error, Result};
use crate::eval::{Env, Value};

/// Encode one row into a complete frame
///
/// The raw values are the literal strings from a VALUES clause; each is
/// validated against its column's type before encoding.
pub fn encode_row(columns: &[Column], values: &[String]) -> Result<Vec<u8>> {
    if columns.len() != values.len() {
        return Err(Error::WrongValueCount {
            expected: columns.len(),
            given: values.len(),
        });
    }

    let mut payload = Vec::new();
    for (column, value) in columns.iter().zip(values) {
        let blob = encode_value(column, value)?;
        payload.extend_from_slice(&column.id.to_le_bytes());
        payload.extend_from_slice(&(blob.len() as u32).to_le_bytes());
        payload.extend_from_slice(&blob);
    }

    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(&payload);

    Ok(frame)
}

fn encode_value(column: &Column, raw: &str) -> Result<Vec<u8>> {
    let mismatch = || Error::InvalidColumnValue {
        column: column.name.clone(),
        data_type: column.data_type.to_string(),
        value: raw.to_string(),
    };

    match column.data_type {
        DataType::Bool => {
            let v: bool = raw.parse().map_err(|_| mismatch())?;
            Ok(vec![u8::from(v)])
        }
        DataType::Int => {
            let v: i32 = raw.parse().map_err(|_| mismatch())?;
            Ok(v.to_le_bytes().to_vec())
        }
        DataType::String => Ok(raw.as_bytes().to_vec()),
    }
}

/// Read one frame's payload from a reader
///
/// Returns `Ok(None)` on clean end-of-input at a frame boundary. A partial
/// length prefix or a payload shorter than the prefix promises is a
/// `ShortRead`.
pub fn read_frame(r: &mut impl Read) -> Result<Option<Vec<u8>>> {
    let mut prefix = [0u8; 4];
    let mut filled = 0;
    while filled < prefix.len() {
        let n = r.read(&mut prefix[filled..])?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(Error::ShortRead);
        }
        filled += n;
    }

    let size = u32::from_le_bytes(prefix) as usize;
    let mut payload = vec![0u8; size];
    r.read_exact(&mut payload).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::ShortRead
        } else {
            Error::from(e)
        }
    })?;

    Ok(Some(payload))
}

/// A decoded row: the table's columns paired with their values
#[derive(Debug, Clone, PartialEq)]
pub struct DeserializedRow {
    pub columns: Vec<DeserializedColumn>,
}

/// One decoded column value
#[derive(Debug, Clone, PartialEq)]
pub struct DeserializedColumn {
    pub column: Column,
    pub value: Value,
}

impl DeserializedRow {
    /// Get a decoded column by name
    pub fn get(&self, name: &str) -> Option<&DeserializedColumn> {
        self.columns.iter().find(|c| c.column.name == name)
    }

    /// The row as an evaluation environment (name to value)
    pub fn env(&self) -> Env {
        self.columns
            .iter()
            .map(|c| (c.column.name.clone(), c.value.clone()))
            .collect()
    }
}

/// Decode a frame payload against a table's declared columns
pub fn decode_row(columns: &[Column], payload: &[u8]) -> Result<DeserializedRow> {
    let entries = split_entries(payload)?;

    let mut decoded = Vec::with_capacity(columns.len());
    for column in columns {
        let bytes = entries
            .get(&column.id)
            .ok_or_else(|| Error::MissingColumnValue(column.name.clone()))?;
        decoded.push(DeserializedColumn {
            column: column.clone(),
            value: decode_value(column.data_type, bytes)?,
        });
    }

    Ok(DeserializedRow { columns: decoded })
}

fn split_entries(payload: &[u8]) -> Result<HashMap<u32, &[u8]>> {
    let mut entries = HashMap::new();
    let mut offset = 0;

    while offset < payload.len() {
        let column_id = read_u32(payload, &mut offset)?;
        let size = read_u32(payload, &mut offset)? as usize;

        let end = offset
            .checked_add(size)
            .filter(|end| *end <= payload.len())
            .ok_or_else(|| Error::CorruptRow("truncated column value".to_string()))?;
        entries.insert(column_id, &payload[offset..end]);
        offset = end;
    }

    Ok(entries)
}

fn read_u32(payload: &[u8], offset: &mut usize) -> Result<u32> {
    let bytes: [u8; 4] = payload
        .get(*offset..*offset + 4)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| Error::CorruptRow("truncated column header".to_string()))?;
    *offset += 4;
    Ok(u32::from_le_bytes(bytes))
}

fn decode_value(data_type: DataType, bytes: &[u8]) -> Result<Value> {
    match data_type {
        DataType::Bool => match bytes {
            [b] => Ok(Value::Bool(*b == 1)),
            _ => Err(Error::CorruptRow(format!(
                "bool value of {} bytes",
                bytes.len()
            ))),
        },
        DataType::Int => {
            let bytes: [u8; 4] = bytes.try_into().map_err(|_| {
                Error::CorruptRow(format!("int value of {} bytes", bytes.len()))
            })?;
            Ok(Value::Number(f64::from(i32::from_le_bytes(bytes))))
        }
        DataType::String => String::from_utf8(bytes.to_vec())
            .map(Value::String)
            .map_err(|_| Error::CorruptRow("string value is not valid UTF-8".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn columns() -> Vec<Column> {
        vec![
            Column {
                id: 10,
                name: "a".to_string(),
                data_type: DataType::Bool,
            },
            Column {
                id: 20,
                name: "b".to_string(),
                data_type: DataType::Int,
            },
            Column {
                id: 30,
                name: "c".to_string(),
                data_type: DataType::String,
            },
        ]
    }

    fn values(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_round_trip() {
        let columns = columns();
        let frame = encode_row(&columns, &values(&["true", "123", "hello"])).unwrap();

        let payload = read_frame(&mut Cursor::new(&frame)).unwrap().unwrap();
        let row = decode_row(&columns, &payload).unwrap();

        assert_eq!(row.get("a").unwrap().value, Value::Bool(true));
        assert_eq!(row.get("b").unwrap().value, Value::Number(123.0));
        assert_eq!(row.get("c").unwrap().value, Value::from("hello"));
    }

    #[test]
    fn test_negative_int_round_trip() {
        let columns = columns();
        let frame = encode_row(&columns, &values(&["false", "-7", "x"])).unwrap();

        let payload = read_frame(&mut Cursor::new(&frame)).unwrap().unwrap();
        let row = decode_row(&columns, &payload).unwrap();

        assert_eq!(row.get("b").unwrap().value, Value::Number(-7.0));
    }

    #[test]
    fn test_two_frames_decode_in_order() {
        let columns = columns();
        let mut buf = encode_row(&columns, &values(&["true", "1", "first"])).unwrap();
        buf.extend(encode_row(&columns, &values(&["false", "2", "second"])).unwrap());

        let mut cursor = Cursor::new(&buf);

        let first = read_frame(&mut cursor).unwrap().unwrap();
        let row = decode_row(&columns, &first).unwrap();
        assert_eq!(row.get("c").unwrap().value, Value::from("first"));

        let second = read_frame(&mut cursor).unwrap().unwrap();
        let row = decode_row(&columns, &second).unwrap();
        assert_eq!(row.get("c").unwrap().value, Value::from("second"));

        assert!(read_frame(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn test_truncated_frame_fails() {
        let columns = columns();
        let frame = encode_row(&columns, &values(&["true", "123", "hello"])).unwrap();

        // every proper prefix fails to read back as a full frame
        for cut in 1..frame.len() {
            let truncated = &frame[..frame.len() - cut];
            let result = read_frame(&mut Cursor::new(truncated));
            assert!(
                matches!(result, Err(Error::ShortRead)),
                "cut of {} bytes must fail",
                cut
            );
        }
    }

    #[test]
    fn test_truncated_payload_fails_decode() {
        let columns = columns();
        let frame = encode_row(&columns, &values(&["true", "123", "hello"])).unwrap();
        let payload = &frame[4..];

        for cut in 1..payload.len() {
            let result = decode_row(&columns, &payload[..payload.len() - cut]);
            assert!(result.is_err(), "cut of {} bytes must fail", cut);
        }
    }

    #[test]
    fn test_missing_column_fails_decode() {
        let columns = columns();
        let partial = &columns[..2];
        let frame = encode_row(partial, &values(&["true", "123"])).unwrap();

        let result = decode_row(&columns, &frame[4..]);
        assert!(matches!(result, Err(Error::MissingColumnValue(name)) if name == "c"));
    }

    #[test]
    fn test_arity_mismatch() {
        let result = encode_row(&columns(), &values(&["true", "123"]));
        assert!(matches!(
            result,
            Err(Error::WrongValueCount {
                expected: 3,
                given: 2
            })
        ));
    }

    #[test]
    fn test_type_mismatch() {
        let result = encode_row(&columns(), &values(&["true", "twelve", "x"]));
        let err = result.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Type error: column 'b' data type is int, value 'twelve' is invalid for this column"
        );
    }

    #[test]
    fn test_payload_order_is_not_load_bearing() {
        let columns = columns();
        let reversed: Vec<Column> = columns.iter().rev().cloned().collect();
        let frame = encode_row(&reversed, &values(&["shuffled", "5", "true"])).unwrap();

        let row = decode_row(&columns, &frame[4..]).unwrap();
        assert_eq!(row.get("a").unwrap().value, Value::Bool(true));
        assert_eq!(row.get("b").unwrap().value, Value::Number(5.0));
        assert_eq!(row.get("c").unwrap().value, Value::from("shuffled"));
    }
}
