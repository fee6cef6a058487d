//! Binary encoding of a branch identity
//!
//! # Format
//!
//! ```text
//! i32  format_id
//! i32  len(gtrid)   | gtrid bytes
//! i32  len(bqual)   | bqual bytes
//! ```
//!
//! All integers are big-endian. There is no padding, checksum or version
//! tag; the file holding the encoding carries no other data.

use byteorder::{BigEndian, ByteOrder};
use xasim_core::{DecodeError, XaError, XaResult, Xid};

const INT_SIZE: usize = 4;

/// Longest field a signed 32-bit length prefix can describe
pub const MAX_FIELD_LEN: usize = i32::MAX as usize;

/// Check that both variable-length fields of `xid` fit their length prefix
///
/// [`encode`] assumes this holds.
pub fn check_encodable(xid: &Xid) -> XaResult<()> {
    for (field, len) in [
        ("global_transaction_id", xid.global_transaction_id().len()),
        ("branch_qualifier", xid.branch_qualifier().len()),
    ] {
        if !fits_length_prefix(len) {
            return Err(XaError::invalid_argument(format!(
                "{field} is {len} bytes, limit is {MAX_FIELD_LEN}"
            )));
        }
    }
    Ok(())
}

fn fits_length_prefix(len: usize) -> bool {
    len <= MAX_FIELD_LEN
}

/// Encoded size of `xid` in bytes
pub fn encoded_len(xid: &Xid) -> usize {
    3 * INT_SIZE + xid.global_transaction_id().len() + xid.branch_qualifier().len()
}

/// Encode `xid` into a freshly allocated buffer
///
/// Fields longer than [`MAX_FIELD_LEN`] cannot be represented; callers that
/// accept arbitrary identities run [`check_encodable`] first.
pub fn encode(xid: &Xid) -> Vec<u8> {
    let mut buf = vec![0u8; encoded_len(xid)];
    let mut offset = 0;

    BigEndian::write_i32(&mut buf[offset..offset + INT_SIZE], xid.format_id());
    offset += INT_SIZE;

    for field in [xid.global_transaction_id(), xid.branch_qualifier()] {
        debug_assert!(fits_length_prefix(field.len()));
        BigEndian::write_i32(&mut buf[offset..offset + INT_SIZE], field.len() as i32);
        offset += INT_SIZE;
        buf[offset..offset + field.len()].copy_from_slice(field);
        offset += field.len();
    }

    buf
}

/// Decode a branch identity
///
/// Fails on truncated input, negative or overrunning length prefixes, and
/// bytes left over after the branch qualifier.
pub fn decode(bytes: &[u8]) -> Result<Xid, DecodeError> {
    let mut reader = Reader { bytes, pos: 0 };

    let format_id = reader.read_i32("format_id")?;
    let gtrid = reader.read_prefixed("global_transaction_id")?;
    let bqual = reader.read_prefixed("branch_qualifier")?;

    let trailing = reader.remaining();
    if trailing > 0 {
        return Err(DecodeError::TrailingBytes(trailing));
    }

    Ok(Xid::new(format_id, gtrid, bqual))
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn read_i32(&mut self, field: &'static str) -> Result<i32, DecodeError> {
        if self.remaining() < INT_SIZE {
            return Err(DecodeError::Truncated {
                field,
                needed: INT_SIZE,
                remaining: self.remaining(),
            });
        }
        let value = BigEndian::read_i32(&self.bytes[self.pos..self.pos + INT_SIZE]);
        self.pos += INT_SIZE;
        Ok(value)
    }

    fn read_prefixed(&mut self, field: &'static str) -> Result<&'a [u8], DecodeError> {
        let length = self.read_i32(field)?;
        if length < 0 {
            return Err(DecodeError::NegativeLength { field, length });
        }

        let declared = length as usize;
        if declared > self.remaining() {
            return Err(DecodeError::LengthOverrun {
                field,
                declared,
                remaining: self.remaining(),
            });
        }

        let slice = &self.bytes[self.pos..self.pos + declared];
        self.pos += declared;
        Ok(slice)
    }
}
