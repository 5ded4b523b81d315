//! ZRLE run lengths.
//!
//! A run length is `1 + sum(bytes)`, where bytes are read until one is not
//! 255: `[10]` is 11, `[255, 100]` is 356, `[255, 255, 0]` is 511.

use super::stream::ByteSource;
use crate::DecodeError;

pub(crate) fn decode_run_length<S: ByteSource + ?Sized>(src: &mut S) -> Result<u32, DecodeError> {
    let mut length: u32 = 1;
    loop {
        let byte = src.read_u8()?;
        length = length
            .checked_add(u32::from(byte))
            .ok_or(DecodeError::RunLengthOverflow)?;
        if byte != 255 {
            return Ok(length);
        }
    }
}
