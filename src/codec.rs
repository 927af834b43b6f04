// ABOUTME: SMPP v3.4 wire codec primitives shared by every PDU type
// ABOUTME: Provides the 16-byte header, Encodable/Decodable traits and field helpers

use crate::datatypes::{CommandId, CommandStatus};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;
use thiserror::Error;

/// Maximum allowed PDU size. Every body this crate speaks fits comfortably
/// below this; a larger `command_length` means framing is not trustworthy
/// and the connection must be dropped rather than the PDU skipped.
pub const MAX_PDU_SIZE: u32 = 4096;

/// SMPP v3.4 PDU header (16 octets, big-endian, common to all PDUs).
///
/// `command_length` covers the whole PDU including the header itself.
/// The high bit of `command_id` marks a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PduHeader {
    pub command_length: u32,
    pub command_id: CommandId,
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl PduHeader {
    pub const SIZE: usize = 16;

    /// Decode and validate a header from the buffer.
    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.remaining() < Self::SIZE {
            return Err(CodecError::ShortPdu);
        }

        let command_length = buf.get_u32();
        if command_length < Self::SIZE as u32 {
            return Err(CodecError::InvalidPduLength(command_length));
        }
        if command_length > MAX_PDU_SIZE {
            return Err(CodecError::OversizedPdu(command_length));
        }

        let command_id_raw = buf.get_u32();
        let command_id = CommandId::try_from(command_id_raw)
            .map_err(|_| CodecError::UnknownCommandId(command_id_raw))?;
        let status_raw = buf.get_u32();
        // Unlisted status values are folded to UnknownError rather than
        // rejected; SMSCs are allowed vendor-specific codes.
        let command_status =
            CommandStatus::try_from(status_raw).unwrap_or(CommandStatus::UnknownError);
        let sequence_number = buf.get_u32();

        Ok(PduHeader {
            command_length,
            command_id,
            command_status,
            sequence_number,
        })
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.command_length);
        buf.put_u32(self.command_id as u32);
        buf.put_u32(self.command_status as u32);
        buf.put_u32(self.sequence_number);
    }
}

/// Types that encode themselves onto a wire buffer.
pub trait Encodable {
    /// Append the full PDU (header included) to `buf`. The header's
    /// `command_length` may be written as a placeholder; `to_bytes` fixes
    /// it up once the body size is known.
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError>;

    /// Encode into a fresh buffer and patch `command_length`.
    fn to_bytes(&self) -> Result<Bytes, CodecError> {
        let mut buf = BytesMut::with_capacity(64);
        self.encode(&mut buf)?;
        let length = buf.len() as u32;
        buf[0..4].copy_from_slice(&length.to_be_bytes());
        Ok(buf.freeze())
    }
}

/// Types that decode themselves from the bytes following a header.
pub trait Decodable: Sized {
    /// Decode the body. `buf` is positioned immediately after the 16-byte
    /// header and holds exactly `command_length - 16` body bytes.
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError>;

    /// The command id this type answers to.
    fn command_id() -> CommandId;
}

/// Wire-level failure modes.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Input ended before `command_length` bytes were available.
    #[error("short PDU: input ends before command_length bytes")]
    ShortPdu,

    /// `command_length` below the 16-byte header minimum.
    #[error("invalid command_length {0} (minimum 16)")]
    InvalidPduLength(u32),

    /// `command_length` above [`MAX_PDU_SIZE`]; framing is not trustworthy.
    #[error("oversized PDU: command_length {0} exceeds {MAX_PDU_SIZE}")]
    OversizedPdu(u32),

    /// command_id not in the SMPP v3.4 table this crate speaks.
    #[error("unknown command_id {0:#010x}")]
    UnknownCommandId(u32),

    /// A mandatory field ran past the end of the PDU, or a C-string was not
    /// NUL-terminated within its allowed length.
    #[error("truncated field '{field}'")]
    TruncatedField { field: &'static str },

    /// A TLV tag/length/value straddles the end of the PDU.
    #[error("truncated TLV at tag {tag:#06x}")]
    TruncatedTlv { tag: u16 },

    /// A field value violates its declared constraints at encode time.
    #[error("field '{field}' validation failed: {reason}")]
    FieldValidation { field: &'static str, reason: String },

    /// Field bytes that must be UTF-8 were not.
    #[error("invalid UTF-8 in field '{field}'")]
    Utf8 { field: &'static str },
}

/// Read a NUL-terminated C-string of at most `max_len` octets including the
/// terminator. Variable length on the wire: an empty value is a single NUL.
pub fn decode_cstring(
    buf: &mut Cursor<&[u8]>,
    max_len: usize,
    field: &'static str,
) -> Result<String, CodecError> {
    let start = buf.position() as usize;
    let slice = buf.get_ref();
    let window_end = slice.len().min(start + max_len);
    let nul = slice[start..window_end]
        .iter()
        .position(|&b| b == 0)
        .ok_or(CodecError::TruncatedField { field })?;
    let value = std::str::from_utf8(&slice[start..start + nul])
        .map_err(|_| CodecError::Utf8 { field })?
        .to_owned();
    buf.set_position((start + nul + 1) as u64);
    Ok(value)
}

/// Append a C-string and its NUL terminator. Length bounds are enforced by
/// the field newtypes at construction, not here.
pub fn encode_cstring(buf: &mut BytesMut, value: &str) {
    buf.put_slice(value.as_bytes());
    buf.put_u8(0);
}

pub fn decode_u8(buf: &mut Cursor<&[u8]>, field: &'static str) -> Result<u8, CodecError> {
    if buf.remaining() < 1 {
        return Err(CodecError::TruncatedField { field });
    }
    Ok(buf.get_u8())
}

pub fn decode_u16(buf: &mut Cursor<&[u8]>, field: &'static str) -> Result<u16, CodecError> {
    if buf.remaining() < 2 {
        return Err(CodecError::TruncatedField { field });
    }
    Ok(buf.get_u16())
}

pub fn decode_u32(buf: &mut Cursor<&[u8]>, field: &'static str) -> Result<u32, CodecError> {
    if buf.remaining() < 4 {
        return Err(CodecError::TruncatedField { field });
    }
    Ok(buf.get_u32())
}

/// Read `len` raw octets (the short_message payload following sm_length).
pub fn decode_octets(
    buf: &mut Cursor<&[u8]>,
    len: usize,
    field: &'static str,
) -> Result<Bytes, CodecError> {
    if buf.remaining() < len {
        return Err(CodecError::TruncatedField { field });
    }
    Ok(buf.copy_to_bytes(len))
}
