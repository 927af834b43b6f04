// ABOUTME: Tag-length-value optional parameters appended to PDU bodies
// ABOUTME: Unknown tags survive decode untouched so round-trips are lossless

use crate::codec::CodecError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;

/// Standard TLV tags (SMPP v3.4 section 5.3.2).
pub mod tags {
    pub const PAYLOAD_TYPE: u16 = 0x0019;
    pub const ADDITIONAL_STATUS_INFO_TEXT: u16 = 0x001D;
    pub const RECEIPTED_MESSAGE_ID: u16 = 0x001E;
    pub const PRIVACY_INDICATOR: u16 = 0x0201;
    pub const USER_MESSAGE_REFERENCE: u16 = 0x0204;
    pub const SOURCE_PORT: u16 = 0x020A;
    pub const DESTINATION_PORT: u16 = 0x020B;
    pub const SAR_MSG_REF_NUM: u16 = 0x020C;
    pub const LANGUAGE_INDICATOR: u16 = 0x020D;
    pub const SAR_TOTAL_SEGMENTS: u16 = 0x020E;
    pub const SAR_SEGMENT_SEQNUM: u16 = 0x020F;
    pub const SC_INTERFACE_VERSION: u16 = 0x0210;
    pub const MS_AVAILABILITY_STATUS: u16 = 0x0422;
    pub const NETWORK_ERROR_CODE: u16 = 0x0423;
    pub const MESSAGE_PAYLOAD: u16 = 0x0424;
    pub const DELIVERY_FAILURE_REASON: u16 = 0x0425;
    pub const MORE_MESSAGES_TO_SEND: u16 = 0x0426;
    pub const MESSAGE_STATE: u16 = 0x0427;
}

/// One optional parameter. The on-wire length prefix is derived from the
/// value, so a `Tlv` cannot encode an inconsistent length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tlv {
    pub tag: u16,
    pub value: Bytes,
}

impl Tlv {
    pub fn new(tag: u16, value: impl Into<Bytes>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    /// Convenience for one-octet values (message_state and friends).
    pub fn from_u8(tag: u16, value: u8) -> Self {
        Self::new(tag, Bytes::copy_from_slice(&[value]))
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16(self.tag);
        buf.put_u16(self.value.len() as u16);
        buf.extend_from_slice(&self.value);
    }

    pub fn encoded_len(&self) -> usize {
        4 + self.value.len()
    }

    /// Decode one TLV; the caller has already established that at least one
    /// byte remains before the PDU end.
    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.remaining() < 4 {
            // Not even a full tag+length; report whatever tag bytes exist.
            let tag = if buf.remaining() >= 2 { buf.get_u16() } else { 0 };
            return Err(CodecError::TruncatedTlv { tag });
        }
        let tag = buf.get_u16();
        let length = buf.get_u16() as usize;
        if buf.remaining() < length {
            return Err(CodecError::TruncatedTlv { tag });
        }
        let value = buf.copy_to_bytes(length);
        Ok(Self { tag, value })
    }

    /// Decode TLVs until the cursor is exhausted (the tail of a PDU body).
    pub fn decode_all(buf: &mut Cursor<&[u8]>) -> Result<Vec<Self>, CodecError> {
        let mut tlvs = Vec::new();
        while buf.has_remaining() {
            tlvs.push(Self::decode(buf)?);
        }
        Ok(tlvs)
    }
}

/// Total encoded length of a TLV set.
pub fn encoded_len(tlvs: &[Tlv]) -> usize {
    tlvs.iter().map(Tlv::encoded_len).sum()
}

/// Append a TLV set in insertion order.
pub fn encode_all(tlvs: &[Tlv], buf: &mut BytesMut) {
    for tlv in tlvs {
        tlv.encode(buf);
    }
}

/// First TLV with the given tag, if present.
pub fn find(tlvs: &[Tlv], tag: u16) -> Option<&Tlv> {
    tlvs.iter().find(|t| t.tag == tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_wire_layout() {
        let tlv = Tlv::new(0x0424, Bytes::from_static(b"\x01\x02\x03"));
        let mut buf = BytesMut::new();
        tlv.encode(&mut buf);
        assert_eq!(buf.as_ref(), &[0x04, 0x24, 0x00, 0x03, 0x01, 0x02, 0x03]);
    }

    #[test]
    fn encode_empty_value() {
        let tlv = Tlv::new(0x0204, Bytes::new());
        let mut buf = BytesMut::new();
        tlv.encode(&mut buf);
        assert_eq!(buf.as_ref(), &[0x02, 0x04, 0x00, 0x00]);
    }

    #[test]
    fn decode_roundtrip() {
        let original = Tlv::new(0x020A, Bytes::from_static(&[0xAA, 0xBB]));
        let mut buf = BytesMut::new();
        original.encode(&mut buf);

        let mut cursor = Cursor::new(buf.as_ref());
        let decoded = Tlv::decode(&mut cursor).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn decode_all_preserves_order_and_unknown_tags() {
        let mut buf = BytesMut::new();
        Tlv::from_u8(0x0427, 2).encode(&mut buf);
        Tlv::new(0x1400, Bytes::from_static(b"vendor")).encode(&mut buf);

        let mut cursor = Cursor::new(buf.as_ref());
        let tlvs = Tlv::decode_all(&mut cursor).unwrap();
        assert_eq!(tlvs.len(), 2);
        assert_eq!(tlvs[0].tag, 0x0427);
        assert_eq!(tlvs[1].tag, 0x1400);
        assert_eq!(tlvs[1].value.as_ref(), b"vendor");
    }

    #[test]
    fn value_straddling_end_is_truncated() {
        let data = [0x04, 0x24, 0x00, 0x10, 0x01, 0x02];
        let mut cursor = Cursor::new(&data[..]);
        assert!(matches!(
            Tlv::decode(&mut cursor),
            Err(CodecError::TruncatedTlv { tag: 0x0424 })
        ));
    }

    #[test]
    fn dangling_tag_is_truncated() {
        let data = [0x04, 0x24, 0x00];
        let mut cursor = Cursor::new(&data[..]);
        assert!(matches!(
            Tlv::decode(&mut cursor),
            Err(CodecError::TruncatedTlv { tag: 0x0424 })
        ));
    }
}
