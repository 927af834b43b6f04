// ABOUTME: The closed set of text codecs a short message payload can use
// ABOUTME: Each variant ties its data_coding byte to matching encode/decode functions

pub mod gsm7;
pub mod iso8859_5;
pub mod latin1;
pub mod ucs2;

use bytes::Bytes;

/// data_coding values (section 5.2.19) for the codecs this crate speaks.
pub mod data_coding {
    /// SMSC default alphabet; also used for raw binary payloads.
    pub const DEFAULT: u8 = 0x00;
    pub const LATIN1: u8 = 0x03;
    pub const ISO8859_5: u8 = 0x06;
    pub const UCS2: u8 = 0x08;
}

/// A text payload together with its on-wire encoding.
///
/// The variant decides both the `data_coding` byte and the octets produced,
/// so the two can never disagree. `Gsm7` carries one septet per octet (the
/// common SMSC convention for data_coding 0); `Gsm7Packed` packs septets
/// per GSM 03.38 for SMSCs that require it. Characters a codec cannot
/// express encode as '?' (UCS-2 expresses everything).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Text {
    Gsm7(String),
    Gsm7Packed(String),
    Latin1(String),
    Iso88595(String),
    Ucs2(String),
    /// Pre-encoded octets passed through untouched, sent as data_coding 0.
    Raw(Bytes),
}

impl Text {
    /// The data_coding byte that goes into the PDU.
    pub fn data_coding(&self) -> u8 {
        match self {
            Text::Gsm7(_) | Text::Gsm7Packed(_) | Text::Raw(_) => data_coding::DEFAULT,
            Text::Latin1(_) => data_coding::LATIN1,
            Text::Iso88595(_) => data_coding::ISO8859_5,
            Text::Ucs2(_) => data_coding::UCS2,
        }
    }

    /// Produce the short_message octets.
    pub fn encode(&self) -> Bytes {
        match self {
            Text::Gsm7(s) => gsm7::encode(s).into(),
            Text::Gsm7Packed(s) => gsm7::pack(&gsm7::encode(s), 0).into(),
            Text::Latin1(s) => latin1::encode(s).into(),
            Text::Iso88595(s) => iso8859_5::encode(s).into(),
            Text::Ucs2(s) => ucs2::encode(s).into(),
            Text::Raw(b) => b.clone(),
        }
    }

    /// Interpret inbound octets by their data_coding byte. data_coding 0 is
    /// ambiguous on the wire (GSM7 unpacked, packed, or binary), so it comes
    /// back as `Raw`; callers who know the peer's convention use the codec
    /// modules directly.
    pub fn decode(data_coding: u8, payload: &[u8]) -> Text {
        match data_coding {
            data_coding::LATIN1 => Text::Latin1(latin1::decode(payload)),
            data_coding::ISO8859_5 => Text::Iso88595(iso8859_5::decode(payload)),
            data_coding::UCS2 => Text::Ucs2(ucs2::decode(payload)),
            _ => Text::Raw(Bytes::copy_from_slice(payload)),
        }
    }

    /// The decoded text, when the variant carries one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Text::Gsm7(s)
            | Text::Gsm7Packed(s)
            | Text::Latin1(s)
            | Text::Iso88595(s)
            | Text::Ucs2(s) => Some(s),
            Text::Raw(_) => None,
        }
    }

    /// Single-PDU payload capacity in octets (or septet-octets for
    /// unpacked GSM7), before any UDH is spent.
    pub fn single_segment_capacity(&self) -> usize {
        match self {
            Text::Gsm7(_) => 160,
            _ => 140,
        }
    }

    /// Per-part payload capacity under an 8-bit-reference concatenation
    /// UDH (6 octets, 7 septets).
    pub fn concatenated_capacity(&self) -> usize {
        match self {
            Text::Gsm7(_) | Text::Gsm7Packed(_) => 153,
            _ => 134,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_coding_matches_variant() {
        assert_eq!(Text::Gsm7("a".into()).data_coding(), 0x00);
        assert_eq!(Text::Latin1("a".into()).data_coding(), 0x03);
        assert_eq!(Text::Iso88595("a".into()).data_coding(), 0x06);
        assert_eq!(Text::Ucs2("a".into()).data_coding(), 0x08);
        assert_eq!(Text::Raw(Bytes::from_static(b"a")).data_coding(), 0x00);
    }

    #[test]
    fn raw_passthrough() {
        let payload = Bytes::from_static(&[0x01, 0xFF, 0x00, 0x7F]);
        assert_eq!(Text::Raw(payload.clone()).encode(), payload);
    }

    #[test]
    fn decode_dispatch() {
        let text = Text::decode(data_coding::UCS2, &ucs2::encode("héllo"));
        assert_eq!(text, Text::Ucs2("héllo".into()));

        let text = Text::decode(data_coding::LATIN1, &latin1::encode("héllo"));
        assert_eq!(text.as_str(), Some("héllo"));

        let raw = Text::decode(data_coding::DEFAULT, b"\x48\x69");
        assert!(matches!(raw, Text::Raw(_)));
    }

    #[test]
    fn gsm7_packed_encodes_packed() {
        let unpacked = Text::Gsm7("hello".into()).encode();
        let packed = Text::Gsm7Packed("hello".into()).encode();
        assert_eq!(unpacked.len(), 5);
        assert_eq!(packed.len(), 5); // ceil(5 * 7 / 8)
        assert_ne!(unpacked, packed);
    }

    #[test]
    fn capacities() {
        assert_eq!(Text::Gsm7("x".into()).single_segment_capacity(), 160);
        assert_eq!(Text::Ucs2("x".into()).single_segment_capacity(), 140);
        assert_eq!(Text::Gsm7("x".into()).concatenated_capacity(), 153);
        assert_eq!(Text::Ucs2("x".into()).concatenated_capacity(), 134);
    }
}
