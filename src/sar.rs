// ABOUTME: Long-message segmentation and reassembly over UDH concatenation headers
// ABOUTME: Outbound split uses 8-bit references; inbound accepts 8- and 16-bit

use crate::datatypes::DeliverSm;
use crate::text::{gsm7, Text};
use bytes::{BufMut, Bytes, BytesMut};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Information element: concatenated short message, 8-bit reference.
const IEI_CONCAT_8: u8 = 0x00;
/// Information element: concatenated short message, 16-bit reference.
const IEI_CONCAT_16: u8 = 0x08;

/// Hard ceiling from the one-octet total-parts field.
pub const MAX_PARTS: usize = 255;

#[derive(Debug, Error)]
pub enum SarError {
    /// The message would need more than 255 parts.
    #[error("message of {parts} parts exceeds the {MAX_PARTS}-part UDH limit")]
    MessageTooLong { parts: usize },
}

/// Concatenation metadata pulled out of a UDH.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcatInfo {
    pub reference: u16,
    pub total: u8,
    pub sequence: u8,
}

/// The 6-octet UDH this crate emits: `05 00 03 <ref> <total> <seq>`.
pub fn build_concat_udh(reference: u8, total: u8, sequence: u8) -> [u8; 6] {
    [0x05, IEI_CONCAT_8, 0x03, reference, total, sequence]
}

/// Parse a UDH at the front of `payload`. Returns the concatenation IE (if
/// any) and the full header length including the UDHL octet, or `None` when
/// the bytes do not form a well-formed UDH. Unrelated IEs are skipped.
pub fn parse_udh(payload: &[u8]) -> Option<(Option<ConcatInfo>, usize)> {
    let udhl = *payload.first()? as usize;
    if udhl == 0 || payload.len() < 1 + udhl {
        return None;
    }
    let mut concat = None;
    let mut at = 1;
    let end = 1 + udhl;
    while at < end {
        if at + 2 > end {
            return None;
        }
        let iei = payload[at];
        let iedl = payload[at + 1] as usize;
        let value = payload.get(at + 2..at + 2 + iedl)?;
        if at + 2 + iedl > end {
            return None;
        }
        match (iei, iedl) {
            (IEI_CONCAT_8, 3) => {
                concat = Some(ConcatInfo {
                    reference: value[0] as u16,
                    total: value[1],
                    sequence: value[2],
                });
            }
            (IEI_CONCAT_16, 4) => {
                concat = Some(ConcatInfo {
                    reference: u16::from_be_bytes([value[0], value[1]]),
                    total: value[2],
                    sequence: value[3],
                });
            }
            _ => {}
        }
        at += 2 + iedl;
    }
    Some((concat, end))
}

/// Split an encoded payload into UDH-prefixed short_message values, one per
/// part, in sequence order. Boundaries respect the codec: a GSM7 escape
/// pair or a UCS-2 surrogate pair is never cut in half.
pub fn split_message(text: &Text, reference: u8) -> Result<Vec<Bytes>, SarError> {
    let capacity = text.concatenated_capacity();

    let chunks: Vec<Vec<u8>> = match text {
        Text::Gsm7(s) => chunk_septets(&gsm7::encode(s), capacity),
        Text::Gsm7Packed(s) => chunk_septets(&gsm7::encode(s), capacity)
            .into_iter()
            // One fill bit aligns the packed text to the septet boundary
            // that follows the 6-octet UDH (3GPP 23.040 9.2.3.24.1).
            .map(|septets| gsm7::pack(&septets, 1))
            .collect(),
        Text::Ucs2(s) => chunk_ucs2(&crate::text::ucs2::encode(s), capacity),
        other => other
            .encode()
            .chunks(capacity)
            .map(<[u8]>::to_vec)
            .collect(),
    };

    if chunks.len() > MAX_PARTS {
        return Err(SarError::MessageTooLong {
            parts: chunks.len(),
        });
    }

    let total = chunks.len() as u8;
    Ok(chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut sm = BytesMut::with_capacity(6 + chunk.len());
            sm.put_slice(&build_concat_udh(reference, total, (i + 1) as u8));
            sm.put_slice(&chunk);
            sm.freeze()
        })
        .collect())
}

/// Chunk septets without separating an escape from its extension septet.
fn chunk_septets(septets: &[u8], capacity: usize) -> Vec<Vec<u8>> {
    let mut chunks = Vec::new();
    let mut at = 0;
    while at < septets.len() {
        let mut end = septets.len().min(at + capacity);
        if end < septets.len() && ends_with_unpaired_escape(&septets[at..end]) {
            end -= 1;
        }
        chunks.push(septets[at..end].to_vec());
        at = end;
    }
    if chunks.is_empty() {
        chunks.push(Vec::new());
    }
    chunks
}

/// True when the slice ends on an escape that opens a pair.
fn ends_with_unpaired_escape(slice: &[u8]) -> bool {
    let trailing = slice.iter().rev().take_while(|&&s| s == gsm7::ESCAPE).count();
    trailing % 2 == 1
}

/// Chunk UTF-16BE bytes on code-unit boundaries without cutting a
/// surrogate pair.
fn chunk_ucs2(bytes: &[u8], capacity: usize) -> Vec<Vec<u8>> {
    let capacity = capacity & !1; // whole code units
    let mut chunks = Vec::new();
    let mut at = 0;
    while at < bytes.len() {
        let mut end = bytes.len().min(at + capacity);
        // A high surrogate as the final unit would strand its partner.
        if end < bytes.len() && end >= 2 && (0xD8..0xDC).contains(&bytes[end - 2]) {
            end -= 2;
        }
        chunks.push(bytes[at..end].to_vec());
        at = end;
    }
    if chunks.is_empty() {
        chunks.push(Vec::new());
    }
    chunks
}

/// What [`Reassembler::push`] did with a PDU.
pub enum PushOutcome {
    /// Not a message segment; hand it to the application as-is.
    Passthrough(Box<DeliverSm>),
    /// A segment was stored; the message is still incomplete.
    Buffered,
    /// The final segment arrived: the rebuilt message, UDH stripped and
    /// UDHI cleared.
    Complete(Box<DeliverSm>),
}

#[derive(Hash, PartialEq, Eq, Clone)]
struct BucketKey {
    source: String,
    destination: String,
    reference: u16,
}

struct Bucket {
    total: u8,
    parts: BTreeMap<u8, Bytes>,
    created_at: Instant,
}

/// Buffers inbound segments keyed by (source, destination, reference) and
/// emits each logical message exactly once. Stale buckets are discarded by
/// [`Reassembler::sweep`], which the session driver runs on a timer.
pub struct Reassembler {
    buckets: HashMap<BucketKey, Bucket>,
    stale_ttl: Duration,
}

impl Reassembler {
    pub fn new(stale_ttl: Duration) -> Self {
        Self {
            buckets: HashMap::new(),
            stale_ttl,
        }
    }

    /// Number of partially assembled messages currently buffered.
    pub fn pending(&self) -> usize {
        self.buckets.len()
    }

    pub fn push(&mut self, pdu: DeliverSm) -> PushOutcome {
        let payload = pdu.short_message.clone();
        // The UDHI bit is authoritative, but segments from relays that
        // lost the bit are still recognized by a well-formed leading UDH.
        let parsed = if pdu.esm_class.has_udh() {
            parse_udh(&payload)
        } else {
            parse_udh(&payload).filter(|(concat, _)| concat.is_some())
        };

        let Some((Some(concat), header_len)) = parsed else {
            return PushOutcome::Passthrough(Box::new(pdu));
        };
        if concat.total == 0 || concat.sequence == 0 || concat.sequence > concat.total {
            tracing::warn!(
                reference = concat.reference,
                total = concat.total,
                sequence = concat.sequence,
                "dropping segment with inconsistent concatenation header"
            );
            return PushOutcome::Buffered;
        }

        let key = BucketKey {
            source: pdu.source_addr.as_str().to_owned(),
            destination: pdu.destination_addr.as_str().to_owned(),
            reference: concat.reference,
        };
        let complete = {
            let bucket = self.buckets.entry(key.clone()).or_insert_with(|| Bucket {
                total: concat.total,
                parts: BTreeMap::new(),
                created_at: Instant::now(),
            });
            bucket.total = concat.total;
            // Duplicate sequence numbers overwrite: last write wins.
            bucket
                .parts
                .insert(concat.sequence, payload.slice(header_len..));
            bucket.parts.len() >= bucket.total as usize
        };
        if !complete {
            return PushOutcome::Buffered;
        }
        let Some(bucket) = self.buckets.remove(&key) else {
            return PushOutcome::Buffered;
        };
        let mut assembled = BytesMut::new();
        for part in bucket.parts.values() {
            assembled.extend_from_slice(part);
        }

        let mut merged = pdu;
        merged.short_message = assembled.freeze();
        merged.esm_class = merged.esm_class.without_udh();
        PushOutcome::Complete(Box::new(merged))
    }

    /// Drop buckets older than the stale TTL. Incomplete messages are
    /// silently discarded; the parts will never come.
    pub fn sweep(&mut self) {
        let ttl = self.stale_ttl;
        let now = Instant::now();
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| now.duration_since(bucket.created_at) <= ttl);
        let dropped = before - self.buckets.len();
        if dropped > 0 {
            tracing::debug!(dropped, "discarded stale reassembly buckets");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{EsmClass, SmeAddress};
    use bytes::Bytes;

    fn segment(source: &str, reference: u8, total: u8, seq: u8, body: &[u8]) -> DeliverSm {
        let mut sm = Vec::from(build_concat_udh(reference, total, seq));
        sm.extend_from_slice(body);
        DeliverSm {
            sequence_number: seq as u32,
            service_type: Default::default(),
            source_addr_ton: Default::default(),
            source_addr_npi: Default::default(),
            source_addr: SmeAddress::new(source).unwrap(),
            dest_addr_ton: Default::default(),
            dest_addr_npi: Default::default(),
            destination_addr: SmeAddress::new("1234").unwrap(),
            esm_class: EsmClass(0).with_udh(),
            protocol_id: 0,
            priority_flag: 0,
            schedule_delivery_time: Default::default(),
            validity_period: Default::default(),
            registered_delivery: 0,
            replace_if_present_flag: 0,
            data_coding: 0,
            sm_default_msg_id: 0,
            short_message: Bytes::from(sm),
            tlvs: Vec::new(),
        }
    }

    #[test]
    fn udh_parse_8bit() {
        let udh = build_concat_udh(0x42, 3, 2);
        let (concat, len) = parse_udh(&udh).unwrap();
        assert_eq!(len, 6);
        assert_eq!(
            concat,
            Some(ConcatInfo {
                reference: 0x42,
                total: 3,
                sequence: 2
            })
        );
    }

    #[test]
    fn udh_parse_16bit_and_foreign_ie() {
        // UDHL=12: port-addressing IE (05) then a 16-bit concat IE (08).
        let payload = [
            0x0C, 0x05, 0x04, 0x0B, 0x84, 0x0B, 0x84, //
            0x08, 0x04, 0x01, 0x02, 0x05, 0x03, //
            b'h', b'i',
        ];
        let (concat, len) = parse_udh(&payload).unwrap();
        assert_eq!(len, 13);
        assert_eq!(
            concat,
            Some(ConcatInfo {
                reference: 0x0102,
                total: 5,
                sequence: 3
            })
        );
    }

    #[test]
    fn udh_rejects_truncated_header() {
        assert!(parse_udh(&[0x05, 0x00, 0x03, 0x01]).is_none());
        assert!(parse_udh(&[]).is_none());
        assert!(parse_udh(&[0x00]).is_none());
    }

    #[test]
    fn split_two_parts_same_reference() {
        let text = Text::Gsm7("a".repeat(200));
        let parts = split_message(&text, 7).unwrap();
        assert_eq!(parts.len(), 2);
        for (i, part) in parts.iter().enumerate() {
            assert_eq!(&part[..3], &[0x05, 0x00, 0x03]);
            assert_eq!(part[3], 7); // shared reference
            assert_eq!(part[4], 2); // total
            assert_eq!(part[5], (i + 1) as u8);
        }
        assert_eq!(parts[0].len() - 6, 153);
        assert_eq!(parts[1].len() - 6, 47);
    }

    #[test]
    fn split_never_cuts_an_escape_pair() {
        // 152 plain chars then '€' (escape pair) straddling the boundary.
        let mut text = "x".repeat(152);
        text.push('€');
        text.push_str(&"y".repeat(20));
        let parts = split_message(&Text::Gsm7(text.clone()), 1).unwrap();
        let rejoined: Vec<u8> = parts
            .iter()
            .flat_map(|p| p[6..].to_vec())
            .collect();
        assert_eq!(gsm7::decode(&rejoined), text);
        // The escape was pushed whole into the second part.
        assert_eq!(parts[0].len() - 6, 152);
        assert_ne!(*parts[0].last().unwrap(), gsm7::ESCAPE);
    }

    #[test]
    fn split_never_cuts_a_surrogate_pair() {
        // 66 BMP chars (132 octets), then an astral char at the boundary.
        let mut text = "к".repeat(66);
        text.push('😊');
        text.push_str("done");
        let parts = split_message(&Text::Ucs2(text.clone()), 1).unwrap();
        let rejoined: Vec<u8> = parts
            .iter()
            .flat_map(|p| p[6..].to_vec())
            .collect();
        assert_eq!(crate::text::ucs2::decode(&rejoined), text);
        assert_eq!(parts[0].len() - 6, 132);
    }

    #[test]
    fn split_overflow_rejected() {
        let text = Text::Raw(Bytes::from(vec![0u8; 134 * 256]));
        assert!(matches!(
            split_message(&text, 1),
            Err(SarError::MessageTooLong { parts: 256 })
        ));
    }

    #[test]
    fn reassembles_out_of_order() {
        let mut reassembler = Reassembler::new(Duration::from_secs(300));
        assert!(matches!(
            reassembler.push(segment("5511", 9, 3, 3, b"three")),
            PushOutcome::Buffered
        ));
        assert!(matches!(
            reassembler.push(segment("5511", 9, 3, 1, b"one-")),
            PushOutcome::Buffered
        ));
        match reassembler.push(segment("5511", 9, 3, 2, b"two-")) {
            PushOutcome::Complete(pdu) => {
                assert_eq!(pdu.short_message.as_ref(), b"one-two-three");
                assert!(!pdu.esm_class.has_udh());
            }
            _ => panic!("expected completion"),
        }
        assert_eq!(reassembler.pending(), 0);
    }

    #[test]
    fn duplicate_segment_last_write_wins() {
        let mut reassembler = Reassembler::new(Duration::from_secs(300));
        reassembler.push(segment("5511", 9, 2, 1, b"AAA-"));
        reassembler.push(segment("5511", 9, 2, 1, b"BBB-"));
        match reassembler.push(segment("5511", 9, 2, 2, b"end")) {
            PushOutcome::Complete(pdu) => {
                assert_eq!(pdu.short_message.as_ref(), b"BBB-end")
            }
            _ => panic!("expected completion"),
        }
    }

    #[test]
    fn distinct_sources_do_not_mix() {
        let mut reassembler = Reassembler::new(Duration::from_secs(300));
        reassembler.push(segment("1111", 9, 2, 1, b"from-1111"));
        reassembler.push(segment("2222", 9, 2, 1, b"from-2222"));
        assert_eq!(reassembler.pending(), 2);
    }

    #[test]
    fn non_segment_passes_through() {
        let mut pdu = segment("5511", 1, 1, 1, b"x");
        pdu.esm_class = EsmClass(0);
        pdu.short_message = Bytes::from_static(b"plain message");
        let mut reassembler = Reassembler::new(Duration::from_secs(300));
        match reassembler.push(pdu) {
            PushOutcome::Passthrough(p) => {
                assert_eq!(p.short_message.as_ref(), b"plain message")
            }
            _ => panic!("expected passthrough"),
        }
    }

    #[test]
    fn udhi_without_concat_ie_passes_through_with_udh_intact() {
        let mut pdu = segment("5511", 1, 1, 1, b"");
        // A UDH carrying only a port-addressing IE.
        pdu.short_message = Bytes::from_static(&[0x06, 0x05, 0x04, 0x0B, 0x84, 0x0B, 0x84]);
        let mut reassembler = Reassembler::new(Duration::from_secs(300));
        assert!(matches!(
            reassembler.push(pdu),
            PushOutcome::Passthrough(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_empties_stale_buckets() {
        let mut reassembler = Reassembler::new(Duration::from_secs(300));
        reassembler.push(segment("5511", 9, 3, 1, b"one"));
        assert_eq!(reassembler.pending(), 1);

        tokio::time::advance(Duration::from_secs(299)).await;
        reassembler.sweep();
        assert_eq!(reassembler.pending(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        reassembler.sweep();
        assert_eq!(reassembler.pending(), 0);
    }
}
