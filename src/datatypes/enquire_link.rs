// ABOUTME: enquire_link keepalive PDU pair (header-only bodies)

use crate::datatypes::{CommandId, CommandStatus};
use crate::macros::impl_header_only_pdu;

/// enquire_link (section 4.11.1): either peer probes liveness; the other
/// side must answer promptly with enquire_link_resp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnquireLink {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl EnquireLink {
    pub fn new(sequence_number: u32) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
        }
    }
}

/// enquire_link_resp, echoing the probe's sequence number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnquireLinkResp {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl EnquireLinkResp {
    pub fn new(sequence_number: u32) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
        }
    }
}

impl_header_only_pdu!(EnquireLink, CommandId::EnquireLink);
impl_header_only_pdu!(EnquireLinkResp, CommandId::EnquireLinkResp);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Decodable, Encodable, PduHeader};
    use std::io::Cursor;

    #[test]
    fn wire_layout() {
        let bytes = EnquireLink::new(0x2A).to_bytes().unwrap();
        assert_eq!(
            bytes.as_ref(),
            &[
                0x00, 0x00, 0x00, 0x10, // command_length = 16
                0x00, 0x00, 0x00, 0x15, // enquire_link
                0x00, 0x00, 0x00, 0x00, // status
                0x00, 0x00, 0x00, 0x2A, // sequence
            ]
        );
    }

    #[test]
    fn roundtrip() {
        let original = EnquireLinkResp::new(7);
        let bytes = original.to_bytes().unwrap();
        let mut cursor = Cursor::new(bytes.as_ref());
        let header = PduHeader::decode(&mut cursor).unwrap();
        let decoded = EnquireLinkResp::decode(header, &mut cursor).unwrap();
        assert_eq!(decoded, original);
    }
}
