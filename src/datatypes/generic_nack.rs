// ABOUTME: generic_nack error response PDU (header-only body)

use crate::datatypes::{CommandId, CommandStatus};
use crate::macros::impl_header_only_pdu;

/// generic_nack (section 4.3.1): sent in place of a real response when the
/// peer could not parse a request or did not recognize its command id. The
/// sequence number echoes the offending PDU's when it could be read, else 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenericNack {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl GenericNack {
    pub fn new(sequence_number: u32, command_status: CommandStatus) -> Self {
        Self {
            command_status,
            sequence_number,
        }
    }
}

impl_header_only_pdu!(GenericNack, CommandId::GenericNack);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Decodable, Encodable, PduHeader};
    use std::io::Cursor;

    #[test]
    fn roundtrip() {
        let original = GenericNack::new(456, CommandStatus::InvalidCommandId);
        let bytes = original.to_bytes().unwrap();
        let mut cursor = Cursor::new(bytes.as_ref());
        let header = PduHeader::decode(&mut cursor).unwrap();
        let decoded = GenericNack::decode(header, &mut cursor).unwrap();
        assert_eq!(decoded, original);
    }
}
