// ABOUTME: Macro for the header-only PDU family (enquire_link, unbind, generic_nack)
// ABOUTME: Generates the identical Encodable/Decodable impls these bodies share

/// Implements `Encodable` and `Decodable` for PDUs that consist of a header
/// and nothing else. Trailing body bytes on decode are skipped: a peer that
/// pads a header-only PDU is out of spec but harmless.
macro_rules! impl_header_only_pdu {
    ($pdu_type:ident, $command_id:expr) => {
        impl $crate::codec::Encodable for $pdu_type {
            fn encode(
                &self,
                buf: &mut bytes::BytesMut,
            ) -> Result<(), $crate::codec::CodecError> {
                $crate::codec::PduHeader {
                    command_length: $crate::codec::PduHeader::SIZE as u32,
                    command_id: $command_id,
                    command_status: self.command_status,
                    sequence_number: self.sequence_number,
                }
                .encode(buf);
                Ok(())
            }
        }

        impl $crate::codec::Decodable for $pdu_type {
            fn command_id() -> $crate::datatypes::CommandId {
                $command_id
            }

            fn decode(
                header: $crate::codec::PduHeader,
                buf: &mut std::io::Cursor<&[u8]>,
            ) -> Result<Self, $crate::codec::CodecError> {
                use bytes::Buf;
                if buf.has_remaining() {
                    let len = buf.remaining();
                    buf.advance(len);
                }
                Ok(Self {
                    command_status: header.command_status,
                    sequence_number: header.sequence_number,
                })
            }
        }
    };
}

pub(crate) use impl_header_only_pdu;
