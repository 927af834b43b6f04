// ABOUTME: The Pdu enum - one variant per command id, with check/parse/encode
// ABOUTME: A tagged union drives decoding by match instead of a decoder registry

use crate::codec::{CodecError, Decodable, Encodable, PduHeader, MAX_PDU_SIZE};
use crate::datatypes::{
    AlertNotification, Bind, BindResp, CommandId, CommandStatus, DeliverSm, DeliverSmResp,
    EnquireLink, EnquireLinkResp, GenericNack, QuerySm, QuerySmResp, SubmitMulti, SubmitMultiResp,
    SubmitSm, SubmitSmResp, Unbind, UnbindResp,
};
use bytes::{Buf, Bytes};
use std::io::Cursor;

/// Any PDU this client can put on or take off the wire.
///
/// The large message bodies are boxed so the enum stays register-sized for
/// the common control traffic.
#[derive(Clone, Debug, PartialEq)]
pub enum Pdu {
    Bind(Bind),
    BindResp(BindResp),
    Unbind(Unbind),
    UnbindResp(UnbindResp),
    EnquireLink(EnquireLink),
    EnquireLinkResp(EnquireLinkResp),
    SubmitSm(Box<SubmitSm>),
    SubmitSmResp(SubmitSmResp),
    SubmitMulti(Box<SubmitMulti>),
    SubmitMultiResp(SubmitMultiResp),
    DeliverSm(Box<DeliverSm>),
    DeliverSmResp(DeliverSmResp),
    QuerySm(QuerySm),
    QuerySmResp(QuerySmResp),
    GenericNack(GenericNack),
    AlertNotification(AlertNotification),
}

impl Pdu {
    pub fn command_id(&self) -> CommandId {
        match self {
            Pdu::Bind(p) => p.role.request_id(),
            Pdu::BindResp(p) => p.role.response_id(),
            Pdu::Unbind(_) => CommandId::Unbind,
            Pdu::UnbindResp(_) => CommandId::UnbindResp,
            Pdu::EnquireLink(_) => CommandId::EnquireLink,
            Pdu::EnquireLinkResp(_) => CommandId::EnquireLinkResp,
            Pdu::SubmitSm(_) => CommandId::SubmitSm,
            Pdu::SubmitSmResp(_) => CommandId::SubmitSmResp,
            Pdu::SubmitMulti(_) => CommandId::SubmitMulti,
            Pdu::SubmitMultiResp(_) => CommandId::SubmitMultiResp,
            Pdu::DeliverSm(_) => CommandId::DeliverSm,
            Pdu::DeliverSmResp(_) => CommandId::DeliverSmResp,
            Pdu::QuerySm(_) => CommandId::QuerySm,
            Pdu::QuerySmResp(_) => CommandId::QuerySmResp,
            Pdu::GenericNack(_) => CommandId::GenericNack,
            Pdu::AlertNotification(_) => CommandId::AlertNotification,
        }
    }

    pub fn sequence_number(&self) -> u32 {
        match self {
            Pdu::Bind(p) => p.sequence_number,
            Pdu::BindResp(p) => p.sequence_number,
            Pdu::Unbind(p) => p.sequence_number,
            Pdu::UnbindResp(p) => p.sequence_number,
            Pdu::EnquireLink(p) => p.sequence_number,
            Pdu::EnquireLinkResp(p) => p.sequence_number,
            Pdu::SubmitSm(p) => p.sequence_number,
            Pdu::SubmitSmResp(p) => p.sequence_number,
            Pdu::SubmitMulti(p) => p.sequence_number,
            Pdu::SubmitMultiResp(p) => p.sequence_number,
            Pdu::DeliverSm(p) => p.sequence_number,
            Pdu::DeliverSmResp(p) => p.sequence_number,
            Pdu::QuerySm(p) => p.sequence_number,
            Pdu::QuerySmResp(p) => p.sequence_number,
            Pdu::GenericNack(p) => p.sequence_number,
            Pdu::AlertNotification(p) => p.sequence_number,
        }
    }

    /// command_status for responses; requests always carry Ok.
    pub fn command_status(&self) -> CommandStatus {
        match self {
            Pdu::BindResp(p) => p.command_status,
            Pdu::UnbindResp(p) => p.command_status,
            Pdu::EnquireLinkResp(p) => p.command_status,
            Pdu::SubmitSmResp(p) => p.command_status,
            Pdu::SubmitMultiResp(p) => p.command_status,
            Pdu::DeliverSmResp(p) => p.command_status,
            Pdu::QuerySmResp(p) => p.command_status,
            Pdu::GenericNack(p) => p.command_status,
            _ => CommandStatus::Ok,
        }
    }

    pub fn is_response(&self) -> bool {
        self.command_id().is_response()
    }

    /// Cheap pre-scan: is a complete, plausibly-framed PDU buffered?
    ///
    /// `Err(ShortPdu)` means wait for more bytes. Length errors mean the
    /// stream cannot be re-synchronized and the connection must drop.
    pub fn check(buf: &Cursor<&[u8]>) -> Result<usize, CodecError> {
        let available = buf.remaining();
        if available < 4 {
            return Err(CodecError::ShortPdu);
        }
        let slice = buf.get_ref();
        let at = buf.position() as usize;
        let command_length = u32::from_be_bytes([
            slice[at],
            slice[at + 1],
            slice[at + 2],
            slice[at + 3],
        ]);
        if command_length < PduHeader::SIZE as u32 {
            return Err(CodecError::InvalidPduLength(command_length));
        }
        if command_length > MAX_PDU_SIZE {
            return Err(CodecError::OversizedPdu(command_length));
        }
        if available < command_length as usize {
            return Err(CodecError::ShortPdu);
        }
        Ok(command_length as usize)
    }

    /// Parse one complete PDU from the start of `frame` (exactly
    /// `command_length` bytes, as established by [`Pdu::check`]).
    pub fn parse(frame: &[u8]) -> Result<Pdu, CodecError> {
        let mut cursor = Cursor::new(frame);
        let header = PduHeader::decode(&mut cursor)?;
        if frame.len() < header.command_length as usize {
            return Err(CodecError::ShortPdu);
        }

        // Decode the body against its own sub-slice so a malformed TLV
        // cannot read past this PDU into the next one.
        let body = &frame[PduHeader::SIZE..header.command_length as usize];
        let mut body_cursor = Cursor::new(body);

        let pdu = match header.command_id {
            CommandId::BindTransmitter | CommandId::BindReceiver | CommandId::BindTransceiver => {
                Pdu::Bind(Bind::decode(header, &mut body_cursor)?)
            }
            CommandId::BindTransmitterResp
            | CommandId::BindReceiverResp
            | CommandId::BindTransceiverResp => {
                Pdu::BindResp(BindResp::decode(header, &mut body_cursor)?)
            }
            CommandId::Unbind => Pdu::Unbind(Unbind::decode(header, &mut body_cursor)?),
            CommandId::UnbindResp => Pdu::UnbindResp(UnbindResp::decode(header, &mut body_cursor)?),
            CommandId::EnquireLink => {
                Pdu::EnquireLink(EnquireLink::decode(header, &mut body_cursor)?)
            }
            CommandId::EnquireLinkResp => {
                Pdu::EnquireLinkResp(EnquireLinkResp::decode(header, &mut body_cursor)?)
            }
            CommandId::SubmitSm => {
                Pdu::SubmitSm(Box::new(SubmitSm::decode(header, &mut body_cursor)?))
            }
            CommandId::SubmitSmResp => {
                Pdu::SubmitSmResp(SubmitSmResp::decode(header, &mut body_cursor)?)
            }
            CommandId::SubmitMulti => {
                Pdu::SubmitMulti(Box::new(SubmitMulti::decode(header, &mut body_cursor)?))
            }
            CommandId::SubmitMultiResp => {
                Pdu::SubmitMultiResp(SubmitMultiResp::decode(header, &mut body_cursor)?)
            }
            CommandId::DeliverSm => {
                Pdu::DeliverSm(Box::new(DeliverSm::decode(header, &mut body_cursor)?))
            }
            CommandId::DeliverSmResp => {
                Pdu::DeliverSmResp(DeliverSmResp::decode(header, &mut body_cursor)?)
            }
            CommandId::QuerySm => Pdu::QuerySm(QuerySm::decode(header, &mut body_cursor)?),
            CommandId::QuerySmResp => {
                Pdu::QuerySmResp(QuerySmResp::decode(header, &mut body_cursor)?)
            }
            CommandId::GenericNack => {
                Pdu::GenericNack(GenericNack::decode(header, &mut body_cursor)?)
            }
            CommandId::AlertNotification => {
                Pdu::AlertNotification(AlertNotification::decode(header, &mut body_cursor)?)
            }
        };

        Ok(pdu)
    }

    /// Encode to wire bytes with the length field patched.
    pub fn to_bytes(&self) -> Result<Bytes, CodecError> {
        match self {
            Pdu::Bind(p) => p.to_bytes(),
            Pdu::BindResp(p) => p.to_bytes(),
            Pdu::Unbind(p) => p.to_bytes(),
            Pdu::UnbindResp(p) => p.to_bytes(),
            Pdu::EnquireLink(p) => p.to_bytes(),
            Pdu::EnquireLinkResp(p) => p.to_bytes(),
            Pdu::SubmitSm(p) => p.to_bytes(),
            Pdu::SubmitSmResp(p) => p.to_bytes(),
            Pdu::SubmitMulti(p) => p.to_bytes(),
            Pdu::SubmitMultiResp(p) => p.to_bytes(),
            Pdu::DeliverSm(p) => p.to_bytes(),
            Pdu::DeliverSmResp(p) => p.to_bytes(),
            Pdu::QuerySm(p) => p.to_bytes(),
            Pdu::QuerySmResp(p) => p.to_bytes(),
            Pdu::GenericNack(p) => p.to_bytes(),
            Pdu::AlertNotification(p) => p.to_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{BindRole, MessageId, Password, SystemId, SystemType};

    #[test]
    fn check_needs_full_header_prefix() {
        let data = [0x00u8, 0x00];
        let cursor = Cursor::new(&data[..]);
        assert!(matches!(Pdu::check(&cursor), Err(CodecError::ShortPdu)));
    }

    #[test]
    fn check_waits_for_full_frame() {
        let bytes = EnquireLink::new(1).to_bytes().unwrap();
        let partial = &bytes[..10];
        let cursor = Cursor::new(partial);
        assert!(matches!(Pdu::check(&cursor), Err(CodecError::ShortPdu)));

        let cursor = Cursor::new(bytes.as_ref());
        assert_eq!(Pdu::check(&cursor).unwrap(), 16);
    }

    #[test]
    fn check_rejects_implausible_length() {
        let data = [
            0xFFu8, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x15, //
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
        ];
        let cursor = Cursor::new(&data[..]);
        assert!(matches!(
            Pdu::check(&cursor),
            Err(CodecError::OversizedPdu(_))
        ));
    }

    #[test]
    fn parse_dispatches_by_command_id() {
        let bind = Bind {
            role: BindRole::Transceiver,
            sequence_number: 1,
            system_id: SystemId::new("sys").unwrap(),
            password: Password::new("pw").unwrap(),
            system_type: SystemType::default(),
            interface_version: Default::default(),
            addr_ton: Default::default(),
            addr_npi: Default::default(),
            address_range: Default::default(),
        };
        let bytes = bind.to_bytes().unwrap();
        let parsed = Pdu::parse(&bytes).unwrap();
        assert_eq!(parsed, Pdu::Bind(bind));
        assert_eq!(parsed.command_id(), CommandId::BindTransceiver);
        assert!(!parsed.is_response());
    }

    #[test]
    fn parse_response_accessors() {
        let resp = SubmitSmResp {
            command_status: CommandStatus::Throttled,
            sequence_number: 42,
            message_id: MessageId::default(),
        };
        let parsed = Pdu::parse(&resp.to_bytes().unwrap()).unwrap();
        assert!(parsed.is_response());
        assert_eq!(parsed.sequence_number(), 42);
        assert_eq!(parsed.command_status(), CommandStatus::Throttled);
    }

    #[test]
    fn encode_parse_identity_for_control_pdus() {
        let pdus = vec![
            Pdu::EnquireLink(EnquireLink::new(5)),
            Pdu::EnquireLinkResp(EnquireLinkResp::new(5)),
            Pdu::Unbind(Unbind::new(6)),
            Pdu::UnbindResp(UnbindResp::new(6)),
            Pdu::GenericNack(GenericNack::new(7, CommandStatus::InvalidCommandId)),
        ];
        for pdu in pdus {
            let bytes = pdu.to_bytes().unwrap();
            assert_eq!(Pdu::parse(&bytes).unwrap(), pdu);
            // Header length always matches the byte count.
            assert_eq!(
                u32::from_be_bytes(bytes[0..4].try_into().unwrap()) as usize,
                bytes.len()
            );
        }
    }
}
