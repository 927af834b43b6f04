// ABOUTME: query_sm and query_sm_resp bodies for message-state queries

use crate::codec::{
    decode_cstring, decode_u8, encode_cstring, CodecError, Decodable, Encodable, PduHeader,
};
use crate::datatypes::{
    CommandId, CommandStatus, MessageId, MessageState, NumericPlanIndicator, SmeAddress,
    TimeString, TypeOfNumber,
};
use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;

/// query_sm (section 4.8.1): ask the SMSC for the state of a previously
/// submitted message. The source address must match the submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuerySm {
    pub sequence_number: u32,
    pub message_id: MessageId,
    pub source_addr_ton: TypeOfNumber,
    pub source_addr_npi: NumericPlanIndicator,
    pub source_addr: SmeAddress,
}

impl Encodable for QuerySm {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let header = PduHeader {
            command_length: 0,
            command_id: CommandId::QuerySm,
            command_status: CommandStatus::Ok,
            sequence_number: self.sequence_number,
        };
        header.encode(buf);
        encode_cstring(buf, self.message_id.as_str());
        buf.put_u8(self.source_addr_ton as u8);
        buf.put_u8(self.source_addr_npi as u8);
        encode_cstring(buf, self.source_addr.as_str());
        Ok(())
    }
}

impl Decodable for QuerySm {
    fn command_id() -> CommandId {
        CommandId::QuerySm
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let field = |e: crate::datatypes::FixedStringError, field: &'static str| {
            CodecError::FieldValidation {
                field,
                reason: e.to_string(),
            }
        };
        let message_id = MessageId::new(decode_cstring(buf, 65, "message_id")?)
            .map_err(|e| field(e, "message_id"))?;
        let source_addr_ton =
            TypeOfNumber::try_from(decode_u8(buf, "source_addr_ton")?).unwrap_or_default();
        let source_addr_npi =
            NumericPlanIndicator::try_from(decode_u8(buf, "source_addr_npi")?).unwrap_or_default();
        let source_addr = SmeAddress::new(decode_cstring(buf, 21, "source_addr")?)
            .map_err(|e| field(e, "source_addr"))?;
        Ok(Self {
            sequence_number: header.sequence_number,
            message_id,
            source_addr_ton,
            source_addr_npi,
            source_addr,
        })
    }
}

/// query_sm_resp (section 4.8.2). final_date is NULL while the message is
/// still in a non-final state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuerySmResp {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub message_id: MessageId,
    pub final_date: TimeString,
    pub message_state: MessageState,
    pub error_code: u8,
}

impl Encodable for QuerySmResp {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let header = PduHeader {
            command_length: 0,
            command_id: CommandId::QuerySmResp,
            command_status: self.command_status,
            sequence_number: self.sequence_number,
        };
        header.encode(buf);
        encode_cstring(buf, self.message_id.as_str());
        encode_cstring(buf, self.final_date.as_str());
        buf.put_u8(self.message_state as u8);
        buf.put_u8(self.error_code);
        Ok(())
    }
}

impl Decodable for QuerySmResp {
    fn command_id() -> CommandId {
        CommandId::QuerySmResp
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if !buf.has_remaining() {
            // Failed queries may come back headerless-bodied.
            return Ok(Self {
                command_status: header.command_status,
                sequence_number: header.sequence_number,
                message_id: MessageId::default(),
                final_date: TimeString::default(),
                message_state: MessageState::Unknown,
                error_code: 0,
            });
        }
        let field = |e: crate::datatypes::FixedStringError, field: &'static str| {
            CodecError::FieldValidation {
                field,
                reason: e.to_string(),
            }
        };
        let message_id = MessageId::new(decode_cstring(buf, 65, "message_id")?)
            .map_err(|e| field(e, "message_id"))?;
        let final_date = TimeString::new(decode_cstring(buf, 17, "final_date")?)
            .map_err(|e| field(e, "final_date"))?;
        let message_state = MessageState::try_from(decode_u8(buf, "message_state")?)
            .unwrap_or(MessageState::Unknown);
        let error_code = decode_u8(buf, "error_code")?;
        Ok(Self {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            message_id,
            final_date,
            message_state,
            error_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_roundtrip() {
        let original = QuerySm {
            sequence_number: 4,
            message_id: MessageId::new("MSG0001").unwrap(),
            source_addr_ton: TypeOfNumber::International,
            source_addr_npi: NumericPlanIndicator::Isdn,
            source_addr: SmeAddress::new("1234").unwrap(),
        };
        let bytes = original.to_bytes().unwrap();
        let mut cursor = Cursor::new(bytes.as_ref());
        let header = PduHeader::decode(&mut cursor).unwrap();
        let decoded = QuerySm::decode(header, &mut cursor).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn resp_roundtrip() {
        let original = QuerySmResp {
            command_status: CommandStatus::Ok,
            sequence_number: 4,
            message_id: MessageId::new("MSG0001").unwrap(),
            final_date: TimeString::new("240715093000008+").unwrap(),
            message_state: MessageState::Delivered,
            error_code: 0,
        };
        let bytes = original.to_bytes().unwrap();
        let mut cursor = Cursor::new(bytes.as_ref());
        let header = PduHeader::decode(&mut cursor).unwrap();
        let decoded = QuerySmResp::decode(header, &mut cursor).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn resp_empty_body_on_failure() {
        let mut raw = BytesMut::new();
        PduHeader {
            command_length: 16,
            command_id: CommandId::QuerySmResp,
            command_status: CommandStatus::QuerySmFailed,
            sequence_number: 4,
        }
        .encode(&mut raw);
        let mut cursor = Cursor::new(&raw[..]);
        let header = PduHeader::decode(&mut cursor).unwrap();
        let decoded = QuerySmResp::decode(header, &mut cursor).unwrap();
        assert_eq!(decoded.message_state, MessageState::Unknown);
        assert_eq!(decoded.command_status, CommandStatus::QuerySmFailed);
    }
}
