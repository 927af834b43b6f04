// ABOUTME: submit_sm and submit_sm_resp bodies
// ABOUTME: The workhorse PDU pair for mobile-terminated message submission

use crate::codec::{
    decode_cstring, decode_octets, decode_u8, encode_cstring, CodecError, Decodable, Encodable,
    PduHeader,
};
use crate::datatypes::{
    tlv, CommandId, CommandStatus, EsmClass, MessageId, NumericPlanIndicator, ServiceType,
    SmeAddress, TimeString, Tlv, TypeOfNumber,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;

/// Longest short_message the one-octet sm_length can carry.
pub const MAX_SHORT_MESSAGE: usize = 254;

/// submit_sm (section 4.4.1): submit one short message for delivery.
///
/// The optional-parameter tail is an ordered `Vec<Tlv>` rather than one
/// field per known tag; [`tlv::find`] picks out specific tags and unknown
/// tags survive a round-trip untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitSm {
    pub sequence_number: u32,
    pub service_type: ServiceType,
    pub source_addr_ton: TypeOfNumber,
    pub source_addr_npi: NumericPlanIndicator,
    pub source_addr: SmeAddress,
    pub dest_addr_ton: TypeOfNumber,
    pub dest_addr_npi: NumericPlanIndicator,
    pub destination_addr: SmeAddress,
    pub esm_class: EsmClass,
    pub protocol_id: u8,
    pub priority_flag: u8,
    pub schedule_delivery_time: TimeString,
    pub validity_period: TimeString,
    pub registered_delivery: u8,
    pub replace_if_present_flag: u8,
    pub data_coding: u8,
    pub sm_default_msg_id: u8,
    pub short_message: Bytes,
    pub tlvs: Vec<Tlv>,
}

impl SubmitSm {
    pub fn builder() -> SubmitSmBuilder {
        SubmitSmBuilder::default()
    }

    pub fn validate(&self) -> Result<(), CodecError> {
        if self.short_message.len() > MAX_SHORT_MESSAGE {
            return Err(CodecError::FieldValidation {
                field: "short_message",
                reason: format!(
                    "{} octets exceeds the {MAX_SHORT_MESSAGE}-octet sm_length limit; \
                     use the message_payload TLV",
                    self.short_message.len()
                ),
            });
        }
        if !self.short_message.is_empty()
            && tlv::find(&self.tlvs, tlv::tags::MESSAGE_PAYLOAD).is_some()
        {
            return Err(CodecError::FieldValidation {
                field: "short_message",
                reason: "short_message and message_payload are mutually exclusive".into(),
            });
        }
        Ok(())
    }
}

impl Encodable for SubmitSm {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        self.validate()?;

        let header = PduHeader {
            command_length: 0,
            command_id: CommandId::SubmitSm,
            command_status: CommandStatus::Ok,
            sequence_number: self.sequence_number,
        };
        header.encode(buf);

        encode_cstring(buf, self.service_type.as_str());
        buf.put_u8(self.source_addr_ton as u8);
        buf.put_u8(self.source_addr_npi as u8);
        encode_cstring(buf, self.source_addr.as_str());
        buf.put_u8(self.dest_addr_ton as u8);
        buf.put_u8(self.dest_addr_npi as u8);
        encode_cstring(buf, self.destination_addr.as_str());
        buf.put_u8(self.esm_class.0);
        buf.put_u8(self.protocol_id);
        buf.put_u8(self.priority_flag);
        encode_cstring(buf, self.schedule_delivery_time.as_str());
        encode_cstring(buf, self.validity_period.as_str());
        buf.put_u8(self.registered_delivery);
        buf.put_u8(self.replace_if_present_flag);
        buf.put_u8(self.data_coding);
        buf.put_u8(self.sm_default_msg_id);
        buf.put_u8(self.short_message.len() as u8);
        buf.extend_from_slice(&self.short_message);

        tlv::encode_all(&self.tlvs, buf);
        Ok(())
    }
}

impl Decodable for SubmitSm {
    fn command_id() -> CommandId {
        CommandId::SubmitSm
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let field = |e: crate::datatypes::FixedStringError, field: &'static str| {
            CodecError::FieldValidation {
                field,
                reason: e.to_string(),
            }
        };
        let service_type = ServiceType::new(decode_cstring(buf, 6, "service_type")?)
            .map_err(|e| field(e, "service_type"))?;
        let source_addr_ton =
            TypeOfNumber::try_from(decode_u8(buf, "source_addr_ton")?).unwrap_or_default();
        let source_addr_npi =
            NumericPlanIndicator::try_from(decode_u8(buf, "source_addr_npi")?).unwrap_or_default();
        let source_addr = SmeAddress::new(decode_cstring(buf, 21, "source_addr")?)
            .map_err(|e| field(e, "source_addr"))?;
        let dest_addr_ton =
            TypeOfNumber::try_from(decode_u8(buf, "dest_addr_ton")?).unwrap_or_default();
        let dest_addr_npi =
            NumericPlanIndicator::try_from(decode_u8(buf, "dest_addr_npi")?).unwrap_or_default();
        let destination_addr = SmeAddress::new(decode_cstring(buf, 21, "destination_addr")?)
            .map_err(|e| field(e, "destination_addr"))?;
        let esm_class = EsmClass(decode_u8(buf, "esm_class")?);
        let protocol_id = decode_u8(buf, "protocol_id")?;
        let priority_flag = decode_u8(buf, "priority_flag")?;
        let schedule_delivery_time =
            TimeString::new(decode_cstring(buf, 17, "schedule_delivery_time")?)
                .map_err(|e| field(e, "schedule_delivery_time"))?;
        let validity_period = TimeString::new(decode_cstring(buf, 17, "validity_period")?)
            .map_err(|e| field(e, "validity_period"))?;
        let registered_delivery = decode_u8(buf, "registered_delivery")?;
        let replace_if_present_flag = decode_u8(buf, "replace_if_present_flag")?;
        let data_coding = decode_u8(buf, "data_coding")?;
        let sm_default_msg_id = decode_u8(buf, "sm_default_msg_id")?;
        let sm_length = decode_u8(buf, "sm_length")? as usize;
        let short_message = decode_octets(buf, sm_length, "short_message")?;
        let tlvs = Tlv::decode_all(buf)?;

        Ok(Self {
            sequence_number: header.sequence_number,
            service_type,
            source_addr_ton,
            source_addr_npi,
            source_addr,
            dest_addr_ton,
            dest_addr_npi,
            destination_addr,
            esm_class,
            protocol_id,
            priority_flag,
            schedule_delivery_time,
            validity_period,
            registered_delivery,
            replace_if_present_flag,
            data_coding,
            sm_default_msg_id,
            short_message,
            tlvs,
        })
    }
}

/// Builder with the defaults a plain text submission wants.
#[derive(Default)]
pub struct SubmitSmBuilder {
    sequence_number: u32,
    service_type: ServiceType,
    source_addr_ton: TypeOfNumber,
    source_addr_npi: NumericPlanIndicator,
    source_addr: SmeAddress,
    dest_addr_ton: TypeOfNumber,
    dest_addr_npi: NumericPlanIndicator,
    destination_addr: SmeAddress,
    esm_class: EsmClass,
    protocol_id: u8,
    priority_flag: u8,
    schedule_delivery_time: TimeString,
    validity_period: TimeString,
    registered_delivery: u8,
    replace_if_present_flag: u8,
    data_coding: u8,
    sm_default_msg_id: u8,
    short_message: Bytes,
    tlvs: Vec<Tlv>,
}

impl SubmitSmBuilder {
    pub fn sequence_number(mut self, seq: u32) -> Self {
        self.sequence_number = seq;
        self
    }

    pub fn source(
        mut self,
        addr: SmeAddress,
        ton: TypeOfNumber,
        npi: NumericPlanIndicator,
    ) -> Self {
        self.source_addr = addr;
        self.source_addr_ton = ton;
        self.source_addr_npi = npi;
        self
    }

    pub fn destination(
        mut self,
        addr: SmeAddress,
        ton: TypeOfNumber,
        npi: NumericPlanIndicator,
    ) -> Self {
        self.destination_addr = addr;
        self.dest_addr_ton = ton;
        self.dest_addr_npi = npi;
        self
    }

    pub fn service_type(mut self, service_type: ServiceType) -> Self {
        self.service_type = service_type;
        self
    }

    pub fn esm_class(mut self, esm_class: EsmClass) -> Self {
        self.esm_class = esm_class;
        self
    }

    pub fn protocol_id(mut self, protocol_id: u8) -> Self {
        self.protocol_id = protocol_id;
        self
    }

    pub fn priority_flag(mut self, priority: u8) -> Self {
        self.priority_flag = priority;
        self
    }

    pub fn schedule_delivery_time(mut self, time: TimeString) -> Self {
        self.schedule_delivery_time = time;
        self
    }

    pub fn validity_period(mut self, time: TimeString) -> Self {
        self.validity_period = time;
        self
    }

    pub fn registered_delivery(mut self, flags: u8) -> Self {
        self.registered_delivery = flags;
        self
    }

    pub fn replace_if_present(mut self, replace: bool) -> Self {
        self.replace_if_present_flag = replace as u8;
        self
    }

    pub fn payload(mut self, data_coding: u8, short_message: Bytes) -> Self {
        self.data_coding = data_coding;
        self.short_message = short_message;
        self
    }

    pub fn tlv(mut self, tlv: Tlv) -> Self {
        self.tlvs.push(tlv);
        self
    }

    pub fn build(self) -> Result<SubmitSm, CodecError> {
        let pdu = SubmitSm {
            sequence_number: self.sequence_number,
            service_type: self.service_type,
            source_addr_ton: self.source_addr_ton,
            source_addr_npi: self.source_addr_npi,
            source_addr: self.source_addr,
            dest_addr_ton: self.dest_addr_ton,
            dest_addr_npi: self.dest_addr_npi,
            destination_addr: self.destination_addr,
            esm_class: self.esm_class,
            protocol_id: self.protocol_id,
            priority_flag: self.priority_flag,
            schedule_delivery_time: self.schedule_delivery_time,
            validity_period: self.validity_period,
            registered_delivery: self.registered_delivery,
            replace_if_present_flag: self.replace_if_present_flag,
            data_coding: self.data_coding,
            sm_default_msg_id: self.sm_default_msg_id,
            short_message: self.short_message,
            tlvs: self.tlvs,
        };
        pdu.validate()?;
        Ok(pdu)
    }
}

/// submit_sm_resp: the SMSC-assigned message id, or an empty body on error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitSmResp {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub message_id: MessageId,
}

impl Encodable for SubmitSmResp {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let header = PduHeader {
            command_length: 0,
            command_id: CommandId::SubmitSmResp,
            command_status: self.command_status,
            sequence_number: self.sequence_number,
        };
        header.encode(buf);
        encode_cstring(buf, self.message_id.as_str());
        Ok(())
    }
}

impl Decodable for SubmitSmResp {
    fn command_id() -> CommandId {
        CommandId::SubmitSmResp
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let message_id = if buf.has_remaining() {
            MessageId::new(decode_cstring(buf, 65, "message_id")?).map_err(|e| {
                CodecError::FieldValidation {
                    field: "message_id",
                    reason: e.to_string(),
                }
            })?
        } else {
            MessageId::default()
        };
        Ok(Self {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            message_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SubmitSm {
        SubmitSm::builder()
            .sequence_number(9)
            .source(
                SmeAddress::new("1234").unwrap(),
                TypeOfNumber::International,
                NumericPlanIndicator::Isdn,
            )
            .destination(
                SmeAddress::new("5511999999999").unwrap(),
                TypeOfNumber::International,
                NumericPlanIndicator::Isdn,
            )
            .payload(0x00, Bytes::from_static(b"hello"))
            .build()
            .unwrap()
    }

    #[test]
    fn roundtrip() {
        let original = sample();
        let bytes = original.to_bytes().unwrap();
        assert_eq!(
            u32::from_be_bytes(bytes[0..4].try_into().unwrap()) as usize,
            bytes.len()
        );

        let mut cursor = Cursor::new(bytes.as_ref());
        let header = PduHeader::decode(&mut cursor).unwrap();
        let decoded = SubmitSm::decode(header, &mut cursor).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn roundtrip_with_tlvs() {
        let mut original = sample();
        original.tlvs.push(Tlv::from_u8(tlv::tags::MORE_MESSAGES_TO_SEND, 1));
        original
            .tlvs
            .push(Tlv::new(0x1501, Bytes::from_static(b"vendor-data")));

        let bytes = original.to_bytes().unwrap();
        let mut cursor = Cursor::new(bytes.as_ref());
        let header = PduHeader::decode(&mut cursor).unwrap();
        let decoded = SubmitSm::decode(header, &mut cursor).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn sm_length_matches_payload() {
        let pdu = sample();
        let bytes = pdu.to_bytes().unwrap();
        // sm_length is the octet right before the payload; find it from the
        // end: 5 payload bytes precede the end (no TLVs).
        let sm_length = bytes[bytes.len() - 6];
        assert_eq!(sm_length, 5);
        assert_eq!(&bytes[bytes.len() - 5..], b"hello");
    }

    #[test]
    fn oversized_short_message_rejected() {
        let result = SubmitSm::builder()
            .payload(0x00, Bytes::from(vec![0x41; 255]))
            .build();
        assert!(matches!(
            result,
            Err(CodecError::FieldValidation {
                field: "short_message",
                ..
            })
        ));
    }

    #[test]
    fn payload_tlv_conflict_rejected() {
        let result = SubmitSm::builder()
            .payload(0x00, Bytes::from_static(b"hi"))
            .tlv(Tlv::new(tlv::tags::MESSAGE_PAYLOAD, Bytes::from_static(b"hi")))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn resp_roundtrip() {
        let resp = SubmitSmResp {
            command_status: CommandStatus::Ok,
            sequence_number: 9,
            message_id: MessageId::new("MSG0001").unwrap(),
        };
        let bytes = resp.to_bytes().unwrap();
        let mut cursor = Cursor::new(bytes.as_ref());
        let header = PduHeader::decode(&mut cursor).unwrap();
        let decoded = SubmitSmResp::decode(header, &mut cursor).unwrap();
        assert_eq!(decoded, resp);
    }

    #[test]
    fn resp_error_with_empty_body() {
        let mut raw = BytesMut::new();
        PduHeader {
            command_length: 16,
            command_id: CommandId::SubmitSmResp,
            command_status: CommandStatus::Throttled,
            sequence_number: 3,
        }
        .encode(&mut raw);

        let mut cursor = Cursor::new(&raw[..]);
        let header = PduHeader::decode(&mut cursor).unwrap();
        let decoded = SubmitSmResp::decode(header, &mut cursor).unwrap();
        assert_eq!(decoded.command_status, CommandStatus::Throttled);
        assert!(decoded.message_id.is_empty());
    }
}
