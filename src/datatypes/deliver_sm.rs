// ABOUTME: deliver_sm and deliver_sm_resp bodies
// ABOUTME: SMSC-originated PDU carrying MO messages and delivery receipts

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

/// deliver_sm (section 4.6.1). Same wire layout as submit_sm; the
/// schedule/validity fields are always NULL from a conforming SMSC but are
/// carried anyway so a round-trip is exact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliverSm {
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

impl DeliverSm {
    /// The delivery-receipt marker in esm_class (section 5.2.12).
    pub fn is_delivery_receipt(&self) -> bool {
        self.esm_class.is_delivery_receipt()
    }

    /// Message payload regardless of where it was carried: the
    /// message_payload TLV wins over short_message when both are present.
    pub fn payload(&self) -> &[u8] {
        match tlv::find(&self.tlvs, tlv::tags::MESSAGE_PAYLOAD) {
            Some(t) => &t.value,
            None => &self.short_message,
        }
    }
}

impl Encodable for DeliverSm {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        if self.short_message.len() > super::submit_sm::MAX_SHORT_MESSAGE {
            return Err(CodecError::FieldValidation {
                field: "short_message",
                reason: format!("{} octets exceeds sm_length limit", self.short_message.len()),
            });
        }

        let header = PduHeader {
            command_length: 0,
            command_id: CommandId::DeliverSm,
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

impl Decodable for DeliverSm {
    fn command_id() -> CommandId {
        CommandId::DeliverSm
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

/// deliver_sm_resp. message_id is unused and always NULL (section 4.6.2);
/// the session layer sends this automatically for every inbound deliver_sm.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliverSmResp {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub message_id: MessageId,
}

impl DeliverSmResp {
    /// The ack the reader sends for an inbound deliver_sm.
    pub fn ack(sequence_number: u32) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
            message_id: MessageId::default(),
        }
    }
}

impl Encodable for DeliverSmResp {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let header = PduHeader {
            command_length: 0,
            command_id: CommandId::DeliverSmResp,
            command_status: self.command_status,
            sequence_number: self.sequence_number,
        };
        header.encode(buf);
        encode_cstring(buf, self.message_id.as_str());
        Ok(())
    }
}

impl Decodable for DeliverSmResp {
    fn command_id() -> CommandId {
        CommandId::DeliverSmResp
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

    pub(crate) fn sample() -> DeliverSm {
        DeliverSm {
            sequence_number: 77,
            service_type: ServiceType::default(),
            source_addr_ton: TypeOfNumber::International,
            source_addr_npi: NumericPlanIndicator::Isdn,
            source_addr: SmeAddress::new("5511988887777").unwrap(),
            dest_addr_ton: TypeOfNumber::Unknown,
            dest_addr_npi: NumericPlanIndicator::Unknown,
            destination_addr: SmeAddress::new("1234").unwrap(),
            esm_class: EsmClass(0),
            protocol_id: 0,
            priority_flag: 0,
            schedule_delivery_time: TimeString::default(),
            validity_period: TimeString::default(),
            registered_delivery: 0,
            replace_if_present_flag: 0,
            data_coding: 0,
            sm_default_msg_id: 0,
            short_message: Bytes::from_static(b"inbound"),
            tlvs: Vec::new(),
        }
    }

    #[test]
    fn roundtrip() {
        let original = sample();
        let bytes = original.to_bytes().unwrap();
        let mut cursor = Cursor::new(bytes.as_ref());
        let header = PduHeader::decode(&mut cursor).unwrap();
        assert_eq!(header.command_id, CommandId::DeliverSm);
        let decoded = DeliverSm::decode(header, &mut cursor).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn payload_prefers_message_payload_tlv() {
        let mut pdu = sample();
        pdu.short_message = Bytes::new();
        pdu.tlvs
            .push(Tlv::new(tlv::tags::MESSAGE_PAYLOAD, Bytes::from_static(b"long body")));
        assert_eq!(pdu.payload(), b"long body");
    }

    #[test]
    fn receipt_flag() {
        let mut pdu = sample();
        assert!(!pdu.is_delivery_receipt());
        pdu.esm_class = EsmClass(EsmClass::DELIVERY_RECEIPT);
        assert!(pdu.is_delivery_receipt());
    }

    #[test]
    fn ack_layout() {
        let bytes = DeliverSmResp::ack(501).to_bytes().unwrap();
        assert_eq!(bytes.len(), 17); // header + NULL message_id
        assert_eq!(&bytes[4..8], &[0x80, 0x00, 0x00, 0x05]);
        assert_eq!(&bytes[12..16], &[0x00, 0x00, 0x01, 0xF5]);
        assert_eq!(bytes[16], 0x00);
    }
}
