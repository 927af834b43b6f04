// ABOUTME: submit_multi and submit_multi_resp with destination and unsuccess lists
// ABOUTME: The only PDUs in this crate with composite list fields

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

/// dest_flag discriminator inside the destination list (section 4.5.1.1).
const DEST_FLAG_SME: u8 = 0x01;
const DEST_FLAG_DIST_LIST: u8 = 0x02;

/// One entry of the submit_multi destination list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DestAddress {
    /// A directly addressed SME.
    Sme {
        ton: TypeOfNumber,
        npi: NumericPlanIndicator,
        addr: SmeAddress,
    },
    /// A distribution list provisioned at the SMSC (name, ≤ 20 chars).
    DistributionList(String),
}

impl DestAddress {
    fn encode(&self, buf: &mut BytesMut) {
        match self {
            DestAddress::Sme { ton, npi, addr } => {
                buf.put_u8(DEST_FLAG_SME);
                buf.put_u8(*ton as u8);
                buf.put_u8(*npi as u8);
                encode_cstring(buf, addr.as_str());
            }
            DestAddress::DistributionList(name) => {
                buf.put_u8(DEST_FLAG_DIST_LIST);
                encode_cstring(buf, name);
            }
        }
    }

    fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        match decode_u8(buf, "dest_flag")? {
            DEST_FLAG_SME => {
                let ton =
                    TypeOfNumber::try_from(decode_u8(buf, "dest_addr_ton")?).unwrap_or_default();
                let npi = NumericPlanIndicator::try_from(decode_u8(buf, "dest_addr_npi")?)
                    .unwrap_or_default();
                let addr = SmeAddress::new(decode_cstring(buf, 21, "destination_addr")?)
                    .map_err(|e| CodecError::FieldValidation {
                        field: "destination_addr",
                        reason: e.to_string(),
                    })?;
                Ok(DestAddress::Sme { ton, npi, addr })
            }
            DEST_FLAG_DIST_LIST => {
                Ok(DestAddress::DistributionList(decode_cstring(
                    buf,
                    21,
                    "dl_name",
                )?))
            }
            other => Err(CodecError::FieldValidation {
                field: "dest_flag",
                reason: format!("unknown destination flag {other:#04x}"),
            }),
        }
    }
}

/// submit_multi (section 4.5.1): one message, up to 254 destinations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitMulti {
    pub sequence_number: u32,
    pub service_type: ServiceType,
    pub source_addr_ton: TypeOfNumber,
    pub source_addr_npi: NumericPlanIndicator,
    pub source_addr: SmeAddress,
    pub dest_addresses: Vec<DestAddress>,
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

impl SubmitMulti {
    pub fn validate(&self) -> Result<(), CodecError> {
        if self.dest_addresses.is_empty() || self.dest_addresses.len() > 254 {
            return Err(CodecError::FieldValidation {
                field: "number_of_dests",
                reason: format!("{} destinations (must be 1..=254)", self.dest_addresses.len()),
            });
        }
        if self.short_message.len() > super::submit_sm::MAX_SHORT_MESSAGE {
            return Err(CodecError::FieldValidation {
                field: "short_message",
                reason: format!("{} octets exceeds sm_length limit", self.short_message.len()),
            });
        }
        Ok(())
    }
}

impl Encodable for SubmitMulti {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        self.validate()?;

        let header = PduHeader {
            command_length: 0,
            command_id: CommandId::SubmitMulti,
            command_status: CommandStatus::Ok,
            sequence_number: self.sequence_number,
        };
        header.encode(buf);

        encode_cstring(buf, self.service_type.as_str());
        buf.put_u8(self.source_addr_ton as u8);
        buf.put_u8(self.source_addr_npi as u8);
        encode_cstring(buf, self.source_addr.as_str());
        buf.put_u8(self.dest_addresses.len() as u8);
        for dest in &self.dest_addresses {
            dest.encode(buf);
        }
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

impl Decodable for SubmitMulti {
    fn command_id() -> CommandId {
        CommandId::SubmitMulti
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

        let number_of_dests = decode_u8(buf, "number_of_dests")? as usize;
        let mut dest_addresses = Vec::with_capacity(number_of_dests);
        for _ in 0..number_of_dests {
            dest_addresses.push(DestAddress::decode(buf)?);
        }

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
            dest_addresses,
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

/// One destination the SMSC could not accept (section 4.5.2.1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsuccessSme {
    pub ton: TypeOfNumber,
    pub npi: NumericPlanIndicator,
    pub addr: SmeAddress,
    pub error_status: CommandStatus,
}

impl UnsuccessSme {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.ton as u8);
        buf.put_u8(self.npi as u8);
        encode_cstring(buf, self.addr.as_str());
        buf.put_u32(self.error_status as u32);
    }

    fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let ton = TypeOfNumber::try_from(decode_u8(buf, "dest_addr_ton")?).unwrap_or_default();
        let npi =
            NumericPlanIndicator::try_from(decode_u8(buf, "dest_addr_npi")?).unwrap_or_default();
        let addr = SmeAddress::new(decode_cstring(buf, 21, "destination_addr")?).map_err(|e| {
            CodecError::FieldValidation {
                field: "destination_addr",
                reason: e.to_string(),
            }
        })?;
        if buf.remaining() < 4 {
            return Err(CodecError::TruncatedField {
                field: "error_status_code",
            });
        }
        let error_status =
            CommandStatus::try_from(buf.get_u32()).unwrap_or(CommandStatus::UnknownError);
        Ok(Self {
            ton,
            npi,
            addr,
            error_status,
        })
    }
}

/// submit_multi_resp (section 4.5.2): message id plus the per-destination
/// failures. An empty unsuccess list means every destination was accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitMultiResp {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub message_id: MessageId,
    pub unsuccessful: Vec<UnsuccessSme>,
}

impl Encodable for SubmitMultiResp {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let header = PduHeader {
            command_length: 0,
            command_id: CommandId::SubmitMultiResp,
            command_status: self.command_status,
            sequence_number: self.sequence_number,
        };
        header.encode(buf);
        encode_cstring(buf, self.message_id.as_str());
        buf.put_u8(self.unsuccessful.len() as u8);
        for sme in &self.unsuccessful {
            sme.encode(buf);
        }
        Ok(())
    }
}

impl Decodable for SubmitMultiResp {
    fn command_id() -> CommandId {
        CommandId::SubmitMultiResp
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if !buf.has_remaining() {
            return Ok(Self {
                command_status: header.command_status,
                sequence_number: header.sequence_number,
                message_id: MessageId::default(),
                unsuccessful: Vec::new(),
            });
        }
        let message_id = MessageId::new(decode_cstring(buf, 65, "message_id")?).map_err(|e| {
            CodecError::FieldValidation {
                field: "message_id",
                reason: e.to_string(),
            }
        })?;
        let no_unsuccess = decode_u8(buf, "no_unsuccess")? as usize;
        let mut unsuccessful = Vec::with_capacity(no_unsuccess);
        for _ in 0..no_unsuccess {
            unsuccessful.push(UnsuccessSme::decode(buf)?);
        }
        Ok(Self {
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            message_id,
            unsuccessful,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SubmitMulti {
        SubmitMulti {
            sequence_number: 12,
            service_type: ServiceType::default(),
            source_addr_ton: TypeOfNumber::International,
            source_addr_npi: NumericPlanIndicator::Isdn,
            source_addr: SmeAddress::new("1234").unwrap(),
            dest_addresses: vec![
                DestAddress::Sme {
                    ton: TypeOfNumber::International,
                    npi: NumericPlanIndicator::Isdn,
                    addr: SmeAddress::new("5511999990001").unwrap(),
                },
                DestAddress::DistributionList("oncall".to_owned()),
                DestAddress::Sme {
                    ton: TypeOfNumber::National,
                    npi: NumericPlanIndicator::Isdn,
                    addr: SmeAddress::new("988887777").unwrap(),
                },
            ],
            esm_class: EsmClass(0),
            protocol_id: 0,
            priority_flag: 1,
            schedule_delivery_time: TimeString::default(),
            validity_period: TimeString::default(),
            registered_delivery: 1,
            replace_if_present_flag: 0,
            data_coding: 0,
            sm_default_msg_id: 0,
            short_message: Bytes::from_static(b"fanout"),
            tlvs: Vec::new(),
        }
    }

    #[test]
    fn roundtrip_with_mixed_destinations() {
        let original = sample();
        let bytes = original.to_bytes().unwrap();
        let mut cursor = Cursor::new(bytes.as_ref());
        let header = PduHeader::decode(&mut cursor).unwrap();
        let decoded = SubmitMulti::decode(header, &mut cursor).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn empty_destination_list_rejected() {
        let mut pdu = sample();
        pdu.dest_addresses.clear();
        assert!(pdu.to_bytes().is_err());
    }

    #[test]
    fn resp_roundtrip_with_unsuccess_list() {
        let original = SubmitMultiResp {
            command_status: CommandStatus::Ok,
            sequence_number: 12,
            message_id: MessageId::new("MULTI01").unwrap(),
            unsuccessful: vec![UnsuccessSme {
                ton: TypeOfNumber::International,
                npi: NumericPlanIndicator::Isdn,
                addr: SmeAddress::new("5511999990001").unwrap(),
                error_status: CommandStatus::InvalidDestinationAddress,
            }],
        };
        let bytes = original.to_bytes().unwrap();
        let mut cursor = Cursor::new(bytes.as_ref());
        let header = PduHeader::decode(&mut cursor).unwrap();
        let decoded = SubmitMultiResp::decode(header, &mut cursor).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn unknown_dest_flag_is_an_error() {
        let data = [0x03u8, 0x00, 0x00];
        let mut cursor = Cursor::new(&data[..]);
        assert!(matches!(
            DestAddress::decode(&mut cursor),
            Err(CodecError::FieldValidation {
                field: "dest_flag",
                ..
            })
        ));
    }
}
