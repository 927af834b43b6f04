// ABOUTME: Bind request/response bodies shared by the three session roles
// ABOUTME: One body type parameterized by role, mirroring the identical wire layout

use crate::codec::{
    decode_cstring, decode_u8, encode_cstring, CodecError, Encodable, PduHeader,
};
use crate::datatypes::{
    AddressRange, CommandId, CommandStatus, InterfaceVersion, NumericPlanIndicator, Password,
    SystemId, SystemType, Tlv, TypeOfNumber,
};
use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;

/// The three ways an ESME may bind to an SMSC.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BindRole {
    /// Send-only: submit_sm and query_sm.
    Transmitter,
    /// Receive-only: deliver_sm flows in.
    Receiver,
    /// Both directions on one socket.
    #[default]
    Transceiver,
}

impl BindRole {
    pub fn request_id(self) -> CommandId {
        match self {
            BindRole::Transmitter => CommandId::BindTransmitter,
            BindRole::Receiver => CommandId::BindReceiver,
            BindRole::Transceiver => CommandId::BindTransceiver,
        }
    }

    pub fn response_id(self) -> CommandId {
        match self {
            BindRole::Transmitter => CommandId::BindTransmitterResp,
            BindRole::Receiver => CommandId::BindReceiverResp,
            BindRole::Transceiver => CommandId::BindTransceiverResp,
        }
    }

    /// Whether this role may submit messages.
    pub fn can_transmit(self) -> bool {
        !matches!(self, BindRole::Receiver)
    }

    /// Whether this role receives SMSC-originated deliver_sm.
    pub fn can_receive(self) -> bool {
        !matches!(self, BindRole::Transmitter)
    }
}

/// bind_transmitter / bind_receiver / bind_transceiver. All three share a
/// single wire layout; only the command id differs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bind {
    pub role: BindRole,
    pub sequence_number: u32,
    pub system_id: SystemId,
    pub password: Password,
    pub system_type: SystemType,
    pub interface_version: InterfaceVersion,
    pub addr_ton: TypeOfNumber,
    pub addr_npi: NumericPlanIndicator,
    pub address_range: AddressRange,
}

impl Encodable for Bind {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let header = PduHeader {
            command_length: 0,
            command_id: self.role.request_id(),
            command_status: CommandStatus::Ok,
            sequence_number: self.sequence_number,
        };
        header.encode(buf);

        encode_cstring(buf, self.system_id.as_str());
        encode_cstring(buf, self.password.as_str());
        encode_cstring(buf, self.system_type.as_str());
        buf.put_u8(self.interface_version as u8);
        buf.put_u8(self.addr_ton as u8);
        buf.put_u8(self.addr_npi as u8);
        encode_cstring(buf, self.address_range.as_str());
        Ok(())
    }
}

/// bind_*_resp. On failure some SMSCs send an empty body, so every field
/// decodes leniently.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindResp {
    pub role: BindRole,
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub system_id: SystemId,
    /// Optional sc_interface_version TLV and anything else appended.
    pub tlvs: Vec<Tlv>,
}

impl BindResp {
    pub fn role_for(command_id: CommandId) -> Option<BindRole> {
        match command_id {
            CommandId::BindTransmitterResp => Some(BindRole::Transmitter),
            CommandId::BindReceiverResp => Some(BindRole::Receiver),
            CommandId::BindTransceiverResp => Some(BindRole::Transceiver),
            _ => None,
        }
    }

    pub fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let role = Self::role_for(header.command_id)
            .ok_or(CodecError::UnknownCommandId(header.command_id as u32))?;
        let system_id = if buf.has_remaining() {
            SystemId::new(decode_cstring(buf, 16, "system_id")?)
                .map_err(|e| CodecError::FieldValidation {
                    field: "system_id",
                    reason: e.to_string(),
                })?
        } else {
            SystemId::default()
        };
        let tlvs = Tlv::decode_all(buf)?;
        Ok(Self {
            role,
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            system_id,
            tlvs,
        })
    }
}

impl Encodable for BindResp {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let header = PduHeader {
            command_length: 0,
            command_id: self.role.response_id(),
            command_status: self.command_status,
            sequence_number: self.sequence_number,
        };
        header.encode(buf);
        encode_cstring(buf, self.system_id.as_str());
        crate::datatypes::tlv::encode_all(&self.tlvs, buf);
        Ok(())
    }
}

/// Re-decode helper used by bind tests and the mock SMSC: pulls a bind
/// request body apart regardless of role.
impl Bind {
    pub fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let role = match header.command_id {
            CommandId::BindTransmitter => BindRole::Transmitter,
            CommandId::BindReceiver => BindRole::Receiver,
            CommandId::BindTransceiver => BindRole::Transceiver,
            other => return Err(CodecError::UnknownCommandId(other as u32)),
        };
        let field = |e: crate::datatypes::FixedStringError, field: &'static str| {
            CodecError::FieldValidation {
                field,
                reason: e.to_string(),
            }
        };
        let system_id = SystemId::new(decode_cstring(buf, 16, "system_id")?)
            .map_err(|e| field(e, "system_id"))?;
        let password = Password::new(decode_cstring(buf, 9, "password")?)
            .map_err(|e| field(e, "password"))?;
        let system_type = SystemType::new(decode_cstring(buf, 13, "system_type")?)
            .map_err(|e| field(e, "system_type"))?;
        let interface_version = InterfaceVersion::try_from(decode_u8(buf, "interface_version")?)
            .unwrap_or(InterfaceVersion::Legacy);
        let addr_ton =
            TypeOfNumber::try_from(decode_u8(buf, "addr_ton")?).unwrap_or_default();
        let addr_npi =
            NumericPlanIndicator::try_from(decode_u8(buf, "addr_npi")?).unwrap_or_default();
        let address_range = AddressRange::new(decode_cstring(buf, 41, "address_range")?)
            .map_err(|e| field(e, "address_range"))?;
        Ok(Self {
            role,
            sequence_number: header.sequence_number,
            system_id,
            password,
            system_type,
            interface_version,
            addr_ton,
            addr_npi,
            address_range,
        })
    }
}
