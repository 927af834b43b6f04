// ABOUTME: alert_notification PDU - SMSC notice that a mobile station became reachable
// ABOUTME: Inbound only; has no response PDU

use crate::codec::{decode_cstring, decode_u8, encode_cstring, CodecError, Decodable, Encodable, PduHeader};
use crate::datatypes::{
    CommandId, CommandStatus, NumericPlanIndicator, SmeAddress, Tlv, TypeOfNumber,
};
use bytes::{BufMut, BytesMut};
use std::io::Cursor;

/// alert_notification (section 4.12.1): the SMSC tells a receiver-bound
/// ESME that `source_addr` (the MS) is available again, e.g. after being
/// unreachable for a message with the datagram delivery-pending flag. The
/// only defined TLV is ms_availability_status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlertNotification {
    pub sequence_number: u32,
    pub source_addr_ton: TypeOfNumber,
    pub source_addr_npi: NumericPlanIndicator,
    pub source_addr: SmeAddress,
    pub esme_addr_ton: TypeOfNumber,
    pub esme_addr_npi: NumericPlanIndicator,
    pub esme_addr: SmeAddress,
    pub tlvs: Vec<Tlv>,
}

impl Encodable for AlertNotification {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let header = PduHeader {
            command_length: 0,
            command_id: CommandId::AlertNotification,
            command_status: CommandStatus::Ok,
            sequence_number: self.sequence_number,
        };
        header.encode(buf);
        buf.put_u8(self.source_addr_ton as u8);
        buf.put_u8(self.source_addr_npi as u8);
        encode_cstring(buf, self.source_addr.as_str());
        buf.put_u8(self.esme_addr_ton as u8);
        buf.put_u8(self.esme_addr_npi as u8);
        encode_cstring(buf, self.esme_addr.as_str());
        crate::datatypes::tlv::encode_all(&self.tlvs, buf);
        Ok(())
    }
}

impl Decodable for AlertNotification {
    fn command_id() -> CommandId {
        CommandId::AlertNotification
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        let field = |e: crate::datatypes::FixedStringError, field: &'static str| {
            CodecError::FieldValidation {
                field,
                reason: e.to_string(),
            }
        };
        let source_addr_ton =
            TypeOfNumber::try_from(decode_u8(buf, "source_addr_ton")?).unwrap_or_default();
        let source_addr_npi =
            NumericPlanIndicator::try_from(decode_u8(buf, "source_addr_npi")?).unwrap_or_default();
        // SMPP v3.4 allows 65-octet addresses here; SMSCs in practice send
        // the 21-octet SME form, which is the bound this crate enforces.
        let source_addr = SmeAddress::new(decode_cstring(buf, 21, "source_addr")?)
            .map_err(|e| field(e, "source_addr"))?;
        let esme_addr_ton =
            TypeOfNumber::try_from(decode_u8(buf, "esme_addr_ton")?).unwrap_or_default();
        let esme_addr_npi =
            NumericPlanIndicator::try_from(decode_u8(buf, "esme_addr_npi")?).unwrap_or_default();
        let esme_addr = SmeAddress::new(decode_cstring(buf, 21, "esme_addr")?)
            .map_err(|e| field(e, "esme_addr"))?;
        let tlvs = Tlv::decode_all(buf)?;
        Ok(Self {
            sequence_number: header.sequence_number,
            source_addr_ton,
            source_addr_npi,
            source_addr,
            esme_addr_ton,
            esme_addr_npi,
            esme_addr,
            tlvs,
        })
    }
}
