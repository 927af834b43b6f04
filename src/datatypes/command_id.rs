// ABOUTME: SMPP v3.4 command identifiers for the operations this client speaks
// ABOUTME: Implements the response-bit convention and request/response pairing

use num_enum::TryFromPrimitive;

/// Bit 31 of a command_id marks a response PDU.
pub const RESPONSE_BIT: u32 = 0x8000_0000;

/// SMPP v3.4 command identifiers (Table 4-1).
///
/// Only the operations an ESME-side client exchanges are listed;
/// cancel_sm, replace_sm, data_sm and the v5.0 broadcast family are out of
/// scope. Reserved ranges in between are rejected by the header decoder.
#[derive(TryFromPrimitive)]
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandId {
    /// generic_nack - error response for unparseable or unknown PDUs
    GenericNack = 0x8000_0000,

    /// bind_receiver - bind as message receiver
    BindReceiver = 0x0000_0001,
    BindReceiverResp = 0x8000_0001,
    /// bind_transmitter - bind as message transmitter
    BindTransmitter = 0x0000_0002,
    BindTransmitterResp = 0x8000_0002,

    /// query_sm - query the state of a previously submitted message
    QuerySm = 0x0000_0003,
    QuerySmResp = 0x8000_0003,

    /// submit_sm - submit a short message for delivery
    SubmitSm = 0x0000_0004,
    SubmitSmResp = 0x8000_0004,

    /// deliver_sm - SMSC-originated delivery (MO message or receipt)
    DeliverSm = 0x0000_0005,
    DeliverSmResp = 0x8000_0005,

    /// unbind - terminate the session
    Unbind = 0x0000_0006,
    UnbindResp = 0x8000_0006,

    /// bind_transceiver - bind for both directions on one socket
    BindTransceiver = 0x0000_0009,
    BindTransceiverResp = 0x8000_0009,

    /// enquire_link - keepalive probe
    EnquireLink = 0x0000_0015,
    EnquireLinkResp = 0x8000_0015,

    /// submit_multi - submit to a destination list
    SubmitMulti = 0x0000_0021,
    SubmitMultiResp = 0x8000_0021,

    /// alert_notification - SMSC notice that an MS became available;
    /// has no response PDU
    AlertNotification = 0x0000_0102,
}

impl CommandId {
    /// True for response PDUs (bit 31 set).
    pub fn is_response(self) -> bool {
        (self as u32) & RESPONSE_BIT != 0
    }

    /// The response id paired with this request id, if one exists.
    /// alert_notification has no response; responses have none either.
    pub fn response_id(self) -> Option<CommandId> {
        if self.is_response() || self == CommandId::AlertNotification {
            return None;
        }
        CommandId::try_from(self as u32 | RESPONSE_BIT).ok()
    }
}
