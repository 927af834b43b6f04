// ABOUTME: Typed PDU bodies and field newtypes for the SMPP v3.4 wire protocol

mod alert_notification;
mod bind;
mod command_id;
mod command_status;
pub mod datetime;
mod delivery_receipt;
mod deliver_sm;
mod enquire_link;
mod esm_class;
mod fixed_string;
mod generic_nack;
mod message_state;
mod numeric;
mod query_sm;
mod submit_multi;
mod submit_sm;
pub mod tlv;
mod unbind;

pub use alert_notification::AlertNotification;
pub use bind::{Bind, BindResp, BindRole};
pub use command_id::{CommandId, RESPONSE_BIT};
pub use command_status::CommandStatus;
pub use delivery_receipt::{DeliveryReceipt, ReceiptError, ReceiptState};
pub use deliver_sm::{DeliverSm, DeliverSmResp};
pub use enquire_link::{EnquireLink, EnquireLinkResp};
pub use esm_class::EsmClass;
pub use fixed_string::{
    AddressRange, FixedString, FixedStringError, MessageId, Password, ServiceType, SmeAddress,
    SystemId, SystemType, TimeString,
};
pub use generic_nack::GenericNack;
pub use message_state::MessageState;
pub use numeric::{InterfaceVersion, NumericPlanIndicator, TypeOfNumber};
pub use query_sm::{QuerySm, QuerySmResp};
pub use submit_multi::{DestAddress, SubmitMulti, SubmitMultiResp, UnsuccessSme};
pub use submit_sm::{SubmitSm, SubmitSmBuilder, SubmitSmResp, MAX_SHORT_MESSAGE};
pub use tlv::Tlv;
pub use unbind::{Unbind, UnbindResp};
