// ABOUTME: unbind and unbind_resp session-termination PDUs (header-only bodies)

use crate::datatypes::{CommandId, CommandStatus};
use crate::macros::impl_header_only_pdu;

/// unbind (section 4.2.1): request an orderly end to the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Unbind {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl Unbind {
    pub fn new(sequence_number: u32) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
        }
    }
}

/// unbind_resp (section 4.2.2).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnbindResp {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl UnbindResp {
    pub fn new(sequence_number: u32) -> Self {
        Self {
            command_status: CommandStatus::Ok,
            sequence_number,
        }
    }
}

impl_header_only_pdu!(Unbind, CommandId::Unbind);
impl_header_only_pdu!(UnbindResp, CommandId::UnbindResp);
