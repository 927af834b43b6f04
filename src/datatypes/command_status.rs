// ABOUTME: SMPP v3.4 command_status error code table (Table 5-2)
// ABOUTME: Returned by the SMSC in response headers and submit_multi unsuccess entries

use num_enum::TryFromPrimitive;

/// SMPP v3.4 error status codes (Table 5-2).
///
/// Carried in the `command_status` field of response headers and in the
/// `error_status_code` of each submit_multi unsuccess entry. Requests carry
/// zero. Values outside this table (vendor ranges 0x400..=0x4FF and other
/// reserved space) are folded to [`CommandStatus::UnknownError`] by the
/// header decoder.
#[derive(TryFromPrimitive)]
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandStatus {
    /// No error
    Ok = 0x0000_0000,
    /// Message length is invalid
    InvalidMsgLength = 0x0000_0001,
    /// Command length is invalid
    InvalidCommandLength = 0x0000_0002,
    /// Invalid command id
    InvalidCommandId = 0x0000_0003,
    /// Incorrect BIND status for the given command
    InvalidBindStatus = 0x0000_0004,
    /// ESME already in bound state
    AlreadyBound = 0x0000_0005,
    /// Invalid priority flag
    InvalidPriorityFlag = 0x0000_0006,
    /// Invalid registered-delivery flag
    InvalidRegisteredDeliveryFlag = 0x0000_0007,
    /// System error
    SystemError = 0x0000_0008,
    /// Invalid source address
    InvalidSourceAddress = 0x0000_000A,
    /// Invalid destination address
    InvalidDestinationAddress = 0x0000_000B,
    /// Message id is invalid
    InvalidMessageId = 0x0000_000C,
    /// Bind failed
    BindFailed = 0x0000_000D,
    /// Invalid password
    InvalidPassword = 0x0000_000E,
    /// Invalid system id
    InvalidSystemId = 0x0000_000F,
    /// cancel_sm failed
    CancelSmFailed = 0x0000_0011,
    /// replace_sm failed
    ReplaceSmFailed = 0x0000_0013,
    /// Message queue full
    MessageQueueFull = 0x0000_0014,
    /// Invalid service type
    InvalidServiceType = 0x0000_0015,
    /// Invalid number of destinations (submit_multi)
    InvalidNumberOfDestinations = 0x0000_0033,
    /// Invalid distribution list name
    InvalidDistributionListName = 0x0000_0034,
    /// Invalid destination flag (submit_multi)
    InvalidDestinationFlag = 0x0000_0040,
    /// Invalid submit-with-replace request
    InvalidSubmitWithReplace = 0x0000_0042,
    /// Invalid esm_class field data
    InvalidEsmClass = 0x0000_0043,
    /// Cannot submit to distribution list
    CannotSubmitToDistributionList = 0x0000_0044,
    /// submit_sm or submit_multi failed
    SubmitFailed = 0x0000_0045,
    /// Invalid source address TON
    InvalidSourceTon = 0x0000_0048,
    /// Invalid source address NPI
    InvalidSourceNpi = 0x0000_0049,
    /// Invalid destination address TON
    InvalidDestinationTon = 0x0000_0050,
    /// Invalid destination address NPI
    InvalidDestinationNpi = 0x0000_0051,
    /// Invalid system_type field
    InvalidSystemType = 0x0000_0053,
    /// Invalid replace_if_present flag
    InvalidReplaceIfPresentFlag = 0x0000_0054,
    /// Invalid number of messages
    InvalidNumberOfMessages = 0x0000_0055,
    /// Throttling error: ESME exceeded allowed message limits
    Throttled = 0x0000_0058,
    /// Invalid scheduled delivery time
    InvalidScheduledDeliveryTime = 0x0000_0061,
    /// Invalid validity period (expiry time)
    InvalidExpiryTime = 0x0000_0062,
    /// Predefined message invalid or not found
    InvalidPredefinedMessage = 0x0000_0063,
    /// ESME receiver temporary application error
    ReceiverTemporaryAppError = 0x0000_0064,
    /// ESME receiver permanent application error
    ReceiverPermanentAppError = 0x0000_0065,
    /// ESME receiver reject message error
    ReceiverRejectMessage = 0x0000_0066,
    /// query_sm request failed
    QuerySmFailed = 0x0000_0067,
    /// Error in the optional part of the PDU body
    InvalidOptionalPart = 0x0000_00C0,
    /// Optional parameter not allowed
    OptionalParameterNotAllowed = 0x0000_00C1,
    /// Invalid parameter length
    InvalidParameterLength = 0x0000_00C2,
    /// Expected optional parameter missing
    ExpectedOptionalParameterMissing = 0x0000_00C3,
    /// Invalid optional parameter value
    InvalidOptionalParameterValue = 0x0000_00C4,
    /// Delivery failure (data_sm_resp)
    DeliveryFailure = 0x0000_00FE,
    /// Unknown error
    UnknownError = 0x0000_00FF,
}

impl CommandStatus {
    /// Transient congestion at the SMSC: back off and retry later.
    pub fn is_throttling(self) -> bool {
        matches!(
            self,
            CommandStatus::Throttled | CommandStatus::MessageQueueFull
        )
    }
}
