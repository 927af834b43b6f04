// ABOUTME: message_state values returned by query_sm and the message_state TLV

use num_enum::TryFromPrimitive;

/// Delivery state of a message inside the SMSC (section 5.2.28).
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageState {
    /// Scheduled for future delivery (value 0 is used by some SMSCs
    /// although v3.4 officially starts at ENROUTE)
    Scheduled = 0,
    Enroute = 1,
    Delivered = 2,
    Expired = 3,
    Deleted = 4,
    Undeliverable = 5,
    Accepted = 6,
    Unknown = 7,
    Rejected = 8,
}

impl MessageState {
    /// True once the SMSC will make no further delivery attempts.
    pub fn is_final(self) -> bool {
        matches!(
            self,
            MessageState::Delivered
                | MessageState::Expired
                | MessageState::Deleted
                | MessageState::Undeliverable
                | MessageState::Rejected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values() {
        assert_eq!(MessageState::Enroute as u8, 1);
        assert_eq!(MessageState::Rejected as u8, 8);
        assert_eq!(MessageState::try_from(2).unwrap(), MessageState::Delivered);
        assert!(MessageState::try_from(9).is_err());
    }

    #[test]
    fn finality() {
        assert!(MessageState::Delivered.is_final());
        assert!(MessageState::Rejected.is_final());
        assert!(!MessageState::Enroute.is_final());
        assert!(!MessageState::Accepted.is_final());
    }
}
