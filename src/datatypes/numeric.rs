// ABOUTME: Small numeric field enums shared by bind and messaging PDUs
// ABOUTME: TON, NPI and interface_version per SMPP v3.4 section 5.2

use num_enum::TryFromPrimitive;

/// Type of number for source/destination addresses (section 5.2.5).
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TypeOfNumber {
    #[default]
    Unknown = 0x00,
    International = 0x01,
    National = 0x02,
    NetworkSpecific = 0x03,
    SubscriberNumber = 0x04,
    Alphanumeric = 0x05,
    Abbreviated = 0x06,
}

/// Numbering plan indicator for source/destination addresses (section 5.2.6).
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NumericPlanIndicator {
    #[default]
    Unknown = 0x00,
    Isdn = 0x01,
    Data = 0x03,
    Telex = 0x04,
    LandMobile = 0x06,
    National = 0x08,
    Private = 0x09,
    Ermes = 0x0A,
    Internet = 0x0E,
    WapClientId = 0x12,
}

/// interface_version in bind PDUs. This client always offers 3.4; the
/// decoder tolerates the 3.3-and-earlier value some SMSCs echo back.
#[derive(TryFromPrimitive)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InterfaceVersion {
    Legacy = 0x00,
    #[default]
    SmppV34 = 0x34,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ton_wire_values() {
        assert_eq!(TypeOfNumber::International as u8, 0x01);
        assert_eq!(TypeOfNumber::Alphanumeric as u8, 0x05);
        assert_eq!(TypeOfNumber::try_from(0x02).unwrap(), TypeOfNumber::National);
        assert!(TypeOfNumber::try_from(0x07).is_err());
    }

    #[test]
    fn npi_wire_values() {
        assert_eq!(NumericPlanIndicator::Isdn as u8, 0x01);
        assert_eq!(
            NumericPlanIndicator::try_from(0x12).unwrap(),
            NumericPlanIndicator::WapClientId
        );
        assert!(NumericPlanIndicator::try_from(0x02).is_err());
    }

    #[test]
    fn interface_version() {
        assert_eq!(InterfaceVersion::SmppV34 as u8, 0x34);
        assert_eq!(InterfaceVersion::default(), InterfaceVersion::SmppV34);
    }
}
