// ABOUTME: Parser for the delivery-receipt text carried in receipt deliver_sm PDUs
// ABOUTME: Hand-rolled key scanner; the format predates any delimiter discipline

use std::fmt;

/// The 7-character delivery states used in the `stat:` field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReceiptState {
    Delivered,
    Expired,
    Deleted,
    Undeliverable,
    Accepted,
    Unknown,
    Rejected,
}

impl ReceiptState {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "DELIVRD" => Some(Self::Delivered),
            "EXPIRED" => Some(Self::Expired),
            "DELETED" => Some(Self::Deleted),
            "UNDELIV" => Some(Self::Undeliverable),
            "ACCEPTD" => Some(Self::Accepted),
            "UNKNOWN" => Some(Self::Unknown),
            "REJECTD" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delivered => "DELIVRD",
            Self::Expired => "EXPIRED",
            Self::Deleted => "DELETED",
            Self::Undeliverable => "UNDELIV",
            Self::Accepted => "ACCEPTD",
            Self::Unknown => "UNKNOWN",
            Self::Rejected => "REJECTD",
        }
    }
}

impl fmt::Display for ReceiptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed delivery receipt:
///
/// ```text
/// id:XXX sub:NNN dlvrd:NNN submit date:YYMMDDhhmm done date:YYMMDDhhmm
/// stat:SSSSSSS err:NNN text:....
/// ```
///
/// `id`, `stat` and `err` are required; the rest is best-effort because
/// SMSCs disagree about casing, ordering and padding of the other keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub message_id: String,
    pub state: ReceiptState,
    pub error: u16,
    pub submitted: Option<u16>,
    pub delivered: Option<u16>,
    pub submit_date: Option<String>,
    pub done_date: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReceiptError {
    #[error("receipt missing required key '{0}'")]
    MissingKey(&'static str),
    #[error("receipt field '{key}' has malformed value {value:?}")]
    BadValue { key: &'static str, value: String },
}

/// Find `key:` and return the value up to the next space (or, for `text:`,
/// the rest of the line). Keys are matched case-insensitively at word
/// boundaries; `date:` inside `submit date:` does not match `done date:`.
fn field<'a>(receipt: &'a str, key: &str) -> Option<&'a str> {
    let lower = receipt.to_ascii_lowercase();
    let mut from = 0;
    while let Some(pos) = lower[from..].find(key) {
        let at = from + pos;
        let boundary = at == 0 || lower.as_bytes()[at - 1] == b' ';
        if boundary {
            let start = at + key.len();
            return Some(&receipt[start..]);
        }
        from = at + key.len();
    }
    None
}

fn word(value: &str) -> &str {
    value.split(' ').next().unwrap_or("")
}

impl DeliveryReceipt {
    pub fn parse(receipt: &str) -> Result<Self, ReceiptError> {
        let receipt = receipt.trim();

        let message_id = word(
            field(receipt, "id:").ok_or(ReceiptError::MissingKey("id"))?,
        )
        .to_owned();
        if message_id.is_empty() {
            return Err(ReceiptError::BadValue {
                key: "id",
                value: String::new(),
            });
        }

        let stat_raw = word(field(receipt, "stat:").ok_or(ReceiptError::MissingKey("stat"))?);
        let state = ReceiptState::parse(stat_raw).ok_or_else(|| ReceiptError::BadValue {
            key: "stat",
            value: stat_raw.to_owned(),
        })?;

        let err_raw = word(field(receipt, "err:").ok_or(ReceiptError::MissingKey("err"))?);
        let error = err_raw.parse().map_err(|_| ReceiptError::BadValue {
            key: "err",
            value: err_raw.to_owned(),
        })?;

        let submitted = field(receipt, "sub:").and_then(|v| word(v).parse().ok());
        let delivered = field(receipt, "dlvrd:").and_then(|v| word(v).parse().ok());
        let submit_date = field(receipt, "submit date:").map(|v| word(v).to_owned());
        let done_date = field(receipt, "done date:").map(|v| word(v).to_owned());
        let text = field(receipt, "text:").map(str::to_owned);

        Ok(Self {
            message_id,
            state,
            error,
            submitted,
            delivered,
            submit_date,
            done_date,
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECEIPT: &str = "id:IIIIIIIIII sub:001 dlvrd:001 submit date:2407150930 \
                           done date:2407150931 stat:DELIVRD err:000 text:Hello SMPP wor";

    #[test]
    fn full_receipt() {
        let receipt = DeliveryReceipt::parse(RECEIPT).unwrap();
        assert_eq!(receipt.message_id, "IIIIIIIIII");
        assert_eq!(receipt.state, ReceiptState::Delivered);
        assert_eq!(receipt.error, 0);
        assert_eq!(receipt.submitted, Some(1));
        assert_eq!(receipt.delivered, Some(1));
        assert_eq!(receipt.submit_date.as_deref(), Some("2407150930"));
        assert_eq!(receipt.done_date.as_deref(), Some("2407150931"));
        assert_eq!(receipt.text.as_deref(), Some("Hello SMPP wor"));
    }

    #[test]
    fn minimal_receipt() {
        let receipt = DeliveryReceipt::parse("id:42 stat:UNDELIV err:011").unwrap();
        assert_eq!(receipt.message_id, "42");
        assert_eq!(receipt.state, ReceiptState::Undeliverable);
        assert_eq!(receipt.error, 11);
        assert_eq!(receipt.submitted, None);
        assert_eq!(receipt.text, None);
    }

    #[test]
    fn submit_date_does_not_shadow_done_date() {
        let receipt = DeliveryReceipt::parse(RECEIPT).unwrap();
        assert_ne!(receipt.submit_date, receipt.done_date);
    }

    #[test]
    fn missing_required_keys() {
        assert_eq!(
            DeliveryReceipt::parse("stat:DELIVRD err:000"),
            Err(ReceiptError::MissingKey("id"))
        );
        assert_eq!(
            DeliveryReceipt::parse("id:1 err:000"),
            Err(ReceiptError::MissingKey("stat"))
        );
        assert_eq!(
            DeliveryReceipt::parse("id:1 stat:DELIVRD"),
            Err(ReceiptError::MissingKey("err"))
        );
    }

    #[test]
    fn unknown_state_rejected() {
        let result = DeliveryReceipt::parse("id:1 stat:WAITING err:0");
        assert!(matches!(
            result,
            Err(ReceiptError::BadValue { key: "stat", .. })
        ));
    }

    #[test]
    fn all_states_parse() {
        for (text, state) in [
            ("DELIVRD", ReceiptState::Delivered),
            ("EXPIRED", ReceiptState::Expired),
            ("DELETED", ReceiptState::Deleted),
            ("UNDELIV", ReceiptState::Undeliverable),
            ("ACCEPTD", ReceiptState::Accepted),
            ("UNKNOWN", ReceiptState::Unknown),
            ("REJECTD", ReceiptState::Rejected),
        ] {
            let receipt =
                DeliveryReceipt::parse(&format!("id:1 stat:{text} err:0")).unwrap();
            assert_eq!(receipt.state, state);
            assert_eq!(state.as_str(), text);
        }
    }
}
