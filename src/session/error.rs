// ABOUTME: The session-level error taxonomy every public operation returns

use crate::codec::CodecError;
use crate::datatypes::{CommandId, CommandStatus};
use crate::sar::SarError;
use std::io;
use thiserror::Error;

/// Everything a session operation can fail with.
#[derive(Debug, Error)]
pub enum SmppError {
    /// Submission attempted while the session is not bound.
    #[error("session is not bound")]
    NotConnected,

    /// The response deadline elapsed. The request may still have reached
    /// the SMSC; the socket stays healthy.
    #[error("response deadline elapsed")]
    Timeout,

    /// The connection dropped while the request was in flight.
    #[error("connection lost while waiting for the response")]
    Disconnected,

    /// The session was closed (by `close()`) before the request resolved.
    #[error("session closed")]
    Closed,

    /// The in-flight window stayed full for the whole deadline.
    #[error("in-flight window full")]
    WindowFull,

    /// PDU-level encode/decode failure.
    #[error("wire error: {0}")]
    Wire(#[from] CodecError),

    /// The SMSC answered with a non-zero command_status, or a generic_nack
    /// arrived for our sequence number.
    #[error("SMSC returned {0:?}")]
    Protocol(CommandStatus),

    /// A response with our sequence number but the wrong command id.
    #[error("expected {expected:?} response, received {actual:?}")]
    UnexpectedResponse {
        expected: CommandId,
        actual: CommandId,
    },

    /// The outbound message would need more than 255 UDH parts.
    #[error(transparent)]
    MessageTooLong(#[from] SarError),

    /// Socket-level failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type SmppResult<T> = Result<T, SmppError>;
