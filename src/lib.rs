// ABOUTME: Crate root - async SMPP 3.4 client for sending and receiving SMS
// ABOUTME: Re-exports the session types and wire-level building blocks

//! An asynchronous SMPP 3.4 client (ESME side).
//!
//! The crate speaks the length-prefixed binary PDU protocol to an SMSC over
//! a long-lived TCP (or injected TLS) connection and hides the operational
//! machinery behind three session types:
//!
//! * [`session::Transmitter`] - send-only (`bind_transmitter`)
//! * [`session::Receiver`] - receive-only (`bind_receiver`)
//! * [`session::Transceiver`] - both directions on one socket
//!
//! A session owns one background task that dials, binds, answers
//! enquire_link probes, acks deliveries, reassembles multi-part messages
//! and reconnects with exponential backoff. Callers get plain async
//! operations with typed errors.
//!
//! ```no_run
//! use esme::session::{SessionConfig, ShortMessage, Transmitter};
//! use esme::text::Text;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::new("smsc.example.net:2775", "client01", "secret")?;
//!     let (session, mut status) = Transmitter::start(config);
//!
//!     // Wait until the bind completes.
//!     while let Some(event) = status.recv().await {
//!         if event == esme::session::SessionStatus::Connected {
//!             break;
//!         }
//!     }
//!
//!     let message = ShortMessage::new("1234", "5511999999999", Text::Gsm7("Hello!".into()));
//!     let resp = session.submit(&message).await?;
//!     println!("accepted as {}", resp.message_id);
//!
//!     session.close().await;
//!     Ok(())
//! }
//! ```
//!
//! The wire layer ([`pdu::Pdu`], [`datatypes`], [`text`]) is public on its
//! own: tooling that only needs to encode or decode PDUs can use it without
//! ever opening a socket.

pub mod codec;
pub mod connection;
pub mod datatypes;
pub mod pdu;
pub mod sar;
pub mod session;
pub mod text;

mod macros;


pub use codec::{CodecError, Decodable, Encodable, PduHeader, MAX_PDU_SIZE};
pub use pdu::Pdu;
pub use session::{
    PartialSubmitError, QueryResp, Receiver, SessionConfig, SessionStatus, ShortMessage,
    SmppError, SmppResult, StatusStream, SubmitMultiResult, SubmitResp, Transceiver, Transmitter,
};
pub use text::Text;
