// ABOUTME: Public session types - Transmitter, Receiver, Transceiver and their operations
// ABOUTME: Wraps the driver task, correlator and segmenter behind the three bind roles

pub mod config;
pub mod error;

mod correlator;
mod driver;

pub use config::{PduHandler, RateLimiter, SessionConfig};
pub use error::{SmppError, SmppResult};

use crate::codec::CodecError;
use crate::datatypes::{
    datetime, tlv, BindRole, CommandId, CommandStatus, DestAddress, EsmClass, FixedString,
    MessageState, QuerySm, SubmitMulti, SubmitSm, TimeString, Tlv, UnsuccessSme,
};
use crate::pdu::Pdu;
use crate::sar;
use crate::text::Text;
use bytes::{BufMut, Bytes, BytesMut};
use correlator::{Correlator, WaiterGuard};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Session lifecycle events, published on the status stream in the order
/// they occur. The stream is for monitoring: it is bounded and drops the
/// oldest events when a consumer lags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Connecting,
    /// Bound; submissions will be accepted.
    Connected,
    /// The link dropped; the session is about to reconnect.
    Disconnected,
    /// Dial or handshake transport failure.
    ConnectionFailed(String),
    /// The SMSC refused the bind. The session keeps retrying: credentials
    /// may be provisioned later.
    BindFailed(CommandStatus),
    /// Terminal: `close()` completed.
    Closed,
}

/// Receiving end of the session status broadcast. Yields `None` once the
/// session has closed.
pub struct StatusStream {
    rx: broadcast::Receiver<SessionStatus>,
    done: bool,
}

impl StatusStream {
    fn new(rx: broadcast::Receiver<SessionStatus>) -> Self {
        Self { rx, done: false }
    }

    pub async fn recv(&mut self) -> Option<SessionStatus> {
        if self.done {
            return None;
        }
        loop {
            match self.rx.recv().await {
                Ok(status) => {
                    if status == SessionStatus::Closed {
                        self.done = true;
                    }
                    return Some(status);
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::debug!(missed, "status stream lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.done = true;
                    return None;
                }
            }
        }
    }
}

/// Successful submit_sm outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitResp {
    /// SMSC-assigned message id, usable with `query`.
    pub message_id: String,
}

/// Successful query_sm outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryResp {
    pub message_id: String,
    /// Empty while the message is in a non-final state.
    pub final_date: String,
    pub message_state: MessageState,
    pub error_code: u8,
}

/// submit_multi outcome: accepted overall, with zero or more destinations
/// individually refused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitMultiResult {
    pub message_id: String,
    pub unsuccessful: Vec<UnsuccessSme>,
}

/// submit_long failure: the parts already accepted plus the error that
/// stopped the train. Callers retry the remainder from `submitted.len()`.
#[derive(Debug, thiserror::Error)]
#[error("long message failed after {} parts: {error}", .submitted.len())]
pub struct PartialSubmitError {
    pub submitted: Vec<SubmitResp>,
    #[source]
    pub error: SmppError,
}

/// An outbound message in application terms, before PDU encoding.
#[derive(Clone, Debug)]
pub struct ShortMessage {
    pub source: String,
    pub source_ton: crate::datatypes::TypeOfNumber,
    pub source_npi: crate::datatypes::NumericPlanIndicator,
    pub destination: String,
    pub dest_ton: crate::datatypes::TypeOfNumber,
    pub dest_npi: crate::datatypes::NumericPlanIndicator,
    /// Extra destinations; turns `submit_multi` into a fan-out.
    pub destinations: Vec<String>,
    pub service_type: String,
    pub esm_class: EsmClass,
    pub protocol_id: u8,
    pub priority: u8,
    /// SMPP time string, absolute or relative; empty for immediate.
    pub schedule_delivery_time: String,
    /// SMPP time string; empty for the SMSC default validity.
    pub validity_period: String,
    pub registered_delivery: u8,
    pub replace_if_present: bool,
    pub text: Text,
    /// Caller-supplied user data header; sets the UDHI bit when present.
    pub udh: Option<Bytes>,
    pub tlvs: Vec<Tlv>,
}

impl ShortMessage {
    pub fn new(source: &str, destination: &str, text: Text) -> Self {
        Self {
            source: source.to_owned(),
            source_ton: Default::default(),
            source_npi: Default::default(),
            destination: destination.to_owned(),
            dest_ton: Default::default(),
            dest_npi: Default::default(),
            destinations: Vec::new(),
            service_type: String::new(),
            esm_class: EsmClass(0),
            protocol_id: 0,
            priority: 0,
            schedule_delivery_time: String::new(),
            validity_period: String::new(),
            registered_delivery: 0,
            replace_if_present: false,
            text,
            udh: None,
            tlvs: Vec::new(),
        }
    }

    /// Request a delivery receipt for this message.
    pub fn with_delivery_receipt(mut self) -> Self {
        self.registered_delivery |= 0x01;
        self
    }

    pub fn with_validity_period(mut self, period: TimeString) -> Self {
        self.validity_period = period.as_str().to_owned();
        self
    }

    pub fn with_schedule_delivery_time(mut self, time: TimeString) -> Self {
        self.schedule_delivery_time = time.to_string();
        self
    }

    fn bounded<const N: usize>(
        value: &str,
        field: &'static str,
    ) -> Result<FixedString<N>, SmppError> {
        FixedString::new(value).map_err(|e| {
            SmppError::Wire(CodecError::FieldValidation {
                field,
                reason: e.to_string(),
            })
        })
    }

    fn validated_time(value: &str, field: &'static str) -> Result<TimeString, SmppError> {
        datetime::validate(value).map_err(|e| {
            SmppError::Wire(CodecError::FieldValidation {
                field,
                reason: e.to_string(),
            })
        })?;
        Self::bounded::<17>(value, field)
    }

    /// Lower into a submit_sm with the given payload in short_message.
    fn submit_sm_with(&self, esm_class: EsmClass, payload: Bytes) -> Result<SubmitSm, SmppError> {
        let mut pdu = SubmitSm::builder()
            .service_type(Self::bounded::<6>(&self.service_type, "service_type")?)
            .source(
                Self::bounded::<21>(&self.source, "source_addr")?,
                self.source_ton,
                self.source_npi,
            )
            .destination(
                Self::bounded::<21>(&self.destination, "destination_addr")?,
                self.dest_ton,
                self.dest_npi,
            )
            .esm_class(esm_class)
            .protocol_id(self.protocol_id)
            .priority_flag(self.priority)
            .schedule_delivery_time(Self::validated_time(
                &self.schedule_delivery_time,
                "schedule_delivery_time",
            )?)
            .validity_period(Self::validated_time(&self.validity_period, "validity_period")?)
            .registered_delivery(self.registered_delivery)
            .replace_if_present(self.replace_if_present)
            .payload(self.text.data_coding(), payload)
            .build()?;
        pdu.tlvs.extend(self.tlvs.iter().cloned());
        Ok(pdu)
    }

    /// The single-PDU lowering. Payloads that outgrow sm_length move into
    /// the message_payload TLV with sm_length = 0.
    fn to_submit_sm(&self) -> Result<SubmitSm, SmppError> {
        let mut esm_class = self.esm_class;
        let encoded = self.text.encode();
        let payload = match &self.udh {
            Some(udh) => {
                esm_class = esm_class.with_udh();
                let mut combined = BytesMut::with_capacity(udh.len() + encoded.len());
                combined.put_slice(udh);
                combined.put_slice(&encoded);
                combined.freeze()
            }
            None => encoded,
        };

        if payload.len() > crate::datatypes::MAX_SHORT_MESSAGE {
            let mut pdu = self.submit_sm_with(esm_class, Bytes::new())?;
            pdu.tlvs.push(Tlv::new(tlv::tags::MESSAGE_PAYLOAD, payload));
            Ok(pdu)
        } else {
            self.submit_sm_with(esm_class, payload)
        }
    }

    /// Lowering for one UDH-framed part of a long message.
    fn to_submit_sm_part(&self, part: Bytes) -> Result<SubmitSm, SmppError> {
        self.submit_sm_with(self.esm_class.with_udh(), part)
    }

    fn to_submit_multi(&self) -> Result<SubmitMulti, SmppError> {
        let mut dest_addresses = Vec::with_capacity(1 + self.destinations.len());
        for destination in std::iter::once(&self.destination).chain(&self.destinations) {
            dest_addresses.push(DestAddress::Sme {
                ton: self.dest_ton,
                npi: self.dest_npi,
                addr: Self::bounded::<21>(destination, "destination_addr")?,
            });
        }

        let single = self.to_submit_sm()?;
        Ok(SubmitMulti {
            sequence_number: 0,
            service_type: single.service_type.clone(),
            source_addr_ton: single.source_addr_ton,
            source_addr_npi: single.source_addr_npi,
            source_addr: single.source_addr.clone(),
            dest_addresses,
            esm_class: single.esm_class,
            protocol_id: single.protocol_id,
            priority_flag: single.priority_flag,
            schedule_delivery_time: single.schedule_delivery_time.clone(),
            validity_period: single.validity_period.clone(),
            registered_delivery: single.registered_delivery,
            replace_if_present_flag: single.replace_if_present_flag,
            data_coding: single.data_coding,
            sm_default_msg_id: single.sm_default_msg_id,
            short_message: single.short_message.clone(),
            tlvs: single.tlvs,
        })
    }
}

/// Shared state behind every session type. The driver task and the public
/// handles each hold an `Arc`.
pub(crate) struct SessionCore {
    pub(crate) config: SessionConfig,
    pub(crate) role: BindRole,
    pub(crate) correlator: Correlator,
    pub(crate) cancel: CancellationToken,
    handler: std::sync::RwLock<Option<PduHandler>>,
    status_tx: broadcast::Sender<SessionStatus>,
    current: watch::Sender<SessionStatus>,
    write_tx: mpsc::Sender<Bytes>,
    sar_reference: AtomicU8,
}

impl SessionCore {
    fn start(role: BindRole, config: SessionConfig) -> (Arc<Self>, StatusStream) {
        let window_size = config.window_size;
        let (status_tx, status_rx) = broadcast::channel(32);
        let (current, _) = watch::channel(SessionStatus::Connecting);
        let (write_tx, write_rx) = mpsc::channel(64);

        let handler = std::sync::RwLock::new(config.handler.clone());
        let core = Arc::new(SessionCore {
            config,
            role,
            correlator: Correlator::new(window_size),
            cancel: CancellationToken::new(),
            handler,
            status_tx,
            current,
            write_tx,
            sar_reference: AtomicU8::new(0),
        });
        tokio::spawn(driver::run(Arc::clone(&core), write_rx));
        (core, StatusStream::new(status_rx))
    }

    pub(crate) fn set_status(&self, status: SessionStatus) {
        tracing::debug!(?status, "session status");
        let _ = self.status_tx.send(status.clone());
        self.current.send_replace(status);
    }

    /// Hand an inbound PDU to the application. A panicking handler is
    /// contained; the reader must stay alive to keep acking traffic.
    pub(crate) fn dispatch(&self, pdu: Pdu) {
        let handler = self
            .handler
            .read()
            .expect("handler lock poisoned")
            .clone();
        let Some(handler) = handler else {
            tracing::debug!(id = ?pdu.command_id(), "no handler installed, inbound PDU dropped");
            return;
        };
        if std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || handler(pdu))).is_err() {
            tracing::error!("inbound handler panicked, PDU dropped");
        }
    }

    fn set_handler(&self, handler: PduHandler) {
        *self.handler.write().expect("handler lock poisoned") = Some(handler);
    }

    fn is_bound(&self) -> bool {
        *self.current.borrow() == SessionStatus::Connected
    }

    fn subscribe(&self) -> StatusStream {
        StatusStream::new(self.status_tx.subscribe())
    }

    fn next_sar_reference(&self) -> u8 {
        self.sar_reference.fetch_add(1, Ordering::Relaxed)
    }

    /// The submit path shared by every request/response operation:
    /// rate limit, window, sequence, write, wait.
    async fn request(
        &self,
        command_id: CommandId,
        encode: impl FnOnce(u32) -> Result<Bytes, CodecError>,
    ) -> SmppResult<Pdu> {
        if !self.is_bound() {
            return Err(SmppError::NotConnected);
        }
        if let Some(limiter) = &self.config.rate_limiter {
            limiter.acquire().await;
        }
        let _permit = self
            .correlator
            .acquire_window(self.config.response_timeout)
            .await?;

        let sequence = self.correlator.next_sequence();
        let bytes = encode(sequence)?;
        let rx = self.correlator.register(sequence, command_id);
        let _guard = WaiterGuard::new(&self.correlator, sequence);

        self.write_tx
            .send(bytes)
            .await
            .map_err(|_| SmppError::Closed)?;

        match tokio::time::timeout(self.config.response_timeout, rx).await {
            // The guard drops the waiter; a response landing later is
            // discarded by the reader.
            Err(_) => Err(SmppError::Timeout),
            Ok(Err(_)) => Err(SmppError::Closed),
            Ok(Ok(outcome)) => outcome,
        }
    }

    async fn submit(&self, message: &ShortMessage) -> SmppResult<SubmitResp> {
        let pdu = message.to_submit_sm()?;
        self.submit_pdu(pdu).await
    }

    async fn submit_pdu(&self, mut pdu: SubmitSm) -> SmppResult<SubmitResp> {
        let response = self
            .request(CommandId::SubmitSm, move |sequence| {
                pdu.sequence_number = sequence;
                crate::codec::Encodable::to_bytes(&pdu)
            })
            .await?;
        match response {
            Pdu::SubmitSmResp(resp) => {
                if resp.command_status != CommandStatus::Ok {
                    return Err(SmppError::Protocol(resp.command_status));
                }
                Ok(SubmitResp {
                    message_id: resp.message_id.to_string(),
                })
            }
            other => Err(SmppError::UnexpectedResponse {
                expected: CommandId::SubmitSmResp,
                actual: other.command_id(),
            }),
        }
    }

    async fn submit_long(
        &self,
        message: &ShortMessage,
    ) -> Result<Vec<SubmitResp>, PartialSubmitError> {
        let single = |error| PartialSubmitError {
            submitted: Vec::new(),
            error,
        };

        // Fits in one PDU (or the caller brought their own UDH): no
        // segmentation, one response.
        if message.udh.is_some()
            || message.text.encode().len() <= message.text.single_segment_capacity()
        {
            let resp = self.submit(message).await.map_err(single)?;
            return Ok(vec![resp]);
        }

        let reference = self.next_sar_reference();
        let parts = sar::split_message(&message.text, reference)
            .map_err(|e| single(SmppError::MessageTooLong(e)))?;

        let mut submitted = Vec::with_capacity(parts.len());
        for part in parts {
            let pdu = message
                .to_submit_sm_part(part)
                .map_err(|error| PartialSubmitError {
                    submitted: submitted.clone(),
                    error,
                })?;
            match self.submit_pdu(pdu).await {
                Ok(resp) => submitted.push(resp),
                // Callers retry the remaining parts themselves.
                Err(error) => {
                    return Err(PartialSubmitError { submitted, error });
                }
            }
        }
        Ok(submitted)
    }

    async fn submit_multi(&self, message: &ShortMessage) -> SmppResult<SubmitMultiResult> {
        let mut pdu = message.to_submit_multi()?;
        let response = self
            .request(CommandId::SubmitMulti, move |sequence| {
                pdu.sequence_number = sequence;
                crate::codec::Encodable::to_bytes(&pdu)
            })
            .await?;
        match response {
            Pdu::SubmitMultiResp(resp) => {
                if resp.command_status != CommandStatus::Ok {
                    return Err(SmppError::Protocol(resp.command_status));
                }
                Ok(SubmitMultiResult {
                    message_id: resp.message_id.to_string(),
                    unsuccessful: resp.unsuccessful,
                })
            }
            other => Err(SmppError::UnexpectedResponse {
                expected: CommandId::SubmitMultiResp,
                actual: other.command_id(),
            }),
        }
    }

    async fn query(&self, message_id: &str, source_addr: &str) -> SmppResult<QueryResp> {
        let pdu = QuerySm {
            sequence_number: 0,
            message_id: ShortMessage::bounded::<65>(message_id, "message_id")?,
            source_addr_ton: Default::default(),
            source_addr_npi: Default::default(),
            source_addr: ShortMessage::bounded::<21>(source_addr, "source_addr")?,
        };
        let response = self
            .request(CommandId::QuerySm, move |sequence| {
                let mut pdu = pdu;
                pdu.sequence_number = sequence;
                crate::codec::Encodable::to_bytes(&pdu)
            })
            .await?;
        match response {
            Pdu::QuerySmResp(resp) => {
                if resp.command_status != CommandStatus::Ok {
                    return Err(SmppError::Protocol(resp.command_status));
                }
                Ok(QueryResp {
                    message_id: resp.message_id.to_string(),
                    final_date: resp.final_date.to_string(),
                    message_state: resp.message_state,
                    error_code: resp.error_code,
                })
            }
            other => Err(SmppError::UnexpectedResponse {
                expected: CommandId::QuerySmResp,
                actual: other.command_id(),
            }),
        }
    }

    async fn close(&self) {
        self.cancel.cancel();
        let mut rx = self.current.subscribe();
        loop {
            if *rx.borrow() == SessionStatus::Closed {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Send-only session (bind_transmitter).
pub struct Transmitter {
    core: Arc<SessionCore>,
}

impl Transmitter {
    /// Connect and bind in the background. Returns immediately; watch the
    /// status stream for `Connected`.
    pub fn start(config: SessionConfig) -> (Self, StatusStream) {
        let (core, status) = SessionCore::start(BindRole::Transmitter, config);
        (Self { core }, status)
    }

    pub async fn submit(&self, message: &ShortMessage) -> SmppResult<SubmitResp> {
        self.core.submit(message).await
    }

    /// Submit with automatic segmentation: one response per part, parts
    /// sharing one UDH reference. Stops at the first failed part.
    pub async fn submit_long(
        &self,
        message: &ShortMessage,
    ) -> Result<Vec<SubmitResp>, PartialSubmitError> {
        self.core.submit_long(message).await
    }

    pub async fn submit_multi(&self, message: &ShortMessage) -> SmppResult<SubmitMultiResult> {
        self.core.submit_multi(message).await
    }

    pub async fn query(&self, message_id: &str, source_addr: &str) -> SmppResult<QueryResp> {
        self.core.query(message_id, source_addr).await
    }

    pub fn status(&self) -> StatusStream {
        self.core.subscribe()
    }

    /// Idempotent orderly shutdown: unbind, close, resolve every waiter.
    pub async fn close(&self) {
        self.core.close().await
    }
}

/// Receive-only session (bind_receiver). Inbound PDUs reach the handler
/// from [`SessionConfig::with_handler`].
pub struct Receiver {
    core: Arc<SessionCore>,
}

impl Receiver {
    pub fn start(config: SessionConfig) -> (Self, StatusStream) {
        let (core, status) = SessionCore::start(BindRole::Receiver, config);
        (Self { core }, status)
    }

    /// Install (or replace) the inbound PDU handler. The handler runs on
    /// the reader task and must not block.
    pub fn set_handler(&self, handler: PduHandler) {
        self.core.set_handler(handler);
    }

    pub fn status(&self) -> StatusStream {
        self.core.subscribe()
    }

    pub async fn close(&self) {
        self.core.close().await
    }
}

/// Bidirectional session (bind_transceiver).
pub struct Transceiver {
    core: Arc<SessionCore>,
}

impl Transceiver {
    pub fn start(config: SessionConfig) -> (Self, StatusStream) {
        let (core, status) = SessionCore::start(BindRole::Transceiver, config);
        (Self { core }, status)
    }

    /// Install (or replace) the inbound PDU handler. The handler runs on
    /// the reader task and must not block.
    pub fn set_handler(&self, handler: PduHandler) {
        self.core.set_handler(handler);
    }

    pub async fn submit(&self, message: &ShortMessage) -> SmppResult<SubmitResp> {
        self.core.submit(message).await
    }

    pub async fn submit_long(
        &self,
        message: &ShortMessage,
    ) -> Result<Vec<SubmitResp>, PartialSubmitError> {
        self.core.submit_long(message).await
    }

    pub async fn submit_multi(&self, message: &ShortMessage) -> SmppResult<SubmitMultiResult> {
        self.core.submit_multi(message).await
    }

    pub async fn query(&self, message_id: &str, source_addr: &str) -> SmppResult<QueryResp> {
        self.core.query(message_id, source_addr).await
    }

    pub fn status(&self) -> StatusStream {
        self.core.subscribe()
    }

    pub async fn close(&self) {
        self.core.close().await
    }
}
