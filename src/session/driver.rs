// ABOUTME: The session event loop - dial, bind, then multiplex reads, writes and timers
// ABOUTME: One task owns the transport; reconnection wraps it in an exponential backoff loop

use crate::connection::{self, FrameReader, FrameWriter, ReadEvent};
use crate::datatypes::{
    Bind, CommandStatus, DeliverSmResp, EnquireLink, EnquireLinkResp, InterfaceVersion, Unbind,
    UnbindResp,
};
use crate::codec::Encodable;
use crate::pdu::Pdu;
use crate::sar::{PushOutcome, Reassembler};
use crate::session::error::SmppError;
use crate::session::{SessionCore, SessionStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, sleep, sleep_until, Instant, MissedTickBehavior};

/// Why the bound phase ended.
enum Exit {
    /// `close()` was called; the loop must not reconnect.
    Closed,
    /// The link died (I/O error, keepalive timeout, peer unbind).
    Disconnected,
}

/// Reconnect delay: 1 s, multiplied by e per failed cycle, capped at 120 s.
struct Backoff {
    delay: f64,
}

impl Backoff {
    const INITIAL_SECS: f64 = 1.0;
    const CAP_SECS: f64 = 120.0;

    fn new() -> Self {
        Self {
            delay: Self::INITIAL_SECS,
        }
    }

    fn reset(&mut self) {
        self.delay = Self::INITIAL_SECS;
    }

    fn next_delay(&mut self) -> Duration {
        let current = self.delay;
        self.delay = (self.delay * std::f64::consts::E).min(Self::CAP_SECS);
        Duration::from_secs_f64(current)
    }
}

/// The session task. Runs until `close()` cancels it; every connection
/// attempt, bind handshake, bound phase and backoff sleep lives here.
pub(crate) async fn run(core: Arc<SessionCore>, mut write_rx: mpsc::Receiver<bytes::Bytes>) {
    let mut backoff = Backoff::new();

    loop {
        if core.cancel.is_cancelled() {
            break;
        }
        core.set_status(SessionStatus::Connecting);

        // Submissions queued against a previous connection are stale: their
        // waiters already failed, and their sequence numbers belong to the
        // old connection's numbering.
        while write_rx.try_recv().is_ok() {}
        core.correlator.reset_sequence();

        let dialed = tokio::select! {
            _ = core.cancel.cancelled() => break,
            result = core.config.dialer.dial() => result,
        };

        let bound = match dialed {
            Ok(transport) => {
                let (reader, writer) = connection::split(transport);
                match bind(&core, reader, writer).await {
                    BindOutcome::Bound(reader, writer) => Some((reader, writer)),
                    BindOutcome::Rejected(status) => {
                        tracing::warn!(?status, "bind rejected");
                        core.set_status(SessionStatus::BindFailed(status));
                        None
                    }
                    BindOutcome::Failed(reason) => {
                        tracing::warn!(reason, "connection failed");
                        core.set_status(SessionStatus::ConnectionFailed(reason));
                        None
                    }
                    BindOutcome::Cancelled => break,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "dial failed");
                core.set_status(SessionStatus::ConnectionFailed(e.to_string()));
                None
            }
        };

        if let Some((reader, writer)) = bound {
            backoff.reset();
            core.set_status(SessionStatus::Connected);

            let exit = drive_bound(&core, reader, writer, &mut write_rx).await;
            match exit {
                Exit::Closed => {
                    core.correlator.fail_all(|| SmppError::Closed);
                    break;
                }
                Exit::Disconnected => {
                    core.correlator.fail_all(|| SmppError::Disconnected);
                    core.set_status(SessionStatus::Disconnected);
                }
            }
        }

        let delay = backoff.next_delay();
        tracing::debug!(?delay, "sleeping before reconnect");
        tokio::select! {
            _ = core.cancel.cancelled() => break,
            _ = sleep(delay) => {}
        }
    }

    core.correlator.fail_all(|| SmppError::Closed);
    core.set_status(SessionStatus::Closed);
}

enum BindOutcome {
    Bound(FrameReader, FrameWriter),
    /// The SMSC answered the bind with a non-zero status.
    Rejected(CommandStatus),
    /// Transport-level failure before a bind response arrived.
    Failed(String),
    Cancelled,
}

async fn bind(
    core: &SessionCore,
    mut reader: FrameReader,
    mut writer: FrameWriter,
) -> BindOutcome {
    let sequence = core.correlator.next_sequence();
    let request = Bind {
        role: core.role,
        sequence_number: sequence,
        system_id: core.config.system_id.clone(),
        password: core.config.password.clone(),
        system_type: core.config.system_type.clone(),
        interface_version: InterfaceVersion::SmppV34,
        addr_ton: core.config.addr_ton,
        addr_npi: core.config.addr_npi,
        address_range: core.config.address_range.clone(),
    };
    let bytes = match request.to_bytes() {
        Ok(bytes) => bytes,
        Err(e) => return BindOutcome::Failed(e.to_string()),
    };
    if let Err(e) = writer.write(&bytes).await {
        return BindOutcome::Failed(e.to_string());
    }

    let deadline = Instant::now() + core.config.response_timeout;
    loop {
        let event = tokio::select! {
            _ = core.cancel.cancelled() => return BindOutcome::Cancelled,
            _ = sleep_until(deadline) => {
                return BindOutcome::Failed("bind response timeout".to_owned());
            }
            event = reader.read() => event,
        };
        match event {
            Ok(ReadEvent::Pdu(Pdu::BindResp(resp))) if resp.sequence_number == sequence => {
                if resp.command_status == CommandStatus::Ok {
                    tracing::info!(system_id = %resp.system_id, role = ?core.role, "bound");
                    return BindOutcome::Bound(reader, writer);
                }
                return BindOutcome::Rejected(resp.command_status);
            }
            Ok(ReadEvent::Pdu(Pdu::EnquireLink(probe))) => {
                let resp = EnquireLinkResp::new(probe.sequence_number);
                let Ok(bytes) = resp.to_bytes() else { continue };
                if let Err(e) = writer.write(&bytes).await {
                    return BindOutcome::Failed(e.to_string());
                }
            }
            Ok(ReadEvent::Pdu(other)) => {
                tracing::debug!(id = ?other.command_id(), "ignoring PDU during bind");
            }
            Ok(ReadEvent::Skipped(e)) => {
                tracing::warn!(error = %e, "skipped malformed PDU during bind");
            }
            Ok(ReadEvent::Closed) => {
                return BindOutcome::Failed("connection closed during bind".to_owned());
            }
            Err(e) => return BindOutcome::Failed(e.to_string()),
        }
    }
}

async fn drive_bound(
    core: &SessionCore,
    mut reader: FrameReader,
    mut writer: FrameWriter,
    write_rx: &mut mpsc::Receiver<bytes::Bytes>,
) -> Exit {
    let mut reassembler = Reassembler::new(core.config.merge_stale_ttl);

    let period = core.config.enquire_link_period;
    let mut keepalive = interval_at(Instant::now() + period, period);
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let sweep_period = core.config.merge_check_interval;
    let mut sweep = interval_at(Instant::now() + sweep_period, sweep_period);
    sweep.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let liveness_timeout = core.config.effective_enquire_link_timeout();
    let mut last_rx = Instant::now();

    loop {
        tokio::select! {
            _ = core.cancel.cancelled() => {
                graceful_unbind(core, &mut reader, &mut writer).await;
                return Exit::Closed;
            }

            event = reader.read() => match event {
                Ok(ReadEvent::Pdu(pdu)) => {
                    last_rx = Instant::now();
                    if let Err(exit) =
                        handle_inbound(core, &mut reassembler, &mut writer, pdu).await
                    {
                        return exit;
                    }
                }
                Ok(ReadEvent::Skipped(e)) => {
                    last_rx = Instant::now();
                    tracing::warn!(error = %e, "skipped malformed PDU");
                }
                Ok(ReadEvent::Closed) => {
                    tracing::info!("SMSC closed the connection");
                    return Exit::Disconnected;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "read failed");
                    return Exit::Disconnected;
                }
            },

            Some(bytes) = write_rx.recv() => {
                if let Err(e) = writer.write(&bytes).await {
                    tracing::warn!(error = %e, "write failed");
                    return Exit::Disconnected;
                }
            }

            _ = keepalive.tick() => {
                let silent_for = last_rx.elapsed();
                if silent_for > liveness_timeout {
                    tracing::warn!(?silent_for, "keepalive timeout, dropping connection");
                    return Exit::Disconnected;
                }
                let probe = EnquireLink::new(core.correlator.next_sequence());
                let Ok(bytes) = probe.to_bytes() else { continue };
                if let Err(e) = writer.write(&bytes).await {
                    tracing::warn!(error = %e, "enquire_link write failed");
                    return Exit::Disconnected;
                }
            }

            _ = sweep.tick() => {
                reassembler.sweep();
            }
        }
    }
}

/// Dispatch one inbound PDU. `Err` carries the exit reason when the PDU
/// tears the session down (peer-initiated unbind, failed ack write).
async fn handle_inbound(
    core: &SessionCore,
    reassembler: &mut Reassembler,
    writer: &mut FrameWriter,
    pdu: Pdu,
) -> Result<(), Exit> {
    match pdu {
        Pdu::EnquireLink(probe) => {
            let resp = EnquireLinkResp::new(probe.sequence_number);
            write_or_disconnect(writer, &resp.to_bytes().map_err(|_| Exit::Disconnected)?).await
        }

        // Liveness already advanced via last_rx; our probes are not
        // registered with the correlator.
        Pdu::EnquireLinkResp(_) => Ok(()),

        Pdu::Unbind(unbind) => {
            tracing::info!("SMSC requested unbind");
            let resp = UnbindResp::new(unbind.sequence_number);
            if let Ok(bytes) = resp.to_bytes() {
                let _ = writer.write(&bytes).await;
            }
            Err(Exit::Disconnected)
        }

        Pdu::DeliverSm(deliver) => {
            // Ack first: protocol liveness never waits on the application.
            let ack = DeliverSmResp::ack(deliver.sequence_number);
            write_or_disconnect(writer, &ack.to_bytes().map_err(|_| Exit::Disconnected)?)
                .await?;

            if core.config.merge_long_messages {
                match reassembler.push(*deliver) {
                    PushOutcome::Passthrough(pdu) | PushOutcome::Complete(pdu) => {
                        core.dispatch(Pdu::DeliverSm(pdu));
                    }
                    PushOutcome::Buffered => {}
                }
            } else {
                core.dispatch(Pdu::DeliverSm(deliver));
            }
            Ok(())
        }

        Pdu::AlertNotification(_) => {
            core.dispatch(pdu);
            Ok(())
        }

        response if response.is_response() => {
            if !core.correlator.resolve(response) {
                tracing::debug!("response with no registered waiter, discarded");
            }
            Ok(())
        }

        other => {
            tracing::warn!(id = ?other.command_id(), "unexpected request PDU, ignored");
            Ok(())
        }
    }
}

async fn write_or_disconnect(writer: &mut FrameWriter, bytes: &bytes::Bytes) -> Result<(), Exit> {
    writer.write(bytes).await.map_err(|e| {
        tracing::warn!(error = %e, "write failed");
        Exit::Disconnected
    })
}

/// Orderly shutdown: unbind, give the SMSC one second to answer, then
/// close the socket either way.
async fn graceful_unbind(core: &SessionCore, reader: &mut FrameReader, writer: &mut FrameWriter) {
    let sequence = core.correlator.next_sequence();
    let Ok(bytes) = Unbind::new(sequence).to_bytes() else {
        return;
    };
    if writer.write(&bytes).await.is_err() {
        return;
    }

    let deadline = Instant::now() + Duration::from_secs(1);
    loop {
        let event = tokio::select! {
            _ = sleep_until(deadline) => break,
            event = reader.read() => event,
        };
        match event {
            Ok(ReadEvent::Pdu(Pdu::UnbindResp(resp))) if resp.sequence_number == sequence => {
                break;
            }
            Ok(ReadEvent::Pdu(_)) | Ok(ReadEvent::Skipped(_)) => continue,
            _ => break,
        }
    }
    let _ = writer.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_multiplies_by_e_and_caps() {
        let mut backoff = Backoff::new();
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));

        let second = backoff.next_delay();
        assert!((second.as_secs_f64() - std::f64::consts::E).abs() < 1e-9);

        let third = backoff.next_delay();
        assert!((third.as_secs_f64() - std::f64::consts::E.powi(2)).abs() < 1e-9);

        for _ in 0..20 {
            backoff.next_delay();
        }
        assert_eq!(backoff.next_delay(), Duration::from_secs_f64(120.0));
    }

    #[test]
    fn backoff_resets_after_successful_bind() {
        let mut backoff = Backoff::new();
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }
}
