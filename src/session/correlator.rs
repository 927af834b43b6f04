// ABOUTME: Request/response correlation - sequence numbers, waiter table, window gate
// ABOUTME: Every waiter resolves exactly once: response, timeout, disconnect or close

use crate::datatypes::{CommandId, CommandStatus};
use crate::pdu::Pdu;
use crate::session::error::SmppError;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{oneshot, Semaphore};

/// Sequence numbers live in 1..=0x7FFF_FFFF and wrap back to 1.
const SEQUENCE_MAX: u32 = 0x7FFF_FFFF;

struct Waiter {
    command_id: CommandId,
    tx: oneshot::Sender<Result<Pdu, SmppError>>,
}

/// Per-session correlation state. Shared between submitters (register,
/// remove-on-drop) and the driver (resolve, fail_all); the table mutex is
/// only ever held for map operations.
pub(crate) struct Correlator {
    sequence: AtomicU32,
    inflight: Mutex<BTreeMap<u32, Waiter>>,
    window: Option<Arc<Semaphore>>,
}

impl Correlator {
    pub fn new(window_size: usize) -> Self {
        Self {
            sequence: AtomicU32::new(0),
            inflight: Mutex::new(BTreeMap::new()),
            window: (window_size > 0).then(|| Arc::new(Semaphore::new(window_size))),
        }
    }

    /// Next sequence number, wrapping within 1..=2³¹−1.
    pub fn next_sequence(&self) -> u32 {
        let previous = self
            .sequence
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| {
                Some(if v >= SEQUENCE_MAX { 1 } else { v + 1 })
            })
            .expect("sequence update never fails");
        if previous >= SEQUENCE_MAX {
            1
        } else {
            previous + 1
        }
    }

    /// Sequences are per connection: the driver resets before each bind.
    pub fn reset_sequence(&self) {
        self.sequence.store(0, Ordering::SeqCst);
    }

    /// Block until the in-flight window has room, or `deadline` passes.
    /// No-op when the window is unbounded. The permit must be held until
    /// the request resolves.
    pub async fn acquire_window(
        &self,
        deadline: Duration,
    ) -> Result<Option<tokio::sync::OwnedSemaphorePermit>, SmppError> {
        let Some(window) = &self.window else {
            return Ok(None);
        };
        match tokio::time::timeout(deadline, Arc::clone(window).acquire_owned()).await {
            Ok(Ok(permit)) => Ok(Some(permit)),
            Ok(Err(_)) => Err(SmppError::Closed),
            Err(_) => Err(SmppError::WindowFull),
        }
    }

    /// Park a waiter for `sequence`. The returned receiver resolves exactly
    /// once; pair it with a [`WaiterGuard`] so an abandoned wait cleans up.
    pub fn register(
        &self,
        sequence: u32,
        command_id: CommandId,
    ) -> oneshot::Receiver<Result<Pdu, SmppError>> {
        let (tx, rx) = oneshot::channel();
        let previous = self
            .inflight
            .lock()
            .expect("inflight mutex poisoned")
            .insert(sequence, Waiter { command_id, tx });
        debug_assert!(previous.is_none(), "sequence reused while outstanding");
        rx
    }

    /// Drop the waiter for `sequence`, if it is still parked.
    pub fn remove(&self, sequence: u32) {
        self.inflight
            .lock()
            .expect("inflight mutex poisoned")
            .remove(&sequence);
    }

    pub fn outstanding(&self) -> usize {
        self.inflight.lock().expect("inflight mutex poisoned").len()
    }

    /// Route a response to its waiter. Returns false when no waiter is
    /// registered (late response after timeout, or peer noise).
    pub fn resolve(&self, response: Pdu) -> bool {
        let sequence = response.sequence_number();
        let Some(waiter) = self
            .inflight
            .lock()
            .expect("inflight mutex poisoned")
            .remove(&sequence)
        else {
            return false;
        };

        let outcome = match &response {
            Pdu::GenericNack(nack) => {
                // The peer could not make sense of our request.
                let status = if nack.command_status == CommandStatus::Ok {
                    CommandStatus::UnknownError
                } else {
                    nack.command_status
                };
                Err(SmppError::Protocol(status))
            }
            _ if waiter.command_id.response_id() == Some(response.command_id()) => Ok(response),
            other => Err(SmppError::UnexpectedResponse {
                expected: waiter
                    .command_id
                    .response_id()
                    .unwrap_or(CommandId::GenericNack),
                actual: other.command_id(),
            }),
        };

        // A dropped receiver means the caller gave up; nothing to do.
        let _ = waiter.tx.send(outcome);
        true
    }

    /// Resolve every outstanding waiter with `error` (connection loss or
    /// session close).
    pub fn fail_all(&self, error: impl Fn() -> SmppError) {
        let drained = std::mem::take(
            &mut *self.inflight.lock().expect("inflight mutex poisoned"),
        );
        for (_, waiter) in drained {
            let _ = waiter.tx.send(Err(error()));
        }
    }
}

/// Removes the waiter when the submitting future is dropped before the
/// response arrives (caller-side cancellation or timeout).
pub(crate) struct WaiterGuard<'a> {
    correlator: &'a Correlator,
    sequence: u32,
}

impl<'a> WaiterGuard<'a> {
    pub fn new(correlator: &'a Correlator, sequence: u32) -> Self {
        Self {
            correlator,
            sequence,
        }
    }
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        self.correlator.remove(self.sequence);
    }
}
