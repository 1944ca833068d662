//! Ordered event delivery to the host.

use crossbeam_channel::Sender;
use tracing::{trace, warn};

use crate::error::{EngineError, EngineResult};

/// Hands events to the host one at a time, in emission order.
///
/// Delivery blocks until the receiving side accepts the event; with the
/// rendezvous channel from `event_channel()` nothing is buffered beyond the
/// event in flight.
pub struct EventEmitter<E> {
    tx: Sender<E>,
    delivered: u64,
    disconnected: bool,
}

impl<E: std::fmt::Debug> EventEmitter<E> {
    /// Create an emitter over the host's event channel.
    pub fn new(tx: Sender<E>) -> Self {
        Self {
            tx,
            delivered: 0,
            disconnected: false,
        }
    }

    /// Deliver one event.
    pub fn emit(&mut self, event: E) -> EngineResult<()> {
        trace!(?event, "Emitting event");
        match self.tx.send(event) {
            Ok(()) => {
                self.delivered += 1;
                Ok(())
            }
            Err(e) => {
                if !self.disconnected {
                    warn!("Host stopped receiving events, dropping {:?}", e.into_inner());
                }
                self.disconnected = true;
                Err(EngineError::HostDisconnected)
            }
        }
    }

    /// Number of events the host has accepted.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}
