use std::sync::Mutex;

use crate::{
    signal::{sig_info::SigCode, sig_num::SigId},
    task::Tid,
};

/// where a delivered occurrence was consumed
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeliveryPath {
    /// through the action table, on the raising thread
    Action,
    /// returned from a sigwait
    Sigwait,
}

/// structured diagnostic record emitted by the simulator
/// the injected sink replaces formatted output inside the core
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimEvent {
    /// a raise entered the dispatcher, target is None when process-directed
    Raised {
        target: Option<Tid>,
        sig: SigId,
        code: SigCode,
    },
    /// the occurrence was recorded as pending
    Queued {
        tid: Tid,
        sig: SigId,
        coalesced: bool,
    },
    /// the occurrence was consumed
    Delivered {
        tid: Tid,
        sig: SigId,
        path: DeliveryPath,
    },
    /// the occurrence was consumed by an ignore disposition
    Ignored { tid: Tid, sig: SigId },
    /// the occurrence was rejected, the raise saw `QueueExhausted`
    Dropped { tid: Tid, sig: SigId },
    /// a full rendezvous completed
    BarrierReleased { generation: u64, parties: usize },
}

/// injected observer for simulator events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &SimEvent);
}

/// sink that discards everything
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &SimEvent) {}
}

/// sink that forwards to the log facade
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &SimEvent) {
        match event {
            SimEvent::Dropped { .. } => warn!("[event] {:?}", event),
            _ => debug!("[event] {:?}", event),
        }
    }
}

/// sink that records every event for later inspection
#[derive(Default)]
pub struct BufferSink {
    events: Mutex<Vec<SimEvent>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<SimEvent> {
        self.events
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .clone()
    }

    pub fn take(&self) -> Vec<SimEvent> {
        core::mem::take(&mut *self.events.lock().unwrap_or_else(|err| err.into_inner()))
    }
}

impl EventSink for BufferSink {
    fn emit(&self, event: &SimEvent) {
        self.events
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .push(event.clone());
    }
}
