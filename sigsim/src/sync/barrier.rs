use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use crate::{
    error::{SimError, SimResult},
    event::{EventSink, NullSink, SimEvent},
};

/// N-party rendezvous
/// arrival and release transitions are serialized on the inner lock,
/// the instance is reusable across generations until destroyed
pub struct Barrier {
    parties: usize,
    inner: Mutex<BarrierInner>,
    cvar: Condvar,
    sink: Arc<dyn EventSink>,
}

struct BarrierInner {
    arrived: usize,
    generation: u64,
    destroyed: bool,
}

/// outcome of one rendezvous
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BarrierWaitResult {
    /// generation the caller arrived in
    pub generation: u64,
    /// exactly one waiter per generation reports true
    pub is_leader: bool,
}

impl Barrier {
    pub fn new(parties: usize) -> Self {
        Self::with_sink(parties, Arc::new(NullSink))
    }

    pub fn with_sink(parties: usize, sink: Arc<dyn EventSink>) -> Self {
        assert!(parties >= 1, "[barrier] parties must be at least 1");
        Self {
            parties,
            inner: Mutex::new(BarrierInner {
                arrived: 0,
                generation: 0,
                destroyed: false,
            }),
            cvar: Condvar::new(),
            sink,
        }
    }

    pub fn parties(&self) -> usize {
        self.parties
    }

    fn inner(&self) -> MutexGuard<'_, BarrierInner> {
        self.inner.lock().unwrap_or_else(|err| err.into_inner())
    }

    /// arrive and block until the generation completes.
    /// the last arriver releases everyone and reports as leader
    pub fn wait(&self) -> SimResult<BarrierWaitResult> {
        let mut inner = self.inner();
        if inner.destroyed {
            return Err(SimError::BarrierBusy);
        }
        let generation = inner.generation;
        inner.arrived += 1;
        if inner.arrived == self.parties {
            inner.arrived = 0;
            inner.generation += 1;
            drop(inner);
            self.cvar.notify_all();
            debug!("[barrier] generation {} released", generation);
            self.sink.emit(&SimEvent::BarrierReleased {
                generation,
                parties: self.parties,
            });
            return Ok(BarrierWaitResult {
                generation,
                is_leader: true,
            });
        }
        while inner.generation == generation {
            inner = self.cvar.wait(inner).unwrap_or_else(|err| err.into_inner());
        }
        Ok(BarrierWaitResult {
            generation,
            is_leader: false,
        })
    }

    /// tear the barrier down
    /// rejected while any arrival of the current generation is parked
    pub fn destroy(&self) -> SimResult<()> {
        let mut inner = self.inner();
        if inner.arrived > 0 {
            return Err(SimError::BarrierBusy);
        }
        inner.destroyed = true;
        Ok(())
    }
}
