use std::collections::VecDeque;

use hashbrown::HashMap;

use super::{
    sig_info::SigInfo,
    sig_num::SigId,
    sig_set::{SigMask, SigSet},
};
use crate::error::{SimError, SimResult};

/// pending signals of a task
/// it stores occurrences that are not handled yet.
/// standard occurrences coalesce into one entry per id,
/// realtime occurrences queue per id up to `rt_capacity`
pub struct SigPending {
    /// ids with at least one outstanding occurrence
    pending_set: SigSet,
    /// standard class, one entry per id in the pending set
    std_queue: VecDeque<SigInfo>,
    /// realtime class, occurrences per index in raise order
    rt_queues: HashMap<u32, VecDeque<SigInfo>>,
    rt_capacity: usize,
    /// raises absorbed by coalescing, kept for diagnostics
    coalesced: u64,
}

impl SigPending {
    pub fn new(rt_capacity: usize) -> Self {
        Self {
            pending_set: SigSet::empty(),
            std_queue: VecDeque::new(),
            rt_queues: HashMap::new(),
            rt_capacity,
            coalesced: 0,
        }
    }

    /// record one occurrence under the class policy of its id.
    /// returns true when a standard occurrence coalesced into an
    /// already-pending entry
    pub fn push(&mut self, info: SigInfo) -> SimResult<bool> {
        match info.sig {
            SigId::RealTime(index) => {
                let queue = self.rt_queues.entry(index).or_default();
                if queue.len() >= self.rt_capacity {
                    return Err(SimError::QueueExhausted);
                }
                queue.push_back(info);
                self.pending_set.enable(info.sig)?;
                Ok(false)
            }
            SigId::Standard(_) => {
                if self.pending_set.contains_sig(info.sig) {
                    self.coalesced += 1;
                    return Ok(true);
                }
                self.pending_set.enable(info.sig)?;
                self.std_queue.push_back(info);
                Ok(false)
            }
        }
    }

    /// remove and return the highest-priority occurrence among `set`
    pub fn pop_in_set(&mut self, set: SigSet) -> Option<SigInfo> {
        let accept = self.pending_set & set;
        let sig = accept.try_fetch()?;
        match sig {
            SigId::RealTime(index) => {
                let queue = match self.rt_queues.get_mut(&index) {
                    Some(queue) => queue,
                    None => {
                        error!("[sig_pending] pending set out of sync for {:?}", sig);
                        return None;
                    }
                };
                let info = queue.pop_front();
                if queue.is_empty() {
                    self.rt_queues.remove(&index);
                    if let Err(err) = self.pending_set.disable(sig) {
                        error!("[sig_pending] disable {:?} failed: {}", sig, err);
                    }
                }
                info
            }
            SigId::Standard(_) => {
                if let Err(err) = self.pending_set.disable(sig) {
                    error!("[sig_pending] disable {:?} failed: {}", sig, err);
                }
                match self.std_queue.iter().position(|si| si.sig == sig) {
                    Some(pos) => self.std_queue.remove(pos),
                    None => {
                        error!("[sig_pending] pending set out of sync for {:?}", sig);
                        None
                    }
                }
            }
        }
    }

    /// same as `pop_in_set` over everything the mask does not block
    pub fn pop_with_mask(&mut self, mask: SigMask) -> Option<SigInfo> {
        self.pop_in_set(!mask)
    }

    /// remove one occurrence of `sig` if present
    pub fn take(&mut self, sig: SigId) -> Option<SigInfo> {
        let mut set = SigSet::empty();
        set.enable(sig).ok()?;
        self.pop_in_set(set)
    }

    pub fn has_pending(&self, mask: SigMask) -> bool {
        !(self.pending_set & !mask).is_empty()
    }

    pub fn pending_set(&self) -> SigSet {
        self.pending_set
    }

    /// outstanding occurrences for one id
    pub fn outstanding(&self, sig: SigId) -> usize {
        match sig {
            SigId::RealTime(index) => self.rt_queues.get(&index).map_or(0, |q| q.len()),
            SigId::Standard(_) => self.pending_set.contains_sig(sig) as usize,
        }
    }

    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}
