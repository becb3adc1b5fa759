use std::{
    sync::{Arc, Condvar, Mutex, MutexGuard},
    thread::{self, ThreadId},
};

use super::{status::TaskStatus, taskid::Tid};
use crate::{
    config::SimConfig,
    error::{SimError, SimResult},
    event::{DeliveryPath, EventSink, SimEvent},
    signal::{
        sa_list::{SigAction, SigActionList},
        sig_info::SigInfo,
        sig_num::SigId,
        sig_pending::SigPending,
        sig_set::{SigMask, SigSet},
    },
};

/// schedulable unit owning its signal state
/// one OS thread drives a running task, mask and pending registry are
/// never touched from outside except through `deliver_or_queue`
pub struct Task {
    tid: Tid,
    name: String,
    config: SimConfig,
    sink: Arc<dyn EventSink>,
    /// per-task mutable state, every access serialized on this lock
    pcb: Mutex<Pcb>,
    /// signaled when an occurrence lands for a waiting task
    wake: Condvar,
    /// serializes action invocation per target.
    /// not reentrant: an action must not force another synchronous
    /// delivery on its own task
    deliver: Mutex<()>,
}

struct Pcb {
    status: TaskStatus,
    sig_mask: SigMask,
    pending: SigPending,
    sa_list: SigActionList,
    /// thread driving this task once running
    owner: Option<ThreadId>,
    /// present while suspended in sigwait
    wait_set: Option<SigSet>,
    /// the single pre-run mask mutation was consumed
    setup_mask_done: bool,
}

impl Task {
    pub(crate) fn new(
        tid: Tid,
        name: &str,
        config: SimConfig,
        sink: Arc<dyn EventSink>,
        parent: Option<&Arc<Task>>,
    ) -> Arc<Self> {
        // mask and action table are copied, never shared
        let (sig_mask, sa_list) = match parent {
            Some(parent) => {
                let pcb = parent.pcb();
                (pcb.sig_mask, pcb.sa_list.clone())
            }
            None => (SigMask::empty(), SigActionList::new()),
        };
        Arc::new(Self {
            tid,
            name: name.into(),
            config,
            sink,
            pcb: Mutex::new(Pcb {
                status: TaskStatus::Created,
                sig_mask,
                pending: SigPending::new(config.rt_queue_capacity),
                sa_list,
                owner: None,
                wait_set: None,
                setup_mask_done: false,
            }),
            wake: Condvar::new(),
            deliver: Mutex::new(()),
        })
    }

    pub fn tid(&self) -> Tid {
        self.tid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> TaskStatus {
        self.pcb().status
    }

    /// current mask snapshot
    pub fn sig_mask(&self) -> SigMask {
        self.pcb().sig_mask
    }

    /// ids with at least one outstanding occurrence
    pub fn pending_set(&self) -> SigSet {
        self.pcb().pending.pending_set()
    }

    /// raises absorbed by standard-class coalescing
    pub fn coalesced_raises(&self) -> u64 {
        self.pcb().pending.coalesced()
    }

    fn pcb(&self) -> MutexGuard<'_, Pcb> {
        self.pcb.lock().unwrap_or_else(|err| err.into_inner())
    }

    fn is_owner(pcb: &Pcb) -> bool {
        pcb.owner == Some(thread::current().id())
    }

    /// the mask is mutated by the driving thread, or once during setup
    fn allow_mask_mutation(pcb: &mut Pcb) -> SimResult<()> {
        match pcb.status {
            TaskStatus::Created => {
                if pcb.setup_mask_done {
                    return Err(SimError::InvalidMaskMutationContext);
                }
                pcb.setup_mask_done = true;
                Ok(())
            }
            TaskStatus::Terminated => Err(SimError::InvalidMaskMutationContext),
            _ => match Self::is_owner(pcb) {
                true => Ok(()),
                false => Err(SimError::InvalidMaskMutationContext),
            },
        }
    }

    /// replace the whole mask, returning the previous one
    pub fn set_sig_mask(&self, mask: SigMask) -> SimResult<SigMask> {
        let mut pcb = self.pcb();
        Self::allow_mask_mutation(&mut pcb)?;
        let old = pcb.sig_mask;
        pcb.sig_mask = mask;
        trace!("[task{}] mask {:?} -> {:?}", self.tid, old, mask);
        self.drain_deliverable(pcb);
        Ok(old)
    }

    /// add `set` to the mask, returning the previous mask
    pub fn mask_block(&self, set: SigSet) -> SimResult<SigMask> {
        let mut pcb = self.pcb();
        Self::allow_mask_mutation(&mut pcb)?;
        let old = pcb.sig_mask;
        pcb.sig_mask |= set;
        Ok(old)
    }

    /// remove `set` from the mask, delivering anything newly unblocked
    pub fn mask_unblock(&self, set: SigSet) -> SimResult<SigMask> {
        let mut pcb = self.pcb();
        Self::allow_mask_mutation(&mut pcb)?;
        let old = pcb.sig_mask;
        pcb.sig_mask &= !set;
        self.drain_deliverable(pcb);
        Ok(old)
    }

    /// install a disposition, returning the previous one.
    /// allowed during setup or from the task's own thread
    pub fn set_action(&self, sig: SigId, action: SigAction) -> SimResult<SigAction> {
        self.config.check(sig)?;
        let mut pcb = self.pcb();
        match pcb.status {
            TaskStatus::Created => {}
            TaskStatus::Terminated => return Err(SimError::ContextTerminated),
            _ if Self::is_owner(&pcb) => {}
            _ => return Err(SimError::InvalidMaskMutationContext),
        }
        pcb.sa_list.set(sig, action)
    }

    /// route one occurrence into this task.
    /// queued while masked or not yet running, a matching waiter is
    /// woken, otherwise the action runs on the calling thread
    pub(crate) fn deliver_or_queue(&self, info: SigInfo) -> SimResult<()> {
        let mut pcb = self.pcb();
        if pcb.status == TaskStatus::Terminated {
            return Err(SimError::ContextTerminated);
        }
        let waited = pcb.wait_set.map_or(false, |set| set.contains_sig(info.sig));
        if waited || pcb.sig_mask.contains_sig(info.sig) || pcb.status == TaskStatus::Created {
            return self.queue(&mut pcb, info, waited);
        }
        let action = pcb.sa_list.get(info.sig)?.clone();
        drop(pcb);
        self.run_action(info, &action);
        Ok(())
    }

    fn queue(&self, pcb: &mut Pcb, info: SigInfo, wake: bool) -> SimResult<()> {
        match pcb.pending.push(info) {
            Ok(coalesced) => {
                trace!(
                    "[task{}] queue {:?}, coalesced: {}",
                    self.tid,
                    info.sig,
                    coalesced
                );
                self.sink.emit(&SimEvent::Queued {
                    tid: self.tid,
                    sig: info.sig,
                    coalesced,
                });
                if wake {
                    self.wake.notify_all();
                }
                Ok(())
            }
            Err(err) => {
                warn!("[task{}] drop {:?}: {}", self.tid, info.sig, err);
                self.sink.emit(&SimEvent::Dropped {
                    tid: self.tid,
                    sig: info.sig,
                });
                Err(err)
            }
        }
    }

    /// run one disposition outside the state lock.
    /// serialized per target so concurrent raisers cannot interleave
    fn run_action(&self, info: SigInfo, action: &SigAction) {
        let _serial = self.deliver.lock().unwrap_or_else(|err| err.into_inner());
        match action {
            SigAction::Ignore => {
                self.sink.emit(&SimEvent::Ignored {
                    tid: self.tid,
                    sig: info.sig,
                });
            }
            SigAction::Default => {
                self.sink.emit(&SimEvent::Delivered {
                    tid: self.tid,
                    sig: info.sig,
                    path: DeliveryPath::Action,
                });
            }
            SigAction::Handler(handler) => {
                debug!("[task{}] handle {:?}", self.tid, info.sig);
                handler(&info);
                self.sink.emit(&SimEvent::Delivered {
                    tid: self.tid,
                    sig: info.sig,
                    path: DeliveryPath::Action,
                });
            }
        }
    }

    /// deliver every pending occurrence the mask no longer blocks
    /// runs on the task's own thread
    fn drain_deliverable<'a>(&'a self, mut pcb: MutexGuard<'a, Pcb>) {
        loop {
            if pcb.status != TaskStatus::Running {
                return;
            }
            let mask = pcb.sig_mask;
            let Some(info) = pcb.pending.pop_with_mask(mask) else {
                return;
            };
            let action = match pcb.sa_list.get(info.sig) {
                Ok(action) => action.clone(),
                Err(err) => {
                    error!("[task{}] no action slot for {:?}: {}", self.tid, info.sig, err);
                    continue;
                }
            };
            drop(pcb);
            self.run_action(info, &action);
            pcb = self.pcb();
        }
    }

    /// synchronously consume one occurrence out of `set`,
    /// suspending the calling thread until one is available
    pub fn sigwait(&self, set: SigSet) -> SimResult<SigInfo> {
        let mut pcb = self.pcb();
        if pcb.status == TaskStatus::Terminated {
            return Err(SimError::ContextTerminated);
        }
        // wait targets must already be blocked
        if !(set & !pcb.sig_mask).is_empty() {
            return Err(SimError::UnblockedWaitSet);
        }
        pcb.status = TaskStatus::WaitSignal;
        pcb.wait_set = Some(set);
        debug!("[task{}] sigwait on {:?}", self.tid, set);
        loop {
            if let Some(info) = pcb.pending.pop_in_set(set) {
                pcb.status = TaskStatus::Running;
                pcb.wait_set = None;
                drop(pcb);
                debug!("[task{}] sigwait took {:?}", self.tid, info.sig);
                self.sink.emit(&SimEvent::Delivered {
                    tid: self.tid,
                    sig: info.sig,
                    path: DeliveryPath::Sigwait,
                });
                return Ok(info);
            }
            pcb = self.wake.wait(pcb).unwrap_or_else(|err| err.into_inner());
        }
    }

    /// first transition on the driving thread
    pub(crate) fn on_thread_start(self: &Arc<Self>) {
        let mut pcb = self.pcb();
        pcb.owner = Some(thread::current().id());
        pcb.status = TaskStatus::Running;
        debug!("[task{}] running ({})", self.tid, self.name);
        // deliver whatever was raised during setup
        self.drain_deliverable(pcb);
    }

    /// the body returned, later deliveries are rejected
    pub(crate) fn on_thread_exit(&self) {
        let mut pcb = self.pcb();
        pcb.status = TaskStatus::Terminated;
        pcb.wait_set = None;
        debug!("[task{}] terminated", self.tid);
    }

    /// true when a process-directed `sig` can reach this task right now
    pub(crate) fn wants(&self, sig: SigId) -> bool {
        let pcb = self.pcb();
        if pcb.status == TaskStatus::Terminated {
            return false;
        }
        if pcb.wait_set.map_or(false, |set| set.contains_sig(sig)) {
            return true;
        }
        !pcb.sig_mask.contains_sig(sig)
    }
}
