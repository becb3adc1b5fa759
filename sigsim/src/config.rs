use crate::{
    error::{SimError, SimResult},
    signal::sig_num::SigId,
};

/// representative task for a process-directed signal every task blocks
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum PendingOwner {
    /// lowest tid, the thread-group-leader analog
    #[default]
    Eldest,
    /// highest tid
    Youngest,
}

/// runtime configuration of the signal namespace and queuing limits
#[derive(Copy, Clone, Debug)]
pub struct SimConfig {
    /// highest standard signal number, valid ids are 1..=standard_max
    pub standard_max: u32,
    /// number of realtime ids, valid indices are 0..realtime_count
    pub realtime_count: u32,
    /// per-id bound on queued realtime occurrences
    pub rt_queue_capacity: usize,
    /// owner of a process-directed signal while every task blocks it
    pub pending_owner: PendingOwner,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            standard_max: 31,
            realtime_count: 32,
            rt_queue_capacity: 32,
            pending_owner: PendingOwner::Eldest,
        }
    }
}

impl SimConfig {
    /// check an id against the configured namespace
    pub fn check(&self, sig: SigId) -> SimResult<()> {
        match sig {
            SigId::Standard(n) if n >= 1 && n <= self.standard_max => Ok(()),
            SigId::RealTime(i) if i < self.realtime_count => Ok(()),
            _ => Err(SimError::UnknownSignalId),
        }
    }
}
