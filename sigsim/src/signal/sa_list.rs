use std::sync::Arc;

use super::{sig_info::SigInfo, sig_num::{SigId, MAX_SIGNUM}};
use crate::error::SimResult;

/// callback invoked on delivery
pub type SigHandler = Arc<dyn Fn(&SigInfo) + Send + Sync>;

/// per-id disposition
#[derive(Clone)]
pub enum SigAction {
    /// consume the occurrence and report it, nothing else
    Default,
    /// consume the occurrence silently
    Ignore,
    /// run a registered callback
    Handler(SigHandler),
}

impl SigAction {
    /// wrap a callback
    pub fn handler<F>(f: F) -> Self
    where
        F: Fn(&SigInfo) + Send + Sync + 'static,
    {
        SigAction::Handler(Arc::new(f))
    }
}

/// signal action list of a task
/// copied into children at creation, mutated only by the owner
#[derive(Clone)]
pub struct SigActionList {
    actions: [SigAction; MAX_SIGNUM as usize],
}

impl SigActionList {
    pub fn new() -> Self {
        Self {
            actions: core::array::from_fn(|_| SigAction::Default),
        }
    }

    /// install a disposition, returning the previous one
    pub fn set(&mut self, sig: SigId, action: SigAction) -> SimResult<SigAction> {
        let slot = &mut self.actions[sig.bit()? as usize];
        Ok(core::mem::replace(slot, action))
    }

    pub fn get(&self, sig: SigId) -> SimResult<&SigAction> {
        Ok(&self.actions[sig.bit()? as usize])
    }
}

impl Default for SigActionList {
    fn default() -> Self {
        Self::new()
    }
}
