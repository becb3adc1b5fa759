//! sigsim: a deterministic signal delivery and rendezvous simulator
//!
//! per-task signal masks, class-specific pending queues (standard
//! signals coalesce, realtime signals queue), synchronous consumption
//! through `sigwait` and N-party barriers. raises go through the
//! [`Dispatcher`], which owns the only path into another task's
//! pending state; diagnostics flow to an injected [`EventSink`].

#[macro_use]
extern crate log;

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod signal;
pub mod sync;
pub mod task;

pub use config::{PendingOwner, SimConfig};
pub use dispatcher::{Dispatcher, TaskHandle};
pub use error::{SimError, SimResult};
pub use event::{BufferSink, DeliveryPath, EventSink, LogSink, NullSink, SimEvent};
pub use signal::{
    sa_list::{SigAction, SigHandler},
    sig_info::{SigCode, SigInfo},
    sig_num::SigId,
    sig_set::{SigMask, SigSet},
};
pub use sync::barrier::{Barrier, BarrierWaitResult};
pub use task::{Task, TaskStatus, Tid};
