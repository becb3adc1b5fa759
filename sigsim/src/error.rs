use thiserror::Error;

/// recoverable simulator error
/// every variant is returned to the caller of the violating operation,
/// none of them is fatal by itself
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum SimError {
    /// id outside the structural bit space or the configured namespace
    #[error("[UnknownSignalId] signal id outside the configured namespace")]
    UnknownSignalId,

    /// the realtime queue for the id is at capacity, the raise was rejected
    #[error("[QueueExhausted] realtime signal queue capacity exceeded")]
    QueueExhausted,

    /// mask mutated from a thread that does not drive the task,
    /// or a second setup mutation before the task started running
    #[error("[InvalidMaskMutationContext] signal mask mutated from a foreign context")]
    InvalidMaskMutationContext,

    /// sigwait set contains ids the caller has not blocked
    #[error("[UnblockedWaitSet] sigwait target signals must be blocked first")]
    UnblockedWaitSet,

    /// operation against a task whose body already returned
    #[error("[ContextTerminated] operation against a terminated task")]
    ContextTerminated,

    /// destroy with waiters present, or use of a destroyed barrier
    #[error("[BarrierBusy] barrier is busy or destroyed")]
    BarrierBusy,
}

pub type SimResult<T> = Result<T, SimError>;
