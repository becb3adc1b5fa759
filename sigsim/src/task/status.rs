/// lifecycle of a task
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum TaskStatus {
    /// created but not yet driven by a thread
    ///
    /// this is the single-threaded setup window: the mask may be
    /// installed once, actions may be registered freely
    Created,

    /// driven by its thread and runnable from the scheduler's view
    Running,

    /// suspended in sigwait until a matching occurrence arrives
    ///
    /// the task leaves this state only through a signal in its wait
    /// set, it is not cancellable from outside
    WaitSignal,

    /// the body returned, every later delivery is rejected
    Terminated,
}
