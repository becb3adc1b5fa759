use std::{collections::BTreeMap, sync::Arc, thread};

use spin::Mutex as SpinLock;

use crate::{
    config::{PendingOwner, SimConfig},
    error::{SimError, SimResult},
    event::{EventSink, SimEvent},
    signal::{
        sig_info::{SigCode, SigInfo},
        sig_num::{SigId, RT_REGION, STD_REGION},
    },
    task::{taskid::TidAllocator, Task, TaskStatus, Tid},
};

/// task registry and raise fan-out
/// the only path allowed to reach into another task's pending state
pub struct Dispatcher {
    config: SimConfig,
    sink: Arc<dyn EventSink>,
    tasks: SpinLock<BTreeMap<Tid, Arc<Task>>>,
    tid_alloc: TidAllocator,
}

impl Dispatcher {
    pub fn new(config: SimConfig, sink: Arc<dyn EventSink>) -> Arc<Self> {
        assert!(
            config.standard_max >= 1 && config.standard_max <= STD_REGION,
            "[dispatcher] standard_max must be in 1..={}",
            STD_REGION
        );
        assert!(
            config.realtime_count <= RT_REGION,
            "[dispatcher] realtime_count must be at most {}",
            RT_REGION
        );
        assert!(
            config.rt_queue_capacity >= 1,
            "[dispatcher] rt_queue_capacity must be positive"
        );
        Arc::new(Self {
            config,
            sink,
            tasks: SpinLock::new(BTreeMap::new()),
            tid_alloc: TidAllocator::new(),
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// create a task in `Created` state
    /// mask and action table are copied from `parent` when given
    pub fn create_task(&self, name: &str, parent: Option<&Arc<Task>>) -> Arc<Task> {
        let tid = self.tid_alloc.alloc();
        let task = Task::new(tid, name, self.config, self.sink.clone(), parent);
        self.tasks.lock().insert(tid, task.clone());
        debug!("[dispatcher] created task {} ({})", tid, name);
        task
    }

    /// try to get a task by tid
    pub fn get(&self, tid: Tid) -> Option<Arc<Task>> {
        self.tasks.lock().get(&tid).cloned()
    }

    /// drive a created task on its own OS thread
    pub fn run<F>(&self, task: &Arc<Task>, body: F) -> TaskHandle
    where
        F: FnOnce(&Arc<Task>) + Send + 'static,
    {
        assert!(
            task.status() == TaskStatus::Created,
            "[dispatcher] task {} is already driven",
            task.tid()
        );
        let inner = task.clone();
        let join = thread::Builder::new()
            .name(inner.name().into())
            .spawn(move || {
                inner.on_thread_start();
                body(&inner);
                inner.on_thread_exit();
            })
            .unwrap_or_else(|err| panic!("[dispatcher] thread spawn failed: {}", err));
        TaskHandle {
            task: task.clone(),
            join,
        }
    }

    /// thread-directed raise, exactly the target task is affected
    pub fn tkill(&self, tid: Tid, sig: SigId) -> SimResult<()> {
        self.config.check(sig)?;
        let task = self.get(tid).ok_or(SimError::ContextTerminated)?;
        debug!("[dispatcher] tkill {:?} -> task {}", sig, tid);
        self.sink.emit(&SimEvent::Raised {
            target: Some(tid),
            sig,
            code: SigCode::TKill,
        });
        task.deliver_or_queue(SigInfo::new(sig, SigCode::TKill))
    }

    /// process-directed raise.
    /// the first task in creation order that can take the signal gets
    /// it, else it parks on the representative chosen by the
    /// pending-owner policy
    pub fn kill(&self, sig: SigId) -> SimResult<()> {
        self.config.check(sig)?;
        self.sink.emit(&SimEvent::Raised {
            target: None,
            sig,
            code: SigCode::User,
        });
        let info = SigInfo::new(sig, SigCode::User);
        // clone refs out, the registry lock never spans a delivery
        let tasks: Vec<Arc<Task>> = self.tasks.lock().values().cloned().collect();
        if let Some(task) = tasks.iter().find(|task| task.wants(sig)) {
            debug!("[dispatcher] kill {:?} -> eligible task {}", sig, task.tid());
            return task.deliver_or_queue(info);
        }
        let live = tasks
            .iter()
            .filter(|task| task.status() != TaskStatus::Terminated);
        let owner = match self.config.pending_owner {
            PendingOwner::Eldest => live.min_by_key(|task| task.tid()),
            PendingOwner::Youngest => live.max_by_key(|task| task.tid()),
        };
        match owner {
            Some(task) => {
                debug!("[dispatcher] kill {:?} parked on task {}", sig, task.tid());
                task.deliver_or_queue(info)
            }
            None => Err(SimError::ContextTerminated),
        }
    }
}

/// join handle pairing a task with its driving thread
pub struct TaskHandle {
    task: Arc<Task>,
    join: thread::JoinHandle<()>,
}

impl TaskHandle {
    pub fn task(&self) -> &Arc<Task> {
        &self.task
    }

    /// wait for the body to return, propagating its panic
    pub fn join(self) {
        if let Err(payload) = self.join.join() {
            std::panic::resume_unwind(payload);
        }
    }
}
