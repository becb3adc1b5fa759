//! barrier-sequenced sigwait scenarios: worker threads block a signal,
//! rendezvous with the spawner, then consume the signal synchronously

use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use sigsim::{
    Barrier, BufferSink, Dispatcher, NullSink, PendingOwner, SigCode, SigId, SigSet, SimConfig,
    SimError, SimEvent, Task, TaskStatus,
};

fn wait_until<F: Fn() -> bool>(what: &str, cond: F) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        thread::yield_now();
    }
}

#[test]
fn thread_directed_raise_wakes_the_waiter() {
    let dsp = Dispatcher::new(SimConfig::default(), Arc::new(NullSink));
    let sig = SigId::Standard(10);
    let waitset = SigSet::from_sigs(&[sig]).unwrap();

    let main = dsp.create_task("main", None);
    main.set_sig_mask(waitset).unwrap();
    let worker = dsp.create_task("worker", Some(&main));

    let barrier = Arc::new(Barrier::new(2));
    let rendezvous = barrier.clone();
    let handle = dsp.run(&worker, move |task| {
        // the inherited mask already blocks the id, re-blocking is a no-op
        task.mask_block(waitset).unwrap();
        rendezvous.wait().unwrap();
        let info = task.sigwait(waitset).unwrap();
        assert_eq!(info.sig, sig);
        assert_eq!(info.code, SigCode::TKill);
    });

    barrier.wait().unwrap();
    dsp.tkill(worker.tid(), sig).unwrap();
    handle.join();
    assert_eq!(worker.status(), TaskStatus::Terminated);
}

#[test]
fn process_directed_raise_reaches_the_sigwaiter() {
    let sink = Arc::new(BufferSink::new());
    let dsp = Dispatcher::new(SimConfig::default(), sink.clone());
    let sig = SigId::Standard(2);
    let waitset = SigSet::from_sigs(&[sig]).unwrap();

    // the spawner task blocks the id so it is never picked as eligible
    let main = dsp.create_task("main", None);
    main.set_sig_mask(waitset).unwrap();
    let worker = dsp.create_task("worker", Some(&main));

    let barrier = Arc::new(Barrier::new(2));
    let rendezvous = barrier.clone();
    let handle = dsp.run(&worker, move |task| {
        rendezvous.wait().unwrap();
        let info = task.sigwait(waitset).unwrap();
        assert_eq!(info.sig, sig);
        assert_eq!(info.code, SigCode::User);
    });

    barrier.wait().unwrap();
    let waiter = worker.clone();
    wait_until("worker to enter sigwait", move || {
        waiter.status() == TaskStatus::WaitSignal
    });
    dsp.kill(sig).unwrap();
    handle.join();

    assert!(sink.snapshot().iter().any(|ev| matches!(
        ev,
        SimEvent::Raised { target: None, code: SigCode::User, .. }
    )));
}

#[test]
fn sigwait_requires_a_blocking_mask() {
    let dsp = Dispatcher::new(SimConfig::default(), Arc::new(NullSink));
    let task = dsp.create_task("hasty", None);
    let handle = dsp.run(&task, |task| {
        let waitset = SigSet::from_sigs(&[SigId::Standard(4)]).unwrap();
        assert_eq!(
            task.sigwait(waitset).map(|_| ()),
            Err(SimError::UnblockedWaitSet)
        );
    });
    handle.join();
}

#[test]
fn foreign_mask_mutation_is_rejected() {
    let dsp = Dispatcher::new(SimConfig::default(), Arc::new(NullSink));
    let task = dsp.create_task("private", None);

    let gate = Arc::new(Barrier::new(2));
    let body_gate = gate.clone();
    let handle = dsp.run(&task, move |_task| {
        body_gate.wait().unwrap();
        // stay alive until the outside attempt has been made
        body_gate.wait().unwrap();
    });

    gate.wait().unwrap();
    let set = SigSet::from_sigs(&[SigId::Standard(1)]).unwrap();
    assert_eq!(
        task.mask_block(set).map(|_| ()),
        Err(SimError::InvalidMaskMutationContext)
    );
    gate.wait().unwrap();
    handle.join();
}

#[test]
fn setup_window_allows_exactly_one_mask_mutation() {
    let dsp = Dispatcher::new(SimConfig::default(), Arc::new(NullSink));
    let task = dsp.create_task("staged", None);
    let set = SigSet::from_sigs(&[SigId::Standard(1)]).unwrap();

    assert!(task.set_sig_mask(set).is_ok());
    assert_eq!(
        task.mask_block(set).map(|_| ()),
        Err(SimError::InvalidMaskMutationContext)
    );
}

#[test]
fn terminated_tasks_reject_deliveries() {
    let dsp = Dispatcher::new(SimConfig::default(), Arc::new(NullSink));
    let task = dsp.create_task("brief", None);
    let handle = dsp.run(&task, |_task| {});
    handle.join();

    assert_eq!(
        dsp.tkill(task.tid(), SigId::Standard(1)),
        Err(SimError::ContextTerminated)
    );
}

fn park_on_representative(policy: PendingOwner) -> (Arc<Task>, Arc<Task>) {
    let config = SimConfig {
        pending_owner: policy,
        ..SimConfig::default()
    };
    let dsp = Dispatcher::new(config, Arc::new(NullSink));
    let sig = SigId::Standard(7);
    let set = SigSet::from_sigs(&[sig]).unwrap();

    let first = dsp.create_task("first", None);
    first.set_sig_mask(set).unwrap();
    let second = dsp.create_task("second", Some(&first));

    // every task blocks the id, the raise must park somewhere visible
    dsp.kill(sig).unwrap();
    (first, second)
}

#[test]
fn fully_blocked_kill_parks_on_the_eldest() {
    let (first, second) = park_on_representative(PendingOwner::Eldest);
    assert!(first.pending_set().contains_sig(SigId::Standard(7)));
    assert!(!second.pending_set().contains_sig(SigId::Standard(7)));
}

#[test]
fn fully_blocked_kill_parks_on_the_youngest() {
    let (first, second) = park_on_representative(PendingOwner::Youngest);
    assert!(!first.pending_set().contains_sig(SigId::Standard(7)));
    assert!(second.pending_set().contains_sig(SigId::Standard(7)));
}

#[test]
fn incomplete_barrier_blocks_and_completion_releases() {
    let barrier = Arc::new(Barrier::new(3));
    let (tx, rx) = std::sync::mpsc::channel();

    let mut handles = Vec::new();
    for _ in 0..2 {
        let barrier = barrier.clone();
        let tx = tx.clone();
        handles.push(thread::spawn(move || {
            let result = barrier.wait().unwrap();
            let _ = tx.send(result.generation);
        }));
    }

    // two of three arrivals: nobody may pass
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

    barrier.wait().unwrap();
    let mut generations = vec![
        rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        rx.recv_timeout(Duration::from_secs(5)).unwrap(),
    ];
    generations.dedup();
    assert_eq!(generations, vec![0]);
    for handle in handles {
        handle.join().unwrap();
    }
}
