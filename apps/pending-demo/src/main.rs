//! pending-demo: drives the simulator through the classic scenarios,
//! signal set plumbing, standard-vs-realtime pending and a
//! barrier-sequenced sigwait rendezvous

#[macro_use]
extern crate log;

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
};

use log::{Level, LevelFilter, Log, Metadata, Record};
use sigsim::{
    Barrier, Dispatcher, LogSink, SigAction, SigId, SigSet, SimConfig, TaskStatus,
};

struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }
    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let color = match record.level() {
            Level::Error => 31, // Red
            Level::Warn => 93,  // BrightYellow
            Level::Info => 34,  // Blue
            Level::Debug => 32, // Green
            Level::Trace => 90, // BrightBlack
        };
        println!(
            "\u{1B}[{}m[{:>5}] {}\u{1B}[0m",
            color,
            record.level(),
            record.args(),
        );
    }
    fn flush(&self) {}
}

fn log_init() {
    static LOGGER: SimpleLogger = SimpleLogger;
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(match option_env!("LOG") {
        Some("ERROR") => LevelFilter::Error,
        Some("WARN") => LevelFilter::Warn,
        Some("INFO") => LevelFilter::Info,
        Some("DEBUG") => LevelFilter::Debug,
        Some("TRACE") => LevelFilter::Trace,
        _ => LevelFilter::Info,
    });
}

/// set operations made visible, step by step
fn sigset_walkthrough() {
    info!("==== sigset walkthrough ====");
    let mut set = SigSet::empty();
    info!("[sigset] empty          : {:?}", set);

    set = SigSet::full();
    info!("[sigset] full           : {:?}", set);

    set = SigSet::empty();
    set.enable(SigId::Standard(2)).unwrap();
    set.enable(SigId::Standard(15)).unwrap();
    info!("[sigset] after add 2,15 : {:?}", set);
    info!(
        "[sigset] contains 2: {}, contains 1: {}",
        set.contains_sig(SigId::Standard(2)),
        set.contains_sig(SigId::Standard(1)),
    );

    set.disable(SigId::Standard(2)).unwrap();
    info!("[sigset] after del 2    : {:?}", set);
}

/// the divergent pending behavior of the two signal classes
fn pending_classes() {
    info!("==== pending: standard vs realtime ====");
    let dsp = Dispatcher::new(SimConfig::default(), Arc::new(LogSink));

    for (label, sig, expected) in [
        ("standard", SigId::Standard(12), 1),
        ("realtime", SigId::RealTime(0), 3),
    ] {
        let task = dsp.create_task(label, None);
        let set = SigSet::from_sigs(&[sig]).unwrap();
        task.set_sig_mask(set).unwrap();

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        task.set_action(
            sig,
            SigAction::handler(move |info| {
                let count = counter.fetch_add(1, Ordering::SeqCst) + 1;
                info!("[handler] got {:?}, count={}", info.sig, count);
            }),
        )
        .unwrap();

        info!("[{}] raising {:?} three times while blocked", label, sig);
        for _ in 0..3 {
            let _ = dsp.tkill(task.tid(), sig);
        }

        let handle = dsp.run(&task, move |task| {
            info!("[{}] unblocking", task.name());
            task.mask_unblock(set).unwrap();
        });
        handle.join();
        info!(
            "[{}] handler count={} (expected: {})",
            label,
            hits.load(Ordering::SeqCst),
            expected,
        );
    }
}

/// a worker blocks the id, rendezvouses, then consumes it in sigwait
fn rendezvous() {
    info!("==== sigwait + barrier rendezvous ====");
    let dsp = Dispatcher::new(SimConfig::default(), Arc::new(LogSink));
    let sig = SigId::Standard(2);
    let waitset = SigSet::from_sigs(&[sig]).unwrap();

    // block before spawning so the worker inherits the mask
    let main_task = dsp.create_task("main", None);
    main_task.set_sig_mask(waitset).unwrap();
    let worker = dsp.create_task("worker", Some(&main_task));

    let barrier = Arc::new(Barrier::new(2));
    let ready = barrier.clone();
    let handle = dsp.run(&worker, move |task| {
        info!("[worker] ready to receive, waiting at the barrier");
        ready.wait().unwrap();
        let info = task.sigwait(waitset).unwrap();
        info!("[worker] received {:?} ({:?}), exiting", info.sig, info.code);
    });

    barrier.wait().unwrap();
    while worker.status() != TaskStatus::WaitSignal {
        thread::yield_now();
    }
    info!("[main] worker is parked, sending a process-directed raise");
    dsp.kill(sig).unwrap();
    handle.join();
    info!("[main] worker joined, cleaning up");
    barrier.destroy().unwrap();
}

fn main() {
    log_init();
    sigset_walkthrough();
    pending_classes();
    rendezvous();
}
