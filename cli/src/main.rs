mod cli;
mod input;
mod writers;

use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use crossbeam_channel::unbounded;

use vosim_abi::Policy;
use vosim_core::{HpfReadySet, ReadySet, ReportSink, RrReadySet, Scheduler, SrtnReadySet};
use vosim_lib::{SimError, VirtualClock};
use vosim_mm::BuddyAllocator;

use cli::{Args, Config};
use writers::FileSink;

fn main() {
    let args = Args::parse();
    vosim_lib::logging::init(args.verbose);

    let exit_code = match args.into_config().map_err(SimError::from) {
        Ok(config) => match run(config) {
            Ok(()) => 0,
            Err(error) => {
                report_error(&error);
                error.exit_code()
            }
        },
        Err(error) => {
            report_error(&error);
            error.exit_code()
        }
    };

    std::process::exit(exit_code);
}

fn report_error(error: &SimError) {
    tracing::error!("{error}");
    let mut source = Error::source(error);
    while let Some(cause) = source {
        tracing::error!("caused by: {cause}");
        source = cause.source();
    }
}

fn run(config: Config) -> Result<(), SimError> {
    let jobs = input::load_jobs(&config.file)?;
    tracing::info!(policy = %config.policy, jobs = jobs.len(), "starting run");

    let clock = Arc::new(VirtualClock::new());
    let allocator = BuddyAllocator::new(config.total_memory, config.min_block);
    let (tx, rx) = unbounded();
    let _feeder = input::spawn_feeder(jobs, Arc::clone(&clock), tx);

    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_for_handler = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        cancel_for_handler.store(true, Ordering::SeqCst);
    })
    .ok();

    let mut sink = FileSink::open(&std::env::current_dir().expect("cwd must be readable"))
        .expect("report files must be creatable");

    let report = match config.policy {
        Policy::Hpf => drive(HpfReadySet::new(), allocator, clock, rx, &mut sink, &cancel)?,
        Policy::Srtn => drive(SrtnReadySet::new(), allocator, clock, rx, &mut sink, &cancel)?,
        Policy::Rr { quantum } => drive(RrReadySet::new(quantum), allocator, clock, rx, &mut sink, &cancel)?,
    };

    tracing::info!(final_tick = report.final_tick, finished = report.finished_count, "run complete");
    Ok(())
}

fn drive<RS: ReadySet>(
    ready_set: RS,
    allocator: BuddyAllocator,
    clock: Arc<VirtualClock>,
    arrivals: crossbeam_channel::Receiver<vosim_abi::JobDescriptor>,
    sink: &mut dyn ReportSink,
    cancel: &AtomicBool,
) -> Result<vosim_core::RunReport, SimError> {
    let mut scheduler = Scheduler::new(ready_set, allocator, clock);
    scheduler.run(arrivals, sink, cancel)
}
