//! Report Writers (§4.8): the three on-disk formats, byte for byte. Pure
//! formatting and IO — no scheduling logic lives here.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use vosim_core::{MemoryEvent, MemoryTransition, ReportSink, RunSummary, SchedulerEvent, Transition};

const SCHEDULER_LOG_HEADER: &str = "#At time x process y state arr w total z remain y wait k";

pub struct FileSink {
    scheduler_log: BufWriter<File>,
    memory_log: BufWriter<File>,
    perf_path: std::path::PathBuf,
}

impl FileSink {
    pub fn open(dir: &Path) -> io::Result<Self> {
        let mut scheduler_log = BufWriter::new(File::create(dir.join("scheduler.log"))?);
        writeln!(scheduler_log, "{SCHEDULER_LOG_HEADER}")?;
        scheduler_log.flush()?;

        let memory_log = BufWriter::new(File::create(dir.join("memory.log"))?);

        Ok(Self {
            scheduler_log,
            memory_log,
            perf_path: dir.join("scheduler.perf"),
        })
    }
}

fn transition_word(transition: Transition) -> &'static str {
    match transition {
        Transition::Started => "started",
        Transition::Resumed => "resumed",
        Transition::Stopped => "stopped",
        Transition::Finished => "finished",
    }
}

impl ReportSink for FileSink {
    fn scheduler_event(&mut self, event: SchedulerEvent) {
        let mut line = format!(
            "At time {} process {} {} arr {} total {} remain {} wait {}",
            event.time,
            event.process,
            transition_word(event.transition),
            event.arrival,
            event.total,
            event.remaining,
            event.waiting,
        );
        if let Some((ta, wta)) = event.turnaround_and_wta {
            line.push_str(&format!(" TA {ta} WTA {wta:.2}"));
        }
        let _ = writeln!(self.scheduler_log, "{line}");
        let _ = self.scheduler_log.flush();
    }

    fn memory_event(&mut self, event: MemoryEvent) {
        let word = match event.transition {
            MemoryTransition::Allocated => "allocated",
            MemoryTransition::Freed => "freed",
        };
        let _ = writeln!(
            self.memory_log,
            "At time {} {} {} bytes for process {} from {} to {}",
            event.time, word, event.bytes, event.process, event.lo, event.hi,
        );
        let _ = self.memory_log.flush();
    }

    fn run_summary(&mut self, summary: RunSummary) {
        let text = format!(
            "CPU utilization = {:.0}%\nAvg WTA = {:.2}\nAvg Waiting = {:.2}\nStd WTA = {:.2}\n",
            summary.cpu_utilization_pct, summary.avg_wta, summary.avg_waiting, summary.std_wta,
        );
        if let Ok(mut perf) = File::create(&self.perf_path) {
            let _ = perf.write_all(text.as_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_log_header_matches_spec_text() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::open(dir.path()).unwrap();
        drop(sink);
        let contents = std::fs::read_to_string(dir.path().join("scheduler.log")).unwrap();
        assert_eq!(contents.lines().next().unwrap(), SCHEDULER_LOG_HEADER);
    }

    #[test]
    fn finished_line_carries_ta_and_wta() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::open(dir.path()).unwrap();
        sink.scheduler_event(SchedulerEvent {
            time: 5,
            process: 1,
            transition: Transition::Finished,
            arrival: 0,
            total: 5,
            remaining: 0,
            waiting: 0,
            turnaround_and_wta: Some((5, 1.0)),
        });
        let contents = std::fs::read_to_string(dir.path().join("scheduler.log")).unwrap();
        let last = contents.lines().last().unwrap();
        assert_eq!(
            last,
            "At time 5 process 1 finished arr 0 total 5 remain 0 wait 0 TA 5 WTA 1.00"
        );
    }

    #[test]
    fn memory_log_uses_inclusive_hi() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::open(dir.path()).unwrap();
        sink.memory_event(MemoryEvent {
            time: 0,
            transition: MemoryTransition::Allocated,
            bytes: 64,
            process: 1,
            lo: 0,
            hi: 63,
        });
        let contents = std::fs::read_to_string(dir.path().join("memory.log")).unwrap();
        assert_eq!(contents.trim(), "At time 0 allocated 64 bytes for process 1 from 0 to 63");
    }

    #[test]
    fn perf_file_has_four_lines() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::open(dir.path()).unwrap();
        sink.run_summary(RunSummary {
            cpu_utilization_pct: 100.0,
            avg_wta: 1.0,
            avg_waiting: 0.0,
            std_wta: 0.0,
        });
        let contents = std::fs::read_to_string(dir.path().join("scheduler.perf")).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "CPU utilization = 100%");
        assert_eq!(lines[1], "Avg WTA = 1.00");
    }
}
