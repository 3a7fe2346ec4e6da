//! Run statistics, computed once at termination per §4.5.

use vosim_abi::Tick;

use crate::report::RunSummary;

/// One finished job's contribution to the summary: turnaround, weighted
/// turnaround, and waiting time.
#[derive(Clone, Copy, Debug)]
pub struct FinishedJob {
    pub service_ticks: u64,
    pub turnaround: u64,
    pub wta: f64,
    pub waiting: u64,
}

pub fn summarize(finished: &[FinishedJob], final_tick: Tick) -> RunSummary {
    if finished.is_empty() || final_tick == 0 {
        return RunSummary {
            cpu_utilization_pct: 0.0,
            avg_wta: 0.0,
            avg_waiting: 0.0,
            std_wta: 0.0,
        };
    }

    let total_service: u64 = finished.iter().map(|j| j.service_ticks).sum();
    let n = finished.len() as f64;

    let avg_wta = finished.iter().map(|j| j.wta).sum::<f64>() / n;
    let avg_waiting = finished.iter().map(|j| j.waiting as f64).sum::<f64>() / n;

    let variance = finished
        .iter()
        .map(|j| {
            let delta = j.wta - avg_wta;
            delta * delta
        })
        .sum::<f64>()
        / n;

    RunSummary {
        cpu_utilization_pct: (total_service as f64 / final_tick as f64) * 100.0,
        avg_wta,
        avg_waiting,
        std_wta: variance.sqrt(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_s1_single_job() {
        let finished = [FinishedJob {
            service_ticks: 5,
            turnaround: 5,
            wta: 1.0,
            waiting: 0,
        }];
        let summary = summarize(&finished, 5);
        assert!((summary.cpu_utilization_pct - 100.0).abs() < 1e-9);
        assert!((summary.avg_wta - 1.0).abs() < 1e-9);
        assert!((summary.avg_waiting - 0.0).abs() < 1e-9);
        assert!((summary.std_wta - 0.0).abs() < 1e-9);
    }

    #[test]
    fn scenario_s2_hpf_priority() {
        let finished = [
            FinishedJob { service_ticks: 6, turnaround: 6, wta: 1.0, waiting: 0 },
            FinishedJob { service_ticks: 2, turnaround: 7, wta: 3.5, waiting: 5 },
        ];
        let summary = summarize(&finished, 8);
        assert!((summary.cpu_utilization_pct - 100.0).abs() < 1e-9);
        assert!((summary.avg_wta - 2.25).abs() < 1e-9);
        assert!((summary.avg_waiting - 2.5).abs() < 1e-9);
    }

    #[test]
    fn empty_run_has_zeroed_summary() {
        let summary = summarize(&[], 0);
        assert_eq!(summary.cpu_utilization_pct, 0.0);
    }
}
