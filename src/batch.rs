//! Batch execution
//!
//! Scenarios run in parallel on a rayon pool. Each worker builds its own
//! simulation from the scenario data, so runs share nothing. A run that trips
//! an engine invariant panics; the panic is caught here and only that
//! scenario is reported as aborted.

use std::panic::{self, AssertUnwindSafe};

use anyhow::{Context, Result};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{error, info};

use reactor_core::Frame;

use crate::report::ScenarioReport;
use crate::scenario::Scenario;

/// Worker pool size for a batch
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerPool {
    /// Number of worker threads. If 0, use the rayon default (one per core).
    pub workers: usize,
}

impl WorkerPool {
    pub fn with_workers(workers: usize) -> Self {
        Self { workers }
    }

    /// Run `f` on a pool of this size
    pub fn install<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            return Ok(f());
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("reactor-worker-{i}"))
            .build()
            .context("Failed to build worker pool")?;
        Ok(pool.install(f))
    }
}

/// Run every scenario, keeping input order in the output
pub fn run_batch(
    scenarios: &[Scenario],
    pool: WorkerPool,
    default_frames: Frame,
) -> Result<Vec<ScenarioReport>> {
    info!(
        "Running {} scenario(s) on {} worker(s)",
        scenarios.len(),
        if pool.workers == 0 {
            rayon::current_num_threads()
        } else {
            pool.workers
        }
    );
    pool.install(|| {
        scenarios
            .par_iter()
            .map(|scenario| run_isolated(scenario, default_frames))
            .collect()
    })
}

/// Run one scenario, turning an engine panic into an aborted report
pub fn run_isolated(scenario: &Scenario, default_frames: Frame) -> ScenarioReport {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| run_scenario(scenario, default_frames)));
    match outcome {
        Ok(report) => report,
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            error!("scenario '{}' aborted: {reason}", scenario.name);
            ScenarioReport::aborted(&scenario.name, scenario.seed, reason)
        }
    }
}

fn run_scenario(scenario: &Scenario, default_frames: Frame) -> ScenarioReport {
    let mut sim = match scenario.build() {
        Ok(sim) => sim,
        Err(e) => {
            error!("{e}");
            return ScenarioReport::failed(&scenario.name, scenario.seed, e.to_string());
        }
    };
    sim.run_until(scenario.duration(default_frames));
    ScenarioReport::completed(&scenario.name, scenario.seed, &sim)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RunStatus;
    use reactor_combat::{Attributes, EntitySpec};

    fn scenario(name: &str, seed: u64) -> Scenario {
        let mut hero = EntitySpec::new("Hero");
        hero.attributes = Attributes::new(1000.0, 10000.0, 500.0);
        hero.attributes.crit_rate = 0.5;
        let mut dummy = EntitySpec::new("Dummy").with_uniform_resistance(0.1);
        dummy.team = 1;
        dummy.attributes = Attributes::new(0.0, 1_000_000.0, 500.0);

        let mut scenario: Scenario = toml::from_str(
            r#"
[[attacks]]
frame = 0
name = "Strike"
source = "Hero"
target = "Dummy"
repeat = 10
interval = 6
"#,
        )
        .unwrap();
        scenario.name = name.to_string();
        scenario.seed = seed;
        scenario.duration_frames = Some(120);
        scenario.entities = vec![hero, dummy];
        scenario
    }

    #[test]
    fn test_batch_keeps_order_and_is_deterministic() {
        let scenarios: Vec<Scenario> = (0..6).map(|i| scenario(&format!("s{i}"), i % 2)).collect();
        let reports = run_batch(&scenarios, WorkerPool::with_workers(3), 600).unwrap();

        let names: Vec<&str> = reports.iter().map(|r| r.scenario.as_str()).collect();
        assert_eq!(names, vec!["s0", "s1", "s2", "s3", "s4", "s5"]);
        assert!(reports.iter().all(|r| r.status == RunStatus::Completed));
        assert_eq!(reports[0].hits, reports[2].hits);
        assert_eq!(reports[1].hits, reports[3].hits);
    }

    #[test]
    fn test_build_failure_is_reported() {
        let mut broken = scenario("broken", 0);
        broken.attacks[0].source = "Ghost".to_string();
        let report = run_isolated(&broken, 600);
        assert!(matches!(report.status, RunStatus::Failed { .. }));
    }

    #[test]
    fn test_invariant_panic_aborts_only_that_scenario() {
        let mut broken = scenario("broken", 0);
        broken.entities[0].attributes.attack = f64::INFINITY;
        let scenarios = vec![broken, scenario("healthy", 0)];

        let reports = run_batch(&scenarios, WorkerPool::with_workers(2), 600).unwrap();
        match &reports[0].status {
            RunStatus::Aborted { reason } => assert!(reason.contains("non-finite")),
            other => panic!("expected an aborted run, got {other:?}"),
        }
        assert!(reports[0].hits.is_empty());
        assert_eq!(reports[1].status, RunStatus::Completed);
        assert_eq!(reports[1].hits.len(), 10);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
