//! Concurrent executor: runs every adapter task of one request in parallel.
//!
//! Tasks live in a request-scoped [`JoinSet`], so nothing outlives the call
//! and no worker pool is shared between requests. A panic inside an adapter
//! surfaces as a [`JoinError`] for that task only; the task id maps it back
//! to the adapter and arguments it ran with. Failures are logged and
//! contribute no records.

use std::collections::HashMap;

use tokio::task::{Id, JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::dispatch::AdapterTask;
use crate::record::LinkRecord;
use crate::source::{AdapterSet, SourceError};

/// Everything one execution produced.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    /// Records from every successful task, in completion order.
    pub records: Vec<LinkRecord>,
    /// Tasks that returned records (possibly zero).
    pub completed: usize,
    /// Tasks that failed, panicked, or had no registered adapter.
    pub failed: usize,
}

type FetchOutcome = Result<Result<Vec<LinkRecord>, SourceError>, JoinError>;

/// Runs all `tasks` concurrently and collects their records.
///
/// Never fails: per-task errors are logged and counted.
#[tracing::instrument(skip_all, fields(tasks = tasks.len()))]
pub async fn execute(adapters: &AdapterSet, tasks: Vec<AdapterTask>) -> ExecutionReport {
    let mut report = ExecutionReport::default();
    if tasks.is_empty() {
        return report;
    }

    let mut running: JoinSet<Result<Vec<LinkRecord>, SourceError>> = JoinSet::new();
    let mut pending: HashMap<Id, AdapterTask> = HashMap::with_capacity(tasks.len());
    for task in tasks {
        let Some(adapter) = adapters.get(task.adapter) else {
            warn!(
                adapter = %task.adapter,
                query = %task.query,
                "no adapter registered; task skipped"
            );
            report.failed += 1;
            continue;
        };
        debug!(adapter = %task.adapter, query = %task.query, "scheduling adapter task");
        let call_task = task.clone();
        let handle = running.spawn(async move { adapter.fetch(&call_task).await });
        pending.insert(handle.id(), task);
    }

    while let Some(joined) = running.join_next_with_id().await {
        let (id, outcome): (Id, FetchOutcome) = match joined {
            Ok((id, result)) => (id, Ok(result)),
            Err(join_error) => (join_error.id(), Err(join_error)),
        };
        let Some(task) = pending.remove(&id) else {
            continue;
        };
        record_outcome(&mut report, &task, outcome);
    }

    info!(
        completed = report.completed,
        failed = report.failed,
        records = report.records.len(),
        "all adapter tasks finished"
    );
    report
}

fn record_outcome(report: &mut ExecutionReport, task: &AdapterTask, outcome: FetchOutcome) {
    match outcome {
        Ok(Ok(records)) => {
            info!(
                adapter = %task.adapter,
                links = records.len(),
                "adapter finished"
            );
            report.completed += 1;
            report.records.extend(records);
        }
        Ok(Err(error)) => {
            warn!(
                adapter = %task.adapter,
                query = %task.query,
                version = ?task.version,
                architecture = ?task.architecture,
                error = %error,
                "adapter failed; continuing without its results"
            );
            report.failed += 1;
        }
        Err(join_error) => {
            error!(
                adapter = %task.adapter,
                query = %task.query,
                version = ?task.version,
                architecture = ?task.architecture,
                error = %join_error,
                "adapter task panicked"
            );
            report.failed += 1;
        }
    }
}
