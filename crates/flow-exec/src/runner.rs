//! Sequential flow runner

use std::collections::HashMap;
use std::sync::Arc;

use flow_graph::{ActionKind, FlowGraph, FlowNode};
use flowdeck_core_types::RunId;
use shot_store::ShotStore;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::ActionBackend;
use crate::errors::ExecError;
use crate::model::{NodeRunResult, NodeRunStatus, RunEvent, RunResult};
use crate::retry::RetryPolicy;

/// Knobs for one run.
#[derive(Clone, Debug)]
pub struct RunOptions {
    /// Whole-flow deadline
    pub timeout: Duration,

    /// Per-node retry behaviour
    pub retry: RetryPolicy,

    /// Abort remaining nodes after the first failure (they are recorded as
    /// skipped); off means every node gets its chance
    pub stop_on_failure: bool,

    /// Persist screenshots returned by the backend
    pub capture_screenshots: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            retry: RetryPolicy::default(),
            stop_on_failure: true,
            capture_screenshots: true,
        }
    }
}

/// State threaded through a run and visible to the backend.
#[derive(Clone, Debug)]
pub struct RunContext {
    pub run: RunId,

    /// Variables extracted so far (`extract_text` writes them)
    pub variables: HashMap<String, serde_json::Value>,

    /// Whether the previous executed node succeeded
    pub previous_success: bool,
}

impl RunContext {
    pub fn new(run: RunId) -> Self {
        Self {
            run,
            variables: HashMap::new(),
            previous_success: true,
        }
    }
}

/// Executes flows one node at a time against an [`ActionBackend`].
pub struct FlowRunner {
    backend: Arc<dyn ActionBackend>,
    shots: Option<Arc<dyn ShotStore>>,
    events: Option<mpsc::Sender<RunEvent>>,
    cancel: CancellationToken,
}

impl FlowRunner {
    pub fn new(backend: Arc<dyn ActionBackend>) -> Self {
        Self {
            backend,
            shots: None,
            events: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Persist screenshots through this store.
    pub fn with_shots(mut self, shots: Arc<dyn ShotStore>) -> Self {
        self.shots = Some(shots);
        self
    }

    /// Stream progress events to this channel.
    pub fn with_events(mut self, events: mpsc::Sender<RunEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Use an external cancellation token. Cancellation is honoured between
    /// nodes; an in-flight backend call is never interrupted.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Execute `graph` to completion or until the flow timeout elapses.
    pub async fn run(&self, graph: &FlowGraph, options: &RunOptions) -> Result<RunResult, ExecError> {
        graph
            .validate()
            .map_err(|e| ExecError::InvalidFlow(e.to_string()))?;

        info!(flow = %graph.id, name = %graph.name, "executing flow");
        match timeout(options.timeout, self.run_inner(graph, options)).await {
            Ok(result) => Ok(result),
            Err(_) => {
                warn!(flow = %graph.id, "flow timed out after {:?}", options.timeout);
                Err(ExecError::Timeout(options.timeout))
            }
        }
    }

    async fn run_inner(&self, graph: &FlowGraph, options: &RunOptions) -> RunResult {
        let run_id = RunId::new();
        let mut ctx = RunContext::new(run_id.clone());
        let mut result = RunResult::new(run_id.clone(), graph.id.clone());

        if graph.has_cycle() {
            warn!(flow = %graph.id, "flow contains a cycle; nodes run in insertion order");
        }
        let order = graph.execution_order();
        let total = order.len();

        self.emit(RunEvent::RunStarted {
            run: run_id.clone(),
            flow: graph.id.clone(),
            total_nodes: total,
        })
        .await;

        let mut aborted: Option<String> = None;
        for (index, node_id) in order.iter().enumerate() {
            let Some(node) = graph.node(node_id) else {
                // Unreachable after validate(); recorded rather than panicking.
                aborted = Some(format!("node {node_id} missing from graph"));
                continue;
            };

            if aborted.is_none() && self.cancel.is_cancelled() {
                info!(flow = %graph.id, "run cancelled");
                aborted = Some("run cancelled".to_string());
            }

            if !node.enabled || aborted.is_some() {
                let skipped = NodeRunResult::new(node.id.clone(), node.label.clone())
                    .skipped()
                    .finish();
                self.emit(RunEvent::NodeFinished {
                    node: skipped.node.clone(),
                    status: skipped.status,
                    latency_ms: skipped.latency_ms,
                })
                .await;
                result.node_results.push(skipped);
                continue;
            }

            self.emit(RunEvent::NodeStarted {
                node: node.id.clone(),
                label: node.label.clone(),
                index,
                total,
            })
            .await;

            let node_result = self.execute_node(node, &mut ctx, options).await;
            ctx.previous_success = node_result.status == NodeRunStatus::Succeeded;

            if node_result.status == NodeRunStatus::Failed && options.stop_on_failure {
                aborted = Some(format!(
                    "node '{}' failed: {}",
                    node.label,
                    node_result.error.as_deref().unwrap_or("unknown error")
                ));
            }

            self.emit(RunEvent::NodeFinished {
                node: node_result.node.clone(),
                status: node_result.status,
                latency_ms: node_result.latency_ms,
            })
            .await;
            result.node_results.push(node_result);
        }

        let any_failed = result
            .node_results
            .iter()
            .any(|r| r.status == NodeRunStatus::Failed);

        result.variables = ctx.variables;
        let mut finished = result.finish();
        if let Some(reason) = aborted {
            finished = finished.with_error(reason);
        } else if any_failed {
            finished = finished.with_error("some nodes failed");
        } else {
            finished = finished.with_success();
        }

        self.emit(RunEvent::RunFinished {
            run: run_id,
            success: finished.success,
        })
        .await;
        finished
    }

    /// Execute one node with the retry loop around the backend call.
    async fn execute_node(
        &self,
        node: &FlowNode,
        ctx: &mut RunContext,
        options: &RunOptions,
    ) -> NodeRunResult {
        debug!(node = %node.id, label = %node.label, "executing node");
        let mut result = NodeRunResult::new(node.id.clone(), node.label.clone());
        let mut attempt = 1u32;

        loop {
            match self.backend.execute(&node.action, ctx).await {
                Ok(outcome) => {
                    if let ActionKind::ExtractText { variable, .. } = &node.action {
                        let text = outcome
                            .data
                            .as_ref()
                            .and_then(|d| d.get("text"))
                            .cloned()
                            .unwrap_or(serde_json::Value::Null);
                        ctx.variables.insert(variable.clone(), text);
                    }

                    if options.capture_screenshots {
                        if let (Some(store), Some(shot)) = (&self.shots, outcome.screenshot.as_ref())
                        {
                            match store
                                .put(&ctx.run, &node.id, shot.format, shot.bytes.clone())
                                .await
                            {
                                Ok(id) => result.shot = Some(id),
                                Err(err) => {
                                    warn!(node = %node.id, error = %err, "failed to persist screenshot");
                                }
                            }
                        }
                    }

                    result.attempts = attempt;
                    return result.with_data(outcome.data).with_success().finish();
                }
                Err(err) => {
                    if options.retry.should_retry(&err, attempt) {
                        let backoff = options.retry.backoff(attempt);
                        info!(
                            node = %node.id,
                            attempt,
                            backoff_ms = backoff.as_millis() as u64,
                            error = %err,
                            "node failed, retrying after backoff"
                        );
                        self.emit(RunEvent::NodeRetrying {
                            node: node.id.clone(),
                            attempt,
                            backoff_ms: backoff.as_millis() as u64,
                        })
                        .await;
                        sleep(backoff).await;
                        attempt += 1;
                        continue;
                    }

                    warn!(node = %node.id, attempt, error = %err, "node failed");
                    result.attempts = attempt;
                    return result.with_error(err.to_string()).finish();
                }
            }
        }
    }

    async fn emit(&self, event: RunEvent) {
        if let Some(events) = &self.events {
            // A dropped receiver only means nobody is watching.
            let _ = events.send(event).await;
        }
    }
}
