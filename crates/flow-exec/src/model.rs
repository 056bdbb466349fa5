//! Run result and progress event types

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use flowdeck_core_types::{FlowId, NodeId, RunId, ShotId};
use serde::{Deserialize, Serialize};

/// Terminal state of a single node within a run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRunStatus {
    Succeeded,
    Failed,
    Skipped,
}

/// Outcome of one node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeRunResult {
    /// Node identifier
    pub node: NodeId,

    /// Node label at execution time
    pub label: String,

    /// Terminal status
    pub status: NodeRunStatus,

    /// Backend attempts made (0 for skipped nodes)
    pub attempts: u32,

    /// Start time
    pub started_at: DateTime<Utc>,

    /// Finish time
    pub finished_at: DateTime<Utc>,

    /// Latency in milliseconds
    pub latency_ms: u64,

    /// Structured payload from the backend
    pub data: Option<serde_json::Value>,

    /// Persisted screenshot, if the action captured one
    pub shot: Option<ShotId>,

    /// Error message when failed
    pub error: Option<String>,
}

impl NodeRunResult {
    pub fn new(node: NodeId, label: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            node,
            label: label.into(),
            status: NodeRunStatus::Skipped,
            attempts: 0,
            started_at: now,
            finished_at: now,
            latency_ms: 0,
            data: None,
            shot: None,
            error: None,
        }
    }

    pub fn with_success(mut self) -> Self {
        self.status = NodeRunStatus::Succeeded;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.status = NodeRunStatus::Failed;
        self.error = Some(error.into());
        self
    }

    pub fn skipped(mut self) -> Self {
        self.status = NodeRunStatus::Skipped;
        self
    }

    pub fn with_data(mut self, data: Option<serde_json::Value>) -> Self {
        self.data = data;
        self
    }

    /// Set finish time and derive latency.
    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self.latency_ms = (self.finished_at - self.started_at).num_milliseconds() as u64;
        self
    }
}

/// Outcome of a whole run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunResult {
    /// Run identifier
    pub run: RunId,

    /// Flow executed
    pub flow: FlowId,

    /// True when no node failed and the run was not cancelled
    pub success: bool,

    /// Start time
    pub started_at: DateTime<Utc>,

    /// Finish time
    pub finished_at: DateTime<Utc>,

    /// Total latency in milliseconds
    pub latency_ms: u64,

    /// Per-node outcomes in execution order
    pub node_results: Vec<NodeRunResult>,

    /// Variables extracted during the run
    pub variables: HashMap<String, serde_json::Value>,

    /// Run-level error, if any
    pub error: Option<String>,
}

impl RunResult {
    pub fn new(run: RunId, flow: FlowId) -> Self {
        let now = Utc::now();
        Self {
            run,
            flow,
            success: false,
            started_at: now,
            finished_at: now,
            latency_ms: 0,
            node_results: Vec::new(),
            variables: HashMap::new(),
            error: None,
        }
    }

    pub fn with_success(mut self) -> Self {
        self.success = true;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }

    /// Set finish time and derive latency.
    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self.latency_ms = (self.finished_at - self.started_at).num_milliseconds() as u64;
        self
    }
}

/// Progress stream consumed by observers (the CLI progress printer).
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    RunStarted {
        run: RunId,
        flow: FlowId,
        total_nodes: usize,
    },
    NodeStarted {
        node: NodeId,
        label: String,
        index: usize,
        total: usize,
    },
    NodeRetrying {
        node: NodeId,
        attempt: u32,
        backoff_ms: u64,
    },
    NodeFinished {
        node: NodeId,
        status: NodeRunStatus,
        latency_ms: u64,
    },
    RunFinished {
        run: RunId,
        success: bool,
    },
}
