//! Wire types for the backend API

use std::collections::HashMap;

use flow_graph::{FlowEdge, FlowGraph, FlowNode, GraphError};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/actions/{type}`.
#[derive(Debug, Serialize)]
pub struct ActionRequest<'a> {
    /// The full tagged action object; the path already names the type but
    /// the backend revalidates against the body
    pub params: &'a flow_graph::ActionKind,

    /// Variables extracted earlier in the run
    pub variables: &'a HashMap<String, serde_json::Value>,
}

/// Response of `POST /api/actions/{type}`.
#[derive(Debug, Deserialize)]
pub struct ActionResponse {
    pub success: bool,

    #[serde(default)]
    pub data: Option<serde_json::Value>,

    /// Base64-encoded image, when the action captured one
    #[serde(default)]
    pub screenshot: Option<String>,

    /// `png` (default) or `jpeg`
    #[serde(default)]
    pub screenshot_format: Option<String>,

    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `POST /api/export/json`.
#[derive(Debug, Serialize)]
pub struct ExportJsonRequest<'a> {
    pub flow: &'a FlowGraph,
}

/// Body of `POST /api/export/code`.
#[derive(Debug, Serialize)]
pub struct ExportCodeRequest<'a> {
    pub flow: &'a FlowGraph,
    pub language: &'a str,
}

/// Response of `POST /api/export/code`.
#[derive(Debug, Deserialize)]
pub struct ExportCodeResponse {
    pub filename: String,
    pub code: String,
}

/// Body of `POST /api/import/analyze`.
#[derive(Debug, Serialize)]
pub struct ImportAnalyzeRequest<'a> {
    pub source: &'a str,
}

/// Response of `POST /api/import/analyze`: a proposed graph plus anything
/// the analyzer could not translate.
#[derive(Debug, Deserialize)]
pub struct ImportAnalysis {
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ImportAnalysis {
    /// Materialize the proposal as a named flow, validating structure
    /// before it is accepted into a project.
    pub fn into_graph(self, name: impl Into<String>) -> Result<FlowGraph, GraphError> {
        let mut graph = FlowGraph::new(name);
        graph.nodes = self.nodes;
        graph.edges = self.edges;
        graph.validate()?;
        Ok(graph)
    }
}
