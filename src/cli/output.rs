//! Human and JSON output helpers

use clap::ValueEnum;
use doc_store::{FlowDoc, Project};
use flow_exec::{NodeRunStatus, RunEvent, RunResult};

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

pub fn print_event(event: &RunEvent, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            if let Ok(line) = serde_json::to_string(event) {
                println!("{line}");
            }
        }
        OutputFormat::Human => match event {
            RunEvent::RunStarted { flow, total_nodes, .. } => {
                println!("running flow {flow} ({total_nodes} nodes)");
            }
            RunEvent::NodeStarted { label, index, total, .. } => {
                println!("  [{}/{}] {label} ...", index + 1, total);
            }
            RunEvent::NodeRetrying { attempt, backoff_ms, .. } => {
                println!("        retry #{attempt} in {backoff_ms}ms");
            }
            RunEvent::NodeFinished { status, latency_ms, .. } => {
                println!("        {} ({latency_ms}ms)", status_label(*status));
            }
            RunEvent::RunFinished { success, .. } => {
                println!("{}", if *success { "run finished" } else { "run failed" });
            }
        },
    }
}

pub fn print_run_summary(result: &RunResult, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            if let Ok(body) = serde_json::to_string_pretty(result) {
                println!("{body}");
            }
        }
        OutputFormat::Human => {
            let succeeded = count(result, NodeRunStatus::Succeeded);
            let failed = count(result, NodeRunStatus::Failed);
            let skipped = count(result, NodeRunStatus::Skipped);
            println!(
                "\n{}: {succeeded} ok, {failed} failed, {skipped} skipped in {}ms",
                if result.success { "SUCCESS" } else { "FAILURE" },
                result.latency_ms
            );
            for node in &result.node_results {
                let mut line = format!(
                    "  {:<9} {}",
                    status_label(node.status),
                    node.label
                );
                if node.attempts > 1 {
                    line.push_str(&format!(" ({} attempts)", node.attempts));
                }
                if let Some(shot) = &node.shot {
                    line.push_str(&format!(" [shot {shot}]"));
                }
                if let Some(error) = &node.error {
                    line.push_str(&format!(" - {error}"));
                }
                println!("{line}");
            }
            if let Some(error) = &result.error {
                println!("  error: {error}");
            }
        }
    }
}

pub fn print_projects(projects: &[Project]) {
    if projects.is_empty() {
        println!("no projects");
        return;
    }
    for project in projects {
        println!(
            "{}  {:<24} updated {}",
            project.id,
            project.name,
            project.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
}

pub fn print_flows(flows: &[FlowDoc]) {
    if flows.is_empty() {
        println!("no flows");
        return;
    }
    for doc in flows {
        println!(
            "{}  {:<24} {} nodes, {} edges, saved {}",
            doc.graph.id,
            doc.graph.name,
            doc.graph.nodes.len(),
            doc.graph.edges.len(),
            doc.saved_at.format("%Y-%m-%d %H:%M")
        );
    }
}

fn status_label(status: NodeRunStatus) -> &'static str {
    match status {
        NodeRunStatus::Succeeded => "ok",
        NodeRunStatus::Failed => "FAILED",
        NodeRunStatus::Skipped => "skipped",
    }
}

fn count(result: &RunResult, status: NodeRunStatus) -> usize {
    result
        .node_results
        .iter()
        .filter(|r| r.status == status)
        .count()
}
