//! `flowdeck validate`

use anyhow::{Context, Result};
use clap::Args;

use super::context::AppContext;

#[derive(Args)]
pub struct ValidateArgs {
    /// Flow id or name
    pub selector: String,

    #[arg(long)]
    pub project: Option<String>,
}

pub fn execute(ctx: &AppContext, args: ValidateArgs) -> Result<()> {
    let doc = ctx.resolve_flow(&args.selector, args.project.as_deref())?;
    let graph = &doc.graph;

    graph
        .validate()
        .with_context(|| format!("flow '{}' is structurally invalid", graph.name))?;

    let mut warnings = Vec::new();
    if graph.has_cycle() {
        warnings.push("cycle detected: execution will fall back to insertion order".to_string());
    }
    let components = graph.connected_components();
    if components.len() > 1 {
        warnings.push(format!(
            "{} disconnected groups of nodes; orphaned groups still execute",
            components.len()
        ));
    }
    if !graph.nodes.is_empty() && graph.roots().is_empty() {
        warnings.push("no entry node: every node has an incoming edge".to_string());
    }
    let disabled = graph.nodes.iter().filter(|n| !n.enabled).count();
    if disabled > 0 {
        warnings.push(format!("{disabled} node(s) disabled and will be skipped"));
    }

    println!(
        "flow '{}' is valid ({} nodes, {} edges)",
        graph.name,
        graph.nodes.len(),
        graph.edges.len()
    );
    for warning in &warnings {
        println!("warning: {warning}");
    }
    Ok(())
}
