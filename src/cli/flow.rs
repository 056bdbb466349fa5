//! `flowdeck flow` subcommands

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use doc_store::FlowDoc;
use flow_graph::FlowGraph;

use super::context::AppContext;
use super::output;

#[derive(Args)]
pub struct FlowArgs {
    #[command(subcommand)]
    pub command: FlowCommand,
}

#[derive(Subcommand)]
pub enum FlowCommand {
    /// List flows, optionally scoped to one project
    List {
        #[arg(long)]
        project: Option<String>,
    },

    /// Show a flow's nodes and wiring
    Show {
        /// Flow id or name
        selector: String,

        #[arg(long)]
        project: Option<String>,
    },

    /// Add a flow from a local canonical JSON file
    Add {
        file: PathBuf,

        /// Project id or name the flow belongs to
        #[arg(long)]
        project: String,

        /// Override the flow name from the file
        #[arg(long)]
        name: Option<String>,
    },

    /// Delete a flow and its revision log
    Delete {
        /// Flow id or name
        selector: String,

        #[arg(long)]
        project: Option<String>,
    },
}

pub fn execute(ctx: &AppContext, args: FlowArgs) -> Result<()> {
    match args.command {
        FlowCommand::List { project } => {
            let flows = match project {
                Some(project) => {
                    let project = ctx.resolve_project(&project)?;
                    ctx.docs.list_flows(&project.id)
                }
                None => ctx
                    .docs
                    .list_projects()
                    .iter()
                    .flat_map(|p| ctx.docs.list_flows(&p.id))
                    .collect(),
            };
            output::print_flows(&flows);
            Ok(())
        }
        FlowCommand::Show { selector, project } => {
            let doc = ctx.resolve_flow(&selector, project.as_deref())?;
            show_flow(&doc);
            Ok(())
        }
        FlowCommand::Add {
            file,
            project,
            name,
        } => {
            let project = ctx.resolve_project(&project)?;
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let mut graph: FlowGraph =
                serde_json::from_str(&raw).with_context(|| format!("parsing {}", file.display()))?;
            if let Some(name) = name {
                graph.name = name;
            }
            graph.validate()?;

            ctx.docs.put_flow(&FlowDoc::new(project.id.clone(), graph.clone()))?;
            println!("added flow {} ({})", graph.name, graph.id);
            Ok(())
        }
        FlowCommand::Delete { selector, project } => {
            let doc = ctx.resolve_flow(&selector, project.as_deref())?;
            ctx.docs.delete_flow(doc.id())?;
            println!("deleted flow {}", doc.id());
            Ok(())
        }
    }
}

fn show_flow(doc: &FlowDoc) {
    let graph = &doc.graph;
    println!("{} ({})", graph.name, graph.id);
    if !graph.description.is_empty() {
        println!("{}", graph.description);
    }
    println!("project: {}", doc.project);
    println!("nodes:");
    for node in &graph.nodes {
        let state = if node.enabled { "" } else { " [disabled]" };
        println!("  {}  {} <{}>{}", node.id, node.label, node.action.type_name(), state);
    }
    if graph.edges.is_empty() {
        println!("edges: none");
    } else {
        println!("edges:");
        for edge in &graph.edges {
            println!("  {} -> {}", edge.source, edge.target);
        }
    }
}
