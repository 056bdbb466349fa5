//! `flowdeck import`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use doc_store::FlowDoc;

use super::context::AppContext;

#[derive(Args)]
pub struct ImportArgs {
    /// Script or JSON file to analyze
    pub file: PathBuf,

    /// Project id or name the new flow belongs to
    #[arg(long)]
    pub project: String,

    /// Name for the imported flow (defaults to the file stem)
    #[arg(long)]
    pub name: Option<String>,
}

pub async fn execute(ctx: &AppContext, args: ImportArgs) -> Result<()> {
    let project = ctx.resolve_project(&args.project)?;
    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;

    let client = ctx.client()?;
    let analysis = client.import_analyze(&source).await?;
    for warning in &analysis.warnings {
        println!("warning: {warning}");
    }

    let name = args.name.clone().unwrap_or_else(|| {
        args.file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "imported".into())
    });
    let graph = analysis
        .into_graph(name)
        .context("analyzer proposed an invalid flow")?;

    ctx.docs.put_flow(&FlowDoc::new(project.id.clone(), graph.clone()))?;
    println!(
        "imported flow {} ({}) with {} nodes",
        graph.name,
        graph.id,
        graph.nodes.len()
    );
    Ok(())
}
