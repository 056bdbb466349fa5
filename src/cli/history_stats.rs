//! `flowdeck history-stats`
//!
//! Replays a flow's saved revisions through the undo-history compressor and
//! reports what the delta scheme saves over full snapshots.

use anyhow::Result;
use clap::Args;
use flow_graph::FlowGraph;
use flow_history::History;

use super::context::AppContext;

#[derive(Args)]
pub struct HistoryStatsArgs {
    /// Flow id or name
    pub selector: String,

    #[arg(long)]
    pub project: Option<String>,
}

pub fn execute(ctx: &AppContext, args: HistoryStatsArgs) -> Result<()> {
    let doc = ctx.resolve_flow(&args.selector, args.project.as_deref())?;
    let revisions = ctx.docs.list_revisions(doc.id())?;

    let mut history: History<FlowGraph> = History::new(ctx.config.history.history_config());
    for revision in &revisions {
        history.record(&revision.graph)?;
    }
    history.record(&doc.graph)?;

    let stats = history.stats();
    println!("flow '{}': {} saved revision(s)", doc.graph.name, revisions.len());
    println!("  history entries:  {}", stats.entries);
    println!("  keyframes:        {}", stats.keyframes);
    println!("  deltas:           {} ({} ops)", stats.deltas, stats.delta_ops);
    println!("  snapshot bytes:   {}", stats.snapshot_bytes);
    println!("  stored bytes:     {}", stats.stored_bytes);
    if stats.snapshot_bytes > 0 {
        let saved = stats.snapshot_bytes.saturating_sub(stats.stored_bytes);
        println!(
            "  savings:          {saved} bytes ({:.1}%)",
            saved as f64 * 100.0 / stats.snapshot_bytes as f64
        );
    }
    Ok(())
}
