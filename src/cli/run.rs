//! `flowdeck run`

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Args;
use flow_exec::FlowRunner;
use shot_store::ShotStore;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::context::AppContext;
use super::output::{self, OutputFormat};

#[derive(Args)]
pub struct RunArgs {
    /// Flow id or name
    pub selector: String,

    #[arg(long)]
    pub project: Option<String>,

    /// Keep executing after a node fails
    #[arg(long)]
    pub continue_on_failure: bool,

    /// Whole-flow timeout, e.g. "90s" or "5m"
    #[arg(long)]
    pub timeout: Option<humantime::Duration>,

    /// Skip persisting screenshots
    #[arg(long)]
    pub no_screenshots: bool,

    #[arg(long, value_enum, default_value = "human")]
    pub output: OutputFormat,
}

pub async fn execute(ctx: &AppContext, args: RunArgs) -> Result<()> {
    let doc = ctx.resolve_flow(&args.selector, args.project.as_deref())?;

    let mut options = ctx.config.run.run_options();
    if args.continue_on_failure {
        options.stop_on_failure = false;
    }
    if let Some(timeout) = args.timeout {
        options.timeout = timeout.into();
    }
    if args.no_screenshots {
        options.capture_screenshots = false;
    }

    let backend = Arc::new(ctx.client()?);
    let (events_tx, mut events_rx) = mpsc::channel(64);
    let runner = FlowRunner::new(backend)
        .with_shots(ctx.shots.clone())
        .with_events(events_tx);

    // Ctrl-c requests a clean stop; the runner finishes the current node
    // and marks the rest skipped.
    let cancel = runner.cancellation_token();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current node");
            cancel.cancel();
        }
    });

    let format = args.output;
    let printer = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            output::print_event(&event, format);
        }
    });

    let result = runner.run(&doc.graph, &options).await?;
    // The runner holds the event sender; drop it so the printer can drain
    // to completion.
    drop(runner);
    let _ = printer.await;

    // Retention housekeeping rides along with runs.
    match ctx.shots.sweep().await {
        Ok(stats) if stats.expired + stats.evicted > 0 => {
            debug!(
                expired = stats.expired,
                evicted = stats.evicted,
                "swept screenshot store"
            );
        }
        Ok(_) => {}
        Err(err) => warn!(error = %err, "screenshot sweep failed"),
    }

    output::print_run_summary(&result, format);
    if !result.success {
        bail!("run failed");
    }
    Ok(())
}
