//! `flowdeck export`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use super::context::AppContext;

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    /// Canonical JSON rendered by the backend
    Json,

    /// Generated automation script
    Code,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Flow id or name
    pub selector: String,

    #[arg(long)]
    pub project: Option<String>,

    #[arg(long, value_enum, default_value = "json")]
    pub format: ExportFormat,

    /// Target language for code export
    #[arg(long, default_value = "python")]
    pub language: String,

    /// Write to a file instead of stdout
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

pub async fn execute(ctx: &AppContext, args: ExportArgs) -> Result<()> {
    let doc = ctx.resolve_flow(&args.selector, args.project.as_deref())?;
    let client = ctx.client()?;

    match args.format {
        ExportFormat::Json => {
            let exported = client.export_json(&doc.graph).await?;
            let body = serde_json::to_string_pretty(&exported)?;
            write_output(args.out.as_deref(), &body)?;
        }
        ExportFormat::Code => {
            let exported = client.export_code(&doc.graph, &args.language).await?;
            match args.out.as_deref() {
                Some(path) => {
                    std::fs::write(path, &exported.code)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("wrote {} ({})", path.display(), exported.filename);
                }
                None => println!("{}", exported.code),
            }
        }
    }
    Ok(())
}

fn write_output(out: Option<&std::path::Path>, body: &str) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
            println!("wrote {}", path.display());
        }
        None => println!("{body}"),
    }
    Ok(())
}
