//! `flowdeck project` subcommands

use anyhow::Result;
use clap::{Args, Subcommand};
use doc_store::Project;

use super::context::AppContext;
use super::output;

#[derive(Args)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub command: ProjectCommand,
}

#[derive(Subcommand)]
pub enum ProjectCommand {
    /// List projects, most recently updated first
    List,

    /// Create a new project
    Create {
        name: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a project (refuses while flows remain unless --cascade)
    Delete {
        /// Project id or name
        selector: String,

        /// Also delete the project's flows
        #[arg(long)]
        cascade: bool,
    },
}

pub fn execute(ctx: &AppContext, args: ProjectArgs) -> Result<()> {
    match args.command {
        ProjectCommand::List => {
            output::print_projects(&ctx.docs.list_projects());
            Ok(())
        }
        ProjectCommand::Create { name, description } => {
            let mut project = Project::new(name);
            if let Some(description) = description {
                project = project.with_description(description);
            }
            ctx.docs.put_project(&project)?;
            println!("created project {}", project.id);
            Ok(())
        }
        ProjectCommand::Delete { selector, cascade } => {
            let project = ctx.resolve_project(&selector)?;
            ctx.docs.delete_project(&project.id, cascade)?;
            println!("deleted project {}", project.id);
            Ok(())
        }
    }
}
