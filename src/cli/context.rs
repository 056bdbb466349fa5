//! Shared command context

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use backend_client::BackendClient;
use doc_store::{DocStore, DocStoreConfig, FlowDoc, Project};
use shot_store::{FsShotStore, ShotStoreConfig};
use tracing::debug;

use crate::config::AppConfig;

/// Everything a command needs: configuration plus the opened stores. The
/// backend client is built on demand so offline commands never touch it.
pub struct AppContext {
    pub config: AppConfig,
    pub docs: DocStore,
    pub shots: Arc<FsShotStore>,
}

impl AppContext {
    pub fn init(config: AppConfig, data_dir_override: Option<&Path>) -> Result<Self> {
        let data_dir = config.data_dir(data_dir_override);
        debug!(data_dir = %data_dir.display(), "opening stores");

        let docs = DocStore::open(DocStoreConfig {
            root: data_dir.join("docs"),
            max_revisions: config
                .storage
                .max_revisions
                .unwrap_or_else(|| DocStoreConfig::default().max_revisions),
        })
        .context("opening document store")?;

        let shots = FsShotStore::open(ShotStoreConfig {
            root: data_dir.join("shots"),
            ttl_sec: config.shots.ttl_sec,
            max_total_bytes: config.shots.max_total_bytes,
        })
        .context("opening screenshot store")?;

        Ok(Self {
            config,
            docs,
            shots: Arc::new(shots),
        })
    }

    pub fn client(&self) -> Result<BackendClient> {
        BackendClient::new(&self.config.backend).context("building backend client")
    }

    /// Resolve a project by id or name.
    pub fn resolve_project(&self, selector: &str) -> Result<Project> {
        let projects = self.docs.list_projects();
        projects
            .iter()
            .find(|p| p.id.as_str() == selector)
            .or_else(|| projects.iter().find(|p| p.name == selector))
            .cloned()
            .ok_or_else(|| anyhow!("no project matches '{selector}'"))
    }

    /// Resolve a flow by id or name, optionally scoped to a project.
    pub fn resolve_flow(&self, selector: &str, project: Option<&str>) -> Result<FlowDoc> {
        if let Ok(doc) = self
            .docs
            .get_flow(&flowdeck_core_types::FlowId::from_string(selector))
        {
            return Ok(doc);
        }

        let candidates: Vec<FlowDoc> = match project {
            Some(project) => {
                let project = self.resolve_project(project)?;
                self.docs.list_flows(&project.id)
            }
            None => self
                .docs
                .list_projects()
                .iter()
                .flat_map(|p| self.docs.list_flows(&p.id))
                .collect(),
        };

        let mut matches = candidates
            .into_iter()
            .filter(|doc| doc.graph.name == selector);
        let first = matches
            .next()
            .ok_or_else(|| anyhow!("no flow matches '{selector}'"))?;
        if matches.next().is_some() {
            return Err(anyhow!(
                "flow name '{selector}' is ambiguous; pass --project or use the id"
            ));
        }
        Ok(first)
    }
}
