//! Fs-backed document store with an in-memory index

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use flowdeck_core_types::{FlowId, ProjectId};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::DocStoreConfig;
use crate::errors::DocError;
use crate::metrics::DocMetrics;
use crate::model::{FlowDoc, Project};

pub type DocResult<T> = Result<T, DocError>;

#[derive(Default)]
struct DocIndex {
    projects: HashMap<String, Project>,
    flows: HashMap<String, FlowDoc>,
}

/// Document store over a data root directory.
pub struct DocStore {
    cfg: DocStoreConfig,
    metrics: DocMetrics,
    index: RwLock<DocIndex>,
}

impl DocStore {
    /// Open the store, creating the layout if missing and rebuilding the
    /// index from disk. Corrupt documents are skipped with a warning so one
    /// bad file cannot take the whole store down.
    pub fn open(cfg: DocStoreConfig) -> DocResult<Self> {
        let store = Self {
            cfg,
            metrics: DocMetrics::default(),
            index: RwLock::new(DocIndex::default()),
        };
        fs::create_dir_all(store.projects_dir())?;
        fs::create_dir_all(store.flows_dir())?;
        fs::create_dir_all(store.revisions_root())?;
        store.scan()?;
        Ok(store)
    }

    pub fn metrics(&self) -> &DocMetrics {
        &self.metrics
    }

    // Layout helpers

    fn projects_dir(&self) -> PathBuf {
        self.cfg.root.join("projects")
    }

    fn flows_dir(&self) -> PathBuf {
        self.cfg.root.join("flows")
    }

    fn revisions_root(&self) -> PathBuf {
        self.cfg.root.join("revisions")
    }

    fn project_path(&self, id: &ProjectId) -> PathBuf {
        self.projects_dir().join(format!("{}.json", id.0))
    }

    fn flow_path(&self, id: &FlowId) -> PathBuf {
        self.flows_dir().join(format!("{}.json", id.0))
    }

    fn revisions_dir(&self, id: &FlowId) -> PathBuf {
        self.revisions_root().join(&id.0)
    }

    fn scan(&self) -> DocResult<()> {
        let mut index = self.index.write();
        for (path, project) in self.load_dir::<Project>(&self.projects_dir())? {
            debug!(path = %path.display(), "indexed project");
            index.projects.insert(project.id.0.clone(), project);
        }
        for (path, doc) in self.load_dir::<FlowDoc>(&self.flows_dir())? {
            debug!(path = %path.display(), "indexed flow");
            index.flows.insert(doc.id().0.clone(), doc);
        }
        Ok(())
    }

    fn load_dir<T: DeserializeOwned>(&self, dir: &Path) -> DocResult<Vec<(PathBuf, T)>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            match read_doc::<T>(&path) {
                Ok(doc) => out.push((path, doc)),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping corrupt document");
                    self.metrics.record_corrupt_skipped();
                }
            }
        }
        Ok(out)
    }

    // Projects

    pub fn put_project(&self, project: &Project) -> DocResult<()> {
        write_doc(&self.project_path(&project.id), project)?;
        self.index
            .write()
            .projects
            .insert(project.id.0.clone(), project.clone());
        self.metrics.record_write();
        Ok(())
    }

    pub fn get_project(&self, id: &ProjectId) -> DocResult<Project> {
        self.index
            .read()
            .projects
            .get(&id.0)
            .cloned()
            .ok_or_else(|| DocError::NotFound(format!("project {id}")))
    }

    /// All projects, most recently updated first.
    pub fn list_projects(&self) -> Vec<Project> {
        let mut projects: Vec<Project> = self.index.read().projects.values().cloned().collect();
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        projects
    }

    /// Delete a project. Refuses while flows remain unless `cascade`.
    pub fn delete_project(&self, id: &ProjectId, cascade: bool) -> DocResult<()> {
        self.get_project(id)?;
        let flow_ids: Vec<FlowId> = self
            .index
            .read()
            .flows
            .values()
            .filter(|doc| &doc.project == id)
            .map(|doc| doc.id().clone())
            .collect();
        if !flow_ids.is_empty() && !cascade {
            return Err(DocError::Conflict(format!(
                "project {id} still has {} flow(s)",
                flow_ids.len()
            )));
        }
        for flow_id in flow_ids {
            self.delete_flow(&flow_id)?;
        }
        fs::remove_file(self.project_path(id))?;
        self.index.write().projects.remove(&id.0);
        self.metrics.record_delete();
        Ok(())
    }

    // Flows

    /// Persist a flow. The previous stored version, if any, is appended to
    /// the flow's revision log before being replaced.
    pub fn put_flow(&self, doc: &FlowDoc) -> DocResult<()> {
        self.get_project(&doc.project)?;

        let previous = self.index.read().flows.get(&doc.id().0).cloned();
        if let Some(previous) = previous {
            self.append_revision(&previous)?;
        }

        write_doc(&self.flow_path(doc.id()), doc)?;
        self.index
            .write()
            .flows
            .insert(doc.id().0.clone(), doc.clone());
        self.metrics.record_write();
        Ok(())
    }

    pub fn get_flow(&self, id: &FlowId) -> DocResult<FlowDoc> {
        self.index
            .read()
            .flows
            .get(&id.0)
            .cloned()
            .ok_or_else(|| DocError::NotFound(format!("flow {id}")))
    }

    /// Flows in a project, most recently saved first.
    pub fn list_flows(&self, project: &ProjectId) -> Vec<FlowDoc> {
        let mut flows: Vec<FlowDoc> = self
            .index
            .read()
            .flows
            .values()
            .filter(|doc| &doc.project == project)
            .cloned()
            .collect();
        flows.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        flows
    }

    pub fn delete_flow(&self, id: &FlowId) -> DocResult<()> {
        self.get_flow(id)?;
        fs::remove_file(self.flow_path(id))?;
        let revisions = self.revisions_dir(id);
        if revisions.exists() {
            fs::remove_dir_all(&revisions)?;
        }
        self.index.write().flows.remove(&id.0);
        self.metrics.record_delete();
        Ok(())
    }

    // Revisions

    fn append_revision(&self, doc: &FlowDoc) -> DocResult<()> {
        let dir = self.revisions_dir(doc.id());
        fs::create_dir_all(&dir)?;
        let seq = revision_files(&dir)?
            .last()
            .and_then(|name| parse_seq(name))
            .unwrap_or(0)
            + 1;
        write_doc(&dir.join(format!("rev_{seq:06}.json")), doc)?;
        self.prune_revisions(&dir)?;
        Ok(())
    }

    fn prune_revisions(&self, dir: &Path) -> DocResult<()> {
        let files = revision_files(dir)?;
        if files.len() <= self.cfg.max_revisions {
            return Ok(());
        }
        for name in &files[..files.len() - self.cfg.max_revisions] {
            fs::remove_file(dir.join(name))?;
        }
        Ok(())
    }

    /// Prior versions of a flow, oldest first. Corrupt revisions are
    /// skipped the same way corrupt documents are on open.
    pub fn list_revisions(&self, id: &FlowId) -> DocResult<Vec<FlowDoc>> {
        let dir = self.revisions_dir(id);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for name in revision_files(&dir)? {
            let path = dir.join(&name);
            match read_doc::<FlowDoc>(&path) {
                Ok(doc) => out.push(doc),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping corrupt revision");
                    self.metrics.record_corrupt_skipped();
                }
            }
        }
        Ok(out)
    }
}

/// Revision file names in a directory, sorted ascending. The zero-padded
/// sequence makes lexical order equal numeric order.
fn revision_files(dir: &Path) -> DocResult<Vec<String>> {
    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with("rev_") && name.ends_with(".json"))
        .collect();
    names.sort();
    Ok(names)
}

fn parse_seq(name: &str) -> Option<u64> {
    name.strip_prefix("rev_")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

fn read_doc<T: DeserializeOwned>(path: &Path) -> DocResult<T> {
    let data = fs::read(path)?;
    serde_json::from_slice(&data).map_err(|err| DocError::Corrupt {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
}

fn write_doc<T: Serialize>(path: &Path, doc: &T) -> DocResult<()> {
    let data = serde_json::to_vec_pretty(doc).map_err(|err| DocError::Io(err.to_string()))?;
    write_atomic(path, &data)
}

fn write_atomic(path: &Path, data: &[u8]) -> DocResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(tmp, path)?;
    Ok(())
}
