//! In-memory [`ContainerRuntime`] for tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use serde_json::json;

use super::runtime::{ContainerRuntime, PullStream};
use super::types::{
    ContainerHandle, ContainerSnapshot, CreateContainerRequest, ImageSummary, PullProgress,
};
use crate::error::RuntimeError;

type ProgressItem = Result<PullProgress, RuntimeError>;

struct FakeContainer {
    name: String,
    image: String,
    running: bool,
    status: &'static str,
    logs: Vec<u8>,
}

#[derive(Default)]
struct FakeState {
    next_id: usize,
    containers: BTreeMap<String, FakeContainer>,
    images: BTreeMap<String, i64>,
    failure: Option<RuntimeError>,
    pull_progress: Option<UnboundedReceiver<ProgressItem>>,
    pulled: Vec<String>,
}

#[derive(Default)]
pub(crate) struct FakeRuntime {
    state: Mutex<FakeState>,
}

impl FakeRuntime {
    pub(crate) const VERSION: &'static str = "27.1.1";

    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a container directly, bypassing create. Returns its id.
    pub(crate) fn add_container(&self, image: &str, running: bool) -> String {
        let mut state = self.state.lock();
        let id = next_id(&mut state);
        let name = format!("fake_{}", state.next_id);
        state.containers.insert(
            id.clone(),
            FakeContainer {
                name,
                image: image.to_string(),
                running,
                status: if running { "running" } else { "exited" },
                logs: Vec::new(),
            },
        );
        id
    }

    pub(crate) fn add_image(&self, reference: &str, size: i64) {
        self.state.lock().images.insert(reference.to_string(), size);
    }

    pub(crate) fn set_logs(&self, id: &str, logs: &[u8]) {
        if let Some(container) = self.state.lock().containers.get_mut(id) {
            container.logs = logs.to_vec();
        }
    }

    /// Make the next runtime call fail with `error`.
    pub(crate) fn fail_next(&self, error: RuntimeError) {
        self.state.lock().failure = Some(error);
    }

    /// Hand the next pull's progress stream to the caller. The pull completes
    /// when the returned sender is dropped.
    pub(crate) fn prepare_pull(&self) -> UnboundedSender<ProgressItem> {
        let (tx, rx) = mpsc::unbounded();
        self.state.lock().pull_progress = Some(rx);
        tx
    }

    pub(crate) fn pulled(&self) -> Vec<String> {
        self.state.lock().pulled.clone()
    }

    pub(crate) fn container_count(&self) -> usize {
        self.state.lock().containers.len()
    }

    fn take_failure(&self) -> Result<(), RuntimeError> {
        match self.state.lock().failure.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn with_container<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut FakeContainer) -> Result<T, RuntimeError>,
    ) -> Result<T, RuntimeError> {
        self.take_failure()?;
        let mut state = self.state.lock();
        let container = state
            .containers
            .get_mut(id)
            .ok_or_else(|| RuntimeError::NotFound(format!("No such container: {id}")))?;
        f(container)
    }
}

fn next_id(state: &mut FakeState) -> String {
    state.next_id += 1;
    format!("{:012x}", 0xc0ffee00_u64 + state.next_id as u64)
}

fn not_modified() -> RuntimeError {
    RuntimeError::Conflict("container is already in the requested state".to_string())
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn version(&self) -> Result<String, RuntimeError> {
        self.take_failure()?;
        Ok(Self::VERSION.to_string())
    }

    async fn create_container(
        &self,
        request: &CreateContainerRequest,
    ) -> Result<ContainerHandle, RuntimeError> {
        self.take_failure()?;
        let mut state = self.state.lock();
        let id = next_id(&mut state);
        let name = request
            .name
            .clone()
            .unwrap_or_else(|| format!("fake_{}", state.next_id));
        state.containers.insert(
            id.clone(),
            FakeContainer {
                name,
                image: request.image.clone(),
                running: false,
                status: "created",
                logs: Vec::new(),
            },
        );
        Ok(ContainerHandle {
            id,
            warnings: Vec::new(),
        })
    }

    async fn start_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.with_container(id, |c| {
            if c.running {
                return Err(not_modified());
            }
            c.running = true;
            c.status = "running";
            Ok(())
        })
    }

    async fn stop_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.with_container(id, |c| {
            if !c.running {
                return Err(not_modified());
            }
            c.running = false;
            c.status = "exited";
            Ok(())
        })
    }

    async fn restart_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.with_container(id, |c| {
            c.running = true;
            c.status = "running";
            Ok(())
        })
    }

    async fn remove_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.with_container(id, |c| {
            if c.running {
                return Err(RuntimeError::Conflict(format!(
                    "You cannot remove a running container {id}. Stop the container before attempting removal"
                )));
            }
            Ok(())
        })?;
        self.state.lock().containers.remove(id);
        Ok(())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerSnapshot, RuntimeError> {
        self.with_container(id, |c| {
            Ok(ContainerSnapshot {
                id: id.to_string(),
                name: c.name.clone(),
                image: c.image.clone(),
                status: c.status.to_string(),
                running: c.running,
                config: json!({ "Image": c.image }),
                network: json!({ "Networks": {} }),
            })
        })
    }

    async fn container_logs(&self, id: &str) -> Result<Bytes, RuntimeError> {
        self.with_container(id, |c| Ok(Bytes::from(c.logs.clone())))
    }

    async fn pull_image(&self, reference: &str) -> Result<PullStream, RuntimeError> {
        self.take_failure()?;
        let mut state = self.state.lock();
        state.pulled.push(reference.to_string());
        state.images.entry(reference.to_string()).or_insert(0);
        Ok(match state.pull_progress.take() {
            Some(progress) => progress.boxed(),
            None => stream::empty().boxed(),
        })
    }

    async fn list_images(&self) -> Result<Vec<ImageSummary>, RuntimeError> {
        self.take_failure()?;
        let state = self.state.lock();
        Ok(state
            .images
            .iter()
            .map(|(reference, size)| ImageSummary {
                id: format!("sha256:{}", reference.replace([':', '/'], "-")),
                repo_tags: vec![reference.clone()],
                size: *size,
                created: 1_700_000_000,
            })
            .collect())
    }

    async fn remove_image(&self, reference: &str) -> Result<(), RuntimeError> {
        self.take_failure()?;
        let mut state = self.state.lock();
        if !state.images.contains_key(reference) {
            return Err(RuntimeError::NotFound(format!(
                "No such image: {reference}"
            )));
        }
        if let Some((id, _)) = state.containers.iter().find(|(_, c)| c.image == reference) {
            return Err(RuntimeError::Conflict(format!(
                "conflict: unable to remove repository reference \"{reference}\" (must force) - container {id} is using its referenced image"
            )));
        }
        state.images.remove(reference);
        Ok(())
    }
}
