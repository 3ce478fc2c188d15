//! Registry of named fake services.

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, TcpListener as StdTcpListener};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use http::StatusCode;
use micro_wire::server::serve;
use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::FakeError;
use crate::service::Service;

fn unexpected_request() -> StatusCode {
    StatusCode::from_u16(456).unwrap_or(StatusCode::NOT_IMPLEMENTED)
}

/// Owns every fake service of a test.
///
/// Each service listens on its own ephemeral port of the bind host and is served on the tokio
/// runtime that created it. [`shutdown`](Self::shutdown) stops all of them; dropping the layer
/// does the same without waiting.
#[derive(Debug)]
pub struct ServiceLayer {
    bind_host: IpAddr,
    unmatched_status: StatusCode,
    unmatched_reason: Option<String>,
    shutdown: CancellationToken,
    services: Mutex<BTreeMap<String, Arc<Service>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

#[derive(Debug)]
pub struct ServiceLayerBuilder {
    bind_host: IpAddr,
    unmatched_status: StatusCode,
    unmatched_reason: Option<String>,
}

impl ServiceLayerBuilder {
    fn new() -> Self {
        Self {
            bind_host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            unmatched_status: unexpected_request(),
            unmatched_reason: None,
        }
    }

    pub fn bind_host(mut self, bind_host: IpAddr) -> Self {
        self.bind_host = bind_host;
        self
    }

    /// Status for calls no programmed pattern matches. Non-standard codes use
    /// `Unexpected Request` as reason phrase unless one is given.
    pub fn unmatched_status(mut self, status: StatusCode) -> Self {
        self.unmatched_status = status;
        self
    }

    pub fn unmatched_reason(mut self, reason: impl Into<String>) -> Self {
        self.unmatched_reason = Some(reason.into());
        self
    }

    pub fn build(self) -> ServiceLayer {
        let status = self.unmatched_status;
        let unmatched_reason =
            self.unmatched_reason.or_else(|| status.canonical_reason().is_none().then(|| "Unexpected Request".to_string()));

        ServiceLayer {
            bind_host: self.bind_host,
            unmatched_status: status,
            unmatched_reason,
            shutdown: CancellationToken::new(),
            services: Mutex::new(BTreeMap::new()),
            tasks: Mutex::new(Vec::new()),
        }
    }
}

impl ServiceLayer {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ServiceLayerBuilder {
        ServiceLayerBuilder::new()
    }

    /// The service called `name`, started on a fresh port the first time it is asked for.
    ///
    /// Must be called from within a tokio runtime.
    pub fn get_or_create(&self, name: &str) -> Result<Arc<Service>, FakeError> {
        let runtime = Handle::try_current().ok().ok_or(FakeError::NoRuntime)?;
        if self.shutdown.is_cancelled() {
            return Err(FakeError::ShutDown);
        }

        let mut services = self.lock_services();
        if let Some(service) = services.get(name) {
            return Ok(Arc::clone(service));
        }

        let listener = StdTcpListener::bind((self.bind_host, 0)).map_err(|e| FakeError::bind(name, e))?;
        listener.set_nonblocking(true).map_err(|e| FakeError::bind(name, e))?;
        let addr = listener.local_addr().map_err(|e| FakeError::bind(name, e))?;
        let listener = TcpListener::from_std(listener).map_err(|e| FakeError::bind(name, e))?;

        let service = Arc::new(Service::new(name, addr, self.unmatched_status, self.unmatched_reason.clone()));
        let task = runtime.spawn(serve(listener, Arc::clone(&service), self.shutdown.child_token()));
        self.lock_tasks().push(task);

        info!(service = %name, %addr, "fake service started");
        services.insert(name.to_string(), Arc::clone(&service));
        Ok(service)
    }

    /// The service called `name` if it was created.
    pub fn get(&self, name: &str) -> Option<Arc<Service>> {
        self.lock_services().get(name).map(Arc::clone)
    }

    pub fn service_names(&self) -> Vec<String> {
        self.lock_services().keys().cloned().collect()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Stops every listener and connection, and waits until their sockets are closed. Requests
    /// still being read are dropped unanswered. Calling it again does nothing.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();

        let tasks = std::mem::take(&mut *self.lock_tasks());
        if tasks.is_empty() {
            return;
        }

        for task in tasks {
            if let Err(e) = task.await {
                warn!(cause = %e, "fake service task ended abnormally");
            }
        }
        info!(services = ?self.service_names(), "fake services stopped");
    }

    fn lock_services(&self) -> MutexGuard<'_, BTreeMap<String, Arc<Service>>> {
        self.services.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_tasks(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ServiceLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ServiceLayer {
    fn drop(&mut self) {
        self.shutdown.cancel();
        let tasks = self.tasks.get_mut().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.drain(..) {
            task.abort();
        }
    }
}
