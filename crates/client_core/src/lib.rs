use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use reqwest::Client;
use shared::{
    domain::{CustomerId, Order, OrderId, OrderStatus, Role, Viewer},
    protocol::{ErrorBody, OrdersQuery, StatusUpdateRequest},
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{info, warn};

pub mod credentials;
pub mod debounce;
pub mod error;
pub mod stats;
pub mod store;
pub mod view;

pub use credentials::{CredentialStore, MemoryCredentialStore, MissingCredentialStore};
pub use error::ClientError;
pub use store::OrderStore;

const DEFAULT_FETCH_LIMIT: u32 = 50;
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the orders API, without a trailing slash.
    pub api_url: String,
    pub fetch_limit: u32,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8080/api".to_string(),
            fetch_limit: DEFAULT_FETCH_LIMIT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// What happens to the installed snapshot when a refresh fails. The order
/// board clears it and renders empty alongside the error; the stats
/// dashboard keeps showing the previous snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshFailureMode {
    ClearSnapshot,
    KeepSnapshot,
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    SnapshotRefreshed { orders: usize },
    OrderUpdated { order: Order },
    OrderArchived { order_id: OrderId },
    Notice(String),
    Error(String),
}

struct ClientState {
    viewer: Option<Viewer>,
    pending_mutations: HashSet<OrderId>,
}

/// Client for the café orders API: holds the order snapshot, refreshes it by
/// polling, and applies status and archive mutations optimistically.
///
/// The remote API is the authority on every mutation; local state is a cache
/// that is corrected whenever the remote disagrees.
pub struct OrdersClient {
    http: Client,
    config: ClientConfig,
    credentials: Arc<dyn CredentialStore>,
    store: OrderStore,
    inner: Mutex<ClientState>,
    refresh_generation: AtomicU64,
    events: broadcast::Sender<ClientEvent>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl OrdersClient {
    pub fn new(config: ClientConfig) -> Arc<Self> {
        Self::with_credentials(config, Arc::new(MissingCredentialStore))
    }

    pub fn with_credentials(
        config: ClientConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            http: Client::new(),
            config,
            credentials,
            store: OrderStore::new(),
            inner: Mutex::new(ClientState {
                viewer: None,
                pending_mutations: HashSet::new(),
            }),
            refresh_generation: AtomicU64::new(0),
            events,
            poll_task: Mutex::new(None),
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub async fn set_viewer(&self, viewer: Viewer) {
        self.inner.lock().await.viewer = Some(viewer);
    }

    /// Clone of the current snapshot, in fetch order.
    pub async fn orders(&self) -> Vec<Order> {
        self.store.snapshot().await
    }

    pub async fn order(&self, order_id: &OrderId) -> Option<Order> {
        self.store.get(order_id).await
    }

    /// Fetches the viewer-scoped order collection and installs it as the new
    /// snapshot. Overlapping refreshes each get their own generation and the
    /// store only accepts the newest, so a stale response resolving late is
    /// discarded instead of clobbering fresher data.
    pub async fn refresh(&self, mode: RefreshFailureMode) -> Result<usize, ClientError> {
        let generation = self.refresh_generation.fetch_add(1, Ordering::SeqCst) + 1;
        match self.fetch_orders().await {
            Ok(orders) => {
                let count = orders.len();
                if self.store.replace(generation, orders).await {
                    info!(orders = count, generation, "order snapshot refreshed");
                    let _ = self
                        .events
                        .send(ClientEvent::SnapshotRefreshed { orders: count });
                } else {
                    info!(generation, "stale refresh response discarded");
                }
                Ok(count)
            }
            Err(err) => {
                warn!(generation, error = %err, "order refresh failed");
                if mode == RefreshFailureMode::ClearSnapshot {
                    self.store.clear(generation).await;
                }
                Err(err)
            }
        }
    }

    /// Applies a status change optimistically and reconciles with the remote
    /// outcome: the snapshot copy is rewritten before the request goes out
    /// and restored to the exact captured value if the request fails. An id
    /// missing from the snapshot is a no-op and nothing is sent for it.
    pub async fn update_status(
        &self,
        order_id: &OrderId,
        new_status: OrderStatus,
    ) -> Result<(), ClientError> {
        self.begin_mutation(order_id).await?;
        let result = self.update_status_inner(order_id, new_status).await;
        self.end_mutation(order_id).await;
        result
    }

    async fn update_status_inner(
        &self,
        order_id: &OrderId,
        new_status: OrderStatus,
    ) -> Result<(), ClientError> {
        let token = self.bearer_token().await?;
        let Some((generation, previous)) = self
            .store
            .mutate(order_id, |order| order.status = new_status)
            .await
        else {
            return Ok(());
        };

        let response = self
            .http
            .patch(format!(
                "{}/orders/{}/status",
                self.config.api_url, order_id.0
            ))
            .bearer_auth(&token)
            .timeout(self.config.request_timeout)
            .json(&StatusUpdateRequest { status: new_status })
            .send()
            .await;

        match read_success(response).await {
            Ok(_) => {
                info!(order_id = %order_id, status = new_status.label(), "order status update confirmed");
                let mut updated = previous;
                updated.status = new_status;
                let notice = format!(
                    "order {} marked {}",
                    updated.ticket_number,
                    new_status.label()
                );
                let _ = self
                    .events
                    .send(ClientEvent::OrderUpdated { order: updated });
                let _ = self.events.send(ClientEvent::Notice(notice));
                Ok(())
            }
            Err(err) => {
                warn!(order_id = %order_id, error = %err, "status update rejected; rolling back");
                self.store.restore(generation, previous).await;
                Err(err)
            }
        }
    }

    /// Archives an order: optimistic removal from the snapshot, then the
    /// remote call. A failed archive cannot reconstruct the row's position
    /// locally, so recovery is a keep-mode refresh.
    pub async fn archive(&self, order_id: &OrderId) -> Result<(), ClientError> {
        self.begin_mutation(order_id).await?;
        let result = self.archive_inner(order_id).await;
        self.end_mutation(order_id).await;
        result
    }

    async fn archive_inner(&self, order_id: &OrderId) -> Result<(), ClientError> {
        let token = self.bearer_token().await?;
        let Some(removed) = self.store.remove(order_id).await else {
            return Ok(());
        };

        let response = self
            .http
            .patch(format!(
                "{}/orders/{}/archive",
                self.config.api_url, order_id.0
            ))
            .bearer_auth(&token)
            .timeout(self.config.request_timeout)
            .send()
            .await;

        match read_success(response).await {
            Ok(_) => {
                info!(order_id = %order_id, "order archived");
                let _ = self.events.send(ClientEvent::OrderArchived {
                    order_id: order_id.clone(),
                });
                let _ = self.events.send(ClientEvent::Notice(format!(
                    "order {} archived",
                    removed.ticket_number
                )));
                Ok(())
            }
            Err(err) => {
                warn!(order_id = %order_id, error = %err, "archive rejected; re-syncing the snapshot");
                if let Err(refresh_err) = self.refresh(RefreshFailureMode::KeepSnapshot).await {
                    let _ = self.events.send(ClientEvent::Error(format!(
                        "recovery refresh after failed archive also failed: {refresh_err}"
                    )));
                }
                Err(err)
            }
        }
    }

    /// Starts the periodic refresh loop: one refresh immediately, then one
    /// per configured interval (a zero interval is raised to 1ms). Replaces
    /// any previous loop. Failures are reported on the event channel and
    /// the loop keeps going; there is no backoff or other retry policy.
    pub async fn start_polling(self: &Arc<Self>, mode: RefreshFailureMode) {
        // interval panics on a zero period
        let mut period = self.config.poll_interval;
        if period.is_zero() {
            warn!("configured poll interval is zero; polling every millisecond instead");
            period = Duration::from_millis(1);
        }
        let client = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                if let Err(err) = client.refresh(mode).await {
                    let _ = client
                        .events
                        .send(ClientEvent::Error(format!("order poll failed: {err}")));
                }
            }
        });
        let previous = self.poll_task.lock().await.replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Stops the refresh loop; safe to call when none is running.
    pub async fn stop_polling(&self) {
        if let Some(task) = self.poll_task.lock().await.take() {
            task.abort();
        }
    }

    async fn fetch_orders(&self) -> Result<Vec<Order>, ClientError> {
        let viewer = self.viewer().await?;
        let token = self.bearer_token().await?;
        let url = match customer_scope(&viewer)? {
            Some(customer_id) => {
                format!("{}/orders/customer/{}", self.config.api_url, customer_id.0)
            }
            None => format!("{}/orders", self.config.api_url),
        };

        let response = self
            .http
            .get(url)
            .bearer_auth(&token)
            .timeout(self.config.request_timeout)
            .query(&OrdersQuery {
                limit: self.config.fetch_limit,
            })
            .send()
            .await;
        let orders = read_success(response).await?.json::<Vec<Order>>().await?;
        Ok(orders)
    }

    async fn viewer(&self) -> Result<Viewer, ClientError> {
        self.inner
            .lock()
            .await
            .viewer
            .clone()
            .ok_or(ClientError::MissingViewer)
    }

    async fn bearer_token(&self) -> Result<String, ClientError> {
        self.credentials
            .bearer_token()
            .await
            .ok_or(ClientError::MissingCredential)
    }

    async fn begin_mutation(&self, order_id: &OrderId) -> Result<(), ClientError> {
        let mut inner = self.inner.lock().await;
        if !inner.pending_mutations.insert(order_id.clone()) {
            return Err(ClientError::MutationInFlight(order_id.clone()));
        }
        Ok(())
    }

    async fn end_mutation(&self, order_id: &OrderId) {
        self.inner.lock().await.pending_mutations.remove(order_id);
    }
}

fn customer_scope(viewer: &Viewer) -> Result<Option<&CustomerId>, ClientError> {
    if viewer.role != Role::Customer {
        return Ok(None);
    }
    match &viewer.customer_id {
        Some(customer_id) => Ok(Some(customer_id)),
        None => Err(ClientError::MissingViewer),
    }
}

/// Turns a non-success response into `ClientError::Rejected`, pulling the
/// human-readable reason out of the body when one is present.
async fn read_success(
    response: Result<reqwest::Response, reqwest::Error>,
) -> Result<reqwest::Response, ClientError> {
    let response = response?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .bytes()
        .await
        .ok()
        .and_then(|body| serde_json::from_slice::<ErrorBody>(&body).ok())
        .and_then(|body| body.message)
        .unwrap_or_else(|| format!("request rejected with status {}", status.as_u16()));
    Err(ClientError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
