//! Location source driven by explicit `push` calls.
//!
//! Lets hosts without a sensor (and tests) feed positions by hand.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{
    LocationAccuracy, LocationConfig, LocationError, LocationSample, LocationSource,
    LocationSubscription,
};

type SharedSender = Arc<Mutex<Option<mpsc::UnboundedSender<LocationSample>>>>;

/// A source whose fixes are supplied by the caller.
#[derive(Debug)]
pub struct ManualLocationSource {
    permission: AtomicBool,
    fail_subscribe: AtomicBool,
    current_fix: Mutex<Option<LocationSample>>,
    sender: SharedSender,
    subscribe_count: AtomicUsize,
}

impl Default for ManualLocationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualLocationSource {
    /// Permission granted, no current fix.
    pub fn new() -> Self {
        Self {
            permission: AtomicBool::new(true),
            fail_subscribe: AtomicBool::new(false),
            current_fix: Mutex::new(None),
            sender: Arc::new(Mutex::new(None)),
            subscribe_count: AtomicUsize::new(0),
        }
    }

    /// Whether permission requests succeed.
    pub fn set_permission(&self, granted: bool) {
        self.permission.store(granted, Ordering::SeqCst);
    }

    /// Make `subscribe` fail.
    pub fn set_fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    /// Fix returned by the one-shot position fetch.
    pub fn set_current_fix(&self, fix: Option<LocationSample>) {
        *self.current_fix.lock() = fix;
    }

    /// Deliver a sample to the current subscriber. Returns false if nobody listens.
    pub fn push(&self, sample: LocationSample) -> bool {
        match self.sender.lock().as_ref() {
            Some(tx) => tx.send(sample).is_ok(),
            None => false,
        }
    }

    /// Whether a subscription is live.
    pub fn is_subscribed(&self) -> bool {
        self.sender.lock().is_some()
    }

    /// Number of successful `subscribe` calls so far.
    pub fn subscribe_count(&self) -> usize {
        self.subscribe_count.load(Ordering::SeqCst)
    }
}

struct ManualSubscription {
    sender: SharedSender,
}

impl LocationSubscription for ManualSubscription {
    fn remove(&mut self) {
        self.sender.lock().take();
    }
}

impl LocationSource for ManualLocationSource {
    fn request_permission(&self) -> BoxFuture<'_, bool> {
        let granted = self.permission.load(Ordering::SeqCst);
        async move { granted }.boxed()
    }

    fn current_position(&self, _accuracy: LocationAccuracy) -> BoxFuture<'_, Option<LocationSample>> {
        let fix = *self.current_fix.lock();
        async move { fix }.boxed()
    }

    fn subscribe(
        &self,
        _config: LocationConfig,
        tx: mpsc::UnboundedSender<LocationSample>,
    ) -> BoxFuture<'_, Result<Box<dyn LocationSubscription>, LocationError>> {
        let result = if self.fail_subscribe.load(Ordering::SeqCst) {
            Err(LocationError::Subscribe("source refused subscription".to_string()))
        } else {
            *self.sender.lock() = Some(tx);
            self.subscribe_count.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(ManualSubscription {
                sender: Arc::clone(&self.sender),
            }) as Box<dyn LocationSubscription>)
        };
        async move { result }.boxed()
    }
}
