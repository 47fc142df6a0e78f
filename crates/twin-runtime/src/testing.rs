//! Test doubles for the runtime's extension points.
//!
//! Enabled for this crate's own tests and, for downstream crates, with the
//! `testing` feature.
//!
//! | Double | Stands in for |
//! |--------|---------------|
//! | [`RecordingBus`] | [`MessageBus`] |
//! | [`FakeValueProvider`] | [`AssetValueProvider`] |
//! | [`ThreadedOperationProvider`] | [`AssetOperationProvider`] |
//! | [`FakeSubscriptionProvider`] | [`AssetSubscriptionProvider`] |
//! | [`FakeConnection`] | [`AssetConnection`] |

use crate::asset::{
    AssetConnection, AssetConnectionError, AssetOperationProvider, AssetSubscriptionProvider, AssetValueProvider,
    Binding, CompletionCallback, OperationCall, ValueListener,
};
use crate::bus::{MessageBus, MessageBusError, Subscription};
use crate::operation::OperationOutput;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use twin_event::{EventKind, EventMessage};
use twin_model::ElementValue;
use twin_types::SubscriptionId;

/// A bus that records every published event in order.
///
/// Accepts publishes regardless of lifecycle state. Subscriptions are
/// accepted but never receive anything.
#[derive(Default)]
pub struct RecordingBus {
    events: Mutex<Vec<EventMessage>>,
    published: Condvar,
    failing: AtomicBool,
}

impl RecordingBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every publish fails with [`MessageBusError::Unavailable`]
    /// and nothing is recorded.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    #[must_use]
    pub fn events(&self) -> Vec<EventMessage> {
        self.events.lock().clone()
    }

    #[must_use]
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().iter().map(EventMessage::kind).collect()
    }

    /// Blocks until at least `count` events were recorded or `timeout`
    /// elapses. Returns whether the count was reached.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut events = self.events.lock();
        while events.len() < count {
            if self.published.wait_until(&mut events, deadline).timed_out() {
                return events.len() >= count;
            }
        }
        true
    }
}

impl MessageBus for RecordingBus {
    fn start(&self) -> Result<(), MessageBusError> {
        Ok(())
    }

    fn stop(&self) -> Result<(), MessageBusError> {
        Ok(())
    }

    fn publish(&self, event: EventMessage) -> Result<(), MessageBusError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MessageBusError::Unavailable("recording bus set to fail".into()));
        }
        self.events.lock().push(event);
        self.published.notify_all();
        Ok(())
    }

    fn subscribe(&self, _subscription: Subscription) -> Result<SubscriptionId, MessageBusError> {
        Ok(SubscriptionId::new())
    }

    fn unsubscribe(&self, _id: SubscriptionId) -> Result<(), MessageBusError> {
        Ok(())
    }
}

/// Holds one value in memory and records every write.
pub struct FakeValueProvider {
    current: Mutex<ElementValue>,
    writes: Mutex<Vec<ElementValue>>,
    fail_writes: AtomicBool,
}

impl FakeValueProvider {
    #[must_use]
    pub fn new(initial: ElementValue) -> Self {
        Self {
            current: Mutex::new(initial),
            writes: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// While set, writes fail with [`AssetConnectionError::Unreachable`].
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Successful writes, oldest first.
    #[must_use]
    pub fn writes(&self) -> Vec<ElementValue> {
        self.writes.lock().clone()
    }
}

impl AssetValueProvider for FakeValueProvider {
    fn read(&self) -> Result<ElementValue, AssetConnectionError> {
        Ok(self.current.lock().clone())
    }

    fn write(&self, value: &ElementValue) -> Result<(), AssetConnectionError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AssetConnectionError::Unreachable("fake asset offline".into()));
        }
        *self.current.lock() = value.clone();
        self.writes.lock().push(value.clone());
        Ok(())
    }
}

type Behavior = Arc<dyn Fn(OperationCall) -> Result<OperationOutput, AssetConnectionError> + Send + Sync>;

/// Runs each invocation on its own thread and completes from there.
pub struct ThreadedOperationProvider {
    behavior: Behavior,
    reject_next: AtomicBool,
    invocations: AtomicUsize,
}

impl ThreadedOperationProvider {
    /// Completes with the input arguments as outputs and the in-out
    /// arguments unchanged.
    #[must_use]
    pub fn echo() -> Self {
        Self::with_behavior(|call| {
            Ok(OperationOutput {
                output: call.input,
                inoutput: call.inoutput,
            })
        })
    }

    /// Completes with whatever `behavior` returns.
    pub fn with_behavior(
        behavior: impl Fn(OperationCall) -> Result<OperationOutput, AssetConnectionError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            behavior: Arc::new(behavior),
            reject_next: AtomicBool::new(false),
            invocations: AtomicUsize::new(0),
        }
    }

    /// Makes the next invocation fail synchronously with
    /// [`AssetConnectionError::Rejected`].
    pub fn reject_next(&self) {
        self.reject_next.store(true, Ordering::SeqCst);
    }

    /// Invocations accepted so far.
    #[must_use]
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

impl AssetOperationProvider for ThreadedOperationProvider {
    fn invoke_async(&self, call: OperationCall, on_complete: CompletionCallback) -> Result<(), AssetConnectionError> {
        if self.reject_next.swap(false, Ordering::SeqCst) {
            return Err(AssetConnectionError::Rejected("fake asset busy".into()));
        }
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let behavior = Arc::clone(&self.behavior);
        thread::Builder::new()
            .name("fake-operation".into())
            .spawn(move || on_complete(behavior(call)))
            .map_err(|e| AssetConnectionError::Failed(e.to_string()))?;
        Ok(())
    }
}

/// Delivers values pushed from the test to the subscribed listener.
#[derive(Default)]
pub struct FakeSubscriptionProvider {
    listener: Mutex<Option<ValueListener>>,
    refuse: bool,
}

impl FakeSubscriptionProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose asset refuses every subscription.
    #[must_use]
    pub fn refusing() -> Self {
        Self {
            listener: Mutex::new(None),
            refuse: true,
        }
    }

    /// Delivers `value` on the calling thread. No-op when unsubscribed.
    pub fn push(&self, value: ElementValue) {
        let listener = self.listener.lock().clone();
        if let Some(listener) = listener {
            listener(value);
        }
    }

    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.listener.lock().is_some()
    }
}

impl AssetSubscriptionProvider for FakeSubscriptionProvider {
    fn subscribe(&self, listener: ValueListener) -> Result<(), AssetConnectionError> {
        if self.refuse {
            return Err(AssetConnectionError::Rejected("subscriptions disabled".into()));
        }
        *self.listener.lock() = Some(listener);
        Ok(())
    }

    fn unsubscribe(&self) -> Result<(), AssetConnectionError> {
        self.listener.lock().take();
        Ok(())
    }
}

/// A connection serving a fixed set of bindings.
pub struct FakeConnection {
    name: String,
    bindings: Vec<Binding>,
    closed: AtomicBool,
    fail_close: bool,
}

impl FakeConnection {
    #[must_use]
    pub fn new(name: impl Into<String>, bindings: Vec<Binding>) -> Self {
        Self {
            name: name.into(),
            bindings,
            closed: AtomicBool::new(false),
            fail_close: false,
        }
    }

    /// Makes [`close`](AssetConnection::close) report a failure after
    /// marking the connection closed.
    #[must_use]
    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl AssetConnection for FakeConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn bindings(&self) -> Vec<Binding> {
        self.bindings.clone()
    }

    fn close(&self) -> Result<(), AssetConnectionError> {
        self.closed.store(true, Ordering::SeqCst);
        if self.fail_close {
            return Err(AssetConnectionError::Failed("fake close failure".into()));
        }
        Ok(())
    }
}
