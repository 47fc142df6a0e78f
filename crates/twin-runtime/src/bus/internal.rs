//! In-process message bus.
//!
//! # Isolation
//!
//! Each subscription owns a bounded queue (`SyncSender`) and a dedicated
//! worker thread that drains it into the handler:
//!
//! ```text
//! publish(event)
//!     │ try_send (never blocks)
//!     ├──────────────► [queue] ──► worker "twin-bus-sub-1" ──► handler
//!     ├──────────────► [queue] ──► worker "twin-bus-sub-2" ──► handler
//!     └─ full queue → event dropped for that subscriber, warn!
//! ```
//!
//! A slow or panicking subscriber therefore never stalls publishers or
//! other subscribers. Events from one publisher reach each subscriber in
//! publish order.
//!
//! On [`stop`](MessageBus::stop) every queue is closed; workers deliver
//! what is already queued and exit.

use super::{EventFilter, EventHandler, MessageBus, MessageBusError, Subscription};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};
use twin_event::EventMessage;
use twin_types::SubscriptionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BusState {
    Created,
    Running,
    Stopped,
}

struct Worker {
    filter: EventFilter,
    tx: SyncSender<EventMessage>,
    dropped: AtomicU64,
    thread: Option<JoinHandle<()>>,
}

/// [`MessageBus`] delivering to in-process subscribers.
///
/// # Example
///
/// ```
/// use std::sync::mpsc;
/// use twin_event::EventMessage;
/// use twin_model::ElementValue;
/// use twin_runtime::bus::{InternalMessageBus, MessageBus, Subscription};
/// use twin_types::{Identifier, Reference};
///
/// let bus = InternalMessageBus::new(16);
/// let (tx, rx) = mpsc::channel();
/// bus.subscribe(Subscription::all(move |e| { let _ = tx.send(e); })).unwrap();
/// bus.start().unwrap();
///
/// let r = Reference::submodel(&Identifier::new("urn:sm")).child("Speed");
/// bus.publish(EventMessage::value_change(
///     r.clone(),
///     ElementValue::Property(None),
///     ElementValue::Property(None),
/// ))
/// .unwrap();
///
/// assert_eq!(rx.recv().unwrap().reference(), &r);
/// bus.stop().unwrap();
/// ```
pub struct InternalMessageBus {
    state: Mutex<BusState>,
    workers: RwLock<HashMap<SubscriptionId, Worker>>,
    queue_capacity: usize,
    next_worker: AtomicUsize,
}

impl InternalMessageBus {
    /// Creates a bus whose subscriber queues hold `queue_capacity` events.
    #[must_use]
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            state: Mutex::new(BusState::Created),
            workers: RwLock::new(HashMap::new()),
            queue_capacity: queue_capacity.max(1),
            next_worker: AtomicUsize::new(1),
        }
    }

    /// Number of active subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.workers.read().len()
    }

    /// Events dropped so far for `id` because its queue was full.
    #[must_use]
    pub fn dropped_count(&self, id: &SubscriptionId) -> Option<u64> {
        self.workers
            .read()
            .get(id)
            .map(|w| w.dropped.load(Ordering::Relaxed))
    }

    fn spawn_worker(&self, id: SubscriptionId, subscription: Subscription) -> Result<Worker, MessageBusError> {
        let (tx, rx) = mpsc::sync_channel::<EventMessage>(self.queue_capacity);
        let Subscription { filter, handler } = subscription;
        let mut handler: EventHandler = handler;
        let n = self.next_worker.fetch_add(1, Ordering::Relaxed);

        let thread = thread::Builder::new()
            .name(format!("twin-bus-sub-{n}"))
            .spawn(move || {
                while let Ok(event) = rx.recv() {
                    let kind = event.kind();
                    if panic::catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                        warn!(subscription = %id, kind = %kind, "subscriber panicked while handling event");
                    }
                }
                debug!(subscription = %id, "subscriber worker exited");
            })
            .map_err(|e| MessageBusError::SpawnFailed(e.to_string()))?;

        Ok(Worker {
            filter,
            tx,
            dropped: AtomicU64::new(0),
            thread: Some(thread),
        })
    }
}

impl Default for InternalMessageBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl MessageBus for InternalMessageBus {
    fn start(&self) -> Result<(), MessageBusError> {
        let mut state = self.state.lock();
        match *state {
            BusState::Created => {
                *state = BusState::Running;
                info!(subscribers = self.subscriber_count(), "message bus started");
                Ok(())
            }
            BusState::Running => Ok(()),
            BusState::Stopped => Err(MessageBusError::Stopped),
        }
    }

    fn stop(&self) -> Result<(), MessageBusError> {
        {
            let mut state = self.state.lock();
            if *state == BusState::Stopped {
                return Ok(());
            }
            *state = BusState::Stopped;
        }

        let workers: Vec<Worker> = self.workers.write().drain().map(|(_, w)| w).collect();
        let current = thread::current().id();
        let mut handles = Vec::with_capacity(workers.len());
        for mut worker in workers {
            // dropping the sender closes the queue; the worker drains and exits
            if let Some(handle) = worker.thread.take() {
                handles.push(handle);
            }
        }
        for handle in handles {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                warn!("subscriber worker terminated abnormally");
            }
        }
        info!("message bus stopped");
        Ok(())
    }

    fn publish(&self, event: EventMessage) -> Result<(), MessageBusError> {
        match *self.state.lock() {
            BusState::Created => return Err(MessageBusError::NotStarted),
            BusState::Stopped => {
                debug!(kind = %event.kind(), "publish after stop ignored");
                return Ok(());
            }
            BusState::Running => {}
        }

        let workers = self.workers.read();
        for (id, worker) in workers.iter() {
            if !(worker.filter)(&event) {
                continue;
            }
            match worker.tx.try_send(event.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(dropped)) => {
                    let total = worker.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!(
                        subscription = %id,
                        kind = %dropped.kind(),
                        reference = %dropped.reference(),
                        dropped = total,
                        "subscriber queue full, event dropped"
                    );
                }
                Err(TrySendError::Disconnected(_)) => {
                    debug!(subscription = %id, "subscriber worker gone, event skipped");
                }
            }
        }
        Ok(())
    }

    fn subscribe(&self, subscription: Subscription) -> Result<SubscriptionId, MessageBusError> {
        let state = self.state.lock();
        if *state == BusState::Stopped {
            return Err(MessageBusError::Stopped);
        }
        let id = SubscriptionId::new();
        let worker = self.spawn_worker(id, subscription)?;
        self.workers.write().insert(id, worker);
        drop(state);
        debug!(subscription = %id, "subscribed");
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), MessageBusError> {
        let removed = self.workers.write().remove(&id);
        match removed {
            // worker exits once its queue is drained; not joined here so a
            // handler may unsubscribe itself
            Some(_) => {
                debug!(subscription = %id, "unsubscribed");
                Ok(())
            }
            None => Err(MessageBusError::UnknownSubscription(id)),
        }
    }
}

impl Drop for InternalMessageBus {
    fn drop(&mut self) {
        // senders drop with the map; detached workers finish their queues
        self.workers.get_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::Receiver;
    use std::time::Duration;
    use twin_event::EventKind;
    use twin_model::{DataValue, ElementValue};
    use twin_types::{Identifier, Reference};

    fn reference(name: &str) -> Reference {
        Reference::submodel(&Identifier::new("urn:sm:motor")).child(name)
    }

    fn value_change(name: &str, v: i64) -> EventMessage {
        EventMessage::value_change(
            reference(name),
            ElementValue::Property(None),
            ElementValue::Property(Some(DataValue::Integer(v))),
        )
    }

    fn collecting(bus: &InternalMessageBus) -> (SubscriptionId, Receiver<EventMessage>) {
        let (tx, rx) = mpsc::channel();
        let id = bus
            .subscribe(Subscription::all(move |e| {
                let _ = tx.send(e);
            }))
            .unwrap();
        (id, rx)
    }

    fn recv(rx: &Receiver<EventMessage>) -> EventMessage {
        rx.recv_timeout(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn publish_before_start_is_illegal_state() {
        let bus = InternalMessageBus::new(8);
        assert_eq!(
            bus.publish(value_change("A", 1)),
            Err(MessageBusError::NotStarted)
        );
    }

    #[test]
    fn publish_after_stop_is_noop() {
        let bus = InternalMessageBus::new(8);
        bus.start().unwrap();
        bus.stop().unwrap();
        assert_eq!(bus.publish(value_change("A", 1)), Ok(()));
        assert!(matches!(
            bus.subscribe(Subscription::all(|_| {})),
            Err(MessageBusError::Stopped)
        ));
        assert_eq!(bus.start(), Err(MessageBusError::Stopped));
    }

    #[test]
    fn per_reference_order_is_preserved() {
        let bus = InternalMessageBus::new(256);
        let (_, rx) = collecting(&bus);
        bus.start().unwrap();
        for i in 0..100 {
            bus.publish(value_change("A", i)).unwrap();
        }
        for i in 0..100 {
            let ev = recv(&rx);
            let twin_event::EventMessage::ValueChange(vc) = ev else {
                panic!("unexpected event");
            };
            assert_eq!(vc.new_value.as_data(), Some(&DataValue::Integer(i)));
        }
        bus.stop().unwrap();
    }

    #[test]
    fn consecutive_value_changes_arrive_in_order() {
        let int = |v| ElementValue::Property(Some(DataValue::Integer(v)));
        let bus = InternalMessageBus::new(8);
        let (_, rx) = collecting(&bus);
        bus.start().unwrap();
        bus.publish(EventMessage::value_change(reference("Speed"), int(10), int(20)))
            .unwrap();
        bus.publish(EventMessage::value_change(reference("Speed"), int(20), int(30)))
            .unwrap();

        let observed: Vec<_> = (0..2)
            .map(|_| match recv(&rx) {
                EventMessage::ValueChange(vc) => (vc.old_value, vc.new_value),
                other => panic!("unexpected event {:?}", other.kind()),
            })
            .collect();
        assert_eq!(observed, vec![(int(10), int(20)), (int(20), int(30))]);
        bus.stop().unwrap();
    }

    #[test]
    fn filters_are_applied() {
        let bus = InternalMessageBus::new(8);
        let (tx, rx) = mpsc::channel();
        bus.subscribe(Subscription::of_kind([EventKind::OperationInvoke], move |e| {
            let _ = tx.send(e);
        }))
        .unwrap();
        bus.start().unwrap();
        bus.publish(value_change("A", 1)).unwrap();
        bus.publish(EventMessage::operation_invoke(reference("Op"), vec![], vec![]))
            .unwrap();
        assert_eq!(recv(&rx).kind(), EventKind::OperationInvoke);
        bus.stop().unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn slow_subscriber_does_not_block_others() {
        let bus = InternalMessageBus::new(2);
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let slow = bus
            .subscribe(Subscription::all(move |_| {
                let _ = release_rx.recv();
            }))
            .unwrap();
        let (fast_tx, fast_rx) = mpsc::channel();
        let fast = bus
            .subscribe(Subscription::all(move |e| {
                let _ = fast_tx.send(e);
            }))
            .unwrap();
        bus.start().unwrap();

        // slow subscriber holds at most 1 in its handler and 2 queued
        for i in 0..10 {
            bus.publish(value_change("A", i)).unwrap();
        }
        assert!(bus.dropped_count(&slow).unwrap() >= 7);
        recv(&fast_rx);

        bus.unsubscribe(slow).unwrap();
        bus.unsubscribe(fast).unwrap();
        drop(release_tx);
        bus.stop().unwrap();
    }

    #[test]
    fn panicking_subscriber_keeps_running() {
        let bus = InternalMessageBus::new(8);
        let (tx, rx) = mpsc::channel();
        bus.subscribe(Subscription::all(move |e| {
            if let EventMessage::ValueChange(vc) = &e {
                if vc.new_value.as_data() == Some(&DataValue::Integer(1)) {
                    panic!("subscriber bug");
                }
            }
            let _ = tx.send(e);
        }))
        .unwrap();
        bus.start().unwrap();
        bus.publish(value_change("A", 1)).unwrap();
        bus.publish(value_change("A", 2)).unwrap();
        let ev = recv(&rx);
        assert_eq!(ev.reference(), &reference("A"));
        bus.stop().unwrap();
    }

    #[test]
    fn stop_drains_queued_events() {
        let bus = InternalMessageBus::new(64);
        let (_, rx) = collecting(&bus);
        bus.start().unwrap();
        for i in 0..20 {
            bus.publish(value_change("A", i)).unwrap();
        }
        bus.stop().unwrap();
        assert_eq!(rx.try_iter().count(), 20);
    }

    #[test]
    fn unsubscribe_unknown_is_error() {
        let bus = InternalMessageBus::new(8);
        let (id, _rx) = collecting(&bus);
        assert_eq!(bus.subscriber_count(), 1);
        bus.unsubscribe(id).unwrap();
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(
            bus.unsubscribe(id),
            Err(MessageBusError::UnknownSubscription(id))
        );
    }
}
