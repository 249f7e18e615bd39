use std::any::{type_name, Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::Rc;

use tracing::trace;

use crate::event::{Delivery, Event, SubscriptionId};

type Handler<C, E> = Rc<dyn Fn(&mut C, &mut E)>;

struct Subscriber {
    id: SubscriptionId,
    /// Holds a `Handler<C, E>` for the event type this list is keyed by.
    handler: Box<dyn Any>,
}

/// Typed publish/subscribe dispatcher.
///
/// Handlers receive the simulation context `C` mutably along with the event,
/// so they may publish further events from inside a dispatch. The handler list
/// is copied before iteration, which makes subscribing or unsubscribing during
/// a dispatch safe: the change applies from the next `publish` on.
///
/// An engine may have a parent. Events that finish local delivery without
/// being cancelled are re-delivered to the parent's handlers.
pub struct EventEngine<C: 'static> {
    name: String,
    subscribers: RefCell<HashMap<TypeId, Vec<Subscriber>>>,
    next_id: Cell<u64>,
    parent: Option<Rc<EventEngine<C>>>,
    _context: PhantomData<fn(&mut C)>,
}

impl<C: 'static> EventEngine<C> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subscribers: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
            parent: None,
            _context: PhantomData,
        }
    }

    /// Create an engine whose undelivered events bubble to `parent`.
    pub fn with_parent(name: impl Into<String>, parent: Rc<EventEngine<C>>) -> Self {
        Self {
            parent: Some(parent),
            ..Self::new(name)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Rc<EventEngine<C>>> {
        self.parent.as_ref()
    }

    /// Register a handler for events of type `E`. Handlers fire in
    /// subscription order.
    pub fn subscribe<E, F>(&self, handler: F) -> SubscriptionId
    where
        E: Event,
        F: Fn(&mut C, &mut E) + 'static,
    {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let handler: Handler<C, E> = Rc::new(handler);
        self.subscribers
            .borrow_mut()
            .entry(TypeId::of::<E>())
            .or_default()
            .push(Subscriber {
                id,
                handler: Box::new(handler),
            });
        trace!("{}: subscribed {:?} to {}", self.name, id, type_name::<E>());
        id
    }

    /// Remove a handler. Returns `true` if it was registered here.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        for list in subscribers.values_mut() {
            if let Some(pos) = list.iter().position(|s| s.id == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    /// Number of local handlers for `E` (parents not included).
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.subscribers
            .borrow()
            .get(&TypeId::of::<E>())
            .map_or(0, Vec::len)
    }

    fn snapshot<E: Event>(&self) -> Vec<Handler<C, E>> {
        self.subscribers
            .borrow()
            .get(&TypeId::of::<E>())
            .map(|list| {
                list.iter()
                    .filter_map(|s| s.handler.downcast_ref::<Handler<C, E>>())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Deliver `event` to every handler for its type, then to the parent.
    pub fn publish<E: Event>(&self, ctx: &mut C, event: &mut E) -> Delivery {
        let mut delivery = Delivery::default();
        self.deliver(ctx, event, &mut delivery);
        delivery
    }

    fn deliver<E: Event>(&self, ctx: &mut C, event: &mut E, delivery: &mut Delivery) {
        if event.is_cancelled() {
            delivery.cancelled = true;
            return;
        }

        for handler in self.snapshot::<E>() {
            handler(ctx, event);
            delivery.handled += 1;
            if event.is_cancelled() {
                trace!("{}: {} cancelled", self.name, type_name::<E>());
                delivery.cancelled = true;
                return;
            }
        }

        if let Some(parent) = &self.parent {
            parent.deliver(ctx, event, delivery);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log {
        entries: Vec<String>,
    }

    struct Ping {
        depth: u32,
        cancelled: bool,
    }

    impl Ping {
        fn new() -> Self {
            Self {
                depth: 0,
                cancelled: false,
            }
        }
    }

    impl Event for Ping {
        fn is_cancelled(&self) -> bool {
            self.cancelled
        }
    }

    struct Pong;

    impl Event for Pong {}

    #[test]
    fn handlers_fire_in_subscription_order() {
        let engine = EventEngine::<Log>::new("test");
        engine.subscribe(|log: &mut Log, _: &mut Ping| log.entries.push("a".into()));
        engine.subscribe(|log: &mut Log, _: &mut Ping| log.entries.push("b".into()));
        engine.subscribe(|log: &mut Log, _: &mut Ping| log.entries.push("c".into()));

        let mut log = Log::default();
        let delivery = engine.publish(&mut log, &mut Ping::new());
        assert_eq!(log.entries, vec!["a", "b", "c"]);
        assert_eq!(delivery.handled, 3);
        assert!(!delivery.cancelled);
    }

    #[test]
    fn events_are_routed_by_type() {
        let engine = EventEngine::<Log>::new("test");
        engine.subscribe(|log: &mut Log, _: &mut Ping| log.entries.push("ping".into()));
        engine.subscribe(|log: &mut Log, _: &mut Pong| log.entries.push("pong".into()));

        let mut log = Log::default();
        engine.publish(&mut log, &mut Pong);
        assert_eq!(log.entries, vec!["pong"]);
        assert_eq!(engine.subscriber_count::<Ping>(), 1);
    }

    #[test]
    fn cancellation_stops_local_delivery_and_bubbling() {
        let parent = Rc::new(EventEngine::<Log>::new("parent"));
        parent.subscribe(|log: &mut Log, _: &mut Ping| log.entries.push("parent".into()));

        let child = EventEngine::with_parent("child", parent.clone());
        child.subscribe(|log: &mut Log, ping: &mut Ping| {
            log.entries.push("first".into());
            ping.cancelled = true;
        });
        child.subscribe(|log: &mut Log, _: &mut Ping| log.entries.push("second".into()));

        let mut log = Log::default();
        let delivery = child.publish(&mut log, &mut Ping::new());
        assert_eq!(log.entries, vec!["first"]);
        assert!(delivery.cancelled);
        assert_eq!(delivery.handled, 1);
    }

    #[test]
    fn uncancelled_events_bubble_to_parent() {
        let parent = Rc::new(EventEngine::<Log>::new("parent"));
        parent.subscribe(|log: &mut Log, _: &mut Ping| log.entries.push("parent".into()));
        let child = EventEngine::with_parent("child", parent.clone());
        child.subscribe(|log: &mut Log, _: &mut Ping| log.entries.push("child".into()));

        let mut log = Log::default();
        let delivery = child.publish(&mut log, &mut Ping::new());
        assert_eq!(log.entries, vec!["child", "parent"]);
        assert_eq!(delivery.handled, 2);
        assert_eq!(child.parent().map(|p| p.name()), Some("parent"));
    }

    struct Host {
        engine: Rc<EventEngine<Host>>,
        seen: Vec<u32>,
    }

    #[test]
    fn handlers_may_publish_reentrantly() {
        let engine = Rc::new(EventEngine::<Host>::new("host"));
        engine.subscribe(|host: &mut Host, ping: &mut Ping| {
            host.seen.push(ping.depth);
            if ping.depth < 3 {
                let engine = host.engine.clone();
                let mut next = Ping {
                    depth: ping.depth + 1,
                    cancelled: false,
                };
                engine.publish(host, &mut next);
            }
        });

        let mut host = Host {
            engine: engine.clone(),
            seen: Vec::new(),
        };
        engine.publish(&mut host, &mut Ping::new());
        assert_eq!(host.seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn subscribe_during_dispatch_applies_next_publish() {
        let engine = Rc::new(EventEngine::<Host>::new("host"));
        engine.subscribe(|host: &mut Host, _: &mut Ping| {
            host.seen.push(1);
            host.engine
                .subscribe(|host: &mut Host, _: &mut Ping| host.seen.push(2));
        });

        let mut host = Host {
            engine: engine.clone(),
            seen: Vec::new(),
        };
        engine.publish(&mut host, &mut Ping::new());
        assert_eq!(host.seen, vec![1]);

        host.seen.clear();
        engine.publish(&mut host, &mut Ping::new());
        assert_eq!(host.seen, vec![1, 2]);
    }

    #[test]
    fn unsubscribe_removes_handler() {
        let engine = EventEngine::<Log>::new("test");
        let id = engine.subscribe(|log: &mut Log, _: &mut Ping| log.entries.push("x".into()));
        assert!(engine.unsubscribe(id));
        assert!(!engine.unsubscribe(id));

        let mut log = Log::default();
        engine.publish(&mut log, &mut Ping::new());
        assert!(log.entries.is_empty());
    }

    #[test]
    fn already_cancelled_event_is_not_delivered() {
        let engine = EventEngine::<Log>::new("test");
        engine.subscribe(|log: &mut Log, _: &mut Ping| log.entries.push("x".into()));

        let mut log = Log::default();
        let mut ping = Ping::new();
        ping.cancelled = true;
        let delivery = engine.publish(&mut log, &mut ping);
        assert!(delivery.cancelled);
        assert!(log.entries.is_empty());
    }
}
