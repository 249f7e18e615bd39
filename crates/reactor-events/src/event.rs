use std::fmt;

/// Marker trait for types that can be published through an [`EventEngine`].
///
/// Events that support cancellation override [`Event::is_cancelled`]; once it
/// reports `true` no further handler sees the event and it does not bubble.
///
/// [`EventEngine`]: crate::EventEngine
pub trait Event: 'static {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Subscription({})", self.0)
    }
}

/// Outcome of one `publish` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Delivery {
    /// Handlers invoked, across this engine and any parents reached.
    pub handled: usize,
    /// Whether a handler cancelled the event.
    pub cancelled: bool,
}
