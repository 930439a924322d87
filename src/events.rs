// ABOUTME: Notification bus for the clickcast editor
// ABOUTME: Synchronous typed publish/subscribe used to announce state changes to observers

use log::debug;

/// A state change announced to observers.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// An empty project replaced the previous one.
    ProjectCreated,
    /// A project file was loaded.
    ProjectLoaded { slides: usize },
    /// A new slide is available at this index.
    SlideAdded(usize),
    SlideRemoved(usize),
    SlidesSwapped(usize, usize),
    ActionEdited { slide: usize, action: usize },
    OutputSizeChanged { width: u32, height: u32 },
    SelectionChanged(Option<usize>),
    ActionSelectionChanged(Option<usize>),
    CaptureModeChanged(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&Event)>;

/// Delivers events to subscribers synchronously, in subscription order.
///
/// There is no reentrancy guard: a subscriber must not publish on the bus it
/// is being called from.
#[derive(Default)]
pub struct NotificationBus {
    subscribers: Vec<(SubscriptionId, Callback)>,
    next_id: u64,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&Event) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn unsubscribe_all(&mut self) {
        self.subscribers.clear();
    }

    pub fn publish(&mut self, event: Event) {
        debug!("Publishing {:?} to {} subscribers", event, self.subscribers.len());
        for (_, callback) in self.subscribers.iter_mut() {
            callback(&event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl std::fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
