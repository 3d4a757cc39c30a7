//! # Scene Event Bus
//!
//! Lock-free channel between the world core and its external collaborators.
//!
//! ```text
//! ┌─────────────┐      ┌─────────────┐      ┌──────────────────┐
//! │ Scene Graph │─────>│   Event     │─────>│ Mesh/Physics sync│
//! │   & World   │      │   Channel   │      │ GUI / Editor     │
//! └─────────────┘      └─────────────┘      └──────────────────┘
//! ```
//!
//! Every transform resolve publishes [`SceneEvent::TransformChanged`]; the
//! renderer and physics sync subscribe to keep their own caches current and
//! push corrections back in through `World::set_actor_world_transform`.
//! Channels are bounded and never block the update thread: a full channel
//! drops the event.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use pyre_shared::Transform;

use crate::scene::{ActorId, LevelId, NodeId};

/// Events published by the world core.
///
/// These are the narrow "API" toward the excluded subsystems; nothing in
/// the core reacts to them.
#[derive(Clone, Debug)]
pub enum SceneEvent {
    /// A spatial node finished a transform resolve.
    ///
    /// Emitted after *every* resolve, including propagated ones, so
    /// subscribers never observe a stale descendant.
    TransformChanged {
        /// Actor owning the resolved node.
        actor: ActorId,
        /// The resolved node.
        node: NodeId,
        /// The node's new world transform.
        world: Transform,
    },

    /// An actor finished initialization and owns its root node.
    ActorSpawned {
        /// The new actor.
        actor: ActorId,
    },

    /// An actor was reaped at end of frame; its id is now stale.
    ActorDestroyed {
        /// The reaped actor.
        actor: ActorId,
    },

    /// A level was created.
    LevelCreated {
        /// The new level.
        level: LevelId,
    },
}

/// Event bus with bounded capacity.
///
/// Pre-allocates the channel so the hot path never grows memory.
pub struct EventBus {
    /// Sender end - held by event producers.
    sender: Sender<SceneEvent>,
    /// Receiver end - handed to event consumers.
    receiver: Receiver<SceneEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum events in flight before producers drop.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Creates a sender handle (clone for multiple producers).
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// Creates a receiver handle.
    ///
    /// crossbeam channels are work-stealing, not broadcast: each event is
    /// seen by exactly one receiver. Hand one receiver to one collaborator.
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }
}

/// Handle for publishing scene events.
#[derive(Clone)]
pub struct EventSender {
    sender: Sender<SceneEvent>,
}

impl EventSender {
    /// Publishes an event (non-blocking).
    ///
    /// Returns `false` if the event was dropped because the channel is full
    /// or the receiver is gone. A full channel means a collaborator stopped
    /// draining; the update thread does not wait for it.
    #[inline]
    pub fn send(&self, event: SceneEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Handle for consuming scene events.
#[derive(Clone)]
pub struct EventReceiver {
    receiver: Receiver<SceneEvent>,
}

impl EventReceiver {
    /// Receives all pending events (non-blocking).
    #[inline]
    #[must_use]
    pub fn drain(&self) -> Vec<SceneEvent> {
        let mut events = Vec::with_capacity(self.receiver.len());
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Receives one event (non-blocking).
    #[inline]
    #[must_use]
    pub fn try_recv(&self) -> Option<SceneEvent> {
        self.receiver.try_recv().ok()
    }

    /// Returns the number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Checks if there are pending events.
    #[inline]
    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::SlotKey;

    #[test]
    fn test_send_receive() {
        let bus = EventBus::new(16);
        let sender = bus.sender();
        let receiver = bus.receiver();

        assert!(sender.send(SceneEvent::ActorSpawned {
            actor: ActorId::from_key(SlotKey::new(3, 1)),
        }));
        assert!(receiver.has_events());

        match receiver.try_recv().unwrap() {
            SceneEvent::ActorSpawned { actor } => assert_eq!(actor.key().index(), 3),
            other => panic!("wrong event: {other:?}"),
        }
    }

    #[test]
    fn test_full_channel_drops() {
        let bus = EventBus::new(1);
        let sender = bus.sender();
        let _receiver = bus.receiver();

        let event = SceneEvent::ActorSpawned {
            actor: ActorId::from_key(SlotKey::new(0, 1)),
        };
        assert!(sender.send(event.clone()));
        assert!(!sender.send(event));
    }

    #[test]
    fn test_drain() {
        let bus = EventBus::new(64);
        let sender = bus.sender();
        let receiver = bus.receiver();

        for i in 0..10 {
            let _ = sender.send(SceneEvent::ActorSpawned {
                actor: ActorId::from_key(SlotKey::new(i, 1)),
            });
        }

        assert_eq!(receiver.drain().len(), 10);
        assert!(!receiver.has_events());
    }
}
