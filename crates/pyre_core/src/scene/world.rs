//! # World
//!
//! The single owner of everything scene-related: the actor arena, the actor
//! slot pool, the transform hierarchy, the levels, the cached capability
//! lists, and the deferred destruction queues.
//!
//! Destruction is mark-then-reap. `destroy_actor` and `remove_level` only
//! mark; the actual teardown happens in [`World::cleanup_pending_destroy`],
//! which the frame driver calls once per frame after all dispatch. In
//! between, marked actors stay queryable (reads during teardown windows are
//! common in gameplay code) but are skipped by every dispatch loop, and the
//! cached lists are not touched until the reap.

use std::mem;

use pyre_shared::constants::MAX_CHILD_ACTORS;
use pyre_shared::{Transform, Vec3};
use tracing::{debug, error, info, warn};

use crate::config::WorldConfig;
use crate::events::{EventBus, EventReceiver, EventSender, SceneEvent};
use crate::memory::{BlockArena, SlotPool};
use crate::scene::{
    Actor, ActorFlags, ActorId, ActorSpawnDesc, AttachMode, Component, ComponentRecord, Level,
    LevelId, NodeId, SceneGraph,
};

/// The root container of one simulated scene.
pub struct World {
    config: WorldConfig,
    /// Byte accounting for actors and component records. Exhaustion here is
    /// fatal: the arena is sized at construction and never grows.
    arena: BlockArena,
    /// Sole owner of actor storage; every `ActorId` is a weak key into it.
    actors: SlotPool<Actor>,
    graph: SceneGraph,
    /// Slot 0 is always the persistent level. Removed levels leave a `None`
    /// hole so `LevelId` indices stay stable.
    levels: Vec<Option<Level>>,
    /// All level-resident actors not marked for destruction.
    all_actors: Vec<ActorId>,
    /// Subset of `all_actors` with `WANTS_TICK`.
    tick_list: Vec<ActorId>,
    /// Subset of `all_actors` with `WANTS_START_STOP_PLAY`.
    start_stop_list: Vec<ActorId>,
    /// Actors marked for destruction, children queued before parents.
    pending_destroy: Vec<ActorId>,
    /// Levels marked for removal.
    pending_destroy_levels: Vec<LevelId>,
    has_started_play: bool,
    bus: EventBus,
    events: EventSender,
}

impl World {
    /// The level created with the world and never removable.
    pub const PERSISTENT_LEVEL: LevelId = LevelId::from_index(0);

    /// Builds a world from configuration. All capacities are final: the
    /// arena, actor table, and node table never grow.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        let bus = EventBus::new(config.event_capacity);
        let events = bus.sender();
        let arena = BlockArena::new(
            &format!("{}.ActorArena", config.name),
            config.actor_arena_bytes,
            config.arena_alignment,
        );
        let graph = SceneGraph::new(config.max_nodes, bus.sender());
        info!(
            name = %config.name,
            arena_bytes = arena.capacity(),
            max_actors = config.max_actors,
            "World created"
        );
        Self {
            arena,
            actors: SlotPool::new(config.max_actors.max(1)),
            graph,
            levels: vec![Some(Level::new("Persistent"))],
            all_actors: Vec::new(),
            tick_list: Vec::new(),
            start_stop_list: Vec::new(),
            pending_destroy: Vec::new(),
            pending_destroy_levels: Vec::new(),
            has_started_play: false,
            bus,
            events,
            config,
        }
    }

    // ========================================================================
    // Actor lifecycle
    // ========================================================================

    /// Spawns an actor and returns its handle.
    ///
    /// The actor is charged to the arena and given a root spatial node at
    /// the requested world transform. It is not yet level-resident: call
    /// [`World::add_actor_to_level`] to make it participate in dispatch.
    ///
    /// # Panics
    ///
    /// Panics if the actor table or the arena is exhausted.
    pub fn spawn_actor(&mut self, name: &str, desc: ActorSpawnDesc) -> ActorId {
        let block = self.arena.allocate(mem::size_of::<Actor>());
        let mut flags = ActorFlags::empty();
        if desc.persistent {
            flags.insert(ActorFlags::PERSISTENT);
        }
        if desc.wants_tick {
            flags.insert(ActorFlags::WANTS_TICK);
        }
        if desc.wants_start_stop_play {
            flags.insert(ActorFlags::WANTS_START_STOP_PLAY);
        }

        let actor = Actor {
            name: name.to_owned(),
            flags,
            level: None,
            parent: None,
            children: Vec::new(),
            components: Vec::new(),
            root: NodeId::NULL,
            block,
        };
        let key = self.actors.insert(actor).unwrap_or_else(|| {
            panic!("Actor table full ({} actors)", self.actors.capacity())
        });
        let id = ActorId::from_key(key);

        let root = self.graph.create_node(id, name);
        if let Some(a) = self.actors.get_mut(key) {
            a.root = root;
        }
        self.graph.set_world_transform(root, desc.transform);

        let _ = self.events.send(SceneEvent::ActorSpawned { actor: id });
        debug!(name, actor = key.index(), "Actor spawned");
        id
    }

    /// Marks `actor` and its attached subtree for end-of-frame destruction.
    ///
    /// Children are queued before their parent so teardown hooks run
    /// leaf-first. Marked actors remain queryable until the reap; the
    /// cached lists are untouched until then. Returns `false` (with a
    /// warning) for an unknown or already-marked actor.
    pub fn destroy_actor(&mut self, actor: ActorId) -> bool {
        match self.actors.get(actor.key()) {
            None => {
                warn!(?actor, "destroy_actor on unknown actor");
                return false;
            }
            Some(a) if a.is_pending_destroy() => {
                warn!(name = %a.name, "destroy_actor on already-marked actor");
                return false;
            }
            Some(_) => {}
        }
        self.mark_destroy_recursive(actor);
        true
    }

    fn mark_destroy_recursive(&mut self, actor: ActorId) {
        let children = self
            .actors
            .get(actor.key())
            .map(|a| a.children.clone())
            .unwrap_or_default();
        for child in children {
            let already = self
                .actors
                .get(child.key())
                .is_some_and(Actor::is_pending_destroy);
            if !already {
                self.mark_destroy_recursive(child);
            }
        }
        if let Some(a) = self.actors.get_mut(actor.key()) {
            a.flags.insert(ActorFlags::PENDING_DESTROY);
            self.pending_destroy.push(actor);
        }
    }

    /// Reaps everything marked this frame. Returns the number of actors
    /// destroyed.
    ///
    /// Per reaped actor, hooks fire in teardown order: `on_stop_play` (if
    /// playing), `on_removed_from_level` (if resident), then `on_destroy`,
    /// after which nodes are removed and arena charges released. The cached
    /// capability lists are rebuilt once at the end, never mid-reap.
    pub fn cleanup_pending_destroy(&mut self) -> usize {
        let marked = mem::take(&mut self.pending_destroy);
        let mut reaped = 0;
        for actor in marked {
            if self.reap_actor(actor) {
                reaped += 1;
            }
        }

        let dead_levels = mem::take(&mut self.pending_destroy_levels);
        let removed_levels = !dead_levels.is_empty();
        for level in dead_levels {
            if let Some(slot) = self.levels.get_mut(level.index() as usize) {
                if let Some(l) = slot.take() {
                    info!(name = %l.name(), "Level removed");
                }
            }
        }

        if reaped > 0 || removed_levels {
            self.refresh_actor_lists();
        }
        reaped
    }

    fn reap_actor(&mut self, actor: ActorId) -> bool {
        let Some(mut a) = self.actors.remove(actor.key()) else {
            // Already reaped as part of a level teardown this frame.
            return false;
        };
        debug_assert!(a.is_pending_destroy());

        if a.has_started_play() {
            a.fan_out_stop_play();
        }
        if a.flags.contains(ActorFlags::ADDED_TO_LEVEL) {
            a.fan_out_removed_from_level();
        }

        if let Some(level) = a.level {
            if let Some(Some(l)) = self.levels.get_mut(level.index() as usize) {
                l.remove(actor);
            }
        }
        if let Some(parent) = a.parent {
            if let Some(p) = self.actors.get_mut(parent.key()) {
                p.children.retain(|c| *c != actor);
            }
        }
        for child in &a.children {
            if let Some(c) = self.actors.get_mut(child.key()) {
                c.parent = None;
            }
        }

        for mut record in a.components.drain(..) {
            record.behavior.on_destroy();
            if let Some(node) = record.node {
                self.graph.remove_node(node);
            }
            if let Err(err) = self.arena.deallocate(record.block) {
                error!(name = %record.name, %err, "Component block release failed");
            }
        }

        self.graph.remove_node(a.root);
        if let Err(err) = self.arena.deallocate(a.block) {
            error!(name = %a.name, %err, "Actor block release failed");
        }

        let _ = self.events.send(SceneEvent::ActorDestroyed { actor });
        debug!(name = %a.name, "Actor reaped");
        true
    }

    // ========================================================================
    // Components
    // ========================================================================

    /// Adds a non-spatial component to `actor`.
    ///
    /// The component is charged to the arena, initialized, and caught up to
    /// the actor's current lifecycle state: residency and play transitions
    /// that already happened fire immediately, in order. Returns `false`
    /// (with a warning) for an unknown actor.
    ///
    /// # Panics
    ///
    /// Panics if the actor already owns a component named `name`.
    pub fn add_component(
        &mut self,
        actor: ActorId,
        name: &str,
        behavior: Box<dyn Component>,
    ) -> bool {
        self.install_component(actor, name, behavior, None).is_some()
    }

    /// Adds a spatial component to `actor`, returning its node.
    ///
    /// The node starts as a child of the actor's root with an identity
    /// local transform; callers position it through the graph afterwards.
    /// Lifecycle catch-up matches [`World::add_component`]. Returns `None`
    /// (with a warning) for an unknown actor.
    ///
    /// # Panics
    ///
    /// Panics if the actor already owns a component named `name`.
    pub fn add_spatial_component(
        &mut self,
        actor: ActorId,
        name: &str,
        behavior: Box<dyn Component>,
    ) -> Option<NodeId> {
        let Some(root) = self.actors.get(actor.key()).map(|a| a.root) else {
            warn!(?actor, name, "add_spatial_component on unknown actor");
            return None;
        };
        let node = self.graph.create_node(actor, name);
        self.graph.attach(node, root, AttachMode::ResetTransform);
        let installed = self.install_component(actor, name, behavior, Some(node));
        if installed.is_none() {
            self.graph.remove_node(node);
            return None;
        }
        Some(node)
    }

    fn install_component(
        &mut self,
        actor: ActorId,
        name: &str,
        behavior: Box<dyn Component>,
        node: Option<NodeId>,
    ) -> Option<()> {
        let Some(a) = self.actors.get(actor.key()) else {
            warn!(?actor, name, "add_component on unknown actor");
            return None;
        };
        assert!(
            !a.has_component(name),
            "Actor '{}' already owns a component named '{name}'",
            a.name
        );

        let block = self.arena.allocate(mem::size_of::<ComponentRecord>());
        let mut record = ComponentRecord {
            name: name.to_owned(),
            behavior,
            node,
            block,
            added_to_level: false,
        };

        // Late joiners are caught up to the actor's current state, in
        // lifecycle order.
        record.behavior.on_initialize();
        let a = self.actors.get_mut(actor.key())?;
        if a.flags.contains(ActorFlags::ADDED_TO_LEVEL) {
            record.behavior.on_added_to_level();
            record.added_to_level = true;
        }
        if a.has_started_play() {
            record.behavior.on_start_play();
        }
        a.components.push(record);
        Some(())
    }

    // ========================================================================
    // Levels
    // ========================================================================

    /// Creates a level. Returns `None` (with a warning) if the name is
    /// already taken.
    pub fn create_level(&mut self, name: &str) -> Option<LevelId> {
        let taken = self
            .levels
            .iter()
            .flatten()
            .any(|l| l.name() == name);
        if taken {
            warn!(name, "create_level with duplicate name");
            return None;
        }
        let id = LevelId::from_index(u32::try_from(self.levels.len()).ok()?);
        self.levels.push(Some(Level::new(name)));
        let _ = self.events.send(SceneEvent::LevelCreated { level: id });
        info!(name, level = id.index(), "Level created");
        Some(id)
    }

    /// Marks a level and all its resident actors for end-of-frame removal.
    ///
    /// Returns `false` (with a warning) for the persistent level or an
    /// unknown level.
    pub fn remove_level(&mut self, level: LevelId) -> bool {
        if level == Self::PERSISTENT_LEVEL {
            warn!("remove_level on the persistent level ignored");
            return false;
        }
        let residents = match self.levels.get_mut(level.index() as usize) {
            Some(Some(l)) => {
                l.mark_pending_destroy();
                l.actors().to_vec()
            }
            _ => {
                warn!(level = level.index(), "remove_level on unknown level");
                return false;
            }
        };
        for actor in residents {
            let already = self
                .actors
                .get(actor.key())
                .is_some_and(Actor::is_pending_destroy);
            if !already {
                self.mark_destroy_recursive(actor);
            }
        }
        self.pending_destroy_levels.push(level);
        true
    }

    /// Makes `actor` resident in `level`, firing `on_added_to_level` on its
    /// components and catching it up to play if the world has started.
    ///
    /// Returns `false` (with a warning) for an unknown actor or level.
    ///
    /// # Panics
    ///
    /// Panics if the actor is already resident in a level.
    pub fn add_actor_to_level(&mut self, actor: ActorId, level: LevelId) -> bool {
        if !self.actors.contains(actor.key()) {
            warn!(?actor, "add_actor_to_level on unknown actor");
            return false;
        }
        let Some(Some(l)) = self.levels.get_mut(level.index() as usize) else {
            warn!(level = level.index(), "add_actor_to_level on unknown level");
            return false;
        };

        let Some(a) = self.actors.get_mut(actor.key()) else {
            return false;
        };
        assert!(
            a.level.is_none(),
            "Actor '{}' is already resident in a level",
            a.name
        );
        l.insert(actor);
        a.level = Some(level);
        a.fan_out_added_to_level();

        if self.has_started_play && a.flags.contains(ActorFlags::WANTS_START_STOP_PLAY) {
            a.fan_out_start_play();
        }
        self.refresh_actor_lists();
        true
    }

    // ========================================================================
    // Actor attachment
    // ========================================================================

    /// Attaches `child` under `parent`, routing the spatial relationship
    /// through both actors' root nodes with the given policy.
    ///
    /// Mirrors the node-level guards: unknown ids, self-attach, and a full
    /// parent (bounded by `MAX_CHILD_ACTORS`) are warned and ignored, and
    /// attaching to one's own direct child detaches that child first.
    pub fn attach_actor(&mut self, child: ActorId, parent: ActorId, mode: AttachMode) -> bool {
        if child == parent {
            warn!(?child, "attach_actor to self ignored");
            return false;
        }
        if !self.actors.contains(child.key()) || !self.actors.contains(parent.key()) {
            warn!(?child, ?parent, "attach_actor with unknown actor");
            return false;
        }

        // All rejection paths are checked before any structural change so a
        // failed attach leaves both the actor tree and the node tree
        // untouched. A child re-attached to its current parent does not
        // consume a new slot.
        let parent_full = self.actors.get(parent.key()).is_some_and(|p| {
            p.children.len() >= MAX_CHILD_ACTORS && !p.children.contains(&child)
        });
        if parent_full {
            warn!(?child, ?parent, "attach_actor to full parent ignored");
            return false;
        }

        let reverse = self
            .actors
            .get(child.key())
            .is_some_and(|a| a.children.contains(&parent));
        if reverse {
            self.detach_actor(parent);
        }
        self.detach_actor(child);

        let (child_root, parent_root) = {
            let c = self.actors.get(child.key()).map(|a| a.root);
            let p = self.actors.get(parent.key()).map(|a| a.root);
            match (c, p) {
                (Some(c), Some(p)) => (c, p),
                _ => return false,
            }
        };
        // The actor-level linkage is committed only once the node-level
        // attach has gone through; a graph rejection (such as a root node
        // whose child list is already full of spatial components) must not
        // leave the two trees disagreeing.
        if !self.graph.attach(child_root, parent_root, mode) {
            return false;
        }
        if let Some(p) = self.actors.get_mut(parent.key()) {
            p.children.push(child);
        }
        if let Some(c) = self.actors.get_mut(child.key()) {
            c.parent = Some(parent);
        }
        true
    }

    /// Detaches `child` from its parent actor; no-op if not attached.
    ///
    /// The child's root node becomes a hierarchy root again, keeping its
    /// world transform.
    pub fn detach_actor(&mut self, child: ActorId) {
        let Some(parent) = self.actors.get(child.key()).and_then(|a| a.parent) else {
            return;
        };
        if let Some(p) = self.actors.get_mut(parent.key()) {
            p.children.retain(|c| *c != child);
        }
        let root = self.actors.get_mut(child.key()).map(|c| {
            c.parent = None;
            c.root
        });
        if let Some(root) = root {
            self.graph.detach(root);
        }
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Starts play: fires `on_start_play` across every opted-in resident
    /// actor that has not already started. Idempotent per actor.
    pub fn dispatch_start_play(&mut self) {
        self.has_started_play = true;
        for i in 0..self.start_stop_list.len() {
            let id = self.start_stop_list[i];
            if let Some(a) = self.actors.get_mut(id.key()) {
                if !a.is_pending_destroy() && !a.has_started_play() {
                    a.fan_out_start_play();
                }
            }
        }
    }

    /// Stops play: fires `on_stop_play` across every actor currently
    /// playing.
    pub fn dispatch_stop_play(&mut self) {
        self.has_started_play = false;
        for i in 0..self.start_stop_list.len() {
            let id = self.start_stop_list[i];
            if let Some(a) = self.actors.get_mut(id.key()) {
                if !a.is_pending_destroy() && a.has_started_play() {
                    a.fan_out_stop_play();
                }
            }
        }
    }

    /// Ticks every eligible actor once with `delta_time` seconds.
    ///
    /// Eligibility: wants tick, not marked for destruction, and (for
    /// actors participating in play transitions) play has actually started.
    pub fn dispatch_tick_update(&mut self, delta_time: f32) {
        for i in 0..self.tick_list.len() {
            let id = self.tick_list[i];
            if let Some(a) = self.actors.get_mut(id.key()) {
                if a.is_pending_destroy() {
                    continue;
                }
                if a.flags.contains(ActorFlags::WANTS_START_STOP_PLAY) && !a.has_started_play() {
                    continue;
                }
                a.fan_out_tick(delta_time);
            }
        }
    }

    /// Rebuilds the cached capability lists from level membership.
    ///
    /// Called on residency changes and after each reap, never mid-frame by
    /// dispatch. Marked actors are excluded.
    fn refresh_actor_lists(&mut self) {
        self.all_actors.clear();
        self.tick_list.clear();
        self.start_stop_list.clear();
        for level in self.levels.iter().flatten() {
            for &id in level.actors() {
                let Some(a) = self.actors.get(id.key()) else {
                    continue;
                };
                if a.is_pending_destroy() {
                    continue;
                }
                self.all_actors.push(id);
                if a.flags.contains(ActorFlags::WANTS_TICK) {
                    self.tick_list.push(id);
                }
                if a.flags.contains(ActorFlags::WANTS_START_STOP_PLAY) {
                    self.start_stop_list.push(id);
                }
            }
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// All level-resident actors not marked for destruction, as of the last
    /// list refresh.
    #[must_use]
    pub fn all_actors(&self) -> &[ActorId] {
        &self.all_actors
    }

    /// Looks up an actor. Marked-for-destruction actors are still returned
    /// until the reap.
    #[must_use]
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id.key())
    }

    /// Returns the number of live actors, marked ones included.
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.actors.live_count()
    }

    /// Looks up a level.
    #[must_use]
    pub fn level(&self, id: LevelId) -> Option<&Level> {
        self.levels.get(id.index() as usize).and_then(Option::as_ref)
    }

    /// Finds a level by name.
    #[must_use]
    pub fn level_by_name(&self, name: &str) -> Option<LevelId> {
        self.levels.iter().enumerate().find_map(|(i, slot)| {
            slot.as_ref()
                .filter(|l| l.name() == name)
                .and_then(|_| u32::try_from(i).ok())
                .map(LevelId::from_index)
        })
    }

    /// Returns an actor's world transform via its root node.
    #[must_use]
    pub fn actor_world_transform(&self, id: ActorId) -> Option<Transform> {
        let root = self.actors.get(id.key())?.root;
        self.graph.world_transform(root)
    }

    /// Returns an actor's world position via its root node.
    #[must_use]
    pub fn actor_world_position(&self, id: ActorId) -> Option<Vec3> {
        self.actor_world_transform(id).map(|t| t.position)
    }

    /// Returns an actor's local transform via its root node.
    #[must_use]
    pub fn actor_local_transform(&self, id: ActorId) -> Option<Transform> {
        let root = self.actors.get(id.key())?.root;
        self.graph.local_transform(root)
    }

    /// Writes an actor's world transform through its root node, resolving
    /// and propagating immediately. Returns `false` for an unknown actor.
    pub fn set_actor_world_transform(&mut self, id: ActorId, transform: Transform) -> bool {
        let Some(root) = self.actors.get(id.key()).map(|a| a.root) else {
            warn!(?id, "set_actor_world_transform on unknown actor");
            return false;
        };
        self.graph.set_world_transform(root, transform)
    }

    /// Writes an actor's local transform through its root node. Returns
    /// `false` for an unknown actor.
    pub fn set_actor_local_transform(&mut self, id: ActorId, transform: Transform) -> bool {
        let Some(root) = self.actors.get(id.key()).map(|a| a.root) else {
            warn!(?id, "set_actor_local_transform on unknown actor");
            return false;
        };
        self.graph.set_local_transform(root, transform)
    }

    /// Read access to the transform hierarchy.
    #[must_use]
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Write access to the transform hierarchy, for direct node-level
    /// manipulation of spatial components.
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    /// The actor arena, for diagnostics.
    #[must_use]
    pub fn arena(&self) -> &BlockArena {
        &self.arena
    }

    /// The configuration this world was built from.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Creates a receiver for scene change notifications.
    #[must_use]
    pub fn events(&self) -> EventReceiver {
        self.bus.receiver()
    }

    /// Whether play has started and not been stopped.
    #[must_use]
    pub const fn has_started_play(&self) -> bool {
        self.has_started_play
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::new(WorldConfig {
            name: "Test".to_owned(),
            actor_arena_bytes: 64 * 1024,
            max_actors: 128,
            max_nodes: 256,
            event_capacity: 1024,
            ..WorldConfig::default()
        })
    }

    fn spawn(w: &mut World, name: &str) -> ActorId {
        let id = w.spawn_actor(name, ActorSpawnDesc::default());
        assert!(w.add_actor_to_level(id, World::PERSISTENT_LEVEL));
        id
    }

    #[test]
    fn test_spawn_is_not_resident_until_added() {
        let mut w = world();
        let a = w.spawn_actor("A", ActorSpawnDesc::default());

        assert_eq!(w.actor_count(), 1);
        assert!(w.all_actors().is_empty());
        assert_eq!(w.actor(a).unwrap().level(), None);

        assert!(w.add_actor_to_level(a, World::PERSISTENT_LEVEL));
        assert_eq!(w.all_actors(), &[a]);
        assert_eq!(w.level(World::PERSISTENT_LEVEL).unwrap().actor_count(), 1);
        assert_eq!(w.actor(a).unwrap().level(), Some(World::PERSISTENT_LEVEL));
    }

    #[test]
    fn test_destroy_is_deferred_until_cleanup() {
        let mut w = world();
        let a = spawn(&mut w, "A");

        assert!(w.destroy_actor(a));
        // Marked but still queryable; lists untouched.
        assert!(w.actor(a).unwrap().is_pending_destroy());
        assert_eq!(w.all_actors(), &[a]);

        assert_eq!(w.cleanup_pending_destroy(), 1);
        assert!(w.actor(a).is_none());
        assert!(w.all_actors().is_empty());
        assert_eq!(w.level(World::PERSISTENT_LEVEL).unwrap().actor_count(), 0);
    }

    #[test]
    fn test_double_destroy_is_rejected() {
        let mut w = world();
        let a = spawn(&mut w, "A");
        assert!(w.destroy_actor(a));
        assert!(!w.destroy_actor(a));
        assert_eq!(w.cleanup_pending_destroy(), 1);
    }

    #[test]
    fn test_destroy_subtree_marks_children_first() {
        let mut w = world();
        let parent = spawn(&mut w, "P");
        let child = spawn(&mut w, "C");
        assert!(w.attach_actor(child, parent, AttachMode::ResetTransform));

        assert!(w.destroy_actor(parent));
        assert!(w.actor(child).unwrap().is_pending_destroy());
        assert_eq!(w.cleanup_pending_destroy(), 2);
        assert_eq!(w.actor_count(), 0);
        assert_eq!(w.graph().node_count(), 0);
    }

    #[test]
    fn test_attach_actor_to_full_parent_leaves_both_trees_untouched() {
        let mut w = world();
        let full_parent = w.spawn_actor("Full", ActorSpawnDesc::default());
        for _ in 0..MAX_CHILD_ACTORS {
            let filler = w.spawn_actor("Filler", ActorSpawnDesc::default());
            assert!(w.attach_actor(filler, full_parent, AttachMode::KeepWorldTransform));
        }

        let old_parent = w.spawn_actor("OldParent", ActorSpawnDesc::default());
        let child = w.spawn_actor("Child", ActorSpawnDesc::default());
        assert!(w.attach_actor(child, old_parent, AttachMode::KeepWorldTransform));

        assert!(!w.attach_actor(child, full_parent, AttachMode::KeepWorldTransform));

        // Rejection must not have orphaned the child on either tree.
        assert_eq!(w.actor(child).unwrap().parent(), Some(old_parent));
        assert!(w.actor(old_parent).unwrap().children().contains(&child));
        assert_eq!(
            w.actor(full_parent).unwrap().children().len(),
            MAX_CHILD_ACTORS
        );
        let child_root = w.actor(child).unwrap().root_node();
        let old_root = w.actor(old_parent).unwrap().root_node();
        assert_eq!(w.graph().node(child_root).unwrap().parent(), Some(old_root));
    }

    #[test]
    fn test_arena_charges_are_released_on_reap() {
        let mut w = world();
        let before = w.arena().allocated_bytes();
        let a = spawn(&mut w, "A");
        assert!(w.arena().allocated_bytes() > before);

        w.destroy_actor(a);
        w.cleanup_pending_destroy();
        assert_eq!(w.arena().allocated_bytes(), before);
    }

    #[test]
    fn test_remove_level_destroys_residents() {
        let mut w = world();
        let level = w.create_level("Dungeon").unwrap();
        let a = w.spawn_actor("A", ActorSpawnDesc::default());
        w.add_actor_to_level(a, level);
        let keeper = spawn(&mut w, "K");

        assert!(w.remove_level(level));
        assert_eq!(w.cleanup_pending_destroy(), 1);
        assert!(w.actor(a).is_none());
        assert!(w.level(level).is_none());
        assert!(w.actor(keeper).is_some());
        assert_eq!(w.all_actors(), &[keeper]);
    }

    #[test]
    fn test_persistent_level_cannot_be_removed() {
        let mut w = world();
        assert!(!w.remove_level(World::PERSISTENT_LEVEL));
    }

    #[test]
    fn test_duplicate_level_name_is_rejected() {
        let mut w = world();
        assert!(w.create_level("Dungeon").is_some());
        assert!(w.create_level("Dungeon").is_none());
        assert!(w.level_by_name("Dungeon").is_some());
    }

    #[test]
    fn test_actor_ids_are_not_resurrected() {
        let mut w = world();
        let a = spawn(&mut w, "A");
        w.destroy_actor(a);
        w.cleanup_pending_destroy();

        let b = spawn(&mut w, "B");
        // Slot reuse must not make the stale handle valid again.
        assert_ne!(a, b);
        assert!(w.actor(a).is_none());
        assert!(w.actor(b).is_some());
    }

    #[test]
    fn test_spawn_transform_lands_on_root_node() {
        let mut w = world();
        let a = w.spawn_actor(
            "A",
            ActorSpawnDesc {
                transform: Transform::from_position(Vec3::new(1.0, 2.0, 3.0)),
                ..ActorSpawnDesc::default()
            },
        );
        assert_eq!(w.actor_world_position(a), Some(Vec3::new(1.0, 2.0, 3.0)));
    }
}
