use glam::Vec3;

use crate::model::{Drawable, Primitive, Transform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(u64);

/// Anything that lives in the world and ticks once per frame.
pub trait Actor {
    fn update(&mut self, dt: f32);

    fn drawable(&self) -> Option<Drawable> {
        None
    }

    /// Actors this one wants added, collected right after its `update`.
    fn take_spawned(&mut self) -> Vec<Box<dyn Actor>> {
        Vec::new()
    }
}

/// Owns the actors. Actors added during an update pass wait in `pending`
/// until the pass ends so the active list is never grown mid-iteration.
#[derive(Default)]
pub struct ActorList {
    active: Vec<(ActorId, Box<dyn Actor>)>,
    pending: Vec<(ActorId, Box<dyn Actor>)>,
    updating: bool,
    next_id: u64,
}

impl ActorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, actor: Box<dyn Actor>) -> ActorId {
        let id = ActorId(self.next_id);
        self.next_id += 1;
        if self.updating {
            self.pending.push((id, actor));
        } else {
            self.active.push((id, actor));
        }
        id
    }

    /// Removes from pending or active; order is not preserved.
    pub fn remove(&mut self, id: ActorId) -> Option<Box<dyn Actor>> {
        for list in [&mut self.pending, &mut self.active] {
            if let Some(index) = list.iter().position(|(other, _)| *other == id) {
                return Some(list.swap_remove(index).1);
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Ticks every active actor, then promotes whatever was added meanwhile.
    pub fn update(&mut self, dt: f32) {
        self.updating = true;
        let mut spawned = Vec::new();
        for (_, actor) in self.active.iter_mut() {
            actor.update(dt);
            spawned.append(&mut actor.take_spawned());
        }
        for actor in spawned {
            self.add(actor);
        }
        self.updating = false;
        self.active.append(&mut self.pending);
    }

    #[cfg(test)]
    fn with_updating<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.updating = true;
        let result = f(self);
        self.updating = false;
        self.active.append(&mut self.pending);
        result
    }

    pub fn drawables(&self) -> impl Iterator<Item = (ActorId, Drawable)> + '_ {
        self.active
            .iter()
            .filter_map(|(id, actor)| actor.drawable().map(|d| (*id, d)))
    }
}

/// A primitive that optionally spins in place.
#[derive(Debug, Clone)]
pub struct PrimitiveActor {
    pub primitive: Primitive,
    pub transform: Transform,
    pub color: [f32; 4],
    /// Degrees per second about each axis.
    pub spin: Vec3,
}

impl PrimitiveActor {
    pub fn new(primitive: Primitive, transform: Transform, color: [f32; 4]) -> Self {
        Self {
            primitive,
            transform,
            color,
            spin: Vec3::ZERO,
        }
    }

    pub fn with_spin(mut self, degrees_per_second: Vec3) -> Self {
        self.spin = degrees_per_second;
        self
    }
}

impl Actor for PrimitiveActor {
    fn update(&mut self, dt: f32) {
        let r = self.transform.rotation_degrees + self.spin * dt;
        self.transform.rotation_degrees = Vec3::new(r.x % 360.0, r.y % 360.0, r.z % 360.0);
    }

    fn drawable(&self) -> Option<Drawable> {
        Some(Drawable {
            primitive: self.primitive,
            transform: self.transform,
            color: self.color,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Counter(Rc<Cell<u32>>);

    impl Actor for Counter {
        fn update(&mut self, _dt: f32) {
            self.0.set(self.0.get() + 1);
        }
    }

    /// Spawns one `Counter` on its first tick.
    struct Spawner {
        child: Option<Box<dyn Actor>>,
        ready: Vec<Box<dyn Actor>>,
    }

    impl Actor for Spawner {
        fn update(&mut self, _dt: f32) {
            self.ready.extend(self.child.take());
        }

        fn take_spawned(&mut self) -> Vec<Box<dyn Actor>> {
            std::mem::take(&mut self.ready)
        }
    }

    fn counter() -> (Rc<Cell<u32>>, Box<dyn Actor>) {
        let ticks = Rc::new(Cell::new(0));
        (ticks.clone(), Box::new(Counter(ticks)))
    }

    #[test]
    fn update_ticks_active_actors() {
        let mut actors = ActorList::new();
        let (ticks, actor) = counter();
        actors.add(actor);
        actors.update(0.016);
        actors.update(0.016);
        assert_eq!(ticks.get(), 2);
    }

    #[test]
    fn actors_added_while_updating_are_deferred() {
        let mut actors = ActorList::new();
        let (ticks, actor) = counter();

        actors.with_updating(|list| {
            list.add(actor);
            assert_eq!(list.len(), 0);
            assert_eq!(list.pending_len(), 1);
        });

        assert_eq!(actors.len(), 1);
        assert_eq!(actors.pending_len(), 0);
        actors.update(0.016);
        assert_eq!(ticks.get(), 1);
    }

    #[test]
    fn actors_spawned_by_an_actor_join_after_the_pass() {
        let mut actors = ActorList::new();
        let (ticks, child) = counter();
        actors.add(Box::new(Spawner { child: Some(child), ready: Vec::new() }));

        actors.update(0.016);
        assert_eq!(actors.len(), 2);
        assert_eq!(actors.pending_len(), 0);
        assert_eq!(ticks.get(), 0);

        actors.update(0.016);
        assert_eq!(actors.len(), 2);
        assert_eq!(ticks.get(), 1);
    }

    #[test]
    fn remove_finds_active_and_pending() {
        let mut actors = ActorList::new();
        let a = actors.add(counter().1);
        let b = actors.add(counter().1);
        let c = actors.add(counter().1);

        assert!(actors.remove(a).is_some());
        assert!(actors.remove(a).is_none());
        assert_eq!(actors.len(), 2);

        actors.with_updating(|list| {
            let d = list.add(counter().1);
            assert!(list.remove(d).is_some());
            assert_eq!(list.pending_len(), 0);
        });
        assert!(actors.remove(b).is_some());
        assert!(actors.remove(c).is_some());
        assert!(actors.is_empty());
    }

    #[test]
    fn ids_are_unique() {
        let mut actors = ActorList::new();
        let a = actors.add(counter().1);
        actors.remove(a);
        let b = actors.add(counter().1);
        assert_ne!(a, b);
    }

    #[test]
    fn spinning_primitive_rotates_and_draws() {
        let mut actors = ActorList::new();
        let actor = PrimitiveActor::new(Primitive::sphere(), Transform::default(), [1.0; 4])
            .with_spin(Vec3::new(0.0, 90.0, 0.0));
        let id = actors.add(Box::new(actor));
        actors.update(0.5);

        let drawables: Vec<_> = actors.drawables().collect();
        assert_eq!(drawables.len(), 1);
        assert_eq!(drawables[0].0, id);
        assert_eq!(drawables[0].1.transform.rotation_degrees, Vec3::new(0.0, 45.0, 0.0));
    }

    #[test]
    fn plain_actors_are_not_drawn() {
        let mut actors = ActorList::new();
        actors.add(counter().1);
        assert_eq!(actors.drawables().count(), 0);
    }
}
