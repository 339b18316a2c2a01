//! Frame-sampled tween engine.
//!
//! Every gem transition is a [`Task`] record held by the [`Animator`]. The game
//! loop calls [`Animator::tick`] once per frame with the current time; each
//! task is sampled, written into its entity, and dropped once finished. Time is
//! always passed in, so tests drive the engine with a virtual clock.
//!
//! A task waits until `created_at + delay`, records its start time at the
//! first sample after that, and finishes when `elapsed >= duration`. On the
//! finishing sample progress is clamped to 1 and the entity is snapped to its
//! exact target so no interpolation residue survives.
//!
//! Per-frame drifts ("rotate by 0.1 every frame") are expressed against a
//! nominal 60 Hz frame so results do not depend on the tick rate.
//!
//! An entity is driven by one task at a time: scheduling a new task on it
//! finishes the old one on the spot and reports its completion on the next
//! tick.

use std::f32::consts::PI;

use glam::Vec3;

use crate::config::AnimationTimings;
use crate::easing::{self, Easing};
use crate::scene::{EntityId, ERROR_TINT, NEUTRAL_TINT, Scene};

/// Nominal frame length used to convert per-frame drifts to time.
pub const FRAME_MS: f64 = 1000.0 / 60.0;

const INVALID_MOVE_SPLIT: f32 = 0.25;
const INVALID_MOVE_REACH: f32 = 0.2;
const WIGGLE_FREQ: f32 = 12.0;
const WIGGLE_AMPLITUDE: f32 = 0.08;
const DISAPPEAR_DRIFT: Vec3 = Vec3::new(0.1, 0.15, 0.05);
const DISAPPEAR_LIFT: f32 = 0.5;
const FALL_SQUASH: f32 = 0.1;
const FALL_SPIN: f32 = 0.02;
const APPEAR_POP_SPIN: f32 = 0.2;
const APPEAR_FALL_SPIN: f32 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

/// Signal emitted on the frame a task finishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    SwapFinished { a: EntityId, b: EntityId },
    InvalidMoveFinished { a: EntityId, b: EntityId },
    /// The entity should now be removed from the scene.
    Disappeared(EntityId),
    Landed(EntityId),
    Appeared(EntityId),
}

#[derive(Clone, Copy, Debug)]
enum TaskKind {
    Swap {
        a: EntityId,
        b: EntityId,
        from_a: Vec3,
        from_b: Vec3,
    },
    InvalidMove {
        a: EntityId,
        b: EntityId,
        origin_a: Vec3,
        origin_b: Vec3,
    },
    Disappear {
        entity: EntityId,
        origin: Vec3,
        origin_rotation: Vec3,
        origin_scale: f32,
    },
    Fall {
        entity: EntityId,
        start_y: f32,
        end_y: f32,
        origin_spin: f32,
    },
    Appear {
        entity: EntityId,
        start_y: f32,
        end_y: f32,
        pop_ms: f64,
    },
}

impl TaskKind {
    fn targets(&self, id: EntityId) -> bool {
        match *self {
            Self::Swap { a, b, .. } | Self::InvalidMove { a, b, .. } => a == id || b == id,
            Self::Disappear { entity, .. }
            | Self::Fall { entity, .. }
            | Self::Appear { entity, .. } => entity == id,
        }
    }

    fn completion(&self) -> Completion {
        match *self {
            Self::Swap { a, b, .. } => Completion::SwapFinished { a, b },
            Self::InvalidMove { a, b, .. } => Completion::InvalidMoveFinished { a, b },
            Self::Disappear { entity, .. } => Completion::Disappeared(entity),
            Self::Fall { entity, .. } => Completion::Landed(entity),
            Self::Appear { entity, .. } => Completion::Appeared(entity),
        }
    }
}

#[derive(Clone, Debug)]
struct Task {
    id: TaskId,
    kind: TaskKind,
    ready_at: f64,
    duration: f64,
    easing: Easing,
    start: Option<f64>,
}

enum Step {
    Running,
    Done,
}

pub struct Animator {
    tasks: Vec<Task>,
    /// Completions of tasks cut short by a newer task on the same entity.
    superseded: Vec<Completion>,
    next_id: u64,
    timings: AnimationTimings,
}

impl Animator {
    pub fn new(timings: AnimationTimings) -> Self {
        Self {
            tasks: Vec::new(),
            superseded: Vec::new(),
            next_id: 0,
            timings,
        }
    }

    pub fn timings(&self) -> &AnimationTimings {
        &self.timings
    }

    /// Finish every task touching `ids` right away, snapping to its end pose.
    /// An entity is driven by at most one task at a time.
    fn supersede(&mut self, scene: &mut Scene, ids: &[EntityId]) {
        let mut i = 0;
        while i < self.tasks.len() {
            if ids.iter().any(|id| self.tasks[i].kind.targets(*id)) {
                let mut task = self.tasks.remove(i);
                sample(&mut task, 0.0, scene, true);
                self.superseded.push(task.kind.completion());
            } else {
                i += 1;
            }
        }
    }

    fn push(&mut self, kind: TaskKind, now: f64, delay: f64, duration: f64, easing: Easing) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(Task {
            id,
            kind,
            ready_at: now + delay.max(0.0),
            duration,
            easing,
            start: None,
        });
        id
    }

    /// Both gems glide linearly into each other's place.
    pub fn swap(&mut self, scene: &mut Scene, a: EntityId, b: EntityId, now: f64) -> Option<TaskId> {
        self.supersede(scene, &[a, b]);
        let from_a = scene.get(a)?.transform.position;
        let from_b = scene.get(b)?.transform.position;
        let kind = TaskKind::Swap { a, b, from_a, from_b };
        Some(self.push(kind, now, 0.0, self.timings.swap_ms, Easing::Linear))
    }

    /// Nudge toward each other, wiggle, spring back. Both gems are tinted for
    /// the whole duration.
    pub fn invalid_move(&mut self, scene: &mut Scene, a: EntityId, b: EntityId, now: f64) -> Option<TaskId> {
        self.supersede(scene, &[a, b]);
        let origin_a = scene.get(a)?.transform.position;
        let origin_b = scene.get(b)?.transform.position;
        for id in [a, b] {
            if let Some(e) = scene.get_mut(id) {
                e.visual.tint = ERROR_TINT;
            }
        }
        let kind = TaskKind::InvalidMove {
            a,
            b,
            origin_a,
            origin_b,
        };
        Some(self.push(kind, now, 0.0, self.timings.invalid_move_ms, Easing::OutCubic))
    }

    pub fn disappear(&mut self, scene: &mut Scene, entity: EntityId, delay: f64, now: f64) -> Option<TaskId> {
        self.supersede(scene, &[entity]);
        let t = scene.get(entity)?.transform;
        let kind = TaskKind::Disappear {
            entity,
            origin: t.position,
            origin_rotation: t.rotation,
            origin_scale: t.scale.x,
        };
        Some(self.push(kind, now, delay, self.timings.disappear_ms, Easing::InBack))
    }

    pub fn fall(&mut self, scene: &mut Scene, entity: EntityId, start_y: f32, end_y: f32, delay: f64, now: f64) -> Option<TaskId> {
        self.supersede(scene, &[entity]);
        let origin_spin = scene.get(entity)?.transform.rotation.z;
        let kind = TaskKind::Fall {
            entity,
            start_y,
            end_y,
            origin_spin,
        };
        let easing = Easing::bounce(self.timings.bounce);
        Some(self.push(kind, now, delay, self.timings.fall_ms, easing))
    }

    /// Pop in at the spawn point, then bounce down into the cell.
    pub fn appear(&mut self, scene: &mut Scene, entity: EntityId, start_y: f32, end_y: f32, delay: f64, now: f64) -> Option<TaskId> {
        self.supersede(scene, &[entity]);
        scene.get(entity)?;
        let pop_ms = self.timings.appear_pop_ms;
        let kind = TaskKind::Appear {
            entity,
            start_y,
            end_y,
            pop_ms,
        };
        let total = pop_ms + self.timings.appear_fall_ms;
        let easing = Easing::bounce(self.timings.bounce);
        Some(self.push(kind, now, delay, total, easing))
    }

    /// Sample every task once. Finished tasks are removed and reported.
    pub fn tick(&mut self, now: f64, scene: &mut Scene) -> Vec<Completion> {
        let mut done = std::mem::take(&mut self.superseded);
        self.tasks.retain_mut(|task| {
            if now < task.ready_at {
                return true;
            }
            match sample(task, now, scene, false) {
                Step::Running => true,
                Step::Done => {
                    done.push(task.kind.completion());
                    false
                }
            }
        });
        done
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty() && self.superseded.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Whether any task (running or still delayed) targets `entity`.
    pub fn is_animating(&self, entity: EntityId) -> bool {
        self.tasks.iter().any(|t| t.kind.targets(entity))
    }

    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    /// Abandon every task. Entities keep whatever pose they had.
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.superseded.clear();
    }
}

fn frames(ms: f64) -> f32 {
    (ms / FRAME_MS) as f32
}

fn sample(task: &mut Task, now: f64, scene: &mut Scene, force_finish: bool) -> Step {
    let start = *task.start.get_or_insert(now);
    let elapsed = (now - start).max(0.0);
    let p = if force_finish || task.duration <= 0.0 {
        1.0
    } else {
        (elapsed / task.duration).clamp(0.0, 1.0) as f32
    };
    let finished = p >= 1.0;

    match task.kind {
        TaskKind::Swap { a, b, from_a, from_b } => {
            let t = task.easing.sample(p);
            if let Some(e) = scene.get_mut(a) {
                e.transform.position = if finished { from_b } else { from_a.lerp(from_b, t) };
            }
            if let Some(e) = scene.get_mut(b) {
                e.transform.position = if finished { from_a } else { from_b.lerp(from_a, t) };
            }
        }
        TaskKind::InvalidMove {
            a,
            b,
            origin_a,
            origin_b,
        } => {
            for (id, origin, other) in [(a, origin_a, origin_b), (b, origin_b, origin_a)] {
                let Some(e) = scene.get_mut(id) else { continue };
                if finished {
                    e.transform.position = origin;
                    e.visual.tint = NEUTRAL_TINT;
                    continue;
                }
                e.transform.position = invalid_move_position(origin, other, p, task.easing);
            }
        }
        TaskKind::Disappear {
            entity,
            origin,
            origin_rotation,
            origin_scale,
        } => {
            let Some(e) = scene.get_mut(entity) else {
                return Step::Done;
            };
            let eased = task.easing.sample(p);
            let scale = (1.0 - eased) * origin_scale;
            e.transform.scale = Vec3::splat(scale.max(0.0));
            e.transform.rotation = origin_rotation + DISAPPEAR_DRIFT * frames(elapsed.min(task.duration));
            e.transform.position.y = origin.y + eased * DISAPPEAR_LIFT;
            e.visual.opacity = (1.0 - eased).clamp(0.0, 1.0);
            if finished {
                e.transform.scale = Vec3::ZERO;
                e.visual.opacity = 0.0;
            }
        }
        TaskKind::Fall {
            entity,
            start_y,
            end_y,
            origin_spin,
        } => {
            let Some(e) = scene.get_mut(entity) else {
                return Step::Done;
            };
            if finished {
                e.transform.position.y = end_y;
                e.transform.scale = Vec3::ONE;
                e.transform.rotation = Vec3::ZERO;
            } else {
                let eased = task.easing.sample(p);
                e.transform.position.y = start_y + (end_y - start_y) * eased;
                let squash = 1.0 + (p * PI * 3.0).sin() * FALL_SQUASH * (1.0 - p);
                e.transform.scale = Vec3::new(1.0, squash, 1.0);
                // Integral of a per-frame spin that decays linearly with progress.
                let total = frames(task.duration);
                e.transform.rotation.z = origin_spin + FALL_SPIN * total * (p - p * p / 2.0);
            }
        }
        TaskKind::Appear {
            entity,
            start_y,
            end_y,
            pop_ms,
        } => {
            let Some(e) = scene.get_mut(entity) else {
                return Step::Done;
            };
            if finished {
                e.transform.position.y = end_y;
                e.transform.scale = Vec3::ONE;
                e.transform.rotation = Vec3::ZERO;
                e.visual.opacity = 1.0;
                e.visual.tint = NEUTRAL_TINT;
            } else if elapsed < pop_ms {
                let q = (elapsed / pop_ms) as f32;
                e.transform.scale = Vec3::splat(easing::ease_out_back(q));
                e.visual.opacity = q;
                e.transform.position.y = start_y;
                e.transform.rotation.y = APPEAR_POP_SPIN * frames(elapsed);
            } else {
                let fall_ms = (task.duration - pop_ms).max(f64::EPSILON);
                let q = ((elapsed - pop_ms) / fall_ms).clamp(0.0, 1.0) as f32;
                e.transform.scale = Vec3::ONE;
                e.visual.opacity = 1.0;
                e.transform.position.y = start_y + (end_y - start_y) * task.easing.sample(q);
                e.transform.rotation.y = APPEAR_POP_SPIN * frames(pop_ms)
                    + APPEAR_FALL_SPIN * frames(fall_ms) * (q - q * q / 2.0);
            }
        }
    }

    if finished { Step::Done } else { Step::Running }
}

fn invalid_move_position(origin: Vec3, other: Vec3, p: f32, nudge: Easing) -> Vec3 {
    let reach = origin.lerp(other, INVALID_MOVE_REACH);
    if p < INVALID_MOVE_SPLIT {
        let eased = nudge.sample(p / INVALID_MOVE_SPLIT);
        return origin.lerp(other, eased * INVALID_MOVE_REACH);
    }
    let w = (p - INVALID_MOVE_SPLIT) / (1.0 - INVALID_MOVE_SPLIT);
    let amp = WIGGLE_AMPLITUDE * (1.0 - w);
    let wiggle_x = (w * WIGGLE_FREQ * PI).sin() * amp;
    let wiggle_y = (w * WIGGLE_FREQ * PI * 0.7).cos() * amp * 0.5;
    let back = reach.lerp(origin, easing::ease_out_elastic(w));
    back + Vec3::new(wiggle_x, wiggle_y, 0.0)
}
