use glam::Vec3;

use crate::app::{EntityId, SceneWorld};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: EntityId,
    pub point: Vec3,
    pub distance: f32,
}

/// Boundary to whatever answers ray queries against world geometry.
pub trait RayCaster {
    fn cast_ray(&self, world: &SceneWorld, ray: Ray, max_distance: f32) -> Option<RayHit>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Collider {
    Sphere { radius: f32 },
    /// Axis-aligned in world space, centred on the entity's world position.
    Box { half_extents: Vec3 },
}

#[derive(Debug, Default)]
pub struct ColliderSet {
    colliders: Vec<(EntityId, Collider)>,
}

impl ColliderSet {
    pub fn insert(&mut self, entity: EntityId, collider: Collider) {
        self.colliders.retain(|(existing, _)| *existing != entity);
        self.colliders.push((entity, collider));
    }

    pub fn remove(&mut self, entity: EntityId) -> bool {
        let before = self.colliders.len();
        self.colliders.retain(|(existing, _)| *existing != entity);
        self.colliders.len() != before
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }
}

impl RayCaster for ColliderSet {
    fn cast_ray(&self, world: &SceneWorld, ray: Ray, max_distance: f32) -> Option<RayHit> {
        let direction = ray.direction.try_normalize()?;
        let mut best: Option<RayHit> = None;

        for (entity, collider) in &self.colliders {
            let Some(center) = world.world_position(*entity) else {
                continue;
            };
            let distance = match collider {
                Collider::Sphere { radius } => {
                    intersect_sphere(ray.origin, direction, center, *radius)
                }
                Collider::Box { half_extents } => {
                    intersect_aabb(ray.origin, direction, center, *half_extents)
                }
            };
            let Some(distance) = distance.filter(|distance| *distance <= max_distance) else {
                continue;
            };
            match best {
                Some(hit) if hit.distance <= distance => {}
                _ => {
                    best = Some(RayHit {
                        entity: *entity,
                        point: ray.origin + direction * distance,
                        distance,
                    })
                }
            }
        }

        best
    }
}

fn intersect_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let offset = origin - center;
    let b = offset.dot(direction);
    let c = offset.length_squared() - radius * radius;
    if c > 0.0 && b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    Some((-b - discriminant.sqrt()).max(0.0))
}

fn intersect_aabb(origin: Vec3, direction: Vec3, center: Vec3, half_extents: Vec3) -> Option<f32> {
    let min = center - half_extents;
    let max = center + half_extents;
    let mut t_near = 0.0f32;
    let mut t_far = f32::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() < f32::EPSILON {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t0 = (min[axis] - o) * inv;
        let mut t1 = (max[axis] - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_near = t_near.max(t0);
        t_far = t_far.min(t1);
        if t_near > t_far {
            return None;
        }
    }
    Some(t_near)
}
