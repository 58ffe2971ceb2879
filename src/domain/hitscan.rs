use std::f32::consts::TAU;
use std::ops::BitOr;
use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use crate::domain::geometry::LevelGeometry;

pub const DEFAULT_MAX_DISTANCE: f32 = 1000.0;

/// Collision layer bit flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    pub const PLAYER: LayerMask = LayerMask(1);
    pub const ENVIRONMENT: LayerMask = LayerMask(2);
    pub const PROP: LayerMask = LayerMask(4);
    pub const ALL: LayerMask = LayerMask(1 | 2 | 4);

    pub fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for LayerMask {
    type Output = LayerMask;

    fn bitor(self, rhs: LayerMask) -> LayerMask {
        LayerMask(self.0 | rhs.0)
    }
}

/// Upright body box with a head sphere resting on top
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hitbox {
    /// Half-width of the body box on X and Z
    pub radius: f32,
    pub height: f32,
    pub head_radius: f32,
}

impl Default for Hitbox {
    fn default() -> Self {
        Self {
            radius: 0.4,
            height: 1.5,
            head_radius: 0.25,
        }
    }
}

impl Hitbox {
    pub fn head_center(&self, feet: Vec3) -> Vec3 {
        feet + Vec3::new(0.0, self.height + self.head_radius, 0.0)
    }

    pub fn body_bounds(&self, feet: Vec3) -> (Vec3, Vec3) {
        (
            feet - Vec3::new(self.radius, 0.0, self.radius),
            feet + Vec3::new(self.radius, self.height, self.radius),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetState {
    pub is_alive: bool,
}

/// Candidate for hit resolution. Position is the feet point.
#[derive(Debug, Clone, PartialEq)]
pub struct HitTarget {
    pub id: u32,
    pub layers: LayerMask,
    pub position: Option<Vec3>,
    pub state: Option<TargetState>,
    pub hitbox: Hitbox,
}

impl HitTarget {
    pub fn player(id: u32, position: Vec3, is_alive: bool) -> Self {
        Self {
            id,
            layers: LayerMask::PLAYER,
            position: Some(position),
            state: Some(TargetState { is_alive }),
            hitbox: Hitbox::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitRegion {
    Body,
    Head,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitResult {
    pub hit: bool,
    pub distance: f32,
    pub point: Vec3,
    pub target_id: Option<u32>,
    pub region: Option<HitRegion>,
    pub is_headshot: bool,
    /// Direction after spread was applied
    pub direction: Vec3,
}

impl HitResult {
    fn miss(origin: Vec3, direction: Vec3, max_distance: f32) -> Self {
        Self {
            hit: false,
            distance: max_distance,
            point: origin + direction * max_distance,
            target_id: None,
            region: None,
            is_headshot: false,
            direction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitscanQuery {
    pub origin: Vec3,
    pub direction: Vec3,
    /// Cone half-angle in degrees
    pub spread: f32,
    pub max_distance: f32,
    pub layer_mask: LayerMask,
    /// Usually the shooter
    pub ignore_id: Option<u32>,
}

impl HitscanQuery {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            spread: 0.0,
            max_distance: DEFAULT_MAX_DISTANCE,
            layer_mask: LayerMask::ALL,
            ignore_id: None,
        }
    }

    pub fn with_spread(mut self, spread: f32) -> Self {
        self.spread = spread;
        self
    }

    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn with_layer_mask(mut self, layer_mask: LayerMask) -> Self {
        self.layer_mask = layer_mask;
        self
    }

    pub fn ignoring(mut self, id: u32) -> Self {
        self.ignore_id = Some(id);
        self
    }
}

/// Sphere that blocks line of sight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub center: Vec3,
    pub radius: f32,
}

/// Perturb `direction` uniformly within a cone of `spread_degrees` half-angle.
/// Draws two values from `rng`; draws nothing when the spread is zero.
pub fn apply_spread<R: Rng + ?Sized>(direction: Vec3, spread_degrees: f32, rng: &mut R) -> Vec3 {
    let direction = direction.normalize_or_zero();
    if spread_degrees <= 0.0 || direction == Vec3::ZERO {
        return direction;
    }

    let max_angle = spread_degrees.to_radians();
    let azimuth = rng.gen::<f32>() * TAU;
    // uniform over the spherical cap
    let cos_theta = 1.0 - rng.gen::<f32>() * (1.0 - max_angle.cos());
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

    let up = if direction.y.abs() < 0.9 { Vec3::Y } else { Vec3::X };
    let right = direction.cross(up).normalize();
    let actual_up = right.cross(direction).normalize();

    let offset = right * azimuth.cos() + actual_up * azimuth.sin();
    (direction * cos_theta + offset * sin_theta).normalize()
}

/// Slab test. Returns the entry distance, or 0 if the origin is inside.
fn ray_aabb(origin: Vec3, direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let mut t_near = f32::NEG_INFINITY;
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

    if t_far < 0.0 {
        return None;
    }
    Some(t_near.max(0.0))
}

fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let to_origin = origin - center;
    let b = to_origin.dot(direction);
    let c = to_origin.length_squared() - radius * radius;
    if c > 0.0 && b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    Some((-b - discriminant.sqrt()).max(0.0))
}

/// Closest-point test of each obstacle sphere against the segment
pub fn has_line_of_sight(from: Vec3, to: Vec3, obstacles: &[Obstacle]) -> bool {
    if from == to {
        return true;
    }
    let segment = to - from;
    let length_sq = segment.length_squared();
    let lo = from.min(to);
    let hi = from.max(to);

    for obstacle in obstacles {
        let pad = Vec3::splat(obstacle.radius);
        let c = obstacle.center;
        if c.cmplt(lo - pad).any() || c.cmpgt(hi + pad).any() {
            continue;
        }
        let t = ((c - from).dot(segment) / length_sq).clamp(0.0, 1.0);
        let closest = from + segment * t;
        if closest.distance_squared(c) < obstacle.radius * obstacle.radius {
            return false;
        }
    }
    true
}

/// Resolves shots and visibility against targets and optional level walls
#[derive(Debug, Clone, Copy, Default)]
pub struct HitDetection<'a> {
    geometry: Option<&'a LevelGeometry>,
}

impl<'a> HitDetection<'a> {
    pub fn new(geometry: Option<&'a LevelGeometry>) -> Self {
        Self { geometry }
    }

    pub fn with_geometry(geometry: &'a LevelGeometry) -> Self {
        Self::new(Some(geometry))
    }

    /// Distance along a unit `direction` to the first wall, if within range
    fn geometry_distance(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32> {
        let geometry = self.geometry?;
        let horizontal = (direction.x * direction.x + direction.z * direction.z).sqrt();
        if horizontal < 1e-6 {
            return None;
        }
        let hit = geometry.raycast_hit(origin, direction, max_distance * horizontal);
        if hit.hit {
            Some(hit.distance / horizontal)
        } else {
            None
        }
    }

    /// Nearest intersection of the (spread-perturbed) ray with any eligible
    /// target or level wall. Walls occlude regardless of the layer mask.
    pub fn hitscan<R: Rng + ?Sized>(
        &self,
        query: &HitscanQuery,
        targets: &[HitTarget],
        rng: &mut R,
    ) -> HitResult {
        let direction = apply_spread(query.direction, query.spread, rng);
        if direction == Vec3::ZERO {
            log::debug!("Hitscan with zero direction ignored");
            return HitResult::miss(query.origin, direction, query.max_distance);
        }

        let mut best: Option<(f32, Option<u32>, Option<HitRegion>)> = None;

        if let Some(distance) = self.geometry_distance(query.origin, direction, query.max_distance) {
            best = Some((distance, None, None));
        }

        for target in targets {
            if query.ignore_id == Some(target.id) || !query.layer_mask.intersects(target.layers) {
                continue;
            }
            let (position, state) = match (target.position, target.state) {
                (Some(position), Some(state)) => (position, state),
                _ => continue,
            };
            if !state.is_alive {
                continue;
            }

            let (min, max) = target.hitbox.body_bounds(position);
            let body = ray_aabb(query.origin, direction, min, max);
            let head = ray_sphere(
                query.origin,
                direction,
                target.hitbox.head_center(position),
                target.hitbox.head_radius,
            );
            let candidate = match (head, body) {
                (Some(h), Some(b)) if b < h => Some((b, HitRegion::Body)),
                (Some(h), _) => Some((h, HitRegion::Head)),
                (None, Some(b)) => Some((b, HitRegion::Body)),
                (None, None) => None,
            };

            if let Some((distance, region)) = candidate {
                if distance > query.max_distance {
                    continue;
                }
                let closer = match best {
                    Some((current, _, _)) => distance < current,
                    None => true,
                };
                if closer {
                    best = Some((distance, Some(target.id), Some(region)));
                }
            }
        }

        match best {
            Some((distance, target_id, region)) => HitResult {
                hit: true,
                distance,
                point: query.origin + direction * distance,
                target_id,
                region,
                is_headshot: region == Some(HitRegion::Head),
                direction,
            },
            None => HitResult::miss(query.origin, direction, query.max_distance),
        }
    }

    /// Line of sight that also treats level walls as blocking
    pub fn has_line_of_sight(&self, from: Vec3, to: Vec3, obstacles: &[Obstacle]) -> bool {
        if from == to {
            return true;
        }
        let segment = to - from;
        let length = segment.length();
        if self.geometry_distance(from, segment / length, length).is_some() {
            return false;
        }
        has_line_of_sight(from, to, obstacles)
    }
}
