use glam::{IVec3, Vec3};

use crate::coords::BLOCK_HALF_EXTENT;

#[derive(Debug, Copy, Clone)]
pub struct AABB {
    pub min: Vec3,
    pub max: Vec3,
}

impl AABB {
    pub fn block(pos: IVec3) -> Self {
        let center = pos.as_vec3();
        Self {
            min: center - Vec3::splat(BLOCK_HALF_EXTENT),
            max: center + Vec3::splat(BLOCK_HALF_EXTENT),
        }
    }

    /// Body volume of a player standing with feet at `position`.
    pub fn player(position: Vec3, radius: f32, height: f32) -> Self {
        Self {
            min: Vec3::new(position.x - radius, position.y, position.z - radius),
            max: Vec3::new(position.x + radius, position.y + height, position.z + radius),
        }
    }

    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }
}

#[derive(Debug, Copy, Clone)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Face {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl Face {
    pub fn normal_ivec3(&self) -> IVec3 {
        match self {
            Face::PosX => IVec3::X,
            Face::NegX => IVec3::NEG_X,
            Face::PosY => IVec3::Y,
            Face::NegY => IVec3::NEG_Y,
            Face::PosZ => IVec3::Z,
            Face::NegZ => IVec3::NEG_Z,
        }
    }
}

/// One cell visited by a ray. `distance` is where the ray entered the cell and
/// `face` is the face it crossed; the origin cell reports distance 0.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RayStep {
    pub cell: IVec3,
    pub face: Face,
    pub distance: f32,
}

fn axis_step(component: f32) -> i32 {
    if component > 0.0 {
        1
    } else if component < 0.0 {
        -1
    } else {
        0
    }
}

fn first_boundary(origin: f32, cell: i32, step: i32, direction: f32) -> f32 {
    if direction == 0.0 {
        return f32::INFINITY;
    }
    let next = if step > 0 { cell as f32 + 1.0 } else { cell as f32 };
    (next - origin) / direction
}

fn boundary_spacing(direction: f32) -> f32 {
    if direction != 0.0 {
        1.0 / direction.abs()
    } else {
        f32::INFINITY
    }
}

#[derive(Debug, Copy, Clone)]
pub struct RaycastIter {
    current: IVec3,
    step: IVec3,
    t_max: Vec3,
    t_delta: Vec3,
    max_distance: f32,
    started: bool,
    finished: bool,
}

impl RaycastIter {
    fn new(ray: &Ray, max_distance: f32) -> Self {
        let direction = ray.direction;
        // Cells are unit cubes centred on integer points; shift into floor space.
        let origin = ray.origin + Vec3::splat(BLOCK_HALF_EXTENT);
        let current = origin.floor().as_ivec3();
        let step = IVec3::new(
            axis_step(direction.x),
            axis_step(direction.y),
            axis_step(direction.z),
        );

        let t_max = Vec3::new(
            first_boundary(origin.x, current.x, step.x, direction.x),
            first_boundary(origin.y, current.y, step.y, direction.y),
            first_boundary(origin.z, current.z, step.z, direction.z),
        );
        let t_delta = Vec3::new(
            boundary_spacing(direction.x),
            boundary_spacing(direction.y),
            boundary_spacing(direction.z),
        );

        Self {
            current,
            step,
            t_max,
            t_delta,
            max_distance: max_distance.max(0.0),
            started: false,
            finished: false,
        }
    }
}

impl Iterator for RaycastIter {
    type Item = RayStep;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if !self.started {
            self.started = true;
            return Some(RayStep {
                cell: self.current,
                face: Face::NegY,
                distance: 0.0,
            });
        }

        let (axis, distance) = if self.t_max.x <= self.t_max.y && self.t_max.x <= self.t_max.z {
            (0usize, self.t_max.x)
        } else if self.t_max.y <= self.t_max.z {
            (1usize, self.t_max.y)
        } else {
            (2usize, self.t_max.z)
        };

        if !distance.is_finite() || distance > self.max_distance {
            self.finished = true;
            return None;
        }

        let face = match axis {
            0 => {
                self.current.x += self.step.x;
                self.t_max.x += self.t_delta.x;
                if self.step.x > 0 {
                    Face::NegX
                } else {
                    Face::PosX
                }
            }
            1 => {
                self.current.y += self.step.y;
                self.t_max.y += self.t_delta.y;
                if self.step.y > 0 {
                    Face::NegY
                } else {
                    Face::PosY
                }
            }
            _ => {
                self.current.z += self.step.z;
                self.t_max.z += self.t_delta.z;
                if self.step.z > 0 {
                    Face::NegZ
                } else {
                    Face::PosZ
                }
            }
        };

        Some(RayStep {
            cell: self.current,
            face,
            distance,
        })
    }
}

pub fn raycast_blocks(ray: &Ray, max_distance: f32) -> impl Iterator<Item = RayStep> {
    RaycastIter::new(ray, max_distance)
}

/// Nearest cell accepted by `hit` along the ray, ignoring the cell holding the origin.
pub fn first_hit<F>(ray: &Ray, max_distance: f32, mut hit: F) -> Option<RayStep>
where
    F: FnMut(IVec3) -> bool,
{
    raycast_blocks(ray, max_distance)
        .skip(1)
        .find(|step| hit(step.cell))
}

#[cfg(test)]
mod tests {
    use glam::{IVec3, Vec3};

    use super::{first_hit, raycast_blocks, Face, Ray, RayStep, AABB};

    #[test]
    fn aabb_collision_detection() {
        let a = AABB::block(IVec3::ZERO);
        let b = AABB {
            min: Vec3::new(0.0, -0.25, 0.0),
            max: Vec3::new(1.0, 0.75, 1.0),
        };
        let c = AABB::block(IVec3::ONE);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        let player = AABB::player(Vec3::new(0.0, 0.5, 0.0), 0.3, 1.8);
        assert!(player.intersects(&AABB::block(IVec3::new(0, 1, 0))));
        assert!(!player.intersects(&c));
    }

    #[test]
    fn raycast_visits_centred_cells_with_entry_distances() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);

        let visited: Vec<RayStep> = raycast_blocks(&ray, 2.1).collect();
        assert_eq!(
            visited,
            vec![
                RayStep { cell: IVec3::new(0, 0, 0), face: Face::NegY, distance: 0.0 },
                RayStep { cell: IVec3::new(1, 0, 0), face: Face::NegX, distance: 0.5 },
                RayStep { cell: IVec3::new(2, 0, 0), face: Face::NegX, distance: 1.5 },
            ]
        );
    }

    #[test]
    fn first_hit_skips_origin_cell_and_respects_range() {
        let ray = Ray::new(Vec3::new(0.0, 3.0, 0.0), Vec3::NEG_Y);
        let solid = |cell: IVec3| cell.y <= 1;

        let hit = first_hit(&ray, 2.0, solid).expect("ground below");
        assert_eq!(hit.cell, IVec3::new(0, 1, 0));
        assert_eq!(hit.face, Face::PosY);
        assert!((hit.distance - 1.5).abs() < 1e-5);

        assert!(first_hit(&ray, 1.0, solid).is_none());

        let inside = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::X);
        assert!(first_hit(&inside, 0.4, |cell| cell == IVec3::new(0, 1, 0)).is_none());
    }
}
