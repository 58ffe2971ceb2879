use glam::{Vec2, Vec3};

/// A single grid cell of the level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Wall,
}

/// Which grid axis boundary a ray crossed when it struck a wall
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitSide {
    X,
    Z,
}

/// Result of a 2D grid ray march
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub hit: bool,
    pub distance: f32,
    pub side: Option<HitSide>,
    pub cell: Option<(i32, i32)>,
}

impl RayHit {
    fn miss(max_distance: f32) -> Self {
        Self {
            hit: false,
            distance: max_distance,
            side: None,
            cell: None,
        }
    }
}

/// Result of a 3D ray cast against the 2.5D level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryHit {
    pub hit: bool,
    /// Horizontal distance travelled on the XZ plane
    pub distance: f32,
    pub point: Vec3,
    pub side: Option<HitSide>,
}

/// Static level occupancy grid. One world unit per cell, cell (i, j)
/// covers x in [i, i+1) and z in [j, j+1).
#[derive(Debug, Clone)]
pub struct LevelGeometry {
    width: usize,
    depth: usize,
    cells: Vec<Cell>,
}

impl LevelGeometry {
    /// Open level of the given size with no walls
    pub fn new(width: usize, depth: usize) -> Self {
        Self {
            width,
            depth,
            cells: vec![Cell::Empty; width * depth],
        }
    }

    /// Open level enclosed by a one-cell wall border
    pub fn bordered(width: usize, depth: usize) -> Self {
        let mut level = Self::new(width, depth);
        for x in 0..width {
            level.set_cell(x, 0, Cell::Wall);
            level.set_cell(x, depth.saturating_sub(1), Cell::Wall);
        }
        for z in 0..depth {
            level.set_cell(0, z, Cell::Wall);
            level.set_cell(width.saturating_sub(1), z, Cell::Wall);
        }
        level
    }

    /// Build from ASCII rows, `#` is a wall and anything else is empty.
    /// Row index is z, column index is x. Short rows are padded with empty cells.
    pub fn from_rows(rows: &[&str]) -> Self {
        let depth = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut level = Self::new(width, depth);
        for (z, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch == '#' {
                    level.set_cell(x, z, Cell::Wall);
                }
            }
        }
        level
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Set a cell; writes outside the grid are ignored
    pub fn set_cell(&mut self, x: usize, z: usize, cell: Cell) {
        if x < self.width && z < self.depth {
            self.cells[z * self.width + x] = cell;
        }
    }

    /// Cells outside the grid count as walls
    pub fn is_wall(&self, cx: i32, cz: i32) -> bool {
        if cx < 0 || cz < 0 || cx as usize >= self.width || cz as usize >= self.depth {
            return true;
        }
        self.cells[cz as usize * self.width + cx as usize] == Cell::Wall
    }

    pub fn is_wall_at(&self, x: f32, z: f32) -> bool {
        self.is_wall(x.floor() as i32, z.floor() as i32)
    }

    /// Test the four corners of a box of half-size `radius` centred on (x, z)
    pub fn check_collision(&self, x: f32, z: f32, radius: f32) -> bool {
        self.is_wall_at(x - radius, z - radius)
            || self.is_wall_at(x + radius, z - radius)
            || self.is_wall_at(x - radius, z + radius)
            || self.is_wall_at(x + radius, z + radius)
    }

    /// Apply a movement delta one axis at a time so a blocked axis
    /// does not stop motion along the other one
    pub fn try_move(&self, position: Vec2, delta: Vec2, radius: f32) -> Vec2 {
        let mut next = position;
        if !self.check_collision(position.x + delta.x, position.y, radius) {
            next.x += delta.x;
        }
        if !self.check_collision(next.x, position.y + delta.y, radius) {
            next.y += delta.y;
        }
        next
    }

    /// DDA march across the grid from `origin` (x, z) along `angle` radians
    /// measured from +X towards +Z.
    pub fn cast_ray(&self, origin: Vec2, angle: f32, max_distance: f32) -> RayHit {
        let dir = Vec2::new(angle.cos(), angle.sin());
        let mut map_x = origin.x.floor() as i32;
        let mut map_z = origin.y.floor() as i32;

        if self.is_wall(map_x, map_z) {
            return RayHit {
                hit: true,
                distance: 0.0,
                side: None,
                cell: Some((map_x, map_z)),
            };
        }

        let delta_x = if dir.x.abs() < f32::EPSILON { f32::INFINITY } else { (1.0 / dir.x).abs() };
        let delta_z = if dir.y.abs() < f32::EPSILON { f32::INFINITY } else { (1.0 / dir.y).abs() };

        let (step_x, mut side_x) = if dir.x < 0.0 {
            (-1, (origin.x - map_x as f32) * delta_x)
        } else {
            (1, (map_x as f32 + 1.0 - origin.x) * delta_x)
        };
        let (step_z, mut side_z) = if dir.y < 0.0 {
            (-1, (origin.y - map_z as f32) * delta_z)
        } else {
            (1, (map_z as f32 + 1.0 - origin.y) * delta_z)
        };
        // 0 * inf on an axis-aligned ray
        if delta_x.is_infinite() {
            side_x = f32::INFINITY;
        }
        if delta_z.is_infinite() {
            side_z = f32::INFINITY;
        }

        loop {
            let side = if side_x < side_z {
                side_x += delta_x;
                map_x += step_x;
                HitSide::X
            } else {
                side_z += delta_z;
                map_z += step_z;
                HitSide::Z
            };

            let distance = match side {
                HitSide::X => (map_x as f32 - origin.x + (1 - step_x) as f32 / 2.0) / dir.x,
                HitSide::Z => (map_z as f32 - origin.y + (1 - step_z) as f32 / 2.0) / dir.y,
            };

            if distance >= max_distance {
                return RayHit::miss(max_distance);
            }

            if self.is_wall(map_x, map_z) {
                return RayHit {
                    hit: true,
                    distance,
                    side: Some(side),
                    cell: Some((map_x, map_z)),
                };
            }
        }
    }

    /// Cast a 3D ray against the level. The map has no vertical geometry so
    /// the ray is projected onto XZ and the origin height is carried through.
    pub fn raycast_hit(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> GeometryHit {
        let angle = direction.z.atan2(direction.x);
        let ray = self.cast_ray(Vec2::new(origin.x, origin.z), angle, max_distance);
        let point = Vec3::new(
            origin.x + angle.cos() * ray.distance,
            origin.y,
            origin.z + angle.sin() * ray.distance,
        );
        GeometryHit {
            hit: ray.hit,
            distance: ray.distance,
            point,
            side: ray.side,
        }
    }
}
