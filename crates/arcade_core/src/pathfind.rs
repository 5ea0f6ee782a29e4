//! Tile-grid route search used for short-range AI interception.
//!
//! The search is greedy and backtracking: at every tile the legal moves are
//! tried nearest-to-target first (Euclidean distance of the destination
//! tile), and a branch that dead-ends is unwound. Tiles are visited at most
//! once, and tiles holding a blocking occupant are never entered unless they
//! are the target itself. The worst case is still exhaustive over the
//! reachable tiles, so keep maps small.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TilePoint {
    pub x: i32,
    pub y: i32,
}

impl TilePoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, direction: Direction) -> TilePoint {
        let (dx, dy) = direction.offset();
        TilePoint {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    pub fn distance(self, other: TilePoint) -> f64 {
        let dx = f64::from(other.x) - f64::from(self.x);
        let dy = f64::from(other.y) - f64::from(self.y);
        (dx * dx + dy * dy).sqrt()
    }
}

/// Unit move on the grid; y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Order in which equally-ranked moves are tried.
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupant {
    pub id: u64,
    pub blocking: bool,
}

impl Occupant {
    pub fn blocking(id: u64) -> Self {
        Self { id, blocking: true }
    }

    pub fn passable(id: u64) -> Self {
        Self {
            id,
            blocking: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OccupancyError {
    #[error("occupancy map must have a non-zero size, got {width}x{height}")]
    ZeroSized { width: u32, height: u32 },
    #[error("tile ({x}, {y}) is outside the map")]
    OutOfBounds { x: i32, y: i32 },
}

/// Tile coordinates to the objects standing on them.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyMap {
    width: u32,
    height: u32,
    occupants: HashMap<TilePoint, Vec<Occupant>>,
}

impl OccupancyMap {
    pub fn new(width: u32, height: u32) -> Result<Self, OccupancyError> {
        if width == 0 || height == 0 || width > i32::MAX as u32 || height > i32::MAX as u32 {
            return Err(OccupancyError::ZeroSized { width, height });
        }
        Ok(Self {
            width,
            height,
            occupants: HashMap::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, point: TilePoint) -> bool {
        point.x >= 0
            && point.y >= 0
            && (point.x as u32) < self.width
            && (point.y as u32) < self.height
    }

    pub fn place(&mut self, point: TilePoint, occupant: Occupant) -> Result<(), OccupancyError> {
        if !self.contains(point) {
            return Err(OccupancyError::OutOfBounds {
                x: point.x,
                y: point.y,
            });
        }
        self.occupants.entry(point).or_default().push(occupant);
        Ok(())
    }

    pub fn occupants_at(&self, point: TilePoint) -> &[Occupant] {
        self.occupants
            .get(&point)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_blocked(&self, point: TilePoint) -> bool {
        self.occupants_at(point)
            .iter()
            .any(|occupant| occupant.blocking)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PathFinder<'a> {
    map: &'a OccupancyMap,
    start: TilePoint,
    target: TilePoint,
}

struct Frame {
    tile: TilePoint,
    // Ranked worst-first so `pop` yields the best remaining move.
    options: Vec<Direction>,
}

impl<'a> PathFinder<'a> {
    pub fn new(map: &'a OccupancyMap, start: TilePoint, target: TilePoint) -> Self {
        Self { map, start, target }
    }

    pub fn is_reachable(&self) -> bool {
        self.search().is_some()
    }

    /// Moves leading from start to target, or `None` when the target is off
    /// the map or cannot be reached. Start equal to target yields an empty
    /// route.
    pub fn search(&self) -> Option<Vec<Direction>> {
        if !self.map.contains(self.start) || !self.map.contains(self.target) {
            debug!(
                start_x = self.start.x,
                start_y = self.start.y,
                target_x = self.target.x,
                target_y = self.target.y,
                "path_endpoint_off_map"
            );
            return None;
        }
        if self.start == self.target {
            return Some(Vec::new());
        }

        let mut visited = HashSet::from([self.start]);
        let mut route = Vec::new();
        let mut stack = vec![Frame {
            tile: self.start,
            options: self.ranked_moves(self.start),
        }];

        while let Some(frame) = stack.last_mut() {
            let Some(direction) = frame.options.pop() else {
                stack.pop();
                route.pop();
                continue;
            };
            let next = frame.tile.step(direction);
            if !visited.insert(next) {
                continue;
            }
            route.push(direction);
            if next == self.target {
                return Some(route);
            }
            let options = self.ranked_moves(next);
            stack.push(Frame {
                tile: next,
                options,
            });
        }

        debug!(
            explored = visited.len(),
            target_x = self.target.x,
            target_y = self.target.y,
            "path_exhausted"
        );
        None
    }

    fn is_enterable(&self, tile: TilePoint) -> bool {
        self.map.contains(tile) && (tile == self.target || !self.map.is_blocked(tile))
    }

    fn ranked_moves(&self, from: TilePoint) -> Vec<Direction> {
        let mut moves: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|direction| self.is_enterable(from.step(*direction)))
            .collect();
        // Stable sort keeps the fixed direction order among equal distances.
        moves.sort_by(|a, b| {
            let da = from.step(*a).distance(self.target);
            let db = from.step(*b).distance(self.target);
            da.total_cmp(&db)
        });
        moves.reverse();
        moves
    }
}
