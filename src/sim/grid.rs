//! Uniform spatial grid for neighbor discovery

use std::collections::HashMap;

use glam::Vec2;

/// Buckets particle indices by square cell
///
/// With `cell_size >= range` every pair closer than `range` lies in the same or
/// an adjacent cell, so a 3x3 neighborhood scan finds all of them.
#[derive(Debug, Clone, Default)]
pub struct UniformGrid {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl UniformGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn clear(&mut self) {
        for cell in self.cells.values_mut() {
            cell.clear();
        }
    }

    fn cell_of(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    pub fn insert(&mut self, index: usize, pos: Vec2) {
        let cell = self.cell_of(pos);
        self.cells.entry(cell).or_default().push(index);
    }

    /// Replace the contents with `positions`, indexed by slice position
    pub fn rebuild(&mut self, positions: &[Vec2]) {
        self.clear();
        for (i, &pos) in positions.iter().enumerate() {
            self.insert(i, pos);
        }
    }

    /// Every candidate index in the 3x3 block of cells around `pos`
    pub fn nearby(&self, pos: Vec2) -> impl Iterator<Item = usize> + '_ {
        let (cx, cy) = self.cell_of(pos);
        (-1..=1)
            .flat_map(move |dx| (-1..=1).map(move |dy| (cx + dx, cy + dy)))
            .filter_map(|cell| self.cells.get(&cell))
            .flatten()
            .copied()
    }

    /// Unordered pairs `(i, j)`, `i < j`, with squared distance below `range²`
    ///
    /// The result is sorted so it matches an exhaustive scan exactly.
    pub fn pairs_within(&self, positions: &[Vec2], range: f32) -> Vec<(usize, usize)> {
        let range2 = range * range;
        let mut pairs = Vec::new();
        for (i, &pos) in positions.iter().enumerate() {
            for j in self.nearby(pos) {
                if j > i && pos.distance_squared(positions[j]) < range2 {
                    pairs.push((i, j));
                }
            }
        }
        pairs.sort_unstable();
        pairs
    }
}
