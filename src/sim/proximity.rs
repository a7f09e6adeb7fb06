//! Proximity pass: neighbor edges, stick constraints and the arena clamp

use glam::Vec2;

use super::blob::{Blob, BlobId};
use super::grid::UniformGrid;
use super::particle::Particle;
use crate::settings::NeighborSearch;

/// Find every pair closer than `range`, sorted by `(i, j)` with `i < j`
///
/// Both strategies see the same positions and return the same list.
pub fn find_pairs(
    particles: &[Particle],
    range: f32,
    search: NeighborSearch,
    grid: &mut UniformGrid,
) -> Vec<(usize, usize)> {
    let positions: Vec<Vec2> = particles.iter().map(|p| p.pos).collect();
    match search {
        NeighborSearch::AllPairs => {
            let range2 = range * range;
            let mut pairs = Vec::new();
            for i in 0..positions.len() {
                for j in i + 1..positions.len() {
                    if positions[i].distance_squared(positions[j]) < range2 {
                        pairs.push((i, j));
                    }
                }
            }
            pairs
        }
        NeighborSearch::Grid { cell_size } => {
            let cell_size = cell_size.max(range);
            if grid.cell_size() != cell_size {
                *grid = UniformGrid::new(cell_size);
            }
            grid.rebuild(&positions);
            grid.pairs_within(&positions, range)
        }
    }
}

fn pair_mut(particles: &mut [Particle], i: usize, j: usize) -> (&mut Particle, &mut Particle) {
    debug_assert!(i < j);
    let (head, tail) = particles.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

/// Record mutual neighbor edges and apply one stick constraint per pair
///
/// Enemies settle at `push_distance` beyond their radii, everyone else at the
/// mean pull distance of the two blobs. Stiffness is likewise the mean.
pub fn apply_constraints(
    particles: &mut [Particle],
    blobs: &[Option<Blob>],
    pairs: &[(usize, usize)],
    push_distance: f32,
) {
    let params = |id: BlobId| blobs.get(id.index()).and_then(Option::as_ref).map(|b| b.params);

    for &(i, j) in pairs {
        let (a, b) = pair_mut(particles, i, j);
        a.neighbors.push(j);
        b.neighbors.push(i);

        let (pa, pb) = match (params(a.blob), params(b.blob)) {
            (Some(pa), Some(pb)) => (pa, pb),
            (Some(p), None) | (None, Some(p)) => (p, p),
            (None, None) => continue,
        };

        let im_a = a.inverse_mass();
        let im_b = b.inverse_mass();
        if im_a + im_b == 0.0 {
            continue;
        }

        let delta = b.pos - a.pos;
        let d = delta.length();
        if d == 0.0 {
            continue;
        }

        let rest = if a.is_enemy(b) {
            push_distance
        } else {
            (pa.pull_distance + pb.pull_distance) * 0.5
        };
        let target = rest + a.radius() + b.radius();
        let stiffness = (pa.stiffness + pb.stiffness) * 0.5;
        let diff = stiffness * (d - target) / (d * (im_a + im_b));

        a.pos += delta * diff * im_a;
        b.pos -= delta * diff * im_b;
    }
}

/// Keep each particle at least `radius + margin` inside the arena
pub fn clamp_to_arena(particles: &mut [Particle], width: f32, height: f32, margin: f32) {
    for p in particles.iter_mut() {
        let inset = p.radius() + margin;
        let min = Vec2::splat(inset);
        let max = Vec2::new(width - inset, height - inset).max(min);
        p.pos = p.pos.clamp(min, max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::blob::BlobParams;

    fn blobs(n: u8) -> Vec<Option<Blob>> {
        (0..=n)
            .map(|id| Some(Blob::new(BlobId(id), 0, BlobParams::default())))
            .collect()
    }

    fn run_pass(particles: &mut [Particle], blobs: &[Option<Blob>], range: f32, push: f32) {
        let mut grid = UniformGrid::default();
        let pairs = find_pairs(particles, range, NeighborSearch::AllPairs, &mut grid);
        apply_constraints(particles, blobs, &pairs, push);
    }

    #[test]
    fn test_out_of_range_pair_untouched() {
        let mut particles = vec![
            Particle::new(Vec2::new(0.0, 0.0), 4.0, BlobId(1)),
            Particle::new(Vec2::new(100.0, 0.0), 4.0, BlobId(1)),
        ];
        run_pass(&mut particles, &blobs(1), 50.0, 40.0);
        assert!(particles[0].neighbors.is_empty());
        assert!(particles[1].neighbors.is_empty());
        assert_eq!(particles[0].pos, Vec2::new(0.0, 0.0));
        assert_eq!(particles[1].pos, Vec2::new(100.0, 0.0));
    }

    #[test]
    fn test_neighbor_edges_are_symmetric() {
        let mut particles: Vec<Particle> = (0..12)
            .map(|i| {
                let pos = Vec2::new((i * 13 % 50) as f32, (i * 7 % 30) as f32);
                Particle::new(pos, 3.0, BlobId(1 + i as u8 % 2))
            })
            .collect();
        run_pass(&mut particles, &blobs(2), 25.0, 40.0);
        for (i, p) in particles.iter().enumerate() {
            for &j in &p.neighbors {
                assert!(particles[j].neighbors.contains(&i));
            }
        }
    }

    #[test]
    fn test_enemy_pair_at_equilibrium_stays_put() {
        let push = 40.0;
        let target = push + 4.0 + 4.0;
        let mut particles = vec![
            Particle::new(Vec2::new(0.0, 0.0), 4.0, BlobId(1)),
            Particle::new(Vec2::new(target, 0.0), 4.0, BlobId(2)),
        ];
        run_pass(&mut particles, &blobs(2), 75.0, push);
        assert_eq!(particles[0].neighbors, vec![1]);
        assert!((particles[0].pos.x - 0.0).abs() < 1e-5);
        assert!((particles[1].pos.x - target).abs() < 1e-5);
    }

    #[test]
    fn test_enemies_pushed_apart_and_friends_pulled_together() {
        let mut enemies = vec![
            Particle::new(Vec2::new(0.0, 0.0), 4.0, BlobId(1)),
            Particle::new(Vec2::new(20.0, 0.0), 4.0, BlobId(2)),
        ];
        run_pass(&mut enemies, &blobs(2), 75.0, 40.0);
        assert!(enemies[0].pos.x < 0.0);
        assert!(enemies[1].pos.x > 20.0);

        let mut friends = vec![
            Particle::new(Vec2::new(0.0, 0.0), 4.0, BlobId(1)),
            Particle::new(Vec2::new(50.0, 0.0), 4.0, BlobId(1)),
        ];
        run_pass(&mut friends, &blobs(1), 75.0, 40.0);
        assert!(friends[0].pos.x > 0.0);
        assert!(friends[1].pos.x < 50.0);
    }

    #[test]
    fn test_pinned_particle_does_not_move() {
        let mut particles = vec![
            Particle::new(Vec2::new(0.0, 0.0), 4.0, BlobId(1)),
            Particle::new(Vec2::new(50.0, 0.0), 4.0, BlobId(1)),
        ];
        particles[0].pinned = true;
        run_pass(&mut particles, &blobs(1), 75.0, 40.0);
        assert_eq!(particles[0].pos, Vec2::ZERO);
        assert!(particles[1].pos.x < 50.0);
    }

    #[test]
    fn test_coincident_points_record_edge_only() {
        let mut particles = vec![
            Particle::new(Vec2::new(5.0, 5.0), 4.0, BlobId(1)),
            Particle::new(Vec2::new(5.0, 5.0), 4.0, BlobId(1)),
        ];
        run_pass(&mut particles, &blobs(1), 75.0, 40.0);
        assert_eq!(particles[0].neighbors, vec![1]);
        assert_eq!(particles[0].pos, particles[1].pos);
        assert!(particles[0].pos.is_finite());
    }

    #[test]
    fn test_grid_matches_all_pairs() {
        let make = || -> Vec<Particle> {
            (0..60)
                .map(|i| {
                    let pos = Vec2::new((i * 37 % 200) as f32, (i * 53 % 150) as f32);
                    Particle::new(pos, 3.0, BlobId(i as u8 % 3))
                })
                .collect()
        };
        let blobs = blobs(2);
        let range = 30.0;

        let mut brute = make();
        let mut grid = UniformGrid::default();
        let pairs = find_pairs(&brute, range, NeighborSearch::AllPairs, &mut grid);
        apply_constraints(&mut brute, &blobs, &pairs, 40.0);

        let mut gridded = make();
        let mut grid = UniformGrid::default();
        let grid_pairs =
            find_pairs(&gridded, range, NeighborSearch::Grid { cell_size: 10.0 }, &mut grid);
        apply_constraints(&mut gridded, &blobs, &grid_pairs, 40.0);

        assert_eq!(pairs, grid_pairs);
        for (a, b) in brute.iter().zip(&gridded) {
            assert_eq!(a.pos, b.pos);
            assert_eq!(a.neighbors, b.neighbors);
        }
    }

    #[test]
    fn test_clamp_keeps_radius_and_margin() {
        let mut particles = vec![
            Particle::new(Vec2::new(-10.0, 50.0), 4.0, BlobId(0)),
            Particle::new(Vec2::new(500.0, 300.0), 6.0, BlobId(0)),
            Particle::new(Vec2::new(50.0, 50.0), 6.0, BlobId(0)),
        ];
        clamp_to_arena(&mut particles, 400.0, 200.0, 2.0);
        assert_eq!(particles[0].pos, Vec2::new(6.0, 50.0));
        assert_eq!(particles[1].pos, Vec2::new(392.0, 192.0));
        assert_eq!(particles[2].pos, Vec2::new(50.0, 50.0));
    }
}
