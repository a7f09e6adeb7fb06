//! Connectivity: breadth-first membership rebuild over the neighbor graph

use std::collections::VecDeque;

use super::blob::{Blob, BlobId};
use super::particle::Particle;
use crate::settings::StragglerPolicy;

/// Take ownership of `v` for `blob`, appending it to the member list
fn claim(particles: &mut [Particle], blob: &mut Blob, v: usize) -> bool {
    let p = &mut particles[v];
    let absorbed = p.blob != blob.id;
    p.blob = blob.id;
    if !p.is_pickup() {
        p.color = blob.color;
    }
    p.member_slot = blob.members.len();
    blob.members.push(v);
    absorbed
}

/// Breadth-first expansion from `queue` over edges `hostile` does not block
fn expand(
    particles: &mut [Particle],
    blob: &mut Blob,
    visited: &mut [bool],
    queue: &mut VecDeque<usize>,
    hostile: impl Fn(&Particle, &Particle) -> bool,
) -> u32 {
    let mut absorbed = 0;
    while let Some(u) = queue.pop_front() {
        for k in 0..particles[u].neighbors.len() {
            let v = particles[u].neighbors[k];
            if visited[v] || hostile(&particles[u], &particles[v]) {
                continue;
            }
            visited[v] = true;
            if claim(particles, blob, v) {
                absorbed += 1;
            }
            queue.push_back(v);
        }
    }
    absorbed
}

/// Rebuild a player blob's membership from its anchor
///
/// Members must already be cleared. Every non-enemy particle reachable from the
/// anchor is reassigned to the blob and marked visited. Returns how many
/// particles changed owner.
pub fn connect_blob(
    particles: &mut [Particle],
    blob: &mut Blob,
    visited: &mut [bool],
    queue: &mut VecDeque<usize>,
) -> u32 {
    let Some(anchor) = blob.anchor else {
        return 0;
    };
    if visited[anchor] {
        return 0;
    }

    visited[anchor] = true;
    let mut absorbed = u32::from(claim(particles, blob, anchor));
    queue.clear();
    queue.push_back(anchor);
    absorbed += expand(particles, blob, visited, queue, |u, v| u.is_enemy(v));
    absorbed
}

/// Fold every unvisited particle into the neutral blob
///
/// Each unvisited particle seeds a cluster that is expanded over the same graph;
/// nothing is hostile to neutral. With `TrackClusters` the start offset of each
/// cluster is recorded on the neutral blob. Returns the number of clusters.
pub fn collect_stragglers(
    particles: &mut [Particle],
    neutral: &mut Blob,
    visited: &mut [bool],
    queue: &mut VecDeque<usize>,
    policy: StragglerPolicy,
) -> usize {
    debug_assert_eq!(neutral.id, BlobId::NEUTRAL);
    neutral.clusters.clear();

    let mut clusters = 0;
    for seed in 0..particles.len() {
        if visited[seed] {
            continue;
        }
        if policy == StragglerPolicy::TrackClusters {
            neutral.clusters.push(neutral.members.len());
        }
        clusters += 1;

        visited[seed] = true;
        claim(particles, neutral, seed);
        queue.clear();
        queue.push_back(seed);
        expand(particles, neutral, visited, queue, |_, _| false);
    }
    clusters
}
