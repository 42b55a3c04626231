//! Consistent hashing continuum.
//!
//! Each host contributes [`POINTS_PER_HOST`] points, hashed from
//! `"<host>-<n>"`. A key belongs to the host owning the first point at or after
//! the key's hash, wrapping to the first point past the end of the ring.
//! Adding or removing a host only remaps the keys adjacent to its points.

use super::hash::KeyHasher;
use super::pool::Host;

/// Points placed on the ring per host.
pub const POINTS_PER_HOST: usize = 160;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Point {
    value: u32,
    index: usize,
}

/// Sorted ring of host points.
#[derive(Debug, Clone, Default)]
pub struct Continuum {
    points: Vec<Point>,
}

impl Continuum {
    /// Build the continuum for hosts in pool order.
    pub fn build(hosts: &[Host], hasher: &dyn KeyHasher) -> Self {
        let mut points = Vec::with_capacity(hosts.len() * POINTS_PER_HOST);
        for (index, host) in hosts.iter().enumerate() {
            for n in 0..POINTS_PER_HOST {
                let label = format!("{}-{}", host, n);
                points.push(Point {
                    value: hasher.hash(label.as_bytes()),
                    index,
                });
            }
        }
        points.sort_unstable();
        Self { points }
    }

    /// Host index owning `hash`, or `None` for an empty ring.
    pub fn lookup(&self, hash: u32) -> Option<usize> {
        let first = self.points.first()?;
        let pos = self.points.partition_point(|p| p.value < hash);
        Some(self.points.get(pos).unwrap_or(first).index)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
