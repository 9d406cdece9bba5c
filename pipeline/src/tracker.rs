//! Tracked-object bookkeeping across processing cycles.
//!
//! SPDX-License-Identifier: GPL-3.0-or-later

use crate::geometry::{BoundingBox, Point};

/// Maintenance cycles without a refresh before a tracked object is
/// dropped.
pub const UPDATE_TIMEOUT: u32 = 30;

/// One remembered detection, keyed by the id the upstream tracker
/// assigned. The foot point is recomputed on every refresh so it always
/// matches the stored box.
#[derive(Clone, Debug)]
pub struct TrackedObject {
    pub id: u64,
    pub bbox: BoundingBox,
    pub centroid: Point,
    staleness: u32,
}

/// Deduplicates per-frame detections over time. One record per id, in
/// first-seen order; records age out after `UPDATE_TIMEOUT` maintenance
/// passes without a refresh.
#[derive(Default)]
pub struct ObjectTracker {
    objects: Vec<TrackedObject>,
}

impl ObjectTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts a detection. A new id is appended with staleness 0; an
    /// existing id gets its box and foot point overwritten and its
    /// staleness reset. Must run before anything else reads tracked state
    /// for the frame.
    pub fn observe(&mut self, id: u64, bbox: BoundingBox) {
        let centroid = bbox.foot_point();
        match self.position(id) {
            Some(index) => {
                let object = &mut self.objects[index];
                object.bbox = bbox;
                object.centroid = centroid;
                object.staleness = 0;
            }
            None => self.objects.push(TrackedObject {
                id,
                bbox,
                centroid,
                staleness: 0,
            }),
        }
    }

    /// Ages every record by one cycle and drops the ones that reached the
    /// timeout. Called exactly once per cycle, after all observes. Objects
    /// observed this cycle start from 0 and therefore survive at least 29
    /// further passes untouched.
    pub fn maintain(&mut self) {
        self.objects.retain_mut(|object| {
            object.staleness += 1;
            object.staleness < UPDATE_TIMEOUT
        });
    }

    /// Ids and foot points of the objects seen in the current or
    /// immediately preceding cycle (staleness <= 1 at call time), in
    /// insertion order. Returned as pairs so downstream consumers cannot
    /// misalign ids against points.
    pub fn fresh(&self) -> Vec<(u64, Point)> {
        self.objects
            .iter()
            .filter(|object| object.staleness <= 1)
            .map(|object| (object.id, object.centroid))
            .collect()
    }

    /// Point lookup used to assemble annotation payloads. Ids with no
    /// record are skipped by the caller.
    pub fn get(&self, id: u64) -> Option<(BoundingBox, Point)> {
        self.position(id)
            .map(|index| (self.objects[index].bbox, self.objects[index].centroid))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.objects.iter().position(|object| object.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(left: f64, top: f64) -> BoundingBox {
        BoundingBox {
            left,
            top,
            width: 10.0,
            height: 20.0,
        }
    }

    #[test]
    fn observe_keeps_one_record_per_id() {
        let mut tracker = ObjectTracker::new();
        tracker.observe(7, bbox(0.0, 0.0));
        tracker.observe(7, bbox(40.0, 60.0));
        assert_eq!(tracker.len(), 1);
        let (b, c) = tracker.get(7).unwrap();
        assert_eq!(b.left, 40.0);
        assert_eq!(c, Point::new(45, 80));
    }

    #[test]
    fn object_survives_29_passes_and_dies_on_the_30th() {
        let mut tracker = ObjectTracker::new();
        tracker.observe(1, bbox(0.0, 0.0));
        for _ in 0..(UPDATE_TIMEOUT - 1) {
            tracker.maintain();
        }
        assert!(tracker.get(1).is_some());
        tracker.maintain();
        assert!(tracker.get(1).is_none());
    }

    #[test]
    fn refresh_resets_the_staleness_clock() {
        let mut tracker = ObjectTracker::new();
        tracker.observe(1, bbox(0.0, 0.0));
        for _ in 0..(UPDATE_TIMEOUT - 1) {
            tracker.maintain();
        }
        tracker.observe(1, bbox(5.0, 5.0));
        for _ in 0..(UPDATE_TIMEOUT - 1) {
            tracker.maintain();
        }
        assert!(tracker.get(1).is_some());
    }

    #[test]
    fn fresh_excludes_objects_older_than_one_cycle() {
        let mut tracker = ObjectTracker::new();
        tracker.observe(1, bbox(0.0, 0.0));
        tracker.maintain();
        // id 1 now has staleness 1; id 2 is brand new this cycle.
        tracker.observe(2, bbox(10.0, 10.0));
        let fresh = tracker.fresh();
        assert_eq!(
            fresh.iter().map(|(id, _)| *id).collect::<Vec<_>>(),
            vec![1, 2]
        );

        tracker.maintain();
        tracker.maintain();
        // id 1 at staleness 3, id 2 at staleness 2: neither is fresh.
        assert!(tracker.fresh().is_empty());
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn fresh_preserves_insertion_order() {
        let mut tracker = ObjectTracker::new();
        for id in [9, 3, 5] {
            tracker.observe(id, bbox(id as f64, 0.0));
        }
        let ids: Vec<u64> = tracker.fresh().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![9, 3, 5]);
    }
}
