//! Append-only composite of tube meshes, indexed by tract slot
//!
//! Slots are handed out in request order by the shared pipeline state. A
//! slot whose streamline failed stays empty forever, so later tracts keep
//! their indices. Existing slots are never overwritten or removed; only a
//! session reset clears the composite.

use crate::geometry::TubeMesh;
use std::sync::Arc;

/// The growing scene owned by the visualization worker
#[derive(Debug, Clone, Default)]
pub struct CompositeScene {
    slots: Vec<Option<Arc<TubeMesh>>>,
    populated: usize,
    revision: u64,
    generation: u64,
}

impl CompositeScene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty scene for a session generation
    pub fn for_generation(generation: u64) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }

    /// Highest written slot plus one
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots holding a tube
    pub fn populated(&self) -> usize {
        self.populated
    }

    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Bumped on every change
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Session generation this scene belongs to
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Tube at `index`, if that slot is populated
    pub fn get(&self, index: usize) -> Option<&Arc<TubeMesh>> {
        self.slots.get(index).and_then(|s| s.as_ref())
    }

    /// Populated slots in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Arc<TubeMesh>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|t| (i, t)))
    }

    /// Write `tube` into `index` unless the slot is already taken
    ///
    /// Returns false, leaving the scene untouched, for an occupied slot.
    pub fn insert(&mut self, index: usize, tube: TubeMesh) -> bool {
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        if self.slots[index].is_some() {
            tracing::warn!("Composite slot {} already populated, keeping existing tube", index);
            return false;
        }
        self.slots[index] = Some(Arc::new(tube));
        self.populated += 1;
        self.revision += 1;
        true
    }

    /// Drop every tube and start a new generation
    pub fn reset(&mut self, generation: u64) {
        self.slots.clear();
        self.populated = 0;
        self.revision += 1;
        self.generation = generation;
    }

    /// Immutable view of the current contents for the rendering sink
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            generation: self.generation,
            revision: self.revision,
            populated: self.populated,
            slots: self.slots.clone().into(),
        }
    }
}

/// Append a batch of tubes starting at `next_index`
///
/// The tube at batch position `k` goes to slot `next_index + k`. Empty
/// entries consume their index but write nothing. The same scene is handed
/// back so calls can be chained.
pub fn accumulate<I>(scene: &mut CompositeScene, tubes: I, next_index: usize) -> &mut CompositeScene
where
    I: IntoIterator<Item = Option<TubeMesh>>,
{
    for (offset, tube) in tubes.into_iter().enumerate() {
        if let Some(tube) = tube {
            scene.insert(next_index + offset, tube);
        }
    }
    scene
}

/// Frozen copy of a composite scene
///
/// Tubes are shared with the live scene, so taking a snapshot copies only
/// the slot table.
#[derive(Debug, Clone)]
pub struct SceneSnapshot {
    generation: u64,
    revision: u64,
    populated: usize,
    slots: Arc<[Option<Arc<TubeMesh>>]>,
}

impl SceneSnapshot {
    /// Session generation the snapshot belongs to
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Scene revision at the time of the snapshot
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn populated(&self) -> usize {
        self.populated
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    pub fn get(&self, index: usize) -> Option<&Arc<TubeMesh>> {
        self.slots.get(index).and_then(|s| s.as_ref())
    }

    /// Populated slots in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Arc<TubeMesh>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|t| (i, t)))
    }

    /// Indices of the populated slots
    pub fn populated_indices(&self) -> Vec<usize> {
        self.iter().map(|(i, _)| i).collect()
    }

    /// Total swept vertices across all tubes
    pub fn vertex_count(&self) -> usize {
        self.iter().map(|(_, t)| t.vertex_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{build_tube, simple_direction, TubeParams};
    use nalgebra::Point3;
    use proptest::prelude::*;

    fn tube(len: usize, offset: f64) -> TubeMesh {
        let points: Vec<_> = (0..len)
            .map(|i| Point3::new(i as f64, offset, 0.0))
            .collect();
        let colors = simple_direction(&points);
        build_tube(&points, &colors, &TubeParams::default())
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_accumulate_skips_empty_slots() {
        let mut scene = CompositeScene::new();
        accumulate(&mut scene, vec![Some(tube(3, 0.0)), None, Some(tube(2, 1.0))], 0);

        assert_eq!(scene.populated(), 2);
        assert_eq!(scene.slot_count(), 3);
        assert!(scene.get(0).is_some());
        assert!(scene.get(1).is_none());
        assert!(scene.get(2).is_some());
    }

    #[test]
    fn test_accumulate_offsets_by_next_index() {
        let mut scene = CompositeScene::new();
        accumulate(&mut scene, vec![Some(tube(2, 0.0))], 6);
        assert_eq!(scene.populated(), 1);
        assert!(scene.get(6).is_some());
        assert!(scene.get(0).is_none());
    }

    #[test]
    fn test_all_empty_batch_leaves_scene_unchanged() {
        let mut scene = CompositeScene::new();
        accumulate(&mut scene, vec![Some(tube(2, 0.0))], 0);
        let before = scene.revision();

        accumulate(&mut scene, vec![None, None, None, None], 1);
        assert_eq!(scene.revision(), before);
        assert_eq!(scene.slot_count(), 1);
        assert_eq!(scene.populated(), 1);
    }

    #[test]
    fn test_existing_slot_is_never_overwritten() {
        let mut scene = CompositeScene::new();
        let first = tube(2, 0.0);
        accumulate(&mut scene, vec![Some(first.clone())], 0);
        accumulate(&mut scene, vec![Some(tube(5, 9.0))], 0);

        assert_eq!(scene.populated(), 1);
        assert_eq!(scene.get(0).unwrap().as_ref(), &first);
    }

    #[test]
    fn test_accumulate_returns_same_scene() {
        let mut scene = CompositeScene::new();
        let populated = accumulate(&mut scene, vec![Some(tube(2, 0.0))], 0).populated();
        assert_eq!(populated, 1);
        let again = accumulate(&mut scene, vec![Some(tube(2, 1.0))], 1);
        assert_eq!(again.populated(), 2);
    }

    #[test]
    fn test_snapshot_is_frozen() {
        let mut scene = CompositeScene::new();
        accumulate(&mut scene, vec![Some(tube(2, 0.0))], 0);
        let snapshot = scene.snapshot();

        accumulate(&mut scene, vec![Some(tube(2, 1.0))], 1);
        assert_eq!(snapshot.populated(), 1);
        assert_eq!(snapshot.populated_indices(), vec![0]);
        assert_eq!(scene.snapshot().populated(), 2);
        assert_eq!(snapshot.vertex_count(), 2 * 4);
    }

    #[test]
    fn test_reset_clears_and_tags_generation() {
        let mut scene = CompositeScene::new();
        accumulate(&mut scene, vec![Some(tube(2, 0.0))], 0);
        scene.reset(3);

        assert!(scene.is_empty());
        assert_eq!(scene.slot_count(), 0);
        assert_eq!(scene.generation(), 3);
        assert_eq!(scene.snapshot().generation(), 3);
    }

    proptest! {
        #[test]
        fn test_accumulation_is_index_stable(
            b1 in prop::collection::vec(prop::option::of(2usize..6), 0..8),
            b2 in prop::collection::vec(prop::option::of(2usize..6), 0..8),
        ) {
            let to_tubes = |batch: &[Option<usize>], salt: f64| -> Vec<Option<TubeMesh>> {
                batch
                    .iter()
                    .enumerate()
                    .map(|(i, len)| len.map(|n| tube(n, salt + i as f64)))
                    .collect()
            };

            let mut split = CompositeScene::new();
            accumulate(&mut split, to_tubes(&b1, 0.0), 0);
            accumulate(&mut split, to_tubes(&b2, 100.0), b1.len());

            let mut joined_tubes = to_tubes(&b1, 0.0);
            joined_tubes.extend(to_tubes(&b2, 100.0));
            let mut joined = CompositeScene::new();
            accumulate(&mut joined, joined_tubes, 0);

            // Property: B1 then B2 equals B1 ++ B2 slot for slot
            prop_assert_eq!(split.populated(), joined.populated());
            let a: Vec<_> = split.iter().map(|(i, t)| (i, t.as_ref().clone())).collect();
            let b: Vec<_> = joined.iter().map(|(i, t)| (i, t.as_ref().clone())).collect();
            prop_assert_eq!(a, b);
        }
    }
}
