/*
Copyright 2017 Takashi Ogura

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/
use log::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::errors::*;
use crate::funcs::generate_random_joint_positions;
use crate::kinematics::{ForwardKinematics, SelfCollisionCheck};
use crate::voxel::{check_len, VoxelIndexer};

/// Density of the reachable end effector positions on a voxel grid
///
/// The score of a point is `(reach - penalty) / max_value`. Scores are not
/// clamped, so heavily penalized cells have negative scores. Counts saturate instead
/// of wrapping around.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReachabilityMap {
    indexer: VoxelIndexer,
    reach: Vec<u32>,
    penalty: Vec<u64>,
    max_value: u32,
    /// number of joint configurations drawn by `generate`
    pub num_samples: usize,
    /// links ignored by the self collision check in `generate`
    pub excluded_link_names: Vec<String>,
}

impl ReachabilityMap {
    /// Create an empty map with a single cell
    pub fn new(voxel_size: f64, dim: usize) -> Result<Self> {
        ReachabilityMapBuilder::new(voxel_size, dim).finalize()
    }

    /// Fill the map by sampling the joint space of the robot
    ///
    /// Configurations are drawn uniformly between `lower` and `upper`. Self colliding
    /// configurations are rejected, and the bounds of the map are set to the extent
    /// of the accepted effector positions.
    pub fn generate<K, C, R>(
        &mut self,
        kinematics: &K,
        collision: &C,
        effector_name: &str,
        lower: &[f64],
        upper: &[f64],
        rng: &mut R,
    ) -> Result<()>
    where
        K: ForwardKinematics + ?Sized,
        C: SelfCollisionCheck + ?Sized,
        R: Rng + ?Sized,
    {
        let dof = kinematics.dof();
        check_len("lower joint limit", dof, lower.len())?;
        check_len("upper joint limit", dof, upper.len())?;
        let dim = self.dim();
        let link_names = kinematics.link_names();
        let effector_index = link_names
            .iter()
            .position(|name| name == effector_name)
            .ok_or_else(|| Error::LinkNotFound {
                name: effector_name.to_owned(),
            })?;
        let excluded = self
            .excluded_link_names
            .iter()
            .filter_map(|name| link_names.iter().position(|n| n == name))
            .collect::<HashSet<_>>();

        let mut ep_min = vec![::std::f64::INFINITY; dim];
        let mut ep_max = vec![::std::f64::NEG_INFINITY; dim];
        let mut positions = Vec::new();
        for _ in 0..self.num_samples {
            let q = generate_random_joint_positions(lower, upper, rng);
            let transforms = kinematics.link_transforms(&q)?;
            check_len("link transforms", link_names.len(), transforms.len())?;
            if collision.has_self_collision(&link_names, &transforms, &excluded) {
                continue;
            }
            let translation = &transforms[effector_index].translation.vector;
            let x = (0..dim).map(|i| translation[i]).collect::<Vec<_>>();
            for i in 0..dim {
                ep_min[i] = ep_min[i].min(x[i]);
                ep_max[i] = ep_max[i].max(x[i]);
            }
            positions.push(x);
        }
        info!(
            "{} of {} samples are free of self collision",
            positions.len(),
            self.num_samples
        );

        if positions.is_empty() {
            warn!("no collision free samples, the map is empty");
            ep_min = vec![0.0; dim];
            ep_max = vec![0.0; dim];
        } else {
            // the farthest sample lies on the upper bound, keep it inside of the last voxel
            let half_voxel = self.voxel_size() * 0.5;
            for max in ep_max.iter_mut() {
                *max += half_voxel;
            }
        }
        self.generate_from_bounds(&ep_min, &ep_max)?;
        debug!("steps={:?}", self.steps());

        for x in positions {
            match self.indexer.index(&x) {
                Some(idx) => {
                    self.reach[idx] = self.reach[idx].saturating_add(1);
                    self.max_value = self.max_value.max(self.reach[idx]);
                }
                None => {
                    error!("generate: sample {:?} has no voxel", x);
                    return Err(Error::SampleOutOfExtent { point: x });
                }
            }
        }
        Ok(())
    }

    /// Set the bounds of the map explicitly and zero both grids
    ///
    /// The map is left unchanged if the grid can not be allocated.
    pub fn generate_from_bounds(&mut self, lower: &[f64], upper: &[f64]) -> Result<()> {
        let mut indexer = self.indexer.clone();
        indexer.set_bounds(lower, upper)?;
        let len = indexer.len();
        let reach = zeroed_grid(len)?;
        let penalty = zeroed_grid(len)?;
        self.indexer = indexer;
        self.reach = reach;
        self.penalty = penalty;
        self.max_value = 0;
        Ok(())
    }

    /// Score of the point, 0 if it is outside of the map or the map is empty
    pub fn value(&self, point: &[f64]) -> f64 {
        if self.max_value == 0 {
            return 0.0;
        }
        match self.indexer.index(point) {
            Some(idx) => {
                (f64::from(self.reach[idx]) - self.penalty[idx] as f64)
                    / f64::from(self.max_value)
            }
            None => 0.0,
        }
    }

    /// Overwrite the reach count of the cell which contains the point
    ///
    /// Returns false if the point is outside of the map. `max_value` is never decreased.
    pub fn set_value(&mut self, point: &[f64], value: u32) -> bool {
        match self.indexer.index(point) {
            Some(idx) => {
                self.reach[idx] = value;
                self.max_value = self.max_value.max(value);
                true
            }
            None => false,
        }
    }

    /// Zero all reach counts. Penalties are kept.
    pub fn clear(&mut self) {
        for r in self.reach.iter_mut() {
            *r = 0;
        }
        self.max_value = 0;
    }

    /// Dilate the reachable region by one voxel
    ///
    /// Every empty cell which has a reachable axis aligned neighbour gains 1.
    /// The cells are judged on a snapshot taken before the pass, so the region grows
    /// exactly one voxel per call.
    pub fn grow(&mut self) {
        let active = self.reach.iter().map(|&r| r > 0).collect::<Vec<_>>();
        let mut grown = vec![false; active.len()];
        for idx in (0..active.len()).filter(|&i| active[i]) {
            let coord = self.indexer.coord_of(idx);
            for n in self.indexer.neighbours(&coord) {
                if !active[n] {
                    grown[n] = true;
                }
            }
        }
        for (r, _) in self.reach.iter_mut().zip(grown).filter(|(_, g)| *g) {
            *r = r.saturating_add(1);
            self.max_value = self.max_value.max(*r);
        }
    }

    /// Add the reach counts of the other map
    ///
    /// Both maps must have the same geometry.
    pub fn add_map(&mut self, other: &ReachabilityMap) -> Result<()> {
        if !self.indexer.same_geometry(&other.indexer) {
            return Err(Error::GeometryMismatch {
                reason: format!(
                    "steps {:?} min {:?} max {:?} vs steps {:?} min {:?} max {:?}",
                    self.steps(),
                    self.min(),
                    self.max(),
                    other.steps(),
                    other.min(),
                    other.max()
                ),
            });
        }
        for (r, o) in self.reach.iter_mut().zip(other.reach.iter()) {
            *r = r.saturating_add(*o);
            self.max_value = self.max_value.max(*r);
        }
        Ok(())
    }

    /// Penalize the cell which contains the point by the current `max_value`
    ///
    /// Returns false if the point is outside of the map.
    pub fn add_penalty(&mut self, point: &[f64]) -> bool {
        match self.indexer.index(point) {
            Some(idx) => {
                let penalty = &mut self.penalty[idx];
                *penalty = penalty.saturating_add(u64::from(self.max_value));
                true
            }
            None => false,
        }
    }

    pub fn reset_penalty(&mut self) {
        for p in self.penalty.iter_mut() {
            *p = 0;
        }
    }

    pub fn max_value(&self) -> f64 {
        f64::from(self.max_value)
    }

    pub fn dim(&self) -> usize {
        self.indexer.dim()
    }

    pub fn voxel_size(&self) -> f64 {
        self.indexer.voxel_size()
    }

    pub fn min(&self) -> &[f64] {
        self.indexer.min()
    }

    pub fn max(&self) -> &[f64] {
        self.indexer.max()
    }

    pub fn steps(&self) -> &[usize] {
        self.indexer.steps()
    }

    pub fn indexer(&self) -> &VoxelIndexer {
        &self.indexer
    }

    pub fn reach_counts(&self) -> &[u32] {
        &self.reach
    }

    pub fn penalties(&self) -> &[u64] {
        &self.penalty
    }

    /// Number of cells with a positive reach count
    pub fn num_reachable_cells(&self) -> usize {
        self.reach.iter().filter(|&&r| r > 0).count()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let map: ReachabilityMap = serde_json::from_str(json)?;
        map.validate()?;
        Ok(map)
    }

    pub fn save<P>(&self, path: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        Self::from_json(&fs::read_to_string(path)?)
    }

    fn validate(&self) -> Result<()> {
        self.indexer.validate()?;
        check_len("reach counts", self.indexer.len(), self.reach.len())?;
        check_len("penalties", self.indexer.len(), self.penalty.len())?;
        if self.reach.iter().any(|&r| r > self.max_value) {
            return Err("max value is smaller than a reach count".into());
        }
        Ok(())
    }
}

fn zeroed_grid<T>(len: usize) -> Result<Vec<T>>
where
    T: Clone + Default,
{
    let mut grid = Vec::new();
    grid.try_reserve_exact(len)
        .map_err(|e| Error::GridTooLarge {
            reason: format!("{} voxels: {}", len, e),
        })?;
    grid.resize(len, T::default());
    Ok(grid)
}

/// Builder of `ReachabilityMap`
pub struct ReachabilityMapBuilder {
    pub voxel_size: f64,
    pub dim: usize,
    pub num_samples: usize,
    pub excluded_link_names: Vec<String>,
}

impl ReachabilityMapBuilder {
    pub fn new(voxel_size: f64, dim: usize) -> Self {
        ReachabilityMapBuilder {
            voxel_size,
            dim,
            num_samples: 100_000,
            excluded_link_names: vec!["env_link".to_owned()],
        }
    }
    pub fn num_samples(mut self, num_samples: usize) -> Self {
        self.num_samples = num_samples;
        self
    }
    pub fn excluded_link_names(mut self, names: Vec<String>) -> Self {
        self.excluded_link_names = names;
        self
    }
    pub fn finalize(self) -> Result<ReachabilityMap> {
        let indexer = VoxelIndexer::new(self.voxel_size, self.dim)?;
        let len = indexer.len();
        Ok(ReachabilityMap {
            indexer,
            reach: vec![0; len],
            penalty: vec![0; len],
            max_value: 0,
            num_samples: self.num_samples,
            excluded_link_names: self.excluded_link_names,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision_checker::SelfCollisionChecker;
    use crate::kinematics::tests::two_link_robot;
    use crate::kinematics::{ChainKinematics, NoSelfCollision};
    use nalgebra as na;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TOLERANCE: f64 = 0.00001;

    fn grid_3x3() -> ReachabilityMap {
        let mut map = ReachabilityMap::new(1.0, 2).unwrap();
        map.generate_from_bounds(&[0.0, 0.0], &[3.0, 3.0]).unwrap();
        map
    }

    fn cell(x: usize, y: usize) -> Vec<f64> {
        vec![x as f64 + 0.5, y as f64 + 0.5]
    }

    /// Planar arm with two unit links, every link is reported at its origin
    struct PlanarArm;

    impl ForwardKinematics for PlanarArm {
        fn dof(&self) -> usize {
            2
        }
        fn link_names(&self) -> Vec<String> {
            vec!["base".to_owned(), "elbow".to_owned(), "tool".to_owned()]
        }
        fn link_transforms(&self, q: &[f64]) -> Result<Vec<na::Isometry3<f64>>> {
            let elbow = na::Vector3::new(q[0].cos(), q[0].sin(), 0.0);
            let tool = elbow + na::Vector3::new((q[0] + q[1]).cos(), (q[0] + q[1]).sin(), 0.0);
            Ok(vec![
                na::Isometry3::identity(),
                na::Isometry3::new(elbow, na::zero()),
                na::Isometry3::new(tool, na::zero()),
            ])
        }
    }

    /// Rejects all configurations where the tool is in the half plane y < 0,
    /// unless the tool is excluded
    struct UpperHalfOnly;

    impl SelfCollisionCheck for UpperHalfOnly {
        fn has_self_collision(
            &self,
            _link_names: &[String],
            transforms: &[na::Isometry3<f64>],
            excluded: &HashSet<usize>,
        ) -> bool {
            !excluded.contains(&2) && transforms[2].translation.vector[1] < 0.0
        }
    }

    struct AlwaysColliding;

    impl SelfCollisionCheck for AlwaysColliding {
        fn has_self_collision(
            &self,
            _link_names: &[String],
            _transforms: &[na::Isometry3<f64>],
            _excluded: &HashSet<usize>,
        ) -> bool {
            true
        }
    }

    #[test]
    fn test_invalid_config() {
        assert!(ReachabilityMap::new(0.1, 1).is_err());
        assert!(ReachabilityMap::new(0.1, 4).is_err());
        assert!(ReachabilityMap::new(0.0, 3).is_err());
    }

    #[test]
    fn test_outside_points() {
        let mut map = grid_3x3();
        assert!(map.set_value(&cell(1, 1), 5));
        assert!(!map.set_value(&[3.0, 1.0], 5));
        for p in &[[-0.1, 1.0], [3.0, 1.0], [1.0, 3.0], [1.0, -5.0], [10.0, 10.0]] {
            assert_eq!(map.indexer().index(p), None);
            assert_eq!(map.value(p), 0.0);
        }
        assert!(!map.add_penalty(&[-1.0, -1.0]));
        assert!(map.penalties().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_empty_map_value() {
        let map = grid_3x3();
        assert_eq!(map.max_value(), 0.0);
        assert_eq!(map.value(&cell(1, 1)), 0.0);
    }

    #[test]
    fn test_set_value_and_clear() {
        let mut map = grid_3x3();
        map.set_value(&cell(0, 0), 4);
        map.set_value(&cell(2, 2), 2);
        assert!((map.max_value() - 4.0).abs() < TOLERANCE);
        assert!((map.value(&cell(2, 2)) - 0.5).abs() < TOLERANCE);
        map.set_value(&cell(0, 0), 1);
        assert!((map.max_value() - 4.0).abs() < TOLERANCE);

        map.add_penalty(&cell(2, 2));
        map.clear();
        assert_eq!(map.max_value(), 0.0);
        assert!(map.reach_counts().iter().all(|&r| r == 0));
        assert_eq!(map.penalties().iter().filter(|&&p| p > 0).count(), 1);
    }

    #[test]
    fn test_grow_single_cell() {
        let mut map = grid_3x3();
        map.set_value(&cell(1, 1), 1);
        map.grow();
        assert_eq!(map.value(&cell(1, 1)), 1.0);
        for &(x, y) in &[(0, 1), (2, 1), (1, 0), (1, 2)] {
            assert_eq!(map.reach_counts()[map.indexer().index(&cell(x, y)).unwrap()], 1);
        }
        for &(x, y) in &[(0, 0), (2, 0), (0, 2), (2, 2)] {
            assert_eq!(map.reach_counts()[map.indexer().index(&cell(x, y)).unwrap()], 0);
        }
        assert_eq!(map.max_value(), 1.0);

        map.grow();
        assert!(map.reach_counts().iter().all(|&r| r == 1));
    }

    #[test]
    fn test_grow_one_voxel_per_call() {
        let mut map = ReachabilityMap::new(1.0, 3).unwrap();
        map.generate_from_bounds(&[0.0, 0.0, 0.0], &[7.0, 1.0, 1.0])
            .unwrap();
        map.set_value(&[0.5, 0.5, 0.5], 3);
        for i in 1..7 {
            let before = map.reach_counts().to_vec();
            let max_before = map.max_value();
            map.grow();
            assert_eq!(map.num_reachable_cells(), i + 1);
            assert!(map
                .reach_counts()
                .iter()
                .zip(before.iter())
                .all(|(after, before)| after >= before));
            assert!(map.max_value() >= max_before);
        }
        assert_eq!(map.reach_counts(), &[3, 1, 1, 1, 1, 1, 1]);
    }

    #[test]
    fn test_add_map_twice() {
        let mut a = grid_3x3();
        let mut b = grid_3x3();
        a.set_value(&cell(0, 0), 2);
        a.set_value(&cell(1, 2), 1);
        b.set_value(&cell(0, 0), 1);
        b.set_value(&cell(2, 2), 3);
        let original = a.reach_counts().to_vec();
        a.add_map(&b).unwrap();
        a.add_map(&b).unwrap();
        for ((r, o), b) in a
            .reach_counts()
            .iter()
            .zip(original.iter())
            .zip(b.reach_counts().iter())
        {
            assert_eq!(*r, o + 2 * b);
        }
        assert_eq!(a.max_value(), 6.0);
    }

    #[test]
    fn test_add_map_geometry_mismatch() {
        let mut a = grid_3x3();
        let mut b = ReachabilityMap::new(1.0, 2).unwrap();
        b.generate_from_bounds(&[0.0, 0.0], &[4.0, 3.0]).unwrap();
        assert!(a.add_map(&b).is_err());
        let c = ReachabilityMap::new(1.0, 3).unwrap();
        assert!(a.add_map(&c).is_err());
    }

    #[test]
    fn test_penalty() {
        let mut map = grid_3x3();
        map.set_value(&cell(1, 1), 2);
        map.set_value(&cell(0, 1), 1);
        let mut last = map.value(&cell(0, 1));
        assert!((last - 0.5).abs() < TOLERANCE);
        for _ in 0..3 {
            map.add_penalty(&cell(0, 1));
            let value = map.value(&cell(0, 1));
            assert!(value < last);
            last = value;
        }
        // penalties stack without clamping
        assert!((last - (0.5 - 3.0)).abs() < TOLERANCE);
        assert!((map.value(&cell(1, 1)) - 1.0).abs() < TOLERANCE);

        map.reset_penalty();
        assert!((map.value(&cell(0, 1)) - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn test_saturated_counts() {
        let mut map = grid_3x3();
        assert!(map.set_value(&cell(1, 1), 3_000_000_000));
        let copy = map.clone();
        map.add_map(&copy).unwrap();
        assert_eq!(map.reach_counts()[4], u32::MAX);
        assert_eq!(map.max_value(), f64::from(u32::MAX));
        map.grow();
        assert_eq!(map.reach_counts()[4], u32::MAX);
        assert_eq!(map.reach_counts()[1], 1);

        let mut last = map.value(&cell(0, 1));
        for _ in 0..4 {
            map.add_penalty(&cell(0, 1));
            let value = map.value(&cell(0, 1));
            assert!(value < last);
            last = value;
        }
        assert!((last - (1.0 / f64::from(u32::MAX) - 4.0)).abs() < TOLERANCE);
    }

    #[test]
    fn test_too_large_bounds() {
        let mut map = ReachabilityMap::new(1e-6, 3).unwrap();
        map.generate_from_bounds(&[0.0, 0.0, 0.0], &[1e-5, 1e-5, 1e-5])
            .unwrap();
        let steps = map.steps().to_vec();
        let len = map.reach_counts().len();
        assert!(map
            .generate_from_bounds(&[0.0, 0.0, 0.0], &[1e6, 1e6, 1e6])
            .is_err());
        assert!(map
            .generate_from_bounds(&[0.0, 0.0, 0.0], &[f64::INFINITY, 1.0, 1.0])
            .is_err());
        assert_eq!(map.steps(), steps.as_slice());
        assert_eq!(map.reach_counts().len(), len);
        assert_eq!(map.penalties().len(), len);
        assert_eq!(map.indexer().len(), len);
    }

    #[test]
    fn test_generate() {
        let mut map = ReachabilityMapBuilder::new(0.5, 2)
            .num_samples(5000)
            .finalize()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let lower = [-3.0, -3.0];
        let upper = [3.0, 3.0];
        map.generate(&PlanarArm, &NoSelfCollision, "tool", &lower, &upper, &mut rng)
            .unwrap();
        assert!(map.max_value() > 0.0);
        let total = map.reach_counts().iter().map(|&r| r as usize).sum::<usize>();
        assert_eq!(total, 5000);
        for i in 0..2 {
            assert!(map.min()[i] >= -2.0 - TOLERANCE);
            assert!(map.max()[i] <= 2.0 + 0.25 + TOLERANCE);
        }
        assert!(map.value(&[1.5, 0.0]) > 0.0);
        assert_eq!(map.value(&[2.5, 2.5]), 0.0);
    }

    #[test]
    fn test_generate_rejects_collisions() {
        let mut map = ReachabilityMapBuilder::new(0.1, 2)
            .num_samples(2000)
            .excluded_link_names(Vec::new())
            .finalize()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        map.generate(
            &PlanarArm,
            &UpperHalfOnly,
            "tool",
            &[-3.0, -3.0],
            &[3.0, 3.0],
            &mut rng,
        )
        .unwrap();
        assert!(map.min()[1] >= 0.0);
        let total = map.reach_counts().iter().map(|&r| r as usize).sum::<usize>();
        assert!(total < 2000);

        let mut map = ReachabilityMapBuilder::new(0.1, 2)
            .num_samples(2000)
            .excluded_link_names(vec!["tool".to_owned()])
            .finalize()
            .unwrap();
        map.generate(
            &PlanarArm,
            &UpperHalfOnly,
            "tool",
            &[-3.0, -3.0],
            &[3.0, 3.0],
            &mut rng,
        )
        .unwrap();
        assert!(map.min()[1] < 0.0);
    }

    #[test]
    fn test_generate_all_colliding() {
        let mut map = ReachabilityMapBuilder::new(0.1, 3)
            .num_samples(100)
            .finalize()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        map.generate(
            &PlanarArm,
            &AlwaysColliding,
            "tool",
            &[-1.0, -1.0],
            &[1.0, 1.0],
            &mut rng,
        )
        .unwrap();
        assert_eq!(map.max_value(), 0.0);
        assert!(map.reach_counts().iter().all(|&r| r == 0));
        assert_eq!(map.value(&[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_generate_invalid_input() {
        let mut map = ReachabilityMapBuilder::new(0.1, 2)
            .num_samples(10)
            .finalize()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        assert!(map
            .generate(&PlanarArm, &NoSelfCollision, "hand", &[0.0, 0.0], &[1.0, 1.0], &mut rng)
            .is_err());
        assert!(map
            .generate(&PlanarArm, &NoSelfCollision, "tool", &[0.0], &[1.0], &mut rng)
            .is_err());
    }

    #[test]
    fn test_generate_with_chain() {
        let robot = two_link_robot();
        let kinematics = ChainKinematics::from_urdf_robot(&robot);
        let checker = SelfCollisionChecker::from_urdf_robot(&robot, 0.01);
        let mut map = ReachabilityMapBuilder::new(0.05, 3)
            .num_samples(3000)
            .finalize()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        map.generate(
            &kinematics,
            &checker,
            "tool",
            &[-3.0, -3.05],
            &[3.0, 3.05],
            &mut rng,
        )
        .unwrap();
        let total = map.reach_counts().iter().map(|&r| r as usize).sum::<usize>();
        assert!(total > 0 && total < 3000);
        assert_eq!(map.steps()[2], 1);
        assert!(map.num_reachable_cells() > 10);
    }

    #[test]
    fn test_json() {
        let mut map = grid_3x3();
        map.set_value(&cell(2, 1), 7);
        map.add_penalty(&cell(0, 0));
        let loaded = ReachabilityMap::from_json(&map.to_json().unwrap()).unwrap();
        assert_eq!(loaded.voxel_size(), map.voxel_size());
        assert_eq!(loaded.dim(), map.dim());
        assert_eq!(loaded.min(), map.min());
        assert_eq!(loaded.max(), map.max());
        assert_eq!(loaded.steps(), map.steps());
        assert_eq!(loaded.reach_counts(), map.reach_counts());
        assert_eq!(loaded.penalties(), map.penalties());
        assert_eq!(loaded.max_value(), map.max_value());

        let broken = map.to_json().unwrap().replace("\"penalty\":[7,", "\"penalty\":[");
        assert!(ReachabilityMap::from_json(&broken).is_err());

        let json = map.to_json().unwrap();
        assert!(json.contains("\"max\":[3.0,3.0]"));
        let shrunk = json.replace("\"max\":[3.0,3.0]", "\"max\":[3.0,2.0]");
        assert!(ReachabilityMap::from_json(&shrunk).is_err());
        assert!(json.contains("\"voxel_size\":1.0"));
        let negative = json.replace("\"voxel_size\":1.0", "\"voxel_size\":-1.0");
        assert!(ReachabilityMap::from_json(&negative).is_err());
        let empty = json.replace("\"voxel_size\":1.0", "\"voxel_size\":0.0");
        assert!(ReachabilityMap::from_json(&empty).is_err());
    }
}
