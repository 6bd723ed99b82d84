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
use serde::{Deserialize, Serialize};

use crate::errors::*;

/// Maps continuous points to cells of an axis aligned grid
///
/// Cells are stored row-major: axis 0 is the most significant axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoxelIndexer {
    voxel_size: f64,
    min: Vec<f64>,
    max: Vec<f64>,
    steps: Vec<usize>,
}

impl VoxelIndexer {
    /// Create an indexer with a single voxel per axis at the origin
    pub fn new(voxel_size: f64, dim: usize) -> Result<Self> {
        check_dim(dim)?;
        check_voxel_size(voxel_size)?;
        Ok(VoxelIndexer {
            voxel_size,
            min: vec![0.0; dim],
            max: vec![0.0; dim],
            steps: vec![1; dim],
        })
    }

    /// Set the bounds and recompute the number of steps for each axis
    ///
    /// The indexer is left unchanged if the bounds are not finite or the grid would have
    /// more cells than `usize` can count.
    pub fn set_bounds(&mut self, min: &[f64], max: &[f64]) -> Result<()> {
        check_len("lower bound", self.dim(), min.len())?;
        check_len("upper bound", self.dim(), max.len())?;
        self.steps = compute_steps(self.voxel_size, min, max)?;
        self.min = min.to_vec();
        self.max = max.to_vec();
        Ok(())
    }

    /// Check an indexer which did not come from `new` and `set_bounds`, e.g. a deserialized one
    pub fn validate(&self) -> Result<()> {
        check_dim(self.dim())?;
        check_voxel_size(self.voxel_size)?;
        check_len("upper bound", self.dim(), self.max.len())?;
        check_len("steps", self.dim(), self.steps.len())?;
        let steps = compute_steps(self.voxel_size, &self.min, &self.max)?;
        if steps != self.steps {
            return Err(Error::GeometryMismatch {
                reason: format!(
                    "steps {:?} do not match the bounds {:?} to {:?}, expected {:?}",
                    self.steps, self.min, self.max, steps
                ),
            });
        }
        Ok(())
    }

    pub fn dim(&self) -> usize {
        self.min.len()
    }

    pub fn voxel_size(&self) -> f64 {
        self.voxel_size
    }

    pub fn min(&self) -> &[f64] {
        &self.min
    }

    pub fn max(&self) -> &[f64] {
        &self.max
    }

    pub fn steps(&self) -> &[usize] {
        &self.steps
    }

    /// Number of cells in the grid
    pub fn len(&self) -> usize {
        self.steps.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat index of the cell containing `point`, or `None` if it is outside of the grid
    pub fn index(&self, point: &[f64]) -> Option<usize> {
        if point.len() < self.dim() {
            return None;
        }
        let mut total = 0;
        for (axis, &steps) in self.steps.iter().enumerate() {
            let idx = ((point[axis] - self.min[axis]) / self.voxel_size).floor();
            // also rejects NaN
            if !(idx >= 0.0 && idx < steps as f64) {
                return None;
            }
            total = total * steps + idx as usize;
        }
        Some(total)
    }

    /// Flat index of integer cell coordinates
    pub fn flat_index(&self, coord: &[usize]) -> Option<usize> {
        if coord.len() != self.dim() {
            return None;
        }
        let mut total = 0;
        for (&c, &steps) in coord.iter().zip(self.steps.iter()) {
            if c >= steps {
                return None;
            }
            total = total * steps + c;
        }
        Some(total)
    }

    /// Integer cell coordinates of a flat index
    pub fn coord_of(&self, mut index: usize) -> Vec<usize> {
        let mut coord = vec![0; self.dim()];
        for (c, &steps) in coord.iter_mut().zip(self.steps.iter()).rev() {
            *c = index % steps;
            index /= steps;
        }
        coord
    }

    /// Center point of the cell with the flat index
    pub fn cell_center(&self, index: usize) -> Vec<f64> {
        self.coord_of(index)
            .iter()
            .zip(self.min.iter())
            .map(|(&c, min)| min + (c as f64 + 0.5) * self.voxel_size)
            .collect()
    }

    /// Axis aligned neighbours of the cell at `coord`
    ///
    /// Diagonal cells are not included, so a cell has at most `2 * dim` neighbours.
    pub fn neighbours(&self, coord: &[usize]) -> Vec<usize> {
        let mut indices = Vec::with_capacity(2 * self.dim());
        let mut neighbour = coord.to_vec();
        for axis in 0..self.dim() {
            if coord[axis] > 0 {
                neighbour[axis] = coord[axis] - 1;
                indices.extend(self.flat_index(&neighbour));
            }
            if coord[axis] + 1 < self.steps[axis] {
                neighbour[axis] = coord[axis] + 1;
                indices.extend(self.flat_index(&neighbour));
            }
            neighbour[axis] = coord[axis];
        }
        indices
    }

    /// True if the other indexer describes the same cells
    pub fn same_geometry(&self, other: &VoxelIndexer) -> bool {
        self.voxel_size == other.voxel_size
            && self.min == other.min
            && self.max == other.max
            && self.steps == other.steps
    }
}

fn check_dim(dim: usize) -> Result<()> {
    if dim != 2 && dim != 3 {
        return Err(Error::InvalidDimension { dim });
    }
    Ok(())
}

fn check_voxel_size(voxel_size: f64) -> Result<()> {
    if !(voxel_size > 0.0) || !voxel_size.is_finite() {
        return Err(Error::InvalidVoxelSize { size: voxel_size });
    }
    Ok(())
}

/// `ceil(extent / voxel_size)` per axis, at least 1
fn compute_steps(voxel_size: f64, min: &[f64], max: &[f64]) -> Result<Vec<usize>> {
    let mut steps = Vec::with_capacity(min.len());
    let mut cells: usize = 1;
    for (axis, (&lo, &hi)) in min.iter().zip(max.iter()).enumerate() {
        if !lo.is_finite() || !hi.is_finite() {
            return Err(Error::InvalidBounds {
                axis,
                min: lo,
                max: hi,
            });
        }
        let n = ((hi - lo) / voxel_size).ceil().max(1.0);
        // also rejects an infinite quotient
        if !(n < usize::MAX as f64) {
            return Err(Error::GridTooLarge {
                reason: format!("{} voxels on axis {}", n, axis),
            });
        }
        let n = n as usize;
        cells = cells.checked_mul(n).ok_or_else(|| Error::GridTooLarge {
            reason: format!("{:?} to {:?} with voxel size {}", min, max, voxel_size),
        })?;
        steps.push(n);
    }
    Ok(steps)
}

pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::SizeMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}
