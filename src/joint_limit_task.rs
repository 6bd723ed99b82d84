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
use nalgebra::{Cholesky, DMatrix, DVector};
use std::collections::HashSet;

use crate::errors::*;
use crate::voxel::check_len;

/// Joints with an activation above this value are counted as active
pub const ACTIVATION_THRESHOLD: f64 = 0.001;

const JACOBI_MAX_SWEEPS: usize = 50;

/// Repulsive torque from the joint limits
///
/// Returns the torque and the penetration depth into the margin normalized to `[0, 1]`.
/// The torque is quadratic in the depth: zero at the inner edge of the margin and
/// `max_torque` at the limit itself. The position is clamped to the limits first.
pub fn joint_limit_torque(
    upper: f64,
    lower: f64,
    margin: f64,
    max_torque: f64,
    position: f64,
) -> (f64, f64) {
    let q = position.max(lower).min(upper);
    if q > upper - margin {
        let depth = (q - upper + margin) / margin;
        (-depth * depth * max_torque, depth.abs())
    } else if q < lower + margin {
        let depth = (lower + margin - q) / margin;
        (depth * depth * max_torque, depth.abs())
    } else {
        (0.0, 0.0)
    }
}

/// Number of activations above `ACTIVATION_THRESHOLD`
pub fn count_activations(activations: &[f64]) -> usize {
    activations
        .iter()
        .filter(|&&a| a > ACTIVATION_THRESHOLD)
        .count()
}

/// Smooth saturating transfer from the penetration depth to the task activation
///
/// The activation is 0 until the depth reaches `1 - n_des`, then rises as
/// `(1 - x)^steepness` with `x = (1 - depth) / n_des` and reaches 1 at the limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivationFunction {
    pub n_des: f64,
    pub steepness: f64,
}

impl Default for ActivationFunction {
    fn default() -> Self {
        ActivationFunction {
            n_des: 0.2,
            steepness: 4.0,
        }
    }
}

impl ActivationFunction {
    pub fn activation(&self, depth01: f64) -> f64 {
        let x = ((1.0 - depth01) / self.n_des).max(0.0).min(1.0);
        (1.0 - x).powf(self.steepness)
    }
}

/// Joint limit avoidance task for a task priority controller
///
/// `compute` writes the repulsive torque of every joint, damps it with a damping
/// matrix which is critical with respect to the weight (inertia) matrix of the caller,
/// and returns a nullspace projector for the lower priority tasks.
#[derive(Debug, Clone)]
pub struct JointLimitAvoidanceTask {
    lower_limit: DVector<f64>,
    upper_limit: DVector<f64>,
    limit_range: DVector<f64>,
    max_torque: DVector<f64>,
    excluded_joints: HashSet<usize>,
    activation: DVector<f64>,
    stiffness: DVector<f64>,
    repulsion: DVector<f64>,
    damping: DMatrix<f64>,
    // n x n scratch of `update_damping`
    cholesky_l: DMatrix<f64>,
    work: DMatrix<f64>,
    eigen_values: DMatrix<f64>,
    eigen_vectors: DMatrix<f64>,
    /// 1.0 is critical damping
    pub damping_ratio: f64,
    /// stiffness of the joints which are not pushed by the limits
    pub stiffness_epsilon: f64,
    /// torques below this are treated as zero
    pub torque_threshold: f64,
    pub activation_function: ActivationFunction,
}

impl JointLimitAvoidanceTask {
    pub fn dof(&self) -> usize {
        self.lower_limit.len()
    }

    /// Compute the torque and the nullspace projector
    ///
    /// `torque` and `nullspace` must be sized for `dof()` joints. The repulsive torque
    /// is written to `torque` and the damping term `D * velocity` is subtracted from it.
    pub fn compute(
        &mut self,
        position: &DVector<f64>,
        velocity: &DVector<f64>,
        weight: &DMatrix<f64>,
        torque: &mut DVector<f64>,
        nullspace: &mut DMatrix<f64>,
    ) -> Result<()> {
        let n = self.dof();
        check_len("position", n, position.len())?;
        check_len("velocity", n, velocity.len())?;
        check_len("torque", n, torque.len())?;
        check_len("weight rows", n, weight.nrows())?;
        check_len("weight columns", n, weight.ncols())?;
        check_len("nullspace rows", n, nullspace.nrows())?;
        check_len("nullspace columns", n, nullspace.ncols())?;

        for i in 0..n {
            if self.excluded_joints.contains(&i) {
                self.repulsion[i] = 0.0;
                self.activation[i] = 0.0;
                self.stiffness[i] = self.stiffness_epsilon;
            } else {
                let (trq, depth01) = joint_limit_torque(
                    self.upper_limit[i],
                    self.lower_limit[i],
                    self.limit_range[i],
                    self.max_torque[i],
                    position[i],
                );
                self.repulsion[i] = trq;
                self.activation[i] = self.activation_function.activation(depth01);
                self.stiffness[i] = if trq.abs() > self.torque_threshold {
                    self.max_torque[i] / self.limit_range[i]
                } else {
                    self.stiffness_epsilon
                };
            }
        }

        self.update_damping(weight)?;
        torque.copy_from(&self.repulsion);
        torque.gemv(-1.0, &self.damping, velocity, 1.0);

        // J is diag(activation), so N = I - J^T J is diagonal
        nullspace.fill_with_identity();
        for i in 0..n {
            nullspace[(i, i)] -= self.activation[i] * self.activation[i];
        }
        Ok(())
    }

    /// D = 2 * ratio * Q^T sqrt(Lambda) Q for the generalized eigen problem K x = lambda W x
    ///
    /// With W = L L^T and L^-1 K L^-T = V Lambda V^T, Q = V^T L^T, so
    /// D = 2 * ratio * sum_k sqrt(lambda_k) (L v_k) (L v_k)^T. Only the scratch matrices
    /// of the task are written.
    fn update_damping(&mut self, weight: &DMatrix<f64>) -> Result<()> {
        let n = self.dof();
        let mut l = std::mem::replace(&mut self.cholesky_l, DMatrix::zeros(0, 0));
        l.copy_from(weight);
        match Cholesky::new(l) {
            Some(chol) => self.cholesky_l = chol.unpack(),
            None => {
                self.cholesky_l = DMatrix::zeros(n, n);
                return Err(Error::NotPositiveDefinite);
            }
        }

        // eigen_values = L^-1 K L^-T
        self.work.fill(0.0);
        self.work.set_diagonal(&self.stiffness);
        if !self.cholesky_l.solve_lower_triangular_mut(&mut self.work) {
            return Err(Error::NotPositiveDefinite);
        }
        self.work.transpose_to(&mut self.eigen_values);
        if !self.cholesky_l.solve_lower_triangular_mut(&mut self.eigen_values) {
            return Err(Error::NotPositiveDefinite);
        }
        self.eigen_values.transpose_to(&mut self.work);
        self.eigen_values += &self.work;
        self.eigen_values *= 0.5;

        jacobi_eigen(&mut self.eigen_values, &mut self.eigen_vectors);

        // work = L V
        for k in 0..n {
            self.work.column_mut(k).gemv(
                1.0,
                &self.cholesky_l,
                &self.eigen_vectors.column(k),
                0.0,
            );
        }
        self.damping.fill(0.0);
        for k in 0..n {
            let lambda = self.eigen_values[(k, k)];
            if lambda < 0.0 {
                trace!("negative eigen value {} is clamped", lambda);
            }
            let gain = 2.0 * self.damping_ratio * lambda.max(0.0).sqrt();
            self.damping
                .ger(gain, &self.work.column(k), &self.work.column(k), 1.0);
        }
        Ok(())
    }

    /// Number of joints whose activation is above `ACTIVATION_THRESHOLD`
    pub fn activation_count(&self) -> usize {
        count_activations(self.activation.as_slice())
    }

    pub fn activations(&self) -> &DVector<f64> {
        &self.activation
    }

    pub fn stiffness(&self) -> &DVector<f64> {
        &self.stiffness
    }

    /// Repulsive torques of the last `compute`, before damping
    pub fn repulsion_torques(&self) -> &DVector<f64> {
        &self.repulsion
    }

    /// Damping matrix of the last `compute`
    pub fn damping(&self) -> &DMatrix<f64> {
        &self.damping
    }

    pub fn excluded_joints(&self) -> &HashSet<usize> {
        &self.excluded_joints
    }
}

/// Eigen decomposition of a symmetric matrix by cyclic Jacobi rotations
///
/// On return the diagonal of `a` holds the eigenvalues and the columns of `vectors` the
/// eigenvectors. Works in place on the given matrices.
fn jacobi_eigen(a: &mut DMatrix<f64>, vectors: &mut DMatrix<f64>) {
    let n = a.nrows();
    vectors.fill_with_identity();
    for _ in 0..JACOBI_MAX_SWEEPS {
        let mut off = 0.0;
        let mut total = 0.0;
        for j in 0..n {
            for i in 0..n {
                let sq = a[(i, j)] * a[(i, j)];
                total += sq;
                if i != j {
                    off += sq;
                }
            }
        }
        if off <= total * f64::EPSILON * f64::EPSILON {
            return;
        }
        for p in 0..n {
            for q in p + 1..n {
                let apq = a[(p, q)];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[(q, q)] - a[(p, p)]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;
                rotate_columns(a, p, q, c, s);
                rotate_rows(a, p, q, c, s);
                a[(p, q)] = 0.0;
                a[(q, p)] = 0.0;
                rotate_columns(vectors, p, q, c, s);
            }
        }
    }
    warn!("jacobi eigen decomposition did not converge");
}

fn rotate_columns(m: &mut DMatrix<f64>, p: usize, q: usize, c: f64, s: f64) {
    for k in 0..m.nrows() {
        let mkp = m[(k, p)];
        let mkq = m[(k, q)];
        m[(k, p)] = c * mkp - s * mkq;
        m[(k, q)] = s * mkp + c * mkq;
    }
}

fn rotate_rows(m: &mut DMatrix<f64>, p: usize, q: usize, c: f64, s: f64) {
    for k in 0..m.ncols() {
        let mpk = m[(p, k)];
        let mqk = m[(q, k)];
        m[(p, k)] = c * mpk - s * mqk;
        m[(q, k)] = s * mpk + c * mqk;
    }
}

/// Builder of `JointLimitAvoidanceTask`
pub struct JointLimitAvoidanceTaskBuilder {
    pub lower_limit: Vec<f64>,
    pub upper_limit: Vec<f64>,
    pub limit_range: Vec<f64>,
    pub max_torque: Vec<f64>,
    pub excluded_joints: HashSet<usize>,
    pub damping_ratio: f64,
    pub stiffness_epsilon: f64,
    pub torque_threshold: f64,
    pub activation_function: ActivationFunction,
}

impl JointLimitAvoidanceTaskBuilder {
    pub fn new(
        lower_limit: Vec<f64>,
        upper_limit: Vec<f64>,
        limit_range: Vec<f64>,
        max_torque: Vec<f64>,
    ) -> Self {
        JointLimitAvoidanceTaskBuilder {
            lower_limit,
            upper_limit,
            limit_range,
            max_torque,
            excluded_joints: HashSet::new(),
            damping_ratio: 0.7,
            stiffness_epsilon: 0.001,
            torque_threshold: 0.000001,
            activation_function: ActivationFunction::default(),
        }
    }
    pub fn excluded_joints<I>(mut self, joints: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        self.excluded_joints = joints.into_iter().collect();
        self
    }
    pub fn damping_ratio(mut self, damping_ratio: f64) -> Self {
        self.damping_ratio = damping_ratio;
        self
    }
    pub fn stiffness_epsilon(mut self, stiffness_epsilon: f64) -> Self {
        self.stiffness_epsilon = stiffness_epsilon;
        self
    }
    pub fn torque_threshold(mut self, torque_threshold: f64) -> Self {
        self.torque_threshold = torque_threshold;
        self
    }
    pub fn activation_function(mut self, activation_function: ActivationFunction) -> Self {
        self.activation_function = activation_function;
        self
    }
    pub fn finalize(self) -> Result<JointLimitAvoidanceTask> {
        let n = self.lower_limit.len();
        check_len("upper limit", n, self.upper_limit.len())?;
        check_len("limit range", n, self.limit_range.len())?;
        check_len("max torque", n, self.max_torque.len())?;
        for i in 0..n {
            if self.excluded_joints.contains(&i) {
                continue;
            }
            if !(self.lower_limit[i] < self.upper_limit[i]) {
                return Err(format!(
                    "joint {}: lower limit {} is not below upper limit {}",
                    i, self.lower_limit[i], self.upper_limit[i]
                )
                .into());
            }
            if !(self.limit_range[i] > 0.0) {
                return Err(format!(
                    "joint {}: limit range {} must be positive",
                    i, self.limit_range[i]
                )
                .into());
            }
        }
        if let Some(j) = self.excluded_joints.iter().find(|&&j| j >= n) {
            warn!("excluded joint {} does not exist", j);
        }
        Ok(JointLimitAvoidanceTask {
            lower_limit: DVector::from_vec(self.lower_limit),
            upper_limit: DVector::from_vec(self.upper_limit),
            limit_range: DVector::from_vec(self.limit_range),
            max_torque: DVector::from_vec(self.max_torque),
            excluded_joints: self.excluded_joints,
            activation: DVector::zeros(n),
            stiffness: DVector::from_element(n, self.stiffness_epsilon),
            repulsion: DVector::zeros(n),
            damping: DMatrix::zeros(n, n),
            cholesky_l: DMatrix::zeros(n, n),
            work: DMatrix::zeros(n, n),
            eigen_values: DMatrix::zeros(n, n),
            eigen_vectors: DMatrix::identity(n, n),
            damping_ratio: self.damping_ratio,
            stiffness_epsilon: self.stiffness_epsilon,
            torque_threshold: self.torque_threshold,
            activation_function: self.activation_function,
        })
    }
}
