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
//! # Reachability Maps and Joint Limit Avoidance for Robot Arms
//!
//! `ReachabilityMap` samples the joint space of a robot and stores where the end effector
//! can reach without self collision, as a score field on a voxel grid.
//! `JointLimitAvoidanceTask` computes, every control cycle, a torque pushing the joints
//! away from their limits and a nullspace projector for the lower priority tasks.
//!
//! # Example
//!
//! ```
//! use nalgebra::{DMatrix, DVector};
//! use rand::SeedableRng;
//!
//! let urdf = r#"
//! <robot name="arm">
//!   <link name="base"/>
//!   <link name="tool"/>
//!   <joint name="j0" type="revolute">
//!     <parent link="base"/>
//!     <child link="tool"/>
//!     <origin xyz="0 0 0.5" rpy="0 0 0"/>
//!     <axis xyz="0 1 0"/>
//!     <limit lower="-1.5" upper="1.5" effort="1" velocity="1"/>
//!   </joint>
//! </robot>"#;
//! let robot = urdf_rs::read_from_string(urdf).unwrap();
//! let kinematics = armreach::ChainKinematics::from_urdf_robot(&robot);
//! let checker = armreach::SelfCollisionChecker::from_urdf_robot(&robot, 0.01);
//!
//! // Sample the reachable positions of "tool", projected on the x-y plane
//! let mut map = armreach::ReachabilityMapBuilder::new(0.05, 2)
//!     .num_samples(1000)
//!     .finalize()
//!     .unwrap();
//! let mut rng = rand::rngs::StdRng::seed_from_u64(0);
//! map.generate(&kinematics, &checker, "tool", &[-1.5], &[1.5], &mut rng)
//!     .unwrap();
//! map.grow();
//! println!("score = {}", map.value(&[0.0, 0.5]));
//!
//! // Push the joint away from its upper limit
//! let mut task = armreach::JointLimitAvoidanceTaskBuilder::new(
//!     vec![-1.5],
//!     vec![1.5],
//!     vec![0.2],
//!     vec![5.0],
//! )
//! .finalize()
//! .unwrap();
//! let mut torque = DVector::zeros(1);
//! let mut nullspace = DMatrix::zeros(1, 1);
//! task.compute(
//!     &DVector::from_vec(vec![1.45]),
//!     &DVector::from_vec(vec![0.1]),
//!     &DMatrix::identity(1, 1),
//!     &mut torque,
//!     &mut nullspace,
//! )
//! .unwrap();
//! assert!(torque[0] < 0.0);
//! ```

mod errors;
pub use crate::errors::*;

mod voxel;
pub use crate::voxel::*;

mod funcs;
pub use crate::funcs::*;

mod kinematics;
pub use crate::kinematics::*;

mod collision_checker;
pub use crate::collision_checker::*;

mod reachability_map;
pub use crate::reachability_map::*;

mod joint_limit_task;
pub use crate::joint_limit_task::*;
