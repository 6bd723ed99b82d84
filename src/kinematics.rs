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
use nalgebra as na;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::errors::*;

/// Forward kinematics of a robot, used as a black box while sampling
pub trait ForwardKinematics {
    /// Number of the movable joints
    fn dof(&self) -> usize;
    /// Names of the links, in the same order as `link_transforms`
    fn link_names(&self) -> Vec<String>;
    /// World transforms of all links for the joint positions
    fn link_transforms(&self, joint_positions: &[f64]) -> Result<Vec<na::Isometry3<f64>>>;
}

/// Self collision check of a robot in a given configuration
pub trait SelfCollisionCheck {
    /// `link_names` and `transforms` are aligned. Links whose index is in `excluded`
    /// must be ignored.
    fn has_self_collision(
        &self,
        link_names: &[String],
        transforms: &[na::Isometry3<f64>],
        excluded: &HashSet<usize>,
    ) -> bool;
}

/// Accepts every configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSelfCollision;

impl SelfCollisionCheck for NoSelfCollision {
    fn has_self_collision(
        &self,
        _link_names: &[String],
        _transforms: &[na::Isometry3<f64>],
        _excluded: &HashSet<usize>,
    ) -> bool {
        false
    }
}

/// `ForwardKinematics` backed by `k::Chain`
pub struct ChainKinematics {
    pub chain: k::Chain<f64>,
    link_names: Vec<String>,
}

impl ChainKinematics {
    /// Nodes are named by their joint names
    pub fn new(chain: k::Chain<f64>) -> Self {
        let link_names = chain.iter().map(|node| node.joint().name.clone()).collect();
        ChainKinematics { chain, link_names }
    }

    /// Nodes are named by the URDF link names attached to their joints
    pub fn from_urdf_robot(urdf_robot: &urdf_rs::Robot) -> Self {
        let chain = k::Chain::<f64>::from(urdf_robot);
        let joint_link_map = k::urdf::link_to_joint_map(urdf_robot)
            .into_iter()
            .map(|(link, joint)| (joint, link))
            .collect::<HashMap<_, _>>();
        let link_names = chain
            .iter()
            .map(|node| {
                let joint_name = &node.joint().name;
                joint_link_map
                    .get(joint_name)
                    .cloned()
                    .unwrap_or_else(|| joint_name.clone())
            })
            .collect();
        ChainKinematics { chain, link_names }
    }

    pub fn from_urdf_file<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        Ok(Self::from_urdf_robot(&urdf_rs::read_file(path)?))
    }
}

impl ForwardKinematics for ChainKinematics {
    fn dof(&self) -> usize {
        self.chain.dof()
    }

    fn link_names(&self) -> Vec<String> {
        self.link_names.clone()
    }

    fn link_transforms(&self, joint_positions: &[f64]) -> Result<Vec<na::Isometry3<f64>>> {
        self.chain.set_joint_positions(joint_positions)?;
        Ok(self.chain.update_transforms())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two link planar arm rotating around z, the lower link is a cylinder along x
    pub(crate) const TWO_LINK_URDF: &str = r#"
<robot name="two_link">
  <link name="base">
    <collision>
      <geometry><box size="0.1 0.1 0.1"/></geometry>
    </collision>
  </link>
  <link name="upper">
    <collision>
      <origin xyz="0.25 0 0" rpy="0 0 0"/>
      <geometry><box size="0.4 0.05 0.05"/></geometry>
    </collision>
  </link>
  <link name="lower">
    <collision>
      <origin xyz="0.25 0 0" rpy="0 1.5707963267948966 0"/>
      <geometry><cylinder radius="0.025" length="0.4"/></geometry>
    </collision>
  </link>
  <link name="tool"/>
  <joint name="shoulder" type="revolute">
    <parent link="base"/>
    <child link="upper"/>
    <origin xyz="0 0 0" rpy="0 0 0"/>
    <axis xyz="0 0 1"/>
    <limit lower="-3.0" upper="3.0" effort="10" velocity="1"/>
  </joint>
  <joint name="elbow" type="revolute">
    <parent link="upper"/>
    <child link="lower"/>
    <origin xyz="0.5 0 0" rpy="0 0 0"/>
    <axis xyz="0 0 1"/>
    <limit lower="-3.1" upper="3.1" effort="10" velocity="1"/>
  </joint>
  <joint name="tool_fixed" type="fixed">
    <parent link="lower"/>
    <child link="tool"/>
    <origin xyz="0.5 0 0" rpy="0 0 0"/>
  </joint>
</robot>
"#;

    pub(crate) fn two_link_robot() -> urdf_rs::Robot {
        urdf_rs::read_from_string(TWO_LINK_URDF).unwrap()
    }

    #[test]
    fn test_chain_kinematics() {
        let kinematics = ChainKinematics::from_urdf_robot(&two_link_robot());
        assert_eq!(kinematics.dof(), 2);
        let names = kinematics.link_names();
        let tool_index = names.iter().position(|name| name == "tool").unwrap();
        assert!(names.iter().any(|name| name == "upper"));

        let transforms = kinematics.link_transforms(&[0.0, 0.0]).unwrap();
        assert_eq!(transforms.len(), names.len());
        let tool = transforms[tool_index].translation.vector;
        assert!((tool[0] - 1.0).abs() < 0.00001);
        assert!(tool[1].abs() < 0.00001);

        let transforms = kinematics
            .link_transforms(&[std::f64::consts::FRAC_PI_2, 0.0])
            .unwrap();
        let tool = transforms[tool_index].translation.vector;
        assert!(tool[0].abs() < 0.00001);
        assert!((tool[1] - 1.0).abs() < 0.00001);

        assert!(kinematics.link_transforms(&[0.0]).is_err());
    }
}
