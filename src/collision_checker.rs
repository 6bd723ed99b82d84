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
use nalgebra as na;
use ncollide3d::{
    query,
    shape::{Ball, ConvexHull, Cuboid, Cylinder, ShapeHandle},
    transformation::ToTriMesh,
};
use std::collections::{HashMap, HashSet};

use crate::errors::*;
use crate::kinematics::SelfCollisionCheck;

/// Number of sides of the polygon approximating a cylinder
const CYLINDER_SUBDIVISIONS: u32 = 32;

type NameShapeMap = HashMap<String, Vec<(ShapeHandle<f64>, na::Isometry3<f64>)>>;

fn urdf_geometry_to_shape_handle(geometry: &urdf_rs::Geometry) -> Option<ShapeHandle<f64>> {
    match *geometry {
        urdf_rs::Geometry::Box { ref size } => {
            let cube = Cuboid::new(na::Vector3::new(
                size[0] * 0.5,
                size[1] * 0.5,
                size[2] * 0.5,
            ));
            Some(ShapeHandle::new(cube))
        }
        urdf_rs::Geometry::Cylinder { radius, length } => {
            // ncollide cylinders are along y, URDF cylinders along z
            let y_to_z =
                na::UnitQuaternion::from_euler_angles(std::f64::consts::FRAC_PI_2, 0.0, 0.0);
            let mesh = Cylinder::new(length * 0.5, radius).to_trimesh(CYLINDER_SUBDIVISIONS);
            let points = mesh.coords.iter().map(|p| y_to_z * p).collect::<Vec<_>>();
            match ConvexHull::try_from_points(&points) {
                Some(hull) => Some(ShapeHandle::new(hull)),
                None => {
                    warn!("degenerate cylinder r={} l={} is ignored", radius, length);
                    None
                }
            }
        }
        urdf_rs::Geometry::Sphere { radius } => Some(ShapeHandle::new(Ball::new(radius))),
        _ => {
            warn!("unsupported collision geometry {:?} is ignored", geometry);
            None
        }
    }
}

#[derive(Clone)]
/// Self collision checker for a robot
pub struct SelfCollisionChecker {
    name_collision_model_map: NameShapeMap,
    /// margin length for collision check
    pub prediction: f64,
    pub self_collision_pairs: Vec<(String, String)>,
}

impl SelfCollisionChecker {
    /// Create SelfCollisionChecker from HashMap
    pub fn new(
        name_collision_model_map: NameShapeMap,
        prediction: f64,
        self_collision_pairs: Vec<(String, String)>,
    ) -> Self {
        SelfCollisionChecker {
            name_collision_model_map,
            prediction,
            self_collision_pairs,
        }
    }

    /// Create SelfCollisionChecker from urdf_rs::Robot
    ///
    /// All pairs of links with collision geometry which are not connected by a joint
    /// are checked.
    pub fn from_urdf_robot(urdf_robot: &urdf_rs::Robot, prediction: f64) -> Self {
        let mut name_collision_model_map = HashMap::new();
        for l in &urdf_robot.links {
            let col_pose_vec = l
                .collision
                .iter()
                .filter_map(|collision| {
                    urdf_geometry_to_shape_handle(&collision.geometry)
                        .map(|col| (col, k::urdf::isometry_from(&collision.origin)))
                })
                .collect::<Vec<_>>();
            debug!("name={}, ln={}", l.name, col_pose_vec.len());
            if !col_pose_vec.is_empty() {
                name_collision_model_map.insert(l.name.to_owned(), col_pose_vec);
            }
        }
        let adjacent = urdf_robot
            .joints
            .iter()
            .map(|j| (j.parent.link.as_str(), j.child.link.as_str()))
            .collect::<HashSet<_>>();
        let mut self_collision_pairs = Vec::new();
        let names = urdf_robot
            .links
            .iter()
            .map(|l| l.name.as_str())
            .filter(|name| name_collision_model_map.contains_key(*name))
            .collect::<Vec<_>>();
        for (i, n1) in names.iter().enumerate() {
            for n2 in &names[i + 1..] {
                if !adjacent.contains(&(*n1, *n2)) && !adjacent.contains(&(*n2, *n1)) {
                    self_collision_pairs.push((n1.to_string(), n2.to_string()));
                }
            }
        }
        SelfCollisionChecker {
            name_collision_model_map,
            prediction,
            self_collision_pairs,
        }
    }

    /// Replace the checked pairs
    pub fn with_self_collision_pairs(mut self, pairs: Vec<(String, String)>) -> Self {
        self.self_collision_pairs = pairs;
        self
    }

    /// Returns all the colliding pairs
    pub fn self_colliding_link_names(
        &self,
        link_names: &[String],
        transforms: &[na::Isometry3<f64>],
        excluded: &HashSet<usize>,
    ) -> Vec<(String, String)> {
        self.self_colliding_link_names_with_first_return_flag(
            link_names, transforms, excluded, false,
        )
    }

    /// Check self collision and return the pairs of the link names
    ///
    /// first_return: if true the function returns immediately when it found a collision.
    /// This flag is to make it fast.
    pub fn self_colliding_link_names_with_first_return_flag(
        &self,
        link_names: &[String],
        transforms: &[na::Isometry3<f64>],
        excluded: &HashSet<usize>,
        first_return: bool,
    ) -> Vec<(String, String)> {
        let mut names = Vec::new();
        let index_map = link_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect::<HashMap<_, _>>();
        for (l1, l2) in &self.self_collision_pairs {
            let (i1, i2) = match (index_map.get(l1.as_str()), index_map.get(l2.as_str())) {
                (Some(i1), Some(i2)) => (*i1, *i2),
                _ => {
                    debug!("self_colliding: {} or {} not found", l1, l2);
                    continue;
                }
            };
            if excluded.contains(&i1) || excluded.contains(&i2) {
                continue;
            }
            let (obj_vec1, obj_vec2) = match (
                self.name_collision_model_map.get(l1),
                self.name_collision_model_map.get(l2),
            ) {
                (Some(v1), Some(v2)) => (v1, v2),
                _ => continue,
            };
            let trans1 = &transforms[i1];
            let trans2 = &transforms[i2];
            'pair: for obj1 in obj_vec1 {
                for obj2 in obj_vec2 {
                    let dist =
                        query::distance(&(trans1 * obj1.1), &*obj1.0, &(trans2 * obj2.1), &*obj2.0);
                    if dist < self.prediction {
                        debug!("name: {}, name: {} dist={}", l1, l2, dist);
                        names.push((l1.to_owned(), l2.to_owned()));
                        if first_return {
                            return names;
                        }
                        break 'pair;
                    }
                }
            }
        }
        names
    }
}

impl SelfCollisionCheck for SelfCollisionChecker {
    fn has_self_collision(
        &self,
        link_names: &[String],
        transforms: &[na::Isometry3<f64>],
        excluded: &HashSet<usize>,
    ) -> bool {
        !self
            .self_colliding_link_names_with_first_return_flag(link_names, transforms, excluded, true)
            .is_empty()
    }
}

pub fn parse_colon_separated_pairs(pair_strs: &[String]) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for pair_str in pair_strs {
        let mut sp = pair_str.split(':');
        match (sp.next(), sp.next(), sp.next()) {
            (Some(p1), Some(p2), None) if !p1.is_empty() && !p2.is_empty() => {
                pairs.push((p1.to_owned(), p2.to_owned()));
            }
            _ => return Err(format!("failed to parse {}", pair_str).into()),
        }
    }
    Ok(pairs)
}
