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
use clap::Parser;
use rand::SeedableRng;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "reach", about = "Generate a reachability map of an end link")]
struct Opt {
    /// URDF file of the robot
    urdf_path: PathBuf,
    /// name of the end link
    end_link: String,
    #[arg(long, default_value = "0.05")]
    voxel_size: f64,
    /// 2 or 3
    #[arg(long, default_value = "3")]
    dim: usize,
    #[arg(long, default_value = "100000")]
    num_samples: usize,
    /// number of dilation steps after sampling
    #[arg(long, default_value = "0")]
    grow: usize,
    #[arg(long, default_value = "0.01")]
    prediction: f64,
    /// links ignored by the self collision check
    #[arg(long)]
    exclude: Vec<String>,
    /// pairs like "link1:link2" to check instead of all non adjacent pairs
    #[arg(long)]
    self_collision_pair: Vec<String>,
    #[arg(long)]
    seed: Option<u64>,
    /// save the map as JSON
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> armreach::Result<()> {
    env_logger::init();
    let opt = Opt::parse();
    let urdf_robot = urdf_rs::read_file(&opt.urdf_path)?;
    let kinematics = armreach::ChainKinematics::from_urdf_robot(&urdf_robot);
    let mut checker = armreach::SelfCollisionChecker::from_urdf_robot(&urdf_robot, opt.prediction);
    if !opt.self_collision_pair.is_empty() {
        checker = checker.with_self_collision_pairs(armreach::parse_colon_separated_pairs(
            &opt.self_collision_pair,
        )?);
    }

    // joints without limits are sampled in -PI <-> PI
    let limits = kinematics
        .chain
        .iter_joints()
        .map(|joint| joint.limits.clone())
        .collect::<Vec<_>>();
    let lower = limits
        .iter()
        .map(|range| range.as_ref().map_or(-std::f64::consts::PI, |r| r.min))
        .collect::<Vec<_>>();
    let upper = limits
        .iter()
        .map(|range| range.as_ref().map_or(std::f64::consts::PI, |r| r.max))
        .collect::<Vec<_>>();

    let mut builder = armreach::ReachabilityMapBuilder::new(opt.voxel_size, opt.dim)
        .num_samples(opt.num_samples);
    if !opt.exclude.is_empty() {
        builder = builder.excluded_link_names(opt.exclude.clone());
    }
    let mut map = builder.finalize()?;
    let mut rng = match opt.seed {
        Some(seed) => rand::rngs::StdRng::seed_from_u64(seed),
        None => rand::rngs::StdRng::from_entropy(),
    };
    map.generate(&kinematics, &checker, &opt.end_link, &lower, &upper, &mut rng)?;
    for _ in 0..opt.grow {
        map.grow();
    }

    println!("min = {:?}", map.min());
    println!("max = {:?}", map.max());
    println!("steps = {:?}", map.steps());
    println!(
        "reachable cells = {} / {}",
        map.num_reachable_cells(),
        map.reach_counts().len()
    );
    println!("max value = {}", map.max_value());

    if let Some(output) = opt.output {
        map.save(&output)?;
        println!("saved to {:?}", output);
    }
    Ok(())
}
