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
use rand::Rng;

/// Generate random joint positions uniformly between the limits
///
/// The generator is passed in so that sampling can be made deterministic.
pub fn generate_random_joint_positions<R>(lower: &[f64], upper: &[f64], rng: &mut R) -> Vec<f64>
where
    R: Rng + ?Sized,
{
    debug_assert_eq!(lower.len(), upper.len());
    lower
        .iter()
        .zip(upper.iter())
        .map(|(min, max)| (max - min) * rng.gen::<f64>() + min)
        .collect()
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    debug_assert!(a.len() == b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Total length of the polyline
pub fn path_length(path: &[Vec<f64>]) -> f64 {
    path.windows(2).map(|w| distance(&w[0], &w[1])).sum()
}

/// Point at the fraction `f` of the arc length of the polyline
///
/// `f` below 0 returns the first point and above 1 the last one.
/// Returns `None` for an empty path.
pub fn point_on_path(path: &[Vec<f64>], f: f64) -> Option<Vec<f64>> {
    let first = path.first()?;
    if path.len() == 1 || f < 0.0 {
        return Some(first.clone());
    }
    let last = path.last()?;
    if f > 1.0 {
        return Some(last.clone());
    }
    let mut pos = path_length(path) * f;
    for w in path.windows(2) {
        let dist = distance(&w[0], &w[1]);
        if pos - dist > 0.0 {
            pos -= dist;
        } else {
            // zero length segments only reach here with pos == 0
            let ratio = if dist > 0.0 { pos / dist } else { 0.0 };
            return Some(
                w[0].iter()
                    .zip(w[1].iter())
                    .map(|(a, b)| a + (b - a) * ratio)
                    .collect(),
            );
        }
    }
    Some(last.clone())
}
