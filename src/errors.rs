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
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
/// Error for `armreach`
pub enum Error {
    #[error("{}", error)]
    Other { error: String },
    #[error("invalid dimension {dim}: reachability maps are 2 or 3 dimensional")]
    InvalidDimension { dim: usize },
    #[error("invalid voxel size {size}: must be positive")]
    InvalidVoxelSize { size: f64 },
    #[error("invalid bounds on axis {axis}: {min} to {max}")]
    InvalidBounds { axis: usize, min: f64, max: f64 },
    #[error("grid is too large: {}", reason)]
    GridTooLarge { reason: String },
    #[error("size mismatch of {what}: expected {expected}, got {actual}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("map geometry mismatch: {}", reason)]
    GeometryMismatch { reason: String },
    #[error("link {name} not found")]
    LinkNotFound { name: String },
    #[error("sample {point:?} is outside of the extent computed from the same samples")]
    SampleOutOfExtent { point: Vec<f64> },
    #[error("weight matrix is not symmetric positive definite")]
    NotPositiveDefinite,
    #[error("IO error {:?}", error)]
    Io {
        #[from]
        error: io::Error,
    },
    #[error("serialization error: {:?}", error)]
    Serialization {
        #[from]
        error: serde_json::Error,
    },
    #[error("URDF error: {:?}", error)]
    Urdf {
        #[from]
        error: urdf_rs::UrdfError,
    },
    #[error("kinematics error: {:?}", error)]
    Kinematics {
        #[from]
        error: k::Error,
    },
}

/// Result for `armreach`
pub type Result<T> = ::std::result::Result<T, Error>;

impl<'a> From<&'a str> for Error {
    fn from(err: &'a str) -> Error {
        Error::Other {
            error: err.to_owned(),
        }
    }
}

impl From<String> for Error {
    fn from(error: String) -> Error {
        Error::Other { error }
    }
}
