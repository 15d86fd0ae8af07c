//! Facial landmark samples and eye-contour extraction

use serde::{Deserialize, Serialize};

/// Number of points in a full face-mesh sample (468 mesh + 10 iris)
pub const FACE_MESH_POINTS: usize = 478;

/// A landmark in the provider's native (normalized) coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance in 3D
    pub fn distance(&self, other: &Point3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl From<[f32; 3]> for Point3 {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

/// One observation instant's landmarks, indexed with stable numbering.
///
/// Absence of a face is modelled as `Option::<LandmarkSample>::None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkSample {
    points: Vec<Point3>,
}

impl LandmarkSample {
    pub fn new(points: Vec<Point3>) -> Self {
        Self { points }
    }

    pub fn get(&self, index: usize) -> Option<&Point3> {
        self.points.get(index)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point3] {
        &self.points
    }
}

impl FromIterator<Point3> for LandmarkSample {
    fn from_iter<I: IntoIterator<Item = Point3>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Which eye a contour belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    /// Fixed landmark indices, ordered p1..p6
    pub const fn indices(self) -> [usize; 6] {
        match self {
            Eye::Left => LEFT_EYE_INDICES,
            Eye::Right => RIGHT_EYE_INDICES,
        }
    }
}

/// Left eye: corners 33/133, lid pairs 160/144 and 158/153
pub const LEFT_EYE_INDICES: [usize; 6] = [33, 160, 158, 133, 153, 144];

/// Right eye: corners 362/263, lid pairs 385/380 and 387/373
pub const RIGHT_EYE_INDICES: [usize; 6] = [362, 385, 387, 263, 373, 380];

/// Six eye points in canonical order.
///
/// `p1`/`p4` are the horizontal corners; `p2`/`p6` and `p3`/`p5` are the
/// vertical lid pairs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeContour {
    pub points: [Point3; 6],
}

impl EyeContour {
    pub fn p(&self, n: usize) -> &Point3 {
        &self.points[n - 1]
    }
}

/// Select the contour for `eye`, or `None` if any referenced point is missing
pub fn extract_eye(sample: &LandmarkSample, eye: Eye) -> Option<EyeContour> {
    let idx = eye.indices();
    let mut points = [Point3::default(); 6];
    for (slot, &i) in points.iter_mut().zip(idx.iter()) {
        *slot = *sample.get(i)?;
    }
    Some(EyeContour { points })
}

/// Extract both eyes; `None` if either is unavailable
pub fn extract_eyes(sample: Option<&LandmarkSample>) -> Option<(EyeContour, EyeContour)> {
    let sample = sample?;
    Some((extract_eye(sample, Eye::Left)?, extract_eye(sample, Eye::Right)?))
}

/// Synthetic samples with known eye geometry
#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    fn place_eye(points: &mut [Point3], eye: Eye, origin_x: f32, ear: f32) {
        let [p1, p2, p3, p4, p5, p6] = eye.indices();
        let half = ear / 2.0;
        points[p1] = Point3::new(origin_x, 0.5, 0.0);
        points[p4] = Point3::new(origin_x + 1.0, 0.5, 0.0);
        points[p2] = Point3::new(origin_x + 0.33, 0.5 + half, 0.0);
        points[p6] = Point3::new(origin_x + 0.33, 0.5 - half, 0.0);
        points[p3] = Point3::new(origin_x + 0.66, 0.5 + half, 0.0);
        points[p5] = Point3::new(origin_x + 0.66, 0.5 - half, 0.0);
    }

    /// Full face-mesh sample whose eyes both have the given EAR
    pub(crate) fn sample_with_ear(ear: f32) -> LandmarkSample {
        sample_with_eyes(ear, ear)
    }

    pub(crate) fn sample_with_eyes(left: f32, right: f32) -> LandmarkSample {
        let mut points = vec![Point3::default(); FACE_MESH_POINTS];
        place_eye(&mut points, Eye::Left, 0.0, left);
        place_eye(&mut points, Eye::Right, 2.0, right);
        LandmarkSample::new(points)
    }
}
