//! Spacepoints: 3D hit positions with cylindrical coordinates and a link back
//! to the detector measurements they were built from.

use std::ops::Index;

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Identifier of a detector measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeasurementId(pub u64);

/// Measurements a spacepoint was formed from.
///
/// Pixel spacepoints come from a single measurement, strip spacepoints from
/// a pair of crossing strip measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasurementLink {
    Single(MeasurementId),
    Pair([MeasurementId; 2]),
}

impl MeasurementLink {
    #[inline]
    pub fn ids(&self) -> &[MeasurementId] {
        match self {
            MeasurementLink::Single(id) => std::slice::from_ref(id),
            MeasurementLink::Pair(ids) => ids,
        }
    }
}

/// A single hit position.
///
/// The transverse radius `r` and azimuth `phi` are derived once on
/// construction; the value is immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacepoint {
    position: DVec3,
    r: f64,
    phi: f64,
    var_r: f64,
    var_z: f64,
    link: MeasurementLink,
}

impl Spacepoint {
    pub fn new(position: DVec3, link: MeasurementLink) -> Self {
        Self {
            position,
            r: position.x.hypot(position.y),
            phi: position.y.atan2(position.x),
            var_r: 0.0,
            var_z: 0.0,
            link,
        }
    }

    /// Attach position variances (mm²) in the radial and longitudinal direction.
    pub fn with_variance(mut self, var_r: f64, var_z: f64) -> Self {
        self.var_r = var_r;
        self.var_z = var_z;
        self
    }

    #[inline]
    pub fn position(&self) -> DVec3 {
        self.position
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.position.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.position.y
    }

    #[inline]
    pub fn z(&self) -> f64 {
        self.position.z
    }

    /// Transverse radius.
    #[inline]
    pub fn r(&self) -> f64 {
        self.r
    }

    /// Azimuth in `(-pi, pi]`.
    #[inline]
    pub fn phi(&self) -> f64 {
        self.phi
    }

    #[inline]
    pub fn var_r(&self) -> f64 {
        self.var_r
    }

    #[inline]
    pub fn var_z(&self) -> f64 {
        self.var_z
    }

    #[inline]
    pub fn link(&self) -> &MeasurementLink {
        &self.link
    }
}

/// All spacepoints of one event.
#[derive(Debug, Clone, Default)]
pub struct SpacepointCollection {
    points: Vec<Spacepoint>,
}

impl SpacepointCollection {
    pub fn from_vec(points: Vec<Spacepoint>) -> Self {
        Self { points }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Spacepoint> {
        self.points.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Spacepoint> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[Spacepoint] {
        &self.points
    }

    /// Measurement ids behind the spacepoint at `index`.
    pub fn measurements(&self, index: usize) -> &[MeasurementId] {
        self.points[index].link.ids()
    }
}

impl Index<usize> for SpacepointCollection {
    type Output = Spacepoint;

    #[inline]
    fn index(&self, index: usize) -> &Spacepoint {
        &self.points[index]
    }
}

impl FromIterator<Spacepoint> for SpacepointCollection {
    fn from_iter<I: IntoIterator<Item = Spacepoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use common::float_ext::FloatExt;

    use super::*;

    #[test]
    fn test_cylindrical_coordinates() {
        let sp = Spacepoint::new(
            DVec3::new(3.0, 4.0, -12.0),
            MeasurementLink::Single(MeasurementId(1)),
        );
        assert!(sp.r().relative_eq(5.0, 1e-12));
        assert!(sp.phi().relative_eq(4.0_f64.atan2(3.0), 1e-12));
        assert_eq!(sp.z(), -12.0);
    }

    #[test]
    fn test_phi_range_negative_x_axis() {
        let sp = Spacepoint::new(
            DVec3::new(-10.0, 0.0, 0.0),
            MeasurementLink::Single(MeasurementId(0)),
        );
        assert!(sp.phi().relative_eq(std::f64::consts::PI, 1e-12));
    }

    #[test]
    fn test_measurement_links() {
        let collection = SpacepointCollection::from_vec(vec![
            Spacepoint::new(DVec3::X, MeasurementLink::Single(MeasurementId(4))),
            Spacepoint::new(
                DVec3::Y,
                MeasurementLink::Pair([MeasurementId(5), MeasurementId(9)]),
            ),
        ]);
        assert_eq!(collection.measurements(0), &[MeasurementId(4)]);
        assert_eq!(
            collection.measurements(1),
            &[MeasurementId(5), MeasurementId(9)]
        );
    }

    #[test]
    fn test_variance_defaults_to_zero() {
        let sp = Spacepoint::new(DVec3::ONE, MeasurementLink::Single(MeasurementId(0)));
        assert_eq!(sp.var_r(), 0.0);
        assert_eq!(sp.var_z(), 0.0);
        let sp = sp.with_variance(0.01, 0.04);
        assert_eq!(sp.var_r(), 0.01);
        assert_eq!(sp.var_z(), 0.04);
    }
}
