// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GPS fix representation shared by the sampler and the wire format.

use chrono::{DateTime, Utc};
use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

/// A single device GPS fix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy radius in meters (larger is worse)
    pub accuracy_m: f64,
    /// Speed reported by the GPS receiver, if any (m/s)
    pub speed_mps: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

impl LocationFix {
    /// Great-circle distance to another fix, in meters.
    pub fn distance_to(&self, other: &LocationFix) -> f64 {
        let a = Point::new(self.longitude, self.latitude);
        let b = Point::new(other.longitude, other.latitude);
        Haversine.distance(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(lat: f64, lng: f64) -> LocationFix {
        LocationFix {
            latitude: lat,
            longitude: lng,
            accuracy_m: 10.0,
            speed_mps: None,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn test_distance_zero_for_same_point() {
        let a = fix(37.7749, -122.4194);
        assert!(a.distance_to(&a) < 0.001);
    }

    #[test]
    fn test_distance_sf_to_oakland_plausible() {
        // SF downtown to Oakland downtown is roughly 13 km
        let sf = fix(37.7749, -122.4194);
        let oakland = fix(37.8044, -122.2712);
        let d = sf.distance_to(&oakland);
        assert!((10_000.0..20_000.0).contains(&d), "got {} m", d);
    }
}
