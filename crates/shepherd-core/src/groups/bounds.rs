use serde::{Deserialize, Serialize};

use crate::models::HomeGroup;

/// A map viewport in degrees.
///
/// `west > east` means the box crosses the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct GeoBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeoBounds {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Latitudes ordered and clamped to ±90, longitudes wrapped to ±180.
    pub fn normalized(&self) -> Self {
        let (north, south) = if self.north >= self.south {
            (self.north, self.south)
        } else {
            (self.south, self.north)
        };
        Self {
            north: north.clamp(-90.0, 90.0),
            south: south.clamp(-90.0, 90.0),
            east: wrap_longitude(self.east),
            west: wrap_longitude(self.west),
        }
    }

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        if latitude > self.north || latitude < self.south {
            return false;
        }
        if self.west <= self.east {
            longitude >= self.west && longitude <= self.east
        } else {
            longitude >= self.west || longitude <= self.east
        }
    }

    /// Box of `radius_deg` around a point, e.g. for "groups near me".
    /// A radius of 180 or more spans every longitude.
    pub fn around(latitude: f64, longitude: f64, radius_deg: f64) -> Self {
        let (east, west) = if radius_deg >= 180.0 {
            (180.0, -180.0)
        } else {
            (longitude + radius_deg, longitude - radius_deg)
        };
        Self::new(latitude + radius_deg, latitude - radius_deg, east, west).normalized()
    }

    pub fn filter<'a>(&self, groups: &'a [HomeGroup]) -> Vec<&'a HomeGroup> {
        groups
            .iter()
            .filter(|g| {
                g.coordinates()
                    .is_some_and(|(lat, lon)| self.contains(lat, lon))
            })
            .collect()
    }
}

fn wrap_longitude(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains() {
        let b = GeoBounds::new(-23.0, -24.0, -46.0, -47.0);
        assert!(b.contains(-23.5, -46.6));
        assert!(!b.contains(-22.9, -46.6));
        assert!(!b.contains(-23.5, -45.9));
    }

    #[test]
    fn test_antimeridian_box() {
        let b = GeoBounds::new(10.0, -10.0, -170.0, 170.0);
        assert!(b.contains(0.0, 175.0));
        assert!(b.contains(0.0, -175.0));
        assert!(!b.contains(0.0, 0.0));
    }

    #[test]
    fn test_normalized() {
        let b = GeoBounds::new(-95.0, 10.0, 190.0, -200.0).normalized();
        assert_eq!(b.north, 10.0);
        assert_eq!(b.south, -90.0);
        assert!((b.east - -170.0).abs() < 1e-9);
        assert!((b.west - 160.0).abs() < 1e-9);
    }

    #[test]
    fn test_huge_radius_covers_the_globe() {
        let b = GeoBounds::around(-23.5, -46.6, 200.0);
        assert_eq!((b.north, b.south, b.east, b.west), (90.0, -90.0, 180.0, -180.0));
        assert!(b.contains(0.0, 0.0));
        assert!(b.contains(35.7, 139.7));
        assert!(b.contains(-23.5, -46.6));
    }

    #[test]
    fn test_around_crossing_antimeridian() {
        let b = GeoBounds::around(0.0, 179.0, 2.0);
        assert!(b.contains(0.0, -179.5));
        assert!(b.contains(0.0, 178.0));
        assert!(!b.contains(0.0, 0.0));
    }

    #[test]
    fn test_around_and_filter() {
        let groups: Vec<HomeGroup> = serde_json::from_str(
            r#"[
                {"id": 1, "name": "Near", "latitude": -23.55, "longitude": -46.63},
                {"id": 2, "name": "Far", "latitude": -22.90, "longitude": -43.20},
                {"id": 3, "name": "Online"}
            ]"#,
        )
        .expect("Failed to parse groups JSON");
        let b = GeoBounds::around(-23.56, -46.64, 0.1);
        let ids: Vec<i64> = b.filter(&groups).iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![1]);
    }
}
