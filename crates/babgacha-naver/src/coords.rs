//! Conversion of Naver's projected map coordinates into WGS84 lat/long.
//!
//! The API's `mapx`/`mapy` fields are KATEC planar coordinates multiplied
//! by 10 and serialized as decimal-string integers. The conversion below is
//! a fixed affine approximation centered on the Korean peninsula, not a
//! general geodetic transform. Its constants are kept bit-for-bit stable:
//! stored coordinates and recorded fixtures depend on them.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

const COORD_SCALE: f64 = 10.0;
const X_OFFSET: f64 = 500_000.0;
const Y_OFFSET: f64 = 200_000.0;
const METERS_PER_DEGREE: f64 = 110_000.0;
const LON_CENTER: f64 = 127.5;
const LAT_CENTER: f64 = 37.5;

// Plausibility box for the target region.
const LAT_MIN: f64 = 33.0;
const LAT_MAX: f64 = 43.0;
const LON_MIN: f64 = 124.0;
const LON_MAX: f64 = 132.0;

/// The raw integer pair kept for diagnostics when a conversion lands
/// outside the plausibility box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProjectedRaw {
    pub mapx: i64,
    pub mapy: i64,
}

/// Result of a successful parse of `mapx`/`mapy`.
///
/// `InRange` carries decimal degrees rounded to 6 places. `OutOfRange`
/// means both inputs parsed but the affine transform left the plausibility
/// box; it serializes with explicit `null` latitude/longitude plus the raw
/// pair, so callers (and stored JSON) can tell "unparseable" from
/// "parsed but implausible".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coordinates {
    InRange { latitude: f64, longitude: f64 },
    OutOfRange(ProjectedRaw),
}

impl Coordinates {
    #[must_use]
    pub fn latitude(&self) -> Option<f64> {
        match self {
            Coordinates::InRange { latitude, .. } => Some(*latitude),
            Coordinates::OutOfRange(_) => None,
        }
    }

    #[must_use]
    pub fn longitude(&self) -> Option<f64> {
        match self {
            Coordinates::InRange { longitude, .. } => Some(*longitude),
            Coordinates::OutOfRange(_) => None,
        }
    }
}

impl Serialize for Coordinates {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Coordinates::InRange {
                latitude,
                longitude,
            } => {
                let mut state = serializer.serialize_struct("Coordinates", 2)?;
                state.serialize_field("latitude", latitude)?;
                state.serialize_field("longitude", longitude)?;
                state.end()
            }
            Coordinates::OutOfRange(raw) => {
                let mut state = serializer.serialize_struct("Coordinates", 3)?;
                state.serialize_field("latitude", &Option::<f64>::None)?;
                state.serialize_field("longitude", &Option::<f64>::None)?;
                state.serialize_field("raw", raw)?;
                state.end()
            }
        }
    }
}

/// Converts a `mapx`/`mapy` string pair into [`Coordinates`].
///
/// Returns `None` when either input is empty or does not parse as an
/// integer. Parsed values outside the plausibility box come back as
/// [`Coordinates::OutOfRange`] rather than `None`.
#[must_use]
pub fn convert_map_coordinates(mapx: &str, mapy: &str) -> Option<Coordinates> {
    let x: i64 = mapx.trim().parse().ok()?;
    let y: i64 = mapy.trim().parse().ok()?;

    #[allow(clippy::cast_precision_loss)]
    let katec_x = x as f64 / COORD_SCALE;
    #[allow(clippy::cast_precision_loss)]
    let katec_y = y as f64 / COORD_SCALE;

    let longitude = (katec_x - X_OFFSET) / METERS_PER_DEGREE + LON_CENTER;
    let latitude = (katec_y - Y_OFFSET) / METERS_PER_DEGREE + LAT_CENTER;

    if !(LAT_MIN..=LAT_MAX).contains(&latitude) || !(LON_MIN..=LON_MAX).contains(&longitude) {
        return Some(Coordinates::OutOfRange(ProjectedRaw { mapx: x, mapy: y }));
    }

    Some(Coordinates::InRange {
        latitude: round6(latitude),
        longitude: round6(longitude),
    })
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    /// mapx/mapy inputs that land exactly on the given lat/long after the
    /// affine transform (inverse of the conversion, scaled by 10).
    fn projected_for(latitude: f64, longitude: f64) -> (String, String) {
        let x = ((longitude - LON_CENTER) * METERS_PER_DEGREE + X_OFFSET) * COORD_SCALE;
        let y = ((latitude - LAT_CENTER) * METERS_PER_DEGREE + Y_OFFSET) * COORD_SCALE;
        #[allow(clippy::cast_possible_truncation)]
        ((x.round() as i64).to_string(), (y.round() as i64).to_string())
    }

    #[test]
    fn gangnam_area_converts_in_range() {
        // Roughly Gangnam station.
        let (mapx, mapy) = projected_for(37.4979, 127.0276);
        let coords = convert_map_coordinates(&mapx, &mapy).expect("should parse");
        let lat = coords.latitude().expect("in range");
        let lon = coords.longitude().expect("in range");
        assert!((lat - 37.4979).abs() < 0.0001, "lat {lat}");
        assert!((lon - 127.0276).abs() < 0.0001, "lon {lon}");
    }

    #[test]
    fn non_numeric_input_returns_none() {
        assert!(convert_map_coordinates("abc", "123").is_none());
        assert!(convert_map_coordinates("123", "").is_none());
        assert!(convert_map_coordinates("", "").is_none());
        assert!(convert_map_coordinates("12.5", "34").is_none());
    }

    #[test]
    fn exact_boundary_values_are_in_range() {
        // The box is inclusive: only strictly-outside values are rejected.
        for (lat, lon) in [
            (33.0, 127.5),
            (43.0, 127.5),
            (37.5, 124.0),
            (37.5, 132.0),
        ] {
            let (mapx, mapy) = projected_for(lat, lon);
            let coords = convert_map_coordinates(&mapx, &mapy).expect("should parse");
            assert!(
                coords.latitude().is_some(),
                "({lat}, {lon}) should be in range, got {coords:?}"
            );
        }
    }

    #[test]
    fn boundary_values_just_inside_are_in_range() {
        for (lat, lon) in [
            (33.001, 127.5),
            (42.999, 127.5),
            (37.5, 124.001),
            (37.5, 131.999),
        ] {
            let (mapx, mapy) = projected_for(lat, lon);
            let coords = convert_map_coordinates(&mapx, &mapy).expect("should parse");
            assert!(
                coords.latitude().is_some(),
                "({lat}, {lon}) should be in range, got {coords:?}"
            );
        }
    }

    #[test]
    fn boundary_values_just_outside_are_out_of_range() {
        for (lat, lon) in [
            (32.9, 127.5),
            (43.1, 127.5),
            (37.5, 123.9),
            (37.5, 132.1),
        ] {
            let (mapx, mapy) = projected_for(lat, lon);
            let coords = convert_map_coordinates(&mapx, &mapy).expect("should parse");
            assert!(
                matches!(coords, Coordinates::OutOfRange(_)),
                "({lat}, {lon}) should be out of range, got {coords:?}"
            );
        }
    }

    #[test]
    fn out_of_range_preserves_raw_pair() {
        // Zero is far outside the plausibility box.
        let coords = convert_map_coordinates("0", "0").expect("should parse");
        assert_eq!(
            coords,
            Coordinates::OutOfRange(ProjectedRaw { mapx: 0, mapy: 0 })
        );
    }

    #[test]
    fn in_range_rounds_to_six_decimals() {
        let (mapx, mapy) = projected_for(37.123_456_789, 127.987_654_321);
        let coords = convert_map_coordinates(&mapx, &mapy).expect("should parse");
        let lat = coords.latitude().expect("in range");
        // Six decimal places means the value times 1e6 is integral.
        assert!(((lat * 1_000_000.0).round() - lat * 1_000_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn serialization_shapes() {
        let valid = Coordinates::InRange {
            latitude: 37.5,
            longitude: 127.5,
        };
        let json = serde_json::to_value(valid).expect("serialize");
        assert_eq!(json["latitude"], 37.5);
        assert_eq!(json["longitude"], 127.5);
        assert!(json.get("raw").is_none());

        let invalid = Coordinates::OutOfRange(ProjectedRaw { mapx: 1, mapy: 2 });
        let json = serde_json::to_value(invalid).expect("serialize");
        assert!(json["latitude"].is_null());
        assert!(json["longitude"].is_null());
        assert_eq!(json["raw"]["mapx"], 1);
        assert_eq!(json["raw"]["mapy"], 2);
    }
}
