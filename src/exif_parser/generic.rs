use serde::Serialize;
use thiserror::Error;

/// Digits kept for coordinates read from stored files.
pub const STORED_PRECISION: i32 = 6;
/// Digits shown in the upload form preview.
pub const DISPLAY_PRECISION: i32 = 4;

/// Numerator/denominator pair as stored by EXIF encoders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rational {
    pub num: f64,
    pub denom: f64,
}

impl Rational {
    pub fn new(num: f64, denom: f64) -> Self {
        Self { num, denom }
    }

    /// Plain decimal taken as `value / 1`.
    pub fn whole(value: f64) -> Self {
        Self::new(value, 1.0)
    }

    /// `None` for a zero denominator or a non-finite component.
    pub fn to_f64(&self) -> Option<f64> {
        if self.denom == 0.0 || !self.num.is_finite() || !self.denom.is_finite() {
            return None;
        }
        Some(self.num / self.denom)
    }
}

impl From<&exif::Rational> for Rational {
    fn from(value: &exif::Rational) -> Self {
        Self::new(f64::from(value.num), f64::from(value.denom))
    }
}

/// Degrees, minutes and seconds, in that order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DmsTriple([Rational; 3]);

impl DmsTriple {
    pub fn new(degrees: Rational, minutes: Rational, seconds: Rational) -> Self {
        Self([degrees, minutes, seconds])
    }

    /// Only slices of exactly three rationals form a triple.
    pub fn from_slice(parts: &[Rational]) -> Option<Self> {
        match parts {
            [d, m, s] => Some(Self::new(*d, *m, *s)),
            _ => None,
        }
    }

    pub fn degrees(&self) -> Rational {
        self.0[0]
    }

    pub fn minutes(&self) -> Rational {
        self.0[1]
    }

    pub fn seconds(&self) -> Rational {
        self.0[2]
    }
}

/// Hemisphere letter attached to a DMS magnitude.
///
/// Anything but an exact `N`, `S`, `E` or `W` is kept as `Other` and never
/// flips the sign, so `"South"` or `"s"` stay positive. This
/// mirrors what existing EXIF consumers do; callers wanting strict
/// validation have to check for `Other` themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HemisphereRef {
    North,
    South,
    East,
    West,
    Other,
}

impl HemisphereRef {
    /// Matches the whole value after trimming NULs and whitespace; `None` when nothing is left.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim_matches(|c: char| c == '\0' || c.is_whitespace());
        Some(match value {
            "" => return None,
            "N" => HemisphereRef::North,
            "S" => HemisphereRef::South,
            "E" => HemisphereRef::East,
            "W" => HemisphereRef::West,
            _ => HemisphereRef::Other,
        })
    }

    pub fn negates(self) -> bool {
        matches!(self, HemisphereRef::South | HemisphereRef::West)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    pub fn rounded(&self, digits: i32) -> Self {
        Self {
            latitude: round_to(self.latitude, digits),
            longitude: round_to(self.longitude, digits),
        }
    }
}

/// Camera fields that travel alongside a coordinate. Missing values hold a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub make: String,
    pub model: String,
    pub date_time: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedReason {
    #[error("could not read file: {0}")]
    Io(String),
    #[error("unreadable metadata container: {0}")]
    Container(String),
}

/// Outcome of one GPS extraction. Only `Coordinate` carries data; the other
/// two variants are routine results, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    Coordinate {
        coordinate: GeoCoordinate,
        device: Option<DeviceInfo>,
    },
    Absent,
    Malformed(MalformedReason),
}

impl ExtractionResult {
    pub fn coordinate(&self) -> Option<GeoCoordinate> {
        match self {
            ExtractionResult::Coordinate { coordinate, .. } => Some(*coordinate),
            ExtractionResult::Absent | ExtractionResult::Malformed(_) => None,
        }
    }
}

/// Converts a DMS triple to signed decimal degrees.
///
/// `S` and `W` negate the result; any other reference, including none,
/// leaves it positive. No rounding and no range clamping happen here.
pub fn convert(triple: Option<&DmsTriple>, reference: Option<HemisphereRef>) -> Option<f64> {
    let triple = triple?;
    let degrees = triple.degrees().to_f64()?;
    let minutes = triple.minutes().to_f64()?;
    let seconds = triple.seconds().to_f64()?;

    let decimal = degrees + minutes / 60.0 + seconds / 3600.0;

    match reference {
        Some(reference) if reference.negates() => Some(-decimal),
        _ => Some(decimal),
    }
}

/// Same as [`convert`] for a raw list of rationals of unknown length.
pub fn convert_rationals(parts: &[Rational], reference: Option<HemisphereRef>) -> Option<f64> {
    convert(DmsTriple::from_slice(parts).as_ref(), reference)
}

/// Encodes signed decimal degrees back into DMS plus a hemisphere letter.
/// Seconds keep six decimal places.
pub fn to_dms(decimal: f64, axis: Axis) -> (DmsTriple, HemisphereRef) {
    let reference = match (axis, decimal < 0.0) {
        (Axis::Latitude, false) => HemisphereRef::North,
        (Axis::Latitude, true) => HemisphereRef::South,
        (Axis::Longitude, false) => HemisphereRef::East,
        (Axis::Longitude, true) => HemisphereRef::West,
    };

    let magnitude = decimal.abs();
    let degrees = magnitude.trunc();
    let minutes_total = (magnitude - degrees) * 60.0;
    let minutes = minutes_total.trunc();
    let seconds = (minutes_total - minutes) * 60.0;

    let triple = DmsTriple::new(
        Rational::whole(degrees),
        Rational::whole(minutes),
        Rational::new((seconds * 1_000_000.0).round(), 1_000_000.0),
    );
    (triple, reference)
}

pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple(d: f64, m: f64, s: f64) -> DmsTriple {
        DmsTriple::new(Rational::whole(d), Rational::whole(m), Rational::whole(s))
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-8,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn converts_northern_latitude() {
        let value = convert(Some(&triple(37.0, 23.0, 45.0)), Some(HemisphereRef::North)).unwrap();
        assert_close(value, 37.39583333);
    }

    #[test]
    fn south_and_west_negate() {
        let lat = triple(37.0, 23.0, 45.0);
        let lon = triple(127.0, 6.0, 19.0);

        let south = convert(Some(&lat), Some(HemisphereRef::South)).unwrap();
        assert_close(south, -37.39583333);

        let east = convert(Some(&lon), Some(HemisphereRef::East)).unwrap();
        let west = convert(Some(&lon), Some(HemisphereRef::West)).unwrap();
        assert_close(east, 127.10527778);
        assert_close(west, -east);
    }

    #[test]
    fn unknown_or_missing_reference_keeps_sign() {
        let lat = triple(37.0, 23.0, 45.0);
        let plain = convert(Some(&lat), None).unwrap();
        let odd = convert(Some(&lat), HemisphereRef::parse("x")).unwrap();
        let lower = convert(Some(&lat), HemisphereRef::parse("s")).unwrap();

        assert_close(plain, 37.39583333);
        assert_eq!(plain, odd);
        assert_eq!(plain, lower);
    }

    #[test]
    fn fractional_rationals_are_divided() {
        let t = DmsTriple::new(
            Rational::new(37.0, 1.0),
            Rational::new(2337.0, 100.0),
            Rational::new(0.0, 1.0),
        );
        assert_close(convert(Some(&t), None).unwrap(), 37.0 + 23.37 / 60.0);
    }

    #[test]
    fn rejects_zero_denominator() {
        let t = DmsTriple::new(
            Rational::new(37.0, 1.0),
            Rational::new(23.0, 0.0),
            Rational::new(45.0, 1.0),
        );
        assert_eq!(convert(Some(&t), Some(HemisphereRef::North)), None);
    }

    #[test]
    fn rejects_wrong_length_and_missing_triple() {
        let two = [Rational::whole(37.0), Rational::whole(23.0)];
        let four = [Rational::whole(1.0); 4];
        assert_eq!(convert_rationals(&two, None), None);
        assert_eq!(convert_rationals(&four, None), None);
        assert_eq!(convert_rationals(&[], None), None);
        assert_eq!(convert(None, Some(HemisphereRef::North)), None);
    }

    #[test]
    fn out_of_range_values_pass_through() {
        let value = convert(Some(&triple(200.0, 0.0, 0.0)), Some(HemisphereRef::North)).unwrap();
        assert_eq!(value, 200.0);
    }

    #[test]
    fn parses_reference_letters() {
        assert_eq!(HemisphereRef::parse("N"), Some(HemisphereRef::North));
        assert_eq!(HemisphereRef::parse(" W "), Some(HemisphereRef::West));
        assert_eq!(HemisphereRef::parse("S\0"), Some(HemisphereRef::South));
        assert_eq!(HemisphereRef::parse(""), None);
        assert_eq!(HemisphereRef::parse("Q"), Some(HemisphereRef::Other));
        for word in ["South", "Sud", "Wrong", "West", "s"] {
            assert_eq!(HemisphereRef::parse(word), Some(HemisphereRef::Other), "{word}");
            assert!(!HemisphereRef::Other.negates());
        }
    }

    #[test]
    fn dms_encoding_round_trips() {
        for &(value, axis) in &[
            (37.395833, Axis::Latitude),
            (-33.868800, Axis::Latitude),
            (127.105278, Axis::Longitude),
            (-74.006000, Axis::Longitude),
            (0.000001, Axis::Longitude),
        ] {
            let (dms, reference) = to_dms(value, axis);
            let decoded = convert(Some(&dms), Some(reference)).unwrap();
            assert_eq!(round_to(decoded, STORED_PRECISION), value);
        }
    }

    #[test]
    fn rounding_helper() {
        assert_eq!(round_to(37.395833333, STORED_PRECISION), 37.395833);
        assert_eq!(round_to(-127.105277777, DISPLAY_PRECISION), -127.1053);
    }

    #[test]
    fn coordinate_accessor_collapses_non_coordinates() {
        assert_eq!(ExtractionResult::Absent.coordinate(), None);
        let malformed = ExtractionResult::Malformed(MalformedReason::Container("bad".into()));
        assert_eq!(malformed.coordinate(), None);
    }
}
