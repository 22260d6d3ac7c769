use exif::{In, Tag, Value};
use std::fs::File;
use std::io::{BufRead, BufReader, Seek};
use std::path::Path;
use tracing::{debug, warn};

use super::generic::{
    convert_rationals, DeviceInfo, ExtractionResult, GeoCoordinate, HemisphereRef, MalformedReason, Rational,
    STORED_PRECISION,
};
use super::tags::UNKNOWN_FIELD;

/// Reads GPS coordinates from a stored image file.
///
/// The file is opened for the duration of this call only. Unreadable files and
/// unknown containers come back as `Malformed`, images without location tags
/// as `Absent`. Coordinates are rounded to six decimal places.
pub fn extract_from_file(path: &Path) -> ExtractionResult {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Cannot open {} for EXIF reading: {}", path.display(), e);
            return ExtractionResult::Malformed(MalformedReason::Io(e.to_string()));
        }
    };

    let mut buf_reader = BufReader::new(file);
    let result = extract_from_reader(&mut buf_reader);
    if let ExtractionResult::Malformed(ref reason) = result {
        debug!("{}: {}", path.display(), reason);
    }
    result
}

pub fn extract_from_reader<R: BufRead + Seek>(reader: &mut R) -> ExtractionResult {
    let mut exif_reader = exif::Reader::new();
    exif_reader.continue_on_error(true); // Tolerate non-standard EXIF structures

    match exif_reader.read_from_container(reader) {
        Ok(exif) => from_exif(&exif),
        Err(exif::Error::PartialResult(partial)) => {
            let (exif, errors) = partial.into_inner();
            debug!("EXIF parsed with {} recoverable error(s)", errors.len());
            from_exif(&exif)
        }
        Err(exif::Error::NotFound(container)) => {
            debug!("{} container has no EXIF block", container);
            ExtractionResult::Absent
        }
        Err(e) => ExtractionResult::Malformed(MalformedReason::Container(e.to_string())),
    }
}

fn from_exif(exif: &exif::Exif) -> ExtractionResult {
    let latitude = gps_axis(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef);
    let longitude = gps_axis(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef);

    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        return ExtractionResult::Absent;
    };

    let coordinate = GeoCoordinate { latitude, longitude }.rounded(STORED_PRECISION);
    ExtractionResult::Coordinate {
        coordinate,
        device: device_info(exif),
    }
}

fn gps_axis(exif: &exif::Exif, coord_tag: Tag, ref_tag: Tag) -> Option<f64> {
    let coord = exif.get_field(coord_tag, In::PRIMARY)?;
    let Value::Rational(ref parts) = coord.value else {
        debug!("{} has unexpected type {:?}", coord_tag, coord.value);
        return None;
    };

    let parts: Vec<Rational> = parts.iter().map(Rational::from).collect();
    let reference = ascii_field(exif, ref_tag).and_then(|s| HemisphereRef::parse(&s));
    convert_rationals(&parts, reference)
}

fn ascii_field(exif: &exif::Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    if let Value::Ascii(ref vec) = field.value {
        let raw = vec.first()?;
        let text = String::from_utf8_lossy(raw);
        let text = text.trim_matches(char::from(0)).trim();
        if !text.is_empty() {
            return Some(text.to_string());
        }
    }
    None
}

fn device_info(exif: &exif::Exif) -> Option<DeviceInfo> {
    let make = ascii_field(exif, Tag::Make);
    let model = ascii_field(exif, Tag::Model);
    let date_time = ascii_field(exif, Tag::DateTimeOriginal).or_else(|| ascii_field(exif, Tag::DateTime));

    if make.is_none() && model.is_none() && date_time.is_none() {
        return None;
    }

    let or_unknown = |v: Option<String>| v.unwrap_or_else(|| UNKNOWN_FIELD.to_string());
    Some(DeviceInfo {
        make: or_unknown(make),
        model: or_unknown(model),
        date_time: or_unknown(date_time),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn text_file_is_malformed() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("notes.txt");
        let mut file = File::create(&path).expect("create file");
        writeln!(file, "this is not an image, just some notes").expect("write");

        let result = extract_from_file(&path);
        assert!(matches!(result, ExtractionResult::Malformed(MalformedReason::Container(_))));
        assert_eq!(result.coordinate(), None);
    }

    #[test]
    fn missing_file_is_malformed_io() {
        let result = extract_from_file(Path::new("/nonexistent/travel/photo.jpg"));
        assert!(matches!(result, ExtractionResult::Malformed(MalformedReason::Io(_))));
    }

    #[test]
    fn jpeg_without_exif_is_absent() {
        // SOI followed directly by EOI
        let mut cursor = Cursor::new(vec![0xFF, 0xD8, 0xFF, 0xD9]);
        assert_eq!(extract_from_reader(&mut cursor), ExtractionResult::Absent);
    }
}
