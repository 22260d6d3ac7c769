pub mod container;
pub mod generic;
pub mod tags;

pub use container::{extract_from_file, extract_from_reader};
pub use generic::{
    convert, convert_rationals, round_to, to_dms, Axis, DeviceInfo, DmsTriple, ExtractionResult, GeoCoordinate,
    HemisphereRef, MalformedReason, Rational, DISPLAY_PRECISION, STORED_PRECISION,
};
pub use tags::{extract_from_tags, parse_tag_map, TagMap, UNKNOWN_FIELD};
