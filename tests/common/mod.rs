//! Hand-built little-endian TIFF/JPEG fixtures carrying a GPS directory.

#![allow(dead_code)]

const ASCII: u16 = 2;
const LONG: u16 = 4;
const RATIONAL: u16 = 5;

const TAG_MAKE: u16 = 0x010F;
const TAG_GPS_POINTER: u16 = 0x8825;

struct Entry {
    tag: u16,
    kind: u16,
    count: u32,
    data: Vec<u8>,
}

impl Entry {
    fn ascii(tag: u16, text: &str) -> Self {
        let mut data = text.as_bytes().to_vec();
        data.push(0);
        Entry { tag, kind: ASCII, count: data.len() as u32, data }
    }

    fn long(tag: u16, value: u32) -> Self {
        Entry { tag, kind: LONG, count: 1, data: value.to_le_bytes().to_vec() }
    }

    fn rationals(tag: u16, values: &[(u32, u32)]) -> Self {
        let data = values
            .iter()
            .flat_map(|(n, d)| n.to_le_bytes().into_iter().chain(d.to_le_bytes()))
            .collect();
        Entry { tag, kind: RATIONAL, count: values.len() as u32, data }
    }

    fn overflow_len(&self) -> usize {
        if self.data.len() > 4 {
            self.data.len() + self.data.len() % 2
        } else {
            0
        }
    }
}

fn ifd_len(entries: &[Entry]) -> usize {
    2 + 12 * entries.len() + 4 + entries.iter().map(Entry::overflow_len).sum::<usize>()
}

// Appends one IFD followed by its out-of-line values; offsets are from the TIFF start
fn write_ifd(out: &mut Vec<u8>, entries: &mut [Entry]) {
    entries.sort_by_key(|e| e.tag);
    let start = out.len();
    let mut overflow_at = start + 2 + 12 * entries.len() + 4;
    let mut overflow = Vec::new();

    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for entry in entries.iter() {
        out.extend_from_slice(&entry.tag.to_le_bytes());
        out.extend_from_slice(&entry.kind.to_le_bytes());
        out.extend_from_slice(&entry.count.to_le_bytes());
        if entry.data.len() <= 4 {
            let mut inline = entry.data.clone();
            inline.resize(4, 0);
            out.extend_from_slice(&inline);
        } else {
            out.extend_from_slice(&(overflow_at as u32).to_le_bytes());
            overflow.extend_from_slice(&entry.data);
            if entry.data.len() % 2 == 1 {
                overflow.push(0);
            }
            overflow_at += entry.overflow_len();
        }
    }
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&overflow);
}

/// One GPS axis as stored in EXIF: three rationals plus a hemisphere letter.
#[derive(Clone, Copy)]
pub struct Axis<'a> {
    pub dms: [(u32, u32); 3],
    pub reference: &'a str,
}

#[derive(Clone, Copy, Default)]
pub struct Fixture<'a> {
    pub latitude: Option<Axis<'a>>,
    pub longitude: Option<Axis<'a>>,
    pub make: Option<&'a str>,
}

/// Builds a minimal TIFF. The GPS directory is only written when at least one axis is set.
pub fn tiff(fixture: &Fixture) -> Vec<u8> {
    let mut gps = Vec::new();
    if let Some(lat) = fixture.latitude {
        gps.push(Entry::ascii(0x0001, lat.reference));
        gps.push(Entry::rationals(0x0002, &lat.dms));
    }
    if let Some(lon) = fixture.longitude {
        gps.push(Entry::ascii(0x0003, lon.reference));
        gps.push(Entry::rationals(0x0004, &lon.dms));
    }

    let mut ifd0 = Vec::new();
    if let Some(make) = fixture.make {
        ifd0.push(Entry::ascii(TAG_MAKE, make));
    }
    if !gps.is_empty() {
        // Placeholder offset, fixed below once the IFD0 size is known
        ifd0.push(Entry::long(TAG_GPS_POINTER, 0));
    }
    let gps_offset = 8 + ifd_len(&ifd0);
    if let Some(pointer) = ifd0.iter_mut().find(|e| e.tag == TAG_GPS_POINTER) {
        pointer.data = (gps_offset as u32).to_le_bytes().to_vec();
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"II");
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&8u32.to_le_bytes());
    write_ifd(&mut out, &mut ifd0);
    if !gps.is_empty() {
        write_ifd(&mut out, &mut gps);
    }
    out
}

/// Wraps a TIFF block in a JPEG APP1 segment.
pub fn jpeg(fixture: &Fixture) -> Vec<u8> {
    let tiff = tiff(fixture);
    let segment_len = (2 + 6 + tiff.len()) as u16;

    let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

/// 37°23'45" N, 127°6'19" E with a camera make.
pub fn seoul_area() -> Fixture<'static> {
    Fixture {
        latitude: Some(Axis { dms: [(37, 1), (23, 1), (45, 1)], reference: "N" }),
        longitude: Some(Axis { dms: [(127, 1), (6, 1), (19, 1)], reference: "E" }),
        make: Some("Canon"),
    }
}
