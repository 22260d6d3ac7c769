/// Region centre with a catchment radius, both in degrees.
#[derive(Debug, Clone, Copy)]
pub struct Region {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub radius: f64,
}

// Order matters: the first region whose radius covers a point wins.
const REGIONS: &[Region] = &[
    Region { name: "Seoul", lat: 37.5665, lon: 126.9780, radius: 0.3 },
    Region { name: "Busan", lat: 35.1796, lon: 129.0756, radius: 0.3 },
    Region { name: "Daegu", lat: 35.8716, lon: 128.5948, radius: 0.3 },
    Region { name: "Daejeon", lat: 36.3504, lon: 127.3845, radius: 0.3 },
    Region { name: "Gwangju", lat: 35.1596, lon: 126.8526, radius: 0.3 },
    Region { name: "Incheon", lat: 37.2557, lon: 126.7314, radius: 0.3 },
    Region { name: "Jeju", lat: 33.4996, lon: 126.5312, radius: 0.4 },
    Region { name: "Gangwon", lat: 37.2411, lon: 128.5945, radius: 0.5 },
    Region { name: "Gyeongju", lat: 35.8264, lon: 129.2236, radius: 0.2 },
    Region { name: "Jeonju", lat: 35.8242, lon: 127.1477, radius: 0.2 },
];

pub const UNKNOWN_LOCATION: &str = "Unknown location";

pub fn regions() -> &'static [Region] {
    REGIONS
}

/// Finds the region covering a point using planar distance on lat/lon.
pub fn lookup_region(lat: f64, lon: f64) -> Option<&'static str> {
    REGIONS
        .iter()
        .find(|region| ((lat - region.lat).powi(2) + (lon - region.lon).powi(2)).sqrt() < region.radius)
        .map(|region| region.name)
}

/// Human readable place for prompts and fallback titles.
pub fn location_label(lat: Option<f64>, lon: Option<f64>) -> String {
    match (lat, lon) {
        (Some(lat), Some(lon)) => match lookup_region(lat, lon) {
            Some(name) => name.to_string(),
            None => format!("Lat {:.2}, Lon {:.2} area", lat, lon),
        },
        _ => UNKNOWN_LOCATION.to_string(),
    }
}

/// Joins an AI reverse-geocoding answer as "region (city) - landmark".
pub fn format_ai_location(region: &str, city: Option<&str>, landmark: Option<&str>) -> String {
    let mut name = region.trim().to_string();
    if let Some(city) = city.map(str::trim).filter(|c| !c.is_empty()) {
        name.push_str(&format!(" ({})", city));
    }
    if let Some(landmark) = landmark.map(str::trim).filter(|l| !l.is_empty()) {
        name.push_str(&format!(" - {}", landmark));
    }
    name
}

/// Last-resort label when neither the table nor the AI knows the place.
pub fn coordinate_label(lat: f64, lon: f64) -> String {
    format!("{:.4}, {:.4}", lat, lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_region_centres() {
        for region in regions() {
            assert_eq!(lookup_region(region.lat, region.lon), Some(region.name));
        }
    }

    #[test]
    fn nearby_point_matches_region() {
        assert_eq!(lookup_region(37.60, 127.05), Some("Seoul"));
        assert_eq!(lookup_region(33.25, 126.56), Some("Jeju"));
    }

    #[test]
    fn first_matching_region_wins() {
        // Within both the Seoul and Incheon radii; Seoul is listed first.
        assert_eq!(lookup_region(37.40, 126.85), Some("Seoul"));
    }

    #[test]
    fn unknown_points_get_coordinate_label() {
        assert_eq!(lookup_region(48.8566, 2.3522), None);
        assert_eq!(location_label(Some(48.8566), Some(2.3522)), "Lat 48.86, Lon 2.35 area");
        assert_eq!(location_label(None, Some(2.0)), UNKNOWN_LOCATION);
        assert_eq!(coordinate_label(48.85661, 2.35222), "48.8566, 2.3522");
    }

    #[test]
    fn ai_location_formatting() {
        assert_eq!(format_ai_location("Gangneung", None, None), "Gangneung");
        assert_eq!(
            format_ai_location("Gangneung", Some("Gyo-dong"), Some("Anmok Beach")),
            "Gangneung (Gyo-dong) - Anmok Beach"
        );
        assert_eq!(format_ai_location("Paris", Some(" "), Some("Louvre")), "Paris - Louvre");
    }
}
