//! BioMaps: extreme habitats that launch a themed search.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct BioMapLocation {
    pub id: &'static str,
    pub name: &'static str,
    pub temp: &'static str,
    /// Icon name understood by the presentation layer
    pub icon: &'static str,
    pub description: &'static str,
    /// Search term submitted when the location is opened
    pub query: &'static str,
}

pub const BIO_MAP_LOCATIONS: [BioMapLocation; 4] = [
    BioMapLocation {
        id: "volcano",
        name: "Volcán Activo",
        temp: "85°C",
        icon: "Flame",
        description: "Hogar de extremófilos termófilos.",
        query: "Microorganismos termófilos volcánicos",
    },
    BioMapLocation {
        id: "ocean",
        name: "Fosa Oceánica",
        temp: "2°C",
        icon: "Droplets",
        description: "Bacterias barófilas de alta presión.",
        query: "Bacterias de fosas marinas",
    },
    BioMapLocation {
        id: "gut",
        name: "Intestino Humano",
        temp: "37°C",
        icon: "Dna",
        description: "Microbiota esencial para la vida.",
        query: "Bacterias del intestino humano",
    },
    BioMapLocation {
        id: "arctic",
        name: "Hielo Ártico",
        temp: "-15°C",
        icon: "Snowflake",
        description: "Psicrófilos en animación suspendida.",
        query: "Bacterias del hielo ártico",
    },
];

pub fn find_location(id: &str) -> Option<&'static BioMapLocation> {
    BIO_MAP_LOCATIONS.iter().find(|loc| loc.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_location() {
        assert_eq!(find_location("gut").map(|l| l.temp), Some("37°C"));
        assert!(find_location("moon").is_none());
    }
}
