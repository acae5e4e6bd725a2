mod registry;

pub use registry::{load_registry, RegistryRecord};

use ahash::AHashMap;
use regex::Regex;
use std::sync::OnceLock;

use crate::types::Building;

/// Sentinel for missing street/housenumber values.  Keys stay total: a
/// record with no address still joins (and misses) deterministically
/// instead of being dropped.
pub const MISSING: &str = "-";

/// An address decomposed into its join key and bookkeeping parts.
///
/// Only `(street, number)` participates in the registry join; block,
/// building index and unit letter are carried for grouping and never
/// survive into the final output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    /// Expanded street type ("улица"), or the sentinel.
    pub street_type: String,
    /// Street name without its type token.
    pub street: String,
    /// Leading numeric token of the house number, or the sentinel.
    pub number: String,
    /// Block suffix (`к`-prefixed).
    pub block: String,
    /// Building index (`с`-prefixed).
    pub building_index: String,
    /// Unit letter (`лит`-prefixed).
    pub letter: String,
}

impl ParsedAddress {
    pub fn key(&self) -> (String, String) {
        (self.street.clone(), self.number.clone())
    }
}

/// Abbreviation → full street-type word.
const STREET_TYPES: [(&str, &str); 8] = [
    ("пер", "переулок"),
    ("ул", "улица"),
    ("мкр", "микрорайон"),
    ("пл", "площадь"),
    ("тер", "территория"),
    ("пр-кт", "проспект"),
    ("пр", "проспект"),
    ("пр-д", "проезд"),
];

/// Parse one OSM address pair into a [`ParsedAddress`].
pub fn parse_address(street: Option<&str>, housenumber: Option<&str>) -> ParsedAddress {
    let (street_type, street) = normalize_street(street);
    let (number, block, building_index, letter) = split_house_number(housenumber);
    ParsedAddress { street_type, street, number, block, building_index, letter }
}

/// Normalize a street string: collapse whitespace, fold `ё` to `е`, pull
/// the lowercase-initial tokens out as the street type (first one wins),
/// strip trailing punctuation from the type and expand its abbreviation.
pub fn normalize_street(street: Option<&str>) -> (String, String) {
    let Some(raw) = street.map(str::trim).filter(|s| !s.is_empty()) else {
        return (MISSING.to_string(), MISSING.to_string());
    };

    let folded = raw.replace('ё', "е").replace('Ё', "Е");
    let tokens: Vec<&str> = folded.split_whitespace().collect();

    let (types, name): (Vec<&str>, Vec<&str>) = tokens
        .iter()
        .partition(|token| token.chars().next().is_some_and(char::is_lowercase));

    let street_type = match types.first() {
        Some(token) => {
            let stripped = token.trim_end_matches('.');
            STREET_TYPES
                .iter()
                .find(|(abbr, _)| *abbr == stripped)
                .map(|(_, full)| full.to_string())
                .unwrap_or_else(|| stripped.to_string())
        }
        None => MISSING.to_string(),
    };

    let name = name.join(" ");
    let street = if name.is_empty() { MISSING.to_string() } else { name };
    (street_type, street)
}

fn house_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<number>\d+)\s*(?:к\s*(?P<block>\d+))?\s*(?:с\s*(?P<index>\d+))?\s*(?:лит\.?\s*(?P<letter>\S+))?")
            .expect("house number pattern is valid")
    })
}

/// Split a house-number string into `(number, block, building index,
/// letter)`.  Handles both fused ("12к3с1") and spaced ("12 к3 лит А")
/// forms; anything unrecognized keeps the sentinel number with empty parts.
pub fn split_house_number(housenumber: Option<&str>) -> (String, String, String, String) {
    let Some(raw) = housenumber.map(str::trim).filter(|s| !s.is_empty()) else {
        return (MISSING.to_string(), String::new(), String::new(), String::new());
    };

    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let Some(caps) = house_number_pattern().captures(&collapsed) else {
        return (MISSING.to_string(), String::new(), String::new(), String::new());
    };

    let part = |name: &str| caps.name(name).map(|m| m.as_str().to_string()).unwrap_or_default();
    (part("number"), part("block"), part("index"), part("letter"))
}

/// Clear the unit letter wherever it is the sole entry for its
/// `(street, number, block)` group: a letter with nothing to disambiguate
/// carries no value.
pub fn clear_lone_letters(addresses: &mut [ParsedAddress]) {
    let mut group_sizes: AHashMap<(String, String, String), u32> = AHashMap::new();
    for address in addresses.iter() {
        *group_sizes
            .entry((address.street.clone(), address.number.clone(), address.block.clone()))
            .or_insert(0) += 1;
    }
    for address in addresses.iter_mut() {
        let key = (address.street.clone(), address.number.clone(), address.block.clone());
        if group_sizes.get(&key) == Some(&1) {
            address.letter.clear();
        }
    }
}

/// Reconcile buildings with the external registry.
///
/// Left join on `(street, number)`; a building with no registry match keeps
/// its OSM-derived values.  Floor count precedence: registry when present,
/// else the OSM value, else 1 for house-type buildings.  Unit count prefers
/// a present, non-zero registry count.  Registry residential area backfills
/// the building's.
pub fn merge_registry(buildings: &mut [Building], registry: &[RegistryRecord]) {
    let mut by_key: AHashMap<(String, String), &RegistryRecord> = AHashMap::new();
    for record in registry {
        by_key.entry(record.address.key()).or_insert(record);
    }

    let mut addresses: Vec<ParsedAddress> = buildings
        .iter()
        .map(|b| parse_address(b.street.as_deref(), b.housenumber.as_deref()))
        .collect();
    clear_lone_letters(&mut addresses);

    for (building, address) in buildings.iter_mut().zip(&addresses) {
        let hit = by_key.get(&address.key());

        let registry_floor = hit.and_then(|r| r.floor_count).filter(|&f| f > 0);
        building.levels = match registry_floor {
            Some(floors) => floors,
            None if building.levels > 0 => building.levels,
            None if building.building == "house" => 1,
            None => 0,
        };

        if let Some(quarters) = hit.and_then(|r| r.living_quarters).filter(|&q| q > 0) {
            building.flats = quarters;
        }

        if let Some(record) = hit {
            if record.area_residential > 0.0 {
                building.area_residential = record.area_residential;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ElementType, FeatureId};
    use geo::{polygon, Geometry};

    #[test]
    fn street_type_is_extracted_and_expanded() {
        let (ty, name) = normalize_street(Some("ул. Ленина"));
        assert_eq!(ty, "улица");
        assert_eq!(name, "Ленина");
    }

    #[test]
    fn prospekt_abbreviations_expand() {
        assert_eq!(normalize_street(Some("пр-кт Мира")).0, "проспект");
        assert_eq!(normalize_street(Some("пр Мира")).0, "проспект");
    }

    #[test]
    fn yo_is_folded_and_whitespace_collapsed() {
        let (_, name) = normalize_street(Some("  Артёма   Сергеева "));
        assert_eq!(name, "Артема Сергеева");
    }

    #[test]
    fn missing_street_keeps_sentinel() {
        assert_eq!(normalize_street(None), (MISSING.to_string(), MISSING.to_string()));
        assert_eq!(normalize_street(Some("")).1, MISSING);
    }

    #[test]
    fn street_without_type_token() {
        let (ty, name) = normalize_street(Some("Ленина"));
        assert_eq!(ty, MISSING);
        assert_eq!(name, "Ленина");
    }

    #[test]
    fn fused_house_number_splits() {
        let (number, block, index, letter) = split_house_number(Some("12к3с1"));
        assert_eq!(number, "12");
        assert_eq!(block, "3");
        assert_eq!(index, "1");
        assert_eq!(letter, "");
    }

    #[test]
    fn spaced_house_number_with_letter_splits() {
        let (number, block, index, letter) = split_house_number(Some("12 к3 лит А"));
        assert_eq!(number, "12");
        assert_eq!(block, "3");
        assert_eq!(index, "");
        assert_eq!(letter, "А");
    }

    #[test]
    fn lone_letters_are_cleared_but_shared_groups_keep_them() {
        let mut addresses = vec![
            parse_address(Some("ул Ленина"), Some("5 лит А")),
            parse_address(Some("ул Ленина"), Some("7 лит А")),
            parse_address(Some("ул Ленина"), Some("7 лит Б")),
        ];
        clear_lone_letters(&mut addresses);
        assert_eq!(addresses[0].letter, "");
        assert_eq!(addresses[1].letter, "А");
        assert_eq!(addresses[2].letter, "Б");
    }

    fn test_building(street: &str, number: &str, building_label: &str) -> Building {
        let mut b = Building::new(
            FeatureId::new(ElementType::Way, 1),
            Geometry::Polygon(polygon![
                (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)
            ]),
        );
        b.street = Some(street.to_string());
        b.housenumber = Some(number.to_string());
        b.building = building_label.to_string();
        b
    }

    fn record(street: &str, number: &str, floors: Option<u32>, quarters: Option<u32>, area: f64) -> RegistryRecord {
        RegistryRecord {
            address: parse_address(Some(street), Some(number)),
            floor_count: floors,
            living_quarters: quarters,
            area_residential: area,
        }
    }

    #[test]
    fn registry_floor_count_wins() {
        let mut buildings = vec![test_building("ул Ленина", "5", "apartments")];
        buildings[0].levels = 3;
        let registry = vec![record("улица Ленина", "5", Some(9), Some(72), 4200.0)];
        merge_registry(&mut buildings, &registry);
        assert_eq!(buildings[0].levels, 9);
        assert_eq!(buildings[0].flats, 72);
        assert_eq!(buildings[0].area_residential, 4200.0);
    }

    #[test]
    fn osm_values_survive_a_registry_miss() {
        let mut buildings = vec![test_building("ул Гагарина", "2", "apartments")];
        buildings[0].levels = 5;
        buildings[0].flats = 40;
        merge_registry(&mut buildings, &[]);
        assert_eq!(buildings[0].levels, 5);
        assert_eq!(buildings[0].flats, 40);
    }

    #[test]
    fn houses_default_to_one_floor() {
        let mut buildings = vec![test_building("ул Садовая", "1", "house")];
        merge_registry(&mut buildings, &[]);
        assert_eq!(buildings[0].levels, 1);
    }

    #[test]
    fn zero_registry_quarters_keep_osm_count() {
        let mut buildings = vec![test_building("ул Ленина", "5", "apartments")];
        buildings[0].flats = 12;
        let registry = vec![record("улица Ленина", "5", None, Some(0), 0.0)];
        merge_registry(&mut buildings, &registry);
        assert_eq!(buildings[0].flats, 12);
    }
}
