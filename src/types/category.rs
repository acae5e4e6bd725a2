use std::fmt;

/// The fixed list of OSM tag categories fetched for a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagCategory {
    Building,
    Amenity,
    Landuse,
    Shop,
    Craft,
    Emergency,
    Leisure,
    Office,
    Industrial,
    Tourism,
}

impl TagCategory {
    pub const ALL: [TagCategory; 10] = [
        TagCategory::Building,
        TagCategory::Amenity,
        TagCategory::Landuse,
        TagCategory::Shop,
        TagCategory::Craft,
        TagCategory::Emergency,
        TagCategory::Leisure,
        TagCategory::Office,
        TagCategory::Industrial,
        TagCategory::Tourism,
    ];

    /// The OSM tag key this category selects on.
    pub fn key(&self) -> &'static str {
        match self {
            TagCategory::Building => "building",
            TagCategory::Amenity => "amenity",
            TagCategory::Landuse => "landuse",
            TagCategory::Shop => "shop",
            TagCategory::Craft => "craft",
            TagCategory::Emergency => "emergency",
            TagCategory::Leisure => "leisure",
            TagCategory::Office => "office",
            TagCategory::Industrial => "industrial",
            TagCategory::Tourism => "tourism",
        }
    }

    /// Categories whose tag values accumulate into a building's
    /// `points_inside` list.  Buildings are the join target, land-use and
    /// amenity attach through their own dedicated joins.
    pub fn feeds_points_inside(&self) -> bool {
        !matches!(
            self,
            TagCategory::Building | TagCategory::Amenity | TagCategory::Landuse
        )
    }
}

impl fmt::Display for TagCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
