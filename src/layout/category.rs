use std::{fmt, str::FromStr};

use crate::foundation::error::CompositorError;

/// Clothing category an item image belongs to.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Hats, caps, headbands.
    Headwear,
    /// Jackets and coats worn over a top.
    Outerwear,
    /// Shirts, blouses, sweaters.
    Top,
    /// One-piece garments covering torso and legs.
    Dress,
    /// Trousers, skirts, shorts.
    Bottom,
    /// Footwear.
    Shoes,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 6] = [
        Category::Headwear,
        Category::Outerwear,
        Category::Top,
        Category::Dress,
        Category::Bottom,
        Category::Shoes,
    ];

    /// Lowercase tag used in config files and on the command line.
    pub fn tag(self) -> &'static str {
        match self {
            Category::Headwear => "headwear",
            Category::Outerwear => "outerwear",
            Category::Top => "top",
            Category::Dress => "dress",
            Category::Bottom => "bottom",
            Category::Shoes => "shoes",
        }
    }

    /// Placement rule for this category.
    pub fn layout(self) -> CategoryLayout {
        CATEGORY_LAYOUT[self.table_index()]
    }

    fn table_index(self) -> usize {
        match self {
            Category::Shoes => 0,
            Category::Bottom => 1,
            Category::Dress => 2,
            Category::Top => 3,
            Category::Outerwear => 4,
            Category::Headwear => 5,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Category {
    type Err = CompositorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "headwear" | "hat" => Ok(Category::Headwear),
            "outerwear" | "jacket" | "coat" => Ok(Category::Outerwear),
            "top" | "shirt" => Ok(Category::Top),
            "dress" => Ok(Category::Dress),
            "bottom" | "pants" | "skirt" => Ok(Category::Bottom),
            "shoes" | "footwear" => Ok(Category::Shoes),
            other => Err(CompositorError::validation(format!(
                "unknown clothing category '{other}'"
            ))),
        }
    }
}

/// Vertical placement band as fractions of canvas height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Band {
    /// Top edge, `0.0` is the canvas top.
    pub top: f64,
    /// Bottom edge, `1.0` is the canvas bottom.
    pub bottom: f64,
}

/// Draw rank and vertical band of one category.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CategoryLayout {
    /// Category this row describes.
    pub category: Category,
    /// Back-to-front draw order; higher ranks paint over lower ones.
    pub rank: u8,
    /// Vertical band the item is fitted into.
    pub band: Band,
}

// Bands overlap on purpose so adjacent garments layer like they do when worn.
const CATEGORY_LAYOUT: [CategoryLayout; 6] = [
    CategoryLayout {
        category: Category::Shoes,
        rank: 0,
        band: Band {
            top: 0.80,
            bottom: 1.00,
        },
    },
    CategoryLayout {
        category: Category::Bottom,
        rank: 1,
        band: Band {
            top: 0.45,
            bottom: 0.85,
        },
    },
    CategoryLayout {
        category: Category::Dress,
        rank: 2,
        band: Band {
            top: 0.15,
            bottom: 0.85,
        },
    },
    CategoryLayout {
        category: Category::Top,
        rank: 3,
        band: Band {
            top: 0.12,
            bottom: 0.52,
        },
    },
    CategoryLayout {
        category: Category::Outerwear,
        rank: 4,
        band: Band {
            top: 0.10,
            bottom: 0.58,
        },
    },
    CategoryLayout {
        category: Category::Headwear,
        rank: 5,
        band: Band {
            top: 0.00,
            bottom: 0.14,
        },
    },
];

/// The full layout table, ordered by ascending rank.
pub fn category_layouts() -> &'static [CategoryLayout] {
    &CATEGORY_LAYOUT
}

#[cfg(test)]
#[path = "../../tests/unit/layout/category.rs"]
mod tests;
