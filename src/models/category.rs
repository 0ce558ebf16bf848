use serde::{Deserialize, Serialize};

/// Static description of one catalog category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
}

/// The fixed category catalog, in display order
pub const CATEGORY_CATALOG: &[CategoryInfo] = &[
    CategoryInfo {
        id: "ayam",
        name: "Ayam",
        icon: "🐔",
        description: "Berbagai resep masakan ayam yang lezat dan bergizi",
    },
    CategoryInfo {
        id: "ikan",
        name: "Ikan",
        icon: "🐟",
        description: "Resep ikan segar dengan berbagai cara pengolahan",
    },
    CategoryInfo {
        id: "kambing",
        name: "Kambing",
        icon: "🐐",
        description: "Masakan kambing dengan cita rasa yang khas",
    },
    CategoryInfo {
        id: "sapi",
        name: "Sapi",
        icon: "🐄",
        description: "Daging sapi pilihan dengan bumbu rempah nusantara",
    },
    CategoryInfo {
        id: "tahu",
        name: "Tahu",
        icon: "🟨",
        description: "Olahan tahu yang kreatif dan menggugah selera",
    },
    CategoryInfo {
        id: "telur",
        name: "Telur",
        icon: "🥚",
        description: "Kreasi masakan telur yang praktis dan lezat",
    },
    CategoryInfo {
        id: "tempe",
        name: "Tempe",
        icon: "🟤",
        description: "Tempe sebagai sumber protein nabati yang sehat",
    },
    CategoryInfo {
        id: "udang",
        name: "Udang",
        icon: "🦐",
        description: "Seafood udang dengan kelezatan yang tak terlupakan",
    },
];

/// Looks up a catalog category, case-insensitively
pub fn find_category(id: &str) -> Option<&'static CategoryInfo> {
    let id = id.trim().to_lowercase();
    CATEGORY_CATALOG.iter().find(|c| c.id == id)
}

/// Category as returned by `GET /api/categories`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryDetails {
    pub id: String,
    pub name: String,
    pub icon: String,
    #[serde(default)]
    pub description: Option<String>,
    pub count: u64,
}

impl CategoryDetails {
    pub fn from_catalog(info: &CategoryInfo, count: u64) -> Self {
        Self {
            id: info.id.to_string(),
            name: info.name.to_string(),
            icon: info.icon.to_string(),
            description: Some(info.description.to_string()),
            count,
        }
    }
}

/// Display entry the client derives from a category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryEntry {
    pub name: String,
    pub icon: String,
    pub count: u64,
}

impl From<CategoryDetails> for CategoryEntry {
    fn from(details: CategoryDetails) -> Self {
        Self {
            name: details.name,
            icon: details.icon,
            count: details.count,
        }
    }
}
