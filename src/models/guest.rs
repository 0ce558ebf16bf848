use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The three curated lists shown to every visitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuestListKind {
    /// "Top Menu Hemat": cheap, dependable dishes
    BudgetMenu,
    /// "Banyak Disukai": highest rated recipes
    Popular,
    /// "Top Andalan": staple recommendations
    Staple,
}

impl GuestListKind {
    pub const ALL: [GuestListKind; 3] = [
        GuestListKind::BudgetMenu,
        GuestListKind::Popular,
        GuestListKind::Staple,
    ];

    /// Number of entries the popular list is capped at
    pub const POPULAR_LIMIT: usize = 15;

    /// Backend path serving this list
    pub fn path(&self) -> &'static str {
        match self {
            GuestListKind::BudgetMenu => "/api/guest/top-menu-hemat",
            GuestListKind::Popular => "/api/guest/banyak-disukai",
            GuestListKind::Staple => "/api/guest/top-andalan",
        }
    }

    /// Curated sections concatenated, in order, to build the list.
    /// The popular list is ranked by rating instead.
    pub fn sections(&self) -> &'static [&'static str] {
        match self {
            GuestListKind::BudgetMenu => &["Top_10_Resep_Pokoknya_Jadi", "Top_5_Menu_Hemat_Tahu_Tempe"],
            GuestListKind::Popular => &[],
            GuestListKind::Staple => &[
                "Top_10_Olahan_Telur_Andalan_Anak_Kos",
                "Top_5_Kreasi_Mie_Instan_Praktis",
            ],
        }
    }
}

impl Display for GuestListKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuestListKind::BudgetMenu => write!(f, "budget_menu"),
            GuestListKind::Popular => write!(f, "popular"),
            GuestListKind::Staple => write!(f, "staple"),
        }
    }
}
