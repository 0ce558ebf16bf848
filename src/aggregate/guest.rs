use serde::Serialize;
use std::sync::Arc;

use crate::client::{ClientError, RecipeSource};
use crate::models::{GuestListKind, Recipe};

/// The three curated lists, each possibly empty
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestLists {
    pub budget_menu: Vec<Recipe>,
    pub popular: Vec<Recipe>,
    pub staple: Vec<Recipe>,
}

impl GuestLists {
    pub fn get(&self, kind: GuestListKind) -> &[Recipe] {
        match kind {
            GuestListKind::BudgetMenu => &self.budget_menu,
            GuestListKind::Popular => &self.popular,
            GuestListKind::Staple => &self.staple,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.budget_menu.is_empty() && self.popular.is_empty() && self.staple.is_empty()
    }
}

/// Outcome of one guest load: the lists plus the ones that failed
#[derive(Debug, Clone, Default)]
pub struct GuestLoad {
    pub lists: GuestLists,
    pub failures: Vec<(GuestListKind, ClientError)>,
}

impl GuestLoad {
    pub fn all_failed(&self) -> bool {
        self.failures.len() == GuestListKind::ALL.len()
    }
}

/// Fetches the three guest lists concurrently
///
/// A failing list resolves to an empty one; the others are unaffected.
/// No retries happen here.
#[derive(Clone)]
pub struct GuestLoader {
    source: Arc<dyn RecipeSource>,
}

impl GuestLoader {
    pub fn new(source: Arc<dyn RecipeSource>) -> Self {
        Self { source }
    }

    pub async fn load(&self) -> GuestLoad {
        let (budget_menu, popular, staple) = tokio::join!(
            self.source.guest_list(GuestListKind::BudgetMenu),
            self.source.guest_list(GuestListKind::Popular),
            self.source.guest_list(GuestListKind::Staple),
        );

        let mut load = GuestLoad::default();
        load.lists.budget_menu = settle(GuestListKind::BudgetMenu, budget_menu, &mut load.failures);
        load.lists.popular = settle(GuestListKind::Popular, popular, &mut load.failures);
        load.lists.staple = settle(GuestListKind::Staple, staple, &mut load.failures);

        if !load.failures.is_empty() {
            tracing::warn!(
                failed = load.failures.len(),
                total = GuestListKind::ALL.len(),
                "Partial guest list failure"
            );
        }
        load
    }
}

fn settle(
    kind: GuestListKind,
    result: Result<Vec<Recipe>, ClientError>,
    failures: &mut Vec<(GuestListKind, ClientError)>,
) -> Vec<Recipe> {
    match result {
        Ok(recipes) => recipes,
        Err(e) => {
            tracing::warn!(list = %kind, error = %e, "Guest list fetch failed");
            failures.push((kind, e));
            Vec::new()
        }
    }
}
