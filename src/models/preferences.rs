use serde::{Deserialize, Serialize};

/// Preferred time of day for cooking
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TimeOfDay {
    #[serde(rename = "Pagi")]
    Morning,
    #[default]
    #[serde(rename = "Siang")]
    Afternoon,
    #[serde(rename = "Sore")]
    Evening,
    #[serde(rename = "Malam")]
    Night,
}

/// Self-declared cooking skill
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SkillLevel {
    #[default]
    #[serde(rename = "Cepat & Mudah")]
    QuickAndEasy,
    #[serde(rename = "Butuh Usaha")]
    NeedsEffort,
    #[serde(rename = "Level Dewa Masak")]
    MasterChef,
}

impl SkillLevel {
    /// Wire label, also sent to the ML service as the preferred difficulty
    pub fn label(&self) -> &'static str {
        match self {
            SkillLevel::QuickAndEasy => "Cepat & Mudah",
            SkillLevel::NeedsEffort => "Butuh Usaha",
            SkillLevel::MasterChef => "Level Dewa Masak",
        }
    }
}

/// A user's stored cooking preferences
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PreferenceSet {
    #[serde(default)]
    pub preferred_categories: Vec<String>,
    #[serde(default)]
    pub cooking_methods: Vec<String>,
    #[serde(default)]
    pub avoid_ingredients: Vec<String>,
    #[serde(default)]
    pub preferred_taste: Vec<String>,
    #[serde(default)]
    pub preferred_time: TimeOfDay,
    #[serde(default)]
    pub skill_level: SkillLevel,
}

/// Body of `POST /api/preferences`
#[derive(Debug, Clone, Deserialize)]
pub struct SavePreferencesRequest {
    pub preferred_categories: Option<Vec<String>>,
    pub cooking_methods: Option<Vec<String>>,
    #[serde(default)]
    pub avoid_ingredients: Vec<String>,
    #[serde(default)]
    pub preferred_taste: Vec<String>,
    #[serde(default)]
    pub preferred_time: TimeOfDay,
    #[serde(default)]
    pub skill_level: SkillLevel,
}

/// Trims items, rejects blanks and removes duplicates while keeping order
fn clean_set(field: &str, items: Vec<String>) -> Result<Vec<String>, String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim();
        if item.is_empty() {
            return Err(format!("{} must not contain empty items", field));
        }
        if !cleaned.iter().any(|existing| existing == item) {
            cleaned.push(item.to_string());
        }
    }
    Ok(cleaned)
}

fn required_set(field: &str, items: Option<Vec<String>>) -> Result<Vec<String>, String> {
    let items = items.ok_or_else(|| format!("{} is required", field))?;
    let cleaned = clean_set(field, items)?;
    if cleaned.is_empty() {
        return Err(format!("{} must contain at least 1 item", field));
    }
    Ok(cleaned)
}

impl SavePreferencesRequest {
    /// Validates the request into a preference set
    pub fn validate(self) -> Result<PreferenceSet, String> {
        Ok(PreferenceSet {
            preferred_categories: required_set("preferred_categories", self.preferred_categories)?,
            cooking_methods: required_set("cooking_methods", self.cooking_methods)?,
            avoid_ingredients: clean_set("avoid_ingredients", self.avoid_ingredients)?,
            preferred_taste: clean_set("preferred_taste", self.preferred_taste)?,
            preferred_time: self.preferred_time,
            skill_level: self.skill_level,
        })
    }
}
