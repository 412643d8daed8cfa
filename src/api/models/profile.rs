//! Company and persona profiles used to personalize recommendations.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Light/dark accent colors applied when a company mode is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ThemeTokens {
    pub light: String,
    pub dark: String,
}

/// A visitor archetype within a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaProfile {
    pub id: String,
    pub name: String,
    pub role: String,
    /// Ordered by importance; earlier tags lead the generated reasons.
    pub focus_tags: Vec<String>,
    pub recommendation_goal: String,
}

impl PersonaProfile {
    pub fn new(id: &str, name: &str, role: &str, focus_tags: &[&str], goal: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            role: role.to_string(),
            focus_tags: focus_tags.iter().map(|t| t.to_string()).collect(),
            recommendation_goal: goal.to_string(),
        }
    }

    pub fn has_focus(&self, tag: &str) -> bool {
        self.focus_tags.iter().any(|t| t == tag)
    }
}

/// A company visitors can be associated with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub id: String,
    pub name: String,
    pub summary: String,
    pub priority_tags: BTreeSet<String>,
    pub theme: ThemeTokens,
    pub personas: Vec<PersonaProfile>,
    pub default_persona_id: String,
}

impl CompanyProfile {
    pub fn persona(&self, persona_id: &str) -> Option<&PersonaProfile> {
        self.personas.iter().find(|p| p.id == persona_id)
    }

    pub fn default_persona(&self) -> Option<&PersonaProfile> {
        self.persona(&self.default_persona_id)
    }
}
