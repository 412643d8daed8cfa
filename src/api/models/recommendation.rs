//! Computed recommendation results.

use serde::Serialize;

use super::content::ContentAsset;
use super::profile::{CompanyProfile, PersonaProfile};

/// One ranked asset with the explanation shown to the visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub asset: ContentAsset,
    pub reason: String,
    /// Matched tags: persona focus tags first (in persona order), then
    /// company priority tags.
    pub matched_tags: Vec<String>,
    pub score: u32,
}

/// Ranked recommendations and highlights for one (company, persona) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationBundle {
    pub company: CompanyProfile,
    pub persona: PersonaProfile,
    pub top_recommendations: Vec<Recommendation>,
    pub supporting_recommendations: Vec<Recommendation>,
    pub highlights: Vec<String>,
}

impl RecommendationBundle {
    /// Titles of the top band, in rank order.
    pub fn top_titles(&self) -> impl Iterator<Item = &str> {
        self.top_recommendations
            .iter()
            .map(|r| r.asset.title.as_str())
    }
}
