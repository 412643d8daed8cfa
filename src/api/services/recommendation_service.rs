//! Adaptive recommendation engine.
//!
//! Ranks the content catalog for a (company, persona) pair. Scoring is
//! weighted tag overlap: each company priority tag an asset carries is worth
//! [`PRIORITY_WEIGHT`], each persona focus tag is worth [`focus_weight`],
//! one more than the company's whole priority set (a tag in both counts for
//! both). One focus match therefore outranks any number of priority-only
//! matches. Ties keep catalog order. Everything here is a pure function of
//! the static catalog.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::catalog::Catalog;
use crate::models::{
    CompanyProfile, ContentAsset, PersonaProfile, Recommendation, RecommendationBundle,
};

pub const PRIORITY_WEIGHT: u32 = 1;
/// Size of the top band.
pub const TOP_RECOMMENDATIONS: usize = 4;
/// Size of the supporting band that follows it.
pub const SUPPORTING_RECOMMENDATIONS: usize = 4;

const MAX_HIGHLIGHTS: usize = 3;
const NARRATIVE_TITLES: usize = 3;

/// Recommendation service over a shared catalog.
pub struct RecommendationService {
    catalog: Arc<Catalog>,
}

impl RecommendationService {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Rank the catalog for a persona. `None` when the company is unknown or
    /// the persona does not belong to it.
    pub fn get_recommendation_bundle(
        &self,
        company_id: &str,
        persona_id: &str,
    ) -> Option<RecommendationBundle> {
        let (company, persona) = self.catalog.persona(company_id, persona_id)?;

        let mut ranked: Vec<Recommendation> = self
            .catalog
            .assets()
            .iter()
            .filter_map(|asset| score_asset(company, persona, asset))
            .collect();
        // Stable: equal scores keep catalog order.
        ranked.sort_by(|a, b| b.score.cmp(&a.score));

        let mut supporting = ranked.split_off(TOP_RECOMMENDATIONS.min(ranked.len()));
        supporting.truncate(SUPPORTING_RECOMMENDATIONS);
        let top = ranked;

        let highlights = build_highlights(persona, &top, &supporting);

        Some(RecommendationBundle {
            company: company.clone(),
            persona: persona.clone(),
            top_recommendations: top,
            supporting_recommendations: supporting,
            highlights,
        })
    }

    /// Template narrative for a (company, persona) pair; `None` only when the
    /// pair is unknown.
    pub fn build_visitor_narrative(&self, company_id: &str, persona_id: &str) -> Option<String> {
        self.get_recommendation_bundle(company_id, persona_id)
            .map(|bundle| visitor_narrative(&bundle))
    }
}

/// Weight of one focus match for this company: above the largest possible
/// priority-only total.
pub fn focus_weight(company: &CompanyProfile) -> u32 {
    PRIORITY_WEIGHT * company.priority_tags.len() as u32 + 1
}

/// Score one asset. Returns `None` for assets with no matching tag.
pub fn score_asset(
    company: &CompanyProfile,
    persona: &PersonaProfile,
    asset: &ContentAsset,
) -> Option<Recommendation> {
    let mut seen = BTreeSet::new();
    let focus_matches: Vec<&str> = persona
        .focus_tags
        .iter()
        .map(String::as_str)
        .filter(|tag| asset.has_tag(tag) && seen.insert(*tag))
        .collect();
    let priority_matches: Vec<&str> = company
        .priority_tags
        .iter()
        .map(String::as_str)
        .filter(|tag| asset.has_tag(tag))
        .collect();

    let score = focus_weight(company) * focus_matches.len() as u32
        + PRIORITY_WEIGHT * priority_matches.len() as u32;
    if score == 0 {
        return None;
    }

    let mut matched_tags: Vec<String> = focus_matches.iter().map(|t| t.to_string()).collect();
    matched_tags.extend(
        priority_matches
            .iter()
            .filter(|tag| !persona.has_focus(tag))
            .map(|t| t.to_string()),
    );

    Some(Recommendation {
        asset: asset.clone(),
        reason: build_reason(company, persona, &focus_matches, &priority_matches),
        matched_tags,
        score,
    })
}

fn build_reason(
    company: &CompanyProfile,
    persona: &PersonaProfile,
    focus_matches: &[&str],
    priority_matches: &[&str],
) -> String {
    match (focus_matches.is_empty(), priority_matches.is_empty()) {
        (false, false) => format!(
            "Matches {}'s focus on {}; also a priority for {}: {}",
            persona.name,
            human_join(focus_matches),
            company.name,
            human_join(priority_matches)
        ),
        (false, true) => format!(
            "Matches {}'s focus on {}",
            persona.name,
            human_join(focus_matches)
        ),
        _ => format!(
            "Aligns with {} priorities: {}",
            company.name,
            human_join(priority_matches)
        ),
    }
}

fn build_highlights(
    persona: &PersonaProfile,
    top: &[Recommendation],
    supporting: &[Recommendation],
) -> Vec<String> {
    let mut highlights = Vec::new();

    let recommended: Vec<&Recommendation> = top.iter().chain(supporting).collect();
    let covered: Vec<&str> = persona
        .focus_tags
        .iter()
        .map(String::as_str)
        .filter(|tag| recommended.iter().any(|r| r.asset.has_tag(tag)))
        .collect();
    if !covered.is_empty() {
        highlights.push(format!(
            "Published work covers {} of {} {} focus areas: {}.",
            covered.len(),
            persona.focus_tags.len(),
            persona.role,
            human_join(&covered)
        ));
    }

    let mut kinds = Vec::new();
    for recommendation in top {
        let label = recommendation.asset.kind.plural_label();
        if !kinds.contains(&label) {
            kinds.push(label);
        }
    }
    if !kinds.is_empty() {
        highlights.push(format!("Top picks span {}.", human_join(&kinds)));
    }

    if let Some(best) = top.first() {
        let tags: Vec<&str> = best.matched_tags.iter().map(String::as_str).collect();
        highlights.push(format!(
            "Strongest match: {} ({}).",
            best.asset.title,
            human_join(&tags)
        ));
    }

    highlights.truncate(MAX_HIGHLIGHTS);
    highlights
}

/// Deterministic visitor narrative for a bundle. Never empty.
pub fn visitor_narrative(bundle: &RecommendationBundle) -> String {
    let audience = format!("{}'s {}", bundle.company.name, bundle.persona.role.trim());
    let goal = bundle.persona.recommendation_goal.trim();
    let titles: Vec<String> = bundle
        .top_titles()
        .take(NARRATIVE_TITLES)
        .map(|title| format!("\"{title}\""))
        .collect();
    let titles: Vec<&str> = titles.iter().map(String::as_str).collect();

    match (titles.is_empty(), goal.is_empty()) {
        (false, false) => format!(
            "Welcome, {audience}. To help you {goal}, start with {}.",
            human_join(&titles)
        ),
        (false, true) => format!("Welcome, {audience}. Start with {}.", human_join(&titles)),
        (true, false) => format!("Welcome, {audience}. This tour is tuned to help you {goal}."),
        (true, true) => format!("Welcome, {audience}. Explore the work and writing below."),
    }
}

/// "a", "a and b", "a, b and c".
fn human_join(items: &[&str]) -> String {
    match items {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}
