//! Static company, persona and content catalog.
//!
//! Loaded once at startup and shared read-only. Persona focus tags are
//! expected to intersect at least one asset's tags; [`Catalog::catalog_issues`]
//! reports violations but nothing enforces it at runtime.

use std::collections::BTreeSet;

use crate::models::{AssetKind, CompanyProfile, ContentAsset, PersonaProfile, ThemeTokens};

/// Immutable catalog of companies (with their personas) and content assets.
#[derive(Debug, Clone)]
pub struct Catalog {
    companies: Vec<CompanyProfile>,
    assets: Vec<ContentAsset>,
}

impl Catalog {
    /// Build a catalog. Asset order is the tie-break order for ranking.
    pub fn new(companies: Vec<CompanyProfile>, assets: Vec<ContentAsset>) -> Self {
        Self { companies, assets }
    }

    /// The catalog the site ships with.
    pub fn builtin() -> Self {
        Self::new(builtin_companies(), builtin_assets())
    }

    pub fn companies(&self) -> &[CompanyProfile] {
        &self.companies
    }

    pub fn assets(&self) -> &[ContentAsset] {
        &self.assets
    }

    pub fn company(&self, company_id: &str) -> Option<&CompanyProfile> {
        self.companies.iter().find(|c| c.id == company_id)
    }

    /// Look up a persona that belongs to the given company.
    pub fn persona(
        &self,
        company_id: &str,
        persona_id: &str,
    ) -> Option<(&CompanyProfile, &PersonaProfile)> {
        let company = self.company(company_id)?;
        let persona = company.persona(persona_id)?;
        Some((company, persona))
    }

    /// Data-quality problems: missing default personas and focus tags that
    /// no asset carries.
    pub fn catalog_issues(&self) -> Vec<String> {
        let asset_tags: BTreeSet<&str> = self
            .assets
            .iter()
            .flat_map(|a| a.tags.iter().map(String::as_str))
            .collect();

        let mut issues = Vec::new();
        for company in &self.companies {
            if company.default_persona().is_none() {
                issues.push(format!(
                    "company '{}' has no persona with default id '{}'",
                    company.id, company.default_persona_id
                ));
            }
            for persona in &company.personas {
                for tag in &persona.focus_tags {
                    if !asset_tags.contains(tag.as_str()) {
                        issues.push(format!(
                            "persona '{}/{}' focus tag '{}' matches no asset",
                            company.id, persona.id, tag
                        ));
                    }
                }
            }
        }
        issues
    }
}

fn company(
    id: &str,
    name: &str,
    summary: &str,
    priority_tags: &[&str],
    theme: (&str, &str),
    default_persona_id: &str,
    personas: Vec<PersonaProfile>,
) -> CompanyProfile {
    CompanyProfile {
        id: id.to_string(),
        name: name.to_string(),
        summary: summary.to_string(),
        priority_tags: priority_tags.iter().map(|t| t.to_string()).collect(),
        theme: ThemeTokens {
            light: theme.0.to_string(),
            dark: theme.1.to_string(),
        },
        personas,
        default_persona_id: default_persona_id.to_string(),
    }
}

fn builtin_companies() -> Vec<CompanyProfile> {
    vec![
        company(
            "acme",
            "Acme Capital",
            "Mid-market asset manager modernizing its data and platform stack under tight regulatory scrutiny.",
            &["finance", "compliance", "data-platform", "reliability"],
            ("#1d4ed8", "#93c5fd"),
            "cfo",
            vec![
                PersonaProfile::new(
                    "cfo",
                    "Finance Leader",
                    "CFO",
                    &["cost-optimization", "roi", "analytics", "compliance"],
                    "see measurable cost and revenue impact from engineering work",
                ),
                PersonaProfile::new(
                    "cto",
                    "Technology Leader",
                    "CTO",
                    &["platform-engineering", "reliability", "ai", "security"],
                    "judge platform depth and production judgment",
                ),
                PersonaProfile::new(
                    "recruiter",
                    "Talent Partner",
                    "Technical Recruiter",
                    &["leadership", "hiring", "communication", "mentoring"],
                    "quickly assess leadership scope and team fit",
                ),
            ],
        ),
        company(
            "northwind",
            "Northwind Health",
            "Digital health provider scaling patient-facing products across regulated markets.",
            &["healthcare", "compliance", "security", "product"],
            ("#047857", "#6ee7b7"),
            "eng-manager",
            vec![
                PersonaProfile::new(
                    "eng-manager",
                    "Engineering Manager",
                    "Engineering Manager",
                    &["leadership", "developer-experience", "reliability", "mentoring"],
                    "understand how teams were grown and kept shipping safely",
                ),
                PersonaProfile::new(
                    "product-lead",
                    "Product Lead",
                    "Head of Product",
                    &["product", "design-systems", "analytics", "healthcare"],
                    "find evidence of product sense in regulated domains",
                ),
            ],
        ),
        company(
            "globex",
            "Globex Logistics",
            "Global freight network rebuilding its tracking and routing systems for real-time scale.",
            &["logistics", "distributed-systems", "performance", "data-platform"],
            ("#b45309", "#fcd34d"),
            "vp-eng",
            vec![
                PersonaProfile::new(
                    "vp-eng",
                    "Engineering Executive",
                    "VP of Engineering",
                    &["distributed-systems", "platform-engineering", "leadership", "performance"],
                    "evaluate experience running large-scale systems and teams",
                ),
                PersonaProfile::new(
                    "staff-engineer",
                    "Peer Reviewer",
                    "Staff Engineer",
                    &["performance", "distributed-systems", "developer-experience", "llm"],
                    "dig into technical depth and tradeoffs",
                ),
            ],
        ),
    ]
}

fn builtin_assets() -> Vec<ContentAsset> {
    vec![
        ContentAsset::new(
            "Cutting Cloud Spend 38% at a Fintech Scale-up",
            "/work/cloud-cost-reduction",
            AssetKind::CaseStudy,
            &["cost-optimization", "finance", "platform-engineering", "roi"],
        ),
        ContentAsset::new(
            "Real-time Revenue Analytics Platform",
            "/work/revenue-analytics",
            AssetKind::CaseStudy,
            &["analytics", "data-platform", "finance", "roi"],
        ),
        ContentAsset::new(
            "SOC 2 Readiness Without Slowing Delivery",
            "/writing/soc2-readiness",
            AssetKind::Writing,
            &["compliance", "security", "leadership"],
        ),
        ContentAsset::new(
            "Building an Internal Developer Platform",
            "/work/internal-developer-platform",
            AssetKind::CaseStudy,
            &["platform-engineering", "developer-experience", "reliability"],
        ),
        ContentAsset::new(
            "Incident Response Playbook",
            "/writing/incident-response",
            AssetKind::Writing,
            &["reliability", "leadership", "communication"],
        ),
        ContentAsset::new(
            "RAG Assistant for Support Teams",
            "/projects/support-rag-assistant",
            AssetKind::Project,
            &["ai", "llm", "product"],
        ),
        ContentAsset::new(
            "Event-driven Shipment Tracking",
            "/work/shipment-tracking",
            AssetKind::CaseStudy,
            &["distributed-systems", "logistics", "performance", "data-platform"],
        ),
        ContentAsset::new(
            "Hiring Loops That Scale",
            "/writing/hiring-loops",
            AssetKind::Writing,
            &["hiring", "leadership", "mentoring"],
        ),
        ContentAsset::new(
            "Mentoring Program for Senior Engineers",
            "/writing/mentoring-senior-engineers",
            AssetKind::Writing,
            &["mentoring", "leadership", "communication"],
        ),
        ContentAsset::new(
            "Design System Migration",
            "/work/design-system-migration",
            AssetKind::CaseStudy,
            &["design-systems", "frontend", "product"],
        ),
        ContentAsset::new(
            "Patient Intake Redesign",
            "/work/patient-intake",
            AssetKind::CaseStudy,
            &["healthcare", "product", "design-systems", "compliance"],
        ),
        ContentAsset::new(
            "Zero-downtime Postgres Upgrades",
            "/writing/zero-downtime-postgres",
            AssetKind::Writing,
            &["reliability", "performance", "data-platform"],
        ),
        ContentAsset::new(
            "Open-source Rate Limiter",
            "/projects/rate-limiter",
            AssetKind::Project,
            &["performance", "distributed-systems", "developer-experience"],
        ),
        ContentAsset::new(
            "Threat Modeling Workshop Kit",
            "/projects/threat-modeling-kit",
            AssetKind::Project,
            &["security", "compliance", "developer-experience"],
        ),
        ContentAsset::new(
            "Resume",
            "/resume",
            AssetKind::Page,
            &["leadership", "hiring", "communication"],
        ),
        ContentAsset::new("About", "/about", AssetKind::Page, &["communication"]),
    ]
}
