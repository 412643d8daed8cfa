//! Content catalog entries shown as recommendations.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    CaseStudy,
    Project,
    Writing,
    Page,
}

impl AssetKind {
    /// Plural label used in narrative text.
    pub fn plural_label(&self) -> &'static str {
        match self {
            AssetKind::CaseStudy => "case studies",
            AssetKind::Project => "projects",
            AssetKind::Writing => "writing",
            AssetKind::Page => "pages",
        }
    }
}

/// A piece of published work that can be recommended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentAsset {
    pub title: String,
    pub url: String,
    pub kind: AssetKind,
    pub tags: BTreeSet<String>,
}

impl ContentAsset {
    pub fn new(title: &str, url: &str, kind: AssetKind, tags: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            url: url.to_string(),
            kind,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}
