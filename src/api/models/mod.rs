// Models module - contains company/persona profiles, content assets and recommendation results

pub mod content;
pub mod profile;
pub mod recommendation;

pub use content::{AssetKind, ContentAsset};
pub use profile::{CompanyProfile, PersonaProfile, ThemeTokens};
pub use recommendation::{Recommendation, RecommendationBundle};
