//! Small shared value types extraction sub-modules and the page model both
//! need, kept here to avoid a dependency cycle between `auditcrawl-types` and
//! `auditcrawl-extract`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HreflangTag {
    pub lang: String,
    pub region: Option<String>,
    pub href: String,
    pub is_x_default: bool,
}
