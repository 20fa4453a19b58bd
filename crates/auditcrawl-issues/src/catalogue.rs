//! The issue-definition catalogue is the sole authority on which codes may
//! be emitted (spec.md §9 open question): a code with no matching entry is
//! silently dropped rather than invented on the fly.

use auditcrawl_types::issue::IssueDefinition;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct IssueCatalogue {
    by_code: HashMap<String, IssueDefinition>,
}

impl IssueCatalogue {
    pub fn from_definitions(definitions: impl IntoIterator<Item = IssueDefinition>) -> Self {
        let by_code = definitions
            .into_iter()
            .filter(|d| d.active)
            .map(|d| (d.code.clone(), d))
            .collect();
        Self { by_code }
    }

    pub fn lookup(&self, code: &str) -> Option<&IssueDefinition> {
        self.by_code.get(code)
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditcrawl_types::issue::{IssueCategory, IssueSeverity};
    use uuid::Uuid;

    fn def(code: &str, active: bool) -> IssueDefinition {
        IssueDefinition {
            id: Uuid::new_v4(),
            code: code.to_string(),
            name: code.to_string(),
            category: IssueCategory::Content,
            severity: IssueSeverity::Warning,
            active,
        }
    }

    #[test]
    fn inactive_definitions_are_excluded() {
        let catalogue = IssueCatalogue::from_definitions(vec![def("A", true), def("B", false)]);
        assert!(catalogue.lookup("A").is_some());
        assert!(catalogue.lookup("B").is_none());
    }

    #[test]
    fn unknown_codes_return_none() {
        let catalogue = IssueCatalogue::from_definitions(vec![def("A", true)]);
        assert!(catalogue.lookup("NOT_A_REAL_CODE").is_none());
    }
}
