use std::collections::HashSet;

use crate::teamcity_client::ProjectRef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCheck {
    pub name: String,
    pub present: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub checks: Vec<NameCheck>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.present)
    }

    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.checks
            .iter()
            .filter(|c| !c.present)
            .map(|c| c.name.as_str())
    }
}

/// Check every expected project name against an inventory snapshot.
pub fn validate(inventory: &[ProjectRef], expected: &[String]) -> ValidationReport {
    let names: HashSet<&str> = inventory.iter().map(|p| p.name.as_str()).collect();
    ValidationReport {
        checks: expected
            .iter()
            .map(|name| NameCheck {
                name: name.clone(),
                present: names.contains(name.as_str()),
            })
            .collect(),
    }
}
