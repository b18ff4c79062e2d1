pub mod catalog;

use crate::logic::RacePlan;
use catalog::{catalog_scenarios, find_catalog_scenario};

/// A named race plan the tester can run.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub key: &'static str,
    pub name: String,
    pub plan: RacePlan,
}

impl TestScenario {
    #[must_use]
    pub fn new(key: &'static str, name: impl Into<String>, plan: RacePlan) -> Self {
        Self {
            key,
            name: name.into(),
            plan,
        }
    }
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let key = match name.to_lowercase().as_str() {
        "smoke" => "smoke",
        "speed-gap" | "speed" => "speed-gap",
        "photo-finish" | "photo" => "photo-finish",
        "wide-margin" | "wide" => "wide-margin",
        "rail-runner" | "rail" => "rail-runner",
        "full-field" | "field" => "full-field",
        "extreme-stats" | "extreme" => "extreme-stats",
        "sprint" => "sprint",
        "marathon" => "marathon",
        "deterministic" | "replay" => "deterministic",
        _ => return None,
    };
    find_catalog_scenario(key)
}

pub fn list_scenarios() -> Vec<(&'static str, String)> {
    catalog_scenarios()
        .into_iter()
        .map(|scenario| (scenario.key, scenario.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_catalog_keys() {
        assert_eq!(get_scenario("PHOTO").unwrap().key, "photo-finish");
        assert_eq!(get_scenario("replay").unwrap().key, "deterministic");
        assert!(get_scenario("steeplechase").is_none());
    }

    #[test]
    fn every_listed_scenario_resolves() {
        let listed = list_scenarios();
        assert_eq!(listed.len(), 10);
        for (key, _) in listed {
            assert!(get_scenario(key).is_some(), "{key}");
        }
    }
}
