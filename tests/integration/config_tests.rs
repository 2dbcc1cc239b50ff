//! Configuration integration tests
//!
//! Loading the shipped example, environment overrides, and rejection of
//! configurations the engine cannot run with.

#[cfg(test)]
mod tests {
    use meterline::config::{ScopeLimit, Validate};
    use meterline::{Config, DataCategory, GovernanceError, GovernanceFacade};
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const EXAMPLE: &str = include_str!("../../config/governance.yaml.example");

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    // ==================== Loading ====================

    #[test]
    fn test_example_config_matches_defaults() {
        let example = Config::from_yaml(EXAMPLE).unwrap();
        let defaults = Config::default();

        assert_eq!(example.rate_limit.scopes, defaults.rate_limit.scopes);
        assert_eq!(example.cache.base_ttls, defaults.cache.base_ttls);
        assert_eq!(example.budget.base_costs, defaults.budget.base_costs);
        assert_eq!(example.quota.plans, defaults.quota.plans);
        assert_eq!(example.cache.sessions, defaults.cache.sessions);
    }

    #[tokio::test]
    async fn test_example_config_from_file_builds_engine() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(EXAMPLE.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).await.unwrap();
        assert_eq!(config.cache.base_ttls[&DataCategory::Filings], 604_800);
        assert!(GovernanceFacade::builder(config).build().is_ok());
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let yaml = r#"
rate_limit:
  scopes:
    export:
      limit: 2
      window_seconds: 3600
budget:
  daily_budget: 25
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.rate_limit.scope("export"), ScopeLimit::new(2, 3_600));
        assert_eq!(config.budget.daily_budget, 25.0);
        assert_eq!(config.budget.monthly_budget, 2_000.0);
        assert!(config.governance.serve_stale_on_budget_denial);
    }

    #[test]
    fn test_env_overrides_apply_and_switch_fail_open() {
        let config = Config::default()
            .apply_env(env(&[
                ("REDIS_URL", "redis://cache.internal:6379"),
                ("GOVERNANCE_DAILY_BUDGET", "40"),
                ("GOVERNANCE_FAIL_OPEN", "false"),
            ]))
            .unwrap();

        assert!(config.storage.redis.enabled);
        assert_eq!(config.storage.redis.url, "redis://cache.internal:6379");
        assert_eq!(config.budget.daily_budget, 40.0);
        assert!(!config.rate_limit.fail_open);
        assert!(!config.budget.fail_open);
        assert!(!config.quota.fail_open);
    }

    #[test]
    fn test_malformed_env_value_is_a_config_error() {
        let result = Config::default().apply_env(env(&[("GOVERNANCE_DAILY_BUDGET", "lots")]));
        assert!(matches!(result, Err(GovernanceError::Config(_))));
    }

    // ==================== Rejection ====================

    #[test]
    fn test_zero_limit_rejected() {
        let yaml = r#"
rate_limit:
  scopes:
    default:
      limit: 0
      window_seconds: 60
"#;
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("Rate limit config error"));
    }

    #[test]
    fn test_unparsable_market_hours_rejected() {
        let yaml = r#"
cache:
  market_hours:
    open: "half past nine"
"#;
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_unknown_category_rejected_at_parse() {
        let yaml = r#"
cache:
  base_ttls:
    crypto: 30
"#;
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_non_positive_budget_rejected() {
        let mut config = Config::default();
        config.budget.daily_budget = 0.0;
        assert!(config.budget.validate().is_err());
        assert!(GovernanceFacade::builder(config).build().is_err());
    }
}
