//! Shared configuration types.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Namespace used when `GROUP_ID` is not set.
pub const DEFAULT_NAMESPACE: &str = "carga_2.0";

fn validate_namespace(namespace: &str) -> Result<(), validator::ValidationError> {
    if namespace.trim().is_empty() {
        return Err(validator::ValidationError::new("group_id must not be blank"));
    }
    Ok(())
}

/// Central configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DebtGraphConfig {
    /// Neo4j connection URI (e.g. `bolt://localhost:7687`).
    #[validate(length(min = 1))]
    pub neo4j_uri: String,

    /// Neo4j username.
    pub neo4j_user: String,

    /// Neo4j password.
    #[validate(length(min = 1))]
    pub neo4j_password: String,

    /// OpenAI API key. Only needed for episode auto-extraction.
    pub openai_api_key: Option<String>,

    /// LLM model used for episode auto-extraction.
    pub model_name: String,

    /// Namespace tag stamped on every node and edge of a run.
    #[validate(custom(function = "validate_namespace"))]
    pub group_id: String,
}

impl Default for DebtGraphConfig {
    fn default() -> Self {
        Self {
            neo4j_uri: "bolt://localhost:7687".to_string(),
            neo4j_user: "neo4j".to_string(),
            neo4j_password: String::new(),
            openai_api_key: None,
            model_name: "gpt-4o".to_string(),
            group_id: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl DebtGraphConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` first (non-fatal if `.env` is absent),
    /// then reads each variable from the process environment. `NEO4J_PASSWORD`
    /// is required and returns a [`crate::DebtGraphError::Validation`] error
    /// when absent or empty.
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();

        let neo4j_uri = std::env::var("NEO4J_URI")
            .unwrap_or_else(|_| "bolt://localhost:7687".to_string());

        let neo4j_user = std::env::var("NEO4J_USERNAME")
            .unwrap_or_else(|_| "neo4j".to_string());

        let neo4j_password = std::env::var("NEO4J_PASSWORD").map_err(|_| {
            crate::DebtGraphError::Validation("NEO4J_PASSWORD is required".to_string())
        })?;

        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        let model_name = std::env::var("MODEL_NAME").unwrap_or_else(|_| "gpt-4o".to_string());

        let group_id =
            std::env::var("GROUP_ID").unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string());

        let config = Self {
            neo4j_uri,
            neo4j_user,
            neo4j_password,
            openai_api_key,
            model_name,
            group_id,
        };

        config
            .validate()
            .map_err(|e| crate::DebtGraphError::Validation(e.to_string()))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    /// Serialises tests that mutate the process environment.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Temporarily sets env vars for a test, restoring originals afterward.
    fn with_env<F, R>(vars: &[(&str, &str)], f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let originals: Vec<(&str, Option<String>)> =
            vars.iter().map(|(k, _)| (*k, env::var(k).ok())).collect();

        for (k, v) in vars {
            env::set_var(k, v);
        }

        let result = f();

        for (k, original) in &originals {
            match original {
                Some(v) => env::set_var(k, v),
                None => env::remove_var(k),
            }
        }

        result
    }

    #[test]
    fn test_config_defaults() {
        with_env(&[("NEO4J_PASSWORD", "secret")], || {
            env::remove_var("NEO4J_URI");
            env::remove_var("NEO4J_USERNAME");
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("MODEL_NAME");
            env::remove_var("GROUP_ID");

            let config = DebtGraphConfig::from_env().expect("config should load");
            assert_eq!(config.neo4j_uri, "bolt://localhost:7687");
            assert_eq!(config.neo4j_user, "neo4j");
            assert_eq!(config.model_name, "gpt-4o");
            assert_eq!(config.group_id, DEFAULT_NAMESPACE);
            assert!(config.openai_api_key.is_none());
        });
    }

    #[test]
    fn test_config_custom_values() {
        with_env(
            &[
                ("NEO4J_URI", "bolt://db.example.com:7687"),
                ("NEO4J_USERNAME", "admin"),
                ("NEO4J_PASSWORD", "mysecret"),
                ("OPENAI_API_KEY", "sk-real-key"),
                ("MODEL_NAME", "gpt-4o-mini"),
                ("GROUP_ID", "carga_3.0"),
            ],
            || {
                let config = DebtGraphConfig::from_env().expect("config should load");
                assert_eq!(config.neo4j_uri, "bolt://db.example.com:7687");
                assert_eq!(config.neo4j_user, "admin");
                assert_eq!(config.neo4j_password, "mysecret");
                assert_eq!(config.openai_api_key.as_deref(), Some("sk-real-key"));
                assert_eq!(config.model_name, "gpt-4o-mini");
                assert_eq!(config.group_id, "carga_3.0");
            },
        );
    }

    #[test]
    fn test_config_missing_password() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let saved_pw = env::var("NEO4J_PASSWORD").ok();
        env::remove_var("NEO4J_PASSWORD");

        let result = DebtGraphConfig::from_env();

        if let Some(v) = saved_pw { env::set_var("NEO4J_PASSWORD", v); }

        match result {
            Err(crate::DebtGraphError::Validation(msg)) => {
                assert!(msg.contains("NEO4J_PASSWORD"));
            }
            other => panic!("expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_config_blank_namespace_rejected() {
        let config = DebtGraphConfig {
            neo4j_password: "secret".to_string(),
            group_id: "   ".to_string(),
            ..DebtGraphConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_empty_password_rejected() {
        let config = DebtGraphConfig::default();
        assert!(config.validate().is_err());
    }
}
