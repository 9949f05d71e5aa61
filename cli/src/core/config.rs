//! # ReDACT Configuration
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! ReDACT has no configuration file. The tool is configured through reserved
//! environment variables under a prefix (`RDCT_` by default) and through CLI
//! flags that supply defaults. This module names those reserved keys and turns
//! them, together with the CLI values, into a `RenderPlan`: the engine,
//! template path and config path a render will use.
//!
//! ## Architecture
//!
//! Each configurable concern has two reserved keys:
//! - a primary key (`{PREFIX}TPL_ENGINE`, `{PREFIX}TPL_PATH`, `{PREFIX}CFG_PATH`)
//! - a fallback key (`{PREFIX}DEFAULT_TPL_ENGINE`, `{PREFIX}DEFAULT_TPL_PATH`, `{PREFIX}DEFAULT_CFG_PATH`)
//!
//! Resolution order for each concern (see `EnvStore::resolve_default`):
//! 1. The primary key, when it is set (even to an empty value)
//! 2. The CLI-supplied default, when it is non-empty
//! 3. The fallback key, or an empty string
//!
//! Explicit CLI overrides (the positional template path of `redact render`
//! and its `--out` flag) are applied on top of that chain. Resolved paths have
//! a leading `~` expanded.
//!
//! ## Examples
//!
//! ```rust
//! let plan = RenderPlan::resolve(&store, "RDCT_", &defaults, &RenderOverrides::default());
//! let template = plan.require_template_path()?;
//! match plan.config_path() {
//!     Some(cfg) => render::render_to_file(&store, &template, &cfg, &plan.engine)?,
//!     None => render::render_to_stdout(&store, &template, &plan.engine)?,
//! }
//! ```
//!
use crate::core::env::EnvStore;
use crate::core::error::RedactError;
use std::path::PathBuf;
use tracing::debug;

/// Prefix for reserved env vars used to configure redact itself.
pub const DEFAULT_ENV_PREFIX: &str = "RDCT_";

/// A tool setting backed by a primary and a fallback reserved key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    TplEngine,
    TplPath,
    CfgPath,
}

impl Setting {
    fn suffix(self) -> &'static str {
        match self {
            Setting::TplEngine => "TPL_ENGINE",
            Setting::TplPath => "TPL_PATH",
            Setting::CfgPath => "CFG_PATH",
        }
    }

    /// The override key, e.g. `RDCT_TPL_PATH`.
    pub fn primary_key(self, prefix: &str) -> String {
        format!("{}{}", prefix, self.suffix())
    }

    /// The fallback key, e.g. `RDCT_DEFAULT_TPL_PATH`.
    pub fn fallback_key(self, prefix: &str) -> String {
        format!("{}DEFAULT_{}", prefix, self.suffix())
    }
}

/// Defaults supplied on the command line (`--default-tpl-engine` and friends).
/// Empty strings mean "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderDefaults {
    pub engine: String,
    pub template_path: String,
    pub config_path: String,
}

/// Values that beat the whole precedence chain when present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOverrides {
    pub template_path: Option<String>,
    pub config_path: Option<String>,
}

/// The fully resolved inputs of one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPlan {
    pub engine: String,
    pub template_path: String,
    pub config_path: String,
    prefix: String,
}

impl RenderPlan {
    pub fn resolve(
        store: &EnvStore,
        prefix: &str,
        defaults: &RenderDefaults,
        overrides: &RenderOverrides,
    ) -> Self {
        let engine = store.resolve(Setting::TplEngine, prefix, &defaults.engine);

        let template_path = match overrides.template_path.as_deref() {
            Some(path) if !path.is_empty() => path.to_string(),
            _ => store.resolve(Setting::TplPath, prefix, &defaults.template_path),
        };

        let config_path = match overrides.config_path.as_deref() {
            Some(path) if !path.is_empty() => path.to_string(),
            _ => store.resolve(Setting::CfgPath, prefix, &defaults.config_path),
        };

        let plan = RenderPlan {
            engine,
            template_path: expand_path(&template_path),
            config_path: expand_path(&config_path),
            prefix: prefix.to_string(),
        };
        debug!("Resolved render plan: {:?}", plan);
        plan
    }

    /// The template path, or a `Config` error naming every place it could have come from.
    pub fn require_template_path(&self) -> Result<PathBuf, RedactError> {
        if self.template_path.is_empty() {
            return Err(RedactError::Config(format!(
                "empty {} or {} and no template path given",
                Setting::TplPath.fallback_key(&self.prefix),
                Setting::TplPath.primary_key(&self.prefix),
            )));
        }
        Ok(PathBuf::from(&self.template_path))
    }

    /// The config path, or `None` when rendering should go to stdout.
    pub fn config_path(&self) -> Option<PathBuf> {
        if self.config_path.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.config_path))
        }
    }

    pub fn require_config_path(&self) -> Result<PathBuf, RedactError> {
        self.config_path().ok_or_else(|| {
            RedactError::Config(format!(
                "empty {} or {} and no --default-cfg-path given",
                Setting::CfgPath.fallback_key(&self.prefix),
                Setting::CfgPath.primary_key(&self.prefix),
            ))
        })
    }
}

fn expand_path(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    shellexpand::tilde(path).into_owned()
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> EnvStore {
        EnvStore::from_vars([
            ("RDCT_DEFAULT_TPL_ENGINE", "mustache"),
            ("RDCT_DEFAULT_TPL_PATH", "/path/to/template"),
            ("RDCT_DEFAULT_CFG_PATH", "/path/to/config"),
            ("test_app_var", "test"),
        ])
    }

    #[test]
    fn test_reserved_key_names() {
        assert_eq!(Setting::TplEngine.primary_key("RDCT_"), "RDCT_TPL_ENGINE");
        assert_eq!(
            Setting::TplEngine.fallback_key("RDCT_"),
            "RDCT_DEFAULT_TPL_ENGINE"
        );
        assert_eq!(Setting::CfgPath.primary_key("APP_"), "APP_CFG_PATH");
        assert_eq!(Setting::TplPath.fallback_key("APP_"), "APP_DEFAULT_TPL_PATH");
    }

    #[test]
    fn test_plan_uses_fallback_keys() {
        let plan = RenderPlan::resolve(
            &store(),
            DEFAULT_ENV_PREFIX,
            &RenderDefaults::default(),
            &RenderOverrides::default(),
        );
        assert_eq!(plan.engine, "mustache");
        assert_eq!(plan.template_path, "/path/to/template");
        assert_eq!(plan.config_path(), Some(PathBuf::from("/path/to/config")));
    }

    #[test]
    fn test_plan_cli_defaults_beat_fallback_keys() {
        let defaults = RenderDefaults {
            engine: "go".into(),
            template_path: "/cli/template".into(),
            config_path: "/cli/config".into(),
        };
        let plan = RenderPlan::resolve(
            &store(),
            DEFAULT_ENV_PREFIX,
            &defaults,
            &RenderOverrides::default(),
        );
        assert_eq!(plan.engine, "go");
        assert_eq!(plan.template_path, "/cli/template");
        assert_eq!(plan.config_path, "/cli/config");
    }

    #[test]
    fn test_plan_primary_keys_beat_cli_defaults() {
        let mut store = store();
        store.merge([
            ("RDCT_TPL_ENGINE".to_string(), "go".to_string()),
            ("RDCT_TPL_PATH".to_string(), "/env/template".to_string()),
        ]);
        let defaults = RenderDefaults {
            engine: "mustache".into(),
            template_path: "/cli/template".into(),
            config_path: String::new(),
        };
        let plan = RenderPlan::resolve(
            &store,
            DEFAULT_ENV_PREFIX,
            &defaults,
            &RenderOverrides::default(),
        );
        assert_eq!(plan.engine, "go");
        assert_eq!(plan.template_path, "/env/template");
    }

    #[test]
    fn test_plan_overrides_beat_everything() {
        let mut store = store();
        store.merge([("RDCT_CFG_PATH".to_string(), "/env/config".to_string())]);
        let overrides = RenderOverrides {
            template_path: Some("/arg/template".into()),
            config_path: Some("/arg/config".into()),
        };
        let plan = RenderPlan::resolve(
            &store,
            DEFAULT_ENV_PREFIX,
            &RenderDefaults::default(),
            &overrides,
        );
        assert_eq!(plan.template_path, "/arg/template");
        assert_eq!(plan.config_path, "/arg/config");
    }

    #[test]
    fn test_missing_paths_are_reported() {
        let store = EnvStore::from_vars([("HOME", "/root")]);
        let plan = RenderPlan::resolve(
            &store,
            DEFAULT_ENV_PREFIX,
            &RenderDefaults::default(),
            &RenderOverrides::default(),
        );
        assert!(plan.config_path().is_none());
        let err = plan.require_template_path().unwrap_err();
        assert!(err.to_string().contains("RDCT_DEFAULT_TPL_PATH"));
        assert!(err.to_string().contains("RDCT_TPL_PATH"));
        let err = plan.require_config_path().unwrap_err();
        assert!(err.to_string().contains("RDCT_CFG_PATH"));
    }

    #[test]
    fn test_tilde_is_expanded() {
        let store = EnvStore::from_vars([("RDCT_TPL_PATH", "~/app.tmpl")]);
        let plan = RenderPlan::resolve(
            &store,
            DEFAULT_ENV_PREFIX,
            &RenderDefaults::default(),
            &RenderOverrides::default(),
        );
        assert!(plan.template_path.ends_with("app.tmpl"));
        if std::env::var_os("HOME").is_some() {
            assert!(!plan.template_path.starts_with('~'));
        }
    }
}
