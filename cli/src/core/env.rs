//! # ReDACT Environment Store
//!
//! File: cli/src/core/env.rs
//!
//! ## Overview
//!
//! `EnvStore` is the single source of key/value data for one invocation of the
//! tool. It starts as a snapshot of the process environment, receives overlays
//! from pre-render scripts via `merge`, and answers both plain lookups and the
//! precedence questions behind the reserved `RDCT_*` settings.
//!
//! ## Architecture
//!
//! - The snapshot is a `BTreeMap`, so every projection of it (the template
//!   variables included) is ordered and rendering is deterministic.
//! - The store is an ordinary value. `main` builds one with
//!   `EnvStore::from_process_env()` and hands it to the command handlers;
//!   `reload()` re-reads the process environment, and `from_vars()` builds a
//!   store without touching process state at all.
//! - `merge` is right-biased: incoming values overwrite, nothing is removed.
//!
//! ## Examples
//!
//! ```rust
//! let mut store = EnvStore::from_process_env();
//! store.merge(pre_render_output.env);
//! let engine = store.resolve(Setting::TplEngine, "RDCT_", "go");
//! let vars = store.to_map();
//! ```
//!
use crate::core::config::Setting;
use crate::core::error::RedactError;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Ordered snapshot of the environment plus runtime overlays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvStore {
    vars: BTreeMap<String, String>,
}

impl EnvStore {
    /// Snapshots the current process environment.
    pub fn from_process_env() -> Self {
        EnvStore {
            vars: snapshot_process_env(),
        }
    }

    /// Builds a store from explicit pairs. Later duplicates win.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        EnvStore {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Discards all overlays and re-snapshots the process environment.
    pub fn reload(&mut self) {
        self.vars = snapshot_process_env();
        debug!("Reloaded environment store ({} vars)", self.vars.len());
    }

    /// Value for `key`, or an empty string if it is absent.
    pub fn find(&self, key: &str) -> String {
        self.vars.get(key).cloned().unwrap_or_default()
    }

    /// Value for `key`; an empty value still counts as present.
    pub fn find_required(&self, key: &str) -> Result<String, RedactError> {
        self.vars
            .get(key)
            .cloned()
            .ok_or_else(|| RedactError::KeyNotFound {
                key: key.to_string(),
            })
    }

    /// Borrowed view of every variable, for rendering without a copy.
    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    /// Independent copy of every variable.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.vars.clone()
    }

    /// Independent copy of the variables whose key starts with `prefix`.
    /// This is a literal prefix match, not a pattern.
    pub fn to_map_filtered_by_prefix(&self, prefix: &str) -> BTreeMap<String, String> {
        self.vars
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Overwrites colliding keys with the incoming values and adds new ones.
    pub fn merge<I>(&mut self, incoming: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in incoming {
            trace!("Merging env var {}", key);
            self.vars.insert(key, value);
        }
    }

    /// Resolves a value in this order:
    /// 1. `primary_key`, if present in the store (even when empty)
    /// 2. `caller_default`, if non-empty
    /// 3. `fallback_key`, or an empty string
    pub fn resolve_default(
        &self,
        primary_key: &str,
        fallback_key: &str,
        caller_default: &str,
    ) -> String {
        match self.find_required(primary_key) {
            Ok(value) => value,
            Err(_) if !caller_default.is_empty() => caller_default.to_string(),
            Err(_) => self.find(fallback_key),
        }
    }

    /// `resolve_default` applied to the reserved key pair of `setting`.
    pub fn resolve(&self, setting: Setting, prefix: &str, caller_default: &str) -> String {
        self.resolve_default(
            &setting.primary_key(prefix),
            &setting.fallback_key(prefix),
            caller_default,
        )
    }
}

fn snapshot_process_env() -> BTreeMap<String, String> {
    std::env::vars_os()
        .filter_map(|(k, v)| match (k.into_string(), v.into_string()) {
            (Ok(k), Ok(v)) => Some((k, v)),
            (k, _) => {
                debug!("Skipping non UTF-8 environment entry {:?}", k);
                None
            }
        })
        .collect()
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DEFAULT_ENV_PREFIX;

    fn store() -> EnvStore {
        EnvStore::from_vars([
            ("RDCT_DEFAULT_TPL_ENGINE", "mustache"),
            ("RDCT_DEFAULT_TPL_PATH", "/path/to/template"),
            ("RDCT_DEFAULT_CFG_PATH", "/path/to/config"),
            ("test_app_var", "test"),
            ("empty_var", ""),
        ])
    }

    #[test]
    fn test_snapshot_contains_process_env() {
        // PATH is present in any sane test environment.
        let store = EnvStore::from_process_env();
        assert_eq!(
            store.vars().contains_key("PATH"),
            std::env::var("PATH").is_ok(),
            "snapshot should mirror the process environment"
        );
    }

    #[test]
    fn test_find() {
        let store = store();
        assert_eq!(store.find("test_app_var"), "test");
        assert_eq!(store.find("test_doesnt_exist"), "");
    }

    #[test]
    fn test_find_required() {
        let store = store();
        assert_eq!(store.find_required("test_app_var").unwrap(), "test");
        assert_eq!(store.find_required("empty_var").unwrap(), "");
        match store.find_required("test_doesnt_exist") {
            Err(RedactError::KeyNotFound { key }) => assert_eq!(key, "test_doesnt_exist"),
            other => panic!("expected KeyNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_merge_is_right_biased() {
        let mut store = store();
        store.merge([("a".to_string(), "1".to_string())]);
        store.merge([("a".to_string(), "2".to_string())]);
        assert_eq!(store.find("a"), "2");

        store.merge([("test_app_var".to_string(), "override".to_string())]);
        assert_eq!(store.find("test_app_var"), "override");
        // Disjoint keys survive.
        assert_eq!(store.find("RDCT_DEFAULT_TPL_PATH"), "/path/to/template");
    }

    #[test]
    fn test_to_map_is_a_copy() {
        let mut store = store();
        let mut copy = store.to_map();
        copy.insert("only_in_copy".into(), "x".into());
        assert!(!store.vars().contains_key("only_in_copy"));

        store.merge([("only_in_store".to_string(), "y".to_string())]);
        assert!(!copy.contains_key("only_in_store"));
        assert_eq!(store.to_map().len(), store.vars().len());
    }

    #[test]
    fn test_to_map_filtered_by_prefix() {
        let store = store();
        let filtered = store.to_map_filtered_by_prefix(DEFAULT_ENV_PREFIX);
        assert_eq!(filtered.len(), 3);
        assert!(filtered.keys().all(|k| k.starts_with("RDCT_")));
        assert!(!filtered.contains_key("test_app_var"));

        let expected = store
            .vars()
            .keys()
            .filter(|k| k.starts_with("RDCT_"))
            .count();
        assert_eq!(filtered.len(), expected);
    }

    #[test]
    fn test_prefix_filter_is_literal() {
        let store = EnvStore::from_vars([("A.B_x", "1"), ("AxB_y", "2")]);
        let filtered = store.to_map_filtered_by_prefix("A.B_");
        assert_eq!(filtered.len(), 1);
        assert!(filtered.contains_key("A.B_x"));
    }

    #[test]
    fn test_resolve_default_primary_wins() {
        let mut store = store();
        store.merge([("PRIMARY".to_string(), "primary".to_string())]);
        for caller_default in ["", "caller"] {
            assert_eq!(
                store.resolve_default("PRIMARY", "test_app_var", caller_default),
                "primary"
            );
        }
    }

    #[test]
    fn test_resolve_default_empty_primary_still_wins() {
        let store = store();
        assert_eq!(
            store.resolve_default("empty_var", "test_app_var", "caller"),
            ""
        );
    }

    #[test]
    fn test_resolve_default_caller_default_beats_fallback() {
        let store = store();
        assert_eq!(
            store.resolve_default("MISSING", "test_app_var", "caller"),
            "caller"
        );
    }

    #[test]
    fn test_resolve_default_falls_back() {
        let store = store();
        assert_eq!(store.resolve_default("MISSING", "test_app_var", ""), "test");
        assert_eq!(store.resolve_default("MISSING", "ALSO_MISSING", ""), "");
    }

    #[test]
    fn test_resolve_settings() {
        let mut store = store();
        assert_eq!(store.resolve(Setting::TplEngine, DEFAULT_ENV_PREFIX, ""), "mustache");
        assert_eq!(store.resolve(Setting::TplPath, DEFAULT_ENV_PREFIX, ""), "/path/to/template");
        assert_eq!(store.resolve(Setting::CfgPath, DEFAULT_ENV_PREFIX, ""), "/path/to/config");
        assert_eq!(
            store.resolve(Setting::TplEngine, DEFAULT_ENV_PREFIX, "go"),
            "go"
        );

        store.merge([
            ("RDCT_TPL_ENGINE".to_string(), "go".to_string()),
            (
                "RDCT_CFG_PATH".to_string(),
                "/path/to/override/config".to_string(),
            ),
        ]);
        assert_eq!(store.resolve(Setting::TplEngine, DEFAULT_ENV_PREFIX, ""), "go");
        assert_eq!(
            store.resolve(Setting::TplEngine, DEFAULT_ENV_PREFIX, "mustache"),
            "go"
        );
        assert_eq!(
            store.resolve(Setting::CfgPath, DEFAULT_ENV_PREFIX, "/path/to/config"),
            "/path/to/override/config"
        );
    }

    #[test]
    fn test_reload_drops_overlays() {
        let mut store = EnvStore::from_process_env();
        let key = "REDACT_TEST_OVERLAY_ONLY_KEY";
        store.merge([(key.to_string(), "x".to_string())]);
        assert!(store.vars().contains_key(key));
        store.reload();
        assert!(!store.vars().contains_key(key));
        assert_eq!(store, EnvStore::from_process_env());
    }
}
