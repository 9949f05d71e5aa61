//! # ReDACT Template Engines
//!
//! File: cli/src/core/templating.rs
//!
//! ## Overview
//!
//! This module decouples variable substitution from the concrete template
//! dialect. Two engines render the same variable set:
//!
//! - `Engine::Native` (name `"go"`): Go `text/template` syntax through `gtmpl`.
//!   Variables are fields of the dot, written `{{ .KeyName }}`.
//! - `Engine::Mustache` (name `"mustache"`): logic-less mustache through
//!   `ramhorns`, with `{{key}}` interpolation, `{{#key}}` sections and
//!   `{{^key}}` inverted sections.
//!
//! ## Architecture
//!
//! - `Engine` is a closed enum. `engine_for` (or `str::parse`) maps a name to a
//!   variant and rejects anything else with `RedactError::UnsupportedEngine`.
//! - `Engine::render` parses the template (`TemplateSyntax` on failure) and then
//!   renders it (`TemplateExecution` on failure). Both engines take the same
//!   `&BTreeMap<String, String>` and never mutate it.
//! - `Template` binds a template file to a variable set and an engine for a
//!   single render.
//!
//! Absent keys do not fail a render: the native engine prints Go's
//! `<no value>` marker, the mustache engine prints nothing. Neither engine
//! escapes output, since the results are configuration files, not HTML.
//!
//! ## Examples
//!
//! ```rust
//! let engine = templating::engine_for("mustache")?;
//! let rendered = engine.render("listen={{port}}\n", store.vars())?;
//!
//! let rendered = Template::new(Path::new("/etc/app.conf.tmpl"), store.vars(), Engine::Native).render()?;
//! ```
//!
use crate::core::error::{error_chain, RedactError, Result};
use anyhow::Context;
use ramhorns::encoding::Encoder;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Engine name of the native (Go template) dialect.
pub const ENGINE_GO: &str = "go";
/// Engine name of the logic-less dialect.
pub const ENGINE_MUSTACHE: &str = "mustache";

/// Template rendering strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Native,
    Mustache,
}

impl Engine {
    pub fn name(self) -> &'static str {
        match self {
            Engine::Native => ENGINE_GO,
            Engine::Mustache => ENGINE_MUSTACHE,
        }
    }

    /// Renders `template` against `vars`.
    pub fn render(
        self,
        template: &str,
        vars: &BTreeMap<String, String>,
    ) -> std::result::Result<String, RedactError> {
        debug!(
            "Rendering {} byte template with the {} engine",
            template.len(),
            self.name()
        );
        match self {
            Engine::Native => render_native(template, vars),
            Engine::Mustache => render_mustache(template, vars),
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Engine {
    type Err = RedactError;

    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        match name {
            ENGINE_GO => Ok(Engine::Native),
            ENGINE_MUSTACHE => Ok(Engine::Mustache),
            _ => Err(RedactError::UnsupportedEngine {
                name: name.to_string(),
            }),
        }
    }
}

/// Returns the engine registered under `name`.
pub fn engine_for(name: &str) -> std::result::Result<Engine, RedactError> {
    name.parse()
}

fn render_native(
    template: &str,
    vars: &BTreeMap<String, String>,
) -> std::result::Result<String, RedactError> {
    let mut tmpl = gtmpl::Template::default();
    tmpl.parse(template)
        .map_err(|e| RedactError::TemplateSyntax {
            engine: ENGINE_GO,
            message: error_chain(&e),
        })?;

    // A map receiver yields `<no value>` for absent keys instead of an error.
    let dot: HashMap<String, gtmpl::Value> = vars
        .iter()
        .map(|(k, v)| (k.clone(), gtmpl::Value::String(v.clone())))
        .collect();
    let context = gtmpl::Context::from(gtmpl::Value::Map(dot));

    tmpl.render(&context)
        .map_err(|e| RedactError::TemplateExecution {
            engine: ENGINE_GO,
            message: error_chain(&e),
        })
}

/// A variable value that interpolates verbatim, whichever tag form is used.
struct RawValue<'a>(&'a str);

impl ramhorns::Content for RawValue<'_> {
    fn is_truthy(&self) -> bool {
        !self.0.is_empty()
    }

    fn render_escaped<E: Encoder>(&self, encoder: &mut E) -> std::result::Result<(), E::Error> {
        encoder.write_unescaped(self.0)
    }

    fn render_unescaped<E: Encoder>(&self, encoder: &mut E) -> std::result::Result<(), E::Error> {
        encoder.write_unescaped(self.0)
    }
}

fn render_mustache(
    template: &str,
    vars: &BTreeMap<String, String>,
) -> std::result::Result<String, RedactError> {
    let tmpl = ramhorns::Template::new(template).map_err(|e| RedactError::TemplateSyntax {
        engine: ENGINE_MUSTACHE,
        message: error_chain(&e),
    })?;

    let content: HashMap<&str, RawValue<'_>> = vars
        .iter()
        .map(|(k, v)| (k.as_str(), RawValue(v.as_str())))
        .collect();
    Ok(tmpl.render(&content))
}

/// A template file bound to a variable set and an engine for one render.
#[derive(Debug)]
pub struct Template<'a> {
    path: &'a Path,
    vars: &'a BTreeMap<String, String>,
    engine: Engine,
}

impl<'a> Template<'a> {
    pub fn new(path: &'a Path, vars: &'a BTreeMap<String, String>, engine: Engine) -> Self {
        Template { path, vars, engine }
    }

    /// Reads the whole template file into memory.
    pub fn read_to_string(&self) -> Result<String> {
        fs::read_to_string(self.path)
            .map_err(|e| RedactError::io(self.path, e))
            .with_context(|| format!("Failed to read template '{}'", self.path.display()))
    }

    pub fn render(&self) -> Result<String> {
        let source = self.read_to_string()?;
        let rendered = self.engine.render(&source, self.vars)?;
        Ok(rendered)
    }
}
