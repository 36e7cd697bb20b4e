//! Template rendering for handlers.
//!
//! Thin wrapper over `minijinja`: templates are read from disk on every call
//! and nothing is cached.

use anyhow::{Context, Result};
use minijinja::Environment;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::static_files::resolve_under;

#[derive(Debug, Clone)]
pub struct Templates {
    dir: PathBuf,
}

impl Templates {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Render `name` (relative to the template directory) with `context`.
    pub fn render<C: Serialize>(&self, name: &str, context: &C) -> Result<String> {
        let path = resolve_under(&self.dir, name)
            .with_context(|| format!("invalid template name '{name}'"))?;
        let source = fs::read_to_string(&path)
            .with_context(|| format!("failed to read template {}", path.display()))?;

        let mut env = Environment::new();
        env.add_template(name, &source)
            .with_context(|| format!("failed to parse template '{name}'"))?;
        let tmpl = env.get_template(name)?;
        tmpl.render(context)
            .with_context(|| format!("failed to render template '{name}'"))
    }
}
