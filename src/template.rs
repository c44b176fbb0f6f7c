//! URL template rendering for both recipe dialects.

use crate::error::Result;
use crate::recipe::RecipeDialect;
use minijinja::syntax::SyntaxConfig;
use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;

/// Renders recipe templates with the delimiters of one dialect.
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    pub fn new(dialect: RecipeDialect) -> Result<Self> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        // An unknown variable would render an empty path segment and probe a
        // nonsense URL.
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        if dialect == RecipeDialect::Rattler {
            let syntax = SyntaxConfig::builder()
                .variable_delimiters(dialect.variable_start(), dialect.variable_end())
                .build()?;
            env.set_syntax(syntax);
        }

        Ok(Self { env })
    }

    /// Render `template` against `context`.
    pub fn render<C: Serialize>(&self, template: &str, context: &C) -> Result<String> {
        Ok(self.env.render_str(template, context)?)
    }
}
