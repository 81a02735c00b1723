//! Template loading and rendering using Tera.
//!
//! Guidance shown to the agent (stop-gate reasons, lint feedback) is rendered
//! from templates embedded in the binary. A project can override any of them
//! by placing a file with the same relative name under `.ralph/templates/`.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;
use tera::{Context, Tera};

/// Stop blocked because required validations never ran.
pub const STOP_MISSING_VALIDATIONS: &str = "messages/stop/missing_validations.tera";
/// Stop blocked because recent output shows failures.
pub const STOP_VALIDATION_FAILURES: &str = "messages/stop/validation_failures.tera";
/// Stop blocked because validations ran without a success marker.
pub const STOP_UNCONFIRMED_SUCCESS: &str = "messages/stop/unconfirmed_success.tera";
/// Lint findings for an edited file.
pub const LINT_ISSUES: &str = "messages/lint_issues.tera";

/// Embedded default templates for fallback when files don't exist.
static EMBEDDED_TEMPLATES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert(
        STOP_MISSING_VALIDATIONS,
        include_str!("../templates/messages/stop/missing_validations.tera"),
    );
    m.insert(
        STOP_VALIDATION_FAILURES,
        include_str!("../templates/messages/stop/validation_failures.tera"),
    );
    m.insert(
        STOP_UNCONFIRMED_SUCCESS,
        include_str!("../templates/messages/stop/unconfirmed_success.tera"),
    );
    m.insert(LINT_ISSUES, include_str!("../templates/messages/lint_issues.tera"));

    m
});

/// Global template engine with caching.
static TERA: Lazy<RwLock<Option<Tera>>> = Lazy::new(|| RwLock::new(None));

/// Initialize the template engine.
///
/// Templates found under `override_dir` take precedence; every embedded
/// template not overridden is added. With `None`, or a directory that doesn't
/// exist, only the embedded templates are used.
///
/// # Errors
///
/// Returns an error if the override directory exists but contains invalid templates.
///
/// # Panics
///
/// Panics if an embedded template fails to add to the engine. This should never
/// happen as embedded templates are verified by `test_all_embedded_templates_render`.
pub fn init_templates(override_dir: Option<&Path>) -> Result<()> {
    let mut tera = Tera::default();

    if let Some(dir) = override_dir.filter(|dir| dir.is_dir()) {
        let glob_pattern = format!("{}/**/*.tera", dir.display());
        tera = Tera::new(&glob_pattern).map_err(|e| {
            Error::Template(format!("Failed to load templates from {}: {e}", dir.display()))
        })?;
    }

    for (name, content) in EMBEDDED_TEMPLATES.iter() {
        if tera.get_template(name).is_err() {
            tera.add_raw_template(name, content)
                .expect("embedded template should be valid - verified by tests");
        }
    }

    *TERA.write().map_err(|e| Error::Template(e.to_string()))? = Some(tera);

    Ok(())
}

/// Render a template with the given context.
///
/// Initializes with embedded templates on first use. Surrounding whitespace
/// is trimmed from the result.
///
/// # Errors
///
/// Returns an error if the template doesn't exist or rendering fails.
pub fn render(name: &str, context: &Context) -> Result<String> {
    let needs_init = TERA.read().map_err(|e| Error::Template(e.to_string()))?.is_none();

    if needs_init {
        init_templates(None)?;
    }

    let guard = TERA.read().map_err(|e| Error::Template(e.to_string()))?;
    let tera = guard.as_ref().ok_or_else(|| Error::Template("Templates not initialized".into()))?;
    let rendered = tera
        .render(name, context)
        .map_err(|e| Error::Template(format!("Failed to render template {name}: {e}")))?;
    drop(guard);

    Ok(rendered.trim().to_string())
}

/// Render a template, falling back to the embedded version if the active one fails.
///
/// An override that references unknown variables must not take a hook down,
/// so a failing render is retried against the built-in text.
#[must_use]
pub fn render_message(name: &str, context: &Context) -> String {
    render(name, context).unwrap_or_else(|primary| {
        EMBEDDED_TEMPLATES
            .get(name)
            .ok_or_else(|| primary.to_string())
            .and_then(|content| {
                Tera::one_off(content, context, false).map_err(|e| format!("{primary}; {e}"))
            })
            .map_or_else(|e| e, |rendered| rendered.trim().to_string())
    })
}

/// Render a template with a simple key-value context.
///
/// # Errors
///
/// Returns an error if the template doesn't exist or rendering fails.
pub fn render_with_vars(name: &str, vars: &[(&str, &str)]) -> Result<String> {
    let mut context = Context::new();
    for (key, value) in vars {
        context.insert(*key, value);
    }
    render(name, &context)
}

/// Reset the template cache, forcing re-initialization on next use.
///
/// # Errors
///
/// Returns an error if the write lock cannot be acquired.
pub fn reset_cache() -> Result<()> {
    *TERA.write().map_err(|e| Error::Template(e.to_string()))? = None;
    Ok(())
}

/// Get the list of all embedded template names.
#[must_use]
pub fn embedded_template_names() -> Vec<&'static str> {
    EMBEDDED_TEMPLATES.keys().copied().collect()
}

/// Verify all embedded templates can be rendered with sample data.
///
/// # Errors
///
/// Returns an error if any template fails to render.
pub fn verify_all_templates() -> Result<()> {
    reset_cache()?;
    init_templates(None)?;

    let ctx = sample_context();
    for name in embedded_template_names() {
        render(name, &ctx)
            .map_err(|e| Error::Template(format!("Template {name} failed to render: {e}")))?;
    }

    Ok(())
}

/// A context carrying every variable any embedded template uses.
fn sample_context() -> Context {
    let mut ctx = Context::new();
    ctx.insert("missing", "build, lint");
    ctx.insert("commands", "cd frontend && npm run build && npm run lint");
    ctx.insert("relative_path", "frontend/src/app.ts");
    ctx.insert("output", "x eslint(no-debugger): `debugger` statement is not allowed");
    ctx
}
