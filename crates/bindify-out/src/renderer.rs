//! Template rendering for emission.
//!
//! Uses Handlebars without HTML escaping, plus two helpers:
//! - join: Join an array with a separator
//! - ident: Turn arbitrary text into a C identifier fragment

use handlebars::{Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext};
use serde::Serialize;

use crate::templates::TemplatesFile;
use crate::EmitError;

/// Compiled renderer with registered helpers
pub struct TemplateRenderer<'a> {
    handlebars: Handlebars<'a>,
    templates: TemplatesFile,
}

impl<'a> TemplateRenderer<'a> {
    pub fn new(templates: TemplatesFile) -> Result<Self, EmitError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(handlebars::no_escape);

        handlebars.register_helper("join", Box::new(JoinHelper));
        handlebars.register_helper("ident", Box::new(IdentHelper));

        // Every template doubles as a partial
        for (name, template) in &templates.templates {
            handlebars
                .register_template_string(name, &template.template)
                .map_err(|e| EmitError::Template {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
        }

        Ok(TemplateRenderer {
            handlebars,
            templates,
        })
    }

    pub fn builtin() -> Result<Self, EmitError> {
        Self::new(TemplatesFile::builtin()?)
    }

    /// Render a named template with data
    pub fn render<T: Serialize>(&self, template_name: &str, data: &T) -> Result<String, EmitError> {
        self.handlebars
            .render(template_name, data)
            .map_err(|e| EmitError::Render {
                name: template_name.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn list_templates(&self) -> Vec<&str> {
        self.templates.list_templates()
    }
}

/// Join an array with a separator
struct JoinHelper;

impl HelperDef for JoinHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let array = h.param(0).and_then(|v| v.value().as_array());

        let separator = h
            .param(1)
            .and_then(|v| v.value().as_str())
            .unwrap_or(", ");

        if let Some(arr) = array {
            let strings: Vec<String> = arr
                .iter()
                .map(|v| v.as_str().map(String::from).unwrap_or_else(|| v.to_string()))
                .collect();
            out.write(&strings.join(separator))?;
        }

        Ok(())
    }
}

/// Replace every character that cannot appear in a C identifier with `_`
struct IdentHelper;

impl HelperDef for IdentHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        if let Some(text) = h.param(0).and_then(|v| v.value().as_str()) {
            out.write(&c_identifier(text))?;
        }
        Ok(())
    }
}

pub fn c_identifier(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_templates() -> TemplatesFile {
        TemplatesFile::from_yaml(
            r##"
version: "1.0"
templates:
  header:
    description: Parameter list
    template: "f({{join params \", \"}})"
  source:
    description: Guard
    template: "#ifndef X_{{ident name}}"
  block:
    description: Unescaped text
    template: "{{text}}"
"##,
        )
        .unwrap()
    }

    #[test]
    fn test_join() {
        let renderer = TemplateRenderer::new(test_templates()).unwrap();
        let result = renderer
            .render("header", &json!({ "params": ["GLenum mode", "GLint first", 3] }))
            .unwrap();
        assert_eq!(result, "f(GLenum mode, GLint first, 3)");
    }

    #[test]
    fn test_ident() {
        let renderer = TemplateRenderer::new(test_templates()).unwrap();
        let result = renderer
            .render("source", &json!({ "name": "struct _cl_event" }))
            .unwrap();
        assert_eq!(result, "#ifndef X_struct__cl_event");
    }

    #[test]
    fn test_no_html_escaping() {
        let renderer = TemplateRenderer::new(test_templates()).unwrap();
        let result = renderer
            .render("block", &json!({ "text": "typedef void (*P)(const char *, int *);" }))
            .unwrap();
        assert_eq!(result, "typedef void (*P)(const char *, int *);");
    }

    #[test]
    fn test_bad_template_syntax() {
        let mut templates = test_templates();
        if let Some(t) = templates.templates.get_mut("block") {
            t.template = "{{#each items}}unterminated".to_string();
        }
        let err = TemplateRenderer::new(templates).err().unwrap();
        assert!(matches!(err, EmitError::Template { ref name, .. } if name == "block"));
    }

    #[test]
    fn test_builtin_registers() {
        let renderer = TemplateRenderer::builtin().unwrap();
        assert_eq!(renderer.list_templates().len(), 3);
    }
}
