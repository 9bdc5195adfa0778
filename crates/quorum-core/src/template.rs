//! Prompt templates keyed by category, with a generic fallback

use std::collections::HashMap;

/// Variables available to a template render.
///
/// `query` and `context` are always present; everything else is optional
/// and renders as an empty string when unset, so a template never fails on
/// a missing variable.
#[derive(Debug, Clone, Default)]
pub struct TemplateVars {
    vars: HashMap<String, String>,
}

impl TemplateVars {
    pub fn new(query: impl Into<String>, context: impl Into<String>) -> Self {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), query.into());
        vars.insert("context".to_string(), context.into());
        Self { vars }
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn set_opt(self, name: impl Into<String>, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.set(name, v),
            None => self,
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

/// A prompt template with `{name}` placeholders.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Substitute placeholders. Unknown variables render as empty strings.
    pub fn render(&self, vars: &TemplateVars) -> String {
        let mut out = String::with_capacity(self.text.len());
        let mut chars = self.text.char_indices().peekable();

        while let Some((start, ch)) = chars.next() {
            if ch != '{' {
                out.push(ch);
                continue;
            }
            // Find the closing brace of a simple `{ident}` placeholder.
            let rest = &self.text[start + 1..];
            match rest.find('}') {
                Some(end)
                    if rest[..end]
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_') =>
                {
                    let name = &rest[..end];
                    out.push_str(vars.get(name).unwrap_or(""));
                    // Skip past the placeholder body and closing brace.
                    for _ in 0..=end {
                        chars.next();
                    }
                }
                _ => out.push(ch),
            }
        }
        out
    }
}

/// Category name to template lookup, with the required generic fallback.
///
/// Categories gain templates at runtime (and via configuration), so this is
/// a plain table rather than an exhaustive match over category names.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, PromptTemplate>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with the specialized templates for unit,
    /// integration and security testing. Every other category falls
    /// through to the generic direct prompt.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.insert(
            "unit_testing",
            PromptTemplate::new(
                "You are an expert in unit testing with deep knowledge of {language} and {framework}.\n\n\
                 Context: {context}\n\
                 Query: {query}\n\n\
                 Cover test structure, mocking strategy, edge cases, coverage practices and \
                 worked example tests. Keep the tests practical and maintainable.",
            ),
        );
        registry.insert(
            "integration_testing",
            PromptTemplate::new(
                "You are an integration testing expert focused on component interactions.\n\n\
                 Context: {context}\n\
                 Components: {components}\n\
                 Query: {query}\n\n\
                 Cover environment setup, test data management, service virtualization, \
                 contract testing and concrete integration scenarios. Keep tests isolated \
                 and reliable.",
            ),
        );
        registry.insert(
            "security_testing",
            PromptTemplate::new(
                "You are a security testing expert in application security and penetration testing.\n\n\
                 Context: {context}\n\
                 Technology Stack: {tech_stack}\n\
                 Query: {query}\n\n\
                 Cover the relevant OWASP Top 10 vulnerabilities, security test automation, \
                 penetration testing approach, compliance requirements and remediation steps. \
                 Be specific to the stack.",
            ),
        );
        registry
    }

    pub fn insert(&mut self, category: impl Into<String>, template: PromptTemplate) {
        self.templates.insert(category.into(), template);
    }

    pub fn get(&self, category: &str) -> Option<&PromptTemplate> {
        self.templates.get(category)
    }

    /// Render the category's template, or the generic fallback when none
    /// is registered.
    pub fn render(&self, category: &str, vars: &TemplateVars) -> String {
        match self.templates.get(category) {
            Some(template) => template.render(vars),
            None => Self::render_generic(
                vars.get("query").unwrap_or(""),
                vars.get("context").unwrap_or(""),
            ),
        }
    }

    /// The direct-prompt fallback used for categories without a template.
    pub fn render_generic(query: &str, context: &str) -> String {
        format!("Context: {}\n\nQuery: {}", context, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_vars() {
        let template = PromptTemplate::new("Q: {query} C: {context}");
        let vars = TemplateVars::new("hello", "prior");
        assert_eq!(template.render(&vars), "Q: hello C: prior");
    }

    #[test]
    fn test_missing_vars_render_empty() {
        let template = PromptTemplate::new("lang={language}!");
        let vars = TemplateVars::new("q", "c");
        assert_eq!(template.render(&vars), "lang=!");
    }

    #[test]
    fn test_non_placeholder_braces_kept() {
        let template = PromptTemplate::new("code {query} then { not a var }");
        let vars = TemplateVars::new("X", "");
        assert_eq!(template.render(&vars), "code X then { not a var }");
    }

    #[test]
    fn test_registry_falls_back_to_generic() {
        let registry = TemplateRegistry::with_defaults();
        let vars = TemplateVars::new("what now", "earlier");
        let rendered = registry.render("performance_testing", &vars);
        assert_eq!(rendered, "Context: earlier\n\nQuery: what now");
    }

    #[test]
    fn test_registry_uses_category_template() {
        let registry = TemplateRegistry::with_defaults();
        let vars = TemplateVars::new("test my parser", "")
            .set("language", "Rust")
            .set("framework", "cargo test");
        let rendered = registry.render("unit_testing", &vars);
        assert!(rendered.contains("Rust"));
        assert!(rendered.contains("test my parser"));
    }
}
