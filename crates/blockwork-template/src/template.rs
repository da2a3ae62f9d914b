use blockwork_syntax::{TagSet, Template, TemplateError, parse_template};

/// A parsed template, ready to render any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTemplate {
    template: Template,
}

impl CompiledTemplate {
    pub fn compile(source: &str, tags: &TagSet) -> Result<Self, TemplateError> {
        Ok(Self {
            template: parse_template(source, tags)?,
        })
    }

    pub fn template(&self) -> &Template {
        &self.template
    }
}
