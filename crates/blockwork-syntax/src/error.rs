/// Errors raised while compiling a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("{message} at line {line}")]
    Syntax { message: String, line: usize },

    #[error("{message} at line {line}")]
    InvalidConfiguration { message: String, line: usize },
}

impl TemplateError {
    pub fn line(&self) -> usize {
        match self {
            TemplateError::Syntax { line, .. } | TemplateError::InvalidConfiguration { line, .. } => {
                *line
            }
        }
    }
}

impl From<crate::parser::SyntaxError> for TemplateError {
    fn from(err: crate::parser::SyntaxError) -> Self {
        TemplateError::Syntax {
            message: err.message,
            line: err.line,
        }
    }
}
