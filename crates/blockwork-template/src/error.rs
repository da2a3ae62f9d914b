use blockwork_engine::BlockError;
use blockwork_syntax::TemplateError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Block(#[from] BlockError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Unable to render the \"{role}\" of block \"{block}\": none of the fragments {} exist", .candidates.join(", "))]
    MissingFragment {
        block: String,
        role: String,
        candidates: Vec<String>,
    },

    #[error("Theme fragment \"{0}\" does not exist")]
    UnknownFragment(String),

    #[error("Unknown function \"{name}\" at line {line}")]
    UnknownFunction { name: String, line: usize },

    #[error("Unknown filter \"{name}\" at line {line}")]
    UnknownFilter { name: String, line: usize },

    #[error("{message} at line {line}")]
    Evaluation { message: String, line: usize },
}

pub type Result<T, E = RenderError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_fragment_lists_candidates() {
        let err = RenderError::MissingFragment {
            block: "title".to_string(),
            role: "widget".to_string(),
            candidates: vec!["_title_widget".to_string(), "block_widget".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Unable to render the \"widget\" of block \"title\": none of the fragments _title_widget, block_widget exist"
        );
    }

    #[test]
    fn engine_errors_pass_through_unchanged() {
        let err: RenderError = BlockError::UnknownType("nope".to_string()).into();
        assert_eq!(err.to_string(), "Could not load block type \"nope\"");
    }
}
