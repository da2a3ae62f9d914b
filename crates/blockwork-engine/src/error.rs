use std::fmt;

/// Which way data was travelling through the transformer chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformDirection {
    /// App data to norm data (model transformers, forward).
    ModelToNorm,
    /// Norm data to view data (view transformers, forward).
    NormToView,
    /// View data back to norm data (view transformers, reverse).
    ViewToNorm,
    /// Norm data back to app data (model transformers, reverse).
    NormToModel,
}

impl fmt::Display for TransformDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransformDirection::ModelToNorm => "model to norm",
            TransformDirection::NormToView => "norm to view",
            TransformDirection::ViewToNorm => "view to norm",
            TransformDirection::NormToModel => "norm to model",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BlockError {
    #[error("Could not load block type \"{0}\"")]
    UnknownType(String),

    #[error("Circular reference detected for block type \"{name}\" ({})", .chain.join(" > "))]
    CircularParent { name: String, chain: Vec<String> },

    #[error("The option \"{key}\" is invalid: {reason}")]
    InvalidOptions { key: String, reason: String },

    #[error("Unable to transform value ({direction}, stage {stage}): {reason}")]
    TransformationFailed {
        direction: TransformDirection,
        stage: usize,
        reason: String,
    },

    #[error("A child named \"{name}\" already exists in block \"{parent}\"")]
    DuplicateChildName { parent: String, name: String },

    #[error("The block builder \"{0}\" is already finalized and cannot be modified")]
    AlreadyFinalized(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("You cannot add children to the simple block \"{0}\"; set the \"compound\" option to true")]
    NotCompound(String),

    #[error("Child \"{name}\" does not exist in block \"{parent}\"")]
    ChildNotFound { parent: String, name: String },

    #[error("The view of block \"{0}\" has already been rendered")]
    AlreadyRendered(String),
}

pub type Result<T, E = BlockError> = std::result::Result<T, E>;
