//! Data transformers linking app, norm and view data.
//!
//! A block keeps two ordered chains. Model transformers map app data to norm
//! data and back; view transformers map norm data to view data and back.
//! Forward application runs a chain front to back, reverse application back
//! to front.

use std::sync::Arc;

use crate::error::{BlockError, TransformDirection};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransformError(pub String);

impl TransformError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// A pair of inverse functions between two data representations.
pub trait DataTransformer: Send + Sync {
    fn transform(&self, value: Value) -> Result<Value, TransformError>;

    fn reverse_transform(&self, value: Value) -> Result<Value, TransformError>;
}

type TransformFn = dyn Fn(Value) -> Result<Value, TransformError> + Send + Sync;

/// Transformer built from two closures.
pub struct CallbackTransformer {
    forward: Box<TransformFn>,
    reverse: Box<TransformFn>,
}

impl CallbackTransformer {
    pub fn new<F, R>(forward: F, reverse: R) -> Self
    where
        F: Fn(Value) -> Result<Value, TransformError> + Send + Sync + 'static,
        R: Fn(Value) -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        Self {
            forward: Box::new(forward),
            reverse: Box::new(reverse),
        }
    }
}

impl DataTransformer for CallbackTransformer {
    fn transform(&self, value: Value) -> Result<Value, TransformError> {
        (self.forward)(value)
    }

    fn reverse_transform(&self, value: Value) -> Result<Value, TransformError> {
        (self.reverse)(value)
    }
}

pub type SharedTransformer = Arc<dyn DataTransformer>;

pub(crate) fn apply_forward(
    chain: &[SharedTransformer],
    mut value: Value,
    direction: TransformDirection,
) -> Result<Value, BlockError> {
    for (stage, transformer) in chain.iter().enumerate() {
        value = transformer
            .transform(value)
            .map_err(|e| BlockError::TransformationFailed {
                direction,
                stage,
                reason: e.0,
            })?;
    }
    Ok(value)
}

pub(crate) fn apply_reverse(
    chain: &[SharedTransformer],
    mut value: Value,
    direction: TransformDirection,
) -> Result<Value, BlockError> {
    for (stage, transformer) in chain.iter().enumerate().rev() {
        value = transformer
            .reverse_transform(value)
            .map_err(|e| BlockError::TransformationFailed {
                direction,
                stage,
                reason: e.0,
            })?;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn append(suffix: &'static str) -> SharedTransformer {
        Arc::new(CallbackTransformer::new(
            move |v| Ok(Value::from(format!("{v}{suffix}"))),
            move |v| {
                let s = v.to_canonical_string();
                s.strip_suffix(suffix)
                    .map(Value::from)
                    .ok_or_else(|| TransformError::new(format!("missing suffix {suffix}")))
            },
        ))
    }

    #[test]
    fn forward_runs_front_to_back() {
        let chain = vec![append("a"), append("b")];
        let out = apply_forward(&chain, Value::from("x"), TransformDirection::ModelToNorm).unwrap();
        assert_eq!(out, Value::from("xab"));
    }

    #[test]
    fn reverse_runs_back_to_front() {
        let chain = vec![append("a"), append("b")];
        let out = apply_reverse(&chain, Value::from("xab"), TransformDirection::NormToModel).unwrap();
        assert_eq!(out, Value::from("x"));
    }

    #[test]
    fn failure_reports_stage() {
        let chain = vec![append("a"), append("b")];
        let err = apply_reverse(&chain, Value::from("xa"), TransformDirection::ViewToNorm).unwrap_err();
        assert_eq!(
            err,
            BlockError::TransformationFailed {
                direction: TransformDirection::ViewToNorm,
                stage: 1,
                reason: "missing suffix b".to_string(),
            }
        );
    }
}
