use std::sync::Arc;

use crate::options::Options;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Confidence {
    Low,
    Medium,
    High,
    VeryHigh,
}

/// A suggested type and options for a class property.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeGuess {
    pub type_name: String,
    pub options: Options,
    pub confidence: Confidence,
}

impl TypeGuess {
    pub fn new(type_name: impl Into<String>, options: Options, confidence: Confidence) -> Self {
        Self {
            type_name: type_name.into(),
            options,
            confidence,
        }
    }
}

pub trait TypeGuesser: Send + Sync {
    fn guess_type(&self, class: &str, property: &str) -> Option<TypeGuess>;
}

/// Asks every guesser and keeps the most confident answer. Ties go to the
/// guesser registered first.
#[derive(Clone, Default)]
pub struct TypeGuesserChain {
    guessers: Vec<Arc<dyn TypeGuesser>>,
}

impl TypeGuesserChain {
    pub fn new(guessers: Vec<Arc<dyn TypeGuesser>>) -> Self {
        Self { guessers }
    }

    pub fn len(&self) -> usize {
        self.guessers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guessers.is_empty()
    }
}

impl TypeGuesser for TypeGuesserChain {
    fn guess_type(&self, class: &str, property: &str) -> Option<TypeGuess> {
        let mut best: Option<TypeGuess> = None;
        for guess in self
            .guessers
            .iter()
            .filter_map(|g| g.guess_type(class, property))
        {
            if best.as_ref().is_none_or(|b| guess.confidence > b.confidence) {
                best = Some(guess);
            }
        }
        best
    }
}
