//! Block options and the schema that validates them.
//!
//! Each type in a resolved chain contributes to one [`OptionsResolver`]:
//! defaults added later override earlier ones, while validators accumulate
//! so a value must satisfy every contributor.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::error::{BlockError, Result};
use crate::value::{Value, ValueKind};

static NULL: Value = Value::Null;

/// Resolved option values of a block, keyed by option name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options(BTreeMap<String, Value>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The option value, or null when it is not set.
    pub fn value(&self, key: &str) -> &Value {
        self.0.get(key).unwrap_or(&NULL)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.value(key).as_bool().unwrap_or(false)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.value(key).as_str()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }
}

impl From<BTreeMap<String, Value>> for Options {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

type Validator = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
type Normalizer = Arc<dyn Fn(&Options, Value) -> Value + Send + Sync>;

/// Option schema built up by a resolved type chain.
#[derive(Clone, Default)]
pub struct OptionsResolver {
    defined: BTreeSet<String>,
    defaults: BTreeMap<String, Value>,
    required: BTreeSet<String>,
    allowed_kinds: BTreeMap<String, Vec<ValueKind>>,
    validators: BTreeMap<String, Vec<(String, Validator)>>,
    normalizers: BTreeMap<String, Normalizer>,
}

impl OptionsResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or override) the default value of an option.
    pub fn set_default(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.defined.insert(key.to_string());
        self.defaults.insert(key.to_string(), value.into());
        self
    }

    pub fn set_defaults<I, V>(&mut self, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = (&'static str, V)>,
        V: Into<Value>,
    {
        for (key, value) in entries {
            self.set_default(key, value);
        }
        self
    }

    /// Declare an option without a default; it is absent unless passed.
    pub fn set_defined(&mut self, key: &str) -> &mut Self {
        self.defined.insert(key.to_string());
        self
    }

    pub fn set_required(&mut self, key: &str) -> &mut Self {
        self.defined.insert(key.to_string());
        self.required.insert(key.to_string());
        self
    }

    /// Restrict the kinds an option may hold, replacing any earlier restriction.
    pub fn set_allowed_kinds(&mut self, key: &str, kinds: &[ValueKind]) -> &mut Self {
        self.allowed_kinds.insert(key.to_string(), kinds.to_vec());
        self
    }

    /// Add a validator; every validator registered for a key must pass.
    pub fn add_validator<F>(&mut self, key: &str, reason: &str, f: F) -> &mut Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.validators
            .entry(key.to_string())
            .or_default()
            .push((reason.to_string(), Arc::new(f)));
        self
    }

    pub fn set_normalizer<F>(&mut self, key: &str, f: F) -> &mut Self
    where
        F: Fn(&Options, Value) -> Value + Send + Sync + 'static,
    {
        self.normalizers.insert(key.to_string(), Arc::new(f));
        self
    }

    pub fn is_defined(&self, key: &str) -> bool {
        self.defined.contains(key)
    }

    pub fn default_of(&self, key: &str) -> Option<&Value> {
        self.defaults.get(key)
    }

    /// Merge `options` over the defaults and validate the result.
    pub fn resolve(&self, options: &Options) -> Result<Options> {
        for key in options.0.keys() {
            if !self.defined.contains(key) {
                return Err(BlockError::InvalidOptions {
                    key: key.clone(),
                    reason: format!(
                        "the option does not exist, defined options are \"{}\"",
                        self.defined.iter().cloned().collect::<Vec<_>>().join("\", \"")
                    ),
                });
            }
        }

        let mut merged = self.defaults.clone();
        merged.extend(options.0.iter().map(|(k, v)| (k.clone(), v.clone())));

        for key in &self.required {
            if !merged.contains_key(key) {
                return Err(BlockError::InvalidOptions {
                    key: key.clone(),
                    reason: "the required option is missing".to_string(),
                });
            }
        }

        for (key, kinds) in &self.allowed_kinds {
            if let Some(value) = merged.get(key)
                && !kinds.contains(&value.kind())
            {
                let expected: Vec<String> = kinds.iter().map(ToString::to_string).collect();
                return Err(BlockError::InvalidOptions {
                    key: key.clone(),
                    reason: format!(
                        "expected a value of kind \"{}\", got \"{}\"",
                        expected.join("\" or \""),
                        value.kind()
                    ),
                });
            }
        }

        for (key, validators) in &self.validators {
            if let Some(value) = merged.get(key) {
                for (reason, validator) in validators {
                    if !validator(value) {
                        return Err(BlockError::InvalidOptions {
                            key: key.clone(),
                            reason: reason.clone(),
                        });
                    }
                }
            }
        }

        if !self.normalizers.is_empty() {
            let snapshot = Options(merged.clone());
            for (key, normalizer) in &self.normalizers {
                if let Some(value) = merged.remove(key) {
                    merged.insert(key.clone(), normalizer(&snapshot, value));
                }
            }
        }

        Ok(Options(merged))
    }
}
