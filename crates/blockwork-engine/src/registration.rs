//! Registration pass: turns tagged service definitions into the arguments of
//! a [`DependencyInjectionExtension`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use log::debug;

use crate::error::{BlockError, Result};
use crate::registry::BlockExtension;
use crate::types::{BlockType, BlockTypeExtension, TypeGuesser, TypeGuesserChain};

pub const TYPE_TAG: &str = "blockwork.type";
pub const TYPE_EXTENSION_TAG: &str = "blockwork.type_extension";
pub const TYPE_GUESSER_TAG: &str = "blockwork.type_guesser";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceTag {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
}

impl ServiceTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDefinition {
    pub id: String,
    pub class: String,
    pub public: bool,
    pub tags: Vec<ServiceTag>,
}

impl ServiceDefinition {
    pub fn new(id: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            class: class.into(),
            public: true,
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: ServiceTag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn with_public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }
}

/// Service definitions in registration order.
#[derive(Debug, Clone, Default)]
pub struct ServiceDefinitions {
    definitions: Vec<ServiceDefinition>,
}

impl ServiceDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, definition: ServiceDefinition) -> &mut Self {
        self.definitions.retain(|d| d.id != definition.id);
        self.definitions.push(definition);
        self
    }

    pub fn get(&self, id: &str) -> Option<&ServiceDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceDefinition> {
        self.definitions.iter()
    }

    /// Services carrying `tag`, each with the first matching tag instance.
    pub fn find_tagged_service_ids(&self, tag: &str) -> Vec<(&ServiceDefinition, &ServiceTag)> {
        self.definitions
            .iter()
            .filter_map(|d| d.tags.iter().find(|t| t.name == tag).map(|t| (d, t)))
            .collect()
    }
}

impl FromIterator<ServiceDefinition> for ServiceDefinitions {
    fn from_iter<I: IntoIterator<Item = ServiceDefinition>>(iter: I) -> Self {
        let mut definitions = Self::new();
        for definition in iter {
            definitions.add(definition);
        }
        definitions
    }
}

/// What the registration pass hands to the dependency injection extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockExtensionArguments {
    /// Class name to service id.
    pub types: BTreeMap<String, String>,
    /// Extended type name to service ids, in registration order.
    pub type_extensions: BTreeMap<String, Vec<String>>,
    pub type_guessers: Vec<String>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BlockPass;

impl BlockPass {
    pub fn process(&self, definitions: &ServiceDefinitions) -> Result<BlockExtensionArguments> {
        let mut arguments = BlockExtensionArguments::default();

        for (definition, _) in definitions.find_tagged_service_ids(TYPE_TAG) {
            require_public(definition, "types")?;
            arguments
                .types
                .insert(definition.class.clone(), definition.id.clone());
        }

        for (definition, tag) in definitions.find_tagged_service_ids(TYPE_EXTENSION_TAG) {
            require_public(definition, "type extensions")?;
            let extended = tag
                .attribute("extended_type")
                .or_else(|| tag.attribute("extended-type"))
                .ok_or_else(|| {
                    BlockError::InvalidArgument(format!(
                        "Tagged block type extension must have the extended type configured using the \
                         extended_type/extended-type attribute, none was configured for the \"{}\" service",
                        definition.id
                    ))
                })?;
            arguments
                .type_extensions
                .entry(extended.to_string())
                .or_default()
                .push(definition.id.clone());
        }

        for (definition, _) in definitions.find_tagged_service_ids(TYPE_GUESSER_TAG) {
            require_public(definition, "type guessers")?;
            arguments.type_guessers.push(definition.id.clone());
        }

        debug!(
            "registration pass collected {} type(s), {} extended type(s), {} guesser(s)",
            arguments.types.len(),
            arguments.type_extensions.len(),
            arguments.type_guessers.len()
        );
        Ok(arguments)
    }
}

fn require_public(definition: &ServiceDefinition, kind: &str) -> Result<()> {
    if !definition.public {
        return Err(BlockError::InvalidArgument(format!(
            "The service \"{}\" must be public as block {kind} are lazy-loaded",
            definition.id
        )));
    }
    Ok(())
}

/// Instantiates services by id.
pub trait ServiceLocator {
    fn block_type(&self, id: &str) -> Option<Arc<dyn BlockType>>;

    fn type_extension(&self, id: &str) -> Option<Arc<dyn BlockTypeExtension>>;

    fn type_guesser(&self, id: &str) -> Option<Arc<dyn TypeGuesser>>;
}

/// A [`ServiceLocator`] over instances registered up front.
#[derive(Default)]
pub struct ServiceMap {
    types: BTreeMap<String, Arc<dyn BlockType>>,
    type_extensions: BTreeMap<String, Arc<dyn BlockTypeExtension>>,
    type_guessers: BTreeMap<String, Arc<dyn TypeGuesser>>,
}

impl ServiceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, id: impl Into<String>, block_type: Arc<dyn BlockType>) -> Self {
        self.types.insert(id.into(), block_type);
        self
    }

    pub fn with_type_extension(
        mut self,
        id: impl Into<String>,
        extension: Arc<dyn BlockTypeExtension>,
    ) -> Self {
        self.type_extensions.insert(id.into(), extension);
        self
    }

    pub fn with_type_guesser(mut self, id: impl Into<String>, guesser: Arc<dyn TypeGuesser>) -> Self {
        self.type_guessers.insert(id.into(), guesser);
        self
    }
}

impl ServiceLocator for ServiceMap {
    fn block_type(&self, id: &str) -> Option<Arc<dyn BlockType>> {
        self.types.get(id).cloned()
    }

    fn type_extension(&self, id: &str) -> Option<Arc<dyn BlockTypeExtension>> {
        self.type_extensions.get(id).cloned()
    }

    fn type_guesser(&self, id: &str) -> Option<Arc<dyn TypeGuesser>> {
        self.type_guessers.get(id).cloned()
    }
}

fn unresolvable(id: &str) -> BlockError {
    BlockError::InvalidArgument(format!("The service \"{id}\" cannot be resolved"))
}

/// Extension backed by registered services. Types are reachable by their
/// class name and by their type name.
pub struct DependencyInjectionExtension {
    types: BTreeMap<String, Arc<dyn BlockType>>,
    classes: BTreeMap<String, String>,
    type_extensions: BTreeMap<String, Vec<Arc<dyn BlockTypeExtension>>>,
    guesser: Option<Arc<dyn TypeGuesser>>,
}

impl DependencyInjectionExtension {
    pub fn new(locator: &dyn ServiceLocator, arguments: &BlockExtensionArguments) -> Result<Self> {
        let mut types = BTreeMap::new();
        let mut classes = BTreeMap::new();
        for (class, id) in &arguments.types {
            let block_type = locator.block_type(id).ok_or_else(|| unresolvable(id))?;
            classes.insert(class.clone(), block_type.name().to_string());
            types.insert(block_type.name().to_string(), block_type);
        }

        let mut type_extensions = BTreeMap::new();
        for (extended, ids) in &arguments.type_extensions {
            let extensions = ids
                .iter()
                .map(|id| locator.type_extension(id).ok_or_else(|| unresolvable(id)))
                .collect::<Result<Vec<_>>>()?;
            type_extensions.insert(extended.clone(), extensions);
        }

        let guessers = arguments
            .type_guessers
            .iter()
            .map(|id| locator.type_guesser(id).ok_or_else(|| unresolvable(id)))
            .collect::<Result<Vec<_>>>()?;
        let guesser = (!guessers.is_empty())
            .then(|| Arc::new(TypeGuesserChain::new(guessers)) as Arc<dyn TypeGuesser>);

        Ok(Self {
            types,
            classes,
            type_extensions,
            guesser,
        })
    }
}

impl BlockExtension for DependencyInjectionExtension {
    fn get_type(&self, name: &str) -> Option<Arc<dyn BlockType>> {
        let name = self.classes.get(name).map(String::as_str).unwrap_or(name);
        self.types.get(name).cloned()
    }

    fn type_names(&self) -> BTreeSet<String> {
        self.types.keys().cloned().collect()
    }

    fn type_extensions(&self, name: &str) -> Vec<Arc<dyn BlockTypeExtension>> {
        self.type_extensions.get(name).cloned().unwrap_or_default()
    }

    fn extended_type_names(&self) -> BTreeSet<String> {
        self.type_extensions.keys().cloned().collect()
    }

    fn type_guesser(&self) -> Option<Arc<dyn TypeGuesser>> {
        self.guesser.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::NamedType;
    use crate::types::BlockHooks;
    use pretty_assertions::assert_eq;

    fn definitions() -> ServiceDefinitions {
        [
            ServiceDefinition::new("app.type.checkbox", "app::CheckboxType")
                .with_tag(ServiceTag::new(TYPE_TAG)),
            ServiceDefinition::new("app.ext.help", "app::HelpExtension").with_tag(
                ServiceTag::new(TYPE_EXTENSION_TAG).with_attribute("extended_type", "checkbox"),
            ),
            ServiceDefinition::new("app.ext.icon", "app::IconExtension").with_tag(
                ServiceTag::new(TYPE_EXTENSION_TAG).with_attribute("extended-type", "checkbox"),
            ),
            ServiceDefinition::new("app.guesser", "app::Guesser")
                .with_tag(ServiceTag::new(TYPE_GUESSER_TAG)),
            ServiceDefinition::new("app.untagged", "app::Other"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn collects_tagged_services() {
        let arguments = BlockPass.process(&definitions()).unwrap();
        assert_eq!(
            arguments,
            BlockExtensionArguments {
                types: BTreeMap::from([(
                    "app::CheckboxType".to_string(),
                    "app.type.checkbox".to_string()
                )]),
                type_extensions: BTreeMap::from([(
                    "checkbox".to_string(),
                    vec!["app.ext.help".to_string(), "app.ext.icon".to_string()]
                )]),
                type_guessers: vec!["app.guesser".to_string()],
            }
        );
    }

    #[test]
    fn extension_without_extended_type_is_rejected() {
        let definitions: ServiceDefinitions = [ServiceDefinition::new("app.ext", "app::Ext")
            .with_tag(ServiceTag::new(TYPE_EXTENSION_TAG))]
        .into_iter()
        .collect();

        let err = BlockPass.process(&definitions).unwrap_err();
        assert!(matches!(&err, BlockError::InvalidArgument(msg) if msg.contains("\"app.ext\"")));
    }

    #[test]
    fn private_services_are_rejected() {
        let definitions: ServiceDefinitions = [ServiceDefinition::new("app.type", "app::Type")
            .with_public(false)
            .with_tag(ServiceTag::new(TYPE_TAG))]
        .into_iter()
        .collect();

        assert!(matches!(
            BlockPass.process(&definitions),
            Err(BlockError::InvalidArgument(_))
        ));
    }

    struct Noop;

    impl BlockHooks for Noop {}

    impl BlockTypeExtension for Noop {
        fn extended_type(&self) -> &str {
            "checkbox"
        }
    }

    #[test]
    fn extension_resolves_types_by_class_and_name() {
        let arguments = BlockPass.process(&definitions()).unwrap();
        let arguments = BlockExtensionArguments {
            type_guessers: Vec::new(),
            ..arguments
        };
        let locator = ServiceMap::new()
            .with_type("app.type.checkbox", Arc::new(NamedType::new("checkbox", None)))
            .with_type_extension("app.ext.help", Arc::new(Noop))
            .with_type_extension("app.ext.icon", Arc::new(Noop));

        let extension = DependencyInjectionExtension::new(&locator, &arguments).unwrap();
        assert!(extension.has_type("checkbox"));
        assert!(extension.has_type("app::CheckboxType"));
        assert_eq!(extension.type_extensions("checkbox").len(), 2);
        assert!(extension.type_guesser().is_none());
    }

    #[test]
    fn unresolvable_service_is_rejected() {
        let arguments = BlockPass.process(&definitions()).unwrap();
        let err = DependencyInjectionExtension::new(&ServiceMap::new(), &arguments).err();
        assert_eq!(
            err,
            Some(BlockError::InvalidArgument(
                "The service \"app.type.checkbox\" cannot be resolved".to_string()
            ))
        );
    }
}
