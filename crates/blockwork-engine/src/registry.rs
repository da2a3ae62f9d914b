//! Type registry: looks types up across extensions and caches resolutions.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, OnceLock};

use log::debug;

use crate::error::{BlockError, Result};
use crate::resolved::ResolvedBlockType;
use crate::types::{BlockType, BlockTypeExtension, TypeGuesser, TypeGuesserChain};

/// A source of types, type extensions and type guessers.
pub trait BlockExtension: Send + Sync {
    fn get_type(&self, name: &str) -> Option<Arc<dyn BlockType>>;

    fn has_type(&self, name: &str) -> bool {
        self.get_type(name).is_some()
    }

    /// Names of the types this extension provides.
    fn type_names(&self) -> BTreeSet<String>;

    /// Extensions for `name`, in registration order.
    fn type_extensions(&self, name: &str) -> Vec<Arc<dyn BlockTypeExtension>>;

    /// Names of the types extended by this extension.
    fn extended_type_names(&self) -> BTreeSet<String>;

    fn type_guesser(&self) -> Option<Arc<dyn TypeGuesser>>;
}

/// Extension holding instances registered up front.
#[derive(Default)]
pub struct PreloadedExtension {
    types: BTreeMap<String, Arc<dyn BlockType>>,
    aliases: BTreeMap<String, String>,
    extensions: BTreeMap<String, Vec<Arc<dyn BlockTypeExtension>>>,
    guessers: Vec<Arc<dyn TypeGuesser>>,
}

impl PreloadedExtension {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type under its name, also reachable by its Rust type path.
    pub fn add_type<T: BlockType + 'static>(mut self, block_type: T) -> Self {
        let alias = std::any::type_name::<T>().to_string();
        let name = block_type.name().to_string();
        self.aliases.insert(alias, name);
        self.add_shared_type(Arc::new(block_type))
    }

    pub fn add_shared_type(mut self, block_type: Arc<dyn BlockType>) -> Self {
        self.types.insert(block_type.name().to_string(), block_type);
        self
    }

    pub fn add_type_extension<E: BlockTypeExtension + 'static>(self, extension: E) -> Self {
        self.add_shared_type_extension(Arc::new(extension))
    }

    pub fn add_shared_type_extension(mut self, extension: Arc<dyn BlockTypeExtension>) -> Self {
        self.extensions
            .entry(extension.extended_type().to_string())
            .or_default()
            .push(extension);
        self
    }

    pub fn add_type_guesser(mut self, guesser: Arc<dyn TypeGuesser>) -> Self {
        self.guessers.push(guesser);
        self
    }
}

impl BlockExtension for PreloadedExtension {
    fn get_type(&self, name: &str) -> Option<Arc<dyn BlockType>> {
        let name = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        self.types.get(name).cloned()
    }

    fn type_names(&self) -> BTreeSet<String> {
        self.types.keys().cloned().collect()
    }

    fn type_extensions(&self, name: &str) -> Vec<Arc<dyn BlockTypeExtension>> {
        self.extensions.get(name).cloned().unwrap_or_default()
    }

    fn extended_type_names(&self) -> BTreeSet<String> {
        self.extensions.keys().cloned().collect()
    }

    fn type_guesser(&self) -> Option<Arc<dyn TypeGuesser>> {
        match self.guessers.len() {
            0 => None,
            1 => self.guessers.first().cloned(),
            _ => Some(Arc::new(TypeGuesserChain::new(self.guessers.clone()))),
        }
    }
}

type ResolvedCache = HashMap<String, Arc<ResolvedBlockType>>;

/// Canonical type name to the (extension index, extended type name) pairs
/// holding its type extensions.
type ExtendedTypes = HashMap<String, Vec<(usize, String)>>;

pub struct BlockRegistry {
    extensions: Vec<Box<dyn BlockExtension>>,
    extended: ExtendedTypes,
    resolved: Mutex<ResolvedCache>,
    guesser: OnceLock<Option<Arc<dyn TypeGuesser>>>,
}

impl BlockRegistry {
    /// Every extended type must be provided by one of the extensions. Type
    /// extensions may name their type by an alias.
    pub fn new(extensions: Vec<Box<dyn BlockExtension>>) -> Result<Self> {
        let mut extended = ExtendedTypes::new();
        for (index, extension) in extensions.iter().enumerate() {
            for name in extension.extended_type_names() {
                let target = extensions
                    .iter()
                    .find_map(|e| e.get_type(&name))
                    .ok_or_else(|| {
                        BlockError::InvalidArgument(format!(
                            "a type extension targets the type \"{name}\", which is not registered"
                        ))
                    })?;
                extended
                    .entry(target.name().to_string())
                    .or_default()
                    .push((index, name));
            }
        }

        debug!("block registry created with {} extension(s)", extensions.len());
        Ok(Self {
            extensions,
            extended,
            resolved: Mutex::new(HashMap::new()),
            guesser: OnceLock::new(),
        })
    }

    pub fn extensions(&self) -> &[Box<dyn BlockExtension>] {
        &self.extensions
    }

    /// Resolve `name`, returning the same instance for every call.
    pub fn resolve_type(&self, name: &str) -> Result<Arc<ResolvedBlockType>> {
        let mut cache = self.resolved.lock().unwrap_or_else(|e| e.into_inner());
        let mut stack = Vec::new();
        self.resolve_locked(&mut cache, name, &mut stack)
    }

    pub fn has_type(&self, name: &str) -> bool {
        {
            let cache = self.resolved.lock().unwrap_or_else(|e| e.into_inner());
            if cache.contains_key(name) {
                return true;
            }
        }
        self.find_type(name).is_some() && self.resolve_type(name).is_ok()
    }

    pub fn list_registered_type_names(&self) -> BTreeSet<String> {
        self.extensions
            .iter()
            .flat_map(|e| e.type_names())
            .collect()
    }

    /// Guesser combining the guessers of all extensions.
    pub fn type_guesser(&self) -> Option<Arc<dyn TypeGuesser>> {
        self.guesser
            .get_or_init(|| {
                let guessers: Vec<_> = self
                    .extensions
                    .iter()
                    .filter_map(|e| e.type_guesser())
                    .collect();
                (!guessers.is_empty())
                    .then(|| Arc::new(TypeGuesserChain::new(guessers)) as Arc<dyn TypeGuesser>)
            })
            .clone()
    }

    fn find_type(&self, name: &str) -> Option<Arc<dyn BlockType>> {
        self.extensions.iter().find_map(|e| e.get_type(name))
    }

    fn resolve_locked(
        &self,
        cache: &mut ResolvedCache,
        name: &str,
        stack: &mut Vec<String>,
    ) -> Result<Arc<ResolvedBlockType>> {
        if let Some(resolved) = cache.get(name) {
            return Ok(Arc::clone(resolved));
        }

        let inner = self
            .find_type(name)
            .ok_or_else(|| BlockError::UnknownType(name.to_string()))?;
        let canonical = inner.name().to_string();

        // looked up through an alias
        if let Some(resolved) = cache.get(&canonical) {
            let resolved = Arc::clone(resolved);
            cache.insert(name.to_string(), Arc::clone(&resolved));
            return Ok(resolved);
        }

        if stack.contains(&canonical) {
            let mut chain = stack.clone();
            chain.push(canonical.clone());
            return Err(BlockError::CircularParent {
                name: canonical,
                chain,
            });
        }

        stack.push(canonical.clone());
        let parent = match inner.parent() {
            Some(parent) => Some(self.resolve_locked(cache, parent, stack)?),
            None => None,
        };
        stack.pop();

        let extensions: Vec<_> = self
            .extended
            .get(&canonical)
            .into_iter()
            .flatten()
            .flat_map(|(index, name)| self.extensions[*index].type_extensions(name))
            .collect();

        debug!(
            "resolved block type \"{canonical}\" with {} extension(s)",
            extensions.len()
        );
        let resolved = Arc::new(ResolvedBlockType::new(inner, parent, extensions));
        cache.insert(canonical.clone(), Arc::clone(&resolved));
        if name != canonical {
            cache.insert(name.to_string(), Arc::clone(&resolved));
        }
        Ok(resolved)
    }
}

impl std::fmt::Debug for BlockRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockRegistry")
            .field("types", &self.list_registered_type_names())
            .field("extensions", &self.extensions.len())
            .finish()
    }
}
