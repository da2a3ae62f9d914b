//! Finalized blocks and their data model.
//!
//! A block holds its data in three representations:
//!
//! * model data, as handed over by the application
//! * norm data, after the model transformers ran
//! * view data, after the view transformers ran
//!
//! All three are replaced together or not at all.

use std::sync::Arc;

use crate::error::{BlockError, Result, TransformDirection};
use crate::event::{BlockEvent, BlockEvents, EventDispatcher};
use crate::options::Options;
use crate::property_path::PropertyPath;
use crate::resolved::ResolvedBlockType;
use crate::transformer::{SharedTransformer, apply_forward, apply_reverse};
use crate::value::Value;
use crate::view::BlockView;

/// Immutable configuration captured when a builder is finalized.
pub struct BlockConfig {
    name: String,
    block_type: Arc<ResolvedBlockType>,
    options: Options,
    model_transformers: Vec<SharedTransformer>,
    view_transformers: Vec<SharedTransformer>,
    dispatcher: EventDispatcher,
    mapped: bool,
    property_path: Option<PropertyPath>,
}

impl BlockConfig {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: String,
        block_type: Arc<ResolvedBlockType>,
        options: Options,
        model_transformers: Vec<SharedTransformer>,
        view_transformers: Vec<SharedTransformer>,
        dispatcher: EventDispatcher,
        mapped: bool,
        property_path: Option<PropertyPath>,
    ) -> Self {
        Self {
            name,
            block_type,
            options,
            model_transformers,
            view_transformers,
            dispatcher,
            mapped,
            property_path,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn block_type(&self) -> &Arc<ResolvedBlockType> {
        &self.block_type
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn model_transformers(&self) -> &[SharedTransformer] {
        &self.model_transformers
    }

    pub fn view_transformers(&self) -> &[SharedTransformer] {
        &self.view_transformers
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped
    }

    pub fn property_path(&self) -> Option<&PropertyPath> {
        self.property_path.as_ref()
    }
}

pub struct Block {
    config: Arc<BlockConfig>,
    children: Vec<Block>,
    model_data: Value,
    norm_data: Value,
    view_data: Value,
    synchronized: bool,
}

impl Block {
    pub(crate) fn new(config: Arc<BlockConfig>) -> Self {
        Self {
            config,
            children: Vec::new(),
            model_data: Value::Null,
            norm_data: Value::Null,
            view_data: Value::Null,
            synchronized: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &BlockConfig {
        &self.config
    }

    pub fn options(&self) -> &Options {
        &self.config.options
    }

    pub fn is_compound(&self) -> bool {
        self.config.options.get_bool("compound")
    }

    pub fn is_mapped(&self) -> bool {
        self.config.mapped
    }

    /// The explicit property path, or one made from the name.
    pub fn property_path(&self) -> Option<PropertyPath> {
        if let Some(path) = &self.config.property_path {
            return Some(path.clone());
        }
        PropertyPath::parse(self.name()).ok()
    }

    /// Model data.
    pub fn data(&self) -> &Value {
        &self.model_data
    }

    pub fn norm_data(&self) -> &Value {
        &self.norm_data
    }

    pub fn view_data(&self) -> &Value {
        &self.view_data
    }

    pub fn is_empty(&self) -> bool {
        self.model_data.is_empty()
    }

    /// False after a view-data update failed to transform back.
    pub fn is_synchronized(&self) -> bool {
        self.synchronized
    }

    /// Replace the model data and derive norm and view data from it. When
    /// any step fails, this block and all of its children keep their data.
    pub fn set_data(&mut self, data: impl Into<Value>) -> Result<&mut Self> {
        let snapshot = self.snapshot();
        if let Err(err) = self.apply_data(data.into()) {
            self.restore(snapshot);
            return Err(err);
        }
        Ok(self)
    }

    fn apply_data(&mut self, data: Value) -> Result<()> {
        let config = Arc::clone(&self.config);

        let mut event = BlockEvent::new(&config.name, data);
        config.dispatcher.dispatch(BlockEvents::PreSetData, &mut event)?;
        let model = event.into_data();

        let norm = apply_forward(
            &config.model_transformers,
            model.clone(),
            TransformDirection::ModelToNorm,
        )?;
        let view = apply_forward(
            &config.view_transformers,
            norm.clone(),
            TransformDirection::NormToView,
        )?;

        self.model_data = model;
        self.norm_data = norm;
        self.view_data = view;
        self.synchronized = true;

        if config.dispatcher.has_listeners(BlockEvents::PostSetData) {
            let mut event = BlockEvent::new(&config.name, self.model_data.clone());
            config.dispatcher.dispatch(BlockEvents::PostSetData, &mut event)?;
        }

        self.map_data_to_children()
    }

    /// Replace the view data and derive norm and model data from it. On
    /// failure nothing changes and the block is marked unsynchronized.
    pub fn set_view_data(&mut self, view: impl Into<Value>) -> Result<&mut Self> {
        let view = view.into();
        let transformed = apply_reverse(
            &self.config.view_transformers,
            view.clone(),
            TransformDirection::ViewToNorm,
        )
        .and_then(|norm| {
            apply_reverse(
                &self.config.model_transformers,
                norm.clone(),
                TransformDirection::NormToModel,
            )
            .map(|model| (norm, model))
        });

        let (norm, model) = match transformed {
            Ok(pair) => pair,
            Err(err) => {
                self.synchronized = false;
                return Err(err);
            }
        };

        let snapshot = self.snapshot();
        self.model_data = model;
        self.norm_data = norm;
        self.view_data = view;
        self.synchronized = true;

        if let Err(err) = self.map_data_to_children() {
            self.restore(snapshot);
            self.synchronized = false;
            return Err(err);
        }
        Ok(self)
    }

    pub fn children(&self) -> &[Block] {
        &self.children
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Block> {
        self.children.iter().find(|c| c.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Block> {
        self.children.iter_mut().find(|c| c.name() == name)
    }

    /// Attach a finalized child. Its data is taken from this block's view
    /// data when it is mapped and its path resolves.
    pub fn add(&mut self, mut child: Block) -> Result<&mut Self> {
        if self.has(child.name()) {
            return Err(BlockError::DuplicateChildName {
                parent: self.name().to_string(),
                name: child.name().to_string(),
            });
        }

        self.config
            .block_type
            .add_child(&child, self, &self.config.options)?;
        self.map_data_to(&mut child)?;
        self.children.push(child);
        Ok(self)
    }

    pub fn remove(&mut self, name: &str) -> Result<Block> {
        let index = self
            .children
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| BlockError::ChildNotFound {
                parent: self.name().to_string(),
                name: name.to_string(),
            })?;

        self.config
            .block_type
            .remove_child(&self.children[index], self, &self.config.options)?;
        Ok(self.children.remove(index))
    }

    pub fn create_view(&self) -> Result<BlockView> {
        self.create_view_with_parent(None)
    }

    /// Build the view of this block below `parent`. The parent's own build
    /// hooks have already run.
    pub fn create_view_with_parent(&self, parent: Option<&BlockView>) -> Result<BlockView> {
        let block_type = &self.config.block_type;
        let options = &self.config.options;

        let mut view = block_type.create_view(self, parent);
        block_type.build_view(&mut view, self, parent, options)?;

        let children = self
            .children
            .iter()
            .map(|child| child.create_view_with_parent(Some(&view)))
            .collect::<Result<Vec<_>>>()?;
        for child in children {
            view.add_child(child)?;
        }

        block_type.finish_view(&mut view, self, options)?;
        Ok(view)
    }

    fn map_data_to_children(&mut self) -> Result<()> {
        if self.children.is_empty() || !self.is_compound() {
            return Ok(());
        }
        let mut children = std::mem::take(&mut self.children);
        let mapped = children
            .iter_mut()
            .try_for_each(|child| self.map_data_to(child));
        self.children = children;
        mapped
    }

    fn map_data_to(&self, child: &mut Block) -> Result<()> {
        if !child.is_mapped() {
            return Ok(());
        }
        if let Some(path) = child.property_path()
            && let Some(data) = path.get_value(&self.view_data)
        {
            child.set_data(data.clone())?;
        }
        Ok(())
    }

    fn snapshot(&self) -> DataSnapshot {
        DataSnapshot {
            model_data: self.model_data.clone(),
            norm_data: self.norm_data.clone(),
            view_data: self.view_data.clone(),
            synchronized: self.synchronized,
            children: self.children.iter().map(Block::snapshot).collect(),
        }
    }

    fn restore(&mut self, snapshot: DataSnapshot) {
        self.model_data = snapshot.model_data;
        self.norm_data = snapshot.norm_data;
        self.view_data = snapshot.view_data;
        self.synchronized = snapshot.synchronized;
        for (child, snapshot) in self.children.iter_mut().zip(snapshot.children) {
            child.restore(snapshot);
        }
    }
}

/// Data of a block tree, restored when an update fails halfway.
struct DataSnapshot {
    model_data: Value,
    norm_data: Value,
    view_data: Value,
    synchronized: bool,
    children: Vec<DataSnapshot>,
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("name", &self.name())
            .field("type", &self.config.block_type.name())
            .field("data", &self.model_data)
            .field("children", &self.children)
            .finish()
    }
}
