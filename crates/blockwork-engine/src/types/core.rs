use std::collections::BTreeMap;

use super::{BlockHooks, BlockType};
use crate::block::Block;
use crate::builder::BlockBuilder;
use crate::error::{BlockError, Result};
use crate::options::{Options, OptionsResolver};
use crate::property_path::PropertyPath;
use crate::registry::PreloadedExtension;
use crate::value::{Value, ValueKind};
use crate::view::BlockView;

/// Name of the root type every other type descends from.
pub const BASE_TYPE: &str = "block";

/// Extension holding the built-in `block` and `raw` types.
pub fn core_extension() -> PreloadedExtension {
    PreloadedExtension::new()
        .add_type(BaseType)
        .add_type(RawType)
}

/// The root `block` type.
#[derive(Debug, Default, Clone, Copy)]
pub struct BaseType;

impl BlockHooks for BaseType {
    fn configure_options(&self, resolver: &mut OptionsResolver) {
        resolver
            .set_defaults([
                ("block_name", Value::Null),
                ("id", Value::Null),
                ("empty_data", Value::Null),
                ("compound", Value::Bool(true)),
                ("mapped", Value::Bool(true)),
                ("property_path", Value::Null),
                ("label", Value::Null),
                ("attr", Value::Map(BTreeMap::new())),
            ])
            .set_defined("data")
            .set_allowed_kinds("block_name", &[ValueKind::Null, ValueKind::String])
            .set_allowed_kinds("id", &[ValueKind::Null, ValueKind::String])
            .set_allowed_kinds(
                "empty_data",
                &[
                    ValueKind::Null,
                    ValueKind::Bool,
                    ValueKind::Int,
                    ValueKind::Float,
                    ValueKind::String,
                    ValueKind::List,
                    ValueKind::Map,
                ],
            )
            .set_allowed_kinds("compound", &[ValueKind::Bool])
            .set_allowed_kinds("mapped", &[ValueKind::Bool])
            .set_allowed_kinds("property_path", &[ValueKind::Null, ValueKind::String])
            .set_allowed_kinds(
                "label",
                &[ValueKind::Null, ValueKind::String, ValueKind::Callable],
            )
            .set_allowed_kinds("attr", &[ValueKind::Map])
            .add_validator("property_path", "must be a valid property path", |v| {
                v.as_str().is_none_or(|path| PropertyPath::parse(path).is_ok())
            });
    }

    fn build_block(&self, builder: &mut BlockBuilder, options: &Options) -> Result<()> {
        builder.set_mapped(options.get_bool("mapped"))?;

        if let Some(path) = options.get_str("property_path") {
            builder.set_property_path(Some(PropertyPath::parse(path)?))?;
        }

        // data set on the builder directly wins over the option
        if let Some(data) = options.get("data")
            && !builder.has_data()
        {
            builder.set_data(data.clone())?;
        }

        let empty_data = options.value("empty_data");
        if !builder.has_data() && !empty_data.is_null() {
            builder.set_data(empty_data.clone())?;
        }

        Ok(())
    }

    fn build_view(
        &self,
        view: &mut BlockView,
        block: &Block,
        parent: Option<&BlockView>,
        options: &Options,
    ) -> Result<()> {
        let name = block.name();

        let (mut id, full_name, unique_block_prefix) = match parent {
            Some(parent) => (
                format!("{}_{name}", parent.var_str("id")),
                format!("{}[{name}]", parent.var_str("full_name")),
                format!("{}_{name}", parent.var_str("unique_block_prefix")),
            ),
            None => (name.to_string(), name.to_string(), format!("_{name}")),
        };
        if let Some(explicit) = options.get_str("id") {
            id = explicit.to_string();
        }

        let block_type = block.config().block_type();
        let mut prefixes: Vec<Value> = block_type
            .block_prefixes()
            .iter()
            .map(|p| Value::from(p.as_str()))
            .collect();
        prefixes.push(Value::from(unique_block_prefix.as_str()));

        let view_data = block.view_data();
        let value = if view_data.is_scalar() || view_data.is_null() {
            Value::from(view_data.to_canonical_string())
        } else {
            view_data.clone()
        };

        view.set_var("id", id);
        view.set_var("name", name);
        view.set_var("full_name", full_name);
        view.set_var("block_prefixes", Value::List(prefixes));
        view.set_var(
            "cache_key",
            format!("{unique_block_prefix}_{}", block_type.name()),
        );
        view.set_var("unique_block_prefix", unique_block_prefix);
        view.set_var("value", value);
        view.set_var("data", block.norm_data().clone());
        view.set_var("label", options.value("label").clone());
        view.set_var("attr", options.value("attr").clone());
        view.set_var("compound", block.is_compound());

        Ok(())
    }

    fn add_child(&self, _child: &Block, block: &Block, options: &Options) -> Result<()> {
        if !options.get_bool("compound") {
            return Err(BlockError::NotCompound(block.name().to_string()));
        }
        Ok(())
    }
}

impl BlockType for BaseType {
    fn name(&self) -> &str {
        BASE_TYPE
    }

    fn parent(&self) -> Option<&str> {
        None
    }
}

/// A simple leaf block rendering its data as-is.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawType;

impl BlockHooks for RawType {
    fn configure_options(&self, resolver: &mut OptionsResolver) {
        resolver.set_default("compound", false);
    }
}

impl BlockType for RawType {
    fn name(&self) -> &str {
        "raw"
    }
}
