use uuid::Uuid;

use crate::options::Options;

/// A name no other block will carry.
pub fn create_unique_name() -> String {
    format!("block{}", Uuid::new_v4().simple())
}

/// The `block_name` option, else the `id` option, else a unique name.
pub fn block_name(options: &Options) -> String {
    options
        .get_str("block_name")
        .or_else(|| options.get_str("id"))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(create_unique_name)
}
