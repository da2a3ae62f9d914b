use std::collections::BTreeSet;

/// Name of the generic block tag and function.
pub const SBLOCK: &str = "sblock";

/// Prefix of the shorthand tags and functions that imply a block type.
pub const SHORTHAND_PREFIX: &str = "sblock_";

/// The block tags a template may use: `sblock` plus one `sblock_<type>`
/// shorthand per known block type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSet {
    shorthand_types: BTreeSet<String>,
}

impl Default for TagSet {
    fn default() -> Self {
        Self::new(std::iter::empty::<&str>())
    }
}

impl TagSet {
    pub fn new<I, S>(type_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            shorthand_types: type_names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        tag == SBLOCK || self.shorthand_type(tag).is_some()
    }

    /// The block type a shorthand tag implies, if it is a known shorthand.
    pub fn shorthand_type<'t>(&self, tag: &'t str) -> Option<&'t str> {
        tag.strip_prefix(SHORTHAND_PREFIX)
            .filter(|t| self.shorthand_types.contains(*t))
    }

    /// Every tag name, generic tag first.
    pub fn tag_names(&self) -> Vec<String> {
        std::iter::once(SBLOCK.to_string())
            .chain(
                self.shorthand_types
                    .iter()
                    .map(|t| format!("{SHORTHAND_PREFIX}{t}")),
            )
            .collect()
    }
}
