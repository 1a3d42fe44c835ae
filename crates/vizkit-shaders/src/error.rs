use std::fmt;

use crate::dialect::Dialect;
use crate::template::TemplateError;
use crate::types::ShaderStageType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Uniform,
    Attribute,
    Texture,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::Uniform => "uniform",
            ResourceKind::Attribute => "attribute",
            ResourceKind::Texture => "texture",
        })
    }
}

/// Failure to build a shader from a base specification and a rule list.
///
/// Every variant aborts the whole composition; no partial result is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComposeError {
    #[error("no shader rule named `{name}` in the {dialect} rule set")]
    UnknownRule { name: String, dialect: Dialect },

    #[error("shader rule `{name}` is already registered")]
    DuplicateRule { name: String },

    /// Two contributors declare the same resource with different types.
    #[error("{kind} `{name}` is {existing}, but {contributor} declares it as {requested}")]
    ConflictingResource {
        kind: ResourceKind,
        name: String,
        existing: String,
        requested: String,
        contributor: String,
    },

    #[error("malformed {stage} shader template")]
    MalformedTemplate {
        stage: ShaderStageType,
        #[source]
        source: TemplateError,
    },
}
