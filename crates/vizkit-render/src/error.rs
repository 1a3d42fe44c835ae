use vizkit_core::WeakHandleError;
use vizkit_shaders::{ComposeError, DataType};

/// Failure to acquire, configure or draw a shader program, or to manage the
/// structures that use them.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no shader program named `{name}`")]
    UnknownProgram { name: String },

    #[error("shader program `{name}` is already registered")]
    DuplicateProgram { name: String },

    /// Composition failed; names the program and the full rule list involved.
    #[error("failed to compose shader program `{program}` with rules [{}]", .rules.join(", "))]
    Compose {
        program: String,
        rules: Vec<String>,
        #[source]
        source: ComposeError,
    },

    #[error("backend failed to compile shader program `{program}`")]
    Backend {
        program: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Rules(#[from] ComposeError),

    #[error("shader program `{program}` has no uniform `{name}`")]
    UnknownUniform { program: String, name: String },

    #[error("shader program `{program}` has no attribute `{name}`")]
    UnknownAttribute { program: String, name: String },

    #[error("shader program `{program}` has no texture `{name}`")]
    UnknownTexture { program: String, name: String },

    #[error("uniform `{name}` of `{program}` is {expected}, got a {actual} value")]
    UniformTypeMismatch {
        program: String,
        name: String,
        expected: DataType,
        actual: DataType,
    },

    #[error("texture `{name}` of `{program}` is {expected}D, got a {actual}D texture")]
    TextureDimensionMismatch {
        program: String,
        name: String,
        expected: u32,
        actual: u32,
    },

    #[error("shader program `{program}` is missing {what} `{name}`")]
    MissingData {
        program: String,
        what: &'static str,
        name: String,
    },

    #[error("attribute `{name}` of `{program}` has {actual} elements, expected {expected}")]
    InconsistentAttributes {
        program: String,
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("no {type_name} named `{name}` is registered")]
    UnknownStructure { type_name: String, name: String },

    #[error("a {type_name} named `{name}` is already registered")]
    DuplicateStructure { type_name: String, name: String },

    #[error(transparent)]
    WeakHandle(#[from] WeakHandleError),
}
