//! Declarative shader building blocks: base stages, replacement rules and the
//! resources they declare.

use std::fmt;

/// Type of a uniform or vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Vector2Float,
    Vector3Float,
    Vector4Float,
    Matrix44Float,
    Float,
    Int,
    UInt,
    Index,
}

impl DataType {
    /// GLSL spelling of the type.
    pub fn glsl_name(self) -> &'static str {
        match self {
            DataType::Vector2Float => "vec2",
            DataType::Vector3Float => "vec3",
            DataType::Vector4Float => "vec4",
            DataType::Matrix44Float => "mat4",
            DataType::Float => "float",
            DataType::Int => "int",
            DataType::UInt | DataType::Index => "uint",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStageType {
    Vertex,
    Geometry,
    Fragment,
}

impl fmt::Display for ShaderStageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStageType::Vertex => "vertex",
            ShaderStageType::Geometry => "geometry",
            ShaderStageType::Fragment => "fragment",
        })
    }
}

/// Primitive assembly used when drawing a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawMode {
    Points,
    LinesAdjacency,
    Triangles,
    TrianglesAdjacency,
    IndexedTriangles,
    Lines,
    IndexedLines,
    IndexedLineStrip,
    IndexedLinesAdjacency,
    IndexedLineStripAdjacency,
}

impl DrawMode {
    pub fn is_indexed(self) -> bool {
        matches!(
            self,
            DrawMode::IndexedTriangles
                | DrawMode::IndexedLines
                | DrawMode::IndexedLineStrip
                | DrawMode::IndexedLinesAdjacency
                | DrawMode::IndexedLineStripAdjacency
        )
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniformSpec {
    pub name: String,
    pub data_type: DataType,
}

impl UniformSpec {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeSpec {
    pub name: String,
    pub data_type: DataType,
    /// Number of consecutive attribute slots; 1 for plain attributes.
    pub array_count: u32,
}

impl AttributeSpec {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self::array(name, data_type, 1)
    }

    pub fn array(name: impl Into<String>, data_type: DataType, array_count: u32) -> Self {
        Self {
            name: name.into(),
            data_type,
            array_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureSpec {
    pub name: String,
    /// Dimensionality: 1, 2 or 3.
    pub dim: u32,
}

impl TextureSpec {
    pub fn new(name: impl Into<String>, dim: u32) -> Self {
        Self {
            name: name.into(),
            dim,
        }
    }
}

// ---------------------------------------------------------------------------
// Stages and rules
// ---------------------------------------------------------------------------

/// One shader stage: its declared resources and a template source containing
/// `${ TOKEN }$` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderStageSpecification {
    pub stage: ShaderStageType,
    pub uniforms: Vec<UniformSpec>,
    pub attributes: Vec<AttributeSpec>,
    pub textures: Vec<TextureSpec>,
    pub source: String,
}

impl ShaderStageSpecification {
    pub fn new(stage: ShaderStageType, source: impl Into<String>) -> Self {
        Self {
            stage,
            uniforms: Vec::new(),
            attributes: Vec::new(),
            textures: Vec::new(),
            source: source.into(),
        }
    }

    pub fn uniform(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.uniforms.push(UniformSpec::new(name, data_type));
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.attributes.push(AttributeSpec::new(name, data_type));
        self
    }

    pub fn texture(mut self, name: impl Into<String>, dim: u32) -> Self {
        self.textures.push(TextureSpec::new(name, dim));
        self
    }
}

/// A named fragment: text for template tokens plus the resources that text
/// relies on.
///
/// ```
/// use vizkit_shaders::{DataType, ShaderReplacementRule};
///
/// let rule = ShaderReplacementRule::new("SHADE_BASECOLOR")
///     .replace("FRAG_DECLARATIONS", "uniform vec3 u_baseColor;")
///     .replace("GENERATE_SHADE_COLOR", "vec3 albedoColor = u_baseColor;")
///     .uniform("u_baseColor", DataType::Vector3Float);
/// assert_eq!(rule.replacement("GENERATE_SHADE_COLOR"), Some("vec3 albedoColor = u_baseColor;"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderReplacementRule {
    pub name: String,
    /// `(token, text)` pairs, in the order they were added.
    pub replacements: Vec<(String, String)>,
    pub uniforms: Vec<UniformSpec>,
    pub attributes: Vec<AttributeSpec>,
    pub textures: Vec<TextureSpec>,
}

impl ShaderReplacementRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replacements: Vec::new(),
            uniforms: Vec::new(),
            attributes: Vec::new(),
            textures: Vec::new(),
        }
    }

    pub fn replace(mut self, token: impl Into<String>, text: impl Into<String>) -> Self {
        self.replacements.push((token.into(), text.into()));
        self
    }

    pub fn uniform(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.uniforms.push(UniformSpec::new(name, data_type));
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.attributes.push(AttributeSpec::new(name, data_type));
        self
    }

    pub fn attribute_array(
        mut self,
        name: impl Into<String>,
        data_type: DataType,
        array_count: u32,
    ) -> Self {
        self.attributes
            .push(AttributeSpec::array(name, data_type, array_count));
        self
    }

    pub fn texture(mut self, name: impl Into<String>, dim: u32) -> Self {
        self.textures.push(TextureSpec::new(name, dim));
        self
    }

    /// First replacement text for `token`, if any.
    pub fn replacement(&self, token: &str) -> Option<&str> {
        self.replacements
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, text)| text.as_str())
    }
}

/// A base program: one specification per stage and how it is drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSpec {
    pub name: String,
    pub stages: Vec<ShaderStageSpecification>,
    pub draw_mode: DrawMode,
}

impl ProgramSpec {
    pub fn new(
        name: impl Into<String>,
        stages: Vec<ShaderStageSpecification>,
        draw_mode: DrawMode,
    ) -> Self {
        Self {
            name: name.into(),
            stages,
            draw_mode,
        }
    }
}
