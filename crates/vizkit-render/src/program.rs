//! Logical shader program handles.
//!
//! A [`CompiledProgram`] is shared by every requester of the same
//! `(program, rules)` combination. Each requester gets its own
//! [`ShaderProgram`], which tracks the uniform values, attribute buffers and
//! textures bound to that instance and checks them against the declarations
//! of the composition.

use std::collections::HashMap;
use std::rc::Rc;

use vizkit_shaders::{ComposedProgram, DataType, DrawMode};

use crate::backend::BackendProgramId;
use crate::error::RenderError;

/// A composed program and its backend ID.
#[derive(Debug)]
pub struct CompiledProgram {
    composed: ComposedProgram,
    backend_id: BackendProgramId,
}

impl CompiledProgram {
    pub(crate) fn new(composed: ComposedProgram, backend_id: BackendProgramId) -> Self {
        Self {
            composed,
            backend_id,
        }
    }

    pub fn composed(&self) -> &ComposedProgram {
        &self.composed
    }

    pub fn backend_id(&self) -> BackendProgramId {
        self.backend_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    UInt(u32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([[f32; 4]; 4]),
}

impl UniformValue {
    pub fn data_type(&self) -> DataType {
        match self {
            UniformValue::Float(_) => DataType::Float,
            UniformValue::Int(_) => DataType::Int,
            UniformValue::UInt(_) => DataType::UInt,
            UniformValue::Vec2(_) => DataType::Vector2Float,
            UniformValue::Vec3(_) => DataType::Vector3Float,
            UniformValue::Vec4(_) => DataType::Vector4Float,
            UniformValue::Mat4(_) => DataType::Matrix44Float,
        }
    }

    fn fits(&self, declared: DataType) -> bool {
        match (self, declared) {
            (UniformValue::UInt(_), DataType::Index) => true,
            _ => self.data_type() == declared,
        }
    }
}

/// A texture bound to a program, identified by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureRef {
    pub id: u64,
    pub dim: u32,
}

/// Per-instance view of a compiled program.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    compiled: Rc<CompiledProgram>,
    uniforms: HashMap<String, UniformValue>,
    attributes: HashMap<String, usize>,
    textures: HashMap<String, TextureRef>,
    index_count: Option<usize>,
}

impl ShaderProgram {
    pub(crate) fn new(compiled: Rc<CompiledProgram>) -> Self {
        Self {
            compiled,
            uniforms: HashMap::new(),
            attributes: HashMap::new(),
            textures: HashMap::new(),
            index_count: None,
        }
    }

    pub fn compiled(&self) -> &Rc<CompiledProgram> {
        &self.compiled
    }

    pub fn composed(&self) -> &ComposedProgram {
        self.compiled.composed()
    }

    pub fn name(&self) -> &str {
        &self.composed().program
    }

    /// Rules the program was composed with, defaults included.
    pub fn rules(&self) -> &[String] {
        &self.composed().rules
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.composed().draw_mode
    }

    pub fn has_uniform(&self, name: &str) -> bool {
        self.composed().uniform(name).is_some()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.composed().attribute(name).is_some()
    }

    pub fn has_texture(&self, name: &str) -> bool {
        self.composed().texture(name).is_some()
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(name)
    }

    pub fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), RenderError> {
        let declared = self
            .composed()
            .uniform(name)
            .ok_or_else(|| RenderError::UnknownUniform {
                program: self.name().to_string(),
                name: name.to_string(),
            })?
            .data_type;
        if !value.fits(declared) {
            return Err(RenderError::UniformTypeMismatch {
                program: self.name().to_string(),
                name: name.to_string(),
                expected: declared,
                actual: value.data_type(),
            });
        }
        self.uniforms.insert(name.to_string(), value);
        Ok(())
    }

    /// Record that attribute `name` has a buffer of `len` elements.
    pub fn set_attribute(&mut self, name: &str, len: usize) -> Result<(), RenderError> {
        if !self.has_attribute(name) {
            return Err(RenderError::UnknownAttribute {
                program: self.name().to_string(),
                name: name.to_string(),
            });
        }
        self.attributes.insert(name.to_string(), len);
        Ok(())
    }

    pub fn set_texture(&mut self, name: &str, texture: TextureRef) -> Result<(), RenderError> {
        let declared = self
            .composed()
            .texture(name)
            .ok_or_else(|| RenderError::UnknownTexture {
                program: self.name().to_string(),
                name: name.to_string(),
            })?
            .dim;
        if declared != texture.dim {
            return Err(RenderError::TextureDimensionMismatch {
                program: self.name().to_string(),
                name: name.to_string(),
                expected: declared,
                actual: texture.dim,
            });
        }
        self.textures.insert(name.to_string(), texture);
        Ok(())
    }

    /// Record the index buffer length for indexed draw modes.
    pub fn set_index(&mut self, len: usize) {
        self.index_count = Some(len);
    }

    /// Check that every declared input is set and that attribute buffers
    /// agree in length. Returns the number of vertices per attribute.
    pub fn validate_data(&self) -> Result<usize, RenderError> {
        let composed = self.composed();
        let missing = |what, name: &str| RenderError::MissingData {
            program: composed.program.clone(),
            what,
            name: name.to_string(),
        };

        for uniform in &composed.uniforms {
            if !self.uniforms.contains_key(&uniform.name) {
                return Err(missing("uniform", &uniform.name));
            }
        }
        for texture in &composed.textures {
            if !self.textures.contains_key(&texture.name) {
                return Err(missing("texture", &texture.name));
            }
        }

        let mut vertex_count = None;
        for attribute in &composed.attributes {
            let len = *self
                .attributes
                .get(&attribute.name)
                .ok_or_else(|| missing("attribute", &attribute.name))?;
            match vertex_count {
                None => vertex_count = Some(len),
                Some(expected) if expected != len => {
                    return Err(RenderError::InconsistentAttributes {
                        program: composed.program.clone(),
                        name: attribute.name.clone(),
                        expected,
                        actual: len,
                    });
                }
                Some(_) => {}
            }
        }

        if composed.draw_mode.is_indexed() && self.index_count.is_none() {
            return Err(missing("index buffer", "indices"));
        }

        Ok(vertex_count.unwrap_or(0))
    }
}
