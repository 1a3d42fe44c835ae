//! Shader acquisition and scene bookkeeping for the viewer.
//!
//! This crate ties together [`vizkit_core`] (handles, persistent values,
//! options) and [`vizkit_shaders`] (rule composition) into the surface the
//! rest of the viewer draws through.
//!
//! # Overview
//!
//! - [`Engine`] owns the rule registry, the base programs and the program
//!   cache. [`Engine::request_shader`] is the one way to get a program.
//! - [`DefaultsPolicy`] selects the rules implicitly prepended to a request.
//! - [`ProgramBackend`] compiles composed programs; [`RecordingBackend`]
//!   keeps them for inspection instead.
//! - [`ShaderProgram`] is a per-requester handle that checks uniform,
//!   attribute and texture assignments against the composition.
//! - [`FullscreenArtists`] tracks, without owning, the objects that may draw
//!   fullscreen.
//! - [`StructureRegistry`] owns the scene's [`SceneArtist`]s and runs
//!   per-frame preparation.
//!
//! ```
//! use vizkit_core::Options;
//! use vizkit_render::{DefaultsPolicy, Engine, RecordingBackend};
//! use vizkit_shaders::builtin::{names, program_names};
//!
//! let mut engine = Engine::new(Options::default(), RecordingBackend::new());
//! let rules = [names::SHADE_BASECOLOR];
//! let program = engine
//!     .request_shader(program_names::MESH, &rules, DefaultsPolicy::SceneObject)
//!     .unwrap();
//! assert!(program.has_uniform("u_baseColor"));
//! ```

pub mod artist;
pub mod backend;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod program;
pub mod structure;

pub use artist::{FullscreenArtist, FullscreenArtists};
pub use backend::{BackendProgramId, ProgramBackend, RecordingBackend};
pub use defaults::{default_rules, transparency_rule, DefaultsPolicy};
pub use engine::Engine;
pub use error::RenderError;
pub use program::{CompiledProgram, ShaderProgram, TextureRef, UniformValue};
pub use structure::{SceneArtist, StructureRegistry};
pub use vizkit_core::TransparencyMode;
