//! Shader-variant composition.
//!
//! Base programs are written once as templates with `${ TOKEN }$` placeholders.
//! Features (lighting models, color maps, transparency, slice-plane culling)
//! are [`ShaderReplacementRule`]s that contribute text to those tokens and
//! declare the uniforms, attributes and textures the text uses. A concrete
//! shader is a base program plus an ordered list of rule names:
//!
//! ```
//! use vizkit_shaders::builtin::{self, names, program_names};
//! use vizkit_shaders::{Dialect, RuleRegistry};
//!
//! let registry = RuleRegistry::with_builtin_rules(Dialect::Gl3);
//! let mesh = builtin::programs()
//!     .into_iter()
//!     .find(|p| p.name == program_names::MESH)
//!     .unwrap();
//!
//! let program = registry
//!     .compose_program(
//!         &mesh,
//!         &[names::GLSL_VERSION, names::SHADE_BASECOLOR, names::LIGHT_PASSTHRU],
//!         false,
//!     )
//!     .unwrap();
//! assert!(program.uniform("u_baseColor").is_some());
//! ```
//!
//! - [`types`]: stages, rules, resources
//! - [`template`]: placeholder parser
//! - [`compose`]: token table, substitution and resource merging
//! - [`registry`]: rule lookup for one [`Dialect`]
//! - [`builtin`]: the stock rule set and base programs

pub mod builtin;
pub mod compose;
pub mod dialect;
pub mod error;
pub mod registry;
pub mod template;
pub mod types;

pub use compose::{
    compose_program, compose_stage, ComposedProgram, ComposedStage, StructuralDefaults, TokenTable,
};
pub use dialect::Dialect;
pub use error::{ComposeError, ResourceKind};
pub use registry::RuleRegistry;
pub use template::{Template, TemplateError};
pub use types::{
    AttributeSpec, DataType, DrawMode, ProgramSpec, ShaderReplacementRule, ShaderStageSpecification,
    ShaderStageType, TextureSpec, UniformSpec,
};

#[cfg(test)]
mod tests {
    use super::builtin::{self, names, program_names};
    use super::*;
    use crate::template::contains_placeholder;
    use rstest::rstest;

    fn program(name: &str) -> ProgramSpec {
        builtin::programs()
            .into_iter()
            .find(|p| p.name == name)
            .unwrap()
    }

    #[rstest]
    #[case(
        program_names::MESH,
        &[
            names::GLSL_VERSION,
            names::GLOBAL_FRAGMENT_FILTER,
            names::LIGHT_MATCAP,
            names::SHADE_BASECOLOR,
        ]
    )]
    #[case(
        program_names::INDEXED_MESH,
        &[names::MESH_PROPAGATE_VALUE, names::SHADE_COLORMAP_VALUE, names::LIGHT_PASSTHRU]
    )]
    #[case(program_names::TEXTURE_DRAW_PLAIN, &[names::GLSL_VERSION])]
    #[case(program_names::HISTOGRAM, &[names::GLSL_VERSION, names::SHADE_COLORMAP_VALUE])]
    fn builtin_programs_compose_without_placeholders(
        #[case] name: &str,
        #[case] rules: &[&str],
        #[values(Dialect::Gl3, Dialect::LegacyGl)] dialect: Dialect,
    ) {
        let registry = RuleRegistry::with_builtin_rules(dialect);
        let composed = registry.compose_program(&program(name), rules, false).unwrap();
        for stage in &composed.stages {
            assert!(!contains_placeholder(&stage.source), "{name}: {}", stage.source);
            assert!(stage.source.starts_with(dialect.preamble()));
        }
    }

    #[test]
    fn composition_is_deterministic() {
        let registry = RuleRegistry::with_builtin_rules(Dialect::Gl3);
        let mesh = program(program_names::MESH);
        let rules = [
            names::GLSL_VERSION,
            names::GLOBAL_FRAGMENT_FILTER,
            names::LIGHT_MATCAP,
            names::TRANSPARENCY_STRUCTURE,
            names::MESH_PROPAGATE_COLOR,
            names::SHADE_COLOR,
        ];

        let first = registry.compose_program(&mesh, &rules, false).unwrap();
        let second = registry.compose_program(&mesh, &rules, false).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn slice_plane_rule_culls_mesh_fragments() {
        let mut registry = RuleRegistry::with_builtin_rules(Dialect::Gl3);
        registry.register(builtin::slice_plane_rule("0")).unwrap();

        let composed = registry
            .compose_program(
                &program(program_names::MESH),
                &[
                    names::GLSL_VERSION,
                    names::MESH_PROPAGATE_CULLPOS,
                    "SLICE_PLANE_CULL_0",
                    names::SHADE_BASECOLOR,
                    names::LIGHT_PASSTHRU,
                ],
                false,
            )
            .unwrap();

        let frag = composed.stage(ShaderStageType::Fragment).unwrap();
        let prep = frag.source.find("vec3 cullPos = a_cullPosFrag;").unwrap();
        let cull = frag.source.find("discard;").unwrap();
        assert!(prep < cull);
        assert_eq!(
            composed.uniform("u_slicePlaneNormal_0").map(|u| u.data_type),
            Some(DataType::Vector3Float)
        );
    }
}
