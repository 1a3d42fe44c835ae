use std::rc::Rc;

use vizkit_core::Options;
use vizkit_render::{
    DefaultsPolicy, Engine, RecordingBackend, RenderError, TextureRef, UniformValue,
};
use vizkit_shaders::builtin::{names, program_names};
use vizkit_shaders::template::contains_placeholder;
use vizkit_shaders::{
    DataType, Dialect, DrawMode, ProgramSpec, RuleRegistry, ShaderReplacementRule,
    ShaderStageSpecification, ShaderStageType,
};

const POINT_VERT: &str = "${ GLSL_VERSION }$
${ VERT_DECLARATIONS }$
out float out_value;
void main() {
    ${ VERT_ASSIGNMENTS }$
}
";

const POINT_FRAG: &str = "${ GLSL_VERSION }$
in float out_value;
layout(location = 0) out vec4 outputF;
void main() {
    outputF = vec4(out_value);
}
";

fn point_program() -> ProgramSpec {
    ProgramSpec::new(
        "POINT_VALUES",
        vec![
            ShaderStageSpecification::new(ShaderStageType::Vertex, POINT_VERT),
            ShaderStageSpecification::new(ShaderStageType::Fragment, POINT_FRAG),
        ],
        DrawMode::Points,
    )
}

fn value_rule() -> ShaderReplacementRule {
    ShaderReplacementRule::new("R1")
        .replace("VERT_DECLARATIONS", "in float a_value;")
        .replace("VERT_ASSIGNMENTS", "out_value = a_value;")
        .attribute("a_value", DataType::Float)
}

fn engine(dialect: Dialect) -> (Engine, RecordingBackend) {
    let backend = RecordingBackend::new();
    let rules = RuleRegistry::with_builtin_rules(dialect);
    let engine = Engine::with_rules(Options::default(), rules, backend.clone());
    (engine, backend)
}

#[test]
fn user_rule_fills_both_tokens() {
    let (mut engine, backend) = engine(Dialect::Gl3);
    engine.register_program(point_program()).unwrap();
    engine.register_rule(value_rule()).unwrap();

    let program = engine
        .request_shader("POINT_VALUES", &["R1"], DefaultsPolicy::Process)
        .unwrap();

    let vert = &program.composed().stages[0].source;
    let decl = vert.find("in float a_value;").unwrap();
    let assign = vert.find("out_value = a_value;").unwrap();
    assert!(decl < vert.find("out float out_value;").unwrap());
    assert!(assign > vert.find("void main()").unwrap());
    assert!(vert.starts_with("#version 330 core"));
    for stage in &program.composed().stages {
        assert!(!contains_placeholder(&stage.source));
    }

    assert!(program.has_attribute("a_value"));
    assert_eq!(backend.compiled().len(), 1);
}

#[test]
fn legacy_dialect_changes_only_the_preamble() {
    let (mut modern, _) = engine(Dialect::Gl3);
    let (mut legacy, _) = engine(Dialect::LegacyGl);
    let rules = [names::SHADE_BASECOLOR];

    let a = modern
        .request_shader(program_names::MESH, &rules, DefaultsPolicy::SceneObject)
        .unwrap();
    let b = legacy
        .request_shader(program_names::MESH, &rules, DefaultsPolicy::SceneObject)
        .unwrap();

    for (x, y) in a.composed().stages.iter().zip(&b.composed().stages) {
        assert_eq!(
            x.source.replacen(Dialect::Gl3.preamble(), "", 1),
            y.source.replacen(Dialect::LegacyGl.preamble(), "", 1)
        );
    }
    assert_eq!(a.composed().uniforms, b.composed().uniforms);
}

#[test]
fn conflicting_user_rule_aborts_with_the_full_rule_list() {
    let (mut engine, backend) = engine(Dialect::Gl3);
    let bad = ShaderReplacementRule::new("BAD_BASECOLOR").uniform("u_baseColor", DataType::Float);
    engine.register_rule(bad).unwrap();

    let err = engine
        .request_shader(
            program_names::MESH,
            &[names::SHADE_BASECOLOR, "BAD_BASECOLOR"],
            DefaultsPolicy::Process,
        )
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("`MESH`"), "{message}");
    assert!(message.contains("GLSL_VERSION, SHADE_BASECOLOR, BAD_BASECOLOR"), "{message}");
    assert!(matches!(err, RenderError::Compose { .. }));
    assert_eq!(backend.compile_count(), 0);
}

#[test]
fn per_request_state_is_independent() {
    let (mut engine, _) = engine(Dialect::Gl3);
    let mut first = engine
        .request_shader(program_names::TEXTURE_DRAW_PLAIN, &[] as &[&str], DefaultsPolicy::Process)
        .unwrap();
    let second = engine
        .request_shader(program_names::TEXTURE_DRAW_PLAIN, &[] as &[&str], DefaultsPolicy::Process)
        .unwrap();
    assert!(Rc::ptr_eq(first.compiled(), second.compiled()));

    first.set_attribute("a_position", 6).unwrap();
    first.set_texture("t_image", TextureRef { id: 7, dim: 2 }).unwrap();
    assert_eq!(first.validate_data().unwrap(), 6);
    assert!(second.validate_data().is_err());
}

#[test]
fn uniform_assignments_are_type_checked() {
    let (mut engine, _) = engine(Dialect::Gl3);
    let mut program = engine
        .request_shader(program_names::MESH, &[names::SHADE_BASECOLOR], DefaultsPolicy::Process)
        .unwrap();

    program
        .set_uniform("u_baseColor", UniformValue::Vec3([1.0, 0.5, 0.0]))
        .unwrap();
    assert!(matches!(
        program.set_uniform("u_baseColor", UniformValue::Float(1.0)),
        Err(RenderError::UniformTypeMismatch { .. })
    ));
    assert!(matches!(
        program.set_uniform("u_missing", UniformValue::Float(1.0)),
        Err(RenderError::UnknownUniform { .. })
    ));
    assert!(matches!(
        program.set_texture("t_mat_r", TextureRef { id: 1, dim: 2 }),
        Err(RenderError::UnknownTexture { .. })
    ));
}
