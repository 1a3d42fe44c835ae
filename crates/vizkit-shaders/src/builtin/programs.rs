use once_cell::sync::Lazy;

use super::program_names;
use crate::types::{DataType, DrawMode, ProgramSpec, ShaderStageSpecification, ShaderStageType};

static MESH_VERT: Lazy<ShaderStageSpecification> = Lazy::new(|| {
    ShaderStageSpecification::new(
        ShaderStageType::Vertex,
        r#"${ GLSL_VERSION }$

uniform mat4 u_modelView;
uniform mat4 u_projMatrix;
in vec3 a_position;
in vec3 a_normal;
in vec3 a_barycoord;
out vec3 a_barycoordToFrag;
out vec3 a_normalToFrag;

${ VERT_DECLARATIONS }$

void main()
{
    gl_Position = u_projMatrix * u_modelView * vec4(a_position, 1.);
    a_normalToFrag = mat3(u_modelView) * a_normal;
    a_barycoordToFrag = a_barycoord;

    ${ VERT_ASSIGNMENTS }$
}
"#,
    )
    .uniform("u_modelView", DataType::Matrix44Float)
    .uniform("u_projMatrix", DataType::Matrix44Float)
    .attribute("a_position", DataType::Vector3Float)
    .attribute("a_normal", DataType::Vector3Float)
    .attribute("a_barycoord", DataType::Vector3Float)
});

static MESH_FRAG: Lazy<ShaderStageSpecification> = Lazy::new(|| {
    ShaderStageSpecification::new(
        ShaderStageType::Fragment,
        r#"${ GLSL_VERSION }$

in vec3 a_normalToFrag;
in vec3 a_barycoordToFrag;
layout(location = 0) out vec4 outputF;

${ FRAG_DECLARATIONS }$

void main()
{
    float depth = gl_FragCoord.z;
    ${ GLOBAL_FRAGMENT_FILTER_PREP }$
    ${ GLOBAL_FRAGMENT_FILTER }$

    ${ GENERATE_SHADE_VALUE }$
    ${ GENERATE_SHADE_COLOR }$

    vec3 shadeNormal = a_normalToFrag;
    ${ PERTURB_SHADE_NORMAL }$
    ${ GENERATE_LIT_COLOR }$

    float alphaOut = 1.0;
    ${ GENERATE_ALPHA }$

    // keep the varyings alive so the linker does not drop them
    float dummyVal = a_normalToFrag.x + a_barycoordToFrag.x;
    alphaOut = alphaOut + dummyVal * (1e-12);

    ${ PERTURB_LIT_COLOR }$

    outputF = vec4(litColor, alphaOut);
}
"#,
    )
});

static TEXTURE_DRAW_VERT: Lazy<ShaderStageSpecification> = Lazy::new(|| {
    ShaderStageSpecification::new(
        ShaderStageType::Vertex,
        r#"${ GLSL_VERSION }$
in vec3 a_position;
out vec2 tCoord;

${ VERT_DECLARATIONS }$

void main()
{
    tCoord = (a_position.xy + vec2(1.0, 1.0)) / 2.0;
    ${ VERT_ASSIGNMENTS }$

    vec4 position = vec4(a_position, 1.0);
    ${ POSITION_ADJUST }$

    gl_Position = position;
}
"#,
    )
    .attribute("a_position", DataType::Vector3Float)
});

static PLAIN_TEXTURE_DRAW_FRAG: Lazy<ShaderStageSpecification> = Lazy::new(|| {
    ShaderStageSpecification::new(
        ShaderStageType::Fragment,
        r#"${ GLSL_VERSION }$

in vec2 tCoord;
uniform sampler2D t_image;
layout(location = 0) out vec4 outputF;

${ FRAG_DECLARATIONS }$

void main()
{
    vec4 textureOut = texture(t_image, tCoord).rgba;

    ${ TEXTURE_OUT_ADJUST }$

    outputF = textureOut;
}
"#,
    )
    .texture("t_image", 2)
});

static HISTOGRAM_VERT: Lazy<ShaderStageSpecification> = Lazy::new(|| {
    ShaderStageSpecification::new(
        ShaderStageType::Vertex,
        r#"${ GLSL_VERSION }$
in vec2 a_coord;

out float shadeValueRaw;

void main()
{
    shadeValueRaw = a_coord.x;
    vec2 scaledCoord = vec2(a_coord.x, a_coord.y * .85);
    gl_Position = vec4(2. * scaledCoord - vec2(1.0, 1.0), 0., 1.);
}
"#,
    )
    .attribute("a_coord", DataType::Vector2Float)
});

static HISTOGRAM_FRAG: Lazy<ShaderStageSpecification> = Lazy::new(|| {
    ShaderStageSpecification::new(
        ShaderStageType::Fragment,
        r#"${ GLSL_VERSION }$

in float shadeValueRaw;

${ FRAG_DECLARATIONS }$

layout(location = 0) out vec4 outputF;

void main()
{
    float shadeValue = shadeValueRaw;

    ${ GENERATE_SHADE_COLOR }$

    // darken outside the colormap range
    float darkFactor = 1.0;
    if(shadeValue < u_rangeLow || shadeValue > u_rangeHigh) {
        darkFactor = 0.6;
    }

    outputF = vec4(darkFactor * albedoColor.rgb, 1.0);
}
"#,
    )
});

/// Built-in base programs.
pub fn programs() -> Vec<ProgramSpec> {
    vec![
        ProgramSpec::new(
            program_names::MESH,
            vec![MESH_VERT.clone(), MESH_FRAG.clone()],
            DrawMode::Triangles,
        ),
        ProgramSpec::new(
            program_names::INDEXED_MESH,
            vec![MESH_VERT.clone(), MESH_FRAG.clone()],
            DrawMode::IndexedTriangles,
        ),
        ProgramSpec::new(
            program_names::TEXTURE_DRAW_PLAIN,
            vec![TEXTURE_DRAW_VERT.clone(), PLAIN_TEXTURE_DRAW_FRAG.clone()],
            DrawMode::Triangles,
        ),
        ProgramSpec::new(
            program_names::HISTOGRAM,
            vec![HISTOGRAM_VERT.clone(), HISTOGRAM_FRAG.clone()],
            DrawMode::Triangles,
        ),
    ]
}
