use once_cell::sync::Lazy;

use super::names;
use crate::dialect::Dialect;
use crate::types::{DataType, ShaderReplacementRule};

/// Rules whose text is the same in every dialect.
static SHARED_RULES: Lazy<Vec<ShaderReplacementRule>> = Lazy::new(|| {
    vec![
        // Hook for fragment discards applied to every scene object.
        ShaderReplacementRule::new(names::GLOBAL_FRAGMENT_FILTER)
            .replace("GLOBAL_FRAGMENT_FILTER", "// do nothing, for now"),
        // in: vec3 albedoColor, vec3 shadeNormal. out: vec3 litColor
        ShaderReplacementRule::new(names::LIGHT_MATCAP)
            .replace(
                "FRAG_DECLARATIONS",
                r#"uniform sampler2D t_mat_r;
uniform sampler2D t_mat_g;
uniform sampler2D t_mat_b;
uniform sampler2D t_mat_k;
vec3 lightSurfaceMat(vec3 normal, vec3 color,
                     sampler2D t_mat_r, sampler2D t_mat_g, sampler2D t_mat_b, sampler2D t_mat_k);"#,
            )
            .replace(
                "GENERATE_LIT_COLOR",
                r#"vec3 litColor = lightSurfaceMat(shadeNormal, albedoColor,
                                 t_mat_r, t_mat_g, t_mat_b, t_mat_k);"#,
            )
            .texture("t_mat_r", 2)
            .texture("t_mat_g", 2)
            .texture("t_mat_b", 2)
            .texture("t_mat_k", 2),
        // in: vec3 albedoColor. out: vec3 litColor
        ShaderReplacementRule::new(names::LIGHT_PASSTHRU)
            .replace("GENERATE_LIT_COLOR", "vec3 litColor = albedoColor;"),
        ShaderReplacementRule::new(names::SHADE_BASECOLOR)
            .replace("FRAG_DECLARATIONS", "uniform vec3 u_baseColor;")
            .replace("GENERATE_SHADE_COLOR", "vec3 albedoColor = u_baseColor;")
            .uniform("u_baseColor", DataType::Vector3Float),
        // in: vec3 shadeColor. out: vec3 albedoColor
        ShaderReplacementRule::new(names::SHADE_COLOR)
            .replace("GENERATE_SHADE_COLOR", "vec3 albedoColor = shadeColor;"),
        // in: float shadeValue. out: vec3 albedoColor
        ShaderReplacementRule::new(names::SHADE_COLORMAP_VALUE)
            .replace(
                "FRAG_DECLARATIONS",
                r#"uniform float u_rangeHigh;
uniform float u_rangeLow;
uniform sampler1D t_colormap;"#,
            )
            .replace(
                "GENERATE_SHADE_COLOR",
                r#"float rangeTVal = (shadeValue - u_rangeLow) / (u_rangeHigh - u_rangeLow);
rangeTVal = clamp(rangeTVal, 0.f, 1.f);
vec3 albedoColor = texture(t_colormap, rangeTVal).rgb;"#,
            )
            .uniform("u_rangeLow", DataType::Float)
            .uniform("u_rangeHigh", DataType::Float)
            .texture("t_colormap", 1),
        // in: vec2 shadeValue2. out: float shadeValue
        ShaderReplacementRule::new(names::SHADEVALUE_MAG_VALUE2)
            .replace("GENERATE_SHADE_VALUE", "float shadeValue = length(shadeValue2);"),
        ShaderReplacementRule::new(names::ISOLINE_STRIPE_VALUECOLOR)
            .replace(
                "FRAG_DECLARATIONS",
                r#"uniform float u_modLen;
uniform float u_modDarkness;"#,
            )
            .replace(
                "GENERATE_SHADE_COLOR",
                r#"float modVal = mod(shadeValue, 2.0 * u_modLen);
if(modVal > u_modLen) {
  albedoColor *= u_modDarkness;
}"#,
            )
            .uniform("u_modLen", DataType::Float)
            .uniform("u_modDarkness", DataType::Float),
        ShaderReplacementRule::new(names::GENERATE_VIEW_POS)
            .replace(
                "FRAG_DECLARATIONS",
                r#"uniform mat4 u_invProjMatrix_viewPos;
uniform vec4 u_viewport_viewPos;
vec3 fragmentViewPosition(vec4 viewport, vec2 depthRange, mat4 invProjMat, vec4 fragCoord);"#,
            )
            .replace(
                "GLOBAL_FRAGMENT_FILTER_PREP",
                r#"vec2 depthRange_viewPos = vec2(gl_DepthRange.near, gl_DepthRange.far);
vec4 fragCoord_viewPos = gl_FragCoord;
fragCoord_viewPos.z = depth;
vec3 viewPos = fragmentViewPosition(u_viewport_viewPos, depthRange_viewPos,
                                    u_invProjMatrix_viewPos, fragCoord_viewPos);"#,
            )
            .uniform("u_invProjMatrix_viewPos", DataType::Matrix44Float)
            .uniform("u_viewport_viewPos", DataType::Vector4Float),
        ShaderReplacementRule::new(names::CULL_POS_FROM_VIEW)
            .replace("GLOBAL_FRAGMENT_FILTER_PREP", "vec3 cullPos = viewPos;"),
        ShaderReplacementRule::new(names::TRANSPARENCY_STRUCTURE)
            .replace("FRAG_DECLARATIONS", "uniform float u_transparency;")
            .replace("GENERATE_ALPHA", "alphaOut = u_transparency;")
            .uniform("u_transparency", DataType::Float),
        // Depth peeling: discard fragments at or in front of the previous layer.
        ShaderReplacementRule::new(names::TRANSPARENCY_PEEL_STRUCTURE)
            .replace(
                "FRAG_DECLARATIONS",
                r#"uniform float u_transparency;
uniform sampler2D t_minDepth;
uniform vec2 u_viewportDim;"#,
            )
            .replace("GENERATE_ALPHA", "alphaOut = u_transparency;")
            .replace(
                "GLOBAL_FRAGMENT_FILTER",
                r#"vec2 depthPixelCoords = gl_FragCoord.xy / u_viewportDim;
float minDepth = texture(t_minDepth, depthPixelCoords).x;
if(depth <= minDepth+1e-6) {
  discard;
}"#,
            )
            .uniform("u_transparency", DataType::Float)
            .uniform("u_viewportDim", DataType::Vector2Float)
            .texture("t_minDepth", 2),
        ShaderReplacementRule::new(names::MESH_PROPAGATE_VALUE)
            .replace(
                "VERT_DECLARATIONS",
                r#"in float a_value;
out float a_valueToFrag;"#,
            )
            .replace("VERT_ASSIGNMENTS", "a_valueToFrag = a_value;")
            .replace("FRAG_DECLARATIONS", "in float a_valueToFrag;")
            .replace("GENERATE_SHADE_VALUE", "float shadeValue = a_valueToFrag;")
            .attribute("a_value", DataType::Float),
        ShaderReplacementRule::new(names::MESH_PROPAGATE_VALUE2)
            .replace(
                "VERT_DECLARATIONS",
                r#"in vec2 a_value2;
out vec2 a_value2ToFrag;"#,
            )
            .replace("VERT_ASSIGNMENTS", "a_value2ToFrag = a_value2;")
            .replace("FRAG_DECLARATIONS", "in vec2 a_value2ToFrag;")
            .replace("GENERATE_SHADE_VALUE", "vec2 shadeValue2 = a_value2ToFrag;")
            .attribute("a_value2", DataType::Vector2Float),
        ShaderReplacementRule::new(names::MESH_PROPAGATE_COLOR)
            .replace(
                "VERT_DECLARATIONS",
                r#"in vec3 a_color;
out vec3 a_colorToFrag;"#,
            )
            .replace("VERT_ASSIGNMENTS", "a_colorToFrag = a_color;")
            .replace("FRAG_DECLARATIONS", "in vec3 a_colorToFrag;")
            .replace("GENERATE_SHADE_VALUE", "vec3 shadeColor = a_colorToFrag;")
            .attribute("a_color", DataType::Vector3Float),
        ShaderReplacementRule::new(names::MESH_PROPAGATE_CULLPOS)
            .replace(
                "VERT_DECLARATIONS",
                r#"in vec3 a_cullPos;
out vec3 a_cullPosFrag;"#,
            )
            .replace("VERT_ASSIGNMENTS", "a_cullPosFrag = vec3(u_modelView * vec4(a_cullPos, 1.));")
            .replace("FRAG_DECLARATIONS", "in vec3 a_cullPosFrag;")
            .replace("GLOBAL_FRAGMENT_FILTER_PREP", "vec3 cullPos = a_cullPosFrag;")
            .attribute("a_cullPos", DataType::Vector3Float),
    ]
});

/// Built-in rule set of `dialect`.
pub fn rules(dialect: Dialect) -> Vec<ShaderReplacementRule> {
    let mut rules = Vec::with_capacity(SHARED_RULES.len() + 1);
    rules.push(
        ShaderReplacementRule::new(names::GLSL_VERSION).replace("GLSL_VERSION", dialect.preamble()),
    );
    rules.extend(SHARED_RULES.iter().cloned());
    rules
}

/// Culling rule for one slice plane. The plane's center and normal uniforms
/// carry `postfix` so several planes can cull the same fragment.
pub fn slice_plane_rule(postfix: &str) -> ShaderReplacementRule {
    let center = format!("u_slicePlaneCenter_{postfix}");
    let normal = format!("u_slicePlaneNormal_{postfix}");
    ShaderReplacementRule::new(format!("{}{postfix}", names::SLICE_PLANE_CULL_PREFIX))
        .replace("FRAG_DECLARATIONS", format!("uniform vec3 {center}; uniform vec3 {normal};"))
        .replace(
            "GLOBAL_FRAGMENT_FILTER",
            format!("if(dot(cullPos, {normal}) < dot( {center} , {normal})) {{ discard; }}"),
        )
        .uniform(center, DataType::Vector3Float)
        .uniform(normal, DataType::Vector3Float)
}
