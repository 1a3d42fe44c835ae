//! Composition of base stages and replacement rules.
//!
//! Composition is a single pass: the base template is parsed, every token
//! occurrence is replaced by the text all applied rules contribute to that
//! token (in rule order), and the resource lists of the base and the rules are
//! merged. Replacement text is inserted verbatim and never re-scanned for
//! placeholders.
//!
//! Composition is pure. The same base and rule sequence always produce the
//! same source and resource lists, which is what makes caching composed
//! programs by `(program, rules)` sound.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, trace};

use crate::dialect::Dialect;
use crate::error::{ComposeError, ResourceKind};
use crate::template::{Segment, Template};
use crate::types::{
    AttributeSpec, DrawMode, ProgramSpec, ShaderReplacementRule, ShaderStageSpecification,
    ShaderStageType, TextureSpec, UniformSpec,
};

/// Prefix of the comment line emitted before each contribution when source
/// annotation is enabled.
pub const ANNOTATION_PREFIX: &str = "// from rule: ";

// ---------------------------------------------------------------------------
// Token table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Contribution<'r> {
    rule: &'r str,
    text: &'r str,
}

/// Text contributed to each token, in rule-application order.
#[derive(Debug, Clone, Default)]
pub struct TokenTable<'r> {
    entries: HashMap<&'r str, Vec<Contribution<'r>>>,
}

impl<'r> TokenTable<'r> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: &[&'r ShaderReplacementRule]) -> Self {
        let mut table = Self::new();
        for rule in rules {
            for (token, text) in &rule.replacements {
                table.push(token, &rule.name, text);
            }
        }
        table
    }

    pub fn push(&mut self, token: &'r str, rule: &'r str, text: &'r str) {
        self.entries
            .entry(token)
            .or_default()
            .push(Contribution { rule, text });
    }

    /// Names of the rules contributing to `token`, in order.
    pub fn contributors(&self, token: &str) -> Vec<&'r str> {
        self.entries
            .get(token)
            .map(|c| c.iter().map(|c| c.rule).collect())
            .unwrap_or_default()
    }

    /// Joined replacement text for `token`, or `None` when no rule contributes.
    pub fn expand(&self, token: &str, annotate: bool) -> Option<String> {
        let contributions = self.entries.get(token)?;
        let mut out = String::new();
        for (i, contribution) in contributions.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            if annotate {
                out.push_str(ANNOTATION_PREFIX);
                out.push_str(contribution.rule);
                out.push('\n');
            }
            out.push_str(contribution.text);
        }
        Some(out)
    }
}

/// Text used for a token when no applied rule contributes to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuralDefaults {
    defaults: BTreeMap<String, String>,
}

impl StructuralDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in defaults: `GLSL_VERSION` falls back to the dialect preamble.
    pub fn for_dialect(dialect: Dialect) -> Self {
        let mut defaults = Self::new();
        defaults.insert("GLSL_VERSION", dialect.preamble());
        defaults
    }

    pub fn insert(&mut self, token: impl Into<String>, text: impl Into<String>) {
        self.defaults.insert(token.into(), text.into());
    }

    pub fn remove(&mut self, token: &str) -> Option<String> {
        self.defaults.remove(token)
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.defaults.get(token).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Resource merging
// ---------------------------------------------------------------------------

trait Resource: Clone + PartialEq {
    const KIND: ResourceKind;

    fn name(&self) -> &str;

    /// Type description used in conflict diagnostics.
    fn describe(&self) -> String;
}

impl Resource for UniformSpec {
    const KIND: ResourceKind = ResourceKind::Uniform;

    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        self.data_type.to_string()
    }
}

impl Resource for AttributeSpec {
    const KIND: ResourceKind = ResourceKind::Attribute;

    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        if self.array_count == 1 {
            self.data_type.to_string()
        } else {
            format!("{}[{}]", self.data_type, self.array_count)
        }
    }
}

impl Resource for TextureSpec {
    const KIND: ResourceKind = ResourceKind::Texture;

    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        format!("{}D", self.dim)
    }
}

/// Append `incoming` to `merged`, keeping first-seen order. Identical
/// redeclarations are dropped; a same-named declaration of a different type
/// is an error.
fn merge_resources<R: Resource>(
    merged: &mut Vec<R>,
    incoming: &[R],
    contributor: &str,
) -> Result<(), ComposeError> {
    for item in incoming {
        match merged.iter().find(|m| m.name() == item.name()) {
            Some(existing) if existing == item => {}
            Some(existing) => {
                return Err(ComposeError::ConflictingResource {
                    kind: R::KIND,
                    name: item.name().to_string(),
                    existing: existing.describe(),
                    requested: item.describe(),
                    contributor: contributor.to_string(),
                });
            }
            None => merged.push(item.clone()),
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// A stage with every placeholder substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedStage {
    pub stage: ShaderStageType,
    pub source: String,
    pub uniforms: Vec<UniformSpec>,
    pub attributes: Vec<AttributeSpec>,
    pub textures: Vec<TextureSpec>,
}

/// Compose one stage from `base` and already-resolved `rules`, applied in order.
pub fn compose_stage(
    base: &ShaderStageSpecification,
    rules: &[&ShaderReplacementRule],
    defaults: &StructuralDefaults,
    annotate: bool,
) -> Result<ComposedStage, ComposeError> {
    let template = Template::parse(&base.source).map_err(|source| ComposeError::MalformedTemplate {
        stage: base.stage,
        source,
    })?;

    let mut uniforms = Vec::new();
    let mut attributes = Vec::new();
    let mut textures = Vec::new();
    let base_name = format!("the base {} stage", base.stage);
    merge_resources(&mut uniforms, &base.uniforms, &base_name)?;
    merge_resources(&mut attributes, &base.attributes, &base_name)?;
    merge_resources(&mut textures, &base.textures, &base_name)?;
    for rule in rules {
        let contributor = format!("rule `{}`", rule.name);
        merge_resources(&mut uniforms, &rule.uniforms, &contributor)?;
        merge_resources(&mut attributes, &rule.attributes, &contributor)?;
        merge_resources(&mut textures, &rule.textures, &contributor)?;
    }

    let table = TokenTable::from_rules(rules);
    let mut expansions: HashMap<&str, String> = HashMap::new();
    for token in template.tokens() {
        let text = match table.expand(token, annotate) {
            Some(text) => {
                trace!(
                    stage = %base.stage,
                    token,
                    rules = ?table.contributors(token),
                    "substituting token"
                );
                text
            }
            None => match defaults.get(token) {
                Some(text) => {
                    trace!(stage = %base.stage, token, "using structural default");
                    text.to_string()
                }
                None => String::new(),
            },
        };
        expansions.insert(token, text);
    }

    let mut source = String::with_capacity(base.source.len());
    for segment in template.segments() {
        match segment {
            Segment::Text(text) => source.push_str(text),
            Segment::Token(token) => {
                if let Some(text) = expansions.get(token) {
                    source.push_str(text);
                }
            }
        }
    }

    Ok(ComposedStage {
        stage: base.stage,
        source,
        uniforms,
        attributes,
        textures,
    })
}

// ---------------------------------------------------------------------------
// Programs
// ---------------------------------------------------------------------------

/// Every stage of a program composed with one rule list, plus the union of
/// the stages' resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedProgram {
    pub program: String,
    pub draw_mode: DrawMode,
    /// Rules applied, in application order, after duplicate removal.
    pub rules: Vec<String>,
    pub stages: Vec<ComposedStage>,
    pub uniforms: Vec<UniformSpec>,
    pub attributes: Vec<AttributeSpec>,
    pub textures: Vec<TextureSpec>,
}

impl ComposedProgram {
    pub fn stage(&self, stage: ShaderStageType) -> Option<&ComposedStage> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformSpec> {
        self.uniforms.iter().find(|u| u.name == name)
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn texture(&self, name: &str) -> Option<&TextureSpec> {
        self.textures.iter().find(|t| t.name == name)
    }
}

/// Compose every stage of `program` with the same resolved `rules`.
pub fn compose_program(
    program: &ProgramSpec,
    rules: &[&ShaderReplacementRule],
    defaults: &StructuralDefaults,
    annotate: bool,
) -> Result<ComposedProgram, ComposeError> {
    let mut stages = Vec::with_capacity(program.stages.len());
    let mut uniforms = Vec::new();
    let mut attributes = Vec::new();
    let mut textures = Vec::new();

    for base in &program.stages {
        let stage = compose_stage(base, rules, defaults, annotate)?;
        let contributor = format!("the {} stage of `{}`", stage.stage, program.name);
        merge_resources(&mut uniforms, &stage.uniforms, &contributor)?;
        merge_resources(&mut attributes, &stage.attributes, &contributor)?;
        merge_resources(&mut textures, &stage.textures, &contributor)?;
        stages.push(stage);
    }

    let rules: Vec<String> = rules.iter().map(|r| r.name.clone()).collect();
    debug!(program = %program.name, ?rules, "composed shader program");

    Ok(ComposedProgram {
        program: program.name.clone(),
        draw_mode: program.draw_mode,
        rules,
        stages,
        uniforms,
        attributes,
        textures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::contains_placeholder;
    use crate::types::DataType;

    fn vertex_base() -> ShaderStageSpecification {
        ShaderStageSpecification::new(
            ShaderStageType::Vertex,
            concat!(
                "${ GLSL_VERSION }$\n",
                "in vec3 a_position;\n",
                "${ VERT_DECLARATIONS }$\n",
                "void main() {\n",
                "${ VERT_ASSIGNMENTS }$\n",
                "}\n",
            ),
        )
        .attribute("a_position", DataType::Vector3Float)
    }

    fn r1() -> ShaderReplacementRule {
        ShaderReplacementRule::new("R1")
            .replace("VERT_DECLARATIONS", "in float a_value;")
            .replace("VERT_ASSIGNMENTS", "out_value = a_value;")
            .attribute("a_value", DataType::Float)
    }

    #[test]
    fn substitutes_rule_text_at_token_sites() {
        let rule = r1();
        let stage =
            compose_stage(&vertex_base(), &[&rule], &StructuralDefaults::new(), false).unwrap();

        assert_eq!(
            stage.source,
            "\nin vec3 a_position;\nin float a_value;\nvoid main() {\nout_value = a_value;\n}\n"
        );
        assert!(!contains_placeholder(&stage.source));
        assert_eq!(
            stage.attributes,
            vec![
                AttributeSpec::new("a_position", DataType::Vector3Float),
                AttributeSpec::new("a_value", DataType::Float),
            ]
        );
    }

    #[test]
    fn structural_default_fills_untouched_token() {
        let rule = r1();
        let defaults = StructuralDefaults::for_dialect(Dialect::Gl3);
        let stage = compose_stage(&vertex_base(), &[&rule], &defaults, false).unwrap();
        assert!(stage.source.starts_with("#version 330 core\n"));
    }

    #[test]
    fn rule_text_overrides_structural_default() {
        let version =
            ShaderReplacementRule::new("GLSL_VERSION").replace("GLSL_VERSION", "#version 410");
        let defaults = StructuralDefaults::for_dialect(Dialect::Gl3);
        let stage = compose_stage(&vertex_base(), &[&version], &defaults, false).unwrap();
        assert!(stage.source.starts_with("#version 410\n"));
    }

    #[test]
    fn contributions_concatenate_in_application_order() {
        let a = ShaderReplacementRule::new("A").replace("VERT_DECLARATIONS", "// a");
        let b = ShaderReplacementRule::new("B").replace("VERT_DECLARATIONS", "// b");
        let defaults = StructuralDefaults::new();

        let ab = compose_stage(&vertex_base(), &[&a, &b], &defaults, false).unwrap();
        let ba = compose_stage(&vertex_base(), &[&b, &a], &defaults, false).unwrap();

        assert!(ab.source.contains("// a\n// b"));
        assert!(ba.source.contains("// b\n// a"));
        assert_ne!(ab.source, ba.source);
    }

    #[test]
    fn repeated_token_receives_same_text_everywhere() {
        let base = ShaderStageSpecification::new(ShaderStageType::Fragment, "${ X }$|${ X }$");
        let rule = ShaderReplacementRule::new("X").replace("X", "x");
        let stage = compose_stage(&base, &[&rule], &StructuralDefaults::new(), false).unwrap();
        assert_eq!(stage.source, "x|x");
    }

    #[test]
    fn annotation_names_the_contributing_rule() {
        let rule = r1();
        let stage =
            compose_stage(&vertex_base(), &[&rule], &StructuralDefaults::new(), true).unwrap();
        assert!(stage.source.contains("// from rule: R1\nin float a_value;"));
        assert!(!contains_placeholder(&stage.source));
    }

    #[test]
    fn replacement_text_is_not_rescanned() {
        let base = ShaderStageSpecification::new(ShaderStageType::Fragment, "${ A }$");
        let rule = ShaderReplacementRule::new("A").replace("A", "${ B }$");
        let stage = compose_stage(&base, &[&rule], &StructuralDefaults::new(), false).unwrap();
        assert_eq!(stage.source, "${ B }$");
    }

    #[test]
    fn conflicting_uniform_type_is_rejected() {
        let base = ShaderStageSpecification::new(ShaderStageType::Fragment, "void main() {}")
            .uniform("u_x", DataType::Float);
        let rule = ShaderReplacementRule::new("VEC").uniform("u_x", DataType::Vector3Float);

        let err = compose_stage(&base, &[&rule], &StructuralDefaults::new(), false).unwrap_err();
        assert_eq!(
            err,
            ComposeError::ConflictingResource {
                kind: ResourceKind::Uniform,
                name: "u_x".into(),
                existing: "Float".into(),
                requested: "Vector3Float".into(),
                contributor: "rule `VEC`".into(),
            }
        );
    }

    #[test]
    fn conflicting_attribute_array_count_is_rejected() {
        let a = ShaderReplacementRule::new("A").attribute("a_v", DataType::Float);
        let b = ShaderReplacementRule::new("B").attribute_array("a_v", DataType::Float, 4);
        let base = ShaderStageSpecification::new(ShaderStageType::Vertex, "");
        let err = compose_stage(&base, &[&a, &b], &StructuralDefaults::new(), false).unwrap_err();
        assert!(matches!(
            err,
            ComposeError::ConflictingResource {
                kind: ResourceKind::Attribute,
                ..
            }
        ));
    }

    #[test]
    fn conflicting_texture_dimension_is_rejected() {
        let a = ShaderReplacementRule::new("A").texture("t_colormap", 1);
        let b = ShaderReplacementRule::new("B").texture("t_colormap", 2);
        let base = ShaderStageSpecification::new(ShaderStageType::Fragment, "");
        let err = compose_stage(&base, &[&a, &b], &StructuralDefaults::new(), false).unwrap_err();
        assert!(matches!(
            err,
            ComposeError::ConflictingResource {
                kind: ResourceKind::Texture,
                ..
            }
        ));
    }

    #[test]
    fn identical_redeclaration_is_collapsed() {
        let base = ShaderStageSpecification::new(ShaderStageType::Fragment, "")
            .uniform("u_transparency", DataType::Float);
        let a = ShaderReplacementRule::new("A")
            .uniform("u_transparency", DataType::Float)
            .uniform("u_color", DataType::Vector3Float);
        let b = ShaderReplacementRule::new("B").uniform("u_color", DataType::Vector3Float);

        let stage = compose_stage(&base, &[&a, &b], &StructuralDefaults::new(), false).unwrap();
        let names: Vec<_> = stage.uniforms.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["u_transparency", "u_color"]);
    }

    #[test]
    fn malformed_template_names_the_stage() {
        let base = ShaderStageSpecification::new(ShaderStageType::Geometry, "${ OPEN ");
        let err = compose_stage(&base, &[], &StructuralDefaults::new(), false).unwrap_err();
        assert!(matches!(
            err,
            ComposeError::MalformedTemplate {
                stage: ShaderStageType::Geometry,
                ..
            }
        ));
    }

    #[test]
    fn program_collects_resources_across_stages() {
        let frag =
            ShaderStageSpecification::new(ShaderStageType::Fragment, "${ FRAG_DECLARATIONS }$")
                .texture("t_image", 2);
        let program = ProgramSpec::new("P", vec![vertex_base(), frag], DrawMode::Triangles);
        let rule = r1();

        let composed =
            compose_program(&program, &[&rule], &StructuralDefaults::new(), false).unwrap();
        assert_eq!(composed.stages.len(), 2);
        assert_eq!(composed.rules, ["R1"]);
        assert!(composed.attribute("a_position").is_some());
        assert!(composed.attribute("a_value").is_some());
        assert_eq!(composed.texture("t_image").map(|t| t.dim), Some(2));
        assert!(composed.stage(ShaderStageType::Geometry).is_none());
    }

    #[test]
    fn program_rejects_cross_stage_conflicts() {
        let vert = ShaderStageSpecification::new(ShaderStageType::Vertex, "")
            .uniform("u_x", DataType::Float);
        let frag = ShaderStageSpecification::new(ShaderStageType::Fragment, "")
            .uniform("u_x", DataType::Int);
        let program = ProgramSpec::new("P", vec![vert, frag], DrawMode::Points);
        let err = compose_program(&program, &[], &StructuralDefaults::new(), false).unwrap_err();
        assert!(matches!(err, ComposeError::ConflictingResource { .. }));
    }
}
