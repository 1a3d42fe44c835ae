//! Shader acquisition for the rest of the viewer.
//!
//! [`Engine::request_shader`] is the one entry point: a base program name, an
//! ordered list of rule names and a [`DefaultsPolicy`]. The policy's rules are
//! prepended, the combination is composed and compiled once, and the result
//! is cached until something that changes the defaults (transparency mode,
//! slice planes, [`Engine::refresh`]) invalidates it.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use tracing::{debug, error, info};
use vizkit_core::{Options, TransparencyMode};
use vizkit_shaders::builtin::{self, names};
use vizkit_shaders::{ProgramSpec, RuleRegistry, ShaderReplacementRule};

use crate::artist::FullscreenArtists;
use crate::backend::ProgramBackend;
use crate::defaults::{default_rules, DefaultsPolicy};
use crate::error::RenderError;
use crate::program::{CompiledProgram, ShaderProgram};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ProgramKey {
    program: String,
    rules: Vec<String>,
}

pub struct Engine {
    options: Options,
    rules: RuleRegistry,
    programs: BTreeMap<String, ProgramSpec>,
    /// Names of the registered slice-plane rules, in registration order.
    slice_planes: Vec<String>,
    cache: HashMap<ProgramKey, Rc<CompiledProgram>>,
    backend: Box<dyn ProgramBackend>,
    fullscreen_artists: FullscreenArtists,
}

impl Engine {
    /// Engine with the built-in rules of the active dialect and the built-in
    /// base programs.
    pub fn new(options: Options, backend: impl ProgramBackend + 'static) -> Self {
        Self::with_rules(options, RuleRegistry::active(), backend)
    }

    pub fn with_rules(
        options: Options,
        rules: RuleRegistry,
        backend: impl ProgramBackend + 'static,
    ) -> Self {
        let programs: BTreeMap<String, ProgramSpec> = builtin::programs()
            .into_iter()
            .map(|p| (p.name.clone(), p))
            .collect();
        info!(
            dialect = %rules.dialect(),
            rules = rules.len(),
            programs = programs.len(),
            "render engine ready"
        );
        Self {
            options,
            rules,
            programs,
            slice_planes: Vec::new(),
            cache: HashMap::new(),
            backend: Box::new(backend),
            fullscreen_artists: FullscreenArtists::new(),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    pub fn fullscreen_artists(&mut self) -> &mut FullscreenArtists {
        &mut self.fullscreen_artists
    }

    pub fn has_program(&self, name: &str) -> bool {
        self.programs.contains_key(name)
    }

    /// The full rule list a request resolves to: policy defaults first, then
    /// the caller's rules.
    pub fn resolved_rules<S: AsRef<str>>(
        &self,
        rules: &[S],
        policy: DefaultsPolicy,
    ) -> Vec<String> {
        let mut resolved =
            default_rules(policy, self.options.transparency_mode, &self.slice_planes);
        resolved.extend(rules.iter().map(|r| r.as_ref().to_string()));
        resolved
    }

    /// Get a program composed from `program` and `rules` under `policy`.
    ///
    /// Repeated requests for the same resolved combination share one compiled
    /// program. Composition and compilation failures abort the request.
    pub fn request_shader<S: AsRef<str>>(
        &mut self,
        program: &str,
        rules: &[S],
        policy: DefaultsPolicy,
    ) -> Result<ShaderProgram, RenderError> {
        let base = self.programs.get(program).ok_or_else(|| RenderError::UnknownProgram {
            name: program.to_string(),
        })?;
        let rules = self.resolved_rules(rules, policy);

        let key = ProgramKey {
            program: program.to_string(),
            rules,
        };
        if let Some(compiled) = self.cache.get(&key) {
            debug!(program, "shader program cache hit");
            return Ok(ShaderProgram::new(Rc::clone(compiled)));
        }

        let composed = self
            .rules
            .compose_program(base, &key.rules, self.options.annotate_shader_sources)
            .map_err(|source| {
                error!(program, rules = ?key.rules, %source, "shader composition failed");
                RenderError::Compose {
                    program: program.to_string(),
                    rules: key.rules.clone(),
                    source,
                }
            })?;
        let backend_id = self
            .backend
            .compile(&composed)
            .map_err(|source| RenderError::Backend {
                program: program.to_string(),
                source,
            })?;

        debug!(program, rules = ?key.rules, "compiled shader program");
        let compiled = Rc::new(CompiledProgram::new(composed, backend_id));
        self.cache.insert(key, Rc::clone(&compiled));
        Ok(ShaderProgram::new(compiled))
    }

    /// Check `program` before a draw when render error checks are enabled.
    pub fn check_ready(&self, program: &ShaderProgram) -> Result<(), RenderError> {
        if self.options.enable_render_error_checks {
            program.validate_data()?;
        }
        Ok(())
    }

    /// Forget every cached program. Programs already handed out stay usable;
    /// later requests recompose.
    pub fn refresh(&mut self) {
        debug!(dropped = self.cache.len(), "refreshing shader programs");
        self.cache.clear();
    }

    pub fn cached_program_count(&self) -> usize {
        self.cache.len()
    }

    pub fn register_rule(&mut self, rule: ShaderReplacementRule) -> Result<(), RenderError> {
        self.rules.register(rule)?;
        Ok(())
    }

    pub fn register_program(&mut self, program: ProgramSpec) -> Result<(), RenderError> {
        if self.programs.contains_key(&program.name) {
            return Err(RenderError::DuplicateProgram { name: program.name });
        }
        debug!(program = %program.name, "registered shader program");
        self.programs.insert(program.name.clone(), program);
        Ok(())
    }

    pub fn transparency_mode(&self) -> TransparencyMode {
        self.options.transparency_mode
    }

    /// Switch transparency mode. Scene-object defaults change with it, so
    /// cached programs are dropped.
    pub fn set_transparency_mode(&mut self, mode: TransparencyMode) {
        if self.options.transparency_mode == mode {
            return;
        }
        info!(?mode, "transparency mode changed");
        self.options.transparency_mode = mode;
        self.refresh();
    }

    /// Register the culling rule for a new slice plane and apply it to every
    /// later scene-object and pick request. Returns the rule name.
    pub fn add_slice_plane_rule(&mut self, postfix: &str) -> Result<String, RenderError> {
        let rule = builtin::slice_plane_rule(postfix);
        let name = rule.name.clone();
        self.rules.register(rule)?;
        self.slice_planes.push(name.clone());
        self.refresh();
        Ok(name)
    }

    /// Undo [`add_slice_plane_rule`](Self::add_slice_plane_rule). Returns
    /// whether the plane was registered.
    pub fn remove_slice_plane_rule(&mut self, postfix: &str) -> bool {
        let name = format!("{}{postfix}", names::SLICE_PLANE_CULL_PREFIX);
        let before = self.slice_planes.len();
        self.slice_planes.retain(|n| *n != name);
        if self.slice_planes.len() == before {
            return false;
        }
        self.rules.remove(&name);
        self.refresh();
        true
    }

    pub fn slice_plane_rules(&self) -> &[String] {
        &self.slice_planes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;
    use rstest::rstest;
    use vizkit_shaders::builtin::program_names;
    use vizkit_shaders::{ComposeError, Dialect};

    fn engine() -> (Engine, RecordingBackend) {
        let backend = RecordingBackend::new();
        let engine = Engine::with_rules(
            Options::default(),
            RuleRegistry::with_builtin_rules(Dialect::Gl3),
            backend.clone(),
        );
        (engine, backend)
    }

    #[test]
    fn repeated_requests_share_one_compilation() {
        let (mut engine, backend) = engine();
        let rules = [names::SHADE_BASECOLOR];

        let a = engine
            .request_shader(program_names::MESH, &rules, DefaultsPolicy::SceneObject)
            .unwrap();
        let b = engine
            .request_shader(program_names::MESH, &rules, DefaultsPolicy::SceneObject)
            .unwrap();

        assert!(Rc::ptr_eq(a.compiled(), b.compiled()));
        assert_eq!(backend.compile_count(), 1);
        assert_eq!(engine.cached_program_count(), 1);
    }

    #[test]
    fn defaults_are_prepended() {
        let (mut engine, _) = engine();
        let program = engine
            .request_shader(
                program_names::MESH,
                &[names::SHADE_BASECOLOR],
                DefaultsPolicy::SceneObject,
            )
            .unwrap();
        assert_eq!(
            program.rules(),
            ["GLSL_VERSION", "GLOBAL_FRAGMENT_FILTER", "LIGHT_MATCAP", "SHADE_BASECOLOR"]
        );
        assert!(program.has_texture("t_mat_r"));
    }

    #[rstest]
    #[case(DefaultsPolicy::Pick, 4)]
    #[case(DefaultsPolicy::Process, 1)]
    #[case(DefaultsPolicy::None, 0)]
    fn policies_differ_in_cache_key(#[case] policy: DefaultsPolicy, #[case] defaults: usize) {
        let (mut engine, backend) = engine();
        let program = engine
            .request_shader(program_names::TEXTURE_DRAW_PLAIN, &[] as &[&str], policy)
            .unwrap();
        assert_eq!(program.rules().len(), defaults);
        engine
            .request_shader(
                program_names::TEXTURE_DRAW_PLAIN,
                &[] as &[&str],
                DefaultsPolicy::SceneObject,
            )
            .unwrap();
        assert_eq!(backend.compile_count(), 2);
    }

    #[test]
    fn unknown_program_is_rejected() {
        let (mut engine, _) = engine();
        let err = engine
            .request_shader("NOPE", &[] as &[&str], DefaultsPolicy::None)
            .unwrap_err();
        assert!(matches!(err, RenderError::UnknownProgram { name } if name == "NOPE"));
    }

    #[test]
    fn unknown_rule_reports_program_and_rules() {
        let (mut engine, backend) = engine();
        let err = engine
            .request_shader(program_names::MESH, &["NOT_A_RULE"], DefaultsPolicy::Process)
            .unwrap_err();

        match err {
            RenderError::Compose { program, rules, source } => {
                assert_eq!(program, "MESH");
                assert_eq!(rules, ["GLSL_VERSION", "NOT_A_RULE"]);
                assert!(matches!(source, ComposeError::UnknownRule { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(backend.compile_count(), 0);
        assert_eq!(engine.cached_program_count(), 0);
    }

    #[test]
    fn backend_failure_is_not_cached() {
        let (mut engine, backend) = engine();
        backend.reject(program_names::HISTOGRAM);
        let err = engine
            .request_shader(
                program_names::HISTOGRAM,
                &[names::SHADE_COLORMAP_VALUE],
                DefaultsPolicy::Process,
            )
            .unwrap_err();
        assert!(matches!(err, RenderError::Backend { .. }));
        assert_eq!(engine.cached_program_count(), 0);
    }

    #[test]
    fn refresh_forces_recomposition() {
        let (mut engine, backend) = engine();
        let first = engine
            .request_shader(
                program_names::MESH,
                &[names::SHADE_BASECOLOR],
                DefaultsPolicy::SceneObject,
            )
            .unwrap();
        engine.refresh();
        let second = engine
            .request_shader(
                program_names::MESH,
                &[names::SHADE_BASECOLOR],
                DefaultsPolicy::SceneObject,
            )
            .unwrap();

        assert!(!Rc::ptr_eq(first.compiled(), second.compiled()));
        assert_eq!(first.composed(), second.composed());
        assert_eq!(backend.compile_count(), 2);
    }

    #[test]
    fn transparency_mode_swaps_scene_object_rule() {
        let (mut engine, _) = engine();
        assert_eq!(engine.transparency_mode(), TransparencyMode::None);
        engine.set_transparency_mode(TransparencyMode::Pretty);
        assert_eq!(engine.transparency_mode(), TransparencyMode::Pretty);
        assert_eq!(engine.cached_program_count(), 0);

        let program = engine
            .request_shader(
                program_names::MESH,
                &[names::SHADE_BASECOLOR],
                DefaultsPolicy::SceneObject,
            )
            .unwrap();
        assert!(program.rules().iter().any(|r| r == names::TRANSPARENCY_PEEL_STRUCTURE));
        assert!(program.has_texture("t_minDepth"));

        engine.set_transparency_mode(TransparencyMode::Simple);
        let program = engine
            .request_shader(
                program_names::MESH,
                &[names::SHADE_BASECOLOR],
                DefaultsPolicy::SceneObject,
            )
            .unwrap();
        assert!(program.rules().iter().any(|r| r == names::TRANSPARENCY_STRUCTURE));
        assert!(!program.has_texture("t_minDepth"));
    }

    #[test]
    fn slice_planes_apply_until_removed() {
        let (mut engine, _) = engine();
        let name = engine.add_slice_plane_rule("0").unwrap();
        assert_eq!(name, "SLICE_PLANE_CULL_0");
        assert_eq!(engine.slice_plane_rules(), ["SLICE_PLANE_CULL_0"]);

        let rules = [names::MESH_PROPAGATE_CULLPOS, names::SHADE_BASECOLOR];
        let culled = engine
            .request_shader(program_names::MESH, &rules, DefaultsPolicy::SceneObject)
            .unwrap();
        let uncut = engine
            .request_shader(program_names::MESH, &rules, DefaultsPolicy::SceneObjectNoSlice)
            .unwrap();
        let pick = engine
            .request_shader(
                program_names::MESH,
                &[names::MESH_PROPAGATE_CULLPOS],
                DefaultsPolicy::Pick,
            )
            .unwrap();
        assert!(culled.has_uniform("u_slicePlaneCenter_0"));
        assert!(!uncut.has_uniform("u_slicePlaneCenter_0"));
        assert!(pick.has_uniform("u_slicePlaneCenter_0"));

        assert!(engine.add_slice_plane_rule("0").is_err());
        assert!(engine.remove_slice_plane_rule("0"));
        assert!(!engine.remove_slice_plane_rule("0"));
        assert!(engine.slice_plane_rules().is_empty());
        assert!(!engine.rules().contains("SLICE_PLANE_CULL_0"));
        let after = engine
            .request_shader(program_names::MESH, &rules, DefaultsPolicy::SceneObject)
            .unwrap();
        assert!(!after.has_uniform("u_slicePlaneCenter_0"));
    }

    #[test]
    fn user_programs_and_rules_are_registered_once() {
        let (mut engine, _) = engine();
        let custom = ShaderReplacementRule::new("CUSTOM_TINT")
            .replace("TEXTURE_OUT_ADJUST", "textureOut.rgb *= 0.5;");
        engine.register_rule(custom.clone()).unwrap();
        assert!(matches!(
            engine.register_rule(custom),
            Err(RenderError::Rules(ComposeError::DuplicateRule { .. }))
        ));

        let mut program = builtin::programs().remove(0);
        assert!(engine.has_program(&program.name));
        assert!(matches!(
            engine.register_program(program.clone()),
            Err(RenderError::DuplicateProgram { .. })
        ));
        program.name = "MESH_COPY".to_string();
        engine.register_program(program.clone()).unwrap();
        assert!(engine.has_program("MESH_COPY"));
        assert!(matches!(
            engine.register_program(program),
            Err(RenderError::DuplicateProgram { .. })
        ));

        let tinted = engine
            .request_shader(
                program_names::TEXTURE_DRAW_PLAIN,
                &["CUSTOM_TINT"],
                DefaultsPolicy::Process,
            )
            .unwrap();
        assert!(tinted.composed().stages[1].source.contains("textureOut.rgb *= 0.5;"));
    }

    #[test]
    fn annotation_follows_options() {
        let backend = RecordingBackend::new();
        let options = Options {
            annotate_shader_sources: true,
            ..Options::default()
        };
        let rules = RuleRegistry::with_builtin_rules(Dialect::Gl3);
        let mut engine = Engine::with_rules(options, rules, backend.clone());
        engine
            .request_shader(
                program_names::MESH,
                &[names::SHADE_BASECOLOR],
                DefaultsPolicy::SceneObject,
            )
            .unwrap();

        let composed = backend.last().unwrap();
        assert!(composed.stages[1].source.contains("// from rule: SHADE_BASECOLOR"));
    }

    #[test]
    fn readiness_checks_follow_options() {
        let backend = RecordingBackend::new();
        let strict = Options {
            enable_render_error_checks: true,
            ..Options::default()
        };
        let rules = RuleRegistry::with_builtin_rules(Dialect::Gl3);
        let mut engine = Engine::with_rules(strict, rules, backend);
        let program = engine
            .request_shader(
                program_names::TEXTURE_DRAW_PLAIN,
                &[] as &[&str],
                DefaultsPolicy::Process,
            )
            .unwrap();
        assert!(matches!(
            engine.check_ready(&program),
            Err(RenderError::MissingData { .. })
        ));
    }
}
