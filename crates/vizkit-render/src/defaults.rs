//! Rules implicitly prepended to every shader request.

use vizkit_core::TransparencyMode;
use vizkit_shaders::builtin::names;

/// Which canned set of rules a request starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DefaultsPolicy {
    /// Lit scene geometry: version, fragment filter, matcap lighting, the
    /// transparency rule of the current mode and every slice-plane cull rule.
    #[default]
    SceneObject,
    /// [`SceneObject`](Self::SceneObject) without slice-plane culling, for
    /// geometry that must never be cut away.
    SceneObjectNoSlice,
    /// Flat-colored pick buffer rendering. Slice planes cull here too, so
    /// hidden geometry cannot be picked.
    Pick,
    /// Screen-space processing passes; only the version directive.
    Process,
    /// Nothing implicit.
    None,
}

/// Transparency rule for scene objects, if the mode needs one.
pub fn transparency_rule(mode: TransparencyMode) -> Option<&'static str> {
    match mode {
        TransparencyMode::None => None,
        TransparencyMode::Simple => Some(names::TRANSPARENCY_STRUCTURE),
        TransparencyMode::Pretty => Some(names::TRANSPARENCY_PEEL_STRUCTURE),
    }
}

/// Rule names `policy` prepends, in order.
pub fn default_rules(
    policy: DefaultsPolicy,
    transparency: TransparencyMode,
    slice_planes: &[String],
) -> Vec<String> {
    let mut rules: Vec<String> = Vec::new();
    let mut push = |name: &str| rules.push(name.to_string());

    match policy {
        DefaultsPolicy::SceneObject | DefaultsPolicy::SceneObjectNoSlice => {
            push(names::GLSL_VERSION);
            push(names::GLOBAL_FRAGMENT_FILTER);
            push(names::LIGHT_MATCAP);
            if let Some(rule) = transparency_rule(transparency) {
                push(rule);
            }
            if policy == DefaultsPolicy::SceneObject {
                for plane in slice_planes {
                    push(plane);
                }
            }
        }
        DefaultsPolicy::Pick => {
            push(names::GLSL_VERSION);
            push(names::GLOBAL_FRAGMENT_FILTER);
            push(names::SHADE_COLOR);
            push(names::LIGHT_PASSTHRU);
            for plane in slice_planes {
                push(plane);
            }
        }
        DefaultsPolicy::Process => push(names::GLSL_VERSION),
        DefaultsPolicy::None => {}
    }
    rules
}
