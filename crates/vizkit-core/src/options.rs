//! Viewer-wide settings.

/// How transparent surfaces are composited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransparencyMode {
    /// Opaque rendering.
    #[default]
    None,
    /// Single-pass alpha blending.
    Simple,
    /// Depth peeling.
    Pretty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub program_name: String,
    /// 0 = errors only, 1 = warnings, 2 = info, 3 = debug, 4+ = trace.
    pub verbosity: u8,
    /// Prefix for messages printed to the terminal.
    pub print_prefix: String,
    /// Precede every rule contribution in composed shader source with
    /// `// from rule: NAME`.
    pub annotate_shader_sources: bool,
    /// Check that every declared program input is set before a draw is
    /// reported ready.
    pub enable_render_error_checks: bool,
    pub transparency_mode: TransparencyMode,
    pub max_fps: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            program_name: "vizkit".to_string(),
            verbosity: 2,
            print_prefix: "[vizkit] ".to_string(),
            annotate_shader_sources: false,
            enable_render_error_checks: cfg!(debug_assertions),
            transparency_mode: TransparencyMode::None,
            max_fps: 60,
        }
    }
}

impl Options {
    /// Environment variable overriding [`Options::verbosity`].
    pub const VERBOSITY_VAR: &'static str = "VIZKIT_VERBOSITY";

    /// Defaults, with `verbosity` taken from `VIZKIT_VERBOSITY` when it parses.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Some(verbosity) = std::env::var(Self::VERBOSITY_VAR)
            .ok()
            .and_then(|v| v.trim().parse().ok())
        {
            options.verbosity = verbosity;
        }
        options
    }
}
