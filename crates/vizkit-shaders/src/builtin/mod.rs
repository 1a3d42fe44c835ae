//! Built-in rules and base programs.

mod programs;
mod rules;

pub use programs::programs;
pub use rules::{rules, slice_plane_rule};

/// Names of the built-in rules.
pub mod names {
    pub const GLSL_VERSION: &str = "GLSL_VERSION";
    pub const GLOBAL_FRAGMENT_FILTER: &str = "GLOBAL_FRAGMENT_FILTER";
    pub const LIGHT_MATCAP: &str = "LIGHT_MATCAP";
    pub const LIGHT_PASSTHRU: &str = "LIGHT_PASSTHRU";
    pub const SHADE_BASECOLOR: &str = "SHADE_BASECOLOR";
    pub const SHADE_COLOR: &str = "SHADE_COLOR";
    pub const SHADE_COLORMAP_VALUE: &str = "SHADE_COLORMAP_VALUE";
    pub const SHADEVALUE_MAG_VALUE2: &str = "SHADEVALUE_MAG_VALUE2";
    pub const ISOLINE_STRIPE_VALUECOLOR: &str = "ISOLINE_STRIPE_VALUECOLOR";
    pub const GENERATE_VIEW_POS: &str = "GENERATE_VIEW_POS";
    pub const CULL_POS_FROM_VIEW: &str = "CULL_POS_FROM_VIEW";
    pub const TRANSPARENCY_STRUCTURE: &str = "TRANSPARENCY_STRUCTURE";
    pub const TRANSPARENCY_PEEL_STRUCTURE: &str = "TRANSPARENCY_PEEL_STRUCTURE";
    pub const MESH_PROPAGATE_VALUE: &str = "MESH_PROPAGATE_VALUE";
    pub const MESH_PROPAGATE_VALUE2: &str = "MESH_PROPAGATE_VALUE2";
    pub const MESH_PROPAGATE_COLOR: &str = "MESH_PROPAGATE_COLOR";
    pub const MESH_PROPAGATE_CULLPOS: &str = "MESH_PROPAGATE_CULLPOS";

    /// Prefix of generated slice-plane culling rules.
    pub const SLICE_PLANE_CULL_PREFIX: &str = "SLICE_PLANE_CULL_";
}

/// Names of the built-in base programs.
pub mod program_names {
    pub const MESH: &str = "MESH";
    pub const INDEXED_MESH: &str = "INDEXED_MESH";
    pub const TEXTURE_DRAW_PLAIN: &str = "TEXTURE_DRAW_PLAIN";
    pub const HISTOGRAM: &str = "HISTOGRAM";
}
