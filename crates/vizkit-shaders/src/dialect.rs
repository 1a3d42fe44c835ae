//! Shader dialects.
//!
//! Every dialect has its own rule table. Exactly one is active per build,
//! chosen by the `legacy-gl` cargo feature; the others stay constructible for
//! tests and tools.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// OpenGL 3.3 core profile.
    Gl3,
    /// OpenGL 3.2 contexts without the 3.3 core features.
    LegacyGl,
}

impl Dialect {
    /// Dialect selected at compile time.
    #[cfg(not(feature = "legacy-gl"))]
    pub const ACTIVE: Dialect = Dialect::Gl3;
    #[cfg(feature = "legacy-gl")]
    pub const ACTIVE: Dialect = Dialect::LegacyGl;

    /// Every dialect, in declaration order.
    pub const ALL: [Dialect; 2] = [Dialect::Gl3, Dialect::LegacyGl];

    /// Lines every stage of this dialect starts with: the `#version`
    /// directive plus any extensions the shared templates rely on.
    pub fn preamble(self) -> &'static str {
        match self {
            Dialect::Gl3 => "#version 330 core",
            Dialect::LegacyGl => {
                "#version 150\n#extension GL_ARB_explicit_attrib_location : require"
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dialect::Gl3 => "gl3",
            Dialect::LegacyGl => "legacy-gl",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
