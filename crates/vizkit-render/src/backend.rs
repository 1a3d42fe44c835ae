//! The seam between composed shader programs and whatever compiles them.
//!
//! The engine never talks to a graphics API itself. A [`ProgramBackend`]
//! receives each freshly composed program once and returns an opaque ID; the
//! [`RecordingBackend`] keeps the compositions instead, for tests and tools
//! that inspect generated source.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use anyhow::bail;
use tracing::debug;
use vizkit_shaders::ComposedProgram;

/// Backend-side identifier of a compiled program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BackendProgramId(pub u64);

pub trait ProgramBackend {
    /// Compile a composed program. Called once per distinct
    /// `(program, rules)` combination until the engine is refreshed.
    fn compile(&mut self, program: &ComposedProgram) -> anyhow::Result<BackendProgramId>;
}

#[derive(Default)]
struct Recorded {
    compiled: Vec<ComposedProgram>,
    rejected: HashSet<String>,
}

/// Backend that records every composition it is asked to compile.
///
/// Clones share the same record, so a test can keep one clone while the
/// engine owns another.
#[derive(Clone, Default)]
pub struct RecordingBackend {
    inner: Rc<RefCell<Recorded>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every later compilation of `program`.
    pub fn reject(&self, program: impl Into<String>) {
        self.inner.borrow_mut().rejected.insert(program.into());
    }

    /// Number of successful compilations so far.
    pub fn compile_count(&self) -> usize {
        self.inner.borrow().compiled.len()
    }

    /// Most recent successful compilation.
    pub fn last(&self) -> Option<ComposedProgram> {
        self.inner.borrow().compiled.last().cloned()
    }

    pub fn compiled(&self) -> Vec<ComposedProgram> {
        self.inner.borrow().compiled.clone()
    }
}

impl ProgramBackend for RecordingBackend {
    fn compile(&mut self, program: &ComposedProgram) -> anyhow::Result<BackendProgramId> {
        let mut recorded = self.inner.borrow_mut();
        if recorded.rejected.contains(&program.program) {
            bail!("program `{}` rejected by recording backend", program.program);
        }
        recorded.compiled.push(program.clone());
        let id = BackendProgramId(recorded.compiled.len() as u64);
        debug!(program = %program.program, id = id.0, "recorded shader program");
        Ok(id)
    }
}
