//! Name → rule table for one dialect.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::builtin;
use crate::compose::{
    compose_program, compose_stage, ComposedProgram, ComposedStage, StructuralDefaults,
};
use crate::dialect::Dialect;
use crate::error::ComposeError;
use crate::types::{ProgramSpec, ShaderReplacementRule, ShaderStageSpecification};

/// Rules available to compositions, keyed by name, plus the structural
/// defaults of the dialect.
///
/// Populated once at startup; rules may be added or removed later (slice
/// planes, user shaders), but composition only ever reads it.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    dialect: Dialect,
    rules: HashMap<String, ShaderReplacementRule>,
    structural_defaults: StructuralDefaults,
}

impl RuleRegistry {
    /// Registry with no rules.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            rules: HashMap::new(),
            structural_defaults: StructuralDefaults::for_dialect(dialect),
        }
    }

    /// Registry holding the built-in rule set of `dialect`.
    pub fn with_builtin_rules(dialect: Dialect) -> Self {
        let mut registry = Self::new(dialect);
        for rule in builtin::rules(dialect) {
            registry.rules.insert(rule.name.clone(), rule);
        }
        info!(%dialect, count = registry.rules.len(), "registered built-in shader rules");
        registry
    }

    /// Built-in rules of [`Dialect::ACTIVE`].
    pub fn active() -> Self {
        Self::with_builtin_rules(Dialect::ACTIVE)
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Add a rule. Names are unique; registering a taken name fails.
    pub fn register(&mut self, rule: ShaderReplacementRule) -> Result<(), ComposeError> {
        if self.rules.contains_key(&rule.name) {
            return Err(ComposeError::DuplicateRule { name: rule.name });
        }
        debug!(rule = %rule.name, "registered shader rule");
        self.rules.insert(rule.name.clone(), rule);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<ShaderReplacementRule> {
        self.rules.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&ShaderReplacementRule> {
        self.rules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Registered rule names, sorted.
    pub fn rule_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn structural_defaults(&self) -> &StructuralDefaults {
        &self.structural_defaults
    }

    pub fn structural_defaults_mut(&mut self) -> &mut StructuralDefaults {
        &mut self.structural_defaults
    }

    /// Look up `names` in order. A name repeated later in the list is applied
    /// only at its first occurrence. Fails on the first unknown name.
    pub fn resolve<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<&ShaderReplacementRule>, ComposeError> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            if !seen.insert(name) {
                debug!(rule = name, "skipping repeated shader rule");
                continue;
            }
            let rule = self.rules.get(name).ok_or_else(|| ComposeError::UnknownRule {
                name: name.to_string(),
                dialect: self.dialect,
            })?;
            resolved.push(rule);
        }
        Ok(resolved)
    }

    pub fn compose_stage<S: AsRef<str>>(
        &self,
        base: &ShaderStageSpecification,
        names: &[S],
        annotate: bool,
    ) -> Result<ComposedStage, ComposeError> {
        let rules = self.resolve(names)?;
        compose_stage(base, &rules, &self.structural_defaults, annotate)
    }

    pub fn compose_program<S: AsRef<str>>(
        &self,
        program: &ProgramSpec,
        names: &[S],
        annotate: bool,
    ) -> Result<ComposedProgram, ComposeError> {
        let rules = self.resolve(names)?;
        compose_program(program, &rules, &self.structural_defaults, annotate)
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::active()
    }
}
