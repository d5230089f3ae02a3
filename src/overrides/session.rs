use serde::Serialize;
use tracing::debug;

use crate::overrides::{
    BaselineEntry, OverrideError, OverrideKind, ResolvedOverride, apply_overrides, parse_override,
    resolve_override,
};

/// State of one override editing session.
///
/// The baseline never changes. Overrides are only appended, popped (undo) or cleared (reset),
/// and the effective list is recomputed from the baseline after every change.
#[derive(Debug, Clone)]
pub struct OverrideSession<K: OverrideKind> {
    kind: K,
    baseline: Vec<BaselineEntry>,
    applied: Vec<ResolvedOverride>,
    effective: Vec<BaselineEntry>,
}

/// Result of a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverrideOutcome {
    pub effective: Vec<BaselineEntry>,
    pub overrides: Vec<ResolvedOverride>,
}

impl<K: OverrideKind> OverrideSession<K> {
    pub fn new(kind: K, baseline: Vec<BaselineEntry>) -> Self {
        let effective = apply_overrides(&baseline, &[]);
        Self {
            kind,
            baseline,
            applied: Vec::new(),
            effective,
        }
    }

    pub fn kind(&self) -> K {
        self.kind
    }

    pub fn baseline(&self) -> &[BaselineEntry] {
        &self.baseline
    }

    pub fn applied(&self) -> &[ResolvedOverride] {
        &self.applied
    }

    pub fn effective(&self) -> &[BaselineEntry] {
        &self.effective
    }

    /// Parse and resolve `raw` against the baseline.
    pub fn resolve(&self, raw: &str) -> Result<ResolvedOverride, OverrideError> {
        let ambiguous = parse_override(&self.kind, raw)?;
        resolve_override(&self.kind, &ambiguous, &self.baseline)
    }

    /// Apply a value to every entry, ahead of any other override.
    pub fn seed_default_value(&mut self, value: &str) {
        let value = value.trim();
        if !value.is_empty() {
            self.push(ResolvedOverride::universal(value));
        }
    }

    /// Apply overrides given on the command line.
    ///
    /// Strings that don't parse or resolve are skipped.
    pub fn seed<S: AsRef<str>>(&mut self, raw_overrides: &[S]) {
        for raw in raw_overrides {
            let raw = raw.as_ref();
            match self.resolve(raw) {
                Ok(resolved) => self.push(resolved),
                Err(e) => debug!(raw, error = %e, "ignoring {} override", self.kind.noun()),
            }
        }
    }

    pub fn push(&mut self, resolved: ResolvedOverride) {
        debug!(%resolved, "applying override");
        self.applied.push(resolved);
        self.recompute();
    }

    /// Remove the most recent override. Returns `false` if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.applied.pop() {
            Some(removed) => {
                debug!(%removed, "undoing override");
                self.recompute();
                true
            }
            None => false,
        }
    }

    /// Drop every override, including the ones seeded from the command line.
    pub fn reset(&mut self) {
        debug!(count = self.applied.len(), "resetting overrides");
        self.applied.clear();
        self.recompute();
    }

    /// First effective entry that still has no value.
    pub fn first_unresolved(&self) -> Option<&BaselineEntry> {
        self.effective.iter().find(|entry| entry.is_unresolved())
    }

    pub fn finish(self) -> OverrideOutcome {
        OverrideOutcome {
            effective: self.effective,
            overrides: self.applied,
        }
    }

    fn recompute(&mut self) {
        self.effective = apply_overrides(&self.baseline, &self.applied);
    }
}
