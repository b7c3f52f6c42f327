//! Step token resolution.
//!
//! Callers request steps as tokens: atomic ids (`j2v8cpp`), aliases (`java`),
//! composites (`all`, `native`, `j2v8`) and anti-steps (`~nodejs`). Every
//! token is evaluated in request order against one accumulator set, so the
//! last token touching an atomic step decides whether it runs. The result is
//! then filtered into the canonical order, which means the order tokens were
//! given in never changes the order steps run in.
//!
//! Negating a composite flips the polarity of everything it touches: `~j2v8`
//! removes what `j2v8` includes and adds back what `j2v8` excludes.
//! Composite membership is looked up at evaluation time, never cached.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use thiserror::Error;

use crate::consts::ANTI_STEP_PREFIX;

use super::Step;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
  #[error("unknown build-step \"{0}\"")]
  UnknownStep(String),

  #[error("no build-steps to be done")]
  NothingToDo,

  #[error("build-step \"{0}\" is already registered")]
  Duplicate(String),

  #[error("composite \"{composite}\" refers to unregistered build-step \"{member}\"")]
  UnknownMember { composite: String, member: String },

  #[error("invalid build-step name \"{0}\"")]
  InvalidName(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Polarity {
  Add,
  Remove,
}

impl Polarity {
  fn flip(self) -> Self {
    match self {
      Polarity::Add => Polarity::Remove,
      Polarity::Remove => Polarity::Add,
    }
  }
}

#[derive(Debug, Clone)]
enum Evaluator {
  Atomic(Step),
  Composite { include: Vec<String>, exclude: Vec<String> },
}

/// What a registered token stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "step")]
pub enum StepKind {
  Atomic,
  Alias(Step),
  Composite,
}

#[derive(Debug, Clone)]
struct Entry {
  evaluator: Evaluator,
  kind: StepKind,
  help: String,
}

/// A registered token as shown in step listings.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry<'a> {
  pub token: &'a str,
  #[serde(flatten)]
  pub kind: StepKind,
  pub help: &'a str,
}

/// Registry of step tokens and the evaluators behind them.
#[derive(Debug, Clone, Default)]
pub struct StepRegistry {
  entries: BTreeMap<String, Entry>,
  order: Vec<String>,
}

impl StepRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// The registry used by every build: atomic steps, `java`/`test` aliases and
  /// the `all`, `native` and `j2v8` composites.
  pub fn standard() -> Self {
    let mut registry = Self::new();

    for step in Step::ALL {
      registry.push(step.as_str(), Evaluator::Atomic(step), StepKind::Atomic, step.help());
    }
    for (alias, step) in [("java", Step::J2v8Java), ("test", Step::J2v8Test)] {
      registry.push(alias, Evaluator::Atomic(step), StepKind::Alias(step), &format!("Alias for {step}"));
    }

    let composite = |include: &[Step], exclude: &[Step]| Evaluator::Composite {
      include: include.iter().map(|s| s.as_str().to_string()).collect(),
      exclude: exclude.iter().map(|s| s.as_str().to_string()).collect(),
    };

    registry.push("all", composite(&Step::ALL, &[]), StepKind::Composite, "Runs every build step");
    registry.push(
      "native",
      composite(
        &[
          Step::NodeJs,
          Step::J2v8Cmake,
          Step::J2v8Jni,
          Step::J2v8Cpp,
          Step::J2v8Optimize,
        ],
        &[],
      ),
      StepKind::Composite,
      "Builds only the native parts, including the Node.js runtime",
    );
    registry.push(
      "j2v8",
      Evaluator::Composite {
        include: vec!["all".to_string()],
        exclude: vec![Step::NodeJs.as_str().to_string(), Step::J2v8Test.as_str().to_string()],
      },
      StepKind::Composite,
      "Builds everything that belongs to J2V8, without the Node.js runtime and tests",
    );

    registry
  }

  fn push(&mut self, name: &str, evaluator: Evaluator, kind: StepKind, help: &str) {
    self.entries.insert(
      name.to_string(),
      Entry {
        evaluator,
        kind,
        help: help.to_string(),
      },
    );
    self.order.push(name.to_string());
  }

  fn insert(&mut self, name: &str, evaluator: Evaluator, kind: StepKind, help: &str) -> Result<(), ResolveError> {
    if name.is_empty() || name.starts_with(ANTI_STEP_PREFIX) {
      return Err(ResolveError::InvalidName(name.to_string()));
    }
    if self.entries.contains_key(name) {
      return Err(ResolveError::Duplicate(name.to_string()));
    }
    self.push(name, evaluator, kind, help);
    Ok(())
  }

  /// Register an atomic step under its own id (and its `~` anti-step).
  pub fn register_atomic(&mut self, step: Step) -> Result<(), ResolveError> {
    self.insert(step.as_str(), Evaluator::Atomic(step), StepKind::Atomic, step.help())
  }

  /// Register another name for an atomic step.
  pub fn register_alias(&mut self, alias: &str, step: Step) -> Result<(), ResolveError> {
    self.insert(
      alias,
      Evaluator::Atomic(step),
      StepKind::Alias(step),
      &format!("Alias for {step}"),
    )
  }

  /// Register a composite token.
  ///
  /// Members must already be registered, which also rules out cycles.
  pub fn register_composite(
    &mut self,
    name: &str,
    include: &[&str],
    exclude: &[&str],
    help: &str,
  ) -> Result<(), ResolveError> {
    if let Some(member) = include.iter().chain(exclude).find(|m| !self.entries.contains_key(**m)) {
      return Err(ResolveError::UnknownMember {
        composite: name.to_string(),
        member: member.to_string(),
      });
    }

    let evaluator = Evaluator::Composite {
      include: include.iter().map(|m| m.to_string()).collect(),
      exclude: exclude.iter().map(|m| m.to_string()).collect(),
    };
    self.insert(name, evaluator, StepKind::Composite, help)
  }

  /// Whether `token` (possibly an anti-step) is known.
  pub fn contains(&self, token: &str) -> bool {
    let name = token.strip_prefix(ANTI_STEP_PREFIX).unwrap_or(token);
    self.entries.contains_key(name)
  }

  /// Registered tokens in registration order.
  pub fn catalog(&self) -> impl Iterator<Item = CatalogEntry<'_>> {
    self.order.iter().filter_map(|name| {
      self.entries.get(name).map(|entry| CatalogEntry {
        token: name,
        kind: entry.kind,
        help: &entry.help,
      })
    })
  }

  /// Resolve requested tokens into a plan ordered by `canonical`.
  ///
  /// # Errors
  ///
  /// - [`ResolveError::UnknownStep`] for the first token that is not registered
  /// - [`ResolveError::NothingToDo`] if no step survives
  pub fn resolve<S: AsRef<str>>(&self, requested: &[S], canonical: &[Step]) -> Result<ResolvedPlan, ResolveError> {
    self.resolve_seeded([], requested, canonical)
  }

  /// Like [`StepRegistry::resolve`], with `seed` steps already in the
  /// accumulator before the first token is evaluated.
  pub fn resolve_seeded<S: AsRef<str>>(
    &self,
    seed: impl IntoIterator<Item = Step>,
    requested: &[S],
    canonical: &[Step],
  ) -> Result<ResolvedPlan, ResolveError> {
    let mut accumulator: BTreeSet<Step> = seed.into_iter().collect();

    for token in requested {
      self.evaluate(token.as_ref(), &mut accumulator)?;
    }

    let steps: Vec<Step> = canonical
      .iter()
      .copied()
      .filter(|step| accumulator.contains(step))
      .collect();

    if steps.is_empty() {
      return Err(ResolveError::NothingToDo);
    }

    Ok(ResolvedPlan { steps })
  }

  fn evaluate(&self, token: &str, accumulator: &mut BTreeSet<Step>) -> Result<(), ResolveError> {
    let (name, polarity) = match token.strip_prefix(ANTI_STEP_PREFIX) {
      Some(name) => (name, Polarity::Remove),
      None => (token, Polarity::Add),
    };

    if !self.entries.contains_key(name) {
      return Err(ResolveError::UnknownStep(token.to_string()));
    }

    self.apply(name, polarity, accumulator);
    Ok(())
  }

  fn apply(&self, name: &str, polarity: Polarity, accumulator: &mut BTreeSet<Step>) {
    // Membership was checked at registration; entries are never removed.
    let Some(entry) = self.entries.get(name) else {
      return;
    };

    match &entry.evaluator {
      Evaluator::Atomic(step) => match polarity {
        Polarity::Add => {
          accumulator.insert(*step);
        }
        Polarity::Remove => {
          accumulator.remove(step);
        }
      },
      Evaluator::Composite { include, exclude } => {
        for member in include {
          self.apply(member, polarity, accumulator);
        }
        for member in exclude {
          self.apply(member, polarity.flip(), accumulator);
        }
      }
    }
  }
}

/// Atomic steps to run, in canonical order and without duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedPlan {
  steps: Vec<Step>,
}

impl ResolvedPlan {
  pub fn steps(&self) -> &[Step] {
    &self.steps
  }

  pub fn contains(&self, step: Step) -> bool {
    self.steps.contains(&step)
  }

  pub fn len(&self) -> usize {
    self.steps.len()
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = Step> + '_ {
    self.steps.iter().copied()
  }
}

impl std::fmt::Display for ResolvedPlan {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let ids: Vec<&str> = self.steps.iter().map(Step::as_str).collect();
    write!(f, "{}", ids.join(", "))
  }
}
