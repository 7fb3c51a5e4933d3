//! Duck-typing facade

use std::sync::Arc;

use mallard_types::Shape;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::adapter::Adapter;
use crate::convert::ConverterRegistry;
use crate::error::{DuckError, DuckResult};
use crate::inspect::{Inspector, ResolutionPlan, Source};
use crate::options::DuckOptions;

/// Memo key: the target shape and the object's concrete type. The schema is
/// part of the key because two host types may share a name.
#[derive(PartialEq, Eq, Hash)]
struct PlanKey {
    shape: Arc<Shape>,
    type_name: String,
    schema: Arc<Shape>,
}

/// Entry point: checks sources against shapes and builds adapters.
///
/// The converter registry is shared and read-only. Plans for object
/// sources are memoised per (shape, concrete type); mapping plans depend on
/// the mapping's current keys and are rebuilt on every request.
///
/// The object memo holds one plan per distinct (shape, concrete type) pair
/// and is never evicted; long-lived typers that see many generated types
/// should call [`DuckTyper::clear_plans`] periodically.
pub struct DuckTyper {
    registry: Arc<ConverterRegistry>,
    options: DuckOptions,
    plans: RwLock<FxHashMap<PlanKey, Arc<ResolutionPlan>>>,
}

impl DuckTyper {
    /// Create a facade over the given converters with default options
    pub fn new(registry: Arc<ConverterRegistry>) -> Self {
        Self::with_options(registry, DuckOptions::default())
    }

    /// Create a facade with explicit options
    pub fn with_options(registry: Arc<ConverterRegistry>, options: DuckOptions) -> Self {
        Self {
            registry,
            options,
            plans: RwLock::new(FxHashMap::default()),
        }
    }

    /// Shared converter registry
    pub fn registry(&self) -> &Arc<ConverterRegistry> {
        &self.registry
    }

    /// Options in effect
    pub fn options(&self) -> &DuckOptions {
        &self.options
    }

    /// Number of memoised object plans
    pub fn memoized_plans(&self) -> usize {
        self.plans.read().len()
    }

    /// Drop every memoised object plan. Adapters already built keep theirs.
    pub fn clear_plans(&self) {
        let mut plans = self.plans.write();
        debug!(count = plans.len(), "clearing memoised plans");
        plans.clear();
    }

    /// Adapt a source to a shape, or report the members it cannot satisfy
    pub fn try_adapt(&self, shape: &Arc<Shape>, source: impl Into<Source>) -> DuckResult<Adapter> {
        let source = source.into();
        let plan = self.plan(shape, &source);
        if !plan.is_satisfiable() {
            let unresolved = plan.unresolved();
            debug!(
                shape = shape.name(),
                source = source.type_name(),
                ?unresolved,
                "adaptation failed"
            );
            return Err(DuckError::Unsatisfiable {
                shape: shape.name().to_string(),
                unresolved,
            });
        }

        Adapter::build(
            shape.clone(),
            source,
            plan,
            self.registry.clone(),
            self.options.clone(),
        )
    }

    /// Check whether a source satisfies a shape without building an adapter
    pub fn can_adapt(&self, shape: &Arc<Shape>, source: impl Into<Source>) -> bool {
        self.plan(shape, &source.into()).is_satisfiable()
    }

    /// Full resolution plan, including unresolved members
    pub fn explain(&self, shape: &Arc<Shape>, source: impl Into<Source>) -> ResolutionPlan {
        self.plan(shape, &source.into()).as_ref().clone()
    }

    fn plan(&self, shape: &Arc<Shape>, source: &Source) -> Arc<ResolutionPlan> {
        let inspector = Inspector::new(&self.registry, &self.options);
        let object = match source {
            Source::Object(object) if self.options.memoize_object_plans => object,
            _ => return Arc::new(inspector.inspect(shape, source)),
        };

        let key = PlanKey {
            shape: shape.clone(),
            type_name: object.type_name().to_string(),
            schema: object.schema(),
        };
        if let Some(plan) = self.plans.read().get(&key) {
            debug!(shape = shape.name(), source = %key.type_name, "plan memo hit");
            return plan.clone();
        }

        let plan = Arc::new(inspector.inspect(shape, source));
        debug!(
            shape = shape.name(),
            source = %key.type_name,
            satisfiable = plan.is_satisfiable(),
            "built object plan"
        );
        self.plans.write().entry(key).or_insert(plan).clone()
    }
}

impl Default for DuckTyper {
    fn default() -> Self {
        Self::new(Arc::new(ConverterRegistry::with_defaults()))
    }
}

impl std::fmt::Debug for DuckTyper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckTyper")
            .field("converters", &self.registry.len())
            .field("options", &self.options)
            .field("memoized_plans", &self.memoized_plans())
            .finish()
    }
}
