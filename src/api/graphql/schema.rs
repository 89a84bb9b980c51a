//! Schema assembly.
//!
//! Each resolver module describes what it contributes with a
//! [`SchemaModule`]: the types it owns and a function that reads the root
//! fields off its resolver fragments. Assembly merges those, refusing two
//! modules that define the same type or root field, then builds the
//! executable schema and checks its SDL against the merged description so
//! a shadowed or unregistered resolver is a startup error rather than a
//! silent overwrite.

use async_graphql::{
    extensions, ObjectType, OutputType, Schema, SchemaBuilder, SubscriptionType,
};
use async_graphql::parser::{
    parse_schema,
    types::{TypeKind, TypeSystemDefinition},
};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

use crate::api::graphql::{
    context::ApiContext,
    pubsub::ForumEvents,
    resolvers::{MutationRoot, QueryRoot, SubscriptionRoot, MODULES},
};

/// Type alias for the complete GraphQL schema
#[allow(clippy::module_name_repetitions)]
pub type ForumSchema = Schema<QueryRoot, MutationRoot, SubscriptionRoot>;

pub const MAX_DEPTH: usize = 10;
pub const MAX_COMPLEXITY: usize = 500;

/// Root fields keyed by the root they hang off.
pub type RootFields = BTreeSet<(RootKind, String)>;

/// What one resolver module contributes to the schema.
#[derive(Debug, Clone, Copy)]
pub struct SchemaModule {
    pub name: &'static str,
    /// Object, enum and input types this module owns
    pub types: &'static [&'static str],
    /// Root fields defined by the module's resolver fragments, usually
    /// [`fragment_fields`] instantiated with them
    pub fields: fn() -> Result<RootFields, AssemblyError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RootKind {
    Query,
    Mutation,
    Subscription,
}

impl fmt::Display for RootKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Query => "Query",
            Self::Mutation => "Mutation",
            Self::Subscription => "Subscription",
        })
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("type `{type_name}` is defined by both `{first}` and `{second}`")]
    DuplicateType {
        type_name: String,
        first: String,
        second: String,
    },

    #[error("{root}.{field} is resolved by both `{first}` and `{second}`")]
    DuplicateField {
        root: RootKind,
        field: String,
        first: String,
        second: String,
    },

    #[error("{root}.{field} exists in the schema but no module declares it")]
    Unregistered { root: RootKind, field: String },

    #[error("`{name}` is declared by module `{module}` but missing from the schema")]
    Missing { name: String, module: String },

    #[error("generated SDL could not be parsed: {0}")]
    Sdl(String),
}

/// Read the root fields off a module's query, mutation and subscription
/// fragments by building a schema out of them alone. Use the `Empty*`
/// types for roots the module does not extend.
///
/// # Errors
/// Returns an error if the fragment schema's SDL cannot be parsed.
pub fn fragment_fields<Q, M, S>() -> Result<RootFields, AssemblyError>
where
    Q: ObjectType + Default + 'static,
    M: ObjectType + Default + 'static,
    S: SubscriptionType + Default + 'static,
{
    let sdl = Schema::build(Q::default(), M::default(), S::default())
        .finish()
        .sdl();
    Ok(read_sdl(&sdl, &RootNames::of::<Q, M, S>())?.fields)
}

/// Merged view of every module: who owns which type and root field.
#[derive(Debug, Default)]
pub struct Manifest {
    types: BTreeMap<&'static str, &'static str>,
    fields: BTreeMap<(RootKind, String), &'static str>,
}

impl Manifest {
    /// # Errors
    /// Returns the first type or root field defined twice.
    pub fn merge(modules: &[SchemaModule]) -> Result<Self, AssemblyError> {
        let mut manifest = Self::default();

        for module in modules {
            for &type_name in module.types {
                if let Some(first) = manifest.types.insert(type_name, module.name) {
                    return Err(AssemblyError::DuplicateType {
                        type_name: type_name.to_string(),
                        first: first.to_string(),
                        second: module.name.to_string(),
                    });
                }
            }

            for (root, field) in (module.fields)()? {
                if let Some(first) = manifest.fields.insert((root, field.clone()), module.name) {
                    return Err(AssemblyError::DuplicateField {
                        root,
                        field,
                        first: first.to_string(),
                        second: module.name.to_string(),
                    });
                }
            }
        }

        Ok(manifest)
    }

    /// Compare against the SDL of a built schema whose root object types
    /// are named `roots`.
    ///
    /// # Errors
    /// Returns an error if a declared type or field is absent, or if a root
    /// field exists that no module defines.
    pub fn reconcile(&self, sdl: &str, roots: &RootNames) -> Result<(), AssemblyError> {
        let summary = read_sdl(sdl, roots)?;

        for (type_name, module) in &self.types {
            if !summary.types.contains(*type_name) {
                return Err(AssemblyError::Missing {
                    name: (*type_name).to_string(),
                    module: (*module).to_string(),
                });
            }
        }

        for (key, module) in &self.fields {
            if !summary.fields.contains(key) {
                let (root, field) = key;
                return Err(AssemblyError::Missing {
                    name: format!("{root}.{field}"),
                    module: (*module).to_string(),
                });
            }
        }

        for (root, field) in summary.fields {
            if !self.fields.contains_key(&(root, field.clone())) {
                return Err(AssemblyError::Unregistered { root, field });
            }
        }

        Ok(())
    }
}

struct SdlSummary {
    types: BTreeSet<String>,
    fields: RootFields,
}

fn read_sdl(sdl: &str, roots: &RootNames) -> Result<SdlSummary, AssemblyError> {
    let document = parse_schema(sdl).map_err(|e| AssemblyError::Sdl(e.to_string()))?;

    let mut types = BTreeSet::new();
    let mut fields = RootFields::new();

    for definition in document.definitions {
        let TypeSystemDefinition::Type(ty) = definition else {
            continue;
        };
        let name = ty.node.name.node.as_str().to_string();
        if let (Some(root), TypeKind::Object(object)) = (roots.kind_of(&name), &ty.node.kind) {
            for field in &object.fields {
                fields.insert((root, field.node.name.node.as_str().to_string()));
            }
        }
        types.insert(name);
    }

    Ok(SdlSummary { types, fields })
}

/// GraphQL names of the three root types.
#[derive(Debug, Clone)]
pub struct RootNames {
    pub query: String,
    pub mutation: String,
    pub subscription: String,
}

impl RootNames {
    #[must_use]
    pub fn of<Q, M, S>() -> Self
    where
        Q: OutputType,
        M: OutputType,
        S: SubscriptionType,
    {
        Self {
            query: <Q as OutputType>::type_name().into_owned(),
            mutation: <M as OutputType>::type_name().into_owned(),
            subscription: <S as SubscriptionType>::type_name().into_owned(),
        }
    }

    fn kind_of(&self, name: &str) -> Option<RootKind> {
        if name == self.query {
            Some(RootKind::Query)
        } else if name == self.mutation {
            Some(RootKind::Mutation)
        } else if name == self.subscription {
            Some(RootKind::Subscription)
        } else {
            None
        }
    }
}

/// Builds an executable schema from an explicit list of modules.
pub struct SchemaAssembler<Q, M, S> {
    modules: Vec<SchemaModule>,
    builder: SchemaBuilder<Q, M, S>,
}

impl<Q, M, S> SchemaAssembler<Q, M, S>
where
    Q: ObjectType + 'static,
    M: ObjectType + 'static,
    S: SubscriptionType + 'static,
{
    pub fn new(query: Q, mutation: M, subscription: S) -> Self {
        Self {
            modules: Vec::new(),
            builder: Schema::build(query, mutation, subscription),
        }
    }

    #[must_use]
    pub fn modules(mut self, modules: &[SchemaModule]) -> Self {
        self.modules.extend_from_slice(modules);
        self
    }

    /// Attach process-wide data available to every resolver.
    #[must_use]
    pub fn data<D: Any + Send + Sync>(mut self, data: D) -> Self {
        self.builder = self.builder.data(data);
        self
    }

    #[must_use]
    pub fn configure(
        mut self,
        f: impl FnOnce(SchemaBuilder<Q, M, S>) -> SchemaBuilder<Q, M, S>,
    ) -> Self {
        self.builder = f(self.builder);
        self
    }

    /// # Errors
    /// Returns an error when modules overlap or disagree with the built schema.
    pub fn assemble(self) -> Result<Schema<Q, M, S>, AssemblyError> {
        let manifest = Manifest::merge(&self.modules)?;
        let schema = self.builder.finish();

        manifest.reconcile(&schema.sdl(), &RootNames::of::<Q, M, S>())?;

        Ok(schema)
    }
}

/// The forum's module list with its limits and extensions, without data.
#[must_use]
pub fn forum_assembler() -> SchemaAssembler<QueryRoot, MutationRoot, SubscriptionRoot> {
    SchemaAssembler::new(
        QueryRoot::default(),
        MutationRoot::default(),
        SubscriptionRoot::default(),
    )
    .modules(&MODULES)
    .configure(|builder| {
        builder
            .extension(extensions::Tracing)
            .limit_depth(MAX_DEPTH)
            .limit_complexity(MAX_COMPLEXITY)
    })
}

/// Create the executable schema with its shared resources attached.
///
/// # Errors
/// Returns an error if the registered modules conflict.
#[allow(clippy::module_name_repetitions)]
pub fn create_schema(api: ApiContext, events: ForumEvents) -> Result<ForumSchema, AssemblyError> {
    forum_assembler().data(api).data(events).assemble()
}

/// The merged type document.
///
/// # Errors
/// Returns an error if the registered modules conflict.
pub fn schema_sdl() -> Result<String, AssemblyError> {
    Ok(forum_assembler().assemble()?.sdl())
}
