//! Entity descriptors and statically checked column references.

use std::{
    any::TypeId,
    fmt,
    hash::{Hash, Hasher},
};

/// A type backed by a table. Replaces annotation-based table lookup.
pub trait Entity: 'static {
    const TABLE: &'static str;
    const SCHEMA: Option<&'static str> = None;
}

/// Runtime identity of an [`Entity`] type.
#[derive(Clone, Copy)]
pub struct EntityType {
    id: TypeId,
    type_name: &'static str,
    table: &'static str,
    schema: Option<&'static str>,
}

impl EntityType {
    pub fn of<E: Entity>() -> Self {
        EntityType {
            id: TypeId::of::<E>(),
            type_name: std::any::type_name::<E>(),
            table: E::TABLE,
            schema: E::SCHEMA,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn schema(&self) -> Option<&'static str> {
        self.schema
    }
}

impl PartialEq for EntityType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityType {}

impl Hash for EntityType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityType")
            .field("type", &self.type_name)
            .field("table", &self.table)
            .finish()
    }
}

/// A property of an entity, attached to its owning type at declaration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub owner: EntityType,
    pub column: &'static str,
}

impl ColumnRef {
    pub fn new<E: Entity>(column: &'static str) -> Self {
        ColumnRef {
            owner: EntityType::of::<E>(),
            column,
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.owner.type_name, self.column)
    }
}

/// Builds a [`ColumnRef`]: `col!(User, status)`.
#[macro_export]
macro_rules! col {
    ($entity:ty, $column:ident) => {
        $crate::entity::ColumnRef::new::<$entity>(stringify!($column))
    };
}
