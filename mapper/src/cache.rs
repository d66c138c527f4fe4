//! Process-wide cache of resolved model schemas.

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, OnceLock, PoisonError, RwLock};

use docshape_core::{SchemaDefinitionError, SchemaType};
use tracing::debug;

use crate::model::Model;

type Resolved = Result<Arc<SchemaType>, SchemaDefinitionError>;

static SCHEMAS: LazyLock<RwLock<HashMap<TypeId, Arc<OnceLock<Resolved>>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Resolved schema of `M`, built on first use.
///
/// `M::schema` runs at most once per type for the life of the process.
/// Concurrent first callers block on the same slot and share its result,
/// including a failure. The map lock is not held while the schema is built,
/// so one model's schema may ask for another's.
pub fn schema_of<M: Model>() -> Result<Arc<SchemaType>, SchemaDefinitionError> {
    let id = TypeId::of::<M>();
    let existing = SCHEMAS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .cloned();
    let slot = match existing {
        Some(slot) => slot,
        None => SCHEMAS
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_default()
            .clone(),
    };

    slot.get_or_init(|| {
        debug!(model = type_name::<M>(), "Resolving model schema");
        M::schema().map(Arc::new)
    })
    .clone()
}
