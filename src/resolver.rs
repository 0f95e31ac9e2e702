//! Symbol resolution: names → numeric ids, cached for the life of an engine.
//!
//! Four caches back the conversion endpoints: subject types, object types,
//! actions, and object instances keyed by `(name, role, type)`. Entries are
//! never evicted or invalidated, not even when the engine reopens against a
//! different topology. A miss goes to the store; concurrent misses on the same
//! key may both go remote, and the last answer wins.
//!
//! Failed lookups return the `0` sentinel and are not cached, so a later call
//! with the same arguments asks the store again.

use dashmap::DashMap;

use crate::remote::{Endpoint, IdReply, StoreApi};
use crate::symbol::Symbol;
use crate::triple::{ActionId, ItemId, Role, TypeId};

/// Caching front for the store's conversion endpoints.
#[derive(Debug, Default)]
pub struct SymbolResolver {
    subject_types: DashMap<String, TypeId>,
    object_types: DashMap<String, TypeId>,
    actions: DashMap<String, ActionId>,
    objects: DashMap<(String, Role, TypeId), ItemId>,
    /// Accept any `/convert_object` reply as success.
    lenient_object_status: bool,
}

impl SymbolResolver {
    pub fn new(lenient_object_status: bool) -> Self {
        Self {
            lenient_object_status,
            ..Default::default()
        }
    }

    fn type_cache(&self, role: Role) -> &DashMap<String, TypeId> {
        match role {
            Role::Subject => &self.subject_types,
            Role::Object => &self.object_types,
        }
    }

    /// Resolve a subject or object type.
    pub fn resolve_type(
        &self,
        store: &dyn StoreApi,
        server: &Endpoint,
        symbol: Option<&Symbol>,
        role: Role,
    ) -> TypeId {
        let name = match direct(symbol) {
            Ok(id) => return id,
            Err(name) => name,
        };
        let cache = self.type_cache(role);
        if let Some(id) = cache.get(name) {
            return *id;
        }

        tracing::debug!(name, %role, "resolving type remotely");
        match accepted(store.convert_type(server, name, role), false) {
            Some(id) => {
                cache.insert(name.to_string(), id);
                id
            }
            None => {
                tracing::warn!(name, %role, "type conversion failed");
                0
            }
        }
    }

    /// Resolve an action. Actions share one namespace across roles.
    pub fn resolve_action(
        &self,
        store: &dyn StoreApi,
        server: &Endpoint,
        symbol: Option<&Symbol>,
    ) -> ActionId {
        let name = match direct(symbol) {
            Ok(id) => return id,
            Err(name) => name,
        };
        if let Some(id) = self.actions.get(name) {
            return *id;
        }

        tracing::debug!(name, "resolving action remotely");
        match accepted(store.convert_action(server, name), false) {
            Some(id) => {
                self.actions.insert(name.to_string(), id);
                id
            }
            None => {
                tracing::warn!(name, "action conversion failed");
                0
            }
        }
    }

    /// Resolve an object instance. The same name can map to different items
    /// under different types.
    pub fn resolve_object(
        &self,
        store: &dyn StoreApi,
        server: &Endpoint,
        symbol: Option<&Symbol>,
        role: Role,
        type_id: TypeId,
    ) -> ItemId {
        let name = match direct(symbol) {
            Ok(id) => return id,
            Err(name) => name,
        };
        let key = (name.to_string(), role, type_id);
        if let Some(id) = self.objects.get(&key) {
            return *id;
        }

        tracing::debug!(name, %role, type_id, "resolving object remotely");
        let reply = store.convert_object(server, role, name, type_id);
        match accepted(reply, self.lenient_object_status) {
            Some(id) => {
                self.objects.insert(key, id);
                id
            }
            None => {
                tracing::warn!(name, %role, type_id, "object conversion failed");
                0
            }
        }
    }

    /// Number of cached entries across all namespaces.
    pub fn cached_len(&self) -> usize {
        self.subject_types.len() + self.object_types.len() + self.actions.len() + self.objects.len()
    }
}

/// `Ok(id)` when no lookup is needed, `Err(name)` otherwise.
fn direct(symbol: Option<&Symbol>) -> Result<u64, &str> {
    match symbol {
        None => Ok(0),
        Some(Symbol::Id(id)) => Ok(*id),
        Some(Symbol::Name(name)) if name.is_empty() => Ok(0),
        Some(Symbol::Name(name)) => Err(name.as_str()),
    }
}

fn accepted(
    reply: crate::remote::TransportResult<IdReply>,
    lenient: bool,
) -> Option<u64> {
    match reply {
        Ok(reply) if lenient || reply.is_ok() => Some(reply.id()),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(error = %e, "conversion request failed");
            None
        }
    }
}
