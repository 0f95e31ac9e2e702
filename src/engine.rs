//! Engine facade: top-level API of the loader.
//!
//! The `Engine` owns the symbol caches, the observer hook and the current
//! session (server address, item range, one buffer per segment), and
//! coordinates them per call. Sessions come and go with `open`/`close`; the
//! symbol caches live as long as the engine.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::EngineConfig;
use crate::error::{EncodeError, EngineError, LoaderResult, TopologyError};
use crate::observer::TripleObserver;
use crate::op::{Link, Operation};
use crate::remote::{Endpoint, HttpStore, StoreApi, StoreCommand};
use crate::resolver::SymbolResolver;
use crate::segment::SegmentSet;
use crate::symbol::{Symbol, SymbolicTriple};
use crate::triple::{ItemId, ItemRange, Role, Triple, TypeId};
use crate::walker::{DeleteSummary, DeletionWalker};

/// Connection state between `open` and `close`.
#[derive(Debug)]
struct Session {
    server: Endpoint,
    item_range: ItemRange,
    segments: SegmentSet,
}

/// Client-side loader for a segmented correlation engine.
pub struct Engine {
    config: EngineConfig,
    store: Arc<dyn StoreApi>,
    resolver: SymbolResolver,
    session: RwLock<Option<Session>>,
    observer: RwLock<Option<Arc<dyn TripleObserver>>>,
    applied: AtomicU64,
    skipped: AtomicU64,
}

impl Engine {
    /// Create an engine over `store` without opening a session.
    pub fn new(config: EngineConfig, store: Arc<dyn StoreApi>) -> LoaderResult<Self> {
        config.validate()?;
        Ok(Self {
            resolver: SymbolResolver::new(config.lenient_object_status),
            config,
            store,
            session: RwLock::new(None),
            observer: RwLock::new(None),
            applied: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
        })
    }

    /// Create an HTTP-backed engine and open it against the configured server.
    pub fn connect(config: EngineConfig) -> LoaderResult<Self> {
        let store = Arc::new(HttpStore::new(config.request_timeout()));
        let engine = Self::new(config, store)?;
        engine.open(&engine.config.host, engine.config.port)?;
        Ok(engine)
    }

    fn read_session(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_session(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the open session.
    fn with_session<T>(&self, f: impl FnOnce(&Session) -> LoaderResult<T>) -> LoaderResult<T> {
        let guard = self.read_session();
        let session = guard.as_ref().ok_or(EngineError::NotOpen)?;
        f(session)
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    /// Connect to the server instance at `host:port`.
    ///
    /// An open session is flushed and closed first. The segment topology is
    /// required; the item range falls back to `[0, 0xFFFFFFFF]`. Symbol caches
    /// are kept.
    pub fn open(&self, host: &str, port: u16) -> LoaderResult<()> {
        let mut guard = self.write_session();
        if let Some(previous) = guard.as_ref() {
            previous.segments.flush_all(self.store.as_ref())?;
            *guard = None;
        }

        let server = Endpoint::new(host, port);
        tracing::info!(%server, "opening engine session");

        let topology = self.store.segments(&server)?;
        if !topology.is_ok() {
            return Err(TopologyError::Unavailable {
                host: host.to_string(),
                port,
                status: topology.status,
            }
            .into());
        }
        let endpoints: Vec<Endpoint> = topology
            .segments
            .into_iter()
            .map(|s| Endpoint::new(s.host, s.sport))
            .collect();

        let item_range = match self.store.item_size(&server) {
            Ok(reply) if reply.is_ok() => ItemRange {
                min: reply.min.unwrap_or(ItemRange::FULL.min),
                max: reply.max.unwrap_or(ItemRange::FULL.max),
            },
            Ok(reply) => {
                tracing::warn!(status = reply.status, "item size unavailable, using full range");
                ItemRange::FULL
            }
            Err(e) => {
                tracing::warn!(error = %e, "item size unavailable, using full range");
                ItemRange::FULL
            }
        };

        let segments = SegmentSet::new(endpoints, self.config.range, self.config.retry_policy())
            .ok_or_else(|| TopologyError::NoSegments {
                host: host.to_string(),
                port,
            })?;

        tracing::info!(
            %server,
            segments = segments.len(),
            min_item = item_range.min,
            max_item = item_range.max,
            "engine session open"
        );
        self.applied.store(0, Ordering::Relaxed);
        self.skipped.store(0, Ordering::Relaxed);
        *guard = Some(Session {
            server,
            item_range,
            segments,
        });
        Ok(())
    }

    /// Flush every segment and end the session. Symbol caches survive.
    ///
    /// Closing an engine that is not open does nothing.
    pub fn close(&self) -> LoaderResult<()> {
        let mut guard = self.write_session();
        if let Some(session) = guard.as_ref() {
            session.segments.flush_all(self.store.as_ref())?;
            tracing::info!(server = %session.server, "engine session closed");
        }
        *guard = None;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.read_session().is_some()
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Add a triple to both its subject-owning and object-owning segments.
    ///
    /// Returns `false` without writing anything when any field is absent; such
    /// calls are counted in [`EngineStats::skipped`].
    ///
    /// If a threshold flush fails, both halves stay buffered and the error is
    /// returned; call [`Engine::flush`] rather than applying the triple again.
    /// The observer runs after the session lock is released, so it may call
    /// back into the engine.
    pub fn apply(&self, triple: &SymbolicTriple) -> LoaderResult<bool> {
        let resolved = self.with_session(|session| {
            if !triple.is_complete() {
                self.skipped.fetch_add(1, Ordering::Relaxed);
                return Ok(None);
            }
            let resolved = self.resolve_triple(session, triple);
            self.record(session, resolved)?;
            Ok(Some(resolved))
        })?;
        match resolved {
            Some(triple) => {
                self.notify(&triple);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Add an already-resolved triple.
    pub fn apply_resolved(&self, triple: Triple) -> LoaderResult<()> {
        self.with_session(|session| self.record(session, triple))?;
        self.notify(&triple);
        Ok(())
    }

    fn resolve_triple(&self, session: &Session, triple: &SymbolicTriple) -> Triple {
        let store = self.store.as_ref();
        let server = &session.server;
        let r = &self.resolver;

        let subject_type = r.resolve_type(store, server, triple.subject_type.as_ref(), Role::Subject);
        let subject_item = r.resolve_object(
            store,
            server,
            triple.subject_item.as_ref(),
            Role::Subject,
            subject_type,
        );
        let action = r.resolve_action(store, server, triple.action.as_ref());
        let object_type = r.resolve_type(store, server, triple.object_type.as_ref(), Role::Object);
        let object_item = r.resolve_object(
            store,
            server,
            triple.object_item.as_ref(),
            Role::Object,
            object_type,
        );
        Triple::new(subject_type, subject_item, action, object_type, object_item)
    }

    fn record(&self, session: &Session, triple: Triple) -> LoaderResult<()> {
        session
            .segments
            .record_pair(self.store.as_ref(), Operation::add_pair(triple))?;
        self.applied.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn notify(&self, triple: &Triple) {
        let observer = self
            .observer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(observer) = observer {
            observer.operate(triple);
        }
    }

    /// Buffer the removal of one subject/object pair from both segments.
    pub fn delete_link(&self, link: Link) -> LoaderResult<()> {
        self.with_session(|session| {
            session
                .segments
                .record_pair(self.store.as_ref(), Operation::delete_pair(link))?;
            Ok(())
        })
    }

    /// Delete every triple whose subject is `subject(type_id, item)`.
    pub fn delete_subject(&self, type_id: TypeId, item: ItemId) -> LoaderResult<DeleteSummary> {
        self.with_session(|session| {
            DeletionWalker::new(self.store.as_ref(), &session.server, &session.segments)
                .delete_subject(type_id, item)
        })
    }

    /// Delete every subject (and its triples) selected by an engine expression.
    pub fn delete_expression(&self, expr: &str) -> LoaderResult<DeleteSummary> {
        self.with_session(|session| {
            DeletionWalker::new(self.store.as_ref(), &session.server, &session.segments)
                .delete_expression(expr)
        })
    }

    /// Ship everything buffered on every segment.
    pub fn flush(&self) -> LoaderResult<()> {
        self.with_session(|session| Ok(session.segments.flush_all(self.store.as_ref())?))
    }

    // -----------------------------------------------------------------------
    // Whole-store commands
    // -----------------------------------------------------------------------

    fn command(&self, session: &Session, command: StoreCommand) -> LoaderResult<bool> {
        let reply = self.store.command(&session.server, command)?;
        tracing::info!(?command, status = reply.status, "store command");
        Ok(reply.is_ok())
    }

    /// Flush, then ask the store to serialize itself across all segments.
    pub fn save(&self) -> LoaderResult<bool> {
        self.with_session(|session| {
            session.segments.flush_all(self.store.as_ref())?;
            self.command(session, StoreCommand::Save)
        })
    }

    /// Ask the store to reload its last serialization.
    pub fn load(&self) -> LoaderResult<bool> {
        self.with_session(|session| self.command(session, StoreCommand::Restore))
    }

    /// Ask the store to drop all triples.
    pub fn empty(&self) -> LoaderResult<bool> {
        self.with_session(|session| self.command(session, StoreCommand::Empty))
    }

    // -----------------------------------------------------------------------
    // Ids
    // -----------------------------------------------------------------------

    /// Pack a context object and a stamp into one subject item:
    /// `context << stamp_bits | stamp`.
    ///
    /// The context is resolved as an object of type `object_type`.
    pub fn build_subject(
        &self,
        object_type: impl Into<Symbol>,
        context: impl Into<Symbol>,
        stamp: u64,
        stamp_bits: u32,
    ) -> LoaderResult<ItemId> {
        let object_type = object_type.into();
        let context = context.into();
        self.with_session(|session| {
            let store = self.store.as_ref();
            let ot = self
                .resolver
                .resolve_type(store, &session.server, Some(&object_type), Role::Object);
            let ctx = self.resolver.resolve_object(
                store,
                &session.server,
                Some(&context),
                Role::Object,
                ot,
            );
            pack_subject(ctx, stamp, stamp_bits, session.item_range)
        })
    }

    /// Whether `item` lies in the open session's item range.
    pub fn item_check(&self, item: ItemId) -> bool {
        self.read_session()
            .as_ref()
            .is_some_and(|s| s.item_range.contains(item))
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Install or remove the per-triple observer.
    pub fn set_observer(&self, observer: Option<Arc<dyn TripleObserver>>) {
        *self.observer.write().unwrap_or_else(PoisonError::into_inner) = observer;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn resolver(&self) -> &SymbolResolver {
        &self.resolver
    }

    pub fn item_range(&self) -> Option<ItemRange> {
        self.read_session().as_ref().map(|s| s.item_range)
    }

    /// Number of segments in the open session, `0` when closed.
    pub fn segment_count(&self) -> usize {
        self.read_session()
            .as_ref()
            .map_or(0, |s| s.segments.len())
    }

    /// Addresses of the open session's segments, in segment order.
    pub fn segment_endpoints(&self) -> Vec<Endpoint> {
        self.read_session()
            .as_ref()
            .map(|s| s.segments.iter().map(|b| b.endpoint().clone()).collect())
            .unwrap_or_default()
    }

    /// Operations buffered on `segment` and not yet flushed.
    pub fn pending_operations(&self, segment: usize) -> Vec<Operation> {
        self.read_session()
            .as_ref()
            .and_then(|s| s.segments.get(segment).map(|b| b.pending_operations()))
            .unwrap_or_default()
    }

    pub fn stats(&self) -> EngineStats {
        let guard = self.read_session();
        EngineStats {
            applied: self.applied.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            pending: guard.as_ref().map_or(0, |s| s.segments.pending()),
            segments: guard.as_ref().map_or(0, |s| s.segments.len()),
            cached_symbols: self.resolver.cached_len(),
        }
    }
}

/// `ctx << bits | stamp`, checked against the stamp width and item range.
fn pack_subject(ctx: u64, stamp: u64, bits: u32, range: ItemRange) -> LoaderResult<ItemId> {
    let mask = if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 };
    if stamp & mask != stamp {
        return Err(EncodeError::StampTooBig { stamp, mask }.into());
    }
    let out_of_range = || EncodeError::ItemOutOfRange {
        context: ctx,
        stamp,
        max_item: range.max,
    };
    let packed = (u128::from(ctx) << bits.min(64)) | u128::from(stamp);
    let item = u64::try_from(packed).map_err(|_| out_of_range())?;
    if !range.contains(item) {
        return Err(out_of_range().into());
    }
    Ok(item)
}

/// Counters for the current session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Triples accepted by `apply` or `apply_resolved`.
    pub applied: u64,
    /// `apply` calls dropped for absent fields.
    pub skipped: u64,
    /// Operations buffered and not yet flushed.
    pub pending: usize,
    pub segments: usize,
    pub cached_symbols: usize,
}

impl std::fmt::Display for EngineStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "hpce loader stats")?;
        writeln!(f, "  segments:  {}", self.segments)?;
        writeln!(f, "  applied:   {}", self.applied)?;
        writeln!(f, "  skipped:   {}", self.skipped)?;
        writeln!(f, "  pending:   {}", self.pending)?;
        writeln!(f, "  symbols:   {}", self.cached_symbols)?;
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("session", &self.read_session())
            .field("resolver", &self.resolver)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoaderError;
    use crate::remote::{MockStore, StoreCall};

    fn config() -> EngineConfig {
        EngineConfig {
            retry_interval_ms: 1,
            ..Default::default()
        }
    }

    fn open_engine(store: Arc<MockStore>) -> Engine {
        let engine = Engine::new(config(), store).unwrap();
        engine.open("localhost", 3000).unwrap();
        engine
    }

    #[test]
    fn zero_range_rejected() {
        let result = Engine::new(
            EngineConfig {
                range: 0,
                ..Default::default()
            },
            Arc::new(MockStore::new(1)),
        );
        assert!(result.is_err());
    }

    #[test]
    fn writes_require_an_open_session() {
        let engine = Engine::new(config(), Arc::new(MockStore::new(1))).unwrap();
        let err = engine
            .apply(&SymbolicTriple::new(1u64, 2u64, 3u64, 4u64, 5u64))
            .unwrap_err();
        assert!(matches!(err, LoaderError::Engine(EngineError::NotOpen)));
        assert!(engine.flush().is_err());
        assert!(engine.close().is_ok());
    }

    #[test]
    fn open_reads_topology_and_range() {
        let store = Arc::new(MockStore::new(3).with_item_range(1, 1000));
        let engine = open_engine(store);
        assert!(engine.is_open());
        assert_eq!(engine.segment_count(), 3);
        assert_eq!(engine.item_range(), Some(ItemRange { min: 1, max: 1000 }));
        assert_eq!(engine.segment_endpoints()[1], Endpoint::new("seg1", 4001));
    }

    #[test]
    fn missing_item_range_falls_back_to_full() {
        let store = Arc::new(MockStore::new(1).without_item_range());
        let engine = open_engine(store);
        assert_eq!(engine.item_range(), Some(ItemRange::FULL));
    }

    #[test]
    fn topology_failure_is_fatal() {
        let store = Arc::new(MockStore::new(2).with_topology_status(1));
        let engine = Engine::new(config(), store).unwrap();
        let err = engine.open("localhost", 3000).unwrap_err();
        assert!(matches!(
            err,
            LoaderError::Topology(TopologyError::Unavailable { status: 1, .. })
        ));
        assert!(!engine.is_open());
    }

    #[test]
    fn empty_topology_is_fatal() {
        let engine = Engine::new(config(), Arc::new(MockStore::new(0))).unwrap();
        let err = engine.open("localhost", 3000).unwrap_err();
        assert!(matches!(
            err,
            LoaderError::Topology(TopologyError::NoSegments { .. })
        ));
    }

    #[test]
    fn absent_field_is_skipped() {
        let store = Arc::new(MockStore::new(2));
        let engine = open_engine(store.clone());
        store.clear_calls();

        let triple = SymbolicTriple {
            object_item: None,
            ..SymbolicTriple::new("Person", "Alice", "likes", "Movie", "Matrix")
        };
        assert!(!engine.apply(&triple).unwrap());

        let stats = engine.stats();
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.applied, 0);
        assert_eq!(stats.pending, 0);
        assert!(store.calls().is_empty());
    }

    #[test]
    fn reopen_flushes_previous_session() {
        let store = Arc::new(MockStore::new(2));
        let engine = open_engine(store.clone());
        engine.apply_resolved(Triple::new(1, 3, 5, 2, 4)).unwrap();
        assert_eq!(engine.stats().pending, 2);

        store.set_segment_count(3);
        engine.open("localhost", 3000).unwrap();
        assert_eq!(store.loads().len(), 2);
        assert_eq!(engine.segment_count(), 3);
        assert_eq!(engine.stats(), EngineStats {
            segments: 3,
            ..Default::default()
        });
    }

    #[test]
    fn close_flushes_and_keeps_caches() {
        let store = Arc::new(
            MockStore::new(1)
                .with_type("Person", Role::Subject, 1)
                .with_type("Movie", Role::Object, 2)
                .with_action("likes", 5)
                .with_object("Alice", Role::Subject, 1, 10)
                .with_object("Matrix", Role::Object, 2, 20),
        );
        let engine = open_engine(store.clone());
        let triple = SymbolicTriple::new("Person", "Alice", "likes", "Movie", "Matrix");
        engine.apply(&triple).unwrap();
        engine.close().unwrap();
        assert!(!engine.is_open());
        assert_eq!(store.loads().len(), 1);

        engine.open("localhost", 3000).unwrap();
        store.clear_calls();
        engine.apply(&triple).unwrap();
        assert!(store.calls().is_empty());
        assert_eq!(engine.resolver().cached_len(), 5);
    }

    #[test]
    fn observer_sees_resolved_triples() {
        let store = Arc::new(MockStore::new(1));
        let engine = open_engine(store);
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        engine.set_observer(Some(Arc::new(move |t: &Triple| {
            sink.lock().unwrap().push(*t);
        })));

        engine
            .apply(&SymbolicTriple::new(1u64, 2u64, 3u64, 4u64, 5u64))
            .unwrap();
        engine
            .apply(&SymbolicTriple {
                action: None,
                ..SymbolicTriple::new(1u64, 2u64, 3u64, 4u64, 5u64)
            })
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![Triple::new(1, 2, 3, 4, 5)]);

        engine.set_observer(None);
        engine.apply_resolved(Triple::new(1, 2, 3, 4, 6)).unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn observer_may_reenter_the_engine() {
        let store = Arc::new(MockStore::new(1));
        let engine = Arc::new(open_engine(store.clone()));
        let handle = Arc::downgrade(&engine);
        engine.set_observer(Some(Arc::new(move |_: &Triple| {
            if let Some(engine) = handle.upgrade() {
                engine.close().unwrap();
            }
        })));

        engine.apply_resolved(Triple::new(1, 2, 3, 4, 5)).unwrap();
        assert!(!engine.is_open());
        assert_eq!(store.loads().len(), 1);
        engine.set_observer(None);
    }

    #[test]
    fn failed_threshold_flush_keeps_the_pair() {
        let store = Arc::new(MockStore::new(2));
        let engine = Engine::new(
            EngineConfig {
                range: 1,
                retry_interval_ms: 1,
                flush_deadline_ms: Some(5),
                ..Default::default()
            },
            store.clone(),
        )
        .unwrap();
        engine.open("localhost", 3000).unwrap();
        store.fail_loads(u32::MAX);

        let triple = Triple::new(1, 1, 3, 2, 0);
        assert!(engine.apply_resolved(triple).is_err());
        assert_eq!(engine.pending_operations(0), vec![Operation::AddSubject(triple)]);
        assert_eq!(engine.pending_operations(1), vec![Operation::AddObject(triple)]);

        store.fail_loads(0);
        store.clear_calls();
        engine.flush().unwrap();
        let bodies: String = store.loads().into_iter().map(|(_, b)| b).collect();
        assert_eq!(bodies.matches("triple(subject(1,1),3,object(2,0))").count(), 1);
        assert_eq!(bodies.matches("triple(object(2,0), 3, subject(1,1))").count(), 1);
        assert_eq!(engine.stats().pending, 0);
    }

    #[test]
    fn save_flushes_first() {
        let store = Arc::new(MockStore::new(1));
        let engine = open_engine(store.clone());
        engine.apply_resolved(Triple::new(1, 2, 3, 4, 5)).unwrap();
        store.clear_calls();

        assert!(engine.save().unwrap());
        let calls = store.calls();
        assert!(matches!(calls[0], StoreCall::LoadData { .. }));
        assert_eq!(calls[1], StoreCall::Command(StoreCommand::Save));
    }

    #[test]
    fn load_and_empty_report_status() {
        let store = Arc::new(MockStore::new(1).with_command_status(2));
        let engine = open_engine(store.clone());
        assert!(!engine.load().unwrap());
        assert!(!engine.empty().unwrap());
        assert_eq!(
            store.count_calls(|c| matches!(c, StoreCall::Command(_))),
            2
        );
    }

    #[test]
    fn pack_subject_layout() {
        assert_eq!(pack_subject(3, 5, 8, ItemRange::FULL).unwrap(), (3 << 8) | 5);
        assert_eq!(pack_subject(0, 255, 8, ItemRange::FULL).unwrap(), 255);
    }

    #[test]
    fn pack_subject_rejects_wide_stamp() {
        let err = pack_subject(3, 256, 8, ItemRange::FULL).unwrap_err();
        assert!(matches!(
            err,
            LoaderError::Encode(EncodeError::StampTooBig { stamp: 256, mask: 255 })
        ));
    }

    #[test]
    fn pack_subject_rejects_out_of_range() {
        let range = ItemRange { min: 0, max: 0xFFFF };
        assert!(pack_subject(0xFF, 0xFF, 8, range).is_ok());
        let err = pack_subject(0x100, 0, 8, range).unwrap_err();
        assert!(matches!(
            err,
            LoaderError::Encode(EncodeError::ItemOutOfRange { .. })
        ));
        // Overflows u64 entirely.
        assert!(pack_subject(u64::MAX, 0, 8, ItemRange { min: 0, max: u64::MAX }).is_err());
    }

    #[test]
    fn build_subject_resolves_context() {
        let store = Arc::new(
            MockStore::new(1)
                .with_item_range(0, 0xFFFF_FFFF)
                .with_type("Session", Role::Object, 7)
                .with_object("web-42", Role::Object, 7, 42),
        );
        let engine = open_engine(store);
        assert_eq!(
            engine.build_subject("Session", "web-42", 9, 16).unwrap(),
            (42 << 16) | 9
        );
        assert!(engine.build_subject("Session", "web-42", 1 << 16, 16).is_err());
    }

    #[test]
    fn flush_deadline_surfaces() {
        let store = Arc::new(MockStore::new(1));
        let engine = Engine::new(
            EngineConfig {
                retry_interval_ms: 1,
                flush_deadline_ms: Some(5),
                ..Default::default()
            },
            store.clone(),
        )
        .unwrap();
        engine.open("localhost", 3000).unwrap();
        engine.apply_resolved(Triple::new(1, 2, 3, 4, 5)).unwrap();
        store.fail_loads(u32::MAX);
        assert!(matches!(
            engine.flush().unwrap_err(),
            LoaderError::Segment(_)
        ));
        assert_eq!(engine.stats().pending, 2);
    }
}
