//! Scripted in-memory store for tests and dry runs.
//!
//! Topology, item range and conversion tables are configured up front;
//! receivers pages are queued per query kind and `load_data` can be told to
//! fail a number of times before succeeding. Every call is recorded.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{
    Endpoint, IdReply, ItemSizeReply, ReceiversQuery, ReceiversReply, SegmentInfo, SegmentsReply,
    StatusReply, StoreApi, StoreCommand, TransportResult,
};
use crate::error::TransportError;
use crate::triple::{ItemRange, Role, TypeId};

/// One recorded round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Segments,
    ItemSize,
    ConvertType { name: String, role: Role },
    ConvertAction { name: String },
    ConvertObject { role: Role, name: String, type_id: TypeId },
    LoadData { segment: Endpoint, body: String },
    Receivers { query: ReceiversQuery, body: String },
    Command(StoreCommand),
}

#[derive(Debug, Default)]
struct MockState {
    segments: Vec<Endpoint>,
    topology_status: i64,
    item_range: Option<ItemRange>,
    types: HashMap<(String, Role), u64>,
    actions: HashMap<String, u64>,
    objects: HashMap<(String, Role, TypeId), u64>,
    object_miss_status: i64,
    object_miss_id: Option<u64>,
    subject_pages: VecDeque<ReceiversReply>,
    object_pages: VecDeque<ReceiversReply>,
    failing_loads: u32,
    broken_loads: u32,
    command_status: i64,
    calls: Vec<StoreCall>,
}

/// A [`StoreApi`] backed by tables instead of a server.
#[derive(Debug)]
pub struct MockStore {
    state: Mutex<MockState>,
}

impl MockStore {
    /// A store with `segment_count` segments at `seg{i}:{4000 + i}` and the
    /// default item range.
    pub fn new(segment_count: usize) -> Self {
        let segments = (0..segment_count)
            .map(|i| Endpoint::new(format!("seg{i}"), 4000 + i as u16))
            .collect();
        Self {
            state: Mutex::new(MockState {
                segments,
                item_range: Some(ItemRange::FULL),
                object_miss_status: 1,
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -- configuration --

    pub fn with_type(self, name: &str, role: Role, id: u64) -> Self {
        self.state().types.insert((name.to_string(), role), id);
        self
    }

    pub fn with_action(self, name: &str, id: u64) -> Self {
        self.state().actions.insert(name.to_string(), id);
        self
    }

    pub fn with_object(self, name: &str, role: Role, type_id: TypeId, id: u64) -> Self {
        self.state()
            .objects
            .insert((name.to_string(), role, type_id), id);
        self
    }

    pub fn with_item_range(self, min: u64, max: u64) -> Self {
        self.state().item_range = Some(ItemRange { min, max });
        self
    }

    /// Make `/itemsize` answer with a failure status.
    pub fn without_item_range(self) -> Self {
        self.state().item_range = None;
        self
    }

    /// Make `/segments` answer with `status`.
    pub fn with_topology_status(self, status: i64) -> Self {
        self.state().topology_status = status;
        self
    }

    /// Reply sent by `/convert_object` for unknown names.
    pub fn with_object_miss(self, status: i64, id: Option<u64>) -> Self {
        {
            let mut state = self.state();
            state.object_miss_status = status;
            state.object_miss_id = id;
        }
        self
    }

    /// Status returned by `/save`, `/restore` and `/empty`.
    pub fn with_command_status(self, status: i64) -> Self {
        self.state().command_status = status;
        self
    }

    // -- scripting while in use --

    /// Queue a page for the next receivers query of kind `query`.
    /// Once the queue drains, queries answer with an empty page.
    pub fn push_receivers(&self, query: ReceiversQuery, page: ReceiversReply) {
        let mut state = self.state();
        match query {
            ReceiversQuery::Subjects => state.subject_pages.push_back(page),
            ReceiversQuery::Objects => state.object_pages.push_back(page),
        }
    }

    /// The next `n` `load_data` calls answer with a non-zero status.
    pub fn fail_loads(&self, n: u32) {
        self.state().failing_loads = n;
    }

    /// The next `n` `load_data` calls fail at the transport level.
    pub fn break_loads(&self, n: u32) {
        self.state().broken_loads = n;
    }

    pub fn set_topology_status(&self, status: i64) {
        self.state().topology_status = status;
    }

    pub fn set_segment_count(&self, segment_count: usize) {
        self.state().segments = (0..segment_count)
            .map(|i| Endpoint::new(format!("seg{i}"), 4000 + i as u16))
            .collect();
    }

    // -- inspection --

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state().calls.clone()
    }

    pub fn count_calls(&self, pred: impl Fn(&StoreCall) -> bool) -> usize {
        self.state().calls.iter().filter(|c| pred(*c)).count()
    }

    /// Bodies of every `load_data` call, with the segment it was sent to.
    pub fn loads(&self) -> Vec<(Endpoint, String)> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                StoreCall::LoadData { segment, body } => Some((segment.clone(), body.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }
}

impl StoreApi for MockStore {
    fn segments(&self, _server: &Endpoint) -> TransportResult<SegmentsReply> {
        let mut state = self.state();
        state.calls.push(StoreCall::Segments);
        let segments = state
            .segments
            .iter()
            .enumerate()
            .map(|(i, ep)| SegmentInfo {
                segment: Some(i as u64),
                host: ep.host.clone(),
                sport: ep.port,
            })
            .collect();
        Ok(SegmentsReply {
            status: state.topology_status,
            segments,
        })
    }

    fn item_size(&self, _server: &Endpoint) -> TransportResult<ItemSizeReply> {
        let mut state = self.state();
        state.calls.push(StoreCall::ItemSize);
        Ok(match state.item_range {
            Some(range) => ItemSizeReply {
                status: 0,
                max: Some(range.max),
                min: Some(range.min),
            },
            None => ItemSizeReply {
                status: 1,
                max: None,
                min: None,
            },
        })
    }

    fn convert_type(
        &self,
        _server: &Endpoint,
        name: &str,
        role: Role,
    ) -> TransportResult<IdReply> {
        let mut state = self.state();
        state.calls.push(StoreCall::ConvertType {
            name: name.to_string(),
            role,
        });
        Ok(match state.types.get(&(name.to_string(), role)) {
            Some(&id) => IdReply::found(id),
            None => IdReply::failed(1),
        })
    }

    fn convert_action(&self, _server: &Endpoint, name: &str) -> TransportResult<IdReply> {
        let mut state = self.state();
        state.calls.push(StoreCall::ConvertAction {
            name: name.to_string(),
        });
        Ok(match state.actions.get(name) {
            Some(&id) => IdReply::found(id),
            None => IdReply::failed(1),
        })
    }

    fn convert_object(
        &self,
        _server: &Endpoint,
        role: Role,
        name: &str,
        type_id: TypeId,
    ) -> TransportResult<IdReply> {
        let mut state = self.state();
        state.calls.push(StoreCall::ConvertObject {
            role,
            name: name.to_string(),
            type_id,
        });
        Ok(match state.objects.get(&(name.to_string(), role, type_id)) {
            Some(&id) => IdReply::found(id),
            None => IdReply {
                status: state.object_miss_status,
                id: state.object_miss_id,
            },
        })
    }

    fn load_data(&self, segment: &Endpoint, body: &str) -> TransportResult<StatusReply> {
        let mut state = self.state();
        state.calls.push(StoreCall::LoadData {
            segment: segment.clone(),
            body: body.to_string(),
        });
        if state.broken_loads > 0 {
            state.broken_loads -= 1;
            return Err(TransportError::Request {
                url: format!("{}/load_data", segment.base_url()),
                message: "connection reset".into(),
            });
        }
        if state.failing_loads > 0 {
            state.failing_loads -= 1;
            return Ok(StatusReply { status: 1 });
        }
        Ok(StatusReply::ok())
    }

    fn receivers(
        &self,
        _server: &Endpoint,
        query: ReceiversQuery,
        body: &str,
    ) -> TransportResult<ReceiversReply> {
        let mut state = self.state();
        state.calls.push(StoreCall::Receivers {
            query,
            body: body.to_string(),
        });
        let next = match query {
            ReceiversQuery::Subjects => state.subject_pages.pop_front(),
            ReceiversQuery::Objects => state.object_pages.pop_front(),
        };
        Ok(next.unwrap_or_else(|| ReceiversReply::page(Vec::new())))
    }

    fn command(&self, _server: &Endpoint, command: StoreCommand) -> TransportResult<StatusReply> {
        let mut state = self.state();
        state.calls.push(StoreCall::Command(command));
        Ok(StatusReply {
            status: state.command_status,
        })
    }
}
