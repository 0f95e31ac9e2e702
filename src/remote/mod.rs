//! The correlation engine's web service, as seen by the loader.
//!
//! [`StoreApi`] is the seam between loader logic and the wire. Every reply is a
//! JSON object with a `status` field (`0` meaning success); interpreting the
//! status is left to the caller because the error policy differs per endpoint.
//!
//! - [`HttpStore`]: blocking `ureq` client used in production
//! - [`MockStore`]: scripted in-memory store that records every call

mod http;
mod mock;
mod wire;

pub use http::HttpStore;
pub use mock::{MockStore, StoreCall};
pub use wire::{
    IdReply, ItemSizeReply, Receiver, ReceiversReply, SegmentInfo, SegmentsReply, StatusReply,
};

use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::triple::{Role, TypeId};

/// Result alias for a single round-trip to the store.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// A `host:port` pair: the server instance or one of its segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Base URL for HTTP requests.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Which side a receivers query enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReceiversQuery {
    /// Subjects matching an expression (`stype=all&action=all`).
    Subjects,
    /// Objects linked from a subject term (`otype=all&action=all`).
    Objects,
}

impl ReceiversQuery {
    pub fn params(self) -> [(&'static str, &'static str); 2] {
        match self {
            ReceiversQuery::Subjects => [("stype", "all"), ("action", "all")],
            ReceiversQuery::Objects => [("otype", "all"), ("action", "all")],
        }
    }
}

/// Whole-store maintenance commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreCommand {
    Save,
    Restore,
    Empty,
}

impl StoreCommand {
    pub fn path(self) -> &'static str {
        match self {
            StoreCommand::Save => "/save",
            StoreCommand::Restore => "/restore",
            StoreCommand::Empty => "/empty",
        }
    }
}

/// Every endpoint of the store the loader talks to.
///
/// `server` is the instance the session was opened against; `load_data` goes
/// to the segment's own address.
pub trait StoreApi: Send + Sync {
    /// `GET /segments`.
    fn segments(&self, server: &Endpoint) -> TransportResult<SegmentsReply>;

    /// `GET /itemsize`.
    fn item_size(&self, server: &Endpoint) -> TransportResult<ItemSizeReply>;

    /// `GET /convert_type?name=&class=`.
    fn convert_type(&self, server: &Endpoint, name: &str, role: Role)
    -> TransportResult<IdReply>;

    /// `GET /convert_action?name=`.
    fn convert_action(&self, server: &Endpoint, name: &str) -> TransportResult<IdReply>;

    /// `GET /convert_object?class=&name=&type=`.
    fn convert_object(
        &self,
        server: &Endpoint,
        role: Role,
        name: &str,
        type_id: TypeId,
    ) -> TransportResult<IdReply>;

    /// `POST /load_data` with a rendered batch.
    fn load_data(&self, segment: &Endpoint, body: &str) -> TransportResult<StatusReply>;

    /// `POST /expr_receivers` with an expression body.
    fn receivers(
        &self,
        server: &Endpoint,
        query: ReceiversQuery,
        body: &str,
    ) -> TransportResult<ReceiversReply>;

    /// `GET /save`, `/restore` or `/empty`.
    fn command(&self, server: &Endpoint, command: StoreCommand) -> TransportResult<StatusReply>;
}
