//! Blocking HTTP implementation of [`StoreApi`] over `ureq`.

use std::time::Duration;

use serde::de::DeserializeOwned;

use super::{
    Endpoint, IdReply, ItemSizeReply, ReceiversQuery, ReceiversReply, SegmentsReply, StatusReply,
    StoreApi, StoreCommand, TransportResult,
};
use crate::error::TransportError;
use crate::triple::{Role, TypeId};

/// Talks to a live correlation engine.
///
/// One `ureq::Agent` is shared by every request so connections to the server
/// and to each segment are kept alive between flushes.
pub struct HttpStore {
    agent: ureq::Agent,
}

impl HttpStore {
    /// Create a client whose individual requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout(timeout)
                .user_agent(concat!("hpce-loader/", env!("CARGO_PKG_VERSION")))
                .build(),
        }
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> TransportResult<T> {
        let mut req = self.agent.get(url);
        for (key, value) in query {
            req = req.query(key, value);
        }
        let resp = req.call().map_err(|e| TransportError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        resp.into_json().map_err(|e| TransportError::Response {
            url: url.to_string(),
            message: format!("failed to parse JSON: {e}"),
        })
    }

    fn post_text<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        body: &str,
    ) -> TransportResult<T> {
        let mut req = self.agent.post(url).set("Content-Type", "text/plain");
        for (key, value) in query {
            req = req.query(key, value);
        }
        let resp = req.send_string(body).map_err(|e| TransportError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        resp.into_json().map_err(|e| TransportError::Response {
            url: url.to_string(),
            message: format!("failed to parse JSON: {e}"),
        })
    }
}

impl Default for HttpStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl std::fmt::Debug for HttpStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStore").finish_non_exhaustive()
    }
}

impl StoreApi for HttpStore {
    fn segments(&self, server: &Endpoint) -> TransportResult<SegmentsReply> {
        self.get_json(&format!("{}/segments", server.base_url()), &[])
    }

    fn item_size(&self, server: &Endpoint) -> TransportResult<ItemSizeReply> {
        self.get_json(&format!("{}/itemsize", server.base_url()), &[])
    }

    fn convert_type(
        &self,
        server: &Endpoint,
        name: &str,
        role: Role,
    ) -> TransportResult<IdReply> {
        self.get_json(
            &format!("{}/convert_type", server.base_url()),
            &[("name", name), ("class", role.as_str())],
        )
    }

    fn convert_action(&self, server: &Endpoint, name: &str) -> TransportResult<IdReply> {
        self.get_json(
            &format!("{}/convert_action", server.base_url()),
            &[("name", name)],
        )
    }

    fn convert_object(
        &self,
        server: &Endpoint,
        role: Role,
        name: &str,
        type_id: TypeId,
    ) -> TransportResult<IdReply> {
        let type_str = type_id.to_string();
        self.get_json(
            &format!("{}/convert_object", server.base_url()),
            &[("class", role.as_str()), ("name", name), ("type", type_str.as_str())],
        )
    }

    fn load_data(&self, segment: &Endpoint, body: &str) -> TransportResult<StatusReply> {
        self.post_text(&format!("{}/load_data", segment.base_url()), &[], body)
    }

    fn receivers(
        &self,
        server: &Endpoint,
        query: ReceiversQuery,
        body: &str,
    ) -> TransportResult<ReceiversReply> {
        self.post_text(
            &format!("{}/expr_receivers", server.base_url()),
            &query.params(),
            body,
        )
    }

    fn command(&self, server: &Endpoint, command: StoreCommand) -> TransportResult<StatusReply> {
        self.get_json(&format!("{}{}", server.base_url(), command.path()), &[])
    }
}
