//! Rich diagnostic error types for the loader.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so operators know whether a failure is
//! structural (topology, encoding) or a store that went away mid-run.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the loader.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain through to the caller.
#[derive(Debug, Error, Diagnostic)]
pub enum LoaderError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Segment(#[from] SegmentError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Delete(#[from] DeleteError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum TransportError {
    #[error("request to {url} failed: {message}")]
    #[diagnostic(
        code(hpce::transport::request),
        help("Is the correlation engine running and reachable at this address?")
    )]
    Request { url: String, message: String },

    #[error("unexpected response from {url}: {message}")]
    #[diagnostic(
        code(hpce::transport::response),
        help(
            "The store answered with a body that is not the expected JSON object. \
             Check that the host and port point at the engine's web service."
        )
    )]
    Response { url: String, message: String },
}

// ---------------------------------------------------------------------------
// Topology errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum TopologyError {
    #[error("could not retrieve segments from {host}:{port} (status {status})")]
    #[diagnostic(
        code(hpce::topology::unavailable),
        help(
            "The engine refused to describe its segment layout. \
             Make sure segment 0 is up before connecting a loader."
        )
    )]
    Unavailable { host: String, port: u16, status: i64 },

    #[error("engine at {host}:{port} reported zero segments")]
    #[diagnostic(
        code(hpce::topology::no_segments),
        help("Triples cannot be routed without at least one segment.")
    )]
    NoSegments { host: String, port: u16 },
}

// ---------------------------------------------------------------------------
// Segment errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SegmentError {
    #[error(
        "flush to segment {host}:{port} did not succeed within {waited_ms} ms \
         ({attempts} attempts, {pending} operations still pending)"
    )]
    #[diagnostic(
        code(hpce::segment::deadline),
        help(
            "The pending batch is kept intact. Flush again once the segment recovers, \
             or remove `flush_deadline_ms` to block until it does."
        )
    )]
    DeadlineExceeded {
        host: String,
        port: u16,
        waited_ms: u128,
        attempts: u32,
        pending: usize,
    },
}

// ---------------------------------------------------------------------------
// Deletion errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum DeleteError {
    #[error("correlation engine not present: receivers query returned status {status}")]
    #[diagnostic(
        code(hpce::delete::store_unavailable),
        help("Deletion stops immediately when the store cannot answer; nothing is retried.")
    )]
    StoreUnavailable { status: i64 },

    #[error("delete expression does not specify subjects (first match has class \"{class}\")")]
    #[diagnostic(
        code(hpce::delete::not_subjects),
        help("Rewrite the expression so that it selects subject receivers.")
    )]
    NotSubjects { class: String },
}

// ---------------------------------------------------------------------------
// Encoding errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EncodeError {
    #[error("stamp {stamp} too big for mask {mask}")]
    #[diagnostic(
        code(hpce::encode::stamp_too_big),
        help("The stamp must fit in the requested number of stamp bits.")
    )]
    StampTooBig { stamp: u64, mask: u64 },

    #[error("subject {context} with stamp {stamp} too big for item size {max_item}")]
    #[diagnostic(
        code(hpce::encode::item_out_of_range),
        help("Use fewer stamp bits or a smaller context id.")
    )]
    ItemOutOfRange {
        context: u64,
        stamp: u64,
        max_item: u64,
    },
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("engine session is not open")]
    #[diagnostic(
        code(hpce::engine::not_open),
        help("Call `Engine::open(host, port)` before writing or resolving symbols.")
    )]
    NotOpen,

    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(hpce::engine::invalid_config),
        help("Check the EngineConfig fields. {message}")
    )]
    InvalidConfig { message: String },
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read loader config: {path}")]
    #[diagnostic(
        code(hpce::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse loader config: {path}: {message}")]
    #[diagnostic(
        code(hpce::config::parse),
        help("Check the TOML syntax in the loader config file.")
    )]
    Parse { path: String, message: String },
}

/// Convenience alias for functions returning loader results.
pub type LoaderResult<T> = std::result::Result<T, LoaderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topology_error_converts_to_loader_error() {
        let err = TopologyError::NoSegments {
            host: "localhost".into(),
            port: 3000,
        };
        let top: LoaderError = err.into();
        assert!(matches!(
            top,
            LoaderError::Topology(TopologyError::NoSegments { .. })
        ));
    }

    #[test]
    fn delete_error_converts_to_loader_error() {
        let top: LoaderError = DeleteError::StoreUnavailable { status: 3 }.into();
        assert!(matches!(
            top,
            LoaderError::Delete(DeleteError::StoreUnavailable { status: 3 })
        ));
    }

    #[test]
    fn encode_error_messages_are_descriptive() {
        let err = EncodeError::StampTooBig { stamp: 300, mask: 255 };
        let msg = format!("{err}");
        assert!(msg.contains("300"));
        assert!(msg.contains("255"));
    }

    #[test]
    fn deadline_error_reports_pending_count() {
        let err = SegmentError::DeadlineExceeded {
            host: "seg1".into(),
            port: 4001,
            waited_ms: 1200,
            attempts: 3,
            pending: 42,
        };
        let msg = err.to_string();
        assert!(msg.contains("seg1:4001"));
        assert!(msg.contains("42 operations"));
    }
}
