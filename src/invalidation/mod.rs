//! Vanish invalidation engine
//!
//! Buffers cache invalidations raised by a content host and flushes them to a
//! Varnish-style reverse proxy as `BAN` requests:
//!
//! - **Accumulate**: URLs are normalized to request paths; regex patterns are kept verbatim
//! - **Flush**: the target is resolved, the buffer drained, and one request sent per entry
//!
//! ## Configuration
//!
//! Dispatch behavior is controlled via `vanish.toml`:
//!
//! ```toml
//! [cache_server]
//! site_url = "https://example.com/"
//! port_override = 6081
//!
//! [dispatch]
//! concurrency = 8
//! request_timeout_ms = 10000
//! # ... see config.rs for all options
//! ```

mod accumulator;
mod config;
mod dispatcher;
mod engine;
mod plan;
mod result;
mod target;
mod transport;

pub use accumulator::BanAccumulator;
pub use config::{CacheServerConfig, DispatchConfig};
pub use dispatcher::PurgeDispatcher;
pub use engine::{EngineState, InvalidationEngine, SiteUrlProvider};
pub use plan::BanPlan;
pub use result::{BanFailure, FailureReason, FlushResult};
pub use target::resolve_target;
pub use transport::{BAN_METHOD, BanTransport, TransportError};
