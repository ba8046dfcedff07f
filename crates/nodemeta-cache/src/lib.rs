//! nodemeta cache - Local identity persistence for cluster nodes
//!
//! Server and worker nodes keep the name assigned to them by the coordinator
//! in a small `meta.json` file, so a restart resumes the same identity.

pub mod error;
pub mod local_cache;
pub mod record;

pub use error::{CacheError, ErrorKind, IoOp, Result};
pub use local_cache::{
    CacheState, LoadOutcome, LocalCache, ServerCache, WorkerCache, META_FILE_NAME,
};
pub use record::{MetaRecord, ServerMeta, WorkerMeta};
