//! linkd-bus: object-addressed message bus primitives
//!
//! Everything the session daemon needs to know about its IPC transport lives
//! here, independent of how frames actually travel:
//!
//! - **Addressing** - [`ObjectPath`] for objects, [`BusName`] for peers
//! - **Values** - the closed [`Value`] variant and the ordered [`Dict`]
//! - **Frames** - [`Message`] and [`MethodCall`]
//! - **Transport seam** - the [`Bus`] trait (send, object registration,
//!   liveness watches)
//! - **In-process bus** - [`MemoryBus`], which records everything it is asked
//!   to do and can simulate a peer going away
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   &dyn Bus    ┌──────────────────────────┐
//! │  linkd-core  │ ────────────► │ MemoryBus  (tests)       │
//! │  registry    │               │ SocketBus  (linkd-server)│
//! └──────────────┘               └──────────────────────────┘
//! ```

pub mod bus;
pub mod error;
pub mod memory;
pub mod message;
pub mod path;
pub mod tables;
pub mod value;

pub use bus::{Bus, WatchId};
pub use error::{BusError, Result};
pub use memory::MemoryBus;
pub use message::{MethodCall, Message, interfaces};
pub use path::{BusName, ObjectPath};
pub use tables::{ObjectTable, WatchTable};
pub use value::{Dict, Value};
