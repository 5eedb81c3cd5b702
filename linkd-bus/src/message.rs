//! Bus frames
//!
//! Four kinds of frame travel on the bus:
//! - `call`: a method call addressed to an object, expecting a reply
//! - `reply`: the successful answer to a call, correlated by serial
//! - `error`: the failed answer to a call
//! - `notify`: a one-way call to an object owned by a peer; nobody waits for
//!   an answer

use serde::{Deserialize, Serialize};

use crate::path::{BusName, ObjectPath};
use crate::value::Value;

/// Well-known interface names
pub mod interfaces {
    /// Bus housekeeping (`Hello`)
    pub const BUS: &str = "net.linkd.Bus";
    /// Daemon-level entry points on `/`
    pub const MANAGER: &str = "net.linkd.Manager";
    /// Per-session object
    pub const SESSION: &str = "net.linkd.Session";
    /// Implemented by session owners to receive pushes
    pub const NOTIFICATION: &str = "net.linkd.Notification";
}

/// An inbound method call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    /// Caller-chosen serial, echoed back in the reply
    pub serial: u32,
    /// Unique name of the calling peer (filled in by the transport)
    #[serde(default)]
    pub sender: BusName,
    pub path: ObjectPath,
    pub interface: String,
    pub member: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl MethodCall {
    pub fn new(path: ObjectPath, interface: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            serial: 0,
            sender: BusName::new(),
            path,
            interface: interface.into(),
            member: member.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_sender(mut self, sender: impl Into<BusName>) -> Self {
        self.sender = sender.into();
        self
    }

    #[must_use]
    pub fn with_serial(mut self, serial: u32) -> Self {
        self.serial = serial;
        self
    }

    #[must_use]
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    /// Build the success reply for this call
    pub fn reply(&self, args: Vec<Value>) -> Message {
        Message::Reply {
            destination: self.sender.clone(),
            reply_serial: self.serial,
            args,
        }
    }

    /// Build the error reply for this call
    pub fn error(&self, name: impl Into<String>, message: impl Into<String>) -> Message {
        Message::Error {
            destination: self.sender.clone(),
            reply_serial: self.serial,
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Any frame on the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    Call(MethodCall),
    Reply {
        destination: BusName,
        reply_serial: u32,
        #[serde(default)]
        args: Vec<Value>,
    },
    Error {
        destination: BusName,
        reply_serial: u32,
        name: String,
        message: String,
    },
    Notify {
        destination: BusName,
        path: ObjectPath,
        interface: String,
        member: String,
        #[serde(default)]
        args: Vec<Value>,
    },
}

impl Message {
    /// One-way call to `path` on peer `destination`
    pub fn notify(
        destination: impl Into<BusName>,
        path: ObjectPath,
        interface: impl Into<String>,
        member: impl Into<String>,
        args: Vec<Value>,
    ) -> Self {
        Message::Notify {
            destination: destination.into(),
            path,
            interface: interface.into(),
            member: member.into(),
            args,
        }
    }

    /// Peer this frame is addressed to (calls are addressed to the daemon)
    pub fn destination(&self) -> Option<&str> {
        match self {
            Message::Call(_) => None,
            Message::Reply { destination, .. }
            | Message::Error { destination, .. }
            | Message::Notify { destination, .. } => Some(destination),
        }
    }

    /// Member name for `notify` frames
    pub fn member(&self) -> Option<&str> {
        match self {
            Message::Call(call) => Some(&call.member),
            Message::Notify { member, .. } => Some(member),
            _ => None,
        }
    }
}
