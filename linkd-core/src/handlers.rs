//! Method call routing
//!
//! Translates an inbound [`MethodCall`] into a [`SessionContext`] operation
//! and its reply arguments. Two kinds of object answer calls:
//!
//! | Path            | Interface           | Members                                              |
//! |-----------------|---------------------|------------------------------------------------------|
//! | `/`             | `net.linkd.Manager` | `CreateSession`, `DestroySession`, `GetMode`, `SetMode` |
//! | `/sessions/...` | `net.linkd.Session` | `Destroy`, `Connect`, `Disconnect`, `Change`         |
//!
//! The requester of every operation is the call's `sender`, which the
//! transport fills in.

use linkd_bus::{Dict, MethodCall, ObjectPath, Value, interfaces};

use crate::context::SessionContext;
use crate::error::{Result, SessionError};
use crate::session::SessionSettings;

/// Manager member names
pub mod manager {
    pub const CREATE_SESSION: &str = "CreateSession";
    pub const DESTROY_SESSION: &str = "DestroySession";
    pub const GET_MODE: &str = "GetMode";
    pub const SET_MODE: &str = "SetMode";
}

/// Session member names
pub mod session {
    pub const DESTROY: &str = "Destroy";
    pub const CONNECT: &str = "Connect";
    pub const DISCONNECT: &str = "Disconnect";
    pub const CHANGE: &str = "Change";
}

/// Route `call` and return the reply arguments
pub fn route(ctx: &mut SessionContext, call: &MethodCall) -> Result<Vec<Value>> {
    if call.path.is_root() {
        if call.interface != interfaces::MANAGER {
            return Err(unknown_method(call));
        }
        return route_manager(ctx, call);
    }

    if ctx.registry().get(call.path.as_str()).is_none() {
        return Err(SessionError::UnknownObject(call.path.to_string()));
    }
    if call.interface != interfaces::SESSION {
        return Err(unknown_method(call));
    }
    route_session(ctx, call)
}

fn route_manager(ctx: &mut SessionContext, call: &MethodCall) -> Result<Vec<Value>> {
    match call.member.as_str() {
        manager::CREATE_SESSION => {
            let attributes = dict_arg(&call.args, 0)?;
            let notify_path = path_arg(&call.args, 1)?;
            let settings = SessionSettings::from_dict(attributes)?;
            let path = ctx.create_session(&call.sender, notify_path, settings)?;
            Ok(vec![Value::ObjectPath(path)])
        }
        manager::DESTROY_SESSION => {
            let path = path_arg(&call.args, 0)?;
            ctx.destroy_session(path, &call.sender)?;
            Ok(Vec::new())
        }
        manager::GET_MODE => Ok(vec![Value::Bool(ctx.get_mode().is_enabled())]),
        manager::SET_MODE => {
            let enabled = bool_arg(&call.args, 0)?;
            ctx.set_mode(enabled);
            Ok(Vec::new())
        }
        _ => Err(unknown_method(call)),
    }
}

fn route_session(ctx: &mut SessionContext, call: &MethodCall) -> Result<Vec<Value>> {
    let path = call.path.as_str();
    match call.member.as_str() {
        session::DESTROY => ctx.destroy_session(path, &call.sender)?,
        session::CONNECT => ctx.connect(path)?,
        session::DISCONNECT => ctx.disconnect(path)?,
        session::CHANGE => {
            let name = str_arg(&call.args, 0)?;
            let value = call
                .args
                .get(1)
                .ok_or_else(|| missing("value", 1))?;
            ctx.registry_mut().apply_change(path, name, value)?;
        }
        _ => return Err(unknown_method(call)),
    }
    Ok(Vec::new())
}

fn unknown_method(call: &MethodCall) -> SessionError {
    SessionError::UnknownMethod {
        interface: call.interface.clone(),
        member: call.member.clone(),
    }
}

fn missing(what: &str, index: usize) -> SessionError {
    SessionError::InvalidArgument(format!("argument {index} ({what}) is missing"))
}

fn mismatch(what: &str, index: usize, got: &Value) -> SessionError {
    SessionError::InvalidArgument(format!(
        "argument {index} must be {what}, got {}",
        got.type_name()
    ))
}

fn dict_arg(args: &[Value], index: usize) -> Result<&Dict> {
    let value = args.get(index).ok_or_else(|| missing("dict", index))?;
    value.as_dict().ok_or_else(|| mismatch("dict", index, value))
}

/// Object paths are also accepted as plain strings
fn path_arg(args: &[Value], index: usize) -> Result<&str> {
    let value = args.get(index).ok_or_else(|| missing("object path", index))?;
    match value {
        Value::ObjectPath(path) => Ok(path.as_str()),
        Value::String(s) => Ok(s.as_str()),
        other => Err(mismatch("object path", index, other)),
    }
}

fn str_arg(args: &[Value], index: usize) -> Result<&str> {
    let value = args.get(index).ok_or_else(|| missing("string", index))?;
    value.as_str().ok_or_else(|| mismatch("string", index, value))
}

fn bool_arg(args: &[Value], index: usize) -> Result<bool> {
    let value = args.get(index).ok_or_else(|| missing("bool", index))?;
    value.as_bool().ok_or_else(|| mismatch("bool", index, value))
}

/// Convenience for callers building a `CreateSession` call
pub fn create_session_args(attributes: Dict, notify_path: ObjectPath) -> Vec<Value> {
    vec![Value::Dict(attributes), Value::ObjectPath(notify_path)]
}
