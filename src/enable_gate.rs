//! Server-authoritative arbitration of the wall-run enabled flag.
//!
//! The server owns the flag. A client controlling its own body may switch
//! the ability off at once and tell the server, but never switches it on
//! without the server's word. Transport is out of scope: the gate returns
//! the RPC the caller must deliver, and the receiving side feeds it back
//! through [`EnableGate::client_set_enabled`] or
//! [`EnableGate::server_set_enabled`].

use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Holder of the enabled flag, usually the movement controller.
#[cfg_attr(test, mockall::automock)]
pub trait WallRunEnableTarget {
    /// Stored flag, ignoring overheat.
    fn wall_run_enable_flag(&self) -> bool;

    /// Stores the flag. Returns `true` if it changed.
    fn set_wall_run_enable_flag(&mut self, enabled: bool) -> bool;

    /// Tells dependent systems the flag is now `enabled`.
    fn announce_enable_changed(&mut self, enabled: bool);
}

/// Network role of the process simulating a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetRole {
    /// The server; its flag is authoritative.
    Authority,
    /// A remote process simulating a copy of the body.
    Client,
}

/// Reliable RPC the caller must deliver to the other side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateRpc {
    /// Server to owning client.
    ClientSetEnabled(bool),
    /// Owning client to server. Only ever carries `false`.
    ServerSetEnabled(bool),
}

/// Applies the enable rules for one body on one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnableGate {
    role: NetRole,
    locally_controlled: bool,
}

fn apply(target: &mut dyn WallRunEnableTarget, enabled: bool) {
    if target.set_wall_run_enable_flag(enabled) {
        target.announce_enable_changed(enabled);
    }
}

impl EnableGate {
    /// Gate for a body simulated as `role`, controlled here or not.
    #[must_use]
    pub const fn new(role: NetRole, locally_controlled: bool) -> Self {
        Self {
            role,
            locally_controlled,
        }
    }

    /// Network role of this process.
    #[must_use]
    pub const fn role(&self) -> NetRole {
        self.role
    }

    /// The body is driven by input on this process.
    #[must_use]
    pub const fn is_locally_controlled(&self) -> bool {
        self.locally_controlled
    }

    /// Requests a new flag value from the ability layer on this process.
    pub fn request_set_enabled(
        &self,
        target: &mut dyn WallRunEnableTarget,
        enabled: bool,
    ) -> Option<GateRpc> {
        match (self.role, self.locally_controlled) {
            (NetRole::Authority, true) => {
                apply(target, enabled);
                None
            }
            (NetRole::Authority, false) => {
                apply(target, enabled);
                Some(GateRpc::ClientSetEnabled(enabled))
            }
            (NetRole::Client, true) if enabled => {
                debug!("enable request deferred to the server");
                None
            }
            (NetRole::Client, true) => {
                apply(target, false);
                Some(GateRpc::ServerSetEnabled(false))
            }
            (NetRole::Client, false) => {
                warn!("ignoring enable request for a body this client does not control");
                None
            }
        }
    }

    /// Handles [`GateRpc::ClientSetEnabled`] from the server.
    pub fn client_set_enabled(&self, target: &mut dyn WallRunEnableTarget, enabled: bool) {
        if self.role == NetRole::Authority {
            warn!("client enable RPC received on the authority; ignored");
            return;
        }
        apply(target, enabled);
    }

    /// Handles [`GateRpc::ServerSetEnabled`] from the owning client.
    /// Returns whether the notification was accepted.
    pub fn server_set_enabled(&self, target: &mut dyn WallRunEnableTarget, enabled: bool) -> bool {
        if self.role != NetRole::Authority {
            warn!("server enable RPC received on a client; ignored");
            return false;
        }
        if self.locally_controlled {
            warn!("server enable RPC for a locally controlled body; ignored");
            return false;
        }
        if enabled {
            warn!("client asked to enable wall running; ignored");
            return false;
        }
        apply(target, false);
        true
    }
}
