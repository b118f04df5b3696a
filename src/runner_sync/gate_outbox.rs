//! Enable-gate RPCs awaiting delivery by the transport.

use bevy::prelude::{Entity, Resource};

use crate::enable_gate::GateRpc;

/// RPCs produced by enable requests, tagged with the runner they concern.
#[derive(Resource, Default, Debug)]
pub struct GateOutbox {
    rpcs: Vec<(Entity, GateRpc)>,
}

impl GateOutbox {
    /// Queues `rpc` for `runner`.
    pub fn push(&mut self, runner: Entity, rpc: GateRpc) {
        self.rpcs.push((runner, rpc));
    }

    /// Takes every queued RPC, oldest first.
    pub fn drain(&mut self) -> std::vec::Drain<'_, (Entity, GateRpc)> {
        self.rpcs.drain(..)
    }

    /// Nothing awaits delivery.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rpcs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::prelude::World;
    use rstest::rstest;

    #[rstest]
    fn drain_empties_the_outbox() {
        let mut outbox = GateOutbox::default();
        let runner = World::new().spawn_empty().id();
        outbox.push(runner, GateRpc::ServerSetEnabled(false));
        assert!(!outbox.is_empty());
        let drained: Vec<_> = outbox.drain().collect();
        assert_eq!(drained, vec![(runner, GateRpc::ServerSetEnabled(false))]);
        assert!(outbox.is_empty());
    }
}
