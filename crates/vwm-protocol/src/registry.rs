//! Process-wide table of compiled layout plans.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::kind::{Direction, MessageSpec};
use crate::layout::LayoutPlan;
use crate::schema::Interface;

const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

/// A message declaration paired with its compiled plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledMessage {
    pub interface: Interface,
    pub direction: Direction,
    pub opcode: u16,
    pub spec: &'static MessageSpec,
    pub plan: LayoutPlan,
}

impl CompiledMessage {
    /// Compiles a single declaration.
    #[must_use]
    pub fn compile(
        interface: Interface,
        direction: Direction,
        opcode: u16,
        spec: &'static MessageSpec,
    ) -> Self {
        Self {
            interface,
            direction,
            opcode,
            spec,
            plan: LayoutPlan::compile(spec.args),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.spec.name
    }

    #[must_use]
    pub const fn is_destructor(&self) -> bool {
        self.spec.destructor
    }
}

/// Compiled plans keyed by interface, direction and opcode.
#[derive(Debug)]
pub struct ProtocolRegistry {
    messages: HashMap<(Interface, Direction, u16), CompiledMessage>,
}

impl ProtocolRegistry {
    /// Compiles every message of every interface in the schema.
    #[must_use]
    pub fn build() -> Self {
        let mut messages = HashMap::new();
        for interface in Interface::ALL {
            let spec = interface.spec();
            for (direction, list) in [
                (Direction::Request, spec.requests),
                (Direction::Event, spec.events),
            ] {
                for (index, message) in list.iter().enumerate() {
                    let Ok(opcode) = u16::try_from(index) else {
                        break;
                    };
                    messages.insert(
                        (interface, direction, opcode),
                        CompiledMessage::compile(interface, direction, opcode, message),
                    );
                }
            }
        }
        debug!(
            target: REGISTRY_TARGET,
            messages = messages.len(),
            "compiled protocol layout plans"
        );
        Self { messages }
    }

    /// Plan for a request, or `None` when the opcode is not declared.
    #[must_use]
    pub fn request(&self, interface: Interface, opcode: u16) -> Option<&CompiledMessage> {
        self.messages.get(&(interface, Direction::Request, opcode))
    }

    /// Plan for an event, or `None` when the opcode is not declared.
    #[must_use]
    pub fn event(&self, interface: Interface, opcode: u16) -> Option<&CompiledMessage> {
        self.messages.get(&(interface, Direction::Event, opcode))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

static REGISTRY: Lazy<ProtocolRegistry> = Lazy::new(ProtocolRegistry::build);

/// The shared registry, compiled on first use.
#[must_use]
pub fn registry() -> &'static ProtocolRegistry {
    &REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{display, registry as wl_registry, surface};

    #[test]
    fn every_declared_message_is_compiled() {
        let expected: usize = Interface::ALL
            .iter()
            .map(|interface| interface.spec().requests.len() + interface.spec().events.len())
            .sum();
        assert_eq!(registry().len(), expected);
    }

    #[test]
    fn lookups_are_keyed_by_direction() {
        let sync = registry()
            .request(Interface::Display, display::request::SYNC)
            .expect("wl_display.sync");
        assert_eq!(sync.name(), "sync");

        let error = registry()
            .event(Interface::Display, display::event::ERROR)
            .expect("wl_display.error");
        assert_eq!(error.name(), "error");
        assert_eq!(error.plan.variable_count(), 1);
    }

    #[test]
    fn unknown_opcodes_are_absent() {
        assert!(registry().request(Interface::Display, 2).is_none());
        assert!(registry().event(Interface::Compositor, 0).is_none());
    }

    #[test]
    fn bind_carries_a_generic_new_id() {
        let bind = registry()
            .request(Interface::Registry, wl_registry::request::BIND)
            .expect("wl_registry.bind");
        assert_eq!(bind.plan.fixed_size(), 12);
        assert_eq!(bind.plan.variable_count(), 1);
    }

    #[test]
    fn destroy_is_flagged_as_destructor() {
        let destroy = registry()
            .request(Interface::Surface, surface::request::DESTROY)
            .expect("wl_surface.destroy");
        assert!(destroy.is_destructor());
        let commit = registry()
            .request(Interface::Surface, surface::request::COMMIT)
            .expect("wl_surface.commit");
        assert!(!commit.is_destructor());
    }
}
