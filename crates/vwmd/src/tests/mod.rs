//! Behavioural suites for the display server.

mod bootstrap_behaviour;
mod process_behaviour;
mod socket_behaviour;
pub(crate) mod support;
