//! Test suites for the request server daemon.

mod bootstrap_behaviour;
mod support;
