//! Routing of switch commands to local or remote switches.
//!
//! [`Dispatcher`] is the single entry point the batch executor and the CLI
//! use to act on a switch. Depending on the configured [`Role`] it either
//! calls the in-process [`DeviceRegistry`](switchctl_device::DeviceRegistry)
//! or sends a request to the Switch Control Computer through
//! [`RequestClient`]. Every outcome is an explicit [`Result`]; nothing here
//! panics on a failed device or an unreachable peer.
//!
//! [`Role`]: switchctl_config::Role

mod client;
mod dispatcher;
mod interlock;

pub use client::{RequestClient, TransportError};
pub use dispatcher::{
    CommandSink, DispatchContext, DispatchError, Dispatcher, Reply, SwitchCommand,
};
pub use interlock::FaultInterlock;
