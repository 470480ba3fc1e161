#![doc = include_str!("../README.md")]

pub mod bootstrap;
pub mod config;
pub mod logger;
pub mod platform;

#[doc(inline)]
pub use bootstrap::{Bootstrap, BootstrapError, ClientContext, InitOutcome, SignalState};

#[doc(inline)]
pub use config::{BootstrapConfig, FirebaseOptions};

#[doc(inline)]
pub use platform::{BackendPlatform, MemoryPlatform};
