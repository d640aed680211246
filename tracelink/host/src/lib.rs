pub mod broker;
pub mod lifecycle;

pub use broker::{BrokerHost, BrokerHostBuilder, Host, StandaloneHost};
pub use lifecycle::{HostError, LifecycleParticipant, LifecycleProcessor};
