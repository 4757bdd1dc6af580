pub mod config;
pub mod config_loader;
pub mod error;
pub mod state_machine;
pub mod throttle;
pub mod traits;

pub use config::{
    ArtifactLayout, DescriptorSource, PackageDefaults, PublisherConfig, UmbrellaConfig,
};
pub use config_loader::{ConfigLoadOptions, ConfigLoader, ConfigOverrides};
pub use error::{PublishError, Result};
pub use state_machine::{PublishState, PublishStateMachine, StateTransition};
pub use throttle::PublishThrottle;
pub use traits::{OperatorPrompt, PackageRegistryClient, PromptAnswer};
