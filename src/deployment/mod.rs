//! Versioned-settings deployment: reconcile, trigger, poll, validate.

pub mod poller;
pub mod reconcile;
pub mod trigger;
pub mod types;
pub mod validator;
pub mod workflow;

pub use poller::{
    Clock, ConvergencePoller, InventorySource, PollOutcome, PollPolicy, PollState, TokioClock,
};
pub use reconcile::Reconciler;
pub use trigger::{
    default_actions, first_success, ActionAttempt, SyncAction, SyncTrigger, TriggerOutcome,
};
pub use types::{
    BuildSettingsMode, CredentialsStorage, SettingsOutcome, VcsRootOutcome, VcsRootSpec,
    VersionedSettingsSpec,
};
pub use validator::{validate, NameCheck, ValidationReport};
pub use workflow::{DeployReport, Deployer, FatalError, FatalStage, Outcome};
