//! Domain facade (§4.6): one module per resource kind, each validating its
//! own arguments, adjusting the path via [`crate::path::sanitise`] where a
//! backend needs it, and dispatching into the active [`crate::capability::Forge`].
//! `issues`, `pulls`, `milestones`, and the pipeline/job pair additionally
//! expose an `action_table` consumed by [`crate::actions::run_chain`].

pub mod comments;
pub mod forks;
pub mod issues;
pub mod labels;
pub mod milestones;
pub mod notifications;
pub mod pipelines;
pub mod pulls;
pub mod repos;
pub mod sshkeys;
