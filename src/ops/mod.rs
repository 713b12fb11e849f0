//! Lifecycle orchestrators.
//!
//! One module per operation. Each performs a single read->mutate->write
//! cycle against the config store: state is read once, mutated in memory
//! while the synchronizer applies filesystem effects, and committed in one
//! terminal write. A failure before that write leaves the persisted config
//! untouched; filesystem effects already applied are rolled back where the
//! operation is multi-step (install, switch).

pub mod disable;
pub mod enable;
pub mod install;
pub mod remove;
pub mod switch;
pub mod update;

pub use disable::disable;
pub use enable::enable;
pub use install::install;
pub use remove::remove;
pub use switch::switch;
pub use update::update;

/// What an operation did, for the CLI to render.
#[derive(Debug, Default)]
pub struct OpReport {
    /// Whether any state was committed.
    pub changed: bool,
    pub messages: Vec<String>,
    pub warnings: Vec<String>,
}

impl OpReport {
    pub fn note(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn warn_all<I, S>(&mut self, warnings: I)
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.warnings
            .extend(warnings.into_iter().map(|w| w.to_string()));
    }
}
