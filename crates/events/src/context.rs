use crate::cqrs::Cqrs;
use crate::error::ChoreographyError;

/// A bounded context: a named unit owning its commands, events and handlers.
///
/// `configure` registers the context's command handlers and declares the
/// event types it emits. Contexts never call each other; they only react to
/// events through adapters and process managers wired by the composition root.
pub trait BoundedContext {
    fn name(&self) -> &'static str;

    fn configure(&self, cqrs: &Cqrs) -> Result<(), ChoreographyError>;
}
