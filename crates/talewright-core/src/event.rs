//! Domain event abstractions.

/// Trait that all domain events implement.
///
/// Events are append-only facts: once produced they are never mutated.
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Returns the event type name (used for serialization routing and logs).
    fn event_type(&self) -> &'static str;

    /// Serializes the event payload to JSON.
    fn to_payload(&self) -> serde_json::Value;
}
