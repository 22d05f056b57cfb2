use super::EntityMetadata;

/// Aggregate root contract.
///
/// Instance accessors give the record's identity and lifecycle metadata;
/// the static part names the aggregate for tables, logs and error messages.
pub trait AggregateRoot {
    type Id;

    fn id(&self) -> Self::Id;

    /// Business code of the record (e.g. the RO number)
    fn code(&self) -> &str;

    fn description(&self) -> &str;

    fn metadata(&self) -> &EntityMetadata;

    fn metadata_mut(&mut self) -> &mut EntityMetadata;

    /// Aggregate index, e.g. "a001"
    fn aggregate_index() -> &'static str;

    /// Collection name, e.g. "repair_order"
    fn collection_name() -> &'static str;

    /// Human-readable singular name
    fn element_name() -> &'static str;

    /// Human-readable plural name
    fn list_name() -> &'static str;
}
