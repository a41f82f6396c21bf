/// Supplies human-facing order numbers (external collaborator).
///
/// Called once per submitted order. Numbers must be unique; they need not be
/// contiguous.
pub trait NumberGenerator: Send + Sync {
    fn next_order_number(&self) -> String;
}
