//! Database ID type definition.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
/// The ID of an income or expense entry.
pub type ExpenseId = DatabaseId;
