//! Centralized limits and thresholds.
//!
//! Recursion limits for the relationship solver itself live in
//! `rfx_solver::recursion::RecursionProfile`, which reads the values below.

// =============================================================================
// Relationship Limits
// =============================================================================

/// Maximum nesting depth for inheritance checks.
///
/// Each constraint hop (`T : IComparable<T>`) or nested argument comparison
/// adds one level. Real hierarchies are far shallower; hitting the limit
/// means the constraint graph is cyclic in a way the cycle set didn't catch.
pub const MAX_INHERITANCE_DEPTH: u32 = 64;

/// Total work budget for a single inheritance query.
pub const MAX_INHERITANCE_ITERATIONS: u32 = 100_000;

/// Maximum depth for unifying nested generic argument patterns
/// (`IEnumerable<KeyValuePair<K, List<V>>>`).
pub const MAX_UNIFY_DEPTH: u32 = 32;

/// Maximum depth of type substitution.
pub const MAX_INSTANTIATION_DEPTH: u32 = 64;

// =============================================================================
// Parsing Limits
// =============================================================================

/// Maximum nesting of generic argument lists in a parsed type name.
pub const MAX_TYPE_NAME_NESTING: u32 = 32;

/// Maximum length accepted by the type-name parser.
pub const MAX_TYPE_NAME_LENGTH: usize = 4096;
