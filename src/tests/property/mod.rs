//! Property-based tests
//!
//! Invariants checked over generated inputs with proptest.
//!
//! ## Running Property Tests
//!
//! ```sh
//! cargo test property --release
//! ```
//!
//! ## Test Modules
//!
//! - `metadata_selection_props`: metadata field selection
//!   - Include never yields fields outside the list
//!   - Exclude never yields listed fields
//!   - Include and exclude of the same list partition the fields
//!
//! - `splitter_props`: document splitting
//!   - Every word of the input appears in some chunk, in order
//!   - Chunks never exceed the configured length
//!   - Consecutive chunks share exactly `overlap` units
//!
//! - `filter_props`: exclusion filters
//!   - Local evaluation agrees with the id set
//!   - Parsed `$nin` mapping equals the constructed filter
//!   - Rendered `terms` clauses never exceed the per-clause limit
//!
//! Case count can be raised with `PROPTEST_CASES`.

mod filter_props;
mod metadata_selection_props;
mod splitter_props;
