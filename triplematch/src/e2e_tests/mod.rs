//! End-to-end tests through the `Engine` facade.
//!
//! Each test file covers a specific scenario, using small hand-written
//! graphs to verify the complete prepare/execute/stream cycle.

#![cfg(test)]

mod helpers;

mod test_async_stream;
mod test_backpressure;
mod test_close_early;
mod test_constraint_filter;
mod test_custom_relation;
mod test_empty_query;
mod test_error_propagation;
mod test_join;
mod test_named_graphs;
mod test_simple_match;
mod test_sorter_independence;
mod test_string_match;
mod test_tree_query;
mod test_unbound_output;
mod test_variable_count;
