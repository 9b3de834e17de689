//! Integration tests for the SQL-backed file system

mod cli_contracts;
mod concurrency;
mod delete_recursion;
mod end_to_end;
mod move_acyclicity;
mod path_resolution;
mod payload_round_trip;
mod store_lifecycle;
mod support;
mod uniqueness;
