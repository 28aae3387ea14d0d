//! Core domain types

pub mod common;
pub mod query;
pub mod record;
pub mod verdict;
