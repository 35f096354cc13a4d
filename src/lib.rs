//! This crate contains a simple lambda calculus reducer and a checker for
//! simply typed judgements.

pub mod box_tree_impl;
pub mod end_to_end;
pub mod lexical_analysis;
