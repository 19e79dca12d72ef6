//! Note accumulation and document assembly for notepin.
//!
//! This crate ties the chunk cache, metadata store and document renderer
//! together into the submit workflow, exposed through [`Notebook`].

pub mod compiler;
pub mod entry;
pub mod layout;
pub mod notebook;

pub use compiler::{SubmissionCompiler, SubmitReceipt, fold_submission};
pub use notebook::Notebook;
