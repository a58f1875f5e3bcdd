pub mod auxiliary;
pub mod collection;
pub mod config;
pub mod convert;
pub mod dictionary;
pub mod domain;
pub mod error;
pub mod extract;
pub mod fs_util;
pub mod generators;
pub mod output;
pub mod pipeline;
pub mod sheets;
pub mod table;
