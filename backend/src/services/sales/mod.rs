//! Sales pipeline: opportunities and quotations.

pub mod opportunities;
pub mod quotations;
