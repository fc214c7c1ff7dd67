//! On-disk post formats. Both strategies produce the same
//! [`crate::post::Header`] and can write it back in canonical form.

pub mod header_format;
pub mod legacy_format;
pub mod parsing_utils;
