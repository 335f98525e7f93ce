//! Statement parsing: MIME tree walk, content decoding, and transaction extraction.

pub mod decode;
pub mod mime;
pub mod transaction;
