//! Core data model: the message tree, email content, transactions and statements.

pub mod email;
pub mod part;
pub mod statement;
pub mod transaction;
