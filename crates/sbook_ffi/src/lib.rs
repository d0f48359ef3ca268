//! Flutter bridge surface over `sbook_core`.

pub mod api;
