// Library root for the deck optimizer core: card model, selection, response
// reconciliation, analysis formatting, and the app event loop the TUI drives.

pub mod app;
pub mod card;
pub mod catalog;
pub mod client;
pub mod config;
pub mod dedup;
pub mod formatter;
pub mod orchestrator;
pub mod protocol;
pub mod selection;
pub mod telemetry;
