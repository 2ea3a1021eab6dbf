//! Fake EWS server for integration testing
//!
//! An in-process HTTP endpoint that speaks just enough SOAP to exercise
//! `ExchangeClient` end-to-end:
//!
//! TCP -> HTTP POST -> operation dispatch -> canned SOAP response
//!
//! ## Module layout
//!
//! - `server` -- TCP listener, minimal HTTP/1.1, operation dispatch
//! - `handlers/` -- one file per EWS operation (FindFolder, FindItem, ...)
//! - `mailbox` -- test data model (folders, items, builder)
//! - `xml` -- request-introspection helpers

pub mod mailbox;
mod server;
mod xml;

pub use mailbox::MailboxBuilder;
pub use server::FakeEwsServer;
