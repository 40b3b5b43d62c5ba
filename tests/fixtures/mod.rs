//! Reusable handshake fixtures.

mod two_party;

pub use two_party::{TwoPartyFixture, wire};
