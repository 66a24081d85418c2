//! Automatic and on-demand callouts.
//!
//! The announcer sits between the resolver and the audio queue: it
//! decides which nearby features deserve words, phrases them, and
//! queues the marker-sound-plus-speech pair each one gets. A bounded
//! window of recently announced features keeps the ambient watch from
//! repeating itself block after block.

mod announcer;
mod recent;

pub use announcer::{Announcer, NONE_FOUND_MESSAGE};
pub use recent::RecentCallouts;
