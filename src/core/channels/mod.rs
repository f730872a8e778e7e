//! Reference channel and command collaborators.
//!
//! The fleet view only sees the [`TagChannel`](crate::core::fleet::TagChannel)
//! and [`CommandSink`](crate::core::fleet::CommandSink) traits. The hub
//! implements both in memory; feeds fill it from a replay file or a WebSocket.

pub mod feed;
pub mod hub;
pub mod ws;

pub use feed::{parse_line, replay_file, FeedMessage};
pub use hub::{ChannelHub, OutboundCommand};
pub use ws::{parse_feed_url, run_bridge};
