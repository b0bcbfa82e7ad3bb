//! Player uuid rewriting for online-mode proxies that forward nothing to
//! their backends.
//!
//! Backends derive offline uuids from player names while clients know each
//! other by their authenticated uuids. Packets that name a player are
//! translated at the proxy boundary: offline to online on the way to the
//! client, online to offline on the way to the backend.

pub mod cache;
pub mod hooks;
pub mod resolver;
pub mod rewriter;
pub mod store;

pub use hooks::{on_player_connect, on_player_disconnect, on_proxy_start, on_proxy_stop};
pub use resolver::{RewriteDirection, UuidResolver};
pub use rewriter::{rewrite_inbound, rewrite_outbound, rewrite_payload, UuidRewriter};
