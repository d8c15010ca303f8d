pub mod config;
pub mod fake_feed;
pub mod feed_event;
pub mod html;
pub mod http_client;
pub mod logging;
pub mod page;
pub mod renderer;
pub mod sse;
pub mod state;
pub mod stream;
