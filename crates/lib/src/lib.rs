//! Courier core library — config, Telegram channel, and the relay pipeline
//! (classifier, batch buffer, flush scheduler, forwarding) used by the CLI.

pub mod channels;
pub mod config;
pub mod relay;
