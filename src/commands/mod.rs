pub mod general;
pub mod server;

use crate::error::Error;
use crate::Data;

/// Every command the bot registers.
pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        general::ping(),
        general::pong(),
        general::pancake(),
        general::help(),
        server::ip(),
        server::status(),
    ]
}
