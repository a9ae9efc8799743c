use rand::Rng;
use serenity::all::CreateEmbed;

/// Colors used across the bot's embeds.
pub struct Colors;

impl Colors {
    pub const ERROR: u32 = 0xE74C3C;
}

/// A random RGB color, used for announcements and informational embeds.
pub fn random_color() -> u32 {
    rand::thread_rng().gen_range(0..=0xFFFFFF)
}

/// Informational embed with a random color.
pub fn info_embed() -> CreateEmbed {
    base_embed(random_color())
}

/// Create an error-themed embed (red).
pub fn error_embed() -> CreateEmbed {
    base_embed(Colors::ERROR)
}

fn base_embed(color: u32) -> CreateEmbed {
    CreateEmbed::default()
        .color(color)
        .timestamp(serenity::model::Timestamp::now())
}
