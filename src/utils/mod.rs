pub mod embeds;
pub mod permissions;
pub mod text;
