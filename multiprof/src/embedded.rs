use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "../etc/"]
pub struct Etc;
