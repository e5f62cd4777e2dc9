pub mod insight;
pub mod voice;
