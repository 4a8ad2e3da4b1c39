mod text;

pub use text::{excerpt, show_newlines};
