use crate::models::listing::Post;

/// Which fields of a post make up its text line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    TitleOnly,
    TitleAndBody,
}

pub fn extract_text(post: &Post, mode: ExtractMode) -> String {
    let raw = match mode {
        ExtractMode::TitleOnly => post.title.clone(),
        ExtractMode::TitleAndBody => format!("{} {}", post.title, post.selftext),
    };
    normalize_line(&raw)
}

/// `\n` becomes a space and `\r` is dropped, so `\r\n` collapses to one space.
pub fn normalize_line(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '\r')
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect()
}
