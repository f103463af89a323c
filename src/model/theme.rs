use std::io;
use std::path::Path;

pub const INDEX_THEME_FILE: &str = "index.theme";
const ICON_THEME_SECTION: &str = "[Icon Theme]";

/// The `[Icon Theme]` section of a theme's `index.theme`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexTheme {
    pub name: String,
    pub comment: String,
    pub inherits: String,
}

impl IndexTheme {
    pub fn parse(content: &str) -> Self {
        let mut theme = IndexTheme::default();
        let mut in_section = false;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.starts_with('[') {
                in_section = line == ICON_THEME_SECTION;
                continue;
            }
            if !in_section {
                continue;
            }

            if let Some((key, val)) = line.split_once('=') {
                let val = val.trim().to_string();
                match key.trim() {
                    "Name" => theme.name = val,
                    "Comment" => theme.comment = val,
                    "Inherits" => theme.inherits = val,
                    _ => {}
                }
            }
        }

        theme
    }

    pub fn load(theme_dir: &Path) -> io::Result<Self> {
        let content = std::fs::read_to_string(theme_dir.join(INDEX_THEME_FILE))?;
        Ok(Self::parse(&content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_icon_theme_section_only() {
        let content = "\
[Other]
Name=Wrong

[Icon Theme]
# comment
Name = Breeze Snow
Comment=KDE cursor theme
Inherits=breeze_cursors
";
        let theme = IndexTheme::parse(content);
        assert_eq!(theme.name, "Breeze Snow");
        assert_eq!(theme.comment, "KDE cursor theme");
        assert_eq!(theme.inherits, "breeze_cursors");
    }

    #[test]
    fn test_parse_without_section() {
        assert_eq!(IndexTheme::parse("Name=Loose"), IndexTheme::default());
    }
}
