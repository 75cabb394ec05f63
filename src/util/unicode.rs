use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Display width in terminal cells.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate a string to fit within `max_cells` terminal cells, appending `…` if truncated.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if max_cells == 0 {
        return String::new();
    }
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    if max_cells == 1 {
        return "\u{2026}".to_string();
    }
    let budget = max_cells - 1; // reserve 1 cell for '…'
    let mut width = 0;
    let mut result = String::new();
    for grapheme in s.graphemes(true) {
        let gw = UnicodeWidthStr::width(grapheme);
        if width + gw > budget {
            break;
        }
        width += gw;
        result.push_str(grapheme);
    }
    result.push('\u{2026}');
    result
}

/// Right-pad with spaces to `cells` display cells (no-op if already wider).
pub fn pad_to_width(s: &str, cells: usize) -> String {
    let w = display_width(s);
    if w >= cells {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(cells - w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_width_accents_and_cjk() {
        assert_eq!(display_width("Tesorería"), 9);
        assert_eq!(display_width("cafe\u{0301}"), 4);
        assert_eq!(display_width("你好"), 4);
    }

    #[test]
    fn truncate_fits_unchanged() {
        assert_eq!(truncate_to_width("Becas", 5), "Becas");
        assert_eq!(truncate_to_width("Becas", 0), "");
    }

    #[test]
    fn truncate_adds_ellipsis_on_grapheme_boundary() {
        assert_eq!(truncate_to_width("Inscripción", 6), "Inscr\u{2026}");
        assert_eq!(truncate_to_width("cafe\u{0301}s", 5), "cafe\u{0301}s");
        assert_eq!(truncate_to_width("cafe\u{0301}s!", 5), "cafe\u{0301}\u{2026}");
        assert_eq!(truncate_to_width("你好世界", 5), "你好\u{2026}");
        assert_eq!(truncate_to_width("abc", 1), "\u{2026}");
    }

    #[test]
    fn pad_uses_display_cells() {
        assert_eq!(pad_to_width("ñu", 4), "ñu  ");
        assert_eq!(pad_to_width("你", 4), "你  ");
        assert_eq!(pad_to_width("largo", 3), "largo");
    }
}
