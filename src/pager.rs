//! Pure pagination logic.
//!
//! Ported from `original_source/src/utils.c`'s `display_buf_more`: lines are
//! counted in terminal rows (a line longer than the terminal width wraps and
//! consumes more than one row), and the first page is a full page of rows
//! while every following page is one row shorter, since the previous page's
//! bottom row becomes the new page's top row once the terminal scrolls.
//! The actual `--More--` prompt and keypress wait are host I/O, not
//! implemented here.

/// Split `text` into screen pages of at most `height` terminal rows each,
/// wrapping any line wider than `width` onto however many rows it occupies.
/// `width`/`height` of `0` are treated as `1` so pagination still makes
/// progress instead of dividing by zero.
pub fn paginate(text: &str, width: usize, height: usize) -> Vec<String> {
    let width = width.max(1);
    let height = height.max(1);

    let mut pages = Vec::new();
    let mut current = String::new();
    let mut rows_used = 0usize;
    let mut page_height = height;

    for line in text.split('\n') {
        let rows = rows_for_line(line, width);
        if rows_used > 0 && rows_used + rows > page_height {
            pages.push(std::mem::take(&mut current));
            rows_used = 0;
            page_height = height.saturating_sub(1).max(1);
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
        rows_used += rows;
    }
    if !current.is_empty() || pages.is_empty() {
        pages.push(current);
    }
    pages
}

fn rows_for_line(line: &str, width: usize) -> usize {
    let len = line.chars().count();
    len.div_ceil(width).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_page() {
        let pages = paginate("one\ntwo\nthree", 80, 24);
        assert_eq!(pages, vec!["one\ntwo\nthree".to_string()]);
    }

    #[test]
    fn overflowing_line_count_splits_pages() {
        let text = (0..30).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let pages = paginate(&text, 80, 10);
        assert!(pages.len() > 1);
        assert!(pages.iter().all(|p| p.split('\n').count() <= 10));
    }

    #[test]
    fn wide_line_consumes_multiple_rows() {
        let wide = "x".repeat(200);
        let text = format!("{wide}\nshort");
        let pages = paginate(&text, 80, 3);
        assert_eq!(pages[0], format!("{wide}"));
    }

    #[test]
    fn empty_text_yields_one_empty_page() {
        assert_eq!(paginate("", 80, 24), vec!["".to_string()]);
    }
}
