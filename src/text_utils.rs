use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::Regex;

/// Lowercase ASCII slug: accents are transliterated and every run of
/// non-alphanumeric characters becomes a single `-`.
pub fn slugify(text: &str) -> String {
    lazy_static! {
        static ref NON_ALNUM: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
    }

    let ascii = unidecode::unidecode(text).to_lowercase();
    NON_ALNUM.replace_all(&ascii, "-").trim_matches('-').to_string()
}

/// A slug can be used verbatim as a file name.
pub fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug != "."
        && slug != ".."
        && !slug.chars().any(|c| c == '/' || c == '\\' || c.is_control())
}

pub fn format_date_time(date_time: &NaiveDateTime) -> (String, String) {
    let date = date_time.format("%Y-%m-%d").to_string();
    let time = date_time.format("%H:%M:%S").to_string();
    (date, time)
}

// Elements whose text is left alone by `beautify`.
const VERBATIM_TAGS: [&str; 5] = ["pre", "code", "kbd", "script", "style"];

fn tag_name(chars: &[char]) -> (bool, String) {
    let mut iter = chars.iter().skip(1).peekable();
    let closing = iter.peek() == Some(&&'/');
    if closing {
        iter.next();
    }
    let name: String = iter
        .take_while(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    (closing, name)
}

fn opens_quote(prev: Option<char>) -> bool {
    match prev {
        None => true,
        Some(c) => c.is_whitespace() || "([{<—–-".contains(c),
    }
}

fn starts_with(chars: &[char], pattern: &str) -> bool {
    let mut i = 0;
    for p in pattern.chars() {
        if chars.get(i) != Some(&p) {
            return false;
        }
        i += 1;
    }
    true
}

/// Typographic clean-up for titles and rendered HTML: curly quotes, en and
/// em dashes, ellipsis. Markup and the contents of `<pre>`, `<code>` and
/// friends are copied unchanged.
pub fn beautify(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut in_tag = false;
    let mut verbatim_depth = 0usize;
    let mut prev: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if in_tag {
            out.push(c);
            if c == '>' {
                in_tag = false;
            }
            i += 1;
            continue;
        }

        if c == '<' {
            let (closing, name) = tag_name(&chars[i..]);
            if VERBATIM_TAGS.contains(&name.as_str()) {
                if closing {
                    verbatim_depth = verbatim_depth.saturating_sub(1);
                } else {
                    verbatim_depth += 1;
                }
            }
            in_tag = true;
            out.push(c);
            i += 1;
            continue;
        }

        if verbatim_depth > 0 {
            out.push(c);
            i += 1;
            continue;
        }

        // Markdown output escapes quotes as entities.
        let (c, width) = if starts_with(&chars[i..], "&quot;") {
            ('"', 6)
        } else if starts_with(&chars[i..], "&#39;") {
            ('\'', 5)
        } else {
            (c, 1)
        };

        let (replacement, width) = match c {
            '-' if starts_with(&chars[i..], "---") => ('—', 3),
            '-' if starts_with(&chars[i..], "--") => ('–', 2),
            '.' if starts_with(&chars[i..], "...") => ('…', 3),
            '"' if opens_quote(prev) => ('“', width),
            '"' => ('”', width),
            '\'' if opens_quote(prev) => ('‘', width),
            '\'' => ('’', width),
            _ => (c, width),
        };

        out.push(replacement);
        prev = Some(replacement);
        i += width;
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Héllo, World!"), "hello-world");
        assert_eq!(slugify("  What I learned after 20+ years  "), "what-i-learned-after-20-years");
        assert_eq!(slugify("Ábaco --- dir_2"), "abaco-dir-2");
        assert_eq!(slugify("!!!"), "");

        let slug = slugify("Crème brûlée: a   how-to?");
        assert_eq!(slug, "creme-brulee-a-how-to");
        assert!(!slug.contains(char::is_whitespace));
        assert!(!slug.contains("--"));
    }

    #[test]
    fn test_is_safe_slug() {
        assert!(is_safe_slug("hello-world"));
        assert!(!is_safe_slug(""));
        assert!(!is_safe_slug(".."));
        assert!(!is_safe_slug("a/b"));
    }

    #[test]
    fn test_format_date_time() {
        let date_time = NaiveDate::from_ymd_opt(2017, 9, 10).unwrap().and_hms_opt(10, 42, 32).unwrap();
        let (date, time) = format_date_time(&date_time);
        assert_eq!(date, "2017-09-10");
        assert_eq!(time, "10:42:32");
    }

    #[test]
    fn test_beautify_text() {
        assert_eq!(beautify(r#""Hello," she said -- it's fine..."#), "“Hello,” she said – it’s fine…");
        assert_eq!(beautify("before---after"), "before—after");
        assert_eq!(beautify("'quoted'"), "‘quoted’");
    }

    #[test]
    fn test_beautify_keeps_markup() {
        let html = r#"<p class="intro">Don&#39;t &quot;panic&quot;</p><pre><code>let s = "raw" -- x;</code></pre><p>...</p>"#;
        assert_eq!(
            beautify(html),
            r#"<p class="intro">Don’t “panic”</p><pre><code>let s = "raw" -- x;</code></pre><p>…</p>"#
        );
        assert_eq!(beautify("<!-- more -->"), "<!-- more -->");
    }
}
