//! Just enough HTML handling to find links and read article text.

use std::sync::LazyLock;

use regex::{Captures, Regex};

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("literal pattern compiles")
}

static HREF: LazyLock<Regex> =
    LazyLock::new(|| regex(r#"(?i)<a\s[^>]*?href\s*=\s*(?:"([^"]*)"|'([^']*)')"#));
static ARTICLE_BODY: LazyLock<Regex> = LazyLock::new(|| {
    regex(r#"(?is)<div[^>]*class\s*=\s*["'][^"']*\barticle-body\b[^"']*["'][^>]*>(.*)</div>"#)
});
static ARTICLE: LazyLock<Regex> = LazyLock::new(|| regex(r"(?is)<article[^>]*>(.*?)</article>"));
static BODY: LazyLock<Regex> = LazyLock::new(|| regex(r"(?is)<body[^>]*>(.*?)</body>"));
static SCRIPTS: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?is)<(script|style|noscript)[^>]*>.*?</(script|style|noscript)>"));
static COMMENTS: LazyLock<Regex> = LazyLock::new(|| regex(r"(?s)<!--.*?-->"));
static BLOCK_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)<br\s*/?>|</(p|div|h[1-6]|li|tr|section|blockquote)>"));
static TAGS: LazyLock<Regex> = LazyLock::new(|| regex(r"(?s)<[^>]+>"));
static ENTITY: LazyLock<Regex> = LazyLock::new(|| regex(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);"));

/// Every `href` attribute value of an anchor, in document order.
pub fn extract_links(html: &str) -> Vec<String> {
    HREF.captures_iter(html)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| decode_entities(m.as_str()))
        .collect()
}

/// Readable text of a transcript page.
///
/// The article body is preferred over the whole page. Scripts, styles and
/// comments are dropped, block elements become line breaks, remaining tags are
/// stripped and entities decoded. Lines are trimmed and blank lines removed.
pub fn html_to_text(html: &str) -> String {
    let content = [&*ARTICLE_BODY, &*ARTICLE, &*BODY]
        .iter()
        .find_map(|re| re.captures(html).and_then(|c| c.get(1)))
        .map_or(html, |m| m.as_str());

    let text = SCRIPTS.replace_all(content, "");
    let text = COMMENTS.replace_all(&text, "");
    let text = BLOCK_BREAKS.replace_all(&text, "\n");
    let text = TAGS.replace_all(&text, "");
    let text = decode_entities(&text);

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decodes numeric character references and the common named entities.
/// Unknown entities are left as written.
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |c: &Captures<'_>| {
            let entity = &c[1];
            let decoded = if let Some(hex) = entity.strip_prefix("#x").or(entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                named_entity(entity)
            };
            decoded.map_or_else(|| c[0].to_string(), |ch| ch.to_string())
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "rsquo" | "lsquo" => '\'',
        "rdquo" | "ldquo" => '"',
        "ndash" | "mdash" => '-',
        "hellip" => '…',
        _ => return None,
    };
    Some(ch)
}
