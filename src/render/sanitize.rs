//! Markup sanitization for untrusted converter output
//!
//! The markdown converter is trusted to emit well-formed structure, but any
//! content it echoes from the source text (including raw HTML the user typed
//! inline) is untrusted. This pass strips everything capable of executing
//! code or loading external resources. It is idempotent: running it on its
//! own output changes nothing.

/// Tags whose entire subtree is removed
const FORBIDDEN_TAGS: [&str; 9] = [
    "script", "style", "iframe", "object", "embed", "link", "meta", "base", "form",
];

/// Attributes that carry URLs and are checked for executable schemes
const URL_ATTRIBUTES: [&str; 5] = ["href", "src", "xlink:href", "formaction", "action"];

/// Elements with no closing tag; a forbidden void tag is dropped without
/// opening a skipped subtree
const VOID_TAGS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Strip unsafe structure from converted markup.
///
/// Walks the element stream and removes forbidden subtrees, `on*` event
/// handler attributes, `style` attributes, and URL attributes whose value
/// resolves to an executable-content scheme. Everything else passes through
/// byte-for-byte.
pub fn sanitize_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut i = 0;
    // While Some, a forbidden subtree is being dropped: lowercase tag name
    // plus the nesting depth of same-named descendants
    let mut skipping: Option<(String, usize)> = None;

    while i < html.len() {
        let rest = &html[i..];

        if !rest.starts_with('<') {
            let next = rest.find('<').map(|o| i + o).unwrap_or(html.len());
            if skipping.is_none() {
                out.push_str(&html[i..next]);
            }
            i = next;
            continue;
        }

        if rest.starts_with("<!--") {
            let end = rest[4..]
                .find("-->")
                .map(|o| i + 4 + o + 3)
                .unwrap_or(html.len());
            if skipping.is_none() {
                out.push_str(&html[i..end]);
            }
            i = end;
            continue;
        }

        if rest.starts_with("<!") {
            let end = rest.find('>').map(|o| i + o + 1).unwrap_or(html.len());
            if skipping.is_none() {
                out.push_str(&html[i..end]);
            }
            i = end;
            continue;
        }

        let Some(tag) = parse_tag(html, i) else {
            // Bare '<' in text; everything up to the next '<' is inert text
            if skipping.is_none() {
                out.push('<');
            }
            i += 1;
            continue;
        };
        i = tag.end;

        // A tag cut off by end of input never reaches the output
        if tag.truncated {
            continue;
        }

        let lname = tag.name.to_ascii_lowercase();

        if skipping.is_some() {
            let mut finished = false;
            if let Some((skip_name, depth)) = &mut skipping {
                if lname == *skip_name {
                    if tag.closing {
                        *depth = depth.saturating_sub(1);
                    } else if !tag.self_closing && !is_void(&lname) {
                        *depth += 1;
                    }
                }
                finished = *depth == 0;
            }
            if finished {
                skipping = None;
            }
            continue;
        }

        if FORBIDDEN_TAGS.contains(&lname.as_str()) {
            if !tag.closing && !tag.self_closing && !is_void(&lname) {
                skipping = Some((lname, 1));
            }
            continue;
        }

        if tag.closing {
            out.push_str("</");
            out.push_str(tag.name);
            out.push('>');
        } else {
            out.push('<');
            out.push_str(tag.name);
            for attr in &tag.attrs {
                if keep_attr(attr) {
                    out.push(' ');
                    out.push_str(attr.raw);
                }
            }
            if tag.self_closing {
                out.push_str("/>");
            } else {
                out.push('>');
            }
        }
    }

    out
}

struct ParsedTag<'a> {
    /// Byte offset just past the closing '>'
    end: usize,
    /// Tag name in original case
    name: &'a str,
    closing: bool,
    self_closing: bool,
    /// Input ended before the tag closed
    truncated: bool,
    attrs: Vec<Attr<'a>>,
}

struct Attr<'a> {
    /// Exact source slice from attribute name through value
    raw: &'a str,
    /// Lowercased attribute name
    name: String,
    /// Value with quotes stripped, entities not decoded
    value: Option<&'a str>,
}

fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

/// Parse one tag starting at the '<' at `start`. Returns `None` when the
/// bytes do not form a tag, in which case the caller treats '<' as text.
fn parse_tag(html: &str, start: usize) -> Option<ParsedTag<'_>> {
    let bytes = html.as_bytes();
    let mut i = start + 1;

    let closing = bytes.get(i) == Some(&b'/');
    if closing {
        i += 1;
    }

    let name_start = i;
    if !bytes.get(i)?.is_ascii_alphabetic() {
        return None;
    }
    while i < bytes.len()
        && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'-' || bytes[i] == b':')
    {
        i += 1;
    }
    let name = &html[name_start..i];

    let mut attrs = Vec::new();
    let mut self_closing = false;
    let mut truncated = false;

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        match bytes.get(i) {
            None => {
                truncated = true;
                break;
            }
            Some(b'>') => {
                i += 1;
                break;
            }
            Some(b'/') if bytes.get(i + 1) == Some(&b'>') => {
                self_closing = true;
                i += 2;
                break;
            }
            _ => {
                let attr_start = i;
                while i < bytes.len()
                    && !bytes[i].is_ascii_whitespace()
                    && !matches!(bytes[i], b'=' | b'>' | b'/')
                {
                    i += 1;
                }
                if i == attr_start {
                    // Stray '/' not followed by '>'
                    i += 1;
                    continue;
                }
                let name_end = i;

                let mut j = i;
                while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                    j += 1;
                }
                let (value, raw_end) = if bytes.get(j) == Some(&b'=') {
                    j += 1;
                    while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                        j += 1;
                    }
                    match bytes.get(j).copied() {
                        Some(quote @ (b'"' | b'\'')) => {
                            let value_start = j + 1;
                            match html[value_start..].find(quote as char) {
                                Some(o) => {
                                    let value_end = value_start + o;
                                    (Some(&html[value_start..value_end]), value_end + 1)
                                }
                                None => {
                                    truncated = true;
                                    i = html.len();
                                    break;
                                }
                            }
                        }
                        _ => {
                            let mut k = j;
                            while k < bytes.len()
                                && !bytes[k].is_ascii_whitespace()
                                && bytes[k] != b'>'
                            {
                                k += 1;
                            }
                            (Some(&html[j..k]), k)
                        }
                    }
                } else {
                    (None, name_end)
                };

                attrs.push(Attr {
                    raw: &html[attr_start..raw_end],
                    name: html[attr_start..name_end].to_ascii_lowercase(),
                    value,
                });
                i = raw_end;
            }
        }
    }

    if truncated {
        i = html.len();
    }

    Some(ParsedTag {
        end: i,
        name,
        closing,
        self_closing,
        truncated,
        attrs,
    })
}

fn keep_attr(attr: &Attr<'_>) -> bool {
    if attr.name.starts_with("on") {
        return false;
    }
    if attr.name == "style" {
        return false;
    }
    if URL_ATTRIBUTES.contains(&attr.name.as_str()) {
        if let Some(value) = attr.value {
            if has_unsafe_url(value) {
                return false;
            }
        }
    }
    true
}

/// Whether a URL attribute value, after entity decoding and control-character
/// stripping, starts with an executable-content scheme
fn has_unsafe_url(value: &str) -> bool {
    let decoded = decode_entities(value);
    let compact: String = decoded.chars().filter(|c| !c.is_ascii_control()).collect();
    let normalized = compact.trim().to_ascii_lowercase();

    normalized.starts_with("javascript:")
        || normalized.starts_with("vbscript:")
        || normalized.starts_with("data:text/html")
        || normalized.starts_with("data:application")
}

/// Minimal entity decoding, enough to keep scheme checks from being evaded
/// with `&#106;avascript:` or `javascript&colon;` spellings
fn decode_entities(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut i = 0;

    while i < value.len() {
        let rest = &value[i..];
        if rest.starts_with('&') {
            // ';' is ASCII, so the byte position is a char boundary
            if let Some(semi) = rest.bytes().take(32).position(|b| b == b';') {
                if let Some(decoded) = decode_entity(&rest[1..semi]) {
                    out.push(decoded);
                    i += semi + 1;
                    continue;
                }
            }
        }
        match rest.chars().next() {
            Some(c) => {
                out.push(c);
                i += c.len_utf8();
            }
            None => break,
        }
    }

    out
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(dec) = entity.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32);
    }
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "colon" => Some(':'),
        "sol" => Some('/'),
        "tab" => Some('\t'),
        "newline" => Some('\n'),
        _ => None,
    }
}
