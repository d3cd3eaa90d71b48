//! HTML entity handling for titles, URLs and icons in bookmark files.

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Decode named and numeric character references; unknown ones are kept as written
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let decoded = tail[1..]
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_reference(&tail[1..1 + end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 2..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("plain", "plain")]
    #[case("Tom & Jerry", "Tom &amp; Jerry")]
    #[case(r#"<b>"quoted"</b>"#, "&lt;b&gt;&quot;quoted&quot;&lt;/b&gt;")]
    #[case("it's", "it's")]
    fn test_escape(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape(input), expected);
    }

    #[rstest]
    #[case("Tom &amp; Jerry", "Tom & Jerry")]
    #[case("&lt;tag&gt; &quot;q&quot;", "<tag> \"q\"")]
    #[case("it&#39;s &apos;x&apos;", "it's 'x'")]
    #[case("&#x263A;", "\u{263A}")]
    #[case("AT&T", "AT&T")]
    #[case("a & b; c", "a & b; c")]
    #[case("&bogus;", "&bogus;")]
    #[case("&amp;lt;", "&lt;")]
    fn test_unescape(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(unescape(input), expected);
    }

    #[test]
    fn test_escape_then_unescape_is_identity() {
        let original = r#"Q&A <forum> "best" of 2024 & more"#;
        assert_eq!(unescape(&escape(original)), original);
    }
}
