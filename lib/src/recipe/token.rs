use memchr::memchr3;

/// A lexical piece of one line of recipe markup.
///
/// Names and quantities are raw slices of the input; cleaning happens in the
/// parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    Ingredient { name: &'a str, quantity: &'a str, unit: &'a str },
    Cookware { name: &'a str },
    Timer { name: &'a str, quantity: &'a str, unit: &'a str },
}

/// Scans a single line into tokens.
///
/// ```text
/// @name{qty%unit}   ingredient; braces optional, `%unit` optional
/// #name{...}        cookware; brace contents ignored
/// ~name{qty%unit}   timer; braces required, name optional
/// ```
///
/// A name runs up to the next `@`, `#`, `~`, or `{`. A marker that does not
/// form a token is kept as text, as is an unclosed brace.
pub fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut tokens = vec![];
    let mut text_start = 0;
    let mut cursor = 0;

    while let Some(offset) = memchr3(b'@', b'#', b'~', &line.as_bytes()[cursor..]) {
        let at = cursor + offset;
        let marker = line.as_bytes()[at];
        let Some((token, end)) = scan_marked(line, at, marker) else {
            cursor = at + 1;
            continue;
        };

        if text_start < at {
            tokens.push(Token::Text(&line[text_start..at]));
        }

        tokens.push(token);
        text_start = end;
        cursor = end;
    }

    if text_start < line.len() {
        tokens.push(Token::Text(&line[text_start..]));
    }

    tokens
}

/// Tries to read a token whose marker is at `at`. Returns the token and the
/// byte offset just past it.
fn scan_marked(line: &str, at: usize, marker: u8) -> Option<(Token<'_>, usize)> {
    let name_start = at + 1;
    let name_end = name_end(line, name_start);
    let name = &line[name_start..name_end];
    let braces = braced(line, name_end);

    match marker {
        b'@' if !name.is_empty() => match braces {
            Some((inner, end)) => {
                let (quantity, unit) = split_amount(inner);
                Some((Token::Ingredient { name, quantity, unit }, end))
            }
            None => Some((Token::Ingredient { name, quantity: "", unit: "" }, name_end)),
        },
        b'#' if !name.is_empty() => {
            let end = braces.map_or(name_end, |(_, end)| end);
            Some((Token::Cookware { name }, end))
        }
        b'~' => {
            let (inner, end) = braces?;
            let (quantity, unit) = split_amount(inner);
            Some((Token::Timer { name, quantity, unit }, end))
        }
        _ => None,
    }
}

fn name_end(line: &str, start: usize) -> usize {
    line[start..].find(['@', '#', '~', '{'])
        .map_or(line.len(), |i| start + i)
}

/// If a closed `{...}` starts at `at`, returns its contents and the offset
/// past the closing brace.
fn braced(line: &str, at: usize) -> Option<(&str, usize)> {
    let rest = line[at..].strip_prefix('{')?;
    let close = rest.find('}')?;
    Some((&rest[..close], at + 1 + close + 1))
}

fn split_amount(inner: &str) -> (&str, &str) {
    inner.split_once('%').unwrap_or((inner, ""))
}
