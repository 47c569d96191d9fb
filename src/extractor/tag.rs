//! Go struct tag parsing.

/// Looks up `key` in a Go struct tag using the `reflect.StructTag` conventions:
/// space separated `key:"value"` pairs with Go-quoted values.
///
/// Returns `None` when the key is absent or the tag is malformed before the key
/// is reached.
pub fn lookup(tag: &str, key: &str) -> Option<String> {
    let mut rest = tag;

    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            return None;
        }

        // Key runs up to the colon; control characters, spaces and quotes are illegal
        let name_len = rest
            .find(|c: char| c <= ' ' || c == ':' || c == '"' || c == '\u{7f}')
            .unwrap_or(rest.len());
        if name_len == 0 || !rest[name_len..].starts_with(":\"") {
            return None;
        }
        let name = &rest[..name_len];
        rest = &rest[name_len + 1..];

        // Scan the quoted value, honoring backslash escapes
        let bytes = rest.as_bytes();
        let mut i = 1;
        while i < bytes.len() && bytes[i] != b'"' {
            if bytes[i] == b'\\' {
                i += 1;
            }
            i += 1;
        }
        if i >= bytes.len() {
            return None;
        }
        let quoted = &rest[1..i];
        rest = &rest[i + 1..];

        if name == key {
            return Some(unquote(quoted));
        }
    }
}

fn unquote(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Strips the delimiters from a Go string literal holding a struct tag.
///
/// Raw literals (`` `...` ``) are taken verbatim; interpreted literals
/// (`"..."`) have their escapes resolved.
pub fn literal_contents(literal: &str) -> String {
    if let Some(raw) = literal
        .strip_prefix('`')
        .and_then(|s| s.strip_suffix('`'))
    {
        return raw.to_string();
    }
    if let Some(interpreted) = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
    {
        return unquote(interpreted);
    }
    literal.to_string()
}

/// The parsed `json` annotation of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonTag {
    /// Output name; empty when the tag only carries options (`json:",omitempty"`)
    pub name: String,
    pub omitempty: bool,
}

impl JsonTag {
    pub fn parse(value: &str) -> Self {
        let mut parts = value.split(',');
        let name = parts.next().unwrap_or_default().to_string();
        let omitempty = parts.any(|opt| opt == "omitempty");
        Self { name, omitempty }
    }

    /// A bare `-` removes the field from the serialized form.
    pub fn is_skip(&self) -> bool {
        self.name == "-"
    }
}

/// Returns true when a `validate` annotation lists the `required` rule,
/// either on its own or as one alternative of a `|` group.
pub fn validate_requires(value: &str) -> bool {
    value
        .split([',', '|'])
        .any(|rule| rule.trim() == "required")
}
