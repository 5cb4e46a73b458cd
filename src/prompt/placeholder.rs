//! Placeholder scanner for `{name}` templates
//!
//! Brace rules follow Python format strings: `{{` and `}}` are literal braces,
//! `{name}` is a placeholder, and any other lone brace is a syntax error.

use crate::error::{Result, StackError};

/// A `{name}` token found in a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    /// Byte offset of the opening brace
    pub offset: usize,
}

/// A piece of a tokenized template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Text(&'a str),
    Placeholder { name: &'a str, offset: usize },
}

/// Split a template into literal text and placeholders.
///
/// Escaped braces come back as single-brace `Text` segments.
pub(crate) fn segments(template: &str) -> Result<Vec<Segment<'_>>> {
    let bytes = template.as_bytes();
    let mut out = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' => {
                if start < i {
                    out.push(Segment::Text(&template[start..i]));
                }
                if bytes.get(i + 1) == Some(&b'{') {
                    out.push(Segment::Text(&template[i..i + 1]));
                    i += 2;
                    start = i;
                    continue;
                }

                let rest = &template[i + 1..];
                let end = match rest.find(['{', '}']) {
                    None => {
                        return Err(StackError::InvalidTemplate(format!(
                            "Unclosed '{{' at offset {}",
                            i
                        )));
                    }
                    Some(j) if rest.as_bytes()[j] == b'{' => {
                        return Err(StackError::InvalidTemplate(format!(
                            "Unexpected '{{' inside placeholder at offset {}",
                            i + 1 + j
                        )));
                    }
                    Some(j) => j,
                };

                let name = &rest[..end];
                if name.is_empty() {
                    return Err(StackError::InvalidTemplate(format!("Empty placeholder at offset {}", i)));
                }
                out.push(Segment::Placeholder { name, offset: i });
                i += end + 2;
                start = i;
            }
            b'}' => {
                if start < i {
                    out.push(Segment::Text(&template[start..i]));
                }
                if bytes.get(i + 1) == Some(&b'}') {
                    out.push(Segment::Text(&template[i..i + 1]));
                    i += 2;
                    start = i;
                    continue;
                }
                return Err(StackError::InvalidTemplate(format!(
                    "Single '}}' encountered at offset {}",
                    i
                )));
            }
            _ => i += 1,
        }
    }

    if start < bytes.len() {
        out.push(Segment::Text(&template[start..]));
    }
    Ok(out)
}

/// Return every placeholder in the template, in order of appearance.
pub fn scan_placeholders(template: &str) -> Result<Vec<Placeholder>> {
    Ok(segments(template)?
        .into_iter()
        .filter_map(|s| match s {
            Segment::Placeholder { name, offset } => Some(Placeholder {
                name: name.to_string(),
                offset,
            }),
            Segment::Text(_) => None,
        })
        .collect())
}
