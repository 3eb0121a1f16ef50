//! Recursive-descent parser for the ConfigTree text format
//!
//! The grammar is line oriented. Each trimmed line is, in order of
//! precedence:
//!
//! - blank or a `#` comment: skipped
//! - `name += value`: appended to `name` as `", " + value`
//! - `name = value`: sets `name`; further `=` belong to the value
//! - `... {`: opens a child section named by the text accumulated so far
//! - `}`: closes the current section
//! - anything else: a fragment of a pending section name
//!
//! Text following `{` on the same line is parsed as if it started the next
//! line, so `Name { }` opens and closes an empty section.

use log::warn;

use super::ConfigTree;
use crate::error::{Error, Result};

struct Parser<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    pushback: Option<(usize, &'a str)>,
    last_line: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
            pushback: None,
            last_line: 0,
        }
    }

    /// Next line fragment with its 1-based line number.
    fn next_fragment(&mut self) -> Option<(usize, &'a str)> {
        let fragment = self
            .pushback
            .take()
            .or_else(|| self.lines.next().map(|(index, line)| (index + 1, line)))?;
        self.last_line = fragment.0;
        Some(fragment)
    }

    fn parse_section(&mut self, section: &mut ConfigTree, depth: usize) -> Result<()> {
        let mut pending = String::new();

        while let Some((line_no, raw)) = self.next_fragment() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(eq) = line.find('=') {
                drop_pending(&mut pending, line_no);
                let append = eq > 0 && line.as_bytes()[eq - 1] == b'+';
                let name = if append {
                    line[..eq - 1].trim()
                } else {
                    line[..eq].trim()
                };
                if name.is_empty() {
                    return Err(Error::ConfigParse {
                        line: line_no,
                        message: format!("Option without a name: '{}'", line),
                    });
                }
                let value = line[eq + 1..].trim();
                if append {
                    section.append_option(name, value);
                } else {
                    section.options.insert(name.to_string(), value.to_string());
                }
                continue;
            }

            if line == "}" {
                if depth == 0 {
                    return Err(Error::ConfigParse {
                        line: line_no,
                        message: "Unexpected '}' outside of any section".to_string(),
                    });
                }
                drop_pending(&mut pending, line_no);
                return Ok(());
            }

            if let Some(brace) = line.find('{') {
                pending.push_str(line[..brace].trim());
                let name = std::mem::take(&mut pending);
                if name.is_empty() {
                    return Err(Error::ConfigParse {
                        line: line_no,
                        message: "Section opened without a name".to_string(),
                    });
                }
                let rest = line[brace + 1..].trim();
                if !rest.is_empty() {
                    self.pushback = Some((line_no, rest));
                }
                let mut child = ConfigTree::new();
                self.parse_section(&mut child, depth + 1)?;
                section.children.insert(name, child);
                continue;
            }

            pending.push_str(line);
        }

        if depth > 0 {
            return Err(Error::ConfigParse {
                line: self.last_line,
                message: "Missing '}' at end of input".to_string(),
            });
        }
        drop_pending(&mut pending, self.last_line);
        Ok(())
    }
}

fn drop_pending(pending: &mut String, line_no: usize) {
    if !pending.is_empty() {
        warn!(
            "Ignoring dangling section name fragment '{}' before line {}",
            pending, line_no
        );
        pending.clear();
    }
}

impl ConfigTree {
    /// Parses ConfigTree text.
    ///
    /// Fails with [`Error::ConfigParse`] naming the offending line when a
    /// section has no name, an option has no name, or braces are unbalanced.
    pub fn parse(text: &str) -> Result<Self> {
        let mut tree = ConfigTree::new();
        Parser::new(text).parse_section(&mut tree, 0)?;
        Ok(tree)
    }
}
