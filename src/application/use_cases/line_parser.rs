// ============================================================
// LINE PARSER
// ============================================================
// Tokenize one delimited line, tolerating messy quoting

/// Permissive tokenizer for one line of delimited text.
///
/// Supports both `"` and `'` as quote characters: whichever opens a field is
/// the active quote until its un-escaped close. A doubled active quote inside
/// a quoted span collapses to one literal quote. Delimiters inside a quoted
/// span are literal. The parser never rejects input; an unmatched quote is
/// restored as a literal character when the line ends, leaving rejection to
/// validation.
pub struct LineParser {
    delimiter: char,
}

impl Default for LineParser {
    fn default() -> Self {
        Self { delimiter: ',' }
    }
}

impl LineParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Split one line into trimmed field values. The final field is emitted
    /// even without a trailing delimiter.
    pub fn parse(&self, line: &str) -> Vec<String> {
        let mut fields = Vec::new();
        let mut current = String::new();
        let mut quote: Option<(char, usize)> = None; // active quote char + its offset in `current`

        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            match quote {
                None => {
                    if c == '"' || c == '\'' {
                        quote = Some((c, current.len()));
                    } else if c == self.delimiter {
                        fields.push(current.trim().to_string());
                        current.clear();
                    } else {
                        current.push(c);
                    }
                }
                Some((q, _)) => {
                    if c == q {
                        if chars.peek() == Some(&q) {
                            // Escaped quote: keep one literal, stay quoted
                            current.push(q);
                            chars.next();
                        } else {
                            quote = None;
                        }
                    } else {
                        current.push(c);
                    }
                }
            }
        }

        // Unterminated quote: the opening character was literal after all
        if let Some((q, pos)) = quote {
            current.insert(pos, q);
        }

        fields.push(current.trim().to_string());
        fields
    }
}
