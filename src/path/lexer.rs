use crate::error::CompileError;

/// Token standing for the empty segment between two dots (`..`).
pub const DESCEND: &str = " ";

/// Splits path text into dot-separated segments.
///
/// Brackets, single-quoted runs inside brackets and `/pattern/i` regex
/// literals following `=~` are opaque: a `.` inside them never splits.
#[derive(Debug, Clone)]
pub struct Lexer {
    source: String,
    input: Vec<char>,
    pos: usize,
    depth: usize,
    current: String,
    pub tokens: Vec<String>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            source: input.to_string(),
            input: input.chars().collect(),
            pos: 0,
            depth: 0,
            current: String::new(),
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(&mut self) -> Result<&[String], CompileError> {
        match self.input.first() {
            Some(&root @ ('$' | '@')) => self.tokens.push(root.to_string()),
            _ => return Err(CompileError::MissingRoot(self.source.clone())),
        }
        if self.source.ends_with('.') {
            return Err(CompileError::TrailingDot(self.source.clone()));
        }
        self.pos = 1;
        if self.peek_current() == Some('.') {
            self.pos += 1;
        }
        if self.pos >= self.input.len() {
            return Ok(&self.tokens);
        }

        let mut regex_armed = false;
        while self.pos < self.input.len() {
            let ch = self.input[self.pos];
            match ch {
                '.' if self.depth == 0 => {
                    self.pos += 1;
                    self.emit();
                    continue;
                }
                '[' => self.depth += 1,
                ']' => {
                    if self.depth == 0 {
                        return Err(CompileError::UnbalancedBracket(self.source.clone()));
                    }
                    self.depth -= 1;
                }
                '\'' if self.depth > 0 => {
                    self.read_quoted()?;
                    continue;
                }
                '=' if self.depth > 0 && self.peek_next() == Some('~') => {
                    regex_armed = true;
                    self.current.push_str("=~");
                    self.pos += 2;
                    continue;
                }
                '/' if regex_armed => {
                    regex_armed = false;
                    self.read_regex()?;
                    continue;
                }
                _ => {}
            }
            self.current.push(ch);
            self.pos += 1;
        }

        if self.depth > 0 {
            return Err(CompileError::UnbalancedBracket(self.source.clone()));
        }
        self.emit();
        Ok(&self.tokens)
    }

    fn emit(&mut self) {
        let segment = std::mem::take(&mut self.current);
        if !segment.is_empty() {
            self.tokens.push(segment);
        } else if self.tokens.last().map(String::as_str) != Some(DESCEND) {
            self.tokens.push(DESCEND.to_string());
        }
    }

    /// Consume `'...'` verbatim, quotes included.
    fn read_quoted(&mut self) -> Result<(), CompileError> {
        self.current.push('\'');
        self.pos += 1;
        while let Some(ch) = self.peek_current() {
            self.current.push(ch);
            self.pos += 1;
            if ch == '\'' {
                return Ok(());
            }
        }
        Err(CompileError::UnterminatedQuote(self.source.clone()))
    }

    /// Consume `/pattern/i` verbatim. `\/` does not close the literal.
    fn read_regex(&mut self) -> Result<(), CompileError> {
        self.current.push('/');
        self.pos += 1;
        while let Some(ch) = self.peek_current() {
            match ch {
                '\\' => {
                    self.current.push(ch);
                    self.pos += 1;
                    if let Some(escaped) = self.peek_current() {
                        self.current.push(escaped);
                        self.pos += 1;
                    }
                }
                '/' if self.peek_next() == Some('i') => {
                    self.current.push_str("/i");
                    self.pos += 2;
                    return Ok(());
                }
                _ => {
                    self.current.push(ch);
                    self.pos += 1;
                }
            }
        }
        Err(CompileError::UnterminatedRegex(self.source.clone()))
    }

    fn peek_current(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.input.get(self.pos + 1).copied()
    }
}

/// Tokenize path text. The first token is always the root marker.
pub fn tokenize(path: &str) -> Result<Vec<String>, CompileError> {
    let mut lex = Lexer::new(path);
    lex.tokenize()?;
    Ok(lex.tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(path: &str) -> Vec<String> {
        tokenize(path).unwrap()
    }

    #[test]
    fn simple_keys() {
        assert_eq!(toks("$.store.book"), vec!["$", "store", "book"]);
    }

    #[test]
    fn self_root() {
        assert_eq!(toks("@.price"), vec!["@", "price"]);
    }

    #[test]
    fn bracket_after_root() {
        assert_eq!(toks("$[0].name"), vec!["$", "[0]", "name"]);
    }

    #[test]
    fn root_only() {
        assert_eq!(toks("$"), vec!["$"]);
    }

    #[test]
    fn recursive_descent() {
        assert_eq!(toks("$..author"), vec!["$", " ", "author"]);
        assert_eq!(toks("$.store..price"), vec!["$", "store", " ", "price"]);
    }

    #[test]
    fn repeated_empty_segments_collapse() {
        assert_eq!(toks("$.a...b"), vec!["$", "a", " ", "b"]);
    }

    #[test]
    fn dots_inside_brackets_do_not_split() {
        assert_eq!(
            toks("$.book[?(@.price < 10)].title"),
            vec!["$", "book[?(@.price < 10)]", "title"]
        );
    }

    #[test]
    fn nested_brackets() {
        assert_eq!(
            toks("$.a[?(@.b[0] == 1)].c"),
            vec!["$", "a[?(@.b[0] == 1)]", "c"]
        );
    }

    #[test]
    fn regex_literal_is_opaque() {
        assert_eq!(
            toks("$.book[?(@.title =~ /^a.b]c.*$/i)].isbn"),
            vec!["$", "book[?(@.title =~ /^a.b]c.*$/i)]", "isbn"]
        );
    }

    #[test]
    fn escaped_slash_inside_regex() {
        assert_eq!(
            toks(r"$.u[?(@.p =~ /a\/i.b/i)]"),
            vec!["$", r"u[?(@.p =~ /a\/i.b/i)]"]
        );
    }

    #[test]
    fn quoted_literal_is_opaque() {
        assert_eq!(
            toks("$.a[?(@.name == 'x.]y')].b"),
            vec!["$", "a[?(@.name == 'x.]y')]", "b"]
        );
    }

    #[test]
    fn missing_root_errors() {
        assert!(matches!(tokenize("store.book"), Err(CompileError::MissingRoot(_))));
        assert!(matches!(tokenize(""), Err(CompileError::MissingRoot(_))));
    }

    #[test]
    fn trailing_dot_errors() {
        assert!(matches!(tokenize("$.store."), Err(CompileError::TrailingDot(_))));
        assert!(matches!(tokenize("$.."), Err(CompileError::TrailingDot(_))));
    }

    #[test]
    fn unbalanced_brackets_error() {
        assert!(matches!(tokenize("$.a[0"), Err(CompileError::UnbalancedBracket(_))));
        assert!(matches!(tokenize("$.a]0"), Err(CompileError::UnbalancedBracket(_))));
    }

    #[test]
    fn unterminated_regex_errors() {
        assert!(matches!(
            tokenize("$.a[?(@.b =~ /abc)]"),
            Err(CompileError::UnterminatedRegex(_))
        ));
    }

    #[test]
    fn unterminated_quote_errors() {
        assert!(matches!(
            tokenize("$.a[?(@.b == 'abc)]"),
            Err(CompileError::UnterminatedQuote(_))
        ));
    }
}
