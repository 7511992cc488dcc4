//! The scanner: turns source text into a flat token stream.
//!
//! Lexical errors never abort scanning — each bad token is reported through
//! the [`Handler`] and skipped, so a single typo doesn't hide every other
//! problem in the file. This mirrors the rest of the pipeline's
//! diagnostics-as-values discipline: nothing panics or throws here.

use wispc_util::{FileId, Handler, Span, Symbol};

use crate::cursor::Cursor;
use crate::token::{SpannedToken, Token};

/// Scans `source` end to end, returning every token that scanned cleanly.
/// Lexical errors are reported to `handler`; the returned stream simply omits
/// the offending lexeme and continues from the next character.
pub fn tokenize(source: &str, file_id: FileId, handler: &Handler) -> Vec<SpannedToken> {
    let mut lexer = Lexer::new(source, file_id, handler);
    let mut tokens = Vec::new();
    loop {
        let tok = lexer.next_token();
        let is_eof = tok.token == Token::Eof;
        tokens.push(tok);
        if is_eof {
            break;
        }
    }
    tokens
}

struct Lexer<'a> {
    cursor: Cursor<'a>,
    file_id: FileId,
    handler: &'a Handler,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str, file_id: FileId, handler: &'a Handler) -> Self {
        Self {
            cursor: Cursor::new(source),
            file_id,
            handler,
        }
    }

    fn span(&self, start: usize, start_line: u32, start_col: u32) -> Span {
        Span::with_file(start, self.cursor.position(), self.file_id, start_line, start_col)
    }

    fn report(&self, span: Span, message: impl Into<String>) {
        self.handler.build_error(span, message).emit(self.handler);
    }

    /// Skip whitespace and `//` line comments between tokens.
    fn skip_trivia(&mut self) {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.current_char() == '/' && self.cursor.peek_char(1) == '/' {
                while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                    self.cursor.advance();
                }
                continue;
            }
            break;
        }
    }

    fn next_token(&mut self) -> SpannedToken {
        loop {
            self.skip_trivia();

            let start = self.cursor.position();
            let start_line = self.cursor.line();
            let start_col = self.cursor.column();

            if self.cursor.is_at_end() {
                return SpannedToken {
                    token: Token::Eof,
                    span: self.span(start, start_line, start_col),
                };
            }

            let c = self.cursor.current_char();

            if let Some(tok) = self.scan_one(c, start, start_line, start_col) {
                return tok;
            }
            // The lexeme at `start` was malformed and already reported; keep
            // scanning so later, well-formed tokens are still returned.
        }
    }

    /// Scans a single lexeme starting at the cursor. Returns `None` if the
    /// lexeme was malformed (a diagnostic has already been reported and the
    /// cursor advanced past it).
    fn scan_one(&mut self, c: char, start: usize, start_line: u32, start_col: u32) -> Option<SpannedToken> {
        if c.is_ascii_alphabetic() || c == '_' {
            return Some(self.scan_ident(start, start_line, start_col));
        }
        if c.is_ascii_digit() {
            return self.scan_int(start, start_line, start_col);
        }
        if c == '"' {
            return self.scan_string(start, start_line, start_col);
        }

        let token = match c {
            '(' => { self.cursor.advance(); Token::LParen }
            ')' => { self.cursor.advance(); Token::RParen }
            '{' => { self.cursor.advance(); Token::LBrace }
            '}' => { self.cursor.advance(); Token::RBrace }
            ',' => { self.cursor.advance(); Token::Comma }
            ':' => { self.cursor.advance(); Token::Colon }
            ';' => { self.cursor.advance(); Token::Semi }
            '*' => { self.cursor.advance(); Token::Star }
            '/' => { self.cursor.advance(); Token::Slash }
            '=' => {
                self.cursor.advance();
                if self.cursor.match_char('=') { Token::EqEq } else { Token::Assign }
            }
            '!' => {
                self.cursor.advance();
                if self.cursor.match_char('=') { Token::NotEq } else { Token::Bang }
            }
            '<' => {
                self.cursor.advance();
                if self.cursor.match_char('=') { Token::LessEq } else { Token::Less }
            }
            '>' => {
                self.cursor.advance();
                if self.cursor.match_char('=') { Token::GreaterEq } else { Token::Greater }
            }
            '+' => {
                self.cursor.advance();
                if self.cursor.match_char('+') { Token::PlusPlus } else { Token::Plus }
            }
            '-' => {
                self.cursor.advance();
                if self.cursor.match_char('-') { Token::MinusMinus } else { Token::Minus }
            }
            other => {
                self.cursor.advance();
                let span = self.span(start, start_line, start_col);
                self.report(span, format!("Illegal character {other}"));
                return None;
            }
        };

        Some(SpannedToken { token, span: self.span(start, start_line, start_col) })
    }

    fn scan_ident(&mut self, start: usize, start_line: u32, start_col: u32) -> SpannedToken {
        while self.cursor.current_char().is_ascii_alphanumeric() || self.cursor.current_char() == '_' {
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(start);
        let sym = Symbol::lookup_keyword(text).unwrap_or_else(|| Symbol::intern(text));
        SpannedToken {
            token: Token::Ident(sym),
            span: self.span(start, start_line, start_col),
        }
    }

    fn scan_int(&mut self, start: usize, start_line: u32, start_col: u32) -> Option<SpannedToken> {
        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(start);
        let span = self.span(start, start_line, start_col);
        match text.parse::<i64>() {
            Ok(value) => Some(SpannedToken { token: Token::IntLit(value), span }),
            Err(_) => {
                self.report(span, "Integer literal overflow");
                None
            }
        }
    }

    fn scan_string(&mut self, start: usize, start_line: u32, start_col: u32) -> Option<SpannedToken> {
        // consume opening quote
        self.cursor.advance();

        let mut value = String::new();
        let mut bad_escape = false;
        let mut terminated = false;

        loop {
            let c = self.cursor.current_char();
            if c == '"' {
                self.cursor.advance();
                terminated = true;
                break;
            }
            if c == '\n' || self.cursor.is_at_end() {
                break;
            }
            if c == '\\' {
                self.cursor.advance();
                let escaped = self.cursor.current_char();
                match escaped {
                    'n' => { value.push('\n'); self.cursor.advance(); }
                    't' => { value.push('\t'); self.cursor.advance(); }
                    '"' => { value.push('"'); self.cursor.advance(); }
                    '\\' => { value.push('\\'); self.cursor.advance(); }
                    _ => {
                        bad_escape = true;
                        if !self.cursor.is_at_end() && escaped != '\n' {
                            self.cursor.advance();
                        }
                    }
                }
                continue;
            }
            value.push(c);
            self.cursor.advance();
        }

        let span = self.span(start, start_line, start_col);
        match (terminated, bad_escape) {
            (true, false) => Some(SpannedToken { token: Token::StrLit(Symbol::intern(&value)), span }),
            (true, true) => {
                self.report(span, "String literal with bad escape sequence detected");
                None
            }
            (false, false) => {
                self.report(span, "Unterminated string literal detected");
                None
            }
            (false, true) => {
                self.report(span, "Unterminated string literal with bad escape sequence detected");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(source: &str) -> (Vec<Token>, Handler) {
        let handler = Handler::new();
        let scanned = tokenize(source, FileId::DUMMY, &handler);
        (scanned.into_iter().map(|t| t.token).collect(), handler)
    }

    #[test]
    fn scans_punctuation_and_operators() {
        let (tokens, handler) = toks("( ) { } , : ; = == ! != < <= > >= + ++ - --");
        assert!(!handler.has_errors());
        assert_eq!(
            tokens,
            vec![
                Token::LParen, Token::RParen, Token::LBrace, Token::RBrace, Token::Comma,
                Token::Colon, Token::Semi, Token::Assign, Token::EqEq, Token::Bang, Token::NotEq,
                Token::Less, Token::LessEq, Token::Greater, Token::GreaterEq, Token::Plus,
                Token::PlusPlus, Token::Minus, Token::MinusMinus, Token::Eof,
            ]
        );
    }

    #[test]
    fn keywords_resolve_to_fixed_symbols() {
        let (tokens, _) = toks("int x take give exit magic immutable");
        match tokens[0] {
            Token::Ident(s) => assert_eq!(s, wispc_util::symbol::KW_INT),
            _ => panic!("expected ident"),
        }
        match tokens[1] {
            Token::Ident(s) => assert!(!s.is_known()),
            _ => panic!("expected ident"),
        }
    }

    #[test]
    fn scans_int_literal() {
        let (tokens, handler) = toks("42");
        assert!(!handler.has_errors());
        assert_eq!(tokens, vec![Token::IntLit(42), Token::Eof]);
    }

    #[test]
    fn int_overflow_is_reported_and_skipped() {
        let (tokens, handler) = toks("99999999999999999999 1");
        assert!(handler.has_errors());
        assert_eq!(tokens, vec![Token::IntLit(1), Token::Eof]);
    }

    #[test]
    fn scans_string_literal_with_escapes() {
        let (tokens, handler) = toks(r#""hi\n\t\"\\""#);
        assert!(!handler.has_errors());
        match tokens[0] {
            Token::StrLit(sym) => assert_eq!(sym.as_str(), "hi\n\t\"\\"),
            _ => panic!("expected string literal"),
        }
    }

    #[test]
    fn unterminated_string_is_reported() {
        let (tokens, handler) = toks("\"abc\nx");
        assert!(handler.has_errors());
        assert_eq!(
            handler.diagnostics()[0].message,
            "Unterminated string literal detected"
        );
        assert_eq!(tokens, vec![Token::Ident(Symbol::intern("x")), Token::Eof]);
    }

    #[test]
    fn bad_escape_is_reported() {
        let (_, handler) = toks(r#""bad\qescape""#);
        assert!(handler.has_errors());
        assert_eq!(
            handler.diagnostics()[0].message,
            "String literal with bad escape sequence detected"
        );
    }

    #[test]
    fn unterminated_with_bad_escape_reports_combined_message() {
        let (_, handler) = toks("\"bad\\qescape\nmore");
        assert!(handler.has_errors());
        assert_eq!(
            handler.diagnostics()[0].message,
            "Unterminated string literal with bad escape sequence detected"
        );
    }

    #[test]
    fn illegal_character_is_reported_and_scanning_continues() {
        let (tokens, handler) = toks("x @ y");
        assert!(handler.has_errors());
        assert_eq!(handler.diagnostics()[0].message, "Illegal character @");
        assert_eq!(
            tokens,
            vec![
                Token::Ident(Symbol::intern("x")),
                Token::Ident(Symbol::intern("y")),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn line_comments_are_skipped() {
        let (tokens, handler) = toks("x // trailing comment\ny");
        assert!(!handler.has_errors());
        assert_eq!(
            tokens,
            vec![
                Token::Ident(Symbol::intern("x")),
                Token::Ident(Symbol::intern("y")),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn tracks_line_and_column() {
        let handler = Handler::new();
        let scanned = tokenize("x\n  y", FileId::DUMMY, &handler);
        assert_eq!(scanned[0].span.line, 1);
        assert_eq!(scanned[0].span.column, 1);
        assert_eq!(scanned[1].span.line, 2);
        assert_eq!(scanned[1].span.column, 3);
    }
}
