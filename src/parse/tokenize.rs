//! Line tokenizer.
//!
//! Quoting is shell-lenient: an unterminated quote runs to end of input
//! instead of failing, and there are no backslash escapes.

/// A lexical token.
///
/// Operators are kept distinct from words so a quoted `"|"` stays a literal
/// argument when the parser splits stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    /// `|`
    Pipe,
    /// `<`
    RedirectIn,
    /// `>`
    RedirectOut,
    /// `>>`
    Append,
    /// `<<`
    Heredoc,
}

impl Token {
    /// The token's source text (operators) or contents (words).
    pub fn as_str(&self) -> &str {
        match self {
            Token::Word(w) => w,
            Token::Pipe => "|",
            Token::RedirectIn => "<",
            Token::RedirectOut => ">",
            Token::Append => ">>",
            Token::Heredoc => "<<",
        }
    }
}

/// Split a line into flat string tokens.
///
/// `grep "a b" file.txt` → `["grep", "a b", "file.txt"]`.
pub fn tokenize(line: &str) -> Vec<String> {
    lex(line)
        .into_iter()
        .map(|t| match t {
            Token::Word(w) => w,
            op => op.as_str().to_string(),
        })
        .collect()
}

/// Split a line into typed tokens.
pub fn lex(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut buf = String::new();
    // A quoted region was opened in the current word, so emit it even if empty.
    let mut quoted = false;
    let (mut sq, mut dq) = (false, false);

    let chars: Vec<char> = line.chars().collect();
    let len = chars.len();
    let mut i = 0;

    while i < len {
        let c = chars[i];

        if c == '"' && !sq {
            dq = !dq;
            quoted = true;
            i += 1;
            continue;
        }
        if c == '\'' && !dq {
            sq = !sq;
            quoted = true;
            i += 1;
            continue;
        }
        if sq || dq {
            buf.push(c);
            i += 1;
            continue;
        }

        if c.is_whitespace() {
            flush(&mut tokens, &mut buf, &mut quoted);
            i += 1;
            continue;
        }

        let next = chars.get(i + 1).copied();
        let op = match (c, next) {
            ('>', Some('>')) => Some((Token::Append, 2)),
            ('<', Some('<')) => Some((Token::Heredoc, 2)),
            ('|', _) => Some((Token::Pipe, 1)),
            ('<', _) => Some((Token::RedirectIn, 1)),
            ('>', _) => Some((Token::RedirectOut, 1)),
            _ => None,
        };
        if let Some((op, width)) = op {
            flush(&mut tokens, &mut buf, &mut quoted);
            tokens.push(op);
            i += width;
            continue;
        }

        buf.push(c);
        i += 1;
    }

    flush(&mut tokens, &mut buf, &mut quoted);
    tokens
}

fn flush(tokens: &mut Vec<Token>, buf: &mut String, quoted: &mut bool) {
    if !buf.is_empty() || *quoted {
        tokens.push(Token::Word(std::mem::take(buf)));
    }
    *quoted = false;
}
