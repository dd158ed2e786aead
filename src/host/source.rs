//! Just enough of a front end to find kernel declarations. Kernel bodies are never interpreted.

/// A kernel declaration found in program source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Declaration {
    pub name: String,
    pub params: usize,
    pub line: usize
}

/// Scans `source` for kernel declarations. On failure, returns the build log.
pub(super) fn scan (source: &str) -> Result<Vec<Declaration>, String> {
    let code = strip_comments(source);
    check_delimiters(&code)?;

    let mut result = Vec::new();
    let mut errors = Vec::new();
    let tokens = tokenize(&code);

    for (idx, tok) in tokens.iter().enumerate() {
        if tok.text != "__kernel" && tok.text != "kernel" {
            continue
        }

        match (tokens.get(idx + 1), tokens.get(idx + 2), tokens.get(idx + 3)) {
            (Some(ret), Some(name), Some(open)) if ret.text == "void" && is_ident(&name.text) && open.text == "(" => {
                let params = count_params(&tokens[idx + 4..]);
                if result.iter().any(|d: &Declaration| d.name == name.text) {
                    errors.push(format!("<kernel>:{}:{}: error: redefinition of '{}'", name.line, name.col, name.text));
                    continue
                }

                result.push(Declaration { name: name.text.clone(), params, line: name.line })
            },

            (Some(ret), ..) if ret.text != "void" => {
                errors.push(format!("<kernel>:{}:{}: error: kernel must have void return type", ret.line, ret.col))
            },

            _ => errors.push(format!("<kernel>:{}:{}: error: expected kernel declaration", tok.line, tok.col))
        }
    }

    if errors.is_empty() {
        return Ok(result)
    }

    errors.push(format!("{} error{} generated.", errors.len(), if errors.len() == 1 { "" } else { "s" }));
    Err(errors.join("\n"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    text: String,
    line: usize,
    col: usize
}

#[inline]
fn is_ident (s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic()) && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Counts the parameters of a list starting right after its `(`.
fn count_params (tokens: &[Token]) -> usize {
    let mut depth = 0usize;
    let mut commas = 0;
    let mut empty = true;
    let mut only_void = true;

    for tok in tokens {
        match tok.text.as_str() {
            ")" if depth == 0 => break,
            "(" | "[" | "{" => depth += 1,
            ")" | "]" | "}" => depth = depth.saturating_sub(1),
            "," if depth == 0 => commas += 1,
            _ => {}
        }

        empty = false;
        only_void &= tok.text == "void";
    }

    match (empty, only_void) {
        (true, _) | (false, true) => 0,
        _ => commas + 1
    }
}

/// Splits into identifiers, numbers and single punctuation characters.
fn tokenize (code: &str) -> Vec<Token> {
    let mut result = Vec::new();
    let mut chars = code.chars().peekable();
    let (mut line, mut col) = (1, 1);

    while let Some(c) = chars.next() {
        let (start_line, start_col) = (line, col);
        if c == '\n' {
            line += 1;
            col = 1;
            continue
        }
        col += 1;

        if c.is_whitespace() {
            continue
        }

        let mut text = String::from(c);
        if c == '_' || c.is_ascii_alphanumeric() {
            while let Some(&n) = chars.peek() {
                if n != '_' && !n.is_ascii_alphanumeric() && n != '.' {
                    break
                }
                text.push(n);
                chars.next();
                col += 1;
            }
        }

        result.push(Token { text, line: start_line, col: start_col });
    }

    result
}

fn check_delimiters (code: &str) -> Result<(), String> {
    let mut stack = Vec::<(char, usize, usize)>::new();
    let (mut line, mut col) = (1, 1);

    for c in code.chars() {
        match c {
            '(' | '[' | '{' => stack.push((c, line, col)),
            ')' | ']' | '}' => {
                let open = match c { ')' => '(', ']' => '[', _ => '{' };
                match stack.pop() {
                    Some((o, ..)) if o == open => {},
                    Some((o, l, k)) => return Err(format!(
                        "<kernel>:{line}:{col}: error: expected '{}' to match '{o}' at {l}:{k}\n1 error generated.",
                        closing(o)
                    )),
                    None => return Err(format!("<kernel>:{line}:{col}: error: extraneous closing '{c}'\n1 error generated."))
                }
            },
            _ => {}
        }

        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    match stack.pop() {
        Some((o, l, k)) => Err(format!("<kernel>:{l}:{k}: error: unterminated '{o}', expected '{}'\n1 error generated.", closing(o))),
        None => Ok(())
    }
}

#[inline]
fn closing (open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}'
    }
}

/// Blanks out comments and literals, keeping line breaks so positions stay valid.
fn strip_comments (source: &str) -> String {
    let mut result = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('/', Some('/')) => {
                while let Some(&n) = chars.peek() {
                    if n == '\n' {
                        break
                    }
                    chars.next();
                    result.push(' ');
                }
                result.push(' ');
            },

            ('/', Some('*')) => {
                chars.next();
                result.push_str("  ");
                let mut prev = '\0';
                while let Some(n) = chars.next() {
                    result.push(if n == '\n' { '\n' } else { ' ' });
                    if prev == '*' && n == '/' {
                        break
                    }
                    prev = n;
                }
            },

            ('"' | '\'', _) => {
                result.push(' ');
                let mut escaped = false;
                while let Some(n) = chars.next() {
                    result.push(if n == '\n' { '\n' } else { ' ' });
                    if !escaped && n == c {
                        break
                    }
                    escaped = !escaped && n == '\\';
                }
            },

            _ => result.push(c)
        }
    }

    result
}
