#![forbid(unsafe_code)]

//! Windows-style command line splitting.
//!
//! Follows the `CommandLineToArgvW` rules for the argument part of a command
//! line (the program name is not included):
//!
//! - Arguments are separated by runs of spaces or tabs.
//! - A double quote toggles quoted mode; whitespace inside quotes is kept.
//! - `2n` backslashes before a quote produce `n` backslashes, and the quote
//!   toggles quoting.
//! - `2n + 1` backslashes before a quote produce `n` backslashes and a
//!   literal quote.
//! - Backslashes not followed by a quote are literal.
//! - Inside quotes, `""` is a literal quote and quoting continues.
//! - `""` on its own is an empty argument.

/// Split `line` into arguments.
#[must_use]
pub fn split_command_line(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut quoted = false;
    let mut backslashes = 0usize;

    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                in_arg = true;
                backslashes += 1;
            }
            '"' => {
                in_arg = true;
                push_backslashes(&mut current, backslashes / 2);
                if backslashes % 2 == 1 {
                    current.push('"');
                } else if quoted && chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    quoted = !quoted;
                }
                backslashes = 0;
            }
            ' ' | '\t' if !quoted => {
                push_backslashes(&mut current, backslashes);
                backslashes = 0;
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            _ => {
                in_arg = true;
                push_backslashes(&mut current, backslashes);
                backslashes = 0;
                current.push(c);
            }
        }
    }
    push_backslashes(&mut current, backslashes);
    if in_arg {
        args.push(current);
    }
    args
}

/// Build a full argument vector: `program` followed by the split `line`.
#[must_use]
pub fn build_argv(program: &str, line: &str) -> Vec<String> {
    let mut argv = Vec::with_capacity(8);
    argv.push(program.to_owned());
    argv.extend(split_command_line(line));
    argv
}

fn push_backslashes(out: &mut String, n: usize) {
    out.extend(std::iter::repeat_n('\\', n));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(line: &str) -> Vec<String> {
        split_command_line(line)
    }

    #[test]
    fn empty_line_has_no_arguments() {
        assert!(split("").is_empty());
        assert!(split("  \t ").is_empty());
    }

    #[test]
    fn whitespace_separates() {
        assert_eq!(split("a  b\tc"), ["a", "b", "c"]);
    }

    #[test]
    fn quotes_keep_whitespace() {
        assert_eq!(split(r#""a b" c"#), ["a b", "c"]);
        assert_eq!(split(r#"x"y z"w"#), ["xy zw"]);
    }

    #[test]
    fn empty_quoted_argument() {
        assert_eq!(split(r#"a "" b"#), ["a", "", "b"]);
    }

    #[test]
    fn doubled_quote_inside_quotes_is_literal() {
        assert_eq!(split(r#""a""b""#), [r#"a"b"#]);
        assert_eq!(split(r#""say ""hi""" x"#), [r#"say "hi""#, "x"]);
    }

    #[test]
    fn even_backslashes_before_quote() {
        assert_eq!(split(r#"a\\"b c""#), [r"a\b c"]);
    }

    #[test]
    fn odd_backslashes_escape_quote() {
        assert_eq!(split(r#"a\"b c"#), [r#"a"b"#, "c"]);
        assert_eq!(split(r#"a\\\"b"#), [r#"a\"b"#]);
    }

    #[test]
    fn lone_backslashes_are_literal() {
        assert_eq!(split(r"C:\dir\file.py x\\"), [r"C:\dir\file.py", r"x\\"]);
    }

    #[test]
    fn build_argv_prepends_program() {
        assert_eq!(build_argv("prog", "-c 1"), ["prog", "-c", "1"]);
    }
}
