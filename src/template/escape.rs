/// Characters with meaning inside a Perl `s/…/…/` expression.
const SPECIAL: &str = ".*+?=^!:${}()|[]/\\@";

/// Escape `s` for interpolation into `perl -e 's/<pattern>/<replacement>/gi'`.
///
/// Regex metacharacters, the `/` delimiter and Perl's `$`/`@` sigils are
/// backslash-escaped so the text is taken literally on either side of the
/// expression. Single quotes are closed, escaped and reopened (`'\''`) so the
/// text cannot leave the surrounding single-quoted shell word.
#[must_use]
pub fn escape_substitution(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 2);
    for c in s.chars() {
        if c == '\'' {
            out.push_str(r"'\''");
            continue;
        }
        if SPECIAL.contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
