//! Message construction for the two call forms.
//!
//! Template calls use printf-style verbs (`%s`, `%v`, `%d`, `%f`, `%q`, `%x`,
//! `%%`) with optional flags, width and precision. Every argument only has to
//! implement `Display`; verbs that need a number parse the rendered text and
//! fall back to plain text when that fails. Formatting never errors: problems
//! are reported inline (`%!s(MISSING)`, `%!(EXTRA ..)`), and an argument
//! whose `Display` impl fails renders as `%!v(BADDISPLAY)`.

use std::fmt::{self, Display, Write};

/// Renders `arg`, or `None` when its `Display` impl returns an error.
pub(crate) fn display_string(arg: &dyn Display) -> Option<String> {
    let mut s = String::new();
    write!(s, "{arg}").ok().map(|()| s)
}

/// `fmt::Arguments::to_string` without the panic on a failing `Display`.
pub(crate) fn format_string(args: fmt::Arguments<'_>) -> String {
    let mut s = String::new();
    if s.write_fmt(args).is_err() {
        s.push_str("%!v(BADDISPLAY)");
    }
    s
}

fn push_display(out: &mut String, verb: char, arg: &dyn Display) {
    match display_string(arg) {
        Some(s) => out.push_str(&s),
        None => {
            let _ = write!(out, "%!{verb}(BADDISPLAY)");
        }
    }
}

/// Joins the `Display` renderings of `args` with no separator.
#[must_use]
pub fn concat(args: &[&dyn Display]) -> String {
    let mut out = String::new();
    for arg in args {
        push_display(&mut out, 'v', *arg);
    }
    out
}

#[derive(Default)]
struct Directive {
    left: bool,
    zero: bool,
    plus: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

/// Substitutes `args` into `template`.
#[must_use]
pub fn sprintf(template: &str, args: &[&dyn Display]) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut next = 0usize;
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut dir = Directive::default();
        while let Some(&f) = chars.peek() {
            match f {
                '-' => dir.left = true,
                '0' => dir.zero = true,
                '+' => dir.plus = true,
                ' ' | '#' => {}
                _ => break,
            }
            chars.next();
        }
        dir.width = read_number(&mut chars);
        if chars.peek() == Some(&'.') {
            chars.next();
            dir.precision = Some(read_number(&mut chars).unwrap_or(0));
        }

        let Some(verb) = chars.next() else {
            out.push_str("%!(NOVERB)");
            break;
        };
        if verb == '%' {
            out.push('%');
            continue;
        }

        let Some(arg) = args.get(next) else {
            let _ = write!(out, "%!{verb}(MISSING)");
            continue;
        };
        next += 1;

        let Some(rendered) = display_string(*arg) else {
            let _ = write!(out, "%!{verb}(BADDISPLAY)");
            continue;
        };
        let body = match render_verb(verb, &rendered, &dir) {
            Some(body) => body,
            None => {
                let _ = write!(out, "%!{verb}({rendered})");
                continue;
            }
        };
        pad_into(&mut out, &body, &dir);
    }

    if next < args.len() {
        out.push_str("%!(EXTRA ");
        for (i, arg) in args[next..].iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            push_display(&mut out, 'v', *arg);
        }
        out.push(')');
    }
    out
}

fn read_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<usize> {
    let mut value: Option<usize> = None;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(d as usize));
        chars.next();
    }
    value
}

/// Returns `None` for verbs this formatter does not know.
fn render_verb(verb: char, rendered: &str, dir: &Directive) -> Option<String> {
    let body = match verb {
        's' | 'v' => match dir.precision {
            Some(p) => rendered.chars().take(p).collect(),
            None => rendered.to_owned(),
        },
        'd' => match rendered.trim().parse::<i128>() {
            Ok(n) if dir.plus && n >= 0 => format!("+{n}"),
            Ok(n) => n.to_string(),
            Err(_) => rendered.to_owned(),
        },
        'f' | 'F' | 'e' | 'g' => match rendered.trim().parse::<f64>() {
            Ok(x) => {
                let p = dir.precision.unwrap_or(6);
                let s = match verb {
                    'e' => format!("{x:.p$e}"),
                    'g' => x.to_string(),
                    _ => format!("{x:.p$}"),
                };
                if dir.plus && x >= 0.0 { format!("+{s}") } else { s }
            }
            Err(_) => rendered.to_owned(),
        },
        'q' => format!("{rendered:?}"),
        'x' | 'X' => {
            let hex = match rendered.trim().parse::<i128>() {
                Ok(n) if n < 0 => format!("-{:x}", n.unsigned_abs()),
                Ok(n) => format!("{n:x}"),
                Err(_) => rendered.bytes().map(|b| format!("{b:02x}")).collect(),
            };
            if verb == 'X' { hex.to_uppercase() } else { hex }
        }
        't' => rendered.to_owned(),
        _ => return None,
    };
    Some(body)
}

fn pad_into(out: &mut String, body: &str, dir: &Directive) {
    let len = body.chars().count();
    let fill = dir.width.unwrap_or(0).saturating_sub(len);
    if fill == 0 {
        out.push_str(body);
    } else if dir.left {
        out.push_str(body);
        out.extend(std::iter::repeat_n(' ', fill));
    } else if dir.zero {
        // Zero padding goes after the sign.
        let (sign, digits) = match body.strip_prefix(['-', '+']) {
            Some(rest) => (&body[..1], rest),
            None => ("", body),
        };
        out.push_str(sign);
        out.extend(std::iter::repeat_n('0', fill));
        out.push_str(digits);
    } else {
        out.extend(std::iter::repeat_n(' ', fill));
        out.push_str(body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl Display for Broken {
        fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    #[test]
    fn substitutes_positional_arguments() {
        assert_eq!(
            sprintf("user %s logged in", &[&"alice"]),
            "user alice logged in"
        );
        assert_eq!(sprintf("%s has %d items", &[&"cart", &3]), "cart has 3 items");
        assert_eq!(sprintf("100%%", &[]), "100%");
    }

    #[test]
    fn concat_injects_no_separator() {
        assert_eq!(
            concat(&[&"user ", &"alice", &" logged in"]),
            "user alice logged in"
        );
        assert_eq!(concat(&[&1, &2, &"x"]), "12x");
        assert_eq!(concat(&[]), "");
    }

    #[test]
    fn width_precision_and_flags() {
        assert_eq!(sprintf("[%5s]", &[&"ab"]), "[   ab]");
        assert_eq!(sprintf("[%-5s]", &[&"ab"]), "[ab   ]");
        assert_eq!(sprintf("%05d", &[&-42]), "-0042");
        assert_eq!(sprintf("%+d", &[&7]), "+7");
        assert_eq!(sprintf("%.2f", &[&3.14159]), "3.14");
        assert_eq!(sprintf("%.3s", &[&"abcdef"]), "abc");
        assert_eq!(sprintf("%x|%X", &[&255, &255]), "ff|FF");
        assert_eq!(sprintf("%x", &[&"hi"]), "6869");
        assert_eq!(sprintf("%q", &[&"a\"b"]), "\"a\\\"b\"");
    }

    #[test]
    fn argument_mismatches_are_reported_inline() {
        assert_eq!(sprintf("%s and %s", &[&"one"]), "one and %!s(MISSING)");
        assert_eq!(sprintf("only %s", &[&"a", &"b", &1]), "only a%!(EXTRA b, 1)");
        assert_eq!(sprintf("trailing %", &[]), "trailing %!(NOVERB)");
        assert_eq!(sprintf("%z", &[&5]), "%!z(5)");
    }

    #[test]
    fn numeric_verbs_fall_back_to_text() {
        assert_eq!(sprintf("%d", &[&"n/a"]), "n/a");
        assert_eq!(sprintf("%.1f", &[&"n/a"]), "n/a");
    }

    #[test]
    fn failing_display_renders_a_marker() {
        assert_eq!(sprintf("value %s", &[&Broken]), "value %!s(BADDISPLAY)");
        assert_eq!(sprintf("%d|%s", &[&Broken, &"ok"]), "%!d(BADDISPLAY)|ok");
        assert_eq!(sprintf("x", &[&Broken]), "x%!(EXTRA %!v(BADDISPLAY))");
        assert_eq!(concat(&[&"value ", &Broken, &"!"]), "value %!v(BADDISPLAY)!");
        assert_eq!(format_string(format_args!("a{}", Broken)), "a%!v(BADDISPLAY)");
    }
}
