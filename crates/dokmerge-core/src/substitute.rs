//! Single-pass placeholder substitution over plain text

use crate::error::Result;
use crate::pattern::PlaceholderPattern;
use crate::resolve::ValueResolver;

/// Replace every known placeholder in `text`
///
/// Returns `Ok(None)` when nothing matched. Matches are replaced left to
/// right in one pass; replacement text is never scanned again, so a value
/// that itself reads `{{other}}` stays literal. If the resolver fails, no
/// text is returned.
pub fn substitute<R>(text: &str, pattern: &PlaceholderPattern, resolver: &R) -> Result<Option<String>>
where
    R: ValueResolver + ?Sized,
{
    Ok(substitute_counted(text, pattern, resolver)?.map(|(text, _)| text))
}

/// Like [`substitute`], also reporting how many placeholders were replaced
pub(crate) fn substitute_counted<R>(
    text: &str,
    pattern: &PlaceholderPattern,
    resolver: &R,
) -> Result<Option<(String, usize)>>
where
    R: ValueResolver + ?Sized,
{
    let Some(matches) = pattern.captures_iter(text) else {
        return Ok(None);
    };

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut count = 0;

    for caps in matches {
        let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&text[last..whole.start()]);
        out.push_str(&resolver.resolve(key.as_str(), whole.as_str())?);
        last = whole.end();
        count += 1;
    }

    if count == 0 {
        return Ok(None);
    }
    out.push_str(&text[last..]);
    Ok(Some((out, count)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MergeError;
    use crate::resolve::RowResolver;
    use dokmerge_data::{Row, Value};
    use std::borrow::Cow;

    fn run(text: &str, row: &Row) -> Option<String> {
        let pattern = PlaceholderPattern::new(row.keys()).unwrap();
        substitute(text, &pattern, &RowResolver::new(row)).unwrap()
    }

    #[test]
    fn test_no_match_is_none() {
        let row: Row = [("name", "Ada")].into_iter().collect();
        assert_eq!(run("Hello world", &row), None);
        assert_eq!(run("Hello {{nobody}}", &row), None);
    }

    #[test]
    fn test_replaces_all_matches_in_order() {
        let row: Row = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(
            run("{{a}}+{{b}}={{c}}, {{a}}", &row).as_deref(),
            Some("1+2={{c}}, 1")
        );
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let row: Row = [("a", "{{b}}"), ("b", "x")].into_iter().collect();
        let once = run("{{a}}", &row).unwrap();
        assert_eq!(once, "{{b}}");
    }

    #[test]
    fn test_null_and_number() {
        let row: Row = [("name", Value::Null), ("n", Value::Number(42.0))]
            .into_iter()
            .collect();
        assert_eq!(run("Hello {{name}}!", &row).as_deref(), Some("Hello !"));
        assert_eq!(run("Count: {{n}}", &row).as_deref(), Some("Count: 42"));
    }

    #[test]
    fn test_empty_pattern_never_substitutes() {
        let pattern = PlaceholderPattern::new(Vec::<&str>::new()).unwrap();
        let row = Row::new();
        let result = substitute("{{x}}", &pattern, &RowResolver::new(&row)).unwrap();
        assert_eq!(result, None);
    }

    struct Failing;

    impl ValueResolver for Failing {
        fn resolve<'a>(&'a self, key: &str, _token: &'a str) -> Result<Cow<'a, str>> {
            Err(MergeError::InvalidValue {
                key: key.to_string(),
                code: 0,
            })
        }
    }

    #[test]
    fn test_resolver_failure_returns_no_text() {
        let pattern = PlaceholderPattern::new(["k"]).unwrap();
        let result = substitute("before {{k}} after", &pattern, &Failing);
        assert!(matches!(result, Err(MergeError::InvalidValue { .. })));
    }

    #[test]
    fn test_count() {
        let row: Row = [("k", "v")].into_iter().collect();
        let pattern = PlaceholderPattern::new(row.keys()).unwrap();
        let (text, count) = substitute_counted("{{k}}{{k}}{{k}}", &pattern, &RowResolver::new(&row))
            .unwrap()
            .unwrap();
        assert_eq!(text, "vvv");
        assert_eq!(count, 3);
    }
}
