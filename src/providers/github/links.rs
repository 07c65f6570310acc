use url::Url;

/// Extracts the numeric id at the end of an API reference URL.
///
/// `https://api.github.com/repos/o/r/check-suites/42` yields `Some(42)`.
/// Returns `None` when the last path segment is not a number.
pub fn trailing_id(reference_url: &str) -> Option<u64> {
    let url = Url::parse(reference_url).ok()?;
    let last = url.path_segments()?.filter(|s| !s.is_empty()).next_back()?;
    last.parse().ok()
}

/// Page number of the `rel="next"` entry of a `Link` response header.
pub fn next_page(link_header: &str) -> Option<u32> {
    link_header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|param| param.trim() == r#"rel="next""#);
        if !is_next {
            return None;
        }

        let target = target.strip_prefix('<')?.strip_suffix('>')?;
        let url = Url::parse(target).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_id_check_suite() {
        assert_eq!(
            trailing_id("https://api.github.com/repos/linkerd/linkerd2/check-suites/1234567"),
            Some(1_234_567)
        );
    }

    #[test]
    fn test_trailing_id_ignores_trailing_slash() {
        assert_eq!(
            trailing_id("https://api.github.com/repos/o/r/actions/workflows/99/"),
            Some(99)
        );
    }

    #[test]
    fn test_trailing_id_malformed() {
        assert_eq!(trailing_id("https://api.github.com/repos/o/r/check-suites/abc"), None);
        assert_eq!(trailing_id("not a url"), None);
        assert_eq!(trailing_id(""), None);
    }

    #[test]
    fn test_next_page_present() {
        let header = r#"<https://api.github.com/repositories/1/actions/runs?per_page=100&page=2>; rel="next", <https://api.github.com/repositories/1/actions/runs?per_page=100&page=7>; rel="last""#;
        assert_eq!(next_page(header), Some(2));
    }

    #[test]
    fn test_next_page_absent_on_last_page() {
        let header = r#"<https://api.github.com/repositories/1/actions/runs?page=1>; rel="prev", <https://api.github.com/repositories/1/actions/runs?page=1>; rel="first""#;
        assert_eq!(next_page(header), None);
    }
}
