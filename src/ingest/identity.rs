/// Derives the posting identifier from a reference URL
///
/// The identifier is whatever follows the last `-`. No validation is done: a URL without
/// a `-` yields the whole URL, and a trailing `-` yields an empty identifier. Treat the
/// result as an opaque string.
///
/// ```
/// use job_harvest::derive_id;
///
/// assert_eq!(derive_id("https://jobs.example.com/offer/driver-tema-1002"), "1002");
/// ```
pub fn derive_id(reference_url: &str) -> &str {
    reference_url.rsplit('-').next().unwrap_or(reference_url)
}
