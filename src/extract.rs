// src/extract.rs
// =============================================================================
// This module pulls article links out of a Special:AllPages listing page.
//
// What a listing page looks like (trimmed):
//
//   <div class="mw-allpages-nav"> prev | next </div>        <- top control
//   <div class="mw-allpages-body">
//     <ul class="mw-allpages-chunk">
//       <li><a href="/wiki/Foo">Foo</a></li>
//       <li class="allpagesredirect"><a href="/wiki/Bar">Bar</a></li>
//     </ul>
//   </div>
//   <div class="mw-allpages-nav"> prev | next </div>        <- bottom control
//
// We keep every <li> without a class (redirects carry one), take its first
// link and make it absolute. The "next page" link is the second anchor of
// the bottom navigation control.
//
// We use the `scraper` crate for parsing and CSS selectors, same as the rest
// of the crawler.
// =============================================================================

use scraper::{ElementRef, Html, Selector};

use crate::error::ExtractError;

/// Everything we need from one listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    /// Absolute article URLs, in page order
    pub links: Vec<String>,
    /// Absolute URL of the next listing page, None on the last page
    pub next: Option<String>,
}

// Extracts the article links and the next page reference from a listing page
//
// Parameters:
//   html: the raw page markup
//   host: host of the page (e.g. "hi.wikipedia.org"), for relative links
//
// Returns: ListingPage, or MissingChunks if this isn't an AllPages listing
pub fn extract_listing(html: &str, host: &str) -> Result<ListingPage, ExtractError> {
    let document = Html::parse_document(html);

    // These selectors are constants and known to be valid, so unwrap() is OK
    let chunk_selector = Selector::parse("ul.mw-allpages-chunk").unwrap();
    let item_selector = Selector::parse("li").unwrap();
    let anchor_selector = Selector::parse("a[href]").unwrap();
    let nav_selector = Selector::parse("div.mw-allpages-nav").unwrap();

    let mut chunks = document.select(&chunk_selector).peekable();
    if chunks.peek().is_none() {
        return Err(ExtractError::MissingChunks);
    }

    let links = chunks
        .flat_map(|chunk| chunk.select(&item_selector))
        .filter(|item| !is_redirect(item))
        .filter_map(|item| item.select(&anchor_selector).next())
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(|href| resolve_reference(host, href))
        .collect();

    // The control at the top of the page comes first; we want the bottom one.
    // Inside it the first anchor is "previous page", the second is "next page".
    let next = document
        .select(&nav_selector)
        .nth(1)
        .and_then(|nav| nav.select(&anchor_selector).nth(1))
        .and_then(|anchor| anchor.value().attr("href"))
        .filter(|href| !href.is_empty())
        .map(|href| resolve_reference(host, href));

    Ok(ListingPage { links, next })
}

// MediaWiki tags redirect entries with class="allpagesredirect"; normal
// entries have no class at all (or an empty one)
fn is_redirect(item: &ElementRef) -> bool {
    item.value()
        .attr("class")
        .is_some_and(|class| !class.trim().is_empty())
}

/// Turns a listing page reference into an absolute URL
///
/// `/wiki/Foo` on `hi.wikipedia.org` becomes `https://hi.wikipedia.org/wiki/Foo`.
/// The reference is used as-is (no re-encoding), so percent-escapes from
/// the page survive untouched.
pub fn resolve_reference(host: &str, href: &str) -> String {
    if href.starts_with("https://") || href.starts_with("http://") {
        href.to_string()
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("https://{}", rest)
    } else if href.starts_with('/') {
        format!("https://{}{}", host, href)
    } else {
        format!("https://{}/{}", host, href)
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why .peekable()?
//    - document.select() gives us a lazy iterator
//    - peek() lets us check "is there at least one chunk?" without
//      consuming the first element
//
// 2. What does flat_map do here?
//    - Each chunk yields many <li> items
//    - flat_map turns "iterator of iterators" into one flat iterator, so
//      the items of all chunks come out in page order
//
// 3. Why .nth(1) twice?
//    - nth(1) is the SECOND element (nth is 0-based)
//    - Second navigation control = the one below the list
//    - Second anchor inside it = "Next page"
//
// 4. Why Option for `next`?
//    - The last listing page simply has no "Next page" anchor
//    - That's a normal outcome, not an error, so it's None rather than Err
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ListingFixture;

    const HOST: &str = "hi.wikipedia.org";

    #[test]
    fn test_resolve_root_relative() {
        assert_eq!(
            resolve_reference(HOST, "/wiki/Foo"),
            "https://hi.wikipedia.org/wiki/Foo"
        );
    }

    #[test]
    fn test_resolve_keeps_escapes() {
        assert_eq!(
            resolve_reference(HOST, "/wiki/%E0%A4%85"),
            "https://hi.wikipedia.org/wiki/%E0%A4%85"
        );
    }

    #[test]
    fn test_resolve_absolute_and_protocol_relative() {
        assert_eq!(
            resolve_reference(HOST, "https://bn.wikipedia.org/wiki/X"),
            "https://bn.wikipedia.org/wiki/X"
        );
        assert_eq!(
            resolve_reference(HOST, "//bn.wikipedia.org/wiki/X"),
            "https://bn.wikipedia.org/wiki/X"
        );
    }

    #[test]
    fn test_extracts_links_in_page_order() {
        let html = ListingFixture::new()
            .chunk(&["Alpha", "Beta"])
            .chunk(&["Gamma"])
            .render();

        let page = extract_listing(&html, HOST).unwrap();
        assert_eq!(
            page.links,
            vec![
                "https://hi.wikipedia.org/wiki/Alpha",
                "https://hi.wikipedia.org/wiki/Beta",
                "https://hi.wikipedia.org/wiki/Gamma",
            ]
        );
    }

    #[test]
    fn test_skips_redirects() {
        let html = ListingFixture::new()
            .chunk(&["Alpha", "Beta"])
            .redirects(&["Alias", "Other_alias"])
            .render();

        let page = extract_listing(&html, HOST).unwrap();
        assert_eq!(page.links.len(), 2);
        assert!(page.links.iter().all(|l| !l.contains("lias")));
    }

    #[test]
    fn test_empty_class_is_not_a_redirect() {
        let html = r#"
            <ul class="mw-allpages-chunk">
              <li class=""><a href="/wiki/Kept">Kept</a></li>
              <li class="allpagesredirect"><a href="/wiki/Dropped">Dropped</a></li>
            </ul>"#;

        let page = extract_listing(html, HOST).unwrap();
        assert_eq!(page.links, vec!["https://hi.wikipedia.org/wiki/Kept"]);
    }

    #[test]
    fn test_only_first_anchor_per_item() {
        let html = r#"
            <ul class="mw-allpages-chunk">
              <li><a href="/wiki/First">First</a> <a href="/wiki/Second">Second</a></li>
              <li>no link here</li>
            </ul>"#;

        let page = extract_listing(html, HOST).unwrap();
        assert_eq!(page.links, vec!["https://hi.wikipedia.org/wiki/First"]);
    }

    #[test]
    fn test_next_page_from_bottom_control() {
        let html = ListingFixture::new()
            .chunk(&["Alpha"])
            .next("/w/index.php?title=Special:AllPages&from=Beta")
            .render();

        let page = extract_listing(&html, HOST).unwrap();
        assert_eq!(
            page.next.as_deref(),
            Some("https://hi.wikipedia.org/w/index.php?title=Special:AllPages&from=Beta")
        );
    }

    #[test]
    fn test_no_next_on_last_page() {
        // Last page: navigation only has the "previous page" anchor
        let html = ListingFixture::new().chunk(&["Omega"]).render();

        let page = extract_listing(&html, HOST).unwrap();
        assert_eq!(page.next, None);
    }

    #[test]
    fn test_no_next_without_navigation() {
        let html = r#"<ul class="mw-allpages-chunk"><li><a href="/wiki/A">A</a></li></ul>"#;
        let page = extract_listing(html, HOST).unwrap();
        assert_eq!(page.next, None);
    }

    #[test]
    fn test_single_navigation_control_is_not_enough() {
        // Only the top control is present, so there is no "second" control
        let html = r#"
            <div class="mw-allpages-nav"><a href="/prev">prev</a> | <a href="/next">next</a></div>
            <ul class="mw-allpages-chunk"><li><a href="/wiki/A">A</a></li></ul>"#;

        let page = extract_listing(html, HOST).unwrap();
        assert_eq!(page.next, None);
    }

    #[test]
    fn test_missing_chunks_is_an_error() {
        let html = "<html><body><p>Not an index</p></body></html>";
        assert!(matches!(
            extract_listing(html, HOST),
            Err(ExtractError::MissingChunks)
        ));
    }

    #[test]
    fn test_chunk_of_only_redirects_is_empty() {
        let html = ListingFixture::new().redirects(&["A", "B"]).render();
        let page = extract_listing(&html, HOST).unwrap();
        assert!(page.links.is_empty());
    }
}
