use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector is valid"));

/// Elements whose text never counts as page content.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Links and visible text pulled out of an HTML document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedHtml {
    pub links: Vec<String>,
    pub text: String,
}

pub fn parse_html(body: &str) -> ParsedHtml {
    let document = Html::parse_document(body);
    ParsedHtml {
        links: extract_links(&document),
        text: extract_text(&document),
    }
}

/// Raw `href` values of every anchor, in document order.
pub fn extract_links(document: &Html) -> Vec<String> {
    document
        .select(&LINK_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .collect()
}

/// Visible text with runs of whitespace collapsed to single spaces.
pub fn extract_text(document: &Html) -> String {
    let mut words: Vec<&str> = Vec::new();

    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ElementRef::wrap(ancestor)
                .map(|el| SKIPPED_ELEMENTS.contains(&el.value().name()))
                .unwrap_or(false)
        });
        if hidden {
            continue;
        }

        words.extend(text.split_whitespace());
    }

    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_in_document_order() {
        let parsed = parse_html(
            r##"<html><body>
                <a href="/b">B</a>
                <p><a href="https://www.ics.uci.edu/a#x">A</a></p>
                <a>no href</a>
                <a href="  ">blank</a>
                <a href="mailto:x@uci.edu">mail</a>
            </body></html>"##,
        );
        assert_eq!(
            parsed.links,
            vec!["/b", "https://www.ics.uci.edu/a#x", "mailto:x@uci.edu"]
        );
    }

    #[test]
    fn test_text_skips_scripts_and_styles() {
        let parsed = parse_html(
            "<html><head><title>Home</title><style>p { color: red }</style></head>\
             <body><p>Hello   <b>world</b></p><script>var x = 1;</script>\
             <noscript>enable js</noscript><div>\n bye\n</div></body></html>",
        );
        assert_eq!(parsed.text, "Home Hello world bye");
    }

    #[test]
    fn test_empty_document() {
        let parsed = parse_html("");
        assert!(parsed.links.is_empty());
        assert!(parsed.text.is_empty());
    }
}
