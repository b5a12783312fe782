use scraper::{ElementRef, Html, Node};

const SKIPPED: [&str; 5] = ["script", "style", "noscript", "template", "head"];
const BLOCKS: [&str; 16] = [
    "p", "div", "br", "tr", "li", "ul", "ol", "table", "section", "article", "header",
    "footer", "h1", "h2", "h3", "h4",
];
const CELLS: [&str; 2] = ["td", "th"];

/// Approximates `document.body.innerText`: block elements end lines, table
/// cells are tab separated, scripts and styles are dropped.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::new();
    walk(document.root_element(), &mut out);

    out.lines()
        .map(|line| {
            line.split('\t')
                .map(|cell| cell.split_whitespace().collect::<Vec<_>>().join(" "))
                .filter(|cell| !cell.is_empty())
                .collect::<Vec<_>>()
                .join("\t")
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn walk(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if SKIPPED.contains(&name) {
        return;
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(&text.replace(['\n', '\r', '\t'], " "));
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    walk(child_element, out);
                }
            }
            _ => {}
        }
    }

    if CELLS.contains(&name) {
        out.push('\t');
    } else if BLOCKS.contains(&name) {
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_text_drops_scripts_and_keeps_rows() {
        let html = r#"<html><head><title>t</title><script>var x = 1;</script></head>
            <body><h1>Certificate   verification</h1>
            <table><tr><td>Full name</td><td>Jane Doe</td></tr>
            <tr><td>Certificate</td><td>CS101: Intro</td></tr></table>
            <style>.a{}</style><p>We verify that <b>Jane Doe</b> has completed</p></body></html>"#;

        let text = visible_text(html);

        assert!(!text.contains("var x"));
        assert!(!text.contains(".a{}"));
        assert!(text.contains("Certificate verification"));
        assert!(text.contains("Full name\tJane Doe"));
        assert!(text.contains("Certificate\tCS101: Intro"));
        assert!(text.contains("We verify that Jane Doe has completed"));
    }
}
