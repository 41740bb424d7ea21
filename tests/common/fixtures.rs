//! Generated markup documents.

/// Nested unordered list, `depth` levels deep, one item per level.
pub fn nested_unordered(depth: usize) -> String {
    let mut out = String::new();
    for level in 1..=depth {
        out.push_str(&format!("<ul><li>d{level}"));
    }
    for _ in 0..depth {
        out.push_str("</li></ul>");
    }
    out
}

/// A document mixing every supported tag, repeated `sections` times.
pub fn mixed_document(sections: usize) -> String {
    let mut out = String::with_capacity(sections * 420);
    for i in 0..sections {
        out.push_str(&format!(
            "<div><b>Section {i}</b> with <i>italic</i>, <u>underline</u> and \
             <font color=\"#3366cc\" size=\"4\">colour</font>.</div>\
             <ol><li>first</li><li>second<ul><li>nested</li></ul></li></ol>\
             <p><code>let x = {i};</code> <s>old</s> <strike>older</strike></p>\
             <center>centred</center>\
             <a href=\"https://example.com/{i}\">link {i}</a>\
             <img src=\"https://example.com/{i}.png\" width=\"120\" height=\"80\">\
             <table><tr><th>h</th><td>c</td></tr></table>"
        ));
    }
    out
}
