//! Paste normalization on editor-shaped payloads

use snippetshot::markup::{Element, Fragment};
use snippetshot::normalize::{LineAdapter, MAX_LINE_CHARS};
use snippetshot::{ClipboardPayload, Error, IndentProfile, PasteNormalizer};

const EDITOR_COPY: &str = r#"<meta charset="utf-8"><div style="color: #d4d4d4;background-color: #1e1e1e;font-family: Menlo, Monaco, 'Courier New', monospace;font-weight: normal;font-size: 12px;line-height: 18px;white-space: pre;"><div><span style="color: #569cd6;">        if</span><span style="color: #d4d4d4;"> ok {</span></div><div><span style="color: #d4d4d4;">            run();</span></div><div><br></div><div><span style="color: #d4d4d4;">        }</span></div></div>"#;

const EDITOR_TEXT: &str = "        if ok {\n            run();\n\n        }";

fn lines(content: &str) -> Vec<String> {
    let frag = Fragment::parse(content).unwrap();
    frag.elements()
        .flat_map(|outer| outer.child_elements())
        .map(Element::text_content)
        .collect()
}

#[test]
fn editor_copy_loses_common_indent_only() {
    let out = PasteNormalizer::default()
        .normalize(&ClipboardPayload::new(
            Some(EDITOR_COPY.into()),
            Some(EDITOR_TEXT.into()),
        ))
        .unwrap()
        .unwrap();

    assert_eq!(out.indent, IndentProfile(8));
    assert_eq!(out.background.as_deref(), Some("#1e1e1e"));
    assert_eq!(lines(&out.content), vec!["if ok {", "    run();", "", "}"]);
    assert!(!out.content.contains("<meta"));
    assert!(out.content.contains("<span style=\"color: #569cd6;\">if</span>"));
}

#[test]
fn indent_larger_than_first_unit_empties_it() {
    // plain text claims more indent than the first span carries
    let out = PasteNormalizer::default()
        .normalize(&ClipboardPayload::new(
            Some("<div><div><span> </span><span>  x</span></div></div>".into()),
            Some("   x".into()),
        ))
        .unwrap()
        .unwrap();
    assert_eq!(out.content, "<div><div><span></span><span>  x</span></div></div>");
}

#[test]
fn plain_text_only_is_synthesized() {
    let out = PasteNormalizer::default()
        .normalize(&ClipboardPayload::new(None, Some("  a\n\n    <b>".into())))
        .unwrap()
        .unwrap();
    assert_eq!(lines(&out.content), vec!["a", "", "  <b>"]);
    assert!(out.content.contains("&lt;b&gt;"));
}

#[test]
fn long_plain_lines_are_cut() {
    let long = "y".repeat(MAX_LINE_CHARS + 5);
    let out = PasteNormalizer::default()
        .normalize(&ClipboardPayload::new(None, Some(long)))
        .unwrap()
        .unwrap();
    let line = &lines(&out.content)[0];
    assert_eq!(line.chars().count(), MAX_LINE_CHARS + 1);
    assert!(line.ends_with('…'));

    let short = PasteNormalizer::default()
        .with_max_line_chars(3)
        .normalize(&ClipboardPayload::new(None, Some("abcd".into())))
        .unwrap()
        .unwrap();
    assert_eq!(lines(&short.content), vec!["abc…"]);
}

#[test]
fn nothing_usable_changes_nothing() {
    let normalizer = PasteNormalizer::default();
    assert!(normalizer.normalize(&ClipboardPayload::default()).unwrap().is_none());
    assert!(matches!(
        normalizer.normalize(&ClipboardPayload::new(Some("<unterminated".into()), None)),
        Err(Error::InvalidPaste(_))
    ));
}

/// Lines are `<p>` elements directly at the top level
struct ParagraphLines;

impl LineAdapter for ParagraphLines {
    fn lines_mut<'a>(&self, fragment: &'a mut Fragment) -> Vec<&'a mut Element> {
        fragment.elements_mut().filter(|el| el.name == "p").collect()
    }

    fn synthesize(&self, lines: &[String]) -> Fragment {
        let html: String = lines.iter().map(|l| format!("<p>{}</p>", l)).collect();
        Fragment::parse(&html).unwrap_or_default()
    }
}

#[test]
fn other_copy_formats_plug_in_through_an_adapter() {
    let out = PasteNormalizer::new(Box::new(ParagraphLines))
        .normalize(&ClipboardPayload::new(
            Some("<p>    a</p><p>      b</p>".into()),
            Some("    a\n      b".into()),
        ))
        .unwrap()
        .unwrap();
    assert_eq!(out.content, "<p>a</p><p>  b</p>");
}
