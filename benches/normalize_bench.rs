use criterion::{black_box, criterion_group, criterion_main, Criterion};
use snippetshot::capture::CaptureRequest;
use snippetshot::markup::Fragment;
use snippetshot::settings::Background;
use snippetshot::{ClipboardPayload, PasteNormalizer};

// A 200-line selection in the editor's copy format, indented by 8 spaces
fn editor_payload() -> ClipboardPayload {
    let mut html = String::from(
        "<meta charset=\"utf-8\"><div style=\"color: #d4d4d4;background-color: #1e1e1e;white-space: pre;\">",
    );
    let mut text = String::new();
    for i in 0..200 {
        let indent = " ".repeat(8 + (i % 3) * 4);
        html.push_str(&format!(
            "<div><span style=\"color: #569cd6;\">{}let</span><span> value_{} = compute({});</span></div>",
            indent, i, i
        ));
        text.push_str(&format!("{}let value_{} = compute({});\n", indent, i, i));
    }
    html.push_str("</div>");
    ClipboardPayload::new(Some(html), Some(text))
}

fn bench_normalize(c: &mut Criterion) {
    let normalizer = PasteNormalizer::default();
    let payload = editor_payload();
    c.bench_function("normalize_editor_copy", |b| {
        b.iter(|| normalizer.normalize(black_box(&payload)).unwrap())
    });

    let plain = ClipboardPayload::new(None, payload.text.clone());
    c.bench_function("normalize_plain_text", |b| {
        b.iter(|| normalizer.normalize(black_box(&plain)).unwrap())
    });
}

fn bench_render(c: &mut Criterion) {
    let content = PasteNormalizer::default()
        .normalize(&editor_payload())
        .unwrap()
        .unwrap()
        .content;
    let region = Fragment::parse(&format!(
        "<div id=\"snippet-container\"><div id=\"snippet\">{}</div></div>",
        content
    ))
    .unwrap();
    let request = CaptureRequest::new(region, Background::Solid("#2e3440".into()), 1);
    c.bench_function("render_block_raster", |b| {
        b.iter(|| snippetshot::rendering::render(black_box(&request)).unwrap())
    });
}

criterion_group!(benches, bench_normalize, bench_render);
criterion_main!(benches);
