// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_deck(slides: usize) -> String {
    let mut content = String::from("---\ntitle: Benchmark deck\nformat: revealjs\n---\n\n");

    for slide in 0..slides {
        content.push_str(&format!("## Slide {}\n\nSpeaker notes and prose.\n\n", slide));
        content.push_str(&format!(
            "![](img{slide}.png){{.absolute .card top={}% left={:.1}% width=20%}}\n\n",
            slide % 90,
            slide as f64 * 0.4
        ));
        content.push_str(&format!(
            "![](badge{slide}.png){{.absolute bottom={}% right=5%}}\n\n",
            slide % 50
        ));
    }

    content
}

/// Anchors of the image on the last slide of [`generate_deck`]
#[allow(dead_code)]
pub fn last_slide_anchors(slides: usize) -> (String, String) {
    let slide = slides - 1;
    ((slide % 90).to_string(), format!("{:.1}", slide as f64 * 0.4))
}
