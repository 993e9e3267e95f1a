//! Renders a small document twice, once uncut and once with a cut line,
//! writing the PNGs into ./demo-out.
//!
//! Run with: cargo run --example export_demo

use mdshot::export::{CancelToken, FsSink};
use mdshot::SessionConfig;

const DOC: &str = "# Demo Document \u{2728}\n\n\
Body text with a list:\n\n\
- one\n- two\n\n\
```\nlet x = 42;\n```\n";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = SessionConfig {
        download_delay_ms: 0,
        theme: "ocean".to_string(),
        ..SessionConfig::default()
    };
    let mut session = mdshot::new_session(config);
    session.set_source(DOC);

    let cancel = CancelToken::new();
    let mut sink = FsSink::new("demo-out");
    let report = session.export(&mut sink, &cancel)?;
    println!("uncut: {:?}", report.files);

    session.toggle_cutting();
    let height = session.render_preview()?.height;
    session.add_cut_line(height / 2)?;
    let report = session.export(&mut sink, &cancel)?;
    println!("cut at {}: {:?}", height / 2, report.files);

    Ok(())
}
