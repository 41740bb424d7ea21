//! Convert a markup file with `htmltext` and print the styled result as JSON.
//!
//! Usage:
//!   cargo run -p htmltext-dump -- [--density F] [--text-size PX] [--pretty] [FILE|-]
//!
//! Reads stdin when FILE is omitted or `-`. Images are not fetched; every
//! `<img>` shows up as an `image` span over U+FFFC with its size hint.
//! Set `RUST_LOG=debug` to see conversion diagnostics on stderr.

use std::env;
use std::io::{self, Read};
use std::process::ExitCode;

use htmltext::{
    predict_image_sizes, DisplayMetrics, DocumentGeneration, HtmlText, Span, SpanEntry, SpanFlags,
    SpannedText, TextWidget, UiTask,
};
use serde::Serialize;

#[derive(Clone, Debug)]
struct Args {
    input: Option<String>,
    density: f32,
    text_size_px: f32,
    pretty: bool,
}

#[derive(Debug, Serialize)]
struct Dump {
    text: String,
    spans: Vec<DumpSpan>,
    image_hints: Vec<DumpHint>,
}

#[derive(Debug, Serialize)]
struct DumpSpan {
    kind: &'static str,
    start: usize,
    end: usize,
    flags: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct DumpHint {
    width: Option<u32>,
    height: Option<u32>,
}

/// Widget that never renders; the dump only needs metrics and a generation.
struct HeadlessWidget {
    metrics: DisplayMetrics,
    generation: DocumentGeneration,
}

impl TextWidget for HeadlessWidget {
    fn set_text(&self, _text: SpannedText) {}

    fn request_render(&self) {}

    fn display_metrics(&self) -> DisplayMetrics {
        self.metrics
    }

    fn is_ui_thread(&self) -> bool {
        true
    }

    fn post(&self, task: UiTask) {
        task();
    }

    fn generation(&self) -> &DocumentGeneration {
        &self.generation
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    match run(env::args().collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {}", msg);
            eprintln!("{}", help_text());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    let cli = parse_args(args)?;
    let markup = read_input(cli.input.as_deref())?;

    let widget = std::sync::Arc::new(HeadlessWidget {
        metrics: DisplayMetrics {
            density: cli.density,
            text_size_px: cli.text_size_px,
        },
        generation: DocumentGeneration::new(),
    });
    let text = HtmlText::new(markup.as_str())
        .convert(&widget)
        .map_err(|e| e.to_string())?;
    log::debug!(
        "dump: {} chars, {} spans",
        text.as_str().chars().count(),
        text.spans().count()
    );

    let dump = Dump {
        text: text.as_str().to_string(),
        spans: text.spans().map(dump_span).collect(),
        image_hints: predict_image_sizes(&markup)
            .into_iter()
            .map(|hint| DumpHint {
                width: hint.width,
                height: hint.height,
            })
            .collect(),
    };
    let json = if cli.pretty {
        serde_json::to_string_pretty(&dump)
    } else {
        serde_json::to_string(&dump)
    }
    .map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

fn read_input(path: Option<&str>) -> Result<String, String> {
    match path {
        None | Some("-") => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("failed to read stdin: {}", e))?;
            Ok(buf)
        }
        Some(path) => {
            std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path, e))
        }
    }
}

fn flags_name(flags: SpanFlags) -> &'static str {
    match flags {
        SpanFlags::ExclusiveExclusive => "exclusive_exclusive",
        SpanFlags::ExclusiveInclusive => "exclusive_inclusive",
        SpanFlags::InclusiveExclusive => "inclusive_exclusive",
        SpanFlags::InclusiveInclusive => "inclusive_inclusive",
    }
}

fn dump_span(entry: &SpanEntry) -> DumpSpan {
    let detail = match &entry.span {
        Span::Style(style) => Some(serde_json::json!(format!("{:?}", style).to_lowercase())),
        Span::Alignment(alignment) => {
            Some(serde_json::json!(format!("{:?}", alignment).to_lowercase()))
        }
        Span::ForegroundColor(argb) => Some(serde_json::json!(format!("#{:08X}", argb))),
        Span::AbsoluteSize { size, dip } => Some(serde_json::json!({ "size": size, "dip": dip })),
        Span::LeadingMargin(margin) => Some(serde_json::json!(margin)),
        Span::Bullet(bullet) => Some(serde_json::json!({
            "gap_width": bullet.gap_width,
            "radius": bullet.radius,
        })),
        Span::Number(number) => Some(serde_json::json!(number.label())),
        Span::Url(url) => Some(serde_json::json!(url)),
        Span::Image(image) => Some(serde_json::json!({
            "source": image.source(),
            "position": image.placeholder().position(),
        })),
        Span::ImageClick(click) => Some(serde_json::json!({
            "position": click.position(),
            "urls": &click.urls()[..],
        })),
        Span::LinkClick(click) => Some(serde_json::json!(click.url())),
        Span::Underline | Span::Strikethrough | Span::Monospace => None,
    };
    DumpSpan {
        kind: entry.kind().name(),
        start: entry.start,
        end: entry.end,
        flags: flags_name(entry.flags),
        detail,
    }
}

fn parse_args(args: Vec<String>) -> Result<Args, String> {
    let mut cfg = Args {
        input: None,
        density: 1.0,
        text_size_px: 16.0,
        pretty: false,
    };

    let mut i = 1usize;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => return Err("help requested".to_string()),
            "--density" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--density requires a value".to_string())?;
                cfg.density = v
                    .parse::<f32>()
                    .map_err(|_| format!("invalid --density value: {}", v))?;
                i += 2;
            }
            "--text-size" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--text-size requires a value".to_string())?;
                cfg.text_size_px = v
                    .parse::<f32>()
                    .map_err(|_| format!("invalid --text-size value: {}", v))?;
                i += 2;
            }
            "--pretty" => {
                cfg.pretty = true;
                i += 1;
            }
            other if other.starts_with("--") => {
                return Err(format!("unknown flag: {}", other));
            }
            other => {
                if cfg.input.is_some() {
                    return Err(format!("unexpected extra argument: {}", other));
                }
                cfg.input = Some(other.to_string());
                i += 1;
            }
        }
    }
    Ok(cfg)
}

fn help_text() -> &'static str {
    "usage: htmltext-dump [--density F] [--text-size PX] [--pretty] [FILE|-]"
}
