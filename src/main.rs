mod app;
mod conversation;
mod graph;
mod mindmap;
mod physics;
mod session;
mod structure;
mod util;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use log::info;

use graph::LayoutMode;
use structure::{CHAT_MAX_TOKENS, Collaborator, HttpCollaborator, HttpSettings};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LayoutArg {
    Organic,
    Organized,
}

impl From<LayoutArg> for LayoutMode {
    fn from(value: LayoutArg) -> Self {
        match value {
            LayoutArg::Organic => Self::Organic,
            LayoutArg::Organized => Self::Organized,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// OpenAI-compatible chat completions endpoint.
    #[arg(
        long,
        env = "DECISION_CANVAS_ENDPOINT",
        default_value = "https://api.openai.com/v1/chat/completions"
    )]
    endpoint: String,

    #[arg(long, env = "DECISION_CANVAS_MODEL", default_value = "gpt-4o-mini")]
    model: String,

    /// Name of the environment variable holding the API key.
    #[arg(long, default_value = "OPENAI_API_KEY")]
    api_key_env: String,

    /// Token budget for chat replies.
    #[arg(long, env = "DECISION_CANVAS_MAX_TOKENS", default_value_t = CHAT_MAX_TOKENS)]
    max_tokens: u32,

    #[arg(long, env = "DECISION_CANVAS_TIMEOUT_SECS", default_value_t = 90)]
    timeout_secs: u64,

    #[arg(long, value_enum, default_value_t = LayoutArg::Organic)]
    layout: LayoutArg,

    /// Only use the instant heuristic mind map.
    #[arg(long)]
    no_background: bool,
}

fn build_collaborator(args: &Args) -> anyhow::Result<Arc<dyn Collaborator>> {
    let api_key = std::env::var(&args.api_key_env).ok();
    if api_key.is_none() {
        info!("{} is not set; requests are sent without a key", args.api_key_env);
    }

    let collaborator = HttpCollaborator::new(HttpSettings {
        endpoint: args.endpoint.clone(),
        model: args.model.clone(),
        api_key,
        timeout: Duration::from_secs(args.timeout_secs),
    })
    .with_context(|| format!("failed to set up the collaborator for {}", args.endpoint))?;
    Ok(Arc::new(collaborator))
}

fn main() -> eframe::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let collaborator = build_collaborator(&args).map_err(|error| format!("{error:#}"));
    let config = app::Config {
        layout: args.layout.into(),
        background_mind_map: !args.no_background,
        chat_max_tokens: args.max_tokens,
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "decision-canvas",
        options,
        Box::new(move |cc| Ok(Box::new(app::DecisionApp::new(cc, config, collaborator)))),
    )
}
