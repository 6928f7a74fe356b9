//! # Memeforge
//!
//! Headless front end for the memeforge editor.

use clap::Parser;
use memeforge_editor::{render_document, CliArgs, Command, EditorConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "memeforge_editor=info,memeforge_renderer=info,memeforge_core=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();
    let command = args.command.clone();
    let config = EditorConfig::from(args);

    match command {
        Command::Render(render) => {
            tracing::info!(
                "Rendering {} at {}x{}",
                render.document.display(),
                config.width,
                config.height
            );
            let path = render_document(config, &render.document, &render.output).await?;
            tracing::info!("Wrote {}", path.display());
        }
    }

    Ok(())
}
