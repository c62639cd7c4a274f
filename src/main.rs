//! softpipe demo driver
//!
//! Renders a scene file (or the built-in vertex-color plane) and writes the
//! frame as a PNG.
//!
//! Usage: `softpipe [SCENE.ron] [OUTPUT.png]`

use anyhow::Context;
use log::info;
use softpipe::scene::{load_scene, SceneConfig};

const DEFAULT_OUTPUT: &str = "softpipe.png";

fn main() -> anyhow::Result<()> {
    // Default filter is "info" if RUST_LOG is not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("softpipe v{}", softpipe::VERSION);

    let mut args = std::env::args().skip(1);
    let scene = match args.next() {
        Some(path) => {
            info!("Loading scene {}", path);
            load_scene(&path).with_context(|| format!("Failed to load scene '{}'", path))?
        }
        None => {
            info!("No scene given, rendering the built-in vertex-color plane");
            SceneConfig::default()
        }
    };
    let output = args.next().unwrap_or_else(|| DEFAULT_OUTPUT.to_string());

    let mut ctx = scene.build_context().context("Failed to set up render context")?;
    let written = ctx
        .render_frame(&scene.mesh())
        .context("Failed to render frame")?;
    info!(
        "Rendered {}x{} frame, {} pixels written",
        ctx.width(),
        ctx.height(),
        written
    );

    print!("{}", ctx.ascii_preview());

    let image = image::RgbImage::from_raw(ctx.width() as u32, ctx.height() as u32, ctx.rgb_bytes())
        .context("Frame buffer size does not match its dimensions")?;
    image
        .save(&output)
        .with_context(|| format!("Failed to write '{}'", output))?;
    info!("Wrote {}", output);

    Ok(())
}
