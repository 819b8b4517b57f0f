//! Demo scene: a texture-mapped avatar on an infinite ground under a sky
//! cube, chased by the camera.
//!
//! Pass an asset directory as the first argument (defaults to `assets`).
//! Expected files: avatar.obj/.png, tree.obj/.png, ground.png and the six
//! cube faces posx/negx/posy/negy/posz/negz.jpg. Missing files degrade to
//! empty geometry or untextured surfaces.
//!
//! Controls: W/S drive the avatar forward/back, A/D turn it. Tab switches
//! between the chase camera and free look (I/K to drive, J/L to swing);
//! Escape quits.

use anyhow::Result;

use gorse::{App, SceneConfig, WindowConfig};

fn main() -> Result<()> {
    env_logger::init();

    let asset_dir = std::env::args().nth(1).unwrap_or_else(|| "assets".to_string());
    let scene = SceneConfig::from_asset_dir(&asset_dir);

    let window = WindowConfig {
        title: "gorse - meadow".to_string(),
        ..WindowConfig::default()
    };

    App::new(window, scene).run();
    Ok(())
}
