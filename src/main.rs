//! softrender: offline software rasterizer
//!
//! Turns a textured OBJ model into a single image:
//! - Look-at or orbit camera with perspective projection
//! - Z-buffered, nearest-neighbor textured triangles
//! - Optional translucent bounding box and wireframe overlay
//! - Uncompressed TGA output (PNG, JPEG or BMP via the `image` crate)
//!
//! Usage: `softrender <texture> <mesh> <output> [--scene <scene.ron>] [--save-scene <scene.ron>]`
//!
//! `--save-scene` writes the scene actually used (defaults filled in), which
//! makes a handy starting point for a hand-edited scene file.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod canvas;
mod mesh;
mod rasterizer;
mod scene;

use std::path::PathBuf;
use std::process::ExitCode;

use indicatif::{ProgressBar, ProgressStyle};
use scene::{
    load_config, load_mesh, load_texture, render, save_config, save_output, SceneConfig, SceneError,
};

/// Command line arguments
#[derive(Debug, PartialEq)]
struct Args {
    texture: PathBuf,
    mesh: PathBuf,
    output: PathBuf,
    scene: Option<PathBuf>,
    save_scene: Option<PathBuf>,
}

fn usage() -> String {
    format!(
        "softrender v{}\nusage: softrender <texture> <mesh> <output> [--scene <scene.ron>] [--save-scene <scene.ron>]",
        VERSION
    )
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args, String> {
    let mut positional = Vec::new();
    let mut scene = None;
    let mut save_scene = None;
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--scene" => {
                let path = iter.next().ok_or("--scene needs a path")?;
                scene = Some(PathBuf::from(path));
            }
            "--save-scene" => {
                let path = iter.next().ok_or("--save-scene needs a path")?;
                save_scene = Some(PathBuf::from(path));
            }
            "-h" | "--help" => return Err(usage()),
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    let [texture, mesh, output]: [PathBuf; 3] = positional
        .try_into()
        .map_err(|_| usage())?;
    Ok(Args {
        texture,
        mesh,
        output,
        scene,
        save_scene,
    })
}

fn run(args: &Args) -> Result<(), SceneError> {
    let config = match &args.scene {
        Some(path) => load_config(path)?,
        None => SceneConfig::default(),
    };
    if let Some(path) = &args.save_scene {
        save_config(&config, path)?;
        tracing::info!("Wrote scene {}", path.display());
    }

    // Inputs first: nothing is rasterized unless both load
    let texture = load_texture(&args.texture)?;
    let mesh = load_mesh(&args.mesh)?;

    let progress = ProgressBar::new(mesh.nfaces() as u64);
    if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} faces") {
        progress.set_style(style);
    }

    let image = render(&config, &texture, &mesh, &progress);
    progress.finish_and_clear();

    save_output(&image, &args.output)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::FAILURE;
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_positional() {
        let args = parse_args(strings(&["tex.tga", "head.obj", "out.tga"])).unwrap();
        assert_eq!(args.texture, PathBuf::from("tex.tga"));
        assert_eq!(args.mesh, PathBuf::from("head.obj"));
        assert_eq!(args.output, PathBuf::from("out.tga"));
        assert_eq!(args.scene, None);
        assert_eq!(args.save_scene, None);
    }

    #[test]
    fn test_parse_scene_anywhere() {
        let args = parse_args(strings(&["--scene", "s.ron", "tex.tga", "head.obj", "out.png"])).unwrap();
        assert_eq!(args.scene, Some(PathBuf::from("s.ron")));
        assert_eq!(args.output, PathBuf::from("out.png"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(strings(&["tex.tga", "head.obj"])).is_err());
        assert!(parse_args(strings(&["a", "b", "c", "d"])).is_err());
        assert!(parse_args(strings(&["a", "b", "c", "--scene"])).is_err());
        assert!(parse_args(strings(&["a", "b", "c", "--save-scene"])).is_err());
        assert!(parse_args(strings(&["--help"])).is_err());
    }

    #[test]
    fn test_run_end_to_end() {
        let dir = std::env::temp_dir();
        let tag = std::process::id();
        let texture = dir.join(format!("softrender-{}-e2e.tga", tag));
        let mesh = dir.join(format!("softrender-{}-e2e.obj", tag));
        let output = dir.join(format!("softrender-{}-e2e-out.tga", tag));
        let scene = dir.join(format!("softrender-{}-e2e.ron", tag));
        let saved = dir.join(format!("softrender-{}-e2e-saved.ron", tag));

        let mut tex = canvas::Canvas::new(2, 2, canvas::PixelFormat::Rgb);
        tex.fill(rasterizer::Color::new(200, 10, 10));
        tex.write_tga(&texture).unwrap();
        std::fs::write(&mesh, "v -1 -1 0\nv 1 -1 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        std::fs::write(&scene, "(width: 32, height: 24)").unwrap();

        let args = Args {
            texture: texture.clone(),
            mesh: mesh.clone(),
            output: output.clone(),
            scene: Some(scene.clone()),
            save_scene: Some(saved.clone()),
        };
        let result = run(&args);
        let image = canvas::Canvas::read_tga(&output);
        let resolved = load_config(&saved);

        for path in [&texture, &mesh, &output, &scene, &saved] {
            std::fs::remove_file(path).ok();
        }

        result.unwrap();
        let image = image.unwrap();
        assert_eq!(image.width(), 32);
        assert_eq!(image.height(), 24);
        assert_eq!(image.get(16, 12), rasterizer::Color::new(200, 10, 10));

        // the saved scene has the file's size and defaults for the rest
        let resolved = resolved.unwrap();
        assert_eq!(resolved.width, 32);
        assert_eq!(resolved.height, 24);
        assert_eq!(resolved.camera, SceneConfig::default().camera);
    }

    #[test]
    fn test_run_fails_before_rendering_on_bad_mesh() {
        let dir = std::env::temp_dir();
        let tag = std::process::id();
        let texture = dir.join(format!("softrender-{}-bad.tga", tag));
        let output = dir.join(format!("softrender-{}-bad-out.tga", tag));

        canvas::Canvas::new(1, 1, canvas::PixelFormat::Rgb).write_tga(&texture).unwrap();
        let args = Args {
            texture: texture.clone(),
            mesh: dir.join(format!("softrender-{}-missing.obj", tag)),
            output: output.clone(),
            scene: None,
            save_scene: None,
        };
        let result = run(&args);
        std::fs::remove_file(&texture).ok();

        assert!(matches!(result, Err(SceneError::EmptyMesh { .. })));
        assert!(!output.exists());
    }
}
