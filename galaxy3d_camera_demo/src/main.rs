//! Galaxy3D camera demos
//!
//! Run with: cargo run -p galaxy3d_camera_demo -- <COMMAND>

use std::path::{Path, PathBuf};
use clap::{Parser, Subcommand, ValueEnum};
use galaxy_3d_camera::galaxy3d::{
    camera::DepthImage,
    config::Config,
    geom::{self, Mesh, AABB},
    glam::Vec3,
    log::LogLevel,
    reference::{self, CameraRecord},
    viewer::HeadlessViewer,
    Engine, Error, Result,
};
use galaxy_3d_camera::{camera_error, camera_info, camera_warn};

const SOURCE: &str = "galaxy3d::Demo";

/// Extrinsics of the depth-map example (row-major, world → camera).
const DEPTH_MAP_EXTRINSICS: [[f32; 4]; 4] = [
    [-0.19913687965295618, -0.47458859076048726, 0.8573856615794662, 0.7913859597626586],
    [0.0, -0.8749086068608676, -0.48428806473087466, 1.3802989124878067],
    [0.9799716848777235, -0.09643961406367524, 0.17422656995178815, 1.689456300513285],
    [0.0, 0.0, 0.0, 1.0],
];

/// Camera looking down -z from (0, 1.5, 3).
const FLIPPED_EXTRINSICS: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, -1.0, 0.0, 1.5],
    [0.0, 0.0, -1.0, 3.0],
    [0.0, 0.0, 0.0, 1.0],
];

const INTRINSICS: [f32; 4] = [1600.0, 1600.0, 1024.0, 1024.0];

#[derive(Parser)]
#[command(name = "galaxy3d_camera_demo", about = "Headless camera and depth demos")]
struct Cli {
    /// Log verbosity [default: the config's core.log_level, else info]
    #[arg(long, value_enum)]
    log_level: Option<LogLevelArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Off => LogLevel::Off,
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Orbit a camera around a cube and check the orbit radius stays constant
    Orbit {
        #[arg(long, default_value_t = 120)]
        frames: u32,
        /// Fixed seconds per frame (measured frame time when omitted)
        #[arg(long)]
        dt: Option<f32>,
    },
    /// Render from explicit extrinsics and intrinsics
    IntrinsicsExtrinsics {
        /// OBJ mesh to render (a box when omitted)
        #[arg(long)]
        mesh: Option<PathBuf>,
        /// Write the depth map as an 8-bit PNG
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Render and save a linearised depth map
    DepthMap {
        /// TOML config (msaa_nr_samples must be 1)
        #[arg(long, default_value = "demos/depth_example.toml")]
        config: PathBuf,
        #[arg(long)]
        mesh: Option<PathBuf>,
        /// 8-bit PNG visualization
        #[arg(long, default_value = "depth.png")]
        out: PathBuf,
        /// Metric depth as 32-bit float OpenEXR
        #[arg(long)]
        depth_out: Option<PathBuf>,
    },
    /// Compare rendered depth against reference depth maps
    Reference {
        /// JSON camera records (cameras on a circle when omitted)
        #[arg(long)]
        cameras: Option<PathBuf>,
        #[arg(long, default_value_t = 8)]
        count: u32,
        /// Directory of `<id>.exr` depth maps and optional `<id>.png`
        /// silhouettes (analytic ray cast of the box when omitted)
        #[arg(long)]
        references: Option<PathBuf>,
    },
}

/// The command line wins over the config file; info when neither sets it.
fn resolve_log_level(flag: Option<LogLevelArg>, config: Option<&Config>) -> LogLevel {
    match (flag, config) {
        (Some(flag), _) => flag.into(),
        (None, Some(config)) => config.core.log_level,
        (None, None) => LogLevel::Info,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.command {
        Command::DepthMap { config, .. } => Some(Config::from_file(config)?),
        _ => None,
    };
    Engine::initialize(resolve_log_level(cli.log_level, config.as_ref()))?;

    let result = match cli.command {
        Command::Orbit { frames, dt } => run_orbit(frames, dt),
        Command::IntrinsicsExtrinsics { mesh, out } => run_intrinsics_extrinsics(mesh, out),
        Command::DepthMap { mesh, out, depth_out, .. } => {
            run_depth_map(config.unwrap_or_default(), mesh, out, depth_out)
        }
        Command::Reference { cameras, count, references } => run_reference(cameras, count, references),
    };

    if let Err(e) = &result {
        camera_error!(SOURCE, "{}", e);
    }
    Engine::shutdown();
    result
}

fn depth_config() -> Config {
    let mut config = Config::default();
    config.render.msaa_nr_samples = 1;
    config
}

fn load_mesh_or_box(path: Option<PathBuf>, center: Vec3, half_extent: f32) -> Result<Mesh> {
    match path {
        Some(path) => geom::build_from_file(path),
        None => geom::build_box(center, Vec3::splat(half_extent)),
    }
}

fn coverage(image: &DepthImage) -> f32 {
    let hits = image.silhouette().iter().filter(|&&hit| hit).count();
    hits as f32 / image.data().len() as f32
}

fn run_orbit(frames: u32, fixed_dt: Option<f32>) -> Result<()> {
    let mut viewer = HeadlessViewer::new(256, 256, depth_config())?;
    viewer.insert_mesh("cube", geom::build_box(Vec3::new(0.0, 1.0, 0.0), Vec3::splat(0.5))?);

    let camera = viewer.get_camera_mut();
    camera.set_position(Vec3::new(1.0, 2.5, 5.0))?;
    camera.set_lookat(Vec3::new(0.0, 1.0, 0.0))?;
    let radius = camera.pose().dist_lookat();

    let mut max_drift = 0.0f32;
    for frame in 0..frames {
        let measured = viewer.start_frame();
        let dt = fixed_dt.unwrap_or(measured);
        viewer.get_camera_mut().orbit_y(10.0 * dt);
        viewer.update()?;

        let drift = (viewer.get_camera().pose().dist_lookat() - radius).abs();
        max_drift = max_drift.max(drift);

        if frame % 30 == 0 {
            let image = viewer.get_linearised_depth()?;
            camera_info!(
                SOURCE,
                "frame {}: position {:?}, coverage {:.1}%",
                frame,
                viewer.get_camera().position(),
                coverage(&image) * 100.0
            );
        }
    }

    camera_info!(SOURCE, "orbit radius {:.5}, max drift {:.2e} over {} frames", radius, max_drift, frames);
    if max_drift > 1e-3 * radius {
        camera_warn!(SOURCE, "orbit radius drifted by {}", max_drift);
    }
    Ok(())
}

fn run_intrinsics_extrinsics(mesh: Option<PathBuf>, out: Option<PathBuf>) -> Result<()> {
    let mut viewer = HeadlessViewer::new(2048, 2048, depth_config())?;
    viewer.insert_mesh("mesh", load_mesh_or_box(mesh, Vec3::new(0.0, 1.0, 0.0), 0.5)?);

    let camera = viewer.get_camera_mut();
    camera.set_width_height(2048, 2048)?;
    camera.set_extrinsics_rows(FLIPPED_EXTRINSICS)?;
    let [fx, fy, cx, cy] = INTRINSICS;
    camera.set_intrinsics(fx, fy, cx, cy)?;

    viewer.render_next_frame()?;
    let image = viewer.get_linearised_depth()?;
    camera_info!(
        SOURCE,
        "camera at {:?}, coverage {:.1}%, farthest hit {:?}",
        viewer.get_camera().position(),
        coverage(&image) * 100.0,
        image.max_finite()
    );

    if let Some(out) = out {
        image.save_png(&out)?;
        camera_info!(SOURCE, "depth written to {:?}", out);
    }
    Ok(())
}

fn run_depth_map(config: Config, mesh: Option<PathBuf>, out: PathBuf, depth_out: Option<PathBuf>) -> Result<()> {
    let mut viewer = HeadlessViewer::new(2048, 2048, config)?;
    viewer.insert_mesh("mesh", load_mesh_or_box(mesh, Vec3::new(0.0, 1.2, 0.0), 0.25)?);

    let camera = viewer.get_camera_mut();
    camera.set_extrinsics_rows(DEPTH_MAP_EXTRINSICS)?;
    let [fx, fy, cx, cy] = INTRINSICS;
    camera.set_intrinsics(fx, fy, cx, cy)?;

    viewer.render_next_frame()?;
    let image = viewer.get_linearised_depth()?;
    if image.max_finite().is_none() {
        camera_warn!(SOURCE, "nothing visible, writing an empty depth map");
    }
    image.save_png(&out)?;
    camera_info!(SOURCE, "depth map {}x{} written to {:?}", image.width(), image.height(), out);

    if let Some(depth_out) = depth_out {
        image.save_exr(&depth_out)?;
        camera_info!(SOURCE, "metric depth written to {:?}", depth_out);
    }
    Ok(())
}

/// Reference depth and comparison mask for one record: loaded from
/// `references` when given, otherwise ray cast against `aabb`.
fn reference_for(
    record: &CameraRecord,
    rendered: &DepthImage,
    viewer: &HeadlessViewer,
    aabb: &AABB,
    references: Option<&Path>,
) -> Result<(DepthImage, Vec<bool>)> {
    let Some(dir) = references else {
        let expected = reference::raycast_aabb_depth(viewer.get_camera(), aabb)?;
        let mask = reference::silhouette_intersection(rendered, &expected);
        return Ok((expected, mask));
    };

    let path = reference::find_reference_depth(dir, record.id).ok_or_else(|| {
        Error::InvalidReference(format!("no reference depth for camera {} in {:?}", record.id, dir))
    })?;
    let expected = reference::load_reference_depth(&path)?;

    let silhouette_path = dir.join(format!("{}.png", record.id));
    let reference_mask = if silhouette_path.is_file() {
        let (width, height, mask) = reference::load_silhouette(&silhouette_path)?;
        if (width, height) != (expected.width(), expected.height()) {
            return Err(Error::InvalidReference(format!(
                "silhouette {:?} is {}x{}, depth is {}x{}",
                silhouette_path, width, height, expected.width(), expected.height()
            )));
        }
        mask
    } else {
        expected.silhouette()
    };
    let mask = reference::mask_and(&reference_mask, &rendered.silhouette())?;
    Ok((expected, mask))
}

fn run_reference(cameras: Option<PathBuf>, count: u32, references: Option<PathBuf>) -> Result<()> {
    let lookat = Vec3::new(0.0, 0.9, 0.0);
    let records: Vec<CameraRecord> = match cameras {
        Some(path) => reference::load_camera_records(path)?,
        None => reference::orbit_camera_records(count, lookat, 1.5, 1.2, INTRINSICS, 2048, 2048)?,
    };

    let mesh = geom::build_box(lookat, Vec3::splat(0.3))?;
    let aabb = *mesh.aabb();

    let mut viewer = HeadlessViewer::new(2048, 2048, depth_config())?;
    viewer.insert_mesh("box", mesh);

    let mut worst = 0.0f32;
    for record in &records {
        record.apply_to(viewer.get_camera_mut())?;
        viewer.start_frame();
        viewer.update()?;

        let rendered = viewer.get_linearised_depth()?;
        let (expected, mask) = reference_for(record, &rendered, &viewer, &aabb, references.as_deref())?;
        let stats = reference::compare_depth(&rendered, &expected, &mask)?;

        camera_info!(
            SOURCE,
            "camera {}: mean error {:.2e}, max error {:.2e} over {} pixels",
            record.id, stats.mean_abs, stats.max_abs, stats.pixel_count
        );
        worst = worst.max(stats.mean_abs);

        if !stats.within(reference::DEPTH_TOLERANCE) {
            return Err(Error::InvalidReference(format!(
                "camera {}: mean depth error {} exceeds {}",
                record.id, stats.mean_abs, reference::DEPTH_TOLERANCE
            )));
        }
    }

    camera_info!(SOURCE, "{} cameras within tolerance, worst mean error {:.2e}", records.len(), worst);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use galaxy_3d_camera::galaxy3d::Camera;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_log_level_flag_value_enum() {
        let cli = Cli::try_parse_from(["demo", "--log-level", "debug", "orbit"]).unwrap();
        assert_eq!(cli.log_level, Some(LogLevelArg::Debug));
        assert!(Cli::try_parse_from(["demo", "--log-level", "loud", "orbit"]).is_err());
    }

    #[test]
    fn test_resolve_log_level_prefers_flag_then_config() {
        let config = Config::from_toml_str("[core]\nlog_level = \"off\"\n[render]\nmsaa_nr_samples = 1\n").unwrap();
        assert_eq!(resolve_log_level(None, Some(&config)), LogLevel::Off);
        assert_eq!(resolve_log_level(Some(LogLevelArg::Trace), Some(&config)), LogLevel::Trace);
        assert_eq!(resolve_log_level(None, None), LogLevel::Info);
    }

    #[test]
    fn test_shipped_depth_config_sets_log_level() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../demos/depth_example.toml");
        let config = Config::from_file(path).unwrap();
        assert_eq!(resolve_log_level(None, Some(&config)), LogLevel::Info);
        assert_eq!(config.render.msaa_nr_samples, 1);
    }

    #[test]
    fn test_parse_depth_map_defaults() {
        let cli = Cli::try_parse_from(["demo", "depth-map"]).unwrap();
        assert!(cli.log_level.is_none());
        match cli.command {
            Command::DepthMap { config, mesh, out, depth_out } => {
                assert_eq!(config, PathBuf::from("demos/depth_example.toml"));
                assert!(mesh.is_none());
                assert_eq!(out, PathBuf::from("depth.png"));
                assert!(depth_out.is_none());
            }
            _ => panic!("expected depth-map"),
        }
    }

    #[test]
    fn test_parse_orbit_dt_is_optional() {
        let cli = Cli::try_parse_from(["demo", "orbit"]).unwrap();
        assert!(matches!(cli.command, Command::Orbit { frames: 120, dt: None }));

        let cli = Cli::try_parse_from(["demo", "orbit", "--dt", "0.5"]).unwrap();
        assert!(matches!(cli.command, Command::Orbit { dt: Some(dt), .. } if dt == 0.5));
    }

    #[test]
    fn test_parse_reference_directory() {
        let cli = Cli::try_parse_from(["demo", "reference", "--references", "refs"]).unwrap();
        match cli.command {
            Command::Reference { references, count, .. } => {
                assert_eq!(references, Some(PathBuf::from("refs")));
                assert_eq!(count, 8);
            }
            _ => panic!("expected reference"),
        }
    }

    #[test]
    fn test_flipped_extrinsics_camera_centre() {
        let mut camera = Camera::default();
        camera.set_extrinsics_rows(FLIPPED_EXTRINSICS).unwrap();
        assert!(camera.position().abs_diff_eq(Vec3::new(0.0, 1.5, 3.0), 1e-6));
    }
}
