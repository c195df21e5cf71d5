//! Demo configuration: compiled-in defaults with `--key=value` overrides.

use std::path::{Path, PathBuf};

use glam::Vec3;

#[derive(Clone, Debug, PartialEq)]
pub struct DemoConfig {
    pub width: u32,
    pub height: u32,
    /// Root holding the `.bmp` textures and a `shaders/` directory.
    pub asset_dir: PathBuf,
    /// External OBJ mesh drawn instead of the tessellated terrain grid.
    pub mesh: Option<PathBuf>,
    pub grid_points: u32,
    pub grid_spacing: f32,
    pub light_position: Vec3,
    pub camera_position: Vec3,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            asset_dir: PathBuf::from("assets"),
            mesh: None,
            grid_points: 200,
            grid_spacing: 0.5,
            light_position: Vec3::new(0.0, -10.5, -0.5),
            camera_position: Vec3::new(0.0, 12.0, 60.0),
        }
    }
}

impl DemoConfig {
    /// Accepts `--size=WxH`, `--width=`, `--height=`, `--assets=DIR`, `--mesh=FILE`.
    /// Unknown or malformed arguments are logged and ignored.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = Self::default();
        for arg in args {
            let arg = arg.as_ref();
            if let Some(v) = arg.strip_prefix("--size=") {
                match v
                    .split_once('x')
                    .or_else(|| v.split_once('X'))
                    .and_then(|(w, h)| Some((w.parse::<u32>().ok()?, h.parse::<u32>().ok()?)))
                {
                    Some((w, h)) => {
                        config.width = w;
                        config.height = h;
                    }
                    None => log::warn!("Ignoring malformed size '{}'", v),
                }
            } else if let Some(v) = arg.strip_prefix("--width=") {
                match v.parse() {
                    Ok(w) => config.width = w,
                    Err(_) => log::warn!("Ignoring malformed width '{}'", v),
                }
            } else if let Some(v) = arg.strip_prefix("--height=") {
                match v.parse() {
                    Ok(h) => config.height = h,
                    Err(_) => log::warn!("Ignoring malformed height '{}'", v),
                }
            } else if let Some(v) = arg.strip_prefix("--assets=") {
                config.asset_dir = PathBuf::from(v);
            } else if let Some(v) = arg.strip_prefix("--mesh=") {
                config.mesh = (!v.is_empty()).then(|| PathBuf::from(v));
            } else {
                log::warn!("Unknown argument '{}'", arg);
            }
        }
        config.width = config.width.max(1);
        config.height = config.height.max(1);
        config
    }

    pub fn asset(&self, name: impl AsRef<Path>) -> PathBuf {
        self.asset_dir.join(name)
    }

    pub fn shader(&self, name: impl AsRef<Path>) -> PathBuf {
        self.asset_dir.join("shaders").join(name)
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}
