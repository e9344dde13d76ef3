use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use worldtrim::{
    app::{App, Command},
    config::TrimSettings,
    tile::TileCoord,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Remove unused regions from a Minecraft world")]
struct Cli {
    /// What to do
    #[arg(value_enum)]
    command: Command,

    /// World folder (required for extract and trim)
    world: Option<PathBuf>,

    /// Distance from center in regions (512m) beyond which all regions are deleted
    #[arg(short, long)]
    border: Option<u32>,

    /// Offset of the center from 0,0 in regions (512m)
    #[arg(
        short,
        long,
        num_args = 2,
        value_names = ["X", "Z"],
        allow_negative_numbers = true
    )]
    center: Option<Vec<i32>>,

    /// Distance from center in regions (512m) within which all regions are kept
    #[arg(short, long)]
    spawn: Option<u32>,

    /// Number of ticks before a chunk is considered inhabited
    #[arg(short, long)]
    inhabited: Option<u64>,

    /// Number of days before a region is considered old
    #[arg(short, long)]
    old: Option<u32>,

    /// Move trimmed regions to this directory instead of deleting them
    #[arg(short, long)]
    deleted_dir: Option<PathBuf>,

    /// YAML file with trim settings; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for world.json and world.png
    #[arg(long, default_value = ".")]
    state_dir: PathBuf,
}

impl Cli {
    fn settings(&self) -> Result<TrimSettings> {
        let mut settings = match &self.config {
            Some(path) => TrimSettings::from_yaml(path)?,
            None => TrimSettings::default(),
        };
        if let Some(border) = self.border {
            settings.border_radius = border;
        }
        if let Some([x, z]) = self.center.as_deref() {
            settings.center = TileCoord::new(*x, *z);
        }
        if let Some(spawn) = self.spawn {
            settings.spawn_radius = spawn;
        }
        if let Some(inhabited) = self.inhabited {
            settings.inhabited_threshold = inhabited;
        }
        if let Some(old) = self.old {
            settings.age_threshold_days = old;
        }
        if let Some(dir) = &self.deleted_dir {
            settings.archive_dir = Some(dir.clone());
        }
        Ok(settings)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut app = App::new(cli.command, cli.settings()?).with_state_dir(&cli.state_dir);
    if let Some(world) = &cli.world {
        app = app.with_world(world);
    }
    app.run()
}
