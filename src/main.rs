use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use clap::{Args, Parser};
use engine::{PathRequest, ProjectFlags, Runtime, MAX_RANGE};
use glam::{ivec2, IVec2};
use tracing_subscriber::EnvFilter;

mod map_view;

pub const APP_NAME: &str = "cavefire";

/// Line-of-fire viewer for cave maps.
#[derive(Parser, Debug)]
#[command(name = APP_NAME)]
enum Cmd {
    /// Show which grids the player can fire at.
    View(ViewArgs),
    /// Trace a missile path from the player to a target grid.
    Path(PathArgs),
}

#[derive(Args, Debug)]
struct ViewArgs {
    /// Map file, `@` marks the player.
    map: PathBuf,

    #[arg(long, help = "Player is leaping and can see out of pits")]
    leaping: bool,
}

#[derive(Args, Debug)]
struct PathArgs {
    /// Map file, `@` marks the player.
    map: PathBuf,

    #[arg(long, value_parser = parse_pos, help = "Target grid as x,y")]
    to: IVec2,

    #[arg(long, default_value_t = MAX_RANGE, help = "Maximum path length")]
    range: i32,

    #[arg(long, help = "Stop at the first monster")]
    stop: bool,

    #[arg(long, help = "Report monsters the path passes through")]
    note: bool,

    #[arg(long, help = "Continue past the target")]
    thru: bool,

    #[arg(long, help = "Pass through walls")]
    pass_walls: bool,

    #[arg(long, help = "Pass through walls the player hasn't seen")]
    ignore_unknown: bool,

    #[arg(long, help = "Don't pull targets beyond sight range in")]
    leave_sight: bool,
}

impl PathArgs {
    fn flags(&self) -> ProjectFlags {
        let mut ret = ProjectFlags::empty();
        ret.set(ProjectFlags::STOP_AT_MONSTER, self.stop);
        ret.set(ProjectFlags::NOTE_MONSTER_BLOCK, self.note);
        ret.set(ProjectFlags::EXTEND_PAST_TARGET, self.thru);
        ret.set(ProjectFlags::PASS_THROUGH_WALLS, self.pass_walls);
        ret.set(ProjectFlags::IGNORE_UNKNOWN_WALLS, self.ignore_unknown);
        ret.set(ProjectFlags::LEAVE_SIGHT_RANGE, self.leave_sight);
        ret
    }
}

fn parse_pos(s: &str) -> anyhow::Result<IVec2> {
    let Some((x, y)) = s.split_once(',') else {
        bail!("expected x,y, got {s:?}");
    };
    Ok(ivec2(x.trim().parse()?, y.trim().parse()?))
}

fn load(path: &Path) -> anyhow::Result<Runtime> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Runtime::from_ascii(&text)
        .with_context(|| format!("loading {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cmd::parse() {
        Cmd::View(args) => {
            let mut rt = load(&args.map)?;
            rt.set_leaping(args.leaping);
            log::info!(
                "{} grids in line of fire from {}",
                rt.fire_view().len(),
                rt.player()
            );
            print!("{}", map_view::fire(&rt));
        }
        Cmd::Path(args) => {
            let rt = load(&args.map)?;
            let req = PathRequest::new(rt.player(), args.to, args.range)
                .with_flags(args.flags())
                .ignoring(rt.player());
            let path = rt.project_path_from(&req);
            log::info!(
                "path of {} grids ends at {}{}",
                path.len(),
                path.end,
                if path.blocked_by_monster {
                    ", blocked by a monster"
                } else {
                    ""
                }
            );
            print!("{}", map_view::path(&rt, &path.grids));
        }
    }

    Ok(())
}
