use clap::Parser;
use std::io::Write;

mod config;

#[derive(clap::Parser)]
struct Args {
    /// Path to config.
    #[clap(default_value = config::DEFAULT_PATH, long)]
    config: std::path::PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
pub enum Command {
    /// Run trainer battles.
    Battle {
        /// Seed of the first battle. Later battles of a batch use the following seeds.
        #[clap(long)]
        seed: Option<u64>,

        /// Player trainer, as class:instance.
        #[clap(long, value_parser = parse_trainer)]
        player: Option<(u8, u8)>,

        /// Enemy trainer, as class:instance.
        #[clap(long, value_parser = parse_trainer)]
        enemy: Option<(u8, u8)>,

        #[clap(default_value = "1", long)]
        count: usize,
    },

    /// Dump the battle state of a save.
    Inspect { save: std::path::PathBuf },

    /// Write a demo file.
    Demo {
        #[command(subcommand)]
        kind: DemoKind,
    },
}

#[derive(clap::Subcommand)]
pub enum DemoKind {
    /// The AI probe demo.
    Ai { output_path: std::path::PathBuf },

    /// Nothing but the buffer tail.
    Empty { output_path: std::path::PathBuf },

    /// Open the switch menu.
    Switch { output_path: std::path::PathBuf },

    /// Pick a move from the fight menu.
    Move {
        current: u8,
        target: u8,
        output_path: std::path::PathBuf,
    },

    /// Pick a party member from the party menu.
    Pokemon {
        current: u8,
        target: u8,
        output_path: std::path::PathBuf,
    },
}

fn parse_trainer(s: &str) -> Result<(u8, u8), String> {
    let (class, instance) = s
        .split_once(':')
        .ok_or_else(|| format!("expected class:instance, got {:?}", s))?;
    Ok((
        class.parse().map_err(|e| format!("invalid class {:?}: {}", class, e))?,
        instance
            .parse()
            .map_err(|e| format!("invalid instance {:?}: {}", instance, e))?,
    ))
}

pub fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_default_env()
        .filter(Some("elo"), log::LevelFilter::Info)
        .filter(Some("elo_battle"), log::LevelFilter::Info)
        .filter(Some("elo_dataview"), log::LevelFilter::Info)
        .filter(Some("elo_gamedb"), log::LevelFilter::Info)
        .filter(Some("bgb"), log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    let config = config::Config::load_or_default(&args.config)?;

    match args.command {
        Command::Battle {
            seed,
            player,
            enemy,
            count,
        } => cmd_battle(&config, seed, player, enemy, count),
        Command::Inspect { save } => cmd_inspect(&config, &save),
        Command::Demo { kind } => cmd_demo(kind),
    }
}

fn run_battle(
    config: &config::Config,
    ctx: &elo_battle::Context,
    emulator: &bgb::Bgb,
    recorder: &mut elo_battle::record::JsonLinesRecorder,
    seed: u64,
    player: Option<(u8, u8)>,
    enemy: Option<(u8, u8)>,
) -> Result<elo_battle::battle::Summary, anyhow::Error> {
    let workspace = elo_battle::workspace::Workspace::create(
        &config.scratch_dir,
        &config.output_dir,
        rand::random::<u32>() as u64,
        &config.rom,
        &config.symbols,
        config.cheats.as_deref(),
    )?;
    let session = elo_battle::Session {
        ctx,
        emulator,
        workspace: &workspace,
        timeout: config.timeout(),
        record: config.record,
    };
    Ok(elo_battle::battle::run(&session, recorder, seed, player, enemy)?)
}

fn cmd_battle(
    config: &config::Config,
    seed: Option<u64>,
    player: Option<(u8, u8)>,
    enemy: Option<(u8, u8)>,
    count: usize,
) -> Result<(), anyhow::Error> {
    let db = elo_gamedb::GameDb::load(&config.data_dir)?;
    let symbols = elo_dataview::sym::Symbols::load(&config.symbols)?;
    let ctx = elo_battle::Context::new(db, &symbols, config.templates())?;
    let emulator = config.emulator();

    std::fs::create_dir_all(&config.output_dir)?;
    let mut recorder = elo_battle::record::JsonLinesRecorder::open(&config.output_dir.join(&config.battle_log))?;

    let first_seed = seed.unwrap_or_else(rand::random);
    if count == 1 {
        let summary = run_battle(config, &ctx, &emulator, &mut recorder, first_seed, player, enemy)?;
        log::info!("seed {}: {:?} won after {} turns", summary.seed, summary.outcome, summary.turns);
        return Ok(());
    }

    let pb = indicatif::ProgressBar::new(count as u64);
    pb.set_style(indicatif::ProgressStyle::with_template(
        "{elapsed_precise} [{bar:40}] {pos}/{len} {msg}",
    )?);

    let mut failures = 0;
    for i in 0..count {
        let seed = first_seed.wrapping_add(i as u64);
        match run_battle(config, &ctx, &emulator, &mut recorder, seed, player, enemy) {
            Ok(summary) => {
                pb.set_message(format!("seed {}: {:?} won", summary.seed, summary.outcome));
            }
            Err(e) => {
                log::error!("battle with seed {} failed: {:?}", seed, e);
                failures += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish();

    if failures > 0 {
        anyhow::bail!("{} of {} battles failed", failures, count);
    }
    Ok(())
}

#[derive(serde::Serialize)]
struct Inspection {
    program_counter: u16,
    total_clocks: u64,
    player: elo_battle::record::Mon,
    enemy: elo_battle::record::Mon,
}

fn cmd_inspect(config: &config::Config, path: &std::path::Path) -> Result<(), anyhow::Error> {
    let symbols = elo_dataview::sym::Symbols::load(&config.symbols)?;
    let save = elo_dataview::save::Save::load(path)?;
    let layout = elo_dataview::state::Layout::parse(save.as_slice())?;
    let map = elo_dataview::memory::MemoryMap::crystal(&symbols, &layout)?;

    let (player, enemy) = elo_dataview::save::battle_mons(&save, &map)?;
    let inspection = Inspection {
        program_counter: elo_dataview::save::program_counter(&save, &map)?,
        total_clocks: elo_dataview::save::total_clocks(&save, &map)?,
        player: player.into(),
        enemy: enemy.into(),
    };

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &inspection)?;
    stdout.write_all(b"\n")?;
    Ok(())
}

fn cmd_demo(kind: DemoKind) -> Result<(), anyhow::Error> {
    use elo_battle::demo;
    let (demo, output_path) = match kind {
        DemoKind::Ai { output_path } => (demo::ai_demo(), output_path),
        DemoKind::Empty { output_path } => (demo::encode_default(&[]), output_path),
        DemoKind::Switch { output_path } => (demo::select_switch(), output_path),
        DemoKind::Move {
            current,
            target,
            output_path,
        } => (demo::select_move(current, target), output_path),
        DemoKind::Pokemon {
            current,
            target,
            output_path,
        } => (demo::choose_pokemon(current, target), output_path),
    };
    demo.write(&output_path)?;
    log::info!("wrote {} frames to {}", demo.len(), output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trainer() {
        assert_eq!(parse_trainer("35:1").unwrap(), (35, 1));
        assert!(parse_trainer("35").is_err());
        assert!(parse_trainer("35:x").is_err());
        assert!(parse_trainer("300:1").is_err());
    }

    #[test]
    fn test_args() {
        let args = Args::try_parse_from(["elo", "battle", "--seed", "7", "--player", "35:1", "--count", "3"]).unwrap();
        assert_eq!(args.config, std::path::PathBuf::from(config::DEFAULT_PATH));
        match args.command {
            Command::Battle {
                seed,
                player,
                enemy,
                count,
            } => {
                assert_eq!(seed, Some(7));
                assert_eq!(player, Some((35, 1)));
                assert_eq!(enemy, None);
                assert_eq!(count, 3);
            }
            _ => panic!("expected battle"),
        }

        let args = Args::try_parse_from(["elo", "demo", "move", "0", "2", "out.dem"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Demo {
                kind: DemoKind::Move {
                    current: 0,
                    target: 2,
                    ..
                }
            }
        ));
    }

    #[test]
    fn test_cmd_demo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("switch.dem");
        cmd_demo(DemoKind::Switch {
            output_path: path.clone(),
        })
        .unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), elo_battle::demo::select_switch().as_bytes());
    }
}
