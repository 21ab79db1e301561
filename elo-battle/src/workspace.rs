//! Files owned by a single run.

pub const OUT_SAVE: &str = "out.sna";
pub const BATTLE_SAVE: &str = "battle.sna";
pub const AI_INPUT_SAVE: &str = "ai_input.sna";
pub const AI_OUTPUT_SAVE: &str = "ai_output.sna";
pub const OUT_DEMO: &str = "out.dem";
pub const AI_DEMO: &str = "ai.dem";

#[derive(Clone, Debug)]
pub struct Workspace {
    pub run_id: u64,
    pub saves_dir: std::path::PathBuf,
    pub demo_dir: std::path::PathBuf,
    pub output_dir: std::path::PathBuf,
}

fn create_fresh(path: &std::path::Path) -> Result<(), crate::Error> {
    match std::fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(crate::Error::RunExists(path.to_path_buf())),
        Err(e) => Err(e.into()),
    }
}

fn copy_into(src: &std::path::Path, dir: &std::path::Path) -> Result<(), crate::Error> {
    let name = src
        .file_name()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"))?;
    std::fs::copy(src, dir.join(name))?;
    Ok(())
}

impl Workspace {
    /// Creates `<scratch>/<run id>/{saves,demo}` and `<output>/<run id>`. Fails if either run directory already exists.
    /// The ROM, its symbol file and BGB cheat file are copied next to the saves so the emulator picks them up, and the
    /// probe demo is written once for the whole run.
    pub fn create(
        scratch_dir: &std::path::Path,
        output_dir: &std::path::Path,
        run_id: u64,
        rom: &std::path::Path,
        symbols: &std::path::Path,
        cheats: Option<&std::path::Path>,
    ) -> Result<Self, crate::Error> {
        std::fs::create_dir_all(scratch_dir)?;
        std::fs::create_dir_all(output_dir)?;

        let working_dir = scratch_dir.join(run_id.to_string());
        let output_dir = output_dir.join(run_id.to_string());
        create_fresh(&working_dir)?;
        create_fresh(&output_dir)?;

        let ws = Self {
            run_id,
            saves_dir: working_dir.join("saves"),
            demo_dir: working_dir.join("demo"),
            output_dir,
        };
        std::fs::create_dir(&ws.saves_dir)?;
        std::fs::create_dir(&ws.demo_dir)?;

        copy_into(rom, &ws.saves_dir)?;
        copy_into(symbols, &ws.saves_dir)?;
        if let Some(cheats) = cheats {
            copy_into(cheats, &ws.saves_dir)?;
        }
        crate::demo::ai_demo().write(&ws.ai_demo())?;

        log::info!("run {}: working in {}", run_id, working_dir.display());
        Ok(ws)
    }

    pub fn out_save(&self) -> std::path::PathBuf {
        self.saves_dir.join(OUT_SAVE)
    }

    pub fn battle_save(&self) -> std::path::PathBuf {
        self.saves_dir.join(BATTLE_SAVE)
    }

    pub fn ai_input_save(&self) -> std::path::PathBuf {
        self.saves_dir.join(AI_INPUT_SAVE)
    }

    pub fn ai_output_save(&self) -> std::path::PathBuf {
        self.saves_dir.join(AI_OUTPUT_SAVE)
    }

    pub fn out_demo(&self) -> std::path::PathBuf {
        self.demo_dir.join(OUT_DEMO)
    }

    pub fn ai_demo(&self) -> std::path::PathBuf {
        self.demo_dir.join(AI_DEMO)
    }

    /// Where the emulator should write the recording of one battle segment.
    pub fn capture(&self, segment: usize) -> bgb::Capture {
        bgb::Capture {
            output_path: self.output_dir.join(format!("{}_{:04}.avi", self.run_id, segment)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(dir: &std::path::Path) -> (std::path::PathBuf, std::path::PathBuf) {
        let rom = dir.join("pokecrystal.gbc");
        let symbols = dir.join("pokecrystal.sym");
        std::fs::write(&rom, b"rom").unwrap();
        std::fs::write(&symbols, b"00:c000 wFoo\n").unwrap();
        (rom, symbols)
    }

    #[test]
    fn test_create() {
        let dir = tempfile::tempdir().unwrap();
        let (rom, symbols) = inputs(dir.path());
        let scratch = dir.path().join("scratch");
        let output = dir.path().join("output");

        let ws = Workspace::create(&scratch, &output, 1234, &rom, &symbols, None).unwrap();
        assert!(!ws.saves_dir.join("pokecrystal.cht").exists());
        assert!(ws.saves_dir.is_dir());
        assert!(ws.demo_dir.is_dir());
        assert_eq!(ws.output_dir, output.join("1234"));
        assert!(ws.output_dir.is_dir());
        assert_eq!(std::fs::read(ws.saves_dir.join("pokecrystal.gbc")).unwrap(), b"rom");
        assert!(ws.saves_dir.join("pokecrystal.sym").is_file());
        assert_eq!(std::fs::read(ws.ai_demo()).unwrap(), crate::demo::ai_demo().as_bytes());
        assert_eq!(ws.battle_save(), scratch.join("1234").join("saves").join(BATTLE_SAVE));
        assert_eq!(
            ws.capture(3).output_path,
            output.join("1234").join("1234_0003.avi")
        );
    }

    #[test]
    fn test_create_with_cheats() {
        let dir = tempfile::tempdir().unwrap();
        let (rom, symbols) = inputs(dir.path());
        let cheats = dir.path().join("pokecrystal.cht");
        std::fs::write(&cheats, b"[Cheats]\n").unwrap();

        let ws = Workspace::create(
            &dir.path().join("scratch"),
            &dir.path().join("output"),
            7,
            &rom,
            &symbols,
            Some(&cheats),
        )
        .unwrap();
        assert_eq!(std::fs::read(ws.saves_dir.join("pokecrystal.cht")).unwrap(), b"[Cheats]\n");
    }

    #[test]
    fn test_missing_cheats() {
        let dir = tempfile::tempdir().unwrap();
        let (rom, symbols) = inputs(dir.path());
        let cheats = dir.path().join("nope.cht");
        assert!(matches!(
            Workspace::create(
                &dir.path().join("scratch"),
                &dir.path().join("output"),
                7,
                &rom,
                &symbols,
                Some(&cheats)
            ),
            Err(crate::Error::Io(_))
        ));
    }

    #[test]
    fn test_run_id_must_be_unique() {
        let dir = tempfile::tempdir().unwrap();
        let (rom, symbols) = inputs(dir.path());
        let scratch = dir.path().join("scratch");
        let output = dir.path().join("output");

        Workspace::create(&scratch, &output, 1, &rom, &symbols, None).unwrap();
        assert!(matches!(
            Workspace::create(&scratch, &output, 1, &rom, &symbols, None),
            Err(crate::Error::RunExists(_))
        ));
        Workspace::create(&scratch, &output, 2, &rom, &symbols, None).unwrap();
    }
}
