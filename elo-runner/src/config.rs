pub const DEFAULT_PATH: &str = "elo.toml";

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub emulator: std::path::PathBuf,
    /// Extra emulator arguments, shell-split.
    pub emulator_args: String,
    /// Emulator arguments that start video capture. `{output}` is replaced by the capture path.
    pub capture_args: String,
    pub timeout_secs: Option<u64>,
    pub record: bool,
    pub rom: std::path::PathBuf,
    pub symbols: std::path::PathBuf,
    /// BGB cheat file, copied next to the ROM. Name it after the ROM so BGB loads it.
    pub cheats: Option<std::path::PathBuf>,
    pub base_save: std::path::PathBuf,
    pub ai_save: std::path::PathBuf,
    pub switch_save: std::path::PathBuf,
    /// Holds trainers.json, moves.json and pokemon.json.
    pub data_dir: std::path::PathBuf,
    pub scratch_dir: std::path::PathBuf,
    pub output_dir: std::path::PathBuf,
    /// Battle log file name, inside `output_dir`.
    pub battle_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            emulator: "bgb".into(),
            emulator_args: "".to_string(),
            capture_args: "".to_string(),
            timeout_secs: None,
            record: false,
            rom: "pokecrystal.gbc".into(),
            symbols: "pokecrystal.sym".into(),
            cheats: None,
            base_save: "saves/base.sna".into(),
            ai_save: "saves/ai.sna".into(),
            switch_save: "saves/switch.sna".into(),
            data_dir: "data".into(),
            scratch_dir: "scratch".into(),
            output_dir: "output".into(),
            battle_log: "battles.jsonl".to_string(),
        }
    }
}

impl Config {
    pub fn load_or_default(path: &std::path::Path) -> Result<Self, anyhow::Error> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let config: Self = toml::from_str(&contents)
                    .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
                log::info!("loaded config from {}", path.display());
                Ok(config)
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn timeout(&self) -> Option<std::time::Duration> {
        self.timeout_secs.map(std::time::Duration::from_secs)
    }

    pub fn templates(&self) -> elo_battle::Templates {
        elo_battle::Templates {
            base: self.base_save.clone(),
            ai: self.ai_save.clone(),
            switch: self.switch_save.clone(),
        }
    }

    pub fn emulator(&self) -> bgb::Bgb {
        let mut emulator = bgb::Bgb::new(&self.emulator);
        emulator.extra_args = self.emulator_args.clone();
        emulator.capture_args = self.capture_args.clone();
        emulator
    }
}
