//! Read-only reference tables: trainers, moves and species names.

pub const TRAINERS_FILE: &str = "trainers.json";
pub const MOVES_FILE: &str = "moves.json";
pub const POKEMON_FILE: &str = "pokemon.json";

// Item ids, from pokecrystal's item constants.
pub const FULL_RESTORE: u8 = 0x0e;
pub const MAX_POTION: u8 = 0x0f;
pub const HYPER_POTION: u8 = 0x10;
pub const SUPER_POTION: u8 = 0x11;
pub const POTION: u8 = 0x12;
pub const X_ACCURACY: u8 = 0x21;
pub const FULL_HEAL: u8 = 0x26;
pub const GUARD_SPEC: u8 = 0x29;
pub const DIRE_HIT: u8 = 0x2c;
pub const X_ATTACK: u8 = 0x31;
pub const X_DEFEND: u8 = 0x33;
pub const X_SPEED: u8 = 0x34;
pub const X_SPECIAL: u8 = 0x35;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{}: {source}", .path.display())]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Json {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },

    #[error("no trainers")]
    NoTrainers,

    #[error("unknown trainer: class {class}, instance {instance}")]
    UnknownTrainer { class: u8, instance: u8 },

    #[error("unknown move: {0:#04x}")]
    UnknownMove(u8),

    #[error("unknown species: {0:#04x}")]
    UnknownSpecies(u8),
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
    Enby,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Trainer {
    pub class: u8,
    pub instance: u8,
    pub gender: Gender,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Move {
    pub id: u8,
    pub name: String,
    pub pp: u8,
}

#[derive(Clone, Debug)]
pub struct GameDb {
    trainers: Vec<Trainer>,
    moves: std::collections::HashMap<u8, Move>,
    pokemon_names: Vec<String>,
}

fn read_json<T>(path: std::path::PathBuf) -> Result<T, Error>
where
    T: serde::de::DeserializeOwned,
{
    let raw = std::fs::read(&path).map_err(|source| Error::Io {
        path: path.clone(),
        source,
    })?;
    serde_json::from_slice(&raw).map_err(|source| Error::Json { path, source })
}

impl GameDb {
    pub fn new(trainers: Vec<Trainer>, moves: Vec<Move>, pokemon_names: Vec<String>) -> Result<Self, Error> {
        if trainers.is_empty() {
            return Err(Error::NoTrainers);
        }
        Ok(Self {
            trainers,
            moves: moves.into_iter().map(|m| (m.id, m)).collect(),
            pokemon_names,
        })
    }

    pub fn load(dir: &std::path::Path) -> Result<Self, Error> {
        let db = Self::new(
            read_json(dir.join(TRAINERS_FILE))?,
            read_json(dir.join(MOVES_FILE))?,
            read_json(dir.join(POKEMON_FILE))?,
        )?;
        log::info!(
            "loaded {} trainers, {} moves, {} species from {}",
            db.trainers.len(),
            db.moves.len(),
            db.pokemon_names.len(),
            dir.display()
        );
        Ok(db)
    }

    pub fn trainers(&self) -> &[Trainer] {
        &self.trainers
    }

    pub fn trainer(&self, class: u8, instance: u8) -> Result<&Trainer, Error> {
        self.trainers
            .iter()
            .find(|t| t.class == class && t.instance == instance)
            .ok_or(Error::UnknownTrainer { class, instance })
    }

    /// Picks a trainer uniformly. Consumes exactly one draw from `rng`.
    pub fn choose_trainer(&self, rng: &mut impl rand::Rng) -> &Trainer {
        &self.trainers[rng.gen_range(0..self.trainers.len())]
    }

    pub fn move_(&self, id: u8) -> Result<&Move, Error> {
        self.moves.get(&id).ok_or(Error::UnknownMove(id))
    }

    /// Species ids start at 1.
    pub fn pokemon_name(&self, species: u8) -> Result<&str, Error> {
        (species as usize)
            .checked_sub(1)
            .and_then(|i| self.pokemon_names.get(i))
            .map(|s| s.as_str())
            .ok_or(Error::UnknownSpecies(species))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn db() -> GameDb {
        GameDb::new(
            vec![
                Trainer {
                    class: 35,
                    instance: 1,
                    gender: Gender::Male,
                },
                Trainer {
                    class: 14,
                    instance: 1,
                    gender: Gender::Female,
                },
            ],
            vec![Move {
                id: 0x21,
                name: "TACKLE".to_string(),
                pp: 35,
            }],
            vec!["BULBASAUR".to_string(), "IVYSAUR".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn test_lookups() {
        let db = db();
        assert_eq!(db.trainer(14, 1).unwrap().gender, Gender::Female);
        assert!(matches!(db.trainer(14, 2), Err(Error::UnknownTrainer { .. })));
        assert_eq!(db.move_(0x21).unwrap().pp, 35);
        assert!(matches!(db.move_(0x22), Err(Error::UnknownMove(0x22))));
        assert_eq!(db.pokemon_name(2).unwrap(), "IVYSAUR");
        assert!(matches!(db.pokemon_name(0), Err(Error::UnknownSpecies(0))));
        assert!(matches!(db.pokemon_name(3), Err(Error::UnknownSpecies(3))));
    }

    #[test]
    fn test_choose_trainer_is_seeded() {
        let db = db();
        let picks = |seed| {
            let mut rng = rand_pcg::Mcg128Xsl64::seed_from_u64(seed);
            (0..8).map(|_| db.choose_trainer(&mut rng).clone()).collect::<Vec<_>>()
        };
        assert_eq!(picks(3), picks(3));
    }

    #[test]
    fn test_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(TRAINERS_FILE),
            r#"[{"class": 35, "instance": 1, "gender": "ENBY", "name": "JOEY"}]"#,
        )
        .unwrap();
        std::fs::write(dir.path().join(MOVES_FILE), r#"[{"id": 1, "name": "POUND", "pp": 35}]"#).unwrap();
        std::fs::write(dir.path().join(POKEMON_FILE), r#"["BULBASAUR"]"#).unwrap();

        let db = GameDb::load(dir.path()).unwrap();
        assert_eq!(db.trainer(35, 1).unwrap().gender, Gender::Enby);
        assert_eq!(db.move_(1).unwrap().name, "POUND");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(GameDb::load(dir.path()), Err(Error::Io { .. })));
    }

    #[test]
    fn test_no_trainers() {
        assert!(matches!(GameDb::new(vec![], vec![], vec![]), Err(Error::NoTrainers)));
    }
}
