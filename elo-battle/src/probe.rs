//! Asking the game's AI what a trainer would do.
//!
//! The AI only ever decides for the enemy slot, so to decide for the player's trainer the battle state is copied into
//! a probe save with both sides swapped, the trainer is installed as the enemy, and the emulator is run until the AI
//! commits to something.

use elo_dataview::memory;
use elo_dataview::save::{self, Save};

/// Runs the base save with `trainer` installed as the opponent until the trainer's party, name and items are loaded.
pub fn load_trainer_info(
    session: &crate::Session,
    base: &Save,
    trainer: &elo_gamedb::Trainer,
) -> Result<Save, crate::Error> {
    let map = &session.ctx.memory;
    let mut save = base.clone();
    save.set(map.field(memory::OTHER_TRAINER_CLASS)?, &[trainer.class])?;
    save.set(map.field(memory::OTHER_TRAINER_ID)?, &[trainer.instance])?;

    let path = session.workspace.out_save();
    save.write(&path)?;
    log::info!("loading trainer {}:{}", trainer.class, trainer.instance);
    session.run(&path, &path, &crate::breakpoint::trainer_info_breakpoints(), None, None)
}

/// Guesses which moves the enemy has used from PP below the move's maximum. The game only tracks this for the
/// player's side.
///
/// Misses moves used before a PP restore and Struggle, and does not reset when the enemy switches. Transform makes
/// every slot look used.
pub fn enemy_used_moves(
    save: &Save,
    map: &memory::MemoryMap,
    db: &elo_gamedb::GameDb,
) -> Result<[u8; memory::NUM_MOVES], crate::Error> {
    let moves = save.get(map.field(memory::ENEMY_MON_MOVES)?)?;
    let pp = save.get(map.field(memory::ENEMY_MON_PP)?)?;

    let mut used = [0u8; memory::NUM_MOVES];
    for (slot, (&id, &pp)) in moves.iter().zip(pp.iter()).enumerate() {
        if id == 0 {
            continue;
        }
        let move_ = db.move_(id)?;
        if pp < move_.pp {
            log::debug!("enemy used {}: pp {} of {}", move_.name, pp, move_.pp);
            used[slot] = id;
        }
    }
    Ok(used)
}

/// Builds the probe save for `trainer` from `battle_save`, runs it, and returns the save the AI halted in.
pub fn decide(
    session: &crate::Session,
    battle_save: &Save,
    template: &std::path::Path,
    trainer: &elo_gamedb::Trainer,
    rng: &mut impl rand::Rng,
    known_items: Option<[u8; 2]>,
) -> Result<Save, crate::Error> {
    let ctx = session.ctx;
    let map = &ctx.memory;

    let mut probe = Save::load(template)?;
    save::swap_pairings(battle_save, &mut probe, map)?;

    probe.set(map.field(memory::OTHER_TRAINER_CLASS)?, &[trainer.class])?;
    probe.set(map.field(memory::TRAINER_CLASS)?, &[trainer.class])?;
    probe.set(map.field(memory::OTHER_TRAINER_ID)?, &[trainer.instance])?;

    // The AI misbehaves against a fainted target.
    if battle_save.get(map.field(memory::ENEMY_MON_HP)?)? == [0, 0] {
        log::info!("probed-against mon has no hp, patching it to 1");
        probe.set(map.field(memory::BATTLE_MON_HP)?, &save::encode_stat(1))?;
    }

    save::randomize_divider_register(&mut probe, map, rng)?;

    if let Some(items) = known_items {
        probe.set(map.field(memory::ENEMY_TRAINER_ITEMS)?, &items)?;
    }

    probe.set(
        map.field(memory::PLAYER_USED_MOVES)?,
        &enemy_used_moves(battle_save, map, &ctx.db)?,
    )?;

    let ws = session.workspace;
    probe.write(&ws.ai_input_save())?;
    session.run(
        &ws.ai_input_save(),
        &ws.ai_output_save(),
        &crate::breakpoint::probe_breakpoints(),
        Some(&ws.ai_demo()),
        None,
    )
}
