use elo_dataview::save::{self, Save};
use elo_dataview::{memory, text};

/// Builds the starting battle save: the base save with the player's trainer (as loaded into `player_info`) standing
/// in for the player, about to fight `enemy`.
///
/// Draws from `rng` in this order: gender (non-binary enemies only), divider register, textbox frame.
pub fn set_up_battle_save(
    ctx: &crate::Context,
    base: &Save,
    player_info: &Save,
    enemy: &elo_gamedb::Trainer,
    rng: &mut impl rand::Rng,
) -> Result<Save, crate::Error> {
    let map = &ctx.memory;
    let mut battle = base.clone();

    save::copy(
        player_info,
        map.field(memory::OT_PARTY)?,
        &mut battle,
        map.field(memory::PLAYER_PARTY)?,
    )?;

    let trainer_name = map.field(memory::STRING_BUFFER_1)?;
    let party_size = player_info.get_u8(map.field(memory::OT_PARTY_COUNT)?)? as usize;
    for i in 0..party_size {
        let species = player_info.get(map.indexed(memory::OT_PARTY_MONS, i)?)?[0];
        let nickname = text::encode_name(ctx.db.pokemon_name(species)?, memory::NAME_LENGTH)?;
        battle.set(map.indexed(memory::PARTY_MON_NICKNAMES, i)?, &nickname)?;
        save::copy(
            player_info,
            trainer_name,
            &mut battle,
            map.indexed(memory::PARTY_MON_OTS, i)?,
        )?;
    }

    save::copy(player_info, trainer_name, &mut battle, map.field(memory::PLAYER_NAME)?)?;
    battle.set(map.field(memory::PLAYER_NAME_END)?, &[text::TERMINATOR])?;

    let female = match enemy.gender {
        elo_gamedb::Gender::Male => false,
        elo_gamedb::Gender::Female => true,
        elo_gamedb::Gender::Enby => rng.gen::<f64>() > 0.5,
    };
    if female {
        battle.set(map.field(memory::PLAYER_GENDER)?, &[1])?;
    }

    battle.set(map.field(memory::OTHER_TRAINER_CLASS)?, &[enemy.class])?;
    battle.set(map.field(memory::TRAINER_CLASS)?, &[enemy.class])?;
    battle.set(map.field(memory::OTHER_TRAINER_ID)?, &[enemy.instance])?;

    save::randomize_divider_register(&mut battle, map, rng)?;

    let frame = rng.gen_range(0..=8u8);
    battle.set(map.field(memory::TEXTBOX_FRAME)?, &[frame])?;

    // A single X Attack for the AI to spend on itself.
    battle.set(map.field(memory::NUM_ITEMS)?, &[1])?;
    battle.set(map.field(memory::ITEMS)?, &[elo_gamedb::X_ATTACK, 1, 0xff])?;

    log::info!(
        "battle save ready: {} party mons vs trainer {}:{}, textbox frame {}",
        party_size,
        enemy.class,
        enemy.instance,
        frame
    );
    Ok(battle)
}
