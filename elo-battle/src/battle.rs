//! The turn loop: advance the battle to the next decision point, ask the AI what the player's trainer does there,
//! and replay that decision as input.

use elo_dataview::memory;
use elo_dataview::save::{self, Save};
use rand::SeedableRng;

use crate::breakpoint::{self, BattleHalt, ProbeHalt};
use crate::demo;
use crate::probe;
use crate::record::{self, Outcome, TurnKind};
use crate::setup;

#[derive(Debug)]
enum State {
    Setup,
    AwaitBreakpoint,
    Classify,
    ForceSwitch,
    MenuDecision,
    ItemChosen { item: u8 },
    SwitchChosen { probe: Save },
    MoveChosen { probe: Save },
    Win,
    Lose,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Summary {
    pub seed: u64,
    pub player: record::TrainerId,
    pub enemy: record::TrainerId,
    pub outcome: Outcome,
    pub turns: usize,
}

/// Draws both trainers, player first. Both draws are always taken so that overriding a side does not shift the
/// rest of the stream.
pub fn choose_trainers(
    db: &elo_gamedb::GameDb,
    rng: &mut impl rand::Rng,
    player: Option<(u8, u8)>,
    enemy: Option<(u8, u8)>,
) -> Result<(elo_gamedb::Trainer, elo_gamedb::Trainer), crate::Error> {
    let player_pick = db.choose_trainer(rng).clone();
    let enemy_pick = db.choose_trainer(rng).clone();
    let pick = |choice: Option<(u8, u8)>, drawn: elo_gamedb::Trainer| match choice {
        Some((class, instance)) => db.trainer(class, instance).cloned(),
        None => Ok(drawn),
    };
    Ok((pick(player, player_pick)?, pick(enemy, enemy_pick)?))
}

/// Runs one battle to completion.
pub fn run(
    session: &crate::Session,
    recorder: &mut dyn record::Recorder,
    seed: u64,
    player: Option<(u8, u8)>,
    enemy: Option<(u8, u8)>,
) -> Result<Summary, crate::Error> {
    let mut rng = rand_pcg::Mcg128Xsl64::seed_from_u64(seed);
    let (player, enemy) = choose_trainers(&session.ctx.db, &mut rng, player, enemy)?;
    log::info!(
        "run {} (seed {}): trainer {}:{} vs {}:{}",
        session.workspace.run_id,
        seed,
        player.class,
        player.instance,
        enemy.class,
        enemy.instance
    );

    let handle = recorder.start(seed, (&player).into(), (&enemy).into())?;
    Battle {
        session,
        recorder,
        rng,
        handle,
        player,
        enemy,
        battle_save: Save::from_vec(vec![]),
        items: [0; 2],
        snapshots: Default::default(),
        turns: 0,
        segments: 0,
    }
    .run()
}

struct Battle<'a, 'b> {
    session: &'a crate::Session<'a>,
    recorder: &'b mut dyn record::Recorder,
    rng: rand_pcg::Mcg128Xsl64,
    handle: record::Handle,
    player: elo_gamedb::Trainer,
    enemy: elo_gamedb::Trainer,
    battle_save: Save,
    /// Items the player's trainer may still use. Spent items are zeroed and never come back.
    items: [u8; 2],
    snapshots: (record::Mon, record::Mon),
    turns: usize,
    segments: usize,
}

impl<'a, 'b> Battle<'a, 'b> {
    fn run(mut self) -> Result<Summary, crate::Error> {
        let mut state = State::Setup;
        let outcome = loop {
            state = match state {
                State::Setup => self.set_up()?,
                State::AwaitBreakpoint => self.await_breakpoint()?,
                State::Classify => self.classify()?,
                State::ForceSwitch => self.force_switch()?,
                State::MenuDecision => self.menu_decision()?,
                State::ItemChosen { item } => self.item_chosen(item)?,
                State::SwitchChosen { probe } => self.switch_chosen(&probe)?,
                State::MoveChosen { probe } => self.move_chosen(&probe)?,
                State::Win => break Outcome::Player,
                State::Lose => break Outcome::Enemy,
            };
        };

        log::info!("battle over after {} turns, winner: {:?}", self.turns, outcome);
        self.recorder.finish(self.handle, outcome)?;
        Ok(Summary {
            seed: self.handle.seed,
            player: (&self.player).into(),
            enemy: (&self.enemy).into(),
            outcome,
            turns: self.turns,
        })
    }

    fn map(&self) -> &'a memory::MemoryMap {
        &self.session.ctx.memory
    }

    fn set_up(&mut self) -> Result<State, crate::Error> {
        let ctx = self.session.ctx;
        let ws = self.session.workspace;

        let base = Save::load(&ctx.templates.base)?;
        let info = probe::load_trainer_info(self.session, &base, &self.player)?;
        self.battle_save = setup::set_up_battle_save(ctx, &base, &info, &self.enemy, &mut self.rng)?;
        let items = self.map().field(memory::ENEMY_TRAINER_ITEMS)?;
        self.items.copy_from_slice(info.get(items)?);
        log::info!("player items: {:02x?}", self.items);

        self.battle_save.write(&ws.battle_save())?;
        demo::encode_default(&[]).write(&ws.out_demo())?;
        Ok(State::AwaitBreakpoint)
    }

    fn await_breakpoint(&mut self) -> Result<State, crate::Error> {
        let ws = self.session.workspace;
        let total_clocks = save::total_clocks(&self.battle_save, self.map())?;
        let capture = if self.session.record {
            Some(ws.capture(self.segments))
        } else {
            None
        };
        self.segments += 1;

        self.battle_save = self.session.run(
            &ws.battle_save(),
            &ws.battle_save(),
            &breakpoint::battle_breakpoints(total_clocks),
            Some(&ws.out_demo()),
            capture.as_ref(),
        )?;
        Ok(State::Classify)
    }

    fn classify(&mut self) -> Result<State, crate::Error> {
        let (player, enemy) = save::battle_mons(&self.battle_save, self.map())?;
        self.snapshots = (player.into(), enemy.into());

        let pc = save::program_counter(&self.battle_save, self.map())?;
        log::info!("program counter: {:04x}", pc);
        Ok(match self.session.ctx.breakpoints.classify_battle(pc)? {
            BattleHalt::Win => State::Win,
            BattleHalt::Lose => State::Lose,
            BattleHalt::PartyMenu => State::ForceSwitch,
            BattleHalt::BattleMenu => State::MenuDecision,
        })
    }

    fn force_switch(&mut self) -> Result<State, crate::Error> {
        let probe = probe::decide(
            self.session,
            &self.battle_save,
            &self.session.ctx.templates.switch,
            &self.player,
            &mut self.rng,
            None,
        )?;
        let target = probe.get_u8(self.map().field(memory::CUR_PARTY_MON)?)?;
        let current = save::current_pokemon_index(&self.battle_save, self.map())?;
        log::info!("forced switch from {} to {}", current, target);
        self.commit(TurnKind::ForceSwitch, target, demo::choose_pokemon(current, target))
    }

    fn menu_decision(&mut self) -> Result<State, crate::Error> {
        let probe = probe::decide(
            self.session,
            &self.battle_save,
            &self.session.ctx.templates.ai,
            &self.player,
            &mut self.rng,
            Some(self.items),
        )?;
        let pc = save::program_counter(&probe, self.map())?;
        log::info!("ai program counter: {:04x}", pc);
        Ok(match self.session.ctx.breakpoints.classify_probe(pc)? {
            ProbeHalt::Item(item) => State::ItemChosen { item },
            ProbeHalt::Switch => State::SwitchChosen { probe },
            ProbeHalt::Move | ProbeHalt::Load => State::MoveChosen { probe },
        })
    }

    fn item_chosen(&mut self, item: u8) -> Result<State, crate::Error> {
        let map = self.map();
        let slot = self
            .items
            .iter()
            .position(|&i| i == item)
            .ok_or(crate::Error::ItemNotInPool(item))?;
        self.items[slot] = 0;

        // The bag holds exactly the item the AI asked for, so using it needs no bag navigation.
        self.battle_save.set(map.field(memory::NUM_ITEMS)?, &[1])?;
        self.battle_save.set(map.field(memory::ITEMS)?, &[item, 1, 0xff])?;
        self.battle_save.write(&self.session.workspace.battle_save())?;

        let target = self.battle_save.get_u8(map.field(memory::CUR_PARTY_MON)?)?;
        let current = save::current_pokemon_index(&self.battle_save, map)?;
        log::info!("ai uses item {:02x} on {}, items left: {:02x?}", item, target, self.items);
        self.commit(TurnKind::Item, item, demo::select_item(current, target))
    }

    fn switch_chosen(&mut self, probe: &Save) -> Result<State, crate::Error> {
        // The switch index is one-based.
        let index = probe.get_u8(self.map().field(memory::ENEMY_SWITCH_MON_INDEX)?)?;
        let target = index.checked_sub(1).ok_or(crate::Error::InvalidSwitchIndex(index))?;
        let current = save::current_pokemon_index(&self.battle_save, self.map())?;
        log::info!("ai switches from {} to {}", current, target);
        self.commit(
            TurnKind::Switch,
            target,
            demo::select_switch() + demo::choose_pokemon(current, target),
        )
    }

    fn move_chosen(&mut self, probe: &Save) -> Result<State, crate::Error> {
        let map = self.map();
        let slot = probe.get_u8(map.field(memory::CUR_ENEMY_MOVE_NUM)?)?;
        let current = self.battle_save.get_u8(map.field(memory::CUR_MOVE_NUM)?)?;
        let move_id = *self
            .battle_save
            .get(map.field(memory::BATTLE_MON_MOVES)?)?
            .get(slot as usize)
            .ok_or(crate::Error::MoveSlotOutOfRange(slot))?;
        log::info!("ai picks move slot {} ({:02x})", slot, move_id);
        self.commit(TurnKind::Move, move_id, demo::select_move(current, slot))
    }

    fn commit(&mut self, kind: TurnKind, detail: u8, demo: demo::Demo) -> Result<State, crate::Error> {
        let (player, enemy) = self.snapshots;
        self.recorder.record_turn(&self.handle, kind, detail, player, enemy)?;
        demo.write(&self.session.workspace.out_demo())?;
        self.turns += 1;
        Ok(State::AwaitBreakpoint)
    }
}
