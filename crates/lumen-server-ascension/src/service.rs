// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use lumen_game_core::{
	generate_floor_monster, resolve_turn, resolve_victory_rewards, AttackType, CombatState,
	FloorMonster, PartyPower, PlayerId, RandomSource, ResourceCost, ThreadRandom, TunablesSource,
	TurnOutcome, TurnResult, VictoryRewards,
};
use lumen_server_audit::{AuditEventPayload, EventBus};
use lumen_server_db::{
	fetch_player, get_or_create_progress, grant_rewards, grant_tokens, log_transaction,
	record_defeat, record_victory, spend_resources, AscensionProgress, AscensionRepository, DbError,
	LeaderboardEntry, SpendOutcome,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{AscensionError, Result};
use crate::power::PowerCalculator;

pub const SPEND_TRANSACTION: &str = "ascension_spend";
pub const REWARD_TRANSACTION: &str = "ascension_reward";

/// One floor fight. Held by the caller between turns; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encounter {
	pub player_id: PlayerId,
	pub monster: FloorMonster,
	pub party: PartyPower,
	pub state: CombatState,
}

impl Encounter {
	pub fn floor(&self) -> u32 {
		self.state.floor
	}

	pub fn is_finished(&self) -> bool {
		self.state.is_finished()
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackOutcome {
	pub turn: TurnResult,
	pub costs: ResourceCost,
	/// Present only on the winning turn.
	pub rewards: Option<VictoryRewards>,
	/// The victory raised the player's highest floor.
	pub is_record: bool,
	pub progress: AscensionProgress,
}

struct AuditTarget {
	bus: EventBus,
	event_name: String,
}

pub struct AscensionService {
	pool: SqlitePool,
	progress: AscensionRepository,
	tunables: Arc<dyn TunablesSource>,
	power: Arc<dyn PowerCalculator>,
	rng: Arc<dyn RandomSource>,
	audit: Option<AuditTarget>,
}

impl AscensionService {
	pub fn new(
		pool: SqlitePool,
		tunables: Arc<dyn TunablesSource>,
		power: Arc<dyn PowerCalculator>,
	) -> Self {
		Self {
			progress: AscensionRepository::new(pool.clone()),
			pool,
			tunables,
			power,
			rng: Arc::new(ThreadRandom::new()),
			audit: None,
		}
	}

	pub fn with_rng(mut self, rng: Arc<dyn RandomSource>) -> Self {
		self.rng = rng;
		self
	}

	/// Publishes an audit event on `bus` after every committed turn.
	pub fn with_audit(mut self, bus: EventBus, event_name: impl Into<String>) -> Self {
		self.audit = Some(AuditTarget {
			bus,
			event_name: event_name.into(),
		});
		self
	}

	async fn ensure_player(&self, player_id: PlayerId) -> Result<()> {
		let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
		fetch_player(&mut conn, player_id)
			.await?
			.map(|_| ())
			.ok_or_else(|| AscensionError::NotFound(format!("player {player_id}")))
	}

	/// The player's progress, created on first access.
	#[tracing::instrument(skip(self), fields(player_id = %player_id))]
	pub async fn progress(&self, player_id: PlayerId) -> Result<AscensionProgress> {
		self.ensure_player(player_id).await?;
		Ok(self.progress.get_or_create(player_id).await?)
	}

	/// Starts a fight on the player's current floor with full HP and empty
	/// gauge and momentum.
	#[tracing::instrument(skip(self), fields(player_id = %player_id))]
	pub async fn start_floor(&self, player_id: PlayerId) -> Result<Encounter> {
		let progress = self.progress(player_id).await?;
		let party = self.power.party_power(player_id).await?;
		let tunables = self.tunables.snapshot();

		let monster = generate_floor_monster(
			progress.current_floor,
			&tunables.ascension.monsters,
			self.rng.as_ref(),
		);
		let player_max_hp = tunables.ascension.player_max_hp(party.defense);
		let state = CombatState::new(&monster, player_max_hp);

		debug!(
			floor = state.floor,
			monster = %monster.name,
			monster_hp = monster.hp,
			player_max_hp,
			"encounter started"
		);

		Ok(Encounter {
			player_id,
			monster,
			party,
			state,
		})
	}

	/// Resolves one attack turn.
	///
	/// Resource deduction, the transaction log, and on victory every reward
	/// and the progress update commit together or not at all. `encounter` is
	/// only updated after the commit succeeds.
	#[tracing::instrument(skip(self, encounter), fields(player_id = %player_id, floor = encounter.floor()))]
	pub async fn attack(
		&self,
		player_id: PlayerId,
		encounter: &mut Encounter,
		attack: AttackType,
	) -> Result<AttackOutcome> {
		if encounter.player_id != player_id {
			return Err(AscensionError::EncounterMismatch {
				owner: encounter.player_id,
				player: player_id,
			});
		}
		if encounter.is_finished() {
			return Err(AscensionError::EncounterFinished {
				floor: encounter.floor(),
			});
		}

		let started = Instant::now();
		let tunables = self.tunables.snapshot();
		let costs = tunables.ascension.costs.for_attack(attack);
		let floor = encounter.floor();

		let mut tx = self.pool.begin().await.map_err(DbError::from)?;

		let spent = spend_resources(&mut tx, player_id, &costs).await?;
		if let SpendOutcome::Insufficient(shortfall) = spent {
			tx.rollback().await.map_err(DbError::from)?;
			return Err(shortfall.into());
		}

		let turn = resolve_turn(
			&encounter.state,
			attack,
			&encounter.party,
			&encounter.monster,
			&tunables.ascension,
			self.rng.as_ref(),
		);

		let spend_details = json!({
			"floor": floor,
			"attack": attack,
			"stamina": costs.stamina,
			"lumenite": costs.lumenite,
			"damage": turn.damage_dealt,
			"critical": turn.is_critical,
			"retaliation": turn.retaliation_damage,
			"outcome": turn.outcome,
		});
		log_transaction(&mut tx, player_id, SPEND_TRANSACTION, &spend_details, Some("ascension")).await?;
		let mut audit_events = vec![(SPEND_TRANSACTION, spend_details)];

		let mut rewards = None;
		let mut is_record = false;
		let progress = match turn.outcome {
			TurnOutcome::Victory => {
				let won = resolve_victory_rewards(floor, &tunables.ascension.rewards, self.rng.as_ref());
				let totals = won.totals();

				grant_rewards(&mut tx, player_id, &totals).await?;
				for grant in &totals.tokens {
					grant_tokens(&mut tx, player_id, grant.tier, grant.quantity).await?;
				}
				let record = record_victory(&mut tx, player_id, floor, Utc::now()).await?;

				let reward_details = json!({
					"floor": floor,
					"lumees": totals.lumees,
					"lumenite": totals.lumenite,
					"experience": totals.experience,
					"tokens": totals.tokens,
					"milestone": won.is_milestone(),
					"is_record": record.is_record,
				});
				log_transaction(&mut tx, player_id, REWARD_TRANSACTION, &reward_details, Some("ascension"))
					.await?;
				audit_events.push((REWARD_TRANSACTION, reward_details));

				is_record = record.is_record;
				rewards = Some(won);
				record.progress
			}
			TurnOutcome::Defeat => record_defeat(&mut tx, player_id).await?,
			TurnOutcome::Ongoing => get_or_create_progress(&mut tx, player_id).await?,
		};

		tx.commit().await.map_err(DbError::from)?;
		encounter.state = turn.state;

		match turn.outcome {
			TurnOutcome::Victory => info!(
				floor,
				turns = turn.state.turns_taken,
				is_record,
				"floor cleared"
			),
			TurnOutcome::Defeat => info!(floor, turns = turn.state.turns_taken, "party defeated"),
			TurnOutcome::Ongoing => debug!(
				damage = turn.damage_dealt,
				monster_hp = turn.state.monster_hp,
				player_hp = turn.state.player_hp,
				"turn resolved"
			),
		}

		self
			.publish_audit(player_id, audit_events, started.elapsed().as_millis() as i64)
			.await;

		Ok(AttackOutcome {
			turn,
			costs,
			rewards,
			is_record,
			progress,
		})
	}

	/// [`Self::attack`] with the attack type given as text (`x1`, `x3`, `x10`).
	pub async fn attack_named(
		&self,
		player_id: PlayerId,
		encounter: &mut Encounter,
		attack: &str,
	) -> Result<AttackOutcome> {
		let attack: AttackType = attack.parse()?;
		self.attack(player_id, encounter, attack).await
	}

	/// Top climbers by highest floor, then total victories.
	pub async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardEntry>> {
		Ok(self.progress.top_climbers(limit).await?)
	}

	async fn publish_audit(&self, player_id: PlayerId, events: Vec<(&str, Value)>, duration_ms: i64) {
		let Some(audit) = &self.audit else {
			return;
		};
		for (transaction_type, details) in events {
			AuditEventPayload::new(player_id.get(), transaction_type)
				.with_details(details)
				.with_context("ascension")
				.with_metadata("duration_ms", json!(duration_ms))
				.publish(&audit.bus, &audit.event_name)
				.await;
		}
	}
}
