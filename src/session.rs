use std::collections::HashMap;

use tracing::{info, warn};

use crate::bracket::BracketData;
use crate::config::now_ms;
use crate::engine::{self, PickRng};
use crate::error::PicksError;
use crate::store::BracketStore;

/// One user's picks for one tournament. A fresh session starts from the
/// seed bracket; a restored one carries whatever snapshot was persisted,
/// including its lock state.
#[derive(Clone, Debug)]
pub struct BracketSession {
    bracket: BracketData,
    locked: bool,
}

impl BracketSession {
    pub fn fresh(seed: &BracketData) -> Self {
        BracketSession {
            bracket: seed.clone(),
            locked: false,
        }
    }

    pub fn restore(snapshot: BracketData) -> Self {
        let locked = snapshot.locked();
        BracketSession {
            bracket: snapshot,
            locked,
        }
    }

    pub fn bracket(&self) -> &BracketData {
        &self.bracket
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_complete(&self) -> bool {
        engine::is_bracket_complete(&self.bracket)
    }

    pub fn select(
        &mut self,
        round_index: usize,
        match_id: &str,
        selected_name: &str,
    ) -> Result<&BracketData, PicksError> {
        if self.locked {
            return Err(PicksError::SessionLocked);
        }
        self.bracket = engine::apply_selection(&self.bracket, round_index, match_id, selected_name)?;
        Ok(&self.bracket)
    }
}

/// Keeps every live session and the persistence gateway behind one lock.
pub struct PicksService<S: BracketStore> {
    store: S,
    seed: BracketData,
    rng: PickRng,
    sessions: HashMap<(String, String), BracketSession>,
}

impl<S: BracketStore> PicksService<S> {
    /// `rng_seed` of 0 derives a seed from the clock, anything else makes
    /// auto-pick reproducible.
    pub fn new(store: S, seed: BracketData, rng_seed: u64) -> Self {
        let rng_seed = if rng_seed == 0 { now_ms() } else { rng_seed };
        PicksService {
            store,
            seed,
            rng: PickRng::new(rng_seed),
            sessions: HashMap::new(),
        }
    }

    fn session_key(user_id: &str, tournament_id: &str) -> (String, String) {
        (user_id.to_string(), tournament_id.to_string())
    }

    async fn ensure_session(
        &mut self,
        user_id: &str,
        tournament_id: &str,
    ) -> Result<(), PicksError> {
        let key = Self::session_key(user_id, tournament_id);
        if self.sessions.contains_key(&key) {
            return Ok(());
        }
        let session = match self.store.load_bracket(user_id, tournament_id).await? {
            Some(snapshot) => {
                info!("restored picks for {user_id} in {tournament_id}");
                BracketSession::restore(snapshot)
            }
            None => BracketSession::fresh(&self.seed),
        };
        self.sessions.insert(key, session);
        Ok(())
    }

    fn session_mut(
        &mut self,
        user_id: &str,
        tournament_id: &str,
    ) -> Result<&mut BracketSession, PicksError> {
        self.sessions
            .get_mut(&Self::session_key(user_id, tournament_id))
            .ok_or_else(|| PicksError::Persistence("session failed to initialize".to_string()))
    }

    /// Open (or resume) the session and return its current bracket.
    pub async fn open(
        &mut self,
        user_id: &str,
        tournament_id: &str,
    ) -> Result<BracketData, PicksError> {
        self.ensure_session(user_id, tournament_id).await?;
        Ok(self.session_mut(user_id, tournament_id)?.bracket().clone())
    }

    pub async fn select(
        &mut self,
        user_id: &str,
        tournament_id: &str,
        round_index: usize,
        match_id: &str,
        selected_name: &str,
    ) -> Result<BracketData, PicksError> {
        self.ensure_session(user_id, tournament_id).await?;
        let session = self.session_mut(user_id, tournament_id)?;
        Ok(session.select(round_index, match_id, selected_name)?.clone())
    }

    /// Replace the session's picks with a random full bracket built from
    /// the seed. Existing picks are discarded.
    pub async fn auto_pick(
        &mut self,
        user_id: &str,
        tournament_id: &str,
    ) -> Result<BracketData, PicksError> {
        self.ensure_session(user_id, tournament_id).await?;
        if self.session_mut(user_id, tournament_id)?.is_locked() {
            return Err(PicksError::SessionLocked);
        }
        let picked = engine::auto_pick(&self.seed.clone(), &mut self.rng);
        let session = self.session_mut(user_id, tournament_id)?;
        session.bracket = picked;
        Ok(session.bracket.clone())
    }

    /// Finalize the picks. Only a complete bracket locks, and the session
    /// only flips after the snapshot is persisted.
    pub async fn lock(
        &mut self,
        user_id: &str,
        tournament_id: &str,
    ) -> Result<BracketData, PicksError> {
        self.ensure_session(user_id, tournament_id).await?;
        let session = self.session_mut(user_id, tournament_id)?;
        if session.is_locked() {
            return Err(PicksError::SessionLocked);
        }
        if !session.is_complete() {
            return Err(PicksError::IncompleteBracket);
        }
        let mut candidate = session.bracket.clone();
        candidate.is_locked = Some(true);

        match self.store.save_bracket(user_id, tournament_id, &candidate).await {
            Ok(()) => {
                let session = self.session_mut(user_id, tournament_id)?;
                session.bracket = candidate.clone();
                session.locked = true;
                info!("locked picks for {user_id} in {tournament_id}");
                Ok(candidate)
            }
            Err(e) => {
                warn!("lock failed for {user_id} in {tournament_id}: {e}");
                Err(e)
            }
        }
    }
}
