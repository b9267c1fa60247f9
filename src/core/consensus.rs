//! Longest valid chain wins.

use crate::core::{latest, validate_block, validate_chain, Block, Chain};
use crate::error::Result;
use log::{info, warn};

/// What the node should do with a chain received from a peer
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Local chain stays canonical
    Keep,
    /// Install this chain as the new canonical chain
    Replace(Chain),
    /// The peer sent only a tip we cannot attach; ask for its whole chain
    RequestFull,
}

/// Decide whether `candidate` should replace `local`.
///
/// Fails only when `local` is empty, which breaks the canonical-chain
/// invariant and must be treated as fatal by the caller.
pub fn resolve(local: &Chain, candidate: &[Block]) -> Result<Outcome> {
    let local_latest = local.latest()?;
    let Ok(candidate_latest) = latest(candidate) else {
        info!("Received a chain of length 0, ignoring");
        return Ok(Outcome::Keep);
    };

    if candidate_latest.get_index() <= local_latest.get_index() {
        info!(
            "Received chain tip {} is not ahead of local tip {}",
            candidate_latest.get_index(),
            local_latest.get_index()
        );
        return Ok(Outcome::Keep);
    }

    if candidate_latest.get_index() == local_latest.get_index() + 1
        && validate_block(candidate_latest, local_latest)
    {
        info!("Appending received block {candidate_latest}");
        return Ok(Outcome::Replace(local.append(candidate_latest.clone())));
    }

    if candidate.len() == 1 {
        info!("Received tip {candidate_latest} does not extend local chain, requesting full chain");
        return Ok(Outcome::RequestFull);
    }

    if validate_chain(candidate) && candidate.len() > local.len() {
        info!(
            "Replacing local chain of length {} with received chain of length {}",
            local.len(),
            candidate.len()
        );
        return Ok(Outcome::Replace(Chain::from_blocks(candidate.to_vec())?));
    }

    warn!("Received invalid or shorter chain, not replacing");
    Ok(Outcome::Keep)
}
