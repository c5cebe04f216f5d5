//! Governance (DAO)
//!
//! Proposals, votes, quorum evaluation, and the quorum-gated seal that
//! optionally anchors the governance outcome to the ledger as a signed
//! `seal` block. One vote per voter; sealed proposals are immutable.

use chrono::Utc;
use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::block::{build_block, BlockEnvelope, BlockType};
use crate::crypto::did::encode_did;
use crate::crypto::keys::public_key_bytes;
use crate::error::DaoError;
use crate::ledger::Ledger;

/// A single vote choice. Only `Yes` counts toward quorum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    Yes,
    No,
    Abstain,
}

/// Quorum basis, fixed per proposal at creation.
///
/// Both readings of the rule are supported: an absolute count of yes votes,
/// or a fraction of a configured voter population. The fractional comparison
/// uses integer cross-multiplication, so no floating point is involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuorumRule {
    Absolute {
        yes_required: usize,
    },
    Fraction {
        numerator: usize,
        denominator: usize,
        electorate: usize,
    },
}

impl QuorumRule {
    pub fn absolute(yes_required: usize) -> Self {
        Self::Absolute { yes_required }
    }

    pub fn fraction(numerator: usize, denominator: usize, electorate: usize) -> Self {
        Self::Fraction {
            numerator,
            denominator,
            electorate,
        }
    }

    /// Whether `yes_votes` satisfies this rule.
    fn is_met(&self, yes_votes: usize) -> bool {
        match *self {
            Self::Absolute { yes_required } => yes_votes >= yes_required,
            Self::Fraction {
                numerator,
                denominator,
                electorate,
            } => yes_votes * denominator >= numerator * electorate,
        }
    }

    /// Human-readable requirement, used in quorum errors.
    fn describe(&self) -> String {
        match *self {
            Self::Absolute { yes_required } => format!("{} yes votes", yes_required),
            Self::Fraction {
                numerator,
                denominator,
                electorate,
            } => format!("{}/{} of {} voters", numerator, denominator, electorate),
        }
    }
}

/// Lifecycle status of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Open,
    Sealed,
}

/// A governance proposal accumulating votes until it is sealed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: String,
    pub title: String,
    pub description: String,
    pub proposer: String,
    pub quorum: QuorumRule,
    pub votes: BTreeMap<String, VoteChoice>,
    pub status: ProposalStatus,
    pub created_at: i64,
}

impl Proposal {
    pub fn is_sealed(&self) -> bool {
        self.status == ProposalStatus::Sealed
    }

    /// Number of yes votes cast so far.
    pub fn yes_votes(&self) -> usize {
        self.votes
            .values()
            .filter(|v| **v == VoteChoice::Yes)
            .count()
    }
}

/// Fields supplied by the caller when creating a proposal.
#[derive(Debug, Clone)]
pub struct ProposalDraft {
    pub id: String,
    pub title: String,
    pub description: String,
    pub proposer: String,
}

/// Signing identity plus ledger used to anchor seal outcomes.
struct SealAnchor {
    signing_key: SigningKey,
    ledger: Ledger,
}

/// The governance engine: proposals, votes, quorum, sealing.
///
/// Single logical writer, like the ledger: mutating operations take
/// `&mut self`.
pub struct Dao {
    proposals: HashMap<String, Proposal>,
    default_quorum: QuorumRule,
    anchor: Option<SealAnchor>,
}

impl Dao {
    /// Create a DAO with a default quorum rule for new proposals.
    pub fn new(default_quorum: QuorumRule) -> Self {
        Self {
            proposals: HashMap::new(),
            default_quorum,
            anchor: None,
        }
    }

    /// Configure a signing identity and ledger; every successful seal will
    /// then append a `seal` block through them.
    pub fn with_anchor(mut self, signing_key: SigningKey, ledger: Ledger) -> Self {
        self.anchor = Some(SealAnchor {
            signing_key,
            ledger,
        });
        self
    }

    /// The anchoring ledger, if one is configured.
    pub fn ledger(&self) -> Option<&Ledger> {
        self.anchor.as_ref().map(|a| &a.ledger)
    }

    /// Create a proposal under the DAO's default quorum rule.
    pub fn create_proposal(&mut self, draft: ProposalDraft) -> Result<&Proposal, DaoError> {
        let quorum = self.default_quorum;
        self.create_proposal_with_quorum(draft, quorum)
    }

    /// Create a proposal with an explicit quorum rule, fixed for its lifetime.
    pub fn create_proposal_with_quorum(
        &mut self,
        draft: ProposalDraft,
        quorum: QuorumRule,
    ) -> Result<&Proposal, DaoError> {
        if self.proposals.contains_key(&draft.id) {
            return Err(DaoError::DuplicateProposal(draft.id));
        }

        let proposal = Proposal {
            id: draft.id.clone(),
            title: draft.title,
            description: draft.description,
            proposer: draft.proposer,
            quorum,
            votes: BTreeMap::new(),
            status: ProposalStatus::Open,
            created_at: Utc::now().timestamp_millis(),
        };
        info!(id = %proposal.id, "proposal created");
        Ok(self.proposals.entry(draft.id).or_insert(proposal))
    }

    /// Cast a vote. A voter may vote at most once per proposal, and sealed
    /// proposals accept no further votes.
    pub fn vote(
        &mut self,
        proposal_id: &str,
        voter: &str,
        choice: VoteChoice,
    ) -> Result<&Proposal, DaoError> {
        let proposal = self
            .proposals
            .get_mut(proposal_id)
            .ok_or_else(|| DaoError::UnknownProposal(proposal_id.to_string()))?;

        if proposal.is_sealed() {
            return Err(DaoError::AlreadySealed(proposal_id.to_string()));
        }
        if proposal.votes.contains_key(voter) {
            return Err(DaoError::DuplicateVote {
                id: proposal_id.to_string(),
                voter: voter.to_string(),
            });
        }

        proposal.votes.insert(voter.to_string(), choice);
        debug!(id = proposal_id, voter, ?choice, "vote recorded");
        Ok(proposal)
    }

    /// Evaluate the proposal's quorum rule without mutating any state.
    pub fn assert_quorum(&self, proposal_id: &str) -> Result<(), DaoError> {
        let proposal = self.get_proposal(proposal_id)?;
        let yes_votes = proposal.yes_votes();
        if !proposal.quorum.is_met(yes_votes) {
            return Err(DaoError::QuorumNotMet {
                id: proposal_id.to_string(),
                yes_votes,
                required: proposal.quorum.describe(),
            });
        }
        Ok(())
    }

    /// Seal a proposal: quorum is enforced first, then the outcome is
    /// anchored to the ledger (when configured), then the proposal is marked
    /// sealed. The anchor append and the status change are atomic — if the
    /// append fails the proposal stays open.
    pub fn seal(&mut self, proposal_id: &str) -> Result<&Proposal, DaoError> {
        if self.get_proposal(proposal_id)?.is_sealed() {
            return Err(DaoError::AlreadySealed(proposal_id.to_string()));
        }
        self.assert_quorum(proposal_id)?;

        if let Some(anchor) = &mut self.anchor {
            let ts = Utc::now().timestamp_millis();
            let issuer = encode_did(&public_key_bytes(&anchor.signing_key));
            let envelope = BlockEnvelope::new(
                BlockType::Seal,
                "dao.seal".to_string(),
                json!({ "proposal_id": proposal_id }),
                anchor.ledger.tip().to_string(),
                format!("seal-{}-{}", proposal_id, ts),
                ts,
                issuer,
            );
            let block = build_block(envelope, &anchor.signing_key)?;
            anchor.ledger.append(block)?;
        }

        let proposal = self
            .proposals
            .get_mut(proposal_id)
            .ok_or_else(|| DaoError::UnknownProposal(proposal_id.to_string()))?;
        proposal.status = ProposalStatus::Sealed;
        info!(id = proposal_id, "proposal sealed");
        Ok(proposal)
    }

    /// Look up a proposal by id.
    pub fn get_proposal(&self, proposal_id: &str) -> Result<&Proposal, DaoError> {
        self.proposals
            .get(proposal_id)
            .ok_or_else(|| DaoError::UnknownProposal(proposal_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::generate_keypair;
    use crate::ledger::{Ledger, MemoryLedgerStore};

    fn draft(id: &str) -> ProposalDraft {
        ProposalDraft {
            id: id.to_string(),
            title: "Test".to_string(),
            description: "desc".to_string(),
            proposer: "alice".to_string(),
        }
    }

    fn dao_with_quorum(required: usize) -> Dao {
        Dao::new(QuorumRule::absolute(required))
    }

    #[test]
    fn test_create_proposal_rejects_duplicate_id() {
        let mut dao = dao_with_quorum(1);
        dao.create_proposal(draft("p1")).unwrap();
        assert!(matches!(
            dao.create_proposal(draft("p1")).unwrap_err(),
            DaoError::DuplicateProposal(_)
        ));
    }

    #[test]
    fn test_quorum_fails_then_passes() {
        let mut dao = dao_with_quorum(2);
        dao.create_proposal(draft("p1")).unwrap();

        dao.vote("p1", "alice", VoteChoice::Yes).unwrap();
        assert!(matches!(
            dao.assert_quorum("p1").unwrap_err(),
            DaoError::QuorumNotMet { yes_votes: 1, .. }
        ));

        dao.vote("p1", "bob", VoteChoice::Yes).unwrap();
        dao.assert_quorum("p1").unwrap();
    }

    #[test]
    fn test_only_yes_votes_count() {
        let mut dao = dao_with_quorum(2);
        dao.create_proposal(draft("p1")).unwrap();
        dao.vote("p1", "alice", VoteChoice::Yes).unwrap();
        dao.vote("p1", "bob", VoteChoice::No).unwrap();
        dao.vote("p1", "carol", VoteChoice::Abstain).unwrap();

        assert!(dao.assert_quorum("p1").is_err());
    }

    #[test]
    fn test_fractional_quorum() {
        // 2/3 of 3 voters = 2 yes votes required.
        let mut dao = Dao::new(QuorumRule::fraction(2, 3, 3));
        dao.create_proposal(draft("p1")).unwrap();

        dao.vote("p1", "alice", VoteChoice::Yes).unwrap();
        assert!(dao.assert_quorum("p1").is_err());

        dao.vote("p1", "bob", VoteChoice::Yes).unwrap();
        dao.assert_quorum("p1").unwrap();
    }

    #[test]
    fn test_duplicate_vote_rejected() {
        let mut dao = dao_with_quorum(2);
        dao.create_proposal(draft("p1")).unwrap();
        dao.vote("p1", "alice", VoteChoice::Yes).unwrap();

        assert!(matches!(
            dao.vote("p1", "alice", VoteChoice::No).unwrap_err(),
            DaoError::DuplicateVote { .. }
        ));
        // The original vote is untouched.
        assert_eq!(dao.get_proposal("p1").unwrap().yes_votes(), 1);
    }

    #[test]
    fn test_vote_on_unknown_proposal() {
        let mut dao = dao_with_quorum(1);
        assert!(matches!(
            dao.vote("nope", "alice", VoteChoice::Yes).unwrap_err(),
            DaoError::UnknownProposal(_)
        ));
        assert!(matches!(
            dao.assert_quorum("nope").unwrap_err(),
            DaoError::UnknownProposal(_)
        ));
    }

    #[test]
    fn test_seal_gated_by_quorum() {
        let mut dao = dao_with_quorum(2);
        dao.create_proposal(draft("p1")).unwrap();
        dao.vote("p1", "alice", VoteChoice::Yes).unwrap();

        assert!(matches!(
            dao.seal("p1").unwrap_err(),
            DaoError::QuorumNotMet { .. }
        ));
        assert!(!dao.get_proposal("p1").unwrap().is_sealed());

        dao.vote("p1", "bob", VoteChoice::Yes).unwrap();
        let sealed = dao.seal("p1").unwrap();
        assert!(sealed.is_sealed());
    }

    #[test]
    fn test_vote_after_seal_rejected() {
        let mut dao = dao_with_quorum(1);
        dao.create_proposal(draft("p1")).unwrap();
        dao.vote("p1", "alice", VoteChoice::Yes).unwrap();
        dao.seal("p1").unwrap();

        assert!(matches!(
            dao.vote("p1", "charlie", VoteChoice::Yes).unwrap_err(),
            DaoError::AlreadySealed(_)
        ));
    }

    #[test]
    fn test_reseal_is_an_error() {
        let mut dao = dao_with_quorum(0);
        dao.create_proposal(draft("p1")).unwrap();
        dao.seal("p1").unwrap();

        assert!(matches!(
            dao.seal("p1").unwrap_err(),
            DaoError::AlreadySealed(_)
        ));
    }

    #[test]
    fn test_zero_quorum_seals_with_no_votes() {
        let mut dao = dao_with_quorum(0);
        dao.create_proposal(draft("p1")).unwrap();
        dao.assert_quorum("p1").unwrap();
        assert!(dao.seal("p1").unwrap().is_sealed());
    }

    #[test]
    fn test_seal_anchors_block_to_ledger() {
        let sk = generate_keypair();
        let ledger = Ledger::open(Box::new(MemoryLedgerStore::new())).unwrap();
        let mut dao = Dao::new(QuorumRule::absolute(1)).with_anchor(sk, ledger);

        dao.create_proposal(draft("p1")).unwrap();
        dao.vote("p1", "alice", VoteChoice::Yes).unwrap();
        dao.seal("p1").unwrap();

        let ledger = dao.ledger().unwrap();
        assert_eq!(ledger.len(), 1);
        let block = &ledger.blocks()[0];
        assert_eq!(block.block_type, BlockType::Seal);
        assert_eq!(block.action, "dao.seal");
        assert_eq!(block.data["proposal_id"], "p1");
        assert_eq!(block.prev, crate::block::GENESIS_PREV);
        ledger.verify_chain().unwrap();
    }

    #[test]
    fn test_failed_anchor_append_leaves_proposal_open() {
        use crate::block::Block;
        use crate::ledger::LedgerStore;

        struct BrokenStore;
        impl LedgerStore for BrokenStore {
            fn append(&mut self, _block: &Block) -> anyhow::Result<()> {
                Err(anyhow::anyhow!("disk full"))
            }
            fn load_all(&self) -> anyhow::Result<Vec<Block>> {
                Ok(vec![])
            }
        }

        let sk = generate_keypair();
        let ledger = Ledger::open(Box::new(BrokenStore)).unwrap();
        let mut dao = Dao::new(QuorumRule::absolute(0)).with_anchor(sk, ledger);

        dao.create_proposal(draft("p1")).unwrap();
        assert!(matches!(dao.seal("p1").unwrap_err(), DaoError::Ledger(_)));

        // Sealed flag and ledger state must not diverge.
        assert!(!dao.get_proposal("p1").unwrap().is_sealed());
        assert!(dao.ledger().unwrap().is_empty());
    }

    #[test]
    fn test_second_seal_links_to_first() {
        let sk = generate_keypair();
        let ledger = Ledger::open(Box::new(MemoryLedgerStore::new())).unwrap();
        let mut dao = Dao::new(QuorumRule::absolute(0)).with_anchor(sk, ledger);

        dao.create_proposal(draft("p1")).unwrap();
        dao.create_proposal(draft("p2")).unwrap();
        dao.seal("p1").unwrap();
        dao.seal("p2").unwrap();

        let ledger = dao.ledger().unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.blocks()[1].prev, ledger.blocks()[0].hash);
        ledger.verify_chain().unwrap();
    }
}
