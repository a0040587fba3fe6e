//! Operation identifiers
//!
//! An [`OperationId`] names an intended action so that repeated calls by
//! different owners can be recognised as the same action. It is the BLAKE3
//! digest of the call signature followed by the bincode encoding of the
//! canonicalised arguments, so identical calls always collide and any change
//! to the selector or an argument yields a different id.
//!
//! Arguments are first converted to a `serde_json::Value`, whose maps keep
//! their keys sorted. Equal `HashMap`s therefore encode identically whatever
//! their iteration order. Sequences keep their order, so unordered sets must
//! be passed as `BTreeSet` (or sorted) to share an id.

use crate::error::{MultiownedError, Result};
use crate::types::address::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Digest size in bytes (BLAKE3 output)
pub const OPERATION_ID_LEN: usize = 32;

/// Deterministic identifier of an intended action
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OperationId([u8; OPERATION_ID_LEN]);

impl OperationId {
    /// Digest a call: `signature` is the selector, e.g. `"withdraw(address,uint256)"`
    ///
    /// Fails if `args` has no JSON form, such as a map with non-string keys.
    pub fn for_call<A: Serialize + ?Sized>(signature: &str, args: &A) -> Result<Self> {
        let canonical = serde_json::to_value(args)?;
        let encoded = bincode::serialize(&canonical)?;

        let mut hasher = blake3::Hasher::new();
        hasher.update(&(signature.len() as u64).to_le_bytes());
        hasher.update(signature.as_bytes());
        hasher.update(&encoded);
        Ok(Self(*hasher.finalize().as_bytes()))
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps logs readable
        write!(f, "OperationId(0x{}..)", hex::encode(&self.0[..6]))
    }
}

impl FromStr for OperationId {
    type Err = MultiownedError;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s.trim().trim_start_matches("0x");
        let mut bytes = [0u8; OPERATION_ID_LEN];
        hex::decode_to_slice(digits, &mut bytes)?;
        Ok(Self(bytes))
    }
}

/// Quorum-gated changes to the owner set or threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminAction {
    AddOwner { owner: Address },
    RemoveOwner { owner: Address },
    ChangeOwner { from: Address, to: Address },
    ChangeRequirement { required: usize },
}

impl AdminAction {
    /// Call signature used as the selector of this action's id
    pub fn signature(&self) -> &'static str {
        match self {
            AdminAction::AddOwner { .. } => "addOwner(address)",
            AdminAction::RemoveOwner { .. } => "removeOwner(address)",
            AdminAction::ChangeOwner { .. } => "changeOwner(address,address)",
            AdminAction::ChangeRequirement { .. } => "changeRequirement(uint256)",
        }
    }

    /// Self-describing id under which owners confirm this action
    pub fn operation_id(&self) -> Result<OperationId> {
        match self {
            AdminAction::AddOwner { owner } | AdminAction::RemoveOwner { owner } => {
                OperationId::for_call(self.signature(), owner)
            }
            AdminAction::ChangeOwner { from, to } => {
                OperationId::for_call(self.signature(), &(from, to))
            }
            AdminAction::ChangeRequirement { required } => {
                OperationId::for_call(self.signature(), &(*required as u64))
            }
        }
    }
}
