//! Adapter traits for the subkeys pallet
//!
//! The admin set and the actual emission of proxied operations live outside
//! the pallet. The runtime plugs them in through these traits.

use crate::types::ProxyOp;
use alloc::vec::Vec;
use core::marker::PhantomData;
use frame::prelude::*;
use polkadot_sdk::frame_support::traits::SortedMembers;

/// Read-only view of the accounts administering the proxy.
///
/// Admins bypass every subkey check and are the only accounts allowed to
/// grant allowances or permissions.
pub trait AdminList<AccountId> {
  fn is_admin(who: &AccountId) -> bool;

  fn admins() -> Vec<AccountId>;

  /// Whether the admin set can still be changed by its owners.
  fn is_mutable() -> bool;
}

/// Hands an admitted operation to the subsystem that performs it.
///
/// `proxy` is the account acting on behalf of the caller. An error aborts the
/// whole batch.
pub trait ProxyExecutor<AccountId, AssetId, Balance> {
  fn execute(
    proxy: &AccountId,
    origin: &AccountId,
    op: &ProxyOp<AccountId, AssetId, Balance>,
  ) -> DispatchResult;

  /// Upper bound on what `execute` costs for `op`, charged up front.
  fn weight(op: &ProxyOp<AccountId, AssetId, Balance>) -> Weight;
}

/// Admin list backed by any sorted member set, e.g. a membership pallet.
pub struct MembersAdminList<M, const MUTABLE: bool = true>(PhantomData<M>);

impl<AccountId: Ord, M: SortedMembers<AccountId>, const MUTABLE: bool> AdminList<AccountId>
  for MembersAdminList<M, MUTABLE>
{
  fn is_admin(who: &AccountId) -> bool {
    M::contains(who)
  }

  fn admins() -> Vec<AccountId> {
    M::sorted_members()
  }

  fn is_mutable() -> bool {
    MUTABLE
  }
}

/// Empty, frozen admin list. Nobody bypasses checks and nobody can grant.
impl<AccountId> AdminList<AccountId> for () {
  fn is_admin(_: &AccountId) -> bool {
    false
  }

  fn admins() -> Vec<AccountId> {
    Vec::new()
  }

  fn is_mutable() -> bool {
    false
  }
}

/// No-op executor for configurations that only track allowances.
impl<AccountId, AssetId, Balance> ProxyExecutor<AccountId, AssetId, Balance> for () {
  fn execute(_: &AccountId, _: &AccountId, _: &ProxyOp<AccountId, AssetId, Balance>) -> DispatchResult {
    Ok(())
  }

  fn weight(_: &ProxyOp<AccountId, AssetId, Balance>) -> Weight {
    Weight::zero()
  }
}
