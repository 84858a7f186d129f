//! Runtime API for reading subkey state and dry-running proxy operations.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::vec::Vec;
use codec::Codec;
use pallet_subkeys::types::{AdminListInfo, Allowance, Permissions, ProxyOp};
use polkadot_sdk::sp_runtime::DispatchError;

polkadot_sdk::sp_api::decl_runtime_apis! {
  pub trait SubkeysApi<AccountId, AssetId, Balance, BlockNumber, Moment>
  where
    AccountId: Codec,
    AssetId: Codec,
    Balance: Codec,
    BlockNumber: Codec,
    Moment: Codec,
  {
    /// Whether `sender` may run `op` through the proxy at the current block.
    fn can_execute(
      sender: AccountId,
      op: ProxyOp<AccountId, AssetId, Balance>,
    ) -> Result<bool, DispatchError>;

    fn allowance(
      spender: AccountId,
    ) -> Result<Allowance<AssetId, Balance, BlockNumber, Moment>, DispatchError>;

    fn permissions(spender: AccountId) -> Result<Permissions, DispatchError>;

    /// At most 30 entries per call, 10 when `limit` is omitted.
    fn all_allowances(
      start_after: Option<AccountId>,
      limit: Option<u32>,
    ) -> Result<Vec<(AccountId, Allowance<AssetId, Balance, BlockNumber, Moment>)>, DispatchError>;

    fn all_permissions(
      start_after: Option<AccountId>,
      limit: Option<u32>,
    ) -> Result<Vec<(AccountId, Permissions)>, DispatchError>;

    fn admin_list() -> AdminListInfo<AccountId>;
  }
}
