//! Records kept per subkey and the operations a proxy caller may submit.

use crate::{
  balance::{Coin, NativeBalance},
  expiration::Expiration,
};
use alloc::vec::Vec;
use frame::prelude::*;
use polkadot_sdk::sp_runtime::traits::Zero;

/// Upper bound on coins moved by a single send.
pub type MaxSendCoins = ConstU32<16>;

/// Upper bound on an opaque custom payload.
pub type MaxCustomPayload = ConstU32<256>;

/// Capability flags for non-transfer operations. Absent means all `false`.
#[derive(
  Clone,
  Copy,
  Debug,
  Default,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  PartialEq,
  TypeInfo,
  MaxEncodedLen,
)]
pub struct Permissions {
  pub delegate: bool,
  pub redelegate: bool,
  pub undelegate: bool,
  pub withdraw: bool,
}

/// Single capability flag, used to name what a denied operation lacked.
#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  PartialEq,
  TypeInfo,
  MaxEncodedLen,
)]
pub enum Permission {
  Delegate,
  Redelegate,
  Undelegate,
  Withdraw,
}

impl Permissions {
  pub fn allows(&self, permission: Permission) -> bool {
    match permission {
      Permission::Delegate => self.delegate,
      Permission::Redelegate => self.redelegate,
      Permission::Undelegate => self.undelegate,
      Permission::Withdraw => self.withdraw,
    }
  }
}

/// Spending budget of one subkey.
#[derive(
  Clone,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  PartialEq,
  TypeInfo,
  MaxEncodedLen,
)]
pub struct Allowance<AssetId, Balance, BlockNumber, Moment> {
  pub balance: NativeBalance<AssetId, Balance>,
  pub expires: Expiration<BlockNumber, Moment>,
}

/// The zero allowance: nothing to spend and expired from genesis on.
impl<AssetId, Balance, BlockNumber: Zero, Moment> Default
  for Allowance<AssetId, Balance, BlockNumber, Moment>
{
  fn default() -> Self {
    Self {
      balance: NativeBalance::default(),
      expires: Expiration::AtHeight(Zero::zero()),
    }
  }
}

#[derive(
  Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
)]
pub enum StakingOp<AccountId, AssetId, Balance> {
  Delegate {
    validator: AccountId,
    amount: Coin<AssetId, Balance>,
  },
  Undelegate {
    validator: AccountId,
    amount: Coin<AssetId, Balance>,
  },
  Redelegate {
    src_validator: AccountId,
    dst_validator: AccountId,
    amount: Coin<AssetId, Balance>,
  },
}

#[derive(
  Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
)]
pub enum DistributionOp<AccountId> {
  SetWithdrawAddress { address: AccountId },
  WithdrawDelegatorReward { validator: AccountId },
}

/// Operation the proxy account performs on behalf of a caller.
#[derive(
  Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
)]
pub enum ProxyOp<AccountId, AssetId, Balance> {
  BankSend {
    to: AccountId,
    amount: BoundedVec<Coin<AssetId, Balance>, MaxSendCoins>,
  },
  Staking(StakingOp<AccountId, AssetId, Balance>),
  Distribution(DistributionOp<AccountId>),
  Gov {
    proposal_id: u64,
    approve: bool,
  },
  Custom(BoundedVec<u8, MaxCustomPayload>),
}

/// Snapshot of the admin set as reported by the `admin_list` query.
#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
pub struct AdminListInfo<AccountId> {
  pub admins: Vec<AccountId>,
  pub mutable: bool,
}
