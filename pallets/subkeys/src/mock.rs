use crate as pallet_subkeys;
use crate::{MembersAdminList, ProxyExecutor, types::ProxyOp};
use frame::prelude::*;
use polkadot_sdk::{
  frame_support::{
    PalletId, construct_runtime,
    traits::{ConstU32, Get, SortedMembers, Time},
  },
  sp_runtime::{
    BuildStorage,
    traits::{BlakeTwo256, IdentityLookup},
  },
};

use alloc::{vec, vec::Vec};
use core::cell::RefCell;

type Block = polkadot_sdk::frame_system::mocking::MockBlock<Test>;
pub type AccountId = u64;
pub type Balance = u128;
pub type Denom = BoundedVec<u8, ConstU32<16>>;

pub const ADMIN: AccountId = 1;
pub const SECOND_ADMIN: AccountId = 2;
pub const SUBKEY: AccountId = 10;
pub const OTHER_SUBKEY: AccountId = 11;
pub const VALIDATOR: AccountId = 50;
pub const RECIPIENT: AccountId = 60;

construct_runtime!(
  pub enum Test {
    System: polkadot_sdk::frame_system,
    Subkeys: pallet_subkeys,
  }
);

impl polkadot_sdk::frame_system::Config for Test {
  type BaseCallFilter = polkadot_sdk::frame_support::traits::Everything;
  type BlockWeights = ();
  type BlockLength = ();
  type DbWeight = ();
  type RuntimeOrigin = RuntimeOrigin;
  type RuntimeCall = RuntimeCall;
  type Nonce = u64;
  type Hash = polkadot_sdk::sp_core::H256;
  type Hashing = BlakeTwo256;
  type AccountId = AccountId;
  type Lookup = IdentityLookup<Self::AccountId>;
  type Block = Block;
  type RuntimeEvent = RuntimeEvent;
  type BlockHashCount = polkadot_sdk::frame_support::traits::ConstU64<250>;
  type Version = ();
  type PalletInfo = PalletInfo;
  type AccountData = ();
  type OnNewAccount = ();
  type OnKilledAccount = ();
  type SystemWeightInfo = ();
  type SS58Prefix = ();
  type OnSetCode = ();
  type MaxConsumers = ConstU32<16>;
  type RuntimeTask = ();
  type ExtensionsWeightInfo = ();
  type SingleBlockMigrations = ();
  type MultiBlockMigrator = ();
  type PreInherents = ();
  type PostInherents = ();
  type PostTransactions = ();
}

pub struct SubkeysPalletId;
impl Get<PalletId> for SubkeysPalletId {
  fn get() -> PalletId {
    PalletId(*b"py/subky")
  }
}

thread_local! {
  static ADMINS: RefCell<Vec<AccountId>> = RefCell::new(Vec::new());
  static NOW: RefCell<u64> = RefCell::new(0);
  static EXECUTED: RefCell<Vec<(AccountId, AccountId, ProxyOp<AccountId, Denom, Balance>)>> =
    RefCell::new(Vec::new());
  static EXECUTOR_OFFLINE: RefCell<bool> = RefCell::new(false);
}

pub fn reset_mock_adapters() {
  ADMINS.with(|a| *a.borrow_mut() = vec![ADMIN, SECOND_ADMIN]);
  NOW.with(|n| *n.borrow_mut() = 1_000_000);
  EXECUTED.with(|e| e.borrow_mut().clear());
  EXECUTOR_OFFLINE.with(|o| *o.borrow_mut() = false);
}

pub fn add_admin(who: AccountId) {
  ADMINS.with(|a| {
    let mut admins = a.borrow_mut();
    if let Err(pos) = admins.binary_search(&who) {
      admins.insert(pos, who);
    }
  });
}

pub fn set_time(now: u64) {
  NOW.with(|n| *n.borrow_mut() = now);
}

pub fn set_executor_offline(offline: bool) {
  EXECUTOR_OFFLINE.with(|o| *o.borrow_mut() = offline);
}

/// Operations handed to the executor as `(proxy, origin, op)`.
pub fn executed() -> Vec<(AccountId, AccountId, ProxyOp<AccountId, Denom, Balance>)> {
  EXECUTED.with(|e| e.borrow().clone())
}

pub struct TestAdmins;
impl SortedMembers<AccountId> for TestAdmins {
  fn sorted_members() -> Vec<AccountId> {
    ADMINS.with(|a| a.borrow().clone())
  }

  #[cfg(feature = "runtime-benchmarks")]
  fn add(who: &AccountId) {
    add_admin(*who);
  }
}

pub struct MockTime;
impl Time for MockTime {
  type Moment = u64;

  fn now() -> u64 {
    NOW.with(|n| *n.borrow())
  }
}

pub const SEND_COIN_WEIGHT: u64 = 3_000_000;
pub const OTHER_OP_WEIGHT: u64 = 5_000_000;

pub struct MockExecutor;
impl ProxyExecutor<AccountId, Denom, Balance> for MockExecutor {
  fn execute(
    proxy: &AccountId,
    origin: &AccountId,
    op: &ProxyOp<AccountId, Denom, Balance>,
  ) -> DispatchResult {
    if EXECUTOR_OFFLINE.with(|o| *o.borrow()) {
      return Err(DispatchError::Other("executor offline"));
    }
    EXECUTED.with(|e| e.borrow_mut().push((*proxy, *origin, op.clone())));
    Ok(())
  }

  fn weight(op: &ProxyOp<AccountId, Denom, Balance>) -> Weight {
    match op {
      ProxyOp::BankSend { amount, .. } => {
        Weight::from_parts(SEND_COIN_WEIGHT.saturating_mul(amount.len() as u64), 0)
      }
      _ => Weight::from_parts(OTHER_OP_WEIGHT, 0),
    }
  }
}

#[cfg(feature = "runtime-benchmarks")]
pub struct MockBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl crate::BenchmarkHelper<AccountId, Denom> for MockBenchmarkHelper {
  fn asset(id: u32) -> Denom {
    BoundedVec::truncate_from(id.to_le_bytes().to_vec())
  }

  fn make_admin(who: &AccountId) {
    add_admin(*who);
  }
}

impl pallet_subkeys::Config for Test {
  type AssetId = Denom;
  type Balance = Balance;
  type Time = MockTime;
  type Admins = MembersAdminList<TestAdmins>;
  type Executor = MockExecutor;
  type PalletId = SubkeysPalletId;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = MockBenchmarkHelper;
}

pub fn denom(name: &str) -> Denom {
  BoundedVec::truncate_from(name.as_bytes().to_vec())
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  let t = polkadot_sdk::frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  let mut ext = polkadot_sdk::sp_io::TestExternalities::new(t);
  ext.execute_with(|| {
    System::set_block_number(1);
    reset_mock_adapters();
  });
  ext
}
