#![cfg(feature = "runtime-benchmarks")]

extern crate alloc;

use crate::{
  balance::{Coin, MAX_DENOMS, NativeBalance},
  expiration::Expiration,
  types::{Allowance, Permissions, ProxyOp},
  *,
};
use alloc::vec::Vec;
use frame::prelude::*;
use polkadot_sdk::frame_benchmarking::{account, v2::*};
use polkadot_sdk::frame_system::RawOrigin;

#[benchmarks]
mod benches {
  use super::*;

  fn admin<T: Config>() -> T::AccountId {
    let admin: T::AccountId = account("admin", 0, 0);
    T::BenchmarkHelper::make_admin(&admin);
    admin
  }

  fn coin<T: Config>(id: u32, amount: u32) -> CoinOf<T> {
    Coin::new(T::BenchmarkHelper::asset(id), amount.into())
  }

  /// Allowance holding `denoms` distinct assets, never expiring.
  fn seed_allowance<T: Config>(spender: &T::AccountId, denoms: u32, amount: u32) {
    let coins: Vec<CoinOf<T>> = (0..denoms).map(|id| coin::<T>(id, amount)).collect();
    let balance = NativeBalance::from_coins(coins).unwrap_or_default();
    SubkeyAllowances::<T>::insert(
      spender,
      Allowance {
        balance,
        expires: Expiration::Never,
      },
    );
  }

  #[benchmark]
  fn execute(n: Linear<1, MAX_BATCH_OPS>) {
    let caller: T::AccountId = whitelisted_caller();
    seed_allowance::<T>(&caller, 1, n);
    let to: T::AccountId = account("recipient", 0, 0);
    let send = ProxyOp::BankSend {
      to,
      amount: BoundedVec::truncate_from(alloc::vec![coin::<T>(0, 1)]),
    };
    let ops: BatchOf<T> = BoundedVec::truncate_from((0..n).map(|_| send.clone()).collect());
    frame_system::Pallet::<T>::set_block_number(1u32.into());

    #[extrinsic_call]
    _(RawOrigin::Signed(caller.clone()), ops);

    // the whole allowance was spent
    let left = Pallet::<T>::allowance(&caller).unwrap_or_default();
    assert!(left.balance.is_empty());
  }

  #[benchmark]
  fn increase_allowance() {
    let owner = admin::<T>();
    let spender: T::AccountId = account("subkey", 0, 0);
    // one slot left, the new denomination sorts last
    seed_allowance::<T>(&spender, MAX_DENOMS - 1, 10);
    let amount = coin::<T>(MAX_DENOMS - 1, 10);

    #[extrinsic_call]
    _(RawOrigin::Signed(owner), spender.clone(), amount, None);

    let stored = Pallet::<T>::allowance(&spender).unwrap_or_default();
    assert_eq!(stored.balance.coins().len() as u32, MAX_DENOMS);
  }

  #[benchmark]
  fn decrease_allowance() {
    let owner = admin::<T>();
    let spender: T::AccountId = account("subkey", 0, 0);
    seed_allowance::<T>(&spender, MAX_DENOMS, 10);
    let amount = coin::<T>(MAX_DENOMS - 1, 10);

    #[extrinsic_call]
    _(RawOrigin::Signed(owner), spender.clone(), amount, Some(Expiration::Never));

    let stored = Pallet::<T>::allowance(&spender).unwrap_or_default();
    assert_eq!(stored.balance.coins().len() as u32, MAX_DENOMS - 1);
  }

  #[benchmark]
  fn set_permissions() {
    let owner = admin::<T>();
    let spender: T::AccountId = account("subkey", 0, 0);
    let permissions = Permissions {
      delegate: true,
      redelegate: true,
      undelegate: true,
      withdraw: true,
    };

    #[extrinsic_call]
    _(RawOrigin::Signed(owner), spender.clone(), permissions);

    assert_eq!(SubkeyPermissions::<T>::get(&spender), Some(permissions));
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
