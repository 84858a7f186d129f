#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use core::marker::PhantomData;
use polkadot_sdk::frame_support::{
  traits::Get,
  weights::{constants::RocksDbWeight, Weight},
};

pub trait WeightInfo {
  fn execute(ops: u32) -> Weight;
  fn increase_allowance() -> Weight;
  fn decrease_allowance() -> Weight;
  fn set_permissions() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config + crate::Config> WeightInfo for SubstrateWeight<T> {
  fn execute(ops: u32) -> Weight {
    // permissions and allowance are each read at most once per batch
    let ops = u64::from(ops.min(crate::MAX_BATCH_OPS));
    Weight::from_parts(
      12_000_000u64.saturating_add(ops.saturating_mul(4_000_000)),
      1500u64.saturating_add(ops.saturating_mul(96)),
    )
    .saturating_add(T::DbWeight::get().reads(2))
    .saturating_add(T::DbWeight::get().writes(1))
  }

  fn increase_allowance() -> Weight {
    Weight::from_parts(18_000_000, 1800)
      .saturating_add(T::DbWeight::get().reads(1))
      .saturating_add(T::DbWeight::get().writes(1))
  }

  fn decrease_allowance() -> Weight {
    Weight::from_parts(18_000_000, 1800)
      .saturating_add(T::DbWeight::get().reads(1))
      .saturating_add(T::DbWeight::get().writes(1))
  }

  fn set_permissions() -> Weight {
    Weight::from_parts(10_000_000, 600)
      .saturating_add(T::DbWeight::get().writes(1))
  }
}

impl WeightInfo for () {
  fn execute(ops: u32) -> Weight {
    let ops = u64::from(ops.min(crate::MAX_BATCH_OPS));
    Weight::from_parts(12_000_000u64.saturating_add(ops.saturating_mul(4_000_000)), 1500)
  }
  fn increase_allowance() -> Weight { Weight::from_parts(18_000_000, 1800) }
  fn decrease_allowance() -> Weight { Weight::from_parts(18_000_000, 1800) }
  fn set_permissions() -> Weight { Weight::from_parts(10_000_000, 600) }
}
