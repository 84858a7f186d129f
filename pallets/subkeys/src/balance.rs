//! Multi-asset balance value used for subkey allowances.
//!
//! A `NativeBalance` is an ordered list of coins with unique, ascending
//! denominations and no zero amounts. Every mutating helper keeps that shape,
//! so two balances holding the same funds always encode to the same bytes.

use alloc::vec::Vec;
use frame::prelude::*;
use polkadot_sdk::sp_runtime::traits::{AtLeast32BitUnsigned, CheckedSub, Saturating, Zero};

/// Upper bound on distinct denominations held by one allowance.
pub const MAX_DENOMS: u32 = 32;

pub type MaxDenoms = ConstU32<MAX_DENOMS>;

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
pub struct Coin<AssetId, Balance> {
  pub denom: AssetId,
  pub amount: Balance,
}

impl<AssetId, Balance> Coin<AssetId, Balance> {
  pub fn new(denom: AssetId, amount: Balance) -> Self {
    Self { denom, amount }
  }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BalanceError {
  /// Requested amount exceeds what is held for the denomination.
  InsufficientFunds,
  /// Inserting a new denomination would exceed `MAX_DENOMS`.
  TooManyDenominations,
}

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
  DefaultNoBound,
)]
pub struct NativeBalance<AssetId, Balance>(BoundedVec<Coin<AssetId, Balance>, MaxDenoms>);

impl<AssetId, Balance> NativeBalance<AssetId, Balance>
where
  AssetId: Ord + Clone,
  Balance: AtLeast32BitUnsigned + Copy,
{
  /// Balance holding a single coin. A zero coin yields the empty balance.
  pub fn from_coin(coin: Coin<AssetId, Balance>) -> Self {
    if coin.amount.is_zero() {
      return Self::default();
    }
    Self(BoundedVec::truncate_from(alloc::vec![coin]))
  }

  /// Build a normalized balance from arbitrary coins.
  pub fn from_coins(coins: Vec<Coin<AssetId, Balance>>) -> Result<Self, BalanceError> {
    let merged = Self::normalized(coins);
    BoundedVec::try_from(merged)
      .map(Self)
      .map_err(|_| BalanceError::TooManyDenominations)
  }

  pub fn coins(&self) -> &[Coin<AssetId, Balance>] {
    &self.0
  }

  pub fn into_inner(self) -> Vec<Coin<AssetId, Balance>> {
    self.0.into_inner()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Drop zero entries, sort by denomination and merge duplicates.
  pub fn normalize(&mut self) {
    let coins = core::mem::take(&mut self.0).into_inner();
    // merging only shrinks the list, the bound still holds
    self.0 = BoundedVec::truncate_from(Self::normalized(coins));
  }

  fn normalized(mut coins: Vec<Coin<AssetId, Balance>>) -> Vec<Coin<AssetId, Balance>> {
    coins.retain(|c| !c.amount.is_zero());
    coins.sort_by(|a, b| a.denom.cmp(&b.denom));
    let mut merged: Vec<Coin<AssetId, Balance>> = Vec::with_capacity(coins.len());
    for coin in coins {
      match merged.last_mut() {
        Some(last) if last.denom == coin.denom => {
          last.amount = last.amount.saturating_add(coin.amount);
        }
        _ => merged.push(coin),
      }
    }
    merged
  }

  pub fn find(&self, denom: &AssetId) -> Option<Balance> {
    self.0.iter().find(|c| &c.denom == denom).map(|c| c.amount)
  }

  fn position(&self, denom: &AssetId) -> Option<usize> {
    self.0.iter().position(|c| &c.denom == denom)
  }

  /// Index of the first coin whose denom sorts at or after `denom`.
  fn insert_pos(&self, denom: &AssetId) -> Option<usize> {
    self.0.iter().position(|c| &c.denom >= denom)
  }

  pub fn add(&mut self, coin: Coin<AssetId, Balance>) -> Result<(), BalanceError> {
    if coin.amount.is_zero() {
      return Ok(());
    }
    if let Some(existing) = self.0.iter_mut().find(|c| c.denom == coin.denom) {
      existing.amount = existing.amount.saturating_add(coin.amount);
      return Ok(());
    }
    let inserted = match self.insert_pos(&coin.denom) {
      Some(pos) => self.0.try_insert(pos, coin),
      None => self.0.try_push(coin),
    };
    inserted.map_err(|_| BalanceError::TooManyDenominations)
  }

  /// Strict subtraction. Fails when the coin is missing or short.
  pub fn sub(&self, coin: &Coin<AssetId, Balance>) -> Result<Self, BalanceError> {
    if coin.amount.is_zero() {
      return Ok(self.clone());
    }
    let idx = self
      .position(&coin.denom)
      .ok_or(BalanceError::InsufficientFunds)?;
    let mut out = self.clone();
    let held = out.0[idx].amount;
    let remaining = held
      .checked_sub(&coin.amount)
      .ok_or(BalanceError::InsufficientFunds)?;
    if remaining.is_zero() {
      out.0.remove(idx);
    } else {
      out.0[idx].amount = remaining;
    }
    Ok(out)
  }

  /// Subtraction clamped at zero. A missing denomination is left untouched.
  pub fn sub_saturating(&self, coin: &Coin<AssetId, Balance>) -> Self {
    let mut out = self.clone();
    if let Some(idx) = out.position(&coin.denom) {
      let remaining = out.0[idx].amount.saturating_sub(coin.amount);
      if remaining.is_zero() {
        out.0.remove(idx);
      } else {
        out.0[idx].amount = remaining;
      }
    }
    out
  }
}
