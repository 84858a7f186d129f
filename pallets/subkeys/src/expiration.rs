//! Expiration points and durations measured against the ledger clock.

use frame::prelude::*;
use polkadot_sdk::sp_runtime::traits::{AtLeast32Bit, AtLeast32BitUnsigned, One, Saturating};

/// Point after which an allowance stops being spendable.
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
pub enum Expiration<BlockNumber, Moment> {
  Never,
  /// Expired once the block height reaches this value.
  AtHeight(BlockNumber),
  /// Expired once the ledger time is past this value.
  AtTime(Moment),
}

impl<BlockNumber, Moment> Default for Expiration<BlockNumber, Moment> {
  fn default() -> Self {
    Expiration::Never
  }
}

/// Span of ledger clock, in blocks or in time units.
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
pub enum Duration<BlockNumber, Moment> {
  Height(BlockNumber),
  Time(Moment),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DurationError {
  /// Height and time spans cannot be combined.
  IncompatibleUnits,
}

impl<BlockNumber: PartialOrd, Moment: PartialOrd> Expiration<BlockNumber, Moment> {
  pub fn is_expired(&self, height: &BlockNumber, time: &Moment) -> bool {
    match self {
      Expiration::Never => false,
      Expiration::AtHeight(at) => height >= at,
      Expiration::AtTime(at) => time > at,
    }
  }
}

impl<BlockNumber, Moment> Expiration<BlockNumber, Moment>
where
  BlockNumber: AtLeast32BitUnsigned + Copy,
  Moment: AtLeast32Bit + Copy,
{
  /// Push the expiration further out. `Never` absorbs any duration.
  pub fn checked_add(
    &self,
    duration: &Duration<BlockNumber, Moment>,
  ) -> Result<Self, DurationError> {
    match (self, duration) {
      (Expiration::Never, _) => Ok(Expiration::Never),
      (Expiration::AtHeight(at), Duration::Height(d)) => {
        Ok(Expiration::AtHeight(at.saturating_add(*d)))
      }
      (Expiration::AtTime(at), Duration::Time(d)) => Ok(Expiration::AtTime(at.saturating_add(*d))),
      _ => Err(DurationError::IncompatibleUnits),
    }
  }
}

impl<BlockNumber, Moment> Duration<BlockNumber, Moment>
where
  BlockNumber: AtLeast32BitUnsigned + Copy,
  Moment: AtLeast32Bit + Copy,
{
  /// Expiration reached `self` after the given clock reading.
  pub fn after(&self, height: BlockNumber, time: Moment) -> Expiration<BlockNumber, Moment> {
    match self {
      Duration::Height(d) => Expiration::AtHeight(height.saturating_add(*d)),
      Duration::Time(d) => Expiration::AtTime(time.saturating_add(*d)),
    }
  }

  /// One unit longer, used to step just past an expiration point.
  pub fn plus_one(&self) -> Self {
    match self {
      Duration::Height(d) => Duration::Height(d.saturating_add(One::one())),
      Duration::Time(d) => Duration::Time(d.saturating_add(One::one())),
    }
  }

  pub fn checked_add(&self, other: &Self) -> Result<Self, DurationError> {
    match (self, other) {
      (Duration::Height(a), Duration::Height(b)) => Ok(Duration::Height(a.saturating_add(*b))),
      (Duration::Time(a), Duration::Time(b)) => Ok(Duration::Time(a.saturating_add(*b))),
      _ => Err(DurationError::IncompatibleUnits),
    }
  }

  pub fn multiply(&self, factor: u32) -> Self {
    match self {
      Duration::Height(d) => Duration::Height(d.saturating_mul(BlockNumber::from(factor))),
      Duration::Time(d) => Duration::Time(d.saturating_mul(Moment::from(factor))),
    }
  }
}
