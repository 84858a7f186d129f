//! Batch authorization for proxy callers.
//!
//! The evaluator never writes. It reads records through an
//! [`AuthorizationStore`], walks the batch in order and either denies at the
//! first failing operation or returns the allowance the caller should be left
//! with. Persisting that allowance is the caller's job, and only happens when
//! the whole batch was admitted.

use crate::{
  balance::Coin,
  types::{Allowance, DistributionOp, Permission, Permissions, ProxyOp, StakingOp},
};
use polkadot_sdk::sp_runtime::traits::AtLeast32BitUnsigned;

/// Read access to the per-subkey records.
pub trait AuthorizationStore {
  type AccountId;
  type AssetId: Ord + Clone;
  type Balance: AtLeast32BitUnsigned + Copy;
  type BlockNumber: PartialOrd + Copy;
  type Moment: PartialOrd + Copy;
  /// Failure other than a missing record, e.g. an undecodable value.
  type Error;

  /// Stored allowance, or the zero allowance when none exists.
  fn allowance(
    &self,
    who: &Self::AccountId,
  ) -> Result<Allowance<Self::AssetId, Self::Balance, Self::BlockNumber, Self::Moment>, Self::Error>;

  /// Stored permissions, or all flags off when none exist.
  fn permissions(&self, who: &Self::AccountId) -> Result<Permissions, Self::Error>;
}

pub type AllowanceFor<S> = Allowance<
  <S as AuthorizationStore>::AssetId,
  <S as AuthorizationStore>::Balance,
  <S as AuthorizationStore>::BlockNumber,
  <S as AuthorizationStore>::Moment,
>;

pub type ProxyOpFor<S> = ProxyOp<
  <S as AuthorizationStore>::AccountId,
  <S as AuthorizationStore>::AssetId,
  <S as AuthorizationStore>::Balance,
>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LedgerClock<BlockNumber, Moment> {
  pub height: BlockNumber,
  pub time: Moment,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Verdict<A> {
  /// Caller is an admin; nothing was checked and nothing changes.
  Admin,
  /// Every operation passed. `allowance` is the post-debit record when the
  /// batch spent from it.
  Subkey { allowance: Option<A> },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DenyReason {
  PermissionDenied(Permission),
  AllowanceExpired,
  InsufficientAllowance,
  OperationNotPermitted,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Denial {
  /// Position of the first failing operation in the batch.
  pub index: u32,
  pub reason: DenyReason,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EvalError<E> {
  Denied(Denial),
  Store(E),
}

struct Session<S: AuthorizationStore> {
  permissions: Option<Permissions>,
  allowance: Option<AllowanceFor<S>>,
  spent: bool,
}

impl<S: AuthorizationStore> Session<S> {
  fn new() -> Self {
    Self {
      permissions: None,
      allowance: None,
      spent: false,
    }
  }
}

pub struct Evaluator<'a, S: AuthorizationStore> {
  store: &'a S,
  clock: LedgerClock<S::BlockNumber, S::Moment>,
}

impl<'a, S: AuthorizationStore> Evaluator<'a, S> {
  pub fn new(store: &'a S, clock: LedgerClock<S::BlockNumber, S::Moment>) -> Self {
    Self { store, clock }
  }

  pub fn evaluate(
    &self,
    caller: &S::AccountId,
    is_admin: bool,
    ops: &[ProxyOpFor<S>],
  ) -> Result<Verdict<AllowanceFor<S>>, EvalError<S::Error>> {
    if is_admin {
      return Ok(Verdict::Admin);
    }
    let mut session = Session::<S>::new();
    for (index, op) in ops.iter().enumerate() {
      self
        .check(caller, op, &mut session)
        .map_err(|step| match step {
          Step::Deny(reason) => EvalError::Denied(Denial {
            index: index as u32,
            reason,
          }),
          Step::Store(e) => EvalError::Store(e),
        })?;
    }
    let allowance = if session.spent {
      session.allowance
    } else {
      None
    };
    Ok(Verdict::Subkey { allowance })
  }

  /// Would `op` alone be admitted right now. Shares the batch path so the
  /// answer cannot drift from `evaluate`.
  pub fn can_execute(
    &self,
    caller: &S::AccountId,
    is_admin: bool,
    op: &ProxyOpFor<S>,
  ) -> Result<bool, S::Error> {
    match self.evaluate(caller, is_admin, core::slice::from_ref(op)) {
      Ok(_) => Ok(true),
      Err(EvalError::Denied(_)) => Ok(false),
      Err(EvalError::Store(e)) => Err(e),
    }
  }

  fn check(
    &self,
    caller: &S::AccountId,
    op: &ProxyOpFor<S>,
    session: &mut Session<S>,
  ) -> Result<(), Step<S::Error>> {
    match op {
      ProxyOp::Staking(staking) => {
        let needed = match staking {
          StakingOp::Delegate { .. } => Permission::Delegate,
          StakingOp::Undelegate { .. } => Permission::Undelegate,
          StakingOp::Redelegate { .. } => Permission::Redelegate,
        };
        self.require(caller, needed, session)
      }
      ProxyOp::Distribution(
        DistributionOp::SetWithdrawAddress { .. } | DistributionOp::WithdrawDelegatorReward { .. },
      ) => self.require(caller, Permission::Withdraw, session),
      ProxyOp::BankSend { amount, .. } => self.debit(caller, amount, session),
      ProxyOp::Gov { .. } | ProxyOp::Custom(_) => Err(Step::Deny(DenyReason::OperationNotPermitted)),
    }
  }

  fn require(
    &self,
    caller: &S::AccountId,
    needed: Permission,
    session: &mut Session<S>,
  ) -> Result<(), Step<S::Error>> {
    let permissions = match session.permissions {
      Some(p) => p,
      None => {
        let loaded = self.store.permissions(caller).map_err(Step::Store)?;
        session.permissions = Some(loaded);
        loaded
      }
    };
    if permissions.allows(needed) {
      Ok(())
    } else {
      Err(Step::Deny(DenyReason::PermissionDenied(needed)))
    }
  }

  fn debit(
    &self,
    caller: &S::AccountId,
    coins: &[Coin<S::AssetId, S::Balance>],
    session: &mut Session<S>,
  ) -> Result<(), Step<S::Error>> {
    let mut allowance = match session.allowance.take() {
      Some(a) => a,
      None => self.store.allowance(caller).map_err(Step::Store)?,
    };
    if allowance
      .expires
      .is_expired(&self.clock.height, &self.clock.time)
    {
      return Err(Step::Deny(DenyReason::AllowanceExpired));
    }
    for coin in coins {
      allowance.balance = allowance
        .balance
        .sub(coin)
        .map_err(|_| Step::Deny(DenyReason::InsufficientAllowance))?;
    }
    session.allowance = Some(allowance);
    session.spent = true;
    Ok(())
  }
}

enum Step<E> {
  Deny(DenyReason),
  Store(E),
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    balance::NativeBalance,
    expiration::Expiration,
    types::{MaxCustomPayload, MaxSendCoins},
  };
  use alloc::{collections::BTreeMap, vec, vec::Vec};
  use frame::prelude::BoundedVec;

  type TestAllowance = Allowance<&'static str, u128, u64, u64>;
  type Op = ProxyOp<u64, &'static str, u128>;

  const ADMIN: u64 = 1;
  const SUBKEY: u64 = 2;
  const STRANGER: u64 = 3;
  const BROKEN: u64 = 99;

  #[derive(Debug, Eq, PartialEq)]
  struct Corrupt;

  #[derive(Default)]
  struct MemoryStore {
    allowances: BTreeMap<u64, TestAllowance>,
    permissions: BTreeMap<u64, Permissions>,
  }

  impl AuthorizationStore for MemoryStore {
    type AccountId = u64;
    type AssetId = &'static str;
    type Balance = u128;
    type BlockNumber = u64;
    type Moment = u64;
    type Error = Corrupt;

    fn allowance(&self, who: &u64) -> Result<TestAllowance, Corrupt> {
      if *who == BROKEN {
        return Err(Corrupt);
      }
      Ok(self.allowances.get(who).cloned().unwrap_or_default())
    }

    fn permissions(&self, who: &u64) -> Result<Permissions, Corrupt> {
      if *who == BROKEN {
        return Err(Corrupt);
      }
      Ok(self.permissions.get(who).copied().unwrap_or_default())
    }
  }

  fn clock(height: u64) -> LedgerClock<u64, u64> {
    LedgerClock {
      height,
      time: 1_000,
    }
  }

  fn allowance(coins: &[(&'static str, u128)], expires: Expiration<u64, u64>) -> TestAllowance {
    Allowance {
      balance: NativeBalance::from_coins(coins.iter().map(|(d, a)| Coin::new(*d, *a)).collect())
        .unwrap(),
      expires,
    }
  }

  fn send(coins: &[(&'static str, u128)]) -> Op {
    let amount: Vec<Coin<&'static str, u128>> =
      coins.iter().map(|(d, a)| Coin::new(*d, *a)).collect();
    ProxyOp::BankSend {
      to: STRANGER,
      amount: BoundedVec::<_, MaxSendCoins>::try_from(amount).unwrap(),
    }
  }

  fn delegate() -> Op {
    ProxyOp::Staking(StakingOp::Delegate {
      validator: STRANGER,
      amount: Coin::new("ujkl", 1),
    })
  }

  fn undelegate() -> Op {
    ProxyOp::Staking(StakingOp::Undelegate {
      validator: STRANGER,
      amount: Coin::new("ujkl", 1),
    })
  }

  fn redelegate() -> Op {
    ProxyOp::Staking(StakingOp::Redelegate {
      src_validator: STRANGER,
      dst_validator: ADMIN,
      amount: Coin::new("ujkl", 1),
    })
  }

  fn custom() -> Op {
    ProxyOp::Custom(BoundedVec::<u8, MaxCustomPayload>::truncate_from(vec![1, 2, 3]))
  }

  fn sample_ops() -> Vec<Op> {
    vec![
      delegate(),
      undelegate(),
      redelegate(),
      ProxyOp::Distribution(DistributionOp::SetWithdrawAddress { address: STRANGER }),
      ProxyOp::Distribution(DistributionOp::WithdrawDelegatorReward { validator: STRANGER }),
      send(&[("ujkl", 40)]),
      send(&[("ujkl", 101)]),
      send(&[("uatom", 1)]),
      ProxyOp::Gov {
        proposal_id: 7,
        approve: true,
      },
      custom(),
    ]
  }

  fn denied(index: u32, reason: DenyReason) -> EvalError<Corrupt> {
    EvalError::Denied(Denial { index, reason })
  }

  #[test]
  fn admin_bypasses_every_check() {
    let store = MemoryStore::default();
    let evaluator = Evaluator::new(&store, clock(10));
    assert_eq!(
      evaluator.evaluate(&ADMIN, true, &sample_ops()),
      Ok(Verdict::Admin)
    );
    // admins are not even read from the store
    assert_eq!(
      evaluator.evaluate(&BROKEN, true, &sample_ops()),
      Ok(Verdict::Admin)
    );
  }

  #[test]
  fn staking_requires_the_matching_flag() {
    let mut store = MemoryStore::default();
    store.permissions.insert(
      SUBKEY,
      Permissions {
        delegate: true,
        ..Default::default()
      },
    );
    let evaluator = Evaluator::new(&store, clock(10));
    assert_eq!(
      evaluator.evaluate(&SUBKEY, false, &[delegate()]),
      Ok(Verdict::Subkey { allowance: None })
    );
    assert_eq!(
      evaluator.evaluate(&SUBKEY, false, &[delegate(), undelegate()]),
      Err(denied(1, DenyReason::PermissionDenied(Permission::Undelegate)))
    );
    assert_eq!(
      evaluator.evaluate(&SUBKEY, false, &[redelegate()]),
      Err(denied(0, DenyReason::PermissionDenied(Permission::Redelegate)))
    );
  }

  #[test]
  fn distribution_requires_withdraw() {
    let mut store = MemoryStore::default();
    let ops = [
      ProxyOp::Distribution(DistributionOp::SetWithdrawAddress { address: STRANGER }),
      ProxyOp::Distribution(DistributionOp::WithdrawDelegatorReward { validator: STRANGER }),
    ];
    {
      let evaluator = Evaluator::new(&store, clock(10));
      assert_eq!(
        evaluator.evaluate(&SUBKEY, false, &ops),
        Err(denied(0, DenyReason::PermissionDenied(Permission::Withdraw)))
      );
    }
    store.permissions.insert(
      SUBKEY,
      Permissions {
        withdraw: true,
        ..Default::default()
      },
    );
    let evaluator = Evaluator::new(&store, clock(10));
    assert_eq!(
      evaluator.evaluate(&SUBKEY, false, &ops),
      Ok(Verdict::Subkey { allowance: None })
    );
  }

  #[test]
  fn sends_accumulate_against_one_starting_balance() {
    let mut store = MemoryStore::default();
    store.allowances.insert(
      SUBKEY,
      allowance(&[("ujkl", 100), ("uatom", 5)], Expiration::AtHeight(1000)),
    );
    let evaluator = Evaluator::new(&store, clock(500));
    let verdict = evaluator.evaluate(
      &SUBKEY,
      false,
      &[send(&[("ujkl", 40)]), send(&[("ujkl", 30), ("uatom", 5)])],
    );
    assert_eq!(
      verdict,
      Ok(Verdict::Subkey {
        allowance: Some(allowance(&[("ujkl", 30)], Expiration::AtHeight(1000)))
      })
    );
    // the batch total exceeds the budget even though each send alone fits
    assert_eq!(
      evaluator.evaluate(
        &SUBKEY,
        false,
        &[send(&[("ujkl", 60)]), send(&[("ujkl", 60)])]
      ),
      Err(denied(1, DenyReason::InsufficientAllowance))
    );
  }

  #[test]
  fn expired_or_missing_allowance_cannot_spend() {
    let mut store = MemoryStore::default();
    store
      .allowances
      .insert(SUBKEY, allowance(&[("ujkl", 100)], Expiration::AtHeight(1000)));
    let evaluator = Evaluator::new(&store, clock(1000));
    assert_eq!(
      evaluator.evaluate(&SUBKEY, false, &[send(&[("ujkl", 10)])]),
      Err(denied(0, DenyReason::AllowanceExpired))
    );
    assert_eq!(
      evaluator.evaluate(&STRANGER, false, &[send(&[("ujkl", 1)])]),
      Err(denied(0, DenyReason::AllowanceExpired))
    );
  }

  #[test]
  fn overdraft_is_rejected() {
    let mut store = MemoryStore::default();
    store
      .allowances
      .insert(SUBKEY, allowance(&[("ujkl", 10)], Expiration::Never));
    let evaluator = Evaluator::new(&store, clock(1));
    assert_eq!(
      evaluator.evaluate(&SUBKEY, false, &[send(&[("ujkl", 15)])]),
      Err(denied(0, DenyReason::InsufficientAllowance))
    );
    assert_eq!(
      evaluator.evaluate(&SUBKEY, false, &[send(&[("uatom", 1)])]),
      Err(denied(0, DenyReason::InsufficientAllowance))
    );
  }

  #[test]
  fn unknown_operations_are_denied() {
    let mut store = MemoryStore::default();
    store.permissions.insert(
      SUBKEY,
      Permissions {
        delegate: true,
        redelegate: true,
        undelegate: true,
        withdraw: true,
      },
    );
    let evaluator = Evaluator::new(&store, clock(1));
    assert_eq!(
      evaluator.evaluate(&SUBKEY, false, &[delegate(), custom()]),
      Err(denied(1, DenyReason::OperationNotPermitted))
    );
    assert_eq!(
      evaluator.evaluate(
        &SUBKEY,
        false,
        &[ProxyOp::Gov {
          proposal_id: 1,
          approve: false
        }]
      ),
      Err(denied(0, DenyReason::OperationNotPermitted))
    );
  }

  #[test]
  fn store_failures_are_not_denials() {
    let store = MemoryStore::default();
    let evaluator = Evaluator::new(&store, clock(1));
    assert_eq!(
      evaluator.evaluate(&BROKEN, false, &[delegate()]),
      Err(EvalError::Store(Corrupt))
    );
    assert_eq!(
      evaluator.evaluate(&BROKEN, false, &[send(&[("ujkl", 1)])]),
      Err(EvalError::Store(Corrupt))
    );
    assert_eq!(
      evaluator.can_execute(&BROKEN, false, &delegate()),
      Err(Corrupt)
    );
  }

  #[test]
  fn can_execute_agrees_with_single_op_batches() {
    let mut store = MemoryStore::default();
    store.permissions.insert(
      SUBKEY,
      Permissions {
        delegate: true,
        withdraw: true,
        ..Default::default()
      },
    );
    store
      .allowances
      .insert(SUBKEY, allowance(&[("ujkl", 100)], Expiration::AtHeight(1000)));
    for height in [1u64, 999, 1000, 5000] {
      let evaluator = Evaluator::new(&store, clock(height));
      for caller in [SUBKEY, STRANGER] {
        for op in sample_ops() {
          let single = evaluator.evaluate(&caller, false, core::slice::from_ref(&op));
          assert_eq!(
            evaluator.can_execute(&caller, false, &op),
            Ok(single.is_ok()),
            "caller {caller} at height {height} op {op:?}"
          );
        }
      }
    }
  }
}
