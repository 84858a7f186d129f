#![cfg_attr(not(feature = "std"), no_std)]

//! # Subkeys Pallet
//!
//! Proxy account administered by a set of admins. Admins delegate restricted
//! signing power to subkeys:
//! - a multi-asset spending allowance bounded by block height or ledger time
//! - coarse permission flags for staking and reward withdrawal
//!
//! Every batch a caller submits through `execute` is checked as a whole. When
//! it passes, the caller's allowance is debited once and the operations are
//! handed to the runtime's `ProxyExecutor`, acting as the pallet account.

extern crate alloc;

pub use pallet::*;

pub mod adapters;
pub use adapters::{AdminList, MembersAdminList, ProxyExecutor};

pub mod balance;
pub mod evaluator;
pub mod expiration;
pub mod types;

pub mod weights;
pub use weights::WeightInfo;

#[cfg(test)]
mod mock;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AccountId, AssetId> {
  fn asset(id: u32) -> AssetId;
  fn make_admin(who: &AccountId);
}

/// Log target for everything this pallet reports.
pub const LOG_TARGET: &str = "runtime::subkeys";

/// Hard cap on entries returned by one listing page.
pub const MAX_LIMIT: u32 = 30;
/// Page size used when the caller gives none.
pub const DEFAULT_LIMIT: u32 = 10;
/// Upper bound on operations in one `execute` batch.
pub const MAX_BATCH_OPS: u32 = 64;

#[frame::pallet]
pub mod pallet {
  use super::{
    AdminList, DEFAULT_LIMIT, LOG_TARGET, MAX_BATCH_OPS, MAX_LIMIT, ProxyExecutor, WeightInfo,
  };
  use crate::{
    balance::{Coin, NativeBalance},
    evaluator::{AuthorizationStore, EvalError, Evaluator, LedgerClock, Verdict},
    expiration::Expiration,
    types::{AdminListInfo, Allowance, Permissions, ProxyOp},
  };
  use alloc::vec::Vec;
  use codec::DecodeAll;
  use frame::prelude::*;
  use polkadot_sdk::{
    frame_support::{PalletId, storage::unhashed, traits::Time},
    sp_runtime::traits::{AccountIdConversion, Zero},
  };

  pub type MomentOf<T> = <<T as Config>::Time as Time>::Moment;
  pub type CoinOf<T> = Coin<<T as Config>::AssetId, <T as Config>::Balance>;
  pub type NativeBalanceOf<T> = NativeBalance<<T as Config>::AssetId, <T as Config>::Balance>;
  pub type ExpirationOf<T> = Expiration<BlockNumberFor<T>, MomentOf<T>>;
  pub type AllowanceOf<T> =
    Allowance<<T as Config>::AssetId, <T as Config>::Balance, BlockNumberFor<T>, MomentOf<T>>;
  pub type ProxyOpOf<T> =
    ProxyOp<<T as frame_system::Config>::AccountId, <T as Config>::AssetId, <T as Config>::Balance>;
  pub type MaxBatchOps = ConstU32<MAX_BATCH_OPS>;
  pub type BatchOf<T> = BoundedVec<ProxyOpOf<T>, MaxBatchOps>;
  pub type ClockOf<T> = LedgerClock<BlockNumberFor<T>, MomentOf<T>>;

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Denomination of a fungible asset.
    type AssetId: Parameter + Member + Ord + MaxEncodedLen;

    type Balance: Parameter
      + Member
      + AtLeast32BitUnsigned
      + Default
      + Copy
      + MaxEncodedLen;

    /// Ledger clock used for time based expirations.
    type Time: Time;

    /// Accounts that bypass checks and manage subkeys.
    type Admins: AdminList<Self::AccountId>;

    /// Performs admitted operations on behalf of the caller.
    type Executor: ProxyExecutor<Self::AccountId, Self::AssetId, Self::Balance>;

    /// Seed of the proxy account that acts for callers.
    #[pallet::constant]
    type PalletId: Get<PalletId>;

    type WeightInfo: WeightInfo;

    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper: crate::BenchmarkHelper<Self::AccountId, Self::AssetId>;
  }

  #[pallet::pallet]
  #[pallet::storage_version(STORAGE_VERSION)]
  pub struct Pallet<T>(_);

  /// The current storage version.
  const STORAGE_VERSION: StorageVersion = StorageVersion::new(1);

  #[pallet::storage]
  pub type SubkeyAllowances<T: Config> =
    StorageMap<_, Blake2_128Concat, T::AccountId, AllowanceOf<T>, OptionQuery>;

  #[pallet::storage]
  pub type SubkeyPermissions<T: Config> =
    StorageMap<_, Blake2_128Concat, T::AccountId, Permissions, OptionQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// A batch was admitted and handed to the executor.
    Executed {
      owner: T::AccountId,
      proxy: T::AccountId,
      ops: BatchOf<T>,
    },
    AllowanceIncreased {
      owner: T::AccountId,
      spender: T::AccountId,
      denom: T::AssetId,
      amount: T::Balance,
      expires: ExpirationOf<T>,
    },
    AllowanceDecreased {
      owner: T::AccountId,
      spender: T::AccountId,
      denom: T::AssetId,
      amount: T::Balance,
      expires: ExpirationOf<T>,
    },
    PermissionsSet {
      owner: T::AccountId,
      spender: T::AccountId,
      permissions: Permissions,
    },
    /// A subkey batch spent from its allowance; `remaining` is what is left.
    AllowanceSpent {
      spender: T::AccountId,
      remaining: NativeBalanceOf<T>,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Caller is not an admin, or its batch was denied.
    Unauthorized,
    /// Admins cannot grant themselves.
    CannotSetOwnAccount,
    /// First grant for a subkey must carry an expiration.
    MissingExpiration,
    /// Requested expiration has already passed.
    SettingExpiredAllowance,
    /// Existing allowance has expired and cannot be modified.
    AllowanceExpired,
    /// Subkey has no allowance to decrease.
    NoAllowance,
    /// Allowance would hold more denominations than storage allows.
    TooManyDenominations,
    /// Granting nothing is not a grant.
    ZeroAmount,
    /// A stored record could not be decoded.
    DataCorruption,
  }

  impl<T> From<EvalError<Error<T>>> for Error<T> {
    fn from(e: EvalError<Error<T>>) -> Self {
      match e {
        EvalError::Denied(_) => Error::<T>::Unauthorized,
        EvalError::Store(inner) => inner,
      }
    }
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Run `ops` through the proxy. Admins pass unconditionally, subkeys
    /// only when every operation is authorised.
    #[pallet::call_index(0)]
    #[pallet::weight(
      T::WeightInfo::execute(ops.len() as u32).saturating_add(Pallet::<T>::executor_weight(ops))
    )]
    pub fn execute(origin: OriginFor<T>, ops: BatchOf<T>) -> DispatchResult {
      let who = ensure_signed(origin)?;
      let store = SubkeyStore::<T>::default();
      let is_admin = T::Admins::is_admin(&who);
      let verdict = Evaluator::new(&store, Self::clock()).evaluate(&who, is_admin, &ops);
      match verdict {
        Ok(Verdict::Admin) | Ok(Verdict::Subkey { allowance: None }) => {}
        Ok(Verdict::Subkey {
          allowance: Some(remaining),
        }) => {
          SubkeyAllowances::<T>::insert(&who, &remaining);
          Self::deposit_event(Event::AllowanceSpent {
            spender: who.clone(),
            remaining: remaining.balance,
          });
        }
        Err(EvalError::Denied(denial)) => {
          log::debug!(
            target: LOG_TARGET,
            "batch from {:?} denied at op {}: {:?}",
            who,
            denial.index,
            denial.reason,
          );
          return Err(Error::<T>::Unauthorized.into());
        }
        Err(e) => return Err(Error::<T>::from(e).into()),
      }

      let proxy = Self::account_id();
      for op in ops.iter() {
        T::Executor::execute(&proxy, &who, op)?;
      }
      Self::deposit_event(Event::Executed {
        owner: who,
        proxy,
        ops,
      });
      Ok(())
    }

    /// Grant `amount` to `spender`. With an expiration the allowance is
    /// replaced, without one the amount is added to the live allowance.
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::increase_allowance())]
    pub fn increase_allowance(
      origin: OriginFor<T>,
      spender: T::AccountId,
      amount: CoinOf<T>,
      expires: Option<ExpirationOf<T>>,
    ) -> DispatchResult {
      let owner = Self::ensure_admin(origin)?;
      ensure!(owner != spender, Error::<T>::CannotSetOwnAccount);
      ensure!(!amount.amount.is_zero(), Error::<T>::ZeroAmount);
      let clock = Self::clock();
      let current = Self::load_allowance(&spender)?;
      let updated = match (expires, current) {
        (Some(exp), _) => {
          ensure!(
            !exp.is_expired(&clock.height, &clock.time),
            Error::<T>::SettingExpiredAllowance
          );
          Allowance {
            balance: NativeBalance::from_coin(amount.clone()),
            expires: exp,
          }
        }
        (None, None) => return Err(Error::<T>::MissingExpiration.into()),
        (None, Some(mut allowance)) => {
          ensure!(
            !allowance.expires.is_expired(&clock.height, &clock.time),
            Error::<T>::AllowanceExpired
          );
          // adding only fails when no denomination slot is left
          allowance
            .balance
            .add(amount.clone())
            .map_err(|_| Error::<T>::TooManyDenominations)?;
          allowance
        }
      };
      SubkeyAllowances::<T>::insert(&spender, &updated);
      Self::deposit_event(Event::AllowanceIncreased {
        owner,
        spender,
        denom: amount.denom,
        amount: amount.amount,
        expires: updated.expires,
      });
      Ok(())
    }

    /// Reduce `spender`'s allowance, clamping at zero. An emptied allowance
    /// keeps its expiration so it can be topped up later.
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::decrease_allowance())]
    pub fn decrease_allowance(
      origin: OriginFor<T>,
      spender: T::AccountId,
      amount: CoinOf<T>,
      expires: Option<ExpirationOf<T>>,
    ) -> DispatchResult {
      let owner = Self::ensure_admin(origin)?;
      ensure!(owner != spender, Error::<T>::CannotSetOwnAccount);
      let clock = Self::clock();
      let mut allowance = Self::load_allowance(&spender)?.ok_or(Error::<T>::NoAllowance)?;
      ensure!(
        !allowance.expires.is_expired(&clock.height, &clock.time),
        Error::<T>::AllowanceExpired
      );
      if let Some(exp) = expires {
        ensure!(
          !exp.is_expired(&clock.height, &clock.time),
          Error::<T>::SettingExpiredAllowance
        );
        allowance.expires = exp;
      }
      allowance.balance = allowance.balance.sub_saturating(&amount);
      SubkeyAllowances::<T>::insert(&spender, &allowance);
      Self::deposit_event(Event::AllowanceDecreased {
        owner,
        spender,
        denom: amount.denom,
        amount: amount.amount,
        expires: allowance.expires,
      });
      Ok(())
    }

    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::set_permissions())]
    pub fn set_permissions(
      origin: OriginFor<T>,
      spender: T::AccountId,
      permissions: Permissions,
    ) -> DispatchResult {
      let owner = Self::ensure_admin(origin)?;
      ensure!(owner != spender, Error::<T>::CannotSetOwnAccount);
      SubkeyPermissions::<T>::insert(&spender, permissions);
      Self::deposit_event(Event::PermissionsSet {
        owner,
        spender,
        permissions,
      });
      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    /// Account the proxy acts as when emitting operations.
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    /// Cost of performing `ops`, as declared by the executor.
    pub fn executor_weight(ops: &[ProxyOpOf<T>]) -> Weight {
      ops
        .iter()
        .fold(Weight::zero(), |acc, op| acc.saturating_add(T::Executor::weight(op)))
    }

    pub fn clock() -> ClockOf<T> {
      LedgerClock {
        height: frame_system::Pallet::<T>::block_number(),
        time: T::Time::now(),
      }
    }

    /// Whether `sender` could run `op` on its own right now.
    pub fn can_execute(sender: &T::AccountId, op: &ProxyOpOf<T>) -> Result<bool, DispatchError> {
      let store = SubkeyStore::<T>::default();
      let is_admin = T::Admins::is_admin(sender);
      Evaluator::new(&store, Self::clock())
        .can_execute(sender, is_admin, op)
        .map_err(Into::into)
    }

    /// Allowance of `spender`, the zero allowance when none is stored.
    pub fn allowance(spender: &T::AccountId) -> Result<AllowanceOf<T>, DispatchError> {
      Ok(Self::load_allowance(spender)?.unwrap_or_default())
    }

    pub fn permissions(spender: &T::AccountId) -> Result<Permissions, DispatchError> {
      Ok(Self::load_permissions(spender)?.unwrap_or_default())
    }

    /// Page of allowances ordered by account, strictly after `start_after`.
    pub fn all_allowances(
      start_after: Option<T::AccountId>,
      limit: Option<u32>,
    ) -> Result<Vec<(T::AccountId, AllowanceOf<T>)>, DispatchError> {
      let keys = Self::page(
        SubkeyAllowances::<T>::iter_keys().collect(),
        start_after.as_ref(),
        limit,
      );
      let mut out = Vec::with_capacity(keys.len());
      for who in keys {
        if let Some(allowance) = Self::load_allowance(&who)? {
          out.push((who, allowance));
        }
      }
      Ok(out)
    }

    /// Page of permission records ordered by account, strictly after
    /// `start_after`.
    pub fn all_permissions(
      start_after: Option<T::AccountId>,
      limit: Option<u32>,
    ) -> Result<Vec<(T::AccountId, Permissions)>, DispatchError> {
      let keys = Self::page(
        SubkeyPermissions::<T>::iter_keys().collect(),
        start_after.as_ref(),
        limit,
      );
      let mut out = Vec::with_capacity(keys.len());
      for who in keys {
        if let Some(permissions) = Self::load_permissions(&who)? {
          out.push((who, permissions));
        }
      }
      Ok(out)
    }

    pub fn admin_list() -> AdminListInfo<T::AccountId> {
      AdminListInfo {
        admins: T::Admins::admins(),
        mutable: T::Admins::is_mutable(),
      }
    }

    fn ensure_admin(origin: OriginFor<T>) -> Result<T::AccountId, DispatchError> {
      let who = ensure_signed(origin)?;
      ensure!(T::Admins::is_admin(&who), Error::<T>::Unauthorized);
      Ok(who)
    }

    /// Map iteration follows key hashes, not account order, so every key is
    /// collected and sorted before the page is cut.
    fn page(
      mut keys: Vec<T::AccountId>,
      start_after: Option<&T::AccountId>,
      limit: Option<u32>,
    ) -> Vec<T::AccountId> {
      let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT) as usize;
      keys.sort();
      keys
        .into_iter()
        .filter(|who| start_after.is_none_or(|after| who > after))
        .take(limit)
        .collect()
    }

    pub(crate) fn load_allowance(who: &T::AccountId) -> Result<Option<AllowanceOf<T>>, Error<T>> {
      Self::load_raw(SubkeyAllowances::<T>::hashed_key_for(who), "allowance", who)
    }

    pub(crate) fn load_permissions(who: &T::AccountId) -> Result<Option<Permissions>, Error<T>> {
      Self::load_raw(SubkeyPermissions::<T>::hashed_key_for(who), "permissions", who)
    }

    // Typed getters treat undecodable values as absent, which would hand a
    // corrupted subkey the defaults instead of failing.
    fn load_raw<V: Decode>(key: Vec<u8>, what: &str, who: &T::AccountId) -> Result<Option<V>, Error<T>> {
      let Some(raw) = unhashed::get_raw(&key) else {
        return Ok(None);
      };
      V::decode_all(&mut &raw[..]).map(Some).map_err(|_| {
        log::warn!(target: LOG_TARGET, "undecodable {} record for {:?}", what, who);
        Error::<T>::DataCorruption
      })
    }
  }

  /// Storage backed view the evaluator reads through.
  #[derive(DefaultNoBound)]
  pub struct SubkeyStore<T>(PhantomData<T>);

  impl<T: Config> AuthorizationStore for SubkeyStore<T> {
    type AccountId = T::AccountId;
    type AssetId = T::AssetId;
    type Balance = T::Balance;
    type BlockNumber = BlockNumberFor<T>;
    type Moment = MomentOf<T>;
    type Error = Error<T>;

    fn allowance(&self, who: &T::AccountId) -> Result<AllowanceOf<T>, Error<T>> {
      Ok(Pallet::<T>::load_allowance(who)?.unwrap_or_default())
    }

    fn permissions(&self, who: &T::AccountId) -> Result<Permissions, Error<T>> {
      Ok(Pallet::<T>::load_permissions(who)?.unwrap_or_default())
    }
  }
}
