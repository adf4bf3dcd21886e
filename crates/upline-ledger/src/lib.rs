// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// UPLINE - WALLET LEDGER
//
// Per-member wallet with named balance buckets and an atomic
// credit/debit primitive. Every balance mutation takes that member's
// wallet lock for the whole read-modify-write; different members'
// wallets never block each other. All amounts are u128 paise.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use upline_core::EngineError;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WalletBucket {
    /// Deposited funds available to invest.
    Investment,
    /// Credited commissions (direct, level, pairing, rank bonus).
    Commission,
    /// Rental income distributions.
    Rental,
    /// Return-on-investment payouts.
    Roi,
}

impl WalletBucket {
    pub fn as_str(self) -> &'static str {
        match self {
            WalletBucket::Investment => "INVESTMENT",
            WalletBucket::Commission => "COMMISSION",
            WalletBucket::Rental => "RENTAL",
            WalletBucket::Roi => "ROI",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnKind {
    Credit,
    Debit,
    Lock,
    Unlock,
}

/// One ledger movement. Append-only; the audit trail for every paisa.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Transaction {
    pub txn_id: String,
    pub member_id: String,
    pub kind: TxnKind,
    pub bucket: WalletBucket,
    pub amount_paise: u128,
    pub balance_before_paise: u128,
    pub balance_after_paise: u128,
    pub memo: String,
    pub created_at: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Wallet {
    pub member_id: String,
    pub investment_paise: u128,
    pub commission_paise: u128,
    pub rental_paise: u128,
    pub roi_paise: u128,
    /// Withdrawal hold — subtracted from what `debit` may touch in the
    /// Commission bucket.
    pub locked_paise: u128,
    /// Lifetime credits into the earning buckets (Commission/Rental/Roi).
    pub total_earned_paise: u128,
    /// Lifetime credits into the Investment bucket.
    pub total_invested_paise: u128,
    /// Lifetime debits out of the Commission bucket (payout settlements).
    pub total_withdrawn_paise: u128,
}

impl Wallet {
    fn bucket(&self, bucket: WalletBucket) -> u128 {
        match bucket {
            WalletBucket::Investment => self.investment_paise,
            WalletBucket::Commission => self.commission_paise,
            WalletBucket::Rental => self.rental_paise,
            WalletBucket::Roi => self.roi_paise,
        }
    }

    fn bucket_mut(&mut self, bucket: WalletBucket) -> &mut u128 {
        match bucket {
            WalletBucket::Investment => &mut self.investment_paise,
            WalletBucket::Commission => &mut self.commission_paise,
            WalletBucket::Rental => &mut self.rental_paise,
            WalletBucket::Roi => &mut self.roi_paise,
        }
    }
}

/// Snapshot of one member's balances, for cap computation and
/// withdrawable checks.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BucketBalances {
    pub investment_paise: u128,
    pub commission_paise: u128,
    pub rental_paise: u128,
    pub roi_paise: u128,
    pub locked_paise: u128,
}

/// Serializable snapshot of the whole ledger (wallets + log), taken
/// outside the hot path for persistence or reconciliation.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LedgerSnapshot {
    pub wallets: BTreeMap<String, Wallet>,
    pub transactions: Vec<Transaction>,
}

/// The wallet registry. Each wallet sits behind its own mutex; the outer
/// RwLock only guards registry growth (wallet creation), so concurrent
/// credits to different members proceed in parallel while credits to the
/// same member serialize.
#[derive(Default)]
pub struct Ledger {
    wallets: RwLock<BTreeMap<String, Arc<Mutex<Wallet>>>>,
    transactions: Mutex<Vec<Transaction>>,
    seq: AtomicU64,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a wallet for `member_id`. Idempotent — an existing wallet
    /// is left untouched.
    pub fn create_wallet(&self, member_id: &str) {
        let mut wallets = self.wallets.write().expect("ledger registry poisoned");
        wallets.entry(member_id.to_string()).or_insert_with(|| {
            Arc::new(Mutex::new(Wallet {
                member_id: member_id.to_string(),
                ..Wallet::default()
            }))
        });
    }

    pub fn has_wallet(&self, member_id: &str) -> bool {
        self.wallets
            .read()
            .expect("ledger registry poisoned")
            .contains_key(member_id)
    }

    fn wallet_handle(&self, member_id: &str) -> Result<Arc<Mutex<Wallet>>, EngineError> {
        self.wallets
            .read()
            .expect("ledger registry poisoned")
            .get(member_id)
            .cloned()
            .ok_or_else(|| EngineError::WalletNotFound(member_id.to_string()))
    }

    fn next_txn_id(&self, member_id: &str, now: u64) -> String {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let mut hasher = Sha3_256::new();
        hasher.update(seq.to_le_bytes());
        hasher.update(member_id.as_bytes());
        hasher.update(now.to_le_bytes());
        format!("TXN{}", &hex::encode(hasher.finalize())[..16].to_uppercase())
    }

    fn record(&self, txn: Transaction) -> String {
        let id = txn.txn_id.clone();
        self.transactions
            .lock()
            .expect("ledger log poisoned")
            .push(txn);
        id
    }

    /// Add `amount` to the member's `bucket`. Rejects zero amounts.
    /// The wallet lock is held across the whole read-modify-write.
    pub fn credit(
        &self,
        member_id: &str,
        amount_paise: u128,
        bucket: WalletBucket,
        memo: &str,
        now: u64,
    ) -> Result<String, EngineError> {
        if amount_paise == 0 {
            return Err(EngineError::InvalidAmount(
                "credit amount must be greater than zero".to_string(),
            ));
        }
        let handle = self.wallet_handle(member_id)?;
        let mut wallet = handle.lock().expect("wallet poisoned");

        let before = wallet.bucket(bucket);
        *wallet.bucket_mut(bucket) = before.saturating_add(amount_paise);
        match bucket {
            WalletBucket::Investment => {
                wallet.total_invested_paise =
                    wallet.total_invested_paise.saturating_add(amount_paise)
            }
            _ => {
                wallet.total_earned_paise = wallet.total_earned_paise.saturating_add(amount_paise)
            }
        }
        let after = wallet.bucket(bucket);
        drop(wallet);

        log::debug!(
            "credit {} paise to {} [{}] ({})",
            amount_paise,
            member_id,
            bucket.as_str(),
            memo
        );
        Ok(self.record(Transaction {
            txn_id: self.next_txn_id(member_id, now),
            member_id: member_id.to_string(),
            kind: TxnKind::Credit,
            bucket,
            amount_paise,
            balance_before_paise: before,
            balance_after_paise: after,
            memo: memo.to_string(),
            created_at: now,
        }))
    }

    /// Remove `amount` from the member's `bucket`. Fails with
    /// `InsufficientBalance` (and changes nothing) when the available
    /// balance — net of locks for the Commission bucket — is short.
    pub fn debit(
        &self,
        member_id: &str,
        amount_paise: u128,
        bucket: WalletBucket,
        memo: &str,
        now: u64,
    ) -> Result<String, EngineError> {
        if amount_paise == 0 {
            return Err(EngineError::InvalidAmount(
                "debit amount must be greater than zero".to_string(),
            ));
        }
        let handle = self.wallet_handle(member_id)?;
        let mut wallet = handle.lock().expect("wallet poisoned");

        let before = wallet.bucket(bucket);
        let available = if bucket == WalletBucket::Commission {
            before.saturating_sub(wallet.locked_paise)
        } else {
            before
        };
        if available < amount_paise {
            return Err(EngineError::InsufficientBalance {
                member: member_id.to_string(),
                bucket: bucket.as_str().to_string(),
                needed_paise: amount_paise,
                available_paise: available,
            });
        }
        *wallet.bucket_mut(bucket) = before - amount_paise;
        if bucket == WalletBucket::Commission {
            wallet.total_withdrawn_paise =
                wallet.total_withdrawn_paise.saturating_add(amount_paise);
        }
        let after = wallet.bucket(bucket);
        drop(wallet);

        log::debug!(
            "debit {} paise from {} [{}] ({})",
            amount_paise,
            member_id,
            bucket.as_str(),
            memo
        );
        Ok(self.record(Transaction {
            txn_id: self.next_txn_id(member_id, now),
            member_id: member_id.to_string(),
            kind: TxnKind::Debit,
            bucket,
            amount_paise,
            balance_before_paise: before,
            balance_after_paise: after,
            memo: memo.to_string(),
            created_at: now,
        }))
    }

    /// Place a withdrawal hold on the Commission bucket.
    pub fn lock_funds(
        &self,
        member_id: &str,
        amount_paise: u128,
        now: u64,
    ) -> Result<String, EngineError> {
        let handle = self.wallet_handle(member_id)?;
        let mut wallet = handle.lock().expect("wallet poisoned");
        let free = wallet
            .commission_paise
            .saturating_sub(wallet.locked_paise);
        if free < amount_paise {
            return Err(EngineError::InsufficientBalance {
                member: member_id.to_string(),
                bucket: WalletBucket::Commission.as_str().to_string(),
                needed_paise: amount_paise,
                available_paise: free,
            });
        }
        let before = wallet.locked_paise;
        wallet.locked_paise = before + amount_paise;
        let after = wallet.locked_paise;
        drop(wallet);
        Ok(self.record(Transaction {
            txn_id: self.next_txn_id(member_id, now),
            member_id: member_id.to_string(),
            kind: TxnKind::Lock,
            bucket: WalletBucket::Commission,
            amount_paise,
            balance_before_paise: before,
            balance_after_paise: after,
            memo: "withdrawal hold".to_string(),
            created_at: now,
        }))
    }

    /// Release a withdrawal hold (clamped at the held amount).
    pub fn unlock_funds(
        &self,
        member_id: &str,
        amount_paise: u128,
        now: u64,
    ) -> Result<String, EngineError> {
        let handle = self.wallet_handle(member_id)?;
        let mut wallet = handle.lock().expect("wallet poisoned");
        let before = wallet.locked_paise;
        wallet.locked_paise = before.saturating_sub(amount_paise);
        let after = wallet.locked_paise;
        drop(wallet);
        Ok(self.record(Transaction {
            txn_id: self.next_txn_id(member_id, now),
            member_id: member_id.to_string(),
            kind: TxnKind::Unlock,
            bucket: WalletBucket::Commission,
            amount_paise,
            balance_before_paise: before,
            balance_after_paise: after,
            memo: "withdrawal hold released".to_string(),
            created_at: now,
        }))
    }

    pub fn balances(&self, member_id: &str) -> Result<BucketBalances, EngineError> {
        let handle = self.wallet_handle(member_id)?;
        let wallet = handle.lock().expect("wallet poisoned");
        Ok(BucketBalances {
            investment_paise: wallet.investment_paise,
            commission_paise: wallet.commission_paise,
            rental_paise: wallet.rental_paise,
            roi_paise: wallet.roi_paise,
            locked_paise: wallet.locked_paise,
        })
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.lock().expect("ledger log poisoned").len()
    }

    /// Deterministic snapshot of all wallets and the full log.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let wallets = self
            .wallets
            .read()
            .expect("ledger registry poisoned")
            .iter()
            .map(|(id, w)| (id.clone(), w.lock().expect("wallet poisoned").clone()))
            .collect();
        let transactions = self
            .transactions
            .lock()
            .expect("ledger log poisoned")
            .clone();
        LedgerSnapshot {
            wallets,
            transactions,
        }
    }
}
