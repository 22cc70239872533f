//! Scripted in-memory chain for unit tests.

use super::{ChainClient, Confirmation, SwapCall};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use ethers::types::{Address, TxHash, U256};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use tokio::time::Instant;

/// Scripted result of one swap submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapScript {
    Confirm,
    RejectSubmit,
    RevertOnChain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Quote { amount_in: U256, path: Vec<Address> },
    Approve { token: Address, spender: Address, amount: U256 },
    Swap(SwapCall),
}

pub struct MockChain {
    pub wallet: Address,
    /// Second element returned by `amounts_out`; `None` makes the view fail.
    pub expected_out: Mutex<Option<U256>>,
    pub reverting_approvals: HashSet<Address>,
    pub allowances: HashMap<Address, U256>,
    pub swap_script: Mutex<VecDeque<SwapScript>>,
    pub calls: Mutex<Vec<RecordedCall>>,
    /// Tokio clock reading at each swap submission.
    pub swap_times: Mutex<Vec<Instant>>,
    next_hash: Mutex<u64>,
    reverted: Mutex<HashSet<TxHash>>,
}

impl MockChain {
    pub fn new(wallet: Address) -> Self {
        Self {
            wallet,
            expected_out: Mutex::new(Some(U256::from(1_000u64))),
            reverting_approvals: HashSet::new(),
            allowances: HashMap::new(),
            swap_script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            swap_times: Mutex::new(Vec::new()),
            next_hash: Mutex::new(0),
            reverted: Mutex::new(HashSet::new()),
        }
    }

    pub fn script_swaps(&self, script: impl IntoIterator<Item = SwapScript>) {
        self.swap_script.lock().unwrap().extend(script);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn swaps(&self) -> Vec<SwapCall> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RecordedCall::Swap(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn approvals(&self) -> Vec<Address> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RecordedCall::Approve { token, .. } => Some(token),
                _ => None,
            })
            .collect()
    }

    fn fresh_hash(&self) -> TxHash {
        let mut n = self.next_hash.lock().unwrap();
        *n += 1;
        TxHash::from_low_u64_be(*n)
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn wallet_address(&self) -> Address {
        self.wallet
    }

    async fn amounts_out(
        &self,
        _router: Address,
        amount_in: U256,
        path: Vec<Address>,
    ) -> Result<Vec<U256>> {
        self.calls.lock().unwrap().push(RecordedCall::Quote {
            amount_in,
            path: path.clone(),
        });
        match *self.expected_out.lock().unwrap() {
            Some(out) => Ok(vec![amount_in, out]),
            None => Err(AppError::ContractRevert("INSUFFICIENT_LIQUIDITY".into())),
        }
    }

    async fn allowance(&self, token: Address, _owner: Address, _spender: Address) -> Result<U256> {
        Ok(self.allowances.get(&token).copied().unwrap_or_default())
    }

    async fn balance_of(&self, _token: Address, _owner: Address) -> Result<U256> {
        Ok(U256::exp10(18))
    }

    async fn decimals(&self, _token: Address) -> Result<u8> {
        Ok(18)
    }

    async fn submit_approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHash> {
        self.calls.lock().unwrap().push(RecordedCall::Approve {
            token,
            spender,
            amount,
        });
        if self.reverting_approvals.contains(&token) {
            return Err(AppError::ContractRevert("approve reverted".into()));
        }
        Ok(self.fresh_hash())
    }

    async fn submit_swap(&self, _router: Address, call: &SwapCall) -> Result<TxHash> {
        self.swap_times.lock().unwrap().push(Instant::now());
        self.calls
            .lock()
            .unwrap()
            .push(RecordedCall::Swap(call.clone()));
        let script = self
            .swap_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(SwapScript::Confirm);
        match script {
            SwapScript::RejectSubmit => Err(AppError::Connectivity("nonce too low".into())),
            SwapScript::Confirm => Ok(self.fresh_hash()),
            SwapScript::RevertOnChain => {
                let hash = self.fresh_hash();
                self.reverted.lock().unwrap().insert(hash);
                Ok(hash)
            }
        }
    }

    async fn await_confirmation(
        &self,
        tx_hash: TxHash,
        _confirmations: usize,
    ) -> Result<Confirmation> {
        if self.reverted.lock().unwrap().contains(&tx_hash) {
            return Err(AppError::ContractRevert(format!(
                "transaction {tx_hash:?} reverted"
            )));
        }
        Ok(Confirmation {
            tx_hash,
            block_number: 100 + tx_hash.to_low_u64_be(),
        })
    }
}
