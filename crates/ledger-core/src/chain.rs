use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::{
    config::LedgerConfig,
    error::{LedgerError, Result},
    pow::{search_nonce, valid_proof, CancelToken},
    Block, Hash, Transaction,
};

/// Previous-hash of the genesis block: the hash of the zero-valued block.
pub fn genesis_previous_hash() -> Hash {
    Block::default().hash()
}

/// Owns the chain of sealed blocks and the pool of pending transactions.
///
/// The chain always holds at least the genesis block and only ever grows.
/// Mutation goes through `&mut self`; wrap the ledger in a [`SharedLedger`]
/// to use it from several threads.
#[derive(Clone, Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    pool: Vec<Transaction>,
    owner: String,
    config: LedgerConfig,
}

impl Ledger {
    /// New ledger with the default configuration.
    pub fn new(owner: impl Into<String>) -> Self {
        Self::bootstrap(owner.into(), LedgerConfig::default())
    }

    pub fn with_config(owner: impl Into<String>, config: LedgerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::bootstrap(owner.into(), config))
    }

    /// Adopt an existing chain after auditing it with [`Ledger::validate_chain`].
    pub fn from_chain(
        owner: impl Into<String>,
        config: LedgerConfig,
        chain: Vec<Block>,
    ) -> Result<Self> {
        config.validate()?;
        let ledger = Self {
            chain,
            pool: Vec::new(),
            owner: owner.into(),
            config,
        };
        ledger.validate_chain()?;
        Ok(ledger)
    }

    fn bootstrap(owner: String, config: LedgerConfig) -> Self {
        let mut ledger = Self {
            chain: Vec::new(),
            pool: Vec::new(),
            owner,
            config,
        };
        ledger.seal_block(0, genesis_previous_hash());
        debug!(owner = %ledger.owner, "ledger bootstrapped with genesis block");
        ledger
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn block_count(&self) -> usize {
        self.chain.len()
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pool
    }

    pub fn last_block(&self) -> Result<&Block> {
        self.chain.last().ok_or(LedgerError::EmptyChain)
    }

    /// Append a transfer to the pool. Non-finite values are always refused;
    /// everything else is only checked when validation is switched on.
    pub fn add_transaction(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        value: f64,
    ) -> Result<()> {
        let tx = Transaction::new(sender, recipient, value);
        tx.check_encodable()?;
        if self.config.validate_transactions {
            tx.validate()?;
        }
        self.pool.push(tx);
        Ok(())
    }

    /// Independent copy of the pool.
    pub fn copy_pending_transactions(&self) -> Vec<Transaction> {
        self.pool.clone()
    }

    pub fn run_proof_of_work(&self) -> Result<u64> {
        self.run_proof_of_work_with(&CancelToken::new())
    }

    /// Smallest nonce that proves the current pool against the hash of the
    /// last block.
    pub fn run_proof_of_work_with(&self, cancel: &CancelToken) -> Result<u64> {
        let previous_hash = self.last_block()?.hash();
        self.proof_of_work(&previous_hash, cancel)
    }

    fn proof_of_work(&self, previous_hash: &Hash, cancel: &CancelToken) -> Result<u64> {
        let transactions = self.copy_pending_transactions();
        search_nonce(
            previous_hash,
            &transactions,
            self.config.difficulty,
            self.config.parallel_search,
            cancel,
        )
    }

    /// Seal the pool into a new block and empty it. The only place the chain
    /// and the pool change.
    pub fn seal_block(&mut self, nonce: u64, previous_hash: Hash) -> &Block {
        let transactions = std::mem::take(&mut self.pool);
        let index = self.chain.len();
        self.chain.push(Block::new(nonce, previous_hash, transactions));
        &self.chain[index]
    }

    pub fn mine(&mut self) -> Result<&Block> {
        self.mine_with(&CancelToken::new())
    }

    /// Reward the owner, search for a nonce, and seal.
    ///
    /// The hash of the last block is both the search input and the sealed
    /// block's previous hash. On error the reward is taken back out of the
    /// pool, leaving the ledger as it was.
    pub fn mine_with(&mut self, cancel: &CancelToken) -> Result<&Block> {
        let previous_hash = self.last_block()?.hash();
        let reward = Transaction::new(
            self.config.reward_sender_id.clone(),
            self.owner.clone(),
            self.config.mining_reward,
        );
        self.pool.push(reward);

        let nonce = match self.proof_of_work(&previous_hash, cancel) {
            Ok(nonce) => nonce,
            Err(e) => {
                self.pool.pop();
                warn!(action = "mining", status = "aborted", error = %e);
                return Err(e);
            }
        };

        let index = self.chain.len();
        let block = self.seal_block(nonce, previous_hash);
        info!(
            action = "mining",
            status = "success",
            index,
            nonce,
            txs = block.transactions().len(),
            hash = %block.hash_hex()
        );
        Ok(block)
    }

    /// Net amount received minus sent by `identifier` over the whole chain.
    /// A self-transfer counts as received only.
    pub fn compute_balance(&self, identifier: &str) -> f64 {
        let mut total = 0.0;
        for block in &self.chain {
            for tx in block.transactions() {
                if tx.recipient() == identifier {
                    total += tx.value();
                } else if tx.sender() == identifier {
                    total -= tx.value();
                }
            }
        }
        total
    }

    /// Check the genesis bootstrap, every hash link, every block's proof of
    /// work at this ledger's difficulty, and that every value is finite.
    pub fn validate_chain(&self) -> Result<()> {
        let genesis = self.chain.first().ok_or(LedgerError::EmptyChain)?;
        if genesis.nonce() != 0 || *genesis.previous_hash() != genesis_previous_hash() {
            return Err(LedgerError::InvalidGenesis);
        }

        for (offset, pair) in self.chain.windows(2).enumerate() {
            let index = offset + 1;
            let (prev, block) = (&pair[0], &pair[1]);
            if *block.previous_hash() != prev.hash() {
                return Err(LedgerError::InvalidBlockLinkage { index });
            }
            if !valid_proof(
                block.nonce(),
                block.previous_hash(),
                block.transactions(),
                self.config.difficulty,
            ) {
                return Err(LedgerError::InvalidProofOfWork { index });
            }
            for tx in block.transactions() {
                tx.check_encodable()?;
            }
        }
        Ok(())
    }
}

/// Cloneable, thread-safe handle around one [`Ledger`].
///
/// Every call takes the same lock, and `mine` holds it across snapshot,
/// search and seal, so a concurrent `add_transaction` lands either in the
/// block being mined or in the pool after it, never in both or neither.
#[derive(Clone, Debug)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
}

impl From<Ledger> for SharedLedger {
    fn from(ledger: Ledger) -> Self {
        Self::new(ledger)
    }
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ledger>> {
        self.inner.lock().map_err(|_| LedgerError::LockPoisoned)
    }

    pub fn add_transaction(
        &self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        value: f64,
    ) -> Result<()> {
        self.lock()?.add_transaction(sender, recipient, value)
    }

    pub fn mine(&self) -> Result<Block> {
        self.mine_with(&CancelToken::new())
    }

    pub fn mine_with(&self, cancel: &CancelToken) -> Result<Block> {
        self.lock()?.mine_with(cancel).cloned()
    }

    pub fn compute_balance(&self, identifier: &str) -> Result<f64> {
        Ok(self.lock()?.compute_balance(identifier))
    }

    pub fn block_count(&self) -> Result<usize> {
        Ok(self.lock()?.block_count())
    }

    pub fn pending_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.lock()?.copy_pending_transactions())
    }

    pub fn last_block(&self) -> Result<Block> {
        self.lock()?.last_block().cloned()
    }

    /// Point-in-time copy of the whole ledger.
    pub fn snapshot(&self) -> Result<Ledger> {
        Ok(self.lock()?.clone())
    }
}
