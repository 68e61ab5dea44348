//! Human-readable dumps of blocks and transactions.
use ledger_core::{Block, Ledger, Transaction};

pub fn transaction(tx: &Transaction) -> String {
    format!(
        "{}\n Sender Address:    {}\n Recipient Address: {}\n Value:             {:.1}\n",
        "-".repeat(40),
        tx.sender(),
        tx.recipient(),
        tx.value()
    )
}

pub fn block(block: &Block) -> String {
    let mut out = format!(
        "timestamp: {}\nnonce: {}\npreviousHash: {}\n",
        block.timestamp(),
        block.nonce(),
        hex::encode(block.previous_hash())
    );
    for tx in block.transactions() {
        out.push_str(&transaction(tx));
    }
    out
}

pub fn ledger(ledger: &Ledger) -> String {
    let bar = "=".repeat(25);
    let mut out = String::new();
    for (i, b) in ledger.chain().iter().enumerate() {
        out.push_str(&format!("{bar} Block {i} {bar}\n"));
        out.push_str(&block(b));
    }
    out.push_str(&"* ".repeat(25));
    out.push('\n');
    out
}

pub fn ledger_json(ledger: &Ledger) -> serde_json::Result<String> {
    serde_json::to_string_pretty(ledger.chain())
}
