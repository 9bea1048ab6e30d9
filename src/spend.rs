//! Transaction construction and spending of contract coins

use crate::address::CashAddress;
use crate::client::{NetworkClient, Utxo};
use crate::contract::ContractInstance;
use crate::error::ScriptError;
use crate::outcome::{SendFailure, SendReceipt};
use crate::script::push_data;
use bitcoin::consensus::encode::serialize_hex;
use bitcoin::script::Builder;
use bitcoin::transaction::Version;
use bitcoin::{absolute, Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};

/// Outputs below this value are not relayed
pub const DUST_LIMIT: u64 = 546;

/// Fee rate in satoshis per byte
pub const FEE_RATE: u64 = 1;

/// A prepared call to a contract function
///
/// Holds the encoded arguments; coins are selected and the transaction is
/// built when the call is sent.
#[derive(Debug, Clone)]
pub struct ContractCall<'a> {
    instance: &'a ContractInstance,
    function: String,
    args: Vec<Vec<u8>>,
    selector: Option<usize>,
}

impl<'a> ContractCall<'a> {
    pub(crate) fn new(
        instance: &'a ContractInstance,
        function: &str,
        args: Vec<Vec<u8>>,
        selector: Option<usize>,
    ) -> Self {
        Self {
            instance,
            function: function.to_string(),
            args,
            selector,
        }
    }

    #[must_use]
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Script satisfying the contract through this function
    ///
    /// Arguments are pushed last-first, followed by the function selector
    /// when the contract has several functions, then the redeem script.
    ///
    /// # Errors
    ///
    /// Returns an error if an argument or the redeem script is too large to push.
    pub fn unlocking_script(&self) -> Result<ScriptBuf, ScriptError> {
        let mut builder = Builder::new();
        for arg in self.args.iter().rev() {
            builder = push_data(builder, arg)?;
        }
        if let Some(index) = self.selector {
            builder = builder.push_int(index as i64);
        }
        builder = push_data(builder, self.instance.redeem_script().as_bytes())?;
        Ok(builder.into_script())
    }

    /// Build a transaction paying `amount` to `to` from `utxos`
    ///
    /// Coins are taken in order until they cover the amount and the fee.
    /// Change goes back to the contract unless it would be dust, in which
    /// case it is left to the miner. Returns the transaction and its fee.
    ///
    /// # Errors
    ///
    /// Returns [`SendFailure::Other`] if the coins do not cover the amount
    /// and fee, or the unlocking script cannot be built.
    pub fn build(
        &self,
        utxos: &[Utxo],
        to: &CashAddress,
        amount: u64,
    ) -> Result<(Transaction, u64), SendFailure> {
        let script_sig = self
            .unlocking_script()
            .map_err(|e| SendFailure::Other(e.to_string()))?;
        let payment = TxOut {
            value: Amount::from_sat(amount),
            script_pubkey: to.script_pubkey(),
        };
        let change_script = self.instance.address().script_pubkey();

        let mut total = 0u64;
        for (count, utxo) in utxos.iter().enumerate() {
            total = total.saturating_add(utxo.satoshis);
            let selected = &utxos[..=count];

            // Size with a change output is an upper bound for both shapes
            let sized = assemble(
                selected,
                &script_sig,
                vec![payment.clone(), change_output(&change_script, 0)],
            );
            let fee = sized.total_size() as u64 * FEE_RATE;
            let Some(change) = total.checked_sub(amount.saturating_add(fee)) else {
                continue;
            };

            let mut outputs = vec![payment];
            if change >= DUST_LIMIT {
                outputs.push(change_output(&change_script, change));
            }
            let tx = assemble(selected, &script_sig, outputs);
            let fee = total - amount - tx.output.get(1).map_or(0, |o| o.value.to_sat());

            tracing::debug!(
                function = %self.function,
                inputs = selected.len(),
                fee,
                change,
                "built contract spend"
            );
            return Ok((tx, fee));
        }

        Err(SendFailure::Other(format!(
            "Insufficient funds: available {total}, required more than {amount}"
        )))
    }

    /// Build and broadcast the call, paying `amount` to `to`
    ///
    /// # Errors
    ///
    /// Returns a [`SendFailure`] classifying why the call did not go through.
    pub async fn send<C: NetworkClient>(
        &self,
        client: &C,
        to: &CashAddress,
        amount: u64,
    ) -> Result<SendReceipt, SendFailure> {
        let utxos = self
            .instance
            .utxos(client)
            .await
            .map_err(|e| SendFailure::Other(format!("Failed to fetch contract coins: {e}")))?;

        let (tx, fee) = self.build(&utxos, to, amount)?;
        let raw_hex = serialize_hex(&tx);

        tracing::debug!(txid = %tx.compute_txid(), size = tx.total_size(), "broadcasting");
        let txid = client
            .broadcast(&raw_hex)
            .await
            .map_err(SendFailure::from_broadcast_error)?;

        Ok(SendReceipt { txid, fee, raw_hex })
    }
}

fn change_output(script: &ScriptBuf, value: u64) -> TxOut {
    TxOut {
        value: Amount::from_sat(value),
        script_pubkey: script.clone(),
    }
}

fn assemble(utxos: &[Utxo], script_sig: &ScriptBuf, output: Vec<TxOut>) -> Transaction {
    Transaction {
        version: Version::TWO,
        lock_time: absolute::LockTime::ZERO,
        input: utxos
            .iter()
            .map(|utxo| TxIn {
                previous_output: OutPoint::new(utxo.txid, utxo.vout),
                script_sig: script_sig.clone(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            })
            .collect(),
        output,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Network;
    use crate::contract::{Argument, Contract};
    use crate::error::ClientError;
    use crate::mock_client::MockClient;
    use crate::test_fixtures::{memo_retval_artifact, test_utxo, ALICE_PKH};
    use bitcoin::hashes::hash160;

    const TOKEN: &str = "ec10a63a4067dff85a8ba9256dd0c9a81cbc79fbbcc9d2f1b3e3b0a3ec719221";

    fn instance() -> ContractInstance {
        let pkh: hash160::Hash = ALICE_PKH.parse().unwrap();
        Contract::from_artifact(memo_retval_artifact(), Network::Testnet)
            .unwrap()
            .instantiate(&[pkh.into()])
            .unwrap()
    }

    fn validate_args() -> Vec<Argument> {
        vec![TOKEN.into(), TOKEN.into()]
    }

    #[test]
    fn test_unlocking_script_layout() {
        let instance = instance();
        let call = instance.function("validateTokenId", &validate_args()).unwrap();
        let script = call.unlocking_script().unwrap();
        let bytes = script.as_bytes();

        // <64 bytes> <64 bytes> OP_1 <redeem script>
        assert_eq!(bytes[0], 0x40);
        assert_eq!(&bytes[1..65], TOKEN.as_bytes());
        assert_eq!(bytes[65], 0x40);
        assert_eq!(bytes[130], 0x51);
        let redeem = instance.redeem_script().as_bytes();
        assert_eq!(bytes[131] as usize, redeem.len());
        assert_eq!(&bytes[132..], redeem);
    }

    #[test]
    fn test_build_with_change() {
        let instance = instance();
        let call = instance.function("validateTokenId", &validate_args()).unwrap();
        let (tx, fee) = call
            .build(&[test_utxo(10_000)], instance.address(), 10)
            .unwrap();

        assert_eq!(tx.input.len(), 1);
        assert_eq!(tx.output.len(), 2);
        assert_eq!(tx.output[0].value.to_sat(), 10);
        assert_eq!(tx.output[1].script_pubkey, instance.address().script_pubkey());
        assert_eq!(tx.output[1].value.to_sat(), 10_000 - 10 - fee);
        assert!(fee >= tx.total_size() as u64 * FEE_RATE);
    }

    #[test]
    fn test_dust_change_is_dropped() {
        let instance = instance();
        let call = instance.function("validateTokenId", &validate_args()).unwrap();
        let (tx, fee) = call
            .build(&[test_utxo(600)], instance.address(), 10)
            .unwrap();

        assert_eq!(tx.output.len(), 1);
        assert_eq!(fee, 590);
    }

    #[test]
    fn test_selects_only_needed_coins() {
        let instance = instance();
        let call = instance.function("validateTokenId", &validate_args()).unwrap();
        let utxos = [test_utxo(200), test_utxo(5_000), test_utxo(7_000)];
        let (tx, _) = call.build(&utxos, instance.address(), 10).unwrap();
        assert_eq!(tx.input.len(), 2);
    }

    #[test]
    fn test_insufficient_funds() {
        let instance = instance();
        let call = instance.function("validateTokenId", &validate_args()).unwrap();

        let err = call.build(&[], instance.address(), 10).unwrap_err();
        assert!(matches!(err, SendFailure::Other(_)));

        let err = call
            .build(&[test_utxo(100)], instance.address(), 10)
            .unwrap_err();
        assert!(matches!(err, SendFailure::Other(ref r) if r.contains("Insufficient")));
    }

    #[tokio::test]
    async fn test_send_broadcasts_transaction() {
        let client = MockClient::new();
        let instance = instance();
        client.add_utxo(instance.address(), test_utxo(10_000));

        let call = instance.function("validateTokenId", &validate_args()).unwrap();
        let receipt = call.send(&client, instance.address(), 10).await.unwrap();

        let broadcasts = client.broadcasts();
        assert_eq!(broadcasts, vec![receipt.raw_hex.clone()]);
        let tx: Transaction =
            bitcoin::consensus::deserialize(&hex::decode(&receipt.raw_hex).unwrap()).unwrap();
        assert_eq!(tx.compute_txid(), receipt.txid);
    }

    #[tokio::test]
    async fn test_send_classifies_rejection() {
        let client = MockClient::new();
        let instance = instance();
        client.add_utxo(instance.address(), test_utxo(10_000));
        client.reject_broadcasts(
            "16: mandatory-script-verify-flag-failed (Script evaluated without error but \
             finished with a false/empty top stack element)",
        );

        let call = instance.function("validateTokenId", &validate_args()).unwrap();
        let err = call.send(&client, instance.address(), 10).await.unwrap_err();
        assert!(matches!(err, SendFailure::Require(_)));
    }

    #[tokio::test]
    async fn test_send_utxo_lookup_failure() {
        let client = MockClient::new();
        client.fail_utxo_lookups(ClientError::Transport("connection refused".into()));
        let instance = instance();

        let call = instance.function("validateTokenId", &validate_args()).unwrap();
        let err = call.send(&client, instance.address(), 10).await.unwrap_err();
        assert!(matches!(err, SendFailure::Other(ref r) if r.contains("connection refused")));
        assert!(client.broadcasts().is_empty());
    }
}
