//! Contract compilation and instantiation
//!
//! Contracts are described by `cashc` artifacts: the contract name, its
//! constructor inputs, the ABI of its functions and the bytecode as ASM.
//! An artifact is loaded directly from `.json`, or produced by running the
//! `cashc` compiler on a `.cash` source file.

use crate::address::CashAddress;
use crate::client::{ClientResult, NetworkClient, Utxo};
use crate::config::Network;
use crate::error::ContractError;
use crate::script::{asm_to_script, encode_script_num, push_data};
use crate::spend::ContractCall;
use bitcoin::hashes::{hash160, Hash};
use bitcoin::script::Builder;
use bitcoin::ScriptBuf;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;
use std::str::FromStr;

/// Compiler invoked for `.cash` sources
pub const CASHC: &str = "cashc";

/// Type of a constructor or function parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Int,
    Bool,
    String,
    /// `bytes` or fixed-size `bytesN`
    Bytes(Option<usize>),
    PubKey,
    Sig,
    DataSig,
}

impl FromStr for ParamType {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" => Ok(Self::Int),
            "bool" => Ok(Self::Bool),
            "string" => Ok(Self::String),
            "bytes" => Ok(Self::Bytes(None)),
            "pubkey" => Ok(Self::PubKey),
            "sig" => Ok(Self::Sig),
            "datasig" => Ok(Self::DataSig),
            other => other
                .strip_prefix("bytes")
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|n| (1..=64).contains(n))
                .map(|n| Self::Bytes(Some(n)))
                .ok_or_else(|| ContractError::UnknownType(other.to_string())),
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Bool => write!(f, "bool"),
            Self::String => write!(f, "string"),
            Self::Bytes(None) => write!(f, "bytes"),
            Self::Bytes(Some(n)) => write!(f, "bytes{n}"),
            Self::PubKey => write!(f, "pubkey"),
            Self::Sig => write!(f, "sig"),
            Self::DataSig => write!(f, "datasig"),
        }
    }
}

/// A value passed to a constructor or contract function
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    Int(i64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
}

impl Argument {
    fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Bool(_) => "bool",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
        }
    }

    /// Encode the argument for a parameter of type `ty`
    ///
    /// # Errors
    ///
    /// Returns an error if the argument does not fit the parameter type.
    pub fn encode(&self, name: &str, ty: ParamType) -> Result<Vec<u8>, ContractError> {
        let mismatch = || ContractError::ArgumentType {
            name: name.to_string(),
            expected: ty.to_string(),
            actual: self.kind().to_string(),
        };

        match (ty, self) {
            (ParamType::Sig | ParamType::DataSig, _) => {
                Err(ContractError::UnsignableArgument(name.to_string()))
            }
            (ParamType::Int, Self::Int(n)) => Ok(encode_script_num(*n)),
            (ParamType::Bool, Self::Bool(b)) => Ok(encode_script_num(i64::from(*b))),
            (ParamType::String, Self::String(s)) => Ok(s.as_bytes().to_vec()),
            (ParamType::Bytes(None), Self::Bytes(b)) => Ok(b.clone()),
            (ParamType::Bytes(Some(n)), Self::Bytes(b)) if b.len() == n => Ok(b.clone()),
            (ParamType::PubKey, Self::Bytes(b)) if b.len() == 33 || b.len() == 65 => {
                Ok(b.clone())
            }
            _ => Err(mismatch()),
        }
    }
}

impl From<i64> for Argument {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for Argument {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Argument {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Argument {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<u8>> for Argument {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<hash160::Hash> for Argument {
    fn from(h: hash160::Hash) -> Self {
        Self::Bytes(h.to_byte_array().to_vec())
    }
}

impl From<secp256k1::PublicKey> for Argument {
    fn from(pk: secp256k1::PublicKey) -> Self {
        Self::Bytes(pk.serialize().to_vec())
    }
}

/// Named, typed parameter as it appears in an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiInput {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

/// Contract function as it appears in an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiFunction {
    pub name: String,
    #[serde(default)]
    pub covenant: bool,
    pub inputs: Vec<AbiInput>,
}

/// Compiler metadata recorded in an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerInfo {
    pub name: String,
    pub version: String,
}

/// Compiled contract description produced by `cashc`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    pub constructor_inputs: Vec<AbiInput>,
    pub abi: Vec<AbiFunction>,
    pub bytecode: String,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler: Option<CompilerInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Artifact {
    /// Parse an artifact from its JSON form
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe an artifact.
    pub fn from_json(json: &str) -> Result<Self, ContractError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Encode `args` against `inputs`, in declaration order
pub(crate) fn encode_arguments(
    context: &str,
    inputs: &[AbiInput],
    args: &[Argument],
) -> Result<Vec<Vec<u8>>, ContractError> {
    if inputs.len() != args.len() {
        return Err(ContractError::ArgumentCount {
            context: context.to_string(),
            expected: inputs.len(),
            actual: args.len(),
        });
    }

    inputs
        .iter()
        .zip(args)
        .map(|(input, arg)| arg.encode(&input.name, input.ty.parse()?))
        .collect()
}

/// A compiled contract, ready to be instantiated
#[derive(Debug, Clone)]
pub struct Contract {
    artifact: Artifact,
    bytecode: ScriptBuf,
    network: Network,
}

impl Contract {
    /// Compile a contract file for `network`
    ///
    /// `.json` files are read as artifacts; `.cash` files are compiled by
    /// running `cashc` and reading the artifact it prints.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use memo_retval::{Contract, Network};
    ///
    /// let contract = Contract::compile("contracts/memo_retval.json", Network::Testnet)?;
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or compiled, or the
    /// artifact is not usable.
    pub fn compile<P: AsRef<Path>>(path: P, network: Network) -> Result<Self, ContractError> {
        let path = path.as_ref();
        let artifact = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Artifact::from_json(&std::fs::read_to_string(path)?)?,
            Some("cash") => compile_source(path)?,
            _ => return Err(ContractError::UnsupportedFile(path.display().to_string())),
        };
        Self::from_artifact(artifact, network)
    }

    /// Build a contract from an already loaded artifact
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact has no functions, uses unknown
    /// parameter types, or its bytecode cannot be assembled.
    pub fn from_artifact(artifact: Artifact, network: Network) -> Result<Self, ContractError> {
        if artifact.abi.is_empty() {
            return Err(ContractError::EmptyAbi(artifact.contract_name));
        }

        // Reject unknown types up front rather than at call time
        let declared = artifact
            .constructor_inputs
            .iter()
            .chain(artifact.abi.iter().flat_map(|f| f.inputs.iter()));
        for input in declared {
            input.ty.parse::<ParamType>()?;
        }

        let bytecode = asm_to_script(&artifact.bytecode)?;
        Ok(Self {
            artifact,
            bytecode,
            network,
        })
    }

    /// Instantiate the contract with constructor arguments
    ///
    /// The redeem script is the constructor arguments pushed in reverse
    /// order followed by the contract bytecode.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments do not match the constructor inputs.
    pub fn instantiate(&self, args: &[Argument]) -> Result<ContractInstance, ContractError> {
        let encoded = encode_arguments(
            &format!("{} constructor", self.artifact.contract_name),
            &self.artifact.constructor_inputs,
            args,
        )?;

        let mut builder = Builder::new();
        for arg in encoded.iter().rev() {
            builder = push_data(builder, arg)?;
        }
        let mut redeem_script = builder.into_script().into_bytes();
        redeem_script.extend_from_slice(self.bytecode.as_bytes());
        let redeem_script = ScriptBuf::from_bytes(redeem_script);

        let address = CashAddress::p2sh(&redeem_script, self.network);
        Ok(ContractInstance {
            artifact: self.artifact.clone(),
            redeem_script,
            address,
        })
    }

    #[must_use]
    pub const fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    #[must_use]
    pub const fn bytecode(&self) -> &ScriptBuf {
        &self.bytecode
    }

    #[must_use]
    pub const fn network(&self) -> Network {
        self.network
    }
}

fn compile_source(path: &Path) -> Result<Artifact, ContractError> {
    let output = Command::new(CASHC).arg(path).output()?;
    if !output.status.success() {
        return Err(ContractError::CompileError(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    Artifact::from_json(&String::from_utf8_lossy(&output.stdout))
}

/// A contract bound to its constructor arguments, with an address on chain
#[derive(Debug, Clone)]
pub struct ContractInstance {
    artifact: Artifact,
    redeem_script: ScriptBuf,
    address: CashAddress,
}

impl ContractInstance {
    #[must_use]
    pub const fn address(&self) -> &CashAddress {
        &self.address
    }

    #[must_use]
    pub const fn redeem_script(&self) -> &ScriptBuf {
        &self.redeem_script
    }

    #[must_use]
    pub const fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    /// Coins currently locked in the contract
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot list the address' outputs.
    pub async fn utxos<C: NetworkClient>(&self, client: &C) -> ClientResult<Vec<Utxo>> {
        client.utxos(&self.address).await
    }

    /// Total satoshis locked in the contract
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot list the address' outputs.
    pub async fn balance<C: NetworkClient>(&self, client: &C) -> ClientResult<u64> {
        let utxos = self.utxos(client).await?;
        Ok(utxos.iter().map(|u| u.satoshis).sum())
    }

    /// Prepare a call to the function `name`
    ///
    /// # Errors
    ///
    /// Returns an error if the function does not exist or the arguments do
    /// not match its inputs.
    pub fn function(&self, name: &str, args: &[Argument]) -> Result<ContractCall<'_>, ContractError> {
        let (index, function) = self
            .artifact
            .abi
            .iter()
            .enumerate()
            .find(|(_, f)| f.name == name)
            .ok_or_else(|| ContractError::UnknownFunction(name.to_string()))?;

        let encoded = encode_arguments(name, &function.inputs, args)?;
        // The selector is only pushed when there is something to select between
        let selector = (self.artifact.abi.len() > 1).then_some(index);

        Ok(ContractCall::new(self, name, encoded, selector))
    }
}
