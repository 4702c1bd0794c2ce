use std::path::Path;

use async_trait::async_trait;
use candid::{Decode, Encode, Principal};
use ic_agent::{
    identity::{BasicIdentity, Secp256k1Identity},
    Agent, Identity,
};
use shared::{
    domain::{MedicalRecord, RecordInput},
    interface::{CallMode, Method},
};
use tracing::{debug, info};

use crate::{parse_canister_id, ClientError, ConnectOptions, RecordsActor};

/// Connection handle bound to one canister. Cheap to share; the underlying
/// agent multiplexes its HTTP connections.
pub struct CanisterActor {
    agent: Agent,
    canister_id: Principal,
}

impl CanisterActor {
    /// Builds the agent, optionally fetches the local root key, and verifies
    /// the connection with a `greet` probe before handing the actor out.
    pub async fn connect(options: &ConnectOptions) -> Result<Self, ClientError> {
        let canister_id = parse_canister_id(&options.canister_id)?;
        let host = options.host.trim().to_string();
        url::Url::parse(&host).map_err(|err| ClientError::InvalidHost {
            host: host.clone(),
            reason: err.to_string(),
        })?;

        let mut builder = Agent::builder().with_url(host.clone());
        if let Some(path) = &options.identity_pem {
            builder = builder.with_boxed_identity(load_identity(path)?);
        }
        let agent = builder.build().map_err(|source| ClientError::AgentSetup {
            host: host.clone(),
            source,
        })?;

        if options.fetch_root_key {
            agent
                .fetch_root_key()
                .await
                .map_err(|source| ClientError::RootKeyFetch {
                    host: host.clone(),
                    source,
                })?;
        }

        let actor = Self { agent, canister_id };
        let echo = actor.greet("connection check").await?;
        info!(canister_id = %actor.canister_id, %echo, "connected to canister");
        Ok(actor)
    }

    pub fn canister_id(&self) -> Principal {
        self.canister_id
    }

    async fn call_raw(&self, method: Method, args: Vec<u8>) -> Result<Vec<u8>, ClientError> {
        debug!(method = method.name(), mode = ?method.mode(), "dispatching canister call");
        let result = match method.mode() {
            CallMode::Query => {
                self.agent
                    .query(&self.canister_id, method.name())
                    .with_arg(args)
                    .call()
                    .await
            }
            CallMode::Update => {
                self.agent
                    .update(&self.canister_id, method.name())
                    .with_arg(args)
                    .call_and_wait()
                    .await
            }
        };
        result.map_err(|source| ClientError::Call {
            method: method.name(),
            source,
        })
    }
}

/// Loads a signing identity from a PEM file, accepting both key kinds the
/// agent supports: Ed25519 (PKCS#8) and secp256k1 (SEC1).
pub(crate) fn load_identity(path: &Path) -> Result<Box<dyn Identity>, ClientError> {
    let basic_err = match BasicIdentity::from_pem_file(path) {
        Ok(identity) => return Ok(Box::new(identity)),
        Err(err) => err,
    };
    match Secp256k1Identity::from_pem_file(path) {
        Ok(identity) => Ok(Box::new(identity)),
        Err(secp_err) => Err(ClientError::IdentityLoad {
            path: path.display().to_string(),
            reason: format!(
                "not an Ed25519 key ({basic_err}) and not a secp256k1 key ({secp_err})"
            ),
        }),
    }
}

fn encode_err(method: Method) -> impl FnOnce(candid::Error) -> ClientError {
    move |source| ClientError::EncodeArgs {
        method: method.name(),
        source,
    }
}

fn decode_err(method: Method) -> impl FnOnce(candid::Error) -> ClientError {
    move |source| ClientError::DecodeResponse {
        method: method.name(),
        source,
    }
}

#[async_trait]
impl RecordsActor for CanisterActor {
    async fn greet(&self, name: &str) -> Result<String, ClientError> {
        let method = Method::Greet;
        let args = Encode!(&name).map_err(encode_err(method))?;
        let bytes = self.call_raw(method, args).await?;
        Decode!(&bytes, String).map_err(decode_err(method))
    }

    async fn add_record(&self, input: RecordInput) -> Result<String, ClientError> {
        let method = Method::AddRecord;
        let args = Encode!(&input).map_err(encode_err(method))?;
        let bytes = self.call_raw(method, args).await?;
        Decode!(&bytes, String).map_err(decode_err(method))
    }

    async fn get_my_records(&self) -> Result<Vec<MedicalRecord>, ClientError> {
        let method = Method::GetMyRecords;
        let args = Encode!().map_err(encode_err(method))?;
        let bytes = self.call_raw(method, args).await?;
        Decode!(&bytes, Vec<MedicalRecord>).map_err(decode_err(method))
    }

    async fn share_with_provider(
        &self,
        record_id: &str,
        provider: Principal,
    ) -> Result<bool, ClientError> {
        let method = Method::ShareWithProvider;
        let args = Encode!(&record_id, &provider).map_err(encode_err(method))?;
        let bytes = self.call_raw(method, args).await?;
        Decode!(&bytes, bool).map_err(decode_err(method))
    }

    async fn get_shared_records(&self) -> Result<Vec<MedicalRecord>, ClientError> {
        let method = Method::GetSharedRecords;
        let args = Encode!().map_err(encode_err(method))?;
        let bytes = self.call_raw(method, args).await?;
        Decode!(&bytes, Vec<MedicalRecord>).map_err(decode_err(method))
    }

    async fn revoke_access(
        &self,
        record_id: &str,
        provider: Principal,
    ) -> Result<bool, ClientError> {
        let method = Method::RevokeAccess;
        let args = Encode!(&record_id, &provider).map_err(encode_err(method))?;
        let bytes = self.call_raw(method, args).await?;
        Decode!(&bytes, bool).map_err(decode_err(method))
    }
}
